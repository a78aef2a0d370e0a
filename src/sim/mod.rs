//! Deterministic simulation module
//!
//! All savings/inflation logic lives here. This module must be pure and deterministic:
//! - Time only advances through explicit calls (no hidden timers)
//! - Dates come from an injected clock
//! - No rendering or platform dependencies

pub mod btc;
pub mod engine;
pub mod finance;
pub mod scheduler;
pub mod state;
pub mod store;

pub use btc::{btc_price_usd, btc_to_usd, full_pig_btc_capacity, usd_to_btc};
pub use engine::{GainLoss, SavingsOutcome, SimulationEngine, SavingsLanding};
pub use finance::{
    BalanceState, annual_from_monthly, balance_state, balanced_inflation,
    balanced_savings, balanced_start_amount, inflation_loss_from_factor_change,
    monthly_compound_rate, monthly_inflation_loss,
};
pub use scheduler::{Scheduler, SchedulerEvent};
pub use state::{Field, FieldChange, FieldValue, Phase, SavingsVehicle, SimulationState};
pub use store::{StateStore, SubscriptionId, Topic};

use thiserror::Error;

/// Degenerate-math kinds reported by the financial helpers
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FinanceError {
    /// Date is on or before the genesis block, so log10(days) is undefined
    #[error("date is {days} days from genesis; price model needs a positive day count")]
    BeforeGenesis { days: i64 },
    /// Computation produced NaN or infinity
    #[error("non-finite result")]
    NonFinite,
}
