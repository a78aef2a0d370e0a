//! Simulation transitions
//!
//! Every legal state change lives here: restart, savings landing, month
//! advance, inflation, mug landing, vehicle switch. Each transition runs to
//! completion and notifies subscribers once through the [`StateStore`].

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::btc::{btc_price_usd, btc_to_usd, full_pig_btc_capacity, usd_to_btc};
use super::finance::inflation_loss_from_factor_change;
use super::state::{FieldChange, Phase, SavingsVehicle, SimulationState};
use super::store::{StateStore, SubscriptionId, Topic};
use crate::consts::*;
use crate::persistence::PreferenceStore;
use crate::platform::Clock;
use crate::settings::{Settings, SliderInput};

/// Result of adding one month of savings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SavingsOutcome {
    /// Monthly savings slider is zero; nothing recorded
    NothingToSave,
    /// Saved and the pig still has room
    Saved,
    /// Saved, but the pig is at (or past) capacity
    PigFull,
}

impl SavingsOutcome {
    /// False tells the host to stop spawning savings drops
    pub fn has_capacity(&self) -> bool {
        matches!(self, SavingsOutcome::Saved)
    }
}

/// What a savings drop landing produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SavingsLanding {
    pub outcome: SavingsOutcome,
    /// Session the follow-up inflation step must be tagged with
    pub session: u64,
    /// Date after the month advance
    pub date: NaiveDate,
    /// Horizon reached by this landing
    pub finished: bool,
}

/// Purchasing power relative to dollars contributed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GainLoss {
    Gained(f64),
    Lost(f64),
}

impl GainLoss {
    pub fn percent(&self) -> f64 {
        match self {
            GainLoss::Gained(p) | GainLoss::Lost(p) => *p,
        }
    }
}

/// Last vehicle conversion, kept so an immediate switch back is lossless
#[derive(Debug, Clone, Copy)]
struct VehicleSwitch {
    session: u64,
    date: NaiveDate,
    from: SavingsVehicle,
    source_balance: f64,
    converted: f64,
}

/// Owns the state store, the slider cache, and the restart session counter
pub struct SimulationEngine {
    store: StateStore,
    settings: Settings,
    clock: Box<dyn Clock>,
    preferences: Box<dyn PreferenceStore>,
    /// Incremented first thing on every restart; stale delayed callbacks compare against it
    session: u64,
    last_switch: Option<VehicleSwitch>,
}

impl SimulationEngine {
    /// Build the engine, read the vehicle preference once, and reset to the starting amount
    pub fn new(
        settings: Settings,
        clock: Box<dyn Clock>,
        preferences: Box<dyn PreferenceStore>,
    ) -> Self {
        let mut state = SimulationState::new(clock.today());
        state.savings_vehicle = preferences.load_vehicle().unwrap_or_default();
        let mut engine = Self {
            store: StateStore::new(state),
            settings,
            clock,
            preferences,
            session: 0,
            last_switch: None,
        };
        engine.reset_simulation(None);
        engine
    }

    pub fn state(&self) -> &SimulationState {
        self.store.state()
    }

    /// Serializable copy of the current state
    pub fn snapshot(&self) -> SimulationState {
        self.store.state().clone()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Slider cache; read fresh by the next transition
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn set_input(&mut self, input: SliderInput, raw: &str) {
        self.settings.set_from_raw(input, raw);
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn subscribe<F>(&mut self, topic: Topic, listener: F) -> SubscriptionId
    where
        F: FnMut(&SimulationState, &[FieldChange]) + 'static,
    {
        self.store.subscribe(topic, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    // === Lifecycle ===

    /// Restart the run at today's date.
    ///
    /// Uses the starting-amount slider when `start_amount` is `None`. The
    /// savings vehicle is kept; the start phase is kept until the user starts.
    pub fn reset_simulation(&mut self, start_amount: Option<f64>) {
        self.session += 1;
        self.last_switch = None;

        let amount = match start_amount {
            Some(a) if a.is_finite() && a >= 0.0 => a,
            Some(a) => {
                log::warn!("Invalid starting amount {}, using slider value", a);
                self.settings.starting_amount
            }
            None => self.settings.starting_amount,
        };
        let today = self.clock.today();
        let capacity = full_pig_btc_capacity(today);
        let amount_btc = usd_to_btc(amount, today).unwrap_or(0.0);
        let vehicle = self.state().savings_vehicle;
        let fill = match vehicle {
            SavingsVehicle::Usd => amount / PIG_CAPACITY_DOLLARS * 100.0,
            SavingsVehicle::Btc => btc_fill(amount_btc, capacity),
        };

        self.store.update(|s| {
            s.simulation_start_date = today;
            s.current_sim_date = today;
            s.months_elapsed = 0;
            s.full_pig_btc_capacity = capacity;
            s.total_savings = amount;
            s.total_savings_btc = amount_btc;
            s.fill_level = fill;
            s.mug_fill_level = 0.0;
            s.total_bank_savings = 0.0;
            s.nominal_dollars_saved = amount;
            s.cumulative_inflation_factor = 1.0;
            if s.phase != Phase::Start {
                s.phase = Phase::Running;
            }
        });
        log::info!(
            "Simulation reset: ${:.0} ({}) on {}, session {}",
            amount,
            vehicle.as_str(),
            today,
            self.session
        );
    }

    /// Reset and begin running immediately (restart button)
    pub fn restart(&mut self) {
        self.reset_simulation(None);
        self.store.update(|s| s.phase = Phase::Running);
    }

    /// Leave the start phase. Returns false if already started.
    pub fn start(&mut self) -> bool {
        if self.state().phase != Phase::Start {
            return false;
        }
        self.store.update(|s| s.phase = Phase::Running);
        log::info!("Simulation started");
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state().phase != Phase::Running {
            return false;
        }
        self.store.update(|s| s.phase = Phase::Paused);
        log::info!("Simulation paused");
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state().phase != Phase::Paused {
            return false;
        }
        self.store.update(|s| s.phase = Phase::Running);
        log::info!("Simulation resumed");
        true
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.pause() || self.resume()
    }

    // === Transitions ===

    /// Add one month of savings to the active vehicle
    pub fn add_monthly_savings(&mut self) -> SavingsOutcome {
        let amount = self.settings.monthly_savings;
        if amount <= 0.0 {
            return SavingsOutcome::NothingToSave;
        }

        let state = self.state();
        let vehicle = state.savings_vehicle;
        let raw_fill = match vehicle {
            SavingsVehicle::Usd => {
                let total = state.total_savings + amount;
                let fill = total / state.cumulative_inflation_factor / PIG_CAPACITY_DOLLARS * 100.0;
                self.store.update(|s| {
                    s.total_savings = total;
                    s.nominal_dollars_saved += amount;
                    s.fill_level = fill;
                });
                fill
            }
            SavingsVehicle::Btc => {
                let btc = usd_to_btc(amount, state.current_sim_date).unwrap_or_else(|e| {
                    log::warn!("Cannot convert savings to BTC: {}", e);
                    0.0
                });
                let total_btc = state.total_savings_btc + btc;
                let fill = btc_fill(total_btc, state.full_pig_btc_capacity);
                self.store.update(|s| {
                    s.total_savings_btc = total_btc;
                    s.nominal_dollars_saved += amount;
                    s.fill_level = fill;
                });
                fill
            }
        };

        if raw_fill >= 100.0 {
            log::debug!("Pig is full ({:.1}%)", raw_fill);
            SavingsOutcome::PigFull
        } else {
            SavingsOutcome::Saved
        }
    }

    /// Move the simulated calendar forward one month. Returns true when the horizon is reached.
    ///
    /// Month-end dates clamp (Jan 31 -> Feb 28/29).
    pub fn advance_month(&mut self) -> bool {
        let current = self.state().current_sim_date;
        let next = current.checked_add_months(Months::new(1)).unwrap_or_else(|| {
            log::warn!("Date overflow advancing past {}", current);
            current
        });
        let months = self.state().months_elapsed + 1;
        let finished = months >= SIMULATION_MONTHS;

        self.store.update(|s| {
            s.current_sim_date = next;
            s.months_elapsed = months;
            if finished {
                s.phase = Phase::Finished;
            }
        });
        if finished {
            log::info!("Simulation finished after {} months ({})", months, next);
        }
        finished
    }

    /// Savings drop hit the pig: save, then advance the month
    pub fn land_savings_drop(&mut self) -> SavingsLanding {
        let outcome = self.add_monthly_savings();
        let finished = self.advance_month();
        log::debug!(
            "Month {} ({}): {:?}",
            self.state().months_elapsed,
            self.state().current_sim_date,
            outcome
        );
        SavingsLanding {
            outcome,
            session: self.session,
            date: self.state().current_sim_date,
            finished,
        }
    }

    /// Compound one month of inflation. Returns the dollars of purchasing power eroded.
    pub fn apply_monthly_inflation(&mut self) -> f64 {
        let rate = self.settings.monthly_inflation_rate().max(0.0);
        let state = self.state();
        let old_factor = state.cumulative_inflation_factor;
        let new_factor = old_factor * (1.0 + rate);
        let loss = inflation_loss_from_factor_change(self.current_balance_usd(), old_factor, new_factor);

        let vehicle = state.savings_vehicle;
        let usd_fill = state.total_savings / new_factor / PIG_CAPACITY_DOLLARS * 100.0;
        self.store.update(|s| {
            s.cumulative_inflation_factor = new_factor;
            if vehicle == SavingsVehicle::Usd {
                s.fill_level = usd_fill;
            }
        });
        loss
    }

    /// Delayed inflation callback. Returns `None` when `session` predates the latest restart.
    pub fn apply_scheduled_inflation(&mut self, session: u64) -> Option<f64> {
        if session != self.session {
            log::debug!(
                "Discarding inflation step from session {} (current {})",
                session,
                self.session
            );
            return None;
        }
        Some(self.apply_monthly_inflation())
    }

    /// Record lost purchasing power in the mug. Returns whether the mug still has room.
    pub fn add_inflation_loss_to_mug(&mut self, dollars: f64) -> bool {
        if dollars.is_nan() || dollars <= 0.0 {
            return self.state().mug_fill_level < 100.0;
        }
        let raw_fill = self.state().mug_fill_level + dollars / MUG_CAPACITY_DOLLARS * 100.0;
        self.store.update(|s| {
            s.total_bank_savings += dollars;
            s.mug_fill_level = raw_fill;
        });
        raw_fill < 100.0
    }

    /// Inflation drop hit the mug
    pub fn land_inflation_drop(&mut self, dollars: f64) -> bool {
        self.add_inflation_loss_to_mug(dollars)
    }

    /// Switch vehicles, converting the active balance once at the current simulated date.
    ///
    /// Switching straight back on the same date, with the balance untouched,
    /// restores the pre-switch balance bit for bit instead of converting again.
    /// Returns false when unchanged or when the price model is unavailable.
    pub fn set_savings_vehicle(&mut self, vehicle: SavingsVehicle) -> bool {
        let state = self.state();
        let current = state.savings_vehicle;
        if current == vehicle {
            return false;
        }
        let date = state.current_sim_date;
        let balance = match current {
            SavingsVehicle::Usd => state.total_savings,
            SavingsVehicle::Btc => state.total_savings_btc,
        };

        let reverted = self.last_switch.filter(|sw| {
            sw.session == self.session
                && sw.date == date
                && sw.from == vehicle
                && sw.converted == balance
        });
        let converted = match reverted {
            Some(sw) => Ok(sw.source_balance),
            None => match vehicle {
                SavingsVehicle::Btc => usd_to_btc(balance, date),
                SavingsVehicle::Usd => btc_to_usd(balance, date),
            },
        };
        let converted = match converted {
            Ok(v) => v,
            Err(e) => {
                log::warn!("Cannot switch to {}: {}", vehicle.as_str(), e);
                return false;
            }
        };
        self.last_switch = Some(VehicleSwitch {
            session: self.session,
            date,
            from: current,
            source_balance: balance,
            converted,
        });

        self.store.update(|s| {
            match vehicle {
                SavingsVehicle::Btc => s.total_savings_btc = converted,
                SavingsVehicle::Usd => s.total_savings = converted,
            }
            s.savings_vehicle = vehicle;
        });
        self.preferences.save_vehicle(vehicle);
        log::info!("Savings vehicle switched to {} on {}", vehicle.as_str(), date);
        true
    }

    /// Wall-clock bookkeeping for the scheduler
    pub fn record_drop_time(&mut self, now_ms: f64) {
        self.store.update(|s| s.last_drop_time = now_ms);
    }

    // === Derived queries ===

    /// BTC conversions are possible for this run
    pub fn btc_mode_available(&self) -> bool {
        let capacity = self.state().full_pig_btc_capacity;
        capacity.is_finite() && capacity > 0.0
    }

    /// Model BTC price at the current simulated date
    pub fn btc_price_now(&self) -> Option<f64> {
        btc_price_usd(self.state().current_sim_date).ok()
    }

    /// Nominal balance of the active vehicle, in USD at the current simulated date
    pub fn current_balance_usd(&self) -> f64 {
        let state = self.state();
        match state.savings_vehicle {
            SavingsVehicle::Usd => state.total_savings,
            SavingsVehicle::Btc => btc_to_usd(state.total_savings_btc, state.current_sim_date).unwrap_or(0.0),
        }
    }

    /// Balance in today's dollars (nominal / cumulative inflation)
    pub fn purchasing_power_value(&self) -> f64 {
        self.current_balance_usd() / self.state().cumulative_inflation_factor
    }

    /// Share of a dollar's value destroyed since the start, percent
    pub fn purchasing_power_lost_percent(&self) -> f64 {
        let factor = self.state().cumulative_inflation_factor;
        if factor == 1.0 {
            0.0
        } else {
            (1.0 - 1.0 / factor) * 100.0
        }
    }

    /// Purchasing power vs. dollars contributed
    pub fn gained_or_lost_info(&self) -> GainLoss {
        let nominal = self.state().nominal_dollars_saved;
        if nominal <= 0.0 {
            return GainLoss::Lost(0.0);
        }
        let pp = self.purchasing_power_value();
        if pp > nominal {
            GainLoss::Gained((pp / nominal - 1.0) * 100.0)
        } else {
            GainLoss::Lost((1.0 - pp / nominal) * 100.0)
        }
    }

    /// Fraction of the 30-year horizon elapsed, [0, 1]
    pub fn progress(&self) -> f64 {
        (self.state().months_elapsed as f64 / SIMULATION_MONTHS as f64).min(1.0)
    }
}

/// Pig fill for a BTC balance; zero when capacity is unusable
fn btc_fill(btc: f64, capacity: f64) -> f64 {
    if capacity.is_finite() && capacity > 0.0 {
        btc / capacity * 100.0
    } else {
        0.0
    }
}
