//! Compound-rate and balance-point math
//!
//! Pure functions, no state. Inflation percentages are in percent (7.0 = 7%)
//! unless the parameter name says `rate`.

use serde::{Deserialize, Serialize};

use crate::consts::BALANCE_TOLERANCE;
use crate::round_to;

/// Rounding step and clamp range applied to a solver result
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rounding {
    pub step: f64,
    pub min: f64,
    pub max: f64,
}

impl Rounding {
    pub const START_AMOUNT: Self = Self {
        step: 1000.0,
        min: 0.0,
        max: 100_000.0,
    };
    pub const SAVINGS: Self = Self {
        step: 10.0,
        min: 0.0,
        max: 1000.0,
    };
    pub const INFLATION: Self = Self {
        step: 0.1,
        min: 5.0,
        max: 20.0,
    };

    fn apply(&self, value: f64) -> f64 {
        round_to(value, self.step).clamp(self.min, self.max)
    }
}

/// Inflation percentage returned when the balance point is undefined
pub const DEFAULT_BALANCED_INFLATION_PCT: f64 = 7.0;

/// Whether monthly savings outpace, match, or trail inflation on the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceState {
    Balanced,
    Grow,
    Shrink,
}

/// Monthly rate that compounds to `annual_rate` over 12 months
#[inline]
pub fn monthly_compound_rate(annual_rate: f64) -> f64 {
    (1.0 + annual_rate).powf(1.0 / 12.0) - 1.0
}

/// Inverse of [`monthly_compound_rate`]
#[inline]
pub fn annual_from_monthly(monthly_rate: f64) -> f64 {
    (1.0 + monthly_rate).powi(12) - 1.0
}

/// Starting amount whose monthly inflation loss equals `monthly_savings`
pub fn balanced_start_amount(monthly_savings: f64, annual_inflation_pct: f64) -> f64 {
    balanced_start_amount_with(monthly_savings, annual_inflation_pct, Rounding::START_AMOUNT)
}

/// [`balanced_start_amount`] with explicit rounding.
///
/// Zero inflation never erodes anything, so every amount balances; the
/// convention is to return the clamp maximum.
pub fn balanced_start_amount_with(
    monthly_savings: f64,
    annual_inflation_pct: f64,
    rounding: Rounding,
) -> f64 {
    if annual_inflation_pct == 0.0 {
        return rounding.max;
    }
    let rate = monthly_compound_rate(annual_inflation_pct / 100.0);
    let amount = monthly_savings / rate;
    if !amount.is_finite() {
        return rounding.max;
    }
    rounding.apply(amount)
}

/// Monthly savings that exactly offsets inflation on `start_amount`
pub fn balanced_savings(start_amount: f64, annual_inflation_pct: f64) -> f64 {
    balanced_savings_with(start_amount, annual_inflation_pct, Rounding::SAVINGS)
}

pub fn balanced_savings_with(start_amount: f64, annual_inflation_pct: f64, rounding: Rounding) -> f64 {
    rounding.apply(start_amount * monthly_compound_rate(annual_inflation_pct / 100.0))
}

/// Annual inflation percent at which `monthly_savings` offsets the loss on `start_amount`.
///
/// Returns [`DEFAULT_BALANCED_INFLATION_PCT`] when `start_amount` is zero.
pub fn balanced_inflation(start_amount: f64, monthly_savings: f64) -> f64 {
    balanced_inflation_with(start_amount, monthly_savings, Rounding::INFLATION)
}

pub fn balanced_inflation_with(start_amount: f64, monthly_savings: f64, rounding: Rounding) -> f64 {
    if start_amount == 0.0 {
        return DEFAULT_BALANCED_INFLATION_PCT;
    }
    let monthly_rate = monthly_savings / start_amount;
    let pct = annual_from_monthly(monthly_rate) * 100.0;
    if !pct.is_finite() {
        return DEFAULT_BALANCED_INFLATION_PCT;
    }
    rounding.apply(pct)
}

/// Dollars of purchasing power lost on `balance` in one month
#[inline]
pub fn monthly_inflation_loss(balance: f64, annual_inflation_pct: f64) -> f64 {
    balance * monthly_compound_rate(annual_inflation_pct / 100.0)
}

/// Purchasing power destroyed when the cumulative factor moves from `old` to `new`.
/// Never negative.
pub fn inflation_loss_from_factor_change(total_nominal: f64, old_factor: f64, new_factor: f64) -> f64 {
    let loss = total_nominal / old_factor - total_nominal / new_factor;
    if loss.is_finite() { loss.max(0.0) } else { 0.0 }
}

/// Compare monthly savings against the monthly inflation loss on the starting amount
pub fn balance_state(start_amount: f64, monthly_savings: f64, annual_inflation_pct: f64) -> BalanceState {
    let diff = monthly_savings - monthly_inflation_loss(start_amount, annual_inflation_pct);
    if diff.abs() < BALANCE_TOLERANCE {
        BalanceState::Balanced
    } else if diff > 0.0 {
        BalanceState::Grow
    } else {
        BalanceState::Shrink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_monthly_compound_rate() {
        assert!((monthly_compound_rate(0.12) - 0.009489).abs() < 1e-5);
        assert_eq!(monthly_compound_rate(0.0), 0.0);
        let annual = annual_from_monthly(monthly_compound_rate(0.07));
        assert!((annual - 0.07).abs() < 1e-12);
    }

    #[test]
    fn test_balanced_start_amount() {
        assert_eq!(balanced_start_amount(560.0, 12.0), 59_000.0);
        // Zero inflation returns the clamp maximum
        assert_eq!(balanced_start_amount(560.0, 0.0), 100_000.0);
        // Huge savings clamp to the maximum
        assert_eq!(balanced_start_amount(10_000.0, 5.0), 100_000.0);
    }

    #[test]
    fn test_balanced_savings() {
        // 50000 * 0.0056541 = 282.7 -> 280
        assert_eq!(balanced_savings(50_000.0, 7.0), 280.0);
        assert_eq!(balanced_savings(0.0, 7.0), 0.0);
    }

    #[test]
    fn test_balanced_inflation() {
        // 100/50000 monthly -> 2.43% annual, clamped up to 5
        assert_eq!(balanced_inflation(50_000.0, 100.0), 5.0);
        assert_eq!(balanced_inflation(0.0, 100.0), DEFAULT_BALANCED_INFLATION_PCT);
        let pct = balanced_inflation(59_000.0, 560.0);
        assert!((pct - 12.0).abs() < 0.15, "got {pct}");
    }

    #[test]
    fn test_balance_state() {
        assert_eq!(balance_state(56_000.0, 560.0, 12.0), BalanceState::Grow);
        assert_eq!(balance_state(56_000.0, 500.0, 12.0), BalanceState::Shrink);
        assert_eq!(balance_state(59_000.0, 560.0, 12.0), BalanceState::Balanced);
    }

    #[test]
    fn test_inflation_loss_never_negative() {
        assert_eq!(inflation_loss_from_factor_change(1000.0, 1.1, 1.0), 0.0);
        assert_eq!(inflation_loss_from_factor_change(0.0, 1.0, 1.1), 0.0);
        assert_eq!(inflation_loss_from_factor_change(1000.0, 0.0, 1.0), 0.0);
    }

    proptest! {
        #[test]
        fn balanced_round_trip(savings_steps in 10u32..=100, pct_tenths in 50u32..=200) {
            let savings = savings_steps as f64 * 10.0;
            let pct = pct_tenths as f64 / 10.0;
            let start = balanced_start_amount(savings, pct);
            prop_assume!(start < Rounding::START_AMOUNT.max);
            let back = balanced_savings(start, pct);
            // Start amount is rounded to 1000, so allow half a step of loss plus a savings step
            let slack = 500.0 * monthly_compound_rate(pct / 100.0) + 10.0;
            prop_assert!((back - savings).abs() <= slack, "savings {} -> start {} -> {}", savings, start, back);
        }

        #[test]
        fn inflation_loss_conserved(nominal in 0.0f64..1e7, f1 in 1.0f64..10.0, growth in 0.0f64..0.05) {
            let f2 = f1 * (1.0 + growth);
            let loss = inflation_loss_from_factor_change(nominal, f1, f2);
            prop_assert!(loss >= 0.0);
            prop_assert_eq!(loss, nominal / f1 - nominal / f2);
        }
    }
}
