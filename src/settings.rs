//! Slider inputs
//!
//! The UI writes raw slider values here; the engine samples them fresh at
//! the moment each transition runs.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::finance::{self, BalanceState};

/// The three user-controlled sliders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SliderInput {
    StartingAmount,
    MonthlySavings,
    InflationPct,
}

impl SliderInput {
    pub fn as_str(&self) -> &'static str {
        match self {
            SliderInput::StartingAmount => "starting-amount",
            SliderInput::MonthlySavings => "monthly-savings",
            SliderInput::InflationPct => "inflation-rate",
        }
    }

    /// (min, max, step, default)
    pub fn range(&self) -> (f64, f64, f64, f64) {
        match self {
            SliderInput::StartingAmount => (
                STARTING_AMOUNT_MIN,
                STARTING_AMOUNT_MAX,
                STARTING_AMOUNT_STEP,
                STARTING_AMOUNT_DEFAULT,
            ),
            SliderInput::MonthlySavings => (
                MONTHLY_SAVINGS_MIN,
                MONTHLY_SAVINGS_MAX,
                MONTHLY_SAVINGS_STEP,
                MONTHLY_SAVINGS_DEFAULT,
            ),
            SliderInput::InflationPct => (
                INFLATION_PCT_MIN,
                INFLATION_PCT_MAX,
                INFLATION_PCT_STEP,
                INFLATION_PCT_DEFAULT,
            ),
        }
    }

    pub fn default_value(&self) -> f64 {
        self.range().3
    }
}

/// Current slider values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Dollars in the pig when the simulation (re)starts
    pub starting_amount: f64,
    /// Dollars added every simulated month
    pub monthly_savings: f64,
    /// Annual inflation, percent
    pub inflation_pct: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            starting_amount: STARTING_AMOUNT_DEFAULT,
            monthly_savings: MONTHLY_SAVINGS_DEFAULT,
            inflation_pct: INFLATION_PCT_DEFAULT,
        }
    }
}

impl Settings {
    pub fn new(starting_amount: f64, monthly_savings: f64, inflation_pct: f64) -> Self {
        let mut settings = Self::default();
        settings.set(SliderInput::StartingAmount, starting_amount);
        settings.set(SliderInput::MonthlySavings, monthly_savings);
        settings.set(SliderInput::InflationPct, inflation_pct);
        settings
    }

    pub fn get(&self, input: SliderInput) -> f64 {
        match input {
            SliderInput::StartingAmount => self.starting_amount,
            SliderInput::MonthlySavings => self.monthly_savings,
            SliderInput::InflationPct => self.inflation_pct,
        }
    }

    /// Store a value, clamped to the slider range. Non-finite values fall back to the default.
    pub fn set(&mut self, input: SliderInput, value: f64) {
        let (min, max, _, default) = input.range();
        let value = if value.is_finite() {
            value.clamp(min, max)
        } else {
            log::warn!("{}: non-finite value, using default {}", input.as_str(), default);
            default
        };
        match input {
            SliderInput::StartingAmount => self.starting_amount = value,
            SliderInput::MonthlySavings => self.monthly_savings = value,
            SliderInput::InflationPct => self.inflation_pct = value,
        }
    }

    /// Store a raw slider string; unparseable input falls back to the default
    pub fn set_from_raw(&mut self, input: SliderInput, raw: &str) {
        match raw.trim().replace([',', '$', '%'], "").parse::<f64>() {
            Ok(value) => self.set(input, value),
            Err(_) => {
                log::warn!(
                    "{}: could not parse {:?}, using default {}",
                    input.as_str(),
                    raw,
                    input.default_value()
                );
                self.set(input, input.default_value());
            }
        }
    }

    /// Annual inflation as a decimal (7% -> 0.07)
    pub fn annual_inflation_rate(&self) -> f64 {
        self.inflation_pct / 100.0
    }

    /// Monthly rate compounding to the annual inflation
    pub fn monthly_inflation_rate(&self) -> f64 {
        finance::monthly_compound_rate(self.annual_inflation_rate())
    }

    /// Balance-check hint for the current inputs
    pub fn balance_state(&self) -> BalanceState {
        finance::balance_state(self.starting_amount, self.monthly_savings, self.inflation_pct)
    }

    /// Move the starting amount to the value that balances the other two sliders
    pub fn balance_starting_amount(&mut self) {
        let value = finance::balanced_start_amount(self.monthly_savings, self.inflation_pct);
        self.set(SliderInput::StartingAmount, value);
    }

    /// Move monthly savings to the value that balances the other two sliders
    pub fn balance_monthly_savings(&mut self) {
        let value = finance::balanced_savings(self.starting_amount, self.inflation_pct);
        self.set(SliderInput::MonthlySavings, value);
    }

    /// Move inflation to the value that balances the other two sliders
    pub fn balance_inflation(&mut self) {
        let value = finance::balanced_inflation(self.starting_amount, self.monthly_savings);
        self.set(SliderInput::InflationPct, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.starting_amount, 50_000.0);
        assert_eq!(s.inflation_pct, 7.0);
        assert!((s.annual_inflation_rate() - 0.07).abs() < 1e-12);
    }

    #[test]
    fn test_raw_input_fallback() {
        let mut s = Settings::new(10_000.0, 500.0, 12.0);
        s.set_from_raw(SliderInput::MonthlySavings, "abc");
        assert_eq!(s.monthly_savings, MONTHLY_SAVINGS_DEFAULT);

        s.set_from_raw(SliderInput::StartingAmount, "$25,000");
        assert_eq!(s.starting_amount, 25_000.0);

        s.set_from_raw(SliderInput::InflationPct, "NaN");
        assert_eq!(s.inflation_pct, INFLATION_PCT_DEFAULT);
    }

    #[test]
    fn test_values_clamped_to_range() {
        let s = Settings::new(1e9, -5.0, 99.0);
        assert_eq!(s.starting_amount, STARTING_AMOUNT_MAX);
        assert_eq!(s.monthly_savings, 0.0);
        assert_eq!(s.inflation_pct, INFLATION_PCT_MAX);
    }

    #[test]
    fn test_balance_buttons() {
        let mut s = Settings::new(56_000.0, 560.0, 12.0);
        assert_eq!(s.balance_state(), BalanceState::Grow);
        s.balance_starting_amount();
        assert_eq!(s.starting_amount, 59_000.0);
        assert_eq!(s.balance_state(), BalanceState::Balanced);

        let mut s = Settings::new(50_000.0, 100.0, 7.0);
        s.balance_monthly_savings();
        assert_eq!(s.monthly_savings, 280.0);
        assert_eq!(s.balance_state(), BalanceState::Balanced);

        let mut s = Settings::new(59_000.0, 560.0, 5.0);
        assert_eq!(s.balance_state(), BalanceState::Grow);
        s.balance_inflation();
        assert!((s.inflation_pct - 12.0).abs() < 1e-9, "{}", s.inflation_pct);
        assert_eq!(s.balance_state(), BalanceState::Balanced);

        // Empty pig: no balance point, slider goes to the default rate
        let mut s = Settings::new(0.0, 300.0, 15.0);
        s.balance_inflation();
        assert_eq!(s.inflation_pct, 7.0);

        // Nothing saved: the balancing rate is below the slider range
        let mut s = Settings::new(100_000.0, 0.0, 15.0);
        s.balance_inflation();
        assert_eq!(s.inflation_pct, INFLATION_PCT_MIN);
    }
}
