//! Purchasing Power Pig - inflation vs. savings over a 30-year horizon
//!
//! Core modules:
//! - `sim`: Deterministic simulation (financial math, state, engine, scheduler)
//! - `settings`: Slider input cache with fallback-to-default parsing
//! - `persistence`: Savings vehicle preference storage
//! - `platform`: Browser/native clock abstraction

pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use persistence::{MemoryPreferences, PreferenceStore};
pub use platform::{Clock, FixedClock, SystemClock};
pub use settings::{Settings, SliderInput};

/// Simulation configuration constants
pub mod consts {
    /// Dollar amount that fills the pig to 100%
    pub const PIG_CAPACITY_DOLLARS: f64 = 100_000.0;
    /// Dollar amount of lost purchasing power that fills the mug to 100%
    pub const MUG_CAPACITY_DOLLARS: f64 = 100_000.0;

    /// Wall time per simulated month (ms)
    pub const MONTH_INTERVAL_MS: f64 = 1000.0;
    /// Delay between a savings landing and the inflation step (ms)
    pub const INFLATION_DELAY_MS: f64 = 500.0;
    /// 30-year horizon
    pub const SIMULATION_MONTHS: u32 = 360;

    /// Absolute tolerance (dollars/month) for the balance check.
    /// Matches the rounding granularity of the three sliders.
    pub const BALANCE_TOLERANCE: f64 = 10.0;

    /// Bitcoin power-law model: price = 10^(C + D * log10(days since genesis))
    pub const BTC_MODEL_C: f64 = -17.016_122_3;
    pub const BTC_MODEL_D: f64 = 5.845_154_2;
    /// Genesis block date (year, month, day)
    pub const BTC_GENESIS: (i32, u32, u32) = (2009, 1, 3);

    /// Starting amount slider
    pub const STARTING_AMOUNT_MIN: f64 = 0.0;
    pub const STARTING_AMOUNT_MAX: f64 = 100_000.0;
    pub const STARTING_AMOUNT_STEP: f64 = 1000.0;
    pub const STARTING_AMOUNT_DEFAULT: f64 = 50_000.0;

    /// Monthly savings slider
    pub const MONTHLY_SAVINGS_MIN: f64 = 0.0;
    pub const MONTHLY_SAVINGS_MAX: f64 = 1000.0;
    pub const MONTHLY_SAVINGS_STEP: f64 = 10.0;
    pub const MONTHLY_SAVINGS_DEFAULT: f64 = 300.0;

    /// Inflation slider (percent per year)
    pub const INFLATION_PCT_MIN: f64 = 5.0;
    pub const INFLATION_PCT_MAX: f64 = 20.0;
    pub const INFLATION_PCT_STEP: f64 = 0.1;
    pub const INFLATION_PCT_DEFAULT: f64 = 7.0;
}

/// Round `value` to the nearest multiple of `step` (step <= 0 leaves it as is)
#[inline]
pub fn round_to(value: f64, step: f64) -> f64 {
    if step > 0.0 {
        (value / step).round() * step
    } else {
        value
    }
}

/// Clamp a fill percentage into [0, 100], mapping NaN to 0
#[inline]
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}
