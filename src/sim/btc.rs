//! Bitcoin power-law price model
//!
//! Deterministic closed-form curve: `10^(C + D * log10(days since genesis))`.
//! Only used for in-simulation USD/BTC conversions, never a live feed.

use chrono::NaiveDate;

use super::FinanceError;
use crate::consts::{BTC_GENESIS, BTC_MODEL_C, BTC_MODEL_D, PIG_CAPACITY_DOLLARS};

/// Genesis block date
pub fn genesis_date() -> NaiveDate {
    let (y, m, d) = BTC_GENESIS;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

/// Whole days from genesis to `date`
pub fn days_since_genesis(date: NaiveDate) -> i64 {
    (date - genesis_date()).num_days()
}

/// Model price of one BTC in USD on `date`
pub fn btc_price_usd(date: NaiveDate) -> Result<f64, FinanceError> {
    let days = days_since_genesis(date);
    if days <= 0 {
        return Err(FinanceError::BeforeGenesis { days });
    }
    let price = 10f64.powf(BTC_MODEL_C + BTC_MODEL_D * (days as f64).log10());
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(FinanceError::NonFinite)
    }
}

pub fn usd_to_btc(usd: f64, date: NaiveDate) -> Result<f64, FinanceError> {
    Ok(usd / btc_price_usd(date)?)
}

pub fn btc_to_usd(btc: f64, date: NaiveDate) -> Result<f64, FinanceError> {
    Ok(btc * btc_price_usd(date)?)
}

/// BTC amount equal to the pig's dollar capacity on `date`.
///
/// Returns 0.0 when the model is undefined for `date`; callers treat zero
/// capacity as "BTC mode unusable this run".
pub fn full_pig_btc_capacity(date: NaiveDate) -> f64 {
    match usd_to_btc(PIG_CAPACITY_DOLLARS, date) {
        Ok(btc) if btc.is_finite() && btc > 0.0 => btc,
        Ok(_) => {
            log::warn!("BTC capacity for {} is not positive, BTC mode disabled", date);
            0.0
        }
        Err(e) => {
            log::warn!("BTC capacity unavailable for {}: {}", date, e);
            0.0
        }
    }
}
