//! Simulation state and field-level change tracking
//!
//! The single authoritative record of simulation progress. Only
//! [`super::StateStore`] hands out mutable access.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Asset class the ongoing balance is denominated in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingsVehicle {
    #[default]
    Usd,
    Btc,
}

impl SavingsVehicle {
    pub fn as_str(&self) -> &'static str {
        match self {
            SavingsVehicle::Usd => "usd",
            SavingsVehicle::Btc => "btc",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "usd" | "dollars" => Some(SavingsVehicle::Usd),
            "btc" | "bitcoin" => Some(SavingsVehicle::Btc),
            _ => None,
        }
    }

    pub fn other(&self) -> Self {
        match self {
            SavingsVehicle::Usd => SavingsVehicle::Btc,
            SavingsVehicle::Btc => SavingsVehicle::Usd,
        }
    }
}

/// Simulation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the user to press Enter / Start
    Start,
    /// Months are advancing
    Running,
    /// Month ticks suspended
    Paused,
    /// 30-year horizon reached; only a restart leaves this phase
    Finished,
}

/// Observable fields of [`SimulationState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    FillLevel,
    MugFillLevel,
    TotalSavings,
    TotalSavingsBtc,
    NominalDollarsSaved,
    TotalBankSavings,
    CumulativeInflationFactor,
    CurrentSimDate,
    SimulationStartDate,
    MonthsElapsed,
    SavingsVehicle,
    FullPigBtcCapacity,
    Phase,
    LastDropTime,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::FillLevel,
        Field::MugFillLevel,
        Field::TotalSavings,
        Field::TotalSavingsBtc,
        Field::NominalDollarsSaved,
        Field::TotalBankSavings,
        Field::CumulativeInflationFactor,
        Field::CurrentSimDate,
        Field::SimulationStartDate,
        Field::MonthsElapsed,
        Field::SavingsVehicle,
        Field::FullPigBtcCapacity,
        Field::Phase,
        Field::LastDropTime,
    ];
}

/// A field value captured before or after a change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Number(f64),
    Count(u32),
    Date(NaiveDate),
    Vehicle(SavingsVehicle),
    Phase(Phase),
}

/// One field that differed across an update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: Field,
    pub old: FieldValue,
    pub new: FieldValue,
}

/// Complete simulation state (serializable snapshot)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    /// Pig fill, percent of capacity [0, 100]
    pub fill_level: f64,
    /// Mug fill, percent of capacity [0, 100]
    pub mug_fill_level: f64,
    /// USD balance (authoritative in USD mode)
    pub total_savings: f64,
    /// BTC balance (authoritative in BTC mode)
    pub total_savings_btc: f64,
    /// Every dollar ever contributed, regardless of vehicle or inflation
    pub nominal_dollars_saved: f64,
    /// Dollars of purchasing power lost to inflation
    pub total_bank_savings: f64,
    /// Product of (1 + monthly rate) over all applied months; 1.0 at start
    pub cumulative_inflation_factor: f64,
    pub current_sim_date: NaiveDate,
    pub simulation_start_date: NaiveDate,
    /// Months advanced since `simulation_start_date`
    pub months_elapsed: u32,
    pub savings_vehicle: SavingsVehicle,
    /// BTC equal to the pig's dollar capacity at `simulation_start_date`; 0 when unusable
    pub full_pig_btc_capacity: f64,
    pub phase: Phase,
    /// Wall-clock time (ms) of the last month tick
    pub last_drop_time: f64,
}

impl SimulationState {
    /// Zeroed state dated `today`, waiting in the start phase
    pub fn new(today: NaiveDate) -> Self {
        Self {
            fill_level: 0.0,
            mug_fill_level: 0.0,
            total_savings: 0.0,
            total_savings_btc: 0.0,
            nominal_dollars_saved: 0.0,
            total_bank_savings: 0.0,
            cumulative_inflation_factor: 1.0,
            current_sim_date: today,
            simulation_start_date: today,
            months_elapsed: 0,
            savings_vehicle: SavingsVehicle::Usd,
            full_pig_btc_capacity: 0.0,
            phase: Phase::Start,
            last_drop_time: 0.0,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.phase == Phase::Paused
    }

    pub fn is_start_state(&self) -> bool {
        self.phase == Phase::Start
    }

    pub fn is_simulation_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Current value of a field
    pub fn get(&self, field: Field) -> FieldValue {
        match field {
            Field::FillLevel => FieldValue::Number(self.fill_level),
            Field::MugFillLevel => FieldValue::Number(self.mug_fill_level),
            Field::TotalSavings => FieldValue::Number(self.total_savings),
            Field::TotalSavingsBtc => FieldValue::Number(self.total_savings_btc),
            Field::NominalDollarsSaved => FieldValue::Number(self.nominal_dollars_saved),
            Field::TotalBankSavings => FieldValue::Number(self.total_bank_savings),
            Field::CumulativeInflationFactor => FieldValue::Number(self.cumulative_inflation_factor),
            Field::CurrentSimDate => FieldValue::Date(self.current_sim_date),
            Field::SimulationStartDate => FieldValue::Date(self.simulation_start_date),
            Field::MonthsElapsed => FieldValue::Count(self.months_elapsed),
            Field::SavingsVehicle => FieldValue::Vehicle(self.savings_vehicle),
            Field::FullPigBtcCapacity => FieldValue::Number(self.full_pig_btc_capacity),
            Field::Phase => FieldValue::Phase(self.phase),
            Field::LastDropTime => FieldValue::Number(self.last_drop_time),
        }
    }

    /// Fields whose value differs between `old` and `self` (strict comparison)
    pub fn diff(&self, old: &SimulationState) -> Vec<FieldChange> {
        Field::ALL
            .iter()
            .filter_map(|&field| {
                let (before, after) = (old.get(field), self.get(field));
                (before != after).then_some(FieldChange {
                    field,
                    old: before,
                    new: after,
                })
            })
            .collect()
    }
}
