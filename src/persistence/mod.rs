//! Savings vehicle preference storage
//!
//! Only the chosen vehicle survives a page reload. Persisted as a small JSON
//! document in LocalStorage on web, kept in memory elsewhere.

use serde::{Deserialize, Serialize};

use crate::sim::SavingsVehicle;

/// Key-value store for the user's vehicle choice
pub trait PreferenceStore {
    fn load_vehicle(&self) -> Option<SavingsVehicle>;
    fn save_vehicle(&mut self, vehicle: SavingsVehicle);
}

/// Stored document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct VehiclePreference {
    savings_vehicle: SavingsVehicle,
}

fn encode(vehicle: SavingsVehicle) -> Option<String> {
    serde_json::to_string(&VehiclePreference {
        savings_vehicle: vehicle,
    })
    .ok()
}

fn decode(json: &str) -> Option<SavingsVehicle> {
    serde_json::from_str::<VehiclePreference>(json)
        .ok()
        .map(|p| p.savings_vehicle)
}

/// In-process store (native builds and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    json: Option<String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vehicle(vehicle: SavingsVehicle) -> Self {
        Self { json: encode(vehicle) }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn load_vehicle(&self) -> Option<SavingsVehicle> {
        self.json.as_deref().and_then(decode)
    }

    fn save_vehicle(&mut self, vehicle: SavingsVehicle) {
        self.json = encode(vehicle);
    }
}

/// Browser LocalStorage store
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct LocalStoragePreferences;

#[cfg(target_arch = "wasm32")]
impl LocalStoragePreferences {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "purchasing_power_pig_vehicle";

    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl PreferenceStore for LocalStoragePreferences {
    fn load_vehicle(&self) -> Option<SavingsVehicle> {
        let json = Self::storage()?.get_item(Self::STORAGE_KEY).ok()??;
        let vehicle = decode(&json);
        if let Some(v) = vehicle {
            log::info!("Loaded savings vehicle preference: {}", v.as_str());
        }
        vehicle
    }

    fn save_vehicle(&mut self, vehicle: SavingsVehicle) {
        if let (Some(storage), Some(json)) = (Self::storage(), encode(vehicle)) {
            let _ = storage.set_item(Self::STORAGE_KEY, &json);
            log::info!("Savings vehicle preference saved: {}", vehicle.as_str());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_round_trip() {
        let mut prefs = MemoryPreferences::new();
        assert_eq!(prefs.load_vehicle(), None);
        prefs.save_vehicle(SavingsVehicle::Btc);
        assert_eq!(prefs.load_vehicle(), Some(SavingsVehicle::Btc));
        assert_eq!(
            MemoryPreferences::with_vehicle(SavingsVehicle::Usd).load_vehicle(),
            Some(SavingsVehicle::Usd)
        );
    }

    #[test]
    fn test_corrupt_document_ignored() {
        assert_eq!(decode("{\"savings_vehicle\":\"eur\"}"), None);
        assert_eq!(decode("not json"), None);
        assert_eq!(decode("{\"savings_vehicle\":\"btc\"}"), Some(SavingsVehicle::Btc));
    }
}
