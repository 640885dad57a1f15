//! CO2 emission estimate from hourly flow.
//!
//! The dominant vehicle class on an arc is inferred from the hourly flow band,
//! and each class carries a per-kilometre emission factor in grams.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleClass {
    PedestrianBike,
    Motorcycle,
    PetrolCar,
    DieselCar,
    ElectricCar,
    Bus,
    Truck,
}

impl VehicleClass {
    /// Bands are closed on the upper bound so fractional flows never fall
    /// between two classes.
    pub fn from_flow(flow: f64) -> Self {
        match flow {
            f if f <= 50.0 => Self::PedestrianBike,
            f if f <= 200.0 => Self::Motorcycle,
            f if f <= 800.0 => Self::PetrolCar,
            f if f <= 1500.0 => Self::DieselCar,
            f if f <= 2500.0 => Self::ElectricCar,
            f if f <= 4000.0 => Self::Bus,
            _ => Self::Truck,
        }
    }

    /// Grams of CO2 per kilometre
    pub fn emission_factor(self) -> f64 {
        match self {
            Self::PedestrianBike | Self::ElectricCar => 0.0,
            Self::Motorcycle => 90.0,
            Self::PetrolCar => 180.0,
            Self::DieselCar => 160.0,
            Self::Bus => 1020.0,
            Self::Truck => 1200.0,
        }
    }
}

/// Emission in grams for a given flow over `distance_km`
pub fn co2_emission(flow: f64, distance_km: f64) -> (VehicleClass, f64) {
    let class = VehicleClass::from_flow(flow);
    (class, class.emission_factor() * distance_km)
}
