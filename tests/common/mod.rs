//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use ebus_charging::curve::CurveParameters;
use ebus_charging::vehicle::{InMemoryCatalog, VehicleEnergyProfile, VehicleType, VehicleTypeId};
use rand::Rng;
use rand::rngs::StdRng;

/// Reference curve: 10% to 90% with the taper starting at 50%, 150 kW.
pub fn reference_curve() -> CurveParameters {
    CurveParameters::new(0.1, 0.5, 0.9, 150.0)
}

/// 300 kWh bus at 90% efficiency on the closed-form time curve.
pub fn soc_curve_bus() -> VehicleEnergyProfile {
    VehicleEnergyProfile::new(300.0, 0.9, reference_curve()).expect("valid vehicle")
}

/// Same battery on the power-vs-SoC curve.
pub fn power_curve_bus() -> VehicleEnergyProfile {
    VehicleEnergyProfile::new(300.0, 0.9, reference_curve().with_energy_nominal(1.0))
        .expect("valid vehicle")
}

/// Catalog with the two reference buses as ids 1 and 2.
pub fn reference_catalog() -> InMemoryCatalog {
    [
        VehicleType {
            id: VehicleTypeId(1),
            name: "SB".to_string(),
            opportunity_charging_possible: false,
            minimal_charging_power_kw: 30.5,
            energy: soc_curve_bus(),
        },
        VehicleType {
            id: VehicleTypeId(2),
            name: "SB-OC".to_string(),
            opportunity_charging_possible: true,
            minimal_charging_power_kw: 50.0,
            energy: power_curve_bus(),
        },
    ]
    .into_iter()
    .collect()
}

/// Random but valid vehicle. Roughly half use the power-vs-SoC curve.
///
/// The closed-form curve may still fail to reach `soc_max`; callers skip
/// those draws.
pub fn random_vehicle(rng: &mut StdRng) -> VehicleEnergyProfile {
    let soc_min = rng.random_range(0.0..0.3);
    let soc_th = rng.random_range(soc_min + 0.05..0.85);
    let soc_max = rng.random_range(soc_th + 0.01..=1.0);
    let p_cc = rng.random_range(50.0..450.0);
    let mut params = CurveParameters::new(soc_min, soc_th, soc_max, p_cc);
    if rng.random_bool(0.5) {
        params = params.with_energy_nominal(rng.random_range(0.3..1.5));
    }
    VehicleEnergyProfile::new(
        rng.random_range(80.0..450.0),
        rng.random_range(0.75..=1.0),
        params,
    )
    .expect("generated parameters are valid")
}
