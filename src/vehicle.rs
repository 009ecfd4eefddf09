//! Vehicle-type records and the read-only accessor the profile layer consumes.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::curve::{CurveModel, CurveParameters};
use crate::error::{Error, Result};

/// Primary key of a vehicle type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleTypeId(pub u32);

impl fmt::Display for VehicleTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Battery facts that determine how a vehicle charges.
///
/// # Examples
///
/// ```
/// use ebus_charging::curve::CurveParameters;
/// use ebus_charging::vehicle::VehicleEnergyProfile;
///
/// let params = CurveParameters::new(0.1, 0.5, 0.9, 150.0);
/// let energy = VehicleEnergyProfile::new(300.0, 0.9, params).unwrap();
/// assert_eq!(energy.curve().kind(), "exponential_soc");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleEnergyProfile {
    effective_capacity_kwh: f64,
    charging_efficiency: f64,
    curve: CurveModel,
}

impl VehicleEnergyProfile {
    /// Creates a profile, selecting the curve formulation from `params`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the capacity is not positive, the
    /// efficiency is outside `(0, 1]`, or the curve parameters are invalid.
    pub fn new(
        effective_capacity_kwh: f64,
        charging_efficiency: f64,
        params: CurveParameters,
    ) -> Result<Self> {
        Self::with_model(
            effective_capacity_kwh,
            charging_efficiency,
            CurveModel::from_parameters(params)?,
        )
    }

    /// Creates a profile with an explicitly chosen curve formulation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the capacity or efficiency are out of range.
    pub fn with_model(
        effective_capacity_kwh: f64,
        charging_efficiency: f64,
        curve: CurveModel,
    ) -> Result<Self> {
        if !(effective_capacity_kwh.is_finite() && effective_capacity_kwh > 0.0) {
            return Err(Error::invalid("vehicle.effective_capacity_kwh", "must be > 0"));
        }
        if !(charging_efficiency > 0.0 && charging_efficiency <= 1.0) {
            return Err(Error::invalid(
                "vehicle.charging_efficiency",
                "must be in (0.0, 1.0]",
            ));
        }
        Ok(Self {
            effective_capacity_kwh,
            charging_efficiency,
            curve,
        })
    }

    /// Usable battery energy (kWh).
    pub fn effective_capacity_kwh(&self) -> f64 {
        self.effective_capacity_kwh
    }

    /// Fraction of charger power that ends up stored.
    pub fn charging_efficiency(&self) -> f64 {
        self.charging_efficiency
    }

    pub fn curve(&self) -> &CurveModel {
        &self.curve
    }

    pub fn curve_parameters(&self) -> &CurveParameters {
        self.curve.parameters()
    }
}

/// A vehicle type as stored by the fleet data layer.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleType {
    pub id: VehicleTypeId,
    /// Display name, e.g. `"SB"` for a standard bus.
    pub name: String,
    /// Whether the type may charge at terminal stops during a rotation.
    pub opportunity_charging_possible: bool,
    /// Lowest charger power the vehicle accepts (kW).
    pub minimal_charging_power_kw: f64,
    pub energy: VehicleEnergyProfile,
}

/// Read-only lookup of vehicle types by id.
///
/// Implemented by whatever stores fleet records; the profile layer only
/// ever reads through this trait.
pub trait VehicleCatalog {
    /// Returns the vehicle type with the given id, if present.
    fn vehicle_type(&self, id: VehicleTypeId) -> Option<VehicleType>;
}

/// A catalog held entirely in memory, e.g. loaded from a fleet config file.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    vehicle_types: BTreeMap<VehicleTypeId, VehicleType>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a vehicle type, returning the previous record.
    pub fn insert(&mut self, vehicle_type: VehicleType) -> Option<VehicleType> {
        self.vehicle_types.insert(vehicle_type.id, vehicle_type)
    }

    /// Looks up a vehicle type by its display name.
    pub fn find_by_name(&self, name: &str) -> Option<&VehicleType> {
        self.vehicle_types.values().find(|v| v.name == name)
    }

    /// Iterates vehicle types in id order.
    pub fn iter(&self) -> impl Iterator<Item = &VehicleType> {
        self.vehicle_types.values()
    }

    pub fn len(&self) -> usize {
        self.vehicle_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicle_types.is_empty()
    }
}

impl VehicleCatalog for InMemoryCatalog {
    fn vehicle_type(&self, id: VehicleTypeId) -> Option<VehicleType> {
        self.vehicle_types.get(&id).cloned()
    }
}

impl FromIterator<VehicleType> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = VehicleType>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for vehicle_type in iter {
            catalog.insert(vehicle_type);
        }
        catalog
    }
}
