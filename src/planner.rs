//! Fleet-level charging queries by vehicle-type id.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::profile::{ChargeProfile, ProfileCache, Resolution};
use crate::vehicle::{VehicleCatalog, VehicleType, VehicleTypeId};

/// Answers charging questions for vehicle types held by a catalog.
///
/// Profiles are built on first use and cached per vehicle type and
/// resolution.
///
/// # Examples
///
/// ```
/// use ebus_charging::config::FleetConfig;
/// use ebus_charging::planner::ChargePlanner;
/// use ebus_charging::vehicle::VehicleTypeId;
///
/// let catalog = FleetConfig::standard_bus().catalog().unwrap();
/// let planner = ChargePlanner::new(catalog);
/// let soc = planner
///     .soc_after_charging(VehicleTypeId(1), None, 0.2, 0.5)
///     .unwrap();
/// assert!(soc > 0.2);
/// ```
#[derive(Debug)]
pub struct ChargePlanner<C> {
    catalog: C,
    cache: ProfileCache,
    default_resolution: Option<Resolution>,
}

impl<C: VehicleCatalog> ChargePlanner<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            cache: ProfileCache::new(),
            default_resolution: None,
        }
    }

    /// Uses `resolution` whenever a query does not name one. Without it,
    /// each curve formulation uses [`Resolution::default_for`].
    #[must_use]
    pub fn with_default_resolution(mut self, resolution: Resolution) -> Self {
        self.default_resolution = Some(resolution);
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn cache(&self) -> &ProfileCache {
        &self.cache
    }

    /// # Errors
    ///
    /// Returns `UnknownVehicleType` if the catalog has no such id.
    pub fn vehicle_type(&self, id: VehicleTypeId) -> Result<VehicleType> {
        self.catalog
            .vehicle_type(id)
            .ok_or(Error::UnknownVehicleType(id))
    }

    /// The resolution a query for `vehicle_type` resolves to.
    pub fn resolution_for(
        &self,
        vehicle_type: &VehicleType,
        requested: Option<Resolution>,
    ) -> Resolution {
        requested
            .or(self.default_resolution)
            .unwrap_or_else(|| Resolution::default_for(vehicle_type.energy.curve()))
    }

    /// Charge profile of a vehicle type.
    ///
    /// # Errors
    ///
    /// Returns `UnknownVehicleType` for a missing id, or the build error.
    pub fn profile(
        &self,
        id: VehicleTypeId,
        resolution: Option<Resolution>,
    ) -> Result<Arc<ChargeProfile>> {
        let vehicle_type = self.vehicle_type(id)?;
        let resolution = self.resolution_for(&vehicle_type, resolution);
        self.cache
            .get_or_build(id, &vehicle_type.energy, resolution)
    }

    /// SoC after charging `hours` from `start_soc`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::profile`].
    pub fn soc_after_charging(
        &self,
        id: VehicleTypeId,
        resolution: Option<Resolution>,
        start_soc: f64,
        hours: f64,
    ) -> Result<f64> {
        let soc = self.profile(id, resolution)?.soc_after_charging(start_soc, hours);
        debug!(%id, start_soc, hours, soc, "Charged");
        Ok(soc)
    }

    /// Hours needed to charge from `from_soc` to `to_soc`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::profile`].
    pub fn charging_duration(
        &self,
        id: VehicleTypeId,
        resolution: Option<Resolution>,
        from_soc: f64,
        to_soc: f64,
    ) -> Result<f64> {
        Ok(self
            .profile(id, resolution)?
            .charging_duration(from_soc, to_soc))
    }

    /// Forgets cached profiles of a vehicle type, e.g. after its record changed.
    pub fn invalidate(&self, id: VehicleTypeId) -> usize {
        self.cache.invalidate(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurveParameters;
    use crate::vehicle::{InMemoryCatalog, VehicleEnergyProfile};

    fn catalog() -> InMemoryCatalog {
        let soc_curve = CurveParameters::new(0.1, 0.5, 0.9, 150.0);
        let power_curve = soc_curve.with_energy_nominal(1.0);
        [
            VehicleType {
                id: VehicleTypeId(1),
                name: "SB".to_string(),
                opportunity_charging_possible: true,
                minimal_charging_power_kw: 30.0,
                energy: VehicleEnergyProfile::new(300.0, 0.9, soc_curve).unwrap(),
            },
            VehicleType {
                id: VehicleTypeId(2),
                name: "AB".to_string(),
                opportunity_charging_possible: false,
                minimal_charging_power_kw: 35.0,
                energy: VehicleEnergyProfile::new(250.0, 0.9, power_curve).unwrap(),
            },
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn unknown_vehicle_reported() {
        let planner = ChargePlanner::new(catalog());
        let err = planner.profile(VehicleTypeId(9), None).unwrap_err();
        assert_eq!(err, Error::UnknownVehicleType(VehicleTypeId(9)));
    }

    #[test]
    fn default_resolution_follows_curve_kind() {
        let planner = ChargePlanner::new(catalog());
        assert_eq!(planner.profile(VehicleTypeId(1), None).unwrap().len(), 21);
        // 0.8 window at 0.1 precision
        assert_eq!(planner.profile(VehicleTypeId(2), None).unwrap().len(), 9);
    }

    #[test]
    fn planner_default_overrides_curve_default() {
        let planner = ChargePlanner::new(catalog()).with_default_resolution(Resolution::samples(5));
        assert_eq!(planner.profile(VehicleTypeId(2), None).unwrap().len(), 5);
        assert_eq!(
            planner
                .profile(VehicleTypeId(2), Some(Resolution::samples(3)))
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn profiles_are_reused() {
        let planner = ChargePlanner::new(catalog());
        let a = planner.profile(VehicleTypeId(1), None).unwrap();
        let b = planner.profile(VehicleTypeId(1), None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(planner.invalidate(VehicleTypeId(1)), 1);
        let c = planner.profile(VehicleTypeId(1), None).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn charging_queries_are_consistent() {
        let planner = ChargePlanner::new(catalog());
        let id = VehicleTypeId(1);
        let hours = planner.charging_duration(id, None, 0.2, 0.6).unwrap();
        let soc = planner.soc_after_charging(id, None, 0.2, hours).unwrap();
        assert!((soc - 0.6).abs() < 1e-9);
    }
}
