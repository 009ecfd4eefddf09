//! TOML-based fleet configuration and preset definitions.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::curve::CurveParameters;
use crate::profile::Resolution;
use crate::vehicle::{InMemoryCatalog, VehicleEnergyProfile, VehicleType, VehicleTypeId};

/// Top-level fleet configuration parsed from TOML.
///
/// Load from TOML with [`FleetConfig::from_toml_file`] or pick a built-in
/// fleet with [`FleetConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FleetConfig {
    /// Default profile resolution.
    #[serde(default)]
    pub profile: ProfileConfig,
    /// Named charging curves.
    #[serde(default)]
    pub curve: Vec<CurveConfig>,
    /// Vehicle types, each referencing a curve by name.
    #[serde(default)]
    pub vehicle_type: Vec<VehicleTypeConfig>,
}

/// Default profile resolution. At most one field may be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileConfig {
    /// SoC step between samples.
    pub precision: Option<f64>,
    /// Total number of samples.
    pub samples: Option<usize>,
}

impl ProfileConfig {
    /// The configured resolution, if any. `precision` wins if both are set;
    /// [`FleetConfig::validate`] reports that case.
    pub fn resolution(&self) -> Option<Resolution> {
        match (self.precision, self.samples) {
            (Some(step), _) => Some(Resolution::precision(step)),
            (None, Some(num)) => Some(Resolution::samples(num)),
            (None, None) => None,
        }
    }
}

/// A named charging curve.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CurveConfig {
    /// Name referenced by `vehicle_type.curve`.
    pub name: String,
    pub soc_min: f64,
    pub soc_th: f64,
    pub soc_max: f64,
    /// Constant-phase charger power (kW).
    pub p_cc: f64,
    /// Selects the power-vs-SoC formulation when present.
    #[serde(default)]
    pub energy_nominal: Option<f64>,
}

impl CurveConfig {
    pub fn parameters(&self) -> CurveParameters {
        CurveParameters {
            soc_min: self.soc_min,
            soc_th: self.soc_th,
            soc_max: self.soc_max,
            p_cc: self.p_cc,
            energy_nominal: self.energy_nominal,
        }
    }
}

/// A vehicle type record.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VehicleTypeConfig {
    pub id: u32,
    pub name: String,
    /// Usable battery energy (kWh).
    pub effective_capacity_kwh: f64,
    /// Charging efficiency (0.0–1.0].
    pub charging_efficiency: f64,
    #[serde(default)]
    pub opportunity_charging_possible: bool,
    /// Lowest accepted charger power (kW).
    #[serde(default)]
    pub minimal_charging_power_kw: f64,
    /// Name of the charging curve.
    pub curve: String,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"vehicle_type[SB].curve"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl FleetConfig {
    /// Available preset names.
    pub const PRESETS: &[&str] = &["standard_bus", "articulated_bus", "mixed_fleet"];

    /// One 12 m standard bus charging on a CC/taper depot charger.
    pub fn standard_bus() -> Self {
        Self {
            profile: ProfileConfig::default(),
            curve: vec![depot_curve()],
            vehicle_type: vec![standard_bus_type()],
        }
    }

    /// One 18 m articulated bus with an earlier taper.
    pub fn articulated_bus() -> Self {
        Self {
            profile: ProfileConfig::default(),
            curve: vec![articulated_curve()],
            vehicle_type: vec![articulated_bus_type()],
        }
    }

    /// Both bus types plus a standard bus on a power-vs-SoC opportunity
    /// charger, sampled at a fine SoC step.
    pub fn mixed_fleet() -> Self {
        Self {
            profile: ProfileConfig {
                precision: Some(0.05),
                samples: None,
            },
            curve: vec![
                depot_curve(),
                articulated_curve(),
                CurveConfig {
                    name: "pantograph".to_string(),
                    soc_min: 0.2,
                    soc_th: 0.7,
                    soc_max: 0.95,
                    p_cc: 300.0,
                    energy_nominal: Some(1.0),
                },
            ],
            vehicle_type: vec![
                standard_bus_type(),
                articulated_bus_type(),
                VehicleTypeConfig {
                    id: 3,
                    name: "SB-OC".to_string(),
                    effective_capacity_kwh: 200.0,
                    charging_efficiency: 0.92,
                    opportunity_charging_possible: true,
                    minimal_charging_power_kw: 50.0,
                    curve: "pantograph".to_string(),
                },
            ],
        }
    }

    /// Loads a fleet from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "standard_bus" => Ok(Self::standard_bus()),
            "articulated_bus" => Ok(Self::articulated_bus()),
            "mixed_fleet" => Ok(Self::mixed_fleet()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a fleet from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("fleet", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a fleet from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let p = &self.profile;
        if p.precision.is_some() && p.samples.is_some() {
            errors.push(ConfigError::new(
                "profile",
                "set either profile.precision or profile.samples, not both",
            ));
        }
        if let Some(resolution) = p.resolution()
            && let Err(e) = resolution.validate()
        {
            errors.push(ConfigError::new("profile", e.to_string()));
        }

        let mut curve_names = HashSet::new();
        for curve in &self.curve {
            if !curve_names.insert(curve.name.as_str()) {
                errors.push(ConfigError::new(
                    format!("curve[{}].name", curve.name),
                    "duplicate curve name",
                ));
            }
            if let Err(e) = curve.parameters().validate() {
                errors.push(ConfigError::new(
                    format!("curve[{}]", curve.name),
                    e.to_string(),
                ));
            }
        }

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for vt in &self.vehicle_type {
            let path = format!("vehicle_type[{}]", vt.name);
            if !ids.insert(vt.id) {
                errors.push(ConfigError::new(format!("{path}.id"), "duplicate id"));
            }
            if !names.insert(vt.name.as_str()) {
                errors.push(ConfigError::new(format!("{path}.name"), "duplicate name"));
            }
            if !(vt.effective_capacity_kwh > 0.0) {
                errors.push(ConfigError::new(
                    format!("{path}.effective_capacity_kwh"),
                    "must be > 0",
                ));
            }
            if !(vt.charging_efficiency > 0.0 && vt.charging_efficiency <= 1.0) {
                errors.push(ConfigError::new(
                    format!("{path}.charging_efficiency"),
                    "must be in (0.0, 1.0]",
                ));
            }
            if vt.minimal_charging_power_kw < 0.0 {
                errors.push(ConfigError::new(
                    format!("{path}.minimal_charging_power_kw"),
                    "must be >= 0",
                ));
            }
            if !curve_names.contains(vt.curve.as_str()) {
                errors.push(ConfigError::new(
                    format!("{path}.curve"),
                    format!("unknown curve \"{}\"", vt.curve),
                ));
            }
        }

        errors
    }

    /// Builds the in-memory catalog of all vehicle types.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, if any.
    pub fn catalog(&self) -> Result<InMemoryCatalog, ConfigError> {
        if let Some(error) = self.validate().into_iter().next() {
            return Err(error);
        }

        let mut catalog = InMemoryCatalog::new();
        for vt in &self.vehicle_type {
            let path = format!("vehicle_type[{}]", vt.name);
            let curve = self
                .curve
                .iter()
                .find(|c| c.name == vt.curve)
                .ok_or_else(|| ConfigError::new(format!("{path}.curve"), "unknown curve"))?;
            let energy = VehicleEnergyProfile::new(
                vt.effective_capacity_kwh,
                vt.charging_efficiency,
                curve.parameters(),
            )
            .map_err(|e| ConfigError::new(path, e.to_string()))?;
            catalog.insert(VehicleType {
                id: VehicleTypeId(vt.id),
                name: vt.name.clone(),
                opportunity_charging_possible: vt.opportunity_charging_possible,
                minimal_charging_power_kw: vt.minimal_charging_power_kw,
                energy,
            });
        }
        Ok(catalog)
    }
}

fn depot_curve() -> CurveConfig {
    CurveConfig {
        name: "depot".to_string(),
        soc_min: 0.1,
        soc_th: 0.8,
        soc_max: 0.9,
        p_cc: 150.0,
        energy_nominal: None,
    }
}

fn articulated_curve() -> CurveConfig {
    CurveConfig {
        name: "depot_articulated".to_string(),
        soc_min: 0.1,
        soc_th: 0.7,
        soc_max: 0.9,
        p_cc: 150.0,
        energy_nominal: None,
    }
}

fn standard_bus_type() -> VehicleTypeConfig {
    VehicleTypeConfig {
        id: 1,
        name: "SB".to_string(),
        effective_capacity_kwh: 300.0,
        charging_efficiency: 0.95,
        opportunity_charging_possible: true,
        minimal_charging_power_kw: 30.5,
        curve: "depot".to_string(),
    }
}

fn articulated_bus_type() -> VehicleTypeConfig {
    VehicleTypeConfig {
        id: 2,
        name: "AB".to_string(),
        effective_capacity_kwh: 250.0,
        charging_efficiency: 0.9,
        opportunity_charging_possible: false,
        minimal_charging_power_kw: 35.5,
        curve: "depot_articulated".to_string(),
    }
}
