//! Charging-curve physics: constant-power phase followed by an exponential taper.

/// Power-vs-SoC taper (needs `energy_nominal`).
pub mod exponential_power;
/// Closed-form SoC-vs-time taper.
pub mod exponential_soc;

pub use exponential_power::ExponentialPowerCurve;
pub use exponential_soc::{ExponentialSocCurve, SocTrajectory};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shape parameters of a CC/taper charging curve.
///
/// SoC values are fractions and must satisfy
/// `0 <= soc_min <= soc_th <= soc_max <= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurveParameters {
    /// SoC at which charging starts.
    pub soc_min: f64,
    /// Threshold SoC where the constant-power phase ends.
    pub soc_th: f64,
    /// SoC at which charging stops.
    pub soc_max: f64,
    /// Charger power during the constant phase (kW, > 0).
    pub p_cc: f64,
    /// Normalization constant of the power-vs-SoC taper. Selects that
    /// formulation when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_nominal: Option<f64>,
}

impl CurveParameters {
    /// Creates parameters for the closed-form SoC-vs-time curve.
    pub fn new(soc_min: f64, soc_th: f64, soc_max: f64, p_cc: f64) -> Self {
        Self {
            soc_min,
            soc_th,
            soc_max,
            p_cc,
            energy_nominal: None,
        }
    }

    /// Sets `energy_nominal`, switching the curve to the power-vs-SoC formulation.
    #[must_use]
    pub fn with_energy_nominal(mut self, energy_nominal: f64) -> Self {
        self.energy_nominal = Some(energy_nominal);
        self
    }

    /// Width of the charging window, `soc_max - soc_min`.
    pub fn soc_window(&self) -> f64 {
        self.soc_max - self.soc_min
    }

    /// Checks the ordering invariant and the sign of `p_cc` / `energy_nominal`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("curve.soc_min", self.soc_min),
            ("curve.soc_th", self.soc_th),
            ("curve.soc_max", self.soc_max),
            ("curve.p_cc", self.p_cc),
        ] {
            if !value.is_finite() {
                return Err(Error::invalid(field, "must be finite"));
            }
        }
        if !(0.0..=1.0).contains(&self.soc_min) {
            return Err(Error::invalid("curve.soc_min", "must be in [0.0, 1.0]"));
        }
        if !(0.0..=1.0).contains(&self.soc_max) {
            return Err(Error::invalid("curve.soc_max", "must be in [0.0, 1.0]"));
        }
        if self.soc_min > self.soc_max {
            return Err(Error::invalid("curve.soc_min", "must be <= curve.soc_max"));
        }
        if !(self.soc_min..=self.soc_max).contains(&self.soc_th) {
            return Err(Error::invalid(
                "curve.soc_th",
                format!("must be in [{}, {}]", self.soc_min, self.soc_max),
            ));
        }
        if self.p_cc <= 0.0 {
            return Err(Error::invalid("curve.p_cc", "must be > 0"));
        }
        if let Some(energy_nominal) = self.energy_nominal
            && !(energy_nominal.is_finite() && energy_nominal > 0.0)
        {
            return Err(Error::invalid("curve.energy_nominal", "must be > 0"));
        }
        Ok(())
    }
}

/// Instantaneous charger power as a function of SoC.
///
/// Implemented by the power-vs-SoC curve and by any `Fn(f64) -> f64`, so
/// callers can plug in their own curve when building a profile.
pub trait PowerCurve {
    /// Raw charger power in kW at the given SoC, before charging losses.
    fn power_kw(&self, soc: f64) -> f64;
}

impl<F> PowerCurve for F
where
    F: Fn(f64) -> f64,
{
    fn power_kw(&self, soc: f64) -> f64 {
        self(soc)
    }
}

/// The charging-curve formulation attached to a vehicle type.
///
/// The variant is fixed at construction, so a missing `energy_nominal`
/// surfaces there and not halfway through a table build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveModel {
    /// Power as a function of SoC; time is obtained by integration.
    ExponentialPower(ExponentialPowerCurve),
    /// SoC as a closed-form function of time.
    ExponentialSoc(ExponentialSocCurve),
}

impl CurveModel {
    /// Picks the formulation matching the shape of `params`: power-vs-SoC
    /// when `energy_nominal` is present, closed-form SoC-vs-time otherwise.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `params` fail validation.
    pub fn from_parameters(params: CurveParameters) -> Result<Self> {
        if params.energy_nominal.is_some() {
            ExponentialPowerCurve::new(params).map(Self::ExponentialPower)
        } else {
            ExponentialSocCurve::new(params).map(Self::ExponentialSoc)
        }
    }

    /// The parameters this model was built from.
    pub fn parameters(&self) -> &CurveParameters {
        match self {
            Self::ExponentialPower(curve) => curve.parameters(),
            Self::ExponentialSoc(curve) => curve.parameters(),
        }
    }

    /// Short name used in logs and exports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ExponentialPower(_) => "exponential_power",
            Self::ExponentialSoc(_) => "exponential_soc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CurveParameters {
        CurveParameters::new(0.1, 0.5, 0.9, 150.0)
    }

    #[test]
    fn valid_parameters_pass() {
        assert!(params().validate().is_ok());
        assert!(params().with_energy_nominal(1.0).validate().is_ok());
    }

    #[test]
    fn boundary_equalities_are_allowed() {
        assert!(CurveParameters::new(0.0, 0.0, 1.0, 1.0).validate().is_ok());
        assert!(CurveParameters::new(0.2, 0.9, 0.9, 1.0).validate().is_ok());
    }

    #[test]
    fn soc_th_outside_window_rejected() {
        let p = CurveParameters::new(0.1, 0.95, 0.9, 150.0);
        assert_eq!(p.validate().unwrap_err().field(), Some("curve.soc_th"));
        let p = CurveParameters::new(0.1, 0.05, 0.9, 150.0);
        assert_eq!(p.validate().unwrap_err().field(), Some("curve.soc_th"));
    }

    #[test]
    fn inverted_window_rejected() {
        let p = CurveParameters::new(0.8, 0.5, 0.4, 150.0);
        assert_eq!(p.validate().unwrap_err().field(), Some("curve.soc_min"));
    }

    #[test]
    fn soc_above_one_rejected() {
        let p = CurveParameters::new(0.1, 0.5, 1.2, 150.0);
        assert_eq!(p.validate().unwrap_err().field(), Some("curve.soc_max"));
    }

    #[test]
    fn non_positive_power_rejected() {
        let p = CurveParameters::new(0.1, 0.5, 0.9, 0.0);
        assert_eq!(p.validate().unwrap_err().field(), Some("curve.p_cc"));
    }

    #[test]
    fn nan_rejected() {
        let p = CurveParameters::new(f64::NAN, 0.5, 0.9, 150.0);
        assert_eq!(p.validate().unwrap_err().field(), Some("curve.soc_min"));
    }

    #[test]
    fn non_positive_energy_nominal_rejected() {
        let p = params().with_energy_nominal(0.0);
        assert_eq!(
            p.validate().unwrap_err().field(),
            Some("curve.energy_nominal")
        );
    }

    #[test]
    fn model_selected_by_energy_nominal() {
        let a = CurveModel::from_parameters(params().with_energy_nominal(1.0)).unwrap();
        assert_eq!(a.kind(), "exponential_power");
        let b = CurveModel::from_parameters(params()).unwrap();
        assert_eq!(b.kind(), "exponential_soc");
        assert_eq!(b.parameters(), &params());
    }

    #[test]
    fn closures_are_power_curves() {
        let flat = |_soc: f64| 42.0;
        assert_eq!(flat.power_kw(0.3), 42.0);
    }
}
