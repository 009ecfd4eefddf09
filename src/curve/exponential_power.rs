use std::f64::consts::E;

use crate::curve::{CurveParameters, PowerCurve};
use crate::error::{Error, Result};

/// Charger power as an exponential function of SoC.
///
/// Below `soc_th` the charger delivers `p_cc`. Above it the power follows
///
/// ```text
/// p_cc / 10 * (1 / energy_nominal - 10) / (e - e^soc_th) * (e^soc - e^soc_th) + p_cc
/// ```
///
/// which equals `p_cc` at `soc_th` and `p_cc / (10 * energy_nominal)` at
/// full charge. The result is the authoritative instantaneous rate; it is
/// not assumed to decrease monotonically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialPowerCurve {
    params: CurveParameters,
    energy_nominal: f64,
}

impl ExponentialPowerCurve {
    /// Creates the curve.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `energy_nominal` is missing or
    /// non-positive, or if `params` break the SoC ordering.
    pub fn new(params: CurveParameters) -> Result<Self> {
        params.validate()?;
        let energy_nominal = params.energy_nominal.ok_or_else(|| {
            Error::invalid(
                "curve.energy_nominal",
                "required by the power-vs-SoC curve",
            )
        })?;
        Ok(Self {
            params,
            energy_nominal,
        })
    }

    pub fn parameters(&self) -> &CurveParameters {
        &self.params
    }

    pub fn energy_nominal(&self) -> f64 {
        self.energy_nominal
    }
}

impl PowerCurve for ExponentialPowerCurve {
    fn power_kw(&self, soc: f64) -> f64 {
        let CurveParameters { soc_th, p_cc, .. } = self.params;
        if soc < soc_th {
            return p_cc;
        }

        let span = E - soc_th.exp();
        // soc_th == 1: the taper collapses onto the single point soc == 1.
        if span <= 0.0 {
            return p_cc;
        }

        p_cc / 10.0 * (1.0 / self.energy_nominal - 10.0) / span * (soc.exp() - soc_th.exp()) + p_cc
    }
}
