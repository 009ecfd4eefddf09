use crate::curve::{CurveParameters, PowerCurve};
use crate::error::{Error, Result};

/// SoC as a closed-form function of charging time.
///
/// With `p_eff = p_cc * charging_efficiency` and `t_th` the time to reach
/// `soc_th` at constant power:
///
/// ```text
/// soc(t) = p_eff * t / capacity + soc_min                              t <= t_th
///        = p_eff * e^t_th * (e^-t_th - e^-t) / capacity + soc_th       t >  t_th
/// ```
///
/// clamped to `soc_max`. Both pieces are invertible in closed form, so the
/// curve needs no numerical integration. Times are in hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialSocCurve {
    params: CurveParameters,
}

impl ExponentialSocCurve {
    /// Creates the curve. `energy_nominal` is ignored by this formulation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `params` break the SoC ordering or
    /// `p_cc` is not positive.
    pub fn new(params: CurveParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn parameters(&self) -> &CurveParameters {
        &self.params
    }

    /// Binds the curve to a battery, yielding the time-domain trajectory.
    ///
    /// # Errors
    ///
    /// See [`SocTrajectory::new`].
    pub fn trajectory(
        &self,
        effective_capacity_kwh: f64,
        charging_efficiency: f64,
    ) -> Result<SocTrajectory> {
        SocTrajectory::new(self.params, effective_capacity_kwh, charging_efficiency)
    }
}

/// [`ExponentialSocCurve`] evaluated for one battery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocTrajectory {
    soc_min: f64,
    soc_th: f64,
    soc_max: f64,
    effective_capacity_kwh: f64,
    charging_efficiency: f64,
    /// SoC gained per hour in the constant phase, `p_eff / capacity`.
    rate: f64,
    t_th: f64,
    t_full: f64,
}

impl SocTrajectory {
    /// Creates the trajectory.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the capacity or efficiency are out of
    /// range, or if the taper saturates (at `soc_th + p_eff / capacity`)
    /// before reaching `soc_max`.
    pub fn new(
        params: CurveParameters,
        effective_capacity_kwh: f64,
        charging_efficiency: f64,
    ) -> Result<Self> {
        params.validate()?;
        if !(effective_capacity_kwh.is_finite() && effective_capacity_kwh > 0.0) {
            return Err(Error::invalid("vehicle.effective_capacity_kwh", "must be > 0"));
        }
        if !(charging_efficiency > 0.0 && charging_efficiency <= 1.0) {
            return Err(Error::invalid(
                "vehicle.charging_efficiency",
                "must be in (0.0, 1.0]",
            ));
        }

        let CurveParameters {
            soc_min,
            soc_th,
            soc_max,
            p_cc,
            ..
        } = params;
        let rate = p_cc * charging_efficiency / effective_capacity_kwh;
        let t_th = (soc_th - soc_min) / rate;

        let t_full = if soc_max > soc_th {
            let reach = (soc_max - soc_th) / rate;
            if reach >= 1.0 {
                return Err(Error::invalid(
                    "curve.soc_max",
                    format!(
                        "unreachable: taper saturates at SoC {:.4}",
                        soc_th + rate
                    ),
                ));
            }
            t_th - (-reach).ln_1p()
        } else {
            t_th
        };

        Ok(Self {
            soc_min,
            soc_th,
            soc_max,
            effective_capacity_kwh,
            charging_efficiency,
            rate,
            t_th,
            t_full,
        })
    }

    /// Effective charging power `p_cc * charging_efficiency` in kW.
    pub fn effective_power_kw(&self) -> f64 {
        self.rate * self.effective_capacity_kwh
    }

    /// Hours until `soc_th` is reached.
    pub fn threshold_time(&self) -> f64 {
        self.t_th
    }

    /// Hours until `soc_max` is reached.
    pub fn full_time(&self) -> f64 {
        self.t_full
    }

    /// SoC after `t` hours of charging from `soc_min`.
    ///
    /// Negative `t` yields `soc_min`; anything at or past [`Self::full_time`]
    /// yields exactly `soc_max`.
    pub fn soc_at(&self, t: f64) -> f64 {
        if t.is_nan() || t <= 0.0 {
            return self.soc_min;
        }
        if t >= self.t_full {
            return self.soc_max;
        }
        let soc = if t <= self.t_th {
            self.rate * t + self.soc_min
        } else {
            self.taper_soc(t)
        };
        soc.min(self.soc_max)
    }

    /// Hours needed to charge from `soc_min` to `soc`; inverse of [`Self::soc_at`].
    pub fn time_at(&self, soc: f64) -> f64 {
        if soc.is_nan() || soc <= self.soc_min {
            return 0.0;
        }
        if soc >= self.soc_max {
            return self.t_full;
        }
        if soc <= self.soc_th {
            (soc - self.soc_min) / self.rate
        } else {
            self.t_th - (-(soc - self.soc_th) / self.rate).ln_1p()
        }
    }

    // p_eff * e^t_th * (e^-t_th - e^-t) / capacity + soc_th, rearranged to
    // soc_th - rate * (e^(t_th - t) - 1).
    fn taper_soc(&self, t: f64) -> f64 {
        self.soc_th - self.rate * (self.t_th - t).exp_m1()
    }
}

/// The charger power implied by the trajectory's slope.
impl PowerCurve for SocTrajectory {
    fn power_kw(&self, soc: f64) -> f64 {
        let soc_per_hour = if soc < self.soc_th {
            self.rate
        } else {
            self.rate - (soc - self.soc_th)
        };
        soc_per_hour * self.effective_capacity_kwh / self.charging_efficiency
    }
}
