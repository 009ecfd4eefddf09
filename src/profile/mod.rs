//! Discretized time/SoC charge profiles and their interpolation.

mod builder;
/// Compute-once cache of built profiles.
pub mod cache;

pub use builder::{MAX_SAMPLES, build_profile, build_profile_with};
pub use cache::ProfileCache;

use std::fmt;

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::curve::CurveModel;
use crate::error::{Error, Result};

/// Sampling density of a profile table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// SoC step between consecutive samples.
    Precision(OrderedFloat<f64>),
    /// Total number of samples, boundaries included.
    Samples(usize),
}

impl Resolution {
    pub const DEFAULT_PRECISION: f64 = 0.1;
    pub const DEFAULT_SAMPLES: usize = 21;

    pub fn precision(step: f64) -> Self {
        Self::Precision(OrderedFloat(step))
    }

    pub fn samples(num: usize) -> Self {
        Self::Samples(num)
    }

    /// The natural resolution of each curve formulation: a SoC step for
    /// power curves, a sample count for the closed-form time curve.
    pub fn default_for(curve: &CurveModel) -> Self {
        match curve {
            CurveModel::ExponentialPower(_) => Self::precision(Self::DEFAULT_PRECISION),
            CurveModel::ExponentialSoc(_) => Self::samples(Self::DEFAULT_SAMPLES),
        }
    }

    /// # Errors
    ///
    /// Returns `InvalidParameter` for a non-positive or non-finite
    /// precision, or fewer than two samples.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Precision(OrderedFloat(step)) => {
                if !(step.is_finite() && step > 0.0) {
                    return Err(Error::invalid("resolution.precision", "must be > 0"));
                }
            }
            Self::Samples(num) => {
                if num < 2 {
                    return Err(Error::invalid("resolution.samples", "must be >= 2"));
                }
                if num > MAX_SAMPLES {
                    return Err(Error::invalid(
                        "resolution.samples",
                        format!("must be <= {MAX_SAMPLES}"),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Precision(step) => write!(f, "precision {step}"),
            Self::Samples(num) => write!(f, "{num} samples"),
        }
    }
}

/// One row of a profile table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileSample {
    /// Hours since charging started at `soc_min`.
    pub time_h: f64,
    pub soc: f64,
}

impl ProfileSample {
    pub fn new(time_h: f64, soc: f64) -> Self {
        Self { time_h, soc }
    }
}

/// Immutable `(time, soc)` lookup table for one vehicle and resolution.
///
/// Samples are strictly increasing in time and non-decreasing in SoC. The
/// first sample is `(0, soc_min)` and the last sample sits at `soc_max`.
/// Queries outside the table clamp to its boundaries and never fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeProfile {
    samples: Vec<ProfileSample>,
}

impl ChargeProfile {
    /// Wraps a table produced by the builder. Callers guarantee at least
    /// two samples and the ordering invariant.
    pub(crate) fn from_samples(samples: Vec<ProfileSample>) -> Self {
        debug_assert!(samples.len() >= 2);
        debug_assert!(
            samples
                .windows(2)
                .all(|w| w[0].time_h < w[1].time_h && w[0].soc <= w[1].soc)
        );
        Self { samples }
    }

    pub fn samples(&self) -> &[ProfileSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false; a built profile holds at least its two boundary samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> ProfileSample {
        self.samples[0]
    }

    pub fn last(&self) -> ProfileSample {
        self.samples[self.samples.len() - 1]
    }

    pub fn soc_min(&self) -> f64 {
        self.first().soc
    }

    pub fn soc_max(&self) -> f64 {
        self.last().soc
    }

    /// Time of the last sample. Time-driven tables may extend past the
    /// moment `soc_max` is reached; see [`Self::time_to_full`].
    pub fn horizon(&self) -> f64 {
        self.last().time_h
    }

    /// Hours from `soc_min` until the table first reaches `soc_max`.
    pub fn time_to_full(&self) -> f64 {
        self.time_to_reach(self.soc_max())
    }

    /// SoC after charging for `t` hours from `soc_min`.
    ///
    /// Linear between bracketing samples. Times before the first sample
    /// (including negative and NaN times) return `soc_min`; times after the
    /// last sample return `soc_max`.
    pub fn interpolate(&self, t: f64) -> f64 {
        let first = self.first();
        let last = self.last();
        if t.is_nan() || t <= first.time_h {
            return first.soc;
        }
        if t >= last.time_h {
            return last.soc;
        }

        // first.time_h < t < last.time_h, so 1 <= hi < len
        let hi = self.samples.partition_point(|s| s.time_h <= t);
        let (a, b) = (self.samples[hi - 1], self.samples[hi]);
        let frac = (t - a.time_h) / (b.time_h - a.time_h);
        (a.soc + frac * (b.soc - a.soc)).clamp(first.soc, last.soc)
    }

    /// Hours from `soc_min` until `soc` is first reached; the inverse of
    /// [`Self::interpolate`] over the same table.
    ///
    /// SoC at or below `soc_min` returns 0. SoC at or above `soc_max`
    /// returns the time of the first sample at `soc_max`.
    pub fn time_to_reach(&self, soc: f64) -> f64 {
        let first = self.first();
        if soc.is_nan() || soc <= first.soc {
            return first.time_h;
        }
        let target = soc.min(self.soc_max());

        // samples[0].soc < target, so hi >= 1
        let hi = self.samples.partition_point(|s| s.soc < target);
        let (a, b) = (self.samples[hi - 1], self.samples[hi]);
        let frac = (target - a.soc) / (b.soc - a.soc);
        a.time_h + frac * (b.time_h - a.time_h)
    }

    /// SoC after charging for `hours`, starting at `start_soc`.
    ///
    /// Starts below `soc_min` charge from `soc_min`; negative durations
    /// count as zero. Charging never lowers the SoC, so a start above
    /// `soc_max` is returned unchanged.
    pub fn soc_after_charging(&self, start_soc: f64, hours: f64) -> f64 {
        let start = self.time_to_reach(start_soc);
        let charged = self.interpolate(start + hours.max(0.0));
        if start_soc > charged { start_soc } else { charged }
    }

    /// Hours needed to charge from `from_soc` to `to_soc`; zero when
    /// `to_soc` is not above `from_soc`.
    pub fn charging_duration(&self, from_soc: f64, to_soc: f64) -> f64 {
        (self.time_to_reach(to_soc) - self.time_to_reach(from_soc)).max(0.0)
    }
}
