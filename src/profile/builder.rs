use ordered_float::OrderedFloat;
use tracing::{debug, instrument};

use crate::curve::{CurveModel, CurveParameters, PowerCurve, SocTrajectory};
use crate::error::{ComputationError, Error, Result};
use crate::profile::{ChargeProfile, ProfileSample, Resolution};
use crate::vehicle::VehicleEnergyProfile;

/// Upper bound on table size, whichever way the resolution is given.
pub const MAX_SAMPLES: usize = 1_000_000;

/// Builds the charge profile of a vehicle at the given resolution.
///
/// Power-vs-SoC curves are integrated over a SoC grid. The closed-form
/// time curve is sampled at evenly spaced times for [`Resolution::Samples`]
/// and inverted exactly on a SoC grid for [`Resolution::Precision`].
///
/// # Errors
///
/// Returns `InvalidParameter` for an empty charging window or a bad
/// resolution, `DivisionByZero` if a power curve yields no effective
/// power somewhere in the window, and `TimeOverflow` if the power is so low
/// that the charging time is no longer finite. No partial table is ever
/// returned.
#[instrument(
    skip(vehicle),
    fields(curve = vehicle.curve().kind(), capacity_kwh = vehicle.effective_capacity_kwh())
)]
pub fn build_profile(
    vehicle: &VehicleEnergyProfile,
    resolution: Resolution,
) -> Result<ChargeProfile> {
    let params = vehicle.curve_parameters();
    check_window(params)?;
    resolution.validate()?;

    let profile = match (vehicle.curve(), resolution) {
        (CurveModel::ExponentialPower(curve), Resolution::Precision(OrderedFloat(step))) => {
            power_table(vehicle, curve, &soc_grid(params, step)?)?
        }
        (CurveModel::ExponentialPower(curve), Resolution::Samples(num)) => {
            let step = params.soc_window() / (num - 1) as f64;
            power_table(vehicle, curve, &soc_grid(params, step)?)?
        }
        (CurveModel::ExponentialSoc(curve), Resolution::Samples(num)) => {
            let trajectory =
                curve.trajectory(vehicle.effective_capacity_kwh(), vehicle.charging_efficiency())?;
            time_table(&trajectory, num)
        }
        (CurveModel::ExponentialSoc(curve), Resolution::Precision(OrderedFloat(step))) => {
            let trajectory =
                curve.trajectory(vehicle.effective_capacity_kwh(), vehicle.charging_efficiency())?;
            inverse_table(&trajectory, params.soc_min, &soc_grid(params, step)?)
        }
    };

    debug!(
        samples = profile.len(),
        time_to_full_h = profile.time_to_full(),
        "Built charge profile"
    );
    Ok(profile)
}

/// Builds a power-driven profile from a caller-supplied power curve.
///
/// The vehicle's own curve supplies only the SoC window; power comes from
/// `curve`. Starting at `(0, soc_min)`, each step advances SoC by
/// `min(precision, soc_max - soc)` and adds
/// `capacity * Δsoc / (power(soc_after_step) * efficiency)` hours.
///
/// # Errors
///
/// Same as [`build_profile`].
pub fn build_profile_with(
    vehicle: &VehicleEnergyProfile,
    curve: &impl PowerCurve,
    precision: f64,
) -> Result<ChargeProfile> {
    let params = vehicle.curve_parameters();
    check_window(params)?;
    Resolution::precision(precision).validate()?;
    power_table(vehicle, curve, &soc_grid(params, precision)?)
}

fn check_window(params: &CurveParameters) -> Result<()> {
    if params.soc_max <= params.soc_min {
        return Err(Error::invalid(
            "curve.soc_max",
            "must be > curve.soc_min for a non-empty charging window",
        ));
    }
    Ok(())
}

/// SoC points after each step, `soc_min` excluded and `soc_max` included.
///
/// Points are `soc_min + i * step` rather than a running sum, with the last
/// one pinned to `soc_max`, so the table ends exactly at full.
fn soc_grid(params: &CurveParameters, step: f64) -> Result<Vec<f64>> {
    let window = params.soc_window();
    let ratio = window / step;
    // A hair under an integer ratio still counts as that many steps.
    let n_steps = (ratio - 1e-9).ceil().max(1.0);
    if n_steps > MAX_SAMPLES as f64 {
        return Err(Error::invalid(
            "resolution.precision",
            format!("too fine for a SoC window of {window}"),
        ));
    }

    let n_steps = n_steps as usize;
    Ok((1..=n_steps)
        .map(|i| {
            if i == n_steps {
                params.soc_max
            } else {
                params.soc_min + i as f64 * step
            }
        })
        .collect())
}

fn power_table(
    vehicle: &VehicleEnergyProfile,
    curve: &impl PowerCurve,
    grid: &[f64],
) -> Result<ChargeProfile> {
    let capacity_kwh = vehicle.effective_capacity_kwh();
    let efficiency = vehicle.charging_efficiency();

    let mut soc = vehicle.curve_parameters().soc_min;
    let mut time_h = 0.0;
    let mut samples = Vec::with_capacity(grid.len() + 1);
    samples.push(ProfileSample::new(time_h, soc));

    for &next in grid {
        let amount_kwh = capacity_kwh * (next - soc);
        let effective_kw = curve.power_kw(next) * efficiency;
        if !(effective_kw.is_finite() && effective_kw > 0.0) {
            return Err(ComputationError::DivisionByZero {
                soc: next,
                power_kw: effective_kw,
            }
            .into());
        }
        let next_time_h = time_h + amount_kwh / effective_kw;
        if !(next_time_h.is_finite() && next_time_h > time_h) {
            return Err(ComputationError::TimeOverflow {
                soc: next,
                time_h: next_time_h,
            }
            .into());
        }
        time_h = next_time_h;
        soc = next;
        samples.push(ProfileSample::new(time_h, soc));
    }

    Ok(ChargeProfile::from_samples(samples))
}

/// Evenly spaced times over `[0, ceil(full_time)]`, evaluated in closed form.
fn time_table(trajectory: &SocTrajectory, num: usize) -> ChargeProfile {
    let horizon = trajectory.full_time().ceil();
    let last = num - 1;
    let samples = (0..num)
        .map(|i| {
            let t = if i == last {
                horizon
            } else {
                horizon * i as f64 / last as f64
            };
            ProfileSample::new(t, trajectory.soc_at(t))
        })
        .collect();
    ChargeProfile::from_samples(samples)
}

/// SoC grid with exact times from the closed-form inverse.
fn inverse_table(trajectory: &SocTrajectory, soc_min: f64, grid: &[f64]) -> ChargeProfile {
    let samples = std::iter::once(ProfileSample::new(0.0, soc_min))
        .chain(
            grid.iter()
                .map(|&soc| ProfileSample::new(trajectory.time_at(soc), soc)),
        )
        .collect();
    ChargeProfile::from_samples(samples)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn power_vehicle() -> VehicleEnergyProfile {
        let params = CurveParameters::new(0.1, 0.5, 0.9, 150.0).with_energy_nominal(1.0);
        VehicleEnergyProfile::new(300.0, 0.9, params).unwrap()
    }

    fn soc_vehicle() -> VehicleEnergyProfile {
        VehicleEnergyProfile::new(300.0, 0.9, CurveParameters::new(0.1, 0.5, 0.9, 150.0)).unwrap()
    }

    #[test]
    fn grid_ends_exactly_at_soc_max() {
        let params = CurveParameters::new(0.1, 0.5, 0.9, 150.0);
        let grid = soc_grid(&params, 0.1).unwrap();
        assert_eq!(grid.len(), 8);
        assert_eq!(grid.last().copied(), Some(0.9));
    }

    #[test]
    fn grid_with_uneven_step_has_short_last_step() {
        let params = CurveParameters::new(0.1, 0.5, 0.9, 150.0);
        let grid = soc_grid(&params, 0.3).unwrap();
        assert_eq!(grid.len(), 3);
        assert_abs_diff_eq!(grid[0], 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(grid[1], 0.7, epsilon = 1e-12);
        assert_eq!(grid[2], 0.9);
    }

    #[test]
    fn grid_with_oversized_step_is_single_step() {
        let params = CurveParameters::new(0.1, 0.5, 0.9, 150.0);
        assert_eq!(soc_grid(&params, 5.0).unwrap(), vec![0.9]);
    }

    #[test]
    fn grid_rejects_absurd_precision() {
        let params = CurveParameters::new(0.1, 0.5, 0.9, 150.0);
        let err = soc_grid(&params, 1e-12).unwrap_err();
        assert_eq!(err.field(), Some("resolution.precision"));
    }

    #[test]
    fn constant_phase_time_is_energy_over_power() {
        let profile = build_profile(&power_vehicle(), Resolution::precision(0.1)).unwrap();
        // 0.1 -> 0.5 at 135 kW effective: 0.4 * 300 / 135 h
        assert_abs_diff_eq!(profile.samples()[4].soc, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(profile.samples()[4].time_h, 120.0 / 135.0, epsilon = 1e-9);
    }

    #[test]
    fn samples_resolution_on_power_curve_gives_exact_count() {
        let profile = build_profile(&power_vehicle(), Resolution::samples(21)).unwrap();
        assert_eq!(profile.len(), 21);
        assert_eq!(profile.soc_max(), 0.9);
    }

    #[test]
    fn time_table_has_requested_count_and_horizon() {
        let profile = build_profile(&soc_vehicle(), Resolution::samples(21)).unwrap();
        assert_eq!(profile.len(), 21);
        assert_eq!(profile.first(), ProfileSample::new(0.0, 0.1));
        assert_eq!(profile.soc_max(), 0.9);
        assert_eq!(profile.horizon(), profile.horizon().ceil());
    }

    #[test]
    fn inverse_table_uses_exact_times() {
        let vehicle = soc_vehicle();
        let profile = build_profile(&vehicle, Resolution::precision(0.1)).unwrap();
        assert_eq!(profile.len(), 9);
        assert_abs_diff_eq!(profile.samples()[4].time_h, 120.0 / 135.0, epsilon = 1e-9);
        let CurveModel::ExponentialSoc(curve) = vehicle.curve() else {
            unreachable!()
        };
        let trajectory = curve.trajectory(300.0, 0.9).unwrap();
        assert_abs_diff_eq!(profile.time_to_full(), trajectory.full_time(), epsilon = 1e-12);
    }

    #[test]
    fn zero_power_aborts() {
        let dead = |soc: f64| if soc > 0.6 { 0.0 } else { 100.0 };
        let err = build_profile_with(&power_vehicle(), &dead, 0.1).unwrap_err();
        assert!(matches!(
            err,
            Error::Computation(ComputationError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn negative_and_nan_power_abort() {
        let negative = |_soc: f64| -10.0;
        assert!(build_profile_with(&power_vehicle(), &negative, 0.1).is_err());
        let nan = |_soc: f64| f64::NAN;
        assert!(build_profile_with(&power_vehicle(), &nan, 0.1).is_err());
    }

    #[test]
    fn vanishing_power_aborts_instead_of_infinite_time() {
        let vanishing = |_soc: f64| 1e-320;
        for precision in [5.0, 0.1] {
            let err = build_profile_with(&power_vehicle(), &vanishing, precision).unwrap_err();
            assert!(
                matches!(
                    err,
                    Error::Computation(ComputationError::TimeOverflow { .. })
                ),
                "precision {precision}: {err}"
            );
        }
    }

    #[test]
    fn empty_window_rejected() {
        let params = CurveParameters::new(0.5, 0.5, 0.5, 150.0);
        let vehicle = VehicleEnergyProfile::new(300.0, 0.9, params).unwrap();
        let err = build_profile(&vehicle, Resolution::samples(21)).unwrap_err();
        assert_eq!(err.field(), Some("curve.soc_max"));
    }

    #[test]
    fn bad_resolution_rejected() {
        let err = build_profile(&soc_vehicle(), Resolution::samples(1)).unwrap_err();
        assert_eq!(err.field(), Some("resolution.samples"));
        let err = build_profile(&power_vehicle(), Resolution::precision(0.0)).unwrap_err();
        assert_eq!(err.field(), Some("resolution.precision"));
    }

    #[test]
    fn integrating_implied_power_converges_to_closed_form() {
        let vehicle = soc_vehicle();
        let CurveModel::ExponentialSoc(curve) = vehicle.curve() else {
            unreachable!()
        };
        let trajectory = curve.trajectory(300.0, 0.9).unwrap();
        let numeric = build_profile_with(&vehicle, &trajectory, 1e-4).unwrap();
        assert_abs_diff_eq!(numeric.time_to_full(), trajectory.full_time(), epsilon = 1e-2);
    }
}
