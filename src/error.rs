//! Error types for charging-curve construction and fleet lookups.

use thiserror::Error;

use crate::vehicle::VehicleTypeId;

/// Result type for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating inputs or building a charge profile.
///
/// Validation happens once, when a profile is built. A profile that was
/// built successfully never produces an error on query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An input violates its documented range or ordering.
    #[error("invalid parameter {field}: {message}")]
    InvalidParameter {
        /// Dotted field path (e.g., `"curve.soc_th"`).
        field: String,
        /// Human-readable constraint description.
        message: String,
    },

    /// Numeric failure while building a profile table.
    #[error(transparent)]
    Computation(#[from] ComputationError),

    /// The catalog has no vehicle type with this id.
    #[error("unknown vehicle type {0}")]
    UnknownVehicleType(VehicleTypeId),
}

impl Error {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the offending field path for `InvalidParameter` errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::InvalidParameter { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Failures of the table arithmetic itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComputationError {
    /// Effective charging power was zero or negative at this SoC.
    #[error("effective charging power is {power_kw} kW at SoC {soc}; cannot integrate")]
    DivisionByZero {
        /// SoC at the end of the step being integrated.
        soc: f64,
        /// Effective (post-efficiency) power at that SoC.
        power_kw: f64,
    },

    /// Accumulated charging time stopped being finite and increasing.
    #[error("charging time reaches {time_h} h at SoC {soc}; power is too low to tabulate")]
    TimeOverflow {
        /// SoC at the end of the step being integrated.
        soc: f64,
        /// Accumulated time after that step.
        time_h: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_parameter_display_includes_field() {
        let e = Error::invalid("curve.p_cc", "must be > 0");
        assert_eq!(e.to_string(), "invalid parameter curve.p_cc: must be > 0");
        assert_eq!(e.field(), Some("curve.p_cc"));
    }

    #[test]
    fn division_by_zero_converts_into_error() {
        let e: Error = ComputationError::DivisionByZero {
            soc: 0.5,
            power_kw: 0.0,
        }
        .into();
        assert!(matches!(
            e,
            Error::Computation(ComputationError::DivisionByZero { .. })
        ));
        assert!(e.field().is_none());
    }
}
