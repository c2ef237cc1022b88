//! # Lateral control module
//!
//! Lateral control is responsible for keeping the vehicle on the reference
//! path. At every control step it finds the nearest waypoint ahead of the
//! vehicle, computes the lateral and heading errors relative to that
//! waypoint, linearises the error dynamics at the current speed, and solves
//! a continuous algebraic Riccati equation to obtain the optimal feedback
//! gain for that model. The steering command is the negated product of the
//! gain with the error vector.
//!
//! The model is rebuilt from the instantaneous speed on every step: the
//! error dynamics are velocity-dependent, so a gain computed at one speed is
//! wrong at another.
//!
//! The module is stateless apart from the nearest-waypoint cursor, which
//! only ever moves forward along the path. Reaching the final waypoint ends
//! the tracking episode; the caller decides whether to stop or switch modes.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod calc_errors;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::Params;
pub use state::*;

use crate::path::PathIndexError;
use crate::riccati::RiccatiError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LatCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LatCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Wheelbase must be positive, got {0} m")]
    NonPositiveWheelbase(f64),

    #[error("Steering effort weight must be positive, got {0}")]
    NonPositiveEffortWeight(f64),

    #[error("Search window must contain at least one waypoint")]
    EmptySearchWindow,

    /// Attempted to control before a reference path was set.
    #[error("No reference path has been set")]
    NoPath,

    /// The cursor has reached the final waypoint. Fatal to the tracking
    /// episode.
    #[error("Reached the end of the reference path")]
    EndOfPath,

    /// The linearised model contains non-finite entries, for instance at a
    /// slip angle of +/- pi/2.
    #[error("Linearised model is not finite at speed {speed_ms} m/s and slip angle {slip_rad} rad")]
    NonFiniteModel { speed_ms: f64, slip_rad: f64 },

    #[error("Riccati solver failed: {0}")]
    Riccati(#[from] RiccatiError),
}

impl From<PathIndexError> for LatCtrlError {
    fn from(error: PathIndexError) -> Self {
        match error {
            PathIndexError::EndOfPath => LatCtrlError::EndOfPath,
        }
    }
}
