//! Lateral control parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;

// Internal
use crate::riccati::SolverParams;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for lateral control
#[derive(Deserialize, Debug, Clone)]
pub struct Params {
    /// Wheelbase of the vehicle in meters. Must be positive.
    pub wheelbase_m: f64,

    /// State weight on the lateral error.
    pub lat_error_weight: f64,

    /// State weight on the heading error.
    pub head_error_weight: f64,

    /// Weight on the steering effort. Must be positive.
    pub steer_effort_weight: f64,

    /// Number of waypoints ahead of the cursor searched for the nearest
    /// waypoint each step. Larger windows cost more per step but tolerate
    /// bigger jumps along the path between steps.
    pub search_window: usize,

    /// Largest imaginary part tolerated in the steering command before the
    /// step is flagged in the status report.
    pub imag_tolerance: f64,

    /// Riccati solver tolerances.
    pub riccati: SolverParams,
}
