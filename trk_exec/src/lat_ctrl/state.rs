//! Implementations for the LatCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use nalgebra::{Complex, DMatrix, DVector, Vector2};
use serde::Serialize;

// Internal
use super::{calc_errors, LatCtrlError, Params};
use crate::path::{PathIndex, RefPath};
use crate::riccati;
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lateral control module state
pub struct LatCtrl {
    params: Params,

    /// State weight matrix Q, built from the parameters.
    q: DMatrix<f64>,

    /// Steering effort weight matrix R and its inverse.
    r: DMatrix<f64>,
    r_inv: DMatrix<f64>,

    /// Index over the reference path. `None` until a path is set.
    path_index: Option<PathIndex>,
}

/// The vehicle state observed at the start of a control step.
///
/// Transient input: the controller does not hold on to it beyond the step.
#[derive(Debug, Clone, Copy)]
pub struct VehicleObs {
    /// Position of the vehicle.
    pub position_m: Vector2<f64>,

    /// Yaw of the vehicle body, measured from the positive x axis.
    pub yaw_rad: f64,

    /// Slip angle between the body axis and the velocity vector.
    pub slip_rad: f64,

    /// Speed of the vehicle.
    pub speed_ms: f64,

    /// Interval since the previous control step. The control law itself
    /// performs no integration over it.
    pub dt_s: f64,
}

/// Output command from LatCtrl.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OutputData {
    /// Steering command in radians. Clamping to the actuator range is the
    /// caller's responsibility.
    pub steer_rad: f64,

    /// Index of the waypoint the errors were measured against.
    pub waypoint_index: usize,

    /// Reference speed at that waypoint.
    pub ref_speed_ms: f64,
}

/// The status report containing various error flags and monitoring
/// quantities.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    /// The lateral error to the nearest waypoint
    pub lat_error_m: f64,

    /// The heading error to the nearest waypoint
    pub head_error_rad: f64,

    /// If true the Riccati solution came from the pseudo-inverse fallback
    /// and the gain may be inaccurate.
    pub degenerate_solution: bool,

    /// If true the imaginary part discarded from the steering command
    /// exceeded the configured tolerance.
    pub imag_residual_exceeded: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LatCtrl {
    /// Initialise the LatCtrl module from a parameter file.
    ///
    /// Expected init data is the path to the parameter file.
    pub fn init(params_path: &str) -> Result<Self, LatCtrlError> {
        Self::new(params::load(params_path)?)
    }

    /// Create the module directly from a parameter struct, validating it.
    pub fn new(params: Params) -> Result<Self, LatCtrlError> {
        if params.wheelbase_m <= 0.0 {
            return Err(LatCtrlError::NonPositiveWheelbase(params.wheelbase_m));
        }
        if params.steer_effort_weight <= 0.0 {
            return Err(LatCtrlError::NonPositiveEffortWeight(
                params.steer_effort_weight,
            ));
        }
        if params.search_window == 0 {
            return Err(LatCtrlError::EmptySearchWindow);
        }

        let q = DMatrix::from_diagonal(&DVector::from_vec(vec![
            params.lat_error_weight,
            params.head_error_weight,
        ]));
        let r = DMatrix::from_element(1, 1, params.steer_effort_weight);
        let r_inv = DMatrix::from_element(1, 1, 1.0 / params.steer_effort_weight);

        Ok(Self {
            params,
            q,
            r,
            r_inv,
            path_index: None,
        })
    }

    /// The module's parameters.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Set a new reference path to track.
    ///
    /// Replaces any current path and resets the nearest-waypoint cursor.
    /// This is the only way the cursor moves backwards.
    pub fn set_path(&mut self, path: RefPath) {
        self.path_index = Some(PathIndex::new(path, self.params.search_window));
    }

    /// Process one control step.
    ///
    /// Computes the steering command for the observed vehicle state. The
    /// cursor into the reference path advances as a side effect. Structural
    /// failures (end of path, non-stabilisable model) are returned as
    /// errors and not retried: identical inputs would fail identically.
    pub fn proc(&mut self, obs: &VehicleObs) -> Result<(OutputData, StatusReport), LatCtrlError> {
        let mut report = StatusReport::default();

        // Nearest waypoint ahead of the cursor
        let path_index = self.path_index.as_mut().ok_or(LatCtrlError::NoPath)?;
        let (waypoint_index, waypoint) = path_index.nearest(&obs.position_m)?;
        let waypoint = *waypoint;

        // Error signals relative to that waypoint
        let lat_error_m = calc_errors::lateral_error(&obs.position_m, &waypoint);
        let head_error_rad = calc_errors::heading_error(obs.yaw_rad, &waypoint);
        report.lat_error_m = lat_error_m;
        report.head_error_rad = head_error_rad;

        // Linearised error dynamics at the current speed, rebuilt every step
        let v = obs.speed_ms;
        let steer_gain = v / (self.params.wheelbase_m * obs.slip_rad.cos().powi(2));
        if !v.is_finite() || !steer_gain.is_finite() {
            return Err(LatCtrlError::NonFiniteModel {
                speed_ms: v,
                slip_rad: obs.slip_rad,
            });
        }
        let a = DMatrix::from_row_slice(2, 2, &[0.0, v, 0.0, 0.0]);
        let b = DMatrix::from_row_slice(2, 1, &[0.0, steer_gain]);

        // Stabilising Riccati solution for this step's model
        let solution = riccati::solve(&a, &b, &self.q, &self.r, &self.params.riccati)?;
        report.degenerate_solution = solution.degenerate;

        // Feedback gain F = R^-1 B' P, kept complex so any imaginary residue
        // left by the solver can be measured on the final command
        let b_c = b.map(|x| Complex::new(x, 0.0));
        let r_inv_c = self.r_inv.map(|x| Complex::new(x, 0.0));
        let gain = r_inv_c * b_c.transpose() * &solution.p;

        let errors = DVector::from_vec(vec![
            Complex::new(lat_error_m, 0.0),
            Complex::new(head_error_rad, 0.0),
        ]);

        let steer = -(&gain * &errors)[(0, 0)];

        if steer.im.abs() > self.params.imag_tolerance {
            warn!(
                "Discarded imaginary part of the steering command is {:.3e}, \
                 above tolerance {:.3e}",
                steer.im, self.params.imag_tolerance
            );
            report.imag_residual_exceeded = true;
        }

        debug!(
            "Waypoint {}: lat error {:.3} m, head error {:.3} rad, steer {:.3} rad",
            waypoint_index, lat_error_m, head_error_rad, steer.re
        );

        Ok((
            OutputData {
                steer_rad: steer.re,
                waypoint_index,
                ref_speed_ms: waypoint.speed_ms,
            },
            report,
        ))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
