//! Main path-tracking executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and modules
//!     - Load the reference path from the CSV file given on the command line
//!     - Main loop:
//!         - Build the vehicle observation for this cycle
//!         - Lateral control processing
//!         - Steering clamping and kinematic propagation
//!     - Archive the episode report into the session directory
//!
//! The loop's kinematic propagation stands in for the vehicle and its
//! environment; everything the controller sees goes through the
//! `VehicleObs` it would receive from a real platform.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::env;

// Internal
use trk_lib::{
    lat_ctrl::{LatCtrl, LatCtrlError, VehicleObs},
    path::RefPath,
};
use util::{
    logger::{logger_init, LevelFilter},
    maths::{clamp, wrap_to_pi},
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the executable.
#[derive(Deserialize, Debug, Clone)]
struct TrkExecParams {
    /// Target period of one cycle in seconds.
    cycle_period_s: f64,

    /// Actuator steering limit. Commands are clamped to +/- this value
    /// before being applied.
    max_steer_rad: f64,

    /// Hard limit on the number of cycles in one episode.
    max_cycles: usize,

    /// Lateral offset applied to the initial pose, so the episode starts
    /// with an error to correct.
    initial_lat_offset_m: f64,
}

/// One cycle of the episode, as archived in the session report.
#[derive(Serialize, Debug, Clone, Copy)]
struct CycleRecord {
    time_s: f64,
    x_m: f64,
    y_m: f64,
    yaw_rad: f64,
    steer_rad: f64,
    lat_error_m: f64,
    head_error_rad: f64,
    waypoint_index: usize,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("trk_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Path Tracking Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: TrkExecParams =
        params::load("trk_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- LOAD REFERENCE PATH ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        return Err(eyre!(
            "Expected the reference path CSV file as the only argument, found {} argument(s)",
            args.len() - 1
        ));
    }

    let ref_path = RefPath::from_csv_file(&args[1])
        .wrap_err_with(|| format!("Failed to load the reference path from {:?}", args[1]))?;

    info!(
        "Loaded reference path with {} waypoints from {:?}\n",
        ref_path.len(),
        args[1]
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut lat_ctrl = LatCtrl::init("lat_ctrl.toml").wrap_err("Failed to initialise LatCtrl")?;
    info!("LatCtrl init complete");

    // Initial pose: the first waypoint, pushed sideways by the configured
    // offset so there is an error to correct from cycle one
    let first = ref_path
        .get(0)
        .ok_or_else(|| eyre!("Reference path is empty"))?;
    let normal = Vector2::new(-first.heading_rad.sin(), first.heading_rad.cos());
    let mut position_m = first.position_m + normal * exec_params.initial_lat_offset_m;
    let mut yaw_rad = first.heading_rad;

    // Commanded velocity, seeded from the first waypoint and updated from
    // the reference speed of whichever waypoint is being tracked
    let mut speed_ms = first.speed_ms;

    let wheelbase_m = lat_ctrl.params().wheelbase_m;

    lat_ctrl.set_path(ref_path);

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    let dt_s = exec_params.cycle_period_s;
    let mut records: Vec<CycleRecord> = Vec::new();

    for cycle in 0..exec_params.max_cycles {
        // Observation for this cycle. The propagation below is kinematic,
        // so the slip angle is zero.
        let obs = VehicleObs {
            position_m,
            yaw_rad,
            slip_rad: 0.0,
            speed_ms,
            dt_s,
        };

        // Lateral control processing
        let (output, report) = match lat_ctrl.proc(&obs) {
            Ok(out) => out,
            Err(LatCtrlError::EndOfPath) => {
                info!("Reached the end of the reference path after {} cycles", cycle);
                break;
            }
            Err(e) => Err(e).wrap_err("Lateral control failed")?,
        };

        // Clamp to the actuator range and propagate
        let steer_rad = clamp(
            &output.steer_rad,
            &-exec_params.max_steer_rad,
            &exec_params.max_steer_rad,
        );

        debug!(
            "Cycle {}: lat error {:.3} m, head error {:.3} rad, steer {:.3} rad",
            cycle, report.lat_error_m, report.head_error_rad, steer_rad
        );

        records.push(CycleRecord {
            time_s: cycle as f64 * dt_s,
            x_m: position_m.x,
            y_m: position_m.y,
            yaw_rad,
            steer_rad,
            lat_error_m: report.lat_error_m,
            head_error_rad: report.head_error_rad,
            waypoint_index: output.waypoint_index,
        });

        // Kinematic propagation at the commanded speed, standing in for the
        // vehicle and environment
        speed_ms = output.ref_speed_ms;
        position_m.x += speed_ms * yaw_rad.cos() * dt_s;
        position_m.y += speed_ms * yaw_rad.sin() * dt_s;
        yaw_rad = wrap_to_pi(yaw_rad + speed_ms / wheelbase_m * steer_rad.tan() * dt_s);

        if cycle + 1 == exec_params.max_cycles {
            warn!("Cycle limit reached before the end of the path");
        }
    }

    // ---- ARCHIVE EPISODE ----

    session
        .save_json("episode_report.json", &records)
        .wrap_err("Failed to save the episode report")?;
    info!("Episode report saved ({} cycles)", records.len());

    Ok(())
}
