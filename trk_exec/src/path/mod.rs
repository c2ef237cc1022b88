//! # Reference path
//!
//! This module defines the waypoint path the controller tracks. A path is an
//! ordered sequence of waypoints, each carrying a position, the tangent
//! heading of the path at that point, and the reference speed. Order is
//! meaningful: the waypoint index is the measure of progress along the path,
//! and the nearest-waypoint search in [`index`] only ever moves it forward.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod index;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;

// Internal
pub use index::{PathIndex, PathIndexError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Minimum separation between consecutive waypoints. Coincident waypoints
/// would put a zero denominator into the nearest-point search.
const MIN_WAYPOINT_SEPARATION_M: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A single point of the reference path.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Waypoint {
    /// Position of the waypoint.
    pub position_m: Vector2<f64>,

    /// Heading of the path tangent at this waypoint, in (-pi, pi], measured
    /// from the positive x axis.
    pub heading_rad: f64,

    /// Reference speed at this waypoint.
    pub speed_ms: f64,
}

/// A validated reference path.
///
/// Construction guarantees at least two waypoints with no two consecutive
/// waypoints coincident. The path is immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefPath {
    waypoints: Vec<Waypoint>,
}

/// One row of a path CSV file.
#[derive(Debug, Deserialize)]
struct PathRecord {
    x_m: f64,
    y_m: f64,
    heading_rad: f64,
    speed_ms: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors raised while building a reference path.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    #[error("A reference path needs at least two waypoints, got {0}")]
    TooFewWaypoints(usize),

    #[error("Waypoints {0} and {1} are coincident")]
    CoincidentWaypoints(usize, usize),

    #[error("Could not read the path file: {0}")]
    FileReadError(#[from] csv::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RefPath {
    /// Build a path from a waypoint sequence, validating it.
    pub fn from_waypoints(waypoints: Vec<Waypoint>) -> Result<Self, PathError> {
        if waypoints.len() < 2 {
            return Err(PathError::TooFewWaypoints(waypoints.len()));
        }

        for i in 1..waypoints.len() {
            let separation_m = (waypoints[i].position_m - waypoints[i - 1].position_m).norm();
            if separation_m < MIN_WAYPOINT_SEPARATION_M {
                return Err(PathError::CoincidentWaypoints(i - 1, i));
            }
        }

        Ok(Self { waypoints })
    }

    /// Load a path from a CSV file with the columns
    /// `x_m, y_m, heading_rad, speed_ms`.
    pub fn from_csv_file<P: AsRef<FsPath>>(file_path: P) -> Result<Self, PathError> {
        let mut reader = csv::Reader::from_path(file_path)?;

        let mut waypoints = Vec::new();
        for record in reader.deserialize() {
            let record: PathRecord = record?;
            waypoints.push(Waypoint {
                position_m: Vector2::new(record.x_m, record.y_m),
                heading_rad: record.heading_rad,
                speed_ms: record.speed_ms,
            });
        }

        Self::from_waypoints(waypoints)
    }

    /// Get the number of waypoints in the path.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Get the waypoint at the given index.
    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn waypoint(x: f64, y: f64) -> Waypoint {
        Waypoint {
            position_m: Vector2::new(x, y),
            heading_rad: 0.0,
            speed_ms: 1.0,
        }
    }

    #[test]
    fn test_valid_path() {
        let path =
            RefPath::from_waypoints(vec![waypoint(0.0, 0.0), waypoint(1.0, 0.0)]).unwrap();
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn test_too_few_waypoints() {
        assert!(matches!(
            RefPath::from_waypoints(vec![waypoint(0.0, 0.0)]),
            Err(PathError::TooFewWaypoints(1))
        ));
    }

    #[test]
    fn test_coincident_waypoints() {
        let result = RefPath::from_waypoints(vec![
            waypoint(0.0, 0.0),
            waypoint(1.0, 0.0),
            waypoint(1.0, 0.0),
        ]);
        assert!(matches!(result, Err(PathError::CoincidentWaypoints(1, 2))));
    }

    #[test]
    fn test_csv_load() {
        let csv = "x_m,y_m,heading_rad,speed_ms\n\
                   0.0,0.0,0.0,2.0\n\
                   1.0,0.5,0.4636,2.0\n\
                   2.0,1.0,0.4636,1.5\n";

        let mut file_path = std::env::temp_dir();
        file_path.push("trk_lib_path_mod_test.csv");
        std::fs::write(&file_path, csv).unwrap();

        let path = RefPath::from_csv_file(&file_path).unwrap();
        std::fs::remove_file(&file_path).unwrap();

        assert_eq!(path.len(), 3);
        assert!((path.get(1).unwrap().position_m.x - 1.0).abs() < 1e-12);
        assert!((path.get(2).unwrap().speed_ms - 1.5).abs() < 1e-12);
    }
}
