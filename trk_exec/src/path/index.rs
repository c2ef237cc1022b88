//! Monotone nearest-waypoint index
//!
//! [`PathIndex`] owns a reference path and a cursor which only ever moves
//! forward. Each nearest-waypoint query searches a bounded window ahead of
//! the cursor and advances the cursor to the result. Bounding the search
//! keeps the per-tick cost flat, at the price of never noticing a nearer
//! waypoint behind the vehicle; the assumption is forward motion along the
//! path. The cursor can only be reset by building a new index from a new
//! path.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Vector2;

// Internal
use super::{RefPath, Waypoint};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Forward-only nearest-waypoint search over a reference path.
pub struct PathIndex {
    path: RefPath,

    /// Index of the most recently matched waypoint. Monotone non-decreasing.
    cursor: usize,

    /// Number of waypoints ahead of the cursor considered by each query.
    window: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors raised by the index.
#[derive(Debug, thiserror::Error)]
pub enum PathIndexError {
    /// The cursor sits on the final waypoint: the tracking episode is over.
    #[error("Reached the end of the reference path")]
    EndOfPath,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PathIndex {
    /// Create a new index over the given path.
    ///
    /// The window is the number of waypoints ahead of the cursor searched by
    /// each query, and is clamped to at least one.
    pub fn new(path: RefPath, window: usize) -> Self {
        Self {
            path,
            cursor: 0,
            window: window.max(1),
        }
    }

    /// The current cursor position.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The path being indexed.
    pub fn path(&self) -> &RefPath {
        &self.path
    }

    /// Find the nearest waypoint to the given position within the search
    /// window, advancing the cursor to it.
    ///
    /// Fails with [`PathIndexError::EndOfPath`] once the cursor has reached
    /// the final waypoint, which ends the tracking episode.
    pub fn nearest(
        &mut self,
        position_m: &Vector2<f64>,
    ) -> Result<(usize, &Waypoint), PathIndexError> {
        if self.cursor >= self.path.len() - 1 {
            return Err(PathIndexError::EndOfPath);
        }

        let mut best_index = self.cursor;
        let mut best_dist_sq = f64::MAX;

        for (i, waypoint) in self
            .path
            .waypoints
            .iter()
            .enumerate()
            .skip(self.cursor)
            .take(self.window)
        {
            let dist_sq = (waypoint.position_m - position_m).norm_squared();
            if dist_sq < best_dist_sq {
                best_dist_sq = dist_sq;
                best_index = i;
            }
        }

        trace!(
            "Nearest waypoint {} at {:.3} m",
            best_index,
            best_dist_sq.sqrt()
        );

        self.cursor = best_index;

        Ok((best_index, &self.path.waypoints[best_index]))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    /// A straight path along the x axis with 1 m spacing.
    fn straight_path(num_points: usize) -> RefPath {
        let waypoints = (0..num_points)
            .map(|i| Waypoint {
                position_m: Vector2::new(i as f64, 0.0),
                heading_rad: 0.0,
                speed_ms: 1.0,
            })
            .collect();
        RefPath::from_waypoints(waypoints).unwrap()
    }

    #[test]
    fn test_nearest_picks_minimum_distance() {
        let mut index = PathIndex::new(straight_path(10), 100);

        let (i, waypoint) = index.nearest(&Vector2::new(3.2, 0.5)).unwrap();
        assert_eq!(i, 3);
        assert!((waypoint.position_m.x - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_cursor_is_monotone() {
        let mut index = PathIndex::new(straight_path(10), 100);

        // Forward-moving queries with a deliberate step backwards in the
        // middle; the returned index must never decrease
        let queries = [1.0, 3.0, 2.0, 5.0, 5.5, 8.9];
        let mut prev = 0;
        for &x in queries.iter() {
            let (i, _) = index.nearest(&Vector2::new(x, 0.1)).unwrap();
            assert!(i >= prev, "index went backwards: {} < {}", i, prev);
            prev = i;
        }
    }

    #[test]
    fn test_window_bounds_search() {
        let mut index = PathIndex::new(straight_path(10), 3);

        // The truly nearest waypoint (index 8) is outside the window
        // [0, 3), so the best in-window waypoint is returned
        let (i, _) = index.nearest(&Vector2::new(8.0, 0.0)).unwrap();
        assert_eq!(i, 2);
    }

    #[test]
    fn test_end_of_path() {
        let len = 5;
        let mut index = PathIndex::new(straight_path(len), 100);

        // len - 1 forward queries walk the cursor onto the final waypoint
        for i in 1..len {
            let (found, _) = index.nearest(&Vector2::new(i as f64, 0.0)).unwrap();
            assert_eq!(found, i);
        }

        // One more query is an error
        assert!(matches!(
            index.nearest(&Vector2::new(10.0, 0.0)),
            Err(PathIndexError::EndOfPath)
        ));
    }
}
