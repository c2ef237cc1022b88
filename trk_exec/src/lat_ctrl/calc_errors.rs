//! Error signal calculations
//!
//! The error signals are measured against the single nearest waypoint: the
//! lateral error is the distance to that waypoint signed by which side of
//! its tangent the vehicle is on, and the heading error is the wrapped
//! difference between the vehicle yaw and the waypoint heading.
//!
//! Using the distance to a sampled waypoint approximates the perpendicular
//! cross-track distance. The approximation is good when the waypoint spacing
//! is small against the path curvature; coarse paths should be densified
//! before tracking.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;

// Internal
use crate::path::Waypoint;
use util::maths::wrap_to_pi;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Signed lateral error of the vehicle relative to the waypoint.
///
/// Positive when the vehicle is to the left of the path's direction of
/// travel, negative to the right.
pub fn lateral_error(position_m: &Vector2<f64>, waypoint: &Waypoint) -> f64 {
    // Unit tangent of the path at the waypoint
    let tangent = Vector2::new(waypoint.heading_rad.cos(), waypoint.heading_rad.sin());

    let to_vehicle = position_m - waypoint.position_m;

    // The z component of tangent x to_vehicle; its sign is the side
    let cross = tangent.x * to_vehicle.y - tangent.y * to_vehicle.x;

    cross.signum() * to_vehicle.norm()
}

/// Heading error of the vehicle relative to the path tangent, wrapped to
/// (-pi, pi].
pub fn heading_error(yaw_rad: f64, waypoint: &Waypoint) -> f64 {
    wrap_to_pi(yaw_rad - waypoint.heading_rad)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    const PI: f64 = std::f64::consts::PI;

    fn waypoint_at_origin(heading_rad: f64) -> Waypoint {
        Waypoint {
            position_m: Vector2::new(0.0, 0.0),
            heading_rad,
            speed_ms: 1.0,
        }
    }

    #[test]
    fn test_lateral_error_sign_convention() {
        // Path along +x; a vehicle at +y is on the left, at -y on the right
        let waypoint = waypoint_at_origin(0.0);

        let left = lateral_error(&Vector2::new(0.0, 2.0), &waypoint);
        assert!((left - 2.0).abs() < 1e-12);

        let right = lateral_error(&Vector2::new(0.0, -2.0), &waypoint);
        assert!((right + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_lateral_error_rotated_path() {
        // Path heading straight up +y; a vehicle at +x is now on the right
        let waypoint = waypoint_at_origin(PI / 2.0);

        let right = lateral_error(&Vector2::new(1.5, 0.0), &waypoint);
        assert!((right + 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_lateral_error_on_path() {
        let waypoint = waypoint_at_origin(0.0);
        assert_eq!(lateral_error(&Vector2::new(0.0, 0.0), &waypoint), 0.0);
    }

    #[test]
    fn test_heading_error_wraps() {
        let waypoint = waypoint_at_origin(3.0);

        // yaw -3 against heading +3 is -6 rad, which wraps to just over
        // +0.28 rad
        let error = heading_error(-3.0, &waypoint);
        assert!((error - (2.0 * PI - 6.0)).abs() < 1e-9);

        // Unwrapped differences pass through
        let waypoint = waypoint_at_origin(0.5);
        assert!((heading_error(1.0, &waypoint) - 0.5).abs() < 1e-12);
    }
}
