//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Wrap an angle into the range (-pi, pi].
///
/// Uses the atan2 of the angle's sine and cosine, which handles any number of
/// full turns in either direction.
pub fn wrap_to_pi<T>(angle: T) -> T
where
    T: Float,
{
    angle.sin().atan2(angle.cos())
}

/// Clamp a value between a minimum and maximum.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T
where
    T: Float,
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}
