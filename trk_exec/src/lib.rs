//! # Path-tracking library
//!
//! This library provides the lateral path-tracking controller and its
//! supporting components:
//!
//! - [`linalg`] - the dense eigen-decomposition kernel the Riccati solver is
//!   built on.
//! - [`riccati`] - the continuous algebraic Riccati equation solver which
//!   produces the optimal feedback gain.
//! - [`path`] - reference path types, loading, and the monotone
//!   nearest-waypoint index.
//! - [`lat_ctrl`] - the lateral controller itself, which ties the other
//!   components together into a per-tick steering command.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod lat_ctrl;
pub mod linalg;
pub mod path;
pub mod riccati;
