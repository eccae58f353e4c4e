//! Core value types and errors for the Trellis layout engine.
//!
//! This crate provides the foundational types used across the other trellis
//! crates:
//! - Geometric value types (sizes, points, rects, thicknesses)
//! - Node handles and alignment enums
//! - Error types

pub mod errors;
pub mod geometry;
pub mod types;

pub use errors::*;
pub use geometry::*;
pub use types::*;
