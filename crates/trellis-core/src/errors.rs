//! Error types for the Trellis layout engine.

use crate::types::NodeId;
use thiserror::Error;

/// Errors raised by layout operations.
///
/// Every variant indicates a caller or override contract violation; none of
/// them are transient and none are retried.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Measure was called with NaN in the available size.
    #[error("cannot measure with NaN in the available size ({width} x {height})")]
    InvalidAvailableSize { width: f64, height: f64 },

    /// Arrange was called with a negative, NaN or infinite rect.
    #[error("invalid arrange rectangle ({x}, {y}) {width} x {height}")]
    InvalidArrangeRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },

    /// A measure override produced a negative or non-finite desired size.
    #[error("measure produced an invalid desired size ({width} x {height})")]
    InvalidDesiredSize { width: f64, height: f64 },

    /// A declared dimension constraint was rejected by validation.
    #[error("invalid value {value} for {property}")]
    InvalidDimension { property: &'static str, value: f64 },

    /// The operation addressed a node that is not in the tree.
    #[error("unknown layout node {0:?}")]
    UnknownNode(NodeId),

    /// Reparenting would make a node an ancestor of itself.
    #[error("cannot reparent node {child:?} into its own subtree")]
    ReparentCycle { child: NodeId },
}
