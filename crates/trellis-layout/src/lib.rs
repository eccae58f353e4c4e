//! Constraint-based measure/arrange layout for a retained node tree.
//!
//! Layout runs in two passes over a tree of [`LayoutNode`]s. Measure asks
//! each node how much space it wants within an available size; arrange
//! hands each node a final rect and produces its bounds. Both passes are
//! lazy: results are cached per node and recomputed only after an explicit
//! invalidation, and re-running a pass with the exact previous input is a
//! no-op.
//!
//! # Architecture
//!
//! - [`tree`] owns the arena of nodes, structural edits and the
//!   invalidation flags.
//! - [`compute`] holds the measure/arrange cores shared by every node kind
//!   and the [`Behavior`] trait that node kinds override.
//! - [`properties`] routes declared-property writes to the right
//!   invalidation, including the visibility transition rules.
//! - [`manager`] schedules passes: pending queues, the fixed-point pass
//!   driver and the event stream the host drains afterwards.
//! - [`rounding`] snaps geometry to device pixel boundaries.
//!
//! # Example
//!
//! ```
//! use trellis_layout::{LayoutNode, LayoutTree};
//! use trellis_core::Size;
//!
//! let mut tree = LayoutTree::new();
//! let id = tree.next_id();
//! let root = tree.set_root(LayoutNode::new(id), Size::new(800.0, 600.0));
//! let id = tree.next_id();
//! let child = tree.add_child(root, LayoutNode::new(id).with_width(100.0))?;
//!
//! tree.execute_layout_pass()?;
//! assert_eq!(tree.get(child).unwrap().bounds().width, 100.0);
//! # Ok::<(), trellis_core::LayoutError>(())
//! ```

pub mod compute;
pub mod manager;
pub mod properties;
pub mod rounding;
pub mod tree;

pub use compute::{default_arrange, default_measure, Behavior, MinMax};
pub use manager::{LayoutEvent, LayoutManager};
pub use properties::{LayoutProperty, PropertyValue, BASE_AFFECTS_MEASURE};
pub use rounding::{
    round_layout_point, round_layout_size_up, round_layout_thickness, round_layout_value,
    round_layout_value_up,
};
pub use tree::{LayoutNode, LayoutTree};

pub use trellis_core::{
    HorizontalAlignment, LayoutError, NodeId, Point, Rect, Size, Thickness, VerticalAlignment,
};
