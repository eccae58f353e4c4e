//! Node handles and alignment types.

/// Unique identifier for a node in a layout tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u64);

/// How a node positions itself horizontally within its layout slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HorizontalAlignment {
    /// Fill the full width of the slot
    #[default]
    Stretch,
    /// Align to the left edge
    Left,
    /// Center within the slot
    Center,
    /// Align to the right edge
    Right,
}

/// How a node positions itself vertically within its layout slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VerticalAlignment {
    /// Fill the full height of the slot
    #[default]
    Stretch,
    /// Align to the top edge
    Top,
    /// Center within the slot
    Center,
    /// Align to the bottom edge
    Bottom,
}
