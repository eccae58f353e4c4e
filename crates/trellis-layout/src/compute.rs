//! The measure and arrange passes.
//!
//! Data flows top-down during a pass: an available size goes in, a desired
//! size comes out of measure; a final rect goes in and bounds come out of
//! arrange. Both entry points short-circuit when the node is valid and the
//! input is exactly the one from the previous pass, which is what bounds
//! recomputation cost on large trees.
//!
//! Everything here is a plain call/return on a single logical thread.
//! Measure recurses synchronously into children and may synchronously
//! invalidate ancestors through the desired-size-changed notification; the
//! only guard is the per-node "currently measuring" flag that keeps a
//! node's own measure from re-entering its own invalidation.

use trellis_core::{HorizontalAlignment, LayoutError, NodeId, Point, Rect, Size, VerticalAlignment};

use crate::properties::{LayoutProperty, BASE_AFFECTS_MEASURE};
use crate::rounding::{round_layout_point, round_layout_size_up, round_layout_thickness};
use crate::tree::{LayoutNode, LayoutTree};

/// Effective min/max bounds for one node, derived per pass from the
/// declared Width/Height/Min*/Max* properties.
///
/// Invariant: `0 <= min <= max` on both axes (max may be infinite). An
/// explicit Width or Height pins the corresponding range to that value,
/// still clamped inside the declared min/max.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMax {
    pub min_width: f64,
    pub max_width: f64,
    pub min_height: f64,
    pub max_height: f64,
}

impl MinMax {
    pub(crate) fn new(node: &LayoutNode) -> Self {
        let mut max_height = node.max_height;
        let mut min_height = node.min_height;
        let height = if node.height.is_nan() {
            f64::INFINITY
        } else {
            node.height
        };
        max_height = height.min(max_height).max(min_height);
        let height = if node.height.is_nan() { 0.0 } else { node.height };
        min_height = height.min(max_height).max(min_height);

        let mut max_width = node.max_width;
        let mut min_width = node.min_width;
        let width = if node.width.is_nan() {
            f64::INFINITY
        } else {
            node.width
        };
        max_width = width.min(max_width).max(min_width);
        let width = if node.width.is_nan() { 0.0 } else { node.width };
        min_width = width.min(max_width).max(min_width);

        Self {
            min_width,
            max_width,
            min_height,
            max_height,
        }
    }

    /// Clamp a size into the min/max range on both axes.
    pub fn constrain(&self, size: Size) -> Size {
        Size::new(
            layout_clamp(size.width, self.min_width, self.max_width),
            layout_clamp(size.height, self.min_height, self.max_height),
        )
    }
}

// NaN-transparent clamp: a NaN input stays NaN so it is caught by the
// invalid-result check rather than silently collapsing to the minimum.
fn layout_clamp(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Measure/arrange overrides for one node kind.
///
/// The default implementations give container semantics: measure reports
/// the bounding box of the children's desired sizes, arrange places every
/// child into the full final rect. Node kinds with their own sizing or
/// positioning logic (stacks, panels, text, …) override `measure` and
/// `arrange`; the clamping, margin and alignment handling around them
/// belongs to the tree and cannot be overridden.
pub trait Behavior {
    /// Compute the desired size within `available` (margins and min/max
    /// already applied). Children must be measured here.
    fn measure(
        &mut self,
        tree: &mut LayoutTree,
        node: NodeId,
        available: Size,
    ) -> Result<Size, LayoutError> {
        default_measure(tree, node, available)
    }

    /// Position children within `final_size` and return the size actually
    /// used (it will be constrained to `final_size`).
    fn arrange(
        &mut self,
        tree: &mut LayoutTree,
        node: NodeId,
        final_size: Size,
    ) -> Result<Size, LayoutError> {
        default_arrange(tree, node, final_size)
    }

    /// Apply pending style changes. Runs at the start of measure, before
    /// constraints are read, because styling may change them.
    fn apply_styling(&mut self, _tree: &mut LayoutTree, _node: NodeId) {}

    /// Expand the node's template, if it has one. Runs right after styling.
    fn apply_template(&mut self, _tree: &mut LayoutTree, _node: NodeId) {}

    /// Bookkeeping hook fired whenever the node's measure is invalidated,
    /// whether or not the node is attached to a rooted tree.
    fn measure_invalidated(&mut self, _node: NodeId) {}

    /// The node entered a tree.
    fn on_attached(&mut self, _node: NodeId) {}

    /// The node left a tree; all layout state has been discarded.
    fn on_detached(&mut self, _node: NodeId) {}

    /// Properties that invalidate this node kind's measure when changed.
    fn affects_measure(&self) -> &[LayoutProperty] {
        BASE_AFFECTS_MEASURE
    }

    /// Properties that invalidate only this node kind's arrange when
    /// changed.
    fn affects_arrange(&self) -> &[LayoutProperty] {
        &[]
    }
}

/// Default measure: every child gets the full available size and the result
/// is the union of their desired sizes (a bounding box, not a stack).
pub fn default_measure(
    tree: &mut LayoutTree,
    node: NodeId,
    available: Size,
) -> Result<Size, LayoutError> {
    let mut width: f64 = 0.0;
    let mut height: f64 = 0.0;
    for child in tree.child_ids(node) {
        tree.measure(child, available)?;
        let desired = tree.get(child).map(|n| n.desired_size()).unwrap_or_default();
        width = width.max(desired.width);
        height = height.max(desired.height);
    }
    Ok(Size::new(width, height))
}

/// Default arrange: every child is arranged into the full final rect.
pub fn default_arrange(
    tree: &mut LayoutTree,
    node: NodeId,
    final_size: Size,
) -> Result<Size, LayoutError> {
    let rect = Rect::from_size(final_size);
    for child in tree.child_ids(node) {
        tree.arrange(child, rect)?;
    }
    Ok(final_size)
}

fn is_invalid_size(size: Size) -> bool {
    !size.width.is_finite() || !size.height.is_finite() || size.width < 0.0 || size.height < 0.0
}

fn is_invalid_rect(rect: Rect) -> bool {
    !rect.width.is_finite()
        || !rect.height.is_finite()
        || rect.width < 0.0
        || rect.height < 0.0
        || !rect.x.is_finite()
        || !rect.y.is_finite()
}

impl LayoutTree {
    /// Measure a node: compute its desired size for `available`.
    ///
    /// No-op when the node is measure-valid and `available` is exactly the
    /// size used last time. If the desired size changes, the parent is
    /// notified and re-measures on the next pass (unless the parent's own
    /// measure is what drove this call).
    pub fn measure(&mut self, id: NodeId, available: Size) -> Result<(), LayoutError> {
        if available.has_nan() {
            return Err(LayoutError::InvalidAvailableSize {
                width: available.width,
                height: available.height,
            });
        }

        let previous_desired = {
            let node = self.get_mut(id).ok_or(LayoutError::UnknownNode(id))?;
            if node.measure_valid && node.previous_measure == Some(available) {
                return Ok(());
            }
            node.measure_valid = true;
            node.measuring = true;
            node.desired_size
        };

        let result = self.measure_core(id, available);
        if let Some(node) = self.get_mut(id) {
            node.measuring = false;
        }
        let desired = result?;

        if is_invalid_size(desired) {
            return Err(LayoutError::InvalidDesiredSize {
                width: desired.width,
                height: desired.height,
            });
        }

        let parent = match self.get_mut(id) {
            Some(node) => {
                node.desired_size = desired;
                node.previous_measure = Some(available);
                node.parent
            }
            // The node was removed while its override ran.
            None => return Ok(()),
        };

        tracing::trace!(
            node = id.0,
            width = desired.width,
            height = desired.height,
            "measured"
        );

        if desired != previous_desired {
            if let Some(p) = parent {
                self.child_desired_size_changed(p);
            }
        }
        Ok(())
    }

    /// Default measure core, shared by every node kind.
    fn measure_core(&mut self, id: NodeId, available: Size) -> Result<Size, LayoutError> {
        let (visible, use_rounding, mut margin) = {
            let node = self.get(id).ok_or(LayoutError::UnknownNode(id))?;
            (node.visible, node.use_layout_rounding, node.margin)
        };

        // Children below an invisible node are not measured at all; their
        // stored geometry goes stale until visibility returns.
        if !visible {
            return Ok(Size::default());
        }

        let scale = if use_rounding { self.scale_factor } else { 1.0 };
        if use_rounding {
            margin = round_layout_thickness(margin, scale);
        }

        // Styling and templates run before constraints are read; they may
        // change the declared constraint properties.
        if let Some(mut behavior) = self.take_behavior(id) {
            behavior.apply_styling(self, id);
            behavior.apply_template(self, id);
            self.restore_behavior(id, behavior);
        }

        let min_max = {
            let node = self.get(id).ok_or(LayoutError::UnknownNode(id))?;
            MinMax::new(node)
        };

        let constrained = min_max.constrain(available.deflate(margin));
        let measured = self.invoke_measure_override(id, constrained)?;

        let mut width = layout_clamp(measured.width, min_max.min_width, min_max.max_width);
        let mut height = layout_clamp(measured.height, min_max.min_height, min_max.max_height);

        if use_rounding {
            let rounded = round_layout_size_up(Size::new(width, height), scale);
            width = rounded.width;
            height = rounded.height;
        }

        width += margin.horizontal();
        height += margin.vertical();

        // Never request more than was offered, never request negative.
        width = width.min(available.width).max(0.0);
        height = height.min(available.height).max(0.0);

        Ok(Size::new(width, height))
    }

    fn invoke_measure_override(&mut self, id: NodeId, constraint: Size) -> Result<Size, LayoutError> {
        match self.take_behavior(id) {
            Some(mut behavior) => {
                let result = behavior.measure(self, id, constraint);
                self.restore_behavior(id, behavior);
                result
            }
            None => default_measure(self, id, constraint),
        }
    }

    /// Arrange a node into its final rect.
    ///
    /// Re-measures first if the measure is invalid (arrange always requires
    /// a valid desired size). No-op when arrange-valid and `rect` is exactly
    /// the rect used last time.
    pub fn arrange(&mut self, id: NodeId, rect: Rect) -> Result<(), LayoutError> {
        if is_invalid_rect(rect) {
            return Err(LayoutError::InvalidArrangeRect {
                x: rect.x,
                y: rect.y,
                width: rect.width,
                height: rect.height,
            });
        }

        let needs_measure = {
            let node = self.get(id).ok_or(LayoutError::UnknownNode(id))?;
            if node.measure_valid {
                None
            } else {
                Some(node.previous_measure.unwrap_or_else(|| rect.size()))
            }
        };
        if let Some(available) = needs_measure {
            self.measure(id, available)?;
        }

        {
            let node = self.get_mut(id).ok_or(LayoutError::UnknownNode(id))?;
            if node.arrange_valid && node.previous_arrange == Some(rect) {
                return Ok(());
            }
            node.arrange_valid = true;
        }

        tracing::trace!(
            node = id.0,
            x = rect.x,
            y = rect.y,
            width = rect.width,
            height = rect.height,
            "arranging"
        );

        self.arrange_core(id, rect)?;
        if let Some(node) = self.get_mut(id) {
            node.previous_arrange = Some(rect);
        }
        Ok(())
    }

    /// Default arrange core, shared by every node kind.
    fn arrange_core(&mut self, id: NodeId, final_rect: Rect) -> Result<(), LayoutError> {
        let (visible, use_rounding, declared_margin, h_align, v_align, desired, min_max) = {
            let node = self.get(id).ok_or(LayoutError::UnknownNode(id))?;
            (
                node.visible,
                node.use_layout_rounding,
                node.margin,
                node.horizontal_alignment,
                node.vertical_alignment,
                node.desired_size,
                MinMax::new(node),
            )
        };

        // Invisible nodes keep their previous bounds untouched.
        if !visible {
            return Ok(());
        }

        let scale = if use_rounding { self.scale_factor } else { 1.0 };

        // The origin offset uses the declared margin; the rounded margin is
        // applied to sizes below.
        let mut origin_x = final_rect.x + declared_margin.left;
        let mut origin_y = final_rect.y + declared_margin.top;
        let margin = if use_rounding {
            round_layout_thickness(declared_margin, scale)
        } else {
            declared_margin
        };

        let mut available = Size::new(
            (final_rect.width - margin.horizontal()).max(0.0),
            (final_rect.height - margin.vertical()).max(0.0),
        );
        let mut size = available;

        // Non-stretched content is never arranged larger than it asked to
        // be; stretched axes use the full margin-deflated rect.
        if h_align != HorizontalAlignment::Stretch {
            size = size.with_width(size.width.min(desired.width - margin.horizontal()));
        }
        if v_align != VerticalAlignment::Stretch {
            size = size.with_height(size.height.min(desired.height - margin.vertical()));
        }

        size = min_max.constrain(size);

        if use_rounding {
            size = round_layout_size_up(size, scale);
            available = round_layout_size_up(available, scale);
        }

        let arranged = self.invoke_arrange_override(id, size)?;
        let size = arranged.constrain(size);

        match h_align {
            HorizontalAlignment::Center | HorizontalAlignment::Stretch => {
                origin_x += (available.width - size.width) / 2.0;
            }
            HorizontalAlignment::Right => {
                origin_x += available.width - size.width;
            }
            HorizontalAlignment::Left => {}
        }
        match v_align {
            VerticalAlignment::Center | VerticalAlignment::Stretch => {
                origin_y += (available.height - size.height) / 2.0;
            }
            VerticalAlignment::Bottom => {
                origin_y += available.height - size.height;
            }
            VerticalAlignment::Top => {}
        }

        let mut origin = Point::new(origin_x, origin_y);
        if use_rounding {
            origin = round_layout_point(origin, scale);
        }

        let bounds = Rect::from_origin_size(origin, size);
        if let Some(node) = self.get_mut(id) {
            if node.bounds != bounds {
                node.bounds = bounds;
                self.dirty_paint.insert(id);
            }
        }
        Ok(())
    }

    fn invoke_arrange_override(&mut self, id: NodeId, final_size: Size) -> Result<Size, LayoutError> {
        match self.take_behavior(id) {
            Some(mut behavior) => {
                let result = behavior.arrange(self, id, final_size);
                self.restore_behavior(id, behavior);
                result
            }
            None => default_arrange(self, id, final_size),
        }
    }
}
