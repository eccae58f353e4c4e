//! Declared layout properties and the change dispatcher.
//!
//! Every node kind declares which properties affect its measure and which
//! affect only its arrange. All writes go through [`LayoutTree::set_property`]
//! (or the typed convenience setters), which validates the value, skips
//! writes that change nothing, and routes the invalidation: a
//! measure-affecting change invalidates measure, an arrange-affecting change
//! invalidates arrange only, and visibility changes run their own
//! transition logic.

use trellis_core::{
    HorizontalAlignment, LayoutError, NodeId, Size, Thickness, VerticalAlignment,
};

use crate::tree::LayoutTree;

/// Identifier for a declared layout property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutProperty {
    Width,
    Height,
    MinWidth,
    MaxWidth,
    MinHeight,
    MaxHeight,
    Margin,
    HorizontalAlignment,
    VerticalAlignment,
    Visible,
    UseLayoutRounding,
}

impl LayoutProperty {
    /// The property name, for error reporting.
    pub fn name(&self) -> &'static str {
        match self {
            LayoutProperty::Width => "Width",
            LayoutProperty::Height => "Height",
            LayoutProperty::MinWidth => "MinWidth",
            LayoutProperty::MaxWidth => "MaxWidth",
            LayoutProperty::MinHeight => "MinHeight",
            LayoutProperty::MaxHeight => "MaxHeight",
            LayoutProperty::Margin => "Margin",
            LayoutProperty::HorizontalAlignment => "HorizontalAlignment",
            LayoutProperty::VerticalAlignment => "VerticalAlignment",
            LayoutProperty::Visible => "Visible",
            LayoutProperty::UseLayoutRounding => "UseLayoutRounding",
        }
    }
}

/// The dimension properties that invalidate measure for every node kind.
pub const BASE_AFFECTS_MEASURE: &[LayoutProperty] = &[
    LayoutProperty::Width,
    LayoutProperty::Height,
    LayoutProperty::MinWidth,
    LayoutProperty::MaxWidth,
    LayoutProperty::MinHeight,
    LayoutProperty::MaxHeight,
    LayoutProperty::Margin,
    LayoutProperty::HorizontalAlignment,
    LayoutProperty::VerticalAlignment,
];

/// A typed write to a declared layout property.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Width(f64),
    Height(f64),
    MinWidth(f64),
    MaxWidth(f64),
    MinHeight(f64),
    MaxHeight(f64),
    Margin(Thickness),
    HorizontalAlignment(HorizontalAlignment),
    VerticalAlignment(VerticalAlignment),
    Visible(bool),
    UseLayoutRounding(bool),
}

impl PropertyValue {
    /// The property this value writes to.
    pub fn property(&self) -> LayoutProperty {
        match self {
            PropertyValue::Width(_) => LayoutProperty::Width,
            PropertyValue::Height(_) => LayoutProperty::Height,
            PropertyValue::MinWidth(_) => LayoutProperty::MinWidth,
            PropertyValue::MaxWidth(_) => LayoutProperty::MaxWidth,
            PropertyValue::MinHeight(_) => LayoutProperty::MinHeight,
            PropertyValue::MaxHeight(_) => LayoutProperty::MaxHeight,
            PropertyValue::Margin(_) => LayoutProperty::Margin,
            PropertyValue::HorizontalAlignment(_) => LayoutProperty::HorizontalAlignment,
            PropertyValue::VerticalAlignment(_) => LayoutProperty::VerticalAlignment,
            PropertyValue::Visible(_) => LayoutProperty::Visible,
            PropertyValue::UseLayoutRounding(_) => LayoutProperty::UseLayoutRounding,
        }
    }

    fn validate(&self) -> Result<(), LayoutError> {
        let reject = |property: LayoutProperty, value: f64| {
            Err(LayoutError::InvalidDimension {
                property: property.name(),
                value,
            })
        };
        match *self {
            // NaN means "unset" for explicit dimensions; infinity and
            // negatives are never valid.
            PropertyValue::Width(v) | PropertyValue::Height(v) => {
                if v.is_nan() || (v >= 0.0 && !v.is_infinite()) {
                    Ok(())
                } else {
                    reject(self.property(), v)
                }
            }
            PropertyValue::MinWidth(v) | PropertyValue::MinHeight(v) => {
                if v >= 0.0 && !v.is_infinite() {
                    Ok(())
                } else {
                    reject(self.property(), v)
                }
            }
            PropertyValue::MaxWidth(v) | PropertyValue::MaxHeight(v) => {
                if v >= 0.0 {
                    Ok(())
                } else {
                    reject(self.property(), v)
                }
            }
            _ => Ok(()),
        }
    }
}

// NaN-aware dimension comparison: rewriting NaN over NaN is not a change.
fn dimension_changed(old: f64, new: f64) -> bool {
    !(old == new || (old.is_nan() && new.is_nan()))
}

impl LayoutTree {
    /// Write a declared property and dispatch the resulting invalidation.
    ///
    /// Writes that leave the value unchanged are dropped without touching
    /// layout state.
    pub fn set_property(&mut self, id: NodeId, value: PropertyValue) -> Result<(), LayoutError> {
        value.validate()?;

        let changed = {
            let node = self.get_mut(id).ok_or(LayoutError::UnknownNode(id))?;
            match value {
                PropertyValue::Width(v) => {
                    let changed = dimension_changed(node.width, v);
                    node.width = v;
                    changed
                }
                PropertyValue::Height(v) => {
                    let changed = dimension_changed(node.height, v);
                    node.height = v;
                    changed
                }
                PropertyValue::MinWidth(v) => {
                    let changed = node.min_width != v;
                    node.min_width = v;
                    changed
                }
                PropertyValue::MaxWidth(v) => {
                    let changed = node.max_width != v;
                    node.max_width = v;
                    changed
                }
                PropertyValue::MinHeight(v) => {
                    let changed = node.min_height != v;
                    node.min_height = v;
                    changed
                }
                PropertyValue::MaxHeight(v) => {
                    let changed = node.max_height != v;
                    node.max_height = v;
                    changed
                }
                PropertyValue::Margin(v) => {
                    let changed = node.margin != v;
                    node.margin = v;
                    changed
                }
                PropertyValue::HorizontalAlignment(v) => {
                    let changed = node.horizontal_alignment != v;
                    node.horizontal_alignment = v;
                    changed
                }
                PropertyValue::VerticalAlignment(v) => {
                    let changed = node.vertical_alignment != v;
                    node.vertical_alignment = v;
                    changed
                }
                PropertyValue::Visible(v) => {
                    let changed = node.visible != v;
                    node.visible = v;
                    changed
                }
                PropertyValue::UseLayoutRounding(v) => {
                    let changed = node.use_layout_rounding != v;
                    node.use_layout_rounding = v;
                    changed
                }
            }
        };
        if !changed {
            return Ok(());
        }

        let property = value.property();
        tracing::trace!(node = id.0, property = property.name(), "property changed");

        if let PropertyValue::Visible(visible) = value {
            self.visibility_changed(id, visible);
            return Ok(());
        }

        let (affects_measure, affects_arrange) = {
            let node = self.get(id).ok_or(LayoutError::UnknownNode(id))?;
            match node.behavior.as_ref() {
                Some(b) => (
                    b.affects_measure().contains(&property),
                    b.affects_arrange().contains(&property),
                ),
                None => (BASE_AFFECTS_MEASURE.contains(&property), false),
            }
        };
        if affects_measure {
            self.invalidate_measure(id);
        } else if affects_arrange {
            self.invalidate_arrange(id);
        }
        Ok(())
    }

    /// Set the explicit width (NaN to unset).
    pub fn set_width(&mut self, id: NodeId, width: f64) -> Result<(), LayoutError> {
        self.set_property(id, PropertyValue::Width(width))
    }

    /// Set the explicit height (NaN to unset).
    pub fn set_height(&mut self, id: NodeId, height: f64) -> Result<(), LayoutError> {
        self.set_property(id, PropertyValue::Height(height))
    }

    /// Set the minimum width.
    pub fn set_min_width(&mut self, id: NodeId, min_width: f64) -> Result<(), LayoutError> {
        self.set_property(id, PropertyValue::MinWidth(min_width))
    }

    /// Set the maximum width.
    pub fn set_max_width(&mut self, id: NodeId, max_width: f64) -> Result<(), LayoutError> {
        self.set_property(id, PropertyValue::MaxWidth(max_width))
    }

    /// Set the minimum height.
    pub fn set_min_height(&mut self, id: NodeId, min_height: f64) -> Result<(), LayoutError> {
        self.set_property(id, PropertyValue::MinHeight(min_height))
    }

    /// Set the maximum height.
    pub fn set_max_height(&mut self, id: NodeId, max_height: f64) -> Result<(), LayoutError> {
        self.set_property(id, PropertyValue::MaxHeight(max_height))
    }

    /// Set the margin.
    pub fn set_margin(&mut self, id: NodeId, margin: Thickness) -> Result<(), LayoutError> {
        self.set_property(id, PropertyValue::Margin(margin))
    }

    /// Set the horizontal alignment.
    pub fn set_horizontal_alignment(
        &mut self,
        id: NodeId,
        alignment: HorizontalAlignment,
    ) -> Result<(), LayoutError> {
        self.set_property(id, PropertyValue::HorizontalAlignment(alignment))
    }

    /// Set the vertical alignment.
    pub fn set_vertical_alignment(
        &mut self,
        id: NodeId,
        alignment: VerticalAlignment,
    ) -> Result<(), LayoutError> {
        self.set_property(id, PropertyValue::VerticalAlignment(alignment))
    }

    /// Show or hide the node.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<(), LayoutError> {
        self.set_property(id, PropertyValue::Visible(visible))
    }

    /// Enable or disable pixel snapping for the node.
    pub fn set_layout_rounding(&mut self, id: NodeId, enabled: bool) -> Result<(), LayoutError> {
        self.set_property(id, PropertyValue::UseLayoutRounding(enabled))
    }

    // Visibility transitions do not go through the affects sets. Hiding
    // zeroes the desired size and tells the parent, but leaves this node's
    // own validity flags alone; showing invalidates this node and walks the
    // subtree to re-register invalidations that accumulated while the
    // subtree was hidden and unreachable by the manager.
    fn visibility_changed(&mut self, id: NodeId, visible: bool) {
        let parent = {
            let Some(node) = self.get_mut(id) else { return };
            node.desired_size = Size::default();
            node.parent
        };
        if let Some(p) = parent {
            self.child_desired_size_changed(p);
        }

        if visible {
            self.invalidate_measure(id);
            if self.manager.is_some() && self.is_rooted(id) {
                for child in self.child_ids(id) {
                    self.ancestor_became_visible(child);
                }
            }
        }
    }

    fn ancestor_became_visible(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else { return };
        if !node.visible {
            return;
        }
        if !node.measure_valid {
            if let Some(m) = &mut self.manager {
                m.invalidate_measure(id);
            }
            self.dirty_paint.insert(id);
        } else if !node.arrange_valid {
            if let Some(m) = &mut self.manager {
                m.invalidate_arrange(id);
            }
            self.dirty_paint.insert(id);
        }
        for child in self.child_ids(id) {
            self.ancestor_became_visible(child);
        }
    }
}
