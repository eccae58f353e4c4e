//! The layout tree: an arena of nodes with measure/arrange state.
//!
//! The tree owns structural lifetime. Nodes reference each other through
//! [`NodeId`] handles only; a parent handle is a lookup aid, never
//! ownership. Removing a subtree discards its state and releases every
//! reference the layout manager held to it.

use std::collections::HashMap;
use std::fmt;

use indexmap::IndexSet;
use smallvec::SmallVec;
use trellis_core::{
    HorizontalAlignment, LayoutError, NodeId, Rect, Size, Thickness, VerticalAlignment,
};

use crate::compute::Behavior;
use crate::manager::LayoutManager;

/// A node in the layout tree.
///
/// Declared constraints are set through the builder methods before the node
/// is inserted, and through [`LayoutTree::set_property`] afterwards so that
/// changes flow through the invalidation dispatcher.
pub struct LayoutNode {
    pub(crate) id: NodeId,
    pub(crate) name: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,

    // Declared dimension constraints; width/height use NaN for "unset".
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) min_width: f64,
    pub(crate) max_width: f64,
    pub(crate) min_height: f64,
    pub(crate) max_height: f64,
    pub(crate) margin: Thickness,
    pub(crate) horizontal_alignment: HorizontalAlignment,
    pub(crate) vertical_alignment: VerticalAlignment,
    pub(crate) use_layout_rounding: bool,
    pub(crate) visible: bool,

    // Pass state.
    pub(crate) desired_size: Size,
    pub(crate) bounds: Rect,
    pub(crate) measure_valid: bool,
    pub(crate) arrange_valid: bool,
    pub(crate) previous_measure: Option<Size>,
    pub(crate) previous_arrange: Option<Rect>,
    pub(crate) measuring: bool,

    pub(crate) behavior: Option<Box<dyn Behavior>>,
}

impl LayoutNode {
    /// Create a node with default constraints (auto size, stretch alignment).
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            name: None,
            parent: None,
            children: SmallVec::new(),
            width: f64::NAN,
            height: f64::NAN,
            min_width: 0.0,
            max_width: f64::INFINITY,
            min_height: 0.0,
            max_height: f64::INFINITY,
            margin: Thickness::default(),
            horizontal_alignment: HorizontalAlignment::default(),
            vertical_alignment: VerticalAlignment::default(),
            use_layout_rounding: true,
            visible: true,
            desired_size: Size::default(),
            bounds: Rect::default(),
            measure_valid: false,
            arrange_valid: false,
            previous_measure: None,
            previous_arrange: None,
            measuring: false,
            behavior: None,
        }
    }

    /// Set a debug name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set an explicit width.
    pub fn with_width(mut self, width: f64) -> Self {
        self.width = width;
        self
    }

    /// Set an explicit height.
    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    /// Set the minimum width.
    pub fn with_min_width(mut self, min_width: f64) -> Self {
        self.min_width = min_width;
        self
    }

    /// Set the maximum width.
    pub fn with_max_width(mut self, max_width: f64) -> Self {
        self.max_width = max_width;
        self
    }

    /// Set the minimum height.
    pub fn with_min_height(mut self, min_height: f64) -> Self {
        self.min_height = min_height;
        self
    }

    /// Set the maximum height.
    pub fn with_max_height(mut self, max_height: f64) -> Self {
        self.max_height = max_height;
        self
    }

    /// Set the margin.
    pub fn with_margin(mut self, margin: Thickness) -> Self {
        self.margin = margin;
        self
    }

    /// Set the horizontal alignment.
    pub fn with_horizontal_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.horizontal_alignment = alignment;
        self
    }

    /// Set the vertical alignment.
    pub fn with_vertical_alignment(mut self, alignment: VerticalAlignment) -> Self {
        self.vertical_alignment = alignment;
        self
    }

    /// Enable or disable pixel snapping for this node.
    pub fn with_layout_rounding(mut self, enabled: bool) -> Self {
        self.use_layout_rounding = enabled;
        self
    }

    /// Set the initial visibility.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Attach a measure/arrange behavior. Nodes without one use the default
    /// container behavior (union of children on measure, full rect on
    /// arrange).
    pub fn with_behavior(mut self, behavior: impl Behavior + 'static) -> Self {
        self.behavior = Some(Box::new(behavior));
        self
    }

    /// The node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The debug name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The parent node, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The ordered child list.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The size requested by the last measure pass.
    pub fn desired_size(&self) -> Size {
        self.desired_size
    }

    /// The final bounds from the last arrange pass, in parent coordinates.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Whether the last measure result is still valid.
    pub fn is_measure_valid(&self) -> bool {
        self.measure_valid
    }

    /// Whether the last arrange result is still valid.
    pub fn is_arrange_valid(&self) -> bool {
        self.arrange_valid
    }

    /// Whether the node participates in layout.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The declared explicit width (NaN when unset).
    pub fn width(&self) -> f64 {
        self.width
    }

    /// The declared explicit height (NaN when unset).
    pub fn height(&self) -> f64 {
        self.height
    }

    /// The declared margin.
    pub fn margin(&self) -> Thickness {
        self.margin
    }

    /// The declared horizontal alignment.
    pub fn horizontal_alignment(&self) -> HorizontalAlignment {
        self.horizontal_alignment
    }

    /// The declared vertical alignment.
    pub fn vertical_alignment(&self) -> VerticalAlignment {
        self.vertical_alignment
    }

    /// Whether pixel snapping is enabled for this node.
    pub fn use_layout_rounding(&self) -> bool {
        self.use_layout_rounding
    }

    /// The available size used by the last measure, if any.
    pub fn previous_measure(&self) -> Option<Size> {
        self.previous_measure
    }

    /// The rect used by the last arrange, if any.
    pub fn previous_arrange(&self) -> Option<Rect> {
        self.previous_arrange
    }
}

impl fmt::Debug for LayoutNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("desired_size", &self.desired_size)
            .field("bounds", &self.bounds)
            .field("measure_valid", &self.measure_valid)
            .field("arrange_valid", &self.arrange_valid)
            .field("visible", &self.visible)
            .finish_non_exhaustive()
    }
}

/// The layout tree for one root surface.
pub struct LayoutTree {
    pub(crate) nodes: HashMap<NodeId, LayoutNode>,
    next_id: u64,
    pub(crate) root: Option<NodeId>,
    pub(crate) root_size: Size,
    pub(crate) scale_factor: f64,
    pub(crate) manager: Option<LayoutManager>,
    pub(crate) dirty_paint: IndexSet<NodeId>,
}

impl Default for LayoutTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 0,
            root: None,
            root_size: Size::default(),
            scale_factor: 1.0,
            manager: None,
            dirty_paint: IndexSet::new(),
        }
    }

    /// Generate a new unique node id.
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Install `node` as the tree root with the given surface size.
    ///
    /// Creates the layout manager for this root and queues an initial
    /// measure. Any previous root subtree is removed first.
    pub fn set_root(&mut self, node: LayoutNode, size: Size) -> NodeId {
        if let Some(old) = self.root {
            self.remove(old);
        }

        let id = node.id;
        self.nodes.insert(id, node);
        self.root = Some(id);
        self.root_size = size;

        let mut manager = LayoutManager::new();
        manager.invalidate_measure(id);
        self.manager = Some(manager);

        if let Some(n) = self.nodes.get_mut(&id) {
            if let Some(b) = n.behavior.as_mut() {
                b.on_attached(id);
            }
        }
        tracing::debug!(root = id.0, width = size.width, height = size.height, "root attached");
        id
    }

    /// Change the root surface size, invalidating the root's measure.
    pub fn resize_root(&mut self, size: Size) {
        if size == self.root_size {
            return;
        }
        self.root_size = size;
        if let Some(root) = self.root {
            self.invalidate_measure(root);
            // The short-circuit keys on the measure input, which changed.
            if let Some(m) = &mut self.manager {
                m.invalidate_measure(root);
            }
            if let Some(n) = self.nodes.get_mut(&root) {
                n.previous_measure = None;
                n.previous_arrange = None;
            }
        }
    }

    /// Detach the current root, discarding its whole subtree and the
    /// layout manager.
    pub fn detach_root(&mut self) {
        if let Some(root) = self.root {
            self.remove(root);
        }
    }

    /// The current root node, if attached.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// The root surface size.
    pub fn root_size(&self) -> Size {
        self.root_size
    }

    /// The device scale factor used for layout rounding.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Change the device scale factor.
    ///
    /// Rounded geometry depends on the scale everywhere, so the whole tree
    /// is re-measured.
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor == self.scale_factor || !scale_factor.is_finite() || scale_factor <= 0.0 {
            return;
        }
        self.scale_factor = scale_factor;
        if let Some(root) = self.root {
            self.invalidate_subtree_measure(root);
        }
    }

    /// Insert `node` as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, mut node: LayoutNode) -> Result<NodeId, LayoutError> {
        if !self.nodes.contains_key(&parent) {
            return Err(LayoutError::UnknownNode(parent));
        }

        let id = node.id;
        node.parent = Some(parent);
        self.nodes.insert(id, node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        if let Some(n) = self.nodes.get_mut(&id) {
            if let Some(b) = n.behavior.as_mut() {
                b.on_attached(id);
            }
        }

        // A new child can change the parent's desired size.
        self.invalidate_measure(parent);
        Ok(id)
    }

    /// Remove a node and its entire subtree, discarding all layout state.
    ///
    /// Pending-set membership, viewport listeners and dirty-paint entries
    /// for the removed nodes are released. Removing the root discards the
    /// layout manager with it.
    pub fn remove(&mut self, id: NodeId) {
        if !self.nodes.contains_key(&id) {
            return;
        }

        let parent = self.nodes.get(&id).and_then(|n| n.parent);
        if let Some(p) = parent {
            if let Some(pn) = self.nodes.get_mut(&p) {
                pn.children.retain(|c| *c != id);
            }
        }

        let mut stack: Vec<NodeId> = vec![id];
        let mut subtree: Vec<NodeId> = Vec::new();
        while let Some(n) = stack.pop() {
            if let Some(node) = self.nodes.get(&n) {
                stack.extend(node.children.iter().copied());
            }
            subtree.push(n);
        }

        let was_root = self.root == Some(id);
        for n in &subtree {
            if let Some(mut node) = self.nodes.remove(n) {
                if let Some(b) = node.behavior.as_mut() {
                    b.on_detached(*n);
                }
            }
            self.dirty_paint.swap_remove(n);
            if let Some(m) = &mut self.manager {
                m.forget(*n);
            }
        }

        if was_root {
            tracing::debug!(root = id.0, "root detached");
            self.root = None;
            self.manager = None;
        } else if let Some(p) = parent {
            self.invalidate_measure(p);
        }
    }

    /// Move a node (and its subtree) under a new parent.
    ///
    /// A parent change can alter the constraint context arbitrarily, so the
    /// whole moved subtree is re-measured.
    pub fn reparent(&mut self, id: NodeId, new_parent: NodeId) -> Result<(), LayoutError> {
        if !self.nodes.contains_key(&id) {
            return Err(LayoutError::UnknownNode(id));
        }
        if !self.nodes.contains_key(&new_parent) {
            return Err(LayoutError::UnknownNode(new_parent));
        }

        let mut cursor = Some(new_parent);
        while let Some(n) = cursor {
            if n == id {
                return Err(LayoutError::ReparentCycle { child: id });
            }
            cursor = self.nodes.get(&n).and_then(|node| node.parent);
        }

        let old_parent = self.nodes.get(&id).and_then(|n| n.parent);
        if old_parent == Some(new_parent) {
            return Ok(());
        }
        if let Some(p) = old_parent {
            if let Some(pn) = self.nodes.get_mut(&p) {
                pn.children.retain(|c| *c != id);
            }
        }
        if let Some(n) = self.nodes.get_mut(&id) {
            n.parent = Some(new_parent);
        }
        if let Some(pn) = self.nodes.get_mut(&new_parent) {
            pn.children.push(id);
        }

        if let Some(p) = old_parent {
            self.invalidate_measure(p);
        }
        self.invalidate_measure(new_parent);
        self.invalidate_subtree_measure(id);
        Ok(())
    }

    /// Get a node by id.
    pub fn get(&self, id: NodeId) -> Option<&LayoutNode> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut LayoutNode> {
        self.nodes.get_mut(&id)
    }

    /// The ordered children of a node (empty if the node is unknown).
    pub fn child_ids(&self, id: NodeId) -> SmallVec<[NodeId; 4]> {
        self.nodes
            .get(&id)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &LayoutNode> {
        self.nodes.values()
    }

    /// Nodes whose paint region went dirty since the last drain.
    ///
    /// The renderer host consumes this after each pass.
    pub fn take_dirty_paint(&mut self) -> IndexSet<NodeId> {
        std::mem::take(&mut self.dirty_paint)
    }

    /// Whether walking the parent chain from `id` reaches the root.
    pub(crate) fn is_rooted(&self, id: NodeId) -> bool {
        let Some(root) = self.root else {
            return false;
        };
        let mut cursor = id;
        loop {
            if cursor == root {
                return true;
            }
            match self.nodes.get(&cursor).and_then(|n| n.parent) {
                Some(p) => cursor = p,
                None => return false,
            }
        }
    }

    /// Invalidate the node's measure and queue it for the next pass.
    ///
    /// Invalidating measure always invalidates arrange too. No-op when the
    /// measure is already invalid.
    pub fn invalidate_measure(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        if !node.measure_valid {
            return;
        }
        tracing::trace!(node = id.0, "invalidated measure");
        node.measure_valid = false;
        node.arrange_valid = false;

        if self.is_rooted(id) {
            if let Some(m) = &mut self.manager {
                m.invalidate_measure(id);
            }
            self.dirty_paint.insert(id);
        }

        // Subtype bookkeeping hook, fired regardless of attachment.
        if let Some(node) = self.nodes.get_mut(&id) {
            if let Some(b) = node.behavior.as_mut() {
                b.measure_invalidated(id);
            }
        }
    }

    /// Invalidate the node's arrange and queue it for the next pass.
    pub fn invalidate_arrange(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        if !node.arrange_valid {
            return;
        }
        tracing::trace!(node = id.0, "invalidated arrange");
        node.arrange_valid = false;

        if self.is_rooted(id) {
            if let Some(m) = &mut self.manager {
                m.invalidate_arrange(id);
            }
            self.dirty_paint.insert(id);
        }
    }

    /// Invalidate measure for a node and every descendant.
    pub(crate) fn invalidate_subtree_measure(&mut self, id: NodeId) {
        self.invalidate_measure(id);
        for child in self.child_ids(id) {
            self.invalidate_subtree_measure(child);
        }
    }

    /// A child's desired size changed; the parent must re-measure unless it
    /// is the parent's own measure that is driving the child right now.
    pub(crate) fn child_desired_size_changed(&mut self, parent: NodeId) {
        let measuring = self
            .nodes
            .get(&parent)
            .map(|n| n.measuring)
            .unwrap_or(false);
        if !measuring {
            self.invalidate_measure(parent);
        }
    }

    pub(crate) fn take_behavior(&mut self, id: NodeId) -> Option<Box<dyn Behavior>> {
        self.nodes.get_mut(&id).and_then(|n| n.behavior.take())
    }

    pub(crate) fn restore_behavior(&mut self, id: NodeId, behavior: Box<dyn Behavior>) {
        if let Some(n) = self.nodes.get_mut(&id) {
            n.behavior = Some(behavior);
        }
    }
}

impl fmt::Debug for LayoutTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutTree")
            .field("nodes", &self.nodes.len())
            .field("root", &self.root)
            .field("root_size", &self.root_size)
            .field("scale_factor", &self.scale_factor)
            .finish_non_exhaustive()
    }
}
