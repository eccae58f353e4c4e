//! Pass scheduling: pending queues, the layout pass driver and layout
//! events.
//!
//! Invalidation never computes anything; it only records the node in the
//! pending queues here. [`LayoutTree::execute_layout_pass`] drains the
//! queues to a fixed point: each measured node may invalidate its parent
//! mid-pass, so the drain loops on fresh batches until both queues stay
//! empty. Everything runs synchronously on the caller's thread; the host
//! picks up the results through [`LayoutTree::take_events`] and
//! [`LayoutTree::take_dirty_paint`] after the pass returns.

use std::collections::HashMap;

use indexmap::IndexSet;
use trellis_core::{LayoutError, NodeId, Point, Rect};

use crate::tree::LayoutTree;

// A measure can re-invalidate arrange state that the same pass already
// settled, so the driver runs measure+arrange up to this many times before
// it gives up on quiescence for this pass. Matches the retained-mode
// convention: two passes settle almost every tree, three is pathological.
const MAX_PASSES: usize = 3;

/// A notification produced by a layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutEvent {
    /// A pass ran and performed at least one measure or arrange.
    LayoutUpdated,
    /// A registered node's effective viewport changed (or was computed for
    /// the first time after registration).
    EffectiveViewportChanged { node: NodeId, viewport: Rect },
}

/// Queues and listener registry for one rooted tree.
///
/// Owned by [`LayoutTree`] while a root is attached; detaching the root
/// discards it along with everything queued.
#[derive(Debug, Default)]
pub struct LayoutManager {
    pub(crate) pending_measure: IndexSet<NodeId>,
    pub(crate) pending_arrange: IndexSet<NodeId>,
    pub(crate) viewport_listeners: IndexSet<NodeId>,
    pub(crate) last_viewports: HashMap<NodeId, Rect>,
    pub(crate) events: Vec<LayoutEvent>,
}

impl LayoutManager {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queue a node for re-measure (and re-arrange) on the next pass.
    ///
    /// The sets keep each node at most once, in first-insertion order.
    pub(crate) fn invalidate_measure(&mut self, id: NodeId) {
        self.pending_measure.insert(id);
        self.pending_arrange.insert(id);
    }

    /// Queue a node for re-arrange on the next pass.
    pub(crate) fn invalidate_arrange(&mut self, id: NodeId) {
        self.pending_arrange.insert(id);
    }

    /// Release every reference held to a removed node.
    pub(crate) fn forget(&mut self, id: NodeId) {
        self.pending_measure.swap_remove(&id);
        self.pending_arrange.swap_remove(&id);
        self.viewport_listeners.swap_remove(&id);
        self.last_viewports.remove(&id);
    }
}

impl LayoutTree {
    /// Run queued measures and arranges until the tree is quiescent.
    ///
    /// Safe to call when nothing is pending; it then does no work and
    /// raises no [`LayoutEvent::LayoutUpdated`]. Queue processing order is
    /// insertion order, but correctness never depends on it: measuring a
    /// node measures its invalid children recursively, and already-valid
    /// nodes short-circuit.
    pub fn execute_layout_pass(&mut self) -> Result<(), LayoutError> {
        let Some(root) = self.root() else {
            return Ok(());
        };
        if self.manager.is_none() {
            return Ok(());
        }
        let span = tracing::debug_span!("layout_pass", root = root.0);
        let _enter = span.enter();

        let mut did_work = false;
        for _ in 0..MAX_PASSES {
            did_work |= self.execute_measure_pass()?;
            did_work |= self.execute_arrange_pass()?;
            let quiescent = self
                .manager
                .as_ref()
                .map(|m| m.pending_measure.is_empty() && m.pending_arrange.is_empty())
                .unwrap_or(true);
            if quiescent {
                break;
            }
        }

        self.raise_viewport_events();
        if did_work {
            if let Some(m) = &mut self.manager {
                m.events.push(LayoutEvent::LayoutUpdated);
            }
        }
        Ok(())
    }

    fn execute_measure_pass(&mut self) -> Result<bool, LayoutError> {
        let mut did_work = false;
        loop {
            let batch = match &mut self.manager {
                Some(m) if !m.pending_measure.is_empty() => {
                    std::mem::take(&mut m.pending_measure)
                }
                _ => break,
            };
            for id in batch {
                let available = match self.get(id) {
                    // Already re-measured as a child of an earlier entry, or
                    // removed since it was queued.
                    Some(node) if !node.is_measure_valid() => node.previous_measure(),
                    _ => continue,
                };
                if !self.is_rooted(id) {
                    continue;
                }
                // A node queued before it was ever measured falls back to
                // the root surface size as its constraint.
                self.measure(id, available.unwrap_or(self.root_size()))?;
                did_work = true;
            }
        }
        Ok(did_work)
    }

    fn execute_arrange_pass(&mut self) -> Result<bool, LayoutError> {
        let mut did_work = false;
        let root = self.root();
        loop {
            let batch = match &mut self.manager {
                Some(m) if !m.pending_arrange.is_empty() => {
                    std::mem::take(&mut m.pending_arrange)
                }
                _ => break,
            };
            for id in batch {
                let rect = match self.get(id) {
                    Some(node) if !node.is_arrange_valid() => {
                        if Some(id) == root {
                            Some(Rect::from_size(self.root_size()))
                        } else {
                            // A node never arranged before is covered by its
                            // parent's arrange instead.
                            node.previous_arrange()
                        }
                    }
                    _ => continue,
                };
                let Some(rect) = rect else { continue };
                if !self.is_rooted(id) {
                    continue;
                }
                self.arrange(id, rect)?;
                did_work = true;
            }
        }
        Ok(did_work)
    }

    /// Start delivering [`LayoutEvent::EffectiveViewportChanged`] for a
    /// node. The first event arrives after the next pass, whether or not
    /// the viewport moved.
    pub fn register_viewport_listener(&mut self, id: NodeId) {
        if let Some(m) = &mut self.manager {
            m.viewport_listeners.insert(id);
        }
    }

    /// Stop delivering viewport events for a node.
    pub fn unregister_viewport_listener(&mut self, id: NodeId) {
        if let Some(m) = &mut self.manager {
            m.viewport_listeners.swap_remove(&id);
            m.last_viewports.remove(&id);
        }
    }

    /// Drain the events produced by passes since the last drain.
    pub fn take_events(&mut self) -> Vec<LayoutEvent> {
        match &mut self.manager {
            Some(m) => std::mem::take(&mut m.events),
            None => Vec::new(),
        }
    }

    /// The part of a node's own coordinate space that is visible through
    /// every ancestor, or `None` for a node not attached to the root.
    ///
    /// The root surface and each ancestor's bounds all clip; a node scrolled
    /// or positioned fully out of view gets a zero-sized viewport, not
    /// `None`.
    pub fn effective_viewport(&self, id: NodeId) -> Option<Rect> {
        if !self.is_rooted(id) {
            return None;
        }

        let mut chain: Vec<NodeId> = Vec::new();
        let mut cursor = Some(id);
        while let Some(n) = cursor {
            chain.push(n);
            cursor = self.get(n)?.parent();
        }
        chain.reverse();

        let mut clip = Rect::from_size(self.root_size());
        let mut offset = Point::default();
        for (i, n) in chain.iter().enumerate() {
            let node = self.get(*n)?;
            // Bounds are parent-relative; accumulate into surface space.
            let bounds = node.bounds().translate(offset.x, offset.y);
            if i + 1 == chain.len() {
                return Some(clip.translate(-bounds.x, -bounds.y));
            }
            clip = clip.intersect(&bounds).unwrap_or_default();
            offset = bounds.origin();
        }
        None
    }

    fn raise_viewport_events(&mut self) {
        let listeners: Vec<NodeId> = match &self.manager {
            Some(m) if !m.viewport_listeners.is_empty() => {
                m.viewport_listeners.iter().copied().collect()
            }
            _ => return,
        };
        for id in listeners {
            let Some(viewport) = self.effective_viewport(id) else {
                continue;
            };
            if let Some(m) = &mut self.manager {
                if m.last_viewports.get(&id) != Some(&viewport) {
                    m.last_viewports.insert(id, viewport);
                    m.events
                        .push(LayoutEvent::EffectiveViewportChanged { node: id, viewport });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use trellis_core::Size;

    use crate::compute::Behavior;
    use crate::tree::LayoutNode;

    /// Leaf with a mutable intrinsic size and a measure counter.
    struct Probe {
        size: Rc<Cell<Size>>,
        measures: Rc<Cell<usize>>,
    }

    impl Probe {
        fn new(width: f64, height: f64) -> (Self, Rc<Cell<Size>>, Rc<Cell<usize>>) {
            let size = Rc::new(Cell::new(Size::new(width, height)));
            let measures = Rc::new(Cell::new(0));
            (
                Self {
                    size: size.clone(),
                    measures: measures.clone(),
                },
                size,
                measures,
            )
        }
    }

    impl Behavior for Probe {
        fn measure(
            &mut self,
            _tree: &mut LayoutTree,
            _node: NodeId,
            _available: Size,
        ) -> Result<Size, LayoutError> {
            self.measures.set(self.measures.get() + 1);
            Ok(self.size.get())
        }
    }

    #[test]
    fn test_pass_measures_arranges_and_raises_event() {
        let mut tree = LayoutTree::new();
        let id = tree.next_id();
        let root = tree.set_root(LayoutNode::new(id), Size::new(800.0, 600.0));
        let id = tree.next_id();
        let child = tree.add_child(root, LayoutNode::new(id)).unwrap();

        tree.execute_layout_pass().unwrap();

        assert!(tree.get(root).unwrap().is_measure_valid());
        assert!(tree.get(root).unwrap().is_arrange_valid());
        assert_eq!(
            tree.get(root).unwrap().bounds(),
            Rect::new(0.0, 0.0, 800.0, 600.0)
        );
        assert_eq!(
            tree.get(child).unwrap().bounds(),
            Rect::new(0.0, 0.0, 800.0, 600.0)
        );
        assert_eq!(tree.take_events(), vec![LayoutEvent::LayoutUpdated]);
    }

    #[test]
    fn test_quiescent_pass_does_no_work() {
        let mut tree = LayoutTree::new();
        let id = tree.next_id();
        let (behavior, _, measures) = Probe::new(40.0, 40.0);
        let root = tree.set_root(
            LayoutNode::new(id).with_behavior(behavior),
            Size::new(800.0, 600.0),
        );
        tree.execute_layout_pass().unwrap();
        tree.take_events();
        assert_eq!(measures.get(), 1);

        tree.execute_layout_pass().unwrap();
        assert_eq!(measures.get(), 1);
        assert!(tree.take_events().is_empty());
        let _ = root;
    }

    #[test]
    fn test_unchanged_desired_size_stops_propagation() {
        let mut tree = LayoutTree::new();
        let id = tree.next_id();
        let root = tree.set_root(LayoutNode::new(id), Size::new(800.0, 600.0));
        let id = tree.next_id();
        let middle = tree.add_child(root, LayoutNode::new(id)).unwrap();
        let id = tree.next_id();
        let (behavior, size, _) = Probe::new(40.0, 40.0);
        let leaf = tree
            .add_child(middle, LayoutNode::new(id).with_behavior(behavior))
            .unwrap();
        tree.execute_layout_pass().unwrap();
        tree.take_events();

        // The leaf re-measures to the same desired size; its ancestors must
        // stay valid.
        size.set(Size::new(40.0, 40.0));
        tree.invalidate_measure(leaf);
        assert!(!tree.get(leaf).unwrap().is_measure_valid());
        tree.execute_layout_pass().unwrap();

        assert!(tree.get(leaf).unwrap().is_measure_valid());
        assert!(tree.get(middle).unwrap().is_measure_valid());
        assert!(tree.get(root).unwrap().is_measure_valid());
        // The leaf itself still did work.
        assert_eq!(tree.take_events(), vec![LayoutEvent::LayoutUpdated]);
    }

    #[test]
    fn test_propagation_stops_at_first_unaffected_ancestor() {
        let mut tree = LayoutTree::new();
        let id = tree.next_id();
        let root = tree.set_root(LayoutNode::new(id), Size::new(800.0, 600.0));
        let id = tree.next_id();
        // Pinned dimensions: the middle's desired size cannot change.
        let middle = tree
            .add_child(root, LayoutNode::new(id).with_width(100.0).with_height(100.0))
            .unwrap();
        let id = tree.next_id();
        let (behavior, size, _) = Probe::new(40.0, 40.0);
        let leaf = tree
            .add_child(middle, LayoutNode::new(id).with_behavior(behavior))
            .unwrap();
        tree.execute_layout_pass().unwrap();

        size.set(Size::new(70.0, 70.0));
        tree.invalidate_measure(leaf);
        tree.execute_layout_pass().unwrap();

        // The leaf's desired size changed, so the middle re-measured; its
        // own pinned desired size did not, so the root was never touched.
        assert_eq!(tree.get(leaf).unwrap().desired_size(), Size::new(70.0, 70.0));
        assert_eq!(
            tree.get(middle).unwrap().desired_size(),
            Size::new(100.0, 100.0)
        );
        assert!(tree.get(middle).unwrap().is_measure_valid());
        assert!(tree.get(root).unwrap().is_measure_valid());
    }

    #[test]
    fn test_changed_desired_size_propagates_to_ancestors() {
        let mut tree = LayoutTree::new();
        let id = tree.next_id();
        let root = tree.set_root(LayoutNode::new(id), Size::new(800.0, 600.0));
        let id = tree.next_id();
        let (behavior, size, _) = Probe::new(40.0, 40.0);
        let leaf = tree
            .add_child(root, LayoutNode::new(id).with_behavior(behavior))
            .unwrap();
        tree.execute_layout_pass().unwrap();
        assert_eq!(tree.get(root).unwrap().desired_size(), Size::new(40.0, 40.0));

        size.set(Size::new(70.0, 20.0));
        tree.invalidate_measure(leaf);
        tree.execute_layout_pass().unwrap();

        assert_eq!(tree.get(root).unwrap().desired_size(), Size::new(70.0, 20.0));
        assert!(tree.get(root).unwrap().is_measure_valid());
    }

    #[test]
    fn test_resize_root_rearranges() {
        let mut tree = LayoutTree::new();
        let id = tree.next_id();
        let root = tree.set_root(LayoutNode::new(id), Size::new(800.0, 600.0));
        tree.execute_layout_pass().unwrap();

        tree.resize_root(Size::new(400.0, 300.0));
        tree.execute_layout_pass().unwrap();
        assert_eq!(
            tree.get(root).unwrap().bounds(),
            Rect::new(0.0, 0.0, 400.0, 300.0)
        );
    }

    #[test]
    fn test_viewport_listener_initial_and_change() {
        let mut tree = LayoutTree::new();
        let id = tree.next_id();
        let root = tree.set_root(LayoutNode::new(id), Size::new(200.0, 200.0));
        let id = tree.next_id();
        let (behavior, _, _) = Probe::new(50.0, 50.0);
        let child = tree
            .add_child(
                root,
                LayoutNode::new(id)
                    .with_behavior(behavior)
                    .with_horizontal_alignment(trellis_core::HorizontalAlignment::Left)
                    .with_vertical_alignment(trellis_core::VerticalAlignment::Top),
            )
            .unwrap();
        tree.register_viewport_listener(child);
        tree.execute_layout_pass().unwrap();

        let events = tree.take_events();
        assert!(events.contains(&LayoutEvent::EffectiveViewportChanged {
            node: child,
            viewport: Rect::new(0.0, 0.0, 200.0, 200.0),
        }));

        // A quiescent pass raises nothing for an unchanged viewport.
        tree.execute_layout_pass().unwrap();
        assert!(tree.take_events().is_empty());

        // Shrinking the surface moves the viewport.
        tree.resize_root(Size::new(100.0, 100.0));
        tree.execute_layout_pass().unwrap();
        let events = tree.take_events();
        assert!(events.contains(&LayoutEvent::EffectiveViewportChanged {
            node: child,
            viewport: Rect::new(0.0, 0.0, 100.0, 100.0),
        }));

        tree.unregister_viewport_listener(child);
        tree.resize_root(Size::new(200.0, 200.0));
        tree.execute_layout_pass().unwrap();
        let events = tree.take_events();
        assert_eq!(events, vec![LayoutEvent::LayoutUpdated]);
    }

    #[test]
    fn test_effective_viewport_clipped_by_ancestor() {
        let mut tree = LayoutTree::new();
        let id = tree.next_id();
        let root = tree.set_root(LayoutNode::new(id), Size::new(100.0, 100.0));
        let id = tree.next_id();
        // A fixed 60x60 panel at the top-left of the surface.
        let panel = tree
            .add_child(
                root,
                LayoutNode::new(id)
                    .with_width(60.0)
                    .with_height(60.0)
                    .with_horizontal_alignment(trellis_core::HorizontalAlignment::Left)
                    .with_vertical_alignment(trellis_core::VerticalAlignment::Top),
            )
            .unwrap();
        let id = tree.next_id();
        let leaf = tree.add_child(panel, LayoutNode::new(id)).unwrap();
        tree.execute_layout_pass().unwrap();

        // The leaf stretches to the panel's 60x60; the viewport is clipped
        // to that, expressed in leaf coordinates.
        assert_eq!(
            tree.effective_viewport(leaf),
            Some(Rect::new(0.0, 0.0, 60.0, 60.0))
        );
    }

    #[test]
    fn test_effective_viewport_detached_node() {
        let mut tree = LayoutTree::new();
        let id = tree.next_id();
        let root = tree.set_root(LayoutNode::new(id), Size::new(100.0, 100.0));
        tree.execute_layout_pass().unwrap();
        assert_eq!(
            tree.effective_viewport(root),
            Some(Rect::new(0.0, 0.0, 100.0, 100.0))
        );
        assert_eq!(tree.effective_viewport(NodeId(999)), None);
    }

    #[test]
    fn test_remove_scrubs_pending_and_listeners() {
        let mut tree = LayoutTree::new();
        let id = tree.next_id();
        let root = tree.set_root(LayoutNode::new(id), Size::new(100.0, 100.0));
        let id = tree.next_id();
        let child = tree.add_child(root, LayoutNode::new(id)).unwrap();
        tree.register_viewport_listener(child);

        // Child is sitting in the pending queues when it is removed.
        tree.remove(child);
        let m = tree.manager.as_ref().unwrap();
        assert!(!m.pending_measure.contains(&child));
        assert!(!m.pending_arrange.contains(&child));
        assert!(!m.viewport_listeners.contains(&child));

        // The pass must not trip over the removed node.
        tree.execute_layout_pass().unwrap();
    }

    #[test]
    fn test_pass_without_root_is_noop() {
        let mut tree = LayoutTree::new();
        tree.execute_layout_pass().unwrap();
        assert!(tree.take_events().is_empty());
    }

    #[test]
    fn test_take_events_drains() {
        let mut tree = LayoutTree::new();
        let id = tree.next_id();
        tree.set_root(LayoutNode::new(id), Size::new(100.0, 100.0));
        tree.execute_layout_pass().unwrap();
        assert_eq!(tree.take_events().len(), 1);
        assert!(tree.take_events().is_empty());
    }
}
