//! End-to-end layout scenarios through the public API.

use trellis_layout::{
    HorizontalAlignment, LayoutEvent, LayoutNode, LayoutTree, Rect, Size, Thickness,
    VerticalAlignment,
};

fn surface(width: f64, height: f64) -> (LayoutTree, trellis_layout::NodeId) {
    let mut tree = LayoutTree::new();
    let id = tree.next_id();
    let root = tree.set_root(LayoutNode::new(id), Size::new(width, height));
    (tree, root)
}

#[test]
fn fixed_child_with_margin_centered() {
    let (mut tree, root) = surface(400.0, 300.0);
    let id = tree.next_id();
    let child = tree
        .add_child(
            root,
            LayoutNode::new(id)
                .with_width(100.0)
                .with_height(50.0)
                .with_margin(Thickness::uniform(10.0))
                .with_horizontal_alignment(HorizontalAlignment::Center)
                .with_vertical_alignment(VerticalAlignment::Center),
        )
        .unwrap();

    tree.execute_layout_pass().unwrap();

    // Margin-deflated slack is split evenly, then the margin offsets the
    // origin.
    let bounds = tree.get(child).unwrap().bounds();
    assert_eq!(bounds, Rect::new(150.0, 125.0, 100.0, 50.0));
    assert_eq!(
        tree.get(child).unwrap().desired_size(),
        Size::new(120.0, 70.0)
    );
}

#[test]
fn nested_stretch_fills_surface() {
    let (mut tree, root) = surface(640.0, 480.0);
    let id = tree.next_id();
    let panel = tree.add_child(root, LayoutNode::new(id)).unwrap();
    let id = tree.next_id();
    let leaf = tree.add_child(panel, LayoutNode::new(id)).unwrap();

    tree.execute_layout_pass().unwrap();

    assert_eq!(tree.get(panel).unwrap().bounds(), Rect::new(0.0, 0.0, 640.0, 480.0));
    assert_eq!(tree.get(leaf).unwrap().bounds(), Rect::new(0.0, 0.0, 640.0, 480.0));
}

#[test]
fn hide_then_show_round_trip() {
    let (mut tree, root) = surface(400.0, 400.0);
    let id = tree.next_id();
    let child = tree
        .add_child(root, LayoutNode::new(id).with_width(80.0).with_height(80.0))
        .unwrap();
    tree.execute_layout_pass().unwrap();
    assert_eq!(tree.get(root).unwrap().desired_size(), Size::new(80.0, 80.0));

    tree.set_visible(child, false).unwrap();
    tree.execute_layout_pass().unwrap();
    assert_eq!(tree.get(root).unwrap().desired_size(), Size::default());

    tree.set_visible(child, true).unwrap();
    tree.execute_layout_pass().unwrap();
    assert_eq!(tree.get(root).unwrap().desired_size(), Size::new(80.0, 80.0));
    assert_eq!(tree.get(child).unwrap().bounds().size(), Size::new(80.0, 80.0));
}

#[test]
fn resize_root_relays_out_children() {
    let (mut tree, root) = surface(800.0, 600.0);
    let id = tree.next_id();
    let child = tree
        .add_child(
            root,
            LayoutNode::new(id)
                .with_width(100.0)
                .with_horizontal_alignment(HorizontalAlignment::Right),
        )
        .unwrap();
    tree.execute_layout_pass().unwrap();
    assert_eq!(tree.get(child).unwrap().bounds().x, 700.0);

    tree.resize_root(Size::new(500.0, 600.0));
    tree.execute_layout_pass().unwrap();
    assert_eq!(tree.get(child).unwrap().bounds().x, 400.0);
}

#[test]
fn scale_change_resnaps_geometry() {
    let (mut tree, root) = surface(200.0, 200.0);
    let id = tree.next_id();
    let child = tree
        .add_child(root, LayoutNode::new(id).with_width(10.1).with_height(10.1))
        .unwrap();
    tree.execute_layout_pass().unwrap();
    // At scale 1.0 sizes round up to whole units.
    assert_eq!(tree.get(child).unwrap().desired_size(), Size::new(11.0, 11.0));

    tree.set_scale_factor(1.5);
    tree.execute_layout_pass().unwrap();
    let desired = tree.get(child).unwrap().desired_size();
    assert!((desired.width - 16.0 / 1.5).abs() < 1e-9);
}

#[test]
fn events_drain_once_per_working_pass() {
    let (mut tree, root) = surface(300.0, 300.0);
    let id = tree.next_id();
    let child = tree.add_child(root, LayoutNode::new(id)).unwrap();

    tree.execute_layout_pass().unwrap();
    let events = tree.take_events();
    assert_eq!(
        events.iter().filter(|e| **e == LayoutEvent::LayoutUpdated).count(),
        1
    );

    tree.execute_layout_pass().unwrap();
    assert!(tree.take_events().is_empty());

    tree.set_width(child, 50.0).unwrap();
    tree.execute_layout_pass().unwrap();
    assert_eq!(tree.take_events(), vec![LayoutEvent::LayoutUpdated]);
}

#[test]
fn dirty_paint_tracks_bounds_changes() {
    let (mut tree, root) = surface(300.0, 300.0);
    let id = tree.next_id();
    let child = tree.add_child(root, LayoutNode::new(id)).unwrap();
    tree.execute_layout_pass().unwrap();
    assert!(!tree.take_dirty_paint().is_empty());

    // A quiescent pass dirties nothing.
    tree.execute_layout_pass().unwrap();
    assert!(tree.take_dirty_paint().is_empty());

    tree.set_width(child, 120.0).unwrap();
    tree.execute_layout_pass().unwrap();
    let dirty = tree.take_dirty_paint();
    assert!(dirty.contains(&child));
}

#[test]
fn reparent_relayout() {
    let (mut tree, root) = surface(400.0, 400.0);
    let id = tree.next_id();
    let left = tree
        .add_child(
            root,
            LayoutNode::new(id)
                .with_width(200.0)
                .with_horizontal_alignment(HorizontalAlignment::Left),
        )
        .unwrap();
    let id = tree.next_id();
    let right = tree
        .add_child(
            root,
            LayoutNode::new(id)
                .with_width(100.0)
                .with_horizontal_alignment(HorizontalAlignment::Right),
        )
        .unwrap();
    let id = tree.next_id();
    let item = tree.add_child(left, LayoutNode::new(id)).unwrap();
    tree.execute_layout_pass().unwrap();
    assert_eq!(tree.get(item).unwrap().bounds().width, 200.0);

    tree.reparent(item, right).unwrap();
    tree.execute_layout_pass().unwrap();
    assert_eq!(tree.get(item).unwrap().bounds().width, 100.0);
}
