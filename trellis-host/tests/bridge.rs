use serde_json::json;
use std::cell::Cell;
use std::rc::Rc;
use trellis_host::{Bridge, BridgeConfig, BridgeError, EventQueue, SchemaTable};
use trellis_protocol::{Change, ChildrenTag, Id, ModifierElement, WidgetTag};
use trellis_testing::{
    Emitter, LogicalNode, TestFactory, TestView, button, column, init_tracing, row, scroll_view,
    split, tags, test_schema, text,
};
use trellis_widget::MutableListChildren;

fn bridge() -> (Bridge<TestView>, TestView) {
    init_tracing();
    let (root, container) = TestView::root();
    let bridge = Bridge::builder(container, TestFactory::new()).build();
    (bridge, root)
}

fn texts(view: &TestView, tag: ChildrenTag) -> Vec<String> {
    view.children(tag)
        .iter()
        .map(|child| child.text().unwrap_or_default())
        .collect()
}

/// Walk the native tree and the bridge's bookkeeping side by side.
fn assert_mirrors(bridge: &Bridge<TestView>, schema: &SchemaTable, id: Id, view: &TestView) {
    let slots: Vec<ChildrenTag> = if id.is_root() {
        vec![ChildrenTag::ROOT]
    } else {
        schema.children_tags(view.tag()).to_vec()
    };
    for tag in slots {
        let ids = bridge.child_ids(id, tag).unwrap();
        let views = view.children(tag);
        assert_eq!(ids.len(), views.len());
        for (position, (child_id, child_view)) in ids.iter().zip(&views).enumerate() {
            assert_eq!(bridge.node_index(*child_id), Some(position));
            assert!(bridge.widget(*child_id).unwrap().value().ptr_eq(child_view));
            assert_mirrors(bridge, schema, *child_id, child_view);
        }
    }
}

#[test]
fn test_example_batch_builds_row_with_text() {
    let (mut bridge, root) = bridge();
    bridge
        .apply(vec![
            Change::create(Id(1), tags::ROW),
            Change::modifier(Id(1), vec![]),
            Change::create(Id(2), tags::TEXT),
            Change::property(Id(2), tags::TEXT_PROPERTY, "hey"),
            Change::modifier(Id(2), vec![]),
            Change::add(Id(1), tags::CHILDREN, Id(2), 0),
            Change::add(Id::ROOT, ChildrenTag::ROOT, Id(1), 0),
        ])
        .unwrap();

    let rows = root.children(ChildrenTag::ROOT);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].tag(), tags::ROW);
    assert_eq!(texts(&rows[0], tags::CHILDREN), vec!["hey"]);

    assert_eq!(bridge.child_ids(Id::ROOT, ChildrenTag::ROOT), Some(vec![Id(1)]));
    assert_eq!(bridge.child_ids(Id(1), tags::CHILDREN), Some(vec![Id(2)]));
    assert_eq!(bridge.live_ids(), vec![Id(1), Id(2)]);
    assert_eq!(bridge.pending_count(), 0);
}

#[test]
fn test_round_trip_reproduces_logical_tree() {
    let (mut bridge, root) = bridge();
    let tree: Vec<LogicalNode> = vec![
        column([
            row([text("a"), button("b")]),
            split([text("l1"), text("l2")], [scroll_view([text("s")])]),
            text("z"),
        ]),
        row([]),
    ];
    let (changes, ids) = Emitter::new().emit_tree(&tree);
    bridge.apply(changes).unwrap();

    assert_eq!(ids, vec![Id(1), Id(11)]);
    let expected: Vec<_> = tree.iter().map(LogicalNode::expected).collect();
    assert_eq!(root.child_trees(ChildrenTag::ROOT), expected);
    assert_mirrors(&bridge, &test_schema(), Id::ROOT, &root);
}

#[test]
fn test_index_bookkeeping_across_edits() {
    let (mut bridge, root) = bridge();
    let schema = test_schema();
    let (changes, _) =
        Emitter::new().emit_tree(&[text("a"), text("b"), text("c"), text("d"), text("e")]);
    bridge.apply(changes).unwrap();

    bridge
        .apply(vec![Change::move_children(Id::ROOT, ChildrenTag::ROOT, 0, 3, 1)])
        .unwrap();
    assert_eq!(texts(&root, ChildrenTag::ROOT), vec!["b", "c", "a", "d", "e"]);
    assert_mirrors(&bridge, &schema, Id::ROOT, &root);

    bridge
        .apply(vec![Change::move_children(Id::ROOT, ChildrenTag::ROOT, 4, 1, 1)])
        .unwrap();
    assert_eq!(texts(&root, ChildrenTag::ROOT), vec!["b", "e", "c", "a", "d"]);
    assert_mirrors(&bridge, &schema, Id::ROOT, &root);

    bridge
        .apply(vec![Change::remove(Id::ROOT, ChildrenTag::ROOT, 1, 2)])
        .unwrap();
    assert_eq!(texts(&root, ChildrenTag::ROOT), vec!["b", "a", "d"]);
    assert_mirrors(&bridge, &schema, Id::ROOT, &root);

    let mut emitter = Emitter::starting_after(Id(5));
    let mut changes = Vec::new();
    let id = emitter.emit_node(&text("f"), &mut changes);
    changes.push(Change::add(Id::ROOT, ChildrenTag::ROOT, id, 1));
    bridge.apply(changes).unwrap();
    assert_eq!(texts(&root, ChildrenTag::ROOT), vec!["b", "f", "a", "d"]);
    assert_mirrors(&bridge, &schema, Id::ROOT, &root);
    assert_eq!(bridge.node_index(Id(6)), Some(1));
}

#[test]
fn test_create_root_id_is_duplicate() {
    let (mut bridge, _root) = bridge();
    let err = bridge
        .apply(vec![Change::create(Id::ROOT, tags::BUTTON)])
        .unwrap_err();
    assert!(matches!(err, BridgeError::DuplicateId(Id::ROOT)));
    assert_eq!(
        err.to_string(),
        "Insert attempted to replace existing widget with ID 0"
    );
}

#[test]
fn test_duplicate_id_is_fatal() {
    let (mut bridge, _root) = bridge();
    bridge
        .apply(vec![
            Change::create(Id(1), tags::BUTTON),
            Change::add(Id::ROOT, ChildrenTag::ROOT, Id(1), 0),
        ])
        .unwrap();
    let err = bridge
        .apply(vec![Change::create(Id(1), tags::BUTTON)])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Insert attempted to replace existing widget with ID 1"
    );

    let (mut bridge, _root) = self::bridge();
    let err = bridge
        .apply(vec![
            Change::create(Id(1), tags::TEXT),
            Change::create(Id(1), tags::ROW),
        ])
        .unwrap_err();
    assert!(matches!(err, BridgeError::DuplicateId(Id(1))));
}

#[test]
fn test_removed_ids_are_unknown() {
    for config in [BridgeConfig::default(), BridgeConfig::default().without_reuse()] {
        let (root, container) = TestView::root();
        let mut bridge = Bridge::builder(container, TestFactory::new())
            .config(config)
            .build();
        let (changes, _) = Emitter::new().emit_tree(&[button("tap")]);
        bridge.apply(changes).unwrap();

        bridge
            .apply(vec![Change::remove(Id::ROOT, ChildrenTag::ROOT, 0, 1)])
            .unwrap();
        assert!(root.children(ChildrenTag::ROOT).is_empty());

        let err = bridge
            .apply(vec![Change::property(Id(1), tags::TEXT_PROPERTY, "hello")])
            .unwrap_err();
        assert_eq!(err.to_string(), "Unknown widget ID 1");
    }
}

#[test]
fn test_entire_subtree_removed() {
    let (mut bridge, _root) = bridge();
    let (changes, _) = Emitter::new().emit_tree(&[row([row([text("hello")])])]);
    bridge.apply(changes).unwrap();

    bridge
        .apply(vec![Change::property(Id(3), tags::TEXT_PROPERTY, "hey")])
        .unwrap();
    bridge
        .apply(vec![Change::remove(Id::ROOT, ChildrenTag::ROOT, 0, 1)])
        .unwrap();

    let err = bridge
        .apply(vec![Change::property(Id(3), tags::TEXT_PROPERTY, "sup")])
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnknownNode(Id(3))));
    assert!(bridge.live_ids().is_empty());
}

#[test]
fn test_modifier_change_notifies_container() {
    init_tracing();
    let updates = Rc::new(Cell::new(0));
    let seen = updates.clone();
    let container = MutableListChildren::<TestView>::with_modifier_updated(move |_| {
        seen.set(seen.get() + 1)
    });
    let mut bridge = Bridge::builder(container, TestFactory::new()).build();

    // The initial insert covers the first modifier.
    bridge
        .apply(vec![
            Change::create(Id(1), tags::BUTTON),
            Change::modifier(Id(1), vec![]),
            Change::add(Id::ROOT, ChildrenTag::ROOT, Id(1), 0),
        ])
        .unwrap();
    assert_eq!(updates.get(), 0);

    bridge.apply(vec![Change::modifier(Id(1), vec![])]).unwrap();
    assert_eq!(updates.get(), 1);
}

#[test]
fn test_modifier_updates_nested_child() {
    let (mut bridge, root) = bridge();
    let (changes, _) = Emitter::new().emit_tree(&[row([text("a")])]);
    bridge.apply(changes).unwrap();

    bridge
        .apply(vec![Change::modifier(
            Id(2),
            vec![
                ModifierElement::new(tags::FLEX_WEIGHT, 2.0),
                ModifierElement::new(tags::BACKGROUND, "red"),
            ],
        )])
        .unwrap();

    let row = &root.children(ChildrenTag::ROOT)[0];
    let text = &row.children(tags::CHILDREN)[0];
    assert_eq!(text.flex_weight(), Some(2.0));
    assert_eq!(text.background().as_deref(), Some("red"));
    assert_eq!(row.child_modifier_updates(), 1);
    assert_eq!(root.child_modifier_updates(), 0);
}

#[test]
fn test_attaching_twice_is_fatal() {
    let (mut bridge, _root) = bridge();
    let (changes, _) = Emitter::new().emit_tree(&[row([text("a")])]);
    bridge.apply(changes).unwrap();

    let err = bridge
        .apply(vec![Change::add(Id::ROOT, ChildrenTag::ROOT, Id(2), 0)])
        .unwrap_err();
    assert!(matches!(err, BridgeError::ChildAlreadyAttached(Id(2))));

    let err = bridge
        .apply(vec![
            Change::create(Id(10), tags::TEXT),
            Change::create(Id(11), tags::ROW),
            Change::create(Id(12), tags::ROW),
            Change::add(Id(11), tags::CHILDREN, Id(10), 0),
            Change::add(Id(12), tags::CHILDREN, Id(10), 0),
        ])
        .unwrap_err();
    assert!(matches!(err, BridgeError::ChildAlreadyAttached(Id(10))));
}

#[test]
fn test_pending_cycle_is_fatal() {
    let (mut bridge, _root) = bridge();
    let err = bridge
        .apply(vec![
            Change::create(Id(1), tags::ROW),
            Change::create(Id(2), tags::ROW),
            Change::add(Id(1), tags::CHILDREN, Id(2), 0),
            Change::add(Id(2), tags::CHILDREN, Id(1), 0),
        ])
        .unwrap_err();
    assert!(matches!(
        err,
        BridgeError::Cycle {
            parent: Id(2),
            child: Id(1)
        }
    ));
}

#[test]
fn test_root_rejects_foreign_changes() {
    let (mut bridge, _root) = bridge();
    let err = bridge
        .apply(vec![Change::property(Id::ROOT, tags::TEXT_PROPERTY, "x")])
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnexpectedRootChange));

    let err = bridge
        .apply(vec![Change::modifier(Id::ROOT, vec![])])
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnexpectedRootChange));

    let err = bridge
        .apply(vec![
            Change::create(Id(1), tags::TEXT),
            Change::add(Id::ROOT, ChildrenTag(2), Id(1), 0),
        ])
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnexpectedRootChildren(ChildrenTag(2))));
}

#[test]
fn test_unknown_ids_and_bad_indices() {
    let (mut bridge, _root) = bridge();
    let err = bridge
        .apply(vec![Change::add(Id::ROOT, ChildrenTag::ROOT, Id(42), 0)])
        .unwrap_err();
    assert_eq!(err.to_string(), "Unknown widget ID 42");

    let err = bridge
        .apply(vec![
            Change::create(Id(1), tags::TEXT),
            Change::add(Id::ROOT, ChildrenTag::ROOT, Id(1), 1),
        ])
        .unwrap_err();
    assert!(matches!(err, BridgeError::Children { id: Id::ROOT, .. }));

    let err = bridge
        .apply(vec![Change::move_children(Id::ROOT, ChildrenTag::ROOT, 0, 1, 1)])
        .unwrap_err();
    assert!(matches!(err, BridgeError::Children { .. }));
}

#[test]
fn test_invalid_property_value_is_fatal() {
    let (mut bridge, _root) = bridge();
    let (changes, _) = Emitter::new().emit_tree(&[text("a")]);
    bridge.apply(changes).unwrap();

    let err = bridge
        .apply(vec![Change::property(Id(1), tags::TEXT_PROPERTY, 5)])
        .unwrap_err();
    assert!(matches!(err, BridgeError::Property { id: Id(1), .. }));

    let err = bridge
        .apply(vec![Change::modifier(
            Id(1),
            vec![ModifierElement::new(tags::FLEX_WEIGHT, "heavy")],
        )])
        .unwrap_err();
    assert!(matches!(err, BridgeError::Modifier { .. }));
}

#[test]
fn test_failed_attach_leaves_no_stale_ids() {
    let (mut bridge, root) = bridge();
    let err = bridge
        .apply(vec![
            Change::create(Id(1), tags::TEXT),
            Change::property(Id(1), tags::TEXT_PROPERTY, 5),
            Change::add(Id::ROOT, ChildrenTag::ROOT, Id(1), 0),
        ])
        .unwrap_err();
    assert!(matches!(err, BridgeError::Property { id: Id(1), .. }));
    assert!(!bridge.contains(Id(1)));
    assert!(bridge.live_ids().is_empty());
    assert!(root.children(ChildrenTag::ROOT).is_empty());

    // The bad child sits below a parent that replayed fine.
    let err = bridge
        .apply(vec![
            Change::create(Id(2), tags::ROW),
            Change::create(Id(3), tags::TEXT),
            Change::create(Id(4), tags::TEXT),
            Change::property(Id(3), tags::TEXT_PROPERTY, "fine"),
            Change::property(Id(4), tags::TEXT_PROPERTY, false),
            Change::add(Id(2), tags::CHILDREN, Id(3), 0),
            Change::add(Id(2), tags::CHILDREN, Id(4), 1),
            Change::add(Id::ROOT, ChildrenTag::ROOT, Id(2), 0),
        ])
        .unwrap_err();
    assert!(matches!(err, BridgeError::Property { id: Id(4), .. }));
    assert!(bridge.live_ids().is_empty());
    assert!(root.children(ChildrenTag::ROOT).is_empty());

    // The ids are free for a fresh attempt.
    let (changes, _) = Emitter::new().emit_tree(&[text("ok")]);
    bridge.apply(changes).unwrap();
    assert_eq!(bridge.live_ids(), vec![Id(1)]);
    assert_eq!(texts(&root, ChildrenTag::ROOT), vec!["ok"]);
}

#[test]
fn test_unattached_creates_dropped_at_batch_end() {
    let (mut bridge, root) = bridge();
    bridge
        .apply(vec![
            Change::create(Id(1), tags::ROW),
            Change::create(Id(2), tags::TEXT),
            Change::add(Id(1), tags::CHILDREN, Id(2), 0),
            Change::create(Id(3), tags::TEXT),
            Change::add(Id::ROOT, ChildrenTag::ROOT, Id(3), 0),
        ])
        .unwrap();
    assert_eq!(bridge.pending_count(), 0);
    assert_eq!(bridge.live_ids(), vec![Id(3)]);

    let err = bridge
        .apply(vec![Change::add(Id::ROOT, ChildrenTag::ROOT, Id(1), 0)])
        .unwrap_err();
    assert!(matches!(err, BridgeError::UnknownNode(Id(1))));
    assert_eq!(root.children(ChildrenTag::ROOT).len(), 1);
}

#[test]
fn test_close_makes_bridge_inert() {
    let (mut bridge, root) = bridge();
    let (changes, _) = Emitter::new().emit_tree(&[row([text("a")])]);
    bridge.apply(changes).unwrap();
    let row = root.children(ChildrenTag::ROOT)[0].clone();
    let text = row.children(tags::CHILDREN)[0].clone();

    bridge.close();
    assert!(bridge.is_closed());
    assert!(root.children(ChildrenTag::ROOT).is_empty());
    assert!(row.is_detached());
    assert!(text.is_detached());
    assert!(!bridge.contains(Id(1)));

    let err = bridge
        .apply(vec![Change::create(Id(5), tags::TEXT)])
        .unwrap_err();
    assert!(matches!(err, BridgeError::Closed));
}

#[test]
fn test_drop_detaches_tree() {
    let (mut bridge, root) = bridge();
    let (changes, _) = Emitter::new().emit_tree(&[text("a")]);
    bridge.apply(changes).unwrap();
    let text = root.children(ChildrenTag::ROOT)[0].clone();

    drop(bridge);
    assert!(text.is_detached());
}

#[test]
fn test_click_reports_event_for_node() {
    init_tracing();
    let (root, container) = TestView::root();
    let queue = EventQueue::new();
    let mut bridge = Bridge::builder(container, TestFactory::new())
        .event_sink(queue.clone())
        .build();
    let (changes, _) = Emitter::new().emit_tree(&[button("ok")]);
    bridge.apply(changes).unwrap();

    let view = root.children(ChildrenTag::ROOT)[0].clone();
    view.click();
    let events = queue.drain();
    assert_eq!(events.len(), 1);
    let event = events.into_iter().next().unwrap().into_event().unwrap();
    assert_eq!(event.id, Id(1));
    assert_eq!(event.tag, tags::CLICK);
    assert_eq!(event.args, vec![json!(1)]);

    bridge
        .apply(vec![Change::property(Id(1), tags::ON_CLICK, false)])
        .unwrap();
    view.click();
    assert!(queue.is_empty());
}

#[test]
fn test_unknown_widget_factory_result() {
    let (mut bridge, _root) = bridge();
    let err = bridge
        .apply(vec![Change::create(Id(1), WidgetTag(99))])
        .unwrap_err();
    assert_eq!(err.to_string(), "Unknown widget tag 99");
}
