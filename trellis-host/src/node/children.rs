use super::{NodeArena, NodeKey};
use crate::error::{BridgeError, Result};
use std::ops::Range;
use trellis_protocol::ChildrenTag;
use trellis_widget::{move_items, validate_insert, validate_move, validate_remove};

impl<W> NodeArena<W> {
    /// Insert `child` at `index` of the `tag` slot of `parent`, natively and in the
    /// shadow list.
    pub fn insert_child(
        &mut self,
        parent: NodeKey,
        tag: ChildrenTag,
        index: usize,
        child: NodeKey,
    ) -> Result<()> {
        let Some(value) = self.widget(child).map(|node| node.widget.value()) else {
            return Ok(());
        };
        let Some(node) = self.get_mut(parent) else {
            return Ok(());
        };
        let id = node.id();
        let (slot, container) = match node.slot_parts(tag) {
            Some((slot, Some(container))) => (slot, container),
            _ => return Err(BridgeError::MissingContainer { id, tag }),
        };
        validate_insert(slot.len(), index).map_err(|source| BridgeError::Children { id, source })?;

        slot.insert(index, child);
        container.insert(index, value);
        let len = slot.len();

        if let Some(node) = self.widget_mut(child) {
            node.parent = Some((parent, tag));
        }
        self.reindex(parent, tag, index..len);
        Ok(())
    }

    pub fn move_children(
        &mut self,
        parent: NodeKey,
        tag: ChildrenTag,
        from: usize,
        to: usize,
        count: usize,
    ) -> Result<()> {
        let Some(node) = self.get_mut(parent) else {
            return Ok(());
        };
        let id = node.id();
        let (slot, container) = match node.slot_parts(tag) {
            Some((slot, Some(container))) => (slot, container),
            _ => return Err(BridgeError::MissingContainer { id, tag }),
        };
        validate_move(slot.len(), from, to, count)
            .map_err(|source| BridgeError::Children { id, source })?;

        move_items(slot, from, to, count);
        container.move_range(from, to, count);

        // Moving up only shifts [from, to); moving down only shifts [to, from + count).
        self.reindex(parent, tag, from.min(to)..to.max(from + count));
        Ok(())
    }

    /// Take `count` children out of a slot. The removed nodes stay in the arena
    /// with no parent.
    pub fn remove_children(
        &mut self,
        parent: NodeKey,
        tag: ChildrenTag,
        index: usize,
        count: usize,
    ) -> Result<Vec<NodeKey>> {
        let Some(node) = self.get_mut(parent) else {
            return Ok(Vec::new());
        };
        let id = node.id();
        let (slot, container) = match node.slot_parts(tag) {
            Some((slot, Some(container))) => (slot, container),
            _ => return Err(BridgeError::MissingContainer { id, tag }),
        };
        validate_remove(slot.len(), index, count)
            .map_err(|source| BridgeError::Children { id, source })?;

        let removed: Vec<NodeKey> = slot.drain(index..index + count).collect();
        container.remove(index, count);
        let len = slot.len();

        for key in &removed {
            if let Some(node) = self.widget_mut(*key) {
                node.parent = None;
            }
        }
        self.reindex(parent, tag, index..len);
        Ok(removed)
    }

    fn reindex(&mut self, parent: NodeKey, tag: ChildrenTag, range: Range<usize>) {
        for index in range {
            let Some(key) = self
                .get(parent)
                .and_then(|node| node.slot(tag))
                .and_then(|slot| slot.get(index).copied())
            else {
                break;
            };
            if let Some(node) = self.widget_mut(key) {
                node.index = index;
            }
        }
    }

    /// Keys of the subtree rooted at `key`, parents before their children.
    pub fn subtree(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut keys = Vec::new();
        let mut stack = vec![key];
        while let Some(key) = stack.pop() {
            let Some(node) = self.widget(key) else {
                continue;
            };
            keys.push(key);
            for slot in node.slots.iter().rev() {
                stack.extend(slot.nodes.iter().rev());
            }
        }
        keys
    }

    /// Detach a subtree natively, children first, and free all of its slots.
    pub fn detach_subtree(&mut self, key: NodeKey) {
        let Some(mut node) = self.dispose(key) else {
            return;
        };
        for slot in std::mem::take(&mut node.slots) {
            for child in slot.nodes {
                self.detach_subtree(child);
            }
            if let Some(container) = node.widget.children(slot.tag) {
                container.detach();
            }
        }
        node.widget.detach();
    }

    /// Detach everything attached to the root, then the root container itself.
    pub fn detach_root(&mut self) {
        let Some(root) = self.root_mut() else {
            return;
        };
        let children = std::mem::take(&mut root.children);
        for child in children {
            self.detach_subtree(child);
        }
        if let Some(root) = self.root_mut() {
            root.container.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{RootNode, WidgetNode};
    use serde_json::Value;
    use std::cell::RefCell;
    use std::rc::Rc;
    use trellis_protocol::{Id, PropertyTag, WidgetTag};
    use trellis_widget::{
        ChildrenError, EventEmitter, Modifier, MutableListChildren, PropertyError, Widget,
        WidgetChildren,
    };

    type Log = Rc<RefCell<Vec<String>>>;

    struct Probe {
        name: &'static str,
        children: Option<MutableListChildren<&'static str>>,
        log: Log,
    }

    impl Widget<&'static str> for Probe {
        fn value(&self) -> &'static str {
            self.name
        }

        fn apply(
            &mut self,
            tag: PropertyTag,
            _value: &Value,
            _events: &EventEmitter,
        ) -> std::result::Result<(), PropertyError> {
            Err(PropertyError::Unknown(tag))
        }

        fn set_modifier(&mut self, _modifier: Modifier) {}

        fn children(
            &mut self,
            tag: ChildrenTag,
        ) -> Option<&mut dyn WidgetChildren<&'static str>> {
            match self.children.as_mut() {
                Some(children) if tag == ChildrenTag(1) => Some(children),
                _ => None,
            }
        }

        fn detach(&mut self) {
            self.log.borrow_mut().push(format!("detach {}", self.name));
        }
    }

    fn arena() -> NodeArena<&'static str> {
        NodeArena::new(RootNode {
            container: Box::new(MutableListChildren::new()),
            children: Vec::new(),
        })
    }

    fn add(
        arena: &mut NodeArena<&'static str>,
        log: &Log,
        id: u64,
        name: &'static str,
        container: bool,
    ) -> NodeKey {
        let probe = Probe {
            name,
            children: container.then(MutableListChildren::new),
            log: log.clone(),
        };
        let tags = if container { vec![ChildrenTag(1)] } else { vec![] };
        arena.insert(WidgetNode::new(Id(id), WidgetTag(1), Box::new(probe), tags))
    }

    fn slot_ids(arena: &NodeArena<&'static str>, key: NodeKey, tag: ChildrenTag) -> Vec<Id> {
        arena
            .get(key)
            .and_then(|node| node.slot(tag))
            .unwrap_or(&[])
            .iter()
            .filter_map(|child| arena.widget(*child).map(|node| node.id()))
            .collect()
    }

    fn assert_indices(arena: &NodeArena<&'static str>, key: NodeKey, tag: ChildrenTag) {
        let slot = arena.get(key).and_then(|node| node.slot(tag)).unwrap_or(&[]);
        for (position, child) in slot.iter().enumerate() {
            assert_eq!(arena.widget(*child).map(|node| node.index), Some(position));
        }
    }

    #[test]
    fn test_insert_move_remove_keep_indices() {
        let log = Log::default();
        let mut arena = arena();
        let row = add(&mut arena, &log, 1, "row", true);
        arena.insert_child(NodeKey::ROOT, ChildrenTag::ROOT, 0, row).unwrap();

        let names = ["a", "b", "c", "d", "e"];
        for (i, name) in names.iter().enumerate() {
            let key = add(&mut arena, &log, 10 + i as u64, name, false);
            arena.insert_child(row, ChildrenTag(1), i, key).unwrap();
        }
        let tag = ChildrenTag(1);
        assert_indices(&arena, row, tag);

        arena.move_children(row, tag, 1, 4, 2).unwrap();
        assert_eq!(
            slot_ids(&arena, row, tag),
            vec![Id(10), Id(13), Id(11), Id(12), Id(14)]
        );
        assert_indices(&arena, row, tag);

        arena.move_children(row, tag, 3, 0, 2).unwrap();
        assert_eq!(
            slot_ids(&arena, row, tag),
            vec![Id(12), Id(14), Id(10), Id(13), Id(11)]
        );
        assert_indices(&arena, row, tag);

        let removed = arena.remove_children(row, tag, 1, 2).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(slot_ids(&arena, row, tag), vec![Id(12), Id(13), Id(11)]);
        assert_indices(&arena, row, tag);
        assert!(removed.iter().all(|key| arena.widget(*key).unwrap().parent.is_none()));
    }

    #[test]
    fn test_out_of_bounds_is_rejected_before_mutation() {
        let log = Log::default();
        let mut arena = arena();
        let a = add(&mut arena, &log, 1, "a", false);
        arena.insert_child(NodeKey::ROOT, ChildrenTag::ROOT, 0, a).unwrap();

        let err = arena
            .remove_children(NodeKey::ROOT, ChildrenTag::ROOT, 0, 2)
            .unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Children {
                source: ChildrenError::RemoveCountOutOfBounds { .. },
                ..
            }
        ));
        assert_eq!(slot_ids(&arena, NodeKey::ROOT, ChildrenTag::ROOT), vec![Id(1)]);
    }

    #[test]
    fn test_leaf_has_no_container() {
        let log = Log::default();
        let mut arena = arena();
        let leaf = add(&mut arena, &log, 1, "leaf", false);
        let child = add(&mut arena, &log, 2, "child", false);
        let err = arena.insert_child(leaf, ChildrenTag(1), 0, child).unwrap_err();
        assert!(matches!(err, BridgeError::MissingContainer { .. }));
    }

    #[test]
    fn test_detach_is_children_first() {
        let log = Log::default();
        let mut arena = arena();
        let row = add(&mut arena, &log, 1, "row", true);
        let text = add(&mut arena, &log, 2, "text", false);
        arena.insert_child(row, ChildrenTag(1), 0, text).unwrap();
        arena.insert_child(NodeKey::ROOT, ChildrenTag::ROOT, 0, row).unwrap();

        assert_eq!(arena.subtree(row), vec![row, text]);

        arena.detach_root();
        assert_eq!(*log.borrow(), vec!["detach text", "detach row"]);
        assert_eq!(arena.len(), 1);
    }
}
