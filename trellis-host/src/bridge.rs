use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::factory::ProtocolFactory;
use crate::node::{NodeArena, NodeKey, RootNode, WidgetNode};
use crate::pending::{PendingNode, RecordedChange};
use crate::reuse::{ReusePool, node_shape_hash};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use trellis_protocol::{
    Change, ChangesSink, ChildrenChange, ChildrenTag, Create, Id, MismatchHandler,
    ModifierChange, ModifierElement, PropertyChange, PropertyTag, UiEvent, UiEventSink,
};
use trellis_widget::{
    EventEmitter, Modifier, ModifierError, PropertyError, Widget, WidgetChildren, validate_insert,
};

enum Target {
    Live(NodeKey),
    Pending,
    Skipped,
}

/// Applies change batches to one native tree.
///
/// Owned by the UI thread. A node does not exist natively until an `Add` connects
/// it, directly or through its ancestors, to the root; until then its changes are
/// recorded. This is what lets a rebuilt subtree take over pooled native widgets
/// instead of creating new ones.
///
/// A producer creates and attaches a node within one batch. Whatever is still
/// unattached when a batch ends is dropped with a warning, so a later `Add` for
/// it fails with [`BridgeError::UnknownNode`].
pub struct Bridge<W> {
    arena: NodeArena<W>,
    nodes: HashMap<Id, NodeKey>,
    pending: HashMap<Id, PendingNode>,
    /// Ids whose `Create` named an unknown widget tag, plus anything added under them.
    skipped: HashSet<Id>,
    pool: Option<ReusePool>,
    factory: Box<dyn ProtocolFactory<W>>,
    mismatch: Box<dyn MismatchHandler>,
    sink: Rc<dyn UiEventSink>,
    closed: bool,
}

impl<W: 'static> Bridge<W> {
    pub fn builder(
        container: impl WidgetChildren<W> + 'static,
        factory: impl ProtocolFactory<W> + 'static,
    ) -> BridgeBuilder<W> {
        BridgeBuilder {
            container: Box::new(container),
            factory: Box::new(factory),
            config: BridgeConfig::default(),
            sink: None,
            mismatch: None,
        }
    }
}

impl<W> Bridge<W> {
    /// Apply one batch in order. The first error aborts the batch; changes before
    /// it stay applied.
    pub fn apply(&mut self, changes: Vec<Change>) -> Result<()> {
        if self.closed {
            return Err(BridgeError::Closed);
        }
        tracing::debug!("applying batch of {} changes", changes.len());
        let result = changes.into_iter().try_for_each(|change| {
            tracing::trace!("applying {:?}", change);
            match change {
                Change::Create(create) => self.create(create),
                Change::Property(change) => self.property(change),
                Change::Modifier(change) => self.modifier(change),
                Change::Children(change) => self.children(change),
            }
        });
        self.drop_unattached();
        result
    }

    /// Detach the whole tree, pooled nodes included. Every later `apply` fails.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let nodes = self.arena.len() - 1;
        self.arena.detach_root();
        let pooled = self.pool.as_mut().map(ReusePool::drain).unwrap_or_default();
        for key in pooled {
            self.arena.detach_subtree(key);
        }
        self.nodes.clear();
        self.pending.clear();
        self.skipped.clear();
        tracing::debug!("bridge closed, detached {} nodes", nodes);
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// True for the root and every attached node.
    pub fn contains(&self, id: Id) -> bool {
        id.is_root() || self.nodes.contains_key(&id)
    }

    /// Ids of an attached node's children in one slot, in native order.
    pub fn child_ids(&self, id: Id, tag: ChildrenTag) -> Option<Vec<Id>> {
        let slot = self.arena.get(self.key(id)?)?.slot(tag)?;
        Some(
            slot.iter()
                .filter_map(|key| self.arena.widget(*key).map(WidgetNode::id))
                .collect(),
        )
    }

    /// Position of an attached node within its parent's slot.
    pub fn node_index(&self, id: Id) -> Option<usize> {
        let key = self.nodes.get(&id)?;
        self.arena.widget(*key).map(|node| node.index)
    }

    pub fn widget(&self, id: Id) -> Option<&dyn Widget<W>> {
        let key = self.nodes.get(&id)?;
        self.arena.widget(*key).map(|node| node.widget.as_ref())
    }

    /// Attached ids in ascending order, root excluded.
    pub fn live_ids(&self) -> Vec<Id> {
        let mut ids: Vec<Id> = self.nodes.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Number of removed subtrees currently held for reuse.
    pub fn pooled_count(&self) -> usize {
        self.pool.as_ref().map_or(0, ReusePool::len)
    }

    /// Nodes created but not yet connected to the root. Zero between batches.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Structural hash of an attached subtree; 0 if it can never be reused.
    pub fn shape_hash(&self, id: Id) -> Option<u64> {
        let key = self.nodes.get(&id)?;
        Some(node_shape_hash(&self.arena, self.factory.schema(), *key))
    }

    fn key(&self, id: Id) -> Option<NodeKey> {
        if id.is_root() {
            Some(NodeKey::ROOT)
        } else {
            self.nodes.get(&id).copied()
        }
    }

    fn target(&self, id: Id) -> Result<Target> {
        if let Some(key) = self.key(id) {
            Ok(Target::Live(key))
        } else if self.pending.contains_key(&id) {
            Ok(Target::Pending)
        } else if self.skipped.contains(&id) {
            Ok(Target::Skipped)
        } else {
            Err(BridgeError::UnknownNode(id))
        }
    }

    fn create(&mut self, Create { id, tag }: Create) -> Result<()> {
        if id.is_root()
            || self.nodes.contains_key(&id)
            || self.pending.contains_key(&id)
            || self.skipped.contains(&id)
        {
            return Err(BridgeError::DuplicateId(id));
        }
        let schema = self.factory.schema();
        if !schema.contains(tag) {
            self.mismatch.on_unknown_widget(tag)?;
            self.skipped.insert(id);
            return Ok(());
        }
        let node = PendingNode::new(tag, schema.children_tags(tag));
        self.pending.insert(id, node);
        Ok(())
    }

    fn property(&mut self, change: PropertyChange) -> Result<()> {
        let PropertyChange { id, tag, value } = change;
        if id.is_root() {
            return Err(BridgeError::UnexpectedRootChange);
        }
        match self.target(id)? {
            Target::Live(key) => self.apply_property(key, tag, &value),
            Target::Pending => {
                let Some(node) = self.pending.get_mut(&id) else {
                    return Ok(());
                };
                if !self.factory.schema().has_property(node.tag, tag) {
                    self.mismatch.on_unknown_property(node.tag, tag)?;
                    return Ok(());
                }
                node.record(RecordedChange::Property(tag, value));
                Ok(())
            }
            Target::Skipped => Ok(()),
        }
    }

    fn modifier(&mut self, change: ModifierChange) -> Result<()> {
        let ModifierChange { id, elements } = change;
        if id.is_root() {
            return Err(BridgeError::UnexpectedRootChange);
        }
        match self.target(id)? {
            Target::Live(key) => {
                let modifier = self.build_modifier(&elements)?;
                self.set_modifier(key, modifier, true);
                Ok(())
            }
            Target::Pending => {
                let modifier = self.build_modifier(&elements)?;
                if let Some(node) = self.pending.get_mut(&id) {
                    node.record(RecordedChange::Modifier(modifier));
                }
                Ok(())
            }
            Target::Skipped => Ok(()),
        }
    }

    fn children(&mut self, change: ChildrenChange) -> Result<()> {
        match change {
            ChildrenChange::Add {
                id,
                tag,
                child_id,
                index,
            } => self.add(id, tag, child_id, index),
            ChildrenChange::Move {
                id,
                tag,
                from_index,
                to_index,
                count,
            } => self.move_children(id, tag, from_index, to_index, count),
            ChildrenChange::Remove {
                id,
                tag,
                index,
                count,
            } => self.remove(id, tag, index, count),
        }
    }

    fn add(&mut self, id: Id, tag: ChildrenTag, child_id: Id, index: usize) -> Result<()> {
        if self.skipped.contains(&child_id) {
            return Ok(());
        }
        if self.contains(child_id) {
            return Err(BridgeError::ChildAlreadyAttached(child_id));
        }
        match self.pending.get(&child_id) {
            None => return Err(BridgeError::UnknownNode(child_id)),
            Some(child) if child.parent.is_some() => {
                return Err(BridgeError::ChildAlreadyAttached(child_id));
            }
            Some(_) => {}
        }

        match self.target(id)? {
            Target::Skipped => {
                self.discard_pending(child_id, true);
                Ok(())
            }
            Target::Pending => {
                if self.pending_ancestors(id).any(|ancestor| ancestor == child_id) {
                    return Err(BridgeError::Cycle {
                        parent: id,
                        child: child_id,
                    });
                }
                if !self.pending_slot_known(id, tag)? {
                    self.discard_pending(child_id, true);
                    return Ok(());
                }
                if let Some(parent) = self.pending.get_mut(&id) {
                    parent
                        .add(tag, index, child_id)
                        .map_err(|source| BridgeError::Children { id, source })?;
                }
                if let Some(child) = self.pending.get_mut(&child_id) {
                    child.parent = Some(id);
                }
                Ok(())
            }
            Target::Live(key) => {
                let Some(len) = self.live_slot_len(key, tag)? else {
                    self.discard_pending(child_id, true);
                    return Ok(());
                };
                validate_insert(len, index).map_err(|source| BridgeError::Children { id, source })?;
                let child = self.materialize(child_id)?;
                self.arena.insert_child(key, tag, index, child)
            }
        }
    }

    fn move_children(
        &mut self,
        id: Id,
        tag: ChildrenTag,
        from: usize,
        to: usize,
        count: usize,
    ) -> Result<()> {
        match self.target(id)? {
            Target::Skipped => Ok(()),
            Target::Pending => {
                if !self.pending_slot_known(id, tag)? {
                    return Ok(());
                }
                if let Some(parent) = self.pending.get_mut(&id) {
                    parent
                        .move_range(tag, from, to, count)
                        .map_err(|source| BridgeError::Children { id, source })?;
                }
                Ok(())
            }
            Target::Live(key) => {
                if self.live_slot_len(key, tag)?.is_none() {
                    return Ok(());
                }
                self.arena.move_children(key, tag, from, to, count)
            }
        }
    }

    fn remove(&mut self, id: Id, tag: ChildrenTag, index: usize, count: usize) -> Result<()> {
        match self.target(id)? {
            Target::Skipped => Ok(()),
            Target::Pending => {
                if !self.pending_slot_known(id, tag)? {
                    return Ok(());
                }
                let removed = match self.pending.get_mut(&id) {
                    Some(parent) => parent
                        .remove(tag, index, count)
                        .map_err(|source| BridgeError::Children { id, source })?,
                    None => Vec::new(),
                };
                for child in removed {
                    self.discard_pending(child, false);
                }
                Ok(())
            }
            Target::Live(key) => {
                if self.live_slot_len(key, tag)?.is_none() {
                    return Ok(());
                }
                let removed = self.arena.remove_children(key, tag, index, count)?;
                for child in removed {
                    self.retire(child);
                }
                Ok(())
            }
        }
    }

    /// Length of a live slot, or `None` once an unknown slot has been reported.
    fn live_slot_len(&mut self, key: NodeKey, tag: ChildrenTag) -> Result<Option<usize>> {
        let Some(node) = self.arena.get_mut(key) else {
            return Ok(None);
        };
        let (id, widget_tag) = (node.id(), node.widget_tag());
        match node.slot_parts(tag) {
            Some((slot, Some(_))) => Ok(Some(slot.len())),
            Some((_, None)) => Err(BridgeError::MissingContainer { id, tag }),
            None if id.is_root() => Err(BridgeError::UnexpectedRootChildren(tag)),
            None => {
                self.mismatch.on_unknown_children(widget_tag, tag)?;
                Ok(None)
            }
        }
    }

    fn pending_slot_known(&self, id: Id, tag: ChildrenTag) -> Result<bool> {
        let Some(node) = self.pending.get(&id) else {
            return Ok(false);
        };
        if self.factory.schema().has_children(node.tag, tag) {
            return Ok(true);
        }
        self.mismatch.on_unknown_children(node.tag, tag)?;
        Ok(false)
    }

    fn pending_ancestors(&self, id: Id) -> impl Iterator<Item = Id> + '_ {
        std::iter::successors(Some(id), |id| self.pending.get(id)?.parent)
    }

    /// Forget a pending subtree. With `silently`, later changes addressed to its
    /// ids are ignored instead of failing.
    fn discard_pending(&mut self, id: Id, silently: bool) {
        let Some(node) = self.pending.remove(&id) else {
            return;
        };
        if silently {
            self.skipped.insert(id);
        }
        for child in node.child_ids() {
            self.discard_pending(child, silently);
        }
    }

    /// Build the native subtree for a pending node, preferring pooled widgets.
    fn materialize(&mut self, id: Id) -> Result<NodeKey> {
        if let Some(pool) = self.pool.as_mut() {
            let reused = pool.take(
                &mut self.arena,
                self.factory.schema(),
                &self.pending,
                id,
            )?;
            if let Some(key) = reused {
                tracing::debug!("reusing pooled subtree for widget ID {}", id);
                if let Err(err) = self.rebind(id, key) {
                    self.abandon(key);
                    return Err(err);
                }
                return Ok(key);
            }
        }

        let pending = self.pending.remove(&id).ok_or(BridgeError::UnknownNode(id))?;
        let widget = self
            .factory
            .create_widget(pending.tag)
            .ok_or(BridgeError::MissingWidget {
                id,
                tag: pending.tag,
            })?;
        let node = WidgetNode::new(
            id,
            pending.tag,
            widget,
            pending.slots.iter().map(|slot| slot.tag),
        );
        let key = self.arena.insert(node);
        if let Err(err) = self.populate(id, key, pending) {
            self.abandon(key);
            return Err(err);
        }
        Ok(key)
    }

    /// Replay a fresh node's changes, register it, then build its children.
    fn populate(&mut self, id: Id, key: NodeKey, pending: PendingNode) -> Result<()> {
        self.replay(key, pending.changes)?;
        self.nodes.insert(id, key);

        for slot in pending.slots {
            for (index, child) in slot.children.into_iter().enumerate() {
                let child = self.materialize(child)?;
                self.arena.insert_child(key, slot.tag, index, child)?;
            }
        }
        Ok(())
    }

    /// Throw away a subtree that failed to attach. None of it reached the live tree.
    fn abandon(&mut self, key: NodeKey) {
        for node in self.arena.subtree(key) {
            if let Some(id) = self.arena.widget(node).map(WidgetNode::id) {
                if self.nodes.get(&id) == Some(&node) {
                    self.nodes.remove(&id);
                }
            }
        }
        self.arena.detach_subtree(key);
    }

    fn drop_unattached(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        tracing::warn!(
            "dropping {} created nodes never attached to the tree",
            self.pending.len()
        );
        self.pending.clear();
    }

    /// Bind a claimed pooled subtree to the ids of a shape-equal pending subtree.
    fn rebind(&mut self, id: Id, key: NodeKey) -> Result<()> {
        let pending = self.pending.remove(&id).ok_or(BridgeError::UnknownNode(id))?;
        if let Some(node) = self.arena.widget_mut(key) {
            node.id.set(id);
            node.shape_hash = 0;
        }
        self.replay(key, pending.changes)?;
        self.nodes.insert(id, key);

        for slot in pending.slots {
            let keys = self
                .arena
                .widget(key)
                .and_then(|node| node.slot(slot.tag))
                .map(<[NodeKey]>::to_vec)
                .unwrap_or_default();
            for (child, child_key) in slot.children.into_iter().zip(keys) {
                self.rebind(child, child_key)?;
            }
        }
        Ok(())
    }

    fn replay(&mut self, key: NodeKey, changes: Vec<RecordedChange>) -> Result<()> {
        for change in changes {
            match change {
                RecordedChange::Property(tag, value) => self.apply_property(key, tag, &value)?,
                RecordedChange::Modifier(modifier) => self.set_modifier(key, modifier, false),
            }
        }
        Ok(())
    }

    /// A node left the live tree: unregister its ids, then pool or detach it.
    fn retire(&mut self, key: NodeKey) {
        for node in self.arena.subtree(key) {
            if let Some(node) = self.arena.widget(node) {
                self.nodes.remove(&node.id());
            }
        }
        let Some(pool) = self.pool.as_mut() else {
            self.arena.detach_subtree(key);
            return;
        };
        for key in pool.add(&mut self.arena, self.factory.schema(), key) {
            self.arena.detach_subtree(key);
        }
    }

    fn apply_property(&mut self, key: NodeKey, tag: PropertyTag, value: &Value) -> Result<()> {
        let Some(node) = self.arena.widget_mut(key) else {
            return Ok(());
        };
        if !self.factory.schema().has_property(node.tag, tag) {
            self.mismatch.on_unknown_property(node.tag, tag)?;
            return Ok(());
        }
        let events = EventEmitter::new(node.id.clone(), self.sink.clone());
        match node.widget.apply(tag, value, &events) {
            Ok(()) => Ok(()),
            Err(PropertyError::Unknown(tag)) => {
                self.mismatch.on_unknown_property(node.tag, tag)?;
                Ok(())
            }
            Err(source) => Err(BridgeError::Property {
                id: node.id(),
                source,
            }),
        }
    }

    fn build_modifier(&self, elements: &[ModifierElement]) -> Result<Modifier> {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
            match self.factory.create_modifier(element) {
                Ok(value) => values.push(value),
                Err(ModifierError::Unknown(tag)) => self.mismatch.on_unknown_modifier(tag)?,
                Err(ModifierError::InvalidValue { tag, source }) => {
                    return Err(BridgeError::Modifier { tag, source });
                }
            }
        }
        Ok(Modifier::new(values))
    }

    /// With `notify`, the parent container is told so it can lay out that child again.
    fn set_modifier(&mut self, key: NodeKey, modifier: Modifier, notify: bool) {
        let Some(node) = self.arena.widget_mut(key) else {
            return;
        };
        node.widget.set_modifier(modifier);
        let Some((parent, tag)) = node.parent.filter(|_| notify) else {
            return;
        };
        let (index, value) = (node.index, node.widget.value());
        if let Some((_, Some(container))) = self
            .arena
            .get_mut(parent)
            .and_then(|parent| parent.slot_parts(tag))
        {
            container.on_modifier_updated(index, &value);
        }
    }
}

impl<W> ChangesSink for Bridge<W> {
    type Error = BridgeError;

    fn send_changes(&mut self, changes: Vec<Change>) -> Result<()> {
        self.apply(changes)
    }
}

impl<W> Drop for Bridge<W> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Assembles a [`Bridge`] around a host container and a platform factory.
pub struct BridgeBuilder<W> {
    container: Box<dyn WidgetChildren<W>>,
    factory: Box<dyn ProtocolFactory<W>>,
    config: BridgeConfig,
    sink: Option<Rc<dyn UiEventSink>>,
    mismatch: Option<Box<dyn MismatchHandler>>,
}

impl<W> BridgeBuilder<W> {
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn event_sink(mut self, sink: impl UiEventSink + 'static) -> Self {
        self.sink = Some(Rc::new(sink));
        self
    }

    /// Overrides the handler implied by [`BridgeConfig::mismatch`].
    pub fn mismatch_handler(mut self, handler: impl MismatchHandler + 'static) -> Self {
        self.mismatch = Some(Box::new(handler));
        self
    }

    pub fn build(self) -> Bridge<W> {
        let sink: Rc<dyn UiEventSink> = match self.sink {
            Some(sink) => sink,
            None => Rc::new(|event: UiEvent| {
                tracing::warn!("no event sink configured, dropping {:?}", event)
            }),
        };
        let mismatch = self
            .mismatch
            .unwrap_or_else(|| self.config.mismatch.handler());
        let pool = self
            .config
            .reuse
            .then(|| ReusePool::new(self.config.reuse_pool_capacity));
        Bridge {
            arena: NodeArena::new(RootNode {
                container: self.container,
                children: Vec::new(),
            }),
            nodes: HashMap::new(),
            pending: HashMap::new(),
            skipped: HashSet::new(),
            pool,
            factory: self.factory,
            mismatch,
            sink,
            closed: false,
        }
    }
}
