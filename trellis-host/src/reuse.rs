//! Structural matching of removed subtrees against freshly created ones.
//!
//! A shape is the widget tag plus, per children slot, the ordered shapes of the
//! children. Properties and modifiers never take part. The hash is only a bucket
//! filter; [`shapes_equal`] decides.

use crate::error::Result;
use crate::factory::SchemaTable;
use crate::node::{NodeArena, NodeKey, NodeState, WidgetNode};
use crate::pending::PendingNode;
use std::collections::{HashMap, VecDeque};
use trellis_protocol::{ChildrenTag, Id, WidgetTag};

struct ShapeHasher(u64);

impl ShapeHasher {
    fn new(tag: WidgetTag) -> Self {
        Self(tag.value() as i64 as u64)
    }

    fn slot(&mut self, tag: ChildrenTag) {
        self.0 = self
            .0
            .wrapping_mul(37)
            .wrapping_add(tag.value() as i64 as u64);
    }

    fn child(&mut self, hash: u64) {
        self.0 = self.0.wrapping_mul(41).wrapping_add(hash);
    }
}

fn fold_node<W>(
    node: &WidgetNode<W>,
    schema: &SchemaTable,
    mut child_hash: impl FnMut(NodeKey) -> u64,
) -> u64 {
    if !schema.is_eligible_for_reuse(node.tag) {
        return 0;
    }
    let mut hasher = ShapeHasher::new(node.tag);
    for &tag in schema.children_tags(node.tag) {
        hasher.slot(tag);
        for &child in node.slot(tag).unwrap_or(&[]) {
            hasher.child(child_hash(child));
        }
    }
    hasher.0
}

/// Shape hash of a materialized node, or 0 if it is not eligible for reuse.
pub(crate) fn node_shape_hash<W>(arena: &NodeArena<W>, schema: &SchemaTable, key: NodeKey) -> u64 {
    match arena.widget(key) {
        Some(node) => fold_node(node, schema, |child| node_shape_hash(arena, schema, child)),
        None => 0,
    }
}

/// Shape hash of a pending node. Identical to [`node_shape_hash`] for the same
/// shape, and 0 for unknown tags, ineligible widgets and out-of-order children.
pub(crate) fn pending_shape_hash(
    pending: &HashMap<Id, PendingNode>,
    schema: &SchemaTable,
    id: Id,
) -> u64 {
    let Some(node) = pending.get(&id) else {
        return 0;
    };
    if !node.ordered || !schema.is_eligible_for_reuse(node.tag) {
        return 0;
    }
    let mut hasher = ShapeHasher::new(node.tag);
    for &tag in schema.children_tags(node.tag) {
        hasher.slot(tag);
        for &child in node.slot(tag) {
            hasher.child(pending_shape_hash(pending, schema, child));
        }
    }
    hasher.0
}

/// True if the pending subtree at `id` can take over the subtree at `key`.
pub(crate) fn shapes_equal<W>(
    pending: &HashMap<Id, PendingNode>,
    schema: &SchemaTable,
    id: Id,
    arena: &NodeArena<W>,
    key: NodeKey,
) -> bool {
    let (Some(a), Some(b)) = (pending.get(&id), arena.widget(key)) else {
        return false;
    };
    if !a.ordered
        || !schema.is_eligible_for_reuse(a.tag)
        || a.tag != b.tag
        || b.state != NodeState::Pooled
    {
        return false;
    }
    schema.children_tags(a.tag).iter().all(|&tag| {
        let a_children = a.slot(tag);
        let b_children = b.slot(tag).unwrap_or(&[]);
        a_children.len() == b_children.len()
            && a_children
                .iter()
                .zip(b_children)
                .all(|(&a, &b)| shapes_equal(pending, schema, a, arena, b))
    })
}

/// Removed subtrees waiting to be taken over by a rebuilt tree.
///
/// Every eligible node of a pooled subtree is a candidate, not just its root.
pub(crate) struct ReusePool {
    /// Pooled subtree roots, oldest first.
    roots: VecDeque<NodeKey>,
    buckets: HashMap<u64, Vec<NodeKey>>,
    capacity: usize,
}

impl ReusePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            roots: VecDeque::new(),
            buckets: HashMap::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Pool a subtree which was just removed from the live tree. Returns the roots
    /// the caller must detach: evicted ones, or `root` itself when nothing in it
    /// can ever be reused.
    pub fn add<W>(
        &mut self,
        arena: &mut NodeArena<W>,
        schema: &SchemaTable,
        root: NodeKey,
    ) -> Vec<NodeKey> {
        let mut bucketed = 0;
        // Children come after their parents, so walking backwards hashes them first.
        for &key in arena.subtree(root).iter().rev() {
            let Some(node) = arena.widget(key) else {
                continue;
            };
            let hash = fold_node(node, schema, |child| {
                arena.widget(child).map_or(0, |child| child.shape_hash)
            });
            if let Some(node) = arena.widget_mut(key) {
                node.shape_hash = hash;
                node.state = NodeState::Pooled;
            }
            if hash != 0 {
                self.buckets.entry(hash).or_default().push(key);
                bucketed += 1;
            }
        }
        if bucketed == 0 {
            return vec![root];
        }
        self.roots.push_back(root);

        let mut evicted = Vec::new();
        while self.roots.len() > self.capacity {
            let Some(oldest) = self.roots.pop_front() else {
                break;
            };
            for key in arena.subtree(oldest) {
                self.unbucket(arena, key);
            }
            tracing::warn!("reuse pool is full, evicting its oldest subtree");
            evicted.push(oldest);
        }
        evicted
    }

    /// Find and claim a pooled node with the same shape as the pending node `id`.
    ///
    /// The claimed node is taken out of its pooled parent; its own subtree keeps
    /// its native children.
    pub fn take<W>(
        &mut self,
        arena: &mut NodeArena<W>,
        schema: &SchemaTable,
        pending: &HashMap<Id, PendingNode>,
        id: Id,
    ) -> Result<Option<NodeKey>> {
        if self.buckets.is_empty() {
            return Ok(None);
        }
        let hash = pending_shape_hash(pending, schema, id);
        if hash == 0 {
            return Ok(None);
        }
        let Some(key) = self.buckets.get(&hash).and_then(|candidates| {
            candidates
                .iter()
                .copied()
                .find(|&key| shapes_equal(pending, schema, id, arena, key))
        }) else {
            return Ok(None);
        };
        self.consume(arena, key)?;
        Ok(Some(key))
    }

    fn consume<W>(&mut self, arena: &mut NodeArena<W>, key: NodeKey) -> Result<()> {
        for node in arena.subtree(key) {
            self.unbucket(arena, node);
            if let Some(node) = arena.widget_mut(node) {
                node.state = NodeState::Live;
            }
        }

        // Every pooled ancestor just lost a descendant, so its shape is stale.
        let parent = arena.widget(key).and_then(|node| node.parent);
        let mut cursor = parent.map(|(parent, _)| parent);
        while let Some(ancestor) = cursor {
            self.unbucket(arena, ancestor);
            let Some(node) = arena.widget_mut(ancestor) else {
                break;
            };
            node.shape_hash = 0;
            cursor = node.parent.map(|(parent, _)| parent);
        }

        match parent {
            Some((parent, tag)) => {
                let index = arena.widget(key).map_or(0, |node| node.index);
                arena.remove_children(parent, tag, index, 1)?;
            }
            None => self.roots.retain(|root| *root != key),
        }
        Ok(())
    }

    fn unbucket<W>(&mut self, arena: &NodeArena<W>, key: NodeKey) {
        let Some(hash) = arena.widget(key).map(|node| node.shape_hash) else {
            return;
        };
        if let Some(candidates) = self.buckets.get_mut(&hash) {
            candidates.retain(|candidate| *candidate != key);
            if candidates.is_empty() {
                self.buckets.remove(&hash);
            }
        }
    }

    /// Empty the pool, handing back every pooled root for detaching.
    pub fn drain(&mut self) -> Vec<NodeKey> {
        self.buckets.clear();
        self.roots.drain(..).collect()
    }
}
