use crate::schema::tags;
use crate::view::ViewTree;
use serde_json::Value;
use trellis_protocol::{Change, ChildrenTag, Id, ModifierElement, PropertyTag, WidgetTag};

/// A node as the producer sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalNode {
    pub tag: WidgetTag,
    pub properties: Vec<(PropertyTag, Value)>,
    pub modifiers: Vec<ModifierElement>,
    pub slots: Vec<(ChildrenTag, Vec<LogicalNode>)>,
}

impl LogicalNode {
    pub fn new(tag: WidgetTag) -> Self {
        Self {
            tag,
            properties: Vec::new(),
            modifiers: Vec::new(),
            slots: Vec::new(),
        }
    }

    pub fn property(mut self, tag: PropertyTag, value: impl Into<Value>) -> Self {
        self.properties.push((tag, value.into()));
        self
    }

    pub fn modifier(mut self, element: ModifierElement) -> Self {
        self.modifiers.push(element);
        self
    }

    pub fn child(mut self, tag: ChildrenTag, node: LogicalNode) -> Self {
        match self.slots.iter_mut().find(|(slot, _)| *slot == tag) {
            Some((_, children)) => children.push(node),
            None => self.slots.push((tag, vec![node])),
        }
        self
    }

    pub fn children(self, tag: ChildrenTag, nodes: impl IntoIterator<Item = LogicalNode>) -> Self {
        nodes
            .into_iter()
            .fold(self, |parent, node| parent.child(tag, node))
    }

    /// The native tree this node should produce.
    pub fn expected(&self) -> ViewTree {
        let text = self
            .properties
            .iter()
            .rev()
            .find(|(tag, _)| *tag == tags::TEXT_PROPERTY)
            .and_then(|(_, value)| value.as_str())
            .map(str::to_string);
        ViewTree {
            tag: self.tag,
            text,
            slots: self
                .slots
                .iter()
                .filter(|(_, children)| !children.is_empty())
                .map(|(tag, children)| (*tag, children.iter().map(LogicalNode::expected).collect()))
                .collect(),
        }
    }
}

pub fn row(children: impl IntoIterator<Item = LogicalNode>) -> LogicalNode {
    LogicalNode::new(tags::ROW).children(tags::CHILDREN, children)
}

pub fn column(children: impl IntoIterator<Item = LogicalNode>) -> LogicalNode {
    LogicalNode::new(tags::COLUMN).children(tags::CHILDREN, children)
}

pub fn scroll_view(children: impl IntoIterator<Item = LogicalNode>) -> LogicalNode {
    LogicalNode::new(tags::SCROLL_VIEW).children(tags::CHILDREN, children)
}

pub fn split(
    left: impl IntoIterator<Item = LogicalNode>,
    right: impl IntoIterator<Item = LogicalNode>,
) -> LogicalNode {
    LogicalNode::new(tags::SPLIT)
        .children(tags::LEFT, left)
        .children(tags::RIGHT, right)
}

pub fn text(text: &str) -> LogicalNode {
    LogicalNode::new(tags::TEXT).property(tags::TEXT_PROPERTY, text)
}

pub fn button(text: &str) -> LogicalNode {
    LogicalNode::new(tags::BUTTON)
        .property(tags::TEXT_PROPERTY, text)
        .property(tags::ON_CLICK, true)
}

pub fn video(source: &str) -> LogicalNode {
    LogicalNode::new(tags::VIDEO).property(tags::TEXT_PROPERTY, source)
}

/// Turns logical trees into change batches, allocating ids like a producer.
///
/// For every node the batch holds its `Create`, properties and modifier, then each
/// child's full sequence followed by the child's `Add`, and only then, from the
/// caller, the node's own `Add`.
#[derive(Debug)]
pub struct Emitter {
    next_id: u64,
}

impl Emitter {
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Continue numbering after `last`, e.g. to emit a rebuild with fresh ids.
    pub fn starting_after(last: Id) -> Self {
        Self {
            next_id: last.value() + 1,
        }
    }

    /// Emit a subtree without attaching it anywhere. Returns its id.
    pub fn emit_node(&mut self, node: &LogicalNode, changes: &mut Vec<Change>) -> Id {
        let id = Id(self.next_id);
        self.next_id += 1;

        changes.push(Change::create(id, node.tag));
        for (tag, value) in &node.properties {
            changes.push(Change::property(id, *tag, value.clone()));
        }
        changes.push(Change::modifier(id, node.modifiers.clone()));
        for (tag, children) in &node.slots {
            for (index, child) in children.iter().enumerate() {
                let child_id = self.emit_node(child, changes);
                changes.push(Change::add(id, *tag, child_id, index));
            }
        }
        id
    }

    /// Emit `nodes` and attach them to the root starting at `index`.
    pub fn emit_into_root(&mut self, nodes: &[LogicalNode], index: usize) -> (Vec<Change>, Vec<Id>) {
        let mut changes = Vec::new();
        let mut ids = Vec::with_capacity(nodes.len());
        for (offset, node) in nodes.iter().enumerate() {
            let id = self.emit_node(node, &mut changes);
            changes.push(Change::add(Id::ROOT, ChildrenTag::ROOT, id, index + offset));
            ids.push(id);
        }
        (changes, ids)
    }

    /// Emit a whole tree into an empty root.
    pub fn emit_tree(&mut self, nodes: &[LogicalNode]) -> (Vec<Change>, Vec<Id>) {
        self.emit_into_root(nodes, 0)
    }

    pub fn last_id(&self) -> Id {
        Id(self.next_id - 1)
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}
