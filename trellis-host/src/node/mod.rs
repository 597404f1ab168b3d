mod arena;
mod children;

pub(crate) use arena::{NodeArena, NodeKey};

use smallvec::SmallVec;
use std::cell::Cell;
use std::rc::Rc;
use trellis_protocol::{ChildrenTag, Id, WidgetTag};
use trellis_widget::{Widget, WidgetChildren};

/// Shadow of one children slot, in native container order.
pub(crate) struct ChildSlot {
    pub tag: ChildrenTag,
    pub nodes: Vec<NodeKey>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeState {
    Live,
    Pooled,
}

/// The implicit root: owns the host-supplied container and nothing else.
pub(crate) struct RootNode<W> {
    pub container: Box<dyn WidgetChildren<W>>,
    pub children: Vec<NodeKey>,
}

pub(crate) struct WidgetNode<W> {
    /// Rewritten in place when the node is reused under a new id.
    pub id: Rc<Cell<Id>>,
    pub tag: WidgetTag,
    pub widget: Box<dyn Widget<W>>,
    /// Position within the parent's slot.
    pub index: usize,
    pub parent: Option<(NodeKey, ChildrenTag)>,
    pub slots: SmallVec<[ChildSlot; 2]>,
    /// Assigned when the node enters the reuse pool. 0 is never matched.
    pub shape_hash: u64,
    pub state: NodeState,
}

impl<W> WidgetNode<W> {
    pub fn new(
        id: Id,
        tag: WidgetTag,
        widget: Box<dyn Widget<W>>,
        children_tags: impl IntoIterator<Item = ChildrenTag>,
    ) -> Self {
        Self {
            id: Rc::new(Cell::new(id)),
            tag,
            widget,
            index: 0,
            parent: None,
            slots: children_tags
                .into_iter()
                .map(|tag| ChildSlot {
                    tag,
                    nodes: Vec::new(),
                })
                .collect(),
            shape_hash: 0,
            state: NodeState::Live,
        }
    }

    pub fn id(&self) -> Id {
        self.id.get()
    }

    pub fn slot(&self, tag: ChildrenTag) -> Option<&[NodeKey]> {
        self.slots
            .iter()
            .find(|slot| slot.tag == tag)
            .map(|slot| slot.nodes.as_slice())
    }
}

pub(crate) enum ProtocolNode<W> {
    Root(RootNode<W>),
    Widget(WidgetNode<W>),
}

impl<W> ProtocolNode<W> {
    pub fn id(&self) -> Id {
        match self {
            ProtocolNode::Root(_) => Id::ROOT,
            ProtocolNode::Widget(node) => node.id(),
        }
    }

    pub fn widget_tag(&self) -> WidgetTag {
        match self {
            ProtocolNode::Root(_) => WidgetTag::UNKNOWN,
            ProtocolNode::Widget(node) => node.tag,
        }
    }

    pub fn as_widget(&self) -> Option<&WidgetNode<W>> {
        match self {
            ProtocolNode::Widget(node) => Some(node),
            ProtocolNode::Root(_) => None,
        }
    }

    pub fn as_widget_mut(&mut self) -> Option<&mut WidgetNode<W>> {
        match self {
            ProtocolNode::Widget(node) => Some(node),
            ProtocolNode::Root(_) => None,
        }
    }

    pub fn slot(&self, tag: ChildrenTag) -> Option<&[NodeKey]> {
        match self {
            ProtocolNode::Root(root) if tag == ChildrenTag::ROOT => Some(&root.children),
            ProtocolNode::Root(_) => None,
            ProtocolNode::Widget(node) => node.slot(tag),
        }
    }

    /// Shadow list and native container of one slot. `None` if the node has no
    /// such slot; a `None` container means the widget failed to expose one.
    pub fn slot_parts(
        &mut self,
        tag: ChildrenTag,
    ) -> Option<(&mut Vec<NodeKey>, Option<&mut dyn WidgetChildren<W>>)> {
        match self {
            ProtocolNode::Root(root) if tag == ChildrenTag::ROOT => {
                Some((&mut root.children, Some(root.container.as_mut())))
            }
            ProtocolNode::Root(_) => None,
            ProtocolNode::Widget(node) => {
                let slot = node.slots.iter_mut().find(|slot| slot.tag == tag)?;
                Some((&mut slot.nodes, node.widget.children(tag)))
            }
        }
    }
}
