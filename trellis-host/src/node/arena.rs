use super::{ProtocolNode, RootNode, WidgetNode};

/// Slot in the [`NodeArena`]. Not stable across disposal: a freed slot is handed
/// out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeKey(u32);

impl NodeKey {
    pub const ROOT: NodeKey = NodeKey(0);
}

pub(crate) struct NodeArena<W> {
    nodes: Vec<Option<ProtocolNode<W>>>,
    free_list: Vec<u32>,
}

impl<W> NodeArena<W> {
    pub fn new(root: RootNode<W>) -> Self {
        Self {
            nodes: vec![Some(ProtocolNode::Root(root))],
            free_list: Vec::new(),
        }
    }

    pub fn insert(&mut self, node: WidgetNode<W>) -> NodeKey {
        let node = Some(ProtocolNode::Widget(node));
        if let Some(index) = self.free_list.pop() {
            self.nodes[index as usize] = node;
            NodeKey(index)
        } else {
            self.nodes.push(node);
            NodeKey((self.nodes.len() - 1) as u32)
        }
    }

    pub fn get(&self, key: NodeKey) -> Option<&ProtocolNode<W>> {
        self.nodes.get(key.0 as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut ProtocolNode<W>> {
        self.nodes.get_mut(key.0 as usize)?.as_mut()
    }

    pub fn widget(&self, key: NodeKey) -> Option<&WidgetNode<W>> {
        self.get(key)?.as_widget()
    }

    pub fn widget_mut(&mut self, key: NodeKey) -> Option<&mut WidgetNode<W>> {
        self.get_mut(key)?.as_widget_mut()
    }

    pub fn root_mut(&mut self) -> Option<&mut RootNode<W>> {
        match self.get_mut(NodeKey::ROOT)? {
            ProtocolNode::Root(root) => Some(root),
            ProtocolNode::Widget(_) => None,
        }
    }

    /// Free a widget slot and hand back its node. The root is never disposed.
    pub fn dispose(&mut self, key: NodeKey) -> Option<WidgetNode<W>> {
        if key == NodeKey::ROOT {
            return None;
        }
        match self.nodes.get_mut(key.0 as usize)?.take()? {
            ProtocolNode::Widget(node) => {
                self.free_list.push(key.0);
                Some(node)
            }
            root @ ProtocolNode::Root(_) => {
                self.nodes[key.0 as usize] = Some(root);
                None
            }
        }
    }

    /// Number of occupied slots, root included.
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }
}
