use serde_json::Value;
use smallvec::SmallVec;
use trellis_protocol::{ChildrenTag, Id, PropertyTag, WidgetTag};
use trellis_widget::{
    ChildrenError, Modifier, move_items, validate_insert, validate_move, validate_remove,
};

/// A change already checked against the schema, waiting for a widget.
#[derive(Debug)]
pub(crate) enum RecordedChange {
    Property(PropertyTag, Value),
    Modifier(Modifier),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingSlot {
    pub tag: ChildrenTag,
    pub children: Vec<Id>,
}

/// A node which has been created but is not yet attached to the live tree.
///
/// Nothing native exists for it yet. Its changes are recorded and replayed onto
/// either a fresh widget or a pooled one once an `Add` connects it to a live
/// parent.
#[derive(Debug)]
pub(crate) struct PendingNode {
    pub tag: WidgetTag,
    pub changes: Vec<RecordedChange>,
    pub slots: SmallVec<[PendingSlot; 2]>,
    /// Pending parent, once added to one.
    pub parent: Option<Id>,
    /// False once any child was placed other than by appending.
    pub ordered: bool,
}

impl PendingNode {
    pub fn new(tag: WidgetTag, children_tags: &[ChildrenTag]) -> Self {
        Self {
            tag,
            changes: Vec::new(),
            slots: children_tags
                .iter()
                .map(|tag| PendingSlot {
                    tag: *tag,
                    children: Vec::new(),
                })
                .collect(),
            parent: None,
            ordered: true,
        }
    }

    pub fn record(&mut self, change: RecordedChange) {
        self.changes.push(change);
    }

    pub fn slot(&self, tag: ChildrenTag) -> &[Id] {
        self.slots
            .iter()
            .find(|slot| slot.tag == tag)
            .map(|slot| slot.children.as_slice())
            .unwrap_or(&[])
    }

    fn slot_mut(&mut self, tag: ChildrenTag) -> &mut Vec<Id> {
        let position = match self.slots.iter().position(|slot| slot.tag == tag) {
            Some(position) => position,
            None => {
                self.slots.push(PendingSlot {
                    tag,
                    children: Vec::new(),
                });
                self.slots.len() - 1
            }
        };
        &mut self.slots[position].children
    }

    pub fn add(&mut self, tag: ChildrenTag, index: usize, child: Id) -> Result<(), ChildrenError> {
        let children = self.slot_mut(tag);
        validate_insert(children.len(), index)?;
        let appended = index == children.len();
        children.insert(index, child);
        self.ordered &= appended;
        Ok(())
    }

    pub fn move_range(
        &mut self,
        tag: ChildrenTag,
        from: usize,
        to: usize,
        count: usize,
    ) -> Result<(), ChildrenError> {
        let children = self.slot_mut(tag);
        validate_move(children.len(), from, to, count)?;
        move_items(children, from, to, count);
        self.ordered = false;
        Ok(())
    }

    pub fn remove(
        &mut self,
        tag: ChildrenTag,
        index: usize,
        count: usize,
    ) -> Result<Vec<Id>, ChildrenError> {
        let children = self.slot_mut(tag);
        validate_remove(children.len(), index, count)?;
        let removed = children.drain(index..index + count).collect();
        self.ordered = false;
        Ok(removed)
    }

    /// Every child id, across all slots.
    pub fn child_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.slots.iter().flat_map(|slot| slot.children.iter().copied())
    }
}
