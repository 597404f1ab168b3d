use crate::ids::{ChildrenTag, Id, ModifierTag, PropertyTag, WidgetTag};
use serde::de::Error as _;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// One entry of an ordered edit script.
///
/// A batch is applied strictly in order. For every node the producer emits its
/// `Create`, property and modifier changes, then everything needed to populate its
/// children, and only then the `Add` which attaches it to its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    Create(Create),
    Property(PropertyChange),
    Modifier(ModifierChange),
    Children(ChildrenChange),
}

impl Change {
    pub fn create(id: Id, tag: WidgetTag) -> Self {
        Change::Create(Create { id, tag })
    }

    pub fn property(id: Id, tag: PropertyTag, value: impl Into<Value>) -> Self {
        Change::Property(PropertyChange {
            id,
            tag,
            value: value.into(),
        })
    }

    pub fn modifier(id: Id, elements: Vec<ModifierElement>) -> Self {
        Change::Modifier(ModifierChange { id, elements })
    }

    pub fn add(id: Id, tag: ChildrenTag, child_id: Id, index: usize) -> Self {
        Change::Children(ChildrenChange::Add {
            id,
            tag,
            child_id,
            index,
        })
    }

    pub fn move_children(
        id: Id,
        tag: ChildrenTag,
        from_index: usize,
        to_index: usize,
        count: usize,
    ) -> Self {
        Change::Children(ChildrenChange::Move {
            id,
            tag,
            from_index,
            to_index,
            count,
        })
    }

    pub fn remove(id: Id, tag: ChildrenTag, index: usize, count: usize) -> Self {
        Change::Children(ChildrenChange::Remove {
            id,
            tag,
            index,
            count,
        })
    }

    /// The node which is the subject of this change. For children changes this is
    /// the parent.
    pub fn id(&self) -> Id {
        match self {
            Change::Create(c) => c.id,
            Change::Property(c) => c.id,
            Change::Modifier(c) => c.id,
            Change::Children(c) => c.id(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Create {
    pub id: Id,
    pub tag: WidgetTag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub id: Id,
    pub tag: PropertyTag,
    #[serde(default)]
    pub value: Value,
}

/// Replaces the whole modifier list of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierChange {
    pub id: Id,
    #[serde(default)]
    pub elements: Vec<ModifierElement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildrenChange {
    Add {
        id: Id,
        tag: ChildrenTag,
        child_id: Id,
        index: usize,
    },
    Move {
        id: Id,
        tag: ChildrenTag,
        from_index: usize,
        to_index: usize,
        count: usize,
    },
    Remove {
        id: Id,
        tag: ChildrenTag,
        index: usize,
        count: usize,
    },
}

impl ChildrenChange {
    pub fn id(&self) -> Id {
        match *self {
            ChildrenChange::Add { id, .. }
            | ChildrenChange::Move { id, .. }
            | ChildrenChange::Remove { id, .. } => id,
        }
    }

    pub fn tag(&self) -> ChildrenTag {
        match *self {
            ChildrenChange::Add { tag, .. }
            | ChildrenChange::Move { tag, .. }
            | ChildrenChange::Remove { tag, .. } => tag,
        }
    }
}

/// One decorator of a node, still in wire form.
///
/// Encoded as `[tag]` or `[tag, value]`; a `null` value is omitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierElement {
    pub tag: ModifierTag,
    pub value: Value,
}

impl ModifierElement {
    pub fn new(tag: ModifierTag, value: impl Into<Value>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    pub fn bare(tag: ModifierTag) -> Self {
        Self {
            tag,
            value: Value::Null,
        }
    }
}

impl Serialize for ModifierElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.value.is_null() { 1 } else { 2 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.tag)?;
        if !self.value.is_null() {
            seq.serialize_element(&self.value)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for ModifierElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut parts = Vec::<Value>::deserialize(deserializer)?;
        if !(1..=2).contains(&parts.len()) {
            return Err(D::Error::custom(format!(
                "ModifierElement array may only have 1 or 2 values. Found: {}",
                parts.len()
            )));
        }
        let value = if parts.len() == 2 {
            parts.pop().unwrap_or(Value::Null)
        } else {
            Value::Null
        };
        let tag = ModifierTag::deserialize(parts.swap_remove(0)).map_err(D::Error::custom)?;
        Ok(Self { tag, value })
    }
}

/// Producer-facing intake of change batches.
pub trait ChangesSink {
    type Error;

    fn send_changes(&mut self, changes: Vec<Change>) -> Result<(), Self::Error>;
}
