use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! schema_tag {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i32);

        impl $name {
            pub fn value(self) -> i32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Identifies one live node inside one bridge. Assigned by the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id(pub u64);

impl Id {
    /// The implicit root container. Never created, never destroyed.
    pub const ROOT: Id = Id(0);

    pub fn value(self) -> u64 {
        self.0
    }

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

schema_tag!(
    /// Widget type from the schema.
    WidgetTag
);
schema_tag!(
    /// One named children slot of a widget.
    ChildrenTag
);
schema_tag!(PropertyTag);
schema_tag!(ModifierTag);
schema_tag!(EventTag);

impl WidgetTag {
    /// Sentinel for a node whose `Create` could not be resolved.
    pub const UNKNOWN: WidgetTag = WidgetTag(-1);
}

impl ChildrenTag {
    /// The only slot exposed by the root container.
    pub const ROOT: ChildrenTag = ChildrenTag(1);
}
