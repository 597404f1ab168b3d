use thiserror::Error;
use trellis_protocol::{ChildrenTag, Id, MismatchError, ModifierTag, WidgetTag};
use trellis_widget::{ChildrenError, PropertyError};

/// Everything that can abort a change batch.
///
/// Apart from [`BridgeError::Mismatch`], which is only raised when the active
/// mismatch policy refuses to continue, these are protocol violations by the
/// producer or bugs in the platform factory.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Insert attempted to replace existing widget with ID {0}")]
    DuplicateId(Id),

    #[error("Unknown widget ID {0}")]
    UnknownNode(Id),

    #[error("Widget ID {0} is already attached to a parent")]
    ChildAlreadyAttached(Id),

    #[error("Adding widget ID {child} under widget ID {parent} would create a cycle")]
    Cycle { parent: Id, child: Id },

    #[error("Root node does not accept property or modifier changes")]
    UnexpectedRootChange,

    #[error("Root node only exposes children tag 1, got {0}")]
    UnexpectedRootChildren(ChildrenTag),

    #[error("Invalid children change on widget ID {id}: {source}")]
    Children {
        id: Id,
        #[source]
        source: ChildrenError,
    },

    #[error("Invalid property for widget ID {id}: {source}")]
    Property {
        id: Id,
        #[source]
        source: PropertyError,
    },

    #[error("Invalid value for modifier tag {tag}: {source}")]
    Modifier {
        tag: ModifierTag,
        #[source]
        source: serde_json::Error,
    },

    #[error("Factory has no widget for schema tag {tag} (widget ID {id})")]
    MissingWidget { id: Id, tag: WidgetTag },

    #[error("Widget ID {id} has no native container for children tag {tag}")]
    MissingContainer { id: Id, tag: ChildrenTag },

    #[error(transparent)]
    Mismatch(#[from] MismatchError),

    #[error("Bridge is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
