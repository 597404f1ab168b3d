use smallvec::SmallVec;
use std::collections::HashMap;
use trellis_protocol::{ChildrenTag, ModifierElement, PropertyTag, WidgetTag};
use trellis_widget::{ModifierError, ModifierValue, Widget};

/// Static description of one widget type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetProtocol {
    /// Children slots in schema order.
    pub children_tags: SmallVec<[ChildrenTag; 2]>,
    /// Whether a removed instance may be transplanted into a rebuilt tree.
    pub eligible_for_reuse: bool,
    /// Properties the widget type understands. Anything else is schema skew.
    pub property_tags: SmallVec<[PropertyTag; 4]>,
}

impl WidgetProtocol {
    /// A reusable widget type without children or properties.
    pub fn leaf() -> Self {
        Self {
            eligible_for_reuse: true,
            ..Self::default()
        }
    }

    pub fn with_children(mut self, tag: ChildrenTag) -> Self {
        self.children_tags.push(tag);
        self
    }

    pub fn with_property(mut self, tag: PropertyTag) -> Self {
        self.property_tags.push(tag);
        self
    }

    /// Opt out of reuse, e.g. for widgets wrapping unrepeatable native resources.
    pub fn not_reusable(mut self) -> Self {
        self.eligible_for_reuse = false;
        self
    }
}

/// Widget topology of one schema version.
#[derive(Debug, Clone, Default)]
pub struct SchemaTable {
    widgets: HashMap<WidgetTag, WidgetProtocol>,
}

impl SchemaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tag: WidgetTag, protocol: WidgetProtocol) -> Self {
        self.insert(tag, protocol);
        self
    }

    pub fn insert(&mut self, tag: WidgetTag, protocol: WidgetProtocol) {
        self.widgets.insert(tag, protocol);
    }

    pub fn get(&self, tag: WidgetTag) -> Option<&WidgetProtocol> {
        self.widgets.get(&tag)
    }

    pub fn contains(&self, tag: WidgetTag) -> bool {
        self.widgets.contains_key(&tag)
    }

    /// Children slots of `tag`; empty for leaves and unknown tags.
    pub fn children_tags(&self, tag: WidgetTag) -> &[ChildrenTag] {
        self.widgets
            .get(&tag)
            .map(|protocol| protocol.children_tags.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_children(&self, tag: WidgetTag, children: ChildrenTag) -> bool {
        self.children_tags(tag).contains(&children)
    }

    pub fn has_property(&self, tag: WidgetTag, property: PropertyTag) -> bool {
        self.widgets
            .get(&tag)
            .is_some_and(|protocol| protocol.property_tags.contains(&property))
    }

    pub fn is_eligible_for_reuse(&self, tag: WidgetTag) -> bool {
        self.widgets
            .get(&tag)
            .is_some_and(|protocol| protocol.eligible_for_reuse)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

/// The extension point a platform implements: one widget constructor and one
/// modifier decoder per schema, plus the schema's static topology.
pub trait ProtocolFactory<W> {
    fn schema(&self) -> &SchemaTable;

    /// Create a fresh native widget. Only called for tags the schema knows.
    fn create_widget(&self, tag: WidgetTag) -> Option<Box<dyn Widget<W>>>;

    fn create_modifier(
        &self,
        element: &ModifierElement,
    ) -> Result<Box<dyn ModifierValue>, ModifierError>;
}
