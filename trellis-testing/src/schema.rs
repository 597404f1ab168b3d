use trellis_host::{SchemaTable, WidgetProtocol};

pub mod tags {
    use trellis_protocol::{ChildrenTag, EventTag, ModifierTag, PropertyTag, WidgetTag};

    pub const ROW: WidgetTag = WidgetTag(1);
    pub const COLUMN: WidgetTag = WidgetTag(2);
    pub const TEXT: WidgetTag = WidgetTag(3);
    pub const BUTTON: WidgetTag = WidgetTag(4);
    pub const SCROLL_VIEW: WidgetTag = WidgetTag(5);
    pub const SPLIT: WidgetTag = WidgetTag(6);
    /// Wraps a player that cannot be handed to another tree.
    pub const VIDEO: WidgetTag = WidgetTag(7);

    pub const CHILDREN: ChildrenTag = ChildrenTag(1);
    pub const LEFT: ChildrenTag = ChildrenTag(1);
    pub const RIGHT: ChildrenTag = ChildrenTag(2);

    /// `text` on Text and Button, `source` on Video.
    pub const TEXT_PROPERTY: PropertyTag = PropertyTag(1);
    /// Boolean on Button; when true, clicks are reported.
    pub const ON_CLICK: PropertyTag = PropertyTag(2);

    pub const CLICK: EventTag = EventTag(1);

    pub const FLEX_WEIGHT: ModifierTag = ModifierTag(1);
    pub const BACKGROUND: ModifierTag = ModifierTag(2);
}

pub fn test_schema() -> SchemaTable {
    use tags::*;

    SchemaTable::new()
        .with(ROW, WidgetProtocol::leaf().with_children(CHILDREN))
        .with(COLUMN, WidgetProtocol::leaf().with_children(CHILDREN))
        .with(TEXT, WidgetProtocol::leaf().with_property(TEXT_PROPERTY))
        .with(
            BUTTON,
            WidgetProtocol::leaf()
                .with_property(TEXT_PROPERTY)
                .with_property(ON_CLICK),
        )
        .with(SCROLL_VIEW, WidgetProtocol::leaf().with_children(CHILDREN))
        .with(
            SPLIT,
            WidgetProtocol::leaf()
                .with_children(LEFT)
                .with_children(RIGHT),
        )
        .with(
            VIDEO,
            WidgetProtocol::leaf()
                .with_property(TEXT_PROPERTY)
                .not_reusable(),
        )
}
