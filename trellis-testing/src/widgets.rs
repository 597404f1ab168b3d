use crate::schema::{tags, test_schema};
use crate::view::{Background, FlexWeight, TestView, ViewChildren};
use serde_json::Value;
use smallvec::SmallVec;
use std::cell::Cell;
use std::rc::Rc;
use trellis_host::{ProtocolFactory, SchemaTable};
use trellis_protocol::{ChildrenTag, ModifierElement, PropertyTag, WidgetTag};
use trellis_widget::{
    EventEmitter, Modifier, ModifierError, ModifierValue, PropertyError, Widget, WidgetChildren,
    decode_modifier, decode_property,
};

/// Every widget of the test schema. Behavior is keyed on the widget tag.
struct TestWidget {
    view: TestView,
    containers: SmallVec<[ViewChildren; 2]>,
}

impl Widget<TestView> for TestWidget {
    fn value(&self) -> TestView {
        self.view.clone()
    }

    fn apply(
        &mut self,
        tag: PropertyTag,
        value: &Value,
        events: &EventEmitter,
    ) -> Result<(), PropertyError> {
        let kind = self.view.tag();
        match (kind, tag) {
            (tags::TEXT | tags::BUTTON | tags::VIDEO, tags::TEXT_PROPERTY) => {
                let text: String = decode_property(tag, value)?;
                self.view.0.borrow_mut().text = Some(text.into());
            }
            (tags::BUTTON, tags::ON_CLICK) => {
                let enabled: bool = decode_property(tag, value)?;
                self.view.0.borrow_mut().on_click = enabled.then(|| events.clone());
            }
            _ => return Err(PropertyError::Unknown(tag)),
        }
        Ok(())
    }

    fn set_modifier(&mut self, modifier: Modifier) {
        let mut state = self.view.0.borrow_mut();
        state.flex_weight = modifier.find::<FlexWeight>().map(|weight| weight.0);
        state.background = modifier.find::<Background>().map(|color| color.0.clone());
    }

    fn children(&mut self, tag: ChildrenTag) -> Option<&mut dyn WidgetChildren<TestView>> {
        self.containers
            .iter_mut()
            .find(|container| container.tag() == tag)
            .map(|container| container as &mut dyn WidgetChildren<TestView>)
    }

    fn detach(&mut self) {
        self.view.0.borrow_mut().detached = true;
    }
}

/// Factory for the test schema. Counts every widget it creates.
pub struct TestFactory {
    schema: SchemaTable,
    created: Rc<Cell<usize>>,
}

impl TestFactory {
    pub fn new() -> Self {
        Self {
            schema: test_schema(),
            created: Rc::new(Cell::new(0)),
        }
    }

    /// Live counter of created widgets, still readable after the factory moved
    /// into a bridge.
    pub fn created(&self) -> Rc<Cell<usize>> {
        self.created.clone()
    }
}

impl Default for TestFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolFactory<TestView> for TestFactory {
    fn schema(&self) -> &SchemaTable {
        &self.schema
    }

    fn create_widget(&self, tag: WidgetTag) -> Option<Box<dyn Widget<TestView>>> {
        let slots = self.schema.get(tag)?.children_tags.clone();
        let serial = self.created.get() + 1;
        self.created.set(serial);

        let view = TestView::new(tag, serial, &slots);
        let containers = slots.iter().map(|slot| view.container(*slot)).collect();
        Some(Box::new(TestWidget { view, containers }))
    }

    fn create_modifier(
        &self,
        element: &ModifierElement,
    ) -> Result<Box<dyn ModifierValue>, ModifierError> {
        match element.tag {
            tags::FLEX_WEIGHT => Ok(Box::new(FlexWeight(decode_modifier(
                element.tag,
                &element.value,
            )?))),
            tags::BACKGROUND => Ok(Box::new(Background(decode_modifier(
                element.tag,
                &element.value,
            )?))),
            tag => Err(ModifierError::Unknown(tag)),
        }
    }
}
