use smallvec::SmallVec;
use smartstring::{LazyCompact, SmartString};
use std::cell::RefCell;
use std::rc::Rc;
use trellis_protocol::{ChildrenTag, WidgetTag};
use trellis_widget::{EventEmitter, WidgetChildren, move_items};

use crate::schema::tags;

#[derive(Debug, Clone, PartialEq)]
pub struct FlexWeight(pub f64);

#[derive(Debug, Clone, PartialEq)]
pub struct Background(pub String);

pub(crate) struct ViewState {
    pub tag: WidgetTag,
    /// Creation order across one factory.
    pub serial: usize,
    pub text: Option<SmartString<LazyCompact>>,
    pub scroll_offset: i32,
    pub flex_weight: Option<f64>,
    pub background: Option<String>,
    /// Times a child's modifier changed while attached here.
    pub child_modifier_updates: usize,
    pub on_click: Option<EventEmitter>,
    pub clicks: u32,
    pub slots: SmallVec<[(ChildrenTag, Vec<TestView>); 2]>,
    pub detached: bool,
}

/// Shared handle to one in-memory native view.
#[derive(Clone)]
pub struct TestView(pub(crate) Rc<RefCell<ViewState>>);

impl TestView {
    pub(crate) fn new(tag: WidgetTag, serial: usize, slots: &[ChildrenTag]) -> Self {
        Self(Rc::new(RefCell::new(ViewState {
            tag,
            serial,
            text: None,
            scroll_offset: 0,
            flex_weight: None,
            background: None,
            child_modifier_updates: 0,
            on_click: None,
            clicks: 0,
            slots: slots.iter().map(|tag| (*tag, Vec::new())).collect(),
            detached: false,
        })))
    }

    /// A host root view and the container to hand to the bridge.
    pub fn root() -> (TestView, ViewChildren) {
        let view = TestView::new(WidgetTag::UNKNOWN, 0, &[ChildrenTag::ROOT]);
        let container = view.container(ChildrenTag::ROOT);
        (view, container)
    }

    pub fn container(&self, tag: ChildrenTag) -> ViewChildren {
        ViewChildren {
            owner: self.clone(),
            tag,
        }
    }

    pub fn tag(&self) -> WidgetTag {
        self.0.borrow().tag
    }

    pub fn serial(&self) -> usize {
        self.0.borrow().serial
    }

    pub fn text(&self) -> Option<String> {
        self.0.borrow().text.as_ref().map(|text| text.to_string())
    }

    pub fn flex_weight(&self) -> Option<f64> {
        self.0.borrow().flex_weight
    }

    pub fn background(&self) -> Option<String> {
        self.0.borrow().background.clone()
    }

    pub fn child_modifier_updates(&self) -> usize {
        self.0.borrow().child_modifier_updates
    }

    pub fn scroll_offset(&self) -> i32 {
        self.0.borrow().scroll_offset
    }

    /// Simulate the user scrolling.
    pub fn scroll_to(&self, offset: i32) {
        self.0.borrow_mut().scroll_offset = offset;
    }

    /// Simulate a tap. Reports an event only while `on_click` is set.
    pub fn click(&self) {
        let emitter = {
            let mut state = self.0.borrow_mut();
            state.clicks += 1;
            state.on_click.clone()
        };
        if let Some(emitter) = emitter {
            let clicks = self.0.borrow().clicks;
            emitter.send(emitter.event(tags::CLICK).with_arg(clicks));
        }
    }

    pub fn children(&self, tag: ChildrenTag) -> Vec<TestView> {
        self.0
            .borrow()
            .slots
            .iter()
            .find(|(slot, _)| *slot == tag)
            .map(|(_, children)| children.clone())
            .unwrap_or_default()
    }

    pub fn is_detached(&self) -> bool {
        self.0.borrow().detached
    }

    pub fn ptr_eq(&self, other: &TestView) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Content and topology, for comparing against [`crate::LogicalNode::expected`].
    pub fn tree(&self) -> ViewTree {
        let state = self.0.borrow();
        ViewTree {
            tag: state.tag,
            text: state.text.as_ref().map(|text| text.to_string()),
            slots: state
                .slots
                .iter()
                .filter(|(_, children)| !children.is_empty())
                .map(|(tag, children)| (*tag, children.iter().map(TestView::tree).collect()))
                .collect(),
        }
    }

    /// Trees of every child in one slot.
    pub fn child_trees(&self, tag: ChildrenTag) -> Vec<ViewTree> {
        self.children(tag).iter().map(TestView::tree).collect()
    }
}

impl std::fmt::Debug for TestView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.0.borrow();
        f.debug_struct("TestView")
            .field("tag", &state.tag)
            .field("serial", &state.serial)
            .field("text", &state.text)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ViewTree {
    pub tag: WidgetTag,
    pub text: Option<String>,
    /// Non-empty slots only.
    pub slots: Vec<(ChildrenTag, Vec<ViewTree>)>,
}

/// Native container writing into one slot of its owner view.
pub struct ViewChildren {
    owner: TestView,
    tag: ChildrenTag,
}

impl ViewChildren {
    pub fn tag(&self) -> ChildrenTag {
        self.tag
    }

    fn with_slot<R>(&self, f: impl FnOnce(&mut Vec<TestView>) -> R) -> Option<R> {
        let mut state = self.owner.0.borrow_mut();
        state
            .slots
            .iter_mut()
            .find(|(slot, _)| *slot == self.tag)
            .map(|(_, children)| f(children))
    }
}

impl WidgetChildren<TestView> for ViewChildren {
    fn insert(&mut self, index: usize, widget: TestView) {
        self.with_slot(|children| children.insert(index, widget));
    }

    fn move_range(&mut self, from: usize, to: usize, count: usize) {
        self.with_slot(|children| move_items(children, from, to, count));
    }

    fn remove(&mut self, index: usize, count: usize) {
        self.with_slot(|children| {
            children.drain(index..index + count);
        });
    }

    fn on_modifier_updated(&mut self, _index: usize, _widget: &TestView) {
        self.owner.0.borrow_mut().child_modifier_updates += 1;
    }

    fn detach(&mut self) {
        self.with_slot(Vec::clear);
    }
}
