use crate::children::{WidgetChildren, move_items};

type ModifierUpdated = Box<dyn FnMut(usize)>;

/// `Vec`-backed children container.
///
/// Serves as the root container in tests and as a template for platform
/// containers.
pub struct MutableListChildren<W> {
    list: Vec<W>,
    modifier_updated: Option<ModifierUpdated>,
    detached: bool,
}

impl<W> MutableListChildren<W> {
    pub fn new() -> Self {
        Self {
            list: Vec::new(),
            modifier_updated: None,
            detached: false,
        }
    }

    /// Invoke `callback` with the child index whenever a child's modifier changes.
    pub fn with_modifier_updated(callback: impl FnMut(usize) + 'static) -> Self {
        Self {
            list: Vec::new(),
            modifier_updated: Some(Box::new(callback)),
            detached: false,
        }
    }

    pub fn as_slice(&self) -> &[W] {
        &self.list
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn iter(&self) -> std::slice::Iter<'_, W> {
        self.list.iter()
    }
}

impl<W> Default for MutableListChildren<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> WidgetChildren<W> for MutableListChildren<W> {
    fn insert(&mut self, index: usize, widget: W) {
        self.list.insert(index, widget);
    }

    fn move_range(&mut self, from: usize, to: usize, count: usize) {
        move_items(&mut self.list, from, to, count);
    }

    fn remove(&mut self, index: usize, count: usize) {
        self.list.drain(index..index + count);
    }

    fn on_modifier_updated(&mut self, index: usize, _widget: &W) {
        if let Some(callback) = self.modifier_updated.as_mut() {
            callback(index);
        }
    }

    fn detach(&mut self) {
        self.list.clear();
        self.detached = true;
    }
}
