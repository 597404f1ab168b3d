use thiserror::Error;

/// A native container holding one ordered child sequence.
///
/// Callers validate indices before calling in; implementations may assume they are
/// in bounds.
pub trait WidgetChildren<W> {
    fn insert(&mut self, index: usize, widget: W);

    /// Move `count` children starting at `from`. `to` is the index before the
    /// moved children are taken out.
    fn move_range(&mut self, from: usize, to: usize, count: usize);

    fn remove(&mut self, index: usize, count: usize);

    /// The modifier of the child at `index` changed. Containers typically re-run
    /// layout for that single child.
    fn on_modifier_updated(&mut self, index: usize, widget: &W) {
        let _ = (index, widget);
    }

    /// Drop every reference to the current children. No further calls follow.
    fn detach(&mut self) {}
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildrenError {
    #[error("index must be in range [0, {len}]: {index}")]
    InsertOutOfBounds { index: usize, len: usize },

    #[error("fromIndex must be in range [0, {len}): {from}")]
    MoveFromOutOfBounds { from: usize, len: usize },

    #[error("toIndex must be in range [0, {len}]: {to}")]
    MoveToOutOfBounds { to: usize, len: usize },

    #[error("count exceeds children: fromIndex={from}, count={count}, children={len}")]
    MoveCountOutOfBounds {
        from: usize,
        count: usize,
        len: usize,
    },

    #[error("toIndex {to} falls inside the moved range [{from}, {end})")]
    MoveIntoSelf { from: usize, to: usize, end: usize },

    #[error("index must be in range [0, {len}): {index}")]
    RemoveOutOfBounds { index: usize, len: usize },

    #[error("count must be in range [0, {available}]: {count}")]
    RemoveCountOutOfBounds { count: usize, available: usize },
}

pub fn validate_insert(len: usize, index: usize) -> Result<(), ChildrenError> {
    if index > len {
        return Err(ChildrenError::InsertOutOfBounds { index, len });
    }
    Ok(())
}

pub fn validate_move(len: usize, from: usize, to: usize, count: usize) -> Result<(), ChildrenError> {
    if from >= len {
        return Err(ChildrenError::MoveFromOutOfBounds { from, len });
    }
    if to > len {
        return Err(ChildrenError::MoveToOutOfBounds { to, len });
    }
    let end = from
        .checked_add(count)
        .filter(|end| *end <= len)
        .ok_or(ChildrenError::MoveCountOutOfBounds { from, count, len })?;
    if to > from && to < end {
        return Err(ChildrenError::MoveIntoSelf { from, to, end });
    }
    Ok(())
}

pub fn validate_remove(len: usize, index: usize, count: usize) -> Result<(), ChildrenError> {
    if index >= len {
        return Err(ChildrenError::RemoveOutOfBounds { index, len });
    }
    let available = len - index;
    if count > available {
        return Err(ChildrenError::RemoveCountOutOfBounds { count, available });
    }
    Ok(())
}

/// Apply move semantics of [`WidgetChildren::move_range`] to a plain list.
pub fn move_items<T>(list: &mut Vec<T>, from: usize, to: usize, count: usize) {
    if count == 0 || from == to {
        return;
    }
    let dest = if from > to { to } else { to - count };
    let moved: Vec<T> = list.drain(from..from + count).collect();
    list.splice(dest..dest, moved);
}
