//! The VM value stack with a movable bottom.
//!
//! Host code sees a window: index 0 is the first value above `base`,
//! negative indices count down from the top. Calls move `base` up to the
//! argument list so a callee sees only its own arguments.

use kestrel_common::Value;

#[derive(Debug, Default)]
pub struct Stack {
    values: Vec<Value>,
    base: usize,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values in the current window.
    pub fn height(&self) -> usize {
        self.values.len() - self.base
    }

    /// Map a window index to a slot, or `None` if out of range.
    ///
    /// Non-negative `i` counts from the window bottom, `-1` is the top.
    pub fn resolve(&self, index: i32) -> Option<usize> {
        let height = self.height();
        let offset = if index >= 0 {
            index as usize
        } else {
            height.checked_sub(index.unsigned_abs() as usize)?
        };
        (offset < height).then_some(self.base + offset)
    }

    pub fn get(&self, index: i32) -> Option<&Value> {
        self.resolve(index).map(|slot| &self.values[slot])
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Remove the top `count` values, never reaching below the window.
    pub fn pop(&mut self, count: usize) {
        let keep = self.height().saturating_sub(count);
        self.values.truncate(self.base + keep);
    }

    /// Resize the window to `height`, padding with null.
    pub fn set_top(&mut self, height: usize) {
        self.values.resize(self.base + height, Value::Null);
    }

    /// Pop and return the top value of the window.
    pub fn take_top(&mut self) -> Option<Value> {
        if self.height() == 0 {
            return None;
        }
        self.values.pop()
    }

    /// Make the top `count` values the whole window. Returns the old base.
    pub(crate) fn open_window(&mut self, count: usize) -> usize {
        let old = self.base;
        self.base = self.values.len() - count.min(self.height());
        old
    }

    pub(crate) fn close_window(&mut self, old_base: usize) {
        self.base = old_base.min(self.values.len());
    }

    // Absolute access for the interpreter, which tracks its own frames.

    pub(crate) fn raw_len(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn raw_get(&self, slot: usize) -> Option<&Value> {
        self.values.get(slot)
    }

    pub(crate) fn raw_set(&mut self, slot: usize, value: Value) -> bool {
        match self.values.get_mut(slot) {
            Some(existing) => {
                *existing = value;
                true
            }
            None => false,
        }
    }

    pub(crate) fn raw_pop(&mut self, floor: usize) -> Option<Value> {
        if self.values.len() <= floor {
            return None;
        }
        self.values.pop()
    }

    pub(crate) fn raw_truncate(&mut self, len: usize) {
        self.values.truncate(len.max(self.base));
    }

    pub(crate) fn raw_resize(&mut self, len: usize) {
        self.values.resize(len, Value::Null);
    }
}
