//! The global variable table.

use kestrel_common::Value;
use std::collections::HashMap;

/// Globals keyed by exact name bytes.
#[derive(Debug, Default)]
pub struct Globals {
    values: HashMap<Box<[u8]>, Value>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`, replacing any previous value.
    pub fn set(&mut self, name: &[u8], value: Value) {
        match self.values.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.values.insert(name.into(), value);
            }
        }
    }

    pub fn get(&self, name: &[u8]) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
