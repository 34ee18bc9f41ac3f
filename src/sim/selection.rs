//! Pointer selection state
//!
//! At most one block id is selected at a time. The id is not validated
//! against the history; a selection pointing at an evicted block is
//! allowed to persist harmlessly (its highlight and details simply stop
//! resolving).

#[derive(Debug, Clone, Copy, Default)]
pub struct Selection {
    current: Option<u64>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection; `None` clears it.
    pub fn set(&mut self, id: Option<u64>) {
        self.current = id;
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn get(&self) -> Option<u64> {
        self.current
    }

    pub fn is_selected(&self, id: u64) -> bool {
        self.current == Some(id)
    }
}
