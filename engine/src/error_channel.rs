//! Single-slot diagnostic channel read by the host after a failed call.
//!
//! Each failing dispatch overwrites the slot; nothing accumulates.

/// Last error message set by the guest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorChannel {
    slot: Option<String>,
}

impl ErrorChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current message.
    pub fn set(&mut self, message: impl Into<String>) {
        self.slot = Some(message.into());
    }

    pub fn get(&self) -> Option<&str> {
        self.slot.as_deref()
    }

    pub fn take(&mut self) -> Option<String> {
        self.slot.take()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
