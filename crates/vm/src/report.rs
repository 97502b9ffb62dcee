//! Per-instance error state and the optional notification callback.

use crate::status::Status;
use log::warn;
use std::ffi::{CStr, CString};
use std::fmt;

/// Called with the message of every recorded failure.
pub type ErrorCallback = Box<dyn FnMut(&str)>;

/// The most recent failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    message: String,
    c_message: CString,
    status: Status,
}

impl ErrorRecord {
    fn new(status: Status, message: String) -> Self {
        // Interior NULs would truncate the C view; replace them.
        let c_message = CString::new(message.replace('\0', "\u{fffd}")).unwrap_or_default();
        Self {
            message,
            c_message,
            status,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// NUL-terminated copy of the message for the C surface.
    pub fn c_message(&self) -> &CStr {
        &self.c_message
    }

    pub fn status(&self) -> Status {
        self.status
    }
}

/// Holds at most one error record. Every failure replaces it and
/// notifies the callback once; only [`ErrorState::clear`] empties it.
#[derive(Default)]
pub struct ErrorState {
    record: Option<ErrorRecord>,
    callback: Option<ErrorCallback>,
}

impl fmt::Debug for ErrorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorState")
            .field("record", &self.record)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

impl ErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure and notify the callback.
    pub fn raise(&mut self, status: Status, message: impl Into<String>) {
        let record = ErrorRecord::new(status, message.into());
        warn!("{}: {}", status, record.message);

        // Taken out for the call so a callback that raises again cannot
        // observe a half-updated state.
        let mut callback = self.callback.take();
        if let Some(callback) = callback.as_mut() {
            callback(&record.message);
        }
        self.record = Some(record);
        if self.callback.is_none() {
            self.callback = callback;
        }
    }

    pub fn has_error(&self) -> bool {
        self.record.is_some()
    }

    pub fn record(&self) -> Option<&ErrorRecord> {
        self.record.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.record.as_ref().map(ErrorRecord::message)
    }

    pub fn status(&self) -> Option<Status> {
        self.record.as_ref().map(ErrorRecord::status)
    }

    /// Empty the state. Clearing an empty state is fine.
    pub fn clear(&mut self) {
        self.record = None;
    }

    /// Install or remove the callback. Does not fire it.
    pub fn set_callback(&mut self, callback: Option<ErrorCallback>) {
        self.callback = callback;
    }

    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }
}
