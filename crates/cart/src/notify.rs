//! User-facing error notices.
//!
//! The cart manager never returns failures to its caller as errors; it
//! reports them through a [`Notifier`] and leaves the cart unchanged.

use std::sync::{Arc, Mutex, PoisonError};

/// Notice shown when a requested quantity exceeds available stock.
pub const OUT_OF_STOCK: &str = "Requested quantity is out of stock";
/// Notice shown when adding a product fails.
pub const ADD_FAILED: &str = "Failed to add product";
/// Notice shown when removing a product fails.
pub const REMOVE_FAILED: &str = "Failed to remove product";
/// Notice shown when changing a product's quantity fails.
pub const UPDATE_FAILED: &str = "Failed to change product quantity";

/// Fire-and-forget channel for user-facing error messages.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn error(&self, message: &str) {
        (**self).error(message);
    }
}

/// Collects notices in memory.
///
/// Used by the CLI to print notices after a command and by tests to assert
/// on them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notices recorded so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return all recorded notices.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.messages.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}
