//! Controller layer: per-screen observable state and intent handling.
//!
//! Both controllers spawn their background work on the ambient tokio runtime,
//! so they must be created and driven from inside one. Dropping a controller
//! aborts whatever it still has running.

pub mod add_user;
pub mod list_users;

use std::sync::{Mutex, MutexGuard};

use tokio::task::JoinHandle;

/// Slot for the single background task a controller may own.
#[derive(Default)]
pub(crate) struct TaskSlot(Mutex<Option<JoinHandle<()>>>);

impl TaskSlot {
    fn lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        // The slot only ever holds a handle; a poisoned lock leaves it usable.
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores `task`, aborting the one it replaces.
    pub(crate) fn replace(&self, task: JoinHandle<()>) {
        if let Some(previous) = self.lock().replace(task) {
            previous.abort();
        }
    }

    pub(crate) fn abort(&self) {
        if let Some(task) = self.lock().take() {
            task.abort();
        }
    }
}
