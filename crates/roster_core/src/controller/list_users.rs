use std::sync::Arc;

use futures::StreamExt;
use shared::domain::UserRecord;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::TaskSlot;
use crate::use_cases::ListUsers;

pub const LOAD_FAILED_FALLBACK: &str = "Failed to load users";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListUsersState {
    /// Newest first.
    pub users: Vec<UserRecord>,
    pub is_loading: bool,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListUsersIntent {
    /// Drops the current subscription, if any, and starts a new one.
    Load,
    ClearError,
}

pub struct ListUsersController {
    list_users: ListUsers,
    state: Arc<watch::Sender<ListUsersState>>,
    subscription: TaskSlot,
}

impl ListUsersController {
    /// Creates the controller and immediately subscribes to the listing.
    pub fn new(list_users: ListUsers) -> Self {
        let (state, _) = watch::channel(ListUsersState::default());
        let controller = Self {
            list_users,
            state: Arc::new(state),
            subscription: TaskSlot::default(),
        };
        controller.handle(ListUsersIntent::Load);
        controller
    }

    pub fn state(&self) -> ListUsersState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListUsersState> {
        self.state.subscribe()
    }

    pub fn handle(&self, intent: ListUsersIntent) {
        match intent {
            ListUsersIntent::Load => self.load(),
            ListUsersIntent::ClearError => {
                self.state.send_modify(|state| state.error_message = None)
            }
        }
    }

    fn load(&self) {
        self.subscription.abort();
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error_message = None;
        });

        let mut feed = self.list_users.execute();
        let state = Arc::clone(&self.state);
        self.subscription.replace(tokio::spawn(async move {
            while let Some(snapshot) = feed.next().await {
                match snapshot {
                    Ok(users) => {
                        debug!("list_users: snapshot count={}", users.len());
                        state.send_modify(|state| {
                            state.users = users;
                            state.is_loading = false;
                            state.error_message = None;
                        });
                    }
                    Err(err) => {
                        warn!("list_users: subscription failed error={err}");
                        // Last delivered users stay visible.
                        state.send_modify(|state| {
                            state.is_loading = false;
                            state.error_message =
                                Some(err.message_or(LOAD_FAILED_FALLBACK).to_string());
                        });
                        break;
                    }
                }
            }
        }));
    }
}

impl Drop for ListUsersController {
    fn drop(&mut self) {
        self.subscription.abort();
    }
}

#[cfg(test)]
#[path = "../tests/list_users_tests.rs"]
mod tests;
