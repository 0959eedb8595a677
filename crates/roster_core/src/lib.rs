//! Add and list users on top of the local record store.
//!
//! Layering, outermost first: controllers own observable screen state and
//! turn intents into use case calls; use cases validate and delegate to a
//! [`UserRepository`]; the repository maps between storage rows and domain
//! records.

pub mod controller;
pub mod repository;
pub mod use_cases;

pub use controller::{
    add_user::{AddUserController, AddUserIntent, AddUserState},
    list_users::{ListUsersController, ListUsersIntent, ListUsersState},
};
pub use repository::{SqliteUserRepository, UserRepository, UserStream};
pub use use_cases::{InsertUser, ListUsers};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
