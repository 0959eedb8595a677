use std::sync::Arc;

use shared::{
    domain::{NewUser, UserDraft, UserId},
    error::{StorageError, UserError},
};

use crate::repository::{UserRepository, UserStream};

/// Validate-then-persist. Storage is called at most once per call and only
/// for input that passed validation.
#[derive(Clone)]
pub struct InsertUser {
    repository: Arc<dyn UserRepository>,
}

impl InsertUser {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(&self, draft: &UserDraft) -> Result<UserId, UserError> {
        let user = draft.validate()?;
        Ok(self.insert(&user).await?)
    }

    pub async fn insert(&self, user: &NewUser) -> Result<UserId, StorageError> {
        self.repository.insert_user(user).await
    }
}

#[derive(Clone)]
pub struct ListUsers {
    repository: Arc<dyn UserRepository>,
}

impl ListUsers {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub fn execute(&self) -> UserStream {
        self.repository.users()
    }
}

#[cfg(test)]
#[path = "tests/use_cases_tests.rs"]
mod tests;
