use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use shared::{
    domain::{NewUser, UserId, UserRecord},
    error::StorageError,
};
use storage::{NewStoredUser, Storage, StoredUser};
use tracing::{info, warn};

pub type UserStream = BoxStream<'static, Result<Vec<UserRecord>, StorageError>>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Persists `user` once and returns the id the store assigned.
    async fn insert_user(&self, user: &NewUser) -> Result<UserId, StorageError>;

    /// Live newest-first listing; see [`Storage::subscribe_users`].
    fn users(&self) -> UserStream;
}

#[derive(Clone)]
pub struct SqliteUserRepository {
    storage: Storage,
}

impl SqliteUserRepository {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert_user(&self, user: &NewUser) -> Result<UserId, StorageError> {
        match self.storage.insert_user(&to_stored(user)).await {
            Ok(user_id) => {
                info!("users: saved user_id={}", user_id.0);
                Ok(user_id)
            }
            Err(err) => {
                let message = format!("{err:#}");
                warn!("users: insert failed error={message}");
                Err(StorageError::new(message))
            }
        }
    }

    fn users(&self) -> UserStream {
        self.storage
            .subscribe_users()
            .map(|snapshot| match snapshot {
                Ok(rows) => to_domain_list(rows),
                Err(err) => {
                    let message = format!("{err:#}");
                    warn!("users: listing failed error={message}");
                    Err(StorageError::new(message))
                }
            })
            .boxed()
    }
}

pub fn to_stored(user: &NewUser) -> NewStoredUser {
    NewStoredUser {
        name: user.name().to_string(),
        age: i64::from(user.age()),
        job_title: user.job_title().to_string(),
        gender: user.gender().to_string(),
    }
}

pub fn to_domain(row: StoredUser) -> Result<UserRecord, StorageError> {
    let age = u8::try_from(row.age).map_err(|_| {
        StorageError::new(format!("user {} has out-of-range age {}", row.id.0, row.age))
    })?;
    Ok(UserRecord {
        id: row.id,
        name: row.name,
        age,
        job_title: row.job_title,
        gender: row.gender,
    })
}

pub fn to_domain_list(rows: Vec<StoredUser>) -> Result<Vec<UserRecord>, StorageError> {
    rows.into_iter().map(to_domain).collect()
}

#[cfg(test)]
#[path = "tests/repository_tests.rs"]
mod tests;
