//! In-memory [`UserRepository`] double for unit tests.

use std::{
    sync::{
        atomic::{AtomicI64, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use futures::{stream, StreamExt};
use shared::{
    domain::{NewUser, UserId, UserRecord},
    error::StorageError,
};
use tokio::sync::{watch, Semaphore};
use tokio_stream::wrappers::WatchStream;

use crate::repository::{UserRepository, UserStream};

pub(crate) const WAIT: Duration = Duration::from_secs(5);

pub(crate) struct FakeUserRepository {
    users: watch::Sender<Vec<UserRecord>>,
    next_id: AtomicI64,
    insert_calls: AtomicUsize,
    subscribe_calls: AtomicUsize,
    insert_failure: Option<String>,
    scripted_feed: Mutex<Option<Vec<Result<Vec<UserRecord>, StorageError>>>>,
    insert_gate: Option<Arc<Semaphore>>,
}

impl FakeUserRepository {
    pub(crate) fn new() -> Self {
        let (users, _) = watch::channel(Vec::new());
        Self {
            users,
            next_id: AtomicI64::new(1),
            insert_calls: AtomicUsize::new(0),
            subscribe_calls: AtomicUsize::new(0),
            insert_failure: None,
            scripted_feed: Mutex::new(None),
            insert_gate: None,
        }
    }

    pub(crate) fn failing_inserts(message: impl Into<String>) -> Self {
        let mut repository = Self::new();
        repository.insert_failure = Some(message.into());
        repository
    }

    /// Inserts block until a permit is added to the returned semaphore.
    pub(crate) fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut repository = Self::new();
        repository.insert_gate = Some(Arc::clone(&gate));
        (repository, gate)
    }

    /// The next `users()` call replays `items` and then ends.
    pub(crate) fn script_next_feed(&self, items: Vec<Result<Vec<UserRecord>, StorageError>>) {
        *self.scripted_feed.lock().expect("script lock") = Some(items);
    }

    pub(crate) fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UserRepository for FakeUserRepository {
    async fn insert_user(&self, user: &NewUser) -> Result<UserId, StorageError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.insert_gate {
            gate.acquire().await.expect("gate open").forget();
        }
        if let Some(message) = &self.insert_failure {
            return Err(StorageError::new(message.clone()));
        }
        let user_id = UserId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let record = user.clone().into_record(user_id);
        self.users.send_modify(|users| users.insert(0, record));
        Ok(user_id)
    }

    fn users(&self) -> UserStream {
        self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(items) = self.scripted_feed.lock().expect("script lock").take() {
            return stream::iter(items).boxed();
        }
        WatchStream::new(self.users.subscribe()).map(Ok).boxed()
    }
}

pub(crate) fn record(id: i64, name: &str) -> UserRecord {
    UserRecord {
        id: UserId(id),
        name: name.to_string(),
        age: 30,
        job_title: "Engineer".to_string(),
        gender: "Female".to_string(),
    }
}
