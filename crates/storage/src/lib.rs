use anyhow::{Context, Result};
use futures::{stream::BoxStream, StreamExt};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info};

use shared::domain::UserId;

const MEMORY_DATABASE_URL: &str = "sqlite::memory:";

/// Local user table plus a change feed for live listings.
///
/// Clones share the pool and the change feed, so a write through one clone
/// wakes subscribers of every other clone.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
    changes: Arc<watch::Sender<u64>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUser {
    pub id: UserId,
    pub name: String,
    pub age: i64,
    pub job_title: String,
    pub gender: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStoredUser {
    pub name: String,
    pub age: i64,
    pub job_title: String,
    pub gender: String,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url '{database_url}'"))?
            .create_if_missing(true);

        // Every connection to an in-memory database sees its own empty database,
        // so keep exactly one alive for the lifetime of the pool.
        let pool_options = if database_url.starts_with(MEMORY_DATABASE_URL) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run user table migrations")?;

        let (changes, _) = watch::channel(0);
        Ok(Self {
            pool,
            changes: Arc::new(changes),
        })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn insert_user(&self, user: &NewStoredUser) -> Result<UserId> {
        let rec = sqlx::query(
            "INSERT INTO users (name, age, job_title, gender) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(&user.name)
        .bind(user.age)
        .bind(&user.job_title)
        .bind(&user.gender)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert user")?;
        // The row is committed at this point whatever happens to the decode.
        self.notify_changed();
        let user_id = UserId(
            rec.try_get::<i64, _>(0)
                .context("failed to read id of inserted user")?,
        );
        debug!(user_id = user_id.0, "inserted user row");
        Ok(user_id)
    }

    /// All users, newest first.
    pub async fn list_users(&self) -> Result<Vec<StoredUser>> {
        fetch_users(&self.pool).await
    }

    pub async fn count_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .context("failed to count users")?;
        Ok(count)
    }

    /// Deletes every user row and returns how many were removed.
    pub async fn clear_users(&self) -> Result<u64> {
        let removed = sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await
            .context("failed to clear users")?
            .rows_affected();
        self.notify_changed();
        info!(removed, "cleared user table");
        Ok(removed)
    }

    /// Live listing of all users, newest first.
    ///
    /// The first item is the current table contents. After that a fresh
    /// snapshot follows every write; writes that land while a snapshot is
    /// being read collapse into one follow-up snapshot. Dropping the stream
    /// ends the subscription.
    pub fn subscribe_users(&self) -> BoxStream<'static, Result<Vec<StoredUser>>> {
        let pool = self.pool.clone();
        WatchStream::new(self.changes.subscribe())
            .then(move |_version| {
                let pool = pool.clone();
                async move { fetch_users(&pool).await }
            })
            .boxed()
    }

    fn notify_changed(&self) {
        self.changes.send_modify(|version| *version = version.wrapping_add(1));
    }
}

async fn fetch_users(pool: &Pool<Sqlite>) -> Result<Vec<StoredUser>> {
    let rows = sqlx::query("SELECT id, name, age, job_title, gender FROM users ORDER BY id DESC")
        .fetch_all(pool)
        .await
        .context("failed to list users")?;
    rows.iter().map(stored_user_from_row).collect()
}

fn stored_user_from_row(row: &SqliteRow) -> Result<StoredUser> {
    Ok(StoredUser {
        id: UserId(row.try_get("id")?),
        name: row.try_get("name")?,
        age: row.try_get("age")?,
        job_title: row.try_get("job_title")?,
        gender: row.try_get("gender")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with(MEMORY_DATABASE_URL) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
