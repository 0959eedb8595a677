use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use roster_core::{
    AddUserController, AddUserIntent, InsertUser, ListUsers, ListUsersController,
    ListUsersState, SqliteUserRepository, UserRepository,
};
use shared::{
    domain::{UserDraft, UserRecord},
    error::{ErrorCode, ErrorReport},
};
use storage::Storage;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, normalize_database_url};

#[derive(Parser, Debug)]
#[command(name = "roster", about = "Add and list users in a local SQLite table")]
struct Cli {
    /// Overrides the configured database (file path or sqlite url).
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate and save one user.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: String,
        #[arg(long)]
        job_title: String,
        #[arg(long)]
        gender: String,
        #[arg(long)]
        json: bool,
    },
    /// Insert users from a JSON array of drafts; `age` is given as text.
    Import { file: PathBuf },
    /// Print all users, newest first.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Print the user list every time it changes, until Ctrl-C.
    Watch,
    /// Delete every user.
    Clear,
    /// Check the database and report how many users it holds.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cwd = env::current_dir().context("failed to resolve working directory")?;
    let mut settings = load_settings(&cwd)?;
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let database_url = normalize_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify the path is writable"
        );
        error
    })?;
    info!(%database_url, "user table ready");

    let repository: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(storage.clone()));

    match cli.command {
        Command::Add {
            name,
            age,
            job_title,
            gender,
            json,
        } => {
            let draft = UserDraft {
                name,
                age,
                job_title,
                gender,
            };
            add_user(repository, draft, json).await
        }
        Command::Import { file } => import_users(repository, &file).await,
        Command::List { json } => list_users(repository, json).await,
        Command::Watch => watch_users(repository).await,
        Command::Clear => {
            let removed = storage.clear_users().await?;
            println!("removed {removed} users");
            Ok(())
        }
        Command::Status => {
            storage.health_check().await?;
            println!(
                "database={database_url} users={}",
                storage.count_users().await?
            );
            Ok(())
        }
    }
}

async fn add_user(
    repository: Arc<dyn UserRepository>,
    draft: UserDraft,
    json: bool,
) -> Result<()> {
    let controller = AddUserController::new(InsertUser::new(repository));
    controller.handle(AddUserIntent::UpdateName(draft.name));
    controller.handle(AddUserIntent::UpdateAge(draft.age));
    controller.handle(AddUserIntent::UpdateJobTitle(draft.job_title));
    controller.handle(AddUserIntent::UpdateGender(draft.gender));
    controller.handle(AddUserIntent::Save);

    let mut state = controller.subscribe();
    let state = state.wait_for(|state| !state.is_loading).await?.clone();

    match (state.saved_user_id, state.error_message) {
        (Some(user_id), _) => {
            if json {
                println!("{}", serde_json::json!({ "user_id": user_id }));
            } else {
                println!("saved user_id={}", user_id.0);
            }
            Ok(())
        }
        (None, Some(message)) => {
            if json {
                println!("{}", serde_json::json!({ "error": message }));
            }
            Err(anyhow!(message))
        }
        (None, None) => Err(anyhow!("save finished without a result")),
    }
}

/// Inserts every draft in a JSON array file, reporting each rejection.
async fn import_users(repository: Arc<dyn UserRepository>, file: &Path) -> Result<()> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read '{}'", file.display()))?;
    let drafts: Vec<UserDraft> = serde_json::from_str(&raw)
        .with_context(|| format!("'{}' is not a JSON array of users", file.display()))?;

    let insert_user = InsertUser::new(repository);
    let mut saved = 0usize;
    let mut storage_failed = false;
    for (index, draft) in drafts.iter().enumerate() {
        match insert_user.execute(draft).await {
            Ok(user_id) => {
                saved += 1;
                println!("[{index}] saved user_id={}", user_id.0);
            }
            Err(err) => {
                let report = ErrorReport::from(&err);
                storage_failed |= report.code == ErrorCode::Storage;
                println!("[{index}] {}", serde_json::to_string(&report)?);
            }
        }
    }

    println!("imported {saved} of {} users", drafts.len());
    if storage_failed {
        return Err(anyhow!("some users could not be stored"));
    }
    Ok(())
}

async fn list_users(repository: Arc<dyn UserRepository>, json: bool) -> Result<()> {
    let controller = ListUsersController::new(ListUsers::new(repository));
    let mut state = controller.subscribe();
    let state = state.wait_for(|state| !state.is_loading).await?.clone();

    if let Some(message) = state.error_message {
        return Err(anyhow!(message));
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&state.users)?);
    } else {
        print_users(&state);
    }
    Ok(())
}

async fn watch_users(repository: Arc<dyn UserRepository>) -> Result<()> {
    let controller = ListUsersController::new(ListUsers::new(repository));
    let mut state = controller.subscribe();

    loop {
        let changed = tokio::select! {
            changed = state.changed() => changed,
            _ = tokio::signal::ctrl_c() => {
                info!("watch: interrupted");
                return Ok(());
            }
        };
        changed?;

        let snapshot = state.borrow_and_update().clone();
        if snapshot.is_loading {
            continue;
        }
        if let Some(message) = snapshot.error_message {
            return Err(anyhow!(message));
        }
        print_users(&snapshot);
    }
}

fn print_users(state: &ListUsersState) {
    if state.users.is_empty() {
        println!("no users");
        return;
    }
    println!("{} users", state.users.len());
    for user in &state.users {
        println!("{}", render_user(user));
    }
}

fn render_user(user: &UserRecord) -> String {
    format!(
        "#{} {} ({}) {} - {}",
        user.id.0, user.name, user.age, user.job_title, user.gender
    )
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
