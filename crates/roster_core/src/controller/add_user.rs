use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex,
};

use shared::{
    domain::{UserDraft, UserId},
    validation::is_age_keystroke_valid,
};
use tokio::{sync::watch, task::JoinSet};
use tracing::debug;

use crate::use_cases::InsertUser;

pub const SAVE_FAILED_FALLBACK: &str = "Failed to save user";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddUserState {
    pub name: String,
    /// Raw text as typed; only digits ever get in.
    pub age: String,
    pub job_title: String,
    pub gender: String,
    pub is_loading: bool,
    pub is_user_saved: bool,
    pub saved_user_id: Option<UserId>,
    pub error_message: Option<String>,
}

impl AddUserState {
    pub fn draft(&self) -> UserDraft {
        UserDraft {
            name: self.name.clone(),
            age: self.age.clone(),
            job_title: self.job_title.clone(),
            gender: self.gender.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddUserIntent {
    UpdateName(String),
    UpdateAge(String),
    UpdateJobTitle(String),
    UpdateGender(String),
    Save,
    ClearError,
    Reset,
}

pub struct AddUserController {
    insert_user: InsertUser,
    state: Arc<watch::Sender<AddUserState>>,
    /// Bumped by `Reset`; a save only reports back to the form it started on.
    form_generation: Arc<AtomicU64>,
    /// Dropping the set aborts every save still running.
    saves: Mutex<JoinSet<()>>,
}

impl AddUserController {
    pub fn new(insert_user: InsertUser) -> Self {
        let (state, _) = watch::channel(AddUserState::default());
        Self {
            insert_user,
            state: Arc::new(state),
            form_generation: Arc::new(AtomicU64::new(0)),
            saves: Mutex::new(JoinSet::new()),
        }
    }

    pub fn state(&self) -> AddUserState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AddUserState> {
        self.state.subscribe()
    }

    pub fn handle(&self, intent: AddUserIntent) {
        match intent {
            AddUserIntent::UpdateName(name) => self.update(|state| state.name = name),
            AddUserIntent::UpdateAge(age) => {
                if is_age_keystroke_valid(&age) {
                    self.update(|state| state.age = age);
                } else {
                    debug!("add_user: rejected age input={age:?}");
                }
            }
            AddUserIntent::UpdateJobTitle(job_title) => {
                self.update(|state| state.job_title = job_title)
            }
            AddUserIntent::UpdateGender(gender) => self.update(|state| state.gender = gender),
            AddUserIntent::Save => self.save(),
            AddUserIntent::ClearError => self.state.send_modify(|state| state.error_message = None),
            AddUserIntent::Reset => self.state.send_modify(|state| {
                self.form_generation.fetch_add(1, Ordering::SeqCst);
                *state = AddUserState::default();
            }),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut AddUserState)) {
        self.state.send_modify(|state| {
            apply(state);
            state.error_message = None;
        });
    }

    fn save(&self) {
        let mut accepted = None;
        // Check and claim happen under the state lock, so two saves can
        // never both see `is_loading == false`.
        self.state.send_if_modified(|state| {
            if state.is_loading {
                debug!("add_user: save already in flight, ignoring");
                return false;
            }
            match state.draft().validate() {
                Ok(user) => {
                    state.is_loading = true;
                    state.error_message = None;
                    accepted = Some((user, self.form_generation.load(Ordering::SeqCst)));
                }
                Err(err) => {
                    debug!("add_user: validation failed reason={err}");
                    state.error_message = Some(err.to_string());
                }
            }
            true
        });
        let Some((user, generation)) = accepted else {
            return;
        };

        let insert_user = self.insert_user.clone();
        let state = Arc::clone(&self.state);
        let form_generation = Arc::clone(&self.form_generation);
        let mut saves = self.saves.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        while saves.try_join_next().is_some() {}
        saves.spawn(async move {
            let outcome = insert_user.insert(&user).await;
            state.send_if_modified(|state| {
                if form_generation.load(Ordering::SeqCst) != generation {
                    debug!("add_user: form was reset, dropping save outcome");
                    return false;
                }
                state.is_loading = false;
                match outcome {
                    Ok(user_id) => {
                        state.is_user_saved = true;
                        state.saved_user_id = Some(user_id);
                    }
                    Err(err) => {
                        state.error_message =
                            Some(err.message_or(SAVE_FAILED_FALLBACK).to_string());
                    }
                }
                true
            });
        });
    }
}

#[cfg(test)]
#[path = "../tests/add_user_tests.rs"]
mod tests;
