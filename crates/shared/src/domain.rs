use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    validation::{validate_fields, AgeInput},
};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(UserId);

/// A user as stored and listed. The id is always assigned by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub age: u8,
    pub job_title: String,
    pub gender: String,
}

/// A user that passed validation and has not been persisted yet.
///
/// Only [`UserDraft::validate`] and [`NewUser::new`] build one, so every
/// value of this type satisfies the validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUser {
    name: String,
    age: u8,
    job_title: String,
    gender: String,
}

impl NewUser {
    pub fn new(
        name: &str,
        age: i64,
        job_title: &str,
        gender: &str,
    ) -> Result<Self, ValidationError> {
        validate_fields(name, AgeInput::Number(age), job_title, gender)
    }

    pub(crate) fn from_validated(name: String, age: u8, job_title: String, gender: String) -> Self {
        Self {
            name,
            age,
            job_title,
            gender,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn job_title(&self) -> &str {
        &self.job_title
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }

    pub fn into_record(self, id: UserId) -> UserRecord {
        UserRecord {
            id,
            name: self.name,
            age: self.age,
            job_title: self.job_title,
            gender: self.gender,
        }
    }
}

/// Raw form input. `age` stays text until validation parses it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub name: String,
    pub age: String,
    pub job_title: String,
    pub gender: String,
}

impl UserDraft {
    pub fn validate(&self) -> Result<NewUser, ValidationError> {
        validate_fields(
            &self.name,
            AgeInput::Text(&self.age),
            &self.job_title,
            &self.gender,
        )
    }
}
