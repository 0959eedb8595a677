use super::*;
use crate::{
    domain::UserDraft,
    error::{ErrorReport, StorageError, UserError},
};

fn draft(name: &str, age: &str, job_title: &str, gender: &str) -> UserDraft {
    UserDraft {
        name: name.to_string(),
        age: age.to_string(),
        job_title: job_title.to_string(),
        gender: gender.to_string(),
    }
}

#[test]
fn accepts_complete_draft_and_trims_text() {
    let user = draft("  John Doe ", "30", " Software Engineer", "Male  ")
        .validate()
        .expect("valid");
    assert_eq!(user.name(), "John Doe");
    assert_eq!(user.age(), 30);
    assert_eq!(user.job_title(), "Software Engineer");
    assert_eq!(user.gender(), "Male");
}

#[test]
fn accepts_age_bounds() {
    assert_eq!(draft("A", "1", "X", "F").validate().expect("min").age(), 1);
    assert_eq!(draft("A", "150", "X", "F").validate().expect("max").age(), 150);
}

#[test]
fn rejects_blank_name() {
    assert_eq!(
        draft("", "30", "X", "Male").validate(),
        Err(ValidationError::NameRequired)
    );
    assert_eq!(
        draft("   ", "30", "X", "Male").validate(),
        Err(ValidationError::NameRequired)
    );
}

#[test]
fn rejects_out_of_range_or_unparseable_age() {
    for age in ["", "0", "151", "-5", "abc", "12a", " 30", "99999999999999999999"] {
        assert_eq!(
            draft("A", age, "X", "Male").validate(),
            Err(ValidationError::AgeInvalid),
            "age input {age:?}"
        );
    }
}

#[test]
fn rejects_blank_job_title_and_gender() {
    assert_eq!(
        draft("A", "30", " ", "Male").validate(),
        Err(ValidationError::JobTitleRequired)
    );
    assert_eq!(
        draft("A", "30", "X", "").validate(),
        Err(ValidationError::GenderRequired)
    );
}

#[test]
fn reports_first_failing_check() {
    assert_eq!(
        draft("", "0", "", "").validate(),
        Err(ValidationError::NameRequired)
    );
    assert_eq!(
        draft("A", "x", "", "").validate(),
        Err(ValidationError::AgeInvalid)
    );
    assert_eq!(
        draft("A", "20", "", "").validate(),
        Err(ValidationError::JobTitleRequired)
    );
}

#[test]
fn numeric_constructor_applies_same_rule() {
    assert!(NewUser::new("A", 42, "X", "F").is_ok());
    assert_eq!(
        NewUser::new("A", 0, "X", "F"),
        Err(ValidationError::AgeInvalid)
    );
    assert_eq!(
        NewUser::new("A", -1, "X", "F"),
        Err(ValidationError::AgeInvalid)
    );
}

#[test]
fn age_keystrokes_allow_only_digits() {
    assert!(is_age_keystroke_valid(""));
    assert!(is_age_keystroke_valid("25"));
    assert!(!is_age_keystroke_valid("12a"));
    assert!(!is_age_keystroke_valid("-1"));
    assert!(!is_age_keystroke_valid(" 3"));
}

#[test]
fn storage_error_falls_back_when_message_is_blank() {
    let err = StorageError::new("");
    assert_eq!(err.message_or("Failed to save user"), "Failed to save user");
    let err = StorageError::new("Database error");
    assert_eq!(err.message_or("Failed to save user"), "Database error");
}

#[test]
fn error_report_carries_code() {
    let err = UserError::from(ValidationError::NameRequired);
    let report = ErrorReport::from(&err);
    let json = serde_json::to_value(&report).expect("json");
    assert_eq!(json["code"], "validation");
    assert_eq!(json["message"], "name is required");
}
