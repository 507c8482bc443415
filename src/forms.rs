//! HTML forms
//!
//! Each form deserializes from an `application/x-www-form-urlencoded` body,
//! validates itself and collects errors per field so the page can be
//! re-rendered with them. Checks that need the database (a taken username,
//! wrong credentials) are reported by the services and attached by the
//! handlers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ModerationConfig;
use crate::models::USERNAME_MAX_LENGTH;

/// Error shown for a missing required value
pub const REQUIRED_FIELD: &str = "Обязательное поле.";
/// Error shown when the two signup passwords differ
pub const PASSWORD_MISMATCH: &str = "Введённые пароли не совпадают.";
/// Error shown when signing up with a username that is already taken
pub const USERNAME_TAKEN: &str = "Пользователь с таким именем уже существует.";
/// Error shown when login credentials do not match a user
pub const INVALID_LOGIN: &str =
    "Пожалуйста, введите правильные имя пользователя и пароль. Оба поля могут быть чувствительны к регистру.";

/// Validation errors of a form, keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    pub fields: BTreeMap<String, Vec<String>>,
    /// Errors not tied to a single field
    pub non_field: Vec<String>,
}

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    /// Errors of one field, empty if it has none
    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `field` carries exactly `message` among its errors
    pub fn has(&self, field: &str, message: &str) -> bool {
        self.field(field).iter().any(|e| e == message)
    }
}

/// Words that may not appear in a comment, with the warning shown instead
#[derive(Debug, Clone)]
pub struct BannedWords {
    words: Vec<String>,
    warning: String,
}

impl BannedWords {
    pub fn new<I, S>(words: I, warning: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
            warning: warning.into(),
        }
    }

    pub fn from_config(config: &ModerationConfig) -> Self {
        Self::new(&config.bad_words, config.warning.clone())
    }

    /// First banned word contained in `text`, ignoring case
    pub fn check(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.words
            .iter()
            .find(|word| lowered.contains(word.as_str()))
            .map(String::as_str)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn warning(&self) -> &str {
        &self.warning
    }
}

impl Default for BannedWords {
    fn default() -> Self {
        Self::from_config(&ModerationConfig::default())
    }
}

/// Comment create/edit form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
    #[serde(skip_deserializing)]
    pub errors: FormErrors,
}

impl CommentForm {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            errors: FormErrors::default(),
        }
    }

    /// Validate the form, trimming the text; returns true when it is valid.
    pub fn validate(&mut self, banned: &BannedWords) -> bool {
        self.errors = FormErrors::default();
        self.text = self.text.trim().to_string();

        if self.text.is_empty() {
            self.errors.add("text", REQUIRED_FIELD);
        } else if let Some(word) = banned.check(&self.text) {
            tracing::debug!("Comment rejected for banned word {:?}", word);
            self.errors.add("text", banned.warning());
        }

        self.errors.is_empty()
    }
}

/// Signup form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password1: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
    #[serde(skip_deserializing)]
    pub errors: FormErrors,
}

impl SignupForm {
    pub fn validate(&mut self) -> bool {
        self.errors = FormErrors::default();
        self.username = self.username.trim().to_string();

        let username_length = self.username.chars().count();
        if username_length == 0 {
            self.errors.add("username", REQUIRED_FIELD);
        } else if username_length > USERNAME_MAX_LENGTH {
            self.errors.add(
                "username",
                format!(
                    "Убедитесь, что это значение содержит не более {} символов (сейчас {}).",
                    USERNAME_MAX_LENGTH, username_length
                ),
            );
        }

        if self.password1.is_empty() {
            self.errors.add("password1", REQUIRED_FIELD);
        }
        if self.password2.is_empty() {
            self.errors.add("password2", REQUIRED_FIELD);
        } else if !self.password1.is_empty() && self.password1 != self.password2 {
            self.errors.add("password2", PASSWORD_MISMATCH);
        }

        self.errors.is_empty()
    }
}

/// Login form; `next` carries the page to return to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(skip_deserializing)]
    pub errors: FormErrors,
}

impl LoginForm {
    pub fn validate(&mut self) -> bool {
        self.errors = FormErrors::default();
        self.username = self.username.trim().to_string();

        if self.username.is_empty() {
            self.errors.add("username", REQUIRED_FIELD);
        }
        if self.password.is_empty() {
            self.errors.add("password", REQUIRED_FIELD);
        }

        self.errors.is_empty()
    }

    /// Record that the credentials did not match a user
    pub fn reject_credentials(&mut self) {
        self.errors.add_non_field(INVALID_LOGIN);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn banned() -> BannedWords {
        BannedWords::new(["редиска", "негодяй"], "Не ругайтесь!")
    }

    #[test]
    fn test_valid_comment() {
        let mut form = CommentForm::new("  Текст комментария  ");
        assert!(form.validate(&banned()));
        assert_eq!(form.text, "Текст комментария");
        assert!(form.errors.is_empty());
    }

    #[test]
    fn test_empty_comment_is_required() {
        let mut form = CommentForm::new("   ");
        assert!(!form.validate(&banned()));
        assert!(form.errors.has("text", REQUIRED_FIELD));
    }

    #[test]
    fn test_banned_word_ignores_case() {
        let mut form = CommentForm::new("Какой же ты НЕГОДЯЙ");
        assert!(!form.validate(&banned()));
        assert_eq!(form.errors.field("text"), ["Не ругайтесь!".to_string()]);
    }

    #[test]
    fn test_banned_word_as_substring() {
        assert_eq!(banned().check("редиски растут"), None);
        assert_eq!(banned().check("эта редиска"), Some("редиска"));
        assert_eq!(banned().check("суперредиска"), Some("редиска"));
    }

    #[test]
    fn test_banned_words_from_default_config() {
        let words = BannedWords::default();
        assert_eq!(words.words(), ["редиска", "негодяй"]);
        assert_eq!(words.warning(), "Не ругайтесь!");
    }

    #[test]
    fn test_signup_password_mismatch() {
        let mut form = SignupForm {
            username: "Автор".to_string(),
            password1: "secret-one".to_string(),
            password2: "secret-two".to_string(),
            ..Default::default()
        };
        assert!(!form.validate());
        assert!(form.errors.has("password2", PASSWORD_MISMATCH));
    }

    #[test]
    fn test_signup_username_too_long() {
        let mut form = SignupForm {
            username: "я".repeat(USERNAME_MAX_LENGTH + 1),
            password1: "pass".to_string(),
            password2: "pass".to_string(),
            ..Default::default()
        };
        assert!(!form.validate());
        assert_eq!(form.errors.field("username").len(), 1);
    }

    #[test]
    fn test_signup_missing_fields() {
        let mut form = SignupForm::default();
        assert!(!form.validate());
        for field in ["username", "password1", "password2"] {
            assert!(form.errors.has(field, REQUIRED_FIELD), "{} should be required", field);
        }
    }

    #[test]
    fn test_signup_passwords_not_serialized() {
        let form = SignupForm {
            username: "Автор".to_string(),
            password1: "hunter2".to_string(),
            password2: "hunter2".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&form).unwrap();
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_login_form() {
        let mut form = LoginForm {
            username: "Автор".to_string(),
            password: "pass".to_string(),
            ..Default::default()
        };
        assert!(form.validate());

        form.reject_credentials();
        assert_eq!(form.errors.non_field, vec![INVALID_LOGIN.to_string()]);
    }

    proptest! {
        /// Any text around a banned word, in any case, is rejected with the warning
        #[test]
        fn banned_word_anywhere_is_rejected(
            prefix in "[a-zа-я ]{0,20}",
            suffix in "[a-zа-я ]{0,20}",
            word_index in 0usize..2,
            upper in any::<bool>(),
        ) {
            let banned = banned();
            let word = &banned.words()[word_index];
            let word = if upper { word.to_uppercase() } else { word.clone() };

            let mut form = CommentForm::new(format!("{}{}{}", prefix, word, suffix));
            prop_assert!(!form.validate(&banned));
            prop_assert!(form.errors.has("text", banned.warning()));
        }

        /// Text without Cyrillic letters never trips the default list
        #[test]
        fn latin_text_is_accepted(text in "[a-zA-Z0-9][a-zA-Z0-9 .,!?]{0,60}") {
            let mut form = CommentForm::new(text);
            prop_assert!(form.validate(&banned()));
        }
    }
}
