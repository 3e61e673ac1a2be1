//! Form validation for tweets and sign-ups.
//!
//! Errors are collected per field so a rejected form can be re-rendered with
//! every message next to its input.

use crate::models::{AppData, SignUpForm};
use std::collections::{BTreeMap, HashMap};

pub const TWEET_MAX_CHARS: usize = 200;
pub const USERNAME_MAX_CHARS: usize = 150;
pub const PASSWORD_MIN_CHARS: usize = 8;

pub const REQUIRED: &str = "このフィールドは必須です。";
pub const DUPLICATE_USERNAME: &str = "同じユーザー名が既に登録済みです。";
pub const INVALID_USERNAME: &str =
    "有効なユーザー名を入力してください。この値は文字、数字、および @/./+/-/_ のみを含めることができます。";
pub const INVALID_EMAIL: &str = "有効なメールアドレスを入力してください。";
pub const PASSWORD_MISMATCH: &str = "確認用パスワードが一致しません。";
pub const PASSWORD_NUMERIC: &str = "このパスワードは数字しか使われていません。";
pub const PASSWORD_SIMILAR: &str = "このパスワードは ユーザー名 と似すぎています。";

const SIMILARITY_LIMIT: f64 = 0.7;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Returns the trimmed tweet body.
pub fn validate_tweet(content: &str) -> Result<String, FormErrors> {
    let mut errors = FormErrors::default();
    let content = content.trim();
    let length = content.chars().count();
    if length == 0 {
        errors.add("content", REQUIRED);
    } else if length > TWEET_MAX_CHARS {
        errors.add(
            "content",
            format!("この値は {TWEET_MAX_CHARS} 文字以下でなければなりません( {length} 文字になっています)。"),
        );
    }

    if errors.is_empty() {
        Ok(content.to_string())
    } else {
        Err(errors)
    }
}

pub fn validate_signup(form: &SignUpForm, data: &AppData) -> FormErrors {
    let mut errors = FormErrors::default();
    let username = form.username.trim();
    let email = form.email.trim();

    if username.is_empty() {
        errors.add("username", REQUIRED);
    } else if !valid_username(username) {
        errors.add("username", INVALID_USERNAME);
    } else if data.users.contains_key(username) {
        errors.add("username", DUPLICATE_USERNAME);
    }

    if email.is_empty() {
        errors.add("email", REQUIRED);
    } else if !valid_email(email) {
        errors.add("email", INVALID_EMAIL);
    }

    if form.password1.is_empty() {
        errors.add("password1", REQUIRED);
    }
    if form.password2.is_empty() {
        errors.add("password2", REQUIRED);
    }
    if form.password1.is_empty() || form.password2.is_empty() {
        return errors;
    }

    if form.password1 != form.password2 {
        errors.add("password2", PASSWORD_MISMATCH);
        return errors;
    }

    for message in password_problems(&form.password2, username) {
        errors.add("password2", message);
    }
    errors
}

fn password_problems(password: &str, username: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if !username.is_empty() && similarity(password, username) >= SIMILARITY_LIMIT {
        problems.push(PASSWORD_SIMILAR.to_string());
    }
    if password.chars().count() < PASSWORD_MIN_CHARS {
        problems.push(format!(
            "このパスワードは短すぎます。最低 {PASSWORD_MIN_CHARS} 文字以上必要です。"
        ));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        problems.push(PASSWORD_NUMERIC.to_string());
    }
    problems
}

fn valid_username(username: &str) -> bool {
    username.chars().count() <= USERNAME_MAX_CHARS
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

fn valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Case-insensitive, order-free match ratio: `2 * shared / (len(a) + len(b))`,
/// where `shared` counts characters present in both strings.
fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 1.0;
    }

    let mut available: HashMap<char, usize> = HashMap::new();
    for c in b.chars() {
        *available.entry(c).or_default() += 1;
    }
    let mut shared = 0usize;
    for c in a.chars() {
        if let Some(count) = available.get_mut(&c) {
            if *count > 0 {
                *count -= 1;
                shared += 1;
            }
        }
    }

    2.0 * shared as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(username: &str, email: &str, password1: &str, password2: &str) -> SignUpForm {
        SignUpForm {
            username: username.into(),
            email: email.into(),
            password1: password1.into(),
            password2: password2.into(),
            csrfmiddlewaretoken: String::new(),
        }
    }

    #[test]
    fn tweet_content_is_required() {
        let errors = validate_tweet("   ").unwrap_err();
        assert_eq!(errors.get("content"), [REQUIRED]);
    }

    #[test]
    fn tweet_content_is_capped() {
        let errors = validate_tweet(&"a".repeat(500)).unwrap_err();
        assert_eq!(
            errors.get("content"),
            ["この値は 200 文字以下でなければなりません( 500 文字になっています)。"]
        );
        assert!(validate_tweet(&"あ".repeat(200)).is_ok());
    }

    #[test]
    fn valid_signup_has_no_errors() {
        let errors = validate_signup(
            &signup("testuser", "test@test.com", "Qaz105edc", "Qaz105edc"),
            &AppData::default(),
        );
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn empty_signup_flags_every_field() {
        let errors = validate_signup(&signup("", "", "", ""), &AppData::default());
        for field in ["username", "email", "password1", "password2"] {
            assert_eq!(errors.get(field), [REQUIRED], "{field}");
        }
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let mut data = AppData::default();
        data.users.insert(
            "yamada".into(),
            crate::models::User {
                username: "yamada".into(),
                email: "tests4@icloud.com".into(),
                password_hash: String::new(),
                salt: String::new(),
                date_joined: chrono::Utc::now(),
            },
        );
        let errors = validate_signup(
            &signup("yamada", "tests4@icloud.com", "QaZ105edc", "QaZ105edc"),
            &data,
        );
        assert_eq!(errors.get("username"), [DUPLICATE_USERNAME]);
    }

    #[test]
    fn malformed_email_and_username_are_rejected() {
        let errors = validate_signup(
            &signup("bad name", "tests5icloud.com", "Qaz105Edc", "Qaz105Edc"),
            &AppData::default(),
        );
        assert_eq!(errors.get("email"), [INVALID_EMAIL]);
        assert_eq!(errors.get("username"), [INVALID_USERNAME]);
    }

    #[test]
    fn password_rules() {
        let data = AppData::default();

        let errors = validate_signup(&signup("yamamoto", "a@b.jp", "a1B", "a1B"), &data);
        assert_eq!(
            errors.get("password2"),
            ["このパスワードは短すぎます。最低 8 文字以上必要です。"]
        );

        let errors = validate_signup(&signup("takedabc", "a@b.jp", "takedabc", "takedabc"), &data);
        assert_eq!(errors.get("password2"), [PASSWORD_SIMILAR]);

        let errors = validate_signup(&signup("saito", "a@b.jp", "12481632", "12481632"), &data);
        assert_eq!(errors.get("password2"), [PASSWORD_NUMERIC]);

        let errors = validate_signup(&signup("sakurai", "a@b.jp", "Qaz105edc", "Qaz105eee"), &data);
        assert_eq!(errors.get("password2"), [PASSWORD_MISMATCH]);
    }

    #[test]
    fn reversed_username_is_too_similar() {
        let errors = validate_signup(
            &signup("abcdefghij", "a@b.jp", "jihgfedcba", "jihgfedcba"),
            &AppData::default(),
        );
        assert_eq!(errors.get("password2"), [PASSWORD_SIMILAR]);
    }

    #[test]
    fn similarity_is_case_insensitive() {
        assert_eq!(similarity("TakedaBC", "takedabc"), 1.0);
        assert!(similarity("Qaz105edc", "sakurai") < SIMILARITY_LIMIT);
    }
}
