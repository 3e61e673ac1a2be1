use crate::cookies::{self, SESSION_COOKIE};
use crate::errors::AppError;
use crate::models::User;
use crate::state::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, HeaderValue, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

pub const LOGIN_PATH: &str = "/accounts/login/";
pub const HOME_PATH: &str = "/tweets/home/";

pub fn new_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn hash_password(password: &str, salt: &str) -> String {
    let digest = Sha256::new()
        .chain_update(salt.as_bytes())
        .chain_update(password.as_bytes())
        .finalize();
    format!("{digest:x}")
}

pub fn verify_password(user: &User, password: &str) -> bool {
    hash_password(password, &user.salt) == user.password_hash
}

/// Opens a session for `username` and returns the `Set-Cookie` value for it.
pub async fn start_session(state: &AppState, username: &str) -> Result<HeaderValue, AppError> {
    let session_id = Uuid::new_v4().simple().to_string();
    let cookie = cookies::set_cookie(SESSION_COOKIE, &session_id, true).map_err(AppError::internal)?;
    state
        .sessions
        .lock()
        .await
        .insert(session_id, username.to_string());
    info!(%username, "session started");
    Ok(cookie)
}

pub async fn end_session(state: &AppState, headers: &HeaderMap) {
    if let Some(session_id) = cookies::from_headers(headers, SESSION_COOKIE) {
        if let Some(username) = state.sessions.lock().await.remove(&session_id) {
            info!(%username, "session ended");
        }
    }
}

/// Only same-site absolute paths are honoured as a post-login target.
///
/// Browsers read `/\host` as `//host`, so a backslash after the leading
/// slash is refused along with any control character.
pub fn safe_next(next: &str) -> &str {
    let local = next.starts_with('/')
        && !next.starts_with("//")
        && !next.starts_with("/\\")
        && !next.chars().any(char::is_control);
    if local { next } else { HOME_PATH }
}

pub fn login_url(next: &str) -> String {
    format!("{LOGIN_PATH}?next={}", utf8_percent_encode(next, NON_ALPHANUMERIC))
}

/// The logged-in user. Requests without a live session are sent to the login page.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(session_id) = cookies::from_headers(&parts.headers, SESSION_COOKIE) {
            if let Some(username) = state.sessions.lock().await.get(&session_id) {
                return Ok(CurrentUser {
                    username: username.clone(),
                });
            }
        }

        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or(HOME_PATH);
        Err(Redirect::to(&login_url(next)).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn password_round_trips_through_salted_hash() {
        let salt = new_salt();
        let user = User {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password_hash: hash_password("correct horse", &salt),
            salt,
            date_joined: Utc::now(),
        };
        assert!(verify_password(&user, "correct horse"));
        assert!(!verify_password(&user, "correct horsE"));
    }

    #[test]
    fn same_password_differs_across_salts() {
        assert_ne!(hash_password("pw", "a"), hash_password("pw", "b"));
        assert_eq!(hash_password("pw", "a").len(), 64);
    }

    #[test]
    fn next_must_stay_on_site() {
        assert_eq!(safe_next("/tweets/3/"), "/tweets/3/");
        assert_eq!(safe_next("//evil.example"), HOME_PATH);
        assert_eq!(safe_next("https://evil.example"), HOME_PATH);
        assert_eq!(safe_next(""), HOME_PATH);
        assert_eq!(safe_next("/\\evil.example"), HOME_PATH);
        assert_eq!(safe_next("/\tevil.example"), HOME_PATH);
        assert_eq!(safe_next("/tweets/\x00"), HOME_PATH);
        assert_eq!(safe_next("/search?q=a\\b"), "/search?q=a\\b");
    }

    #[test]
    fn login_url_encodes_next() {
        assert_eq!(
            login_url("/tweets/home/"),
            "/accounts/login/?next=%2Ftweets%2Fhome%2F"
        );
    }
}
