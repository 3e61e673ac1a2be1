//! The like/unlike toggle as seen from the page.
//!
//! [`LikeButton`] holds what the page shows for one tweet: the button label,
//! the URL the next click posts to and the counter text. The server renders
//! buttons from it and [`LikeClient::toggle`] patches it from the server's
//! reply, the same way `like.js` patches the DOM.

use crate::cookies::{self, CSRF_COOKIE};
use crate::csrf::CSRF_HEADER;
use crate::models::LikeState;
use reqwest::{Client, header::CONTENT_TYPE};
use thiserror::Error;
use tracing::debug;

pub const LIKE_LABEL: &str = "いいね";
pub const UNLIKE_LABEL: &str = "いいね解除";
pub const COUNT_PREFIX: &str = "いいね数";

pub fn like_url(tweet_id: u64) -> String {
    format!("/tweets/{tweet_id}/like/")
}

pub fn unlike_url(tweet_id: u64) -> String {
    format!("/tweets/{tweet_id}/unlike/")
}

pub fn count_text(liked_count: u64) -> String {
    format!("{COUNT_PREFIX} {liked_count}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeButton {
    pub tweet_id: u64,
    /// `data-url`: where the next click is sent.
    pub url: String,
    pub label: String,
    /// Text of the `#count_{tweet_id}` node.
    pub count_text: String,
}

impl LikeButton {
    pub fn for_state(state: &LikeState) -> Self {
        let mut button = Self {
            tweet_id: state.tweet_id,
            url: String::new(),
            label: String::new(),
            count_text: String::new(),
        };
        button.apply(state);
        button
    }

    pub fn counter_id(&self) -> String {
        format!("count_{}", self.tweet_id)
    }

    /// Rewrites label, target URL and counter from a server reply.
    pub fn apply(&mut self, state: &LikeState) {
        self.tweet_id = state.tweet_id;
        if state.is_liked {
            self.url = unlike_url(state.tweet_id);
            self.label = UNLIKE_LABEL.to_string();
        } else {
            self.url = like_url(state.tweet_id);
            self.label = LIKE_LABEL.to_string();
        }
        self.count_text = count_text(state.liked_count);
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no csrftoken cookie available")]
    MissingToken,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Sends like/unlike clicks for one logged-in browser session.
///
/// The wrapped [`Client`] carries the session cookies; this type only adds
/// the CSRF header. One request per click, no retries.
#[derive(Debug, Clone)]
pub struct LikeClient {
    http: Client,
    base_url: String,
    csrf_token: String,
}

impl LikeClient {
    pub fn new(http: Client, base_url: impl Into<String>, csrf_token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            csrf_token: csrf_token.into(),
        }
    }

    pub fn from_cookie_header(
        http: Client,
        base_url: impl Into<String>,
        cookie_header: &str,
    ) -> Result<Self, ClientError> {
        let token = cookies::get_cookie(cookie_header, CSRF_COOKIE).ok_or(ClientError::MissingToken)?;
        Ok(Self::new(http, base_url, token))
    }

    pub async fn toggle(&self, button: &mut LikeButton) -> Result<LikeState, ClientError> {
        let url = format!("{}{}", self.base_url, button.url);
        debug!(%url, "sending like toggle");
        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(CSRF_HEADER, &self.csrf_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(err) => {
                    debug!(%status, "failed to read error body: {err}");
                    String::new()
                }
            };
            return Err(ClientError::Status { status, body });
        }

        let state: LikeState = response.json().await?;
        button.apply(&state);
        Ok(state)
    }
}
