use crate::errors::AppError;
use crate::models::{AppData, Like, LikeState};
use chrono::Utc;
use std::collections::HashSet;

pub fn like_count(data: &AppData, tweet_id: u64) -> u64 {
    data.likes.iter().filter(|like| like.tweet_id == tweet_id).count() as u64
}

pub fn liked_tweet_ids(data: &AppData, username: &str) -> HashSet<u64> {
    data.likes
        .iter()
        .filter(|like| like.username == username)
        .map(|like| like.tweet_id)
        .collect()
}

pub fn is_liked(data: &AppData, username: &str, tweet_id: u64) -> bool {
    data.likes
        .iter()
        .any(|like| like.username == username && like.tweet_id == tweet_id)
}

/// Records a like unless one already exists for this (tweet, user) pair.
pub fn like(data: &mut AppData, username: &str, tweet_id: u64) -> Result<LikeState, AppError> {
    ensure_tweet(data, tweet_id)?;
    if !is_liked(data, username, tweet_id) {
        data.likes.push(Like {
            username: username.to_string(),
            tweet_id,
            created_at: Utc::now(),
        });
    }
    Ok(LikeState {
        tweet_id,
        is_liked: true,
        liked_count: like_count(data, tweet_id),
    })
}

pub fn unlike(data: &mut AppData, username: &str, tweet_id: u64) -> Result<LikeState, AppError> {
    ensure_tweet(data, tweet_id)?;
    data.likes
        .retain(|like| !(like.username == username && like.tweet_id == tweet_id));
    Ok(LikeState {
        tweet_id,
        is_liked: false,
        liked_count: like_count(data, tweet_id),
    })
}

fn ensure_tweet(data: &AppData, tweet_id: u64) -> Result<(), AppError> {
    if data.tweets.contains_key(&tweet_id) {
        Ok(())
    } else {
        Err(AppError::not_found(format!("tweet {tweet_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn board() -> (AppData, u64) {
        let mut data = AppData::default();
        let tweet = data.insert_tweet("alice", "hello");
        (data, tweet.id)
    }

    #[test]
    fn like_is_idempotent() {
        let (mut data, id) = board();
        let first = like(&mut data, "bob", id).unwrap();
        let second = like(&mut data, "bob", id).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            second,
            LikeState {
                tweet_id: id,
                is_liked: true,
                liked_count: 1
            }
        );
    }

    #[test]
    fn count_spans_users() {
        let (mut data, id) = board();
        like(&mut data, "bob", id).unwrap();
        let state = like(&mut data, "carol", id).unwrap();
        assert_eq!(state.liked_count, 2);

        let state = unlike(&mut data, "bob", id).unwrap();
        assert!(!state.is_liked);
        assert_eq!(state.liked_count, 1);
        assert!(liked_tweet_ids(&data, "carol").contains(&id));
        assert!(liked_tweet_ids(&data, "bob").is_empty());
    }

    #[test]
    fn unlike_without_like_is_a_no_op() {
        let (mut data, id) = board();
        let state = unlike(&mut data, "bob", id).unwrap();
        assert_eq!(state.liked_count, 0);
        assert!(!state.is_liked);
    }

    #[test]
    fn unknown_tweet_is_not_found() {
        let (mut data, _) = board();
        let err = like(&mut data, "bob", 999).unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        let err = unlike(&mut data, "bob", 999).unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(data.likes.is_empty());
    }
}
