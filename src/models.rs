use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub date_joined: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
    pub id: u64,
    pub username: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub username: String,
    pub tweet_id: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendShip {
    pub follower: String,
    pub following: String,
    pub created_at: DateTime<Utc>,
}

/// Everything the board persists, written to disk as a single JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppData {
    pub users: BTreeMap<String, User>,
    pub tweets: BTreeMap<u64, Tweet>,
    pub likes: Vec<Like>,
    pub friendships: Vec<FriendShip>,
    pub next_tweet_id: u64,
}

impl AppData {
    pub fn insert_tweet(&mut self, username: &str, content: &str) -> Tweet {
        self.next_tweet_id = self.next_tweet_id.saturating_add(1);
        let tweet = Tweet {
            id: self.next_tweet_id,
            username: username.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.tweets.insert(tweet.id, tweet.clone());
        tweet
    }

    pub fn remove_tweet(&mut self, tweet_id: u64) -> Option<Tweet> {
        let removed = self.tweets.remove(&tweet_id)?;
        self.likes.retain(|like| like.tweet_id != tweet_id);
        Some(removed)
    }

    /// Tweets ordered newest first, optionally restricted to one author.
    pub fn timeline(&self, author: Option<&str>) -> Vec<&Tweet> {
        let mut tweets: Vec<&Tweet> = self
            .tweets
            .values()
            .filter(|tweet| author.is_none_or(|name| tweet.username == name))
            .collect();
        tweets.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        tweets
    }

    pub fn is_following(&self, follower: &str, following: &str) -> bool {
        self.friendships
            .iter()
            .any(|f| f.follower == follower && f.following == following)
    }

    /// Relations `username` started, newest first; ties keep the later insert first.
    pub fn following_of(&self, username: &str) -> Vec<&FriendShip> {
        let mut list: Vec<&FriendShip> = self
            .friendships
            .iter()
            .rev()
            .filter(|f| f.follower == username)
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    pub fn followers_of(&self, username: &str) -> Vec<&FriendShip> {
        let mut list: Vec<&FriendShip> = self
            .friendships
            .iter()
            .rev()
            .filter(|f| f.following == username)
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }
}

/// Reply of the like and unlike endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub tweet_id: u64,
    pub is_liked: bool,
    pub liked_count: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct TweetForm {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub csrfmiddlewaretoken: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
    #[serde(default)]
    pub csrfmiddlewaretoken: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: String,
    #[serde(default)]
    pub csrfmiddlewaretoken: String,
}

/// Body of the plain POST forms (delete, follow, logout) that only carry the token.
#[derive(Debug, Default, Deserialize)]
pub struct TokenForm {
    #[serde(default)]
    pub csrfmiddlewaretoken: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removing_a_tweet_drops_its_likes() {
        let mut data = AppData::default();
        let first = data.insert_tweet("alice", "one");
        let second = data.insert_tweet("alice", "two");
        for tweet_id in [first.id, second.id] {
            data.likes.push(Like {
                username: "bob".into(),
                tweet_id,
                created_at: Utc::now(),
            });
        }

        assert!(data.remove_tweet(first.id).is_some());
        assert_eq!(data.likes.len(), 1);
        assert_eq!(data.likes[0].tweet_id, second.id);
        assert!(data.remove_tweet(first.id).is_none());
    }

    #[test]
    fn relations_are_newest_first() {
        let mut data = AppData::default();
        let earlier = Utc::now() - chrono::Duration::minutes(5);
        let later = Utc::now();
        for (follower, following, created_at) in [
            ("alice", "bob", earlier),
            ("alice", "carol", later),
            ("dave", "bob", later),
        ] {
            data.friendships.push(FriendShip {
                follower: follower.into(),
                following: following.into(),
                created_at,
            });
        }

        let following: Vec<&str> = data
            .following_of("alice")
            .iter()
            .map(|f| f.following.as_str())
            .collect();
        assert_eq!(following, vec!["carol", "bob"]);

        let followers: Vec<&str> = data
            .followers_of("bob")
            .iter()
            .map(|f| f.follower.as_str())
            .collect();
        assert_eq!(followers, vec!["dave", "alice"]);
        assert!(data.is_following("alice", "carol"));
        assert!(!data.is_following("carol", "alice"));
    }

    #[test]
    fn timeline_is_newest_first() {
        let mut data = AppData::default();
        data.insert_tweet("alice", "first");
        data.insert_tweet("bob", "second");
        data.insert_tweet("alice", "third");

        let all: Vec<&str> = data.timeline(None).iter().map(|t| t.content.as_str()).collect();
        assert_eq!(all, vec!["third", "second", "first"]);

        let alice: Vec<&str> = data
            .timeline(Some("alice"))
            .iter()
            .map(|t| t.content.as_str())
            .collect();
        assert_eq!(alice, vec!["third", "first"]);
    }
}
