//! Core types for Clubhub

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a club
pub type ClubId = i64;

/// Unique identifier for a post
pub type PostId = i64;

/// Unique identifier for a user
pub type UserId = i64;

/// A student organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: ClubId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
}

/// Kind of post a club publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    #[default]
    Post,
    Event,
    Announcement,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Post => "post",
            PostType::Event => "event",
            PostType::Announcement => "announcement",
        }
    }
}

impl std::fmt::Display for PostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "post" => Ok(PostType::Post),
            "event" => Ok(PostType::Event),
            "announcement" => Ok(PostType::Announcement),
            _ => Err(format!("Unknown post type: {}", s)),
        }
    }
}

/// A post published by a club; the unit that search ranks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub club_id: ClubId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(rename = "type", default)]
    pub post_type: PostType,
    /// Post carries a registration form
    #[serde(default)]
    pub is_form: bool,
    pub published_at: DateTime<Utc>,
}

impl Post {
    /// Events and form-bearing posts both show up in event listings
    pub fn is_event_like(&self) -> bool {
        self.post_type == PostType::Event || self.is_form
    }
}

/// A registered platform user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A user following a club
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: UserId,
    pub club_id: ClubId,
    pub notifications_enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification written for a subscriber when their club publishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: UserId,
    pub club_id: ClubId,
    pub post_id: Option<PostId>,
    pub text: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a club
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClubInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// Input for creating a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostInput {
    pub club_id: ClubId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(rename = "type", default)]
    pub post_type: PostType,
    #[serde(default)]
    pub is_form: bool,
    /// Override the publication time (imports and fixtures); defaults to now
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Restriction of the post set that search ranks over
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostFilter {
    pub club_id: Option<ClubId>,
    /// Raw type value; one that names no [`PostType`] matches no post
    pub post_type: Option<String>,
    pub is_form: Option<bool>,
    /// Only events or form-bearing posts
    #[serde(default)]
    pub event_like: bool,
}

impl PostFilter {
    /// Build a filter from raw query parameters, ignoring values that do not parse.
    ///
    /// The type is kept verbatim and compared exactly against stored types.
    pub fn from_params(
        club: Option<&str>,
        post_type: Option<&str>,
        is_form: Option<&str>,
        event_like: Option<&str>,
    ) -> Self {
        Self {
            club_id: club.and_then(|c| c.trim().parse().ok()),
            post_type: post_type.filter(|t| !t.is_empty()).map(str::to_string),
            is_form: is_form.and_then(parse_flag),
            event_like: event_like.and_then(parse_flag).unwrap_or(false),
        }
    }

    /// In-process evaluation of the filter
    pub fn matches(&self, post: &Post) -> bool {
        if let Some(club_id) = self.club_id {
            if post.club_id != club_id {
                return false;
            }
        }
        if self.event_like && !post.is_event_like() {
            return false;
        }
        if let Some(post_type) = &self.post_type {
            if post.post_type.as_str() != post_type {
                return false;
            }
        }
        if let Some(is_form) = self.is_form {
            if post.is_form != is_form {
                return false;
            }
        }
        true
    }
}

/// Parse a boolean query flag; anything unrecognised yields `None`
pub fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "True" => Some(true),
        "0" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Platform-wide counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub clubs: i64,
    pub posts: i64,
    pub events: i64,
    pub users: i64,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to SQLite database
    pub db_path: String,
    /// Storage mode (local or cloud-safe)
    #[serde(default)]
    pub storage_mode: StorageMode,
    /// Register the `similarity()` / `match_score()` SQL functions on open
    #[serde(default = "default_true")]
    pub trigram_functions: bool,
}

fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: ":memory:".to_string(),
            storage_mode: StorageMode::Local,
            trigram_functions: true,
        }
    }
}

/// Storage mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StorageMode {
    #[default]
    Local,
    CloudSafe,
}

impl std::str::FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageMode::Local),
            "cloud-safe" | "cloud_safe" => Ok(StorageMode::CloudSafe),
            _ => Err(format!("Unknown storage mode: {}", s)),
        }
    }
}

/// Fixed-width UTC timestamp so that text order equals time order in SQL
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp, falling back to the epoch for garbage
pub fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}
