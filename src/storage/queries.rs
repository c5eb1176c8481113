//! Database queries for clubs, users, posts and notifications

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{ClubhubError, Result};
use crate::types::*;

/// Column list shared by every post query
pub(crate) const POST_COLUMNS: &str =
    "p.id, p.club_id, p.title, p.content, p.image_url, p.post_type, p.is_form, p.published_at";

/// Parse a post from a database row
pub fn post_from_row(row: &Row) -> rusqlite::Result<Post> {
    let post_type: String = row.get("post_type")?;
    let is_form: i64 = row.get("is_form")?;
    let published_at: String = row.get("published_at")?;

    Ok(Post {
        id: row.get("id")?,
        club_id: row.get("club_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        image_url: row.get("image_url")?,
        post_type: post_type.parse().unwrap_or_default(),
        is_form: is_form != 0,
        published_at: parse_timestamp(&published_at),
    })
}

fn club_from_row(row: &Row) -> rusqlite::Result<Club> {
    let created_at: String = row.get("created_at")?;
    Ok(Club {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        avatar_url: row.get("avatar_url")?,
        created_at: parse_timestamp(&created_at),
    })
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    let created_at: String = row.get("created_at")?;
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        created_at: parse_timestamp(&created_at),
    })
}

fn subscription_from_row(row: &Row) -> rusqlite::Result<Subscription> {
    let enabled: i64 = row.get("notifications_enabled")?;
    let created_at: String = row.get("created_at")?;
    Ok(Subscription {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        club_id: row.get("club_id")?,
        notifications_enabled: enabled != 0,
        created_at: parse_timestamp(&created_at),
    })
}

fn notification_from_row(row: &Row) -> rusqlite::Result<Notification> {
    let is_read: i64 = row.get("is_read")?;
    let created_at: String = row.get("created_at")?;
    Ok(Notification {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        club_id: row.get("club_id")?,
        post_id: row.get("post_id")?,
        text: row.get("text")?,
        is_read: is_read != 0,
        created_at: parse_timestamp(&created_at),
    })
}

// ============================================================================
// Clubs
// ============================================================================

/// Create a club
pub fn create_club(conn: &Connection, input: &CreateClubInput) -> Result<Club> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ClubhubError::InvalidInput(
            "club name must not be empty".to_string(),
        ));
    }

    conn.execute(
        "INSERT INTO clubs (name, description, avatar_url, created_at) VALUES (?, ?, ?, ?)",
        params![
            name,
            input.description,
            input.avatar_url,
            format_timestamp(&Utc::now())
        ],
    )?;

    get_club(conn, conn.last_insert_rowid())
}

/// Get a club by ID
pub fn get_club(conn: &Connection, id: ClubId) -> Result<Club> {
    conn.query_row(
        "SELECT id, name, description, avatar_url, created_at FROM clubs WHERE id = ?",
        [id],
        club_from_row,
    )
    .optional()?
    .ok_or_else(|| ClubhubError::not_found("club", id))
}

/// List all clubs by name
pub fn list_clubs(conn: &Connection) -> Result<Vec<Club>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, name, description, avatar_url, created_at FROM clubs ORDER BY name, id",
    )?;
    let clubs = stmt
        .query_map([], club_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(clubs)
}

// ============================================================================
// Users
// ============================================================================

/// Create a user
pub fn create_user(conn: &Connection, username: &str) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ClubhubError::InvalidInput(
            "username must not be empty".to_string(),
        ));
    }

    conn.execute(
        "INSERT INTO users (username, created_at) VALUES (?, ?)",
        params![username, format_timestamp(&Utc::now())],
    )?;

    get_user(conn, conn.last_insert_rowid())
}

/// Get a user by ID
pub fn get_user(conn: &Connection, id: UserId) -> Result<User> {
    conn.query_row(
        "SELECT id, username, created_at FROM users WHERE id = ?",
        [id],
        user_from_row,
    )
    .optional()?
    .ok_or_else(|| ClubhubError::not_found("user", id))
}

// ============================================================================
// Posts
// ============================================================================

/// Create a post and notify every subscriber of its club who has
/// notifications switched on.
///
/// Run inside a transaction so the post and its notifications land together.
pub fn create_post(conn: &Connection, input: &CreatePostInput) -> Result<Post> {
    if input.title.trim().is_empty() {
        return Err(ClubhubError::InvalidInput(
            "post title must not be empty".to_string(),
        ));
    }
    // Surface a missing club as NotFound rather than a constraint failure
    get_club(conn, input.club_id)?;

    let published_at = input.published_at.unwrap_or_else(Utc::now);

    conn.execute(
        "INSERT INTO posts (club_id, title, content, image_url, post_type, is_form, published_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            input.club_id,
            input.title,
            input.content,
            input.image_url,
            input.post_type.as_str(),
            input.is_form,
            format_timestamp(&published_at),
        ],
    )?;

    let post = get_post(conn, conn.last_insert_rowid())?;
    let notified = notify_subscribers(conn, &post)?;
    tracing::debug!(post_id = post.id, notified, "post created");

    Ok(post)
}

/// Get a post by ID
pub fn get_post(conn: &Connection, id: PostId) -> Result<Post> {
    let sql = format!("SELECT {} FROM posts p WHERE p.id = ?", POST_COLUMNS);
    conn.query_row(&sql, [id], post_from_row)
        .optional()?
        .ok_or_else(|| ClubhubError::not_found("post", id))
}

/// Delete a post
pub fn delete_post(conn: &Connection, id: PostId) -> Result<()> {
    let affected = conn.execute("DELETE FROM posts WHERE id = ?", [id])?;
    if affected == 0 {
        return Err(ClubhubError::not_found("post", id));
    }
    Ok(())
}

// ============================================================================
// Subscriptions & notifications
// ============================================================================

/// Subscribe a user to a club, or update the notification flag of an
/// existing subscription
pub fn subscribe(
    conn: &Connection,
    user_id: UserId,
    club_id: ClubId,
    notifications_enabled: bool,
) -> Result<Subscription> {
    get_user(conn, user_id)?;
    get_club(conn, club_id)?;

    conn.execute(
        "INSERT INTO subscriptions (user_id, club_id, notifications_enabled, created_at)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(user_id, club_id) DO UPDATE SET
            notifications_enabled = excluded.notifications_enabled",
        params![
            user_id,
            club_id,
            notifications_enabled,
            format_timestamp(&Utc::now())
        ],
    )?;

    let sub = conn.query_row(
        "SELECT id, user_id, club_id, notifications_enabled, created_at
         FROM subscriptions WHERE user_id = ? AND club_id = ?",
        params![user_id, club_id],
        subscription_from_row,
    )?;
    Ok(sub)
}

/// Remove a subscription; returns whether one existed
pub fn unsubscribe(conn: &Connection, user_id: UserId, club_id: ClubId) -> Result<bool> {
    let affected = conn.execute(
        "DELETE FROM subscriptions WHERE user_id = ? AND club_id = ?",
        params![user_id, club_id],
    )?;
    Ok(affected > 0)
}

/// Subscriptions of one user
pub fn list_subscriptions(conn: &Connection, user_id: UserId) -> Result<Vec<Subscription>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, user_id, club_id, notifications_enabled, created_at
         FROM subscriptions WHERE user_id = ? ORDER BY id",
    )?;
    let subs = stmt
        .query_map([user_id], subscription_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(subs)
}

/// Bulk-insert one notification per opted-in subscriber of the post's club.
///
/// Best effort: no ordering between recipients and no delivery tracking.
pub fn notify_subscribers(conn: &Connection, post: &Post) -> Result<usize> {
    let inserted = conn.execute(
        "INSERT INTO notifications (user_id, club_id, post_id, text, created_at)
         SELECT s.user_id, s.club_id, ?, ?, ?
         FROM subscriptions s
         WHERE s.club_id = ? AND s.notifications_enabled = 1",
        params![
            post.id,
            format!("New post: {}", post.title),
            format_timestamp(&Utc::now()),
            post.club_id
        ],
    )?;
    Ok(inserted)
}

/// Notifications of one user, newest first
pub fn list_notifications(
    conn: &Connection,
    user_id: UserId,
    unread_only: bool,
) -> Result<Vec<Notification>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, user_id, club_id, post_id, text, is_read, created_at
         FROM notifications
         WHERE user_id = ? AND (? = 0 OR is_read = 0)
         ORDER BY created_at DESC, id DESC",
    )?;
    let notifications = stmt
        .query_map(params![user_id, unread_only], notification_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(notifications)
}

/// Mark a user's notification as read
pub fn mark_notification_read(conn: &Connection, user_id: UserId, id: i64) -> Result<()> {
    let affected = conn.execute(
        "UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?",
        params![id, user_id],
    )?;
    if affected == 0 {
        return Err(ClubhubError::not_found("notification", id));
    }
    Ok(())
}

// ============================================================================
// Stats
// ============================================================================

/// Platform-wide counters
pub fn platform_stats(conn: &Connection) -> Result<PlatformStats> {
    let stats = conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM clubs),
            (SELECT COUNT(*) FROM posts),
            (SELECT COUNT(*) FROM posts WHERE post_type = 'event' OR is_form = 1),
            (SELECT COUNT(*) FROM users)",
        [],
        |row| {
            Ok(PlatformStats {
                clubs: row.get(0)?,
                posts: row.get(1)?,
                events: row.get(2)?,
                users: row.get(3)?,
            })
        },
    )?;
    Ok(stats)
}
