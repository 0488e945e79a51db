//! Data models for marq
//!
//! Defines the bookmark record, the identity returned by the auth
//! lookup, and the change events delivered by the feed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A saved bookmark
///
/// `id` and `created_at` are assigned by the remote store at creation
/// time; clients never pick them. `owner` scopes the row to the user
/// who created it and is not editable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bookmark {
    /// Unique identifier, store-assigned
    pub id: Uuid,
    /// Identity of the creating user
    pub owner: Uuid,
    /// Absolute URL
    pub url: String,
    /// Display title
    pub title: String,
    /// When the store created this row
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    /// Create a bookmark with a fresh id and timestamp
    ///
    /// Only store implementations assign ids, so this lives on the
    /// model for their benefit (and for tests).
    pub fn new(owner: Uuid, url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            url: url.into(),
            title: title.into(),
            created_at: Utc::now(),
        }
    }
}

/// Request body for creating a bookmark
///
/// `url` and `title` are already trimmed and validated by the time
/// this is built; see `session::validate_submission`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBookmark {
    pub url: String,
    pub title: String,
    pub owner: Uuid,
}

/// The signed-in user as reported by the identity lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// A change to the bookmarks table, as delivered by the feed
///
/// Delete events carry only the row id: the store does not replay the
/// full row for removed entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    Insert { record: Bookmark },
    Update { record: Bookmark },
    Delete { id: Uuid },
}
