//! Event merge rules for the in-memory collection
//!
//! `BookmarkList` is the single ordered, duplicate-free view of the
//! user's bookmarks for a session. It is a pure merge function over the
//! snapshot and events it is given: it never issues store calls.
//!
//! The feed delivers events at-least-once and may interleave them
//! arbitrarily with local request completions, so insert and delete are
//! both idempotent. A redelivered insert is a no-op; a delete for a row
//! already gone is a no-op.

use uuid::Uuid;

use crate::models::{Bookmark, ChangeEvent};

/// Ordered, duplicate-free bookmark collection for one session
#[derive(Debug, Default)]
pub struct BookmarkList {
    items: Vec<Bookmark>,
}

impl BookmarkList {
    /// Adopt an initial snapshot, already sorted newest-first by the caller
    pub fn new(initial: Vec<Bookmark>) -> Self {
        Self { items: initial }
    }

    /// Apply an insert event
    ///
    /// No-op if a record with the same id is already present. New
    /// arrivals always go to the head, even when their `created_at` is
    /// older than existing entries: the list reads "most recently
    /// arrived first", not strictly timestamp-sorted.
    ///
    /// Returns whether the collection changed.
    pub fn apply_insert(&mut self, record: Bookmark) -> bool {
        if self.items.iter().any(|b| b.id == record.id) {
            return false;
        }
        self.items.insert(0, record);
        true
    }

    /// Apply an update event, replacing the matching record in place
    ///
    /// No-op if the id is unknown; updates for rows this session never
    /// observed are not promoted to inserts.
    pub fn apply_update(&mut self, record: Bookmark) -> bool {
        match self.items.iter_mut().find(|b| b.id == record.id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Apply a delete event
    ///
    /// No-op, not an error, if the id is absent. Absence is expected
    /// when the deletion was already applied or refers to a row this
    /// session never saw.
    pub fn apply_delete(&mut self, id: &Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|b| b.id != *id);
        self.items.len() != before
    }

    /// Apply a feed event, returning whether the collection changed
    pub fn apply(&mut self, event: ChangeEvent) -> bool {
        match event {
            ChangeEvent::Insert { record } => self.apply_insert(record),
            ChangeEvent::Update { record } => self.apply_update(record),
            ChangeEvent::Delete { id } => self.apply_delete(&id),
        }
    }

    /// Replace the whole collection, used after a reconnect re-fetch
    pub fn reset(&mut self, items: Vec<Bookmark>) {
        self.items = items;
    }

    /// Point-in-time copy of the collection
    ///
    /// The copy reflects state at the moment of return only; mutating
    /// it has no effect on the collection.
    pub fn snapshot(&self) -> Vec<Bookmark> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a record by id
    pub fn get(&self, id: &Uuid) -> Option<&Bookmark> {
        self.items.iter().find(|b| b.id == *id)
    }
}
