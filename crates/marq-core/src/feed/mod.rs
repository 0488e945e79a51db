//! Change-feed subscription
//!
//! A long-lived WebSocket subscription to the bookmarks table,
//! established once per session and torn down unconditionally on
//! session end. Delivery is at-least-once with no ordering guarantee
//! relative to local request completions; the reconciler's idempotent
//! merge rules are the documented tolerance for that.

pub mod message;
pub mod subscription;

pub use message::{ClientMessage, ServerMessage};
pub use subscription::{
    spawn_feed_task, FeedCommand, FeedConfig, FeedEvent, FeedHandle, FeedStatus,
};
