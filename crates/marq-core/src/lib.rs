//! marq core library
//!
//! This crate keeps a user's bookmark collection live against a remote
//! store. The store owns the data; this library owns a single in-memory
//! view of it, seeded from a snapshot and reconciled with change-feed
//! events as they arrive.
//!
//! # Architecture
//!
//! - The remote store is the source of truth. Local flows never mutate
//!   the in-memory collection directly; every insert and delete becomes
//!   visible only through the change feed.
//! - The feed delivers events at-least-once with no ordering guarantee
//!   relative to local request completions. The reconciler tolerates
//!   this by making insert and delete idempotent.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let client = Arc::new(ApiClient::new(&config)?);
//!
//! let session = Session::start(client, config.feed_config()).await?;
//! session.submit("https://example.com", "Example").await?;
//!
//! let mut updates = session.subscribe();
//! updates.changed().await?;
//! ```
//!
//! # Modules
//!
//! - `session`: collection lifecycle and the submission/deletion flows
//! - `reconciler`: the event merge rules
//! - `remote`: store client interface and HTTP implementation
//! - `feed`: change-feed subscription over WebSocket
//! - `models`: bookmark records and change events
//! - `config`: application configuration

pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod reconciler;
pub mod remote;
pub mod session;

pub use config::Config;
pub use error::{Error, Result};
pub use models::{Bookmark, ChangeEvent, Identity, NewBookmark};
pub use reconciler::BookmarkList;
pub use remote::{ApiClient, RemoteStore};
pub use session::Session;
