//! Session lifecycle and the submission/deletion flows
//!
//! A `Session` owns the in-memory collection, the feed subscription
//! handle, and the pending-deletion display flags, with an explicit
//! start/stop lifecycle. All collection mutation funnels through one
//! apply loop that consumes feed events in arrival order; the local
//! flows below never touch the collection themselves. Doing so would
//! race the authoritative feed event and risk duplication or a stale
//! overwrite.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::feed::{self, FeedCommand, FeedConfig, FeedEvent, FeedHandle, FeedStatus};
use crate::models::{Bookmark, Identity, NewBookmark};
use crate::reconciler::BookmarkList;
use crate::remote::RemoteStore;

/// A live view of one user's bookmarks
pub struct Session {
    store: Arc<dyn RemoteStore>,
    identity: Identity,
    list: Arc<Mutex<BookmarkList>>,
    pending: Arc<Mutex<HashSet<Uuid>>>,
    snapshot_rx: watch::Receiver<Vec<Bookmark>>,
    feed_status_rx: watch::Receiver<FeedStatus>,
    feed_command_tx: mpsc::Sender<FeedCommand>,
    apply_task: Option<JoinHandle<()>>,
}

impl Session {
    /// Start a session against the store, subscribing to the feed
    ///
    /// Fails with an auth error when nobody is signed in. Seeds the
    /// collection from a server snapshot before any event can arrive.
    pub async fn start(store: Arc<dyn RemoteStore>, feed_config: FeedConfig) -> Result<Self> {
        let handle = feed::spawn_feed_task(feed_config);
        Self::start_with_feed(store, handle).await
    }

    /// Start a session with an already-established feed handle
    ///
    /// Useful for alternate feed transports and for tests that inject
    /// events directly.
    pub async fn start_with_feed(store: Arc<dyn RemoteStore>, feed: FeedHandle) -> Result<Self> {
        let identity = store
            .current_user()
            .await?
            .ok_or_else(|| Error::auth("no active session"))?;

        let initial = store.list_bookmarks(identity.id).await?;
        let (snapshot_tx, snapshot_rx) = watch::channel(initial.clone());
        let list = Arc::new(Mutex::new(BookmarkList::new(initial)));

        let FeedHandle {
            command_tx,
            event_rx,
            status_rx,
        } = feed;

        let apply_task = tokio::spawn(apply_loop(
            event_rx,
            Arc::clone(&list),
            Arc::clone(&store),
            identity.id,
            snapshot_tx,
        ));

        Ok(Self {
            store,
            identity,
            list,
            pending: Arc::new(Mutex::new(HashSet::new())),
            snapshot_rx,
            feed_status_rx: status_rx,
            feed_command_tx: command_tx,
            apply_task: Some(apply_task),
        })
    }

    /// The identity this session is scoped to
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Current feed connection status
    pub fn feed_status(&self) -> FeedStatus {
        *self.feed_status_rx.borrow()
    }

    /// Subscribe to collection snapshots
    ///
    /// A new snapshot is published every time a feed event changes the
    /// collection.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Bookmark>> {
        self.snapshot_rx.clone()
    }

    /// Point-in-time copy of the collection
    pub async fn bookmarks(&self) -> Vec<Bookmark> {
        self.list.lock().await.snapshot()
    }

    /// Ids currently awaiting delete confirmation, for display only
    pub async fn pending_deletes(&self) -> HashSet<Uuid> {
        self.pending.lock().await.clone()
    }

    /// Submission flow
    ///
    /// Validates, re-checks the identity (the session could have
    /// expired since start), and issues the create request. The
    /// created record is returned for display but never inserted
    /// locally: it appears in the collection once the feed delivers
    /// the insert event.
    pub async fn submit(&self, url: &str, title: &str) -> Result<Bookmark> {
        submit(self.store.as_ref(), url, title).await
    }

    /// Deletion flow, best-effort
    ///
    /// Flags the row pending for the duration of the request, logs a
    /// store failure without surfacing it, and clears the flag
    /// regardless of outcome. Removal from the collection happens only
    /// when the feed confirms it.
    pub async fn delete(&self, id: Uuid) {
        self.pending.lock().await.insert(id);
        if let Err(e) = self.store.delete_bookmark(id).await {
            warn!("delete request for {} failed: {}", id, e);
        }
        self.pending.lock().await.remove(&id);
    }

    /// End the remote session
    pub async fn sign_out(&self) -> Result<()> {
        self.store.sign_out().await
    }

    /// Tear the session down
    ///
    /// Shuts the feed task down unconditionally and waits for the
    /// apply loop to drain.
    pub async fn stop(mut self) {
        let _ = self.feed_command_tx.send(FeedCommand::Shutdown).await;
        if let Some(task) = self.apply_task.take() {
            // The apply loop exits once the feed task drops its sender
            let _ = task.await;
        }
    }
}

/// Validate and trim a submission
///
/// Empty fields are rejected before any URL parsing runs, so a blank
/// form produces one consistent message.
pub fn validate_submission(url: &str, title: &str) -> Result<(String, String)> {
    let url = url.trim();
    let title = title.trim();

    if url.is_empty() || title.is_empty() {
        return Err(Error::validation("both url and title are required"));
    }

    Url::parse(url).map_err(|e| Error::validation(format!("not a valid url: {e}")))?;

    Ok((url.to_string(), title.to_string()))
}

/// Submission flow against any store
///
/// Identity is looked up at submission time, not session start: a
/// session can expire between the two.
pub async fn submit(store: &dyn RemoteStore, url: &str, title: &str) -> Result<Bookmark> {
    let (url, title) = validate_submission(url, title)?;

    let user = store
        .current_user()
        .await?
        .ok_or_else(|| Error::auth("session expired, sign in again"))?;

    store
        .insert_bookmark(NewBookmark {
            url,
            title,
            owner: user.id,
        })
        .await
}

/// The single thread of collection mutation
///
/// Applies feed events in arrival order and publishes a fresh snapshot
/// whenever the collection changes. Every `Connected` after a gap
/// re-fetches the server snapshot so events missed while offline
/// cannot be lost. The seed snapshot is fetched before the
/// subscription exists, so the very first `Connected` counts as a gap
/// too: a row created in the fetch-to-subscribe window is in neither
/// the snapshot nor the event stream.
async fn apply_loop(
    mut event_rx: mpsc::Receiver<FeedEvent>,
    list: Arc<Mutex<BookmarkList>>,
    store: Arc<dyn RemoteStore>,
    owner: Uuid,
    snapshot_tx: watch::Sender<Vec<Bookmark>>,
) {
    let mut dropped = true;

    while let Some(event) = event_rx.recv().await {
        match event {
            FeedEvent::Change(change) => {
                let mut guard = list.lock().await;
                if guard.apply(change) {
                    let _ = snapshot_tx.send(guard.snapshot());
                }
            }
            FeedEvent::Connected => {
                if dropped {
                    match store.list_bookmarks(owner).await {
                        Ok(rows) => {
                            let mut guard = list.lock().await;
                            guard.reset(rows);
                            let _ = snapshot_tx.send(guard.snapshot());
                        }
                        Err(e) => {
                            warn!("snapshot refresh after reconnect failed: {}", e);
                        }
                    }
                    dropped = false;
                }
            }
            FeedEvent::Disconnected => {
                dropped = true;
                debug!("live updates paused until the feed reconnects");
            }
            FeedEvent::Error(message) => {
                warn!("feed error: {}", message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChangeEvent;
    use crate::remote::testing::MemoryStore;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    /// Feed handle whose event side is driven by the test
    fn manual_feed() -> (
        FeedHandle,
        mpsc::Sender<FeedEvent>,
        mpsc::Receiver<FeedCommand>,
    ) {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(64);
        let (_status_tx, status_rx) = watch::channel(FeedStatus::Subscribed);
        (
            FeedHandle {
                command_tx,
                event_rx,
                status_rx,
            },
            event_tx,
            command_rx,
        )
    }

    async fn wait_for_snapshot(rx: &mut watch::Receiver<Vec<Bookmark>>) -> Vec<Bookmark> {
        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .expect("no snapshot published")
            .expect("snapshot channel closed");
        rx.borrow_and_update().clone()
    }

    #[test]
    fn test_validation_rejects_empty_fields_before_url_parse() {
        // Both empty: one message, no mention of URL syntax
        let err = validate_submission("", "").unwrap_err();
        match err {
            Error::Validation(msg) => assert!(msg.contains("required")),
            other => panic!("Expected validation error, got {:?}", other),
        }

        // Whitespace-only counts as empty
        assert!(validate_submission("  ", "Foo").is_err());
        assert!(validate_submission("https://x.com", "   ").is_err());
    }

    #[test]
    fn test_validation_rejects_malformed_url() {
        let err = validate_submission("not a url", "Foo").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_validation_trims() {
        let (url, title) = validate_submission("  https://x.com  ", "  X  ").unwrap();
        assert_eq!(url, "https://x.com");
        assert_eq!(title, "X");
    }

    #[tokio::test]
    async fn test_invalid_submission_never_reaches_the_store() {
        let store = MemoryStore::signed_in();
        assert!(submit(&store, "not a url", "Foo").await.is_err());
        assert!(submit(&store, "", "").await.is_err());
        assert_eq!(store.insert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_submission_without_identity_is_an_auth_error() {
        let store = MemoryStore::signed_out();
        let err = submit(&store, "https://x.com", "X").await.unwrap_err();
        assert!(matches!(err, Error::Auth(_)));
        assert_eq!(store.insert_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_requires_a_signed_in_user() {
        let store = Arc::new(MemoryStore::signed_out());
        let (feed, _event_tx, _command_rx) = manual_feed();
        let result = Session::start_with_feed(store, feed).await;
        assert!(matches!(result.err(), Some(Error::Auth(_))));
    }

    #[tokio::test]
    async fn test_submit_round_trip_through_the_feed() {
        let store = Arc::new(MemoryStore::signed_in());
        let (feed, event_tx, _command_rx) = manual_feed();
        let session = Session::start_with_feed(Arc::clone(&store) as Arc<dyn RemoteStore>, feed)
            .await
            .unwrap();
        let mut rx = session.subscribe();

        let created = session.submit("https://x.com", "X").await.unwrap();

        // Submit succeeded but nothing appears until the feed confirms
        assert!(session.bookmarks().await.is_empty());

        event_tx
            .send(FeedEvent::Change(ChangeEvent::Insert {
                record: created.clone(),
            }))
            .await
            .unwrap();

        let snapshot = wait_for_snapshot(&mut rx).await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].url, "https://x.com");
        assert_eq!(snapshot[0].title, "X");

        // Redelivery of the same insert changes nothing
        event_tx
            .send(FeedEvent::Change(ChangeEvent::Insert { record: created }))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(session.bookmarks().await.len(), 1);

        drop(event_tx);
        session.stop().await;
    }

    #[tokio::test]
    async fn test_failed_submission_leaves_collection_untouched() {
        let store = Arc::new(MemoryStore::signed_in());
        store.reject_inserts.store(true, Ordering::SeqCst);
        let (feed, event_tx, _command_rx) = manual_feed();
        let session = Session::start_with_feed(Arc::clone(&store) as Arc<dyn RemoteStore>, feed)
            .await
            .unwrap();

        let err = session.submit("https://x.com", "X").await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));
        assert!(session.bookmarks().await.is_empty());

        drop(event_tx);
        session.stop().await;
    }

    #[tokio::test]
    async fn test_delete_is_best_effort_and_clears_pending() {
        let store = Arc::new(MemoryStore::signed_in());
        let owner = store.owner().await;
        let (feed, event_tx, _command_rx) = manual_feed();
        let session = Session::start_with_feed(Arc::clone(&store) as Arc<dyn RemoteStore>, feed)
            .await
            .unwrap();
        let mut rx = session.subscribe();

        // Seed one row through the feed
        let bookmark = Bookmark::new(owner, "https://x.com", "X");
        event_tx
            .send(FeedEvent::Change(ChangeEvent::Insert {
                record: bookmark.clone(),
            }))
            .await
            .unwrap();
        wait_for_snapshot(&mut rx).await;

        // A rejected delete is logged, not surfaced, and leaves the row
        store.reject_deletes.store(true, Ordering::SeqCst);
        session.delete(bookmark.id).await;
        assert!(session.pending_deletes().await.is_empty());
        assert_eq!(session.bookmarks().await.len(), 1);

        // Only the feed event removes it
        event_tx
            .send(FeedEvent::Change(ChangeEvent::Delete { id: bookmark.id }))
            .await
            .unwrap();
        let snapshot = wait_for_snapshot(&mut rx).await;
        assert!(snapshot.is_empty());

        drop(event_tx);
        session.stop().await;
    }

    #[tokio::test]
    async fn test_reconnect_refetches_snapshot() {
        let store = Arc::new(MemoryStore::signed_in());
        let owner = store.owner().await;
        let (feed, event_tx, _command_rx) = manual_feed();
        let session = Session::start_with_feed(Arc::clone(&store) as Arc<dyn RemoteStore>, feed)
            .await
            .unwrap();
        let mut rx = session.subscribe();

        // A row lands on the server while the feed is down
        store
            .insert_bookmark(NewBookmark {
                url: "https://missed.com".to_string(),
                title: "Missed".to_string(),
                owner,
            })
            .await
            .unwrap();

        event_tx.send(FeedEvent::Disconnected).await.unwrap();
        event_tx.send(FeedEvent::Connected).await.unwrap();

        let snapshot = wait_for_snapshot(&mut rx).await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].url, "https://missed.com");

        drop(event_tx);
        session.stop().await;
    }

    #[tokio::test]
    async fn test_first_connect_refetches_rows_missed_before_subscribe() {
        let store = Arc::new(MemoryStore::signed_in());
        let owner = store.owner().await;
        let (feed, event_tx, _command_rx) = manual_feed();
        let session = Session::start_with_feed(Arc::clone(&store) as Arc<dyn RemoteStore>, feed)
            .await
            .unwrap();
        let mut rx = session.subscribe();

        // A row lands on the server after the seed snapshot but before
        // the subscription opens; no event for it will ever arrive.
        store
            .insert_bookmark(NewBookmark {
                url: "https://early.com".to_string(),
                title: "Early".to_string(),
                owner,
            })
            .await
            .unwrap();

        event_tx.send(FeedEvent::Connected).await.unwrap();

        let snapshot = wait_for_snapshot(&mut rx).await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].url, "https://early.com");

        drop(event_tx);
        session.stop().await;
    }

    #[tokio::test]
    async fn test_stop_sends_shutdown() {
        let store = Arc::new(MemoryStore::signed_in());
        let (feed, event_tx, mut command_rx) = manual_feed();
        let session = Session::start_with_feed(store as Arc<dyn RemoteStore>, feed)
            .await
            .unwrap();

        drop(event_tx);
        session.stop().await;

        let cmd = command_rx.recv().await;
        assert!(matches!(cmd, Some(FeedCommand::Shutdown)));
    }
}
