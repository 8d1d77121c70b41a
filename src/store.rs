//! User/image store — the single unit of persistence.
//!
//! All accounts and their images live in one `users.json` blob; the login
//! session is a separate `session.json` so it survives restarts on its own.
//! Every mutation rewrites the whole blob and rebuilds the flattened public
//! feed. A failed write leaves the in-memory store mutated and is reported
//! to the caller; memory and disk then diverge until the next save lands.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{load_json, save_json, session_file, users_file};

// ── Records ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Creation time in milliseconds. Two uploads within the same
    /// millisecond share an id; `delete_image` then removes the first.
    pub id: i64,
    /// Inline `data:` URL payload.
    pub data: String,
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct User {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

/// One entry of the flattened public feed: an image plus its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedImage {
    pub id: i64,
    pub data: String,
    pub uploaded_at: String,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct SessionBlob {
    username: String,
}

// ── Errors and save status ────────────────────────────────────────────────────

/// Validation failures. The `Display` strings are shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Username and password cannot be empty.")]
    EmptyFields,
    #[error("That username is already taken.")]
    UsernameTaken,
    #[error("Invalid username or password.")]
    BadCredentials,
    #[error("No image staged for upload.")]
    NothingStaged,
    #[error("You must be logged in to do that.")]
    NotLoggedIn,
}

/// Outcome of writing the users blob after a successful mutation.
///
/// `WriteFailed` means the change is live in memory but not on disk; the
/// caller alerts the user and carries on. No rollback, no retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    WriteFailed(String),
}

// ── Store ─────────────────────────────────────────────────────────────────────

pub struct Store {
    dir: PathBuf,
    users: HashMap<String, User>,
    session: Option<String>,
    feed: Vec<FeedImage>,
}

impl Store {
    /// Open the store rooted at `dir`, loading whatever persisted state is
    /// there. Missing or malformed blobs yield an empty store and no
    /// session; that path is logged, never surfaced.
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let _ = std::fs::create_dir_all(&dir);

        let users: HashMap<String, User> = load_json(&users_file(&dir));
        let session = read_session(&dir);

        let mut store = Self {
            dir,
            users,
            session,
            feed: Vec::new(),
        };
        store.rebuild_feed();
        tracing::info!(
            users = store.users.len(),
            images = store.feed.len(),
            session = store.session.as_deref().unwrap_or("-"),
            "store opened"
        );
        store
    }

    pub fn current_user(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// The flattened public feed, rebuilt on every mutation.
    pub fn feed(&self) -> &[FeedImage] {
        &self.feed
    }

    // ── Accounts ──────────────────────────────────────────────────────────────

    /// Create an account and log it in. Empty fields and duplicate
    /// usernames fail without touching any state.
    pub fn signup(&mut self, username: &str, password: &str) -> Result<SaveOutcome, StoreError> {
        if username.is_empty() || password.is_empty() {
            return Err(StoreError::EmptyFields);
        }
        if self.users.contains_key(username) {
            return Err(StoreError::UsernameTaken);
        }
        self.users.insert(
            username.to_string(),
            User {
                username: username.to_string(),
                password: password.to_string(),
                images: Vec::new(),
            },
        );
        self.rebuild_feed();
        let outcome = self.persist_users();
        self.set_session(Some(username));
        tracing::info!(username, "account created");
        Ok(outcome)
    }

    /// Exact-match credential check; usernames and passwords are
    /// case-sensitive and otherwise unvalidated.
    pub fn login(&mut self, username: &str, password: &str) -> Result<(), StoreError> {
        match self.users.get(username) {
            Some(u) if u.password == password => {
                self.set_session(Some(username));
                tracing::info!(username, "logged in");
                Ok(())
            }
            _ => Err(StoreError::BadCredentials),
        }
    }

    /// Clears the session only; accounts and images are untouched.
    pub fn logout(&mut self) {
        if let Some(u) = self.session.take() {
            tracing::info!(username = %u, "logged out");
        }
        self.set_session(None);
    }

    // ── Images ────────────────────────────────────────────────────────────────

    /// Append a staged payload to the logged-in user's gallery.
    pub fn upload_image(&mut self, payload: Option<&str>) -> Result<SaveOutcome, StoreError> {
        self.upload_image_at(payload, Utc::now())
    }

    /// Timestamp-explicit upload. The image id is the creation time in
    /// milliseconds, so callers controlling the clock can reproduce the
    /// same-millisecond id collision.
    pub fn upload_image_at(
        &mut self,
        payload: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SaveOutcome, StoreError> {
        let payload = payload.ok_or(StoreError::NothingStaged)?;
        let username = self.session.clone().ok_or(StoreError::NotLoggedIn)?;
        let user = self
            .users
            .get_mut(&username)
            .ok_or(StoreError::NotLoggedIn)?;

        let id = now.timestamp_millis();
        user.images.push(ImageRecord {
            id,
            data: payload.to_string(),
            uploaded_at: now.to_rfc3339(),
        });
        self.rebuild_feed();
        tracing::info!(username = %username, id, bytes = payload.len(), "image uploaded");
        Ok(self.persist_users())
    }

    /// Remove the first image with `id` from the logged-in user's gallery.
    /// A no-op without a session or when no image matches.
    pub fn delete_image(&mut self, id: i64) -> SaveOutcome {
        let Some(username) = self.session.clone() else {
            return SaveOutcome::Saved;
        };
        let Some(user) = self.users.get_mut(&username) else {
            return SaveOutcome::Saved;
        };
        match user.images.iter().position(|img| img.id == id) {
            Some(idx) => {
                user.images.remove(idx);
                self.rebuild_feed();
                tracing::info!(username = %username, id, "image deleted");
                self.persist_users()
            }
            None => SaveOutcome::Saved,
        }
    }

    // ── Feed ──────────────────────────────────────────────────────────────────

    /// Draw up to `limit` feed entries in uniform random order. Recomputed
    /// on every call; nothing about the previous draw is kept.
    pub fn sample_feed(&self, limit: usize) -> Vec<FeedImage> {
        self.sample_feed_with(&mut rand::thread_rng(), limit)
    }

    pub fn sample_feed_with<R: Rng>(&self, rng: &mut R, limit: usize) -> Vec<FeedImage> {
        let mut feed = self.feed.clone();
        let n = limit.min(feed.len());
        let (sample, _) = feed.partial_shuffle(rng, n);
        sample.to_vec()
    }

    fn rebuild_feed(&mut self) {
        self.feed.clear();
        for user in self.users.values() {
            for img in &user.images {
                self.feed.push(FeedImage {
                    id: img.id,
                    data: img.data.clone(),
                    uploaded_at: img.uploaded_at.clone(),
                    username: user.username.clone(),
                });
            }
        }
    }

    // ── Persistence ───────────────────────────────────────────────────────────

    fn persist_users(&self) -> SaveOutcome {
        match save_json(&users_file(&self.dir), &self.users) {
            Ok(()) => SaveOutcome::Saved,
            Err(e) => {
                tracing::error!("users blob write failed: {e:#}");
                SaveOutcome::WriteFailed(e.to_string())
            }
        }
    }

    fn set_session(&mut self, username: Option<&str>) {
        self.session = username.map(str::to_string);
        let path = session_file(&self.dir);
        let result = match &self.session {
            Some(u) => save_json(&path, &SessionBlob { username: u.clone() }),
            None => {
                let _ = std::fs::remove_file(&path);
                Ok(())
            }
        };
        if let Err(e) = result {
            tracing::warn!("session write failed: {e:#}");
        }
    }
}

fn read_session(dir: &Path) -> Option<String> {
    let blob: SessionBlob = load_json(&session_file(dir));
    if blob.username.is_empty() {
        None
    } else {
        Some(blob.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::{tempdir, TempDir};

    const PNG: &str = "data:image/png;base64,AAA";

    fn open(dir: &TempDir) -> Store {
        Store::open(dir.path())
    }

    fn at(millis: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(millis).unwrap()
    }

    #[test]
    fn signup_then_login_round_trips() {
        let dir = tempdir().unwrap();
        let mut store = open(&dir);

        assert_eq!(store.signup("ann", "pw1"), Ok(SaveOutcome::Saved));
        assert_eq!(store.current_user(), Some("ann"));

        store.logout();
        assert!(store.login("ann", "pw1").is_ok());
        assert_eq!(store.current_user(), Some("ann"));
    }

    #[test]
    fn signup_rejects_empty_fields() {
        let dir = tempdir().unwrap();
        let mut store = open(&dir);

        assert_eq!(store.signup("", "pw"), Err(StoreError::EmptyFields));
        assert_eq!(store.signup("ann", ""), Err(StoreError::EmptyFields));
        assert_eq!(store.user_count(), 0);
        assert!(!store.is_logged_in());
    }

    #[test]
    fn duplicate_signup_fails_and_leaves_store_unchanged() {
        let dir = tempdir().unwrap();
        let mut store = open(&dir);
        store.signup("ann", "pw1").unwrap();
        store.upload_image_at(Some(PNG), at(1_000)).unwrap();

        assert_eq!(store.signup("ann", "other"), Err(StoreError::UsernameTaken));
        assert_eq!(store.user_count(), 1);
        let ann = store.user("ann").unwrap();
        assert_eq!(ann.password, "pw1");
        assert_eq!(ann.images.len(), 1);
    }

    #[test]
    fn wrong_password_leaves_session_unchanged() {
        let dir = tempdir().unwrap();
        let mut store = open(&dir);
        store.signup("ann", "pw1").unwrap();

        assert_eq!(store.login("ann", "PW1"), Err(StoreError::BadCredentials));
        assert_eq!(store.login("ghost", "pw1"), Err(StoreError::BadCredentials));
        // Still ann's session from signup.
        assert_eq!(store.current_user(), Some("ann"));

        store.logout();
        assert_eq!(store.login("ann", "nope"), Err(StoreError::BadCredentials));
        assert!(!store.is_logged_in());
    }

    #[test]
    fn logout_clears_session_only() {
        let dir = tempdir().unwrap();
        let mut store = open(&dir);
        store.signup("ann", "pw1").unwrap();
        store.upload_image_at(Some(PNG), at(1_000)).unwrap();

        store.logout();
        assert!(!store.is_logged_in());
        assert_eq!(store.user("ann").unwrap().images.len(), 1);
    }

    #[test]
    fn upload_requires_payload_and_session() {
        let dir = tempdir().unwrap();
        let mut store = open(&dir);

        assert_eq!(store.upload_image(Some(PNG)), Err(StoreError::NotLoggedIn));

        store.signup("ann", "pw1").unwrap();
        assert_eq!(store.upload_image(None), Err(StoreError::NothingStaged));
        assert!(store.user("ann").unwrap().images.is_empty());
    }

    #[test]
    fn upload_then_delete_restores_sequence() {
        let dir = tempdir().unwrap();
        let mut store = open(&dir);
        store.signup("ann", "pw1").unwrap();
        store.upload_image_at(Some("data:image/png;base64,first"), at(1_000)).unwrap();
        let before = store.user("ann").unwrap().images.clone();

        store.upload_image_at(Some(PNG), at(2_000)).unwrap();
        assert_eq!(store.delete_image(2_000), SaveOutcome::Saved);
        assert_eq!(store.user("ann").unwrap().images, before);
    }

    #[test]
    fn delete_is_idempotent_and_session_gated() {
        let dir = tempdir().unwrap();
        let mut store = open(&dir);
        store.signup("ann", "pw1").unwrap();
        store.upload_image_at(Some(PNG), at(1_000)).unwrap();

        // Unknown id: silent no-op.
        assert_eq!(store.delete_image(9_999), SaveOutcome::Saved);
        assert_eq!(store.user("ann").unwrap().images.len(), 1);

        // No session: no-op even with a matching id.
        store.logout();
        assert_eq!(store.delete_image(1_000), SaveOutcome::Saved);
        assert_eq!(store.user("ann").unwrap().images.len(), 1);
    }

    #[test]
    fn deleting_only_touches_the_owners_gallery() {
        let dir = tempdir().unwrap();
        let mut store = open(&dir);
        store.signup("ann", "pw1").unwrap();
        store.upload_image_at(Some(PNG), at(1_000)).unwrap();
        store.logout();
        store.signup("bob", "pw2").unwrap();
        store.upload_image_at(Some(PNG), at(1_000)).unwrap();

        // bob deletes "his" id; ann's image with the same id survives.
        store.delete_image(1_000);
        assert!(store.user("bob").unwrap().images.is_empty());
        assert_eq!(store.user("ann").unwrap().images.len(), 1);
    }

    #[test]
    fn feed_length_tracks_total_image_count() {
        let dir = tempdir().unwrap();
        let mut store = open(&dir);
        store.signup("ann", "pw1").unwrap();
        store.upload_image_at(Some(PNG), at(1)).unwrap();
        store.upload_image_at(Some(PNG), at(2)).unwrap();
        store.logout();
        store.signup("bob", "pw2").unwrap();
        store.upload_image_at(Some(PNG), at(3)).unwrap();

        let total = |s: &Store| {
            s.user("ann").unwrap().images.len() + s.user("bob").unwrap().images.len()
        };
        assert_eq!(store.feed().len(), total(&store));

        store.delete_image(3);
        assert_eq!(store.feed().len(), total(&store));
    }

    #[test]
    fn feed_sample_is_a_duplicate_free_subset() {
        let dir = tempdir().unwrap();
        let mut store = open(&dir);
        store.signup("ann", "pw1").unwrap();
        for i in 0..20 {
            store.upload_image_at(Some(PNG), at(i)).unwrap();
        }

        let sample = store.sample_feed(12);
        assert_eq!(sample.len(), 12);
        let mut ids: Vec<i64> = sample.iter().map(|f| f.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 12);
        for entry in &sample {
            assert!(store.feed().contains(entry));
        }

        // Fewer images than the cap: the whole feed comes back.
        assert_eq!(store.sample_feed(100).len(), 20);
    }

    #[test]
    fn same_millisecond_uploads_share_an_id() {
        let dir = tempdir().unwrap();
        let mut store = open(&dir);
        store.signup("ann", "pw1").unwrap();
        store.upload_image_at(Some("data:image/png;base64,one"), at(5_000)).unwrap();
        store.upload_image_at(Some("data:image/png;base64,two"), at(5_000)).unwrap();

        let images = &store.user("ann").unwrap().images;
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].id, images[1].id);

        // Delete removes the first match only.
        store.delete_image(5_000);
        let images = &store.user("ann").unwrap().images;
        assert_eq!(images.len(), 1);
        assert!(images[0].data.ends_with("two"));
    }

    #[test]
    fn store_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        {
            let mut store = open(&dir);
            store.signup("ann", "pw1").unwrap();
            store.upload_image_at(Some(PNG), at(42)).unwrap();
        }

        let store = open(&dir);
        // Session survived the reload independently of the users blob.
        assert_eq!(store.current_user(), Some("ann"));
        let ann = store.user("ann").unwrap();
        assert_eq!(ann.password, "pw1");
        assert_eq!(ann.images[0].id, 42);
        assert_eq!(ann.images[0].data, PNG);
        assert_eq!(store.feed().len(), 1);
    }

    #[test]
    fn persisted_layout_uses_camel_case_upload_field() {
        let dir = tempdir().unwrap();
        let mut store = open(&dir);
        store.signup("ann", "pw1").unwrap();
        store.upload_image_at(Some(PNG), at(42)).unwrap();

        let raw = std::fs::read_to_string(users_file(dir.path())).unwrap();
        assert!(raw.contains("\"uploadedAt\""));
        assert!(raw.contains("\"password\": \"pw1\""));
    }

    #[test]
    fn malformed_blobs_load_as_empty() {
        let dir = tempdir().unwrap();
        std::fs::write(users_file(dir.path()), "{not json").unwrap();
        std::fs::write(session_file(dir.path()), "also not json").unwrap();

        let store = open(&dir);
        assert_eq!(store.user_count(), 0);
        assert!(store.feed().is_empty());
        assert!(!store.is_logged_in());
    }

    #[test]
    fn first_upload_appears_everywhere() {
        let dir = tempdir().unwrap();
        let mut store = open(&dir);
        store.signup("ann", "pw1").unwrap();
        store.upload_image(Some("data:image/png;base64,AAA")).unwrap();

        assert_eq!(store.user("ann").unwrap().images.len(), 1);
        assert_eq!(store.feed().len(), 1);
        assert_eq!(store.feed()[0].username, "ann");
    }
}
