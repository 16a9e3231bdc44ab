//! File-backed user store.
//!
//! Accounts live in a single pretty-printed JSON file that is rewritten
//! wholesale on every mutation. The store owns the "current user" pointer and
//! broadcasts [`AppEvent::UserChanged`] whenever the active account switches
//! or its profile changes.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;
use tracing::{info, warn};
use uuid::Uuid;

use snaptex_types::events::AppEvent;
use snaptex_types::models::User;

/// Password assigned to records written by builds that predate credentials.
/// Backfilled (salted + hashed) on first load. See DESIGN.md.
const LEGACY_DEFAULT_PASSWORD: &str = "123456";

const DEFAULT_USER_ID: &str = "default";
const DEFAULT_USER_NAME: &str = "andy";
const DEFAULT_USER_AVATAR: &str = "images/andy.png";

/// On-disk user record. Never exposed outside this crate; the public shape
/// is [`User`], which carries no credential material.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    id: String,
    name: String,
    avatar: String,
    #[serde(default)]
    password_hash: String,
    #[serde(default)]
    salt: String,
}

impl UserRecord {
    fn public(&self) -> User {
        User {
            id: self.id.clone(),
            name: self.name.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// File format: `{ "users": [...], "current_user_id": "..." }`.
#[derive(Debug, Serialize, Deserialize)]
struct UsersFile {
    users: Vec<UserRecord>,
    current_user_id: Option<String>,
}

struct State {
    users: Vec<UserRecord>,
    current_id: String,
}

impl State {
    fn find(&self, id: &str) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.id == id)
    }

    fn current(&self) -> &UserRecord {
        // Invariant: current_id always names an existing record.
        self.users
            .iter()
            .find(|u| u.id == self.current_id)
            .expect("current user must exist")
    }
}

pub struct UserStore {
    path: PathBuf,
    state: Mutex<State>,
    events: broadcast::Sender<AppEvent>,
}

impl UserStore {
    /// Open the store at `path`, bootstrapping a default account when the
    /// file is missing or unreadable. Legacy records without credentials are
    /// backfilled with the default password and the file rewritten once.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }

        let (mut users, saved_current) = match load_file(&path) {
            Ok(Some(file)) => (file.users, file.current_user_id),
            Ok(None) => (Vec::new(), None),
            Err(e) => {
                warn!("user file unreadable, re-bootstrapping: {e:#}");
                (Vec::new(), None)
            }
        };

        let mut dirty = false;
        for user in &mut users {
            if user.password_hash.is_empty() || user.salt.is_empty() {
                warn!("user {} has no credentials, assigning default password", user.id);
                user.salt = generate_salt();
                user.password_hash = hash_password(LEGACY_DEFAULT_PASSWORD, &user.salt);
                dirty = true;
            }
        }

        if users.is_empty() {
            users.push(default_user());
            dirty = true;
            info!("bootstrapped default user");
        }

        let current_id = saved_current
            .filter(|id| users.iter().any(|u| u.id == *id))
            .unwrap_or_else(|| users[0].id.clone());

        let (events, _) = broadcast::channel(16);
        let store = Self {
            path,
            state: Mutex::new(State { users, current_id }),
            events,
        };

        if dirty {
            let state = store.state.lock().unwrap();
            store.persist(&state)?;
        }

        Ok(store)
    }

    /// Subscribe to account events. Every `UserChanged` broadcast carries the
    /// full public user so subscribers need no follow-up read.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.events.subscribe()
    }

    pub fn current_user(&self) -> User {
        self.state.lock().unwrap().current().public()
    }

    pub fn all_users(&self) -> Vec<User> {
        let state = self.state.lock().unwrap();
        state.users.iter().map(UserRecord::public).collect()
    }

    /// Switch the active account. Returns false for an unknown id; on success
    /// persists and notifies subscribers.
    pub fn set_current_user(&self, id: &str) -> bool {
        let user = {
            let mut state = self.state.lock().unwrap();
            let Some(user) = state.find(id) else {
                return false;
            };
            let user = user.public();
            state.current_id = id.to_string();
            self.persist_or_warn(&state);
            user
        };
        info!("current user switched to {} ({})", user.name, user.id);
        let _ = self.events.send(AppEvent::UserChanged { user });
        true
    }

    /// Check `plaintext` against the stored salted hash. Unknown ids fail.
    pub fn verify_password(&self, id: &str, plaintext: &str) -> bool {
        let state = self.state.lock().unwrap();
        match state.find(id) {
            Some(user) => hash_password(plaintext, &user.salt) == user.password_hash,
            None => false,
        }
    }

    pub fn add_user(&self, name: &str, avatar: &str, password: &str) -> User {
        let salt = generate_salt();
        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            avatar: avatar.to_string(),
            password_hash: hash_password(password, &salt),
            salt,
        };
        let user = record.public();

        let mut state = self.state.lock().unwrap();
        state.users.push(record);
        self.persist_or_warn(&state);
        info!("added user {} ({})", user.name, user.id);
        user
    }

    /// Delete an account. Refused for the active account and for the last
    /// remaining one.
    pub fn delete_user(&self, id: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.current_id == id || state.users.len() <= 1 {
            return false;
        }
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return false;
        }
        self.persist_or_warn(&state);
        info!("deleted user {id}");
        true
    }

    /// Partial profile update of the active account. Persists and notifies
    /// subscribers so user-scoped chrome refreshes.
    pub fn update_current_user(&self, name: Option<&str>, avatar: Option<&str>) -> bool {
        let user = {
            let mut state = self.state.lock().unwrap();
            let current_id = state.current_id.clone();
            let Some(user) = state.users.iter_mut().find(|u| u.id == current_id) else {
                return false;
            };
            if let Some(name) = name {
                user.name = name.to_string();
            }
            if let Some(avatar) = avatar {
                user.avatar = avatar.to_string();
            }
            let user = user.public();
            self.persist_or_warn(&state);
            user
        };
        let _ = self.events.send(AppEvent::UserChanged { user });
        true
    }

    fn persist(&self, state: &State) -> Result<()> {
        let file = UsersFile {
            users: state.users.clone(),
            current_user_id: Some(state.current_id.clone()),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }

    fn persist_or_warn(&self, state: &State) {
        if let Err(e) = self.persist(state) {
            warn!("failed to persist user file: {e:#}");
        }
    }
}

fn load_file(path: &Path) -> Result<Option<UsersFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let file: UsersFile = serde_json::from_str(&raw).context("parsing user file")?;
    Ok(Some(file))
}

fn default_user() -> UserRecord {
    let salt = generate_salt();
    UserRecord {
        id: DEFAULT_USER_ID.to_string(),
        name: DEFAULT_USER_NAME.to_string(),
        avatar: DEFAULT_USER_AVATAR.to_string(),
        password_hash: hash_password(LEGACY_DEFAULT_PASSWORD, &salt),
        salt,
    }
}

fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest scheme fixed by the on-disk format: hex(sha256(password ++ salt)).
fn hash_password(plaintext: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> UserStore {
        UserStore::open(dir.path().join("users.json")).unwrap()
    }

    #[test]
    fn bootstraps_default_user() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let current = store.current_user();
        assert_eq!(current.id, "default");
        assert_eq!(store.all_users().len(), 1);
        assert!(store.verify_password("default", "123456"));
    }

    #[test]
    fn password_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let bob = store.add_user("bob", "avatar.png", "pw123");
        assert!(store.verify_password(&bob.id, "pw123"));
        assert!(!store.verify_password(&bob.id, "wrong"));
        assert!(!store.verify_password("no-such-id", "pw123"));
    }

    #[test]
    fn delete_protections() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        // Only user: refused.
        assert!(!store.delete_user("default"));

        let bob = store.add_user("bob", "", "pw");
        // Active user: refused.
        assert!(!store.delete_user("default"));
        assert!(store.delete_user(&bob.id));
        assert_eq!(store.all_users().len(), 1);
    }

    #[test]
    fn switch_persists_and_notifies() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let bob = store.add_user("bob", "", "pw");

        let mut events = store.subscribe();
        assert!(store.set_current_user(&bob.id));
        assert_eq!(store.current_user().id, bob.id);

        match events.try_recv().unwrap() {
            AppEvent::UserChanged { user } => assert_eq!(user.id, bob.id),
        }

        // Survives a reload.
        let reopened = open_store(&dir);
        assert_eq!(reopened.current_user().id, bob.id);
    }

    #[test]
    fn switch_unknown_id_fails_silently() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let mut events = store.subscribe();

        assert!(!store.set_current_user("ghost"));
        assert_eq!(store.current_user().id, "default");
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn legacy_records_get_default_password() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(
            &path,
            r#"{"users":[{"id":"old","name":"grandfathered","avatar":""}],"current_user_id":"old"}"#,
        )
        .unwrap();

        let store = UserStore::open(&path).unwrap();
        assert!(store.verify_password("old", "123456"));
        assert!(!store.verify_password("old", "hunter2"));

        // The backfill was written through, not just held in memory.
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("password_hash"));
        assert!(raw.contains("salt"));
    }

    #[test]
    fn corrupt_file_rebootstraps() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = UserStore::open(&path).unwrap();
        assert_eq!(store.current_user().id, "default");
    }

    #[test]
    fn profile_update_notifies() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        let mut events = store.subscribe();

        assert!(store.update_current_user(Some("andrea"), None));
        let current = store.current_user();
        assert_eq!(current.name, "andrea");
        assert_eq!(current.avatar, "images/andy.png");

        match events.try_recv().unwrap() {
            AppEvent::UserChanged { user } => assert_eq!(user.name, "andrea"),
        }
    }
}
