//! SQLite-backed entity store.
//!
//! One database file, one connection behind a mutex. Multi-step
//! mutations (toggles, cascade deletes, history updates) run inside a
//! single transaction on that connection.

mod content;
mod engagement;
mod history;
mod playlists;
mod users;
mod videos;

use crate::sqlite_persistence::open_database;
use crate::store::schema::STORE_VERSIONED_SCHEMAS;
use anyhow::Result;
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_database(db_path, STORE_VERSIONED_SCHEMAS)?;

        let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?;
        let videos: i64 = conn.query_row("SELECT COUNT(*) FROM videos", [], |r| r.get(0))?;
        info!("Store ready: {} users, {} videos", users, videos);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SqliteStore;
    use crate::store::models::*;
    use crate::store::trait_def::{UserStore, VideoStore};
    use tempfile::TempDir;
    use uuid::Uuid;

    pub fn create_test_store() -> (SqliteStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = SqliteStore::new(tmp.path().join("test.db")).unwrap();
        (store, tmp)
    }

    pub fn make_user(store: &SqliteStore, username: &str) -> UserRecord {
        store
            .create_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                full_name: format!("User {}", username),
                password_hash: Some("$argon2$test".to_string()),
                auth_provider: AuthProvider::Local,
                provider_subject: None,
                avatar_url: Some(format!("https://cdn.example.com/{}.png", username)),
                avatar_asset_id: Some(format!("asset-{}", username)),
                cover_url: None,
                cover_asset_id: None,
            })
            .unwrap()
    }

    pub fn make_video(store: &SqliteStore, owner: Uuid, title: &str) -> VideoRecord {
        store
            .create_video(NewVideo {
                owner_id: owner,
                video_url: format!("https://cdn.example.com/{}.mp4", title),
                video_asset_id: format!("video-{}", title),
                thumbnail_url: format!("https://cdn.example.com/{}.jpg", title),
                thumbnail_asset_id: format!("thumb-{}", title),
                title: title.to_string(),
                description: format!("description of {}", title),
                duration_secs: 42.5,
            })
            .unwrap()
    }
}
