//! UserStore implementation.

use super::{now_ms, SqliteStore};
use crate::enrichment::models::ChannelProfile;
use crate::enrichment::queries::ChannelQuery;
use crate::store::models::*;
use crate::store::trait_def::UserStore;
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

const USER_COLS: &str = "id, username, email, full_name, password_hash, auth_provider, \
                         provider_subject, avatar_url, avatar_asset_id, cover_url, \
                         cover_asset_id, refresh_token, created, updated";

pub(super) fn user_from_row(row: &Row) -> rusqlite::Result<UserRecord> {
    let id: String = row.get(0)?;
    let provider: String = row.get(5)?;
    Ok(UserRecord {
        id: Uuid::parse_str(&id).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?,
        username: row.get(1)?,
        email: row.get(2)?,
        full_name: row.get(3)?,
        password_hash: row.get(4)?,
        auth_provider: AuthProvider::parse(&provider).unwrap_or(AuthProvider::Local),
        provider_subject: row.get(6)?,
        avatar_url: row.get(7)?,
        avatar_asset_id: row.get(8)?,
        cover_url: row.get(9)?,
        cover_asset_id: row.get(10)?,
        refresh_token: row.get(11)?,
        created: row.get(12)?,
        updated: row.get(13)?,
    })
}

impl SqliteStore {
    fn user_by_field(&self, field: &str, value: &str) -> Result<Option<UserRecord>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare_cached(&format!("SELECT {USER_COLS} FROM users WHERE {field} = ?1"))?;
        let user = stmt
            .query_row(params![value], user_from_row)
            .optional()
            .with_context(|| format!("Failed to look up user by {}", field))?;
        Ok(user)
    }

    fn touch_user(&self, user: Uuid, set_clause: &str, value: &dyn rusqlite::ToSql) -> Result<usize> {
        let conn = self.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "UPDATE users SET {set_clause}, updated = ?2 WHERE id = ?3"
        ))?;
        Ok(stmt.execute(params![value, now_ms(), user.to_string()])?)
    }
}

impl UserStore for SqliteStore {
    fn create_user(&self, new: NewUser) -> Result<UserRecord> {
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            full_name: new.full_name,
            password_hash: new.password_hash,
            auth_provider: new.auth_provider,
            provider_subject: new.provider_subject,
            avatar_url: new.avatar_url,
            avatar_asset_id: new.avatar_asset_id,
            cover_url: new.cover_url,
            cover_asset_id: new.cover_asset_id,
            refresh_token: None,
            created: now_ms(),
            updated: now_ms(),
        };
        let conn = self.lock();
        conn.execute(
            &format!(
                "INSERT INTO users ({USER_COLS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                record.id.to_string(),
                record.username,
                record.email,
                record.full_name,
                record.password_hash,
                record.auth_provider.as_str(),
                record.provider_subject,
                record.avatar_url,
                record.avatar_asset_id,
                record.cover_url,
                record.cover_asset_id,
                record.refresh_token,
                record.created,
                record.updated,
            ],
        )
        .with_context(|| format!("Failed to create user {}", record.username))?;
        Ok(record)
    }

    fn user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>> {
        self.user_by_field("id", &id.to_string())
    }

    fn user_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        self.user_by_field("username", username)
    }

    fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.user_by_field("email", email)
    }

    fn user_by_provider(&self, subject: &str, email: &str) -> Result<Option<UserRecord>> {
        let conn = self.lock();
        let mut stmt = conn.prepare_cached(&format!(
            "SELECT {USER_COLS} FROM users WHERE provider_subject = ?1 AND email = ?2"
        ))?;
        let user = stmt
            .query_row(params![subject, email], user_from_row)
            .optional()
            .context("Failed to look up federated user")?;
        Ok(user)
    }

    fn count_username(&self, username: &str) -> Result<u64> {
        let conn = self.lock();
        let count: i64 = conn
            .prepare_cached("SELECT COUNT(*) FROM users WHERE username = ?1")?
            .query_row(params![username], |r| r.get(0))?;
        Ok(count as u64)
    }

    fn set_refresh_token(&self, user: Uuid, token: Option<&str>) -> Result<()> {
        let conn = self.lock();
        conn.prepare_cached("UPDATE users SET refresh_token = ?1 WHERE id = ?2")?
            .execute(params![token, user.to_string()])?;
        Ok(())
    }

    fn set_password_hash(&self, user: Uuid, hash: &str) -> Result<()> {
        self.touch_user(user, "password_hash = ?1", &hash)?;
        Ok(())
    }

    fn set_username(&self, user: Uuid, username: &str) -> Result<Option<UserRecord>> {
        let updated = self.touch_user(user, "username = ?1", &username)?;
        if updated == 0 {
            return Ok(None);
        }
        self.user_by_id(user)
    }

    fn set_account_details(
        &self,
        user: Uuid,
        full_name: &str,
        email: &str,
    ) -> Result<Option<UserRecord>> {
        let updated = {
            let conn = self.lock();
            let mut stmt = conn.prepare_cached(
                "UPDATE users SET full_name = ?1, email = ?2, updated = ?3 WHERE id = ?4",
            )?;
            stmt.execute(params![full_name, email, now_ms(), user.to_string()])?
        };
        if updated == 0 {
            return Ok(None);
        }
        self.user_by_id(user)
    }

    fn set_avatar(&self, user: Uuid, url: &str, asset_id: &str) -> Result<Option<UserRecord>> {
        let updated = {
            let conn = self.lock();
            let mut stmt = conn.prepare_cached(
                "UPDATE users SET avatar_url = ?1, avatar_asset_id = ?2, updated = ?3 WHERE id = ?4",
            )?;
            stmt.execute(params![url, asset_id, now_ms(), user.to_string()])?
        };
        if updated == 0 {
            return Ok(None);
        }
        self.user_by_id(user)
    }

    fn set_cover(&self, user: Uuid, url: &str, asset_id: &str) -> Result<Option<UserRecord>> {
        let updated = {
            let conn = self.lock();
            let mut stmt = conn.prepare_cached(
                "UPDATE users SET cover_url = ?1, cover_asset_id = ?2, updated = ?3 WHERE id = ?4",
            )?;
            stmt.execute(params![url, asset_id, now_ms(), user.to_string()])?
        };
        if updated == 0 {
            return Ok(None);
        }
        self.user_by_id(user)
    }

    fn channel_profile(
        &self,
        username: &str,
        viewer: Option<Uuid>,
    ) -> Result<Option<ChannelProfile>> {
        let conn = self.lock();
        ChannelQuery::new(viewer).profile(&conn, username)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::store::trait_def::{EngagementStore, UserStore};

    #[test]
    fn create_and_look_up_user() {
        let (store, _tmp) = create_test_store();
        let user = make_user(&store, "alice");

        let by_id = store.user_by_id(user.id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
        assert_eq!(by_id.email, "alice@example.com");

        let by_name = store.user_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);

        assert!(store.user_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let (store, _tmp) = create_test_store();
        make_user(&store, "alice");

        let dup = store.create_user(crate::store::models::NewUser {
            username: "alice".to_string(),
            email: "other@example.com".to_string(),
            full_name: "Other".to_string(),
            password_hash: None,
            auth_provider: crate::store::models::AuthProvider::Local,
            provider_subject: None,
            avatar_url: None,
            avatar_asset_id: None,
            cover_url: None,
            cover_asset_id: None,
        });
        assert!(dup.is_err());
    }

    #[test]
    fn refresh_token_roundtrip() {
        let (store, _tmp) = create_test_store();
        let user = make_user(&store, "alice");

        store.set_refresh_token(user.id, Some("token-1")).unwrap();
        let fetched = store.user_by_id(user.id).unwrap().unwrap();
        assert_eq!(fetched.refresh_token.as_deref(), Some("token-1"));

        store.set_refresh_token(user.id, None).unwrap();
        let fetched = store.user_by_id(user.id).unwrap().unwrap();
        assert!(fetched.refresh_token.is_none());
    }

    #[test]
    fn set_username_on_missing_user_returns_none() {
        let (store, _tmp) = create_test_store();
        let result = store.set_username(uuid::Uuid::new_v4(), "ghost").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn channel_profile_counts_and_flag() {
        let (store, _tmp) = create_test_store();
        let channel = make_user(&store, "channel");
        let fan_a = make_user(&store, "fan_a");
        let fan_b = make_user(&store, "fan_b");

        store.toggle_subscription(fan_a.id, channel.id).unwrap();
        store.toggle_subscription(fan_b.id, channel.id).unwrap();
        store.toggle_subscription(channel.id, fan_a.id).unwrap();

        let profile = store
            .channel_profile("channel", Some(fan_a.id))
            .unwrap()
            .unwrap();
        assert_eq!(profile.subscriber_count, 2);
        assert_eq!(profile.subscribed_to_count, 1);
        assert!(profile.subscribed_by_viewer);

        // No viewer: flags are false, never an error.
        let anonymous = store.channel_profile("channel", None).unwrap().unwrap();
        assert!(!anonymous.subscribed_by_viewer);
        assert_eq!(anonymous.subscriber_count, 2);
    }
}
