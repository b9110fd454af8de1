//! Playlist storage: ordered video sequences, duplicates permitted.

use super::{now_ms, SqliteStore};
use crate::enrichment::models::PlaylistDetail;
use crate::enrichment::queries::PlaylistQuery;
use crate::store::models::PlaylistRecord;
use crate::store::trait_def::PlaylistStore;
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

fn playlist_from_row(row: &Row) -> rusqlite::Result<PlaylistRecord> {
    let parse = |s: String, idx| {
        Uuid::parse_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    };
    Ok(PlaylistRecord {
        id: parse(row.get(0)?, 0)?,
        owner_id: parse(row.get(1)?, 1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created: row.get(4)?,
    })
}

impl PlaylistStore for SqliteStore {
    fn create_playlist(
        &self,
        owner: Uuid,
        name: &str,
        description: &str,
    ) -> Result<PlaylistRecord> {
        let record = PlaylistRecord {
            id: Uuid::new_v4(),
            owner_id: owner,
            name: name.to_string(),
            description: description.to_string(),
            created: now_ms(),
        };
        let conn = self.lock();
        conn.execute(
            "INSERT INTO playlists (id, owner_id, name, description, created) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id.to_string(),
                record.owner_id.to_string(),
                record.name,
                record.description,
                record.created,
            ],
        )
        .context("Failed to create playlist")?;
        Ok(record)
    }

    fn playlists_for_owner(&self, owner: Uuid) -> Result<Vec<PlaylistRecord>> {
        let conn = self.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT id, owner_id, name, description, created FROM playlists \
             WHERE owner_id = ?1 ORDER BY created DESC, id",
        )?;
        let playlists = stmt
            .query_map(params![owner.to_string()], playlist_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to list playlists")?;
        Ok(playlists)
    }

    fn playlist_by_id(&self, id: Uuid) -> Result<Option<PlaylistRecord>> {
        let conn = self.lock();
        let playlist = conn
            .prepare_cached(
                "SELECT id, owner_id, name, description, created FROM playlists WHERE id = ?1",
            )?
            .query_row(params![id.to_string()], playlist_from_row)
            .optional()
            .context("Failed to look up playlist")?;
        Ok(playlist)
    }

    fn playlist_detail(&self, id: Uuid) -> Result<Option<PlaylistDetail>> {
        let conn = self.lock();
        PlaylistQuery::detail(&conn, id)
    }

    fn add_video_to_playlist(&self, playlist: Uuid, video: Uuid) -> Result<Option<PlaylistRecord>> {
        let Some(record) = self.playlist_by_id(playlist)? else {
            return Ok(None);
        };
        let conn = self.lock();
        conn.execute(
            "INSERT INTO playlist_videos (playlist_id, video_id, position) \
             VALUES (?1, ?2, (SELECT IFNULL(MAX(position) + 1, 0) \
                              FROM playlist_videos WHERE playlist_id = ?1))",
            params![playlist.to_string(), video.to_string()],
        )
        .context("Failed to add video to playlist")?;
        Ok(Some(record))
    }

    fn remove_video_from_playlist(
        &self,
        playlist: Uuid,
        video: Uuid,
    ) -> Result<Option<PlaylistRecord>> {
        let Some(record) = self.playlist_by_id(playlist)? else {
            return Ok(None);
        };
        let conn = self.lock();
        conn.execute(
            "DELETE FROM playlist_videos WHERE playlist_id = ?1 AND video_id = ?2",
            params![playlist.to_string(), video.to_string()],
        )
        .context("Failed to remove video from playlist")?;
        Ok(Some(record))
    }

    fn update_playlist(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<PlaylistRecord>> {
        let updated = {
            let conn = self.lock();
            let mut stmt = conn.prepare_cached(
                "UPDATE playlists SET name = IFNULL(?1, name), \
                 description = IFNULL(?2, description) WHERE id = ?3",
            )?;
            stmt.execute(params![name, description, id.to_string()])?
        };
        if updated == 0 {
            return Ok(None);
        }
        self.playlist_by_id(id)
    }

    fn delete_playlist(&self, id: Uuid) -> Result<Option<PlaylistRecord>> {
        let Some(record) = self.playlist_by_id(id)? else {
            return Ok(None);
        };
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM playlist_videos WHERE playlist_id = ?1",
            params![id.to_string()],
        )?;
        tx.execute("DELETE FROM playlists WHERE id = ?1", params![id.to_string()])?;
        tx.commit().context("Failed to delete playlist")?;
        Ok(Some(record))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::store::trait_def::PlaylistStore;

    #[test]
    fn playlist_crud() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");

        let playlist = store
            .create_playlist(owner.id, "mix", "a mix of things")
            .unwrap();
        assert_eq!(store.playlists_for_owner(owner.id).unwrap().len(), 1);

        let renamed = store
            .update_playlist(playlist.id, Some("new mix"), None)
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "new mix");
        assert_eq!(renamed.description, "a mix of things");

        store.delete_playlist(playlist.id).unwrap().unwrap();
        assert!(store.playlist_by_id(playlist.id).unwrap().is_none());
    }

    #[test]
    fn playlist_keeps_order_and_duplicates() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let a = make_video(&store, owner.id, "a");
        let b = make_video(&store, owner.id, "b");
        let playlist = store.create_playlist(owner.id, "mix", "desc").unwrap();

        store.add_video_to_playlist(playlist.id, a.id).unwrap();
        store.add_video_to_playlist(playlist.id, b.id).unwrap();
        store.add_video_to_playlist(playlist.id, a.id).unwrap();

        let detail = store.playlist_detail(playlist.id).unwrap().unwrap();
        let order: Vec<_> = detail.videos.iter().map(|v| v.id).collect();
        assert_eq!(order, vec![a.id, b.id, a.id]);
        assert_eq!(
            detail.owner.as_ref().map(|o| o.username.as_str()),
            Some("owner")
        );
    }

    #[test]
    fn remove_drops_every_occurrence() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let a = make_video(&store, owner.id, "a");
        let b = make_video(&store, owner.id, "b");
        let playlist = store.create_playlist(owner.id, "mix", "desc").unwrap();

        for video in [a.id, b.id, a.id] {
            store.add_video_to_playlist(playlist.id, video).unwrap();
        }
        store.remove_video_from_playlist(playlist.id, a.id).unwrap();

        let detail = store.playlist_detail(playlist.id).unwrap().unwrap();
        let order: Vec<_> = detail.videos.iter().map(|v| v.id).collect();
        assert_eq!(order, vec![b.id]);
    }

    #[test]
    fn missing_playlist_returns_none() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let video = make_video(&store, owner.id, "v");
        let ghost = uuid::Uuid::new_v4();

        assert!(store.add_video_to_playlist(ghost, video.id).unwrap().is_none());
        assert!(store.update_playlist(ghost, Some("x"), None).unwrap().is_none());
        assert!(store.delete_playlist(ghost).unwrap().is_none());
    }
}
