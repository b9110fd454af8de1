//! VideoStore implementation.

use super::{now_ms, SqliteStore};
use crate::enrichment::models::{VideoDetail, VideoView};
use crate::enrichment::queries::{VideoFilter, VideoQuery, VideoSort};
use crate::pagination::{Page, PageRequest};
use crate::store::models::*;
use crate::store::trait_def::VideoStore;
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

const VIDEO_COLS: &str = "id, owner_id, video_url, video_asset_id, thumbnail_url, \
                          thumbnail_asset_id, title, description, duration_secs, views, \
                          is_published, created, updated";

pub(super) fn video_from_row(row: &Row) -> rusqlite::Result<VideoRecord> {
    let id: String = row.get(0)?;
    let owner: String = row.get(1)?;
    let parse = |s: &str, idx| {
        Uuid::parse_str(s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    };
    Ok(VideoRecord {
        id: parse(&id, 0)?,
        owner_id: parse(&owner, 1)?,
        video_url: row.get(2)?,
        video_asset_id: row.get(3)?,
        thumbnail_url: row.get(4)?,
        thumbnail_asset_id: row.get(5)?,
        title: row.get(6)?,
        description: row.get(7)?,
        duration_secs: row.get(8)?,
        views: row.get(9)?,
        is_published: row.get(10)?,
        created: row.get(11)?,
        updated: row.get(12)?,
    })
}

impl VideoStore for SqliteStore {
    fn create_video(&self, new: NewVideo) -> Result<VideoRecord> {
        let record = VideoRecord {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            video_url: new.video_url,
            video_asset_id: new.video_asset_id,
            thumbnail_url: new.thumbnail_url,
            thumbnail_asset_id: new.thumbnail_asset_id,
            title: new.title,
            description: new.description,
            duration_secs: new.duration_secs,
            views: 0,
            is_published: true,
            created: now_ms(),
            updated: now_ms(),
        };
        let conn = self.lock();
        conn.execute(
            &format!(
                "INSERT INTO videos ({VIDEO_COLS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                record.id.to_string(),
                record.owner_id.to_string(),
                record.video_url,
                record.video_asset_id,
                record.thumbnail_url,
                record.thumbnail_asset_id,
                record.title,
                record.description,
                record.duration_secs,
                record.views,
                record.is_published,
                record.created,
                record.updated,
            ],
        )
        .context("Failed to create video")?;
        Ok(record)
    }

    fn video_by_id(&self, id: Uuid) -> Result<Option<VideoRecord>> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare_cached(&format!("SELECT {VIDEO_COLS} FROM videos WHERE id = ?1"))?;
        let video = stmt
            .query_row(params![id.to_string()], video_from_row)
            .optional()
            .context("Failed to look up video")?;
        Ok(video)
    }

    fn update_video(&self, id: Uuid, patch: VideoPatch) -> Result<Option<VideoRecord>> {
        {
            let conn = self.lock();
            let mut sets = vec!["updated = :updated".to_string()];
            let mut bindings: Vec<(&'static str, Box<dyn rusqlite::ToSql>)> = vec![
                (":updated", Box::new(now_ms())),
                (":id", Box::new(id.to_string())),
            ];
            if let Some(title) = &patch.title {
                sets.push("title = :title".to_string());
                bindings.push((":title", Box::new(title.clone())));
            }
            if let Some(description) = &patch.description {
                sets.push("description = :description".to_string());
                bindings.push((":description", Box::new(description.clone())));
            }
            if let Some((url, asset_id)) = &patch.thumbnail {
                sets.push("thumbnail_url = :thumb_url".to_string());
                sets.push("thumbnail_asset_id = :thumb_asset".to_string());
                bindings.push((":thumb_url", Box::new(url.clone())));
                bindings.push((":thumb_asset", Box::new(asset_id.clone())));
            }
            let sql = format!("UPDATE videos SET {} WHERE id = :id", sets.join(", "));
            let mut stmt = conn.prepare_cached(&sql)?;
            let bound: Vec<(&str, &dyn rusqlite::ToSql)> =
                bindings.iter().map(|(n, v)| (*n, v.as_ref())).collect();
            let updated = stmt.execute(bound.as_slice())?;
            if updated == 0 {
                return Ok(None);
            }
        }
        self.video_by_id(id)
    }

    fn delete_video(&self, id: Uuid) -> Result<Option<VideoRecord>> {
        let Some(record) = self.video_by_id(id)? else {
            return Ok(None);
        };
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        let video_id = id.to_string();
        tx.execute(
            "DELETE FROM reactions WHERE target_kind = ?1 AND target_id IN \
             (SELECT id FROM comments WHERE video_id = ?2)",
            params![TargetKind::Comment.to_int(), video_id],
        )?;
        tx.execute("DELETE FROM comments WHERE video_id = ?1", params![video_id])?;
        tx.execute(
            "DELETE FROM reactions WHERE target_kind = ?1 AND target_id = ?2",
            params![TargetKind::Video.to_int(), video_id],
        )?;
        tx.execute(
            "DELETE FROM playlist_videos WHERE video_id = ?1",
            params![video_id],
        )?;
        tx.execute(
            "DELETE FROM watch_history WHERE video_id = ?1",
            params![video_id],
        )?;
        tx.execute("DELETE FROM videos WHERE id = ?1", params![video_id])?;
        tx.commit().context("Failed to delete video")?;
        Ok(Some(record))
    }

    fn toggle_publish(&self, id: Uuid) -> Result<Option<VideoRecord>> {
        let updated = {
            let conn = self.lock();
            let mut stmt = conn.prepare_cached(
                "UPDATE videos SET is_published = NOT is_published, updated = ?1 WHERE id = ?2",
            )?;
            stmt.execute(params![now_ms(), id.to_string()])?
        };
        if updated == 0 {
            return Ok(None);
        }
        self.video_by_id(id)
    }

    fn increment_views(&self, id: Uuid) -> Result<()> {
        let conn = self.lock();
        conn.prepare_cached("UPDATE videos SET views = views + 1 WHERE id = ?1")?
            .execute(params![id.to_string()])?;
        Ok(())
    }

    fn list_videos(
        &self,
        filter: &VideoFilter,
        sort: VideoSort,
        request: PageRequest,
        viewer: Option<Uuid>,
    ) -> Result<Page<VideoView>> {
        let conn = self.lock();
        VideoQuery::new(viewer).page(&conn, filter, sort, request)
    }

    fn video_detail(&self, id: Uuid, viewer: Option<Uuid>) -> Result<Option<VideoDetail>> {
        let conn = self.lock();
        VideoQuery::new(viewer).detail(&conn, id)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::enrichment::queries::{SortDirection, VideoFilter, VideoSort, VideoSortKey};
    use crate::pagination::PageRequest;
    use crate::store::models::*;
    use crate::store::trait_def::{CommentStore, EngagementStore, PlaylistStore, VideoStore};

    #[test]
    fn create_update_delete_video() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let video = make_video(&store, owner.id, "first");

        let patched = store
            .update_video(
                video.id,
                VideoPatch {
                    title: Some("renamed".to_string()),
                    description: None,
                    thumbnail: Some(("https://cdn/new.jpg".to_string(), "thumb-2".to_string())),
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(patched.title, "renamed");
        assert_eq!(patched.description, video.description);
        assert_eq!(patched.thumbnail_asset_id, "thumb-2");

        let deleted = store.delete_video(video.id).unwrap().unwrap();
        assert_eq!(deleted.id, video.id);
        assert!(store.video_by_id(video.id).unwrap().is_none());
        assert!(store.delete_video(video.id).unwrap().is_none());
    }

    #[test]
    fn toggle_publish_flips_flag() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let video = make_video(&store, owner.id, "v");
        assert!(video.is_published);

        let hidden = store.toggle_publish(video.id).unwrap().unwrap();
        assert!(!hidden.is_published);
        let shown = store.toggle_publish(video.id).unwrap().unwrap();
        assert!(shown.is_published);
    }

    #[test]
    fn delete_video_cascades() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let fan = make_user(&store, "fan");
        let video = make_video(&store, owner.id, "v");

        let comment = store.add_comment(video.id, fan.id, "nice").unwrap();
        store
            .toggle_reaction(fan.id, ReactionTarget::Video(video.id), ReactionKind::Like)
            .unwrap();
        store
            .toggle_reaction(
                owner.id,
                ReactionTarget::Comment(comment.id),
                ReactionKind::Like,
            )
            .unwrap();
        let playlist = store.create_playlist(fan.id, "faves", "best").unwrap();
        store.add_video_to_playlist(playlist.id, video.id).unwrap();

        store.delete_video(video.id).unwrap().unwrap();

        assert!(store.comment_by_id(comment.id).unwrap().is_none());
        assert!(store
            .reacted_videos(fan.id, ReactionKind::Like)
            .unwrap()
            .is_empty());
        let detail = store.playlist_detail(playlist.id).unwrap().unwrap();
        assert!(detail.videos.is_empty());
    }

    #[test]
    fn list_videos_pages_cover_match_set() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        for i in 0..7 {
            make_video(&store, owner.id, &format!("video-{:02}", i));
        }

        let filter = VideoFilter {
            published_only: true,
            ..Default::default()
        };
        let sort = VideoSort {
            key: VideoSortKey::Title,
            direction: SortDirection::Asc,
        };

        let mut seen = Vec::new();
        for page_no in 1..=3 {
            let page = store
                .list_videos(
                    &filter,
                    sort,
                    PageRequest::from_raw(Some(&page_no.to_string()), Some("3")),
                    None,
                )
                .unwrap();
            assert_eq!(page.total_items, 7);
            assert_eq!(page.total_pages, 3);
            assert_eq!(page.current_page, page_no);
            assert_eq!(page.has_prev_page, page_no > 1);
            assert_eq!(page.has_next_page, page_no < 3);
            seen.extend(page.items.into_iter().map(|v| v.title));
        }
        let expected: Vec<String> = (0..7).map(|i| format!("video-{:02}", i)).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn list_videos_filters_unpublished_and_text() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let hidden = make_video(&store, owner.id, "rust tutorial");
        make_video(&store, owner.id, "cooking show");
        make_video(&store, owner.id, "rust talk");
        store.toggle_publish(hidden.id).unwrap();

        let page = store
            .list_videos(
                &VideoFilter {
                    published_only: true,
                    owner: None,
                    text: Some("rust".to_string()),
                },
                VideoSort::default(),
                PageRequest::default(),
                None,
            )
            .unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].title, "rust talk");
    }

    #[test]
    fn video_detail_attaches_enriched_comments() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let fan = make_user(&store, "fan");
        let video = make_video(&store, owner.id, "v");

        let c1 = store.add_comment(video.id, fan.id, "first!").unwrap();
        store.add_comment(video.id, owner.id, "thanks").unwrap();
        store
            .toggle_reaction(owner.id, ReactionTarget::Comment(c1.id), ReactionKind::Like)
            .unwrap();
        store
            .toggle_reaction(fan.id, ReactionTarget::Video(video.id), ReactionKind::Like)
            .unwrap();

        let detail = store.video_detail(video.id, Some(fan.id)).unwrap().unwrap();
        assert_eq!(detail.comment_count, 2);
        assert_eq!(detail.comments.len(), 2);
        assert_eq!(detail.video.like_count, 1);
        assert!(detail.video.liked_by_viewer);
        assert!(!detail.video.disliked_by_viewer);

        let first = detail
            .comments
            .iter()
            .find(|c| c.id == c1.id)
            .expect("comment present");
        assert_eq!(first.like_count, 1);
        assert!(!first.liked_by_viewer);
        assert_eq!(
            first.owner.as_ref().map(|o| o.username.as_str()),
            Some("fan")
        );
    }

    #[test]
    fn enrichment_flags_false_without_viewer() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let fan = make_user(&store, "fan");
        let video = make_video(&store, owner.id, "v");
        store
            .toggle_reaction(fan.id, ReactionTarget::Video(video.id), ReactionKind::Like)
            .unwrap();

        let detail = store.video_detail(video.id, None).unwrap().unwrap();
        assert_eq!(detail.video.like_count, 1);
        assert!(!detail.video.liked_by_viewer);
        assert!(!detail.video.disliked_by_viewer);
    }
}
