//! Watch-history recency list.

use super::SqliteStore;
use crate::enrichment::models::VideoView;
use crate::enrichment::queries::VideoQuery;
use crate::store::trait_def::HistoryStore;
use anyhow::{Context, Result};
use rusqlite::params;
use uuid::Uuid;

/// Upper bound on history entries kept per user; the oldest rows beyond
/// it are trimmed on every view.
const HISTORY_CAP: i64 = 100;

impl HistoryStore for SqliteStore {
    fn record_view(&self, user: Uuid, video: Uuid) -> Result<()> {
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        let user_id = user.to_string();
        let video_id = video.to_string();

        // Move-to-front: drop any prior occurrence, reinsert so the row
        // gets a fresh (highest) seq.
        tx.execute(
            "DELETE FROM watch_history WHERE user_id = ?1 AND video_id = ?2",
            params![user_id, video_id],
        )?;
        tx.execute(
            "INSERT INTO watch_history (user_id, video_id) VALUES (?1, ?2)",
            params![user_id, video_id],
        )?;
        tx.execute(
            "DELETE FROM watch_history WHERE user_id = ?1 AND seq NOT IN \
             (SELECT seq FROM watch_history WHERE user_id = ?1 ORDER BY seq DESC LIMIT ?2)",
            params![user_id, HISTORY_CAP],
        )?;
        // Every fetch counts as a view; no per-viewer deduplication.
        tx.execute(
            "UPDATE videos SET views = views + 1 WHERE id = ?1",
            params![video_id],
        )?;
        tx.commit().context("Failed to record view")?;
        Ok(())
    }

    fn watch_history(&self, user: Uuid) -> Result<Vec<VideoView>> {
        let conn = self.lock();
        VideoQuery::new(Some(user)).watch_history(&conn, user)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::store::trait_def::{HistoryStore, VideoStore};

    #[test]
    fn reviewing_moves_video_to_front() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let watcher = make_user(&store, "watcher");
        let a = make_video(&store, owner.id, "a");
        let b = make_video(&store, owner.id, "b");
        let c = make_video(&store, owner.id, "c");

        for video in [a.id, b.id, a.id, c.id] {
            store.record_view(watcher.id, video).unwrap();
        }

        let history = store.watch_history(watcher.id).unwrap();
        let order: Vec<_> = history.iter().map(|v| v.id).collect();
        assert_eq!(order, vec![c.id, a.id, b.id]);
    }

    #[test]
    fn each_view_increments_the_counter() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let watcher = make_user(&store, "watcher");
        let video = make_video(&store, owner.id, "v");

        store.record_view(watcher.id, video.id).unwrap();
        store.record_view(watcher.id, video.id).unwrap();
        store.record_view(watcher.id, video.id).unwrap();

        let fetched = store.video_by_id(video.id).unwrap().unwrap();
        assert_eq!(fetched.views, 3);

        // Deduplicated in the history even though views kept counting.
        assert_eq!(store.watch_history(watcher.id).unwrap().len(), 1);
    }

    #[test]
    fn history_is_bounded() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let watcher = make_user(&store, "watcher");

        let mut last = None;
        for i in 0..110 {
            let video = make_video(&store, owner.id, &format!("v{}", i));
            store.record_view(watcher.id, video.id).unwrap();
            last = Some(video.id);
        }

        let history = store.watch_history(watcher.id).unwrap();
        assert_eq!(history.len(), 100);
        assert_eq!(history[0].id, last.unwrap());
    }

    #[test]
    fn deleted_videos_vanish_from_history() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let watcher = make_user(&store, "watcher");
        let a = make_video(&store, owner.id, "a");
        let b = make_video(&store, owner.id, "b");

        store.record_view(watcher.id, a.id).unwrap();
        store.record_view(watcher.id, b.id).unwrap();
        store.delete_video(b.id).unwrap();

        let history = store.watch_history(watcher.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, a.id);
    }
}
