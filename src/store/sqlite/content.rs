//! Comment and tweet storage.

use super::{now_ms, SqliteStore};
use crate::enrichment::models::{CommentView, TweetView};
use crate::enrichment::queries::{CommentQuery, TweetQuery};
use crate::pagination::{Page, PageRequest};
use crate::store::models::*;
use crate::store::trait_def::{CommentStore, TweetStore};
use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

fn comment_from_row(row: &Row) -> rusqlite::Result<CommentRecord> {
    let parse = |s: String, idx| {
        Uuid::parse_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    };
    Ok(CommentRecord {
        id: parse(row.get(0)?, 0)?,
        video_id: parse(row.get(1)?, 1)?,
        owner_id: parse(row.get(2)?, 2)?,
        content: row.get(3)?,
        created: row.get(4)?,
        updated: row.get(5)?,
    })
}

fn tweet_from_row(row: &Row) -> rusqlite::Result<TweetRecord> {
    let parse = |s: String, idx| {
        Uuid::parse_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    };
    Ok(TweetRecord {
        id: parse(row.get(0)?, 0)?,
        owner_id: parse(row.get(1)?, 1)?,
        content: row.get(2)?,
        created: row.get(3)?,
        updated: row.get(4)?,
    })
}

impl CommentStore for SqliteStore {
    fn add_comment(&self, video: Uuid, owner: Uuid, content: &str) -> Result<CommentRecord> {
        let record = CommentRecord {
            id: Uuid::new_v4(),
            video_id: video,
            owner_id: owner,
            content: content.to_string(),
            created: now_ms(),
            updated: now_ms(),
        };
        let conn = self.lock();
        conn.execute(
            "INSERT INTO comments (id, video_id, owner_id, content, created, updated) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.id.to_string(),
                record.video_id.to_string(),
                record.owner_id.to_string(),
                record.content,
                record.created,
                record.updated,
            ],
        )
        .context("Failed to add comment")?;
        Ok(record)
    }

    fn comment_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>> {
        let conn = self.lock();
        let comment = conn
            .prepare_cached(
                "SELECT id, video_id, owner_id, content, created, updated \
                 FROM comments WHERE id = ?1",
            )?
            .query_row(params![id.to_string()], comment_from_row)
            .optional()
            .context("Failed to look up comment")?;
        Ok(comment)
    }

    fn update_comment(&self, id: Uuid, content: &str) -> Result<Option<CommentRecord>> {
        let updated = {
            let conn = self.lock();
            let mut stmt =
                conn.prepare_cached("UPDATE comments SET content = ?1, updated = ?2 WHERE id = ?3")?;
            stmt.execute(params![content, now_ms(), id.to_string()])?
        };
        if updated == 0 {
            return Ok(None);
        }
        self.comment_by_id(id)
    }

    fn delete_comment(&self, id: Uuid) -> Result<Option<CommentRecord>> {
        let Some(record) = self.comment_by_id(id)? else {
            return Ok(None);
        };
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM reactions WHERE target_kind = ?1 AND target_id = ?2",
            params![TargetKind::Comment.to_int(), id.to_string()],
        )?;
        tx.execute("DELETE FROM comments WHERE id = ?1", params![id.to_string()])?;
        tx.commit().context("Failed to delete comment")?;
        Ok(Some(record))
    }

    fn comments_page(
        &self,
        video: Uuid,
        request: PageRequest,
        viewer: Option<Uuid>,
    ) -> Result<Page<CommentView>> {
        let conn = self.lock();
        CommentQuery::new(viewer).page_for_video(&conn, video, request)
    }
}

impl TweetStore for SqliteStore {
    fn create_tweet(&self, owner: Uuid, content: &str) -> Result<TweetRecord> {
        let record = TweetRecord {
            id: Uuid::new_v4(),
            owner_id: owner,
            content: content.to_string(),
            created: now_ms(),
            updated: now_ms(),
        };
        let conn = self.lock();
        conn.execute(
            "INSERT INTO tweets (id, owner_id, content, created, updated) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id.to_string(),
                record.owner_id.to_string(),
                record.content,
                record.created,
                record.updated,
            ],
        )
        .context("Failed to create tweet")?;
        Ok(record)
    }

    fn tweet_by_id(&self, id: Uuid) -> Result<Option<TweetRecord>> {
        let conn = self.lock();
        let tweet = conn
            .prepare_cached("SELECT id, owner_id, content, created, updated FROM tweets WHERE id = ?1")?
            .query_row(params![id.to_string()], tweet_from_row)
            .optional()
            .context("Failed to look up tweet")?;
        Ok(tweet)
    }

    fn update_tweet(&self, id: Uuid, content: &str) -> Result<Option<TweetRecord>> {
        let updated = {
            let conn = self.lock();
            let mut stmt =
                conn.prepare_cached("UPDATE tweets SET content = ?1, updated = ?2 WHERE id = ?3")?;
            stmt.execute(params![content, now_ms(), id.to_string()])?
        };
        if updated == 0 {
            return Ok(None);
        }
        self.tweet_by_id(id)
    }

    fn delete_tweet(&self, id: Uuid) -> Result<Option<TweetRecord>> {
        let Some(record) = self.tweet_by_id(id)? else {
            return Ok(None);
        };
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM reactions WHERE target_kind = ?1 AND target_id = ?2",
            params![TargetKind::Tweet.to_int(), id.to_string()],
        )?;
        tx.execute("DELETE FROM tweets WHERE id = ?1", params![id.to_string()])?;
        tx.commit().context("Failed to delete tweet")?;
        Ok(Some(record))
    }

    fn tweets_for_user(&self, owner: Uuid, viewer: Option<Uuid>) -> Result<Vec<TweetView>> {
        let conn = self.lock();
        TweetQuery::new(viewer).for_owner(&conn, owner)
    }
}
