//! Typed query builders that attach computed relationship state to
//! primary records.
//!
//! Each entity gets a query object enumerating its fixed set of
//! enrichment columns: a count column is the cardinality of a grouped
//! join against `reactions`/`subscriptions`, a flag column is an
//! existence probe for `(actor = viewer, target = record)`, and the
//! owner join projects the owning user's public fields first-match-only.
//! The window (LIMIT/OFFSET) is part of the base select, so enrichment
//! columns are only ever computed for the records of the requested page.

use super::models::*;
use crate::pagination::{Page, PageRequest};
use crate::store::models::{PublicUser, ReactionKind, TargetKind};
use anyhow::{Context, Result};
use rusqlite::{Connection, Row, ToSql};
use uuid::Uuid;

/// The identity relationship flags are computed against. An absent or
/// unknown viewer binds to a value no actor column can match, so every
/// flag resolves to `false` rather than an error.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub Option<Uuid>);

impl Viewer {
    pub fn anonymous() -> Self {
        Viewer(None)
    }

    fn bind(&self) -> String {
        self.0.map(|id| id.to_string()).unwrap_or_default()
    }
}

impl From<Option<Uuid>> for Viewer {
    fn from(v: Option<Uuid>) -> Self {
        Viewer(v)
    }
}

type NamedParams = Vec<(&'static str, Box<dyn ToSql>)>;

fn query_params(params: &NamedParams) -> Vec<(&str, &dyn ToSql)> {
    params.iter().map(|(n, v)| (*n, v.as_ref())).collect()
}

// =========================================================================
// Enrichment column fragments
// =========================================================================

/// Fixed set of computed columns appended to a base select.
struct EnrichmentColumns {
    cols: Vec<String>,
}

impl EnrichmentColumns {
    fn new() -> Self {
        Self { cols: Vec::new() }
    }

    /// like_count / dislike_count for the record identified by `expr`.
    fn reaction_counts(mut self, target: TargetKind, expr: &str) -> Self {
        for (kind, alias) in [(ReactionKind::Like, "like_count"), (ReactionKind::Dislike, "dislike_count")] {
            self.cols.push(format!(
                "(SELECT COUNT(*) FROM reactions WHERE target_kind = {} AND reaction = {} AND target_id = {}) AS {}",
                target.to_int(),
                kind.to_int(),
                expr,
                alias
            ));
        }
        self
    }

    /// liked_by_viewer / disliked_by_viewer existence probes, limited to
    /// one match and cast to a boolean.
    fn reaction_flags(mut self, target: TargetKind, expr: &str) -> Self {
        for (kind, alias) in [
            (ReactionKind::Like, "liked_by_viewer"),
            (ReactionKind::Dislike, "disliked_by_viewer"),
        ] {
            self.cols.push(format!(
                "EXISTS(SELECT 1 FROM reactions WHERE target_kind = {} AND reaction = {} AND target_id = {} AND actor_id = :viewer) AS {}",
                target.to_int(),
                kind.to_int(),
                expr,
                alias
            ));
        }
        self
    }

    fn subscriber_count(mut self, channel_expr: &str) -> Self {
        self.cols.push(format!(
            "(SELECT COUNT(*) FROM subscriptions WHERE channel_id = {}) AS subscriber_count",
            channel_expr
        ));
        self
    }

    fn subscribed_to_count(mut self, subscriber_expr: &str) -> Self {
        self.cols.push(format!(
            "(SELECT COUNT(*) FROM subscriptions WHERE subscriber_id = {}) AS subscribed_to_count",
            subscriber_expr
        ));
        self
    }

    fn subscription_flag(mut self, channel_expr: &str) -> Self {
        self.cols.push(format!(
            "EXISTS(SELECT 1 FROM subscriptions WHERE channel_id = {} AND subscriber_id = :viewer) AS subscribed_by_viewer",
            channel_expr
        ));
        self
    }

    fn sql(&self) -> String {
        self.cols.join(",\n       ")
    }
}

/// Owner projection columns; always read in this order right after the
/// primary record's own columns.
const OWNER_COLS: &str = "o.id, o.full_name, o.username, o.email, o.avatar_url";

fn uuid_col(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// First-match owner projection; a dangling owner reference yields None.
fn owner_col(row: &Row, base: usize) -> rusqlite::Result<Option<PublicUser>> {
    let id: Option<String> = row.get(base)?;
    let Some(id) = id else {
        return Ok(None);
    };
    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(base, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Some(PublicUser {
        id,
        full_name: row.get(base + 1)?,
        username: row.get(base + 2)?,
        email: row.get(base + 3)?,
        avatar_url: row.get(base + 4)?,
    }))
}

// =========================================================================
// Videos
// =========================================================================

/// Match criteria for video listings.
#[derive(Debug, Default, Clone)]
pub struct VideoFilter {
    pub published_only: bool,
    pub owner: Option<Uuid>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoSortKey {
    Created,
    Views,
    Duration,
    Title,
}

impl VideoSortKey {
    /// Whitelisted sort columns; anything else is rejected at parse time.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "createdAt" | "created" => Some(VideoSortKey::Created),
            "views" => Some(VideoSortKey::Views),
            "duration" => Some(VideoSortKey::Duration),
            "title" => Some(VideoSortKey::Title),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            VideoSortKey::Created => "v.created",
            VideoSortKey::Views => "v.views",
            VideoSortKey::Duration => "v.duration_secs",
            VideoSortKey::Title => "v.title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VideoSort {
    pub key: VideoSortKey,
    pub direction: SortDirection,
}

impl Default for VideoSort {
    fn default() -> Self {
        Self {
            key: VideoSortKey::Created,
            direction: SortDirection::Desc,
        }
    }
}

const VIDEO_COLS: &str =
    "v.id, v.title, v.description, v.thumbnail_url, v.video_url, v.duration_secs, v.views, v.is_published, v.created";

fn video_view_from_row(row: &Row) -> rusqlite::Result<VideoView> {
    Ok(VideoView {
        id: uuid_col(row, 0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        thumbnail_url: row.get(3)?,
        video_url: row.get(4)?,
        duration_secs: row.get(5)?,
        views: row.get(6)?,
        is_published: row.get(7)?,
        created: row.get(8)?,
        owner: owner_col(row, 9)?,
        like_count: row.get::<_, i64>(14)? as u64,
        dislike_count: row.get::<_, i64>(15)? as u64,
        liked_by_viewer: row.get(16)?,
        disliked_by_viewer: row.get(17)?,
    })
}

pub struct VideoQuery {
    viewer: Viewer,
}

impl VideoQuery {
    pub fn new<V: Into<Viewer>>(viewer: V) -> Self {
        Self {
            viewer: viewer.into(),
        }
    }

    fn enrichment(&self) -> EnrichmentColumns {
        EnrichmentColumns::new()
            .reaction_counts(TargetKind::Video, "v.id")
            .reaction_flags(TargetKind::Video, "v.id")
    }

    fn filter_clauses(filter: &VideoFilter, params: &mut NamedParams) -> String {
        let mut clauses = Vec::new();
        if filter.published_only {
            clauses.push("v.is_published = 1".to_string());
        }
        if let Some(owner) = filter.owner {
            clauses.push("v.owner_id = :owner".to_string());
            params.push((":owner", Box::new(owner.to_string())));
        }
        if let Some(text) = &filter.text {
            clauses.push("(v.title LIKE :text OR v.description LIKE :text)".to_string());
            params.push((":text", Box::new(format!("%{}%", text))));
        }
        if clauses.is_empty() {
            "1 = 1".to_string()
        } else {
            clauses.join(" AND ")
        }
    }

    /// Total match count, independent of the window.
    pub fn count(&self, conn: &Connection, filter: &VideoFilter) -> Result<u64> {
        let mut params: NamedParams = Vec::new();
        let where_sql = Self::filter_clauses(filter, &mut params);
        let sql = format!("SELECT COUNT(*) FROM videos v WHERE {}", where_sql);
        let mut stmt = conn.prepare_cached(&sql)?;
        let count: i64 = stmt.query_row(query_params(&params).as_slice(), |r| r.get(0))?;
        Ok(count as u64)
    }

    /// One window of matching videos, sorted then enriched.
    pub fn page(
        &self,
        conn: &Connection,
        filter: &VideoFilter,
        sort: VideoSort,
        request: PageRequest,
    ) -> Result<Page<VideoView>> {
        let total = self.count(conn, filter)?;

        let mut params: NamedParams = vec![(":viewer", Box::new(self.viewer.bind()))];
        let where_sql = Self::filter_clauses(filter, &mut params);
        params.push((":limit", Box::new(i64::from(request.limit))));
        params.push((":offset", Box::new(request.offset() as i64)));

        let sql = format!(
            "SELECT {VIDEO_COLS},\n       {OWNER_COLS},\n       {}\n\
             FROM videos v\n\
             LEFT JOIN users o ON o.id = v.owner_id\n\
             WHERE {}\n\
             ORDER BY {} {}, v.id\n\
             LIMIT :limit OFFSET :offset",
            self.enrichment().sql(),
            where_sql,
            sort.key.column(),
            sort.direction.keyword(),
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let items = stmt
            .query_map(query_params(&params).as_slice(), video_view_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to query video page")?;
        Ok(Page::assemble(items, total, request))
    }

    pub fn by_id(&self, conn: &Connection, id: Uuid) -> Result<Option<VideoView>> {
        let sql = format!(
            "SELECT {VIDEO_COLS},\n       {OWNER_COLS},\n       {}\n\
             FROM videos v\n\
             LEFT JOIN users o ON o.id = v.owner_id\n\
             WHERE v.id = :id",
            self.enrichment().sql(),
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: NamedParams = vec![
            (":viewer", Box::new(self.viewer.bind())),
            (":id", Box::new(id.to_string())),
        ];
        let mut rows = stmt.query_map(query_params(&params).as_slice(), video_view_from_row)?;
        rows.next().transpose().context("Failed to query video")
    }

    /// A fetched video with its comment thread attached; the comments go
    /// through the same enrichment rules, and commentCount is the
    /// cardinality of that nested set.
    pub fn detail(&self, conn: &Connection, id: Uuid) -> Result<Option<VideoDetail>> {
        let Some(video) = self.by_id(conn, id)? else {
            return Ok(None);
        };
        let comments = CommentQuery::new(self.viewer).for_video(conn, id)?;
        Ok(Some(VideoDetail {
            video,
            comment_count: comments.len() as u64,
            comments,
        }))
    }

    /// The viewer's watch history resolved to current records, most
    /// recent first; identifiers whose video no longer exists are
    /// silently dropped by the inner join.
    pub fn watch_history(&self, conn: &Connection, user: Uuid) -> Result<Vec<VideoView>> {
        let sql = format!(
            "SELECT {VIDEO_COLS},\n       {OWNER_COLS},\n       {}\n\
             FROM watch_history h\n\
             JOIN videos v ON v.id = h.video_id\n\
             LEFT JOIN users o ON o.id = v.owner_id\n\
             WHERE h.user_id = :user\n\
             ORDER BY h.seq DESC",
            self.enrichment().sql(),
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: NamedParams = vec![
            (":viewer", Box::new(self.viewer.bind())),
            (":user", Box::new(user.to_string())),
        ];
        let items = stmt
            .query_map(query_params(&params).as_slice(), video_view_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to query watch history")?;
        Ok(items)
    }

    /// Videos the actor reacted to with `kind`, newest reaction first.
    /// The join is inner: reactions to since-deleted videos are dropped.
    pub fn reacted_videos(
        &self,
        conn: &Connection,
        actor: Uuid,
        kind: ReactionKind,
    ) -> Result<Vec<ReactedVideo>> {
        let sql = format!(
            "SELECT r.id, r.created,\n       \
             v.id, v.title, v.thumbnail_url, v.duration_secs, v.views, v.created,\n       {OWNER_COLS}\n\
             FROM reactions r\n\
             JOIN videos v ON v.id = r.target_id\n\
             LEFT JOIN users o ON o.id = v.owner_id\n\
             WHERE r.actor_id = :actor AND r.target_kind = {} AND r.reaction = {}\n\
             ORDER BY r.created DESC, r.id",
            TargetKind::Video.to_int(),
            kind.to_int(),
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: NamedParams = vec![(":actor", Box::new(actor.to_string()))];
        let items = stmt
            .query_map(query_params(&params).as_slice(), |row| {
                Ok(ReactedVideo {
                    id: uuid_col(row, 0)?,
                    reacted_at: row.get(1)?,
                    video: Some(VideoSummary {
                        id: uuid_col(row, 2)?,
                        title: row.get(3)?,
                        thumbnail_url: row.get(4)?,
                        duration_secs: row.get(5)?,
                        views: row.get(6)?,
                        created: row.get(7)?,
                        owner: owner_col(row, 8)?,
                    }),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to query reacted videos")?;
        Ok(items)
    }
}

// =========================================================================
// Comments
// =========================================================================

const COMMENT_COLS: &str = "c.id, c.content, c.created, c.updated";

fn comment_view_from_row(row: &Row) -> rusqlite::Result<CommentView> {
    Ok(CommentView {
        id: uuid_col(row, 0)?,
        content: row.get(1)?,
        created: row.get(2)?,
        updated: row.get(3)?,
        owner: owner_col(row, 4)?,
        like_count: row.get::<_, i64>(9)? as u64,
        dislike_count: row.get::<_, i64>(10)? as u64,
        liked_by_viewer: row.get(11)?,
        disliked_by_viewer: row.get(12)?,
    })
}

pub struct CommentQuery {
    viewer: Viewer,
}

impl CommentQuery {
    pub fn new<V: Into<Viewer>>(viewer: V) -> Self {
        Self {
            viewer: viewer.into(),
        }
    }

    fn enrichment(&self) -> EnrichmentColumns {
        EnrichmentColumns::new()
            .reaction_counts(TargetKind::Comment, "c.id")
            .reaction_flags(TargetKind::Comment, "c.id")
    }

    fn base_select(&self) -> String {
        format!(
            "SELECT {COMMENT_COLS},\n       {OWNER_COLS},\n       {}\n\
             FROM comments c\n\
             LEFT JOIN users o ON o.id = c.owner_id\n\
             WHERE c.video_id = :video\n\
             ORDER BY c.created DESC, c.id",
            self.enrichment().sql(),
        )
    }

    /// All of a video's comments, enriched, newest first.
    pub fn for_video(&self, conn: &Connection, video: Uuid) -> Result<Vec<CommentView>> {
        let mut stmt = conn.prepare_cached(&self.base_select())?;
        let params: NamedParams = vec![
            (":viewer", Box::new(self.viewer.bind())),
            (":video", Box::new(video.to_string())),
        ];
        let items = stmt
            .query_map(query_params(&params).as_slice(), comment_view_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to query comments")?;
        Ok(items)
    }

    pub fn page_for_video(
        &self,
        conn: &Connection,
        video: Uuid,
        request: PageRequest,
    ) -> Result<Page<CommentView>> {
        let total: i64 = conn
            .prepare_cached("SELECT COUNT(*) FROM comments c WHERE c.video_id = :video")?
            .query_row(&[(":video", &video.to_string() as &dyn ToSql)], |r| r.get(0))?;

        let sql = format!("{}\nLIMIT :limit OFFSET :offset", self.base_select());
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: NamedParams = vec![
            (":viewer", Box::new(self.viewer.bind())),
            (":video", Box::new(video.to_string())),
            (":limit", Box::new(i64::from(request.limit))),
            (":offset", Box::new(request.offset() as i64)),
        ];
        let items = stmt
            .query_map(query_params(&params).as_slice(), comment_view_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to query comment page")?;
        Ok(Page::assemble(items, total as u64, request))
    }
}

// =========================================================================
// Tweets
// =========================================================================

pub struct TweetQuery {
    viewer: Viewer,
}

impl TweetQuery {
    pub fn new<V: Into<Viewer>>(viewer: V) -> Self {
        Self {
            viewer: viewer.into(),
        }
    }

    /// A user's tweets, newest first, with counts, viewer flags and the
    /// owner projection attached.
    pub fn for_owner(&self, conn: &Connection, owner: Uuid) -> Result<Vec<TweetView>> {
        let enrichment = EnrichmentColumns::new()
            .reaction_counts(TargetKind::Tweet, "t.id")
            .reaction_flags(TargetKind::Tweet, "t.id");
        let sql = format!(
            "SELECT t.id, t.content, t.created,\n       {OWNER_COLS},\n       {}\n\
             FROM tweets t\n\
             LEFT JOIN users o ON o.id = t.owner_id\n\
             WHERE t.owner_id = :owner\n\
             ORDER BY t.created DESC, t.id",
            enrichment.sql(),
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: NamedParams = vec![
            (":viewer", Box::new(self.viewer.bind())),
            (":owner", Box::new(owner.to_string())),
        ];
        let items = stmt
            .query_map(query_params(&params).as_slice(), |row| {
                Ok(TweetView {
                    id: uuid_col(row, 0)?,
                    content: row.get(1)?,
                    created: row.get(2)?,
                    owner: owner_col(row, 3)?,
                    like_count: row.get::<_, i64>(8)? as u64,
                    dislike_count: row.get::<_, i64>(9)? as u64,
                    liked_by_viewer: row.get(10)?,
                    disliked_by_viewer: row.get(11)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to query tweets")?;
        Ok(items)
    }
}

// =========================================================================
// Channels and subscriptions
// =========================================================================

pub struct ChannelQuery {
    viewer: Viewer,
}

impl ChannelQuery {
    pub fn new<V: Into<Viewer>>(viewer: V) -> Self {
        Self {
            viewer: viewer.into(),
        }
    }

    pub fn profile(&self, conn: &Connection, username: &str) -> Result<Option<ChannelProfile>> {
        let enrichment = EnrichmentColumns::new()
            .subscriber_count("u.id")
            .subscribed_to_count("u.id")
            .subscription_flag("u.id");
        let sql = format!(
            "SELECT u.id, u.full_name, u.username, u.email, u.avatar_url, u.cover_url,\n       {}\n\
             FROM users u\n\
             WHERE u.username = :username",
            enrichment.sql(),
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: NamedParams = vec![
            (":viewer", Box::new(self.viewer.bind())),
            (":username", Box::new(username.to_string())),
        ];
        let mut rows = stmt.query_map(query_params(&params).as_slice(), |row| {
            Ok(ChannelProfile {
                id: uuid_col(row, 0)?,
                full_name: row.get(1)?,
                username: row.get(2)?,
                email: row.get(3)?,
                avatar_url: row.get(4)?,
                cover_url: row.get(5)?,
                subscriber_count: row.get::<_, i64>(6)? as u64,
                subscribed_to_count: row.get::<_, i64>(7)? as u64,
                subscribed_by_viewer: row.get(8)?,
            })
        })?;
        rows.next().transpose().context("Failed to query channel profile")
    }

    /// Subscribers of a channel; each subscriber carries its own
    /// subscriber count and a reciprocal viewer flag.
    pub fn subscribers(&self, conn: &Connection, channel: Uuid) -> Result<Vec<SubscriberView>> {
        let enrichment = EnrichmentColumns::new()
            .subscriber_count("o.id")
            .subscription_flag("o.id");
        let sql = format!(
            "SELECT s.id, s.created,\n       {OWNER_COLS},\n       {}\n\
             FROM subscriptions s\n\
             LEFT JOIN users o ON o.id = s.subscriber_id\n\
             WHERE s.channel_id = :channel\n\
             ORDER BY s.created DESC, s.id",
            enrichment.sql(),
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: NamedParams = vec![
            (":viewer", Box::new(self.viewer.bind())),
            (":channel", Box::new(channel.to_string())),
        ];
        let items = stmt
            .query_map(query_params(&params).as_slice(), |row| {
                let subscriber = match owner_col(row, 2)? {
                    None => None,
                    Some(user) => Some(ChannelCard {
                        id: user.id,
                        full_name: user.full_name,
                        username: user.username,
                        email: user.email,
                        avatar_url: user.avatar_url,
                        subscriber_count: row.get::<_, i64>(7)? as u64,
                        subscribed_by_viewer: row.get(8)?,
                    }),
                };
                Ok(SubscriberView {
                    id: uuid_col(row, 0)?,
                    subscribed_at: row.get(1)?,
                    subscriber,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to query channel subscribers")?;
        Ok(items)
    }

    pub fn subscribed_channels(
        &self,
        conn: &Connection,
        subscriber: Uuid,
    ) -> Result<Vec<SubscribedChannel>> {
        let sql = format!(
            "SELECT s.id, s.created,\n       {OWNER_COLS}\n\
             FROM subscriptions s\n\
             LEFT JOIN users o ON o.id = s.channel_id\n\
             WHERE s.subscriber_id = :subscriber\n\
             ORDER BY s.created DESC, s.id"
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: NamedParams = vec![(":subscriber", Box::new(subscriber.to_string()))];
        let items = stmt
            .query_map(query_params(&params).as_slice(), |row| {
                Ok(SubscribedChannel {
                    id: uuid_col(row, 0)?,
                    subscribed_at: row.get(1)?,
                    channel: owner_col(row, 2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to query subscribed channels")?;
        Ok(items)
    }

    /// Channel dashboard totals: subscribers, summed views and summed
    /// likes across the channel's videos.
    pub fn stats(&self, conn: &Connection, channel: Uuid) -> Result<Option<ChannelStats>> {
        let sql = format!(
            "SELECT u.id, u.full_name, u.username, u.email, u.avatar_url,\n       \
             (SELECT COUNT(*) FROM subscriptions WHERE channel_id = u.id) AS subscriber_count,\n       \
             (SELECT IFNULL(SUM(v.views), 0) FROM videos v WHERE v.owner_id = u.id) AS total_views,\n       \
             (SELECT COUNT(*) FROM reactions r JOIN videos v ON v.id = r.target_id\n        \
              WHERE v.owner_id = u.id AND r.target_kind = {} AND r.reaction = {}) AS total_likes\n\
             FROM users u\n\
             WHERE u.id = :channel",
            TargetKind::Video.to_int(),
            ReactionKind::Like.to_int(),
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: NamedParams = vec![(":channel", Box::new(channel.to_string()))];
        let mut rows = stmt.query_map(query_params(&params).as_slice(), |row| {
            Ok(ChannelStats {
                id: uuid_col(row, 0)?,
                full_name: row.get(1)?,
                username: row.get(2)?,
                email: row.get(3)?,
                avatar_url: row.get(4)?,
                subscriber_count: row.get::<_, i64>(5)? as u64,
                total_views: row.get(6)?,
                total_likes: row.get::<_, i64>(7)? as u64,
            })
        })?;
        rows.next().transpose().context("Failed to query channel stats")
    }

    /// All of the channel's videos, drafts included, with like counts.
    pub fn channel_videos(&self, conn: &Connection, owner: Uuid) -> Result<Vec<DashboardVideo>> {
        let sql = format!(
            "SELECT v.id, v.title, v.thumbnail_url, v.is_published, v.created,\n       \
             (SELECT COUNT(*) FROM reactions r WHERE r.target_kind = {} AND r.reaction = {} AND r.target_id = v.id) AS like_count\n\
             FROM videos v\n\
             WHERE v.owner_id = :owner\n\
             ORDER BY v.created DESC, v.id",
            TargetKind::Video.to_int(),
            ReactionKind::Like.to_int(),
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: NamedParams = vec![(":owner", Box::new(owner.to_string()))];
        let items = stmt
            .query_map(query_params(&params).as_slice(), |row| {
                Ok(DashboardVideo {
                    id: uuid_col(row, 0)?,
                    title: row.get(1)?,
                    thumbnail_url: row.get(2)?,
                    is_published: row.get(3)?,
                    created: row.get(4)?,
                    like_count: row.get::<_, i64>(5)? as u64,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to query channel videos")?;
        Ok(items)
    }
}

// =========================================================================
// Playlists
// =========================================================================

pub struct PlaylistQuery;

impl PlaylistQuery {
    /// A playlist with its videos resolved in stored order (duplicates
    /// preserved) and the owner projection attached.
    pub fn detail(conn: &Connection, id: Uuid) -> Result<Option<PlaylistDetail>> {
        let sql = format!(
            "SELECT p.id, p.name, p.description, p.created,\n       {OWNER_COLS}\n\
             FROM playlists p\n\
             LEFT JOIN users o ON o.id = p.owner_id\n\
             WHERE p.id = :id"
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: NamedParams = vec![(":id", Box::new(id.to_string()))];
        let mut rows = stmt.query_map(query_params(&params).as_slice(), |row| {
            Ok((
                uuid_col(row, 0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
                owner_col(row, 4)?,
            ))
        })?;
        let Some(head) = rows.next().transpose().context("Failed to query playlist")? else {
            return Ok(None);
        };
        let (playlist_id, name, description, created, owner) = head;

        let sql = format!(
            "SELECT v.id, v.title, v.thumbnail_url, v.duration_secs, v.views, v.created,\n       {OWNER_COLS}\n\
             FROM playlist_videos pv\n\
             JOIN videos v ON v.id = pv.video_id\n\
             LEFT JOIN users o ON o.id = v.owner_id\n\
             WHERE pv.playlist_id = :id\n\
             ORDER BY pv.position, pv.id"
        );
        let mut stmt = conn.prepare_cached(&sql)?;
        let params: NamedParams = vec![(":id", Box::new(id.to_string()))];
        let videos = stmt
            .query_map(query_params(&params).as_slice(), |row| {
                Ok(VideoSummary {
                    id: uuid_col(row, 0)?,
                    title: row.get(1)?,
                    thumbnail_url: row.get(2)?,
                    duration_secs: row.get(3)?,
                    views: row.get(4)?,
                    created: row.get(5)?,
                    owner: owner_col(row, 6)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to query playlist videos")?;

        Ok(Some(PlaylistDetail {
            id: playlist_id,
            name,
            description,
            created,
            owner,
            videos,
        }))
    }
}
