//! Storage trait definitions.

use super::models::*;
use crate::enrichment::models::*;
use crate::enrichment::queries::{VideoFilter, VideoSort};
use crate::pagination::{Page, PageRequest};
use anyhow::Result;
use uuid::Uuid;

/// User accounts and channel profiles.
pub trait UserStore: Send + Sync {
    /// Creates a new user and returns the stored record.
    fn create_user(&self, new: NewUser) -> Result<UserRecord>;

    fn user_by_id(&self, id: Uuid) -> Result<Option<UserRecord>>;

    fn user_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>>;

    /// Looks up a federated account by provider subject and email.
    fn user_by_provider(&self, subject: &str, email: &str) -> Result<Option<UserRecord>>;

    /// Number of accounts holding exactly this username.
    fn count_username(&self, username: &str) -> Result<u64>;

    /// Replaces the single active refresh credential; `None` clears it.
    fn set_refresh_token(&self, user: Uuid, token: Option<&str>) -> Result<()>;

    fn set_password_hash(&self, user: Uuid, hash: &str) -> Result<()>;

    /// Returns None if the user does not exist.
    fn set_username(&self, user: Uuid, username: &str) -> Result<Option<UserRecord>>;

    fn set_account_details(
        &self,
        user: Uuid,
        full_name: &str,
        email: &str,
    ) -> Result<Option<UserRecord>>;

    fn set_avatar(&self, user: Uuid, url: &str, asset_id: &str) -> Result<Option<UserRecord>>;

    fn set_cover(&self, user: Uuid, url: &str, asset_id: &str) -> Result<Option<UserRecord>>;

    /// Channel projection with subscription state relative to `viewer`.
    fn channel_profile(
        &self,
        username: &str,
        viewer: Option<Uuid>,
    ) -> Result<Option<ChannelProfile>>;
}

/// Video records and their enriched read paths.
pub trait VideoStore: Send + Sync {
    fn create_video(&self, new: NewVideo) -> Result<VideoRecord>;

    fn video_by_id(&self, id: Uuid) -> Result<Option<VideoRecord>>;

    /// Applies the patch and returns the updated record, or None if the
    /// video does not exist.
    fn update_video(&self, id: Uuid, patch: VideoPatch) -> Result<Option<VideoRecord>>;

    /// Deletes the video and everything hanging off it (comments,
    /// reactions on the video and its comments, playlist memberships,
    /// watch-history rows) in one transaction. Returns the deleted
    /// record so the caller can release its media assets.
    fn delete_video(&self, id: Uuid) -> Result<Option<VideoRecord>>;

    fn toggle_publish(&self, id: Uuid) -> Result<Option<VideoRecord>>;

    /// Bumps the view counter without touching any watch history; used
    /// for fetches with no viewer identity.
    fn increment_views(&self, id: Uuid) -> Result<()>;

    /// One page of matching videos, sorted then enriched per page.
    fn list_videos(
        &self,
        filter: &VideoFilter,
        sort: VideoSort,
        request: PageRequest,
        viewer: Option<Uuid>,
    ) -> Result<Page<VideoView>>;

    /// A single video with owner, counts, viewer flags, and its comment
    /// thread enriched with the same rules.
    fn video_detail(&self, id: Uuid, viewer: Option<Uuid>) -> Result<Option<VideoDetail>>;
}

/// Per-user most-recently-watched list.
pub trait HistoryStore: Send + Sync {
    /// Moves `video` to the front of the user's history (removing any
    /// prior occurrence), trims the list to its cap, and increments the
    /// video's view counter, all in one transaction.
    fn record_view(&self, user: Uuid, video: Uuid) -> Result<()>;

    /// The user's history resolved to current records, most recent
    /// first; identifiers whose video no longer exists are dropped.
    fn watch_history(&self, user: Uuid) -> Result<Vec<VideoView>>;
}

pub trait CommentStore: Send + Sync {
    fn add_comment(&self, video: Uuid, owner: Uuid, content: &str) -> Result<CommentRecord>;

    fn comment_by_id(&self, id: Uuid) -> Result<Option<CommentRecord>>;

    fn update_comment(&self, id: Uuid, content: &str) -> Result<Option<CommentRecord>>;

    /// Deletes the comment and any reactions to it.
    fn delete_comment(&self, id: Uuid) -> Result<Option<CommentRecord>>;

    fn comments_page(
        &self,
        video: Uuid,
        request: PageRequest,
        viewer: Option<Uuid>,
    ) -> Result<Page<CommentView>>;
}

pub trait TweetStore: Send + Sync {
    fn create_tweet(&self, owner: Uuid, content: &str) -> Result<TweetRecord>;

    fn tweet_by_id(&self, id: Uuid) -> Result<Option<TweetRecord>>;

    fn update_tweet(&self, id: Uuid, content: &str) -> Result<Option<TweetRecord>>;

    /// Deletes the tweet and any reactions to it.
    fn delete_tweet(&self, id: Uuid) -> Result<Option<TweetRecord>>;

    fn tweets_for_user(&self, owner: Uuid, viewer: Option<Uuid>) -> Result<Vec<TweetView>>;
}

/// Reactions and subscriptions: reversible user actions driven by the
/// toggle pattern, plus their read paths.
pub trait EngagementStore: Send + Sync {
    /// Create-if-absent-else-delete, with like/dislike mutual exclusion
    /// held by the store's uniqueness constraint: toggling one kind
    /// while the opposing kind exists flips the existing row in place.
    fn toggle_reaction(
        &self,
        actor: Uuid,
        target: ReactionTarget,
        kind: ReactionKind,
    ) -> Result<Toggle<ReactionRecord>>;

    /// Videos the actor has reacted to with `kind`, newest first.
    fn reacted_videos(&self, actor: Uuid, kind: ReactionKind) -> Result<Vec<ReactedVideo>>;

    fn toggle_subscription(
        &self,
        subscriber: Uuid,
        channel: Uuid,
    ) -> Result<Toggle<SubscriptionRecord>>;

    fn channel_subscribers(&self, channel: Uuid, viewer: Option<Uuid>)
        -> Result<Vec<SubscriberView>>;

    fn subscribed_channels(&self, subscriber: Uuid) -> Result<Vec<SubscribedChannel>>;

    fn channel_stats(&self, channel: Uuid) -> Result<Option<ChannelStats>>;

    /// All of the channel's videos, drafts included, with like counts.
    fn channel_videos(&self, owner: Uuid) -> Result<Vec<DashboardVideo>>;
}

pub trait PlaylistStore: Send + Sync {
    fn create_playlist(&self, owner: Uuid, name: &str, description: &str)
        -> Result<PlaylistRecord>;

    fn playlists_for_owner(&self, owner: Uuid) -> Result<Vec<PlaylistRecord>>;

    fn playlist_by_id(&self, id: Uuid) -> Result<Option<PlaylistRecord>>;

    /// The playlist with its videos resolved in stored order.
    fn playlist_detail(&self, id: Uuid) -> Result<Option<PlaylistDetail>>;

    /// Appends the video; duplicates are permitted, order is kept.
    fn add_video_to_playlist(&self, playlist: Uuid, video: Uuid) -> Result<Option<PlaylistRecord>>;

    /// Removes every occurrence of the video.
    fn remove_video_from_playlist(
        &self,
        playlist: Uuid,
        video: Uuid,
    ) -> Result<Option<PlaylistRecord>>;

    fn update_playlist(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Option<PlaylistRecord>>;

    fn delete_playlist(&self, id: Uuid) -> Result<Option<PlaylistRecord>>;
}

/// The full entity store as the server consumes it.
pub trait DataStore:
    UserStore
    + VideoStore
    + HistoryStore
    + CommentStore
    + TweetStore
    + EngagementStore
    + PlaylistStore
    + Send
    + Sync
{
}

impl<T> DataStore for T where
    T: UserStore
        + VideoStore
        + HistoryStore
        + CommentStore
        + TweetStore
        + EngagementStore
        + PlaylistStore
        + Send
        + Sync
{
}
