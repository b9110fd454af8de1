//! Read-time views: primary records augmented with computed
//! relationship state. Nothing in this module is persisted.

use crate::store::models::PublicUser;
use serde::Serialize;
use uuid::Uuid;

/// A video with its social-graph state attached.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
    pub video_url: String,
    pub duration_secs: f64,
    pub views: i64,
    pub is_published: bool,
    pub created: i64,
    pub owner: Option<PublicUser>,
    pub like_count: u64,
    pub dislike_count: u64,
    pub liked_by_viewer: bool,
    pub disliked_by_viewer: bool,
}

/// A single fetched video: the enriched view plus its comment thread,
/// each comment enriched with the same like/dislike/owner rules.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    #[serde(flatten)]
    pub video: VideoView,
    pub comment_count: u64,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: Uuid,
    pub content: String,
    pub created: i64,
    pub updated: i64,
    pub owner: Option<PublicUser>,
    pub like_count: u64,
    pub dislike_count: u64,
    pub liked_by_viewer: bool,
    pub disliked_by_viewer: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetView {
    pub id: Uuid,
    pub content: String,
    pub created: i64,
    pub owner: Option<PublicUser>,
    pub like_count: u64,
    pub dislike_count: u64,
    pub liked_by_viewer: bool,
    pub disliked_by_viewer: bool,
}

/// A channel (user) profile with subscription state relative to the viewer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub cover_url: Option<String>,
    pub subscriber_count: u64,
    pub subscribed_to_count: u64,
    pub subscribed_by_viewer: bool,
}

/// A subscriber of some channel, itself enriched with its own subscriber
/// count and whether the viewer subscribes to it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberView {
    pub id: Uuid,
    pub subscribed_at: i64,
    pub subscriber: Option<ChannelCard>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelCard {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub subscriber_count: u64,
    pub subscribed_by_viewer: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannel {
    pub id: Uuid,
    pub subscribed_at: i64,
    pub channel: Option<PublicUser>,
}

/// Compact video projection used in reaction listings, playlists and
/// watch history.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: Uuid,
    pub title: String,
    pub thumbnail_url: String,
    pub duration_secs: f64,
    pub views: i64,
    pub created: i64,
    pub owner: Option<PublicUser>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactedVideo {
    pub id: Uuid,
    pub reacted_at: i64,
    pub video: Option<VideoSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub subscriber_count: u64,
    pub total_views: i64,
    pub total_likes: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardVideo {
    pub id: Uuid,
    pub title: String,
    pub thumbnail_url: String,
    pub is_published: bool,
    pub created: i64,
    pub like_count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistDetail {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created: i64,
    pub owner: Option<PublicUser>,
    pub videos: Vec<VideoSummary>,
}
