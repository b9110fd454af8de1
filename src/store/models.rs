//! Persistent record types for the entity store.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an account authenticates: a locally stored password hash, or an
/// identity asserted by an external provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    Local,
    Google,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthProvider::Local => "local",
            AuthProvider::Google => "google",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "local" => Some(AuthProvider::Local),
            "google" => Some(AuthProvider::Google),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub auth_provider: AuthProvider,
    #[serde(skip_serializing)]
    pub provider_subject: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(skip_serializing)]
    pub avatar_asset_id: Option<String>,
    pub cover_url: Option<String>,
    #[serde(skip_serializing)]
    pub cover_asset_id: Option<String>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created: i64,
    pub updated: i64,
}

/// The projection of a user attached to other records as their owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl UserRecord {
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            full_name: self.full_name.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            avatar_url: self.avatar_url.clone(),
        }
    }
}

pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: Option<String>,
    pub auth_provider: AuthProvider,
    pub provider_subject: Option<String>,
    pub avatar_url: Option<String>,
    pub avatar_asset_id: Option<String>,
    pub cover_url: Option<String>,
    pub cover_asset_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub video_url: String,
    #[serde(skip_serializing)]
    pub video_asset_id: String,
    pub thumbnail_url: String,
    #[serde(skip_serializing)]
    pub thumbnail_asset_id: String,
    pub title: String,
    pub description: String,
    pub duration_secs: f64,
    pub views: i64,
    pub is_published: bool,
    pub created: i64,
    pub updated: i64,
}

pub struct NewVideo {
    pub owner_id: Uuid,
    pub video_url: String,
    pub video_asset_id: String,
    pub thumbnail_url: String,
    pub thumbnail_asset_id: String,
    pub title: String,
    pub description: String,
    pub duration_secs: f64,
}

/// Partial update for a video; `None` fields are left untouched.
#[derive(Debug, Default)]
pub struct VideoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<(String, String)>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    pub id: Uuid,
    pub video_id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created: i64,
    pub updated: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub content: String,
    pub created: i64,
    pub updated: i64,
}

/// What a reaction points at. A reaction references exactly one of a
/// video, a comment or a tweet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionTarget {
    Video(Uuid),
    Comment(Uuid),
    Tweet(Uuid),
}

impl ReactionTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            ReactionTarget::Video(_) => TargetKind::Video,
            ReactionTarget::Comment(_) => TargetKind::Comment,
            ReactionTarget::Tweet(_) => TargetKind::Tweet,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            ReactionTarget::Video(id) | ReactionTarget::Comment(id) | ReactionTarget::Tweet(id) => {
                *id
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Video,
    Comment,
    Tweet,
}

impl TargetKind {
    pub fn to_int(self) -> i64 {
        match self {
            TargetKind::Video => 0,
            TargetKind::Comment => 1,
            TargetKind::Tweet => 2,
        }
    }

    pub fn from_int(v: i64) -> Option<Self> {
        match v {
            0 => Some(TargetKind::Video),
            1 => Some(TargetKind::Comment),
            2 => Some(TargetKind::Tweet),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    pub fn to_int(self) -> i64 {
        match self {
            ReactionKind::Like => 1,
            ReactionKind::Dislike => 2,
        }
    }

    pub fn from_int(v: i64) -> Option<Self> {
        match v {
            1 => Some(ReactionKind::Like),
            2 => Some(ReactionKind::Dislike),
            _ => None,
        }
    }

    pub fn opposing(self) -> Self {
        match self {
            ReactionKind::Like => ReactionKind::Dislike,
            ReactionKind::Dislike => ReactionKind::Like,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRecord {
    pub id: Uuid,
    pub actor_id: Uuid,
    pub target_kind: TargetKind,
    pub target_id: Uuid,
    pub reaction: ReactionKind,
    pub created: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRecord {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub channel_id: Uuid,
    pub created: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub created: i64,
}

/// Result of a toggle mutation: either the record that now exists, or
/// the prior state of the record that was removed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "record")]
pub enum Toggle<T> {
    Created(T),
    Removed(T),
}

impl<T> Toggle<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Toggle::Created(_))
    }
}
