//! Table definitions for the entity store.

use crate::sqlite_persistence::{Table, VersionedSchema};

const USERS_TABLE: Table = Table {
    name: "users",
    schema: "CREATE TABLE users (
        id TEXT NOT NULL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        full_name TEXT NOT NULL,
        password_hash TEXT,
        auth_provider TEXT NOT NULL DEFAULT 'local',
        provider_subject TEXT,
        avatar_url TEXT,
        avatar_asset_id TEXT,
        cover_url TEXT,
        cover_asset_id TEXT,
        refresh_token TEXT,
        created INTEGER NOT NULL,
        updated INTEGER NOT NULL
    );",
    indices: &["CREATE INDEX users_username_index ON users (username);"],
};

const VIDEOS_TABLE: Table = Table {
    name: "videos",
    schema: "CREATE TABLE videos (
        id TEXT NOT NULL PRIMARY KEY,
        owner_id TEXT NOT NULL,
        video_url TEXT NOT NULL,
        video_asset_id TEXT NOT NULL,
        thumbnail_url TEXT NOT NULL,
        thumbnail_asset_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        duration_secs REAL NOT NULL DEFAULT 0,
        views INTEGER NOT NULL DEFAULT 0,
        is_published INTEGER NOT NULL DEFAULT 1,
        created INTEGER NOT NULL,
        updated INTEGER NOT NULL,
        CONSTRAINT owner_id FOREIGN KEY (owner_id) REFERENCES users (id)
    );",
    indices: &["CREATE INDEX videos_owner_index ON videos (owner_id);"],
};

const COMMENTS_TABLE: Table = Table {
    name: "comments",
    schema: "CREATE TABLE comments (
        id TEXT NOT NULL PRIMARY KEY,
        video_id TEXT NOT NULL,
        owner_id TEXT NOT NULL,
        content TEXT NOT NULL,
        created INTEGER NOT NULL,
        updated INTEGER NOT NULL,
        CONSTRAINT video_id FOREIGN KEY (video_id) REFERENCES videos (id),
        CONSTRAINT owner_id FOREIGN KEY (owner_id) REFERENCES users (id)
    );",
    indices: &["CREATE INDEX comments_video_index ON comments (video_id);"],
};

const TWEETS_TABLE: Table = Table {
    name: "tweets",
    schema: "CREATE TABLE tweets (
        id TEXT NOT NULL PRIMARY KEY,
        owner_id TEXT NOT NULL,
        content TEXT NOT NULL,
        created INTEGER NOT NULL,
        updated INTEGER NOT NULL,
        CONSTRAINT owner_id FOREIGN KEY (owner_id) REFERENCES users (id)
    );",
    indices: &["CREATE INDEX tweets_owner_index ON tweets (owner_id);"],
};

// The UNIQUE(actor_id, target_kind, target_id) constraint carries two
// invariants at once: at most one reaction of either kind per
// (actor, target), which also makes like/dislike mutually exclusive.
const REACTIONS_TABLE: Table = Table {
    name: "reactions",
    schema: "CREATE TABLE reactions (
        id TEXT NOT NULL PRIMARY KEY,
        actor_id TEXT NOT NULL,
        target_kind INTEGER NOT NULL,
        target_id TEXT NOT NULL,
        reaction INTEGER NOT NULL,
        created INTEGER NOT NULL,
        UNIQUE (actor_id, target_kind, target_id),
        CONSTRAINT actor_id FOREIGN KEY (actor_id) REFERENCES users (id)
    );",
    indices: &["CREATE INDEX reactions_target_index ON reactions (target_kind, target_id);"],
};

const SUBSCRIPTIONS_TABLE: Table = Table {
    name: "subscriptions",
    schema: "CREATE TABLE subscriptions (
        id TEXT NOT NULL PRIMARY KEY,
        subscriber_id TEXT NOT NULL,
        channel_id TEXT NOT NULL,
        created INTEGER NOT NULL,
        UNIQUE (subscriber_id, channel_id),
        CONSTRAINT subscriber_id FOREIGN KEY (subscriber_id) REFERENCES users (id),
        CONSTRAINT channel_id FOREIGN KEY (channel_id) REFERENCES users (id)
    );",
    indices: &["CREATE INDEX subscriptions_channel_index ON subscriptions (channel_id);"],
};

const PLAYLISTS_TABLE: Table = Table {
    name: "playlists",
    schema: "CREATE TABLE playlists (
        id TEXT NOT NULL PRIMARY KEY,
        owner_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT NOT NULL,
        created INTEGER NOT NULL,
        CONSTRAINT owner_id FOREIGN KEY (owner_id) REFERENCES users (id)
    );",
    indices: &[],
};

const PLAYLIST_VIDEOS_TABLE: Table = Table {
    name: "playlist_videos",
    schema: "CREATE TABLE playlist_videos (
        id INTEGER PRIMARY KEY,
        playlist_id TEXT NOT NULL,
        video_id TEXT NOT NULL,
        position INTEGER NOT NULL,
        CONSTRAINT playlist_id FOREIGN KEY (playlist_id) REFERENCES playlists (id) ON DELETE CASCADE
    );",
    indices: &["CREATE INDEX playlist_videos_playlist_index ON playlist_videos (playlist_id);"],
};

// Recency order is seq DESC; a re-view deletes and reinserts the row so
// the video moves to the front.
const WATCH_HISTORY_TABLE: Table = Table {
    name: "watch_history",
    schema: "CREATE TABLE watch_history (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        video_id TEXT NOT NULL,
        UNIQUE (user_id, video_id),
        CONSTRAINT user_id FOREIGN KEY (user_id) REFERENCES users (id)
    );",
    indices: &["CREATE INDEX watch_history_user_index ON watch_history (user_id);"],
};

pub const STORE_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        USERS_TABLE,
        VIDEOS_TABLE,
        COMMENTS_TABLE,
        TWEETS_TABLE,
        REACTIONS_TABLE,
        SUBSCRIPTIONS_TABLE,
        PLAYLISTS_TABLE,
        PLAYLIST_VIDEOS_TABLE,
        WATCH_HISTORY_TABLE,
    ],
    migration: None,
}];
