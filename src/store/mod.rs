//! Entity store: records, storage traits and the SQLite implementation.

pub mod models;
pub mod schema;
mod sqlite;
pub mod trait_def;

pub use models::*;
pub use sqlite::SqliteStore;
pub use trait_def::{
    CommentStore, DataStore, EngagementStore, HistoryStore, PlaylistStore, TweetStore, UserStore,
    VideoStore,
};
