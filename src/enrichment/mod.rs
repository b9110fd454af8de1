//! Relationship-enrichment engine: computed counts, viewer-relative
//! flags and owner projections attached to primary records at read time.

pub mod models;
pub mod queries;

pub use models::*;
pub use queries::{
    ChannelQuery, CommentQuery, PlaylistQuery, SortDirection, TweetQuery, VideoFilter, VideoQuery,
    VideoSort, VideoSortKey, Viewer,
};
