//! Reaction and subscription toggles plus their read paths.
//!
//! The uniqueness constraints on `reactions` and `subscriptions` make
//! the toggles safe under concurrent double-toggles: creation is an
//! `INSERT OR IGNORE` followed by a re-read inside the same
//! transaction, so two racing creates still leave exactly one row.

use super::{now_ms, SqliteStore};
use crate::enrichment::models::*;
use crate::enrichment::queries::{ChannelQuery, VideoQuery, Viewer};
use crate::store::models::*;
use crate::store::trait_def::EngagementStore;
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

fn reaction_from_row(row: &Row) -> rusqlite::Result<ReactionRecord> {
    let parse = |s: String, idx| {
        Uuid::parse_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    };
    let kind: i64 = row.get(2)?;
    let reaction: i64 = row.get(4)?;
    Ok(ReactionRecord {
        id: parse(row.get(0)?, 0)?,
        actor_id: parse(row.get(1)?, 1)?,
        target_kind: TargetKind::from_int(kind).unwrap_or(TargetKind::Video),
        target_id: parse(row.get(3)?, 3)?,
        reaction: ReactionKind::from_int(reaction).unwrap_or(ReactionKind::Like),
        created: row.get(5)?,
    })
}

fn find_reaction(
    conn: &Connection,
    actor: Uuid,
    target: ReactionTarget,
) -> Result<Option<ReactionRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, actor_id, target_kind, target_id, reaction, created \
         FROM reactions WHERE actor_id = ?1 AND target_kind = ?2 AND target_id = ?3",
    )?;
    let record = stmt
        .query_row(
            params![
                actor.to_string(),
                target.kind().to_int(),
                target.id().to_string()
            ],
            reaction_from_row,
        )
        .optional()
        .context("Failed to look up reaction")?;
    Ok(record)
}

fn subscription_from_row(row: &Row) -> rusqlite::Result<SubscriptionRecord> {
    let parse = |s: String, idx| {
        Uuid::parse_str(&s).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
    };
    Ok(SubscriptionRecord {
        id: parse(row.get(0)?, 0)?,
        subscriber_id: parse(row.get(1)?, 1)?,
        channel_id: parse(row.get(2)?, 2)?,
        created: row.get(3)?,
    })
}

impl EngagementStore for SqliteStore {
    fn toggle_reaction(
        &self,
        actor: Uuid,
        target: ReactionTarget,
        kind: ReactionKind,
    ) -> Result<Toggle<ReactionRecord>> {
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;

        match find_reaction(&tx, actor, target)? {
            // Same kind exists: un-toggle, reporting the prior state.
            Some(existing) if existing.reaction == kind => {
                tx.execute(
                    "DELETE FROM reactions WHERE id = ?1",
                    params![existing.id.to_string()],
                )?;
                tx.commit().context("Failed to remove reaction")?;
                Ok(Toggle::Removed(existing))
            }
            // Opposing kind exists: flip the row in place so there is
            // never a state with both or neither present.
            Some(existing) => {
                tx.execute(
                    "UPDATE reactions SET reaction = ?1, created = ?2 WHERE id = ?3",
                    params![kind.to_int(), now_ms(), existing.id.to_string()],
                )?;
                let flipped = find_reaction(&tx, actor, target)?
                    .context("Reaction vanished during flip")?;
                tx.commit().context("Failed to flip reaction")?;
                Ok(Toggle::Created(flipped))
            }
            None => {
                tx.execute(
                    "INSERT OR IGNORE INTO reactions \
                     (id, actor_id, target_kind, target_id, reaction, created) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        Uuid::new_v4().to_string(),
                        actor.to_string(),
                        target.kind().to_int(),
                        target.id().to_string(),
                        kind.to_int(),
                        now_ms(),
                    ],
                )?;
                // Re-read rather than trusting the insert: if a
                // concurrent toggle won the race, this returns its row.
                let Some(current) = find_reaction(&tx, actor, target)? else {
                    bail!("Reaction missing after insert");
                };
                tx.commit().context("Failed to create reaction")?;
                Ok(Toggle::Created(current))
            }
        }
    }

    fn reacted_videos(&self, actor: Uuid, kind: ReactionKind) -> Result<Vec<ReactedVideo>> {
        let conn = self.lock();
        VideoQuery::new(Some(actor)).reacted_videos(&conn, actor, kind)
    }

    fn toggle_subscription(
        &self,
        subscriber: Uuid,
        channel: Uuid,
    ) -> Result<Toggle<SubscriptionRecord>> {
        let conn = self.lock();
        let tx = conn.unchecked_transaction()?;

        let existing = tx
            .prepare_cached(
                "SELECT id, subscriber_id, channel_id, created \
                 FROM subscriptions WHERE subscriber_id = ?1 AND channel_id = ?2",
            )?
            .query_row(
                params![subscriber.to_string(), channel.to_string()],
                subscription_from_row,
            )
            .optional()?;

        match existing {
            Some(record) => {
                tx.execute(
                    "DELETE FROM subscriptions WHERE id = ?1",
                    params![record.id.to_string()],
                )?;
                tx.commit().context("Failed to remove subscription")?;
                Ok(Toggle::Removed(record))
            }
            None => {
                tx.execute(
                    "INSERT OR IGNORE INTO subscriptions (id, subscriber_id, channel_id, created) \
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        Uuid::new_v4().to_string(),
                        subscriber.to_string(),
                        channel.to_string(),
                        now_ms(),
                    ],
                )?;
                let current = tx
                    .prepare_cached(
                        "SELECT id, subscriber_id, channel_id, created \
                         FROM subscriptions WHERE subscriber_id = ?1 AND channel_id = ?2",
                    )?
                    .query_row(
                        params![subscriber.to_string(), channel.to_string()],
                        subscription_from_row,
                    )
                    .context("Subscription missing after insert")?;
                tx.commit().context("Failed to create subscription")?;
                Ok(Toggle::Created(current))
            }
        }
    }

    fn channel_subscribers(
        &self,
        channel: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<Vec<SubscriberView>> {
        let conn = self.lock();
        ChannelQuery::new(viewer).subscribers(&conn, channel)
    }

    fn subscribed_channels(&self, subscriber: Uuid) -> Result<Vec<SubscribedChannel>> {
        let conn = self.lock();
        ChannelQuery::new(Viewer::anonymous()).subscribed_channels(&conn, subscriber)
    }

    fn channel_stats(&self, channel: Uuid) -> Result<Option<ChannelStats>> {
        let conn = self.lock();
        ChannelQuery::new(Viewer::anonymous()).stats(&conn, channel)
    }

    fn channel_videos(&self, owner: Uuid) -> Result<Vec<DashboardVideo>> {
        let conn = self.lock();
        ChannelQuery::new(Viewer::anonymous()).channel_videos(&conn, owner)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::store::models::*;
    use crate::store::trait_def::{EngagementStore, TweetStore, VideoStore};

    #[test]
    fn toggle_twice_returns_to_original_state() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let fan = make_user(&store, "fan");
        let video = make_video(&store, owner.id, "v");
        let target = ReactionTarget::Video(video.id);

        let first = store
            .toggle_reaction(fan.id, target, ReactionKind::Like)
            .unwrap();
        assert!(first.is_created());

        let second = store
            .toggle_reaction(fan.id, target, ReactionKind::Like)
            .unwrap();
        assert!(!second.is_created());

        let detail = store.video_detail(video.id, Some(fan.id)).unwrap().unwrap();
        assert_eq!(detail.video.like_count, 0);
        assert!(!detail.video.liked_by_viewer);
    }

    #[test]
    fn like_and_dislike_are_mutually_exclusive() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let fan = make_user(&store, "fan");
        let video = make_video(&store, owner.id, "v");
        let target = ReactionTarget::Video(video.id);

        store
            .toggle_reaction(fan.id, target, ReactionKind::Like)
            .unwrap();
        store
            .toggle_reaction(fan.id, target, ReactionKind::Dislike)
            .unwrap();

        let detail = store.video_detail(video.id, Some(fan.id)).unwrap().unwrap();
        assert_eq!(detail.video.like_count, 0);
        assert_eq!(detail.video.dislike_count, 1);
        assert!(!detail.video.liked_by_viewer);
        assert!(detail.video.disliked_by_viewer);

        // Flip back.
        store
            .toggle_reaction(fan.id, target, ReactionKind::Like)
            .unwrap();
        let detail = store.video_detail(video.id, Some(fan.id)).unwrap().unwrap();
        assert_eq!(detail.video.like_count, 1);
        assert_eq!(detail.video.dislike_count, 0);
    }

    #[test]
    fn concurrent_double_like_leaves_one_row() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let fan = make_user(&store, "fan");
        let video = make_video(&store, owner.id, "v");
        let target = ReactionTarget::Video(video.id);

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.toggle_reaction(fan.id, target, ReactionKind::Like)
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        // Both toggles succeeded; whatever interleaving happened, the
        // unique index guarantees at most one row survived.
        let detail = store.video_detail(video.id, None).unwrap().unwrap();
        assert!(detail.video.like_count <= 1);
    }

    #[test]
    fn reactions_per_target_kind_are_independent() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let fan = make_user(&store, "fan");
        let video = make_video(&store, owner.id, "v");
        let tweet = store.create_tweet(owner.id, "hello").unwrap();

        store
            .toggle_reaction(fan.id, ReactionTarget::Video(video.id), ReactionKind::Like)
            .unwrap();
        store
            .toggle_reaction(fan.id, ReactionTarget::Tweet(tweet.id), ReactionKind::Dislike)
            .unwrap();

        let detail = store.video_detail(video.id, Some(fan.id)).unwrap().unwrap();
        assert!(detail.video.liked_by_viewer);

        let tweets = store.tweets_for_user(owner.id, Some(fan.id)).unwrap();
        assert_eq!(tweets.len(), 1);
        assert!(tweets[0].disliked_by_viewer);
        assert!(!tweets[0].liked_by_viewer);
    }

    #[test]
    fn reacted_videos_lists_newest_first_reactions() {
        let (store, _tmp) = create_test_store();
        let owner = make_user(&store, "owner");
        let fan = make_user(&store, "fan");
        let a = make_video(&store, owner.id, "a");
        let b = make_video(&store, owner.id, "b");

        store
            .toggle_reaction(fan.id, ReactionTarget::Video(a.id), ReactionKind::Like)
            .unwrap();
        store
            .toggle_reaction(fan.id, ReactionTarget::Video(b.id), ReactionKind::Like)
            .unwrap();
        store
            .toggle_reaction(fan.id, ReactionTarget::Video(a.id), ReactionKind::Dislike)
            .unwrap();

        let liked = store.reacted_videos(fan.id, ReactionKind::Like).unwrap();
        assert_eq!(liked.len(), 1);
        assert_eq!(liked[0].video.as_ref().unwrap().id, b.id);

        let disliked = store.reacted_videos(fan.id, ReactionKind::Dislike).unwrap();
        assert_eq!(disliked.len(), 1);
        assert_eq!(disliked[0].video.as_ref().unwrap().id, a.id);
    }

    #[test]
    fn subscription_toggle_roundtrip() {
        let (store, _tmp) = create_test_store();
        let channel = make_user(&store, "channel");
        let fan = make_user(&store, "fan");

        let on = store.toggle_subscription(fan.id, channel.id).unwrap();
        assert!(on.is_created());

        let subscribers = store.channel_subscribers(channel.id, None).unwrap();
        assert_eq!(subscribers.len(), 1);
        assert_eq!(
            subscribers[0]
                .subscriber
                .as_ref()
                .map(|s| s.username.as_str()),
            Some("fan")
        );

        let off = store.toggle_subscription(fan.id, channel.id).unwrap();
        assert!(!off.is_created());
        assert!(store.channel_subscribers(channel.id, None).unwrap().is_empty());
    }

    #[test]
    fn channel_stats_sum_views_and_likes() {
        let (store, _tmp) = create_test_store();
        let channel = make_user(&store, "channel");
        let fan = make_user(&store, "fan");
        let other = make_user(&store, "other");
        let a = make_video(&store, channel.id, "a");
        let b = make_video(&store, channel.id, "b");

        store.toggle_subscription(fan.id, channel.id).unwrap();
        store
            .toggle_reaction(fan.id, ReactionTarget::Video(a.id), ReactionKind::Like)
            .unwrap();
        store
            .toggle_reaction(other.id, ReactionTarget::Video(a.id), ReactionKind::Like)
            .unwrap();
        store
            .toggle_reaction(fan.id, ReactionTarget::Video(b.id), ReactionKind::Dislike)
            .unwrap();

        let stats = store.channel_stats(channel.id).unwrap().unwrap();
        assert_eq!(stats.subscriber_count, 1);
        assert_eq!(stats.total_likes, 2);
        assert_eq!(stats.total_views, 0);

        let videos = store.channel_videos(channel.id).unwrap();
        assert_eq!(videos.len(), 2);
        let likes_for_a = videos.iter().find(|v| v.id == a.id).unwrap().like_count;
        assert_eq!(likes_for_a, 2);
    }
}
