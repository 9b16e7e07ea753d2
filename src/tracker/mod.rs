pub mod alog;
pub mod channel;
pub mod tick;

use crate::database::models::CapRecord;
use crate::database::queries;
use crate::utils::format::{CAP_MARKER, capped_names, format_cap_announcement};
use alog::{GameApi, check_alog};
use anyhow::Result;
use channel::{CapChannel, ChannelMessage};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// Messages searched for an existing announcement.
const HISTORY_LOOKBACK: usize = 100;
/// Messages searched when listing capped users.
const LIST_LOOKBACK: usize = 500;
/// Messages searched when deleting bot messages.
const DELETE_LOOKBACK: usize = 200;
/// Discord refuses to bulk delete messages older than this.
const BULK_DELETE_MAX_AGE_DAYS: i64 = 14;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCap {
    pub rsn: String,
    pub cap_time: DateTime<Utc>,
    pub announcement: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    All,
    NonCap,
    Before(u64),
}

impl DeleteTarget {
    pub fn parse(which: &str) -> Option<Self> {
        match which.trim().to_lowercase().as_str() {
            "all" => Some(DeleteTarget::All),
            "noncap" => Some(DeleteTarget::NonCap),
            other => other
                .parse::<u64>()
                .ok()
                .filter(|id| *id != 0)
                .map(DeleteTarget::Before),
        }
    }

    fn matches(&self, message: &ChannelMessage) -> bool {
        match self {
            DeleteTarget::NonCap => message.from_bot && !message.content.contains(CAP_MARKER),
            DeleteTarget::All | DeleteTarget::Before(_) => message.from_bot,
        }
    }
}

/// Detects caps from activity feeds and reports them to the cap channel.
pub struct CapTracker {
    pool: SqlitePool,
    api: Arc<dyn GameApi>,
    channel: Arc<dyn CapChannel>,
    build_tick: watch::Receiver<DateTime<Utc>>,
}

impl CapTracker {
    pub fn new(
        pool: SqlitePool,
        api: Arc<dyn GameApi>,
        channel: Arc<dyn CapChannel>,
        build_tick: watch::Receiver<DateTime<Utc>>,
    ) -> Self {
        Self {
            pool,
            api,
            channel,
            build_tick,
        }
    }

    pub async fn clan_members(&self) -> Result<Vec<String>> {
        self.api.clan_members().await
    }

    /// Caps since the last build tick that have not been announced yet, in roster order.
    pub async fn get_cap_list(&self, names: &[String]) -> Result<Vec<PendingCap>> {
        let build_tick = *self.build_tick.borrow();
        let mut history: Option<Vec<ChannelMessage>> = None;
        let mut caps = Vec::new();

        for rsn in names {
            let Some(cap_time) = check_alog(self.api.as_ref(), rsn, CAP_MARKER).await else {
                continue;
            };
            info!("Cap date for {}: {}", rsn, cap_time);

            if cap_time < build_tick {
                info!("Not reporting cap: before build tick.");
                continue;
            }

            let announcement = format_cap_announcement(rsn, cap_time);
            if self
                .already_announced(rsn, cap_time, &announcement, &mut history)
                .await?
            {
                info!("Not reporting cap: cap message exists.");
                continue;
            }

            caps.push(PendingCap {
                rsn: rsn.clone(),
                cap_time,
                announcement,
            });
        }

        info!("Caps to report: {:?}", caps);
        Ok(caps)
    }

    async fn already_announced(
        &self,
        rsn: &str,
        cap_time: DateTime<Utc>,
        announcement: &str,
        history: &mut Option<Vec<ChannelMessage>>,
    ) -> Result<bool> {
        if let Some(record) = queries::get_cap(&self.pool, rsn).await? {
            if record.announced(cap_time) {
                return Ok(true);
            }
        }

        // Announcements posted before the database existed only live in the channel.
        if history.is_none() {
            *history = Some(self.channel.recent_messages(HISTORY_LOOKBACK, None).await?);
        }
        Ok(history.as_ref().is_some_and(|messages| {
            messages
                .iter()
                .any(|m| m.from_bot && m.content.contains(announcement))
        }))
    }

    /// Runs one detection pass over `names`: announce each new cap, then record it.
    pub async fn report_caps(&self, names: &[String]) -> Result<Vec<PendingCap>> {
        let build_tick = *self.build_tick.borrow();
        info!("Last build tick: {}", build_tick);

        queries::register_names(&self.pool, names).await?;
        let caps = self.get_cap_list(names).await?;

        for cap in &caps {
            self.channel.announce(&cap.announcement).await?;
            queries::upsert_cap(&self.pool, &cap.rsn, cap.cap_time).await?;
        }

        Ok(caps)
    }

    pub async fn report_clan(&self) -> Result<Vec<PendingCap>> {
        let roster = self.api.clan_members().await?;
        self.report_caps(&roster).await
    }

    /// Rechecks one stored member, or all of them for `"all"`, and returns their records.
    pub async fn force(&self, target: &str) -> Result<Vec<CapRecord>> {
        let all = target.trim().eq_ignore_ascii_case("all");
        let names = if all {
            queries::get_cap_names(&self.pool).await?
        } else {
            vec![target.trim().to_string()]
        };

        if names.is_empty() {
            return Ok(Vec::new());
        }

        self.report_caps(&names).await?;

        if all {
            queries::get_caps(&self.pool).await
        } else {
            Ok(queries::get_cap(&self.pool, &names[0])
                .await?
                .into_iter()
                .collect())
        }
    }

    /// Names from the bot's announcements in the channel, oldest first.
    pub async fn capped_users(&self) -> Result<Vec<String>> {
        let messages = self.channel.recent_messages(LIST_LOOKBACK, None).await?;
        Ok(capped_names(
            messages
                .iter()
                .filter(|m| m.from_bot)
                .map(|m| m.content.as_str()),
        ))
    }

    pub async fn delete_bot_messages(&self, target: DeleteTarget) -> Result<usize> {
        let before = match target {
            DeleteTarget::Before(id) => Some(id),
            _ => None,
        };

        let cutoff = Utc::now() - chrono::Duration::days(BULK_DELETE_MAX_AGE_DAYS);
        let (recent, old): (Vec<ChannelMessage>, Vec<ChannelMessage>) = self
            .channel
            .recent_messages(DELETE_LOOKBACK, before)
            .await?
            .into_iter()
            .filter(|m| target.matches(m))
            .partition(|m| m.created_at > cutoff);

        let ids: Vec<u64> = recent.iter().map(|m| m.id).collect();
        if !ids.is_empty() {
            self.channel.bulk_delete(&ids).await?;
        }
        for message in &old {
            self.channel.delete_message(message.id).await?;
        }

        let deleted = ids.len() + old.len();
        info!("Deleted {} bot messages ({} one by one)", deleted, old.len());
        Ok(deleted)
    }

    pub async fn run(&self, interval: Duration) {
        loop {
            if let Err(e) = self.report_clan().await {
                error!("Cap report failed: {:?}", e);
            }
            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_test_pool;
    use crate::tracker::alog::tests::FakeGameApi;
    use crate::tracker::channel::tests::FakeChannel;
    use chrono::TimeZone;

    const ANNOUNCEMENT: &str = "Alice has capped at the citadel on 04-Jan-2024 at 20:15.";

    fn build_tick() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 3, 16, 0, 0).unwrap()
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    async fn setup(api: FakeGameApi, channel: Arc<FakeChannel>) -> (CapTracker, SqlitePool) {
        let pool = create_test_pool().await;
        let (_sender, receiver) = watch::channel(build_tick());
        let tracker = CapTracker::new(pool.clone(), Arc::new(api), channel, receiver);
        (tracker, pool)
    }

    fn clan() -> FakeGameApi {
        let mut api = FakeGameApi::default()
            .with_feed(
                "Alice",
                &[("Alice capped at the clan citadel.", "04-Jan-2024 20:15")],
            )
            .with_feed(
                "Bob",
                &[("Bob capped at the clan citadel.", "02-Jan-2024 11:00")],
            )
            .with_feed("Carol", &[("Levelled up Fishing.", "04-Jan-2024 08:00")])
            .with_private("Dave");
        api.roster = names(&["Alice", "Bob", "Carol", "Dave", "Eve"]);
        api
    }

    #[tokio::test]
    async fn reports_caps_since_build_tick() {
        let channel = Arc::new(FakeChannel::default());
        let (tracker, pool) = setup(clan(), channel.clone()).await;

        let caps = tracker.report_clan().await.unwrap();

        assert_eq!(caps.len(), 1);
        assert_eq!(caps[0].rsn, "Alice");
        assert_eq!(channel.contents(), vec![ANNOUNCEMENT]);

        let record = queries::get_cap(&pool, "Alice").await.unwrap().unwrap();
        assert_eq!(
            record.last_cap_time,
            Some(Utc.with_ymd_and_hms(2024, 1, 4, 20, 15, 0).unwrap())
        );
        assert!(queries::get_cap(&pool, "Bob").await.unwrap().is_none());
        assert_eq!(
            queries::get_names(&pool).await.unwrap(),
            names(&["Alice", "Bob", "Carol", "Dave", "Eve"])
        );
    }

    #[tokio::test]
    async fn recorded_caps_are_not_announced_twice() {
        let channel = Arc::new(FakeChannel::default());
        let (tracker, _pool) = setup(clan(), channel.clone()).await;

        tracker.report_clan().await.unwrap();
        channel.bulk_delete(&[1]).await.unwrap();
        let caps = tracker.report_clan().await.unwrap();

        assert!(caps.is_empty());
        assert!(channel.contents().is_empty());
    }

    #[tokio::test]
    async fn announcements_in_history_are_not_resent() {
        let channel = Arc::new(FakeChannel::with_history(&[(ANNOUNCEMENT, true)]));
        let (tracker, pool) = setup(clan(), channel.clone()).await;

        let caps = tracker.report_caps(&names(&["Alice"])).await.unwrap();

        assert!(caps.is_empty());
        assert_eq!(channel.contents(), vec![ANNOUNCEMENT]);
        assert!(queries::get_cap(&pool, "Alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn user_quoting_an_announcement_does_not_count() {
        let channel = Arc::new(FakeChannel::with_history(&[(ANNOUNCEMENT, false)]));
        let (tracker, _pool) = setup(clan(), channel.clone()).await;

        let caps = tracker.report_caps(&names(&["Alice"])).await.unwrap();

        assert_eq!(caps.len(), 1);
        assert_eq!(channel.contents(), vec![ANNOUNCEMENT, ANNOUNCEMENT]);
    }

    #[tokio::test]
    async fn force_all_with_empty_store_sends_nothing() {
        let channel = Arc::new(FakeChannel::default());
        let (tracker, _pool) = setup(clan(), channel.clone()).await;

        assert!(tracker.force("all").await.unwrap().is_empty());
        assert!(channel.contents().is_empty());
    }

    #[tokio::test]
    async fn force_rechecks_stored_members() {
        let channel = Arc::new(FakeChannel::default());
        let (tracker, pool) = setup(clan(), channel.clone()).await;
        let earlier = Utc.with_ymd_and_hms(2024, 1, 3, 17, 0, 0).unwrap();
        queries::upsert_cap(&pool, "Alice", earlier).await.unwrap();

        let records = tracker.force("all").await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].last_cap_time,
            Some(Utc.with_ymd_and_hms(2024, 1, 4, 20, 15, 0).unwrap())
        );
        assert_eq!(channel.contents(), vec![ANNOUNCEMENT]);

        assert!(tracker.force("Carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lists_capped_users_oldest_first() {
        let channel = Arc::new(FakeChannel::with_history(&[
            ("Bob has capped at the citadel on 03-Jan-2024 at 17:00.", true),
            ("$cap list", false),
            ("Carol capped too", false),
            ("Alice has capped at the citadel on 04-Jan-2024 at 20:15.", true),
        ]));
        let (tracker, _pool) = setup(clan(), channel).await;

        assert_eq!(
            tracker.capped_users().await.unwrap(),
            names(&["Bob", "Alice"])
        );
    }

    #[tokio::test]
    async fn deletes_only_bot_messages() {
        let history = [
            ("Bob has capped at the citadel on 03-Jan-2024 at 17:00.", true),
            ("Build tick changed.", true),
            ("$tick move friday 7", false),
            ("Alice has capped at the citadel on 04-Jan-2024 at 20:15.", true),
            ("1. Bob", true),
        ];

        let channel = Arc::new(FakeChannel::with_history(&history));
        let (tracker, _pool) = setup(clan(), channel.clone()).await;
        assert_eq!(tracker.delete_bot_messages(DeleteTarget::NonCap).await.unwrap(), 2);
        assert_eq!(
            channel.contents(),
            vec![history[0].0, history[2].0, history[3].0]
        );

        let channel = Arc::new(FakeChannel::with_history(&history));
        let (tracker, _pool) = setup(clan(), channel.clone()).await;
        assert_eq!(tracker.delete_bot_messages(DeleteTarget::Before(4)).await.unwrap(), 2);
        assert_eq!(
            channel.contents(),
            vec![history[2].0, history[3].0, history[4].0]
        );

        let channel = Arc::new(FakeChannel::with_history(&history));
        let (tracker, _pool) = setup(clan(), channel.clone()).await;
        assert_eq!(tracker.delete_bot_messages(DeleteTarget::All).await.unwrap(), 4);
        assert_eq!(channel.contents(), vec![history[2].0]);
    }

    #[test]
    fn parses_delete_targets() {
        assert_eq!(DeleteTarget::parse("ALL"), Some(DeleteTarget::All));
        assert_eq!(DeleteTarget::parse("noncap"), Some(DeleteTarget::NonCap));
        assert_eq!(
            DeleteTarget::parse("1192837465"),
            Some(DeleteTarget::Before(1192837465))
        );
        assert_eq!(DeleteTarget::parse("everything"), None);
        assert_eq!(DeleteTarget::parse("0"), None);
    }

    #[tokio::test]
    async fn old_bot_messages_are_deleted_one_by_one() {
        let channel = Arc::new(FakeChannel::default());
        let month_ago = Utc::now() - chrono::Duration::days(30);
        channel.push_at("Bob has capped at the citadel on 03-Jan-2024 at 17:00.", true, month_ago);
        channel.push_at("Build tick changed.", true, month_ago);
        channel.push_at("$cap list", false, month_ago);
        channel.push("1. Bob", true);
        channel.push("Alice has capped at the citadel on 04-Jan-2024 at 20:15.", true);
        let (tracker, _pool) = setup(clan(), channel.clone()).await;

        assert_eq!(tracker.delete_bot_messages(DeleteTarget::All).await.unwrap(), 4);

        assert_eq!(channel.contents(), vec!["$cap list"]);
        assert_eq!(*channel.bulk_calls.lock().unwrap(), vec![vec![5, 4]]);
        let mut singles = channel.single_deletes.lock().unwrap().clone();
        singles.sort();
        assert_eq!(singles, vec![1, 2]);
    }

    #[tokio::test]
    async fn cap_exactly_at_build_tick_is_reported() {
        let api = FakeGameApi::default().with_feed(
            "Frank",
            &[("Frank capped at the clan citadel.", "03-Jan-2024 16:00")],
        );
        let channel = Arc::new(FakeChannel::default());
        let (tracker, pool) = setup(api, channel.clone()).await;

        let caps = tracker.report_caps(&names(&["Frank"])).await.unwrap();

        assert_eq!(caps.len(), 1);
        assert_eq!(caps[0].cap_time, build_tick());
        assert_eq!(
            channel.contents(),
            vec!["Frank has capped at the citadel on 03-Jan-2024 at 16:00."]
        );
        let record = queries::get_cap(&pool, "Frank").await.unwrap().unwrap();
        assert_eq!(record.last_cap_time, Some(build_tick()));
    }
}
