use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub id: u64,
    pub content: String,
    pub from_bot: bool,
    pub created_at: DateTime<Utc>,
}

/// The chat operations cap reporting needs from the announcement channel.
#[async_trait]
pub trait CapChannel: Send + Sync {
    async fn announce(&self, content: &str) -> Result<()>;

    /// Up to `limit` messages, newest first, optionally only those older than `before`.
    async fn recent_messages(&self, limit: usize, before: Option<u64>)
    -> Result<Vec<ChannelMessage>>;

    /// Deletes messages younger than 14 days in batches.
    async fn bulk_delete(&self, ids: &[u64]) -> Result<()>;

    async fn delete_message(&self, id: u64) -> Result<()>;
}
