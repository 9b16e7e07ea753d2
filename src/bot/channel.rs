use crate::tracker::channel::{CapChannel, ChannelMessage};
use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

// Discord caps both history pages and bulk deletes at 100 messages.
const PAGE_SIZE: usize = 100;

/// The cap channel, seen through the bot's own HTTP client.
pub struct DiscordChannel {
    http: Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
    bot_id: serenity::UserId,
}

impl DiscordChannel {
    pub fn new(
        http: Arc<serenity::Http>,
        channel_id: serenity::ChannelId,
        bot_id: serenity::UserId,
    ) -> Self {
        Self {
            http,
            channel_id,
            bot_id,
        }
    }
}

#[async_trait]
impl CapChannel for DiscordChannel {
    async fn announce(&self, content: &str) -> Result<()> {
        self.channel_id.say(&self.http, content).await?;
        Ok(())
    }

    async fn recent_messages(
        &self,
        limit: usize,
        before: Option<u64>,
    ) -> Result<Vec<ChannelMessage>> {
        let mut messages = Vec::new();
        let mut before = before.filter(|id| *id != 0).map(serenity::MessageId::new);

        while messages.len() < limit {
            let page_size = (limit - messages.len()).min(PAGE_SIZE);
            let mut request = serenity::GetMessages::new().limit(page_size as u8);
            if let Some(id) = before {
                request = request.before(id);
            }

            let page = self.channel_id.messages(&self.http, request).await?;
            let Some(oldest) = page.last() else {
                break;
            };
            before = Some(oldest.id);
            let exhausted = page.len() < page_size;

            messages.extend(page.into_iter().map(|message| ChannelMessage {
                id: message.id.get(),
                from_bot: message.author.id == self.bot_id,
                created_at: DateTime::from_timestamp(message.timestamp.unix_timestamp(), 0)
                    .unwrap_or_default(),
                content: message.content,
            }));

            if exhausted {
                break;
            }
        }

        Ok(messages)
    }

    async fn bulk_delete(&self, ids: &[u64]) -> Result<()> {
        for chunk in ids.chunks(PAGE_SIZE) {
            // The bulk endpoint needs at least two messages.
            if let [id] = chunk {
                self.delete_message(*id).await?;
                continue;
            }

            let message_ids: Vec<serenity::MessageId> = chunk
                .iter()
                .map(|&id| serenity::MessageId::new(id))
                .collect();
            self.channel_id
                .delete_messages(&self.http, message_ids)
                .await?;
        }
        Ok(())
    }

    async fn delete_message(&self, id: u64) -> Result<()> {
        self.channel_id
            .delete_message(&self.http, serenity::MessageId::new(id))
            .await?;
        Ok(())
    }
}
