use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapRecord {
    pub id: i64,
    pub rsn: String,
    pub last_cap_time: Option<DateTime<Utc>>,
    pub announced_at: Option<DateTime<Utc>>,
}

impl CapRecord {
    /// Whether the stored cap at `time` has already been posted to the channel.
    pub fn announced(&self, time: DateTime<Utc>) -> bool {
        self.last_cap_time == Some(time) && self.announced_at.is_some()
    }
}
