use crate::utils::time::parse_alog_date;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct Activity {
    pub details: String,
    pub date: String,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    // Absent when the profile is private.
    activities: Option<Vec<Activity>>,
}

/// Read access to the game's public player data.
#[async_trait]
pub trait GameApi: Send + Sync {
    /// Recent activity feed for `rsn`, or `None` when the profile is private.
    async fn activities(&self, rsn: &str) -> Result<Option<Vec<Activity>>>;

    /// Current clan roster.
    async fn clan_members(&self) -> Result<Vec<String>>;
}

pub struct HttpGameApi {
    client: reqwest::Client,
    player_url: String,
    clan_url: String,
    clan_name: String,
}

impl HttpGameApi {
    pub fn new(player_url: String, clan_url: String, clan_name: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            player_url,
            clan_url,
            clan_name,
        }
    }
}

#[async_trait]
impl GameApi for HttpGameApi {
    async fn activities(&self, rsn: &str) -> Result<Option<Vec<Activity>>> {
        let url = format!("{}{}&activities=20", self.player_url, rsn);
        let profile: ProfileResponse = self
            .client
            .get(url.as_str())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(profile.activities)
    }

    async fn clan_members(&self) -> Result<Vec<String>> {
        let url = format!("{}{}", self.clan_url, self.clan_name);
        let body = self
            .client
            .get(url.as_str())
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        // The roster is served as Latin-1.
        let text: String = body.iter().map(|&b| b as char).collect();
        Ok(parse_roster(&text))
    }
}

/// Member names from the clan roster CSV, header skipped.
pub fn parse_roster(csv: &str) -> Vec<String> {
    csv.lines()
        .skip(1)
        .filter_map(|line| line.split(',').next())
        .map(|name| name.replace('\u{a0}', " ").trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// First activity whose details contain `search`.
pub fn find_activity<'a>(activities: &'a [Activity], search: &str) -> Option<&'a Activity> {
    activities
        .iter()
        .find(|activity| activity.details.contains(search))
}

/// Looks up `rsn`'s activity feed and returns the first date matching `search`.
/// Private profiles and failed lookups are logged and give `None`.
pub async fn check_alog(api: &dyn GameApi, rsn: &str, search: &str) -> Option<DateTime<Utc>> {
    let activities = match api.activities(rsn).await {
        Ok(Some(activities)) => activities,
        Ok(None) => {
            info!("{}'s profile is private.", rsn);
            return None;
        }
        Err(e) => {
            warn!("Failed to fetch activities for {}: {:?}", rsn, e);
            return None;
        }
    };

    let activity = find_activity(&activities, search)?;
    match parse_alog_date(&activity.date) {
        Ok(date) => Some(date),
        Err(e) => {
            warn!("Skipping activity for {}: {}", rsn, e);
            None
        }
    }
}
