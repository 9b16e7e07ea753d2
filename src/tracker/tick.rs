use crate::utils::time::compute_build_tick;
use crate::utils::validation::{ResetRuleError, day_name, validate_day, validate_hour};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Notify, watch};
use tracing::{error, info};

/// Weekly reset moment, `day` counted from Monday = 0, both in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetRule {
    pub day: u32,
    pub hour: u32,
}

impl Default for ResetRule {
    fn default() -> Self {
        ResetRule { day: 2, hour: 16 }
    }
}

impl ResetRule {
    pub fn parse(day_str: &str, hour_str: &str) -> Result<Self, ResetRuleError> {
        let day = validate_day(day_str)?;
        let hour = validate_hour(hour_str)?;
        Ok(ResetRule { day, hour })
    }

    /// Reads the rule file, creating it with the default rule when missing.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let rule = ResetRule::default();
            rule.save(path)?;
            return Ok(rule);
        }

        let contents = fs::read_to_string(path)?;
        let rule: ResetRule = serde_json::from_str(&contents)?;
        if rule.day > 6 || rule.hour > 23 {
            return Err(anyhow::anyhow!(
                "Invalid reset rule in {}: {:?}",
                path.display(),
                rule
            ));
        }
        Ok(rule)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    pub fn build_tick(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        compute_build_tick(self.day, self.hour, now)
    }
}

impl std::fmt::Display for ResetRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:02}:00 UTC", day_name(self.day), self.hour)
    }
}

#[derive(Debug, Error)]
pub enum MoveError {
    #[error(transparent)]
    Rule(#[from] ResetRuleError),
    #[error(transparent)]
    Save(#[from] anyhow::Error),
}

/// Owns the current build tick. Only the tracker writes it; readers subscribe.
pub struct BuildTickTracker {
    reset_file: PathBuf,
    sender: watch::Sender<DateTime<Utc>>,
    moved: Notify,
}

impl BuildTickTracker {
    pub fn new(reset_file: PathBuf) -> Result<Self> {
        let rule = ResetRule::load(&reset_file)?;
        let (sender, _) = watch::channel(rule.build_tick(Utc::now()));

        Ok(Self {
            reset_file,
            sender,
            moved: Notify::new(),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<DateTime<Utc>> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> DateTime<Utc> {
        *self.sender.borrow()
    }

    /// Persists a new rule and wakes the tracker loop to recompute.
    pub fn move_rule(&self, day_str: &str, hour_str: &str) -> Result<ResetRule, MoveError> {
        let rule = ResetRule::parse(day_str, hour_str)?;
        rule.save(&self.reset_file)?;
        info!("Reset rule moved to {}", rule);
        self.moved.notify_one();
        Ok(rule)
    }

    fn refresh(&self) -> Result<DateTime<Utc>> {
        let rule = ResetRule::load(&self.reset_file)?;
        let tick = rule.build_tick(Utc::now());
        self.sender.send_replace(tick);
        info!("Last build tick: {}", tick);
        Ok(tick)
    }

    /// Recomputes every `interval` or when the rule moves. Stops on the first error.
    pub async fn run(&self, interval: Duration) {
        loop {
            if let Err(e) = self.refresh() {
                error!("Build tick tracker stopped: {:?}", e);
                return;
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = self.moved.notified() => {}
            }
        }
    }
}
