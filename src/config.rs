use anyhow::Result;
use std::env;
use std::path::PathBuf;

const DEFAULT_PLAYER_URL: &str = "https://apps.runescape.com/runemetrics/profile/profile?user=";
const DEFAULT_CLAN_URL: &str =
    "http://services.runescape.com/m=clan-hiscores/members_lite.ws?clanName=";

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub cap_channel_id: u64,
    pub cap_handler_role: String,
    pub player_url: String,
    pub clan_url: String,
    pub clan_name: String,
    pub reset_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN")
            .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN environment variable is required"))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:citadel.db".to_string());

        let cap_channel_id = env::var("CAP_CHANNEL_ID")
            .map_err(|_| anyhow::anyhow!("CAP_CHANNEL_ID environment variable is required"))?
            .parse::<u64>()
            .map_err(|e| anyhow::anyhow!("CAP_CHANNEL_ID must be a channel id: {}", e))?;

        let cap_handler_role =
            env::var("CAP_HANDLER_ROLE").unwrap_or_else(|_| "cap handler".to_string());

        let player_url =
            env::var("PLAYER_URL").unwrap_or_else(|_| DEFAULT_PLAYER_URL.to_string());

        let clan_url = env::var("CLAN_URL").unwrap_or_else(|_| DEFAULT_CLAN_URL.to_string());

        let clan_name = env::var("CLAN_NAME")
            .map_err(|_| anyhow::anyhow!("CLAN_NAME environment variable is required"))?;

        let reset_file = env::var("RESET_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./resources/reset.json"));

        Ok(Config {
            discord_token,
            database_url,
            cap_channel_id,
            cap_handler_role,
            player_url,
            clan_url,
            clan_name,
            reset_file,
        })
    }
}
