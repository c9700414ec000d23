use crate::error::{env_error, BotResult};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;

/// Default activity text for the bot
pub const DEFAULT_ACTIVITY: &str = "Mirroring events to Google Calendar";

/// Default page size for the startup reconciliation listing window
pub const DEFAULT_RECONCILE_MAX_RESULTS: u32 = 50;

/// Main configuration structure for the bot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,
    /// Discord guild ID (server) whose scheduled events are mirrored
    pub guild_id: u64,
    /// Google Calendar API client ID
    pub google_client_id: String,
    /// Google Calendar API client secret
    pub google_client_secret: String,
    /// OAuth refresh token for the calendar account
    pub google_refresh_token: String,
    /// Google Calendar ID to mirror into
    pub google_calendar_id: String,
    /// Maximum number of calendar events fetched during reconciliation
    pub reconcile_max_results: u32,
    /// Bot activity status text
    pub activity: String,
}

/// Non-secret settings that can be overridden from config/calbridge.toml
#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    reconcile_max_results: Option<u32>,
    activity: Option<String>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> BotResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Required environment variables
        let discord_token = env::var("DISCORD_TOKEN").map_err(|_| env_error("DISCORD_TOKEN"))?;
        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| env_error("GOOGLE_CLIENT_ID"))?;
        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").map_err(|_| env_error("GOOGLE_CLIENT_SECRET"))?;
        let google_refresh_token =
            env::var("GOOGLE_REFRESH_TOKEN").map_err(|_| env_error("GOOGLE_REFRESH_TOKEN"))?;
        let google_calendar_id =
            env::var("GOOGLE_CALENDAR_ID").map_err(|_| env_error("GOOGLE_CALENDAR_ID"))?;

        // Parse numeric values
        let guild_id = env::var("GUILD_ID")
            .map_err(|_| env_error("GUILD_ID"))?
            .parse::<u64>()
            .map_err(|_| env_error("Invalid GUILD_ID format"))?;

        // Bot activity status
        let activity = env::var("BOT_ACTIVITY").unwrap_or_else(|_| String::from(DEFAULT_ACTIVITY));

        // Load non-secret overrides from file if it exists
        let mut settings = FileSettings::default();
        if let Ok(content) = fs::read_to_string("config/calbridge.toml") {
            if let Ok(file_settings) = toml::from_str::<FileSettings>(&content) {
                settings = file_settings;
            }
        }

        Ok(Config {
            discord_token,
            guild_id,
            google_client_id,
            google_client_secret,
            google_refresh_token,
            google_calendar_id,
            reconcile_max_results: settings
                .reconcile_max_results
                .unwrap_or(DEFAULT_RECONCILE_MAX_RESULTS),
            activity: settings.activity.unwrap_or(activity),
        })
    }
}
