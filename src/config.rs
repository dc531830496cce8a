use crate::components::event_sync::MarkerMatch;
use crate::error::{config_error, env_error, BotResult};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Default activity text for the bot
pub const DEFAULT_ACTIVITY: &str = "Watching the schedule";

/// Optional settings file, relative to the working directory
pub const SETTINGS_PATH: &str = "config/sync.toml";

/// Discord returns at most this many messages per history request
pub const MAX_BACKFILL_MESSAGES: u8 = 100;

/// Main configuration structure for the bot
#[derive(Clone)]
pub struct Config {
    /// Discord bot token
    pub discord_token: String,
    /// Discord channel whose messages are synced
    pub channel_id: u64,
    /// Google Calendar ID events are written to
    pub google_calendar_id: String,
    /// Path to the Google service account JSON key
    pub google_credentials_path: PathBuf,
    /// Bot activity status text
    pub activity: String,
    /// Where in a line the timestamp marker may appear
    pub marker_match: MarkerMatch,
    /// Lines starting with any of these are ignored
    pub skip_line_prefixes: Vec<String>,
    /// Number of recent channel messages to process once connected
    pub backfill_messages: u8,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("discord_token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("google_calendar_id", &self.google_calendar_id)
            .field("google_credentials_path", &self.google_credentials_path)
            .field("activity", &self.activity)
            .field("marker_match", &self.marker_match)
            .field("skip_line_prefixes", &self.skip_line_prefixes)
            .field("backfill_messages", &self.backfill_messages)
            .finish()
    }
}

/// Settings that may come from `config/sync.toml`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncSettings {
    pub marker_match: Option<MarkerMatch>,
    pub skip_line_prefixes: Vec<String>,
    pub backfill_messages: Option<u8>,
}

impl SyncSettings {
    /// Read settings from a TOML file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> BotResult<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Parse settings from TOML text
    pub fn from_toml(content: &str) -> BotResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> BotResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let settings = SyncSettings::from_file(Path::new(SETTINGS_PATH))?;
        Self::from_lookup(|key| env::var(key).ok(), settings)
    }

    /// Build the configuration from a variable lookup and file settings.
    /// Variables take precedence over the file.
    pub fn from_lookup<F>(lookup: F, settings: SyncSettings) -> BotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| env_error(key))
        };

        // Required environment variables
        let discord_token = required("DISCORD_BOT_TOKEN")?;
        let google_calendar_id = required("CALENDAR_ID")?;
        let google_credentials_path = PathBuf::from(required("GOOGLE_APPLICATION_CREDENTIALS")?);

        let channel_id = required("DISCORD_CHANNEL_ID")?
            .trim()
            .parse::<u64>()
            .map_err(|_| config_error("Invalid DISCORD_CHANNEL_ID format"))?;

        // Bot activity status
        let activity = lookup("BOT_ACTIVITY").unwrap_or_else(|| String::from(DEFAULT_ACTIVITY));

        let marker_match = match lookup("MARKER_MATCH") {
            Some(value) => value.parse::<MarkerMatch>()?,
            None => settings.marker_match.unwrap_or_default(),
        };

        let backfill_messages = match lookup("BACKFILL_MESSAGES") {
            Some(value) => value
                .trim()
                .parse::<u8>()
                .map_err(|_| config_error("Invalid BACKFILL_MESSAGES format"))?,
            None => settings.backfill_messages.unwrap_or(0),
        };
        if backfill_messages > MAX_BACKFILL_MESSAGES {
            return Err(config_error(&format!(
                "BACKFILL_MESSAGES must be at most {}",
                MAX_BACKFILL_MESSAGES
            )));
        }

        Ok(Config {
            discord_token,
            channel_id,
            google_calendar_id,
            google_credentials_path,
            activity,
            marker_match,
            skip_line_prefixes: settings.skip_line_prefixes,
            backfill_messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn required_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DISCORD_BOT_TOKEN", "token"),
            ("DISCORD_CHANNEL_ID", "123456789"),
            ("CALENDAR_ID", "calendar@group.calendar.google.com"),
            ("GOOGLE_APPLICATION_CREDENTIALS", "/tmp/key.json"),
        ]
    }

    #[test]
    fn test_loads_required_values_with_defaults() {
        let config = Config::from_lookup(lookup_from(&required_vars()), SyncSettings::default())
            .unwrap();

        assert_eq!(config.channel_id, 123456789);
        assert_eq!(config.google_calendar_id, "calendar@group.calendar.google.com");
        assert_eq!(config.google_credentials_path, PathBuf::from("/tmp/key.json"));
        assert_eq!(config.activity, DEFAULT_ACTIVITY);
        assert_eq!(config.marker_match, MarkerMatch::Anywhere);
        assert!(config.skip_line_prefixes.is_empty());
        assert_eq!(config.backfill_messages, 0);
    }

    #[test]
    fn test_missing_calendar_id_is_fatal() {
        let vars: Vec<_> = required_vars()
            .into_iter()
            .filter(|(k, _)| *k != "CALENDAR_ID")
            .collect();
        let err = Config::from_lookup(lookup_from(&vars), SyncSettings::default()).unwrap_err();
        assert!(matches!(err, crate::error::Error::Environment(ref msg) if msg.contains("CALENDAR_ID")));
    }

    #[test]
    fn test_blank_token_counts_as_missing() {
        let mut vars = required_vars();
        vars[0] = ("DISCORD_BOT_TOKEN", "   ");
        let err = Config::from_lookup(lookup_from(&vars), SyncSettings::default()).unwrap_err();
        assert!(matches!(err, crate::error::Error::Environment(_)));
    }

    #[test]
    fn test_invalid_channel_id() {
        let mut vars = required_vars();
        vars[1] = ("DISCORD_CHANNEL_ID", "general");
        let err = Config::from_lookup(lookup_from(&vars), SyncSettings::default()).unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(_)));
    }

    #[test]
    fn test_env_overrides_settings_file() {
        let settings = SyncSettings::from_toml(
            r#"
            marker_match = "line_start"
            skip_line_prefixes = ["Fanart of the week by "]
            backfill_messages = 5
            "#,
        )
        .unwrap();

        let from_file = Config::from_lookup(lookup_from(&required_vars()), settings.clone()).unwrap();
        assert_eq!(from_file.marker_match, MarkerMatch::LineStart);
        assert_eq!(from_file.skip_line_prefixes, vec!["Fanart of the week by ".to_string()]);
        assert_eq!(from_file.backfill_messages, 5);

        let mut vars = required_vars();
        vars.push(("MARKER_MATCH", "anywhere"));
        vars.push(("BACKFILL_MESSAGES", "0"));
        let overridden = Config::from_lookup(lookup_from(&vars), settings).unwrap();
        assert_eq!(overridden.marker_match, MarkerMatch::Anywhere);
        assert_eq!(overridden.backfill_messages, 0);
    }

    #[test]
    fn test_backfill_limit() {
        let mut vars = required_vars();
        vars.push(("BACKFILL_MESSAGES", "101"));
        assert!(Config::from_lookup(lookup_from(&vars), SyncSettings::default()).is_err());
    }

    #[test]
    fn test_debug_hides_discord_token() {
        let mut vars = required_vars();
        vars[0] = ("DISCORD_BOT_TOKEN", "very-secret-token");
        let config = Config::from_lookup(lookup_from(&vars), SyncSettings::default()).unwrap();

        let debug = format!("{:?}", config);
        assert!(debug.contains("123456789"));
        assert!(!debug.contains("very-secret-token"));
    }

    #[test]
    fn test_unknown_settings_key_is_rejected() {
        assert!(SyncSettings::from_toml("colour = \"blue\"").is_err());
    }

    #[test]
    fn test_missing_settings_file_gives_defaults() {
        let settings = SyncSettings::from_file(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(settings, SyncSettings::default());
    }
}
