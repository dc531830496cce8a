use discord_calendar_sync::components::event_sync::parser::{
    parse_line, DEFAULT_DESCRIPTION, EVENT_DURATION_SECS,
};
use discord_calendar_sync::components::event_sync::{LineParser, MarkerMatch};
use discord_calendar_sync::components::google_calendar::ServiceAccountKey;
use discord_calendar_sync::config::{Config, SyncSettings};
use std::fs;

/// Smoke test to verify that a config can be built without a real environment
#[test]
fn test_config_loads() {
    let config = Config::from_lookup(
        |key| match key {
            "DISCORD_BOT_TOKEN" => Some("test_token".to_string()),
            "DISCORD_CHANNEL_ID" => Some("987654321".to_string()),
            "CALENDAR_ID" => Some("test_calendar".to_string()),
            "GOOGLE_APPLICATION_CREDENTIALS" => Some("/tmp/fake_credentials.json".to_string()),
            _ => None,
        },
        SyncSettings::default(),
    )
    .unwrap();

    assert_eq!(config.google_calendar_id, "test_calendar");
    assert_eq!(config.channel_id, 987654321);
    assert_eq!(config.marker_match, MarkerMatch::Anywhere);
}

/// Missing configuration must stop startup
#[test]
fn test_config_requires_bot_token() {
    let result = Config::from_lookup(|_| None, SyncSettings::default());
    assert!(result.is_err());
}

#[test]
fn test_announcement_scenarios() {
    let with_description = parse_line("<t:1700000000:F> - some - This is the description").unwrap();
    assert_eq!(with_description.description, "This is the description");
    assert_eq!(with_description.start.timestamp(), 1700000000);
    assert_eq!(with_description.end.timestamp(), 1700009000);

    let only = parse_line("<t:1700000000:F> - only").unwrap();
    assert_eq!(only.description, DEFAULT_DESCRIPTION);
    assert_eq!(only.start.timestamp(), 1700000000);
    assert_eq!(only.end.timestamp(), 1700009000);

    assert!(parse_line("no timestamp here").is_none());
}

#[test]
fn test_every_event_has_fixed_duration() {
    let text = "Weekly schedule\n\
                <t:1700000000:F> - Mon - Minecraft\n\
                <t:1700086400:F> - Tue - <:pog:123456789012345678> Just chatting\n\
                Offline on Wednesday\n\
                <t:1700259200:F> - Thu\n";

    let events = LineParser::new(MarkerMatch::Anywhere).parse_message(text);
    let descriptions: Vec<_> = events.iter().map(|e| e.description.as_str()).collect();
    assert_eq!(descriptions, vec!["Minecraft", "Just chatting", DEFAULT_DESCRIPTION]);

    for event in &events {
        assert_eq!((event.end - event.start).num_seconds(), EVENT_DURATION_SECS);
    }
}

/// Settings and credentials are read from disk at startup
#[test]
fn test_files_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();

    let settings_path = dir.path().join("sync.toml");
    fs::write(
        &settings_path,
        "marker_match = \"line_start\"\nskip_line_prefixes = [\"Fanart of the week by \"]\n",
    )
    .unwrap();
    let settings = SyncSettings::from_file(&settings_path).unwrap();
    assert_eq!(settings.marker_match, Some(MarkerMatch::LineStart));
    assert_eq!(settings.skip_line_prefixes.len(), 1);

    let key_path = dir.path().join("key.json");
    fs::write(
        &key_path,
        r#"{"client_email": "bot@project.iam.gserviceaccount.com", "private_key": "pem", "token_uri": "https://oauth2.googleapis.com/token"}"#,
    )
    .unwrap();
    let key = ServiceAccountKey::from_file(&key_path).unwrap();
    assert_eq!(key.client_email, "bot@project.iam.gserviceaccount.com");

    fs::write(&settings_path, "marker_match = 3").unwrap();
    assert!(SyncSettings::from_file(&settings_path).is_err());
}
