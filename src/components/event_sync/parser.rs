use crate::error::{config_error, Error};
use crate::utils::time::epoch_to_utc;
use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Every synced event is assumed to last two and a half hours
pub const EVENT_DURATION_SECS: i64 = 9000;

/// Description used when a line carries none
pub const DEFAULT_DESCRIPTION: &str = "No description provided";

/// Separator between the marker, title and description segments of a line
const SEGMENT_SEPARATOR: &str = " - ";

lazy_static! {
    /// Discord long date/time mention, e.g. `<t:1700000000:F>`
    static ref MARKER_ANYWHERE: Regex =
        Regex::new(r"<t:([0-9]+):F>").expect("MARKER_ANYWHERE should compile - this is a bug");

    static ref MARKER_LINE_START: Regex =
        Regex::new(r"^<t:([0-9]+):F>").expect("MARKER_LINE_START should compile - this is a bug");

    /// Static or animated custom emoji, e.g. `<:wave:123456789012345678>`
    static ref CUSTOM_EMOJI: Regex = Regex::new(r"<a?:\w+:[0-9]{15,22}>")
        .expect("CUSTOM_EMOJI should compile - this is a bug");
}

/// Where a timestamp marker has to appear for a line to count as an event line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerMatch {
    /// The marker may appear anywhere in the line
    #[default]
    Anywhere,
    /// The line has to begin with the marker
    #[serde(alias = "line-start")]
    LineStart,
}

impl MarkerMatch {
    fn regex(self) -> &'static Regex {
        match self {
            MarkerMatch::Anywhere => &*MARKER_ANYWHERE,
            MarkerMatch::LineStart => &*MARKER_LINE_START,
        }
    }
}

impl FromStr for MarkerMatch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "anywhere" => Ok(MarkerMatch::Anywhere),
            "line_start" => Ok(MarkerMatch::LineStart),
            other => Err(config_error(&format!(
                "Invalid MARKER_MATCH '{}', expected 'anywhere' or 'line_start'",
                other
            ))),
        }
    }
}

/// An event extracted from a single line of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl fmt::Display for ParsedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({} - {})", self.description, self.start, self.end)
    }
}

/// Extracts events from message text
#[derive(Debug, Clone, Default)]
pub struct LineParser {
    marker_match: MarkerMatch,
    skip_line_prefixes: Vec<String>,
}

impl LineParser {
    /// Create a parser with the given marker policy
    pub fn new(marker_match: MarkerMatch) -> Self {
        Self {
            marker_match,
            skip_line_prefixes: Vec::new(),
        }
    }

    /// Ignore lines starting with any of the given prefixes
    pub fn with_skip_line_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.skip_line_prefixes = prefixes;
        self
    }

    /// Lines of a message worth parsing: non-blank and not skipped by prefix.
    /// Each line comes with its 1-based line number in the message.
    pub fn event_lines<'a>(
        &'a self,
        text: &'a str,
    ) -> impl Iterator<Item = (usize, &'a str)> + 'a {
        let trimmed = text.trim();
        let leading_lines = text[..text.len() - text.trim_start().len()]
            .matches('\n')
            .count();

        trimmed
            .lines()
            .enumerate()
            .map(move |(index, line)| (leading_lines + index + 1, line))
            .filter(move |(_, line)| {
                !line.trim().is_empty()
                    && !self
                        .skip_line_prefixes
                        .iter()
                        .any(|prefix| line.starts_with(prefix.as_str()))
            })
    }

    /// Parse every event line of a message
    pub fn parse_message(&self, text: &str) -> Vec<ParsedEvent> {
        self.event_lines(text)
            .filter_map(|(_, line)| self.parse_line(line))
            .collect()
    }

    /// Parse one line. Returns `None` when the line has no usable marker.
    pub fn parse_line(&self, line: &str) -> Option<ParsedEvent> {
        let captures = self.marker_match.regex().captures(line)?;
        let digits = captures.get(1)?.as_str();

        let start = match digits.parse::<i64>().ok().and_then(epoch_to_utc) {
            Some(start) => start,
            None => {
                debug!("Ignoring out of range timestamp marker: {}", digits);
                return None;
            }
        };
        let end = start.checked_add_signed(Duration::seconds(EVENT_DURATION_SECS))?;

        let description = line
            .splitn(3, SEGMENT_SEPARATOR)
            .nth(2)
            .map(strip_custom_emoji)
            .filter(|description| !description.is_empty())
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string());

        Some(ParsedEvent {
            description,
            start,
            end,
        })
    }
}

/// Parse one line with the default marker policy
pub fn parse_line(line: &str) -> Option<ParsedEvent> {
    LineParser::default().parse_line(line)
}

/// Remove custom emoji tokens and surrounding whitespace
pub fn strip_custom_emoji(text: &str) -> String {
    CUSTOM_EMOJI.replace_all(text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: i64 = 1700000000;

    #[test]
    fn test_parse_line_with_description() {
        let event = parse_line("<t:1700000000:F> - some - This is the description").unwrap();
        assert_eq!(event.description, "This is the description");
        assert_eq!(event.start.timestamp(), TS);
        assert_eq!(event.end.timestamp(), TS + 9000);
    }

    #[test]
    fn test_parse_line_default_description() {
        let event = parse_line("<t:1700000000:F> - only").unwrap();
        assert_eq!(event.description, DEFAULT_DESCRIPTION);
        assert_eq!(event.start.timestamp(), TS);
        assert_eq!(event.end.timestamp(), TS + 9000);
    }

    #[test]
    fn test_parse_line_marker_only() {
        let event = parse_line("<t:1700000000:F>").unwrap();
        assert_eq!(event.description, DEFAULT_DESCRIPTION);
        assert!(event.end > event.start);
    }

    #[test]
    fn test_parse_line_no_match() {
        assert_eq!(parse_line("no timestamp here"), None);
        assert_eq!(parse_line(""), None);
        // Other timestamp styles are not event markers
        assert_eq!(parse_line("<t:1700000000:R> - soon - Stream"), None);
        assert_eq!(parse_line("<t:abc:F> - soon - Stream"), None);
    }

    #[test]
    fn test_description_keeps_later_separators() {
        let event = parse_line("<t:1700000000:F> - title - Part one - part two").unwrap();
        assert_eq!(event.description, "Part one - part two");
    }

    #[test]
    fn test_marker_anywhere_in_line() {
        let line = "Next stream <t:1700000000:F> - Friday - Retro games night";
        let event = parse_line(line).unwrap();
        assert_eq!(event.description, "Retro games night");
        assert_eq!(event.start.timestamp(), TS);

        assert_eq!(LineParser::new(MarkerMatch::LineStart).parse_line(line), None);
    }

    #[test]
    fn test_line_start_policy_accepts_leading_marker() {
        let parser = LineParser::new(MarkerMatch::LineStart);
        let event = parser.parse_line("<t:1700000000:F> - a - b").unwrap();
        assert_eq!(event.description, "b");
    }

    #[test]
    fn test_emoji_are_stripped() {
        let line = "<t:1700000000:F> - x - <:wave:00000000000000000> Karaoke <a:party:123456789012345678>  ";
        let event = parse_line(line).unwrap();
        assert_eq!(event.description, "Karaoke");
    }

    #[test]
    fn test_emoji_only_description_falls_back() {
        let line = "<t:1700000000:F> - x - <a:NAME:00000000000000000> <:NAME:00000000000000000>";
        let event = parse_line(line).unwrap();
        assert_eq!(event.description, DEFAULT_DESCRIPTION);
    }

    #[test]
    fn test_strip_custom_emoji() {
        assert_eq!(strip_custom_emoji("  plain text "), "plain text");
        // ID too short to be an emoji
        assert_eq!(strip_custom_emoji("<:x:123>"), "<:x:123>");
        // ID too long to be an emoji
        assert_eq!(
            strip_custom_emoji("<:x:12345678901234567890123>"),
            "<:x:12345678901234567890123>"
        );
        assert_eq!(strip_custom_emoji("a<:x:123456789012345>b"), "ab");
    }

    #[test]
    fn test_out_of_range_timestamp_is_ignored() {
        assert_eq!(parse_line("<t:99999999999999999999:F> - a - b"), None);
        assert_eq!(parse_line("<t:9223372036854775807:F> - a - b"), None);
    }

    #[test]
    fn test_parse_message_filters_lines() {
        let text = "\n  Schedule for the week\n\n\
                    <t:1700000000:F> - Tue - Monster hunting\r\n\
                    Fanart of the week by <t:1700100000:F> - someone - art\n\
                    <t:1700200000:F> - Thu\n";
        let parser = LineParser::new(MarkerMatch::Anywhere)
            .with_skip_line_prefixes(vec!["Fanart of the week by ".to_string()]);

        let events = parser.parse_message(text);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].description, "Monster hunting");
        assert_eq!(events[1].description, DEFAULT_DESCRIPTION);
        assert_eq!(events[1].start.timestamp(), 1700200000);

        // Without the prefix filter the fanart line is an event too
        assert_eq!(LineParser::default().parse_message(text).len(), 3);
    }

    #[test]
    fn test_event_lines_keep_message_line_numbers() {
        let text = "\n\n  Schedule\n\n<t:1700000000:F> - a - b\nSkip me\n<t:1700100000:F>\n";
        let parser = LineParser::default().with_skip_line_prefixes(vec!["Skip".to_string()]);

        let lines: Vec<(usize, &str)> = parser.event_lines(text).collect();
        assert_eq!(
            lines,
            vec![
                (3, "Schedule"),
                (5, "<t:1700000000:F> - a - b"),
                (7, "<t:1700100000:F>"),
            ]
        );
    }

    #[test]
    fn test_non_ascii_digits_are_not_ids() {
        // Arabic-Indic digits are Unicode decimal digits but not Discord IDs
        let fake_id = "\u{0661}".repeat(18);
        let token = format!("<:wave:{}>", fake_id);
        assert_eq!(strip_custom_emoji(&token), token);

        let marker = format!("<t:{}:F> - a - b", "\u{0661}".repeat(10));
        assert_eq!(parse_line(&marker), None);
    }

    #[test]
    fn test_marker_match_from_toml_accepts_both_spellings() {
        #[derive(Deserialize)]
        struct Settings {
            marker_match: MarkerMatch,
        }

        let underscore: Settings = toml::from_str("marker_match = \"line_start\"").unwrap();
        assert_eq!(underscore.marker_match, MarkerMatch::LineStart);
        let hyphen: Settings = toml::from_str("marker_match = \"line-start\"").unwrap();
        assert_eq!(hyphen.marker_match, MarkerMatch::LineStart);
    }

    #[test]
    fn test_marker_match_from_str() {
        assert_eq!("anywhere".parse::<MarkerMatch>().unwrap(), MarkerMatch::Anywhere);
        assert_eq!("LINE_START".parse::<MarkerMatch>().unwrap(), MarkerMatch::LineStart);
        assert_eq!("line-start".parse::<MarkerMatch>().unwrap(), MarkerMatch::LineStart);
        assert!("sometimes".parse::<MarkerMatch>().is_err());
    }
}
