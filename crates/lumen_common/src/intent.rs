//! Intent classifier - maps free text to a query domain.
//!
//! Pure keyword/phrase matching, no LLM and no network. Domains are tested in
//! fixed priority order (reminders, calendar, weather, sports) and the first
//! match wins; everything else is `general`.
//!
//! For general queries `detect_general_intent` grades how likely a web search
//! is to help. The LLM is only consulted by the orchestrator when this returns
//! `ProbablyNeedsSearch`.

use crate::types::{League, QueryDomain, ReminderRequest, SearchIntent, TimeRange};
use chrono::{DateTime, Duration, Local, NaiveTime};
use regex::Regex;
use std::sync::LazyLock;

// ============================================================================
// Keyword tables
// ============================================================================

const REMINDER_PHRASES: &[&str] = &[
    "remind me",
    "reminder",
    "reminders",
    "to-do",
    "todo",
    "to do list",
    "my tasks",
];

const CALENDAR_PHRASES: &[&str] = &[
    "calendar",
    "my schedule",
    "schedule today",
    "schedule tomorrow",
    "meeting",
    "meetings",
    "appointment",
    "appointments",
    "am i free",
    "am i busy",
    "what's on my",
    "whats on my",
    "events today",
    "events tomorrow",
];

const WEATHER_PHRASES: &[&str] = &[
    "weather",
    "forecast",
    "temperature",
    "raining",
    "rain today",
    "rain tomorrow",
    "will it rain",
    "snowing",
    "will it snow",
    "umbrella",
    "humidity",
    "how hot",
    "how cold",
    "sunny",
];

const SPORTS_PHRASES: &[&str] = &[
    "score",
    "scores",
    "scoreboard",
    "game last night",
    "who won the game",
    "standings",
    "playoffs",
    "nba",
    "wnba",
    "nfl",
    "mlb",
    "nhl",
    "mls",
    "premier league",
    "epl",
];

/// Team names that identify a league on their own
const TEAM_ALIASES: &[(&str, League)] = &[
    ("lakers", League::Nba),
    ("celtics", League::Nba),
    ("warriors", League::Nba),
    ("knicks", League::Nba),
    ("bulls", League::Nba),
    ("patriots", League::Nfl),
    ("chiefs", League::Nfl),
    ("eagles", League::Nfl),
    ("cowboys", League::Nfl),
    ("packers", League::Nfl),
    ("yankees", League::Mlb),
    ("red sox", League::Mlb),
    ("dodgers", League::Mlb),
    ("mets", League::Mlb),
    ("cubs", League::Mlb),
    ("bruins", League::Nhl),
    ("maple leafs", League::Nhl),
    ("canadiens", League::Nhl),
    ("inter miami", League::Mls),
    ("la galaxy", League::Mls),
    ("arsenal", League::PremierLeague),
    ("chelsea", League::PremierLeague),
    ("liverpool", League::PremierLeague),
    ("manchester united", League::PremierLeague),
    ("man city", League::PremierLeague),
];

const LEAGUE_NAMES: &[(&str, League)] = &[
    ("wnba", League::Wnba),
    ("nba", League::Nba),
    ("basketball", League::Nba),
    ("nfl", League::Nfl),
    ("football", League::Nfl),
    ("mlb", League::Mlb),
    ("baseball", League::Mlb),
    ("nhl", League::Nhl),
    ("hockey", League::Nhl),
    ("mls", League::Mls),
    ("premier league", League::PremierLeague),
    ("epl", League::PremierLeague),
];

/// Conversational or tutorial requests the local model handles alone.
/// Checked first and overrides every trigger.
const EXCLUSION_PHRASES: &[&str] = &[
    "write a",
    "write me",
    "help me write",
    "tell me a joke",
    "tell me a story",
    "explain how",
    "explain why",
    "explain the concept",
    "how do i",
    "how to",
    "teach me",
    "translate",
    "summarize this",
    "rewrite",
    "what do you think",
    "who are you",
    "about yourself",
    "poem",
    "brainstorm",
    "give me ideas",
];

/// Phrases that only make sense with live data
const DEFINITE_TRIGGERS: &[&str] = &[
    "search for",
    "search the web",
    "look up",
    "google",
    "latest news",
    "breaking news",
    "news about",
    "news on",
    "stock price",
    "price of",
    "exchange rate",
    "what's happening",
    "whats happening",
    "happening right now",
];

const TEMPORAL_KEYWORDS: &[&str] = &[
    "today",
    "tonight",
    "yesterday",
    "this week",
    "this month",
    "this year",
    "latest",
    "recent",
    "recently",
    "current",
    "currently",
    "right now",
    "now",
    "upcoming",
];

const CURRENT_EVENT_PHRASES: &[&str] = &[
    "news",
    "election",
    "announced",
    "announcement",
    "released",
    "release date",
    "launch",
    "update on",
    "stock",
    "market",
    "trending",
    "passed away",
    "died",
    "won the",
];

const QUESTION_WORDS: &[&str] = &[
    "who", "what", "when", "where", "which", "why", "how", "is", "are", "did", "does", "will",
];

/// Conversational lead-ins removed before searching, longest first
const SEARCH_PREFIXES: &[&str] = &[
    "can you please search for",
    "could you search the web for",
    "can you search the web for",
    "please search the web for",
    "could you search for",
    "can you search for",
    "search the web for",
    "please search for",
    "can you look up",
    "could you look up",
    "can you tell me",
    "please look up",
    "tell me about",
    "search for",
    "what are the",
    "what is the",
    "who is the",
    "look up",
    "find me",
    "what are",
    "what is",
    "what's",
    "who is",
    "who was",
    "google",
    "find",
];

/// Words that mean the bare "X weather" pattern caught a phrase, not a place
const LOCATION_STOPWORDS: &[&str] = &[
    "the", "how", "how's", "hows", "what", "what's", "whats", "is", "it", "it's", "like", "will",
    "be", "my", "local", "current", "today's", "good", "bad", "nice",
];

/// Time words stripped from the end of a captured location
const LOCATION_NOISE: &[&str] = &[
    "right now",
    "this weekend",
    "this week",
    "this morning",
    "this afternoon",
    "this evening",
    "today",
    "tonight",
    "tomorrow",
    "now",
    "currently",
    "like",
    "please",
];

// ============================================================================
// Patterns
// ============================================================================

static LOCATION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"(?i)\bweather\s+(?:like\s+)?(?:in|for|at)\s+(.+)$").unwrap(),
        Regex::new(r"(?i)\b(?:forecast|temperature)\s+(?:in|for|at)\s+(.+)$").unwrap(),
        Regex::new(
            r"(?i)\b(?:is it|will it)\s+(?:be\s+)?(?:rain|raining|snow|snowing|sunny|cold|hot|warm|windy)\s+(?:in|at)\s+(.+)$",
        )
        .unwrap(),
        Regex::new(r"(?i)^(?:what's the\s+|whats the\s+|the\s+)?([a-z][a-z .'-]*?)\s+(?:weather|forecast)\b").unwrap(),
    ]
});

/// Longest lead-in first so the first hit is the longest match
static SORTED_SEARCH_PREFIXES: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut prefixes = SEARCH_PREFIXES.to_vec();
    prefixes.sort_by(|a, b| b.len().cmp(&a.len()));
    prefixes
});

static REMINDER_CREATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:remind me(?:\s+to|\s+about|\s+that)?|(?:add|create|set)\s+(?:a\s+)?reminder(?:\s+to|\s+for|\s+about)?)\b\s*(.*)$",
    )
    .unwrap()
});

static TIME_HINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(tomorrow(?:\s+(?:morning|afternoon|evening))?|tonight|this\s+(?:morning|afternoon|evening)|in\s+\d+\s+(?:minutes?|mins?|hours?|days?)|at\s+\d{1,2}(?::\d{2})?\s*(?:am|pm)?)\b",
    )
    .unwrap()
});

static RELATIVE_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^in\s+(\d+)\s+(minute|minutes|min|mins|hour|hours|day|days)$").unwrap()
});

static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^at\s+(\d{1,2})(?::(\d{2}))?\s*(am|pm)?$").unwrap()
});

// ============================================================================
// Matching helpers
// ============================================================================

/// Phrase match on word boundaries ("now" does not match "know")
pub(crate) fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let bytes = haystack.as_bytes();
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(phrase) {
        let begin = start + pos;
        let end = begin + phrase.len();
        let before_ok = begin == 0 || !bytes[begin - 1].is_ascii_alphanumeric();
        let after_ok = end == bytes.len() || !bytes[end].is_ascii_alphanumeric();
        if before_ok && after_ok {
            return true;
        }
        start = begin + 1;
        while start < haystack.len() && !haystack.is_char_boundary(start) {
            start += 1;
        }
    }
    false
}

fn contains_any(haystack: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| contains_phrase(haystack, p))
}

fn normalize(query: &str) -> String {
    query.trim().to_lowercase().replace('\u{2019}', "'")
}

// ============================================================================
// Classification
// ============================================================================

/// Map a query to exactly one domain. Priority: reminders > calendar > weather > sports.
pub fn classify_domain(query: &str) -> QueryDomain {
    let q = normalize(query);

    if contains_any(&q, REMINDER_PHRASES) {
        return QueryDomain::Reminders;
    }
    if contains_any(&q, CALENDAR_PHRASES) {
        return QueryDomain::Calendar;
    }
    if contains_any(&q, WEATHER_PHRASES) {
        return QueryDomain::Weather;
    }
    if contains_any(&q, SPORTS_PHRASES) || TEAM_ALIASES.iter().any(|(t, _)| contains_phrase(&q, t))
    {
        return QueryDomain::Sports;
    }

    QueryDomain::General
}

/// Grade how much a general query would benefit from a web search.
pub fn detect_general_intent(query: &str) -> SearchIntent {
    let q = normalize(query);

    if contains_any(&q, EXCLUSION_PHRASES) {
        return SearchIntent::NoSearchNeeded;
    }

    if contains_any(&q, DEFINITE_TRIGGERS) {
        return SearchIntent::DefinitelyNeedsSearch;
    }

    let mut indicators = 0;
    if contains_any(&q, TEMPORAL_KEYWORDS) {
        indicators += 1;
    }
    if contains_any(&q, CURRENT_EVENT_PHRASES) {
        indicators += 1;
    }
    let first_word = q
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '\'')
        .find(|w| !w.is_empty())
        .unwrap_or("");
    let first_word = first_word.split('\'').next().unwrap_or("");
    if QUESTION_WORDS.contains(&first_word) {
        indicators += 1;
    }

    if indicators >= 2 {
        SearchIntent::ProbablyNeedsSearch
    } else {
        SearchIntent::NoSearchNeeded
    }
}

/// Strip a conversational lead-in ("can you search for", "what is") from the query.
pub fn extract_search_query(text: &str) -> String {
    let trimmed = text.trim();

    for prefix in SORTED_SEARCH_PREFIXES.iter() {
        if let Some(rest) = strip_prefix_ignore_case(trimmed, prefix) {
            // Only strip whole words
            if rest.is_empty() || rest.starts_with(|c: char| !c.is_alphanumeric()) {
                return rest
                    .trim()
                    .trim_end_matches(|c: char| c == '?' || c == '.' || c == '!')
                    .trim()
                    .to_string();
            }
        }
    }

    trimmed
        .trim_end_matches(|c: char| c == '?' || c == '.' || c == '!')
        .trim()
        .to_string()
}

/// Pull the place name out of "weather in X" style phrasing.
pub fn extract_location(text: &str) -> Option<String> {
    let cleaned = normalize(text);
    let cleaned = cleaned.trim_end_matches(|c: char| c == '?' || c == '.' || c == '!');

    let bare_pattern = LOCATION_PATTERNS.len() - 1;
    for (index, pattern) in LOCATION_PATTERNS.iter().enumerate() {
        let Some(caps) = pattern.captures(cleaned) else {
            continue;
        };
        let Some(span) = caps.get(1) else {
            continue;
        };
        if index == bare_pattern
            && span
                .as_str()
                .split_whitespace()
                .any(|w| LOCATION_STOPWORDS.contains(&w))
        {
            continue;
        }

        let location = strip_location_noise(span.as_str());
        if location.chars().count() <= 1 {
            return None;
        }
        return Some(location);
    }

    None
}

fn strip_location_noise(span: &str) -> String {
    let mut location = span
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation() && c != '.')
        .trim()
        .to_string();

    loop {
        let before = location.len();
        for noise in LOCATION_NOISE {
            if let Some(stripped) = location.strip_suffix(noise) {
                if stripped.is_empty() || stripped.ends_with(' ') || stripped.ends_with(',') {
                    location = stripped.trim_end_matches([' ', ',']).to_string();
                }
            }
        }
        if location.len() == before {
            break;
        }
    }

    location.trim().to_string()
}

/// Calendar window from keywords, defaulting to today.
pub fn extract_time_range(text: &str) -> TimeRange {
    let q = normalize(text);

    if contains_phrase(&q, "tomorrow") {
        TimeRange::Tomorrow
    } else if contains_any(&q, &["this week", "week", "upcoming", "next few days", "weekend"]) {
        TimeRange::ThisWeek
    } else {
        TimeRange::Today
    }
}

/// Parse "remind me to X tomorrow" style phrasing.
pub fn parse_reminder_request(text: &str) -> ReminderRequest {
    let trimmed = text.trim();

    let Some(caps) = REMINDER_CREATION.captures(trimmed) else {
        return ReminderRequest::default();
    };

    let rest = caps.get(1).map(|m| m.as_str()).unwrap_or("");
    let time_hint = TIME_HINT
        .captures(rest)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase());

    let without_hint = TIME_HINT.replace(rest, "");
    let title = without_hint
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_start_matches("to ")
        .trim_end_matches(|c: char| c == '.' || c == '!' || c == '?' || c == ',')
        .trim()
        .to_string();

    ReminderRequest {
        is_creation: true,
        title: if title.is_empty() { None } else { Some(title) },
        time_hint,
    }
}

/// Turn a time hint into a concrete due date relative to `now`.
pub fn resolve_due_date(hint: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    let hint = hint.trim().to_lowercase();
    let today = now.date_naive();

    let at = |date: chrono::NaiveDate, hour: u32, minute: u32| {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .and_then(|t| date.and_time(t).and_local_timezone(Local).earliest())
    };

    match hint.as_str() {
        "tomorrow" | "tomorrow morning" => return at(today.succ_opt()?, 9, 0),
        "tomorrow afternoon" => return at(today.succ_opt()?, 14, 0),
        "tomorrow evening" => return at(today.succ_opt()?, 18, 0),
        "this morning" => return at(today, 9, 0),
        "this afternoon" => return at(today, 14, 0),
        "this evening" => return at(today, 18, 0),
        "tonight" => return at(today, 20, 0),
        _ => {}
    }

    if let Some(caps) = RELATIVE_OFFSET.captures(&hint) {
        let amount: i64 = caps.get(1)?.as_str().parse().ok()?;
        let delta = match caps.get(2)?.as_str() {
            "minute" | "minutes" | "min" | "mins" => Duration::minutes(amount),
            "hour" | "hours" => Duration::hours(amount),
            _ => Duration::days(amount),
        };
        return Some(now + delta);
    }

    if let Some(caps) = CLOCK_TIME.captures(&hint) {
        let mut hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps
            .get(2)
            .map(|m| m.as_str().parse().unwrap_or(0))
            .unwrap_or(0);
        match caps.get(3).map(|m| m.as_str()) {
            Some("pm") if hour < 12 => hour += 12,
            Some("am") if hour == 12 => hour = 0,
            _ => {}
        }
        let candidate = at(today, hour, minute)?;
        if candidate <= now {
            return at(today.succ_opt()?, hour, minute);
        }
        return Some(candidate);
    }

    None
}

/// League named (or implied by a team) in the query.
pub fn extract_league(text: &str) -> Option<League> {
    let q = normalize(text);

    LEAGUE_NAMES
        .iter()
        .chain(TEAM_ALIASES.iter())
        .find(|(name, _)| contains_phrase(&q, name))
        .map(|(_, league)| *league)
}

/// Remainder of `text` after a lower-case `prefix`, comparing case-folded chars.
/// The split always lands on a char boundary of `text` itself.
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(text);
    }
    let mut expected = prefix.chars();
    for (idx, c) in text.char_indices() {
        for folded in c.to_lowercase() {
            if expected.next() != Some(folded) {
                return None;
            }
        }
        if expected.as_str().is_empty() {
            return Some(&text[idx + c.len_utf8()..]);
        }
    }
    None
}

// ============================================================================
// Query
// ============================================================================

/// A classified user query. Built once per turn and not mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub raw: String,
    pub domain: QueryDomain,
    pub location: Option<String>,
    pub time_range: TimeRange,
    pub reminder: Option<ReminderRequest>,
    pub league: Option<League>,
}

impl Query {
    /// Classify raw text and extract the fields its domain needs.
    pub fn classify(raw: &str) -> Self {
        let domain = classify_domain(raw);

        Self {
            raw: raw.to_string(),
            domain,
            location: match domain {
                QueryDomain::Weather => extract_location(raw),
                _ => None,
            },
            time_range: match domain {
                QueryDomain::Calendar => extract_time_range(raw),
                _ => TimeRange::Today,
            },
            reminder: match domain {
                QueryDomain::Reminders => Some(parse_reminder_request(raw)),
                _ => None,
            },
            league: match domain {
                QueryDomain::Sports => extract_league(raw),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_domain_priority_order() {
        assert_eq!(classify_domain("remind me to check the weather"), QueryDomain::Reminders);
        assert_eq!(classify_domain("any meetings when it's raining?"), QueryDomain::Calendar);
        assert_eq!(classify_domain("weather for the nba game"), QueryDomain::Weather);
        assert_eq!(classify_domain("nba scores"), QueryDomain::Sports);
        assert_eq!(classify_domain("who invented the telephone"), QueryDomain::General);
    }

    #[test]
    fn test_team_alias_routes_to_sports() {
        assert_eq!(classify_domain("did the Celtics win?"), QueryDomain::Sports);
        assert_eq!(extract_league("did the Celtics win?"), Some(League::Nba));
    }

    #[test]
    fn test_phrase_requires_word_boundary() {
        assert!(contains_phrase("what time is it now", "now"));
        assert!(!contains_phrase("i know that", "now"));
        assert!(!contains_phrase("scoreless draw", "score"));
    }

    #[test]
    fn test_exclusion_overrides_triggers() {
        assert_eq!(
            detect_general_intent("write a poem about the latest news"),
            SearchIntent::NoSearchNeeded
        );
        assert_eq!(
            detect_general_intent("how do i search for files in linux"),
            SearchIntent::NoSearchNeeded
        );
    }

    #[test]
    fn test_definite_triggers() {
        assert_eq!(
            detect_general_intent("search for rust 2024 edition"),
            SearchIntent::DefinitelyNeedsSearch
        );
        assert_eq!(
            detect_general_intent("latest news on the mars mission"),
            SearchIntent::DefinitelyNeedsSearch
        );
    }

    #[test]
    fn test_indicator_scoring() {
        // question word + temporal
        assert_eq!(
            detect_general_intent("who is leading the race today"),
            SearchIntent::ProbablyNeedsSearch
        );
        // temporal + current event
        assert_eq!(
            detect_general_intent("election results today"),
            SearchIntent::ProbablyNeedsSearch
        );
        // question word only
        assert_eq!(
            detect_general_intent("what is a monad"),
            SearchIntent::NoSearchNeeded
        );
    }

    #[test]
    fn test_temporal_counted_once() {
        assert_eq!(
            detect_general_intent("today right now currently"),
            SearchIntent::NoSearchNeeded
        );
    }

    #[test]
    fn test_extract_search_query_strips_longest_prefix() {
        assert_eq!(extract_search_query("Can you search for Boston news?"), "Boston news");
        assert_eq!(extract_search_query("what is the price of gold"), "price of gold");
        assert_eq!(extract_search_query("rust async book"), "rust async book");
    }

    #[test]
    fn test_extract_search_query_case_folding_changes_byte_length() {
        // U+212A KELVIN SIGN lower-cases to a one-byte 'k'
        assert_eq!(
            extract_search_query("loo\u{212A} up Ωmega café"),
            "Ωmega café"
        );
        assert_eq!(extract_search_query("SEARCH FOR Zürich"), "Zürich");
        assert_eq!(strip_prefix_ignore_case("\u{212A}elvin", "kel"), Some("vin"));
        assert_eq!(strip_prefix_ignore_case("ke", "kel"), None);
    }

    #[test]
    fn test_extract_search_query_whole_words_only() {
        assert_eq!(extract_search_query("findings on sleep"), "findings on sleep");
    }

    #[test]
    fn test_extract_location() {
        assert_eq!(extract_location("weather in Boston"), Some("boston".to_string()));
        assert_eq!(
            extract_location("What's the weather like in San Francisco today?"),
            Some("san francisco".to_string())
        );
        assert_eq!(
            extract_location("forecast for New York this weekend"),
            Some("new york".to_string())
        );
        assert_eq!(extract_location("will it rain in Seattle tomorrow"), Some("seattle".to_string()));
        assert_eq!(extract_location("Chicago weather"), Some("chicago".to_string()));
    }

    #[test]
    fn test_extract_location_none() {
        assert_eq!(extract_location("how's the weather"), None);
        assert_eq!(extract_location("weather in x"), None);
        assert_eq!(extract_location("weather in today"), None);
    }

    #[test]
    fn test_extract_time_range() {
        assert_eq!(extract_time_range("what's on my calendar"), TimeRange::Today);
        assert_eq!(extract_time_range("meetings tomorrow"), TimeRange::Tomorrow);
        assert_eq!(extract_time_range("my schedule this week"), TimeRange::ThisWeek);
    }

    #[test]
    fn test_reminder_creation_without_hint() {
        let req = parse_reminder_request("remind me to call mom");
        assert!(req.is_creation);
        assert_eq!(req.title.as_deref(), Some("call mom"));
        assert_eq!(req.time_hint, None);
    }

    #[test]
    fn test_reminder_creation_with_hint() {
        let req = parse_reminder_request("Remind me to buy milk tomorrow morning");
        assert_eq!(req.title.as_deref(), Some("buy milk"));
        assert_eq!(req.time_hint.as_deref(), Some("tomorrow morning"));

        let req = parse_reminder_request("set a reminder to stretch in 30 minutes");
        assert_eq!(req.title.as_deref(), Some("stretch"));
        assert_eq!(req.time_hint.as_deref(), Some("in 30 minutes"));
    }

    #[test]
    fn test_reminder_listing_is_not_creation() {
        let req = parse_reminder_request("what are my reminders");
        assert!(!req.is_creation);
        assert_eq!(req.title, None);
    }

    #[test]
    fn test_resolve_due_date() {
        let now = Local.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();

        let due = resolve_due_date("tomorrow", now).unwrap();
        assert_eq!(due.date_naive(), now.date_naive().succ_opt().unwrap());
        assert_eq!(due.hour(), 9);

        let due = resolve_due_date("in 2 hours", now).unwrap();
        assert_eq!(due.hour(), 12);

        let due = resolve_due_date("at 5pm", now).unwrap();
        assert_eq!((due.hour(), due.date_naive()), (17, now.date_naive()));

        // already past today, rolls to tomorrow
        let due = resolve_due_date("at 8am", now).unwrap();
        assert_eq!(due.date_naive(), now.date_naive().succ_opt().unwrap());

        assert_eq!(resolve_due_date("someday", now), None);
    }

    #[test]
    fn test_query_classify_weather_scenario() {
        let query = Query::classify("weather in Boston");
        assert_eq!(query.domain, QueryDomain::Weather);
        assert_eq!(query.location.as_deref(), Some("boston"));
        assert!(query.reminder.is_none());
    }

    #[test]
    fn test_query_classify_reminder_scenario() {
        let query = Query::classify("remind me to call mom");
        assert_eq!(query.domain, QueryDomain::Reminders);
        let reminder = query.reminder.unwrap();
        assert!(reminder.is_creation);
        assert_eq!(reminder.title.as_deref(), Some("call mom"));
        assert!(reminder.time_hint.is_none());
    }
}
