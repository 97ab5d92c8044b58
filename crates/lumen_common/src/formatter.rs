//! Context formatter - renders fetched data into a bounded text block for
//! prompt injection.
//!
//! Pure and deterministic: the clock is an argument and nothing iterates a
//! hash map, so identical inputs give byte-identical output. Every block ends
//! with the instruction line and never exceeds the configured cap.

use crate::agenda::{CalendarEvent, Reminder};
use crate::config::FormatterConfig;
use crate::search::{ResultCategory, SearchResult};
use crate::sports::{Game, Scoreboard};
use crate::types::{DetailLevel, ExternalContext, TimeRange};
use crate::weather::WeatherSnapshot;
use chrono::{DateTime, Local};

/// Closing line steering the model to the injected data
pub const INSTRUCTION_LINE: &str =
    "Answer using the data above. Do not call a tool or search again.";

/// Brief-mode snippet length
const BRIEF_DESCRIPTION_CHARS: usize = 150;

/// Results kept per category bucket in detailed mode
const BUCKET_PREFIX: usize = 2;

/// Results kept overall in detailed mode
const DETAILED_MAX_RESULTS: usize = 5;

/// Games listed in brief mode
const BRIEF_MAX_GAMES: usize = 4;

/// What a confirmed fetch produced
#[derive(Debug, Clone, PartialEq)]
pub enum ContextPayload {
    Weather(WeatherSnapshot),
    Calendar {
        range: TimeRange,
        events: Vec<CalendarEvent>,
    },
    Reminders(Vec<Reminder>),
    ReminderCreated(Reminder),
    Sports(Scoreboard),
    Search(Vec<SearchResult>),
}

/// Cut to at most `max` chars, marking the cut with an ellipsis
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}

/// "in 2 hours", "3 days ago", "now"
pub fn relative_time(when: DateTime<Local>, now: DateTime<Local>) -> String {
    let delta = when.signed_duration_since(now);
    let minutes = delta.num_minutes();
    let magnitude = minutes.unsigned_abs();

    let phrase = if magnitude < 1 {
        return "now".to_string();
    } else if magnitude < 60 {
        plural(magnitude, "minute")
    } else if magnitude < 60 * 24 {
        plural(magnitude / 60, "hour")
    } else {
        plural(magnitude / (60 * 24), "day")
    };

    if minutes > 0 {
        format!("in {}", phrase)
    } else {
        format!("{} ago", phrase)
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

/// Per-category snippet budget in detailed mode
fn detailed_snippet_chars(category: ResultCategory) -> usize {
    match category {
        ResultCategory::InstantAnswer | ResultCategory::Faq => 350,
        ResultCategory::News => 300,
        ResultCategory::Discussion | ResultCategory::General => 250,
        ResultCategory::Location => 200,
    }
}

/// Detailed-mode bucket; direct answers and FAQs share the first one
fn bucket(category: ResultCategory) -> usize {
    match category {
        ResultCategory::InstantAnswer | ResultCategory::Faq => 0,
        ResultCategory::News => 1,
        ResultCategory::Location => 2,
        ResultCategory::Discussion => 3,
        ResultCategory::General => 4,
    }
}

pub fn format_game(game: &Game) -> String {
    match (game.away_score, game.home_score) {
        (Some(away), Some(home)) => format!(
            "{} {} - {} {} ({})",
            game.away, away, home, game.home, game.status
        ),
        _ => format!("{} vs {} — {}", game.away, game.home, game.status),
    }
}

pub fn format_event(event: &CalendarEvent) -> String {
    let time = if event.all_day {
        "All day".to_string()
    } else {
        event.start.format("%-I:%M %p").to_string()
    };
    match event.location.as_deref().filter(|l| !l.is_empty()) {
        Some(location) => format!("[{}] {} @ {}", time, event.title, location),
        None => format!("[{}] {}", time, event.title),
    }
}

pub fn format_reminder(reminder: &Reminder, now: DateTime<Local>) -> String {
    match reminder.due {
        Some(due) => format!("{} (due {})", reminder.title, relative_time(due, now)),
        None => reminder.title.clone(),
    }
}

pub struct Formatter {
    caps: FormatterConfig,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(FormatterConfig::default())
    }
}

impl Formatter {
    pub fn new(caps: FormatterConfig) -> Self {
        Self { caps }
    }

    pub fn cap(&self, detail: DetailLevel) -> usize {
        match detail {
            DetailLevel::Brief => self.caps.brief_cap,
            DetailLevel::Detailed => self.caps.detailed_cap,
        }
    }

    /// Render `payload` into an injectable context block with attribution.
    pub fn format(
        &self,
        payload: &ContextPayload,
        query: &str,
        detail: DetailLevel,
        provider: &str,
        now: DateTime<Local>,
    ) -> ExternalContext {
        let (body, mut sources) = match payload {
            ContextPayload::Weather(snapshot) => (self.weather(snapshot, detail), vec![]),
            ContextPayload::Calendar { range, events } => (self.calendar(*range, events), vec![]),
            ContextPayload::Reminders(reminders) => (self.reminders(reminders, now), vec![]),
            ContextPayload::ReminderCreated(reminder) => (
                format!("Reminder created: {}", format_reminder(reminder, now)),
                vec![],
            ),
            ContextPayload::Sports(board) => (self.sports(board, detail), vec![]),
            ContextPayload::Search(results) => match detail {
                DetailLevel::Brief => self.search_brief(query, results),
                DetailLevel::Detailed => self.search_detailed(query, results),
            },
        };
        if sources.is_empty() {
            sources.push(provider.to_string());
        }
        ExternalContext::success(self.finish(&body, detail), sources)
    }

    /// Fit the body under the cap and append the instruction line
    fn finish(&self, body: &str, detail: DetailLevel) -> String {
        let cap = self.cap(detail);
        let reserved = INSTRUCTION_LINE.chars().count() + 1;
        if cap <= reserved {
            return truncate_chars(INSTRUCTION_LINE, cap);
        }
        let body = truncate_chars(body.trim_end(), cap - reserved);
        format!("{}\n{}", body, INSTRUCTION_LINE)
    }

    fn weather(&self, w: &WeatherSnapshot, detail: DetailLevel) -> String {
        let mut line = format!(
            "Current conditions in {}: {:.0}{}, {}",
            w.location,
            w.temperature,
            w.unit(),
            w.condition
        );
        if let Some(h) = w.humidity {
            line.push_str(&format!(", humidity {}%", h));
        }
        if let Some(wind) = w.wind_speed {
            line.push_str(&format!(", wind {:.0} {}", wind, w.wind_unit()));
        }

        let days = match detail {
            DetailLevel::Brief => 1,
            DetailLevel::Detailed => w.daily.len(),
        };
        let mut lines = vec![line];
        if days > 0 && !w.daily.is_empty() {
            lines.push("Forecast:".to_string());
            for day in w.daily.iter().take(days) {
                lines.push(format!(
                    "{}: {}, high {:.0}{} / low {:.0}{}",
                    day.date.format("%a %b %-d"),
                    day.condition,
                    day.high,
                    w.unit(),
                    day.low,
                    w.unit()
                ));
            }
        }
        lines.join("\n")
    }

    fn calendar(&self, range: TimeRange, events: &[CalendarEvent]) -> String {
        if events.is_empty() {
            return format!("No calendar events {}.", range.label());
        }
        let mut lines = vec![format!("Calendar {}:", range.label())];
        lines.extend(events.iter().map(format_event));
        lines.join("\n")
    }

    fn reminders(&self, reminders: &[Reminder], now: DateTime<Local>) -> String {
        if reminders.is_empty() {
            return "No open reminders.".to_string();
        }
        let mut lines = vec!["Open reminders:".to_string()];
        lines.extend(reminders.iter().map(|r| format_reminder(r, now)));
        lines.join("\n")
    }

    fn sports(&self, board: &Scoreboard, detail: DetailLevel) -> String {
        if board.games.is_empty() {
            return format!("No {} games today.", board.league.display_name());
        }
        let limit = match detail {
            DetailLevel::Brief => BRIEF_MAX_GAMES,
            DetailLevel::Detailed => board.games.len(),
        };
        let mut lines = vec![format!("{} scores:", board.league.display_name())];
        lines.extend(board.games.iter().take(limit).map(format_game));
        lines.join("\n")
    }

    fn search_brief(&self, query: &str, results: &[SearchResult]) -> (String, Vec<String>) {
        let Some(best) = results.iter().min_by_key(|r| r.category) else {
            return (format!("No web results for \"{}\".", query), vec![]);
        };
        let body = format!(
            "Web result for \"{}\":\n{}: {} ({})",
            query,
            best.title,
            truncate_chars(&best.description, BRIEF_DESCRIPTION_CHARS),
            best.source_label()
        );
        (body, vec![best.source_label()])
    }

    fn search_detailed(&self, query: &str, results: &[SearchResult]) -> (String, Vec<String>) {
        let mut buckets: [Vec<&SearchResult>; 5] = Default::default();
        for result in results {
            buckets[bucket(result.category)].push(result);
        }

        let picked: Vec<&SearchResult> = buckets
            .iter()
            .flat_map(|b| b.iter().take(BUCKET_PREFIX))
            .take(DETAILED_MAX_RESULTS)
            .copied()
            .collect();

        if picked.is_empty() {
            return (format!("No web results for \"{}\".", query), vec![]);
        }

        let mut lines = vec![format!("Web results for \"{}\":", query)];
        let mut sources: Vec<String> = Vec::new();
        for result in &picked {
            let snippet = truncate_chars(
                &result.description,
                detailed_snippet_chars(result.category),
            );
            let age = result
                .age
                .as_deref()
                .map(|a| format!(", {}", a))
                .unwrap_or_default();
            lines.push(format!(
                "[{}] {}: {} ({}{})",
                result.category.label(),
                result.title,
                snippet,
                result.source_label(),
                age
            ));
            let label = result.source_label();
            if !sources.contains(&label) {
                sources.push(label);
            }
        }
        (lines.join("\n"), sources)
    }
}
