//! Subcommand bodies. Output goes through a writer so tests can capture it.

use crate::confirm::ask_consent;
use anyhow::{Context, Result};
use lumen_common::{SearchOrchestrator, SearchOutcome, SettingsStore};
use std::io::{BufRead, Write};
use tokio_util::sync::CancellationToken;

/// How a single `ask` turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum AskResult {
    /// Answer offline, nothing fetched
    Offline,
    /// User said no at the prompt
    Declined,
    Fetched(SearchOutcome),
}

/// Classify `query`, ask for consent, fetch, and print the context block.
pub async fn ask<R: BufRead, W: Write>(
    orchestrator: &SearchOrchestrator,
    query: &str,
    assume_yes: bool,
    cancel: CancellationToken,
    input: &mut R,
    out: &mut W,
) -> Result<AskResult> {
    let result = run_turn(orchestrator, query, assume_yes, cancel, input, out).await;
    orchestrator.reset().await;
    result
}

async fn run_turn<R: BufRead, W: Write>(
    orchestrator: &SearchOrchestrator,
    query: &str,
    assume_yes: bool,
    cancel: CancellationToken,
    input: &mut R,
    out: &mut W,
) -> Result<AskResult> {
    if !orchestrator.check_if_search_needed(query).await {
        writeln!(out, "No external data needed.")?;
        return Ok(AskResult::Offline);
    }

    let Some(request) = orchestrator.pending_request() else {
        writeln!(out, "No external data needed.")?;
        return Ok(AskResult::Offline);
    };

    let approved = assume_yes
        || ask_consent(&request, input, out).context("Failed to read confirmation")?;
    if !approved {
        orchestrator.decline_search().await;
        writeln!(out, "Skipped. Answering without external data.")?;
        return Ok(AskResult::Declined);
    }

    let outcome = orchestrator
        .perform_confirmed_search_with_cancel(query, cancel)
        .await;

    if outcome.succeeded {
        writeln!(out)?;
        writeln!(out, "{}", outcome.formatted_context)?;
        if !outcome.sources.is_empty() {
            writeln!(out)?;
            writeln!(out, "Sources: {}", outcome.sources.join(", "))?;
        }
    } else {
        let reason = outcome.failure_reason.as_deref().unwrap_or("unknown error");
        writeln!(out, "Could not fetch data: {}. Answering without it.", reason)?;
    }
    Ok(AskResult::Fetched(outcome))
}

/// Last four characters, the rest masked
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}

pub fn show_settings<W: Write>(settings: &SettingsStore, out: &mut W) -> Result<()> {
    writeln!(
        out,
        "Web search:   {}",
        if settings.is_enabled() { "enabled" } else { "disabled" }
    )?;
    match settings.api_key() {
        Some(key) => writeln!(out, "API key:      {}", mask_key(&key))?,
        None => writeln!(out, "API key:      not set")?,
    }
    show_usage(settings, out)
}

pub fn show_usage<W: Write>(settings: &SettingsStore, out: &mut W) -> Result<()> {
    let usage = settings.usage_record();
    writeln!(
        out,
        "Usage ({}): {} of {} searches, {} remaining",
        usage.month_key,
        usage.count,
        settings.monthly_limit(),
        settings.remaining_searches()
    )?;
    Ok(())
}

pub fn set_enabled<W: Write>(settings: &SettingsStore, enabled: bool, out: &mut W) -> Result<()> {
    settings
        .set_enabled(enabled)
        .context("Failed to save settings")?;
    if enabled && !settings.has_api_key() {
        writeln!(out, "Web search enabled, but no API key is set yet.")?;
    } else {
        writeln!(
            out,
            "Web search {}.",
            if enabled { "enabled" } else { "disabled" }
        )?;
    }
    Ok(())
}

pub fn set_api_key<W: Write>(settings: &SettingsStore, key: &str, out: &mut W) -> Result<()> {
    settings.set_api_key(key).context("Failed to save API key")?;
    if settings.has_api_key() {
        writeln!(out, "API key saved.")?;
    } else {
        writeln!(out, "Blank key given, API key cleared.")?;
    }
    Ok(())
}

pub fn clear_api_key<W: Write>(settings: &SettingsStore, out: &mut W) -> Result<()> {
    settings
        .clear_api_key()
        .context("Failed to clear API key")?;
    writeln!(out, "API key cleared.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("abcdefgh"), "****efgh");
        assert_eq!(mask_key("abc"), "***");
        assert_eq!(mask_key(""), "");
    }

    #[test]
    fn test_show_settings_fresh_store() {
        let settings = SettingsStore::in_memory();
        let mut out = Vec::new();
        show_settings(&settings, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("disabled"));
        assert!(text.contains("not set"));
        assert!(text.contains("0 of 2000 searches, 2000 remaining"));
    }

    #[test]
    fn test_enable_without_key_warns() {
        let settings = SettingsStore::in_memory();
        let mut out = Vec::new();
        set_enabled(&settings, true, &mut out).unwrap();
        assert!(settings.is_enabled());
        assert!(String::from_utf8(out).unwrap().contains("no API key"));
    }

    #[test]
    fn test_blank_key_clears() {
        let settings = SettingsStore::in_memory();
        let mut out = Vec::new();
        set_api_key(&settings, "secret-key-1", &mut out).unwrap();
        assert!(settings.has_api_key());
        set_api_key(&settings, "   ", &mut out).unwrap();
        assert!(!settings.has_api_key());
        assert!(String::from_utf8(out).unwrap().contains("cleared"));
    }
}
