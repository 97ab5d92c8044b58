//! Sports scoreboard providers.
//!
//! ESPN's public scoreboard is the primary source; TheSportsDB is a backup
//! that covers fewer leagues. Both are keyed by the league key ("nba", "epl").

use crate::error::{AugmentError, Result};
use crate::provider::Provider;
use crate::types::League;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const ESPN_BASE: &str = "https://site.api.espn.com/apis/site/v2/sports";
const SPORTSDB_BASE: &str = "https://www.thesportsdb.com/api/v1/json/3";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub away: String,
    pub home: String,
    pub away_score: Option<u32>,
    pub home_score: Option<u32>,
    /// Provider status text, e.g. "Final", "Q3 4:12", "7:30 PM ET"
    pub status: String,
}

impl Game {
    pub fn has_score(&self) -> bool {
        self.away_score.is_some() && self.home_score.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub league: League,
    pub games: Vec<Game>,
}

fn league_for_key(key: &str) -> Result<League> {
    League::from_key(key).ok_or_else(|| AugmentError::Provider(format!("unknown league {}", key)))
}

// ============================================================================
// ESPN
// ============================================================================

fn espn_path(league: League) -> &'static str {
    match league {
        League::Nba => "basketball/nba",
        League::Wnba => "basketball/wnba",
        League::Nfl => "football/nfl",
        League::Mlb => "baseball/mlb",
        League::Nhl => "hockey/nhl",
        League::Mls => "soccer/usa.1",
        League::PremierLeague => "soccer/eng.1",
    }
}

#[derive(Debug, Deserialize)]
struct EspnScoreboard {
    #[serde(default)]
    events: Vec<EspnEvent>,
}

#[derive(Debug, Deserialize)]
struct EspnEvent {
    #[serde(default)]
    competitions: Vec<EspnCompetition>,
    status: EspnStatus,
}

#[derive(Debug, Deserialize)]
struct EspnCompetition {
    #[serde(default)]
    competitors: Vec<EspnCompetitor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnCompetitor {
    home_away: String,
    team: EspnTeam,
    #[serde(default)]
    score: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnTeam {
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct EspnStatus {
    #[serde(rename = "type")]
    kind: EspnStatusType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EspnStatusType {
    /// "pre", "in" or "post"
    state: String,
    short_detail: String,
}

/// Turn an ESPN scoreboard body into games. Scores are dropped before tip-off.
pub fn parse_espn_scoreboard(league: League, body: &str) -> Result<Scoreboard> {
    let board: EspnScoreboard =
        serde_json::from_str(body).map_err(|e| AugmentError::Parse(e.to_string()))?;

    let mut games = Vec::new();
    for event in board.events {
        let Some(competition) = event.competitions.into_iter().next() else {
            continue;
        };
        let started = event.status.kind.state != "pre";
        let mut home = None;
        let mut away = None;
        for competitor in competition.competitors {
            let score = competitor
                .score
                .as_deref()
                .and_then(|s| s.parse::<u32>().ok())
                .filter(|_| started);
            let side = (competitor.team.display_name, score);
            if competitor.home_away == "home" {
                home = Some(side);
            } else {
                away = Some(side);
            }
        }
        if let (Some((home, home_score)), Some((away, away_score))) = (home, away) {
            games.push(Game {
                away,
                home,
                away_score,
                home_score,
                status: event.status.kind.short_detail,
            });
        }
    }
    Ok(Scoreboard { league, games })
}

pub struct EspnScoreboardProvider {
    client: reqwest::Client,
}

impl EspnScoreboardProvider {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }
}

#[async_trait]
impl Provider for EspnScoreboardProvider {
    type Output = Scoreboard;

    fn name(&self) -> &str {
        "espn"
    }

    fn priority(&self) -> u32 {
        0
    }

    fn supports(&self, key: &str) -> bool {
        League::from_key(key).is_some()
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn fetch(&self, key: &str) -> Result<Scoreboard> {
        let league = league_for_key(key)?;
        let url = format!("{}/{}/scoreboard", ESPN_BASE, espn_path(league));
        let body = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let board = parse_espn_scoreboard(league, &body)?;
        debug!("espn: {} games for {}", board.games.len(), key);
        Ok(board)
    }
}

// ============================================================================
// TheSportsDB
// ============================================================================

fn sportsdb_league(league: League) -> Option<&'static str> {
    match league {
        League::Nba => Some("NBA"),
        League::Nfl => Some("NFL"),
        League::Mlb => Some("MLB"),
        League::Nhl => Some("NHL"),
        League::PremierLeague => Some("English Premier League"),
        League::Wnba | League::Mls => None,
    }
}

#[derive(Debug, Deserialize)]
struct SportsDbDay {
    #[serde(default)]
    events: Option<Vec<SportsDbEvent>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SportsDbEvent {
    str_home_team: String,
    str_away_team: String,
    #[serde(default)]
    int_home_score: Option<String>,
    #[serde(default)]
    int_away_score: Option<String>,
    #[serde(default)]
    str_status: Option<String>,
    #[serde(default)]
    str_time: Option<String>,
}

pub fn parse_sportsdb_day(league: League, body: &str) -> Result<Scoreboard> {
    let day: SportsDbDay =
        serde_json::from_str(body).map_err(|e| AugmentError::Parse(e.to_string()))?;
    let games = day
        .events
        .unwrap_or_default()
        .into_iter()
        .map(|e| {
            let status = e
                .str_status
                .filter(|s| !s.is_empty())
                .or(e.str_time)
                .unwrap_or_else(|| "Scheduled".to_string());
            Game {
                away: e.str_away_team,
                home: e.str_home_team,
                away_score: e.int_away_score.and_then(|s| s.parse().ok()),
                home_score: e.int_home_score.and_then(|s| s.parse().ok()),
                status,
            }
        })
        .collect();
    Ok(Scoreboard { league, games })
}

pub struct SportsDbProvider {
    client: reqwest::Client,
}

impl SportsDbProvider {
    pub fn new(timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }
}

#[async_trait]
impl Provider for SportsDbProvider {
    type Output = Scoreboard;

    fn name(&self) -> &str {
        "thesportsdb"
    }

    fn priority(&self) -> u32 {
        10
    }

    fn supports(&self, key: &str) -> bool {
        League::from_key(key).and_then(sportsdb_league).is_some()
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn fetch(&self, key: &str) -> Result<Scoreboard> {
        let league = league_for_key(key)?;
        let name = sportsdb_league(league).ok_or(AugmentError::NoResults)?;
        let date = Self::today().format("%Y-%m-%d").to_string();
        let body = self
            .client
            .get(format!("{}/eventsday.php", SPORTSDB_BASE))
            .query(&[("d", date.as_str()), ("l", name)])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_sportsdb_day(league, &body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ESPN_BODY: &str = r#"{
        "events": [
            {
                "status": {"type": {"state": "post", "shortDetail": "Final"}},
                "competitions": [{"competitors": [
                    {"homeAway": "home", "team": {"displayName": "Boston Celtics"}, "score": "112"},
                    {"homeAway": "away", "team": {"displayName": "Miami Heat"}, "score": "104"}
                ]}]
            },
            {
                "status": {"type": {"state": "pre", "shortDetail": "7:30 PM ET"}},
                "competitions": [{"competitors": [
                    {"homeAway": "home", "team": {"displayName": "Denver Nuggets"}, "score": "0"},
                    {"homeAway": "away", "team": {"displayName": "Phoenix Suns"}, "score": "0"}
                ]}]
            }
        ]
    }"#;

    #[test]
    fn test_parse_espn_final_and_upcoming() {
        let board = parse_espn_scoreboard(League::Nba, ESPN_BODY).unwrap();
        assert_eq!(board.games.len(), 2);

        let final_game = &board.games[0];
        assert_eq!(final_game.away, "Miami Heat");
        assert_eq!(final_game.home_score, Some(112));
        assert_eq!(final_game.status, "Final");

        let upcoming = &board.games[1];
        assert!(!upcoming.has_score());
        assert_eq!(upcoming.status, "7:30 PM ET");
    }

    #[test]
    fn test_parse_espn_empty_day() {
        let board = parse_espn_scoreboard(League::Nhl, r#"{"events": []}"#).unwrap();
        assert!(board.games.is_empty());
    }

    #[test]
    fn test_parse_sportsdb() {
        let body = r#"{"events": [
            {"strHomeTeam": "Arsenal", "strAwayTeam": "Chelsea", "intHomeScore": "2", "intAwayScore": "1", "strStatus": "FT"},
            {"strHomeTeam": "Everton", "strAwayTeam": "Fulham", "intHomeScore": null, "intAwayScore": null, "strStatus": "", "strTime": "15:00:00"}
        ]}"#;
        let board = parse_sportsdb_day(League::PremierLeague, body).unwrap();
        assert_eq!(board.games[0].home_score, Some(2));
        assert_eq!(board.games[0].status, "FT");
        assert_eq!(board.games[1].status, "15:00:00");

        let empty = parse_sportsdb_day(League::Nba, r#"{"events": null}"#).unwrap();
        assert!(empty.games.is_empty());
    }

    #[test]
    fn test_coverage() {
        let espn = EspnScoreboardProvider::new(Duration::from_secs(1)).unwrap();
        let backup = SportsDbProvider::new(Duration::from_secs(1)).unwrap();
        assert!(espn.supports("mls"));
        assert!(!backup.supports("mls"));
        assert!(backup.supports("epl"));
        assert!(!espn.supports("cricket"));
    }
}
