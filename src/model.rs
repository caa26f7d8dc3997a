//! Typed records for the upstream JSON payloads.
//!
//! Upstream fields are frequently `null` or absent; every scalar goes through
//! [`nullable`] so that a missing value becomes its zero/empty default instead of
//! failing the whole record.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `"7.3"`, `7.3` or `null` and keeps the textual form. Rating and pass
/// accuracy arrive in all three shapes depending on the endpoint.
pub(crate) fn loose_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Common response wrapper: `{get, parameters, errors, results, paging, response}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Envelope {
    #[serde(default, deserialize_with = "nullable")]
    pub get: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub errors: Value,
    #[serde(default, deserialize_with = "nullable")]
    pub results: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub paging: Paging,
    #[serde(default)]
    pub response: Value,
}

impl Envelope {
    /// The upstream reports quota and parameter problems inside a 200 body, either
    /// as a non-empty array or as an object keyed by the offending parameter.
    pub fn soft_error(&self) -> Option<String> {
        match &self.errors {
            Value::Array(items) if !items.is_empty() => Some(
                items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            Value::Object(map) if !map.is_empty() => Some(
                map.iter()
                    .map(|(k, v)| format!("{k}: {}", v.as_str().unwrap_or(&v.to_string())))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct Paging {
    #[serde(default, deserialize_with = "nullable")]
    pub current: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub total: i64,
}

// ---------------------------------------------------------------------------
// Leagues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeagueEntry {
    #[serde(default, deserialize_with = "nullable")]
    pub league: LeagueInfo,
    #[serde(default, deserialize_with = "nullable")]
    pub country: Country,
    #[serde(default, deserialize_with = "nullable")]
    pub seasons: Vec<SeasonInfo>,
}

/// League block. Inside fixtures it also carries `season` and the free-text `round`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeagueInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub country: String,
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub kind: String,
    #[serde(default, deserialize_with = "nullable")]
    pub season: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub round: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Country {
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeasonInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub year: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub start: String,
    #[serde(default, deserialize_with = "nullable")]
    pub end: String,
    #[serde(default, deserialize_with = "nullable")]
    pub current: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub coverage: Coverage,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Coverage {
    #[serde(default, deserialize_with = "nullable")]
    pub fixtures: FixtureCoverage,
    #[serde(default, deserialize_with = "nullable")]
    pub standings: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub players: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureCoverage {
    #[serde(default, deserialize_with = "nullable")]
    pub events: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub lineups: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub statistics_fixtures: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub statistics_players: bool,
}

impl Coverage {
    pub fn has_fixtures(&self) -> bool {
        let f = &self.fixtures;
        f.events || f.lineups || f.statistics_fixtures || f.statistics_players
    }
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamVenue {
    #[serde(default, deserialize_with = "nullable")]
    pub team: TeamInfo,
    #[serde(default, deserialize_with = "nullable")]
    pub venue: VenueInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub code: String,
    #[serde(default, deserialize_with = "nullable")]
    pub country: String,
    #[serde(default, deserialize_with = "nullable")]
    pub founded: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub national: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VenueInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub city: String,
    #[serde(default, deserialize_with = "nullable")]
    pub capacity: i64,
}

/// Minimal team reference used inside fixtures, lineups and statistics blocks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamRef {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerProfile {
    #[serde(default, deserialize_with = "nullable")]
    pub player: PlayerBio,
    #[serde(default, deserialize_with = "nullable")]
    pub statistics: Vec<PlayerStatBlock>,
}

impl PlayerProfile {
    /// Season aggregate for `team`, falling back to the first block.
    pub fn statistics_for_team(&self, team: i64) -> Option<&PlayerStatBlock> {
        self.statistics
            .iter()
            .find(|s| s.team.id == team)
            .or_else(|| self.statistics.first())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerBio {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub firstname: String,
    #[serde(default, deserialize_with = "nullable")]
    pub lastname: String,
    #[serde(default, deserialize_with = "nullable")]
    pub age: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub birth: Birth,
    #[serde(default, deserialize_with = "nullable")]
    pub nationality: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Birth {
    #[serde(default, deserialize_with = "nullable")]
    pub date: String,
    #[serde(default, deserialize_with = "nullable")]
    pub place: String,
    #[serde(default, deserialize_with = "nullable")]
    pub country: String,
}

/// One statistics block. The same shape is used for season aggregates
/// (`/players`) and for a single match (`/fixtures?id=`); fields that only
/// exist on one of them stay at their defaults on the other.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerStatBlock {
    #[serde(default, deserialize_with = "nullable")]
    pub team: TeamRef,
    #[serde(default, deserialize_with = "nullable")]
    pub league: LeagueInfo,
    #[serde(default, deserialize_with = "nullable")]
    pub games: Games,
    #[serde(default, deserialize_with = "nullable")]
    pub shots: Shots,
    #[serde(default, deserialize_with = "nullable")]
    pub goals: PlayerGoals,
    #[serde(default, deserialize_with = "nullable")]
    pub passes: Passes,
    #[serde(default, deserialize_with = "nullable")]
    pub tackles: Tackles,
    #[serde(default, deserialize_with = "nullable")]
    pub duels: Duels,
    #[serde(default, deserialize_with = "nullable")]
    pub dribbles: Dribbles,
    #[serde(default, deserialize_with = "nullable")]
    pub cards: Cards,
    #[serde(default, deserialize_with = "nullable")]
    pub penalty: Penalty,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Games {
    #[serde(alias = "appearances", default, deserialize_with = "nullable")]
    pub appearences: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub lineups: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub minutes: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub number: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub position: String,
    #[serde(default, deserialize_with = "loose_text")]
    pub rating: String,
    #[serde(default, deserialize_with = "nullable")]
    pub captain: bool,
    #[serde(default, deserialize_with = "nullable")]
    pub substitute: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Shots {
    #[serde(default, deserialize_with = "nullable")]
    pub total: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub on: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerGoals {
    #[serde(default, deserialize_with = "nullable")]
    pub total: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub conceded: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub assists: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub saves: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Passes {
    #[serde(default, deserialize_with = "nullable")]
    pub total: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub key: i64,
    #[serde(default, deserialize_with = "loose_text")]
    pub accuracy: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tackles {
    #[serde(default, deserialize_with = "nullable")]
    pub total: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub blocks: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub interceptions: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Duels {
    #[serde(default, deserialize_with = "nullable")]
    pub total: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub won: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dribbles {
    #[serde(default, deserialize_with = "nullable")]
    pub attempts: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub success: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cards {
    #[serde(default, deserialize_with = "nullable")]
    pub yellow: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub red: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Penalty {
    #[serde(default, deserialize_with = "nullable")]
    pub won: i64,
    // Upstream spells it "commited".
    #[serde(alias = "commited", default, deserialize_with = "nullable")]
    pub committed: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub scored: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub missed: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub saved: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Squad {
    #[serde(default, deserialize_with = "nullable")]
    pub team: TeamRef,
    #[serde(default, deserialize_with = "nullable")]
    pub players: Vec<SquadPlayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SquadPlayer {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub age: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub number: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub position: String,
}

// ---------------------------------------------------------------------------
// Coaches
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Coach {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub firstname: String,
    #[serde(default, deserialize_with = "nullable")]
    pub lastname: String,
    #[serde(default, deserialize_with = "nullable")]
    pub team: TeamRef,
    #[serde(default, deserialize_with = "nullable")]
    pub career: Vec<CareerEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CareerEntry {
    #[serde(default, deserialize_with = "nullable")]
    pub team: TeamRef,
    #[serde(default, deserialize_with = "nullable")]
    pub start: String,
    #[serde(default, deserialize_with = "nullable")]
    pub end: String,
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A fixture as returned by both `/fixtures?league&season` and `/fixtures?id`.
/// Only the detail endpoint fills `lineups`, `statistics` and `players`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default, deserialize_with = "nullable")]
    pub fixture: FixtureInfo,
    #[serde(default, deserialize_with = "nullable")]
    pub league: LeagueInfo,
    #[serde(default, deserialize_with = "nullable")]
    pub teams: FixtureTeams,
    #[serde(default, deserialize_with = "nullable")]
    pub goals: ScorePair,
    #[serde(default, deserialize_with = "nullable")]
    pub score: Score,
    #[serde(default, deserialize_with = "nullable")]
    pub lineups: Vec<Lineup>,
    #[serde(default, deserialize_with = "nullable")]
    pub statistics: Vec<TeamStatisticsBlock>,
    #[serde(default, deserialize_with = "nullable")]
    pub players: Vec<TeamPlayers>,
}

impl Fixture {
    pub fn id(&self) -> i64 {
        self.fixture.id
    }

    pub fn has_started(&self) -> bool {
        self.fixture.status.elapsed != 0
    }

    /// Statistics block for `team`; upstream orders blocks like the lineups, so
    /// the lineup position is used when no block carries the team id.
    pub fn statistics_for(&self, team: i64, index: usize) -> Option<&TeamStatisticsBlock> {
        self.statistics
            .iter()
            .find(|s| s.team.id == team)
            .or_else(|| self.statistics.get(index))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureInfo {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub referee: String,
    #[serde(default, deserialize_with = "nullable")]
    pub timezone: String,
    #[serde(default, deserialize_with = "nullable")]
    pub date: String,
    #[serde(default, deserialize_with = "nullable")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub venue: VenueInfo,
    #[serde(default, deserialize_with = "nullable")]
    pub status: FixtureStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureStatus {
    #[serde(default, deserialize_with = "nullable")]
    pub long: String,
    #[serde(default, deserialize_with = "nullable")]
    pub short: String,
    #[serde(default, deserialize_with = "nullable")]
    pub elapsed: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureTeams {
    #[serde(default, deserialize_with = "nullable")]
    pub home: FixtureTeam,
    #[serde(default, deserialize_with = "nullable")]
    pub away: FixtureTeam,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureTeam {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    /// `null` until a winner is decided, so draws and unplayed games read as false.
    #[serde(default, deserialize_with = "nullable")]
    pub winner: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct ScorePair {
    #[serde(default, deserialize_with = "nullable")]
    pub home: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub away: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Score {
    #[serde(default, deserialize_with = "nullable")]
    pub halftime: ScorePair,
    #[serde(default, deserialize_with = "nullable")]
    pub fulltime: ScorePair,
    #[serde(default, deserialize_with = "nullable")]
    pub extratime: ScorePair,
    #[serde(default, deserialize_with = "nullable")]
    pub penalty: ScorePair,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Lineup {
    #[serde(default, deserialize_with = "nullable")]
    pub team: TeamRef,
    #[serde(default, deserialize_with = "nullable")]
    pub coach: PersonRef,
    #[serde(default, deserialize_with = "nullable")]
    pub formation: String,
    #[serde(rename = "startXI", default, deserialize_with = "nullable")]
    pub start_xi: Vec<LineupSlot>,
    #[serde(default, deserialize_with = "nullable")]
    pub substitutes: Vec<LineupSlot>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineupSlot {
    #[serde(default, deserialize_with = "nullable")]
    pub player: LineupPlayer,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LineupPlayer {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub number: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub pos: String,
    #[serde(default, deserialize_with = "nullable")]
    pub grid: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonRef {
    #[serde(default, deserialize_with = "nullable")]
    pub id: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamStatisticsBlock {
    #[serde(default, deserialize_with = "nullable")]
    pub team: TeamRef,
    #[serde(default, deserialize_with = "nullable")]
    pub statistics: Vec<StatEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatEntry {
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub label: String,
    #[serde(default)]
    pub value: StatValue,
}

impl StatEntry {
    pub fn new(label: &str, value: StatValue) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

/// A statistic value as sent upstream: `12`, `"55%"`, `"1.43"` or `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StatValue {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl<'de> Deserialize<'de> for StatValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64().map_or(StatValue::Missing, StatValue::Number),
            Value::String(s) => StatValue::Text(s),
            _ => StatValue::Missing,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamPlayers {
    #[serde(default, deserialize_with = "nullable")]
    pub team: TeamRef,
    #[serde(default, deserialize_with = "nullable")]
    pub players: Vec<PlayerMatchLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerMatchLine {
    #[serde(default, deserialize_with = "nullable")]
    pub player: PersonRef,
    #[serde(default, deserialize_with = "nullable")]
    pub statistics: Vec<PlayerStatBlock>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_scalars_take_defaults() {
        let raw = r#"{
            "fixture": {"id": 7, "referee": null, "timestamp": 100, "venue": {"id": null}, "status": {"elapsed": null}},
            "goals": {"home": null, "away": null},
            "teams": {"home": {"id": 1, "winner": null}, "away": {"id": 2, "winner": null}}
        }"#;
        let f: Fixture = serde_json::from_str(raw).expect("fixture should decode");
        assert_eq!(f.id(), 7);
        assert_eq!(f.fixture.referee, "");
        assert_eq!(f.fixture.venue.id, 0);
        assert!(!f.has_started());
        assert_eq!(f.goals, ScorePair { home: 0, away: 0 });
        assert!(!f.teams.home.winner);
    }

    #[test]
    fn stat_value_accepts_mixed_shapes() {
        let raw = r#"[{"type":"Total Shots","value":12},{"type":"Ball Possession","value":"55%"},{"type":"Fouls","value":null},{"type":"Odd","value":true}]"#;
        let entries: Vec<StatEntry> = serde_json::from_str(raw).expect("entries should decode");
        assert_eq!(entries[0].value, StatValue::Number(12.0));
        assert_eq!(entries[1].value, StatValue::Text("55%".to_string()));
        assert_eq!(entries[2].value, StatValue::Missing);
        assert_eq!(entries[3].value, StatValue::Missing);
    }

    #[test]
    fn loose_text_keeps_numbers_and_blanks_nulls() {
        let games: Games = serde_json::from_str(r#"{"rating": 7.1}"#).unwrap();
        assert_eq!(games.rating, "7.1");
        let games: Games = serde_json::from_str(r#"{"rating": null}"#).unwrap();
        assert_eq!(games.rating, "");
        let passes: Passes = serde_json::from_str(r#"{"accuracy": "81%"}"#).unwrap();
        assert_eq!(passes.accuracy, "81%");
    }

    #[test]
    fn soft_error_reads_object_and_array_forms() {
        let env: Envelope =
            serde_json::from_str(r#"{"errors": {"token": "Error/Missing application key."}}"#).unwrap();
        assert_eq!(
            env.soft_error().as_deref(),
            Some("token: Error/Missing application key.")
        );
        let env: Envelope = serde_json::from_str(r#"{"errors": []}"#).unwrap();
        assert!(env.soft_error().is_none());
        let env: Envelope = serde_json::from_str(r#"{"errors": ["rate limit"]}"#).unwrap();
        assert_eq!(env.soft_error().as_deref(), Some("rate limit"));
    }
}
