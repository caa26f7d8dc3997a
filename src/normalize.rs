//! Pure coercions from loosely-typed upstream values into stored numbers.
//!
//! Nothing here logs. Each function hands back what it could salvage plus the
//! [`Anomaly`] values it ran into; callers decide how loudly to report them.

use std::fmt;

use crate::model::{Fixture, Lineup, PlayerStatBlock, StatEntry, StatValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anomaly {
    pub field: &'static str,
    pub detail: String,
}

impl Anomaly {
    fn new(field: &'static str, detail: impl Into<String>) -> Self {
        Self {
            field,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.detail)
    }
}

// ---------------------------------------------------------------------------
// Team statistics
// ---------------------------------------------------------------------------

/// The closed set of team statistic labels the upstream sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    ShotsOnGoal,
    ShotsOffGoal,
    TotalShots,
    BlockedShots,
    ShotsInsideBox,
    ShotsOutsideBox,
    Fouls,
    CornerKicks,
    Offsides,
    BallPossession,
    YellowCards,
    RedCards,
    GoalkeeperSaves,
    TotalPasses,
    PassesAccurate,
    PassesPercent,
    ExpectedGoals,
}

impl StatKind {
    pub const ALL: [StatKind; 17] = [
        StatKind::ShotsOnGoal,
        StatKind::ShotsOffGoal,
        StatKind::TotalShots,
        StatKind::BlockedShots,
        StatKind::ShotsInsideBox,
        StatKind::ShotsOutsideBox,
        StatKind::Fouls,
        StatKind::CornerKicks,
        StatKind::Offsides,
        StatKind::BallPossession,
        StatKind::YellowCards,
        StatKind::RedCards,
        StatKind::GoalkeeperSaves,
        StatKind::TotalPasses,
        StatKind::PassesAccurate,
        StatKind::PassesPercent,
        StatKind::ExpectedGoals,
    ];

    pub fn from_label(label: &str) -> Option<Self> {
        Some(match label {
            "Shots on Goal" => StatKind::ShotsOnGoal,
            "Shots off Goal" => StatKind::ShotsOffGoal,
            "Total Shots" => StatKind::TotalShots,
            "Blocked Shots" => StatKind::BlockedShots,
            "Shots insidebox" => StatKind::ShotsInsideBox,
            "Shots outsidebox" => StatKind::ShotsOutsideBox,
            "Fouls" => StatKind::Fouls,
            "Corner Kicks" => StatKind::CornerKicks,
            "Offsides" => StatKind::Offsides,
            "Ball Possession" => StatKind::BallPossession,
            "Yellow Cards" => StatKind::YellowCards,
            "Red Cards" => StatKind::RedCards,
            "Goalkeeper Saves" => StatKind::GoalkeeperSaves,
            "Total passes" => StatKind::TotalPasses,
            "Passes accurate" => StatKind::PassesAccurate,
            "Passes %" => StatKind::PassesPercent,
            "expected_goals" => StatKind::ExpectedGoals,
            _ => return None,
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            StatKind::ShotsOnGoal => "Shots on Goal",
            StatKind::ShotsOffGoal => "Shots off Goal",
            StatKind::TotalShots => "Total Shots",
            StatKind::BlockedShots => "Blocked Shots",
            StatKind::ShotsInsideBox => "Shots insidebox",
            StatKind::ShotsOutsideBox => "Shots outsidebox",
            StatKind::Fouls => "Fouls",
            StatKind::CornerKicks => "Corner Kicks",
            StatKind::Offsides => "Offsides",
            StatKind::BallPossession => "Ball Possession",
            StatKind::YellowCards => "Yellow Cards",
            StatKind::RedCards => "Red Cards",
            StatKind::GoalkeeperSaves => "Goalkeeper Saves",
            StatKind::TotalPasses => "Total passes",
            StatKind::PassesAccurate => "Passes accurate",
            StatKind::PassesPercent => "Passes %",
            StatKind::ExpectedGoals => "expected_goals",
        }
    }

    /// A `null` here is worth reporting; for counters it just means zero.
    fn null_is_anomaly(self) -> bool {
        matches!(self, StatKind::BallPossession | StatKind::PassesPercent)
    }
}

/// One team's statistics for one fixture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeamStatLine {
    pub shots_on: i64,
    pub shots_off: i64,
    pub shots_total: i64,
    pub shots_blocked: i64,
    pub shots_box: i64,
    pub shots_outside: i64,
    pub fouls: i64,
    pub corners: i64,
    pub offsides: i64,
    pub possession: i64,
    pub yellow: i64,
    pub red: i64,
    pub gk_saves: i64,
    pub passes_total: i64,
    pub passes_accurate: i64,
    pub passes_percent: i64,
    pub expected_goals: f64,
}

impl TeamStatLine {
    fn slot(&mut self, kind: StatKind) -> Option<&mut i64> {
        Some(match kind {
            StatKind::ShotsOnGoal => &mut self.shots_on,
            StatKind::ShotsOffGoal => &mut self.shots_off,
            StatKind::TotalShots => &mut self.shots_total,
            StatKind::BlockedShots => &mut self.shots_blocked,
            StatKind::ShotsInsideBox => &mut self.shots_box,
            StatKind::ShotsOutsideBox => &mut self.shots_outside,
            StatKind::Fouls => &mut self.fouls,
            StatKind::CornerKicks => &mut self.corners,
            StatKind::Offsides => &mut self.offsides,
            StatKind::BallPossession => &mut self.possession,
            StatKind::YellowCards => &mut self.yellow,
            StatKind::RedCards => &mut self.red,
            StatKind::GoalkeeperSaves => &mut self.gk_saves,
            StatKind::TotalPasses => &mut self.passes_total,
            StatKind::PassesAccurate => &mut self.passes_accurate,
            StatKind::PassesPercent => &mut self.passes_percent,
            StatKind::ExpectedGoals => return None,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedStats {
    pub stats: TeamStatLine,
    pub anomalies: Vec<Anomaly>,
    /// Labels outside the known set, in payload order.
    pub ignored: Vec<String>,
}

pub fn normalize_team_statistics(entries: &[StatEntry]) -> NormalizedStats {
    let mut out = NormalizedStats::default();
    for entry in entries {
        let Some(kind) = StatKind::from_label(&entry.label) else {
            out.ignored.push(entry.label.clone());
            continue;
        };

        if kind == StatKind::ExpectedGoals {
            match coerce_float(&entry.value) {
                Ok(v) => out.stats.expected_goals = v,
                Err(detail) => out.anomalies.push(Anomaly::new(kind.label(), detail)),
            }
            continue;
        }

        let value = match (&entry.value, kind.null_is_anomaly()) {
            (StatValue::Missing, true) => {
                out.anomalies.push(Anomaly::new(kind.label(), "value is null"));
                continue;
            }
            (value, _) => match coerce_int(value) {
                Ok(v) => v,
                Err(detail) => {
                    out.anomalies.push(Anomaly::new(kind.label(), detail));
                    continue;
                }
            },
        };
        if let Some(slot) = out.stats.slot(kind) {
            *slot = value;
        }
    }
    out
}

fn coerce_int(value: &StatValue) -> Result<i64, String> {
    match value {
        StatValue::Number(n) => Ok(n.trunc() as i64),
        StatValue::Missing => Ok(0),
        StatValue::Text(raw) => {
            let cleaned = raw.replace('%', "");
            let cleaned = cleaned.trim();
            if cleaned.is_empty() {
                return Ok(0);
            }
            if let Ok(v) = cleaned.parse::<i64>() {
                return Ok(v);
            }
            cleaned
                .parse::<f64>()
                .map(|v| v.trunc() as i64)
                .map_err(|_| format!("unparseable value {raw:?}"))
        }
    }
}

fn coerce_float(value: &StatValue) -> Result<f64, String> {
    match value {
        StatValue::Number(n) => Ok(*n),
        StatValue::Missing => Ok(0.0),
        StatValue::Text(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| format!("unparseable value {raw:?}"))
        }
    }
}

// ---------------------------------------------------------------------------
// Player rating / pass accuracy
// ---------------------------------------------------------------------------

pub fn default_numeric_text(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.is_empty() { "0" } else { trimmed }
}

pub fn parse_rating(raw: &str) -> (f64, Option<Anomaly>) {
    let text = default_numeric_text(raw);
    match text.parse::<f64>() {
        Ok(v) => (v, None),
        Err(_) => (0.0, Some(Anomaly::new("rating", format!("unparseable {raw:?}")))),
    }
}

pub fn parse_accuracy(raw: &str) -> (i64, Option<Anomaly>) {
    let stripped = raw.replace('%', "");
    let text = default_numeric_text(&stripped);
    if let Ok(v) = text.parse::<i64>() {
        return (v, None);
    }
    match text.parse::<f64>() {
        Ok(v) => (v.trunc() as i64, None),
        Err(_) => (0, Some(Anomaly::new("accuracy", format!("unparseable {raw:?}")))),
    }
}

/// Player figures shared by the per-match and per-season tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerStatLine {
    pub minutes: i64,
    pub position: String,
    pub rating: f64,
    pub captain: bool,
    pub substitute: bool,
    pub games: i64,
    pub lineups: i64,
    pub shots_total: i64,
    pub shots_on: i64,
    pub goals_scored: i64,
    pub goals_assisted: i64,
    pub passes_total: i64,
    pub passes_key: i64,
    pub accuracy: i64,
    pub tackles: i64,
    pub block: i64,
    pub interceptions: i64,
    pub duels_total: i64,
    pub duels_won: i64,
    pub dribbles_total: i64,
    pub dribbles_won: i64,
    pub yellow: i64,
    pub red: i64,
    pub penalty_won: i64,
    pub penalty_committed: i64,
    pub penalty_scored: i64,
    pub penalty_missed: i64,
    pub penalty_saved: i64,
    pub saves: i64,
}

pub fn player_stat_line(block: &PlayerStatBlock) -> (PlayerStatLine, Vec<Anomaly>) {
    let mut anomalies = Vec::new();
    let (rating, bad_rating) = parse_rating(&block.games.rating);
    let (accuracy, bad_accuracy) = parse_accuracy(&block.passes.accuracy);
    anomalies.extend(bad_rating);
    anomalies.extend(bad_accuracy);

    let line = PlayerStatLine {
        minutes: block.games.minutes,
        position: block.games.position.clone(),
        rating,
        captain: block.games.captain,
        substitute: block.games.substitute,
        games: block.games.appearences,
        lineups: block.games.lineups,
        shots_total: block.shots.total,
        shots_on: block.shots.on,
        goals_scored: block.goals.total,
        goals_assisted: block.goals.assists,
        passes_total: block.passes.total,
        passes_key: block.passes.key,
        accuracy,
        tackles: block.tackles.total,
        block: block.tackles.blocks,
        interceptions: block.tackles.interceptions,
        duels_total: block.duels.total,
        duels_won: block.duels.won,
        dribbles_total: block.dribbles.attempts,
        dribbles_won: block.dribbles.success,
        yellow: block.cards.yellow,
        red: block.cards.red,
        penalty_won: block.penalty.won,
        penalty_committed: block.penalty.committed,
        penalty_scored: block.penalty.scored,
        penalty_missed: block.penalty.missed,
        penalty_saved: block.penalty.saved,
        saves: block.goals.saves,
    };
    (line, anomalies)
}

// ---------------------------------------------------------------------------
// Rounds
// ---------------------------------------------------------------------------

/// Concatenates every digit of a round label: `"Regular Season - 14"` is 14.
/// Labels without digits (`"Final"`) map to round 0 with an anomaly.
pub fn round_number(label: &str) -> (i64, Option<Anomaly>) {
    let digits: String = label.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return (0, Some(Anomaly::new("round", format!("no digits in {label:?}"))));
    }
    match digits.parse::<i64>() {
        Ok(v) => (v, None),
        Err(_) => (0, Some(Anomaly::new("round", format!("out of range {label:?}")))),
    }
}

/// Kick-off window of one round. Bounds only ever widen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundBounds {
    pub start: i64,
    pub end: i64,
}

impl RoundBounds {
    pub fn at(timestamp: i64) -> Self {
        Self {
            start: timestamp,
            end: timestamp,
        }
    }

    pub fn widen(self, timestamp: i64) -> Self {
        Self {
            start: self.start.min(timestamp),
            end: self.end.max(timestamp),
        }
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// Widens `stored` (if any) so that it covers `timestamp`.
pub fn widen_round(stored: Option<RoundBounds>, timestamp: i64) -> RoundBounds {
    match stored {
        Some(bounds) => bounds.widen(timestamp),
        None => RoundBounds::at(timestamp),
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    /// Stored as `modus`: 1 for the home perspective, 2 for away.
    pub fn modus(self) -> i64 {
        match self {
            Side::Home => 1,
            Side::Away => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLine {
    pub team: i64,
    pub side: Side,
    pub points: i64,
    pub goals_for: i64,
    pub goals_against: i64,
    pub elapsed: i64,
}

/// Both result lines for a started fixture; `None` while elapsed is zero.
///
/// The `winner` flags decide first. Without a flag, goals decide, and equal
/// goals are a draw.
pub fn derive_results(fixture: &Fixture) -> Option<(ResultLine, ResultLine)> {
    if !fixture.has_started() {
        return None;
    }
    let teams = &fixture.teams;
    let goals = fixture.goals;
    let (home_points, away_points) = if teams.home.winner {
        (3, 0)
    } else if teams.away.winner {
        (0, 3)
    } else if goals.home > goals.away {
        (3, 0)
    } else if goals.home < goals.away {
        (0, 3)
    } else {
        (1, 1)
    };
    let elapsed = fixture.fixture.status.elapsed;
    Some((
        ResultLine {
            team: teams.home.id,
            side: Side::Home,
            points: home_points,
            goals_for: goals.home,
            goals_against: goals.away,
            elapsed,
        },
        ResultLine {
            team: teams.away.id,
            side: Side::Away,
            points: away_points,
            goals_for: goals.away,
            goals_against: goals.home,
            elapsed,
        },
    ))
}

// ---------------------------------------------------------------------------
// Formations
// ---------------------------------------------------------------------------

pub const STARTERS: usize = 11;
pub const MIN_SUBS: usize = 3;
pub const MAX_SUBS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormationLine {
    pub team: i64,
    pub formation: String,
    pub starters: [i64; STARTERS],
    /// Between [`MIN_SUBS`] and [`MAX_SUBS`] ids.
    pub subs: Vec<i64>,
    pub coach: i64,
}

impl FormationLine {
    /// Number of stored columns: fixture, team, formation, coach, starters, subs.
    pub fn column_count(&self) -> usize {
        4 + STARTERS + self.subs.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormationColumns {
    Row(FormationLine),
    Skipped(String),
}

/// Shapes a lineup into a formation row. Substitutes beyond five are dropped;
/// fewer than three substitutes or eleven starters yields `Skipped`.
pub fn formation_columns(lineup: &Lineup) -> FormationColumns {
    if lineup.start_xi.len() < STARTERS {
        return FormationColumns::Skipped(format!(
            "{} starters listed for team {}",
            lineup.start_xi.len(),
            lineup.team.id
        ));
    }
    if lineup.substitutes.len() < MIN_SUBS {
        return FormationColumns::Skipped(format!(
            "{} substitutes listed for team {}",
            lineup.substitutes.len(),
            lineup.team.id
        ));
    }

    let mut starters = [0i64; STARTERS];
    for (slot, entry) in starters.iter_mut().zip(&lineup.start_xi) {
        *slot = entry.player.id;
    }
    let subs = lineup
        .substitutes
        .iter()
        .take(MAX_SUBS)
        .map(|s| s.player.id)
        .collect();

    FormationColumns::Row(FormationLine {
        team: lineup.team.id,
        formation: lineup.formation.clone(),
        starters,
        subs,
        coach: lineup.coach.id,
    })
}
