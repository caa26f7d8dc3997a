use std::fmt;

use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    League,
    Season,
    Team,
    Venue,
    Membership,
    Player,
    PlayerSeasonStats,
    Coach,
    CoachCareer,
    Fixture,
    Round,
    Result,
    TeamStatistics,
    Formation,
    PlayerMatchStats,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::League => "league",
            Entity::Season => "season",
            Entity::Team => "team",
            Entity::Venue => "venue",
            Entity::Membership => "membership",
            Entity::Player => "player",
            Entity::PlayerSeasonStats => "player_season_stats",
            Entity::Coach => "coach",
            Entity::CoachCareer => "coach_career",
            Entity::Fixture => "fixture",
            Entity::Round => "round",
            Entity::Result => "result",
            Entity::TeamStatistics => "team_statistics",
            Entity::Formation => "formation",
            Entity::PlayerMatchStats => "player_match_stats",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum Outcome {
    Stored,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemReport {
    pub entity: Entity,
    /// Identifying key such as `fixture_1035#team_33`.
    pub key: String,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub stored: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Per-item outcomes of one ingestion run. Nothing aborts a batch; every
/// step lands here instead.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub scope: String,
    pub items: Vec<ItemReport>,
}

impl IngestReport {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            items: Vec::new(),
        }
    }

    pub fn record(&mut self, entity: Entity, key: impl Into<String>, outcome: Outcome) {
        let key = key.into();
        match &outcome {
            Outcome::Stored => debug!(scope = %self.scope, %entity, key = %key, "stored"),
            Outcome::Skipped(reason) => {
                debug!(scope = %self.scope, %entity, key = %key, reason = %reason, "skipped")
            }
            Outcome::Failed(err) => {
                error!(scope = %self.scope, %entity, key = %key, error = %err, "failed")
            }
        }
        self.items.push(ItemReport {
            entity,
            key,
            outcome,
        });
    }

    pub fn stored(&mut self, entity: Entity, key: impl Into<String>) {
        self.record(entity, key, Outcome::Stored);
    }

    pub fn skipped(&mut self, entity: Entity, key: impl Into<String>, reason: impl Into<String>) {
        self.record(entity, key, Outcome::Skipped(reason.into()));
    }

    pub fn failed(&mut self, entity: Entity, key: impl Into<String>, err: impl fmt::Display) {
        self.record(entity, key, Outcome::Failed(err.to_string()));
    }

    /// Duplicate keys are an idempotent re-run, not a failure.
    pub fn record_write(
        &mut self,
        entity: Entity,
        key: impl Into<String>,
        result: Result<(), StoreError>,
    ) -> bool {
        match result {
            Ok(()) => {
                self.stored(entity, key);
                true
            }
            Err(StoreError::Duplicate(detail)) => {
                self.skipped(entity, key, format!("already stored ({detail})"));
                false
            }
            Err(err) => {
                self.failed(entity, key, err);
                false
            }
        }
    }

    pub fn warn_anomaly(&self, key: &str, anomaly: impl fmt::Display) {
        warn!(scope = %self.scope, key = %key, anomaly = %anomaly, "data anomaly defaulted");
    }

    pub fn counts(&self) -> ReportCounts {
        let mut counts = ReportCounts::default();
        for item in &self.items {
            match item.outcome {
                Outcome::Stored => counts.stored += 1,
                Outcome::Skipped(_) => counts.skipped += 1,
                Outcome::Failed(_) => counts.failed += 1,
            }
        }
        counts
    }

    pub fn count(&self, entity: Entity, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.items
            .iter()
            .filter(|i| i.entity == entity && pred(&i.outcome))
            .count()
    }

    pub fn failed_keys(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, Outcome::Failed(_)))
            .map(|i| i.key.as_str())
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.items
            .iter()
            .any(|i| matches!(i.outcome, Outcome::Failed(_)))
    }
}

pub fn is_stored(o: &Outcome) -> bool {
    matches!(o, Outcome::Stored)
}

pub fn is_skipped(o: &Outcome) -> bool {
    matches!(o, Outcome::Skipped(_))
}

pub fn is_failed(o: &Outcome) -> bool {
    matches!(o, Outcome::Failed(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_writes_are_skipped_not_failed() {
        let mut report = IngestReport::new("39#2023");
        assert!(report.record_write(Entity::Team, "team_33", Ok(())));
        assert!(!report.record_write(
            Entity::Team,
            "team_33",
            Err(StoreError::Duplicate("UNIQUE constraint failed: teams.id".into()))
        ));
        assert!(!report.record_write(
            Entity::PlayerMatchStats,
            "player_7#fixture_1",
            Err(StoreError::ForeignKey("FOREIGN KEY constraint failed".into()))
        ));

        assert_eq!(
            report.counts(),
            ReportCounts {
                stored: 1,
                skipped: 1,
                failed: 1
            }
        );
        assert_eq!(report.failed_keys(), vec!["player_7#fixture_1"]);
        assert_eq!(report.count(Entity::Team, is_skipped), 1);
        assert!(report.has_failures());
    }

    #[test]
    fn items_keep_order() {
        let mut a = IngestReport::new("a");
        a.stored(Entity::League, "league_39");
        a.skipped(Entity::Formation, "fixture_1#team_33", "2 substitutes");
        let keys: Vec<_> = a.items.iter().map(|i| i.key.as_str()).collect();
        assert_eq!(keys, vec!["league_39", "fixture_1#team_33"]);
        assert_eq!(a.count(Entity::League, is_stored), 1);
        assert_eq!(a.count(Entity::Formation, is_failed), 0);
    }
}
