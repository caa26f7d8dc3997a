use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::api::FootballApi;
use crate::error::{ApiError, StoreError};
use crate::ingest::report::{Entity, IngestReport};
use crate::model::{Fixture, PlayerStatBlock};
use crate::normalize::{
    FormationColumns, derive_results, formation_columns, normalize_team_statistics,
    player_stat_line, round_number, widen_round,
};
use crate::store::fixtures::FixtureRow;
use crate::store::players::{MatchStatKey, PlayerRow};
use crate::store::{FixtureRepository, PlayerRepository, ResultRepository, RoundRepository};

/// Fixture ingestion for one (league, season): fixture rows, rounds, results,
/// team statistics, formations and player match lines.
pub struct FixtureService<'a, A: FootballApi> {
    api: &'a A,
    conn: &'a Connection,
}

impl<'a, A: FootballApi> FixtureService<'a, A> {
    pub fn new(api: &'a A, conn: &'a Connection) -> Self {
        Self { api, conn }
    }

    /// Fetches every fixture of the season and stores each one with its detail.
    pub fn ingest_season(&self, league: i64, season: i64) -> IngestReport {
        let mut report = IngestReport::new(format!("fixtures {league}#{season}"));
        let fixtures = match self.api.fixtures(league, season) {
            Ok(fixtures) => fixtures,
            Err(err) => {
                report.failed(Entity::Fixture, format!("league_{league}#season_{season}"), err);
                return report;
            }
        };
        info!(league, season, count = fixtures.len(), "ingesting fixtures");

        for listed in &fixtures {
            let id = listed.id();
            let Some(detail) = self.fetch_detail(id, &mut report) else {
                continue;
            };
            let label = if detail.league.round.is_empty() {
                &listed.league.round
            } else {
                &detail.league.round
            };
            let (round, anomaly) = round_number(label);
            if let Some(anomaly) = anomaly {
                report.warn_anomaly(&fixture_key(id), anomaly);
            }
            self.store_fixture(&detail, league, season, round, &mut report);
        }
        report
    }

    /// Re-ingests the most recently finished round: each stored fixture is
    /// fetched again, deleted with its dependent rows and written afresh under
    /// its stored round number.
    pub fn update_latest_round(&self, league: i64, season: i64, now: i64) -> Result<IngestReport> {
        let mut report = IngestReport::new(format!("update {league}#{season}"));
        let rounds = RoundRepository::new(self.conn);
        let fixtures = FixtureRepository::new(self.conn);

        let Some(latest) = rounds
            .latest_finished(league, season, now)
            .context("select latest finished round")?
        else {
            report.skipped(
                Entity::Round,
                format!("league_{league}#season_{season}"),
                format!("no round finished before {now}"),
            );
            return Ok(report);
        };
        let stored = fixtures
            .by_round(league, season, latest.round)
            .with_context(|| format!("select fixtures of round {}", latest.round))?;
        info!(league, season, round = latest.round, count = stored.len(), "updating round");

        for row in &stored {
            let Some(detail) = self.fetch_detail(row.id, &mut report) else {
                continue;
            };
            if let Err(err) = fixtures.delete(row.id) {
                report.failed(Entity::Fixture, fixture_key(row.id), err);
                continue;
            }
            debug!(fixture = row.id, "deleted stale fixture");
            self.store_fixture(&detail, league, season, row.round, &mut report);
        }
        Ok(report)
    }

    fn fetch_detail(&self, id: i64, report: &mut IngestReport) -> Option<Fixture> {
        match self.api.fixture_detail(id) {
            Ok(Some(detail)) => Some(detail),
            Ok(None) => {
                report.failed(
                    Entity::Fixture,
                    fixture_key(id),
                    ApiError::NotFound(format!("fixture {id}")),
                );
                None
            }
            Err(err) => {
                report.failed(Entity::Fixture, fixture_key(id), err);
                None
            }
        }
    }

    /// Writes one fixture and everything hanging off it. Each write stands on
    /// its own; a failure is recorded and the next write still runs.
    pub fn store_fixture(
        &self,
        fd: &Fixture,
        league: i64,
        season: i64,
        round: i64,
        report: &mut IngestReport,
    ) {
        let id = fd.id();
        self.widen_round(league, season, round, fd.fixture.timestamp, report);

        let fixtures = FixtureRepository::new(self.conn);
        let row = FixtureRow {
            id,
            league,
            round,
            referee: fd.fixture.referee.clone(),
            timezone: fd.fixture.timezone.clone(),
            timestamp: fd.fixture.timestamp,
            venue: fd.fixture.venue.id,
            season,
            home_team: fd.teams.home.id,
            away_team: fd.teams.away.id,
            home_goals: fd.goals.home,
            away_goals: fd.goals.away,
            home_goals_half: fd.score.halftime.home,
            away_goals_half: fd.score.halftime.away,
        };
        report.record_write(Entity::Fixture, fixture_key(id), fixtures.insert(&row));

        let Some((home, away)) = derive_results(fd) else {
            debug!(fixture = id, "not started; no results or match statistics");
            return;
        };
        let results = ResultRepository::new(self.conn);
        for line in [&home, &away] {
            report.record_write(
                Entity::Result,
                format!("fixture_{id}#team_{}", line.team),
                results.upsert(league, season, round, line),
            );
        }

        for (index, lineup) in fd.lineups.iter().enumerate() {
            let team = lineup.team.id;
            let key = format!("fixture_{id}#team_{team}");

            let entries = fd
                .statistics_for(team, index)
                .map(|block| block.statistics.as_slice())
                .unwrap_or_default();
            let normalized = normalize_team_statistics(entries);
            for anomaly in &normalized.anomalies {
                report.warn_anomaly(&key, anomaly);
            }
            if !normalized.ignored.is_empty() {
                debug!(key = %key, ignored = ?normalized.ignored, "unknown statistic labels");
            }
            report.record_write(
                Entity::TeamStatistics,
                key.clone(),
                fixtures.insert_team_stats(team, id, &normalized.stats),
            );

            match formation_columns(lineup) {
                FormationColumns::Row(line) => {
                    report.record_write(
                        Entity::Formation,
                        key.clone(),
                        fixtures.insert_formation(id, &line),
                    );
                }
                FormationColumns::Skipped(reason) => report.skipped(Entity::Formation, key, reason),
            }
        }

        self.store_player_lines(fd, league, season, report);
    }

    fn widen_round(&self, league: i64, season: i64, round: i64, timestamp: i64, report: &mut IngestReport) {
        let rounds = RoundRepository::new(self.conn);
        let key = format!("league_{league}#season_{season}#round_{round}");
        match rounds.bounds(league, season, round) {
            Ok(stored) => {
                let bounds = widen_round(stored, timestamp);
                if stored == Some(bounds) {
                    return;
                }
                report.record_write(
                    Entity::Round,
                    key,
                    rounds.upsert(league, season, round, bounds),
                );
            }
            Err(err) => report.failed(Entity::Round, key, err),
        }
    }

    fn store_player_lines(&self, fd: &Fixture, league: i64, season: i64, report: &mut IngestReport) {
        let players = PlayerRepository::new(self.conn);
        let fixture = fd.id();

        for team_players in &fd.players {
            let team = team_players.team.id;
            for line in &team_players.players {
                let player = line.player.id;
                let key = format!("player_{player}#fixture_{fixture}");
                let Some(block) = line.statistics.first() else {
                    report.skipped(Entity::PlayerMatchStats, key, "no statistics block");
                    continue;
                };
                let (stats, anomalies) = player_stat_line(block);
                for anomaly in anomalies {
                    report.warn_anomaly(&key, anomaly);
                }

                let stat_key = MatchStatKey {
                    player,
                    fixture,
                    team,
                    league,
                    season,
                };
                match players.insert_match_stats(stat_key, &stats) {
                    Err(StoreError::ForeignKey(_)) => {
                        info!(player, fixture, "player not registered; fetching profile");
                        match self.repair_player(player, team, season, report) {
                            Ok(()) => report.skipped(
                                Entity::PlayerMatchStats,
                                key,
                                "player was missing; registered from profile",
                            ),
                            Err(err) => report.failed(Entity::PlayerMatchStats, key, format!("{err:#}")),
                        }
                    }
                    other => {
                        report.record_write(Entity::PlayerMatchStats, key, other);
                    }
                }
            }
        }
    }

    /// Registers a player that appeared in a fixture but was never ingested:
    /// one `players` row for (id, team, season) and its season aggregate.
    /// The match line that triggered this is not retried.
    fn repair_player(&self, id: i64, team: i64, season: i64, report: &mut IngestReport) -> Result<()> {
        let profile = self
            .api
            .player(id, season)
            .with_context(|| format!("fetch player {id} season {season}"))?
            .ok_or_else(|| ApiError::NotFound(format!("player {id} season {season}")))?;

        let players = PlayerRepository::new(self.conn);
        let key = format!("player_{id}#team_{team}#season_{season}");
        let row = PlayerRow::from_bio(&profile.player, team, season);
        match players.insert(&row) {
            Err(err) if !err.is_duplicate() => {
                let message = err.to_string();
                report.failed(Entity::Player, key, &message);
                anyhow::bail!("register player {id}: {message}");
            }
            result => {
                report.record_write(Entity::Player, key.clone(), result);
            }
        }

        let fallback = PlayerStatBlock::default();
        let block = profile.statistics_for_team(team).unwrap_or_else(|| {
            warn!(player = id, team, "profile has no statistics; storing zeros");
            &fallback
        });
        let (stats, anomalies) = player_stat_line(block);
        for anomaly in anomalies {
            report.warn_anomaly(&key, anomaly);
        }
        report.record_write(
            Entity::PlayerSeasonStats,
            key,
            players.insert_season_stats(id, season, team, &stats),
        );
        Ok(())
    }
}

fn fixture_key(id: i64) -> String {
    format!("fixture_{id}")
}
