//! Ingestion passes. Each pass borrows the API seam and the connection and
//! returns an [`IngestReport`]; nothing short of a missing input aborts a run.

use std::collections::HashSet;

use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::api::FootballApi;
use crate::store::TeamRepository;

pub mod coaches;
pub mod fixtures;
pub mod leagues;
pub mod players;
pub mod report;
pub mod teams;

pub use coaches::CoachService;
pub use fixtures::FixtureService;
pub use leagues::LeagueService;
pub use players::PlayerService;
pub use report::{Entity, IngestReport, ItemReport, Outcome, ReportCounts};
pub use teams::TeamService;

#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub league_ids: Vec<i64>,
    pub totals: ReportCounts,
    pub reports: Vec<IngestReport>,
}

impl IngestSummary {
    pub fn failed_keys(&self) -> Vec<String> {
        self.reports
            .iter()
            .flat_map(|r| {
                r.failed_keys()
                    .into_iter()
                    .map(|k| format!("{}: {k}", r.scope))
            })
            .collect()
    }
}

/// Full ingest for each league: league and seasons, then per season the
/// teams, players and fixtures, then coaches for every team seen.
///
/// `seasons` narrows the seasons walked; `None` walks every listed season.
pub fn ingest_leagues<A: FootballApi>(
    api: &A,
    conn: &Connection,
    league_ids: &[i64],
    seasons: Option<&[i64]>,
) -> Result<IngestSummary> {
    let mut unique = HashSet::new();
    let leagues: Vec<i64> = league_ids
        .iter()
        .copied()
        .filter(|id| *id != 0 && unique.insert(*id))
        .collect();
    if leagues.is_empty() {
        return Err(anyhow!("no valid league ids passed to ingest"));
    }

    let mut reports = Vec::new();
    for &league in &leagues {
        let mut league_report = IngestReport::new(format!("league {league}"));
        let entry = LeagueService::new(api, conn).ingest(league, &mut league_report);
        let Some(entry) = entry else {
            reports.push(league_report);
            continue;
        };

        let mut season_reports = Vec::new();
        let mut teams_seen = HashSet::new();
        for season in &entry.seasons {
            let year = season.year;
            if let Some(filter) = seasons
                && !filter.contains(&year)
            {
                continue;
            }
            info!(league, season = year, "ingesting season");

            season_reports.push(TeamService::new(api, conn).ingest_season(league, year));
            season_reports.push(PlayerService::new(api, conn).ingest_season(
                league,
                year,
                season.coverage.players,
            ));
            season_reports.push(FixtureService::new(api, conn).ingest_season(league, year));

            match TeamRepository::new(conn).for_season(league, year) {
                Ok(teams) => teams_seen.extend(teams.into_iter().map(|t| t.id)),
                Err(err) => league_report.failed(
                    Entity::Team,
                    format!("league_{league}#season_{year}"),
                    err,
                ),
            }
        }

        let mut coach_report = IngestReport::new(format!("coaches {league}"));
        let mut team_ids: Vec<i64> = teams_seen.into_iter().collect();
        team_ids.sort_unstable();
        let coaches = CoachService::new(api, conn);
        for team in team_ids {
            coaches.ingest_team(team, &mut coach_report);
        }
        reports.push(league_report);
        reports.extend(season_reports);
        reports.push(coach_report);
    }

    let mut totals = ReportCounts::default();
    for report in &reports {
        let c = report.counts();
        totals.stored += c.stored;
        totals.skipped += c.skipped;
        totals.failed += c.failed;
    }
    info!(
        leagues = leagues.len(),
        stored = totals.stored,
        skipped = totals.skipped,
        failed = totals.failed,
        "ingest finished"
    );

    Ok(IngestSummary {
        league_ids: leagues,
        totals,
        reports,
    })
}
