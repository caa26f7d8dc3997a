use rusqlite::Connection;
use tracing::info;

use crate::api::FootballApi;
use crate::ingest::report::{Entity, IngestReport};
use crate::store::TeamRepository;

/// Teams, their venues and roster membership for one (league, season).
pub struct TeamService<'a, A: FootballApi> {
    api: &'a A,
    conn: &'a Connection,
}

impl<'a, A: FootballApi> TeamService<'a, A> {
    pub fn new(api: &'a A, conn: &'a Connection) -> Self {
        Self { api, conn }
    }

    pub fn ingest_season(&self, league: i64, season: i64) -> IngestReport {
        let mut report = IngestReport::new(format!("teams {league}#{season}"));
        let teams = match self.api.teams(league, season) {
            Ok(teams) => teams,
            Err(err) => {
                report.failed(Entity::Team, format!("league_{league}#season_{season}"), err);
                return report;
            }
        };
        info!(league, season, count = teams.len(), "ingesting teams");

        let repo = TeamRepository::new(self.conn);
        for entry in &teams {
            let team = &entry.team;
            report.record_write(Entity::Team, format!("team_{}", team.id), repo.insert(team));

            let venue = &entry.venue;
            if venue.id == 0 {
                report.skipped(Entity::Venue, format!("team_{}", team.id), "no venue listed");
            } else {
                report.record_write(
                    Entity::Venue,
                    format!("venue_{}", venue.id),
                    repo.insert_venue(venue),
                );
            }

            report.record_write(
                Entity::Membership,
                format!("league_{league}#season_{season}#team_{}", team.id),
                repo.insert_membership(league, season, team.id),
            );
        }
        report
    }
}
