use rusqlite::Connection;
use tracing::info;

use crate::api::FootballApi;
use crate::error::ApiError;
use crate::ingest::report::{Entity, IngestReport};
use crate::model::LeagueEntry;
use crate::store::LeagueRepository;
use crate::store::leagues::SeasonRow;

pub struct LeagueService<'a, A: FootballApi> {
    api: &'a A,
    conn: &'a Connection,
}

impl<'a, A: FootballApi> LeagueService<'a, A> {
    pub fn new(api: &'a A, conn: &'a Connection) -> Self {
        Self { api, conn }
    }

    /// Upserts the league and every season it lists. Returns the fetched entry
    /// so callers can walk its seasons.
    pub fn ingest(&self, league: i64, report: &mut IngestReport) -> Option<LeagueEntry> {
        let key = format!("league_{league}");
        let entry = match self.api.league(league) {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                report.failed(Entity::League, key, ApiError::NotFound(format!("league {league}")));
                return None;
            }
            Err(err) => {
                report.failed(Entity::League, key, err);
                return None;
            }
        };
        info!(league, name = %entry.league.name, seasons = entry.seasons.len(), "ingesting league");

        let repo = LeagueRepository::new(self.conn);
        report.record_write(Entity::League, key, repo.upsert(&entry));
        for season in &entry.seasons {
            report.record_write(
                Entity::Season,
                format!("league_{league}#season_{}", season.year),
                repo.upsert_season(&SeasonRow::from_info(league, season)),
            );
        }
        Some(entry)
    }
}
