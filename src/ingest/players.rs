use rusqlite::Connection;
use tracing::{debug, info};

use crate::api::FootballApi;
use crate::ingest::report::{Entity, IngestReport};
use crate::model::{PlayerProfile, PlayerStatBlock};
use crate::normalize::player_stat_line;
use crate::store::players::PlayerRow;
use crate::store::{PlayerRepository, TeamRepository};

/// Season rosters: either the paginated player listing or, when the season
/// has no player coverage, the bare team squads.
pub struct PlayerService<'a, A: FootballApi> {
    api: &'a A,
    conn: &'a Connection,
}

impl<'a, A: FootballApi> PlayerService<'a, A> {
    pub fn new(api: &'a A, conn: &'a Connection) -> Self {
        Self { api, conn }
    }

    pub fn ingest_season(&self, league: i64, season: i64, has_player_coverage: bool) -> IngestReport {
        let mut report = IngestReport::new(format!("players {league}#{season}"));
        if has_player_coverage {
            self.ingest_pages(league, season, &mut report);
        } else {
            info!(league, season, "no player coverage; falling back to squads");
            self.ingest_squads(league, season, &mut report);
        }
        report
    }

    /// Walks pages `1..=paging.total`.
    fn ingest_pages(&self, league: i64, season: i64, report: &mut IngestReport) {
        let mut page = 1;
        loop {
            let listing = match self.api.players_page(league, season, page) {
                Ok(listing) => listing,
                Err(err) => {
                    report.failed(
                        Entity::Player,
                        format!("league_{league}#season_{season}#page_{page}"),
                        err,
                    );
                    return;
                }
            };
            debug!(league, season, page, total = listing.total, "player page");
            for profile in &listing.players {
                self.store_profile(profile, league, season, report);
            }
            if page >= listing.total {
                return;
            }
            page += 1;
        }
    }

    fn store_profile(&self, profile: &PlayerProfile, league: i64, season: i64, report: &mut IngestReport) {
        let repo = PlayerRepository::new(self.conn);
        let id = profile.player.id;

        // A profile lists every competition of the season; keep this league's
        // blocks unless none of them carry a league id.
        let blocks: Vec<&PlayerStatBlock> = {
            let in_league: Vec<_> = profile
                .statistics
                .iter()
                .filter(|b| b.league.id == league)
                .collect();
            if in_league.is_empty() {
                profile.statistics.iter().collect()
            } else {
                in_league
            }
        };
        if blocks.is_empty() {
            report.skipped(Entity::Player, format!("player_{id}"), "no statistics entries");
            return;
        }

        for block in blocks {
            let team = block.team.id;
            let block_season = if block.league.season != 0 {
                block.league.season
            } else {
                season
            };
            let key = format!("player_{id}#team_{team}#season_{block_season}");

            let row = PlayerRow::from_bio(&profile.player, team, block_season);
            report.record_write(Entity::Player, key.clone(), repo.insert(&row));

            let (stats, anomalies) = player_stat_line(block);
            for anomaly in anomalies {
                report.warn_anomaly(&key, anomaly);
            }
            report.record_write(
                Entity::PlayerSeasonStats,
                key,
                repo.insert_season_stats(id, block_season, team, &stats),
            );
        }
    }

    fn ingest_squads(&self, league: i64, season: i64, report: &mut IngestReport) {
        let teams = match TeamRepository::new(self.conn).for_season(league, season) {
            Ok(teams) => teams,
            Err(err) => {
                report.failed(Entity::Player, format!("league_{league}#season_{season}"), err);
                return;
            }
        };
        let repo = PlayerRepository::new(self.conn);
        for team in &teams {
            let squad = match self.api.squad(team.id) {
                Ok(Some(squad)) => squad,
                Ok(None) => {
                    report.skipped(Entity::Player, format!("squad_{}", team.id), "no squad listed");
                    continue;
                }
                Err(err) => {
                    report.failed(Entity::Player, format!("squad_{}", team.id), err);
                    continue;
                }
            };
            for player in &squad.players {
                let row = PlayerRow::from_squad(player, team.id, season);
                report.record_write(
                    Entity::Player,
                    format!("player_{}#team_{}#season_{season}", player.id, team.id),
                    repo.insert(&row),
                );
            }
        }
    }
}
