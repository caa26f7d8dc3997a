//! Read side: the lookups the front end needs, shaped for JSON output.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

use crate::error::StoreError;
use crate::store::fixtures::FixtureRow;
use crate::store::leagues::{LeagueRow, SeasonRow};
use crate::store::players::{KeyPlayerStats, PlayerRow, PlayerSeasonStats};
use crate::store::results::{ResultRow, StandingRow};
use crate::store::rounds::RoundRow;
use crate::store::teams::{TeamRow, VenueRow};
use crate::store::{
    FixtureRepository, LeagueRepository, PlayerRepository, ResultRepository, RoundRepository,
    TeamRepository,
};

/// Rounds considered for key-player form.
pub const KEY_PLAYER_ROUNDS: i64 = 7;

#[derive(Debug, Clone, Serialize)]
pub struct LeagueWithSeasons {
    pub league: LeagueRow,
    pub seasons: Vec<SeasonRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixtureWithTeams {
    pub fixture: FixtureRow,
    pub home: Option<TeamRow>,
    pub away: Option<TeamRow>,
    pub venue: Option<VenueRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Matchups {
    pub fixtures: Vec<FixtureRow>,
    pub teams: BTreeMap<i64, Option<TeamRow>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FixtureWithResult {
    pub fixture: FixtureRow,
    pub result: ResultRow,
}

pub struct QueryService<'a> {
    conn: &'a Connection,
}

impl<'a> QueryService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// The league with its seasons and coverage flags, or just `season` when given.
    pub fn league(&self, id: i64, season: Option<i64>) -> Result<Option<LeagueWithSeasons>, StoreError> {
        let leagues = LeagueRepository::new(self.conn);
        let Some(league) = leagues.get(id)? else {
            return Ok(None);
        };
        let seasons = match season {
            Some(year) => leagues.season(id, year)?.into_iter().collect(),
            None => leagues.seasons(id)?,
        };
        Ok(Some(LeagueWithSeasons { league, seasons }))
    }

    pub fn next_round(&self, league: i64, season: i64, timestamp: i64) -> Result<Option<RoundRow>, StoreError> {
        RoundRepository::new(self.conn).next_after(league, season, timestamp)
    }

    pub fn players_by_team(&self, team: i64, season: Option<i64>) -> Result<Vec<PlayerRow>, StoreError> {
        PlayerRepository::new(self.conn).by_team(team, season)
    }

    pub fn player_statistics(&self, team: i64, season: Option<i64>) -> Result<Vec<PlayerSeasonStats>, StoreError> {
        PlayerRepository::new(self.conn).season_statistics_by_team(team, season)
    }

    pub fn standings(&self, league: i64, season: i64) -> Result<Vec<StandingRow>, StoreError> {
        ResultRepository::new(self.conn).standings(league, season)
    }

    pub fn fixtures(&self, league: i64, season: i64, round: i64) -> Result<Vec<FixtureWithTeams>, StoreError> {
        let teams = TeamRepository::new(self.conn);
        let rows = FixtureRepository::new(self.conn).by_round(league, season, round)?;
        let mut out = Vec::with_capacity(rows.len());
        for fixture in rows {
            let home = teams.get(fixture.home_team)?;
            let away = teams.get(fixture.away_team)?;
            let venue = teams.venue(fixture.venue)?;
            out.push(FixtureWithTeams {
                fixture,
                home,
                away,
                venue,
            });
        }
        Ok(out)
    }

    /// Form of both squads over rounds `round - 7 ..= round`.
    pub fn key_players(
        &self,
        league: i64,
        season: i64,
        home_team: i64,
        away_team: i64,
        round: i64,
    ) -> Result<Vec<KeyPlayerStats>, StoreError> {
        let fixtures = FixtureRepository::new(self.conn).ids_for_last_rounds(
            league,
            season,
            round,
            KEY_PLAYER_ROUNDS,
        )?;
        debug!(league, season, round, fixtures = fixtures.len(), "key player window");
        PlayerRepository::new(self.conn).key_player_stats(season, &[home_team, away_team], &fixtures)
    }

    pub fn last_matchups(&self, team1: i64, team2: i64, n: i64) -> Result<Matchups, StoreError> {
        let teams = TeamRepository::new(self.conn);
        let fixtures = FixtureRepository::new(self.conn).last_matchups(team1, team2, n)?;
        let mut by_id = BTreeMap::new();
        by_id.insert(team1, teams.get(team1)?);
        by_id.insert(team2, teams.get(team2)?);
        Ok(Matchups {
            fixtures,
            teams: by_id,
        })
    }

    /// Last `n` fixtures of `team` before `now`, each with that team's result.
    /// Fixtures without a stored result are left out.
    pub fn last_fixtures(&self, team: i64, n: i64, now: i64) -> Result<Vec<FixtureWithResult>, StoreError> {
        let results = ResultRepository::new(self.conn);
        let rows = FixtureRepository::new(self.conn).last_for_team(team, now, n)?;
        let mut out = Vec::with_capacity(rows.len());
        for fixture in rows {
            let Some(result) =
                results.for_team_round(team, fixture.league, fixture.season, fixture.round)?
            else {
                debug!(fixture = fixture.id, team, "no result stored");
                continue;
            };
            out.push(FixtureWithResult { fixture, result });
        }
        Ok(out)
    }
}
