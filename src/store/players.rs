use rusqlite::{Connection, params, params_from_iter};
use serde::Serialize;

use crate::error::StoreError;
use crate::model::{PlayerBio, SquadPlayer};
use crate::normalize::PlayerStatLine;
use crate::store::bool_to_i64;

/// A player as registered for one team in one season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerRow {
    pub id: i64,
    pub team: i64,
    pub season: i64,
    pub firstname: String,
    pub lastname: String,
    pub birthplace: String,
    pub birthcountry: String,
    pub birthdate: String,
}

impl PlayerRow {
    pub fn from_bio(bio: &PlayerBio, team: i64, season: i64) -> Self {
        Self {
            id: bio.id,
            team,
            season,
            firstname: bio.firstname.clone(),
            lastname: bio.lastname.clone(),
            birthplace: bio.birth.place.clone(),
            birthcountry: bio.birth.country.clone(),
            birthdate: bio.birth.date.clone(),
        }
    }

    /// Squad listings carry only a display name; it goes into `lastname`.
    pub fn from_squad(player: &SquadPlayer, team: i64, season: i64) -> Self {
        Self {
            id: player.id,
            team,
            season,
            firstname: String::new(),
            lastname: player.name.clone(),
            birthplace: String::new(),
            birthcountry: String::new(),
            birthdate: String::new(),
        }
    }
}

/// Identifies one player's line in one fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchStatKey {
    pub player: i64,
    pub fixture: i64,
    pub team: i64,
    pub league: i64,
    pub season: i64,
}

/// Goals and averages over a window of fixtures, per player and team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyPlayerStats {
    pub player_id: i64,
    pub firstname: String,
    pub lastname: String,
    pub team: i64,
    pub total_goals_scored: i64,
    pub total_goals_assisted: i64,
    pub avg_duels_total: f64,
    pub avg_duels_won: f64,
    pub avg_key_passes: f64,
    pub avg_rating: f64,
}

/// A registered player with the season aggregate for that team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSeasonStats {
    #[serde(flatten)]
    pub player: PlayerRow,
    pub minutes: i64,
    pub position: String,
    pub rating: f64,
    pub captain: bool,
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

pub struct PlayerRepository<'a> {
    conn: &'a Connection,
}

impl<'a> PlayerRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, p: &PlayerRow) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO players (id, team, season, firstname, lastname, birthplace, birthcountry, birthdate)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                p.id,
                p.team,
                p.season,
                p.firstname,
                p.lastname,
                p.birthplace,
                p.birthcountry,
                p.birthdate
            ],
        )?;
        Ok(())
    }

    pub fn insert_season_stats(
        &self,
        player: i64,
        season: i64,
        team: i64,
        s: &PlayerStatLine,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO player_statistics_season (
                player, season, team, minutes, position, rating, captain, games, lineups,
                shots_total, shots_on, goals_scored, goals_assisted, passes_total, passes_key,
                accuracy, tackles, block, interceptions, duels_total, duels_won,
                dribbles_total, dribbles_won, yellow, red, penalty_won, penalty_committed,
                penalty_scored, penalty_missed, penalty_saved, saves
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?14, ?15,
                ?16, ?17, ?18, ?19, ?20, ?21,
                ?22, ?23, ?24, ?25, ?26, ?27,
                ?28, ?29, ?30, ?31
            )
            "#,
            params![
                player,
                season,
                team,
                s.minutes,
                s.position,
                s.rating,
                bool_to_i64(s.captain),
                s.games,
                s.lineups,
                s.shots_total,
                s.shots_on,
                s.goals_scored,
                s.goals_assisted,
                s.passes_total,
                s.passes_key,
                s.accuracy,
                s.tackles,
                s.block,
                s.interceptions,
                s.duels_total,
                s.duels_won,
                s.dribbles_total,
                s.dribbles_won,
                s.yellow,
                s.red,
                s.penalty_won,
                s.penalty_committed,
                s.penalty_scored,
                s.penalty_missed,
                s.penalty_saved,
                s.saves,
            ],
        )?;
        Ok(())
    }

    /// Fails with [`StoreError::ForeignKey`] when (player, team, season) has no
    /// `players` row yet.
    pub fn insert_match_stats(&self, key: MatchStatKey, s: &PlayerStatLine) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO player_statistics (
                player, fixture, team, league, season, minutes, position, rating, captain,
                substitute, shots_total, shots_on, goals_scored, goals_assisted, passes_total,
                passes_key, accuracy, tackles, block, interceptions, duels_total, duels_won,
                dribbles_total, dribbles_won, yellow, red, penalty_won, penalty_committed,
                penalty_scored, penalty_missed, penalty_saved, saves
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?14, ?15,
                ?16, ?17, ?18, ?19, ?20, ?21, ?22,
                ?23, ?24, ?25, ?26, ?27, ?28,
                ?29, ?30, ?31, ?32
            )
            "#,
            params![
                key.player,
                key.fixture,
                key.team,
                key.league,
                key.season,
                s.minutes,
                s.position,
                s.rating,
                bool_to_i64(s.captain),
                bool_to_i64(s.substitute),
                s.shots_total,
                s.shots_on,
                s.goals_scored,
                s.goals_assisted,
                s.passes_total,
                s.passes_key,
                s.accuracy,
                s.tackles,
                s.block,
                s.interceptions,
                s.duels_total,
                s.duels_won,
                s.dribbles_total,
                s.dribbles_won,
                s.yellow,
                s.red,
                s.penalty_won,
                s.penalty_committed,
                s.penalty_scored,
                s.penalty_missed,
                s.penalty_saved,
                s.saves,
            ],
        )?;
        Ok(())
    }

    /// Players registered for `team`, optionally narrowed to one season.
    pub fn by_team(&self, team: i64, season: Option<i64>) -> Result<Vec<PlayerRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, team, season, firstname, lastname, birthplace, birthcountry, birthdate
            FROM players
            WHERE team = ?1 AND (?2 IS NULL OR season = ?2)
            ORDER BY season DESC, id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![team, season], |row| {
            Ok(PlayerRow {
                id: row.get(0)?,
                team: row.get(1)?,
                season: row.get(2)?,
                firstname: row.get(3)?,
                lastname: row.get(4)?,
                birthplace: row.get(5)?,
                birthcountry: row.get(6)?,
                birthdate: row.get(7)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Players of `team` joined with their season aggregate for that same
    /// team and season. Registrations without an aggregate are left out.
    pub fn season_statistics_by_team(
        &self,
        team: i64,
        season: Option<i64>,
    ) -> Result<Vec<PlayerSeasonStats>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT p.id, p.team, p.season, p.firstname, p.lastname,
                   p.birthplace, p.birthcountry, p.birthdate,
                   s.minutes, s.position, s.rating, s.captain, s.games, s.lineups,
                   s.shots_total, s.shots_on, s.goals_scored, s.goals_assisted,
                   s.passes_total, s.passes_key, s.accuracy, s.tackles, s.block,
                   s.interceptions, s.duels_total, s.duels_won, s.dribbles_total,
                   s.dribbles_won, s.yellow, s.red, s.penalty_won, s.penalty_committed,
                   s.penalty_scored, s.penalty_missed, s.penalty_saved, s.saves
            FROM players p
            JOIN player_statistics_season s
              ON s.player = p.id AND s.team = p.team AND s.season = p.season
            WHERE p.team = ?1 AND (?2 IS NULL OR p.season = ?2)
            ORDER BY p.season DESC, p.id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![team, season], |row| {
            Ok(PlayerSeasonStats {
                player: PlayerRow {
                    id: row.get(0)?,
                    team: row.get(1)?,
                    season: row.get(2)?,
                    firstname: row.get(3)?,
                    lastname: row.get(4)?,
                    birthplace: row.get(5)?,
                    birthcountry: row.get(6)?,
                    birthdate: row.get(7)?,
                },
                minutes: row.get(8)?,
                position: row.get(9)?,
                rating: row.get(10)?,
                captain: row.get::<_, i64>(11)? != 0,
                games: row.get(12)?,
                lineups: row.get(13)?,
                shots_total: row.get(14)?,
                shots_on: row.get(15)?,
                goals_scored: row.get(16)?,
                goals_assisted: row.get(17)?,
                passes_total: row.get(18)?,
                passes_key: row.get(19)?,
                accuracy: row.get(20)?,
                tackles: row.get(21)?,
                block: row.get(22)?,
                interceptions: row.get(23)?,
                duels_total: row.get(24)?,
                duels_won: row.get(25)?,
                dribbles_total: row.get(26)?,
                dribbles_won: row.get(27)?,
                yellow: row.get(28)?,
                red: row.get(29)?,
                penalty_won: row.get(30)?,
                penalty_committed: row.get(31)?,
                penalty_scored: row.get(32)?,
                penalty_missed: row.get(33)?,
                penalty_saved: row.get(34)?,
                saves: row.get(35)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Aggregates the match lines of every player registered for one of `teams`
    /// in `season`, restricted to `fixtures`.
    pub fn key_player_stats(
        &self,
        season: i64,
        teams: &[i64],
        fixtures: &[i64],
    ) -> Result<Vec<KeyPlayerStats>, StoreError> {
        if teams.is_empty() || fixtures.is_empty() {
            return Ok(Vec::new());
        }
        let team_slots = placeholders(2, teams.len());
        let fixture_slots = placeholders(2 + teams.len(), fixtures.len());
        let sql = format!(
            r#"
            SELECT p.id, p.firstname, p.lastname, ps.team,
                   SUM(ps.goals_scored), SUM(ps.goals_assisted),
                   AVG(ps.duels_total), AVG(ps.duels_won), AVG(ps.passes_key), AVG(ps.rating)
            FROM players p
            JOIN player_statistics ps
              ON ps.player = p.id AND ps.team = p.team AND ps.season = p.season
            WHERE p.season = ?1 AND p.team IN ({team_slots}) AND ps.fixture IN ({fixture_slots})
            GROUP BY ps.team, p.id, p.firstname, p.lastname
            ORDER BY ps.team ASC, SUM(ps.goals_scored) DESC, p.id ASC
            "#
        );
        let values: Vec<i64> = std::iter::once(season)
            .chain(teams.iter().copied())
            .chain(fixtures.iter().copied())
            .collect();
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok(KeyPlayerStats {
                player_id: row.get(0)?,
                firstname: row.get(1)?,
                lastname: row.get(2)?,
                team: row.get(3)?,
                total_goals_scored: row.get(4)?,
                total_goals_assisted: row.get(5)?,
                avg_duels_total: row.get(6)?,
                avg_duels_won: row.get(7)?,
                avg_key_passes: row.get(8)?,
                avg_rating: row.get(9)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

/// `?first, ?first+1, ...` for an `IN (...)` list of `count` values.
fn placeholders(first: usize, count: usize) -> String {
    (first..first + count)
        .map(|n| format!("?{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;

    use super::*;
    use crate::store::open_in_memory;

    fn player(id: i64, team: i64, season: i64) -> PlayerRow {
        PlayerRow {
            id,
            team,
            season,
            firstname: format!("First{id}"),
            lastname: format!("Last{id}"),
            birthplace: String::new(),
            birthcountry: String::new(),
            birthdate: "1999-01-01".to_string(),
        }
    }

    fn line(goals: i64, rating: f64) -> PlayerStatLine {
        PlayerStatLine {
            minutes: 90,
            goals_scored: goals,
            rating,
            duels_total: 10,
            duels_won: 4,
            passes_key: 2,
            ..PlayerStatLine::default()
        }
    }

    fn key(player: i64, fixture: i64, team: i64) -> MatchStatKey {
        MatchStatKey {
            player,
            fixture,
            team,
            league: 39,
            season: 2023,
        }
    }

    #[test]
    fn match_stats_need_a_registered_player() {
        let conn = open_in_memory().unwrap();
        let repo = PlayerRepository::new(&conn);
        let err = repo.insert_match_stats(key(7, 1, 33), &line(1, 7.0)).unwrap_err();
        assert!(err.is_foreign_key(), "got {err:?}");

        repo.insert(&player(7, 33, 2023)).unwrap();
        repo.insert_match_stats(key(7, 1, 33), &line(1, 7.0)).unwrap();
        let err = repo.insert_match_stats(key(7, 1, 33), &line(1, 7.0)).unwrap_err();
        assert!(err.is_duplicate());
    }

    #[test]
    fn same_player_may_exist_per_team_and_season() {
        let conn = open_in_memory().unwrap();
        let repo = PlayerRepository::new(&conn);
        repo.insert(&player(7, 33, 2022)).unwrap();
        repo.insert(&player(7, 33, 2023)).unwrap();
        repo.insert(&player(7, 40, 2023)).unwrap();
        assert!(repo.insert(&player(7, 40, 2023)).unwrap_err().is_duplicate());

        assert_eq!(repo.by_team(33, None).unwrap().len(), 2);
        let only = repo.by_team(33, Some(2023)).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].season, 2023);
    }

    #[test]
    fn key_player_stats_aggregate_the_window() {
        let conn = open_in_memory().unwrap();
        let repo = PlayerRepository::new(&conn);
        repo.insert(&player(7, 33, 2023)).unwrap();
        repo.insert(&player(9, 40, 2023)).unwrap();
        repo.insert_match_stats(key(7, 1, 33), &line(1, 7.0)).unwrap();
        repo.insert_match_stats(key(7, 2, 33), &line(2, 8.0)).unwrap();
        repo.insert_match_stats(key(7, 3, 33), &line(5, 9.0)).unwrap();
        repo.insert_match_stats(key(9, 1, 40), &line(0, 6.0)).unwrap();

        let stats = repo.key_player_stats(2023, &[33, 40], &[1, 2]).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].player_id, 7);
        assert_eq!(stats[0].total_goals_scored, 3);
        assert_float_absolute_eq!(stats[0].avg_rating, 7.5);
        assert_float_absolute_eq!(stats[0].avg_duels_won, 4.0);
        assert_eq!(stats[1].player_id, 9);

        assert!(repo.key_player_stats(2023, &[33], &[]).unwrap().is_empty());

        let away = repo.key_player_stats(2023, &[40], &[1, 3]).unwrap();
        assert_eq!(away.len(), 1);
        assert_eq!(away[0].player_id, 9);
    }

    #[test]
    fn placeholders_follow_the_season_slot() {
        assert_eq!(placeholders(2, 3), "?2, ?3, ?4");
        assert_eq!(placeholders(5, 1), "?5");
    }

    #[test]
    fn season_statistics_join_on_team_and_season() {
        let conn = open_in_memory().unwrap();
        let repo = PlayerRepository::new(&conn);
        repo.insert(&player(7, 33, 2022)).unwrap();
        repo.insert(&player(7, 33, 2023)).unwrap();
        repo.insert(&player(8, 33, 2023)).unwrap();
        repo.insert_season_stats(7, 2022, 33, &line(4, 6.5)).unwrap();
        repo.insert_season_stats(7, 2023, 33, &line(11, 7.25)).unwrap();
        // aggregate for another club must not attach to the team 33 registration
        repo.insert_season_stats(8, 2023, 40, &line(2, 6.0)).unwrap();

        let all = repo.season_statistics_by_team(33, None).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!((all[0].player.season, all[0].goals_scored), (2023, 11));
        assert_float_absolute_eq!(all[0].rating, 7.25);
        assert_eq!(all[1].player.season, 2022);

        let current = repo.season_statistics_by_team(33, Some(2023)).unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].player.firstname, "First7");
    }
}
