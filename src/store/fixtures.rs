use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::error::StoreError;
use crate::normalize::{FormationLine, TeamStatLine};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixtureRow {
    pub id: i64,
    pub league: i64,
    pub round: i64,
    pub referee: String,
    pub timezone: String,
    pub timestamp: i64,
    pub venue: i64,
    pub season: i64,
    pub home_team: i64,
    pub away_team: i64,
    pub home_goals: i64,
    pub away_goals: i64,
    pub home_goals_half: i64,
    pub away_goals_half: i64,
}

const FIXTURE_COLUMNS: &str = "id, league, round, referee, timezone, timestamp, venue, season, \
     home_team, away_team, home_goals, away_goals, home_goals_half, away_goals_half";

pub struct FixtureRepository<'a> {
    conn: &'a Connection,
}

impl<'a> FixtureRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, f: &FixtureRow) -> Result<(), StoreError> {
        self.conn.execute(
            &format!(
                "INSERT INTO fixtures ({FIXTURE_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
            ),
            params![
                f.id,
                f.league,
                f.round,
                f.referee,
                f.timezone,
                f.timestamp,
                f.venue,
                f.season,
                f.home_team,
                f.away_team,
                f.home_goals,
                f.away_goals,
                f.home_goals_half,
                f.away_goals_half
            ],
        )?;
        Ok(())
    }

    pub fn insert_team_stats(&self, team: i64, fixture: i64, s: &TeamStatLine) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO team_statistics (
                team, fixture, shots_total, shots_on, shots_off, shots_blocked, shots_box,
                shots_outside, offsides, fouls, corners, possession, yellow, red, gk_saves,
                passes_total, passes_accurate, passes_percent, expected_goals
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19
            )
            "#,
            params![
                team,
                fixture,
                s.shots_total,
                s.shots_on,
                s.shots_off,
                s.shots_blocked,
                s.shots_box,
                s.shots_outside,
                s.offsides,
                s.fouls,
                s.corners,
                s.possession,
                s.yellow,
                s.red,
                s.gk_saves,
                s.passes_total,
                s.passes_accurate,
                s.passes_percent,
                s.expected_goals,
            ],
        )?;
        Ok(())
    }

    /// Writes the 18, 19 or 20 columns the lineup carries; unused substitute
    /// slots stay NULL.
    pub fn insert_formation(&self, fixture: i64, f: &FormationLine) -> Result<(), StoreError> {
        let sub_columns: Vec<String> = (1..=f.subs.len()).map(|i| format!("sub{i}")).collect();
        let total = f.column_count();
        let placeholders: Vec<String> = (1..=total).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO formations (fixture, team, formation, \
             player1, player2, player3, player4, player5, player6, \
             player7, player8, player9, player10, player11, {}coach) VALUES ({})",
            sub_columns
                .iter()
                .map(|c| format!("{c}, "))
                .collect::<String>(),
            placeholders.join(", ")
        );

        let mut values: Vec<rusqlite::types::Value> = Vec::with_capacity(total);
        values.push(fixture.into());
        values.push(f.team.into());
        values.push(f.formation.clone().into());
        values.extend(f.starters.iter().map(|&id| rusqlite::types::Value::from(id)));
        values.extend(f.subs.iter().map(|&id| rusqlite::types::Value::from(id)));
        values.push(f.coach.into());

        self.conn
            .execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(())
    }

    pub fn get(&self, id: i64) -> Result<Option<FixtureRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {FIXTURE_COLUMNS} FROM fixtures WHERE id = ?1"),
                params![id],
                fixture_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn by_round(&self, league: i64, season: i64, round: i64) -> Result<Vec<FixtureRow>, StoreError> {
        self.select(
            &format!(
                "SELECT {FIXTURE_COLUMNS} FROM fixtures \
                 WHERE league = ?1 AND season = ?2 AND round = ?3 ORDER BY timestamp ASC, id ASC"
            ),
            params![league, season, round],
        )
    }

    /// Ids of fixtures in rounds `round - n ..= round`.
    pub fn ids_for_last_rounds(
        &self,
        league: i64,
        season: i64,
        round: i64,
        n: i64,
    ) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM fixtures WHERE league = ?1 AND season = ?2 AND round BETWEEN ?3 AND ?4 \
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![league, season, round - n, round], |row| {
            row.get::<_, i64>(0)
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Most recent meetings of two teams, either way round.
    pub fn last_matchups(&self, team1: i64, team2: i64, n: i64) -> Result<Vec<FixtureRow>, StoreError> {
        self.select(
            &format!(
                "SELECT {FIXTURE_COLUMNS} FROM fixtures \
                 WHERE (home_team = ?1 AND away_team = ?2) OR (home_team = ?2 AND away_team = ?1) \
                 ORDER BY timestamp DESC LIMIT ?3"
            ),
            params![team1, team2, n],
        )
    }

    /// Most recent fixtures of `team` that kicked off before `before`.
    pub fn last_for_team(&self, team: i64, before: i64, n: i64) -> Result<Vec<FixtureRow>, StoreError> {
        self.select(
            &format!(
                "SELECT {FIXTURE_COLUMNS} FROM fixtures \
                 WHERE (home_team = ?1 OR away_team = ?1) AND timestamp < ?2 \
                 ORDER BY timestamp DESC LIMIT ?3"
            ),
            params![team, before, n],
        )
    }

    /// Removes a fixture together with its team statistics, formations,
    /// player lines and both teams' results for its round. Returns the number
    /// of fixture rows deleted.
    pub fn delete(&self, id: i64) -> Result<usize, StoreError> {
        if let Some(f) = self.get(id)? {
            self.conn.execute(
                "DELETE FROM results WHERE league = ?1 AND season = ?2 AND round = ?3 \
                 AND team IN (?4, ?5)",
                params![f.league, f.season, f.round, f.home_team, f.away_team],
            )?;
        }
        self.conn
            .execute("DELETE FROM team_statistics WHERE fixture = ?1", params![id])?;
        self.conn
            .execute("DELETE FROM formations WHERE fixture = ?1", params![id])?;
        self.conn
            .execute("DELETE FROM player_statistics WHERE fixture = ?1", params![id])?;
        Ok(self
            .conn
            .execute("DELETE FROM fixtures WHERE id = ?1", params![id])?)
    }

    fn select(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<FixtureRow>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, fixture_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn fixture_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FixtureRow> {
    Ok(FixtureRow {
        id: row.get(0)?,
        league: row.get(1)?,
        round: row.get(2)?,
        referee: row.get(3)?,
        timezone: row.get(4)?,
        timestamp: row.get(5)?,
        venue: row.get(6)?,
        season: row.get(7)?,
        home_team: row.get(8)?,
        away_team: row.get(9)?,
        home_goals: row.get(10)?,
        away_goals: row.get(11)?,
        home_goals_half: row.get(12)?,
        away_goals_half: row.get(13)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::STARTERS;
    use crate::store::open_in_memory;

    fn fixture(id: i64, round: i64, ts: i64, home: i64, away: i64) -> FixtureRow {
        FixtureRow {
            id,
            league: 39,
            round,
            referee: "M. Oliver".to_string(),
            timezone: "UTC".to_string(),
            timestamp: ts,
            venue: 556,
            season: 2023,
            home_team: home,
            away_team: away,
            home_goals: 1,
            away_goals: 0,
            home_goals_half: 0,
            away_goals_half: 0,
        }
    }

    fn formation(subs: usize) -> FormationLine {
        let mut starters = [0i64; STARTERS];
        for (i, slot) in starters.iter_mut().enumerate() {
            *slot = i as i64 + 1;
        }
        FormationLine {
            team: 33,
            formation: "4-3-3".to_string(),
            starters,
            subs: (0..subs as i64).map(|i| 100 + i).collect(),
            coach: 19,
        }
    }

    fn count(conn: &Connection, sql: &str) -> i64 {
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn formation_width_leaves_unused_subs_null() {
        let conn = open_in_memory().unwrap();
        let repo = FixtureRepository::new(&conn);
        repo.insert_formation(1, &formation(3)).unwrap();
        let (sub3, sub4, sub5): (Option<i64>, Option<i64>, Option<i64>) = conn
            .query_row(
                "SELECT sub3, sub4, sub5 FROM formations WHERE fixture = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!((sub3, sub4, sub5), (Some(102), None, None));

        let mut five = formation(5);
        five.team = 40;
        repo.insert_formation(1, &five).unwrap();
        let (player11, sub5, coach): (i64, Option<i64>, i64) = conn
            .query_row(
                "SELECT player11, sub5, coach FROM formations WHERE fixture = 1 AND team = 40",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!((player11, sub5, coach), (11, Some(104), 19));
    }

    #[test]
    fn delete_removes_dependent_rows() {
        let conn = open_in_memory().unwrap();
        let repo = FixtureRepository::new(&conn);
        repo.insert(&fixture(1, 1, 100, 33, 40)).unwrap();
        repo.insert(&fixture(2, 1, 110, 34, 41)).unwrap();
        repo.insert_team_stats(33, 1, &TeamStatLine::default()).unwrap();
        repo.insert_team_stats(34, 2, &TeamStatLine::default()).unwrap();
        repo.insert_formation(1, &formation(5)).unwrap();
        conn.execute_batch(
            "INSERT INTO results VALUES (33, 39, 2023, 1, 3, 1, 0, 1, 90);
             INSERT INTO results VALUES (40, 39, 2023, 1, 0, 0, 1, 2, 90);
             INSERT INTO results VALUES (34, 39, 2023, 1, 3, 1, 0, 1, 90);
             INSERT INTO results VALUES (33, 39, 2023, 2, 1, 0, 0, 1, 90);",
        )
        .unwrap();

        assert_eq!(repo.delete(1).unwrap(), 1);
        assert_eq!(repo.delete(1).unwrap(), 0);
        assert!(repo.get(1).unwrap().is_none());
        assert!(repo.get(2).unwrap().is_some());
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM team_statistics"), 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM formations"), 0);
        // other fixtures and other rounds keep their results
        assert_eq!(
            count(&conn, "SELECT COUNT(*) FROM results WHERE round = 1"),
            1
        );
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM results WHERE round = 2"), 1);
    }

    #[test]
    fn history_queries_order_newest_first() {
        let conn = open_in_memory().unwrap();
        let repo = FixtureRepository::new(&conn);
        repo.insert(&fixture(1, 1, 100, 33, 40)).unwrap();
        repo.insert(&fixture(2, 2, 200, 40, 33)).unwrap();
        repo.insert(&fixture(3, 3, 300, 33, 50)).unwrap();
        repo.insert(&fixture(4, 4, 400, 33, 40)).unwrap();

        let ids = |rows: Vec<FixtureRow>| rows.iter().map(|f| f.id).collect::<Vec<_>>();
        assert_eq!(ids(repo.last_matchups(33, 40, 2).unwrap()), vec![4, 2]);
        assert_eq!(ids(repo.last_matchups(40, 33, 10).unwrap()), vec![4, 2, 1]);
        assert_eq!(ids(repo.last_for_team(33, 350, 5).unwrap()), vec![3, 2, 1]);
        assert_eq!(ids(repo.by_round(39, 2023, 2).unwrap()), vec![2]);
        assert_eq!(repo.ids_for_last_rounds(39, 2023, 4, 2).unwrap(), vec![2, 3, 4]);
    }

    #[test]
    fn duplicate_fixture_is_reported() {
        let conn = open_in_memory().unwrap();
        let repo = FixtureRepository::new(&conn);
        repo.insert(&fixture(1, 1, 100, 33, 40)).unwrap();
        assert!(repo.insert(&fixture(1, 1, 100, 33, 40)).unwrap_err().is_duplicate());
    }
}
