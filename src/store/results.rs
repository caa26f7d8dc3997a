use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::error::StoreError;
use crate::normalize::ResultLine;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    pub team: i64,
    pub league: i64,
    pub season: i64,
    pub round: i64,
    pub points: i64,
    pub goals_for: i64,
    pub goals_against: i64,
    pub modus: i64,
    pub elapsed: i64,
}

/// One line of a league table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StandingRow {
    pub team: i64,
    pub name: String,
    pub played: i64,
    pub won: i64,
    pub drawn: i64,
    pub lost: i64,
    pub goals_for: i64,
    pub goals_against: i64,
    pub goal_difference: i64,
    pub points: i64,
}

pub struct ResultRepository<'a> {
    conn: &'a Connection,
}

impl<'a> ResultRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Keyed by (team, league, season, round); a re-ingested fixture overwrites.
    pub fn upsert(&self, league: i64, season: i64, round: i64, r: &ResultLine) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO results (team, league, season, round, points, goals_for, goals_against, modus, elapsed)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(team, league, season, round) DO UPDATE SET
                points = excluded.points,
                goals_for = excluded.goals_for,
                goals_against = excluded.goals_against,
                modus = excluded.modus,
                elapsed = excluded.elapsed
            "#,
            params![
                r.team,
                league,
                season,
                round,
                r.points,
                r.goals_for,
                r.goals_against,
                r.side.modus(),
                r.elapsed
            ],
        )?;
        Ok(())
    }

    pub fn for_team_round(
        &self,
        team: i64,
        league: i64,
        season: i64,
        round: i64,
    ) -> Result<Option<ResultRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT team, league, season, round, points, goals_for, goals_against, modus, elapsed
                FROM results WHERE team = ?1 AND league = ?2 AND season = ?3 AND round = ?4
                "#,
                params![team, league, season, round],
                |row| {
                    Ok(ResultRow {
                        team: row.get(0)?,
                        league: row.get(1)?,
                        season: row.get(2)?,
                        round: row.get(3)?,
                        points: row.get(4)?,
                        goals_for: row.get(5)?,
                        goals_against: row.get(6)?,
                        modus: row.get(7)?,
                        elapsed: row.get(8)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// League table for (`league`, `season`), best first. Teams without a
    /// `teams` row are listed with an empty name.
    pub fn standings(&self, league: i64, season: i64) -> Result<Vec<StandingRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT r.team, COALESCE(t.name, ''),
                   COUNT(*),
                   SUM(CASE WHEN r.points = 3 THEN 1 ELSE 0 END),
                   SUM(CASE WHEN r.points = 1 THEN 1 ELSE 0 END),
                   SUM(CASE WHEN r.points = 0 THEN 1 ELSE 0 END),
                   SUM(r.goals_for), SUM(r.goals_against), SUM(r.points)
            FROM results r LEFT JOIN teams t ON t.id = r.team
            WHERE r.league = ?1 AND r.season = ?2
            GROUP BY r.team, t.name
            ORDER BY SUM(r.points) DESC,
                     SUM(r.goals_for) - SUM(r.goals_against) DESC,
                     SUM(r.goals_for) DESC,
                     r.team ASC
            "#,
        )?;
        let rows = stmt.query_map(params![league, season], |row| {
            let goals_for: i64 = row.get(6)?;
            let goals_against: i64 = row.get(7)?;
            Ok(StandingRow {
                team: row.get(0)?,
                name: row.get(1)?,
                played: row.get(2)?,
                won: row.get(3)?,
                drawn: row.get(4)?,
                lost: row.get(5)?,
                goals_for,
                goals_against,
                goal_difference: goals_for - goals_against,
                points: row.get(8)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Side;
    use crate::store::open_in_memory;

    fn line(team: i64, side: Side, points: i64, gf: i64, ga: i64) -> ResultLine {
        ResultLine {
            team,
            side,
            points,
            goals_for: gf,
            goals_against: ga,
            elapsed: 90,
        }
    }

    #[test]
    fn upsert_overwrites_a_corrected_score() {
        let conn = open_in_memory().unwrap();
        let repo = ResultRepository::new(&conn);
        repo.upsert(39, 2023, 1, &line(33, Side::Home, 1, 1, 1)).unwrap();
        repo.upsert(39, 2023, 1, &line(33, Side::Home, 3, 2, 1)).unwrap();
        let row = repo.for_team_round(33, 39, 2023, 1).unwrap().unwrap();
        assert_eq!((row.points, row.goals_for, row.modus), (3, 2, 1));
        assert!(repo.for_team_round(33, 39, 2023, 2).unwrap().is_none());
    }

    #[test]
    fn standings_rank_by_points_then_goal_difference() {
        let conn = open_in_memory().unwrap();
        conn.execute(
            "INSERT INTO teams (id, name, country, code) VALUES (33, 'United', 'England', 'MUN')",
            [],
        )
        .unwrap();
        let repo = ResultRepository::new(&conn);
        repo.upsert(39, 2023, 1, &line(33, Side::Home, 3, 2, 1)).unwrap();
        repo.upsert(39, 2023, 1, &line(40, Side::Away, 0, 1, 2)).unwrap();
        repo.upsert(39, 2023, 2, &line(40, Side::Home, 3, 4, 0)).unwrap();
        repo.upsert(39, 2023, 2, &line(33, Side::Away, 0, 0, 4)).unwrap();
        repo.upsert(39, 2023, 3, &line(33, Side::Home, 1, 0, 0)).unwrap();
        repo.upsert(39, 2023, 3, &line(40, Side::Away, 1, 0, 0)).unwrap();

        let table = repo.standings(39, 2023).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].team, 40);
        assert_eq!(table[0].name, "");
        assert_eq!((table[0].points, table[0].goal_difference), (4, 3));
        assert_eq!(table[1].name, "United");
        assert_eq!(
            (table[1].won, table[1].drawn, table[1].lost, table[1].played),
            (1, 1, 1, 3)
        );
    }
}
