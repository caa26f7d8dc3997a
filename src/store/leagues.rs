use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::error::StoreError;
use crate::model::{LeagueEntry, SeasonInfo};
use crate::store::bool_to_i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeagueRow {
    pub id: i64,
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonRow {
    pub league: i64,
    pub year: i64,
    pub start: String,
    pub end: String,
    pub current: bool,
    pub cov_fixtures: bool,
    pub cov_players: bool,
    pub cov_standings: bool,
}

impl SeasonRow {
    pub fn from_info(league: i64, info: &SeasonInfo) -> Self {
        Self {
            league,
            year: info.year,
            start: info.start.clone(),
            end: info.end.clone(),
            current: info.current,
            cov_fixtures: info.coverage.has_fixtures(),
            cov_players: info.coverage.players,
            cov_standings: info.coverage.standings,
        }
    }
}

pub struct LeagueRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LeagueRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn upsert(&self, entry: &LeagueEntry) -> Result<(), StoreError> {
        let country = if entry.country.name.is_empty() {
            &entry.league.country
        } else {
            &entry.country.name
        };
        self.conn.execute(
            r#"
            INSERT INTO leagues (id, name, country) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                country = excluded.country
            "#,
            params![entry.league.id, entry.league.name, country],
        )?;
        Ok(())
    }

    pub fn upsert_season(&self, season: &SeasonRow) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO league_seasons (
                league, year, "start", "end", current, cov_fixtures, cov_players, cov_standings
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(league, year) DO UPDATE SET
                "start" = excluded."start",
                "end" = excluded."end",
                current = excluded.current,
                cov_fixtures = excluded.cov_fixtures,
                cov_players = excluded.cov_players,
                cov_standings = excluded.cov_standings
            "#,
            params![
                season.league,
                season.year,
                season.start,
                season.end,
                bool_to_i64(season.current),
                bool_to_i64(season.cov_fixtures),
                bool_to_i64(season.cov_players),
                bool_to_i64(season.cov_standings),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, id: i64) -> Result<Option<LeagueRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, country FROM leagues WHERE id = ?1",
                params![id],
                |row| {
                    Ok(LeagueRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        country: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn season(&self, league: i64, year: i64) -> Result<Option<SeasonRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT league, year, "start", "end", current, cov_fixtures, cov_players, cov_standings
                FROM league_seasons WHERE league = ?1 AND year = ?2
                "#,
                params![league, year],
                season_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn seasons(&self, league: i64) -> Result<Vec<SeasonRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT league, year, "start", "end", current, cov_fixtures, cov_players, cov_standings
            FROM league_seasons WHERE league = ?1 ORDER BY year ASC
            "#,
        )?;
        let rows = stmt.query_map(params![league], season_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn season_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SeasonRow> {
    Ok(SeasonRow {
        league: row.get(0)?,
        year: row.get(1)?,
        start: row.get(2)?,
        end: row.get(3)?,
        current: row.get::<_, i64>(4)? != 0,
        cov_fixtures: row.get::<_, i64>(5)? != 0,
        cov_players: row.get::<_, i64>(6)? != 0,
        cov_standings: row.get::<_, i64>(7)? != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::open_in_memory;

    fn entry(name: &str) -> LeagueEntry {
        serde_json::from_value(serde_json::json!({
            "league": {"id": 39, "name": name, "type": "League"},
            "country": {"name": "England", "code": "GB"},
            "seasons": [
                {"year": 2022, "start": "2022-08-05", "end": "2023-05-28", "current": false,
                 "coverage": {"fixtures": {"events": true}, "players": true, "standings": true}},
                {"year": 2023, "start": "2023-08-11", "end": "2024-05-19", "current": true,
                 "coverage": {"fixtures": {"events": false}, "players": false, "standings": true}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn upsert_overwrites_name_and_keeps_one_row() {
        let conn = open_in_memory().unwrap();
        let repo = LeagueRepository::new(&conn);
        repo.upsert(&entry("Premier League")).unwrap();
        repo.upsert(&entry("EPL")).unwrap();
        let got = repo.get(39).unwrap().unwrap();
        assert_eq!(got.name, "EPL");
        assert_eq!(got.country, "England");
        assert!(repo.get(40).unwrap().is_none());
    }

    #[test]
    fn seasons_store_coverage_flags() {
        let conn = open_in_memory().unwrap();
        let repo = LeagueRepository::new(&conn);
        let e = entry("Premier League");
        for s in &e.seasons {
            repo.upsert_season(&SeasonRow::from_info(39, s)).unwrap();
        }
        let seasons = repo.seasons(39).unwrap();
        assert_eq!(seasons.len(), 2);
        assert!(seasons[0].cov_players && seasons[0].cov_fixtures);
        assert!(!seasons[1].cov_players && !seasons[1].cov_fixtures);
        assert!(repo.season(39, 2023).unwrap().unwrap().current);
    }
}
