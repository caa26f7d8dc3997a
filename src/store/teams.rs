use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::error::StoreError;
use crate::model::{TeamInfo, VenueInfo};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamRow {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueRow {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub capacity: i64,
}

pub struct TeamRepository<'a> {
    conn: &'a Connection,
}

impl<'a> TeamRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, team: &TeamInfo) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO teams (id, name, country, code) VALUES (?1, ?2, ?3, ?4)",
            params![team.id, team.name, team.country, team.code],
        )?;
        Ok(())
    }

    pub fn insert_venue(&self, venue: &VenueInfo) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO venues (id, name, city, capacity) VALUES (?1, ?2, ?3, ?4)",
            params![venue.id, venue.name, venue.city, venue.capacity],
        )?;
        Ok(())
    }

    /// Records that `team` played in (`league`, `season`).
    pub fn insert_membership(&self, league: i64, season: i64, team: i64) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO seasons (league, season, team) VALUES (?1, ?2, ?3)",
            params![league, season, team],
        )?;
        Ok(())
    }

    pub fn get(&self, id: i64) -> Result<Option<TeamRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, country, code FROM teams WHERE id = ?1",
                params![id],
                team_from_row,
            )
            .optional()?;
        Ok(row)
    }

    pub fn venue(&self, id: i64) -> Result<Option<VenueRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name, city, capacity FROM venues WHERE id = ?1",
                params![id],
                |row| {
                    Ok(VenueRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        city: row.get(2)?,
                        capacity: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Teams on the (`league`, `season`) roster, by id.
    pub fn for_season(&self, league: i64, season: i64) -> Result<Vec<TeamRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT t.id, t.name, t.country, t.code
            FROM seasons s JOIN teams t ON t.id = s.team
            WHERE s.league = ?1 AND s.season = ?2
            ORDER BY t.id ASC
            "#,
        )?;
        let rows = stmt.query_map(params![league, season], team_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn team_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TeamRow> {
    Ok(TeamRow {
        id: row.get(0)?,
        name: row.get(1)?,
        country: row.get(2)?,
        code: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::open_in_memory;

    fn team(id: i64, name: &str) -> TeamInfo {
        TeamInfo {
            id,
            name: name.to_string(),
            code: name[..3].to_uppercase(),
            country: "England".to_string(),
            ..TeamInfo::default()
        }
    }

    #[test]
    fn second_insert_is_a_duplicate() {
        let conn = open_in_memory().unwrap();
        let repo = TeamRepository::new(&conn);
        repo.insert(&team(33, "Manchester United")).unwrap();
        let err = repo.insert(&team(33, "Manchester United")).unwrap_err();
        assert!(err.is_duplicate());
        assert_eq!(repo.get(33).unwrap().unwrap().code, "MAN");
    }

    #[test]
    fn roster_lists_only_that_season() {
        let conn = open_in_memory().unwrap();
        let repo = TeamRepository::new(&conn);
        repo.insert(&team(33, "Manchester United")).unwrap();
        repo.insert(&team(40, "Liverpool")).unwrap();
        repo.insert_membership(39, 2023, 40).unwrap();
        repo.insert_membership(39, 2023, 33).unwrap();
        repo.insert_membership(39, 2022, 33).unwrap();
        let ids: Vec<i64> = repo.for_season(39, 2023).unwrap().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![33, 40]);
        assert_eq!(repo.for_season(39, 2022).unwrap().len(), 1);
        assert!(repo.insert_membership(39, 2022, 33).unwrap_err().is_duplicate());
    }

    #[test]
    fn venue_is_stored_once() {
        let conn = open_in_memory().unwrap();
        let repo = TeamRepository::new(&conn);
        let venue = VenueInfo {
            id: 556,
            name: "Old Trafford".to_string(),
            city: "Manchester".to_string(),
            capacity: 76212,
        };
        repo.insert_venue(&venue).unwrap();
        assert!(repo.insert_venue(&venue).unwrap_err().is_duplicate());
        let row = repo.venue(556).unwrap().unwrap();
        assert_eq!(row.city, "Manchester");
        assert_eq!(row.capacity, 76212);
        assert!(repo.venue(1).unwrap().is_none());
    }
}
