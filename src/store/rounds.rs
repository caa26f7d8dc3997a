use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;

use crate::error::StoreError;
use crate::normalize::RoundBounds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundRow {
    pub league: i64,
    pub season: i64,
    pub round: i64,
    pub start: i64,
    pub end: i64,
}

pub struct RoundRepository<'a> {
    conn: &'a Connection,
}

impl<'a> RoundRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn bounds(&self, league: i64, season: i64, round: i64) -> Result<Option<RoundBounds>, StoreError> {
        let row = self
            .conn
            .query_row(
                r#"SELECT "start", "end" FROM rounds WHERE league = ?1 AND season = ?2 AND round = ?3"#,
                params![league, season, round],
                |row| {
                    Ok(RoundBounds {
                        start: row.get(0)?,
                        end: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Stores `bounds` as given. Callers widen first; see [`crate::normalize::widen_round`].
    pub fn upsert(&self, league: i64, season: i64, round: i64, bounds: RoundBounds) -> Result<(), StoreError> {
        self.conn.execute(
            r#"
            INSERT INTO rounds (league, season, round, "start", "end") VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(league, season, round) DO UPDATE SET
                "start" = excluded."start",
                "end" = excluded."end"
            "#,
            params![league, season, round, bounds.start, bounds.end],
        )?;
        Ok(())
    }

    /// The finished round whose end lies closest to `now` without passing it.
    pub fn latest_finished(&self, league: i64, season: i64, now: i64) -> Result<Option<RoundRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT league, season, round, "start", "end" FROM rounds
                WHERE league = ?1 AND season = ?2 AND "end" <= ?3
                ORDER BY ABS("end" - ?3) ASC, round DESC
                LIMIT 1
                "#,
                params![league, season, now],
                round_from_row,
            )
            .optional()?;
        Ok(row)
    }

    /// The first round that kicks off strictly after `timestamp`.
    pub fn next_after(&self, league: i64, season: i64, timestamp: i64) -> Result<Option<RoundRow>, StoreError> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT league, season, round, "start", "end" FROM rounds
                WHERE league = ?1 AND season = ?2 AND "start" > ?3
                ORDER BY "start" ASC, round ASC
                LIMIT 1
                "#,
                params![league, season, timestamp],
                round_from_row,
            )
            .optional()?;
        Ok(row)
    }
}

fn round_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RoundRow> {
    Ok(RoundRow {
        league: row.get(0)?,
        season: row.get(1)?,
        round: row.get(2)?,
        start: row.get(3)?,
        end: row.get(4)?,
    })
}
