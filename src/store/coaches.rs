use chrono::NaiveDate;
use rusqlite::{Connection, params};

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareerRow {
    pub coach: i64,
    pub team: i64,
    pub start: NaiveDate,
    /// `None` while the tenure is still running.
    pub end: Option<NaiveDate>,
}

pub struct CoachRepository<'a> {
    conn: &'a Connection,
}

impl<'a> CoachRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, id: i64, name: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO coaches (id, name) VALUES (?1, ?2)",
            params![id, name],
        )?;
        Ok(())
    }

    pub fn insert_career(&self, career: &CareerRow) -> Result<(), StoreError> {
        self.conn.execute(
            r#"INSERT INTO coach_careers (coach, team, "start", "end") VALUES (?1, ?2, ?3, ?4)"#,
            params![
                career.coach,
                career.team,
                career.start.to_string(),
                career.end.map(|d| d.to_string()),
            ],
        )?;
        Ok(())
    }

    pub fn careers(&self, coach: i64) -> Result<Vec<CareerRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            r#"SELECT coach, team, "start", "end" FROM coach_careers WHERE coach = ?1 ORDER BY "start" ASC"#,
        )?;
        let rows = stmt.query_map(params![coach], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (coach, team, start, end) = row?;
            // Only dates this repository wrote end up here, so a bad one is corruption.
            let start = parse_stored_date(&start)?;
            let end = end.as_deref().map(parse_stored_date).transpose()?;
            out.push(CareerRow {
                coach,
                team,
                start,
                end,
            });
        }
        Ok(out)
    }
}

fn parse_stored_date(raw: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|err| {
        StoreError::Sqlite(rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(err),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::open_in_memory;

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn open_ended_career_reads_back_as_none() {
        let conn = open_in_memory().unwrap();
        let repo = CoachRepository::new(&conn);
        repo.insert(19, "Erik ten Hag").unwrap();
        repo.insert_career(&CareerRow {
            coach: 19,
            team: 194,
            start: date("2017-12-01"),
            end: Some(date("2022-05-31")),
        })
        .unwrap();
        repo.insert_career(&CareerRow {
            coach: 19,
            team: 33,
            start: date("2022-07-01"),
            end: None,
        })
        .unwrap();

        let careers = repo.careers(19).unwrap();
        assert_eq!(careers.len(), 2);
        assert_eq!(careers[0].end, Some(date("2022-05-31")));
        assert_eq!(careers[1].team, 33);
        assert_eq!(careers[1].end, None);

        let null_ends: i64 = conn
            .query_row(
                r#"SELECT COUNT(*) FROM coach_careers WHERE "end" IS NULL"#,
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(null_ends, 1);
    }

    #[test]
    fn duplicate_coach_is_reported() {
        let conn = open_in_memory().unwrap();
        let repo = CoachRepository::new(&conn);
        repo.insert(19, "Erik ten Hag").unwrap();
        assert!(repo.insert(19, "Erik ten Hag").unwrap_err().is_duplicate());
    }
}
