use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::info;

use crate::api::FootballApi;
use crate::ingest::report::{Entity, IngestReport};
use crate::model::CareerEntry;
use crate::store::CoachRepository;
use crate::store::coaches::CareerRow;

pub struct CoachService<'a, A: FootballApi> {
    api: &'a A,
    conn: &'a Connection,
}

impl<'a, A: FootballApi> CoachService<'a, A> {
    pub fn new(api: &'a A, conn: &'a Connection) -> Self {
        Self { api, conn }
    }

    /// Every coach upstream associates with `team`, plus their full careers.
    pub fn ingest_team(&self, team: i64, report: &mut IngestReport) {
        let coaches = match self.api.coaches(team) {
            Ok(coaches) => coaches,
            Err(err) => {
                report.failed(Entity::Coach, format!("team_{team}"), err);
                return;
            }
        };
        info!(team, count = coaches.len(), "ingesting coaches");

        let repo = CoachRepository::new(self.conn);
        for coach in &coaches {
            report.record_write(
                Entity::Coach,
                format!("coach_{}", coach.id),
                repo.insert(coach.id, &coach.name),
            );
            for entry in &coach.career {
                let key = format!("coach_{}#team_{}#start_{}", coach.id, entry.team.id, entry.start);
                match career_row(coach.id, entry) {
                    Ok(row) => {
                        report.record_write(Entity::CoachCareer, key, repo.insert_career(&row));
                    }
                    Err(reason) => report.skipped(Entity::CoachCareer, key, reason),
                }
            }
        }
    }
}

/// Start must be a `YYYY-MM-DD` date; a blank end means the tenure is open.
pub fn career_row(coach: i64, entry: &CareerEntry) -> Result<CareerRow, String> {
    let start = parse_date(&entry.start).map_err(|e| format!("start date: {e}"))?;
    let end = match entry.end.trim() {
        "" => None,
        raw => Some(parse_date(raw).map_err(|e| format!("end date: {e}"))?),
    };
    Ok(CareerRow {
        coach,
        team: entry.team.id,
        start,
        end,
    })
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|err| format!("{raw:?}: {err}"))
}
