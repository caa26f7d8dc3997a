//! SQLite storage: schema plus one repository per entity.
//!
//! Repositories borrow a single [`Connection`] that the caller opens once and
//! passes down. Writes are independent statements; nothing here opens a
//! transaction spanning several entities.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub mod coaches;
pub mod fixtures;
pub mod leagues;
pub mod players;
pub mod results;
pub mod rounds;
pub mod teams;

pub use coaches::CoachRepository;
pub use fixtures::FixtureRepository;
pub use leagues::LeagueRepository;
pub use players::PlayerRepository;
pub use results::ResultRepository;
pub use rounds::RoundRepository;
pub use teams::TeamRepository;

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create db dir {}", parent.display()))?;
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")
        .context("enable wal journal")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS leagues (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            country TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS league_seasons (
            league INTEGER NOT NULL,
            year INTEGER NOT NULL,
            "start" TEXT NOT NULL,
            "end" TEXT NOT NULL,
            current INTEGER NOT NULL,
            cov_fixtures INTEGER NOT NULL,
            cov_players INTEGER NOT NULL,
            cov_standings INTEGER NOT NULL,
            PRIMARY KEY (league, year)
        );

        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            country TEXT NOT NULL,
            code TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS venues (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            city TEXT NOT NULL,
            capacity INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS seasons (
            league INTEGER NOT NULL,
            season INTEGER NOT NULL,
            team INTEGER NOT NULL,
            PRIMARY KEY (league, season, team)
        );

        CREATE TABLE IF NOT EXISTS players (
            id INTEGER NOT NULL,
            team INTEGER NOT NULL,
            season INTEGER NOT NULL,
            firstname TEXT NOT NULL,
            lastname TEXT NOT NULL,
            birthplace TEXT NOT NULL,
            birthcountry TEXT NOT NULL,
            birthdate TEXT NOT NULL,
            PRIMARY KEY (id, team, season)
        );
        CREATE INDEX IF NOT EXISTS idx_players_team ON players(team, season);

        CREATE TABLE IF NOT EXISTS player_statistics_season (
            player INTEGER NOT NULL,
            season INTEGER NOT NULL,
            team INTEGER NOT NULL,
            minutes INTEGER NOT NULL,
            position TEXT NOT NULL,
            rating REAL NOT NULL,
            captain INTEGER NOT NULL,
            games INTEGER NOT NULL,
            lineups INTEGER NOT NULL,
            shots_total INTEGER NOT NULL,
            shots_on INTEGER NOT NULL,
            goals_scored INTEGER NOT NULL,
            goals_assisted INTEGER NOT NULL,
            passes_total INTEGER NOT NULL,
            passes_key INTEGER NOT NULL,
            accuracy INTEGER NOT NULL,
            tackles INTEGER NOT NULL,
            block INTEGER NOT NULL,
            interceptions INTEGER NOT NULL,
            duels_total INTEGER NOT NULL,
            duels_won INTEGER NOT NULL,
            dribbles_total INTEGER NOT NULL,
            dribbles_won INTEGER NOT NULL,
            yellow INTEGER NOT NULL,
            red INTEGER NOT NULL,
            penalty_won INTEGER NOT NULL,
            penalty_committed INTEGER NOT NULL,
            penalty_scored INTEGER NOT NULL,
            penalty_missed INTEGER NOT NULL,
            penalty_saved INTEGER NOT NULL,
            saves INTEGER NOT NULL,
            PRIMARY KEY (player, season, team)
        );

        CREATE TABLE IF NOT EXISTS coaches (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS coach_careers (
            coach INTEGER NOT NULL,
            team INTEGER NOT NULL,
            "start" TEXT NOT NULL,
            "end" TEXT NULL,
            PRIMARY KEY (coach, team, "start")
        );

        CREATE TABLE IF NOT EXISTS fixtures (
            id INTEGER PRIMARY KEY,
            league INTEGER NOT NULL,
            round INTEGER NOT NULL,
            referee TEXT NOT NULL,
            timezone TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            venue INTEGER NOT NULL,
            season INTEGER NOT NULL,
            home_team INTEGER NOT NULL,
            away_team INTEGER NOT NULL,
            home_goals INTEGER NOT NULL,
            away_goals INTEGER NOT NULL,
            home_goals_half INTEGER NOT NULL,
            away_goals_half INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_fixtures_round ON fixtures(league, season, round);
        CREATE INDEX IF NOT EXISTS idx_fixtures_home ON fixtures(home_team, timestamp);
        CREATE INDEX IF NOT EXISTS idx_fixtures_away ON fixtures(away_team, timestamp);

        CREATE TABLE IF NOT EXISTS team_statistics (
            team INTEGER NOT NULL,
            fixture INTEGER NOT NULL,
            shots_total INTEGER NOT NULL,
            shots_on INTEGER NOT NULL,
            shots_off INTEGER NOT NULL,
            shots_blocked INTEGER NOT NULL,
            shots_box INTEGER NOT NULL,
            shots_outside INTEGER NOT NULL,
            offsides INTEGER NOT NULL,
            fouls INTEGER NOT NULL,
            corners INTEGER NOT NULL,
            possession INTEGER NOT NULL,
            yellow INTEGER NOT NULL,
            red INTEGER NOT NULL,
            gk_saves INTEGER NOT NULL,
            passes_total INTEGER NOT NULL,
            passes_accurate INTEGER NOT NULL,
            passes_percent INTEGER NOT NULL,
            expected_goals REAL NOT NULL,
            PRIMARY KEY (team, fixture)
        );

        CREATE TABLE IF NOT EXISTS formations (
            fixture INTEGER NOT NULL,
            team INTEGER NOT NULL,
            formation TEXT NOT NULL,
            player1 INTEGER NOT NULL,
            player2 INTEGER NOT NULL,
            player3 INTEGER NOT NULL,
            player4 INTEGER NOT NULL,
            player5 INTEGER NOT NULL,
            player6 INTEGER NOT NULL,
            player7 INTEGER NOT NULL,
            player8 INTEGER NOT NULL,
            player9 INTEGER NOT NULL,
            player10 INTEGER NOT NULL,
            player11 INTEGER NOT NULL,
            sub1 INTEGER NULL,
            sub2 INTEGER NULL,
            sub3 INTEGER NULL,
            sub4 INTEGER NULL,
            sub5 INTEGER NULL,
            coach INTEGER NOT NULL,
            PRIMARY KEY (fixture, team)
        );

        CREATE TABLE IF NOT EXISTS player_statistics (
            player INTEGER NOT NULL,
            fixture INTEGER NOT NULL,
            team INTEGER NOT NULL,
            league INTEGER NOT NULL,
            season INTEGER NOT NULL,
            minutes INTEGER NOT NULL,
            position TEXT NOT NULL,
            rating REAL NOT NULL,
            captain INTEGER NOT NULL,
            substitute INTEGER NOT NULL,
            shots_total INTEGER NOT NULL,
            shots_on INTEGER NOT NULL,
            goals_scored INTEGER NOT NULL,
            goals_assisted INTEGER NOT NULL,
            passes_total INTEGER NOT NULL,
            passes_key INTEGER NOT NULL,
            accuracy INTEGER NOT NULL,
            tackles INTEGER NOT NULL,
            block INTEGER NOT NULL,
            interceptions INTEGER NOT NULL,
            duels_total INTEGER NOT NULL,
            duels_won INTEGER NOT NULL,
            dribbles_total INTEGER NOT NULL,
            dribbles_won INTEGER NOT NULL,
            yellow INTEGER NOT NULL,
            red INTEGER NOT NULL,
            penalty_won INTEGER NOT NULL,
            penalty_committed INTEGER NOT NULL,
            penalty_scored INTEGER NOT NULL,
            penalty_missed INTEGER NOT NULL,
            penalty_saved INTEGER NOT NULL,
            saves INTEGER NOT NULL,
            PRIMARY KEY (player, fixture),
            FOREIGN KEY (player, team, season) REFERENCES players(id, team, season)
        );
        CREATE INDEX IF NOT EXISTS idx_player_statistics_fixture ON player_statistics(fixture);

        CREATE TABLE IF NOT EXISTS rounds (
            league INTEGER NOT NULL,
            season INTEGER NOT NULL,
            round INTEGER NOT NULL,
            "start" INTEGER NOT NULL,
            "end" INTEGER NOT NULL,
            PRIMARY KEY (league, season, round)
        );

        CREATE TABLE IF NOT EXISTS results (
            team INTEGER NOT NULL,
            league INTEGER NOT NULL,
            season INTEGER NOT NULL,
            round INTEGER NOT NULL,
            points INTEGER NOT NULL,
            goals_for INTEGER NOT NULL,
            goals_against INTEGER NOT NULL,
            modus INTEGER NOT NULL,
            elapsed INTEGER NOT NULL,
            PRIMARY KEY (team, league, season, round)
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

pub(crate) fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}
