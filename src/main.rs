use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};

use football_ingest::api::ApiClient;
use football_ingest::config::Config;
use football_ingest::ingest::{self, FixtureService};
use football_ingest::query::QueryService;
use football_ingest::store;

#[derive(Debug, clap::Parser, Clone)]
#[clap(about = "Ingest API-Football data into SQLite and query it")]
struct Args {
    /// SQLite database file; defaults to FOOTBALL_DB_PATH or the cache dir
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, Clone)]
enum Command {
    /// Full ingest of one or more leagues
    Ingest {
        #[clap(long = "league-ids", value_delimiter = ',', required = true)]
        league_ids: Vec<i64>,

        /// only walk these seasons
        #[clap(long, value_delimiter = ',')]
        seasons: Option<Vec<i64>>,
    },
    /// Re-fetch the latest finished round of a league season
    Update {
        #[clap(long)]
        league: i64,
        #[clap(long)]
        season: i64,
    },
    #[clap(subcommand)]
    Query(QueryCommand),
}

#[derive(Debug, Subcommand, Clone)]
enum QueryCommand {
    /// League with its seasons and coverage
    League {
        #[clap(long)]
        league: i64,
        #[clap(long)]
        season: Option<i64>,
    },
    /// Next round starting after a timestamp (default: now)
    Rounds {
        #[clap(long)]
        league: i64,
        #[clap(long)]
        season: i64,
        #[clap(long)]
        after: Option<i64>,
    },
    Players {
        #[clap(long)]
        team: i64,
        #[clap(long)]
        season: Option<i64>,
    },
    /// Players of a team with their season statistics
    PlayerStats {
        #[clap(long)]
        team: i64,
        #[clap(long)]
        season: Option<i64>,
    },
    Standings {
        #[clap(long)]
        league: i64,
        #[clap(long)]
        season: i64,
    },
    Fixtures {
        #[clap(long)]
        league: i64,
        #[clap(long)]
        season: i64,
        #[clap(long)]
        round: i64,
    },
    KeyPlayers {
        #[clap(long)]
        league: i64,
        #[clap(long)]
        season: i64,
        #[clap(long)]
        home: i64,
        #[clap(long)]
        away: i64,
        #[clap(long)]
        round: i64,
    },
    Matchups {
        #[clap(long)]
        team1: i64,
        #[clap(long)]
        team2: i64,
        #[clap(short = 'n', long, default_value_t = 5)]
        count: i64,
    },
    Last {
        #[clap(long)]
        team: i64,
        #[clap(short = 'n', long, default_value_t = 5)]
        count: i64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    debug!("args: {args:?}");
    let config = Config::from_env().context("reading configuration")?;
    let db_path = match args.db.clone() {
        Some(path) => path,
        None => config.require_db_path()?,
    };
    let conn = store::open_db(&db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;

    match args.command {
        Command::Ingest {
            league_ids,
            seasons,
        } => {
            let api = ApiClient::new(&config)?;
            let summary = ingest::ingest_leagues(&api, &conn, &league_ids, seasons.as_deref())?;
            for key in summary.failed_keys() {
                warn!("failed: {key}");
            }
            print_json(&summary)
        }
        Command::Update { league, season } => {
            let api = ApiClient::new(&config)?;
            let now = Utc::now().timestamp();
            let report = FixtureService::new(&api, &conn)
                .update_latest_round(league, season, now)
                .with_context(|| format!("updating league {league} season {season}"))?;
            let counts = report.counts();
            info!(league, season, stored = counts.stored, failed = counts.failed, "update finished");
            print_json(&report)
        }
        Command::Query(query) => run_query(&QueryService::new(&conn), query),
    }
}

fn run_query(service: &QueryService, query: QueryCommand) -> Result<()> {
    let now = Utc::now().timestamp();
    match query {
        QueryCommand::Rounds {
            league,
            season,
            after,
        } => print_json(&service.next_round(league, season, after.unwrap_or(now))?),
        QueryCommand::Players { team, season } => {
            print_json(&service.players_by_team(team, season)?)
        }
        QueryCommand::League { league, season } => print_json(&service.league(league, season)?),
        QueryCommand::PlayerStats { team, season } => {
            print_json(&service.player_statistics(team, season)?)
        }
        QueryCommand::Standings { league, season } => {
            print_json(&service.standings(league, season)?)
        }
        QueryCommand::Fixtures {
            league,
            season,
            round,
        } => print_json(&service.fixtures(league, season, round)?),
        QueryCommand::KeyPlayers {
            league,
            season,
            home,
            away,
            round,
        } => print_json(&service.key_players(league, season, home, away, round)?),
        QueryCommand::Matchups {
            team1,
            team2,
            count,
        } => print_json(&service.last_matchups(team1, team2, count)?),
        QueryCommand::Last { team, count } => print_json(&service.last_fixtures(team, count, now)?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
