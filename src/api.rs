use anyhow::Context;
use reqwest::blocking::Client;
use tracing::debug;

use crate::config::Config;
use crate::decode;
use crate::error::ApiError;
use crate::http_client::http_client;
use crate::model::{Coach, Envelope, Fixture, LeagueEntry, PlayerProfile, Squad, TeamVenue};

/// One upstream resource, rendered as a path plus query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    League { id: i64 },
    Teams { league: i64, season: i64 },
    PlayersPage { league: i64, season: i64, page: i64 },
    Player { id: i64, season: i64 },
    Squad { team: i64 },
    Coaches { team: i64 },
    Fixtures { league: i64, season: i64 },
    FixtureDetail { id: i64 },
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::League { .. } => "/leagues",
            Endpoint::Teams { .. } => "/teams",
            Endpoint::PlayersPage { .. } | Endpoint::Player { .. } => "/players",
            Endpoint::Squad { .. } => "/players/squads",
            Endpoint::Coaches { .. } => "/coachs",
            Endpoint::Fixtures { .. } | Endpoint::FixtureDetail { .. } => "/fixtures",
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        match *self {
            Endpoint::League { id } => vec![("id", id.to_string())],
            Endpoint::Teams { league, season } | Endpoint::Fixtures { league, season } => vec![
                ("league", league.to_string()),
                ("season", season.to_string()),
            ],
            Endpoint::PlayersPage {
                league,
                season,
                page,
            } => vec![
                ("league", league.to_string()),
                ("season", season.to_string()),
                ("page", page.to_string()),
            ],
            Endpoint::Player { id, season } => {
                vec![("id", id.to_string()), ("season", season.to_string())]
            }
            Endpoint::Squad { team } | Endpoint::Coaches { team } => {
                vec![("team", team.to_string())]
            }
            Endpoint::FixtureDetail { id } => vec![("id", id.to_string())],
        }
    }
}

/// One page of `/players`.
#[derive(Debug, Clone, Default)]
pub struct PlayersPage {
    pub players: Vec<PlayerProfile>,
    pub current: i64,
    pub total: i64,
}

/// Everything the ingestion passes need from upstream. Implemented by
/// [`ApiClient`] and by in-memory fakes in tests.
pub trait FootballApi {
    fn league(&self, id: i64) -> Result<Option<LeagueEntry>, ApiError>;
    fn teams(&self, league: i64, season: i64) -> Result<Vec<TeamVenue>, ApiError>;
    fn players_page(&self, league: i64, season: i64, page: i64) -> Result<PlayersPage, ApiError>;
    fn player(&self, id: i64, season: i64) -> Result<Option<PlayerProfile>, ApiError>;
    fn squad(&self, team: i64) -> Result<Option<Squad>, ApiError>;
    fn coaches(&self, team: i64) -> Result<Vec<Coach>, ApiError>;
    fn fixtures(&self, league: i64, season: i64) -> Result<Vec<Fixture>, ApiError>;
    fn fixture_detail(&self, id: i64) -> Result<Option<Fixture>, ApiError>;
}

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let key = config.require_api_key()?;
        let client = http_client(key, &config.api_host, config.request_timeout)
            .context("build api-football http client")?;
        Ok(Self::with_client(client, &config.api_base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Issues one GET. Non-2xx statuses and unparseable bodies are errors; an
    /// embedded `errors` field is left for the caller to inspect.
    pub fn get(&self, endpoint: Endpoint) -> Result<Envelope, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        let query = endpoint.query();
        debug!(url = %url, ?query, "api request");

        let resp = self.client.get(&url).query(&query).send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }
        Ok(serde_json::from_str::<Envelope>(body.trim())?)
    }

    fn response(&self, endpoint: Endpoint) -> Result<Envelope, ApiError> {
        let envelope = self.get(endpoint)?;
        if let Some(err) = envelope.soft_error() {
            return Err(ApiError::Upstream(err));
        }
        Ok(envelope)
    }
}

fn first<T>(items: Vec<T>) -> Option<T> {
    items.into_iter().next()
}

impl FootballApi for ApiClient {
    fn league(&self, id: i64) -> Result<Option<LeagueEntry>, ApiError> {
        let env = self.response(Endpoint::League { id })?;
        Ok(first(decode::leagues(&env.response)))
    }

    fn teams(&self, league: i64, season: i64) -> Result<Vec<TeamVenue>, ApiError> {
        let env = self.response(Endpoint::Teams { league, season })?;
        Ok(decode::teams(&env.response))
    }

    fn players_page(&self, league: i64, season: i64, page: i64) -> Result<PlayersPage, ApiError> {
        let env = self.response(Endpoint::PlayersPage {
            league,
            season,
            page,
        })?;
        Ok(PlayersPage {
            players: decode::players(&env.response),
            current: env.paging.current,
            total: env.paging.total,
        })
    }

    fn player(&self, id: i64, season: i64) -> Result<Option<PlayerProfile>, ApiError> {
        let env = self.response(Endpoint::Player { id, season })?;
        Ok(first(decode::players(&env.response)))
    }

    fn squad(&self, team: i64) -> Result<Option<Squad>, ApiError> {
        let env = self.response(Endpoint::Squad { team })?;
        Ok(first(decode::squads(&env.response)))
    }

    fn coaches(&self, team: i64) -> Result<Vec<Coach>, ApiError> {
        let env = self.response(Endpoint::Coaches { team })?;
        Ok(decode::coaches(&env.response))
    }

    fn fixtures(&self, league: i64, season: i64) -> Result<Vec<Fixture>, ApiError> {
        let env = self.response(Endpoint::Fixtures { league, season })?;
        Ok(decode::fixtures(&env.response))
    }

    fn fixture_detail(&self, id: i64) -> Result<Option<Fixture>, ApiError> {
        let env = self.response(Endpoint::FixtureDetail { id })?;
        Ok(first(decode::fixtures(&env.response)))
    }
}
