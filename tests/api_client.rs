use std::fs;
use std::path::PathBuf;

use mockito::{Matcher, Mock, ServerGuard};

use football_ingest::api::{ApiClient, FootballApi};
use football_ingest::error::ApiError;
use football_ingest::http_client::http_client;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn client(server: &ServerGuard) -> ApiClient {
    let http = http_client("test-key", "api-football-v1.p.rapidapi.com", None).unwrap();
    ApiClient::with_client(http, &format!("{}/", server.url()))
}

fn mock_get(server: &mut ServerGuard, path: &str, query: Vec<(&str, &str)>, body: &str) -> Mock {
    let query = query
        .into_iter()
        .map(|(k, v)| Matcher::UrlEncoded(k.into(), v.into()))
        .collect();
    server
        .mock("GET", path)
        .match_header("x-rapidapi-key", "test-key")
        .match_header("x-rapidapi-host", "api-football-v1.p.rapidapi.com")
        .match_query(Matcher::AllOf(query))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create()
}

#[test]
fn fetches_fixture_detail_with_auth_headers() {
    let mut server = mockito::Server::new();
    let mock = mock_get(
        &mut server,
        "/fixtures",
        vec![("id", "1035")],
        &read_fixture("fixture_detail.json"),
    );

    let detail = client(&server)
        .fixture_detail(1035)
        .unwrap()
        .expect("fixture returned");
    mock.assert();
    assert_eq!(detail.id(), 1035);
    assert_eq!(detail.lineups.len(), 2);
}

#[test]
fn players_page_carries_paging() {
    let mut server = mockito::Server::new();
    let mock = mock_get(
        &mut server,
        "/players",
        vec![("league", "39"), ("season", "2023"), ("page", "1")],
        &read_fixture("player_profile.json"),
    );

    let page = client(&server).players_page(39, 2023, 1).unwrap();
    mock.assert();
    assert_eq!(page.players.len(), 1);
    assert_eq!((page.current, page.total), (1, 1));
}

#[test]
fn coaches_hit_the_upstream_spelling() {
    let mut server = mockito::Server::new();
    let mock = mock_get(
        &mut server,
        "/coachs",
        vec![("team", "33")],
        &read_fixture("coaches.json"),
    );

    let coaches = client(&server).coaches(33).unwrap();
    mock.assert();
    assert_eq!(coaches[0].name, "E. ten Hag");
}

#[test]
fn soft_error_in_body_is_an_error() {
    let mut server = mockito::Server::new();
    let _mock = mock_get(
        &mut server,
        "/teams",
        vec![("league", "39"), ("season", "2023")],
        &read_fixture("soft_error.json"),
    );

    let err = client(&server).teams(39, 2023).unwrap_err();
    match err {
        ApiError::Upstream(msg) => assert!(msg.contains("Season field is required")),
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[test]
fn raw_get_keeps_soft_errors_for_the_caller() {
    let mut server = mockito::Server::new();
    let _mock = mock_get(
        &mut server,
        "/teams",
        vec![("league", "39"), ("season", "2023")],
        &read_fixture("soft_error.json"),
    );

    let env = client(&server)
        .get(football_ingest::api::Endpoint::Teams {
            league: 39,
            season: 2023,
        })
        .unwrap();
    assert!(env.soft_error().is_some());
    assert_eq!(env.results, 0);
}

#[test]
fn non_success_status_keeps_body() {
    let mut server = mockito::Server::new();
    let _mock = server
        .mock("GET", "/leagues")
        .match_query(Matcher::UrlEncoded("id".into(), "39".into()))
        .with_status(429)
        .with_body("Too many requests")
        .create();

    let err = client(&server).league(39).unwrap_err();
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status.as_u16(), 429);
            assert_eq!(body, "Too many requests");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn empty_response_is_none() {
    let mut server = mockito::Server::new();
    let _mock = mock_get(
        &mut server,
        "/players/squads",
        vec![("team", "33")],
        r#"{"get":"players/squads","parameters":{"team":"33"},"errors":[],"results":0,"paging":{"current":1,"total":1},"response":[]}"#,
    );

    assert!(client(&server).squad(33).unwrap().is_none());
}

#[test]
fn rejects_unprintable_key() {
    let err = http_client("bad\nkey", "host", None).unwrap_err();
    assert!(matches!(err, ApiError::InvalidHeader(_)));
}
