use std::fs;
use std::path::PathBuf;

use assert_float_eq::*;
use football_ingest::decode;
use football_ingest::model::{Envelope, StatValue};
use football_ingest::normalize::{
    FormationColumns, derive_results, formation_columns, normalize_team_statistics,
    player_stat_line, round_number,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn envelope(name: &str) -> Envelope {
    serde_json::from_str(&read_fixture(name)).expect("fixture should parse")
}

#[test]
fn decodes_fixture_detail() {
    let env = envelope("fixture_detail.json");
    assert_eq!(env.soft_error(), None);
    let fixtures = decode::fixtures(&env.response);
    assert_eq!(fixtures.len(), 1);

    let fd = &fixtures[0];
    assert_eq!(fd.id(), 1035);
    assert_eq!(fd.fixture.venue.id, 556);
    assert_eq!(fd.score.halftime.home, 1);
    assert_eq!(fd.score.extratime.home, 0);
    assert_eq!(fd.lineups.len(), 2);
    assert_eq!(fd.lineups[0].start_xi.len(), 11);
    assert_eq!(fd.lineups[1].substitutes.len(), 2);
    assert_eq!(fd.players[0].players.len(), 3);
    assert_eq!(
        fd.statistics[0].statistics[9].value,
        StatValue::Text("55%".to_string())
    );
    assert_eq!(fd.statistics[0].statistics[8].value, StatValue::Missing);
}

#[test]
fn fixture_detail_normalizes() {
    let env = envelope("fixture_detail.json");
    let fd = decode::fixtures(&env.response).remove(0);

    let (round, anomaly) = round_number(&fd.league.round);
    assert_eq!(round, 4);
    assert!(anomaly.is_none());

    let home = normalize_team_statistics(&fd.statistics[0].statistics);
    assert_eq!(home.stats.possession, 55);
    assert_eq!(home.stats.passes_percent, 86);
    assert_eq!(home.stats.offsides, 0);
    assert_float_absolute_eq!(home.stats.expected_goals, 1.87);
    assert!(home.anomalies.is_empty());
    assert_eq!(home.ignored, vec!["goals_prevented".to_string()]);

    let away = normalize_team_statistics(&fd.statistics[1].statistics);
    assert_eq!(away.stats.possession, 45);
    assert_eq!(away.stats.passes_percent, 0);
    assert_eq!(away.anomalies.len(), 1);

    let (h, a) = derive_results(&fd).expect("finished fixture has results");
    assert_eq!((h.points, a.points), (3, 0));
    assert_eq!((h.goals_for, h.goals_against), (2, 1));
    assert_eq!(h.elapsed, 90);

    match formation_columns(&fd.lineups[0]) {
        FormationColumns::Row(line) => {
            assert_eq!(line.column_count(), 19);
            assert_eq!(line.coach, 19);
            assert_eq!(line.starters[0], 101);
        }
        FormationColumns::Skipped(reason) => panic!("home formation skipped: {reason}"),
    }
    assert!(matches!(
        formation_columns(&fd.lineups[1]),
        FormationColumns::Skipped(_)
    ));
}

#[test]
fn player_lines_default_bad_ratings() {
    let env = envelope("fixture_detail.json");
    let fd = decode::fixtures(&env.response).remove(0);

    let captain = &fd.players[0].players[1];
    let (line, anomalies) = player_stat_line(&captain.statistics[0]);
    assert!(anomalies.is_empty());
    assert!(line.captain);
    assert_float_absolute_eq!(line.rating, 8.1);
    assert_eq!(line.goals_scored, 1);
    assert_eq!(line.passes_key, 4);
    assert_eq!(line.accuracy, 35);

    let unused_sub = &fd.players[1].players[1];
    let (line, anomalies) = player_stat_line(&unused_sub.statistics[0]);
    assert_float_absolute_eq!(line.rating, 0.0);
    assert_eq!(anomalies.len(), 1);
    assert!(line.substitute);
}

#[test]
fn fixture_list_skips_malformed_records() {
    let env = envelope("fixtures_list.json");
    let fixtures = decode::fixtures(&env.response);
    assert_eq!(fixtures.len(), 3);

    let draw = derive_results(&fixtures[1]).expect("draw has results");
    assert_eq!((draw.0.points, draw.1.points), (1, 1));

    assert!(!fixtures[2].has_started());
    assert!(derive_results(&fixtures[2]).is_none());
    assert_eq!(fixtures[2].goals.home, 0);
}

#[test]
fn decodes_player_profile() {
    let env = envelope("player_profile.json");
    let players = decode::players(&env.response);
    assert_eq!(players.len(), 1);

    let profile = &players[0];
    assert_eq!(profile.player.lastname, "Diallo Traoré");
    assert_eq!(profile.player.birth.place, "Abidjan");

    let block = profile
        .statistics_for_team(33)
        .expect("united block present");
    let (line, anomalies) = player_stat_line(block);
    assert!(anomalies.is_empty());
    assert_eq!(line.games, 9);
    assert_eq!(line.lineups, 3);
    assert_eq!(line.accuracy, 81);
    assert_float_absolute_eq!(line.rating, 6.942857);

    let other = profile.statistics_for_team(1126).expect("loan block present");
    let (line, _) = player_stat_line(other);
    assert_eq!(line.accuracy, 23);
    assert_eq!(line.tackles, 0);

    let fallback = profile.statistics_for_team(7).expect("falls back to first");
    assert_eq!(fallback.team.id, 1126);
}

#[test]
fn decodes_league_coverage() {
    let env = envelope("league.json");
    let leagues = decode::leagues(&env.response);
    assert_eq!(leagues.len(), 1);

    let league = &leagues[0];
    assert_eq!(league.league.kind, "League");
    assert_eq!(league.country.name, "England");
    assert_eq!(league.seasons.len(), 2);
    assert!(league.seasons[0].coverage.players);
    assert!(!league.seasons[1].coverage.players);
    assert!(league.seasons[1].coverage.has_fixtures());
    assert!(league.seasons[1].current);
}

#[test]
fn decodes_coach_careers() {
    let env = envelope("coaches.json");
    let coaches = decode::coaches(&env.response);
    assert_eq!(coaches.len(), 1);
    assert_eq!(coaches[0].career.len(), 3);
    assert_eq!(coaches[0].career[0].end, "");
    assert_eq!(coaches[0].career[1].team.id, 194);
}

#[test]
fn soft_errors_surface_from_object() {
    let env = envelope("soft_error.json");
    assert_eq!(
        env.soft_error().as_deref(),
        Some("season: The Season field is required.")
    );
    assert!(decode::teams(&env.response).is_empty());
}
