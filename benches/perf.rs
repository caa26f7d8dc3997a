use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use football_ingest::decode;
use football_ingest::model::{Envelope, Fixture};
use football_ingest::normalize::{
    formation_columns, normalize_team_statistics, player_stat_line,
};
use football_ingest::store::{self, FixtureRepository};
use football_ingest::store::fixtures::FixtureRow;

fn sample_fixture() -> Fixture {
    let env: Envelope = serde_json::from_str(FIXTURE_DETAIL_JSON).expect("valid fixture json");
    decode::fixtures(&env.response).remove(0)
}

fn bench_fixture_decode(c: &mut Criterion) {
    c.bench_function("fixture_detail_decode", |b| {
        b.iter(|| {
            let env: Envelope = serde_json::from_str(black_box(FIXTURE_DETAIL_JSON)).unwrap();
            let fixtures = decode::fixtures(&env.response);
            black_box(fixtures.len());
        })
    });
}

fn bench_fixture_list_decode(c: &mut Criterion) {
    c.bench_function("fixture_list_decode", |b| {
        b.iter(|| {
            let env: Envelope = serde_json::from_str(black_box(FIXTURES_LIST_JSON)).unwrap();
            black_box(decode::fixtures(&env.response).len());
        })
    });
}

fn bench_team_statistics(c: &mut Criterion) {
    let fixture = sample_fixture();
    c.bench_function("team_statistics_normalize", |b| {
        b.iter(|| {
            for block in &fixture.statistics {
                let out = normalize_team_statistics(black_box(&block.statistics));
                black_box(out.stats.possession);
            }
        })
    });
}

fn bench_player_lines(c: &mut Criterion) {
    let fixture = sample_fixture();
    c.bench_function("player_lines_normalize", |b| {
        b.iter(|| {
            for team in &fixture.players {
                for line in &team.players {
                    if let Some(block) = line.statistics.first() {
                        black_box(player_stat_line(black_box(block)));
                    }
                }
            }
            for lineup in &fixture.lineups {
                black_box(formation_columns(lineup));
            }
        })
    });
}

fn bench_round_select(c: &mut Criterion) {
    let conn = store::open_in_memory().expect("in-memory db");
    let repo = FixtureRepository::new(&conn);
    for id in 0..380 {
        let row = FixtureRow {
            id,
            league: 39,
            round: id / 10 + 1,
            referee: String::new(),
            timezone: "UTC".to_string(),
            timestamp: 1_690_000_000 + id * 3_600,
            venue: 556,
            season: 2023,
            home_team: 30 + id % 20,
            away_team: 30 + (id + 7) % 20,
            home_goals: id % 4,
            away_goals: id % 3,
            home_goals_half: 0,
            away_goals_half: 0,
        };
        repo.insert(&row).expect("insert fixture");
    }
    c.bench_function("fixtures_by_round", |b| {
        b.iter(|| {
            let rows = repo.by_round(39, 2023, black_box(17)).unwrap();
            black_box(rows.len());
        })
    });
}

criterion_group!(
    perf,
    bench_fixture_decode,
    bench_fixture_list_decode,
    bench_team_statistics,
    bench_player_lines,
    bench_round_select
);
criterion_main!(perf);

static FIXTURE_DETAIL_JSON: &str = include_str!("../tests/fixtures/fixture_detail.json");
static FIXTURES_LIST_JSON: &str = include_str!("../tests/fixtures/fixtures_list.json");
