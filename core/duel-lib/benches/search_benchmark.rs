//! 搜尋的基準測試：固定深度、不受時間限制

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use duel_lib::search::search;
use duel_lib::{
    Build, GameState, Mode, SearchConfig, end_swap_phase, generate_actions, load_map_from_ascii,
};
use skills_lib::GameData;

const MAP: &str = r#"
. . . . . . . .
. 1 . T . . 2 .
. 1 . . B2 . 2 .
. . # . . T . .
. 1 . . . . 2 .
. . . . . . . .
"#;

fn build(hero: &str, skills: &[&str]) -> Build {
    Build {
        hero: hero.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn skirmish(data: &GameData) -> GameState {
    let (map, _) = load_map_from_ascii(MAP).expect("map");
    let mut state = GameState::new_game(
        data,
        map,
        [
            &[
                build("ALFONSE", &["FOLKVANGR", "SWAP", "MOONBOW"]),
                build("AZAMA", &["ABSORB_PLUS", "PHYSIC_PLUS"]),
                build("TAKUMI", &["SILVER_BOW_PLUS"]),
            ],
            &[
                build("SHARENA", &["SILVER_LANCE_PLUS", "REPOSITION", "LUNA"]),
                build("OLIVIA", &["SILVER_SWORD_PLUS", "DANCE"]),
                build("ANNA", &["SILVER_AXE_PLUS", "DEATH_BLOW_3"]),
            ],
        ],
        Mode::Duel,
    )
    .expect("state");
    end_swap_phase(&mut state, data).expect("end swap phase");
    state
}

fn bench_search(c: &mut Criterion) {
    let data = GameData::builtin().expect("builtin data");
    let state = skirmish(&data);
    let config = SearchConfig {
        time_budget_ms: u64::MAX / 2,
        table_size: 1 << 16,
        ..Default::default()
    };

    let mut group = c.benchmark_group("search");
    group.sample_size(10);
    for depth in [1, 2] {
        group.bench_function(format!("depth_{depth}"), |b| {
            b.iter(|| {
                let outcome = search(black_box(&state), &data, &config, depth).expect("search");
                black_box(outcome)
            });
        });
    }
    group.finish();
}

fn bench_generate(c: &mut Criterion) {
    let data = GameData::builtin().expect("builtin data");
    let state = skirmish(&data);

    c.bench_function("generate_actions", |b| {
        b.iter(|| {
            let count: usize = state
                .team(0)
                .iter()
                .map(|slot| generate_actions(black_box(&state), &data, *slot).len())
                .sum();
            black_box(count)
        });
    });
}

criterion_group!(benches, bench_search, bench_generate);
criterion_main!(benches);
