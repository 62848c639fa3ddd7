//! 評估與搜尋的整合測試

mod common;

use common::{build, data, map, new_game, snapshot, started_game};
use duel_lib::search::{
    SearchRequest, WIN, evaluate, evaluate_for, handle_request, search,
};
use duel_lib::{
    Action, ErrorKind, EvalWeights, GameState, Mode, SearchConfig, SearchError, apply_action,
    is_valid_action,
};
use skills_lib::GameData;

fn config() -> SearchConfig {
    SearchConfig {
        time_budget_ms: 60_000,
        table_size: 1 << 14,
        ..Default::default()
    }
}

fn skirmish(data: &GameData) -> GameState {
    let (board, _) = map(
        r#"
1 . . . .
1 . B . .
. . . T .
. . . . 2
. . . 2 .
        "#,
    );
    started_game(
        data,
        board,
        &[
            build("ALFONSE", &["FOLKVANGR", "SWAP"]),
            build("STRIKER", &["PRACTICE_SWORD"]),
        ],
        &[
            build("SHARENA", &["SILVER_LANCE_PLUS"]),
            build("WALL", &[]),
        ],
        Mode::Duel,
    )
}

#[test]
fn test_evaluation_is_antisymmetric() {
    let data = data();
    let mut state = skirmish(&data);
    let weights = EvalWeights::default();

    let moves = [
        Action::Move {
            from: duel_lib::Pos::new(0, 0),
            to: duel_lib::Pos::new(1, 1),
        },
        Action::Move {
            from: duel_lib::Pos::new(4, 3),
            to: duel_lib::Pos::new(3, 3),
        },
        Action::EndTurn,
    ];
    for (idx, action) in moves.iter().enumerate() {
        let own = evaluate_for(&state, 0, &weights);
        let foe = evaluate_for(&state, 1, &weights);
        assert_eq!(own, -foe, "Case {}", idx);
        assert_eq!(
            evaluate(&state, &weights),
            evaluate_for(&state, state.current_turn(), &weights),
            "Case {}",
            idx
        );
        apply_action(&mut state, &data, action).expect("apply");
    }
}

#[test]
fn test_search_returns_legal_move_and_keeps_state() {
    let data = data();
    let state = skirmish(&data);
    let before = snapshot(&state);
    let hash = state.hash();

    let outcome = search(&state, &data, &config(), 2).expect("search");
    let best = outcome.best.expect("best move");
    assert!(is_valid_action(&state, &data, &best), "{}", best);
    assert_eq!(outcome.depth, 2);
    assert!(outcome.stats.nodes > 0);
    assert!(!outcome.pv.is_empty());

    assert_eq!(snapshot(&state), before);
    assert_eq!(state.hash(), hash);
}

#[test]
fn test_search_finds_winning_attack() {
    let data = data();
    let (board, _) = map(
        r#"
1 . . .
. . 2 .
. . . .
        "#,
    );
    // 35 傷害追擊兩次，一擊結束遊戲
    let state = started_game(
        &data,
        board,
        &[build("ALFONSE", &["SILVER_SWORD_PLUS"])],
        &[build("WALL", &[])],
        Mode::Duel,
    );
    let outcome = search(&state, &data, &config(), 2).expect("search");
    let best = outcome.best.expect("best move");
    assert!(best.is_attack(), "{}", best);
    assert!(outcome.score >= WIN - 2, "score {}", outcome.score);
}

#[test]
fn test_search_rejects_unsupported_states() {
    let data = data();
    let (board, _) = map(
        r#"
1 . .
. . 2
        "#,
    );
    let regular = started_game(
        &data,
        board.clone(),
        &[build("STRIKER", &["PRACTICE_SWORD"])],
        &[build("WALL", &[])],
        Mode::Regular,
    );
    let err = search(&regular, &data, &config(), 1).expect_err("regular mode");
    assert!(matches!(
        err.kind(),
        ErrorKind::Search(SearchError::UnsupportedMode)
    ));

    let swapping = new_game(
        &data,
        board,
        &[build("STRIKER", &["PRACTICE_SWORD"])],
        &[build("WALL", &[])],
        Mode::Duel,
    );
    let err = search(&swapping, &data, &config(), 1).expect_err("swap phase");
    assert!(matches!(err.kind(), ErrorKind::Search(SearchError::SwapPhase)));
}

#[test]
fn test_handle_json_request() {
    let data = data();
    let state = skirmish(&data);
    let request = SearchRequest {
        game_state: state,
        depth: 1,
    };
    let json = serde_json::to_string(&request).expect("serialize request");
    assert!(json.contains("\"gameState\""));

    let request: SearchRequest = serde_json::from_str(&json).expect("parse request");
    let response = handle_request(request, &data, &config()).expect("search");
    assert!(response.best.is_some());

    let json = serde_json::to_string(&response).expect("serialize response");
    assert!(json.contains("\"best\"") && json.contains("\"score\""));
}
