//! 回合流程：佔領計分、交換階段、投降、一般模式輪替

mod common;

use common::{build, data, map, new_game, snapshot, started_game};
use duel_lib::{
    Action, ActionError, DuelResult, ErrorKind, Mode, Pos, Rect, apply_action, end_swap_phase,
    enter_swap_phase, surrender, swap_starting_positions,
};

fn striker() -> duel_lib::Build {
    build("STRIKER", &["PRACTICE_SWORD"])
}

#[test]
fn test_capture_scoring() {
    // (第 0 隊人數, 第 1 隊人數, 第 0 隊得分, 第 1 隊得分)
    // 佔領區是左邊兩行，需要多出兩人才得分
    let test_data = [
        (
            r#"
1 1 . . 2
. . . . .
            "#,
            2,
            0,
        ),
        (
            r#"
1 1 . . .
2 . . . .
            "#,
            0,
            0,
        ),
        (
            r#"
1 . . . 2
2 . . . .
            "#,
            0,
            0,
        ),
        (
            r#"
. . . . 1
2 2 . . .
            "#,
            0,
            2,
        ),
    ];

    let data = data();
    for (idx, (ascii, score0, score1)) in test_data.iter().enumerate() {
        let (mut board, _) = map(ascii);
        board.capture_area = Rect {
            x: 0,
            y: 0,
            w: 2,
            h: 2,
        };
        let team0 = vec![striker(); board.starting_positions[0].len()];
        let team1 = vec![build("WALL", &[]); board.starting_positions[1].len()];
        let mut state = started_game(&data, board, &team0, &team1, Mode::Duel);

        let first = state.current_turn();
        apply_action(&mut state, &data, &Action::EndTurn).expect("first end turn");
        assert_ne!(state.current_turn(), first, "Case {}", idx);
        apply_action(&mut state, &data, &Action::EndTurn).expect("second end turn");

        let duel = state.duel().expect("duel state");
        assert_eq!(duel.teams[0].capture_score, *score0, "Case {}", idx);
        assert_eq!(duel.teams[1].capture_score, *score1, "Case {}", idx);
        assert_eq!(state.turn_count(), 2, "Case {}", idx);
        assert!(!state.is_game_over(), "Case {}", idx);
    }
}

#[test]
fn test_final_ko_closes_round_before_game_over() {
    let data = data();
    let (mut board, _) = map(
        r#"
1 2 . .
1 . . .
        "#,
    );
    board.capture_area = Rect {
        x: 0,
        y: 0,
        w: 2,
        h: 2,
    };
    let mut state = started_game(
        &data,
        board,
        &[build("ALFONSE", &["SILVER_SWORD_PLUS"]), striker()],
        &[build("WALL", &[])],
        Mode::Duel,
    );

    // 讓第 1 隊先結束回合，第 0 隊的最後一個行動擊倒最後的敵人
    if state.current_turn() == 1 {
        apply_action(&mut state, &data, &Action::EndTurn).expect("foe ends");
    }
    let wait = Action::Move {
        from: Pos::new(0, 1),
        to: Pos::new(0, 1),
    };
    apply_action(&mut state, &data, &wait).expect("wait");
    if state.current_turn() == 1 {
        apply_action(&mut state, &data, &Action::EndTurn).expect("foe ends");
    }
    assert_eq!(state.current_turn(), 0);
    assert_eq!(state.turn_count(), 1);

    let attack = Action::Attack {
        from: Pos::new(0, 0),
        to: Pos::new(0, 0),
        target: Pos::new(1, 0),
    };
    apply_action(&mut state, &data, &attack).expect("final attack");

    // 回合先結算（佔領計分、進入下一回合），之後才判定勝負
    assert!(state.is_game_over());
    assert_eq!(state.turn_count(), 2);
    let duel = state.duel().expect("duel state");
    assert_eq!(duel.teams[0].ko_score, 4);
    assert_eq!(duel.teams[0].capture_score, 2);
    assert_eq!(duel.teams[1].capture_score, 0);
    assert_eq!(duel.teams[0].result, Some(DuelResult::Win));
    assert_eq!(duel.teams[1].result, Some(DuelResult::Lose));
}

#[test]
fn test_duel_ends_after_last_round() {
    let data = data();
    let (mut board, _) = map(
        r#"
1 1 . . 2
. . . . .
        "#,
    );
    board.capture_area = Rect {
        x: 0,
        y: 0,
        w: 2,
        h: 2,
    };
    let mut state = started_game(
        &data,
        board,
        &[striker(), striker()],
        &[build("WALL", &[])],
        Mode::Duel,
    );
    let rounds = state.rules().rounds;
    for _ in 0..rounds * 2 {
        apply_action(&mut state, &data, &Action::EndTurn).expect("end turn");
    }
    assert!(state.is_game_over());
    let duel = state.duel().expect("duel state");
    assert_eq!(duel.teams[0].capture_score, 2 * rounds);
    assert_eq!(duel.teams[0].result, Some(DuelResult::Win));
    assert_eq!(duel.teams[1].result, Some(DuelResult::Lose));

    let err = apply_action(&mut state, &data, &Action::EndTurn).expect_err("game over");
    assert!(matches!(
        err.kind(),
        ErrorKind::Action(ActionError::GameOver)
    ));
}

#[test]
fn test_duel_alternates_after_each_action() {
    let data = data();
    let (board, _) = map(
        r#"
1 1 . .
. . . .
. . 2 2
        "#,
    );
    let mut state = started_game(
        &data,
        board,
        &[striker(), striker()],
        &[build("WALL", &[]), build("WALL", &[])],
        Mode::Duel,
    );
    assert_eq!(state.current_turn(), 0);
    let budget = state.rules().actions_per_round;

    let action = Action::Move {
        from: Pos::new(0, 0),
        to: Pos::new(0, 1),
    };
    apply_action(&mut state, &data, &action).expect("move");
    assert_eq!(state.current_turn(), 1);
    assert_eq!(
        state.duel().expect("duel").teams[0].actions_remaining,
        budget - 1
    );

    // 輪到對方時不能動自己的單位
    let err = apply_action(
        &mut state,
        &data,
        &Action::Move {
            from: Pos::new(1, 0),
            to: Pos::new(1, 1),
        },
    )
    .expect_err("not our turn");
    assert!(matches!(
        err.kind(),
        ErrorKind::Action(ActionError::NotYourTurn { .. })
    ));
}

#[test]
fn test_rejected_actions_leave_state_unchanged() {
    let data = data();
    let (board, _) = map(
        r#"
1 . . . .
. . . . .
. . . . 2
        "#,
    );
    let mut state = started_game(
        &data,
        board,
        &[striker()],
        &[build("WALL", &[])],
        Mode::Duel,
    );
    let before = snapshot(&state);
    let hash = state.hash();

    let test_data = [
        (
            Action::Move {
                from: Pos::new(2, 2),
                to: Pos::new(2, 1),
            },
            "no unit",
        ),
        (
            Action::Move {
                from: Pos::new(0, 0),
                to: Pos::new(4, 0),
            },
            "illegal",
        ),
        (
            Action::Attack {
                from: Pos::new(0, 0),
                to: Pos::new(0, 1),
                target: Pos::new(0, 2),
            },
            "invalid target",
        ),
        (
            Action::Block {
                from: Pos::new(0, 0),
                to: Pos::new(0, 1),
                target: Pos::new(1, 1),
            },
            "no block",
        ),
    ];
    for (idx, (action, name)) in test_data.iter().enumerate() {
        let err = apply_action(&mut state, &data, action).expect_err(name);
        let expected = match *name {
            "no unit" => matches!(err.kind(), ErrorKind::Action(ActionError::NoUnitAtPos { .. })),
            "illegal" => matches!(err.kind(), ErrorKind::Action(ActionError::Illegal { .. })),
            "invalid target" => {
                matches!(err.kind(), ErrorKind::Action(ActionError::InvalidTarget { .. }))
            }
            _ => matches!(err.kind(), ErrorKind::Action(ActionError::NoBlockAtPos { .. })),
        };
        assert!(expected, "Case {}: {}", idx, err);
        assert_eq!(snapshot(&state), before, "Case {}", idx);
        assert_eq!(state.hash(), hash, "Case {}", idx);
    }
}

#[test]
fn test_swap_phase() {
    let data = data();
    let (board, _) = map(
        r#"
1 1 . .
. . . .
. . 2 2
        "#,
    );
    let mut state = new_game(
        &data,
        board,
        &[striker(), build("WALL", &[])],
        &[build("WALL", &[])],
        Mode::Duel,
    );
    assert!(state.is_swap_phase());

    let err = apply_action(&mut state, &data, &Action::EndTurn).expect_err("swap phase");
    assert!(matches!(err.kind(), ErrorKind::Action(ActionError::SwapPhase)));

    // 兩個單位互換
    let (a, b) = (Pos::new(0, 0), Pos::new(1, 0));
    let striker_slot = state.unit_at(a).expect("striker");
    swap_starting_positions(&mut state, a, b).expect("swap");
    assert_eq!(state.unit(striker_slot).pos, b);

    // 只能在同一隊的起始位置之間交換
    swap_starting_positions(&mut state, b, Pos::new(3, 2)).expect_err("other team's slot");
    let err = swap_starting_positions(&mut state, a, Pos::new(2, 1)).expect_err("not a slot");
    assert!(matches!(
        err.kind(),
        ErrorKind::Action(ActionError::InvalidSwap { .. })
    ));

    end_swap_phase(&mut state, &data).expect("end swap phase");
    assert!(!state.is_swap_phase());
    let err = swap_starting_positions(&mut state, a, b).expect_err("not in swap phase");
    assert!(matches!(
        err.kind(),
        ErrorKind::Action(ActionError::NotInSwapPhase)
    ));
    let err = enter_swap_phase(&mut state).expect_err("duel has no swap phase");
    assert!(matches!(
        err.kind(),
        ErrorKind::Action(ActionError::DuelSwapPhase)
    ));
}

#[test]
fn test_regular_mode_restores_roster() {
    let data = data();
    let (board, _) = map(
        r#"
1 . . .
. . . .
. . . 2
        "#,
    );
    let mut state = started_game(
        &data,
        board,
        &[striker()],
        &[build("WALL", &[])],
        Mode::Regular,
    );
    let slot = state.team(0)[0];
    apply_action(
        &mut state,
        &data,
        &Action::Move {
            from: Pos::new(0, 0),
            to: Pos::new(1, 1),
        },
    )
    .expect("move");
    // 一般模式：全隊行動完才換邊
    assert_eq!(state.current_turn(), 1);
    assert_eq!(state.unit(slot).pos, Pos::new(1, 1));

    enter_swap_phase(&mut state).expect("enter swap phase");
    assert!(state.is_swap_phase());
    assert_eq!(state.unit(slot).pos, Pos::new(0, 0));
}

#[test]
fn test_regular_mode_turn_count() {
    let data = data();
    let (board, _) = map(
        r#"
1 . . .
. . . 2
        "#,
    );
    let mut state = started_game(
        &data,
        board,
        &[striker()],
        &[build("WALL", &[])],
        Mode::Regular,
    );
    assert_eq!((state.current_turn(), state.turn_count()), (0, 1));
    apply_action(&mut state, &data, &Action::EndTurn).expect("end turn");
    assert_eq!((state.current_turn(), state.turn_count()), (1, 1));
    apply_action(&mut state, &data, &Action::EndTurn).expect("end turn");
    assert_eq!((state.current_turn(), state.turn_count()), (0, 2));
    assert!(state.team_units(0).all(|unit| unit.has_action));
}

#[test]
fn test_surrender() {
    let data = data();
    let (board, _) = map(
        r#"
1 . . .
. . . 2
        "#,
    );
    let mut state = started_game(
        &data,
        board,
        &[striker()],
        &[build("WALL", &[])],
        Mode::Duel,
    );
    let before = snapshot(&state);
    let log = surrender(&mut state, 1).expect("surrender");
    assert!(state.is_game_over());
    let duel = state.duel().expect("duel");
    assert!(duel.teams[1].surrendered);
    assert_eq!(duel.teams[0].result, Some(DuelResult::Win));
    assert_eq!(duel.teams[1].result, Some(DuelResult::Lose));
    surrender(&mut state, 0).expect_err("already over");

    state.undo(log);
    assert!(!state.is_game_over());
    assert_eq!(snapshot(&state), before);
}
