//! 可移動範圍與行動產生測試

mod common;

use common::{build, data, map, started_game};
use duel_lib::{
    Action, Mode, Pos, apply_action, generate_actions, movement_range, threat_range,
};

#[test]
fn test_movement_range() {
    // I：必須可到達；O：必須不可到達
    let test_data = [
        (
            // 三步步兵：森林多花一步，右邊第三格到不了
            r#"
. . . . . . . . .
. . . . . . . . .
. I . . 1 T I O .
. . . . . . . . 2
            "#,
            build("STRIKER", &["PRACTICE_SWORD", "STRIDE"]),
        ),
        (
            // 牆擋住直線，繞路超過兩步
            r#"
I . # .
. 1 # O
. . . .
. . . 2
            "#,
            build("STRIKER", &["PRACTICE_SWORD"]),
        ),
        (
            // 騎兵不能進入森林
            r#"
. . I . .
1 T O . .
. . . . .
. . . . 2
            "#,
            build("ELIWOOD", &[]),
        ),
        (
            // 未破壞的障礙物不能通過
            r#"
1 B O .
. # . .
. . . 2
            "#,
            build("STRIKER", &["PRACTICE_SWORD"]),
        ),
    ];

    let data = data();
    for (idx, (ascii, unit)) in test_data.iter().enumerate() {
        let (board, markers) = map(ascii);
        let state = started_game(
            &data,
            board,
            std::slice::from_ref(unit),
            &[build("WALL", &[])],
            Mode::Duel,
        );
        let slot = state.team(0)[0];
        let range = movement_range(&state, &data, slot, true);
        for pos in markers.get("I").into_iter().flatten() {
            assert!(range.contains(pos), "Case {}: {} 應可到達", idx, pos);
        }
        for pos in markers.get("O").into_iter().flatten() {
            assert!(!range.contains(pos), "Case {}: {} 不應可到達", idx, pos);
        }
        assert!(range.contains(&state.unit(slot).pos), "Case {}", idx);
    }
}

#[test]
fn test_foe_blocks_path() {
    let data = data();
    let (board, markers) = map(
        r#"
# . #
1 2 O
# . #
        "#,
    );
    let state = started_game(
        &data,
        board,
        &[build("STRIKER", &["PRACTICE_SWORD"])],
        &[build("WALL", &[])],
        Mode::Duel,
    );
    let slot = state.team(0)[0];
    let range = movement_range(&state, &data, slot, true);
    assert!(!range.contains(&markers["O"][0]));
    assert!(!range.contains(&Pos::new(1, 1)));
}

#[test]
fn test_threat_range() {
    let data = data();
    let (board, markers) = map(
        r#"
1 . . # O
. . I . O
. I . . 2
        "#,
    );
    let state = started_game(
        &data,
        board,
        &[build("STRIKER", &["PRACTICE_SWORD"])],
        &[build("WALL", &[])],
        Mode::Duel,
    );
    let slot = state.team(0)[0];
    let threat = threat_range(&state, &data, slot, true);
    for pos in &markers["I"] {
        assert!(threat.contains(pos), "{} 應在威脅範圍內", pos);
    }
    for pos in &markers["O"] {
        assert!(!threat.contains(pos), "{} 不應在威脅範圍內", pos);
    }
    // 牆不算
    assert!(!threat.contains(&Pos::new(3, 0)));
}

#[test]
fn test_no_actions_after_acting() {
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
        &[build("STRIKER", &["PRACTICE_SWORD"])],
        &[build("WALL", &[])],
        Mode::Duel,
    );
    let slot = state.team(0)[0];
    assert!(!generate_actions(&state, &data, slot).is_empty());

    let action = Action::Move {
        from: Pos::new(0, 0),
        to: Pos::new(1, 0),
    };
    apply_action(&mut state, &data, &action).expect("move");
    assert!(!state.unit(slot).has_action);
    assert!(generate_actions(&state, &data, slot).is_empty());
}
