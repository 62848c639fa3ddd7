//! 輔助技能：位移、治療、再行動

mod common;

use common::{build, data, map, started_game};
use duel_lib::{Action, GameState, Mode, Pos, apply_action, heal_amount};
use skills_lib::GameData;

/// 以序列化修改單位 hp，再重建 hash
fn with_hp(state: &GameState, data: &GameData, slot: usize, hp: i32) -> GameState {
    let mut value = serde_json::to_value(state).expect("serialize state");
    value["units"][slot]["stats"]["hp"] = serde_json::json!(hp);
    let mut state: GameState = serde_json::from_value(value).expect("deserialize state");
    state.rehydrate(data);
    state
}

#[test]
fn test_movement_assists() {
    // (技能, 使用者落點, 目標落點)；使用者在 (2,1)，目標在正下方 (2,2)
    let test_data = [
        ("SWAP", Pos::new(2, 2), Pos::new(2, 1)),
        ("SHOVE", Pos::new(2, 1), Pos::new(2, 3)),
        ("SMITE", Pos::new(2, 1), Pos::new(2, 4)),
        ("DRAW_BACK", Pos::new(2, 0), Pos::new(2, 1)),
        ("REPOSITION", Pos::new(2, 1), Pos::new(2, 0)),
        ("PIVOT", Pos::new(2, 3), Pos::new(2, 2)),
        ("HIT_AND_RUN", Pos::new(2, 0), Pos::new(2, 2)),
    ];

    let data = data();
    for (idx, (skill, user_dest, target_dest)) in test_data.iter().enumerate() {
        let (board, _) = map(
            r#"
. . . . .
. . 1 . .
. . 1 . .
. . . . .
2 . . . .
            "#,
        );
        let mut state = started_game(
            &data,
            board,
            &[
                build("STRIKER", &["PRACTICE_SWORD", *skill]),
                build("WALL", &[]),
            ],
            &[build("WALL", &[])],
            Mode::Duel,
        );
        let (user, target) = (state.team(0)[0], state.team(0)[1]);
        let action = Action::Assist {
            from: Pos::new(2, 1),
            to: Pos::new(2, 1),
            target: Pos::new(2, 2),
        };
        apply_action(&mut state, &data, &action).expect(skill);
        assert_eq!(state.unit(user).pos, *user_dest, "Case {}", idx);
        assert_eq!(state.unit(target).pos, *target_dest, "Case {}", idx);
        assert!(!state.unit(user).has_action, "Case {}", idx);
    }
}

#[test]
fn test_shove_needs_free_landing() {
    let data = data();
    let (board, _) = map(
        r#"
. 1 . .
. 1 . .
. # . 2
        "#,
    );
    let state = started_game(
        &data,
        board,
        &[
            build("STRIKER", &["PRACTICE_SWORD", "SHOVE"]),
            build("WALL", &[]),
        ],
        &[build("WALL", &[])],
        Mode::Duel,
    );
    let action = Action::Assist {
        from: Pos::new(1, 0),
        to: Pos::new(1, 0),
        target: Pos::new(1, 1),
    };
    assert!(!duel_lib::is_valid_action(&state, &data, &action));
}

#[test]
fn test_heal() {
    let data = data();
    let (board, _) = map(
        r#"
1 . 1 .
. . . .
. . . 2
        "#,
    );
    let state = started_game(
        &data,
        board,
        &[
            build("AZAMA", &["ABSORB_PLUS", "PHYSIC_PLUS"]),
            build("STRIKER", &["PRACTICE_SWORD"]),
        ],
        &[build("WALL", &[])],
        Mode::Duel,
    );
    let (healer, patient) = (state.team(0)[0], state.team(0)[1]);
    let mut state = with_hp(&state, &data, patient, 10);

    let physic = data
        .skill("PHYSIC_PLUS")
        .and_then(|skill| skill.heal.as_ref())
        .expect("physic heal");
    let amount = heal_amount(state.unit(healer), state.unit(patient), physic);
    assert!(amount >= 8);

    let action = Action::Assist {
        from: Pos::new(0, 0),
        to: Pos::new(0, 0),
        target: Pos::new(2, 0),
    };
    apply_action(&mut state, &data, &action).expect("heal");
    let expected = (10 + amount).min(state.unit(patient).max_hp);
    assert_eq!(state.unit(patient).stats.hp, expected);
    assert_eq!(state.hash(), state.compute_hash());
}

#[test]
fn test_heal_requires_injury() {
    let data = data();
    let (board, _) = map(
        r#"
1 . 1 .
. . . 2
        "#,
    );
    let state = started_game(
        &data,
        board,
        &[
            build("AZAMA", &["ABSORB_PLUS", "PHYSIC_PLUS"]),
            build("STRIKER", &["PRACTICE_SWORD"]),
        ],
        &[build("WALL", &[])],
        Mode::Duel,
    );
    let action = Action::Assist {
        from: Pos::new(0, 0),
        to: Pos::new(0, 0),
        target: Pos::new(2, 0),
    };
    assert!(!duel_lib::is_valid_action(&state, &data, &action));
}

#[test]
fn test_dance_refreshes_ally() {
    let data = data();
    let (board, _) = map(
        r#"
1 1 . .
. . . .
. . . 2
        "#,
    );
    let mut state = started_game(
        &data,
        board,
        &[
            build("STRIKER", &["PRACTICE_SWORD"]),
            build("OLIVIA", &["SILVER_SWORD_PLUS", "DANCE"]),
        ],
        &[build("WALL", &[])],
        Mode::Duel,
    );
    let (striker, olivia) = (state.team(0)[0], state.team(0)[1]);

    apply_action(
        &mut state,
        &data,
        &Action::Move {
            from: Pos::new(0, 0),
            to: Pos::new(0, 1),
        },
    )
    .expect("move");
    assert!(!state.unit(striker).has_action);
    // 對方結束後剩下的行動都屬於第 0 隊
    apply_action(&mut state, &data, &Action::EndTurn).expect("foe ends turn");
    assert_eq!(state.current_turn(), 0);

    let dance = Action::Assist {
        from: Pos::new(1, 0),
        to: Pos::new(1, 1),
        target: Pos::new(0, 1),
    };
    apply_action(&mut state, &data, &dance).expect("dance");
    assert!(state.unit(striker).has_action);
    assert!(!state.unit(olivia).has_action);
    assert_eq!(state.current_turn(), 0);
}
