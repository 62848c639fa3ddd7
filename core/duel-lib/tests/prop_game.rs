//! 隨機合法行動序列上的性質：undo、增量 hash、評估對稱、行動產生

mod common;

use common::{build, data, map, snapshot, started_game};
use duel_lib::search::evaluate_for;
use duel_lib::{Action, EvalWeights, GameState, Mode, apply_action, generate_actions};
use proptest::prelude::*;
use skills_lib::GameData;
use std::sync::LazyLock;

static DATA: LazyLock<GameData> = LazyLock::new(data);

/// 有輔助、奧義、障礙物與森林的小型決鬥局
fn skirmish() -> GameState {
    let (board, _) = map(
        r#"
1 . . T . .
1 . B2 . . .
. . . . # .
. T . . . .
. . . B . 2
. . . . 2 2
        "#,
    );
    started_game(
        &DATA,
        board,
        &[
            build("ALFONSE", &["FOLKVANGR", "SWAP", "MOONBOW"]),
            build("AZAMA", &["ABSORB_PLUS", "PHYSIC_PLUS"]),
        ],
        &[
            build("SHARENA", &["SILVER_LANCE_PLUS", "REPOSITION", "LUNA"]),
            build("OLIVIA", &["SILVER_SWORD_PLUS", "DANCE"]),
            build("ANNA", &["SILVER_AXE_PLUS", "DEATH_BLOW_3"]),
        ],
        Mode::Duel,
    )
}

fn legal_actions(state: &GameState) -> Vec<Action> {
    let mut actions: Vec<Action> = state
        .team(state.current_turn())
        .iter()
        .flat_map(|slot| generate_actions(state, &DATA, *slot))
        .collect();
    actions.push(Action::EndTurn);
    actions
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// 任意合法行動序列：每一步的增量 hash 等於重新計算的 hash，
    /// 反向 undo 後狀態與 hash 逐步回到原樣
    #[test]
    fn prop_undo_restores_state(choices in prop::collection::vec(any::<usize>(), 1..24)) {
        let mut state = skirmish();
        let mut trail = Vec::new();

        for choice in choices {
            if state.is_game_over() {
                break;
            }
            let actions = legal_actions(&state);
            let action = actions[choice % actions.len()];
            let before = (snapshot(&state), state.hash());
            let log = apply_action(&mut state, &DATA, &action)
                .map_err(|err| TestCaseError::fail(format!("{}: {}", action, err)))?;
            prop_assert_eq!(state.hash(), state.compute_hash(), "after {}", action);
            trail.push((before, log));
        }

        while let Some(((json, hash), log)) = trail.pop() {
            state.undo(log);
            prop_assert_eq!(state.hash(), hash);
            prop_assert_eq!(snapshot(&state), json);
        }
    }

    /// 產生出來的行動一定能通過驗證
    #[test]
    fn prop_generated_actions_are_accepted(choices in prop::collection::vec(any::<usize>(), 0..12)) {
        let mut state = skirmish();
        for choice in choices {
            if state.is_game_over() {
                break;
            }
            let actions = legal_actions(&state);
            let action = actions[choice % actions.len()];
            prop_assert!(duel_lib::is_valid_action(&state, &DATA, &action));
            prop_assert!(apply_action(&mut state, &DATA, &action).is_ok());
        }
    }

    /// 兩隊的評估互為相反數
    #[test]
    fn prop_evaluation_antisymmetric(
        choices in prop::collection::vec(any::<usize>(), 0..16),
        capture_bonus in 0i32..50,
        distance_factor in 0i32..10,
    ) {
        let weights = EvalWeights {
            capture_bonus,
            distance_factor,
            ..Default::default()
        };
        let mut state = skirmish();
        for choice in choices {
            prop_assert_eq!(
                evaluate_for(&state, 0, &weights),
                -evaluate_for(&state, 1, &weights)
            );
            if state.is_game_over() {
                break;
            }
            let actions = legal_actions(&state);
            let action = actions[choice % actions.len()];
            apply_action(&mut state, &DATA, &action)
                .map_err(|err| TestCaseError::fail(err.to_string()))?;
        }
    }

    /// 已行動或已死亡的單位沒有任何行動
    #[test]
    fn prop_spent_units_have_no_actions(choices in prop::collection::vec(any::<usize>(), 0..16)) {
        let mut state = skirmish();
        for choice in choices {
            for slot in 0..state.units().len() {
                let unit = state.unit(slot);
                if !unit.has_action || !unit.alive {
                    prop_assert!(generate_actions(&state, &DATA, slot).is_empty());
                }
            }
            if state.is_game_over() {
                break;
            }
            let actions = legal_actions(&state);
            let action = actions[choice % actions.len()];
            apply_action(&mut state, &DATA, &action)
                .map_err(|err| TestCaseError::fail(err.to_string()))?;
        }
    }
}
