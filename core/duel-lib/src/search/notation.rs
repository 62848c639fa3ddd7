//! 行動的簡寫與主要變例

use super::table::TranspositionTable;
use crate::{Action, GameState, execute_action, is_valid_action};
use skills_lib::GameData;

/// `ET` 表示結束回合，否則為 `英雄:位移[→目標]`
///
/// 位移依序寫出上下左右的格數，原地為 `0`；目標是障礙物時寫 `Block`
pub fn move_string(state: &GameState, action: &Action) -> String {
    let (Some(from), Some(to)) = (action.from(), action.to()) else {
        return "ET".to_string();
    };
    let hero = state
        .unit_at(from)
        .map_or("?", |slot| state.unit(slot).hero.as_str());

    let mut movement = String::new();
    if to.y < from.y {
        movement += &format!("{}U", from.y - to.y);
    }
    if to.y > from.y {
        movement += &format!("{}D", to.y - from.y);
    }
    if to.x < from.x {
        movement += &format!("{}L", from.x - to.x);
    }
    if to.x > from.x {
        movement += &format!("{}R", to.x - from.x);
    }
    if movement.is_empty() {
        movement.push('0');
    }

    let mut text = format!("{}:{}", hero, movement);
    if let Some(target) = action.target() {
        if matches!(action, Action::Block { .. }) {
            text += "→Block";
        } else if let Some(slot) = state.unit_at(target) {
            text += &format!("→{}", state.unit(slot).hero);
        }
    }
    text
}

/// 沿著置換表的最佳行動走出主要變例，最多 depth 步
pub fn pv_line(
    table: &TranspositionTable,
    state: &GameState,
    data: &GameData,
    depth: u32,
) -> Vec<String> {
    let mut board = state.clone();
    let mut line = Vec::new();
    while line.len() < depth as usize && !board.is_game_over() {
        let Some(action) = table.best_move(board.hash()) else {
            break;
        };
        if !is_valid_action(&board, data, &action) {
            break;
        }
        line.push(move_string(&board, &action));
        execute_action(&mut board, data, &action);
    }
    line
}
