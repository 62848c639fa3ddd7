//! 靜態評估

use crate::{EvalWeights, GameState, TeamID, other_team};

/// 以 team 的角度評估局面；兩隊的評估互為相反數
///
/// - 擊倒與佔領分差乘上 score
/// - 每個單位離佔領區越近越好
/// - 每個單位依剩餘 hp 比例加分
pub fn evaluate_for(state: &GameState, team: TeamID, weights: &EvalWeights) -> i32 {
    let mut score = 0;
    if let Some(duel) = state.duel() {
        let [own, foe] = [&duel.teams[team], &duel.teams[other_team(team)]];
        score += (own.total_score() as i32 - foe.total_score() as i32) * weights.score;
    }
    let area = state.capture_area();
    for side in [team, other_team(team)] {
        let sign = if side == team { 1 } else { -1 };
        for unit in state.team_units(side) {
            let mut value = 0;
            if let Some(area) = area {
                value += weights.capture_bonus - area.distance(unit.pos) * weights.distance_factor;
            }
            if unit.max_hp > 0 {
                value += (unit.stats.hp * weights.hp).div_euclid(unit.max_hp);
            }
            score += sign * value;
        }
    }
    score
}

/// 以目前行動方的角度評估
pub fn evaluate(state: &GameState, weights: &EvalWeights) -> i32 {
    evaluate_for(state, state.current_turn(), weights)
}
