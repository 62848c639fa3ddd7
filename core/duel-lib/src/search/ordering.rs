//! 行動排序：置換表行動、攻擊、殺手行動、輔助與障礙物、歷史分數

use crate::{Action, GameState, Pos};
use std::cmp::Reverse;

const TABLE_MOVE: i32 = 2000;
const ATTACK: i32 = 1000;
const FIRST_KILLER: i32 = 900;
const SECOND_KILLER: i32 = 800;
const SUPPORT: i32 = 700;
const END_TURN: i32 = 0;

/// 每層兩個殺手行動，以 (單位, 起點, 終點) 為鍵的歷史分數
#[derive(Debug, Clone)]
pub struct MoveOrdering {
    killers: Vec<[Option<Action>; 2]>,
    history: Vec<i32>,
    width: i32,
    area: usize,
}

impl MoveOrdering {
    pub fn new(state: &GameState, max_ply: usize) -> Self {
        let width = state.map().width();
        let area = (width * state.map().height()).max(0) as usize;
        Self {
            killers: vec![[None; 2]; max_ply.max(1)],
            history: vec![0; state.units().len() * area * area],
            width,
            area,
        }
    }

    fn ply_index(&self, ply: usize) -> usize {
        ply.min(self.killers.len() - 1)
    }

    fn tile(&self, pos: Pos) -> Option<usize> {
        let index = pos.y * self.width + pos.x;
        (pos.x >= 0 && pos.x < self.width && index >= 0 && (index as usize) < self.area)
            .then_some(index as usize)
    }

    fn history_index(&self, state: &GameState, action: &Action) -> Option<usize> {
        let (from, to) = (action.from()?, action.to()?);
        let slot = state.unit_at(from)?;
        Some((slot * self.area + self.tile(from)?) * self.area + self.tile(to)?)
    }

    pub fn killers(&self, ply: usize) -> [Option<Action>; 2] {
        self.killers[self.ply_index(ply)]
    }

    /// 造成截斷的非攻擊行動
    pub fn record_killer(&mut self, ply: usize, action: Action) {
        let index = self.ply_index(ply);
        let killers = &mut self.killers[index];
        if killers[0] != Some(action) {
            killers[1] = killers[0];
            killers[0] = Some(action);
        }
    }

    /// 提高 alpha 但沒有截斷的安靜行動累加 depth²
    pub fn record_history(&mut self, state: &GameState, action: &Action, depth: u32) {
        if let Some(index) = self.history_index(state, action) {
            let bonus = (depth * depth) as i32;
            self.history[index] = self.history[index].saturating_add(bonus);
        }
    }

    pub fn history_score(&self, state: &GameState, action: &Action) -> i32 {
        self.history_index(state, action)
            .map_or(0, |index| self.history[index])
    }

    fn score(&self, state: &GameState, action: &Action, hint: Option<Action>, ply: usize) -> i32 {
        let [first, second] = self.killers(ply);
        match action {
            _ if hint == Some(*action) => TABLE_MOVE,
            Action::Attack { .. } => ATTACK,
            _ if first == Some(*action) => FIRST_KILLER,
            _ if second == Some(*action) => SECOND_KILLER,
            Action::Assist { .. } | Action::Block { .. } => SUPPORT,
            Action::EndTurn => END_TURN,
            Action::Move { .. } => self.history_score(state, action),
        }
    }

    /// 穩定排序，分數高的在前
    pub fn order(&self, state: &GameState, moves: &mut [Action], hint: Option<Action>, ply: usize) {
        moves.sort_by_cached_key(|action| Reverse(self.score(state, action, hint, ply)));
    }
}
