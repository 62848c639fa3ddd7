//! 行動：型別、產生器與合法性檢查

use crate::{GameState, Pos, movement_assist_possible, movement_range, other_team};
use serde::{Deserialize, Serialize};
use skills_lib::{AssistType, COMBAT_STATS, GameData};
use std::fmt;

/// 一個行動；兩個行動相等只看位置（from/to/target）
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Move { from: Pos, to: Pos },
    Attack { from: Pos, to: Pos, target: Pos },
    Assist { from: Pos, to: Pos, target: Pos },
    Block { from: Pos, to: Pos, target: Pos },
    EndTurn,
}

impl Action {
    pub fn from(&self) -> Option<Pos> {
        match self {
            Action::Move { from, .. }
            | Action::Attack { from, .. }
            | Action::Assist { from, .. }
            | Action::Block { from, .. } => Some(*from),
            Action::EndTurn => None,
        }
    }

    pub fn to(&self) -> Option<Pos> {
        match self {
            Action::Move { to, .. }
            | Action::Attack { to, .. }
            | Action::Assist { to, .. }
            | Action::Block { to, .. } => Some(*to),
            Action::EndTurn => None,
        }
    }

    pub fn target(&self) -> Option<Pos> {
        match self {
            Action::Attack { target, .. }
            | Action::Assist { target, .. }
            | Action::Block { target, .. } => Some(*target),
            Action::Move { .. } | Action::EndTurn => None,
        }
    }

    pub fn is_end_turn(&self) -> bool {
        matches!(self, Action::EndTurn)
    }

    pub fn is_attack(&self) -> bool {
        matches!(self, Action::Attack { .. })
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        self.from() == other.from() && self.to() == other.to() && self.target() == other.target()
    }
}

impl Eq for Action {}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Move { from, to } => write!(f, "move {} -> {}", from, to),
            Action::Attack { from, to, target } => {
                write!(f, "attack {} -> {} @ {}", from, to, target)
            }
            Action::Assist { from, to, target } => {
                write!(f, "assist {} -> {} @ {}", from, to, target)
            }
            Action::Block { from, to, target } => {
                write!(f, "block {} -> {} @ {}", from, to, target)
            }
            Action::EndTurn => write!(f, "end turn"),
        }
    }
}

/// 單位所有合法行動；已行動的單位回傳空清單
///
/// 每個可到達的格子依序產生：移動、攻擊、輔助、攻擊障礙物
pub fn generate_actions(state: &GameState, data: &GameData, slot: usize) -> Vec<Action> {
    let unit = &state.units[slot];
    if !unit.has_action || !unit.alive {
        return Vec::new();
    }
    let mut actions = Vec::new();
    for tile in movement_range(state, data, slot, true) {
        actions.push(Action::Move {
            from: unit.pos,
            to: tile,
        });
        attack_actions(state, data, slot, tile, &mut actions);
        assist_actions(state, data, slot, tile, &mut actions);
        block_actions(state, data, slot, tile, &mut actions);
    }
    actions
}

/// 只產生攻擊行動
pub fn generate_ko_actions(state: &GameState, data: &GameData, slot: usize) -> Vec<Action> {
    let unit = &state.units[slot];
    if !unit.has_action || !unit.alive {
        return Vec::new();
    }
    let mut actions = Vec::new();
    for tile in movement_range(state, data, slot, true) {
        attack_actions(state, data, slot, tile, &mut actions);
    }
    actions
}

/// 只產生會打碎障礙物的攻擊（耐久剩 1）
pub fn generate_block_breaks(state: &GameState, data: &GameData, slot: usize) -> Vec<Action> {
    let unit = &state.units[slot];
    if !unit.has_action || !unit.alive || !state.blocks.iter().any(|b| b.breakable && b.hp == 1) {
        return Vec::new();
    }
    let mut actions = Vec::new();
    for tile in movement_range(state, data, slot, true) {
        block_actions(state, data, slot, tile, &mut actions);
    }
    actions.retain(|action| {
        action
            .target()
            .and_then(|target| state.block_at(target))
            .is_some_and(|index| state.blocks[index].hp == 1)
    });
    actions
}

fn attack_actions(
    state: &GameState,
    data: &GameData,
    slot: usize,
    tile: Pos,
    actions: &mut Vec<Action>,
) {
    let unit = &state.units[slot];
    let Some(range) = unit.attack_range(data) else {
        return;
    };
    for foe in state.team_units(other_team(unit.team)) {
        if tile.manhattan(foe.pos) == range {
            actions.push(Action::Attack {
                from: unit.pos,
                to: tile,
                target: foe.pos,
            });
        }
    }
}

fn block_actions(
    state: &GameState,
    data: &GameData,
    slot: usize,
    tile: Pos,
    actions: &mut Vec<Action>,
) {
    let unit = &state.units[slot];
    let Some(range) = unit.attack_range(data) else {
        return;
    };
    for block in &state.blocks {
        if block.breakable && block.hp > 0 && tile.manhattan(block.pos) == range {
            actions.push(Action::Block {
                from: unit.pos,
                to: tile,
                target: block.pos,
            });
        }
    }
}

fn assist_actions(
    state: &GameState,
    data: &GameData,
    slot: usize,
    tile: Pos,
    actions: &mut Vec<Action>,
) {
    let unit = &state.units[slot];
    let Some(assist) = unit.assist(data) else {
        return;
    };
    let Some(assist_type) = assist.assist_type else {
        return;
    };
    let range = assist.range.unwrap_or(1);

    for &ally_slot in &state.teams[unit.team] {
        if ally_slot == slot {
            continue;
        }
        let ally = &state.units[ally_slot];
        if tile.manhattan(ally.pos) != range {
            continue;
        }
        let eligible = match assist_type {
            AssistType::Movement => assist.movement_assist.is_some_and(|kind| {
                movement_assist_possible(state, slot, tile, ally_slot, kind)
            }),
            AssistType::Refresh => {
                !ally.has_action
                    && !ally
                        .assist(data)
                        .is_some_and(|a| a.is_assist_type(AssistType::Refresh))
            }
            // set_hp 把 hp 夾在 max_hp 以內，這裡等同「未滿血」
            AssistType::Heal => ally.stats.hp < ally.max_hp,
            AssistType::Rally => assist
                .rally_buffs
                .iter()
                .any(|buff| ally.buffs[buff.stat] < buff.value),
            AssistType::Sacrifice => {
                ally.stats.hp < ally.max_hp
                    && !assist.amount.is_some_and(|amount| unit.stats.hp <= amount)
            }
            AssistType::ReciprocalAid => {
                let unit_gain = ally.stats.hp.min(unit.max_hp) - unit.stats.hp;
                let ally_gain = unit.stats.hp.min(ally.max_hp) - ally.stats.hp;
                unit_gain > 0 || ally_gain > 0
            }
            AssistType::HarshCommand => COMBAT_STATS.iter().any(|stat| ally.debuffs[*stat] > 0),
        };
        if eligible {
            actions.push(Action::Assist {
                from: unit.pos,
                to: tile,
                target: ally.pos,
            });
        }
    }
}

/// 行動是否出現在行動單位的產生器結果中
pub fn is_valid_action(state: &GameState, data: &GameData, action: &Action) -> bool {
    let Some(from) = action.from() else {
        return true;
    };
    let Some(slot) = state.unit_at(from) else {
        return false;
    };
    if state.units[slot].team != state.current_turn {
        return false;
    }
    generate_actions(state, data, slot).contains(action)
}
