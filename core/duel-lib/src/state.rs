//! 遊戲狀態：單位 arena、兩隊的 slot 列表、回合計數與決鬥狀態
//!
//! 狀態只能透過 step.rs 的原語修改；每個原語都會記錄反向操作並同步更新 hash。

use crate::error::{LoadError, Result};
use crate::{
    Action, Build, DuelRules, Map, Pos, Rect, Step, TEAM_COUNT, TeamID, Unit, UnitID,
    ZobristTable,
};
use serde::{Deserialize, Serialize};
use skills_lib::GameData;
use std::fmt;
use std::sync::Arc;
use strum_macros::{Display, EnumString};
use tracing::debug;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Display, EnumString, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Mode {
    Regular,
    Duel,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DuelResult {
    Win,
    Lose,
    Draw,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TeamDuelState {
    pub captain: UnitID,
    pub actions_remaining: u32,
    pub ended_turn: bool,
    pub surrendered: bool,
    pub ko_score: u32,
    pub capture_score: u32,
    pub result: Option<DuelResult>,
}

impl TeamDuelState {
    pub fn total_score(&self) -> u32 {
        self.ko_score + self.capture_score
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DuelState {
    pub teams: [TeamDuelState; TEAM_COUNT],
    pub capture_area: Rect,
    /// 上一輪先手的隊伍，剩餘行動數相同時沿用
    pub last_starting_team: TeamID,
}

/// 交換階段結束時的陣容快照，一般模式回到交換階段時還原
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Roster {
    pub units: Vec<Unit>,
    pub teams: [Vec<usize>; TEAM_COUNT],
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameState {
    pub(crate) mode: Mode,
    #[serde(default)]
    pub(crate) rules: DuelRules,
    pub(crate) map: Arc<Map>,
    /// 障礙物的即時耐久，與 map.blocks 同順序
    pub(crate) blocks: Vec<crate::Block>,
    /// 單位 arena；死亡的單位留在原 slot 並標記 alive = false
    pub(crate) units: Vec<Unit>,
    pub(crate) teams: [Vec<usize>; TEAM_COUNT],
    pub(crate) current_turn: TeamID,
    pub(crate) turn_count: u32,
    pub(crate) is_swap_phase: bool,
    pub(crate) history: Vec<Action>,
    pub(crate) game_over: bool,
    pub(crate) duel: Option<DuelState>,
    #[serde(default)]
    pub(crate) initial_roster: Option<Roster>,
    #[serde(skip)]
    pub(crate) zobrist: Option<Arc<ZobristTable>>,
    #[serde(skip)]
    pub(crate) hash: u64,
    #[serde(skip)]
    pub(crate) journal: Vec<Step>,
}

impl GameState {
    /// 以預設決鬥規則開新局
    pub fn new_game(
        data: &GameData,
        map: Map,
        builds: [&[Build]; TEAM_COUNT],
        mode: Mode,
    ) -> Result<GameState> {
        Self::new_game_with_rules(data, map, builds, mode, DuelRules::default())
    }

    pub fn new_game_with_rules(
        data: &GameData,
        map: Map,
        builds: [&[Build]; TEAM_COUNT],
        mode: Mode,
        rules: DuelRules,
    ) -> Result<GameState> {
        let mut units = Vec::new();
        let mut teams: [Vec<usize>; TEAM_COUNT] = Default::default();
        for (team, team_builds) in builds.iter().enumerate() {
            let slots = &map.starting_positions[team];
            if team_builds.len() > slots.len() {
                return Err(LoadError::NotEnoughStartingPositions {
                    team,
                    needed: team_builds.len(),
                    available: slots.len(),
                }
                .into());
            }
            for (i, build) in team_builds.iter().enumerate() {
                let id = (team as UnitID + 1) * 100 + i as UnitID + 1;
                let unit = Unit::from_build(data, build, id, team, slots[i])?;
                teams[team].push(units.len());
                units.push(unit);
            }
        }

        let duel = match mode {
            Mode::Duel => {
                let team_state = |team: usize| TeamDuelState {
                    captain: teams[team].first().map_or(0, |slot| units[*slot].id),
                    actions_remaining: rules.actions_per_round,
                    ended_turn: false,
                    surrendered: false,
                    ko_score: 0,
                    capture_score: 0,
                    result: None,
                };
                Some(DuelState {
                    teams: [team_state(0), team_state(1)],
                    capture_area: map.capture_area,
                    last_starting_team: 0,
                })
            }
            Mode::Regular => None,
        };

        let mut state = GameState {
            mode,
            rules,
            blocks: map.blocks.clone(),
            map: Arc::new(map),
            units,
            teams,
            current_turn: 0,
            turn_count: 1,
            is_swap_phase: true,
            history: Vec::new(),
            game_over: false,
            duel,
            initial_roster: None,
            zobrist: None,
            hash: 0,
            journal: Vec::new(),
        };
        state.rehydrate(data);
        debug!(
            "新對局 {}：{} 對 {}",
            state.mode,
            state.teams[0].len(),
            state.teams[1].len()
        );
        Ok(state)
    }

    /// 反序列化後重建 Zobrist 表與 hash；表由固定種子產生，結果可重現
    pub fn rehydrate(&mut self, data: &GameData) {
        self.journal.clear();
        self.zobrist = match self.mode {
            Mode::Duel => Some(Arc::new(ZobristTable::new(
                &self.map,
                &self.units,
                data,
                &self.rules,
            ))),
            Mode::Regular => None,
        };
        self.hash = self.compute_hash();
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn rules(&self) -> &DuelRules {
        &self.rules
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn blocks(&self) -> &[crate::Block] {
        &self.blocks
    }

    /// 整個 arena，包含已死亡的單位
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, slot: usize) -> &Unit {
        &self.units[slot]
    }

    pub fn team(&self, team: TeamID) -> &[usize] {
        &self.teams[team]
    }

    pub fn team_units(&self, team: TeamID) -> impl Iterator<Item = &Unit> + '_ {
        self.teams[team].iter().map(|slot| &self.units[*slot])
    }

    /// 兩隊存活單位的 slot，第 0 隊在前
    pub fn living_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.teams.iter().flat_map(|team| team.iter().copied())
    }

    pub fn slot_of(&self, id: UnitID) -> Option<usize> {
        self.units.iter().position(|unit| unit.id == id)
    }

    /// 該位置上的存活單位
    pub fn unit_at(&self, pos: Pos) -> Option<usize> {
        self.living_slots().find(|slot| self.units[*slot].pos == pos)
    }

    pub fn is_occupied(&self, pos: Pos, except: Option<usize>) -> bool {
        self.living_slots()
            .any(|slot| Some(slot) != except && self.units[slot].pos == pos)
    }

    pub fn block_at(&self, pos: Pos) -> Option<usize> {
        self.blocks.iter().position(|block| block.pos == pos)
    }

    /// 該位置有仍然擋路的障礙物
    pub fn has_standing_block(&self, pos: Pos) -> bool {
        self.blocks
            .iter()
            .any(|block| block.pos == pos && block.is_standing())
    }

    pub fn current_turn(&self) -> TeamID {
        self.current_turn
    }

    pub fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub fn is_swap_phase(&self) -> bool {
        self.is_swap_phase
    }

    pub fn history(&self) -> &[Action] {
        &self.history
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn duel(&self) -> Option<&DuelState> {
        self.duel.as_ref()
    }

    pub fn capture_area(&self) -> Option<Rect> {
        self.duel.as_ref().map(|duel| duel.capture_area)
    }

    /// 決鬥模式的增量 hash；一般模式恆為 0
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// 從頭計算 hash，用來驗證增量 hash
    pub fn compute_hash(&self) -> u64 {
        let Some(z) = &self.zobrist else {
            return 0;
        };
        let mut hash = 0;
        for (slot, unit) in self.units.iter().enumerate() {
            hash ^= z.pos(slot, unit.pos);
            hash ^= z.hp(slot, unit.stats.hp);
            if let Some(special) = unit.special {
                hash ^= z.special(slot, special.current);
            }
            if unit.has_action {
                hash ^= z.has_action(slot);
            }
            if unit.alive {
                hash ^= z.alive(slot);
            }
            for stat in skills_lib::COMBAT_STATS {
                hash ^= z.buff(slot, stat, unit.buffs[stat]);
                hash ^= z.debuff(slot, stat, unit.debuffs[stat]);
            }
            for bonus in &unit.bonuses {
                hash ^= z.bonus(slot, bonus);
            }
            for penalty in &unit.penalties {
                hash ^= z.penalty(slot, penalty);
            }
        }
        for (index, block) in self.blocks.iter().enumerate() {
            hash ^= z.block(index, block.hp);
        }
        if self.current_turn == 1 {
            hash ^= z.current_turn();
        }
        hash ^= z.turn_count(self.turn_count);
        if self.game_over {
            hash ^= z.game_over();
        }
        if let Some(duel) = &self.duel {
            for (team, state) in duel.teams.iter().enumerate() {
                hash ^= z.actions_remaining(team, state.actions_remaining);
                if state.ended_turn {
                    hash ^= z.ended_turn(team);
                }
                hash ^= z.ko_score(team, state.ko_score);
                hash ^= z.capture_score(team, state.capture_score);
            }
            hash ^= z.capture_area(duel.capture_area.y);
            if duel.last_starting_team == 1 {
                hash ^= z.last_starting_team();
            }
        }
        hash
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "回合: {}", self.turn_count)?;
        writeln!(f, "目前行動: 第 {} 隊", self.current_turn)?;
        let mut grid: Vec<Vec<char>> = self
            .map
            .terrain
            .iter()
            .map(|row| row.iter().map(|terrain| terrain.symbol()).collect())
            .collect();
        for block in self.blocks.iter().filter(|block| block.is_standing()) {
            if let Some(cell) = grid
                .get_mut(block.pos.y as usize)
                .and_then(|row| row.get_mut(block.pos.x as usize))
            {
                *cell = 'B';
            }
        }
        for slot in self.living_slots() {
            let unit = &self.units[slot];
            if let Some(cell) = grid
                .get_mut(unit.pos.y as usize)
                .and_then(|row| row.get_mut(unit.pos.x as usize))
            {
                *cell = if unit.team == 0 { '0' } else { '1' };
            }
        }
        for row in &grid {
            let line: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            writeln!(f, "{}", line.join(" "))?;
        }

        for team in 0..TEAM_COUNT {
            writeln!(f, "--- 第 {} 隊 ---", team)?;
            if let Some(duel) = &self.duel {
                let state = &duel.teams[team];
                writeln!(
                    f,
                    "行動: {}, 擊倒分: {}, 佔領分: {}",
                    state.actions_remaining, state.ko_score, state.capture_score
                )?;
            }
            for unit in self.team_units(team) {
                let special = unit
                    .special
                    .map_or("-".to_string(), |s| format!("{}/{}", s.current, s.max));
                writeln!(
                    f,
                    "{} {}/{} | {} | {} | {} | {} 奧義: {} 位置: {} 可行動: {}",
                    unit.hero,
                    unit.stats.hp,
                    unit.max_hp,
                    unit.stats.atk,
                    unit.stats.spd,
                    unit.stats.def,
                    unit.stats.res,
                    special,
                    unit.pos,
                    if unit.has_action { "是" } else { "否" }
                )?;
            }
        }
        Ok(())
    }
}
