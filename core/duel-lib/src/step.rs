//! 可逆的狀態原語
//!
//! 每個原語做三件事：記錄舊值到 journal、更新 hash、寫入新值。
//! 執行一個 Action 產生的 journal 片段就是 StepLog，undo 時反向重播。

use crate::{Action, DuelResult, GameState, Pos, Rect, Roster, TeamID};
use skills_lib::{COMBAT_STATS, Stat, StatusID};

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Pos { slot: usize, prev: Pos },
    Hp { slot: usize, prev: i32 },
    Special { slot: usize, prev: i32 },
    HasAction { slot: usize, prev: bool },
    Buff { slot: usize, stat: Stat, prev: i32 },
    Debuff { slot: usize, stat: Stat, prev: i32 },
    AddBonus { slot: usize },
    ClearBonuses { slot: usize, prev: Vec<StatusID> },
    AddPenalty { slot: usize },
    ClearPenalties { slot: usize, prev: Vec<StatusID> },
    CombatsInPhase { slot: usize, prev: u32 },
    /// 單位從隊伍列表的 index 位置移除
    Kill { slot: usize, index: usize },
    BlockHp { block: usize, prev: i32 },
    CurrentTurn { prev: TeamID },
    TurnCount { prev: u32 },
    SwapPhase { prev: bool },
    GameOver { prev: bool },
    History,
    ActionsRemaining { team: TeamID, prev: u32 },
    EndedTurn { team: TeamID, prev: bool },
    Surrendered { team: TeamID, prev: bool },
    KoScore { team: TeamID, prev: u32 },
    CaptureScore { team: TeamID, prev: u32 },
    Result { team: TeamID, prev: Option<DuelResult> },
    CaptureArea { prev: Rect },
    LastStartingTeam { prev: TeamID },
    Roster { prev: Roster },
    InitialRoster { prev: Option<Roster> },
}

/// 一次行動產生的步驟序列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepLog {
    steps: Vec<Step>,
}

impl StepLog {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl GameState {
    pub(crate) fn checkpoint(&self) -> usize {
        self.journal.len()
    }

    /// 取出 checkpoint 之後的步驟
    pub(crate) fn take_log(&mut self, mark: usize) -> StepLog {
        let steps = self.journal.split_off(mark.min(self.journal.len()));
        StepLog { steps }
    }

    /// 反向重播 StepLog，狀態與 hash 回到執行前
    pub fn undo(&mut self, log: StepLog) {
        for step in log.steps.into_iter().rev() {
            self.revert(step);
        }
    }

    fn revert(&mut self, step: Step) {
        match step {
            Step::Pos { slot, prev } => self.write_pos(slot, prev),
            Step::Hp { slot, prev } => self.write_hp(slot, prev),
            Step::Special { slot, prev } => self.write_special(slot, prev),
            Step::HasAction { slot, prev } => self.write_has_action(slot, prev),
            Step::Buff { slot, stat, prev } => self.write_buff(slot, stat, prev),
            Step::Debuff { slot, stat, prev } => self.write_debuff(slot, stat, prev),
            Step::AddBonus { slot } => {
                if let Some(status) = self.units[slot].bonuses.pop()
                    && let Some(z) = &self.zobrist
                {
                    self.hash ^= z.bonus(slot, &status);
                }
            }
            Step::ClearBonuses { slot, prev } => {
                if let Some(z) = &self.zobrist {
                    for status in &prev {
                        self.hash ^= z.bonus(slot, status);
                    }
                }
                self.units[slot].bonuses = prev;
            }
            Step::AddPenalty { slot } => {
                if let Some(status) = self.units[slot].penalties.pop()
                    && let Some(z) = &self.zobrist
                {
                    self.hash ^= z.penalty(slot, &status);
                }
            }
            Step::ClearPenalties { slot, prev } => {
                if let Some(z) = &self.zobrist {
                    for status in &prev {
                        self.hash ^= z.penalty(slot, status);
                    }
                }
                self.units[slot].penalties = prev;
            }
            Step::CombatsInPhase { slot, prev } => self.units[slot].combats_in_phase = prev,
            Step::Kill { slot, index } => {
                let team = self.units[slot].team;
                let index = index.min(self.teams[team].len());
                self.teams[team].insert(index, slot);
                self.units[slot].alive = true;
                if let Some(z) = &self.zobrist {
                    self.hash ^= z.alive(slot);
                }
            }
            Step::BlockHp { block, prev } => self.write_block_hp(block, prev),
            Step::CurrentTurn { prev } => self.write_current_turn(prev),
            Step::TurnCount { prev } => self.write_turn_count(prev),
            Step::SwapPhase { prev } => self.is_swap_phase = prev,
            Step::GameOver { prev } => self.write_game_over(prev),
            Step::History => {
                self.history.pop();
            }
            Step::ActionsRemaining { team, prev } => self.write_actions_remaining(team, prev),
            Step::EndedTurn { team, prev } => self.write_ended_turn(team, prev),
            Step::Surrendered { team, prev } => {
                if let Some(duel) = &mut self.duel {
                    duel.teams[team].surrendered = prev;
                }
            }
            Step::KoScore { team, prev } => self.write_ko_score(team, prev),
            Step::CaptureScore { team, prev } => self.write_capture_score(team, prev),
            Step::Result { team, prev } => {
                if let Some(duel) = &mut self.duel {
                    duel.teams[team].result = prev;
                }
            }
            Step::CaptureArea { prev } => self.write_capture_area(prev),
            Step::LastStartingTeam { prev } => self.write_last_starting_team(prev),
            Step::Roster { prev } => {
                self.units = prev.units;
                self.teams = prev.teams;
                self.hash = self.compute_hash();
            }
            Step::InitialRoster { prev } => self.initial_roster = prev,
        }
    }

    // ---- 單位 ----

    pub(crate) fn set_pos(&mut self, slot: usize, pos: Pos) {
        let prev = self.units[slot].pos;
        if prev == pos {
            return;
        }
        self.journal.push(Step::Pos { slot, prev });
        self.write_pos(slot, pos);
    }

    fn write_pos(&mut self, slot: usize, pos: Pos) {
        if let Some(z) = &self.zobrist {
            self.hash ^= z.pos(slot, self.units[slot].pos) ^ z.pos(slot, pos);
        }
        self.units[slot].pos = pos;
    }

    /// hp 會被限制在 [0, max_hp]
    pub(crate) fn set_hp(&mut self, slot: usize, hp: i32) {
        let hp = hp.clamp(0, self.units[slot].max_hp);
        let prev = self.units[slot].stats.hp;
        if prev == hp {
            return;
        }
        self.journal.push(Step::Hp { slot, prev });
        self.write_hp(slot, hp);
    }

    fn write_hp(&mut self, slot: usize, hp: i32) {
        if let Some(z) = &self.zobrist {
            self.hash ^= z.hp(slot, self.units[slot].stats.hp) ^ z.hp(slot, hp);
        }
        self.units[slot].stats.hp = hp;
    }

    /// 沒有奧義的單位忽略
    pub(crate) fn set_special(&mut self, slot: usize, current: i32) {
        let Some(special) = self.units[slot].special else {
            return;
        };
        let current = current.clamp(0, special.max);
        if special.current == current {
            return;
        }
        self.journal.push(Step::Special {
            slot,
            prev: special.current,
        });
        self.write_special(slot, current);
    }

    fn write_special(&mut self, slot: usize, current: i32) {
        if let Some(special) = &mut self.units[slot].special {
            if let Some(z) = &self.zobrist {
                self.hash ^= z.special(slot, special.current) ^ z.special(slot, current);
            }
            special.current = current;
        }
    }

    pub(crate) fn set_has_action(&mut self, slot: usize, has_action: bool) {
        let prev = self.units[slot].has_action;
        if prev == has_action {
            return;
        }
        self.journal.push(Step::HasAction { slot, prev });
        self.write_has_action(slot, has_action);
    }

    fn write_has_action(&mut self, slot: usize, has_action: bool) {
        if self.units[slot].has_action != has_action
            && let Some(z) = &self.zobrist
        {
            self.hash ^= z.has_action(slot);
        }
        self.units[slot].has_action = has_action;
    }

    pub(crate) fn set_buff(&mut self, slot: usize, stat: Stat, value: i32) {
        let prev = self.units[slot].buffs[stat];
        if prev == value {
            return;
        }
        self.journal.push(Step::Buff { slot, stat, prev });
        self.write_buff(slot, stat, value);
    }

    fn write_buff(&mut self, slot: usize, stat: Stat, value: i32) {
        if let Some(z) = &self.zobrist {
            self.hash ^= z.buff(slot, stat, self.units[slot].buffs[stat]) ^ z.buff(slot, stat, value);
        }
        self.units[slot].buffs[stat] = value;
    }

    pub(crate) fn set_debuff(&mut self, slot: usize, stat: Stat, value: i32) {
        let prev = self.units[slot].debuffs[stat];
        if prev == value {
            return;
        }
        self.journal.push(Step::Debuff { slot, stat, prev });
        self.write_debuff(slot, stat, value);
    }

    fn write_debuff(&mut self, slot: usize, stat: Stat, value: i32) {
        if let Some(z) = &self.zobrist {
            self.hash ^=
                z.debuff(slot, stat, self.units[slot].debuffs[stat]) ^ z.debuff(slot, stat, value);
        }
        self.units[slot].debuffs[stat] = value;
    }

    pub(crate) fn clear_buffs(&mut self, slot: usize) {
        for stat in COMBAT_STATS {
            self.set_buff(slot, stat, 0);
        }
    }

    pub(crate) fn clear_debuffs(&mut self, slot: usize) {
        for stat in COMBAT_STATS {
            self.set_debuff(slot, stat, 0);
        }
    }

    /// 已有相同狀態時不重複加入
    pub(crate) fn add_bonus(&mut self, slot: usize, status: &str) {
        if self.units[slot].bonuses.iter().any(|s| s == status) {
            return;
        }
        self.journal.push(Step::AddBonus { slot });
        if let Some(z) = &self.zobrist {
            self.hash ^= z.bonus(slot, status);
        }
        self.units[slot].bonuses.push(status.to_string());
    }

    pub(crate) fn clear_bonuses(&mut self, slot: usize) {
        if self.units[slot].bonuses.is_empty() {
            return;
        }
        let prev = std::mem::take(&mut self.units[slot].bonuses);
        if let Some(z) = &self.zobrist {
            for status in &prev {
                self.hash ^= z.bonus(slot, status);
            }
        }
        self.journal.push(Step::ClearBonuses { slot, prev });
    }

    pub(crate) fn add_penalty(&mut self, slot: usize, status: &str) {
        if self.units[slot].penalties.iter().any(|s| s == status) {
            return;
        }
        self.journal.push(Step::AddPenalty { slot });
        if let Some(z) = &self.zobrist {
            self.hash ^= z.penalty(slot, status);
        }
        self.units[slot].penalties.push(status.to_string());
    }

    pub(crate) fn clear_penalties(&mut self, slot: usize) {
        if self.units[slot].penalties.is_empty() {
            return;
        }
        let prev = std::mem::take(&mut self.units[slot].penalties);
        if let Some(z) = &self.zobrist {
            for status in &prev {
                self.hash ^= z.penalty(slot, status);
            }
        }
        self.journal.push(Step::ClearPenalties { slot, prev });
    }

    /// 不參與 hash
    pub(crate) fn set_combats_in_phase(&mut self, slot: usize, value: u32) {
        let prev = self.units[slot].combats_in_phase;
        if prev == value {
            return;
        }
        self.journal.push(Step::CombatsInPhase { slot, prev });
        self.units[slot].combats_in_phase = value;
    }

    /// 從隊伍列表移除並標記死亡；slot 保留在 arena
    pub(crate) fn kill(&mut self, slot: usize) {
        let team = self.units[slot].team;
        let Some(index) = self.teams[team].iter().position(|s| *s == slot) else {
            return;
        };
        self.teams[team].remove(index);
        self.units[slot].alive = false;
        if let Some(z) = &self.zobrist {
            self.hash ^= z.alive(slot);
        }
        self.journal.push(Step::Kill { slot, index });
    }

    // ---- 地圖 ----

    pub(crate) fn set_block_hp(&mut self, block: usize, hp: i32) {
        let prev = self.blocks[block].hp;
        if prev == hp {
            return;
        }
        self.journal.push(Step::BlockHp { block, prev });
        self.write_block_hp(block, hp);
    }

    fn write_block_hp(&mut self, block: usize, hp: i32) {
        if let Some(z) = &self.zobrist {
            self.hash ^= z.block(block, self.blocks[block].hp) ^ z.block(block, hp);
        }
        self.blocks[block].hp = hp;
    }

    // ---- 回合 ----

    pub(crate) fn set_current_turn(&mut self, team: TeamID) {
        let prev = self.current_turn;
        if prev == team {
            return;
        }
        self.journal.push(Step::CurrentTurn { prev });
        self.write_current_turn(team);
    }

    fn write_current_turn(&mut self, team: TeamID) {
        if self.current_turn != team
            && let Some(z) = &self.zobrist
        {
            self.hash ^= z.current_turn();
        }
        self.current_turn = team;
    }

    pub(crate) fn set_turn_count(&mut self, turn: u32) {
        let prev = self.turn_count;
        if prev == turn {
            return;
        }
        self.journal.push(Step::TurnCount { prev });
        self.write_turn_count(turn);
    }

    fn write_turn_count(&mut self, turn: u32) {
        if let Some(z) = &self.zobrist {
            self.hash ^= z.turn_count(self.turn_count) ^ z.turn_count(turn);
        }
        self.turn_count = turn;
    }

    pub(crate) fn set_swap_phase(&mut self, value: bool) {
        let prev = self.is_swap_phase;
        if prev == value {
            return;
        }
        self.journal.push(Step::SwapPhase { prev });
        self.is_swap_phase = value;
    }

    pub(crate) fn set_game_over(&mut self, value: bool) {
        let prev = self.game_over;
        if prev == value {
            return;
        }
        self.journal.push(Step::GameOver { prev });
        self.write_game_over(value);
    }

    fn write_game_over(&mut self, value: bool) {
        if self.game_over != value
            && let Some(z) = &self.zobrist
        {
            self.hash ^= z.game_over();
        }
        self.game_over = value;
    }

    pub(crate) fn push_history(&mut self, action: Action) {
        self.journal.push(Step::History);
        self.history.push(action);
    }

    // ---- 決鬥 ----

    pub(crate) fn set_actions_remaining(&mut self, team: TeamID, value: u32) {
        let Some(prev) = self.duel.as_ref().map(|d| d.teams[team].actions_remaining) else {
            return;
        };
        if prev == value {
            return;
        }
        self.journal.push(Step::ActionsRemaining { team, prev });
        self.write_actions_remaining(team, value);
    }

    fn write_actions_remaining(&mut self, team: TeamID, value: u32) {
        if let Some(duel) = &mut self.duel {
            let state = &mut duel.teams[team];
            if let Some(z) = &self.zobrist {
                self.hash ^= z.actions_remaining(team, state.actions_remaining)
                    ^ z.actions_remaining(team, value);
            }
            state.actions_remaining = value;
        }
    }

    pub(crate) fn set_ended_turn(&mut self, team: TeamID, value: bool) {
        let Some(prev) = self.duel.as_ref().map(|d| d.teams[team].ended_turn) else {
            return;
        };
        if prev == value {
            return;
        }
        self.journal.push(Step::EndedTurn { team, prev });
        self.write_ended_turn(team, value);
    }

    fn write_ended_turn(&mut self, team: TeamID, value: bool) {
        if let Some(duel) = &mut self.duel {
            let state = &mut duel.teams[team];
            if state.ended_turn != value
                && let Some(z) = &self.zobrist
            {
                self.hash ^= z.ended_turn(team);
            }
            state.ended_turn = value;
        }
    }

    pub(crate) fn set_surrendered(&mut self, team: TeamID, value: bool) {
        let Some(prev) = self.duel.as_ref().map(|d| d.teams[team].surrendered) else {
            return;
        };
        if prev == value {
            return;
        }
        self.journal.push(Step::Surrendered { team, prev });
        if let Some(duel) = &mut self.duel {
            duel.teams[team].surrendered = value;
        }
    }

    pub(crate) fn set_ko_score(&mut self, team: TeamID, value: u32) {
        let Some(prev) = self.duel.as_ref().map(|d| d.teams[team].ko_score) else {
            return;
        };
        if prev == value {
            return;
        }
        self.journal.push(Step::KoScore { team, prev });
        self.write_ko_score(team, value);
    }

    fn write_ko_score(&mut self, team: TeamID, value: u32) {
        if let Some(duel) = &mut self.duel {
            let state = &mut duel.teams[team];
            if let Some(z) = &self.zobrist {
                self.hash ^= z.ko_score(team, state.ko_score) ^ z.ko_score(team, value);
            }
            state.ko_score = value;
        }
    }

    pub(crate) fn set_capture_score(&mut self, team: TeamID, value: u32) {
        let Some(prev) = self.duel.as_ref().map(|d| d.teams[team].capture_score) else {
            return;
        };
        if prev == value {
            return;
        }
        self.journal.push(Step::CaptureScore { team, prev });
        self.write_capture_score(team, value);
    }

    fn write_capture_score(&mut self, team: TeamID, value: u32) {
        if let Some(duel) = &mut self.duel {
            let state = &mut duel.teams[team];
            if let Some(z) = &self.zobrist {
                self.hash ^= z.capture_score(team, state.capture_score)
                    ^ z.capture_score(team, value);
            }
            state.capture_score = value;
        }
    }

    /// 結果不參與 hash，遊戲結束旗標已足以區分
    pub(crate) fn set_result(&mut self, team: TeamID, value: Option<DuelResult>) {
        let Some(prev) = self.duel.as_ref().map(|d| d.teams[team].result) else {
            return;
        };
        if prev == value {
            return;
        }
        self.journal.push(Step::Result { team, prev });
        if let Some(duel) = &mut self.duel {
            duel.teams[team].result = value;
        }
    }

    pub(crate) fn set_capture_area(&mut self, area: Rect) {
        let Some(prev) = self.duel.as_ref().map(|d| d.capture_area) else {
            return;
        };
        if prev == area {
            return;
        }
        self.journal.push(Step::CaptureArea { prev });
        self.write_capture_area(area);
    }

    fn write_capture_area(&mut self, area: Rect) {
        if let Some(duel) = &mut self.duel {
            if let Some(z) = &self.zobrist {
                self.hash ^= z.capture_area(duel.capture_area.y) ^ z.capture_area(area.y);
            }
            duel.capture_area = area;
        }
    }

    pub(crate) fn set_last_starting_team(&mut self, team: TeamID) {
        let Some(prev) = self.duel.as_ref().map(|d| d.last_starting_team) else {
            return;
        };
        if prev == team {
            return;
        }
        self.journal.push(Step::LastStartingTeam { prev });
        self.write_last_starting_team(team);
    }

    fn write_last_starting_team(&mut self, team: TeamID) {
        if let Some(duel) = &mut self.duel {
            if duel.last_starting_team != team
                && let Some(z) = &self.zobrist
            {
                self.hash ^= z.last_starting_team();
            }
            duel.last_starting_team = team;
        }
    }

    // ---- 陣容 ----

    pub(crate) fn set_roster(&mut self, roster: Roster) {
        let prev = Roster {
            units: std::mem::replace(&mut self.units, roster.units),
            teams: std::mem::replace(&mut self.teams, roster.teams),
        };
        self.journal.push(Step::Roster { prev });
        self.hash = self.compute_hash();
    }

    pub(crate) fn set_initial_roster(&mut self, roster: Option<Roster>) {
        let prev = std::mem::replace(&mut self.initial_roster, roster);
        self.journal.push(Step::InitialRoster { prev });
    }
}
