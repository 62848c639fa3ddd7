//! 回合控制：行動執行入口、回合結束、決鬥回合與交換階段
//!
//! 所有改變狀態的入口都回傳 StepLog，交給 `GameState::undo` 就能還原。

use crate::{
    Action, ActionError, CombatResult, DuelResult, EffectContext, GameState, Mode, Pos, Result,
    Roster, StepLog, TeamID, apply_field_effects, eligible_effects, generate_actions,
    gather_effects, other_team, perform_assist, resolve_combat,
};
use skills_lib::{GameData, Phase, SpecialType};
use tracing::{debug, warn};

/// 驗證並執行行動；不合法時回傳錯誤且狀態不變
pub fn apply_action(state: &mut GameState, data: &GameData, action: &Action) -> Result<StepLog> {
    if state.game_over {
        return Err(ActionError::GameOver.into());
    }
    if state.is_swap_phase {
        return Err(ActionError::SwapPhase.into());
    }
    if let Some(from) = action.from() {
        let slot = state
            .unit_at(from)
            .ok_or(ActionError::NoUnitAtPos { x: from.x, y: from.y })?;
        let unit = &state.units[slot];
        if unit.team != state.current_turn {
            return Err(ActionError::NotYourTurn { id: unit.id }.into());
        }
        match action {
            Action::Attack { target, .. } | Action::Assist { target, .. }
                if state.unit_at(*target).is_none() =>
            {
                return Err(ActionError::InvalidTarget {
                    x: target.x,
                    y: target.y,
                }
                .into());
            }
            Action::Block { target, .. }
                if !state
                    .blocks
                    .iter()
                    .any(|b| b.pos == *target && b.breakable && b.hp > 0) =>
            {
                return Err(ActionError::NoBlockAtPos {
                    x: target.x,
                    y: target.y,
                }
                .into());
            }
            _ => {}
        }
        if !generate_actions(state, data, slot).contains(action) {
            return Err(ActionError::Illegal {
                action: action.to_string(),
            }
            .into());
        }
    }
    Ok(execute_action(state, data, action))
}

/// 不做合法性檢查直接執行行動（搜尋使用）
pub fn execute_action(state: &mut GameState, data: &GameData, action: &Action) -> StepLog {
    let mark = state.checkpoint();
    perform_action(state, data, action);
    state.take_log(mark)
}

fn perform_action(state: &mut GameState, data: &GameData, action: &Action) {
    let (Some(from), Some(to)) = (action.from(), action.to()) else {
        end_turn(state, data);
        return;
    };
    let Some(slot) = state.unit_at(from) else {
        warn!("位置 {} 沒有單位，略過行動 {}", from, action);
        return;
    };

    state.push_history(*action);
    state.set_pos(slot, to);
    state.set_has_action(slot, false);

    match action {
        Action::Block { target, .. } => {
            if let Some(index) = state.block_at(*target) {
                let hp = state.blocks[index].hp;
                state.set_block_hp(index, hp - 1);
            }
        }
        Action::Assist { target, .. } => {
            if let Some(target) = state.unit_at(*target) {
                perform_assist(state, data, slot, target);
            }
        }
        Action::Attack { target, .. } => {
            if let Some(target) = state.unit_at(*target) {
                commit_combat(state, data, slot, target);
            }
        }
        Action::Move { .. } | Action::EndTurn => {}
    }

    state.clear_debuffs(slot);
    state.clear_penalties(slot);
    check_auto_end_turn(state, data);
    check_game_over(state);
}

fn run_batch(
    state: &mut GameState,
    data: &GameData,
    phase: Phase,
    owners: &[usize],
    ctx: &EffectContext,
) {
    let effects = gather_effects(state, data, phase, owners.iter().copied(), ctx);
    apply_field_effects(state, data, &effects, ctx);
}

/// 結算戰鬥並把結果寫回棋盤，接著處理戰後效果與死亡
fn commit_combat(state: &mut GameState, data: &GameData, attacker: usize, defender: usize) {
    let result = resolve_combat(state, data, attacker, defender);
    let both = [attacker, defender];

    for (i, slot) in both.into_iter().enumerate() {
        let combats = state.units[slot].combats_in_phase;
        state.set_combats_in_phase(slot, combats + 1);
        let combatant = &result.units[i].unit;
        state.set_hp(slot, combatant.stats.hp);
        if let Some(special) = combatant.special {
            state.set_special(slot, special.current);
        }
    }
    for (id, damage) in result.aoe_victims() {
        if let Some(victim) = state.slot_of(id)
            && state.units[victim].alive
        {
            let hp = (state.units[victim].stats.hp - damage).max(1);
            state.set_hp(victim, hp);
        }
    }

    let ctx = EffectContext::combat(&result);
    run_batch(state, data, Phase::AfterCombatBeforeDeath, &both, &ctx);

    handle_deaths(state, &result);

    let survivors: Vec<usize> = both
        .into_iter()
        .filter(|slot| state.units[*slot].alive)
        .collect();
    let mut effects = gather_effects(state, data, Phase::AfterCombat, survivors.iter().copied(), &ctx);
    for slot in both {
        let team = state.units[slot].team;
        let others: Vec<usize> = state.teams[team]
            .iter()
            .copied()
            .filter(|other| !both.contains(other))
            .collect();
        effects.extend(gather_effects(
            state,
            data,
            Phase::AfterAllyCombat,
            others,
            &ctx,
        ));
    }
    apply_field_effects(state, data, &effects, &ctx);

    let survivors: Vec<usize> = both
        .into_iter()
        .filter(|slot| state.units[*slot].alive)
        .collect();
    run_batch(state, data, Phase::AfterCombatDisplacement, &survivors, &ctx);

    galeforce(state, data, attacker);
}

fn handle_deaths(state: &mut GameState, result: &CombatResult) {
    let dead: Vec<usize> = result
        .units
        .iter()
        .map(|c| c.slot)
        .filter(|slot| state.units[*slot].alive && state.units[*slot].stats.hp <= 0)
        .collect();
    if dead.is_empty() {
        return;
    }

    if let Some(duel) = &state.duel {
        let rules = &state.rules;
        let is_captain = |slot: usize| {
            let unit = &state.units[slot];
            duel.teams[unit.team].captain == unit.id
        };
        let mut points = rules.ko_score;
        for combatant in &result.units {
            if is_captain(combatant.slot) {
                points += rules.captain_ko_bonus;
            }
        }
        let awards: Vec<(TeamID, u32)> = dead
            .iter()
            .map(|slot| {
                let scorer = other_team(state.units[*slot].team);
                (scorer, duel.teams[scorer].ko_score + points)
            })
            .collect();
        for (team, score) in awards {
            state.set_ko_score(team, score);
        }
    }

    for slot in dead {
        debug!("{} 被擊倒", state.units[slot].hero);
        state.kill(slot);
    }
}

/// 戰後奧義已充能且沒有行動時，重新獲得行動並重置奧義
fn galeforce(state: &mut GameState, data: &GameData, slot: usize) {
    let unit = &state.units[slot];
    if !unit.alive || unit.has_action {
        return;
    }
    let (Some(special), Some(cooldown)) = (unit.special_skill(data), unit.special) else {
        return;
    };
    if special.is_special_type(SpecialType::Galeforce) && cooldown.current == 0 {
        state.set_has_action(slot, true);
        state.set_special(slot, cooldown.max);
    }
}

fn check_auto_end_turn(state: &mut GameState, data: &GameData) {
    let team = state.current_turn;
    let no_action_left = state.team_units(team).all(|unit| !unit.has_action);
    match state.mode {
        Mode::Duel => {
            let Some(duel) = &state.duel else {
                return;
            };
            let remaining = duel.teams[team].actions_remaining.saturating_sub(1);
            let foe_ended = duel.teams[other_team(team)].ended_turn;
            state.set_actions_remaining(team, remaining);
            if no_action_left || remaining == 0 {
                end_turn(state, data);
            } else if !foe_ended {
                state.set_current_turn(other_team(team));
            }
        }
        Mode::Regular => {
            if no_action_left {
                end_turn(state, data);
            }
        }
    }
}

fn end_turn(state: &mut GameState, data: &GameData) {
    let team = state.current_turn;
    match state.mode {
        Mode::Duel => {
            state.set_ended_turn(team, true);
            for slot in state.teams[team].clone() {
                state.set_has_action(slot, false);
            }
            let both_ended = state
                .duel
                .as_ref()
                .is_some_and(|duel| duel.teams.iter().all(|t| t.ended_turn));
            if !both_ended {
                state.set_current_turn(other_team(team));
                return;
            }
            tally_capture(state);
            if state.turn_count >= state.rules.rounds {
                finish_duel(state);
                return;
            }
            state.set_turn_count(state.turn_count + 1);
            start_of_duel_round(state, data);
        }
        Mode::Regular => {
            for slot in state.teams[team].clone() {
                state.set_has_action(slot, true);
            }
            let next = other_team(team);
            state.set_current_turn(next);
            if next == 0 {
                state.set_turn_count(state.turn_count + 1);
            }
            start_of_regular_turn(state, data);
        }
    }
}

/// 回合結束時佔領區人數多出門檻的一方得分
fn tally_capture(state: &mut GameState) {
    let Some(area) = state.capture_area() else {
        return;
    };
    let counts: Vec<usize> = (0..2)
        .map(|team| state.team_units(team).filter(|u| area.contains(u.pos)).count())
        .collect();
    let margin = state.rules.capture_margin;
    let scorer = if counts[0] >= counts[1] + margin {
        Some(0)
    } else if counts[1] >= counts[0] + margin {
        Some(1)
    } else {
        None
    };
    if let Some(team) = scorer
        && let Some(duel) = &state.duel
    {
        let score = duel.teams[team].capture_score + state.rules.capture_score;
        debug!("第 {} 隊佔領得分 ({} 對 {})", team, counts[0], counts[1]);
        state.set_capture_score(team, score);
    }
}

fn finish_duel(state: &mut GameState) {
    let Some(duel) = &state.duel else {
        return;
    };
    let scores = [duel.teams[0].total_score(), duel.teams[1].total_score()];
    let results = if scores[0] > scores[1] {
        [DuelResult::Win, DuelResult::Lose]
    } else if scores[1] > scores[0] {
        [DuelResult::Lose, DuelResult::Win]
    } else {
        [DuelResult::Draw, DuelResult::Draw]
    };
    debug!("決鬥結束：{} 比 {}", scores[0], scores[1]);
    state.set_game_over(true);
    for (team, result) in results.into_iter().enumerate() {
        state.set_result(team, Some(result));
    }
}

fn start_of_duel_round(state: &mut GameState, data: &GameData) {
    let Some(duel) = &state.duel else {
        return;
    };
    let (a0, a1) = (
        duel.teams[0].actions_remaining,
        duel.teams[1].actions_remaining,
    );
    let first = if a0 > a1 {
        0
    } else if a1 > a0 {
        1
    } else {
        duel.last_starting_team
    };
    state.set_current_turn(first);
    state.set_last_starting_team(first);
    for team in 0..2 {
        state.set_ended_turn(team, false);
        state.set_actions_remaining(team, state.rules.actions_per_round);
    }
    let slots: Vec<usize> = state.living_slots().collect();
    for slot in &slots {
        state.clear_buffs(*slot);
        state.clear_bonuses(*slot);
        state.set_has_action(*slot, true);
        state.set_combats_in_phase(*slot, 0);
    }
    debug!("第 {} 回合開始，第 {} 隊先攻", state.turn_count, first);

    let ctx = EffectContext::field();
    let second = other_team(first);
    let mut effects = Vec::new();
    for phase in [Phase::StartOfTurn, Phase::StartOfEnemyPhase] {
        for team in [first, second] {
            for &slot in &state.teams[team] {
                effects.extend(eligible_effects(state, data, phase, slot, &ctx));
            }
        }
    }
    effects.extend(gather_effects(
        state,
        data,
        Phase::StartOfPlayerPhaseOrEnemyPhase,
        slots,
        &ctx,
    ));
    apply_field_effects(state, data, &effects, &ctx);
}

fn start_of_regular_turn(state: &mut GameState, data: &GameData) {
    let slots: Vec<usize> = state.living_slots().collect();
    for slot in &slots {
        state.clear_buffs(*slot);
        state.clear_bonuses(*slot);
        state.set_combats_in_phase(*slot, 0);
    }
    let current = state.current_turn;
    debug!("第 {} 回合，第 {} 隊行動", state.turn_count, current);

    let ctx = EffectContext::field();
    let mut effects = gather_effects(
        state,
        data,
        Phase::StartOfTurn,
        state.teams[current].iter().copied(),
        &ctx,
    );
    effects.extend(gather_effects(
        state,
        data,
        Phase::StartOfEnemyPhase,
        state.teams[other_team(current)].iter().copied(),
        &ctx,
    ));
    effects.extend(gather_effects(
        state,
        data,
        Phase::StartOfPlayerPhaseOrEnemyPhase,
        slots,
        &ctx,
    ));
    apply_field_effects(state, data, &effects, &ctx);
}

/// 任一隊沒有存活單位時遊戲結束
fn check_game_over(state: &mut GameState) {
    for team in 0..2 {
        if state.teams[team].is_empty() {
            state.set_game_over(true);
            if state.duel.is_some() {
                state.set_result(team, Some(DuelResult::Lose));
                state.set_result(other_team(team), Some(DuelResult::Win));
            }
        }
    }
}

/// 投降：遊戲立即結束
pub fn surrender(state: &mut GameState, team: TeamID) -> Result<StepLog> {
    if state.game_over {
        return Err(ActionError::GameOver.into());
    }
    let mark = state.checkpoint();
    state.set_game_over(true);
    if state.duel.is_some() {
        state.set_surrendered(team, true);
        state.set_result(team, Some(DuelResult::Lose));
        state.set_result(other_team(team), Some(DuelResult::Win));
    }
    debug!("第 {} 隊投降", team);
    Ok(state.take_log(mark))
}

/// 交換階段中交換（或移動）同一隊的兩個起始位置
pub fn swap_starting_positions(state: &mut GameState, a: Pos, b: Pos) -> Result<StepLog> {
    if !state.is_swap_phase {
        return Err(ActionError::NotInSwapPhase.into());
    }
    let team_of = |pos: Pos| {
        (0..2).find(|team| state.map.starting_slot(*team, pos).is_some())
    };
    let team = match (team_of(a), team_of(b)) {
        (Some(ta), Some(tb)) if ta == tb => ta,
        _ => return Err(ActionError::InvalidSwap { a, b }.into()),
    };
    let find = |pos: Pos| {
        state.teams[team]
            .iter()
            .copied()
            .find(|slot| state.units[*slot].pos == pos)
    };
    let (unit_a, unit_b) = (find(a), find(b));

    let mark = state.checkpoint();
    match (unit_a, unit_b) {
        (Some(sa), Some(sb)) => {
            state.set_pos(sa, b);
            state.set_pos(sb, a);
        }
        (Some(sa), None) => state.set_pos(sa, b),
        (None, Some(sb)) => state.set_pos(sb, a),
        (None, None) => {}
    }
    Ok(state.take_log(mark))
}

/// 結束交換階段：記下起始陣容並開始第一個回合
pub fn end_swap_phase(state: &mut GameState, data: &GameData) -> Result<StepLog> {
    if !state.is_swap_phase {
        return Err(ActionError::NotInSwapPhase.into());
    }
    let mark = state.checkpoint();
    state.set_swap_phase(false);
    let roster = Roster {
        units: state.units.clone(),
        teams: state.teams.clone(),
    };
    state.set_initial_roster(Some(roster));
    match state.mode {
        Mode::Duel => start_of_duel_round(state, data),
        Mode::Regular => start_of_regular_turn(state, data),
    }
    Ok(state.take_log(mark))
}

/// 回到交換階段並還原起始陣容（只限一般模式）
pub fn enter_swap_phase(state: &mut GameState) -> Result<StepLog> {
    if state.mode == Mode::Duel {
        return Err(ActionError::DuelSwapPhase.into());
    }
    let mark = state.checkpoint();
    if !state.is_swap_phase {
        state.set_swap_phase(true);
        if let Some(roster) = state.initial_roster.clone() {
            state.set_roster(roster);
        }
    }
    Ok(state.take_log(mark))
}
