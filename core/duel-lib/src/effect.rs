//! 效果直譯器：收集某個時機成立的效果，並依作用範圍分批套用
//!
//! - 場上批次：hp 變化先加總再一次寫入，其餘動作依序透過原語寫入
//! - 戰鬥批次：只修改戰鬥快照，戰鬥旗標先於能力修正
//! - 奧義批次：填入本次攻擊的 SpecialFlags
//! - 移動批次：填入 MovementFlags

use crate::{
    CombatResult, EffectContext, GameState, MovementFlags, Pos, SpecialFlags, Unit,
    can_land_on, evaluate_condition, movement_assist_destinations, other_team, owner_view,
    percent_of, validate_movement_assist,
};
use skills_lib::{
    Calculation, CombatFlag, EffectAction, GameData, MovementFlag, Phase, StatusType, Target,
};
use std::collections::BTreeMap;
use tracing::{trace, warn};

/// (動作, 擁有者 slot)
pub type EffectBatch<'d> = Vec<(&'d EffectAction, usize)>;

/// 擁有者在某個時機成立的所有動作：技能、正面狀態、負面狀態依序
pub fn eligible_effects<'d>(
    state: &GameState,
    data: &'d GameData,
    phase: Phase,
    owner: usize,
    ctx: &EffectContext,
) -> EffectBatch<'d> {
    let unit = owner_view(state, ctx, owner);
    let skill_effects = unit
        .skills
        .iter()
        .filter_map(|id| data.skill(id))
        .flat_map(|skill| skill.effects.iter());
    let bonus_effects = unit
        .bonuses
        .iter()
        .chain(unit.penalties.iter())
        .filter_map(|id| data.status(id))
        .flat_map(|status| status.effects.iter());

    let mut actions = Vec::new();
    for effect in skill_effects.chain(bonus_effects) {
        if effect.phase != phase {
            continue;
        }
        if evaluate_condition(state, data, ctx, owner, effect.condition.as_ref()) {
            actions.extend(effect.actions.iter().map(|action| (action, owner)));
        }
    }
    actions
}

/// 對多個擁有者依序收集
pub fn gather_effects<'d>(
    state: &GameState,
    data: &'d GameData,
    phase: Phase,
    owners: impl IntoIterator<Item = usize>,
    ctx: &EffectContext,
) -> EffectBatch<'d> {
    owners
        .into_iter()
        .flat_map(|owner| eligible_effects(state, data, phase, owner, ctx))
        .collect()
}

/// 將目標解析為 slot；除了戰後的敵人外都只包含存活單位
pub fn resolve_targets(
    state: &GameState,
    ctx: &EffectContext,
    owner: usize,
    target: &Target,
) -> Vec<usize> {
    let unit = owner_view(state, ctx, owner);
    let team = unit.team;
    let foe_team = other_team(team);
    let foe_in_combat = ctx.combatant_of_team(foe_team);
    let within = |slots: &[usize], center: Pos, spaces: i32| -> Vec<usize> {
        slots
            .iter()
            .copied()
            .filter(|slot| state.units[*slot].pos.manhattan(center) <= spaces)
            .collect()
    };

    match target {
        Target::SelfUnit => vec![owner],
        Target::AllyInCombat => ctx
            .combatant_of_team(team)
            .map(|c| vec![c.slot])
            .unwrap_or_default(),
        Target::Foe | Target::FoeInCombat => foe_in_combat.map(|c| vec![c.slot]).unwrap_or_default(),
        Target::FoePostCombat => foe_in_combat.map(|c| vec![c.slot]).unwrap_or_default(),
        Target::FoesWithinXSpacesOfFoe { spaces } => match foe_in_combat {
            Some(foe) => within(&state.teams[foe_team], foe.unit.pos, *spaces)
                .into_iter()
                .filter(|slot| *slot != foe.slot)
                .collect(),
            None => Vec::new(),
        },
        Target::FoeAndFoesWithinXSpacesOfFoe { spaces } => match foe_in_combat {
            Some(foe) => within(&state.teams[foe_team], foe.unit.pos, *spaces),
            None => Vec::new(),
        },
        Target::UnitAndAlliesWithinXSpaces {
            spaces,
            move_type,
            weapon_type,
        } => within(&state.teams[team], unit.pos, *spaces)
            .into_iter()
            .filter(|slot| {
                let ally = &state.units[*slot];
                move_type.is_none_or(|m| ally.move_type == m)
                    && weapon_type.is_none_or(|w| ally.weapon_type == w)
            })
            .collect(),
        Target::AlliesWithinXSpaces {
            spaces,
            move_type,
            weapon_type,
        } => within(&state.teams[team], unit.pos, *spaces)
            .into_iter()
            .filter(|slot| {
                let ally = &state.units[*slot];
                *slot != owner
                    && move_type.is_none_or(|m| ally.move_type == m)
                    && weapon_type.is_none_or(|w| ally.weapon_type == w)
            })
            .collect(),
        Target::FoesWithinXSpaces { spaces } => within(&state.teams[foe_team], unit.pos, *spaces),
        Target::FoesInCardinalDirections { with } => state.teams[foe_team]
            .iter()
            .copied()
            .filter(|slot| {
                let foe = &state.units[*slot];
                let cardinal = foe.pos.x == unit.pos.x || foe.pos.y == unit.pos.y;
                cardinal
                    && with.is_none_or(|f| unit.stats[f.unit_stat] > foe.stats[f.other_stat])
            })
            .collect(),
        Target::FoeWithHighestStat { stat } => {
            let best = state
                .team_units(foe_team)
                .map(|foe| foe.visible_stats()[*stat])
                .max();
            state.teams[foe_team]
                .iter()
                .copied()
                .filter(|slot| Some(state.units[*slot].visible_stats()[*stat]) == best)
                .collect()
        }
        Target::FoeWithLowestStat { stat } => {
            let best = state
                .team_units(foe_team)
                .map(|foe| foe.visible_stats()[*stat])
                .min();
            state.teams[foe_team]
                .iter()
                .copied()
                .filter(|slot| Some(state.units[*slot].visible_stats()[*stat]) == best)
                .collect()
        }
        Target::AssistUser => ctx.assist_user.into_iter().collect(),
        Target::AssistTarget => ctx.assist_target.into_iter().collect(),
        Target::AllAllies { move_type, with } => state.teams[team]
            .iter()
            .copied()
            .filter(|slot| {
                let ally = &state.units[*slot];
                *slot != owner
                    && move_type.is_none_or(|m| ally.move_type == m)
                    && with.is_none_or(|f| unit.stats[f.unit_stat] > ally.stats[f.other_stat])
            })
            .collect(),
        Target::AllFoes => state.teams[foe_team].clone(),
        // 格子目標只用於瞬移
        Target::SpacesWithinUnit { .. } | Target::SpacesWithinAllies { .. } => Vec::new(),
    }
}

/// 計算式的數值；user 是效果擁有者（或輔助使用者），target 是作用對象
pub fn calculation_amount(user: &Unit, target: &Unit, calculation: &Calculation) -> Option<i32> {
    match calculation {
        Calculation::PercentOfStat { stat, percent } => Some(percent_of(user.stats[*stat], *percent)),
        Calculation::Value { value } => Some(*value),
        Calculation::MissingHp { percent } => {
            Some(percent_of(target.max_hp - target.stats.hp, *percent))
        }
        Calculation::LowHpBoost => Some((target.max_hp - 2 * target.stats.hp).max(0)),
        _ => None,
    }
}

/// 戰鬥外的效果批次
pub fn apply_field_effects(
    state: &mut GameState,
    data: &GameData,
    effects: &[(&EffectAction, usize)],
    ctx: &EffectContext,
) {
    let mut hp_changes: BTreeMap<usize, i32> = BTreeMap::new();

    for (action, owner) in effects {
        let owner = *owner;
        trace!("場上效果 {} (slot {})", action, owner);
        match action {
            EffectAction::DealDamage {
                value,
                calculation,
                target,
            }
            | EffectAction::RestoreHp {
                value,
                calculation,
                target,
            } => {
                let sign = if matches!(action, EffectAction::DealDamage { .. }) {
                    -1
                } else {
                    1
                };
                for slot in resolve_targets(state, ctx, owner, target) {
                    let amount = match calculation {
                        None => *value,
                        Some(Calculation::HpRestoredToTarget) => ctx.hp_restored,
                        Some(calc) => {
                            let user = owner_view(state, ctx, owner);
                            match calculation_amount(user, &state.units[slot], calc) {
                                Some(amount) => amount,
                                None => {
                                    warn!("場上效果不支援的計算式，略過");
                                    continue;
                                }
                            }
                        }
                    };
                    *hp_changes.entry(slot).or_default() += sign * amount;
                }
            }
            EffectAction::CurrentSpecialCooldownMod { value, target } => {
                for slot in resolve_targets(state, ctx, owner, target) {
                    if let Some(special) = state.units[slot].special
                        && special.current > 0
                        && state.units[slot].alive
                    {
                        state.set_special(slot, special.current + value);
                    }
                }
            }
            EffectAction::ApplyBuff { stat, value, target } => {
                for slot in resolve_targets(state, ctx, owner, target) {
                    if state.units[slot].alive {
                        let current = state.units[slot].buffs[*stat];
                        state.set_buff(slot, *stat, current.max(*value));
                    }
                }
            }
            EffectAction::ApplyDebuff { stat, value, target } => {
                for slot in resolve_targets(state, ctx, owner, target) {
                    if state.units[slot].alive {
                        let current = state.units[slot].debuffs[*stat];
                        state.set_debuff(slot, *stat, current.max(*value));
                    }
                }
            }
            EffectAction::ApplyStatus { status, target } => {
                let Some(def) = data.status(status) else {
                    warn!("未知的狀態 {}，略過", status);
                    continue;
                };
                for slot in resolve_targets(state, ctx, owner, target) {
                    if !state.units[slot].alive {
                        continue;
                    }
                    match def.status_type {
                        StatusType::Positive => state.add_bonus(slot, status),
                        StatusType::Negative => state.add_penalty(slot, status),
                    }
                }
            }
            EffectAction::PostCombatMovement {
                movement_type,
                target,
            } => {
                let Some(target_slot) = resolve_targets(state, ctx, owner, target).first().copied()
                else {
                    continue;
                };
                if !state.units[owner].alive {
                    continue;
                }
                let (owner_dest, target_dest) = movement_assist_destinations(
                    state,
                    state.units[owner].pos,
                    target_slot,
                    *movement_type,
                );
                if validate_movement_assist(
                    state,
                    owner,
                    owner_dest,
                    target_slot,
                    target_dest,
                    *movement_type,
                ) {
                    state.set_pos(owner, owner_dest);
                    if state.units[target_slot].alive {
                        state.set_pos(target_slot, target_dest);
                    }
                }
            }
            EffectAction::PullCaptureArea => {
                let Some(area) = state.capture_area() else {
                    continue;
                };
                let team = state.units[owner].team;
                let dy = if team == 0 { -1 } else { 1 };
                let max_y = (state.map.height() - area.h).max(0);
                let mut pulled = area;
                pulled.y = (area.y + dy).clamp(0, max_y);
                state.set_capture_area(pulled);
            }
            other => warn!("場上不支援的動作 {}，略過", other),
        }
    }

    for (slot, delta) in hp_changes {
        let unit = &state.units[slot];
        if !unit.alive || delta == 0 {
            continue;
        }
        let hp = (unit.stats.hp + delta).clamp(1, unit.max_hp.max(1));
        state.set_hp(slot, hp);
    }
}

fn combat_priority(action: &EffectAction) -> u8 {
    match action {
        EffectAction::SetCombatFlag { .. } => 0,
        EffectAction::CombatStatMod { .. } => 1,
        _ => 2,
    }
}

/// 戰鬥中的效果批次：只修改戰鬥快照
pub fn apply_combat_effects(
    state: &GameState,
    effects: &mut [(&EffectAction, usize)],
    combat: &mut CombatResult,
) {
    effects.sort_by_key(|(action, _)| combat_priority(action));

    for (action, owner) in effects.iter() {
        let owner = *owner;
        trace!("戰鬥效果 {} (slot {})", action, owner);
        let Some(target) = action.target() else {
            warn!("戰鬥中不支援的動作 {}，略過", action);
            continue;
        };
        let target_slot = {
            let ctx = EffectContext::combat(combat);
            resolve_targets(state, &ctx, owner, target).first().copied()
        };
        let Some(index) = target_slot.and_then(|slot| combat.index_of(slot)) else {
            continue;
        };

        match action {
            EffectAction::CombatStatMod {
                stat,
                value,
                calculation,
                ..
            } => {
                let amount = match calculation {
                    _ if *value != 0 => *value,
                    Some(Calculation::TotalBonusesOnUnit) => {
                        let target = &combat.units[index];
                        if target.flags.has(CombatFlag::NeutralizeBonuses)
                            || target.flags.has(CombatFlag::Panic)
                            || target.unit.is_panicked()
                        {
                            continue;
                        }
                        target.unit.buffs.combat_total()
                    }
                    Some(Calculation::NumberOfAlliesWithinXSpaces {
                        spaces,
                        multiplier,
                        max,
                    }) => {
                        let me = &state.units[owner];
                        let count = state
                            .team_units(me.team)
                            .filter(|ally| ally.id != me.id && ally.pos.manhattan(me.pos) <= *spaces)
                            .count() as i32;
                        (count * multiplier).min(*max)
                    }
                    _ => 0,
                };
                combat.units[index].temp_stats[*stat] += amount;
            }
            EffectAction::SetCombatFlag {
                flag,
                percent,
                stat,
                move_type,
                weapon_type,
                ..
            } => {
                let flags = &mut combat.units[index].flags;
                if let Some(percent) = percent {
                    if flag.is_percent_list() {
                        flags.push_percent(*flag, *percent);
                    } else {
                        flags.add(*flag, *percent);
                    }
                } else if let Some(stat) = stat {
                    flags.push_stat(*flag, *stat);
                } else if let Some(move_type) = move_type {
                    flags.push_move_type(*flag, *move_type);
                } else if let Some(weapon_type) = weapon_type {
                    flags.push_weapon_type(*flag, *weapon_type);
                } else {
                    flags.add(*flag, 1);
                }
            }
            EffectAction::ConstantFixedDamage { value, .. } => {
                combat.units[index].constant_fixed_damage += value;
            }
            other => warn!("戰鬥中不支援的動作 {}，略過", other),
        }
    }
}

/// 奧義發動時的效果批次
pub fn apply_special_effects(effects: &[(&EffectAction, usize)], flags: &mut SpecialFlags) {
    for (action, owner) in effects {
        trace!("奧義效果 {} (slot {})", action, owner);
        match action {
            EffectAction::DealDamage {
                value, calculation, ..
            } => match calculation {
                _ if *value != 0 => flags.situational_fixed_damage += value,
                Some(Calculation::PercentOfStat { stat, percent }) => {
                    flags.damage_percent_of_stat = Some((*stat, *percent));
                }
                Some(Calculation::MissingHp { percent }) => {
                    flags.damage_percent_of_missing_hp = Some(*percent);
                }
                _ => warn!("奧義傷害不支援的計算式，略過"),
            },
            EffectAction::RestoreHp {
                calculation: Some(Calculation::PercentDamageDealt { percent }),
                ..
            } => flags.heal_percent_of_damage = Some(*percent),
            EffectAction::DamageReduction { percent, flat } => {
                if let Some(percent) = percent {
                    flags.percent_reductions.push(*percent);
                }
                if let Some(flat) = flat {
                    flags.flat_reduction += flat;
                }
            }
            EffectAction::ReduceDefResBy { percent } => flags.reduce_def_res_percent = *percent,
            EffectAction::BaseDamageIncrease { percent } => flags.base_damage_percent += percent,
            other => warn!("奧義不支援的動作 {}，略過", other),
        }
    }
}

/// 移動範圍計算前的效果批次
pub fn apply_movement_effects(
    state: &GameState,
    effects: &[(&EffectAction, usize)],
    mover: usize,
    flags: &mut MovementFlags,
) {
    let map = state.map();
    for (action, owner) in effects {
        let owner_unit = &state.units[*owner];
        trace!("移動效果 {} (slot {})", action, owner);
        match action {
            EffectAction::MoveExtraSpaces { spaces } => flags.extra_spaces = *spaces,
            EffectAction::SetMovementFlag { flag } => match flag {
                MovementFlag::Pass => flags.pass = true,
                MovementFlag::RestrictMovement => flags.restrict = true,
            },
            EffectAction::ObstructTiles { spaces } => {
                for pos in tiles_within(owner_unit.pos, *spaces, true) {
                    if map.on_map(pos) {
                        flags.obstructed.insert(pos);
                    }
                }
            }
            EffectAction::EnableWarp { target } => match target {
                Target::SpacesWithinUnit { spaces } => {
                    add_warp_tiles(state, owner_unit.pos, mover, *spaces, flags);
                }
                Target::SpacesWithinAllies {
                    move_type,
                    ally_range,
                    warp_range,
                    hp_threshold,
                } => {
                    for ally in state.team_units(owner_unit.team) {
                        if ally.id == owner_unit.id
                            || move_type.is_some_and(|m| ally.move_type != m)
                            || ally.pos.manhattan(owner_unit.pos) > *ally_range
                            || hp_threshold.is_some_and(|t| ally.hp_percent() > t)
                        {
                            continue;
                        }
                        add_warp_tiles(state, ally.pos, mover, *warp_range, flags);
                    }
                }
                other => warn!("不支援的瞬移目標 {}，略過", other),
            },
            other => warn!("移動計算不支援的動作 {}，略過", other),
        }
    }
}

/// 以 center 為中心、曼哈頓距離 spaces 以內的格子
pub(crate) fn tiles_within(center: Pos, spaces: i32, include_center: bool) -> Vec<Pos> {
    let mut tiles = Vec::new();
    for dx in -spaces..=spaces {
        for dy in -spaces..=spaces {
            if dx.abs() + dy.abs() > spaces || (!include_center && dx == 0 && dy == 0) {
                continue;
            }
            tiles.push(center.offset(dx, dy));
        }
    }
    tiles
}

fn add_warp_tiles(
    state: &GameState,
    center: Pos,
    mover: usize,
    spaces: i32,
    flags: &mut MovementFlags,
) {
    let move_type = state.units[mover].move_type;
    for pos in tiles_within(center, spaces, false) {
        if can_land_on(state, move_type, pos) && !state.is_occupied(pos, None) {
            flags.warp.insert(pos);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiles_within() {
        let tiles = tiles_within(Pos::new(2, 2), 1, true);
        assert_eq!(tiles.len(), 5);
        assert!(tiles.contains(&Pos::new(2, 2)));
        let ring = tiles_within(Pos::new(2, 2), 2, false);
        assert_eq!(ring.len(), 12);
        assert!(!ring.contains(&Pos::new(2, 2)));
        assert!(ring.contains(&Pos::new(0, 2)));
    }

    #[test]
    fn test_combat_priority_orders_flags_first() {
        let flag = EffectAction::SetCombatFlag {
            flag: CombatFlag::Guard,
            target: Target::Foe,
            percent: None,
            stat: None,
            move_type: None,
            weapon_type: None,
        };
        let stat = EffectAction::CombatStatMod {
            stat: skills_lib::Stat::Atk,
            value: 4,
            calculation: None,
            target: Target::SelfUnit,
        };
        let other = EffectAction::ConstantFixedDamage {
            value: 3,
            target: Target::SelfUnit,
        };
        let mut batch = vec![(&other, 0), (&stat, 0), (&flag, 1)];
        batch.sort_by_key(|(action, _)| combat_priority(action));
        assert_eq!(batch[0].0, &flag);
        assert_eq!(batch[1].0, &stat);
        assert_eq!(batch[2].0, &other);
    }
}
