//! 效果條件的求值
//!
//! 條件以擁有者（owner）為中心求值。戰鬥進行中擁有者若是交戰單位，
//! 讀取的是戰鬥快照，否則讀取棋盤上的單位。

use crate::{CombatResult, Combatant, GameState, Pos, other_team};
use skills_lib::{
    Condition, GameData, HpThreshold, SpecialType, Stat, StatCheckType, StatComparison, Stats,
};
use tracing::warn;

/// 效果求值與套用時的上下文
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectContext<'a> {
    pub combat: Option<&'a CombatResult>,
    /// 正在計算移動範圍的單位
    pub moving_unit: Option<usize>,
    pub assist_user: Option<usize>,
    pub assist_target: Option<usize>,
    pub hp_restored: i32,
}

impl<'a> EffectContext<'a> {
    pub fn field() -> Self {
        Self::default()
    }

    pub fn combat(combat: &'a CombatResult) -> Self {
        Self {
            combat: Some(combat),
            ..Self::default()
        }
    }

    pub fn movement(moving_unit: usize) -> Self {
        Self {
            moving_unit: Some(moving_unit),
            ..Self::default()
        }
    }

    /// 戰鬥尚未結束時，slot 對應的交戰單位
    pub fn combatant(&self, slot: usize) -> Option<&'a Combatant> {
        self.combat
            .filter(|combat| !combat.complete)
            .and_then(|combat| combat.units.iter().find(|c| c.slot == slot))
    }

    /// 與 team 同隊的交戰單位（不論戰鬥是否結束）
    pub fn combatant_of_team(&self, team: usize) -> Option<&'a Combatant> {
        self.combat
            .and_then(|combat| combat.units.iter().find(|c| c.unit.team == team))
    }
}

/// 擁有者目前的樣貌：交戰中取快照，否則取棋盤上的單位
pub fn owner_view<'a>(
    state: &'a GameState,
    ctx: &EffectContext<'a>,
    slot: usize,
) -> &'a crate::Unit {
    match ctx.combatant(slot) {
        Some(combatant) => &combatant.unit,
        None => &state.units[slot],
    }
}

/// 沒有條件時成立
pub fn evaluate_condition(
    state: &GameState,
    data: &GameData,
    ctx: &EffectContext,
    owner: usize,
    condition: Option<&Condition>,
) -> bool {
    match condition {
        Some(condition) => evaluate(state, data, ctx, owner, condition),
        None => true,
    }
}

fn hp_compare(hp: i32, max_hp: i32, threshold: &HpThreshold, cmp: fn(i64, i64) -> bool) -> bool {
    match (threshold.value, threshold.percent) {
        (Some(value), _) => cmp(hp as i64, value as i64),
        // 100·hp 與 max·p 比較，避免浮點誤差
        (None, Some(percent)) => cmp(100 * hp as i64, max_hp as i64 * percent as i64),
        (None, None) => false,
    }
}

fn gt(a: i64, b: i64) -> bool {
    a > b
}
fn ge(a: i64, b: i64) -> bool {
    a >= b
}
fn lt(a: i64, b: i64) -> bool {
    a < b
}
fn le(a: i64, b: i64) -> bool {
    a <= b
}

fn evaluate(
    state: &GameState,
    data: &GameData,
    ctx: &EffectContext,
    owner: usize,
    condition: &Condition,
) -> bool {
    let unit = owner_view(state, ctx, owner);
    let own_combatant = ctx.combatant(owner);
    let foe = ctx.combatant_of_team(other_team(unit.team));

    match condition {
        Condition::And { conditions } => conditions
            .iter()
            .all(|c| evaluate(state, data, ctx, owner, c)),
        Condition::Or { conditions } => conditions
            .iter()
            .any(|c| evaluate(state, data, ctx, owner, c)),

        Condition::IsTurnCount { turn_count } => state.turn_count == *turn_count,
        Condition::IsOddTurn => state.turn_count % 2 == 1,
        Condition::IsEvenTurn => state.turn_count % 2 == 0,
        Condition::EveryThirdTurn => state.turn_count % 3 == 1,

        Condition::UnitInitiatesCombat => own_combatant.is_some_and(|c| c.is_initiator),
        Condition::FoeInitiatesCombat => foe.is_some_and(|c| c.is_initiator),

        Condition::UnitHpGreaterThan(t) => hp_compare(unit.stats.hp, unit.max_hp, t, gt),
        Condition::UnitHpGreaterThanEqualTo(t) => hp_compare(unit.stats.hp, unit.max_hp, t, ge),
        Condition::UnitHpLessThan(t) => hp_compare(unit.stats.hp, unit.max_hp, t, lt),
        Condition::UnitHpLessThanEqualTo(t) => hp_compare(unit.stats.hp, unit.max_hp, t, le),
        Condition::UnitHpIsMaxHp {
            check_start_of_combat_hp,
        } => {
            let hp = match own_combatant {
                Some(c) if *check_start_of_combat_hp => c.start_of_combat_hp,
                _ => unit.stats.hp,
            };
            hp == unit.max_hp
        }

        Condition::FoeHpGreaterThan(t) => {
            foe.is_some_and(|f| hp_compare(f.unit.stats.hp, f.unit.max_hp, t, gt))
        }
        Condition::FoeHpGreaterThanEqualTo(t) => {
            foe.is_some_and(|f| hp_compare(f.unit.stats.hp, f.unit.max_hp, t, ge))
        }
        Condition::FoeHpLessThan(t) => {
            foe.is_some_and(|f| hp_compare(f.unit.stats.hp, f.unit.max_hp, t, lt))
        }
        Condition::FoeHpLessThanEqualTo(t) => {
            foe.is_some_and(|f| hp_compare(f.unit.stats.hp, f.unit.max_hp, t, le))
        }
        Condition::FoeHpIsMaxHp => foe.is_some_and(|f| f.unit.stats.hp == f.unit.max_hp),

        Condition::BuffActiveOnUnit => unit.buffs.any_combat_stat_positive(),
        Condition::DebuffActiveOnUnit => unit.debuffs.any_combat_stat_positive(),
        Condition::BonusActiveOnUnit => !unit.bonuses.is_empty(),
        Condition::PenaltyActiveOnUnit => !unit.penalties.is_empty(),

        Condition::UnitWithinXSpacesOfAlly {
            spaces,
            move_type,
            weapon_type,
            count,
        } => {
            let allies = state
                .team_units(unit.team)
                .filter(|ally| ally.id != unit.id)
                .filter(|ally| ally.pos.manhattan(unit.pos) <= *spaces)
                .filter(|ally| move_type.is_none_or(|m| ally.move_type == m))
                .filter(|ally| weapon_type.is_none_or(|w| ally.weapon_type == w))
                .count();
            allies >= (*count).max(1)
        }
        Condition::UnitIsAdjacentToAlly => allies_within(state, unit.team, unit.id, unit.pos, 1),
        Condition::UnitNotAdjacentToAlly => !allies_within(state, unit.team, unit.id, unit.pos, 1),
        Condition::AllyInCombatWithinXSpacesOfUnit {
            spaces,
            move_type,
            weapon_type,
        } => ctx.combatant_of_team(unit.team).is_some_and(|ally| {
            move_type.is_none_or(|m| ally.unit.move_type == m)
                && weapon_type.is_none_or(|w| ally.unit.weapon_type == w)
                && ally.unit.pos.manhattan(unit.pos) <= *spaces
        }),
        Condition::MovingAllyWithinXSpacesOfUnit { spaces, move_type } => {
            ctx.moving_unit.is_some_and(|slot| {
                let mover = &state.units[slot];
                move_type.is_none_or(|m| mover.move_type == m)
                    && mover.pos.manhattan(unit.pos) <= *spaces
            })
        }
        Condition::UnitInCaptureArea => state
            .capture_area()
            .is_some_and(|area| area.contains(unit.pos)),

        Condition::FoeIsMoveType { move_type } => foe.is_some_and(|f| f.unit.move_type == *move_type),
        Condition::FoeIsWeaponType { weapon_type } => {
            foe.is_some_and(|f| f.unit.weapon_type == *weapon_type)
        }
        Condition::FoeCanCounter => foe.is_some_and(|f| f.can_attack),
        Condition::FoeHasXRange { range } => foe.is_some_and(|f| f.unit.weapon_type.range() == *range),

        Condition::UnitAttackedDuringCombat => own_combatant.is_some_and(|c| c.times_attacked > 0),
        Condition::FoesAttackCanTriggerUnitsSpecial => unit.special_skill(data).is_some_and(|s| {
            s.is_special_type(SpecialType::Defensive) || s.is_special_type(SpecialType::Miracle)
        }),
        Condition::FirstCombatInPhase => unit.combats_in_phase == 0,

        Condition::UnitStatGreaterThanFoe(c) => stat_compare(unit, own_combatant, foe, c, gt),
        Condition::UnitStatGreaterThanEqualToFoe(c) => stat_compare(unit, own_combatant, foe, c, ge),
        Condition::UnitStatLessThanFoe(c) => stat_compare(unit, own_combatant, foe, c, lt),
        Condition::UnitStatLessThanEqualToFoe(c) => stat_compare(unit, own_combatant, foe, c, le),
        Condition::AllyStatGreaterThanFoe {
            ally_stat,
            foe_stat,
            stat_type,
        } => match (ctx.combatant_of_team(unit.team), foe) {
            (Some(ally), Some(foe)) => {
                let ally_value = compared_stats(&ally.unit, Some(ally), *stat_type)[*ally_stat]
                    + ally.unit.phantom_stats[*ally_stat];
                let foe_value = compared_stats(&foe.unit, Some(foe), *stat_type)[*foe_stat]
                    + foe.unit.phantom_stats[*foe_stat];
                ally_value > foe_value
            }
            _ => false,
        },

        Condition::Unknown => {
            warn!("未知的條件種類，視為不成立 ({})", unit.hero);
            false
        }
    }
}

fn allies_within(state: &GameState, team: usize, id: crate::UnitID, pos: Pos, spaces: i32) -> bool {
    state
        .team_units(team)
        .any(|ally| ally.id != id && ally.pos.manhattan(pos) <= spaces)
}

fn compared_stats(unit: &crate::Unit, combatant: Option<&Combatant>, stat_type: StatCheckType) -> Stats {
    match (stat_type, combatant) {
        (StatCheckType::InCombat, Some(c)) => c.total_stats(),
        _ => unit.visible_stats(),
    }
}

fn stat_compare(
    unit: &crate::Unit,
    own: Option<&Combatant>,
    foe: Option<&Combatant>,
    comparison: &StatComparison,
    cmp: fn(i64, i64) -> bool,
) -> bool {
    let Some(foe) = foe else {
        return false;
    };
    let unit_stat: Stat = comparison.unit_stat;
    let foe_stat: Stat = comparison.foe_stat;
    let unit_value = compared_stats(unit, own, comparison.stat_type)[unit_stat]
        + comparison.unit_modifier
        + unit.phantom_stats[unit_stat];
    let foe_value = compared_stats(&foe.unit, Some(foe), comparison.stat_type)[foe_stat]
        + comparison.foe_modifier
        + foe.unit.phantom_stats[foe_stat];
    cmp(unit_value as i64, foe_value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hp_compare() {
        let half = HpThreshold {
            percent: Some(50),
            value: None,
        };
        let fixed = HpThreshold {
            percent: None,
            value: Some(10),
        };
        let test_data = [
            (20, 40, half, ge as fn(i64, i64) -> bool, true),
            (20, 40, half, gt, false),
            (19, 40, half, lt, true),
            (20, 40, half, le, true),
            // 33 * 100 = 3300 > 65 * 50 = 3250
            (33, 65, half, gt, true),
            (11, 40, fixed, gt, true),
            (10, 40, fixed, gt, false),
        ];
        for (idx, (hp, max, threshold, cmp, expected)) in test_data.iter().enumerate() {
            assert_eq!(hp_compare(*hp, *max, threshold, *cmp), *expected, "Case {}", idx);
        }
    }
}
