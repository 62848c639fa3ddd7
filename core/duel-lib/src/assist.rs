//! 輔助技能的執行

use crate::{
    EffectContext, GameState, Unit, apply_field_effects, calculation_amount, eligible_effects,
    movement_assist_destinations,
};
use skills_lib::{AssistType, COMBAT_STATS, GameData, HealInfo, Phase, SpecialType};
use tracing::{debug, warn};

/// 治療量：各計算式加總後不低於 min
pub fn heal_amount(user: &Unit, target: &Unit, heal: &HealInfo) -> i32 {
    let total: i32 = heal
        .calculations
        .iter()
        .map(|calc| {
            calculation_amount(user, target, calc).unwrap_or_else(|| {
                warn!("治療不支援的計算式，視為 0");
                0
            })
        })
        .sum();
    total.max(heal.min)
}

fn run_phase(state: &mut GameState, data: &GameData, phase: Phase, owner: usize, ctx: &EffectContext) {
    let effects = eligible_effects(state, data, phase, owner, ctx);
    apply_field_effects(state, data, &effects, ctx);
}

/// user 對同隊的 target 使用輔助；呼叫端負責合法性
pub(crate) fn perform_assist(state: &mut GameState, data: &GameData, user: usize, target: usize) {
    let Some(assist) = state.units[user].assist(data) else {
        return;
    };
    let Some(assist_type) = assist.assist_type else {
        return;
    };
    let user_ctx = EffectContext {
        assist_target: Some(target),
        ..EffectContext::field()
    };
    let target_ctx = EffectContext {
        assist_user: Some(user),
        ..EffectContext::field()
    };
    debug!(
        "{} 對 {} 使用 {}",
        state.units[user].hero, state.units[target].hero, assist.name
    );

    match assist_type {
        AssistType::Movement => {
            let Some(kind) = assist.movement_assist else {
                return;
            };
            let (user_dest, target_dest) =
                movement_assist_destinations(state, state.units[user].pos, target, kind);
            state.set_pos(user, user_dest);
            state.set_pos(target, target_dest);
            run_phase(state, data, Phase::UsedMovementAssist, user, &user_ctx);
            run_phase(state, data, Phase::TargettedByMovementAssist, target, &target_ctx);
        }
        AssistType::Refresh => {
            state.set_has_action(target, true);
            run_phase(state, data, Phase::UsedDance, user, &user_ctx);
        }
        AssistType::Heal => {
            let restored = match &assist.heal {
                Some(heal) => {
                    let amount = heal_amount(&state.units[user], &state.units[target], heal);
                    let unit = &state.units[target];
                    let hp = (unit.stats.hp + amount).min(unit.max_hp);
                    let restored = hp - unit.stats.hp;
                    state.set_hp(target, hp);
                    restored
                }
                None => 0,
            };
            if let Some(self_heal) = &assist.self_heal {
                let unit = &state.units[user];
                let hp = (unit.stats.hp + heal_amount(unit, unit, self_heal)).min(unit.max_hp);
                state.set_hp(user, hp);
            }
            let heal_ctx = EffectContext {
                hp_restored: restored,
                ..user_ctx
            };
            run_phase(state, data, Phase::UsedHeal, user, &heal_ctx);
            charge_healing_special(state, data, user, &heal_ctx);
        }
        AssistType::Rally => {
            for buff in &assist.rally_buffs {
                let current = state.units[target].buffs[buff.stat];
                state.set_buff(target, buff.stat, current.max(buff.value));
            }
            run_phase(state, data, Phase::UsedRallyAssist, user, &user_ctx);
            run_phase(state, data, Phase::TargettedByRallyAssist, target, &target_ctx);
        }
        AssistType::Sacrifice => {
            let (user_hp, target_hp, target_max) = {
                let (u, t) = (&state.units[user], &state.units[target]);
                (u.stats.hp, t.stats.hp, t.max_hp)
            };
            let amount = assist
                .amount
                .unwrap_or((user_hp - 1).min(target_max - target_hp))
                .max(0);
            state.set_hp(target, (target_hp + amount).min(target_max));
            state.set_hp(user, user_hp - amount);
        }
        AssistType::ReciprocalAid => {
            let (user_hp, target_hp) = (state.units[user].stats.hp, state.units[target].stats.hp);
            let user_max = state.units[user].max_hp;
            let target_max = state.units[target].max_hp;
            state.set_hp(user, target_hp.min(user_max));
            state.set_hp(target, user_hp.min(target_max));
        }
        AssistType::HarshCommand => {
            for stat in COMBAT_STATS {
                let penalty = state.units[target].debuffs[stat];
                if penalty > 0 {
                    let buff = state.units[target].buffs[stat];
                    state.set_buff(target, stat, buff.max(penalty));
                    state.set_debuff(target, stat, 0);
                }
            }
        }
    }
}

/// 治療後的奧義：冷卻為 0 時發動並重置，否則充能 1
fn charge_healing_special(state: &mut GameState, data: &GameData, user: usize, ctx: &EffectContext) {
    let unit = &state.units[user];
    let (Some(special), Some(cooldown)) = (unit.special_skill(data), unit.special) else {
        return;
    };
    if special.is_special_type(SpecialType::Healing) && cooldown.current == 0 {
        run_phase(state, data, Phase::OnHealingSpecialTrigger, user, ctx);
        state.set_special(user, cooldown.max);
    } else {
        state.set_special(user, cooldown.current - 1);
    }
}
