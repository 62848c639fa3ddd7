//! 戰鬥結算
//!
//! 戰鬥只讀取 GameState，所有變化都寫在兩個交戰單位的快照上，
//! 由執行行動的一方決定要不要把結果寫回棋盤。

use crate::{
    EffectBatch, EffectContext, GameState, Unit, apply_combat_effects, apply_special_effects,
    evaluate_condition, gather_effects, other_team, percent_of,
};
use skills_lib::{
    COMBAT_STATS, CombatFlag, GameData, MoveType, Phase, SpecialType, Stat, Stats, WeaponType,
};
use strum::EnumCount;
use tracing::debug;

/// 戰鬥旗標：計數與各種清單
#[derive(Debug, Clone, PartialEq)]
pub struct CombatFlags {
    counters: [i32; CombatFlag::COUNT],
    stats: Vec<(CombatFlag, Stat)>,
    move_types: Vec<(CombatFlag, MoveType)>,
    weapon_types: Vec<(CombatFlag, WeaponType)>,
    percents: Vec<(CombatFlag, i32)>,
}

impl Default for CombatFlags {
    fn default() -> Self {
        Self {
            counters: [0; CombatFlag::COUNT],
            stats: Vec::new(),
            move_types: Vec::new(),
            weapon_types: Vec::new(),
            percents: Vec::new(),
        }
    }
}

impl CombatFlags {
    pub fn count(&self, flag: CombatFlag) -> i32 {
        self.counters[flag as usize]
    }

    pub fn has(&self, flag: CombatFlag) -> bool {
        self.count(flag) > 0
    }

    pub fn add(&mut self, flag: CombatFlag, amount: i32) {
        self.counters[flag as usize] += amount;
    }

    pub fn push_stat(&mut self, flag: CombatFlag, stat: Stat) {
        if !self.stats.contains(&(flag, stat)) {
            self.stats.push((flag, stat));
        }
    }

    pub fn push_move_type(&mut self, flag: CombatFlag, move_type: MoveType) {
        if !self.move_types.contains(&(flag, move_type)) {
            self.move_types.push((flag, move_type));
        }
    }

    pub fn push_weapon_type(&mut self, flag: CombatFlag, weapon_type: WeaponType) {
        if !self.weapon_types.contains(&(flag, weapon_type)) {
            self.weapon_types.push((flag, weapon_type));
        }
    }

    pub fn push_percent(&mut self, flag: CombatFlag, percent: i32) {
        self.percents.push((flag, percent));
    }

    pub fn stats(&self, flag: CombatFlag) -> impl Iterator<Item = Stat> + '_ {
        self.stats
            .iter()
            .filter(move |(f, _)| *f == flag)
            .map(|(_, stat)| *stat)
    }

    pub fn has_move_type(&self, flag: CombatFlag, move_type: MoveType) -> bool {
        self.move_types.contains(&(flag, move_type))
    }

    pub fn has_weapon_type(&self, flag: CombatFlag, weapon_type: WeaponType) -> bool {
        self.weapon_types.contains(&(flag, weapon_type))
    }

    pub fn percents(&self, flag: CombatFlag) -> impl Iterator<Item = i32> + '_ {
        self.percents
            .iter()
            .filter(move |(f, _)| *f == flag)
            .map(|(_, p)| *p)
    }
}

/// 交戰單位：棋盤單位的快照加上戰鬥中的暫時狀態
#[derive(Debug, Clone, PartialEq)]
pub struct Combatant {
    pub slot: usize,
    pub unit: Unit,
    pub temp_stats: Stats,
    pub start_of_combat_hp: i32,
    pub is_initiator: bool,
    pub on_defensive_terrain: bool,
    pub advantage_mod: i32,
    pub effective_mod: i32,
    pub staff_mod: i32,
    pub constant_fixed_damage: i32,
    pub can_attack: bool,
    pub can_double: bool,
    pub times_attacked: u32,
    pub first_attack_done: bool,
    pub follow_up_done: bool,
    /// 不含奧義的單次傷害預覽
    pub base_damage: i32,
    pub flags: CombatFlags,
}

impl Combatant {
    fn new(state: &GameState, slot: usize, is_initiator: bool) -> Self {
        let unit = state.units[slot].clone();
        Self {
            slot,
            start_of_combat_hp: unit.stats.hp,
            on_defensive_terrain: state.map.is_defensive(unit.pos),
            staff_mod: if unit.weapon_type == WeaponType::Staff {
                50
            } else {
                100
            },
            can_attack: is_initiator,
            is_initiator,
            unit,
            temp_stats: Stats::default(),
            advantage_mod: 0,
            effective_mod: 0,
            constant_fixed_damage: 0,
            can_double: false,
            times_attacked: 0,
            first_attack_done: false,
            follow_up_done: false,
            base_damage: 0,
            flags: CombatFlags::default(),
        }
    }

    /// 可見能力加上戰鬥中修正，hp 為目前值
    pub fn total_stats(&self) -> Stats {
        let mut total = self.unit.visible_stats();
        for stat in COMBAT_STATS {
            total[stat] = (total[stat] + self.temp_stats[stat]).max(0);
        }
        total.hp = self.unit.stats.hp;
        total
    }

    pub fn is_alive(&self) -> bool {
        self.unit.stats.hp > 0
    }

    fn done_attacking(&self) -> bool {
        !self.can_attack || self.first_attack_done && (!self.can_double || self.follow_up_done)
    }

    fn attacks_per_strike(&self) -> u32 {
        if self.flags.has(CombatFlag::AttacksTwice) {
            2
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackStep {
    pub attacker: crate::UnitID,
    pub defender: crate::UnitID,
    pub attacker_special_triggered: bool,
    pub defender_special_triggered: bool,
    /// [攻擊方, 防守方] 奧義冷卻的變化量
    pub charges: [i32; 2],
    pub damage: i32,
    pub healing: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatStep {
    Attack(AttackStep),
    /// 範圍奧義的戰前傷害
    Aoe {
        attacker: crate::UnitID,
        defender: crate::UnitID,
        damage: i32,
    },
}

/// 戰鬥結果：[發動方, 被攻擊方]
#[derive(Debug, Clone, PartialEq)]
pub struct CombatResult {
    pub units: [Combatant; 2],
    pub sequence: Vec<CombatStep>,
    pub complete: bool,
    next_attacker: usize,
}

impl CombatResult {
    /// slot 在 units 中的索引
    pub fn index_of(&self, slot: usize) -> Option<usize> {
        self.units.iter().position(|c| c.slot == slot)
    }

    pub fn initiator(&self) -> &Combatant {
        &self.units[0]
    }

    pub fn defender(&self) -> &Combatant {
        &self.units[1]
    }

    /// 範圍奧義波及的其他單位
    pub fn aoe_victims(&self) -> impl Iterator<Item = (crate::UnitID, i32)> + '_ {
        let defender = self.units[1].unit.id;
        self.sequence.iter().filter_map(move |step| match step {
            CombatStep::Aoe {
                defender: victim,
                damage,
                ..
            } if *victim != defender => Some((*victim, *damage)),
            _ => None,
        })
    }
}

/// 奧義發動時累積的修正
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialFlags {
    pub base_damage_percent: i32,
    pub damage: i32,
    pub reduce_def_res_percent: i32,
    pub situational_fixed_damage: i32,
    pub percent_reductions: Vec<i32>,
    pub flat_reduction: i32,
    pub damage_percent_of_stat: Option<(Stat, i32)>,
    pub damage_percent_of_missing_hp: Option<i32>,
    pub heal_percent_of_damage: Option<i32>,
}

impl Default for SpecialFlags {
    fn default() -> Self {
        Self {
            base_damage_percent: 100,
            damage: 0,
            reduce_def_res_percent: 0,
            situational_fixed_damage: 0,
            percent_reductions: Vec::new(),
            flat_reduction: 0,
            damage_percent_of_stat: None,
            damage_percent_of_missing_hp: None,
            heal_percent_of_damage: None,
        }
    }
}

/// 套用累乘的百分比減傷；以整數精確計算後向下取整減傷量
fn reduce_by_percents(damage: i32, percents: &[i32]) -> i32 {
    if damage <= 0 || percents.is_empty() {
        return damage.max(0);
    }
    let mut numerator: i128 = 1;
    let mut denominator: i128 = 1;
    for percent in percents {
        numerator *= (100 - (*percent).clamp(0, 100)) as i128;
        denominator *= 100;
    }
    let reduction = damage as i128 * (denominator - numerator) / denominator;
    damage - reduction as i32
}

fn run_combat_phase(
    state: &GameState,
    data: &GameData,
    result: &mut CombatResult,
    phase: Phase,
    owners: &[usize],
) {
    let mut effects: EffectBatch = {
        let ctx = EffectContext::combat(result);
        gather_effects(state, data, phase, owners.iter().copied(), &ctx)
    };
    apply_combat_effects(state, &mut effects, result);
}

fn allies_of(state: &GameState, combatant: &Combatant) -> Vec<usize> {
    state.teams[combatant.unit.team]
        .iter()
        .copied()
        .filter(|slot| *slot != combatant.slot)
        .collect()
}

/// 結算 attacker 對 defender 發動的戰鬥（不修改 state）
pub fn resolve_combat(
    state: &GameState,
    data: &GameData,
    attacker: usize,
    defender: usize,
) -> CombatResult {
    let mut result = CombatResult {
        units: [
            Combatant::new(state, attacker, true),
            Combatant::new(state, defender, false),
        ],
        sequence: Vec::new(),
        complete: false,
        next_attacker: 0,
    };
    let both = [attacker, defender];

    run_combat_phase(state, data, &mut result, Phase::BeforeCombat, &both);
    resolve_aoe(state, data, &mut result);

    run_combat_phase(state, data, &mut result, Phase::StartOfCombat, &both);
    for i in 0..2 {
        let allies = allies_of(state, &result.units[i]);
        run_combat_phase(state, data, &mut result, Phase::StartOfAllyCombat, &allies);
    }

    for combatant in result.units.iter_mut() {
        neutralize(combatant);
    }

    run_combat_phase(state, data, &mut result, Phase::DuringCombat, &both);
    for i in 0..2 {
        let allies = allies_of(state, &result.units[i]);
        run_combat_phase(state, data, &mut result, Phase::DuringAllyCombat, &allies);
    }

    let first_totals = [result.units[0].total_stats(), result.units[1].total_stats()];
    for i in 0..2 {
        let (can_attack, vantage, advantage, effective, wrathful) = {
            let me = &result.units[i];
            let foe = &result.units[1 - i];
            (
                me.is_initiator || can_counter(data, me, foe),
                !me.is_initiator
                    && me.flags.has(CombatFlag::Vantage)
                    && !me.flags.has(CombatFlag::HardyBearing)
                    && !foe.flags.has(CombatFlag::HardyBearing),
                advantage_mod(me, foe),
                effective_mod(me, foe),
                me.flags.has(CombatFlag::Wrathful),
            )
        };
        let me = &mut result.units[i];
        me.can_attack = can_attack && me.unit.weapon(data).is_some();
        me.advantage_mod = advantage;
        me.effective_mod = effective;
        if wrathful {
            me.staff_mod = 100;
        }
        if vantage && me.can_attack {
            result.next_attacker = i;
        }
    }

    run_combat_phase(state, data, &mut result, Phase::DuringCombat2, &both);

    let totals = [result.units[0].total_stats(), result.units[1].total_stats()];
    for i in 0..2 {
        let can_double = {
            let me = &result.units[i];
            let guaranteed = if me.flags.has(CombatFlag::NeutralizeGuaranteedFollowUp) {
                0
            } else {
                me.flags.count(CombatFlag::GuaranteedFollowUp)
            };
            let cant = if me.flags.has(CombatFlag::NeutralizeCantFollowUp) {
                0
            } else {
                me.flags.count(CombatFlag::CantFollowUp)
            };
            if cant > guaranteed {
                false
            } else if guaranteed > cant {
                true
            } else {
                first_totals[i].spd - first_totals[1 - i].spd >= 5
            }
        };
        let base_damage = {
            let me = &result.units[i];
            let foe = &result.units[1 - i];
            preview_damage(me, &totals[i], foe, &totals[1 - i])
        };
        result.units[i].can_double = can_double;
        result.units[i].base_damage = base_damage;
    }

    run_exchange(state, data, &mut result);
    result.complete = true;

    debug!(
        "戰鬥 {} -> {}：hp {} / {}，{} 次攻擊",
        result.units[0].unit.hero,
        result.units[1].unit.hero,
        result.units[0].unit.stats.hp,
        result.units[1].unit.stats.hp,
        result.sequence.len()
    );
    result
}

fn resolve_aoe(state: &GameState, data: &GameData, result: &mut CombatResult) {
    let initiator = &result.units[0];
    let Some(special) = initiator.unit.special_skill(data) else {
        return;
    };
    if !special.is_special_type(SpecialType::Aoe)
        || initiator.unit.special.is_none_or(|s| s.current != 0)
    {
        return;
    }
    let Some(aoe) = special.aoe.as_ref() else {
        return;
    };

    let mut flags = SpecialFlags::default();
    let effects = {
        let ctx = EffectContext::combat(result);
        let mut effects = gather_effects(
            state,
            data,
            Phase::OnOffensiveSpecialTrigger,
            [initiator.slot],
            &ctx,
        );
        effects.extend(gather_effects(
            state,
            data,
            Phase::OnAoeSpecialTrigger,
            [initiator.slot],
            &ctx,
        ));
        effects
    };
    apply_special_effects(&effects, &mut flags);

    let atk = result.units[0].unit.visible_stats().atk;
    let def_stat = result.units[0].unit.weapon_type.def_stat();
    let attacker_id = result.units[0].unit.id;
    let center = result.units[1].unit.pos;
    let foe_team = other_team(result.units[0].unit.team);

    for offset in &aoe.shape {
        let pos = center.offset(offset.x, offset.y);
        let Some(victim) = state.teams[foe_team]
            .iter()
            .copied()
            .find(|slot| state.units[*slot].pos == pos)
        else {
            continue;
        };
        let target_def = state.units[victim].visible_stats()[def_stat];
        let damage = percent_of(atk - target_def, aoe.multiplier_percent).max(0)
            + flags.situational_fixed_damage;
        if victim == result.units[1].slot {
            let defender = &mut result.units[1];
            defender.unit.stats.hp = (defender.unit.stats.hp - damage).max(1);
            defender.start_of_combat_hp = defender.unit.stats.hp;
        }
        result.sequence.push(CombatStep::Aoe {
            attacker: attacker_id,
            defender: state.units[victim].id,
            damage,
        });
    }

    if let Some(cooldown) = result.units[0].unit.special.as_mut() {
        cooldown.current = cooldown.max;
    }
}

fn neutralize(combatant: &mut Combatant) {
    let unit = &combatant.unit;
    let panicked = unit.is_panicked();
    let mut adjust = Stats::default();

    if combatant.flags.has(CombatFlag::NeutralizeBonuses) && !panicked {
        for stat in COMBAT_STATS {
            adjust[stat] -= unit.buffs[stat];
        }
    } else if !panicked {
        for stat in combatant.flags.stats(CombatFlag::NeutralizeSpecificBonuses) {
            adjust[stat] -= unit.buffs[stat];
        }
    }

    // 恐慌時加成已經反轉為減益，解除減益要補回兩倍
    let lift = |stat: Stat| -> i32 {
        unit.debuffs[stat] + if panicked { 2 * unit.buffs[stat] } else { 0 }
    };
    if combatant.flags.has(CombatFlag::NeutralizePenalties) {
        for stat in COMBAT_STATS {
            adjust[stat] += lift(stat);
        }
    } else {
        for stat in combatant.flags.stats(CombatFlag::NeutralizeSpecificPenalties) {
            adjust[stat] += lift(stat);
        }
    }

    for stat in COMBAT_STATS {
        combatant.temp_stats[stat] += adjust[stat];
    }
}

fn can_counter(data: &GameData, me: &Combatant, foe: &Combatant) -> bool {
    if me.flags.has(CombatFlag::CantCounterattack) {
        return false;
    }
    if me.flags.has(CombatFlag::CanCounterattackRegardlessOfFoesRange) {
        return true;
    }
    match (me.unit.attack_range(data), foe.unit.attack_range(data)) {
        (Some(mine), Some(theirs)) => mine == theirs,
        (Some(mine), None) => mine == foe.unit.weapon_type.range(),
        _ => false,
    }
}

fn advantage_mod(me: &Combatant, foe: &Combatant) -> i32 {
    use skills_lib::Colour;

    let my_colour = me.unit.weapon_type.colour();
    let foe_colour = foe.unit.weapon_type.colour();
    let mut advantage = if me.flags.has(CombatFlag::WtaVsColourless)
        && foe_colour == Colour::Colourless
    {
        20
    } else if foe.flags.has(CombatFlag::WtaVsColourless) && my_colour == Colour::Colourless {
        -20
    } else {
        my_colour.triangle(foe_colour) * 20
    };

    let we_adept = me.flags.has(CombatFlag::TriangleAdept);
    let they_adept = foe.flags.has(CombatFlag::TriangleAdept);
    if advantage != 0 && (we_adept || they_adept) {
        let we_cancel = me.flags.has(CombatFlag::CancelAffinity);
        let they_cancel = foe.flags.has(CombatFlag::CancelAffinity);
        let sign = advantage.signum();
        if (we_adept && we_cancel) || (they_adept && they_cancel) {
            // 自己抵銷自己的相剋強化
        } else if (we_adept && they_cancel) || (they_adept && we_cancel) {
            advantage -= 20 * sign;
        } else {
            advantage += 20 * sign;
        }
    }
    advantage
}

fn effective_mod(me: &Combatant, foe: &Combatant) -> i32 {
    let move_type = foe.unit.move_type;
    let weapon_type = foe.unit.weapon_type;
    let against_move = me
        .flags
        .has_move_type(CombatFlag::EffectiveAgainstMoveType, move_type)
        && !foe
            .flags
            .has_move_type(CombatFlag::NeutralizeEffectiveAgainstMoveType, move_type);
    let against_weapon = me
        .flags
        .has_weapon_type(CombatFlag::EffectiveAgainstWeaponType, weapon_type)
        && !foe
            .flags
            .has_weapon_type(CombatFlag::NeutralizeEffectiveAgainstWeaponType, weapon_type);
    if against_move || against_weapon { 50 } else { 0 }
}

fn defense_stat(me: &Combatant, foe_total: &Stats) -> i32 {
    if me.flags.has(CombatFlag::CalculateDamageUsingLowerOfDefRes) {
        foe_total.def.min(foe_total.res)
    } else {
        foe_total[me.unit.weapon_type.def_stat()]
    }
}

fn preview_damage(me: &Combatant, my_total: &Stats, foe: &Combatant, foe_total: &Stats) -> i32 {
    let def = defense_stat(me, foe_total);
    let mut damage = my_total.atk;
    damage += percent_of(damage, me.advantage_mod);
    damage += percent_of(damage, me.effective_mod);
    damage -= def;
    if foe.on_defensive_terrain {
        damage -= percent_of(def, 30);
    }
    damage.max(0)
}

fn run_exchange(state: &GameState, data: &GameData, result: &mut CombatResult) {
    let mut last_attacker: Option<usize> = None;
    loop {
        let (a, d) = (result.next_attacker, 1 - result.next_attacker);
        if !result.units[0].is_alive() || !result.units[1].is_alive() {
            break;
        }
        if result.units[0].done_attacking() && result.units[1].done_attacking() {
            break;
        }

        if !result.units[a].done_attacking() {
            perform_attack(state, data, result, last_attacker == Some(a));
            last_attacker = Some(a);
            if result.units[a].flags.has(CombatFlag::AttacksTwice)
                && result.units[d].is_alive()
                && result.units[a].is_alive()
            {
                perform_attack(state, data, result, true);
            }
        }

        let desperation = {
            let me = &result.units[a];
            let foe = &result.units[d];
            me.can_attack
                && me.can_double
                && !me.follow_up_done
                && me.flags.has(CombatFlag::Desperation)
                && !me.flags.has(CombatFlag::HardyBearing)
                && !foe.flags.has(CombatFlag::HardyBearing)
        };
        if !desperation {
            result.next_attacker = d;
        }
    }
}

fn perform_attack(state: &GameState, data: &GameData, result: &mut CombatResult, consecutive: bool) {
    let (a, d) = (result.next_attacker, 1 - result.next_attacker);
    let attacker_total = result.units[a].total_stats();
    let defender_total = result.units[d].total_stats();
    let attacker_special = result.units[a].unit.special_skill(data);
    let defender_special = result.units[d].unit.special_skill(data);

    let attacker_triggered = attacker_special.is_some_and(|s| s.is_special_type(SpecialType::Offensive))
        && result.units[a].unit.special.is_some_and(|s| s.current == 0);
    let defender_triggered = defender_special.is_some_and(|s| {
        s.is_special_type(SpecialType::Defensive)
            && result.units[d].unit.special.is_some_and(|c| c.current == 0)
            && evaluate_condition(
                state,
                data,
                &EffectContext::combat(result),
                result.units[d].slot,
                s.trigger_condition.as_ref(),
            )
    });

    let mut flags = SpecialFlags::default();
    {
        let ctx = EffectContext::combat(result);
        if attacker_triggered {
            let effects = gather_effects(
                state,
                data,
                Phase::OnOffensiveSpecialTrigger,
                [result.units[a].slot],
                &ctx,
            );
            apply_special_effects(&effects, &mut flags);
        }
        if defender_triggered {
            let effects = gather_effects(
                state,
                data,
                Phase::OnDefensiveSpecialTrigger,
                [result.units[d].slot],
                &ctx,
            );
            apply_special_effects(&effects, &mut flags);
        }
    }
    if let Some((stat, percent)) = flags.damage_percent_of_stat {
        flags.damage += percent_of(attacker_total[stat], percent);
    }
    if let Some(percent) = flags.damage_percent_of_missing_hp {
        let unit = &result.units[a].unit;
        flags.damage += percent_of(unit.max_hp - unit.stats.hp, percent);
    }

    let attacker = &result.units[a];
    let defender = &result.units[d];
    let def = defense_stat(attacker, &defender_total);
    let mut base = attacker_total.atk;
    base += percent_of(base, attacker.advantage_mod);
    base += percent_of(base, attacker.effective_mod);
    base -= def;
    if defender.on_defensive_terrain {
        base -= percent_of(def, 30);
    }
    base += percent_of(def, flags.reduce_def_res_percent);
    base += flags.damage;
    base = percent_of(base, flags.base_damage_percent).max(0);

    let fixed = flags.situational_fixed_damage + attacker.constant_fixed_damage;
    let damage = percent_of(base + fixed, attacker.staff_mod);

    let mut reductions = flags.percent_reductions.clone();
    if consecutive {
        reductions.extend(defender.flags.percents(CombatFlag::ConsecutiveHitDamageReduction));
        reductions.extend(defender.flags.percents(CombatFlag::ConsecutiveAttackDamageReduction));
    }
    if attacker.times_attacked == 0 {
        reductions.extend(defender.flags.percents(CombatFlag::FirstAttackDamageReduction));
    }
    let mut damage = (reduce_by_percents(damage, &reductions) - flags.flat_reduction).max(0);

    let defender_hp = defender.unit.stats.hp;
    let miracle = defender_special.is_some_and(|s| s.is_special_type(SpecialType::Miracle))
        && defender.unit.special.is_some_and(|c| c.current == 0)
        && defender_hp > 1
        && damage >= defender_hp;
    if miracle {
        damage = defender_hp - 1;
    }

    let heal_percent = flags.heal_percent_of_damage.unwrap_or(0)
        + attacker.flags.count(CombatFlag::PercentHealingOnHit);
    let healing = percent_of(damage, heal_percent);

    let attacker_charge = charge_amount(attacker, CombatFlag::SpecialChargesPerUnitAttack);
    let defender_charge = charge_amount(defender, CombatFlag::SpecialChargesPerFoeAttack);
    let attacker_id = attacker.unit.id;
    let defender_id = defender.unit.id;

    let mut charges = [0; 2];
    {
        let defender = &mut result.units[d];
        defender.unit.stats.hp = (defender_hp - damage).max(0);
        if let Some(cooldown) = defender.unit.special.as_mut() {
            let before = cooldown.current;
            if defender_triggered || miracle {
                cooldown.current = cooldown.max;
            } else {
                cooldown.current = (cooldown.current - defender_charge).max(0);
            }
            charges[1] = cooldown.current - before;
        }
    }
    {
        let attacker = &mut result.units[a];
        attacker.unit.stats.hp = (attacker.unit.stats.hp + healing).min(attacker.unit.max_hp);
        if let Some(cooldown) = attacker.unit.special.as_mut() {
            let before = cooldown.current;
            if attacker_triggered {
                cooldown.current = cooldown.max;
            } else {
                cooldown.current = (cooldown.current - attacker_charge).max(0);
            }
            charges[0] = cooldown.current - before;
        }
        attacker.times_attacked += 1;
        let per_strike = attacker.attacks_per_strike();
        attacker.first_attack_done = attacker.times_attacked >= per_strike;
        attacker.follow_up_done = attacker.times_attacked >= 2 * per_strike;
    }

    result.sequence.push(CombatStep::Attack(AttackStep {
        attacker: attacker_id,
        defender: defender_id,
        attacker_special_triggered: attacker_triggered,
        defender_special_triggered: defender_triggered || miracle,
        charges,
        damage,
        healing,
    }));
}

/// 單次攻擊的奧義充能：1 + 加速 - 減速，不低於 0
///
/// 加速與減速各自最多 1，多個來源不疊加
fn charge_amount(combatant: &Combatant, role_flag: CombatFlag) -> i32 {
    let flags = &combatant.flags;
    let extra = i32::from(
        !flags.has(CombatFlag::NeutralizeSpecialCharges)
            && (flags.has(CombatFlag::SpecialChargesPerAttack) || flags.has(role_flag)),
    );
    let guard = if flags.has(CombatFlag::Guard) && !flags.has(CombatFlag::NeutralizeGuard) {
        1
    } else {
        0
    };
    (1 + extra - guard).max(0)
}
