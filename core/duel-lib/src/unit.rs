//! 單位：由配置（Build）與靜態資料建立的棋子

use crate::error::{BuildError, Result};
use crate::{Pos, TeamID, UnitID};
use serde::{Deserialize, Serialize};
use skills_lib::{
    ALL_STATS, COMBAT_STATS, EffectAction, GameData, Hero, HeroID, MoveType, PANIC_STATUS, Phase,
    Skill, SkillID, SkillType, Stat, Stats, StatusID, WeaponType,
};
use tracing::warn;

/// 玩家送出的單位配置
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Build {
    pub hero: HeroID,
    #[serde(default)]
    pub boon: Option<Stat>,
    #[serde(default)]
    pub bane: Option<Stat>,
    #[serde(default)]
    pub merges: u32,
    #[serde(default)]
    pub skills: Vec<SkillID>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecialCooldown {
    pub current: i32,
    pub max: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Unit {
    pub id: UnitID,
    pub hero: HeroID,
    pub team: TeamID,
    pub pos: Pos,
    pub weapon_type: WeaponType,
    pub move_type: MoveType,
    /// stats.hp 是目前 hp
    pub stats: Stats,
    pub max_hp: i32,
    /// 只在能力比較時計入
    pub phantom_stats: Stats,
    pub special: Option<SpecialCooldown>,
    pub skills: Vec<SkillID>,
    pub buffs: Stats,
    pub debuffs: Stats,
    pub bonuses: Vec<StatusID>,
    pub penalties: Vec<StatusID>,
    pub has_action: bool,
    pub combats_in_phase: u32,
    pub alive: bool,
}

impl Unit {
    /// 依配置建立單位並套用裝備效果
    pub fn from_build(
        data: &GameData,
        build: &Build,
        id: UnitID,
        team: TeamID,
        pos: Pos,
    ) -> Result<Unit> {
        let hero = data.hero(&build.hero).ok_or_else(|| BuildError::UnknownHero {
            hero: build.hero.clone(),
        })?;
        let mut stats = calculate_base_stats(hero, build.boon, build.bane, build.merges);

        let mut special = None;
        let mut might = 0;
        for skill_id in &build.skills {
            let skill = data.skill(skill_id).ok_or_else(|| BuildError::UnknownSkill {
                skill: skill_id.clone(),
            })?;
            match skill.skill_type {
                SkillType::Weapon => might = skill.might,
                SkillType::Special => {
                    if let Some(cooldown) = skill.cooldown {
                        special = Some(SpecialCooldown {
                            current: cooldown,
                            max: cooldown,
                        });
                    }
                }
                _ => {}
            }
        }
        stats.atk += might;

        let mut unit = Unit {
            id,
            hero: build.hero.clone(),
            team,
            pos,
            weapon_type: hero.weapon_type,
            move_type: hero.move_type,
            stats,
            max_hp: stats.hp,
            phantom_stats: Stats::default(),
            special,
            skills: build.skills.clone(),
            buffs: Stats::default(),
            debuffs: Stats::default(),
            bonuses: Vec::new(),
            penalties: Vec::new(),
            has_action: true,
            combats_in_phase: 0,
            alive: true,
        };
        unit.apply_equip_effects(data);
        unit.max_hp = unit.stats.hp;
        Ok(unit)
    }

    fn apply_equip_effects(&mut self, data: &GameData) {
        let actions: Vec<EffectAction> = self
            .skills
            .iter()
            .filter_map(|id| data.skill(id))
            .flat_map(|skill| skill.effects.iter())
            .filter(|effect| effect.phase == Phase::OnEquip)
            .filter(|effect| {
                if effect.condition.is_some() {
                    warn!("裝備效果不支援條件，略過 ({})", self.hero);
                    return false;
                }
                true
            })
            .flat_map(|effect| effect.actions.iter().cloned())
            .collect();

        for action in actions {
            match action {
                EffectAction::EquipStatMod { stat, value } => {
                    self.stats[stat] = (self.stats[stat] + value).max(0);
                }
                EffectAction::PhantomStat { stat, value } => {
                    self.phantom_stats[stat] += value;
                }
                EffectAction::MaxSpecialCooldownMod { value } => {
                    if let Some(special) = &mut self.special {
                        special.max = (special.max + value).max(1);
                        special.current = (special.current + value).max(1);
                    }
                }
                other => warn!("裝備階段不支援的動作: {}", other),
            }
        }
    }

    pub fn skill_of_type<'a>(&self, data: &'a GameData, skill_type: SkillType) -> Option<&'a Skill> {
        self.skills
            .iter()
            .filter_map(|id| data.skill(id))
            .find(|skill| skill.skill_type == skill_type)
    }

    pub fn weapon<'a>(&self, data: &'a GameData) -> Option<&'a Skill> {
        self.skill_of_type(data, SkillType::Weapon)
    }

    pub fn assist<'a>(&self, data: &'a GameData) -> Option<&'a Skill> {
        self.skill_of_type(data, SkillType::Assist)
    }

    pub fn special_skill<'a>(&self, data: &'a GameData) -> Option<&'a Skill> {
        self.skill_of_type(data, SkillType::Special)
    }

    /// 有裝備武器才有攻擊距離
    pub fn attack_range(&self, data: &GameData) -> Option<i32> {
        self.weapon(data).map(|_| self.weapon_type.range())
    }

    pub fn is_panicked(&self) -> bool {
        self.penalties.iter().any(|p| p == PANIC_STATUS)
    }

    /// 可見能力：能力 + 加成 - 減益；恐慌時加成反轉
    pub fn visible_stats(&self) -> Stats {
        let mut visible = self.stats;
        let panicked = self.is_panicked();
        for stat in COMBAT_STATS {
            let buff = if panicked {
                -self.buffs[stat]
            } else {
                self.buffs[stat]
            };
            visible[stat] = (self.stats[stat] + buff - self.debuffs[stat]).max(0);
        }
        visible
    }

    pub fn hp_percent(&self) -> i32 {
        if self.max_hp <= 0 {
            return 0;
        }
        self.stats.hp * 100 / self.max_hp
    }
}

/// 計算等級 40 的基礎能力（含優劣勢與突破）
///
/// - 優勢 +3（超優勢 +4）；劣勢 -3（超劣勢 -4），突破後劣勢取消
/// - 突破依一級能力由高到低排序，輪流加到前兩項；第一次突破且配置無劣勢時前三項另 +1
pub fn calculate_base_stats(
    hero: &Hero,
    boon: Option<Stat>,
    bane: Option<Stat>,
    merges: u32,
) -> Stats {
    let mut stats = hero.level40_stats;
    let mut level1 = hero.level1_stats;

    if let Some(stat) = boon {
        let value = if hero.superboons.contains(&stat) { 4 } else { 3 };
        stats[stat] += value;
        level1[stat] += value;
    }
    if let Some(stat) = bane
        && merges == 0
    {
        let value = if hero.superbanes.contains(&stat) { 4 } else { 3 };
        stats[stat] -= value;
        level1[stat] -= value;
    }

    // 穩定排序：同分時依 hp/atk/spd/def/res 的順序
    let mut sorted = ALL_STATS;
    sorted.sort_by(|a, b| level1[*b].cmp(&level1[*a]));

    for i in 1..=merges as usize {
        let offset = i - 1;
        if i == 1 && bane.is_none() {
            for stat in &sorted[..3] {
                stats[*stat] += 1;
            }
        }
        stats[sorted[(i + offset - 1) % 5]] += 1;
        stats[sorted[(i + offset) % 5]] += 1;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero() -> Hero {
        Hero {
            name: "Tester".to_string(),
            weapon_type: WeaponType::Sword,
            move_type: MoveType::Infantry,
            level1_stats: Stats::new(19, 9, 6, 8, 5),
            level40_stats: Stats::new(43, 35, 25, 32, 22),
            superboons: vec![Stat::Spd],
            superbanes: vec![Stat::Def],
        }
    }

    #[test]
    fn test_calculate_base_stats() {
        let hero = hero();
        let test_data = [
            (None, None, 0, Stats::new(43, 35, 25, 32, 22)),
            (Some(Stat::Atk), None, 0, Stats::new(43, 38, 25, 32, 22)),
            (Some(Stat::Spd), Some(Stat::Def), 0, Stats::new(43, 35, 29, 28, 22)),
            (None, Some(Stat::Res), 0, Stats::new(43, 35, 25, 32, 19)),
            // 一次突破：前三項 hp/atk/def +1，再 +1 到 hp、atk
            (None, None, 1, Stats::new(45, 37, 25, 33, 22)),
            // 突破後劣勢取消，但不再有前三項加成
            (None, Some(Stat::Res), 1, Stats::new(44, 36, 25, 32, 22)),
            (Some(Stat::Atk), Some(Stat::Hp), 1, Stats::new(44, 39, 25, 32, 22)),
            // 兩次突破：再 +1 到 def、spd
            (None, None, 2, Stats::new(45, 37, 26, 34, 22)),
        ];
        for (idx, (boon, bane, merges, expected)) in test_data.iter().enumerate() {
            assert_eq!(
                calculate_base_stats(&hero, *boon, *bane, *merges),
                *expected,
                "Case {}",
                idx
            );
        }
    }

    #[test]
    fn test_visible_stats_with_panic() {
        let mut unit = Unit {
            id: 101,
            hero: "TESTER".to_string(),
            team: 0,
            pos: Pos::new(0, 0),
            weapon_type: WeaponType::Sword,
            move_type: MoveType::Infantry,
            stats: Stats::new(40, 30, 20, 10, 5),
            max_hp: 40,
            phantom_stats: Stats::default(),
            special: None,
            skills: Vec::new(),
            buffs: Stats::new(0, 6, 0, 0, 0),
            debuffs: Stats::new(0, 0, 0, 15, 0),
            bonuses: Vec::new(),
            penalties: Vec::new(),
            has_action: true,
            combats_in_phase: 0,
            alive: true,
        };
        let visible = unit.visible_stats();
        assert_eq!(visible.atk, 36);
        assert_eq!(visible.def, 0);

        unit.penalties.push(PANIC_STATUS.to_string());
        assert_eq!(unit.visible_stats().atk, 24);
    }
}
