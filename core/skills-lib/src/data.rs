use crate::{
    CombatFlag, Condition, Effect, EffectAction, Hero, HeroID, Phase, Skill, SkillID, SkillType,
    Stat, StatusDef, StatusID, Target, WeaponType,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

const BUILTIN_HEROES: &str = include_str!("../data/heroes.toml");
const BUILTIN_SKILLS: &str = include_str!("../data/skills.toml");
const BUILTIN_STATUSES: &str = include_str!("../data/statuses.toml");

pub const SEAL_SUFFIX: &str = "_SEAL";

/// 資料載入錯誤
#[derive(Debug, Error)]
pub enum DataError {
    #[error("TOML 解析失敗: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{owner} 引用了不存在的{kind}: {reference}")]
    UnknownReference {
        owner: String,
        kind: &'static str,
        reference: String,
    },
}

/// 所有靜態資料表，載入一次後以參考傳遞給引擎
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct GameData {
    #[serde(default)]
    pub heroes: BTreeMap<HeroID, Hero>,
    #[serde(default)]
    pub skills: BTreeMap<SkillID, Skill>,
    #[serde(default)]
    pub statuses: BTreeMap<StatusID, StatusDef>,
}

impl GameData {
    /// 內建資料集（已展開聖印與鍛造版本）
    pub fn builtin() -> Result<Self, DataError> {
        Self::from_toml_sources(&[BUILTIN_HEROES, BUILTIN_SKILLS, BUILTIN_STATUSES])
    }

    /// 合併多份 TOML 文件，展開衍生技能並檢查引用
    pub fn from_toml_sources(sources: &[&str]) -> Result<Self, DataError> {
        let mut data = GameData::default();
        for source in sources {
            data.merge(Self::parse_toml(source)?);
        }
        data.expand();
        data.validate_references()?;
        Ok(data)
    }

    /// 只解析，不展開
    pub fn parse_toml(source: &str) -> Result<Self, DataError> {
        Ok(toml::from_str(source)?)
    }

    /// 後者覆蓋前者的同名項目
    pub fn merge(&mut self, other: GameData) {
        self.heroes.extend(other.heroes);
        self.skills.extend(other.skills);
        self.statuses.extend(other.statuses);
    }

    pub fn hero(&self, id: &str) -> Option<&Hero> {
        self.heroes.get(id)
    }

    pub fn skill(&self, id: &str) -> Option<&Skill> {
        self.skills.get(id)
    }

    pub fn status(&self, id: &str) -> Option<&StatusDef> {
        self.statuses.get(id)
    }

    /// 產生 `<ID>_SEAL` 與 `<ID>_REFINE_*` 技能
    pub fn expand(&mut self) {
        let mut derived = Vec::new();
        for (id, skill) in &self.skills {
            if skill.available_as_seal && skill.skill_type != SkillType::S {
                let mut seal = skill.clone();
                seal.skill_type = SkillType::S;
                seal.available_as_seal = false;
                derived.push((format!("{}{}", id, SEAL_SUFFIX), seal));
            }
            if skill.can_be_refined && skill.skill_type == SkillType::Weapon {
                derived.extend(refine_variants(id, skill));
            }
        }
        for (id, skill) in derived {
            self.skills.entry(id).or_insert(skill);
        }
    }

    fn validate_references(&self) -> Result<(), DataError> {
        for (id, skill) in &self.skills {
            if let Some(can_use) = &skill.can_use {
                for hero in &can_use.unit {
                    if !self.heroes.contains_key(hero) {
                        return Err(DataError::UnknownReference {
                            owner: id.clone(),
                            kind: "英雄",
                            reference: hero.clone(),
                        });
                    }
                }
            }
            self.validate_effect_statuses(id, &skill.effects)?;
        }
        for (id, status) in &self.statuses {
            self.validate_effect_statuses(id, &status.effects)?;
        }
        Ok(())
    }

    fn validate_effect_statuses(&self, owner: &str, effects: &[Effect]) -> Result<(), DataError> {
        for action in effects.iter().flat_map(|e| e.actions.iter()) {
            if let EffectAction::ApplyStatus { status, .. } = action
                && !self.statuses.contains_key(status)
            {
                return Err(DataError::UnknownReference {
                    owner: owner.to_string(),
                    kind: "狀態",
                    reference: status.clone(),
                });
            }
        }
        Ok(())
    }
}

// 鍛造數值表：(後綴, hp, 能力, 能力加值)
const MELEE_REFINES: [(&str, i32, Stat, i32); 4] = [
    ("ATK", 5, Stat::Atk, 2),
    ("SPD", 5, Stat::Spd, 3),
    ("DEF", 5, Stat::Def, 4),
    ("RES", 5, Stat::Res, 4),
];
const RANGED_REFINES: [(&str, i32, Stat, i32); 4] = [
    ("ATK", 2, Stat::Atk, 1),
    ("SPD", 2, Stat::Spd, 2),
    ("DEF", 2, Stat::Def, 3),
    ("RES", 2, Stat::Res, 3),
];
const MELEE_EFFECT_REFINE_HP: i32 = 3;

fn equip(stat: Stat, value: i32) -> EffectAction {
    EffectAction::EquipStatMod { stat, value }
}

fn refined(base: &Skill, label: &str, extra: Vec<Effect>) -> Skill {
    let mut skill = base.clone();
    skill.name = format!("{} ({})", base.name, label);
    skill.can_be_refined = false;
    skill.effect_refine = Vec::new();
    skill.effects.extend(extra);
    skill
}

fn refine_variants(id: &str, skill: &Skill) -> Vec<(SkillID, Skill)> {
    let mut variants = Vec::new();
    let Some(weapon_type) = skill.weapon_type else {
        return variants;
    };

    if weapon_type == WeaponType::Staff {
        let wrathful = Effect {
            phase: Phase::DuringCombat,
            condition: None,
            actions: vec![EffectAction::SetCombatFlag {
                flag: CombatFlag::Wrathful,
                target: Target::SelfUnit,
                percent: None,
                stat: None,
                move_type: None,
                weapon_type: None,
            }],
        };
        let dazzle = Effect {
            phase: Phase::DuringCombat,
            condition: Some(Condition::UnitInitiatesCombat),
            actions: vec![EffectAction::SetCombatFlag {
                flag: CombatFlag::CantCounterattack,
                target: Target::Foe,
                percent: None,
                stat: None,
                move_type: None,
                weapon_type: None,
            }],
        };
        variants.push((
            format!("{}_REFINE_WRATHFUL", id),
            refined(skill, "Wrathful", vec![wrathful]),
        ));
        variants.push((
            format!("{}_REFINE_DAZZLE", id),
            refined(skill, "Dazzling", vec![dazzle]),
        ));
        return variants;
    }

    let table = if weapon_type.is_ranged() {
        &RANGED_REFINES
    } else {
        &MELEE_REFINES
    };
    for (suffix, hp, stat, value) in table {
        let effect = Effect {
            phase: Phase::OnEquip,
            condition: None,
            actions: vec![equip(Stat::Hp, *hp), equip(*stat, *value)],
        };
        variants.push((
            format!("{}_REFINE_{}", id, suffix),
            refined(skill, &format!("+{}", suffix), vec![effect]),
        ));
    }

    if !skill.effect_refine.is_empty() {
        let mut extra = skill.effect_refine.clone();
        if !weapon_type.is_ranged() {
            extra.push(Effect {
                phase: Phase::OnEquip,
                condition: None,
                actions: vec![equip(Stat::Hp, MELEE_EFFECT_REFINE_HP)],
            });
        }
        variants.push((
            format!("{}_REFINE_EFF", id),
            refined(skill, "+EFF", extra),
        ));
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
[heroes.TESTER]
name = "Tester"
weapon_type = "sword"
move_type = "infantry"
level1_stats = { hp = 18, atk = 8, spd = 6, def = 7, res = 4 }
level40_stats = { hp = 40, atk = 30, spd = 25, def = 20, res = 15 }

[skills.EDGE]
name = "Edge"
type = "weapon"
weapon_type = "sword"
might = 16
can_be_refined = true

[[skills.EDGE.effect_refine]]
phase = "during_combat"
actions = [{ type = "combat_stat_mod", stat = "atk", value = 4 }]

[skills.BOW]
name = "Bow"
type = "weapon"
weapon_type = "colourless_bow"
might = 13
can_be_refined = true

[skills.HEAL]
name = "Heal"
type = "weapon"
weapon_type = "staff"
might = 8
can_be_refined = true

[skills.GUARDING]
name = "Guarding"
type = "b"
available_as_seal = true
"#;

    #[test]
    fn test_expand_refines_and_seals() {
        let data = GameData::from_toml_sources(&[SOURCE]).expect("load");

        let atk = data.skill("EDGE_REFINE_ATK").expect("atk refine");
        assert_eq!(atk.effects.len(), 1);
        assert_eq!(
            atk.effects[0].actions,
            vec![equip(Stat::Hp, 5), equip(Stat::Atk, 2)]
        );
        assert!(!atk.can_be_refined);

        let eff = data.skill("EDGE_REFINE_EFF").expect("effect refine");
        assert_eq!(eff.effects.len(), 2);

        let bow_spd = data.skill("BOW_REFINE_SPD").expect("bow refine");
        assert_eq!(
            bow_spd.effects[0].actions,
            vec![equip(Stat::Hp, 2), equip(Stat::Spd, 2)]
        );
        assert!(data.skill("BOW_REFINE_EFF").is_none());

        assert!(data.skill("HEAL_REFINE_WRATHFUL").is_some());
        assert!(data.skill("HEAL_REFINE_ATK").is_none());

        let seal = data.skill("GUARDING_SEAL").expect("seal");
        assert_eq!(seal.skill_type, SkillType::S);
    }

    #[test]
    fn test_unknown_status_reference() {
        let source = r#"
[skills.BROKEN]
name = "Broken"
type = "c"

[[skills.BROKEN.effects]]
phase = "start_of_turn"
actions = [{ type = "apply_status", status = "NOPE", target = { type = "foes_within_x_spaces", spaces = 2 } }]
"#;
        let err = GameData::from_toml_sources(&[source]).unwrap_err();
        assert!(matches!(err, DataError::UnknownReference { .. }), "{}", err);
    }

    #[test]
    fn test_builtin_loads() {
        let data = GameData::builtin().expect("builtin data");
        assert!(data.hero("ALFONSE").is_some());
        assert!(data.skill("FOLKVANGR").is_some());
        assert!(data.status("PANIC").is_some());
    }
}
