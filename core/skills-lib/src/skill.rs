use crate::{
    AssistType, Calculation, Condition, Effect, HeroID, MoveType, MovementAssist, SkillType,
    SpecialType, Stat, StatusType, Stats, WeaponType,
};
use serde::{Deserialize, Serialize};

/// 技能資料結構。依 skill_type 不同，只有部分欄位有意義
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Skill {
    pub name: String,
    #[serde(rename = "type")]
    pub skill_type: SkillType,
    // 武器
    #[serde(default)]
    pub weapon_type: Option<WeaponType>,
    #[serde(default)]
    pub might: i32,
    // 輔助
    #[serde(default)]
    pub range: Option<i32>,
    #[serde(default)]
    pub assist_type: Option<AssistType>,
    #[serde(default)]
    pub movement_assist: Option<MovementAssist>,
    #[serde(default)]
    pub heal: Option<HealInfo>,
    #[serde(default)]
    pub self_heal: Option<HealInfo>,
    #[serde(default)]
    pub rally_buffs: Vec<RallyBuff>,
    #[serde(default)]
    pub amount: Option<i32>,
    // 奧義
    #[serde(default)]
    pub special_type: Option<SpecialType>,
    #[serde(default)]
    pub cooldown: Option<i32>,
    #[serde(default)]
    pub trigger_condition: Option<Condition>,
    #[serde(default)]
    pub aoe: Option<AoeInfo>,
    // 習得限制
    #[serde(default)]
    pub can_use: Option<CanUse>,
    #[serde(default)]
    pub available_as_seal: bool,
    #[serde(default)]
    pub can_be_refined: bool,
    #[serde(default)]
    pub effect_refine: Vec<Effect>,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

impl Skill {
    pub fn is_special_type(&self, special_type: SpecialType) -> bool {
        self.special_type == Some(special_type)
    }

    pub fn is_assist_type(&self, assist_type: AssistType) -> bool {
        self.assist_type == Some(assist_type)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
}

/// 範圍奧義：以防守者為中心的偏移與傷害倍率
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AoeInfo {
    pub shape: Vec<Offset>,
    pub multiplier_percent: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HealInfo {
    pub calculations: Vec<Calculation>,
    #[serde(default)]
    pub min: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct RallyBuff {
    pub stat: Stat,
    pub value: i32,
}

/// 習得限制：各清單非空時都必須符合
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct CanUse {
    #[serde(default)]
    pub unit: Vec<HeroID>,
    #[serde(default)]
    pub weapon_type: Vec<WeaponType>,
    #[serde(default)]
    pub move_type: Vec<MoveType>,
}

impl CanUse {
    pub fn allows(&self, hero: &str, weapon_type: WeaponType, move_type: MoveType) -> bool {
        (self.unit.is_empty() || self.unit.iter().any(|u| u == hero))
            && (self.weapon_type.is_empty() || self.weapon_type.contains(&weapon_type))
            && (self.move_type.is_empty() || self.move_type.contains(&move_type))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Hero {
    pub name: String,
    pub weapon_type: WeaponType,
    pub move_type: MoveType,
    pub level1_stats: Stats,
    pub level40_stats: Stats,
    #[serde(default)]
    pub superboons: Vec<Stat>,
    #[serde(default)]
    pub superbanes: Vec<Stat>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StatusDef {
    pub name: String,
    #[serde(rename = "type")]
    pub status_type: StatusType,
    #[serde(default)]
    pub effects: Vec<Effect>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_use() {
        let test_data = [
            (CanUse::default(), "ANNA", WeaponType::Axe, MoveType::Infantry, true),
            (
                CanUse {
                    unit: vec!["ALFONSE".to_string()],
                    ..Default::default()
                },
                "ANNA",
                WeaponType::Axe,
                MoveType::Infantry,
                false,
            ),
            (
                CanUse {
                    weapon_type: vec![WeaponType::Staff],
                    ..Default::default()
                },
                "AZAMA",
                WeaponType::Staff,
                MoveType::Infantry,
                true,
            ),
            (
                CanUse {
                    weapon_type: vec![WeaponType::Staff],
                    move_type: vec![MoveType::Cavalry],
                    ..Default::default()
                },
                "AZAMA",
                WeaponType::Staff,
                MoveType::Infantry,
                false,
            ),
        ];
        for (idx, (can_use, hero, weapon, mv, expected)) in test_data.iter().enumerate() {
            assert_eq!(can_use.allows(hero, *weapon, *mv), *expected, "Case {}", idx);
        }
    }
}
