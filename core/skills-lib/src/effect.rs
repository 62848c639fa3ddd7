use crate::{
    CombatFlag, MoveType, MovementAssist, MovementFlag, Phase, Stat, StatCheckType, StatusID,
    WeaponType,
};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// 綁定在某個執行時機的效果：條件成立時依序執行 actions
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Effect {
    pub phase: Phase,
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub actions: Vec<EffectAction>,
}

/// 能力比較條件：單位 stat (+ modifier) 與敵方 stat (+ modifier)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StatComparison {
    pub unit_stat: Stat,
    pub foe_stat: Stat,
    #[serde(default)]
    pub stat_type: StatCheckType,
    #[serde(default)]
    pub unit_modifier: i32,
    #[serde(default)]
    pub foe_modifier: i32,
}

/// hp 門檻：percent 與 value 擇一
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq)]
pub struct HpThreshold {
    #[serde(default)]
    pub percent: Option<i32>,
    #[serde(default)]
    pub value: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Display, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type")]
#[strum(serialize_all = "snake_case")]
pub enum Condition {
    And {
        conditions: Vec<Condition>,
    },
    Or {
        conditions: Vec<Condition>,
    },
    IsTurnCount {
        turn_count: u32,
    },
    IsOddTurn,
    IsEvenTurn,
    EveryThirdTurn,
    UnitInitiatesCombat,
    FoeInitiatesCombat,
    UnitHpGreaterThan(HpThreshold),
    UnitHpGreaterThanEqualTo(HpThreshold),
    UnitHpLessThan(HpThreshold),
    UnitHpLessThanEqualTo(HpThreshold),
    UnitHpIsMaxHp {
        #[serde(default)]
        check_start_of_combat_hp: bool,
    },
    FoeHpGreaterThan(HpThreshold),
    FoeHpGreaterThanEqualTo(HpThreshold),
    FoeHpLessThan(HpThreshold),
    FoeHpLessThanEqualTo(HpThreshold),
    FoeHpIsMaxHp,
    BuffActiveOnUnit,
    DebuffActiveOnUnit,
    BonusActiveOnUnit,
    PenaltyActiveOnUnit,
    UnitWithinXSpacesOfAlly {
        spaces: i32,
        #[serde(default)]
        move_type: Option<MoveType>,
        #[serde(default)]
        weapon_type: Option<WeaponType>,
        #[serde(default = "default_count")]
        count: usize,
    },
    UnitIsAdjacentToAlly,
    UnitNotAdjacentToAlly,
    AllyInCombatWithinXSpacesOfUnit {
        spaces: i32,
        #[serde(default)]
        move_type: Option<MoveType>,
        #[serde(default)]
        weapon_type: Option<WeaponType>,
    },
    MovingAllyWithinXSpacesOfUnit {
        spaces: i32,
        #[serde(default)]
        move_type: Option<MoveType>,
    },
    FoeIsMoveType {
        move_type: MoveType,
    },
    FoeIsWeaponType {
        weapon_type: WeaponType,
    },
    FoeCanCounter,
    FoeHasXRange {
        range: i32,
    },
    UnitAttackedDuringCombat,
    FoesAttackCanTriggerUnitsSpecial,
    FirstCombatInPhase,
    UnitStatGreaterThanFoe(StatComparison),
    UnitStatGreaterThanEqualToFoe(StatComparison),
    UnitStatLessThanFoe(StatComparison),
    UnitStatLessThanEqualToFoe(StatComparison),
    AllyStatGreaterThanFoe {
        ally_stat: Stat,
        foe_stat: Stat,
        #[serde(default)]
        stat_type: StatCheckType,
    },
    UnitInCaptureArea,
    /// 尚未支援的條件種類，評估為 false
    #[serde(other)]
    Unknown,
}

fn default_count() -> usize {
    1
}

/// 效果數值的計算方式
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Calculation {
    PercentOfStat {
        stat: Stat,
        percent: i32,
    },
    Value {
        value: i32,
    },
    MissingHp {
        percent: i32,
    },
    LowHpBoost,
    PercentDamageDealt {
        percent: i32,
    },
    TotalBonusesOnUnit,
    NumberOfAlliesWithinXSpaces {
        spaces: i32,
        #[serde(default = "default_multiplier")]
        multiplier: i32,
        #[serde(default = "default_max")]
        max: i32,
    },
    HpRestoredToTarget,
}

fn default_multiplier() -> i32 {
    1
}

fn default_max() -> i32 {
    99
}

/// 比較 unit_stat 與對象的 other_stat，單位較高才納入
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct StatFilter {
    pub unit_stat: Stat,
    pub other_stat: Stat,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, Display, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type")]
#[strum(serialize_all = "snake_case")]
pub enum Target {
    #[default]
    #[serde(rename = "self")]
    #[strum(serialize = "self")]
    SelfUnit,
    AllyInCombat,
    Foe,
    FoeInCombat,
    FoePostCombat,
    FoesWithinXSpacesOfFoe {
        spaces: i32,
    },
    FoeAndFoesWithinXSpacesOfFoe {
        spaces: i32,
    },
    UnitAndAlliesWithinXSpaces {
        spaces: i32,
        #[serde(default)]
        move_type: Option<MoveType>,
        #[serde(default)]
        weapon_type: Option<WeaponType>,
    },
    AlliesWithinXSpaces {
        spaces: i32,
        #[serde(default)]
        move_type: Option<MoveType>,
        #[serde(default)]
        weapon_type: Option<WeaponType>,
    },
    FoesWithinXSpaces {
        spaces: i32,
    },
    FoesInCardinalDirections {
        #[serde(default)]
        with: Option<StatFilter>,
    },
    FoeWithHighestStat {
        stat: Stat,
    },
    FoeWithLowestStat {
        stat: Stat,
    },
    AssistUser,
    AssistTarget,
    AllAllies {
        #[serde(default)]
        move_type: Option<MoveType>,
        #[serde(default)]
        with: Option<StatFilter>,
    },
    AllFoes,
    SpacesWithinUnit {
        spaces: i32,
    },
    SpacesWithinAllies {
        #[serde(default)]
        move_type: Option<MoveType>,
        ally_range: i32,
        warp_range: i32,
        #[serde(default)]
        hp_threshold: Option<i32>,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone, Display, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type")]
#[strum(serialize_all = "snake_case")]
pub enum EffectAction {
    EquipStatMod {
        stat: Stat,
        value: i32,
    },
    PhantomStat {
        stat: Stat,
        value: i32,
    },
    MaxSpecialCooldownMod {
        value: i32,
    },
    CurrentSpecialCooldownMod {
        value: i32,
        #[serde(default)]
        target: Target,
    },
    CombatStatMod {
        stat: Stat,
        #[serde(default)]
        value: i32,
        #[serde(default)]
        calculation: Option<Calculation>,
        #[serde(default)]
        target: Target,
    },
    SetCombatFlag {
        flag: CombatFlag,
        #[serde(default)]
        target: Target,
        #[serde(default)]
        percent: Option<i32>,
        #[serde(default)]
        stat: Option<Stat>,
        #[serde(default)]
        move_type: Option<MoveType>,
        #[serde(default)]
        weapon_type: Option<WeaponType>,
    },
    ConstantFixedDamage {
        value: i32,
        #[serde(default)]
        target: Target,
    },
    DealDamage {
        #[serde(default)]
        value: i32,
        #[serde(default)]
        calculation: Option<Calculation>,
        #[serde(default)]
        target: Target,
    },
    RestoreHp {
        #[serde(default)]
        value: i32,
        #[serde(default)]
        calculation: Option<Calculation>,
        #[serde(default)]
        target: Target,
    },
    ApplyBuff {
        stat: Stat,
        value: i32,
        #[serde(default)]
        target: Target,
    },
    ApplyDebuff {
        stat: Stat,
        value: i32,
        #[serde(default)]
        target: Target,
    },
    ApplyStatus {
        status: StatusID,
        #[serde(default)]
        target: Target,
    },
    DamageReduction {
        #[serde(default)]
        percent: Option<i32>,
        #[serde(default)]
        flat: Option<i32>,
    },
    ReduceDefResBy {
        percent: i32,
    },
    BaseDamageIncrease {
        percent: i32,
    },
    MoveExtraSpaces {
        spaces: i32,
    },
    SetMovementFlag {
        flag: MovementFlag,
    },
    ObstructTiles {
        spaces: i32,
    },
    EnableWarp {
        target: Target,
    },
    PostCombatMovement {
        movement_type: MovementAssist,
        #[serde(default)]
        target: Target,
    },
    PullCaptureArea,
    /// 尚未支援的動作種類，套用時略過
    #[serde(other)]
    Unknown,
}

// macro 產生 match-arm 用來取得帶 target 的 action 之目標
// 使用 macro 以減少在 getter 中重複列出所有 enum 分支
macro_rules! action_target_ref {
    ($self:expr) => {
        match $self {
            EffectAction::CurrentSpecialCooldownMod { target, .. }
            | EffectAction::CombatStatMod { target, .. }
            | EffectAction::SetCombatFlag { target, .. }
            | EffectAction::ConstantFixedDamage { target, .. }
            | EffectAction::DealDamage { target, .. }
            | EffectAction::RestoreHp { target, .. }
            | EffectAction::ApplyBuff { target, .. }
            | EffectAction::ApplyDebuff { target, .. }
            | EffectAction::ApplyStatus { target, .. }
            | EffectAction::EnableWarp { target }
            | EffectAction::PostCombatMovement { target, .. } => Some(target),
            _ => None,
        }
    };
}

impl EffectAction {
    /// 動作作用的對象；沒有 target 欄位的動作作用在擁有者自身或全域
    pub fn target(&self) -> Option<&Target> {
        action_target_ref!(self)
    }
}
