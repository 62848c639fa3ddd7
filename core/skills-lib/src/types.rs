use crate::Stat;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumCount, EnumIter, EnumString};

#[derive(
    Debug, Deserialize, Serialize, Clone, Copy, EnumString, Display, EnumIter, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Colour {
    Red,
    Blue,
    Green,
    Colourless,
}

impl Colour {
    /// 武器相剋：紅克綠、綠克藍、藍克紅；回傳 1 / -1 / 0
    pub fn triangle(self, other: Colour) -> i32 {
        use Colour::*;
        match (self, other) {
            (Red, Green) | (Green, Blue) | (Blue, Red) => 1,
            (Green, Red) | (Blue, Green) | (Red, Blue) => -1,
            _ => 0,
        }
    }
}

#[derive(
    Debug,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    EnumString,
    Display,
    EnumIter,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WeaponType {
    Sword,
    Lance,
    Axe,
    RedTome,
    BlueTome,
    GreenTome,
    ColourlessTome,
    RedBow,
    BlueBow,
    GreenBow,
    ColourlessBow,
    RedDagger,
    BlueDagger,
    GreenDagger,
    ColourlessDagger,
    Staff,
    RedBreath,
    BlueBreath,
    GreenBreath,
    ColourlessBreath,
    RedBeast,
    BlueBeast,
    GreenBeast,
    ColourlessBeast,
}

impl WeaponType {
    pub fn colour(self) -> Colour {
        use WeaponType::*;
        match self {
            Sword | RedTome | RedBow | RedDagger | RedBreath | RedBeast => Colour::Red,
            Lance | BlueTome | BlueBow | BlueDagger | BlueBreath | BlueBeast => Colour::Blue,
            Axe | GreenTome | GreenBow | GreenDagger | GreenBreath | GreenBeast => Colour::Green,
            ColourlessTome | ColourlessBow | ColourlessDagger | Staff | ColourlessBreath
            | ColourlessBeast => Colour::Colourless,
        }
    }

    /// 攻擊距離（曼哈頓距離恰好等於此值才可攻擊）
    pub fn range(self) -> i32 {
        if self.is_ranged() { 2 } else { 1 }
    }

    pub fn is_ranged(self) -> bool {
        use WeaponType::*;
        matches!(
            self,
            RedTome
                | BlueTome
                | GreenTome
                | ColourlessTome
                | RedBow
                | BlueBow
                | GreenBow
                | ColourlessBow
                | RedDagger
                | BlueDagger
                | GreenDagger
                | ColourlessDagger
                | Staff
        )
    }

    /// 被此武器攻擊時對方使用的防禦能力
    pub fn def_stat(self) -> Stat {
        use WeaponType::*;
        match self {
            RedTome | BlueTome | GreenTome | ColourlessTome | Staff | RedBreath | BlueBreath
            | GreenBreath | ColourlessBreath => Stat::Res,
            _ => Stat::Def,
        }
    }
}

#[derive(
    Debug,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    EnumString,
    Display,
    EnumIter,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MoveType {
    Infantry,
    Armoured,
    Cavalry,
    Flier,
}

impl MoveType {
    pub fn base_range(self) -> i32 {
        match self {
            MoveType::Infantry => 2,
            MoveType::Armoured => 1,
            MoveType::Cavalry => 3,
            MoveType::Flier => 2,
        }
    }
}

#[derive(
    Debug,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    EnumString,
    Display,
    EnumIter,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkillType {
    Weapon,
    Assist,
    Special,
    A,
    B,
    C,
    S,
    Captain,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SpecialType {
    Offensive,
    Defensive,
    Aoe,
    Healing,
    Miracle,
    Galeforce,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AssistType {
    Movement,
    Refresh,
    Heal,
    Rally,
    Sacrifice,
    ReciprocalAid,
    HarshCommand,
}

#[derive(
    Debug, Deserialize, Serialize, Clone, Copy, EnumString, Display, EnumIter, PartialEq, Eq,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MovementAssist {
    Swap,
    Shove,
    Smite,
    DrawBack,
    HitAndRun,
    Reposition,
    Pivot,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusType {
    Positive,
    Negative,
}

/// 效果的執行時機
#[derive(
    Debug,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    EnumString,
    Display,
    EnumIter,
    PartialEq,
    Eq,
    Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    OnEquip,
    CalculateOwnMovement,
    CalculateAllyMovement,
    CalculateEnemyMovement,
    StartOfTurn,
    StartOfEnemyPhase,
    StartOfPlayerPhaseOrEnemyPhase,
    BeforeCombat,
    StartOfCombat,
    StartOfAllyCombat,
    DuringCombat,
    DuringAllyCombat,
    #[serde(rename = "during_combat_2")]
    #[strum(serialize = "during_combat_2")]
    DuringCombat2,
    OnOffensiveSpecialTrigger,
    OnDefensiveSpecialTrigger,
    OnAoeSpecialTrigger,
    OnHealingSpecialTrigger,
    AfterCombatBeforeDeath,
    AfterCombat,
    AfterAllyCombat,
    AfterCombatDisplacement,
    UsedDance,
    UsedHeal,
    UsedRallyAssist,
    UsedMovementAssist,
    TargettedByRallyAssist,
    TargettedByMovementAssist,
}

/// 戰鬥旗標。多數是計數器；少數帶能力、兵種、武器或百分比清單
#[derive(
    Debug,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    EnumString,
    Display,
    EnumIter,
    EnumCount,
    PartialEq,
    Eq,
    Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CombatFlag {
    GuaranteedFollowUp,
    CantFollowUp,
    NeutralizeGuaranteedFollowUp,
    NeutralizeCantFollowUp,
    AttacksTwice,
    Desperation,
    Vantage,
    HardyBearing,
    CantCounterattack,
    CanCounterattackRegardlessOfFoesRange,
    NeutralizeBonuses,
    NeutralizePenalties,
    NeutralizeSpecificBonuses,
    NeutralizeSpecificPenalties,
    Panic,
    SpecialChargesPerAttack,
    SpecialChargesPerUnitAttack,
    SpecialChargesPerFoeAttack,
    NeutralizeSpecialCharges,
    Guard,
    NeutralizeGuard,
    WtaVsColourless,
    TriangleAdept,
    CancelAffinity,
    EffectiveAgainstMoveType,
    EffectiveAgainstWeaponType,
    NeutralizeEffectiveAgainstMoveType,
    NeutralizeEffectiveAgainstWeaponType,
    CalculateDamageUsingLowerOfDefRes,
    Wrathful,
    ConsecutiveHitDamageReduction,
    ConsecutiveAttackDamageReduction,
    FirstAttackDamageReduction,
    PercentHealingOnHit,
}

impl CombatFlag {
    /// 以百分比清單累積（而非加總）的旗標
    pub fn is_percent_list(self) -> bool {
        matches!(
            self,
            CombatFlag::ConsecutiveHitDamageReduction
                | CombatFlag::ConsecutiveAttackDamageReduction
                | CombatFlag::FirstAttackDamageReduction
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MovementFlag {
    Pass,
    RestrictMovement,
}

/// 能力比較時使用的數值來源
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StatCheckType {
    #[default]
    Visible,
    InCombat,
}
