use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};
use strum_macros::{Display, EnumIter, EnumString};

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
pub enum Stat {
    Hp,
    Atk,
    Spd,
    Def,
    Res,
}

/// 可被加成/減益影響的能力（不含 hp）
pub const COMBAT_STATS: [Stat; 4] = [Stat::Atk, Stat::Spd, Stat::Def, Stat::Res];

pub const ALL_STATS: [Stat; 5] = [Stat::Hp, Stat::Atk, Stat::Spd, Stat::Def, Stat::Res];

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Stats {
    #[serde(default)]
    pub hp: i32,
    #[serde(default)]
    pub atk: i32,
    #[serde(default)]
    pub spd: i32,
    #[serde(default)]
    pub def: i32,
    #[serde(default)]
    pub res: i32,
}

impl Stats {
    pub fn new(hp: i32, atk: i32, spd: i32, def: i32, res: i32) -> Self {
        Self {
            hp,
            atk,
            spd,
            def,
            res,
        }
    }

    /// 四項戰鬥能力的總和
    pub fn combat_total(&self) -> i32 {
        COMBAT_STATS.iter().map(|s| self[*s]).sum()
    }

    pub fn any_combat_stat_positive(&self) -> bool {
        COMBAT_STATS.iter().any(|s| self[*s] > 0)
    }
}

impl Index<Stat> for Stats {
    type Output = i32;

    fn index(&self, stat: Stat) -> &i32 {
        match stat {
            Stat::Hp => &self.hp,
            Stat::Atk => &self.atk,
            Stat::Spd => &self.spd,
            Stat::Def => &self.def,
            Stat::Res => &self.res,
        }
    }
}

impl IndexMut<Stat> for Stats {
    fn index_mut(&mut self, stat: Stat) -> &mut i32 {
        match stat {
            Stat::Hp => &mut self.hp,
            Stat::Atk => &mut self.atk,
            Stat::Spd => &mut self.spd,
            Stat::Def => &mut self.def,
            Stat::Res => &mut self.res,
        }
    }
}
