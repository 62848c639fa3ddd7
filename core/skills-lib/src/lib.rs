//! 靜態遊戲資料：英雄、技能、狀態與其效果描述
//!
//! 所有資料都以 TOML 描述，引擎只透過 [`GameData`] 以參考方式讀取。

mod data;
mod effect;
mod skill;
mod stats;
mod types;

pub use data::*;
pub use effect::*;
pub use skill::*;
pub use stats::*;
pub use types::*;

pub type SkillID = String;
pub type HeroID = String;
pub type StatusID = String;

/// 恐慌狀態：加成在戰鬥與可見能力中反轉為減益
pub const PANIC_STATUS: &str = "PANIC";
