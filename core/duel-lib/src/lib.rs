//! 雙隊棋盤戰鬥引擎：狀態、效果、移動、戰鬥、回合控制與搜尋

use serde::{Deserialize, Serialize};

mod action;
mod assist;
mod board;
mod combat;
mod condition;
mod config;
mod effect;
mod error;
mod movement;
mod state;
mod step;
mod turn;
mod unit;
mod validation;
mod zobrist;

pub mod search;

pub use action::*;
pub use assist::*;
pub use board::*;
pub use combat::*;
pub use condition::*;
pub use config::*;
pub use effect::*;
pub use error::*;
pub use movement::*;
pub use state::*;
pub use step::*;
pub use turn::*;
pub use unit::*;
pub use validation::*;
pub use zobrist::*;

pub type UnitID = u32;
pub type TeamID = usize;
pub type Coord = i32;

pub const TEAM_COUNT: usize = 2;

#[derive(
    Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Pos {
    pub x: Coord,
    pub y: Coord,
}

impl Pos {
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    pub fn manhattan(self, other: Pos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn offset(self, dx: Coord, dy: Coord) -> Pos {
        Pos::new(self.x + dx, self.y + dy)
    }

    pub fn neighbours(self) -> [Pos; 4] {
        [
            self.offset(0, -1),
            self.offset(0, 1),
            self.offset(-1, 0),
            self.offset(1, 0),
        ]
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// 另一隊
pub fn other_team(team: TeamID) -> TeamID {
    1 - team
}

/// 百分比乘法，向負無窮取整
pub(crate) fn percent_of(value: i32, percent: i32) -> i32 {
    (value * percent).div_euclid(100)
}
