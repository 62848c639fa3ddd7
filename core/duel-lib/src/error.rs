//! 錯誤處理系統
//!
//! 引擎對外的錯誤一律是強型別的 `Error`：
//! - 被拒絕的輸入（隊伍、行動）回報給呼叫者，狀態不變
//! - 搜尋中的不變量破壞（undo 後 hash 不一致）是致命錯誤
//! - 遊戲結束是狀態轉移，不是錯誤

use crate::{Coord, Pos, TeamID, UnitID};
use skills_lib::{DataError, HeroID, SkillID, SkillType};
use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// 頂層錯誤，包含原始錯誤和 context 鏈
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    contexts: Vec<String>,
}

/// 錯誤種類
#[derive(Debug, ThisError)]
pub enum ErrorKind {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// 格式載入錯誤
#[derive(Debug, ThisError)]
pub enum LoadError {
    #[error("解析失敗: {0}")]
    ParseError(String),
    #[error("{format} 反序列化失敗: {reason}")]
    DeserializeError { format: String, reason: String },
    #[error("第 {team} 隊起始位置不足: 需要 {needed}，只有 {available}")]
    NotEnoughStartingPositions {
        team: TeamID,
        needed: usize,
        available: usize,
    },
    #[error("讀取檔案失敗 {path}: {reason}")]
    Io { path: String, reason: String },
}

/// 隊伍與配置驗證錯誤
#[derive(Debug, ThisError, PartialEq)]
pub enum BuildError {
    #[error("英雄未找到: {hero}")]
    UnknownHero { hero: HeroID },
    #[error("技能未找到: {skill}")]
    UnknownSkill { skill: SkillID },
    #[error("{hero} 的 {slot} 欄位有多個技能")]
    DuplicateSkillSlot { hero: HeroID, slot: SkillType },
    #[error("{hero} 無法裝備不同武器種類的 {skill}")]
    WeaponTypeMismatch { hero: HeroID, skill: SkillID },
    #[error("{hero} 無法習得 {skill}")]
    CannotLearn { hero: HeroID, skill: SkillID },
    #[error("聖印 {skill} 在隊伍中重複")]
    DuplicateSeal { skill: SkillID },
    #[error("隊伍人數錯誤: 需要 {expected}，實際 {found}")]
    TeamSize { expected: usize, found: usize },
    #[error("英雄 {hero} 在隊伍中重複")]
    DuplicateHero { hero: HeroID },
    #[error("隊伍中再行動輔助超過一名")]
    TooManyRefreshers,
}

/// 行動錯誤
#[derive(Debug, ThisError, PartialEq)]
pub enum ActionError {
    #[error("遊戲已結束")]
    GameOver,
    #[error("交換階段中無法行動")]
    SwapPhase,
    #[error("不在交換階段")]
    NotInSwapPhase,
    #[error("決鬥模式無法回到交換階段")]
    DuelSwapPhase,
    #[error("位置 ({x}, {y}) 沒有單位")]
    NoUnitAtPos { x: Coord, y: Coord },
    #[error("位置 ({x}, {y}) 沒有可攻擊的障礙物")]
    NoBlockAtPos { x: Coord, y: Coord },
    #[error("單位 {id} 不屬於目前行動的隊伍")]
    NotYourTurn { id: UnitID },
    #[error("位置 ({x}, {y}) 不是有效的目標")]
    InvalidTarget { x: Coord, y: Coord },
    #[error("不合法的行動: {action}")]
    Illegal { action: String },
    #[error("起始位置 {a} 與 {b} 不屬於同一隊")]
    InvalidSwap { a: Pos, b: Pos },
}

/// 搜尋錯誤
#[derive(Debug, ThisError, PartialEq)]
pub enum SearchError {
    #[error("搜尋只支援決鬥模式")]
    UnsupportedMode,
    #[error("交換階段中無法搜尋")]
    SwapPhase,
    #[error("復原後 hash 不一致: 預期 {expected:#x}，實際 {found:#x}，行動 {action}")]
    HashMismatch {
        expected: u64,
        found: u64,
        action: String,
    },
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    /// 添加錯誤上下文，自動記錄呼叫位置
    #[track_caller]
    pub fn context<C: Into<String>>(mut self, context: C) -> Self {
        let loc = std::panic::Location::caller();
        let msg = format!("{} [{}:{}]", context.into(), loc.file(), loc.line());
        self.contexts.push(msg);
        self
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)?;
        for ctx in &self.contexts {
            write!(f, "\n  {}", ctx)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

impl<E: Into<ErrorKind>> From<E> for Error {
    fn from(error: E) -> Self {
        Self {
            kind: error.into(),
            contexts: Vec::new(),
        }
    }
}

/// Result 擴展 trait，用於添加錯誤上下文
pub trait Context<T> {
    fn context<C: Into<String>>(self, context: C) -> Result<T>;
}

impl<T> Context<T> for Result<T> {
    #[track_caller]
    fn context<C: Into<String>>(self, context: C) -> Result<T> {
        match self {
            Ok(value) => Ok(value),
            Err(e) => Err(e.context(context)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_chain() {
        let result: Result<()> = Err(ActionError::GameOver.into());
        let err = result
            .context("執行行動")
            .context("搜尋節點")
            .unwrap_err();
        let text = err.to_string();
        assert!(text.starts_with("遊戲已結束"));
        assert!(text.contains("\n  執行行動 ["));
        assert!(text.contains("\n  搜尋節點 ["));
        assert!(matches!(
            err.kind(),
            ErrorKind::Action(ActionError::GameOver)
        ));
    }
}
