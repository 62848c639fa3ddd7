//! 引擎設定：決鬥規則與搜尋參數，從 TOML 載入，缺少的欄位使用預設值

use crate::error::{LoadError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub duel: DuelRules,
    pub search: SearchConfig,
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| {
            LoadError::DeserializeError {
                format: "toml".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    pub fn load(path: &std::path::Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }
}

/// 決鬥模式規則
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct DuelRules {
    pub actions_per_round: u32,
    pub rounds: u32,
    pub ko_score: u32,
    pub captain_ko_bonus: u32,
    /// 佔領區內人數至少多出此數才得分
    pub capture_margin: usize,
    pub capture_score: u32,
}

impl Default for DuelRules {
    fn default() -> Self {
        Self {
            actions_per_round: 6,
            rounds: 5,
            ko_score: 2,
            captain_ko_bonus: 1,
            capture_margin: 2,
            capture_score: 2,
        }
    }
}

/// 靜止搜尋要延伸哪些行動
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuiescencePolicy {
    /// 只延伸會擊倒目標的攻擊與會打碎障礙物的攻擊
    #[default]
    Decisive,
    /// 延伸所有攻擊
    AllAttacks,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub time_budget_ms: u64,
    pub max_depth: u32,
    /// 置換表大小，會向上取到 2 的冪次
    pub table_size: usize,
    pub node_check_interval: u64,
    pub quiescence_check_interval: u64,
    pub max_ply: usize,
    pub quiescence: QuiescencePolicy,
    pub weights: EvalWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_budget_ms: 2000,
            max_depth: 4,
            table_size: 65536,
            node_check_interval: 1024,
            quiescence_check_interval: 512,
            max_ply: 64,
            quiescence: QuiescencePolicy::Decisive,
            weights: EvalWeights::default(),
        }
    }
}

/// 靜態評估權重
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct EvalWeights {
    pub score: i32,
    pub capture_bonus: i32,
    pub distance_factor: i32,
    pub hp: i32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            score: 100,
            capture_bonus: 20,
            distance_factor: 5,
            hp: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
[duel]
rounds = 3

[search]
time_budget_ms = 500
quiescence = "all_attacks"
"#,
        )
        .expect("parse config");
        assert_eq!(config.duel.rounds, 3);
        assert_eq!(config.duel.actions_per_round, 6);
        assert_eq!(config.search.time_budget_ms, 500);
        assert_eq!(config.search.quiescence, QuiescencePolicy::AllAttacks);
        assert_eq!(config.search.weights, EvalWeights::default());
    }

    #[test]
    fn test_bad_config() {
        let err = EngineConfig::from_toml_str("[search]\nmax_depth = \"deep\"").unwrap_err();
        assert!(err.to_string().contains("toml 反序列化失敗"));
    }
}
