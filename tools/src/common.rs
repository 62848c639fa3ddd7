use anyhow::{Context, Result};
use duel_lib::{Build, DuelRules, EngineConfig, GameState, Mode, Rect, load_map_from_ascii};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use skills_lib::GameData;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

pub fn from_toml<T>(content: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    return toml::from_str::<T>(content).context("解析 TOML 失敗");
}

pub fn from_file<P: AsRef<Path>, T>(path: P) -> Result<T>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let content = read_input(Some(path))?;
    return from_toml(&content).with_context(|| path.display().to_string());
}

/// 讀取檔案；沒有路徑時讀 stdin
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("讀取 {} 失敗", path.display()))
        }
        None => {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .context("讀取 stdin 失敗")?;
            Ok(content)
        }
    }
}

/// 內建資料，再依序合併額外的資料檔
pub fn load_data(extra: &[PathBuf]) -> Result<GameData> {
    let mut data = GameData::builtin().context("載入內建資料失敗")?;
    for path in extra {
        let content = read_input(Some(path))?;
        let more = GameData::parse_toml(&content)
            .with_context(|| format!("解析資料檔 {} 失敗", path.display()))?;
        data.merge(more);
    }
    data.expand();
    Ok(data)
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::load(path)?),
        None => Ok(EngineConfig::default()),
    }
}

fn default_mode() -> Mode {
    Mode::Duel
}

/// 對局檔：ASCII 地圖加上兩隊配置
///
/// ```toml
/// mode = "duel"
/// map = """
/// 1 . . 2
/// """
/// [[team0]]
/// hero = "ALFONSE"
/// skills = ["FOLKVANGR"]
/// ```
#[derive(Debug, Deserialize)]
pub struct MatchFile {
    #[serde(default = "default_mode")]
    pub mode: Mode,
    pub map: String,
    #[serde(default)]
    pub capture_area: Option<Rect>,
    pub team0: Vec<Build>,
    pub team1: Vec<Build>,
}

impl MatchFile {
    /// 建立對局並結束交換階段
    pub fn start(&self, data: &GameData, rules: &DuelRules) -> Result<GameState> {
        let (mut map, _) = load_map_from_ascii(&self.map)?;
        if let Some(area) = self.capture_area {
            map.capture_area = area;
        }
        let mut state = GameState::new_game_with_rules(
            data,
            map,
            [self.team0.as_slice(), self.team1.as_slice()],
            self.mode,
            rules.clone(),
        )?;
        duel_lib::end_swap_phase(&mut state, data)?;
        Ok(state)
    }
}

/// 隊伍檔
#[derive(Debug, Deserialize)]
pub struct TeamFile {
    #[serde(default = "default_mode")]
    pub mode: Mode,
    pub units: Vec<Build>,
}
