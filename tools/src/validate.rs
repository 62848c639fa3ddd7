//! 隊伍檔檢查

use crate::common::{TeamFile, from_file};
use anyhow::Result;
use duel_lib::validate_team;
use skills_lib::GameData;
use std::path::Path;
use tracing::info;

pub fn execute(data: &GameData, path: &Path) -> Result<()> {
    let team: TeamFile = from_file(path)?;
    validate_team(data, &team.units, team.mode)?;
    info!(
        "{}：{} 名單位，{} 模式檢查通過",
        path.display(),
        team.units.len(),
        team.mode
    );
    Ok(())
}
