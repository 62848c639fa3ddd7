//! 一次性的搜尋請求：JSON 進、JSON 出

use crate::common::read_input;
use anyhow::{Context, Result};
use duel_lib::EngineConfig;
use duel_lib::search::{SearchRequest, handle_request};
use skills_lib::GameData;
use std::path::Path;
use tracing::info;

pub fn execute(
    data: &GameData,
    config: &EngineConfig,
    input: Option<&Path>,
    depth: Option<u32>,
) -> Result<()> {
    let content = read_input(input)?;
    let mut request: SearchRequest =
        serde_json::from_str(&content).context("搜尋請求格式錯誤")?;
    if let Some(depth) = depth {
        request.depth = depth;
    }
    info!("搜尋深度 {}", request.depth);

    let response = handle_request(request, data, &config.search)?;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}
