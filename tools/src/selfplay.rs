//! 兩邊都交給搜尋的自我對戰

use crate::common::{MatchFile, from_file};
use anyhow::Result;
use duel_lib::search::{move_string, search};
use duel_lib::{Action, EngineConfig, GameState, apply_action};
use skills_lib::GameData;
use std::path::Path;
use tracing::{info, warn};

pub fn execute(
    data: &GameData,
    config: &EngineConfig,
    path: &Path,
    max_actions: u32,
) -> Result<()> {
    let match_file: MatchFile = from_file(path)?;
    let mut state = match_file.start(data, &config.duel)?;

    let mut played = 0;
    while !state.is_game_over() && played < max_actions {
        let outcome = search(&state, data, &config.search, config.search.max_depth)?;
        let action = outcome.best.unwrap_or(Action::EndTurn);
        info!(
            "回合 {} 第 {} 隊：{} (score={}, d={}, nodes={})",
            state.turn_count(),
            state.current_turn(),
            move_string(&state, &action),
            outcome.score,
            outcome.depth,
            outcome.stats.nodes
        );
        apply_action(&mut state, data, &action)?;
        played += 1;
    }

    if !state.is_game_over() {
        warn!("達到 {} 個行動上限，對局未結束", max_actions);
    }
    report(&state);
    Ok(())
}

fn report(state: &GameState) {
    let Some(duel) = state.duel() else {
        return;
    };
    for (team, side) in duel.teams.iter().enumerate() {
        let result = side.result.map_or("-".to_string(), |r| r.to_string());
        println!(
            "第 {} 隊：擊倒 {}，佔領 {}，結果 {}",
            team, side.ko_score, side.capture_score, result
        );
    }
}
