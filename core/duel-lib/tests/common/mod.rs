//! 整合測試共用的資料與對局建構

#![allow(dead_code)]

use duel_lib::{Build, GameState, Map, Mode, Pos, end_swap_phase, load_map_from_ascii};
use skills_lib::GameData;
use std::collections::HashMap;

const FIXTURES: &str = include_str!("../data/fixtures.toml");

/// 內建資料加上測試用英雄與技能
pub fn data() -> GameData {
    let mut data = GameData::builtin().expect("builtin data");
    data.merge(GameData::parse_toml(FIXTURES).expect("fixtures"));
    data.expand();
    data
}

pub fn build(hero: &str, skills: &[&str]) -> Build {
    Build {
        hero: hero.to_string(),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

pub fn map(ascii: &str) -> (Map, HashMap<String, Vec<Pos>>) {
    load_map_from_ascii(ascii).expect("ascii map")
}

/// 建立對局但停在交換階段
pub fn new_game(
    data: &GameData,
    map: Map,
    team0: &[Build],
    team1: &[Build],
    mode: Mode,
) -> GameState {
    GameState::new_game(data, map, [team0, team1], mode).expect("new game")
}

/// 建立對局並結束交換階段
pub fn started_game(
    data: &GameData,
    map: Map,
    team0: &[Build],
    team1: &[Build],
    mode: Mode,
) -> GameState {
    let mut state = new_game(data, map, team0, team1, mode);
    end_swap_phase(&mut state, data).expect("end swap phase");
    state
}

/// 比較用的狀態快照（不含 journal 與 hash）
pub fn snapshot(state: &GameState) -> String {
    serde_json::to_string(state).expect("serialize state")
}
