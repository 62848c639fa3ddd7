//! Zobrist 雜湊表：每個可雜湊的狀態分量對應一組隨機鍵
//!
//! 以固定種子產生，因此同一張地圖與同一組單位永遠得到相同的表，
//! 反序列化後可以重建出一致的 hash。

use crate::{Coord, DuelRules, Map, TEAM_COUNT, Unit};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skills_lib::{GameData, Stat, StatusID};
use std::collections::BTreeMap;

pub const ZOBRIST_SEED: u64 = 1804289383;
/// 每個能力的加成/減益預先產生的鍵數（0..=12）
const MODIFIER_KEYS: usize = 13;
const SCORE_KEYS: usize = 32;

#[derive(Debug, Clone)]
struct UnitKeys {
    pos: Vec<u64>,
    hp: Vec<u64>,
    special: Vec<u64>,
    has_action: u64,
    alive: u64,
    buffs: Vec<Vec<u64>>,
    debuffs: Vec<Vec<u64>>,
    bonuses: Vec<u64>,
    penalties: Vec<u64>,
}

#[derive(Debug, Clone)]
pub struct ZobristTable {
    width: Coord,
    units: Vec<UnitKeys>,
    status_index: BTreeMap<StatusID, usize>,
    blocks: Vec<Vec<u64>>,
    current_turn: u64,
    turn_count: Vec<u64>,
    actions_remaining: [Vec<u64>; TEAM_COUNT],
    ended_turn: [u64; TEAM_COUNT],
    ko_score: [Vec<u64>; TEAM_COUNT],
    capture_score: [Vec<u64>; TEAM_COUNT],
    capture_area: Vec<u64>,
    last_starting_team: u64,
    game_over: u64,
}

fn keys(rng: &mut StdRng, count: usize) -> Vec<u64> {
    (0..count.max(1)).map(|_| rng.random::<u64>()).collect()
}

/// 表內的索引直接取鍵；超出範圍時把索引混入最後一個鍵，
/// 讓不同的值仍然得到不同的鍵
fn pick(keys: &[u64], index: i64) -> u64 {
    if let Ok(i) = usize::try_from(index)
        && let Some(key) = keys.get(i)
    {
        return *key;
    }
    keys.last().map_or(0, |key| spread(*key, index))
}

/// splitmix64 的收尾混合
fn spread(key: u64, index: i64) -> u64 {
    let mut z = key ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn modifier_keys(rng: &mut StdRng) -> Vec<Vec<u64>> {
    (0..4).map(|_| keys(rng, MODIFIER_KEYS)).collect()
}

fn stat_offset(stat: Stat) -> Option<usize> {
    match stat {
        Stat::Hp => None,
        Stat::Atk => Some(0),
        Stat::Spd => Some(1),
        Stat::Def => Some(2),
        Stat::Res => Some(3),
    }
}

impl ZobristTable {
    pub fn new(map: &Map, units: &[Unit], data: &GameData, rules: &DuelRules) -> Self {
        let mut rng = StdRng::seed_from_u64(ZOBRIST_SEED);
        let cells = (map.width() * map.height()) as usize;
        let status_index: BTreeMap<StatusID, usize> = data
            .statuses
            .keys()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let units = units
            .iter()
            .map(|unit| UnitKeys {
                pos: keys(&mut rng, cells),
                hp: keys(&mut rng, unit.max_hp as usize + 1),
                special: keys(&mut rng, unit.special.map_or(1, |s| s.max as usize + 1)),
                has_action: rng.random(),
                alive: rng.random(),
                buffs: modifier_keys(&mut rng),
                debuffs: modifier_keys(&mut rng),
                bonuses: keys(&mut rng, status_index.len()),
                penalties: keys(&mut rng, status_index.len()),
            })
            .collect();

        let blocks = map
            .blocks
            .iter()
            .map(|block| keys(&mut rng, block.hp.max(0) as usize + 1))
            .collect();

        let actions = rules.actions_per_round as usize + 1;
        let capture = (rules.rounds * rules.capture_score) as usize + 1;
        Self {
            width: map.width(),
            units,
            status_index,
            blocks,
            current_turn: rng.random(),
            turn_count: keys(&mut rng, rules.rounds as usize + 2),
            actions_remaining: [keys(&mut rng, actions), keys(&mut rng, actions)],
            ended_turn: [rng.random(), rng.random()],
            ko_score: [keys(&mut rng, SCORE_KEYS), keys(&mut rng, SCORE_KEYS)],
            capture_score: [keys(&mut rng, capture), keys(&mut rng, capture)],
            capture_area: keys(&mut rng, map.height() as usize + 1),
            last_starting_team: rng.random(),
            game_over: rng.random(),
        }
    }

    fn unit(&self, slot: usize) -> Option<&UnitKeys> {
        self.units.get(slot)
    }

    pub fn pos(&self, slot: usize, pos: crate::Pos) -> u64 {
        self.unit(slot).map_or(0, |k| {
            pick(&k.pos, pos.y as i64 * self.width as i64 + pos.x as i64)
        })
    }

    pub fn hp(&self, slot: usize, hp: i32) -> u64 {
        self.unit(slot).map_or(0, |k| pick(&k.hp, hp as i64))
    }

    pub fn special(&self, slot: usize, current: i32) -> u64 {
        self.unit(slot).map_or(0, |k| pick(&k.special, current as i64))
    }

    pub fn has_action(&self, slot: usize) -> u64 {
        self.unit(slot).map_or(0, |k| k.has_action)
    }

    pub fn alive(&self, slot: usize) -> u64 {
        self.unit(slot).map_or(0, |k| k.alive)
    }

    pub fn buff(&self, slot: usize, stat: Stat, value: i32) -> u64 {
        match (self.unit(slot), stat_offset(stat)) {
            (Some(k), Some(offset)) => pick(&k.buffs[offset], value as i64),
            _ => 0,
        }
    }

    pub fn debuff(&self, slot: usize, stat: Stat, value: i32) -> u64 {
        match (self.unit(slot), stat_offset(stat)) {
            (Some(k), Some(offset)) => pick(&k.debuffs[offset], value as i64),
            _ => 0,
        }
    }

    pub fn bonus(&self, slot: usize, status: &str) -> u64 {
        match (self.unit(slot), self.status_index.get(status)) {
            (Some(k), Some(i)) => pick(&k.bonuses, *i as i64),
            _ => 0,
        }
    }

    pub fn penalty(&self, slot: usize, status: &str) -> u64 {
        match (self.unit(slot), self.status_index.get(status)) {
            (Some(k), Some(i)) => pick(&k.penalties, *i as i64),
            _ => 0,
        }
    }

    pub fn block(&self, index: usize, hp: i32) -> u64 {
        self.blocks.get(index).map_or(0, |k| pick(k, hp as i64))
    }

    pub fn current_turn(&self) -> u64 {
        self.current_turn
    }

    pub fn turn_count(&self, turn: u32) -> u64 {
        pick(&self.turn_count, turn as i64)
    }

    pub fn actions_remaining(&self, team: usize, actions: u32) -> u64 {
        self.actions_remaining
            .get(team)
            .map_or(0, |k| pick(k, actions as i64))
    }

    pub fn ended_turn(&self, team: usize) -> u64 {
        self.ended_turn.get(team).copied().unwrap_or(0)
    }

    pub fn ko_score(&self, team: usize, score: u32) -> u64 {
        self.ko_score.get(team).map_or(0, |k| pick(k, score as i64))
    }

    pub fn capture_score(&self, team: usize, score: u32) -> u64 {
        self.capture_score
            .get(team)
            .map_or(0, |k| pick(k, score as i64))
    }

    pub fn capture_area(&self, y: Coord) -> u64 {
        pick(&self.capture_area, y as i64)
    }

    pub fn last_starting_team(&self) -> u64 {
        self.last_starting_team
    }

    pub fn game_over(&self) -> u64 {
        self.game_over
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_pick_beyond_table() {
        let k = [1, 2, 3];
        assert_eq!(pick(&k, 0), 1);
        assert_eq!(pick(&k, 2), 3);
        assert_eq!(pick(&k, 99), pick(&k, 99));
        assert_ne!(pick(&k, 99), 3);
        assert_ne!(pick(&k, 99), pick(&k, 100));
        assert_ne!(pick(&k, -5), pick(&k, 0));
        assert_eq!(pick(&[], 0), 0);
    }

    #[test]
    fn test_large_scores_hash_apart() {
        let (map, _) = crate::load_map_from_ascii("1 . 2").expect("map");
        let table = ZobristTable::new(&map, &[], &GameData::default(), &DuelRules::default());
        let keys: BTreeSet<u64> = (0..64).map(|score| table.ko_score(0, score)).collect();
        assert_eq!(keys.len(), 64);
        let keys: BTreeSet<u64> = (0..64).map(|score| table.capture_score(1, score)).collect();
        assert_eq!(keys.len(), 64);
    }

    #[test]
    fn test_table_is_deterministic() {
        let (map, _) = crate::load_map_from_ascii(
            r#"
1 . .
. . 2
"#,
        )
        .expect("map");
        let data = GameData::default();
        let a = ZobristTable::new(&map, &[], &data, &DuelRules::default());
        let b = ZobristTable::new(&map, &[], &data, &DuelRules::default());
        assert_eq!(a.current_turn(), b.current_turn());
        assert_eq!(a.turn_count(3), b.turn_count(3));
        assert_ne!(a.ended_turn(0), a.ended_turn(1));
    }
}
