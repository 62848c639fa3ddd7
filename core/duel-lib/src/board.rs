//! 地圖：地形、障礙物、防禦地形、起始位置與佔領區

use crate::error::{LoadError, Result};
use crate::{Coord, Pos, TEAM_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Deserialize, Serialize, Clone, Copy, Default, EnumString, Display, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Terrain {
    #[default]
    Plains,
    Forest,
    Wall,
    /// 只有飛行單位能進入
    Flier,
    Trench,
}

impl Terrain {
    pub fn symbol(self) -> char {
        match self {
            Terrain::Plains => '.',
            Terrain::Forest => 'T',
            Terrain::Wall => '#',
            Terrain::Flier => '^',
            Terrain::Trench => '_',
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    pub pos: Pos,
    pub hp: i32,
    pub breakable: bool,
}

impl Block {
    /// 不可破壞，或仍有耐久
    pub fn is_standing(&self) -> bool {
        !self.breakable || self.hp > 0
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: Coord,
    pub y: Coord,
    pub w: Coord,
    pub h: Coord,
}

impl Rect {
    pub fn contains(&self, pos: Pos) -> bool {
        pos.x >= self.x && pos.x < self.x + self.w && pos.y >= self.y && pos.y < self.y + self.h
    }

    /// 到矩形的距離：在內部為 0，否則為 x、y 方向超出量之和
    pub fn distance(&self, pos: Pos) -> i32 {
        let dx = (self.x - pos.x).max(pos.x - (self.x + self.w - 1)).max(0);
        let dy = (self.y - pos.y).max(pos.y - (self.y + self.h - 1)).max(0);
        dx + dy
    }
}

pub const DEFAULT_CAPTURE_AREA: Rect = Rect {
    x: 1,
    y: 3,
    w: 6,
    h: 4,
};

fn default_capture_area() -> Rect {
    DEFAULT_CAPTURE_AREA
}

/// 不可變的地圖描述；障礙物的即時耐久存在 GameState
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Map {
    #[serde(default)]
    pub name: String,
    /// terrain[y][x]
    pub terrain: Vec<Vec<Terrain>>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub defensive_terrain: Vec<Pos>,
    #[serde(default)]
    pub starting_positions: [Vec<Pos>; TEAM_COUNT],
    #[serde(default = "default_capture_area")]
    pub capture_area: Rect,
}

impl Map {
    pub fn width(&self) -> Coord {
        self.terrain.first().map_or(0, |row| row.len() as Coord)
    }

    pub fn height(&self) -> Coord {
        self.terrain.len() as Coord
    }

    pub fn on_map(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width() && pos.y < self.height()
    }

    pub fn terrain_at(&self, pos: Pos) -> Option<Terrain> {
        if !self.on_map(pos) {
            return None;
        }
        self.terrain
            .get(pos.y as usize)
            .and_then(|row| row.get(pos.x as usize))
            .copied()
    }

    pub fn is_wall(&self, pos: Pos) -> bool {
        self.terrain_at(pos) == Some(Terrain::Wall)
    }

    pub fn is_defensive(&self, pos: Pos) -> bool {
        self.defensive_terrain.contains(&pos)
    }

    /// 某隊的起始位置索引
    pub fn starting_slot(&self, team: usize, pos: Pos) -> Option<usize> {
        self.starting_positions
            .get(team)
            .and_then(|slots| slots.iter().position(|p| *p == pos))
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| {
            LoadError::DeserializeError {
                format: "toml".to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

/// 從 ASCII 格式載入地圖
///
/// ASCII 格式：每行用空格分隔的符號
/// - `.` = 平地
/// - `T` = 森林，`#` = 牆，`^` = 飛行專用，`_` = 壕溝
/// - `B` = 可破壞障礙物（耐久 1），`B3` = 耐久 3，`X` = 不可破壞障礙物
/// - `D` = 防禦地形
/// - `1`、`2` = 第 0、1 隊的起始位置（依讀取順序）
/// - 其他字符串（`S`、`E` 等）= 標記位置（平地），相同的標記會全部收集成 Vec
///
/// 返回：(地圖, 標記映射)；標記映射也包含 `1`、`2`
///
/// 例如：
/// ```text
/// 1 . T .
/// . # . .
/// . . . 2
/// ```
pub fn load_map_from_ascii(ascii: &str) -> Result<(Map, HashMap<String, Vec<Pos>>)> {
    let lines: Vec<&str> = ascii
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    if lines.is_empty() {
        return Err(LoadError::ParseError("地圖為空".to_string()).into());
    }

    let width = lines[0].split_whitespace().count();
    let mut terrain = Vec::with_capacity(lines.len());
    let mut blocks = Vec::new();
    let mut defensive_terrain = Vec::new();
    let mut markers: HashMap<String, Vec<Pos>> = HashMap::new();

    for (y, line) in lines.iter().enumerate() {
        let symbols: Vec<&str> = line.split_whitespace().collect();
        if symbols.len() != width {
            return Err(LoadError::ParseError(format!(
                "第 {} 行寬度 {} 與第一行寬度 {} 不一致",
                y,
                symbols.len(),
                width
            ))
            .into());
        }
        let mut row = Vec::with_capacity(width);
        for (x, symbol) in symbols.iter().enumerate() {
            let pos = Pos::new(x as Coord, y as Coord);
            let cell = match *symbol {
                "." => Terrain::Plains,
                "T" => Terrain::Forest,
                "#" | "█" => Terrain::Wall,
                "^" => Terrain::Flier,
                "_" => Terrain::Trench,
                "X" => {
                    blocks.push(Block {
                        pos,
                        hp: 0,
                        breakable: false,
                    });
                    Terrain::Plains
                }
                "D" => {
                    defensive_terrain.push(pos);
                    Terrain::Plains
                }
                s if s.starts_with('B') && s[1..].chars().all(|c| c.is_ascii_digit()) => {
                    let hp = if s.len() == 1 {
                        1
                    } else {
                        s[1..].parse().map_err(|_| {
                            LoadError::ParseError(format!("障礙物耐久無效: {}", s))
                        })?
                    };
                    blocks.push(Block {
                        pos,
                        hp,
                        breakable: true,
                    });
                    Terrain::Plains
                }
                marker => {
                    markers.entry(marker.to_string()).or_default().push(pos);
                    Terrain::Plains
                }
            };
            row.push(cell);
        }
        terrain.push(row);
    }

    let starting_positions = [
        markers.get("1").cloned().unwrap_or_default(),
        markers.get("2").cloned().unwrap_or_default(),
    ];
    let map = Map {
        name: String::new(),
        terrain,
        blocks,
        defensive_terrain,
        starting_positions,
        capture_area: DEFAULT_CAPTURE_AREA,
    };
    Ok((map, markers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_map_from_ascii() {
        let (map, markers) = load_map_from_ascii(
            r#"
1 . T S
B3 # ^ X
D _ B 2
        "#,
        )
        .expect("load map");
        assert_eq!(map.width(), 4);
        assert_eq!(map.height(), 3);
        assert_eq!(map.terrain_at(Pos::new(2, 0)), Some(Terrain::Forest));
        assert_eq!(map.terrain_at(Pos::new(1, 1)), Some(Terrain::Wall));
        assert_eq!(map.terrain_at(Pos::new(2, 1)), Some(Terrain::Flier));
        assert_eq!(map.terrain_at(Pos::new(1, 2)), Some(Terrain::Trench));
        assert_eq!(map.terrain_at(Pos::new(4, 0)), None);
        assert_eq!(
            map.blocks,
            vec![
                Block {
                    pos: Pos::new(0, 1),
                    hp: 3,
                    breakable: true
                },
                Block {
                    pos: Pos::new(3, 1),
                    hp: 0,
                    breakable: false
                },
                Block {
                    pos: Pos::new(2, 2),
                    hp: 1,
                    breakable: true
                },
            ]
        );
        assert!(map.is_defensive(Pos::new(0, 2)));
        assert_eq!(map.starting_positions[0], vec![Pos::new(0, 0)]);
        assert_eq!(map.starting_positions[1], vec![Pos::new(3, 2)]);
        assert_eq!(markers["S"], vec![Pos::new(3, 0)]);
    }

    #[test]
    fn test_load_map_errors() {
        assert!(load_map_from_ascii("   \n  ").is_err());
        assert!(load_map_from_ascii(". .\n.").is_err());
    }

    #[test]
    fn test_rect_distance() {
        let area = DEFAULT_CAPTURE_AREA;
        let test_data = [
            (Pos::new(1, 3), 0),
            (Pos::new(6, 6), 0),
            (Pos::new(0, 3), 1),
            (Pos::new(7, 7), 2),
            (Pos::new(3, 0), 3),
            (Pos::new(0, 0), 4),
        ];
        for (idx, (pos, expected)) in test_data.iter().enumerate() {
            assert_eq!(area.distance(*pos), *expected, "Case {}", idx);
            assert_eq!(area.contains(*pos), *expected == 0, "Case {}", idx);
        }
    }
}
