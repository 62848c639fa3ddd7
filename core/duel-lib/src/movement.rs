//! 移動範圍、威脅範圍與位移輔助
//!
//! 移動範圍以 BFS 展開：剩餘步數比之前到達時更多才會重新展開，
//! 目的地依第一次到達的順序排列。

use crate::{
    EffectContext, GameState, Pos, apply_movement_effects, gather_effects, other_team,
    effect::tiles_within,
};
use skills_lib::{GameData, MoveType, MovementAssist, Phase};
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::trace;

/// 移動範圍計算前由效果設定的旗標
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementFlags {
    /// 額外移動距離（後設定者覆蓋）
    pub extra_spaces: i32,
    /// 可穿越敵軍，且不受阻擋
    pub pass: bool,
    /// 移動距離限制為 1
    pub restrict: bool,
    pub obstructed: BTreeSet<Pos>,
    pub warp: BTreeSet<Pos>,
}

/// BFS 展開順序：左、上、下、右
const EXPANSION: [(i32, i32); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

/// 可以停留的格子：在地圖內、地形允許且沒有障礙物
pub fn can_land_on(state: &GameState, move_type: MoveType, pos: Pos) -> bool {
    let Some(terrain) = state.map.terrain_at(pos) else {
        return false;
    };
    let terrain_ok = match terrain {
        crate::Terrain::Wall => false,
        crate::Terrain::Flier => move_type == MoveType::Flier,
        crate::Terrain::Forest => move_type != MoveType::Cavalry,
        crate::Terrain::Plains | crate::Terrain::Trench => true,
    };
    terrain_ok && !state.has_standing_block(pos)
}

/// 進入格子後剩餘步數；None 表示無法進入
fn remaining_after_entry(
    move_type: MoveType,
    terrain: crate::Terrain,
    remaining: i32,
    is_start: bool,
) -> Option<i32> {
    use crate::Terrain::*;
    match (move_type, terrain) {
        (_, Wall) => None,
        (MoveType::Flier, _) => Some(remaining),
        (_, Flier) => None,
        (MoveType::Cavalry, Forest) => None,
        (MoveType::Infantry, Forest) if !is_start => Some(remaining - 1),
        (MoveType::Cavalry, Trench) if !is_start => Some(remaining - 2),
        _ => Some(remaining),
    }
}

/// 收集移動相關效果：自己、同隊其他單位、敵方單位
pub fn movement_flags(state: &GameState, data: &GameData, slot: usize) -> MovementFlags {
    let unit = &state.units[slot];
    let ctx = EffectContext::movement(slot);
    let mut effects = gather_effects(state, data, Phase::CalculateOwnMovement, [slot], &ctx);
    let allies = state.teams[unit.team]
        .iter()
        .copied()
        .filter(|ally| *ally != slot);
    effects.extend(gather_effects(
        state,
        data,
        Phase::CalculateAllyMovement,
        allies,
        &ctx,
    ));
    effects.extend(gather_effects(
        state,
        data,
        Phase::CalculateEnemyMovement,
        state.teams[other_team(unit.team)].iter().copied(),
        &ctx,
    ));

    let mut flags = MovementFlags::default();
    apply_movement_effects(state, &effects, slot, &mut flags);
    flags
}

/// 單位可以移動到的格子（包含原地）
///
/// filter_occupied 為 true 時排除其他單位所在的格子
pub fn movement_range(
    state: &GameState,
    data: &GameData,
    slot: usize,
    filter_occupied: bool,
) -> Vec<Pos> {
    let unit = &state.units[slot];
    let flags = movement_flags(state, data, slot);
    let range = if flags.restrict {
        1
    } else {
        unit.move_type.base_range() + flags.extra_spaces
    };
    let foe_team = other_team(unit.team);

    let mut destinations: Vec<Pos> = Vec::new();
    let mut seen: BTreeSet<Pos> = BTreeSet::new();
    let mut visited: HashMap<Pos, i32> = HashMap::new();
    let mut queue: VecDeque<(Pos, i32)> = VecDeque::from([(unit.pos, range)]);

    while let Some((pos, remaining)) = queue.pop_front() {
        let Some(terrain) = state.map.terrain_at(pos) else {
            continue;
        };
        let Some(next) = remaining_after_entry(unit.move_type, terrain, remaining, pos == unit.pos)
        else {
            continue;
        };
        if next < 0 || state.has_standing_block(pos) {
            continue;
        }
        if !flags.pass
            && state
                .team_units(foe_team)
                .any(|foe| foe.pos == pos)
        {
            continue;
        }
        if visited.get(&pos).is_some_and(|best| *best >= next) {
            continue;
        }
        visited.insert(pos, next);

        if seen.insert(pos) {
            destinations.push(pos);
        }

        if !flags.pass && pos != unit.pos && flags.obstructed.contains(&pos) {
            continue;
        }
        for (dx, dy) in EXPANSION {
            queue.push_back((pos.offset(dx, dy), next - 1));
        }
    }

    for pos in &flags.warp {
        if seen.insert(*pos) {
            destinations.push(*pos);
        }
    }

    if filter_occupied {
        destinations.retain(|pos| !state.is_occupied(*pos, Some(slot)));
    }
    trace!("{} 的移動範圍：{} 格", unit.hero, destinations.len());
    destinations
}

/// 單位移動後能攻擊到的格子
pub fn threat_range(
    state: &GameState,
    data: &GameData,
    slot: usize,
    filter_occupied: bool,
) -> Vec<Pos> {
    let Some(range) = state.units[slot].attack_range(data) else {
        return Vec::new();
    };
    let mut seen = BTreeSet::new();
    let mut tiles = Vec::new();
    for origin in movement_range(state, data, slot, filter_occupied) {
        for pos in tiles_within(origin, range, false) {
            if pos.manhattan(origin) != range || seen.contains(&pos) {
                continue;
            }
            if !state.map.on_map(pos) || state.map.is_wall(pos) || state.has_standing_block(pos) {
                continue;
            }
            seen.insert(pos);
            tiles.push(pos);
        }
    }
    tiles
}

fn mirror(center: Pos, other: Pos) -> Pos {
    Pos::new(2 * center.x - other.x, 2 * center.y - other.y)
}

/// 位移輔助後雙方的位置：(使用者, 目標)
pub fn movement_assist_destinations(
    state: &GameState,
    user_pos: Pos,
    target: usize,
    kind: MovementAssist,
) -> (Pos, Pos) {
    let target_unit = &state.units[target];
    let target_pos = target_unit.pos;
    match kind {
        MovementAssist::Swap => (target_pos, user_pos),
        MovementAssist::Smite => {
            let through = mirror(target_pos, user_pos);
            let landing = Pos::new(3 * target_pos.x - 2 * user_pos.x, 3 * target_pos.y - 2 * user_pos.y);
            let passable = state.map.on_map(through)
                && !state.map.is_wall(through)
                && !state.has_standing_block(through);
            if passable
                && can_land_on(state, target_unit.move_type, landing)
                && !state.is_occupied(landing, None)
            {
                (user_pos, landing)
            } else {
                // 推不到兩格時退化為推一格
                (user_pos, through)
            }
        }
        MovementAssist::Shove => (user_pos, mirror(target_pos, user_pos)),
        MovementAssist::DrawBack => (mirror(user_pos, target_pos), user_pos),
        MovementAssist::HitAndRun => (mirror(user_pos, target_pos), target_pos),
        MovementAssist::Reposition => (user_pos, mirror(user_pos, target_pos)),
        MovementAssist::Pivot => (mirror(target_pos, user_pos), target_pos),
    }
}

/// 位移輔助的目的地是否合法
///
/// 已死亡的目標以飛行單位判斷落點，讓戰後拉動仍能作用
pub fn validate_movement_assist(
    state: &GameState,
    user: usize,
    user_dest: Pos,
    target: usize,
    target_dest: Pos,
    kind: MovementAssist,
) -> bool {
    let user_unit = &state.units[user];
    let target_unit = &state.units[target];
    let target_move_type = if target_unit.alive {
        target_unit.move_type
    } else {
        MoveType::Flier
    };
    if !can_land_on(state, user_unit.move_type, user_dest)
        || !can_land_on(state, target_move_type, target_dest)
    {
        return false;
    }
    match kind {
        MovementAssist::Swap => true,
        MovementAssist::Shove | MovementAssist::Smite | MovementAssist::Reposition => {
            !state.is_occupied(target_dest, Some(user))
        }
        MovementAssist::DrawBack | MovementAssist::Pivot | MovementAssist::HitAndRun => {
            !state.is_occupied(user_dest, Some(user))
        }
    }
}

/// 在 target 旁邊某格使用位移輔助是否可行
pub fn movement_assist_possible(
    state: &GameState,
    user: usize,
    from: Pos,
    target: usize,
    kind: MovementAssist,
) -> bool {
    let (user_dest, target_dest) = movement_assist_destinations(state, from, target, kind);
    let valid = validate_movement_assist(state, user, user_dest, target, target_dest, kind);
    if !valid {
        trace!("{} 無法在 {} 使用 {}", state.units[user].hero, from, kind);
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Terrain;

    #[test]
    fn test_remaining_after_entry() {
        let test_data = [
            (MoveType::Infantry, Terrain::Plains, 2, false, Some(2)),
            (MoveType::Infantry, Terrain::Forest, 2, false, Some(1)),
            (MoveType::Infantry, Terrain::Forest, 2, true, Some(2)),
            (MoveType::Infantry, Terrain::Flier, 2, false, None),
            (MoveType::Armoured, Terrain::Forest, 1, false, Some(1)),
            (MoveType::Cavalry, Terrain::Forest, 3, false, None),
            (MoveType::Cavalry, Terrain::Trench, 3, false, Some(1)),
            (MoveType::Flier, Terrain::Flier, 2, false, Some(2)),
            (MoveType::Flier, Terrain::Wall, 2, false, None),
        ];
        for (idx, (move_type, terrain, remaining, is_start, expected)) in
            test_data.iter().enumerate()
        {
            assert_eq!(
                remaining_after_entry(*move_type, *terrain, *remaining, *is_start),
                *expected,
                "Case {}",
                idx
            );
        }
    }

    #[test]
    fn test_mirror() {
        assert_eq!(mirror(Pos::new(2, 2), Pos::new(2, 1)), Pos::new(2, 3));
        assert_eq!(mirror(Pos::new(0, 0), Pos::new(1, 0)), Pos::new(-1, 0));
    }
}
