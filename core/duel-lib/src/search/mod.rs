//! 對戰搜尋：迭代加深的 negamax + alpha-beta
//!
//! - `table`：置換表
//! - `ordering`：殺手行動與歷史分數
//! - `eval`：靜態評估
//! - `notation`：行動簡寫與主要變例
//!
//! 可逆的行動（移動、攻擊障礙物、位移輔助）原地執行後以 StepLog 復原，
//! 其餘行動在複製的狀態上執行。復原後 hash 必須與執行前相同。

mod eval;
mod notation;
mod ordering;
mod table;

pub use eval::*;
pub use notation::*;
pub use ordering::*;
pub use table::*;

use crate::error::{Result, SearchError};
use crate::{
    Action, DuelResult, GameState, Mode, QuiescencePolicy, SearchConfig, execute_action,
    generate_actions, generate_block_breaks, generate_ko_actions,
};
use serde::{Deserialize, Serialize};
use skills_lib::{AssistType, GameData};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub const INFINITY: i32 = 50000;
pub const WIN: i32 = 49000;
pub const DRAW: i32 = 0;

/// 搜尋請求：序列化的局面與最大深度（0 表示使用設定值）
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub game_state: GameState,
    #[serde(default)]
    pub depth: u32,
}

/// 搜尋回應；score 是根節點行動方的角度
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub best: Option<Action>,
    pub score: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStats {
    pub nodes: u64,
    pub fail_high: u64,
    pub fail_high_first: u64,
}

impl SearchStats {
    /// 第一個行動就截斷的比例（百分比）
    pub fn ordering(&self) -> f64 {
        if self.fail_high == 0 {
            100.0
        } else {
            100.0 * self.fail_high_first as f64 / self.fail_high as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub best: Option<Action>,
    pub score: i32,
    /// 完整搜完的最深層數
    pub depth: u32,
    pub stats: SearchStats,
    pub pv: Vec<String>,
}

impl From<SearchOutcome> for SearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        Self {
            best: outcome.best,
            score: outcome.score,
        }
    }
}

/// 處理一次性的搜尋請求
pub fn handle_request(
    request: SearchRequest,
    data: &GameData,
    config: &SearchConfig,
) -> Result<SearchResponse> {
    let mut state = request.game_state;
    state.rehydrate(data);
    let depth = if request.depth == 0 {
        config.max_depth
    } else {
        request.depth
    };
    Ok(search(&state, data, config, depth)?.into())
}

/// 在私有的複本上搜尋，直到時間用完或達到 max_depth
pub fn search(
    state: &GameState,
    data: &GameData,
    config: &SearchConfig,
    max_depth: u32,
) -> Result<SearchOutcome> {
    if state.mode() != Mode::Duel {
        return Err(SearchError::UnsupportedMode.into());
    }
    if state.is_swap_phase() {
        return Err(SearchError::SwapPhase.into());
    }
    let mut root = state.clone();
    root.journal.clear();

    let mut searcher = Searcher::new(&root, data, config);
    if root.is_game_over() {
        warn!("遊戲已結束，不需要搜尋");
        return Ok(SearchOutcome {
            best: None,
            score: searcher.terminal_score(&root),
            depth: 0,
            stats: SearchStats::default(),
            pv: Vec::new(),
        });
    }
    searcher.run(&mut root, max_depth.max(1))
}

enum Continuation {
    Full(u32),
    Quiescence,
}

struct Searcher<'d> {
    data: &'d GameData,
    config: &'d SearchConfig,
    table: TranspositionTable,
    ordering: MoveOrdering,
    stats: SearchStats,
    start: Instant,
    budget: Duration,
    stop: bool,
    ply: usize,
}

impl<'d> Searcher<'d> {
    fn new(root: &GameState, data: &'d GameData, config: &'d SearchConfig) -> Self {
        Self {
            data,
            config,
            table: TranspositionTable::new(config.table_size),
            ordering: MoveOrdering::new(root, config.max_ply),
            stats: SearchStats::default(),
            start: Instant::now(),
            budget: Duration::from_millis(config.time_budget_ms),
            stop: false,
            ply: 0,
        }
    }

    fn run(&mut self, root: &mut GameState, max_depth: u32) -> Result<SearchOutcome> {
        let mut best = None;
        let mut score = 0;
        let mut completed = 0;
        let mut pv = Vec::new();

        for depth in 1..=max_depth {
            let value = self.negamax(root, -INFINITY, INFINITY, depth)?;
            if self.stop {
                break;
            }
            score = value;
            completed = depth;
            best = self.table.best_move(root.hash());
            pv = pv_line(&self.table, root, self.data, depth);
            let best_text = best.map_or("-".to_string(), |action| move_string(root, &action));
            debug!(
                "d={},time={}ms,best={},score={},nodes={},pv={},ordering={:.2}%",
                depth,
                self.start.elapsed().as_millis(),
                best_text,
                score,
                self.stats.nodes,
                pv.join(" "),
                self.stats.ordering()
            );
        }

        if best.is_none() {
            // 第一層就被打斷時，取排序後的第一個合法行動
            let mut moves = self.legal_moves(root);
            self.ordering
                .order(root, &mut moves, self.table.best_move(root.hash()), 0);
            best = moves.first().copied();
            score = evaluate(root, &self.config.weights);
        }

        Ok(SearchOutcome {
            best,
            score,
            depth: completed,
            stats: self.stats,
            pv,
        })
    }

    fn check_time(&mut self, interval: u64) {
        if interval > 0
            && self.stats.nodes % interval == 0
            && self.start.elapsed() > self.budget
        {
            self.stop = true;
        }
    }

    fn terminal_score(&self, state: &GameState) -> i32 {
        let result = state
            .duel()
            .and_then(|duel| duel.teams[state.current_turn()].result);
        let ply = self.ply as i32;
        match result {
            Some(DuelResult::Win) => WIN - ply,
            Some(DuelResult::Lose) => -WIN + ply,
            Some(DuelResult::Draw) | None => DRAW,
        }
    }

    fn legal_moves(&self, state: &GameState) -> Vec<Action> {
        let mut moves: Vec<Action> = state
            .team(state.current_turn())
            .iter()
            .flat_map(|slot| generate_actions(state, self.data, *slot))
            .collect();
        moves.push(Action::EndTurn);
        moves
    }

    fn quiescence_moves(&self, state: &GameState) -> Vec<Action> {
        let team = state.team(state.current_turn());
        let mut moves: Vec<Action> = team
            .iter()
            .flat_map(|slot| generate_ko_actions(state, self.data, *slot))
            .collect();
        moves.extend(
            team.iter()
                .flat_map(|slot| generate_block_breaks(state, self.data, *slot)),
        );
        moves
    }

    fn is_reversible(&self, state: &GameState, action: &Action) -> bool {
        match action {
            Action::Move { .. } | Action::Block { .. } => true,
            Action::Assist { from, .. } => state
                .unit_at(*from)
                .and_then(|slot| state.unit(slot).assist(self.data))
                .is_some_and(|assist| assist.is_assist_type(AssistType::Movement)),
            Action::Attack { .. } | Action::EndTurn => false,
        }
    }

    fn negamax(&mut self, state: &mut GameState, mut alpha: i32, beta: i32, depth: u32) -> Result<i32> {
        if state.is_game_over() {
            return Ok(self.terminal_score(state));
        }
        if depth == 0 {
            return self.quiescence(state, alpha, beta);
        }
        self.check_time(self.config.node_check_interval);
        self.stats.nodes += 1;

        let hash = state.hash();
        let probe = self.table.probe(hash, alpha, beta, depth);
        if let Some(score) = probe.and_then(|p| p.score) {
            return Ok(score);
        }

        let mut moves = self.legal_moves(state);
        self.ordering
            .order(state, &mut moves, probe.and_then(|p| p.best), self.ply);

        let old_alpha = alpha;
        let mut best = None;
        for (checked, action) in moves.iter().enumerate() {
            let score = self
                .visit(state, action, alpha, beta, Continuation::Full(depth - 1), None)?
                .unwrap_or(-INFINITY);
            if self.stop {
                return Ok(DRAW);
            }
            if score > alpha {
                if score >= beta {
                    if checked == 0 {
                        self.stats.fail_high_first += 1;
                    }
                    self.stats.fail_high += 1;
                    if !action.is_attack() {
                        self.ordering.record_killer(self.ply, *action);
                    }
                    self.table.store(hash, Some(*action), beta, Bound::Lower, depth);
                    return Ok(beta);
                }
                if !action.is_attack() && !action.is_end_turn() {
                    self.ordering.record_history(state, action, depth);
                }
                alpha = score;
                best = Some(*action);
            }
        }

        let bound = if alpha != old_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.table.store(hash, best, alpha, bound, depth);
        Ok(alpha)
    }

    fn quiescence(&mut self, state: &mut GameState, mut alpha: i32, beta: i32) -> Result<i32> {
        if state.is_game_over() {
            return Ok(self.terminal_score(state));
        }
        self.check_time(self.config.quiescence_check_interval);
        self.stats.nodes += 1;

        let stand_pat = evaluate(state, &self.config.weights);
        if stand_pat >= beta {
            return Ok(beta);
        }
        alpha = alpha.max(stand_pat);

        let mut moves = self.quiescence_moves(state);
        let hint = self.table.best_move(state.hash());
        self.ordering.order(state, &mut moves, hint, self.ply);

        let mut checked = 0;
        for action in &moves {
            let decisive_target = match (self.config.quiescence, action) {
                (QuiescencePolicy::Decisive, Action::Attack { target, .. }) => {
                    state.unit_at(*target)
                }
                _ => None,
            };
            let Some(score) =
                self.visit(state, action, alpha, beta, Continuation::Quiescence, decisive_target)?
            else {
                continue;
            };
            checked += 1;
            if self.stop {
                return Ok(DRAW);
            }
            if score > alpha {
                if score >= beta {
                    if checked == 1 {
                        self.stats.fail_high_first += 1;
                    }
                    self.stats.fail_high += 1;
                    return Ok(beta);
                }
                alpha = score;
            }
        }
        Ok(alpha)
    }

    /// 執行行動並往下搜尋；decisive_target 在執行後仍存活時略過這個行動
    fn visit(
        &mut self,
        state: &mut GameState,
        action: &Action,
        alpha: i32,
        beta: i32,
        next: Continuation,
        decisive_target: Option<usize>,
    ) -> Result<Option<i32>> {
        let mover = state.current_turn();
        if self.is_reversible(state, action) {
            let before = state.hash();
            let log = execute_action(state, self.data, action);
            let score = if decisive_target.is_some_and(|slot| state.unit(slot).alive) {
                None
            } else {
                Some(self.descend(state, mover, alpha, beta, next))
            };
            state.undo(log);
            if state.hash() != before {
                return Err(SearchError::HashMismatch {
                    expected: before,
                    found: state.hash(),
                    action: action.to_string(),
                }
                .into());
            }
            score.transpose()
        } else {
            let mut child = state.clone();
            execute_action(&mut child, self.data, action);
            if decisive_target.is_some_and(|slot| child.unit(slot).alive) {
                return Ok(None);
            }
            self.descend(&mut child, mover, alpha, beta, next).map(Some)
        }
    }

    fn descend(
        &mut self,
        child: &mut GameState,
        mover: usize,
        alpha: i32,
        beta: i32,
        next: Continuation,
    ) -> Result<i32> {
        let same_side = child.current_turn() == mover;
        let (a, b) = if same_side {
            (alpha, beta)
        } else {
            (-beta, -alpha)
        };
        self.ply += 1;
        let score = match next {
            Continuation::Full(depth) => self.negamax(child, a, b, depth),
            Continuation::Quiescence => self.quiescence(child, a, b),
        };
        self.ply -= 1;
        let score = score?;
        Ok(if same_side { score } else { -score })
    }
}
