//! 置換表：固定大小、以 hash 取索引、不串接

use crate::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    /// 分數至少是 score（beta 截斷）
    Lower,
    /// 分數至多是 score（沒有提高 alpha）
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub hash: u64,
    pub best: Option<Action>,
    pub score: i32,
    pub bound: Bound,
    pub depth: u32,
}

/// 查表結果；score 只在儲存深度足夠且界限可用時才有值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub best: Option<Action>,
    pub score: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct TranspositionTable {
    entries: Vec<Option<Entry>>,
    mask: u64,
}

impl TranspositionTable {
    /// 大小向上取到 2 的冪次
    pub fn new(size: usize) -> Self {
        let size = size.max(1).next_power_of_two();
        Self {
            entries: vec![None; size],
            mask: size as u64 - 1,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn index(&self, hash: u64) -> usize {
        (hash & self.mask) as usize
    }

    fn entry(&self, hash: u64) -> Option<&Entry> {
        self.entries[self.index(hash)]
            .as_ref()
            .filter(|entry| entry.hash == hash)
    }

    pub fn probe(&self, hash: u64, alpha: i32, beta: i32, depth: u32) -> Option<Probe> {
        let entry = self.entry(hash)?;
        let score = if entry.depth < depth {
            None
        } else {
            match entry.bound {
                Bound::Exact => Some(entry.score),
                Bound::Upper if entry.score <= alpha => Some(alpha),
                Bound::Lower if entry.score >= beta => Some(beta),
                _ => None,
            }
        };
        Some(Probe {
            best: entry.best,
            score,
        })
    }

    /// 局面的最佳行動（排序與主要變例使用）
    pub fn best_move(&self, hash: u64) -> Option<Action> {
        self.entry(hash).and_then(|entry| entry.best)
    }

    /// 空位或同深度以上才覆蓋
    pub fn store(&mut self, hash: u64, best: Option<Action>, score: i32, bound: Bound, depth: u32) {
        let index = self.index(hash);
        let slot = &mut self.entries[index];
        if slot.is_none_or(|old| old.depth <= depth) {
            *slot = Some(Entry {
                hash,
                best,
                score,
                bound,
                depth,
            });
        }
    }

    pub fn clear(&mut self) {
        self.entries.fill(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shallow_entry_only_gives_move() {
        let mut table = TranspositionTable::new(16);
        table.store(42, Some(Action::EndTurn), 7, Bound::Exact, 2);
        let probe = table.probe(42, -100, 100, 3).expect("entry");
        assert_eq!(probe.best, Some(Action::EndTurn));
        assert_eq!(probe.score, None);
        assert_eq!(table.probe(42, -100, 100, 2).and_then(|p| p.score), Some(7));
    }

    #[test]
    fn test_bounds() {
        let mut table = TranspositionTable::new(16);
        table.store(1, None, 10, Bound::Upper, 4);
        table.store(2, None, 50, Bound::Lower, 4);
        let test_data = [
            (1, 20, 40, Some(20)),
            (1, 5, 40, None),
            (2, 0, 40, Some(40)),
            (2, 0, 60, None),
            (3, 0, 60, None),
        ];
        for (idx, (hash, alpha, beta, expected)) in test_data.iter().enumerate() {
            let score = table.probe(*hash, *alpha, *beta, 4).and_then(|p| p.score);
            assert_eq!(score, *expected, "Case {}", idx);
        }
    }

    #[test]
    fn test_replacement() {
        let mut table = TranspositionTable::new(4);
        assert_eq!(table.len(), 4);
        table.store(1, None, 1, Bound::Exact, 3);
        // 同索引、較淺的不覆蓋
        table.store(5, None, 2, Bound::Exact, 2);
        assert!(table.probe(5, 0, 0, 0).is_none());
        assert!(table.probe(1, 0, 0, 0).is_some());
        table.store(5, None, 2, Bound::Exact, 3);
        assert_eq!(table.probe(5, -10, 10, 3).and_then(|p| p.score), Some(2));
        table.clear();
        assert!(table.probe(5, 0, 0, 0).is_none());
    }
}
