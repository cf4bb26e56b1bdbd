//! AI 搜索模块
//!
//! 固定深度的 Minimax + Alpha-Beta 剪枝，加上静态评估和吃子优先的走法排序。

mod eval;
mod minimax;

pub use eval::{evaluate, MATE_SCORE};
pub use minimax::MinimaxAI;

use crate::board::Board;
use crate::config::AIConfig;
use crate::types::Move;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// 全局节点计数器
pub static NODE_COUNT: AtomicU64 = AtomicU64::new(0);

/// 重置节点计数器
pub fn reset_node_count() {
    NODE_COUNT.store(0, AtomicOrdering::Relaxed);
}

/// 获取当前节点计数
pub fn get_node_count() -> u64 {
    NODE_COUNT.load(AtomicOrdering::Relaxed)
}

/// 走法评分（从走子方视角）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredMove {
    pub mv: Move,
    pub score: i32,
}

/// AI 策略接口
pub trait AIStrategy {
    /// 选择走法（返回带评分的走法列表，高分在前）
    fn select_moves(&self, board: &Board, n: usize) -> Vec<ScoredMove>;

    /// 选择最佳走法
    fn select_best_move(&self, board: &Board) -> Option<Move> {
        self.select_moves(board, 1).first().map(|sm| sm.mv)
    }
}

/// 排序辅助函数（稳定排序，同分保持原顺序）
pub(crate) fn sort_and_truncate(scored: &mut Vec<ScoredMove>, n: usize) {
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(n);
}

/// 在 `max_depth` 步深度内为当前走子方找最佳走法
///
/// 只在走子方无子可走时返回 None；不会修改传入的棋盘。
pub fn find_best_move(board: &Board, max_depth: u32) -> Option<Move> {
    let config = AIConfig {
        depth: max_depth,
        ..AIConfig::default()
    };
    MinimaxAI::new(&config).select_best_move(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_positions;
    use crate::types::GameStatus;

    #[test]
    fn test_find_best_move_mate() {
        let mut board = Board::from_fen(test_positions::MATE_IN_ONE).unwrap();
        let mv = find_best_move(&board, 2).unwrap();
        assert!(board.make_move(&mv));
        assert_eq!(board.status(), GameStatus::RedWins);
    }

    #[test]
    fn test_find_best_move_deterministic() {
        let board = Board::new();
        assert_eq!(find_best_move(&board, 2), find_best_move(&board, 2));
    }

    #[test]
    fn test_node_count_increases() {
        let board = Board::new();
        let before = get_node_count();
        find_best_move(&board, 2);
        assert!(get_node_count() > before);
    }

    #[test]
    fn test_sort_and_truncate_is_stable() {
        let board = Board::new();
        let moves = board.legal_moves(board.current_player());
        let mut scored = vec![
            ScoredMove { mv: moves[0], score: 5 },
            ScoredMove { mv: moves[1], score: 10 },
            ScoredMove { mv: moves[2], score: 5 },
        ];
        sort_and_truncate(&mut scored, 2);
        assert_eq!(scored[0].mv, moves[1]);
        assert_eq!(scored[1].mv, moves[0]);
    }
}
