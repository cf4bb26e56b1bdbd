//! Minimax AI 策略 - 固定深度 Alpha-Beta 搜索

use super::eval::{evaluate, MATE_SCORE};
use super::{sort_and_truncate, AIStrategy, ScoredMove, NODE_COUNT};
use crate::board::{Board, Grid};
use crate::config::{AIConfig, EvalWeights};
use crate::rules;
use crate::types::{Color, Move};
use log::debug;
use std::cmp::Reverse;
use std::sync::atomic::Ordering;

const INFINITY: i32 = MATE_SCORE + 1;

/// Minimax AI - 使用 Alpha-Beta 剪枝
///
/// 只读取调用方棋盘的快照，不持有可变状态，可以在多个线程上
/// 对不同棋盘同时搜索。
#[derive(Debug, Clone)]
pub struct MinimaxAI {
    depth: u32,
    weights: EvalWeights,
}

impl MinimaxAI {
    pub fn new(config: &AIConfig) -> Self {
        MinimaxAI {
            depth: config.depth.max(1),
            weights: config.weights.clone(),
        }
    }

    /// 指定深度、默认权重
    pub fn with_depth(depth: u32) -> Self {
        MinimaxAI::new(&AIConfig {
            depth,
            ..AIConfig::default()
        })
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// 评估局面（公开方法）
    pub fn evaluate_position(&self, board: &Board, color: Color) -> i32 {
        evaluate(board.grid(), color, &self.weights)
    }

    /// 静态评估一个棋盘局面（不搜索，默认权重）
    pub fn evaluate_static(board: &Board, color: Color) -> i32 {
        evaluate(board.grid(), color, &EvalWeights::default())
    }

    /// 吃子优先（先吃价值高的，再用价值低的子去吃），其余保持生成顺序
    fn order_moves(&self, moves: &mut [Move]) {
        moves.sort_by_key(|m| {
            Reverse(m.captured_piece.map(|victim| {
                (
                    self.weights.value(victim.piece_type),
                    -self.weights.value(m.moving_piece.piece_type),
                )
            }))
        });
    }

    /// 无子可走时的分数：被将死按步数计负分（越快越好），困毙为和
    fn terminal_score(&self, grid: &Grid, to_move: Color, root: Color, ply: u32) -> i32 {
        if grid.general(Color::Red).is_none() || grid.general(Color::Black).is_none() {
            return evaluate(grid, root, &self.weights);
        }
        if !rules::is_in_check(grid, to_move) {
            return 0;
        }
        let mate = MATE_SCORE - ply as i32;
        if to_move == root {
            -mate
        } else {
            mate
        }
    }

    /// 走子方由层数决定：偶数层是根节点一方
    fn minimax(&self, grid: &mut Grid, root: Color, depth: u32, ply: u32, mut alpha: i32, mut beta: i32) -> i32 {
        NODE_COUNT.fetch_add(1, Ordering::Relaxed);
        let to_move = if ply % 2 == 0 { root } else { root.opposite() };

        if depth == 0 {
            return evaluate(grid, root, &self.weights);
        }

        let mut moves = rules::legal_moves(grid, to_move);
        if moves.is_empty() {
            return self.terminal_score(grid, to_move, root, ply);
        }
        self.order_moves(&mut moves);

        let maximizing = to_move == root;
        let mut best = if maximizing { -INFINITY } else { INFINITY };

        for mv in &moves {
            grid.apply(mv);
            let score = self.minimax(grid, root, depth - 1, ply + 1, alpha, beta);
            grid.revert(mv);

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                best = best.min(score);
                beta = beta.min(score);
            }
            if alpha >= beta {
                break;
            }
        }
        best
    }

    /// 根节点有序的合法走法
    fn root_moves(&self, grid: &Grid, color: Color) -> Vec<Move> {
        let mut moves = rules::legal_moves(grid, color);
        self.order_moves(&mut moves);
        moves
    }

    /// 搜索最佳走法；无子可走时返回 None
    ///
    /// 分数相同时取生成顺序中最先遇到的走法。
    pub fn find_best_move(&self, board: &Board) -> Option<ScoredMove> {
        let root = board.current_player();
        let mut grid = board.grid().clone();
        let moves = self.root_moves(&grid, root);

        let mut alpha = -INFINITY;
        let mut best: Option<ScoredMove> = None;

        for mv in moves {
            grid.apply(&mv);
            let score = self.minimax(&mut grid, root, self.depth - 1, 1, alpha, INFINITY);
            grid.revert(&mv);

            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(ScoredMove { mv, score });
            }
            alpha = alpha.max(score);
        }

        if let Some(ref sm) = best {
            debug!(
                "{} best move {} score {} at depth {} ({} nodes)",
                root,
                sm.mv,
                sm.score,
                self.depth,
                NODE_COUNT.load(Ordering::Relaxed)
            );
        }
        best
    }
}

impl AIStrategy for MinimaxAI {
    /// 每个根走法用完整窗口搜索，分数是精确值
    fn select_moves(&self, board: &Board, n: usize) -> Vec<ScoredMove> {
        let root = board.current_player();
        let mut grid = board.grid().clone();

        let mut scored: Vec<ScoredMove> = self
            .root_moves(&grid, root)
            .into_iter()
            .map(|mv| {
                grid.apply(&mv);
                let score =
                    self.minimax(&mut grid, root, self.depth - 1, 1, -INFINITY, INFINITY);
                grid.revert(&mv);
                ScoredMove { mv, score }
            })
            .collect();

        sort_and_truncate(&mut scored, n);
        scored
    }

    fn select_best_move(&self, board: &Board) -> Option<Move> {
        self.find_best_move(board).map(|sm| sm.mv)
    }
}
