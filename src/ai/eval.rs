//! 静态评估 - 子力 + 简单位置分

use crate::board::Grid;
use crate::config::EvalWeights;
use crate::rules;
use crate::types::{Color, Piece, PieceType};

/// 胜负分
pub const MATE_SCORE: i32 = 1_000_000;

/// 从 `color` 视角评估局面，同一局面总得到同一分数
pub fn evaluate(grid: &Grid, color: Color, weights: &EvalWeights) -> i32 {
    match (grid.general(color), grid.general(color.opposite())) {
        (None, _) => return -MATE_SCORE,
        (Some(_), None) => return MATE_SCORE,
        _ => {}
    }

    let mut score = 0;
    for piece in grid.pieces() {
        let value = piece_score(piece, weights);
        if piece.color == color {
            score += value;
        } else {
            score -= value;
        }
    }

    if weights.mobility != 0 {
        let own = rules::pseudo_legal_moves(grid, color).len() as i32;
        let opponent = rules::pseudo_legal_moves(grid, color.opposite()).len() as i32;
        score += weights.mobility * (own - opponent);
    }

    score
}

fn piece_score(piece: &Piece, weights: &EvalWeights) -> i32 {
    let pos = piece.position;
    match piece.piece_type {
        PieceType::General => 0,
        PieceType::Chariot | PieceType::Horse | PieceType::Cannon => {
            // 中心控制
            let center = 4 - (pos.x() as i32 - 4).abs();
            weights.value(piece.piece_type) + weights.center * center
        }
        PieceType::Soldier if pos.is_across_river(piece.color) => {
            // 过河后每前进一行加分
            let advanced = match piece.color {
                Color::Red => 4 - pos.y() as i32,
                Color::Black => pos.y() as i32 - 5,
            };
            weights.soldier + weights.crossed_soldier + weights.soldier_advance * advanced
        }
        other => weights.value(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::test_positions;

    #[test]
    fn test_start_is_balanced() {
        let board = Board::new();
        let weights = EvalWeights::default();
        assert_eq!(evaluate(board.grid(), Color::Red, &weights), 0);
        assert_eq!(evaluate(board.grid(), Color::Black, &weights), 0);

        let with_mobility = EvalWeights {
            mobility: 2,
            ..EvalWeights::default()
        };
        assert_eq!(evaluate(board.grid(), Color::Red, &with_mobility), 0);
    }

    #[test]
    fn test_perspective_is_antisymmetric() {
        let board = Board::from_fen(test_positions::MIDGAME).unwrap();
        let weights = EvalWeights::default();
        let red = evaluate(board.grid(), Color::Red, &weights);
        let black = evaluate(board.grid(), Color::Black, &weights);
        assert_eq!(red, -black);
    }

    #[test]
    fn test_material_advantage() {
        let board = Board::from_fen(test_positions::MATE_IN_ONE).unwrap();
        assert!(evaluate(board.grid(), Color::Red, &EvalWeights::default()) > 800);
    }

    #[test]
    fn test_crossed_soldier_bonus() {
        let weights = EvalWeights::default();
        let home = Board::from_fen("3k5/9/9/9/9/9/4P4/9/9/4K4 r").unwrap();
        let crossed = Board::from_fen("3k5/9/9/4P4/9/9/9/9/9/4K4 r").unwrap();
        assert_eq!(evaluate(home.grid(), Color::Red, &weights), weights.soldier);
        assert_eq!(
            evaluate(crossed.grid(), Color::Red, &weights),
            weights.soldier + weights.crossed_soldier + weights.soldier_advance
        );
    }

    #[test]
    fn test_missing_general() {
        let board = Board::from_fen("9/9/9/9/9/9/9/9/9/4K4 r").unwrap();
        assert_eq!(
            evaluate(board.grid(), Color::Red, &EvalWeights::default()),
            MATE_SCORE
        );
    }
}
