//! FEN 解析和生成
//!
//! 格式: `<棋盘> <回合>`，其后的字段（如 `- - 0 1`）会被忽略。
//!
//! 棋盘从 y = 0（黑方底线）写到 y = 9（红方底线），行之间用 `/` 分隔：
//! - 红方：K(帅) A(仕) E(相) H(马) R(车) C(炮) P(兵)，也接受 B/N
//! - 黑方：对应小写
//! - 空格：数字 (1-9)
//!
//! 回合：`r`（或 `w`）为红方，`b` 为黑方；省略时红方先走。

use crate::board::Grid;
use crate::error::{EngineError, EngineResult};
use crate::types::{Color, Piece, PieceType, Position};

/// FEN 解析后的状态
#[derive(Debug, Clone)]
pub struct FenState {
    pub pieces: Vec<Piece>,
    pub turn: Color,
}

/// 解析 FEN 字符串
pub fn parse_fen(fen: &str) -> EngineResult<FenState> {
    let mut parts = fen.split_whitespace();
    let board_str = parts
        .next()
        .ok_or_else(|| EngineError::fen("empty string"))?;
    let turn = match parts.next() {
        None => Color::Red,
        Some(turn_str) => {
            let mut chars = turn_str.chars();
            match (chars.next().and_then(Color::from_fen_char), chars.next()) {
                (Some(color), None) => color,
                _ => return Err(EngineError::fen(format!("invalid turn '{}'", turn_str))),
            }
        }
    };

    Ok(FenState {
        pieces: parse_board(board_str)?,
        turn,
    })
}

/// 解析棋盘字符串
fn parse_board(board_str: &str) -> EngineResult<Vec<Piece>> {
    let rows: Vec<&str> = board_str.split('/').collect();
    if rows.len() != Position::ROWS as usize {
        return Err(EngineError::fen(format!(
            "expected 10 rows, got {}",
            rows.len()
        )));
    }

    let mut pieces = Vec::with_capacity(32);

    for (y, row_str) in rows.iter().enumerate() {
        let mut x: u32 = 0;

        for ch in row_str.chars() {
            if let Some(skip) = ch.to_digit(10) {
                x += skip;
                continue;
            }
            let piece_type = PieceType::from_fen_char(ch)
                .ok_or_else(|| EngineError::fen(format!("invalid piece char '{}'", ch)))?;
            let color = if ch.is_ascii_uppercase() {
                Color::Red
            } else {
                Color::Black
            };
            let position = Position::new(x as i32, y as i32)
                .map_err(|_| EngineError::fen(format!("row {} is longer than 9 columns", y)))?;
            pieces.push(Piece::new(piece_type, color, position));
            x += 1;
        }

        if x != Position::COLUMNS as u32 {
            return Err(EngineError::fen(format!(
                "row {} has {} columns, expected 9",
                y, x
            )));
        }
    }

    Ok(pieces)
}

/// 从摆放和回合生成 FEN 字符串
pub fn board_to_fen(grid: &Grid, turn: Color) -> String {
    let mut rows = Vec::with_capacity(Position::ROWS as usize);

    for y in 0..Position::ROWS {
        let mut row = String::new();
        let mut empty = 0;
        for x in 0..Position::COLUMNS {
            match grid.get(Position::at(x, y)) {
                Some(piece) => {
                    if empty > 0 {
                        row.push_str(&empty.to_string());
                        empty = 0;
                    }
                    row.push(piece.to_fen_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            row.push_str(&empty.to_string());
        }
        rows.push(row);
    }

    format!("{} {}", rows.join("/"), turn.to_fen_char())
}

/// 在 FEN 局面上执行一步 ICCS 走法，返回新的 FEN；非法走法返回错误
pub fn apply_move_to_fen(fen: &str, move_str: &str) -> EngineResult<String> {
    let mut board = crate::board::Board::from_fen(fen)?;
    let (from, to) = crate::types::Move::parse_iccs(move_str)?;
    if !board.make_move_at(from, to) {
        return Err(EngineError::InvalidMoveNotation {
            notation: format!("{} (illegal in this position)", move_str),
        });
    }
    Ok(board.to_fen())
}
