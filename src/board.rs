//! 棋盘
//!
//! `Grid` 只负责摆放（数组存储 + 将帅位置缓存），走子规则在 `rules` 模块；
//! `Board` 在其上加入回合、历史记录和对局状态。

use crate::error::EngineResult;
use crate::fen::{board_to_fen, parse_fen};
use crate::rules;
use crate::types::{Color, GameStatus, Move, Piece, PieceType, Position, STANDARD_LAYOUT};
use log::{debug, info};
use std::fmt;

/// 棋子摆放（90 个格子，10行 x 9列）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    squares: [Option<Piece>; 90],
    /// 缓存将帅位置，下标 0 为红方，1 为黑方
    generals: [Option<Position>; 2],
}

#[inline]
fn general_slot(color: Color) -> usize {
    match color {
        Color::Red => 0,
        Color::Black => 1,
    }
}

impl Grid {
    /// 空棋盘
    pub fn empty() -> Self {
        Grid {
            squares: [None; 90],
            generals: [None; 2],
        }
    }

    /// 由棋子列表构造，同一格子后放的覆盖先放的
    pub fn from_pieces<I: IntoIterator<Item = Piece>>(pieces: I) -> Self {
        let mut grid = Grid::empty();
        for piece in pieces {
            grid.place(piece);
        }
        grid
    }

    /// 获取某位置的棋子
    #[inline]
    pub fn get(&self, pos: Position) -> Option<&Piece> {
        self.squares[pos.to_index()].as_ref()
    }

    /// 检查位置是否有棋子
    #[inline]
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.squares[pos.to_index()].is_some()
    }

    /// 放置棋子（覆盖原有棋子）
    pub fn place(&mut self, piece: Piece) {
        if let Some(old) = self.remove(piece.position) {
            debug!("Replacing {} at {}", old.piece_type, old.position);
        }
        if piece.piece_type == PieceType::General {
            self.generals[general_slot(piece.color)] = Some(piece.position);
        }
        self.squares[piece.position.to_index()] = Some(piece);
    }

    /// 移除棋子
    pub fn remove(&mut self, pos: Position) -> Option<Piece> {
        let piece = self.squares[pos.to_index()].take()?;
        if piece.piece_type == PieceType::General
            && self.generals[general_slot(piece.color)] == Some(pos)
        {
            self.generals[general_slot(piece.color)] = None;
        }
        Some(piece)
    }

    /// 找到将的位置（使用缓存）
    #[inline]
    pub fn general(&self, color: Color) -> Option<Position> {
        self.generals[general_slot(color)]
    }

    /// 所有棋子，按格子下标顺序
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> + '_ {
        self.squares.iter().filter_map(|p| p.as_ref())
    }

    /// 某一方的所有棋子
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces().filter(move |p| p.color == color)
    }

    /// 执行走法（不检查合法性）
    pub(crate) fn apply(&mut self, mv: &Move) {
        self.remove(mv.from);
        self.remove(mv.to);
        self.place(mv.moving_piece.moved_to(mv.to));
    }

    /// 撤销 `apply`
    pub(crate) fn revert(&mut self, mv: &Move) {
        self.remove(mv.to);
        self.place(mv.moving_piece);
        if let Some(captured) = mv.captured_piece {
            self.place(captured);
        }
    }
}

/// 历史记录条目（被吃的子记在 `mv.captured_piece` 里）
#[derive(Debug, Clone, PartialEq, Eq)]
struct HistoryEntry {
    mv: Move,
    previous_status: GameStatus,
}

/// 棋盘
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    grid: Grid,
    current_player: Color,
    history: Vec<HistoryEntry>,
    status: GameStatus,
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl Board {
    /// 标准开局
    pub fn new() -> Self {
        let mut board = Board {
            grid: Grid::empty(),
            current_player: Color::Red,
            history: Vec::new(),
            status: GameStatus::Playing,
        };
        board.reset();
        board
    }

    /// 从 FEN 字符串创建棋盘
    pub fn from_fen(fen: &str) -> EngineResult<Board> {
        let state = parse_fen(fen)?;
        let mut board = Board::new();
        board.set_position_to_move(state.pieces, state.turn);
        Ok(board)
    }

    /// 生成 FEN 字符串
    pub fn to_fen(&self) -> String {
        board_to_fen(&self.grid, self.current_player)
    }

    /// 恢复标准开局
    pub fn reset(&mut self) {
        self.set_position(STANDARD_LAYOUT.iter().copied());
    }

    /// 整体替换棋子，红方先走
    pub fn set_position<I: IntoIterator<Item = Piece>>(&mut self, pieces: I) {
        self.set_position_to_move(pieces, Color::Red);
    }

    /// 整体替换棋子并指定走子方（摆棋模式）
    pub fn set_position_to_move<I: IntoIterator<Item = Piece>>(&mut self, pieces: I, to_move: Color) {
        self.grid = Grid::from_pieces(pieces);
        self.current_player = to_move;
        self.history.clear();
        self.status = rules::game_status(&self.grid, to_move);
        info!(
            "Position set: {} pieces, {} to move, status {:?}",
            self.grid.pieces().count(),
            to_move,
            self.status
        );
    }

    /// 获取当前回合
    #[inline]
    pub fn current_player(&self) -> Color {
        self.current_player
    }

    #[inline]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// 摆放（只读）
    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// 获取某位置的棋子
    #[inline]
    pub fn piece_at(&self, pos: Position) -> Option<Piece> {
        self.grid.get(pos).copied()
    }

    /// 获取棋子，`color` 为 None 时返回双方
    pub fn pieces(&self, color: Option<Color>) -> Vec<Piece> {
        self.grid
            .pieces()
            .filter(|p| color.map_or(true, |c| p.color == c))
            .copied()
            .collect()
    }

    /// 找到将的位置
    #[inline]
    pub fn find_general(&self, color: Color) -> Option<Position> {
        self.grid.general(color)
    }

    /// 检查是否被将军
    pub fn is_in_check(&self, color: Color) -> bool {
        rules::is_in_check(&self.grid, color)
    }

    /// 获取所有合法走法
    pub fn legal_moves(&self, color: Color) -> Vec<Move> {
        rules::legal_moves(&self.grid, color)
    }

    /// 按起止位置查找当前走子方的合法走法
    pub fn find_move(&self, from: Position, to: Position) -> Option<Move> {
        self.legal_moves(self.current_player)
            .into_iter()
            .find(|m| m.from == from && m.to == to)
    }

    /// 执行走棋；非法走法返回 false，棋盘不变
    pub fn make_move(&mut self, mv: &Move) -> bool {
        if self.status.is_terminal() {
            debug!("Rejected {}: game is over ({:?})", mv, self.status);
            return false;
        }
        if !self.legal_moves(self.current_player).contains(mv) {
            debug!("Rejected illegal move {}", mv);
            return false;
        }

        self.grid.apply(mv);
        self.history.push(HistoryEntry {
            mv: *mv,
            previous_status: self.status,
        });
        self.current_player = self.current_player.opposite();
        self.status = rules::game_status(&self.grid, self.current_player);
        debug!("Played {} (ply {}), status {:?}", mv, self.history.len(), self.status);
        true
    }

    /// 按起止位置走棋
    pub fn make_move_at(&mut self, from: Position, to: Position) -> bool {
        match self.find_move(from, to) {
            Some(mv) => self.make_move(&mv),
            None => false,
        }
    }

    /// 撤销走棋；没有历史时返回 false
    pub fn undo_move(&mut self) -> bool {
        let Some(entry) = self.history.pop() else {
            return false;
        };
        self.grid.revert(&entry.mv);
        self.current_player = entry.mv.moving_piece.color;
        self.status = entry.previous_status;
        true
    }

    /// 已走步数
    #[inline]
    pub fn move_count(&self) -> usize {
        self.history.len()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   a  b  c  d  e  f  g  h  i")?;
        for y in 0..Position::ROWS {
            write!(f, "{} ", 9 - y)?;
            for x in 0..Position::COLUMNS {
                match self.grid.get(Position::at(x, y)) {
                    Some(piece) => write!(f, " {}", piece.symbol())?,
                    None => write!(f, " ・")?,
                }
            }
            writeln!(f)?;
            if y == 4 {
                writeln!(f, "  ～～～～～～～～～～～～～")?;
            }
        }
        write!(f, "{} to move ({:?})", self.current_player, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: i32, y: i32) -> Position {
        Position::new(x, y).unwrap()
    }

    #[test]
    fn test_initial_board() {
        let board = Board::new();

        assert_eq!(board.pieces(Some(Color::Red)).len(), 16);
        assert_eq!(board.pieces(Some(Color::Black)).len(), 16);
        assert_eq!(board.current_player(), Color::Red);
        assert_eq!(board.status(), GameStatus::Playing);
        assert_eq!(board.move_count(), 0);
        assert!(board.pieces(None).iter().all(|p| p.is_on_start_square()));
    }

    #[test]
    fn test_legal_moves_initial() {
        let board = Board::new();
        assert_eq!(board.legal_moves(Color::Red).len(), 44);
        assert_eq!(board.legal_moves(Color::Black).len(), 44);
    }

    #[test]
    fn test_make_and_undo() {
        let mut board = Board::new();
        let before = board.clone();

        // 炮二平五
        assert!(board.make_move_at(pos(7, 7), pos(4, 7)));
        assert_eq!(board.current_player(), Color::Black);
        assert_eq!(board.move_count(), 1);
        assert_eq!(board.piece_at(pos(7, 7)), None);
        assert_eq!(
            board.piece_at(pos(4, 7)).map(|p| p.piece_type),
            Some(PieceType::Cannon)
        );

        assert!(board.undo_move());
        assert_eq!(board, before);
        assert!(!board.undo_move());
    }

    #[test]
    fn test_undo_restores_capture() {
        // 红车吃黑炮
        let mut board = Board::from_fen("4k4/9/9/9/4c4/4R4/9/9/9/3K5 r").unwrap();
        let before = board.clone();
        let mv = board.find_move(pos(4, 5), pos(4, 4)).unwrap();
        assert!(mv.is_capture());

        assert!(board.make_move(&mv));
        assert_eq!(board.pieces(Some(Color::Black)).len(), 1);
        assert!(board.undo_move());
        assert_eq!(board, before);
    }

    #[test]
    fn test_illegal_move_leaves_board_unchanged() {
        let mut board = Board::new();
        let before = board.clone();
        let chariot = board.piece_at(pos(0, 9)).unwrap();

        // 车被兵挡住
        let mv = Move {
            from: pos(0, 9),
            to: pos(0, 5),
            moving_piece: chariot,
            captured_piece: None,
        };
        assert!(!board.make_move(&mv));
        assert_eq!(board, before);

        // 不是自己的回合
        let black_chariot = board.piece_at(pos(0, 0)).unwrap();
        let mv = Move {
            from: pos(0, 0),
            to: pos(0, 1),
            moving_piece: black_chariot,
            captured_piece: None,
        };
        assert!(!board.make_move(&mv));
        assert_eq!(board, before);
    }

    #[test]
    fn test_set_position_clears_history() {
        let mut board = Board::new();
        assert!(board.make_move_at(pos(7, 7), pos(4, 7)));

        let pieces = vec![
            Piece::new(PieceType::General, Color::Red, pos(4, 9)),
            Piece::new(PieceType::General, Color::Black, pos(3, 0)),
            Piece::new(PieceType::Chariot, Color::Red, pos(0, 5)),
        ];
        board.set_position(pieces);
        assert_eq!(board.move_count(), 0);
        assert_eq!(board.current_player(), Color::Red);
        assert_eq!(board.pieces(None).len(), 3);
        assert_eq!(board.find_general(Color::Black), Some(pos(3, 0)));
    }

    #[test]
    fn test_missing_general_is_terminal() {
        let mut board = Board::new();
        board.set_position(vec![
            Piece::new(PieceType::General, Color::Red, pos(4, 9)),
            Piece::new(PieceType::Chariot, Color::Black, pos(0, 0)),
        ]);
        assert_eq!(board.status(), GameStatus::RedWins);
        assert!(board.legal_moves(Color::Red).is_empty());
        assert!(board.legal_moves(Color::Black).is_empty());

        let king_step = Move {
            from: pos(4, 9),
            to: pos(4, 8),
            moving_piece: board.piece_at(pos(4, 9)).unwrap(),
            captured_piece: None,
        };
        assert!(!board.make_move(&king_step));
        assert_eq!(board.move_count(), 0);
    }

    #[test]
    fn test_display_contains_glyphs() {
        let text = Board::new().to_string();
        assert!(text.contains('帥'));
        assert!(text.contains('將'));
        assert!(text.ends_with("Red to move (Playing)"));
    }
}
