//! 象棋核心类型定义
//!
//! 坐标约定：x 为列（0-8，从左到右），y 为行（0-9），
//! y = 0 是黑方底线，y = 9 是红方底线。

use crate::error::{EngineError, EngineResult};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 棋子颜色/阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Black,
}

impl Color {
    /// 获取对方阵营
    pub fn opposite(&self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    /// 从 FEN 回合字符解析（`w` 视为红方）
    pub fn from_fen_char(c: char) -> Option<Color> {
        match c {
            'r' | 'w' => Some(Color::Red),
            'b' => Some(Color::Black),
            _ => None,
        }
    }

    /// 转换为 FEN 字符
    pub fn to_fen_char(&self) -> char {
        match self {
            Color::Red => 'r',
            Color::Black => 'b',
        }
    }

    /// 兵卒前进方向（y 的增量）
    pub fn forward(&self) -> i8 {
        match self {
            Color::Red => -1,
            Color::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "Red"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// 棋子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    /// 车
    Chariot,
    /// 马
    Horse,
    /// 象/相
    Elephant,
    /// 士/仕
    Advisor,
    /// 将/帅
    General,
    /// 炮
    Cannon,
    /// 卒/兵
    Soldier,
}

impl PieceType {
    /// 从 FEN 字符解析（大小写均可，N/B 作为马/象的别名）
    pub fn from_fen_char(c: char) -> Option<PieceType> {
        match c.to_ascii_lowercase() {
            'k' => Some(PieceType::General),
            'a' => Some(PieceType::Advisor),
            'e' | 'b' => Some(PieceType::Elephant),
            'h' | 'n' => Some(PieceType::Horse),
            'r' => Some(PieceType::Chariot),
            'c' => Some(PieceType::Cannon),
            'p' => Some(PieceType::Soldier),
            _ => None,
        }
    }

    /// 转换为 FEN 字符（小写）
    pub fn to_fen_char(&self) -> char {
        match self {
            PieceType::General => 'k',
            PieceType::Advisor => 'a',
            PieceType::Elephant => 'e',
            PieceType::Horse => 'h',
            PieceType::Chariot => 'r',
            PieceType::Cannon => 'c',
            PieceType::Soldier => 'p',
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceType::Chariot => "Chariot",
            PieceType::Horse => "Horse",
            PieceType::Elephant => "Elephant",
            PieceType::Advisor => "Advisor",
            PieceType::General => "General",
            PieceType::Cannon => "Cannon",
            PieceType::Soldier => "Soldier",
        };
        write!(f, "{}", name)
    }
}

const COLUMN_NUMERALS: [char; 9] = ['一', '二', '三', '四', '五', '六', '七', '八', '九'];
const ROW_NUMERALS: [char; 10] = ['一', '二', '三', '四', '五', '六', '七', '八', '九', '十'];

/// 棋盘位置 (x, y)
///
/// 只能通过 [`Position::new`] 或解析函数得到，因此总在棋盘范围内。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "(i32, i32)", into = "(i32, i32)")]
pub struct Position {
    x: u8,
    y: u8,
}

impl Position {
    pub const COLUMNS: u8 = 9;
    pub const ROWS: u8 = 10;

    /// 创建位置，越界时返回 `InvalidCoordinate`
    pub fn new(x: i32, y: i32) -> EngineResult<Position> {
        if (0..=8).contains(&x) && (0..=9).contains(&y) {
            Ok(Position {
                x: x as u8,
                y: y as u8,
            })
        } else {
            Err(EngineError::InvalidCoordinate { x, y })
        }
    }

    /// 常量表用的构造函数，调用方保证范围
    pub(crate) const fn at(x: u8, y: u8) -> Position {
        Position { x, y }
    }

    #[inline]
    pub fn x(&self) -> u8 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> u8 {
        self.y
    }

    /// 棋盘数组下标
    #[inline]
    pub fn to_index(&self) -> usize {
        self.y as usize * Self::COLUMNS as usize + self.x as usize
    }

    /// 从数组下标恢复位置
    #[inline]
    pub fn from_index(index: usize) -> Position {
        Position {
            x: (index % Self::COLUMNS as usize) as u8,
            y: (index / Self::COLUMNS as usize) as u8,
        }
    }

    /// 所有 90 个格子，按下标顺序
    pub fn all() -> impl Iterator<Item = Position> {
        (0..90).map(Position::from_index)
    }

    /// 位置加偏移量，出界返回 None
    #[inline]
    pub fn offset(&self, dx: i8, dy: i8) -> Option<Position> {
        let x = self.x as i8 + dx;
        let y = self.y as i8 + dy;
        if (0..9).contains(&x) && (0..10).contains(&y) {
            Some(Position {
                x: x as u8,
                y: y as u8,
            })
        } else {
            None
        }
    }

    /// 检查位置是否在九宫格内
    pub fn is_in_palace(&self, color: Color) -> bool {
        if !(3..=5).contains(&self.x) {
            return false;
        }
        match color {
            Color::Red => (7..=9).contains(&self.y),
            Color::Black => (0..=2).contains(&self.y),
        }
    }

    /// 检查位置是否在己方半场
    pub fn is_on_own_side(&self, color: Color) -> bool {
        match color {
            Color::Red => self.y >= 5,
            Color::Black => self.y <= 4,
        }
    }

    /// 是否已过河（对该方而言）
    pub fn is_across_river(&self, color: Color) -> bool {
        !self.is_on_own_side(color)
    }

    /// 从中文坐标解析（如 "五十"），格式不对返回 None
    pub fn from_chinese(s: &str) -> Option<Position> {
        let mut chars = s.chars();
        let (col, row) = (chars.next()?, chars.next()?);
        if chars.next().is_some() {
            return None;
        }
        let x = COLUMN_NUMERALS.iter().position(|&c| c == col)?;
        let y = ROW_NUMERALS.iter().position(|&c| c == row)?;
        Some(Position::at(x as u8, y as u8))
    }

    /// 转换为中文坐标
    pub fn to_chinese(&self) -> String {
        let mut s = String::with_capacity(6);
        s.push(COLUMN_NUMERALS[self.x as usize]);
        s.push(ROW_NUMERALS[self.y as usize]);
        s
    }

    /// 从 ICCS 坐标解析（如 "e0"，行号从红方底线起算）
    pub fn from_iccs(s: &str) -> Option<Position> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let x = match bytes[0] {
            c @ b'a'..=b'i' => c - b'a',
            _ => return None,
        };
        let rank = match bytes[1] {
            c @ b'0'..=b'9' => c - b'0',
            _ => return None,
        };
        Some(Position::at(x, 9 - rank))
    }

    /// 转换为 ICCS 坐标
    pub fn to_iccs(&self) -> String {
        let col_char = (b'a' + self.x) as char;
        format!("{}{}", col_char, 9 - self.y)
    }
}

impl TryFrom<(i32, i32)> for Position {
    type Error = EngineError;

    fn try_from((x, y): (i32, i32)) -> EngineResult<Position> {
        Position::new(x, y)
    }
}

impl From<Position> for (i32, i32) {
    fn from(pos: Position) -> (i32, i32) {
        (pos.x as i32, pos.y as i32)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_chinese())
    }
}

/// 棋子（不可变值，移动后得到新值）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub piece_type: PieceType,
    pub color: Color,
    pub position: Position,
}

impl Piece {
    pub fn new(piece_type: PieceType, color: Color, position: Position) -> Self {
        Piece {
            piece_type,
            color,
            position,
        }
    }

    /// 返回移动到新位置后的棋子
    pub fn moved_to(&self, position: Position) -> Piece {
        Piece { position, ..*self }
    }

    /// 中文棋子符号
    pub fn symbol(&self) -> char {
        match (self.piece_type, self.color) {
            (PieceType::Chariot, Color::Red) => '俥',
            (PieceType::Chariot, Color::Black) => '車',
            (PieceType::Horse, Color::Red) => '傌',
            (PieceType::Horse, Color::Black) => '馬',
            (PieceType::Elephant, Color::Red) => '相',
            (PieceType::Elephant, Color::Black) => '象',
            (PieceType::Advisor, Color::Red) => '仕',
            (PieceType::Advisor, Color::Black) => '士',
            (PieceType::General, Color::Red) => '帥',
            (PieceType::General, Color::Black) => '將',
            (PieceType::Cannon, Color::Red) => '炮',
            (PieceType::Cannon, Color::Black) => '砲',
            (PieceType::Soldier, Color::Red) => '兵',
            (PieceType::Soldier, Color::Black) => '卒',
        }
    }

    /// FEN 字符：红方大写，黑方小写
    pub fn to_fen_char(&self) -> char {
        let c = self.piece_type.to_fen_char();
        match self.color {
            Color::Red => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// 是否位于该类棋子的开局位置
    pub fn is_on_start_square(&self) -> bool {
        let (x, y) = (self.position.x(), self.position.y());
        let (back, cannon_row, soldier_row) = match self.color {
            Color::Red => (9, 7, 6),
            Color::Black => (0, 2, 3),
        };
        match self.piece_type {
            PieceType::Chariot => y == back && (x == 0 || x == 8),
            PieceType::Horse => y == back && (x == 1 || x == 7),
            PieceType::Elephant => y == back && (x == 2 || x == 6),
            PieceType::Advisor => y == back && (x == 3 || x == 5),
            PieceType::General => y == back && x == 4,
            PieceType::Cannon => y == cannon_row && (x == 1 || x == 7),
            PieceType::Soldier => y == soldier_row && x % 2 == 0,
        }
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.symbol(), self.position)
    }
}

/// 走法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Position,
    pub to: Position,
    pub moving_piece: Piece,
    pub captured_piece: Option<Piece>,
}

impl Move {
    #[inline]
    pub fn is_capture(&self) -> bool {
        self.captured_piece.is_some()
    }

    /// ICCS 走法字符串（如 "h2e2"）
    pub fn to_iccs(&self) -> String {
        format!("{}{}", self.from.to_iccs(), self.to.to_iccs())
    }

    /// 解析 ICCS 走法字符串为 (from, to)
    pub fn parse_iccs(s: &str) -> EngineResult<(Position, Position)> {
        let s = s.trim();
        let invalid = || EngineError::InvalidMoveNotation {
            notation: s.to_string(),
        };
        if s.len() != 4 || !s.is_ascii() {
            return Err(invalid());
        }
        let from = Position::from_iccs(&s[0..2]).ok_or_else(invalid)?;
        let to = Position::from_iccs(&s[2..4]).ok_or_else(invalid)?;
        Ok((from, to))
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iccs())
    }
}

/// 对局状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Playing,
    RedWins,
    BlackWins,
    Draw,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        *self != GameStatus::Playing
    }

    /// 某方获胜对应的状态
    pub fn win_for(color: Color) -> GameStatus {
        match color {
            Color::Red => GameStatus::RedWins,
            Color::Black => GameStatus::BlackWins,
        }
    }
}

lazy_static! {
    /// 标准开局摆法
    pub static ref STANDARD_LAYOUT: Vec<Piece> = {
        const BACK_RANK: [PieceType; 9] = [
            PieceType::Chariot,
            PieceType::Horse,
            PieceType::Elephant,
            PieceType::Advisor,
            PieceType::General,
            PieceType::Advisor,
            PieceType::Elephant,
            PieceType::Horse,
            PieceType::Chariot,
        ];

        let mut pieces = Vec::with_capacity(32);
        for (color, back, cannon_row, soldier_row) in
            [(Color::Black, 0u8, 2u8, 3u8), (Color::Red, 9, 7, 6)]
        {
            for (x, piece_type) in BACK_RANK.iter().enumerate() {
                pieces.push(Piece::new(*piece_type, color, Position::at(x as u8, back)));
            }
            for x in [1u8, 7] {
                pieces.push(Piece::new(PieceType::Cannon, color, Position::at(x, cannon_row)));
            }
            for x in (0u8..9).step_by(2) {
                pieces.push(Piece::new(PieceType::Soldier, color, Position::at(x, soldier_row)));
            }
        }
        pieces
    };
}
