//! 走法生成与规则判定
//!
//! 伪合法走法只看棋子自身的走法与阻挡；合法走法再过滤掉
//! 走后己方被将军或将帅照面的情况。

use crate::board::Grid;
use crate::types::{Color, GameStatus, Move, Piece, PieceType, Position};

const ORTHOGONAL: [(i8, i8); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];
const DIAGONAL: [(i8, i8); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// 马的走法：(目标偏移, 马腿偏移)
const HORSE_JUMPS: [((i8, i8), (i8, i8)); 8] = [
    ((-1, -2), (0, -1)),
    ((1, -2), (0, -1)),
    ((-2, -1), (-1, 0)),
    ((2, -1), (1, 0)),
    ((-2, 1), (-1, 0)),
    ((2, 1), (1, 0)),
    ((-1, 2), (0, 1)),
    ((1, 2), (0, 1)),
];

#[inline]
fn can_land(grid: &Grid, piece: &Piece, pos: Position) -> bool {
    grid.get(pos).map_or(true, |target| target.color != piece.color)
}

/// 获取棋子的所有伪合法目标位置
pub fn pseudo_legal_destinations(grid: &Grid, piece: &Piece) -> Vec<Position> {
    match piece.piece_type {
        PieceType::Chariot => chariot_moves(grid, piece),
        PieceType::Horse => horse_moves(grid, piece),
        PieceType::Elephant => elephant_moves(grid, piece),
        PieceType::Advisor => advisor_moves(grid, piece),
        PieceType::General => general_moves(grid, piece),
        PieceType::Cannon => cannon_moves(grid, piece),
        PieceType::Soldier => soldier_moves(grid, piece),
    }
}

fn chariot_moves(grid: &Grid, piece: &Piece) -> Vec<Position> {
    let mut moves = Vec::with_capacity(17);
    for (dx, dy) in ORTHOGONAL {
        let mut next = piece.position.offset(dx, dy);
        while let Some(pos) = next {
            match grid.get(pos) {
                None => moves.push(pos),
                Some(target) => {
                    if target.color != piece.color {
                        moves.push(pos);
                    }
                    break;
                }
            }
            next = pos.offset(dx, dy);
        }
    }
    moves
}

fn horse_moves(grid: &Grid, piece: &Piece) -> Vec<Position> {
    let mut moves = Vec::with_capacity(8);
    for ((dx, dy), (lx, ly)) in HORSE_JUMPS {
        let Some(to) = piece.position.offset(dx, dy) else {
            continue;
        };
        // 蹩马腿
        let blocked = piece
            .position
            .offset(lx, ly)
            .map_or(true, |leg| grid.is_occupied(leg));
        if !blocked && can_land(grid, piece, to) {
            moves.push(to);
        }
    }
    moves
}

fn elephant_moves(grid: &Grid, piece: &Piece) -> Vec<Position> {
    let mut moves = Vec::with_capacity(4);
    for (dx, dy) in DIAGONAL {
        let Some(to) = piece.position.offset(dx * 2, dy * 2) else {
            continue;
        };
        // 象不能过河
        if !to.is_on_own_side(piece.color) {
            continue;
        }
        // 塞象眼
        let eye_blocked = piece
            .position
            .offset(dx, dy)
            .map_or(true, |eye| grid.is_occupied(eye));
        if !eye_blocked && can_land(grid, piece, to) {
            moves.push(to);
        }
    }
    moves
}

fn advisor_moves(grid: &Grid, piece: &Piece) -> Vec<Position> {
    DIAGONAL
        .iter()
        .filter_map(|&(dx, dy)| piece.position.offset(dx, dy))
        .filter(|to| to.is_in_palace(piece.color) && can_land(grid, piece, *to))
        .collect()
}

fn general_moves(grid: &Grid, piece: &Piece) -> Vec<Position> {
    ORTHOGONAL
        .iter()
        .filter_map(|&(dx, dy)| piece.position.offset(dx, dy))
        .filter(|to| to.is_in_palace(piece.color) && can_land(grid, piece, *to))
        .collect()
}

fn cannon_moves(grid: &Grid, piece: &Piece) -> Vec<Position> {
    let mut moves = Vec::with_capacity(17);
    for (dx, dy) in ORTHOGONAL {
        let mut next = piece.position.offset(dx, dy);
        let mut found_screen = false;
        while let Some(pos) = next {
            match grid.get(pos) {
                None => {
                    if !found_screen {
                        moves.push(pos);
                    }
                }
                Some(target) => {
                    if !found_screen {
                        found_screen = true;
                    } else {
                        if target.color != piece.color {
                            moves.push(pos);
                        }
                        break;
                    }
                }
            }
            next = pos.offset(dx, dy);
        }
    }
    moves
}

fn soldier_moves(grid: &Grid, piece: &Piece) -> Vec<Position> {
    let mut moves = Vec::with_capacity(3);
    let pos = piece.position;

    if let Some(forward) = pos.offset(0, piece.color.forward()) {
        if can_land(grid, piece, forward) {
            moves.push(forward);
        }
    }

    // 过河后可以左右走
    if pos.is_across_river(piece.color) {
        for dx in [-1, 1] {
            if let Some(side) = pos.offset(dx, 0) {
                if can_land(grid, piece, side) {
                    moves.push(side);
                }
            }
        }
    }

    moves
}

/// 某一方的所有伪合法走法，按格子下标和方向的固定顺序
pub fn pseudo_legal_moves(grid: &Grid, color: Color) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    for piece in grid.pieces_of(color) {
        for to in pseudo_legal_destinations(grid, piece) {
            moves.push(Move {
                from: piece.position,
                to,
                moving_piece: *piece,
                captured_piece: grid.get(to).copied(),
            });
        }
    }
    moves
}

/// 检测某位置是否被某方的伪合法走法覆盖（不生成完整走法列表）
pub fn is_attacked(grid: &Grid, target: Position, attacker: Color) -> bool {
    let is_attacker = |pos: Position, piece_type: PieceType| {
        grid.get(pos)
            .is_some_and(|p| p.color == attacker && p.piece_type == piece_type)
    };

    // 车/炮（直线）
    for (dx, dy) in ORTHOGONAL {
        let mut next = target.offset(dx, dy);
        let mut found_screen = false;
        while let Some(pos) = next {
            if let Some(piece) = grid.get(pos) {
                if piece.color == attacker {
                    match (found_screen, piece.piece_type) {
                        (false, PieceType::Chariot) | (true, PieceType::Cannon) => return true,
                        _ => {}
                    }
                }
                if found_screen {
                    break;
                }
                found_screen = true;
            }
            next = pos.offset(dx, dy);
        }
    }

    // 马：反推马所在格，马腿紧挨着马、沿长边方向
    for ((dx, dy), (lx, ly)) in HORSE_JUMPS {
        let (Some(from), Some(leg)) = (
            target.offset(-dx, -dy),
            target.offset(-dx + lx, -dy + ly),
        ) else {
            continue;
        };
        if is_attacker(from, PieceType::Horse) && !grid.is_occupied(leg) {
            return true;
        }
    }

    // 兵卒：从后方前进，或过河后横走
    if let Some(from) = target.offset(0, -attacker.forward()) {
        if is_attacker(from, PieceType::Soldier) {
            return true;
        }
    }
    for dx in [-1, 1] {
        if let Some(from) = target.offset(dx, 0) {
            if from.is_across_river(attacker) && is_attacker(from, PieceType::Soldier) {
                return true;
            }
        }
    }

    // 将、士只在本方九宫内活动
    if target.is_in_palace(attacker) {
        let general_hit = ORTHOGONAL
            .iter()
            .filter_map(|&(dx, dy)| target.offset(dx, dy))
            .any(|from| is_attacker(from, PieceType::General));
        let advisor_hit = DIAGONAL
            .iter()
            .filter_map(|&(dx, dy)| target.offset(dx, dy))
            .any(|from| is_attacker(from, PieceType::Advisor));
        if general_hit || advisor_hit {
            return true;
        }
    }

    // 象只在本方半场活动
    if target.is_on_own_side(attacker) {
        for (dx, dy) in DIAGONAL {
            let (Some(from), Some(eye)) = (target.offset(dx * 2, dy * 2), target.offset(dx, dy))
            else {
                continue;
            };
            if is_attacker(from, PieceType::Elephant) && !grid.is_occupied(eye) {
                return true;
            }
        }
    }

    false
}

/// 检查是否被将军；没有将视为被将
pub fn is_in_check(grid: &Grid, color: Color) -> bool {
    match grid.general(color) {
        Some(pos) => is_attacked(grid, pos, color.opposite()),
        None => true,
    }
}

/// 将帅是否在同一列且中间无子
pub fn generals_facing(grid: &Grid) -> bool {
    let (Some(red), Some(black)) = (grid.general(Color::Red), grid.general(Color::Black)) else {
        return false;
    };
    if red.x() != black.x() {
        return false;
    }
    let (low, high) = (red.y().min(black.y()), red.y().max(black.y()));
    ((low + 1)..high).all(|y| !grid.is_occupied(Position::at(red.x(), y)))
}

/// 双方将帅是否都在棋盘上；缺将即终局，任何一方都无合法走法
fn both_generals_present(grid: &Grid) -> bool {
    grid.general(Color::Red).is_some() && grid.general(Color::Black).is_some()
}

/// 获取某一方的所有合法走法
pub fn legal_moves(grid: &Grid, color: Color) -> Vec<Move> {
    if !both_generals_present(grid) {
        return Vec::new();
    }

    let mut scratch = grid.clone();
    pseudo_legal_moves(grid, color)
        .into_iter()
        .filter(|mv| {
            scratch.apply(mv);
            let legal = !is_in_check(&scratch, color) && !generals_facing(&scratch);
            scratch.revert(mv);
            legal
        })
        .collect()
}

/// 是否还有合法走法（找到一个即返回）
pub fn has_legal_move(grid: &Grid, color: Color) -> bool {
    if !both_generals_present(grid) {
        return false;
    }
    let mut scratch = grid.clone();
    pseudo_legal_moves(grid, color).iter().any(|mv| {
        scratch.apply(mv);
        let legal = !is_in_check(&scratch, color) && !generals_facing(&scratch);
        scratch.revert(mv);
        legal
    })
}

/// 判断对局状态（`to_move` 为下一步走子方）
///
/// 无子可走且被将军判负；无子可走但未被将军（困毙）判和。
pub fn game_status(grid: &Grid, to_move: Color) -> GameStatus {
    match (grid.general(Color::Red), grid.general(Color::Black)) {
        (None, None) => return GameStatus::Draw,
        (None, Some(_)) => return GameStatus::BlackWins,
        (Some(_), None) => return GameStatus::RedWins,
        (Some(_), Some(_)) => {}
    }

    if has_legal_move(grid, to_move) {
        GameStatus::Playing
    } else if is_in_check(grid, to_move) {
        GameStatus::win_for(to_move.opposite())
    } else {
        GameStatus::Draw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::test_positions;

    fn pos(x: i32, y: i32) -> Position {
        Position::new(x, y).unwrap()
    }

    fn piece(piece_type: PieceType, color: Color, x: i32, y: i32) -> Piece {
        Piece::new(piece_type, color, pos(x, y))
    }

    fn destinations(board: &Board, from: Position) -> Vec<Position> {
        board
            .legal_moves(board.current_player())
            .into_iter()
            .filter(|m| m.from == from)
            .map(|m| m.to)
            .collect()
    }

    fn generals() -> Vec<Piece> {
        vec![
            piece(PieceType::General, Color::Red, 3, 9),
            piece(PieceType::General, Color::Black, 5, 0),
        ]
    }

    #[test]
    fn test_check_detection() {
        // 红车将军黑将
        let board = Board::from_fen("4k4/4R4/9/9/9/9/9/9/9/3K5 b").unwrap();

        assert!(board.is_in_check(Color::Black));
        assert!(!board.is_in_check(Color::Red));
    }

    #[test]
    fn test_cannon_screen_rule() {
        let mut pieces = generals();
        pieces.push(piece(PieceType::Cannon, Color::Red, 4, 9));
        pieces.push(piece(PieceType::Chariot, Color::Black, 4, 2));

        let mut board = Board::new();

        // 无炮架：不能吃
        board.set_position(pieces.clone());
        assert!(!destinations(&board, pos(4, 9)).contains(&pos(4, 2)));

        // 一个炮架：可以吃
        let mut one_screen = pieces.clone();
        one_screen.push(piece(PieceType::Soldier, Color::Black, 4, 5));
        board.set_position(one_screen);
        let dests = destinations(&board, pos(4, 9));
        assert!(dests.contains(&pos(4, 2)));
        assert!(!dests.contains(&pos(4, 5)));
        assert!(!dests.contains(&pos(4, 4)));

        // 两个炮架：不能吃
        let mut two_screens = pieces;
        two_screens.push(piece(PieceType::Soldier, Color::Black, 4, 5));
        two_screens.push(piece(PieceType::Soldier, Color::Red, 4, 7));
        board.set_position(two_screens);
        assert!(!destinations(&board, pos(4, 9)).contains(&pos(4, 2)));
    }

    #[test]
    fn test_horse_leg() {
        let mut pieces = generals();
        pieces.push(piece(PieceType::Horse, Color::Red, 4, 5));
        let mut board = Board::new();
        board.set_position(pieces.clone());
        assert_eq!(destinations(&board, pos(4, 5)).len(), 8);

        // 上方马腿被塞，(3,3) 和 (5,3) 不能去
        pieces.push(piece(PieceType::Soldier, Color::Black, 4, 4));
        board.set_position(pieces);
        let dests = destinations(&board, pos(4, 5));
        assert_eq!(dests.len(), 6);
        assert!(!dests.contains(&pos(3, 3)));
        assert!(!dests.contains(&pos(5, 3)));
        // 斜向路径不算马腿
        assert!(dests.contains(&pos(2, 4)));
    }

    #[test]
    fn test_elephant_eye_and_river() {
        let mut pieces = generals();
        pieces.push(piece(PieceType::Elephant, Color::Red, 2, 5));
        let mut board = Board::new();
        board.set_position(pieces.clone());
        let dests = destinations(&board, pos(2, 5));
        // 只能向己方半场
        assert_eq!(dests, vec![pos(0, 7), pos(4, 7)]);

        pieces.push(piece(PieceType::Advisor, Color::Red, 3, 6));
        board.set_position(pieces);
        assert_eq!(destinations(&board, pos(2, 5)), vec![pos(0, 7)]);
    }

    #[test]
    fn test_advisor_and_general_palace() {
        let mut board = Board::new();
        board.set_position(vec![
            piece(PieceType::General, Color::Red, 3, 9),
            piece(PieceType::Advisor, Color::Red, 3, 7),
            piece(PieceType::General, Color::Black, 5, 0),
        ]);
        assert_eq!(destinations(&board, pos(3, 7)), vec![pos(4, 8)]);
        let mut general = destinations(&board, pos(3, 9));
        general.sort();
        assert_eq!(general, vec![pos(3, 8), pos(4, 9)]);
    }

    #[test]
    fn test_soldier_moves() {
        let mut board = Board::new();
        board.set_position(vec![
            piece(PieceType::General, Color::Red, 3, 9),
            piece(PieceType::General, Color::Black, 5, 0),
            piece(PieceType::Soldier, Color::Red, 0, 6),
            piece(PieceType::Soldier, Color::Red, 6, 3),
        ]);
        // 未过河：只能前进
        assert_eq!(destinations(&board, pos(0, 6)), vec![pos(0, 5)]);
        // 过河：前进或横走
        assert_eq!(
            destinations(&board, pos(6, 3)),
            vec![pos(6, 2), pos(5, 3), pos(7, 3)]
        );
    }

    #[test]
    fn test_no_moves_once_a_general_is_gone() {
        let grid = Grid::from_pieces(vec![
            piece(PieceType::General, Color::Red, 4, 9),
            piece(PieceType::Chariot, Color::Red, 0, 5),
            piece(PieceType::Chariot, Color::Black, 0, 0),
        ]);
        for color in [Color::Red, Color::Black] {
            assert!(legal_moves(&grid, color).is_empty());
            assert!(!has_legal_move(&grid, color));
            assert!(!pseudo_legal_moves(&grid, color).is_empty());
        }
        assert_eq!(game_status(&grid, Color::Red), GameStatus::RedWins);
    }

    #[test]
    fn test_facing_generals_excluded() {
        // 马是将帅之间唯一的子，离开即照面
        let board = Board::from_fen(test_positions::FACING_BLOCKER).unwrap();
        assert!(destinations(&board, pos(4, 5)).is_empty());
        assert!(!board.legal_moves(Color::Red).is_empty());

        for mv in board.legal_moves(Color::Red) {
            let mut after = board.clone();
            assert!(after.make_move(&mv));
            assert!(!generals_facing(after.grid()));
        }
    }

    #[test]
    fn test_checkmate_and_stalemate() {
        let mut board = Board::from_fen(test_positions::MATE_IN_ONE).unwrap();
        assert!(board.make_move_at(pos(0, 5), pos(3, 5)));
        assert_eq!(board.status(), GameStatus::RedWins);
        assert!(board.legal_moves(Color::Black).is_empty());

        let board = Board::from_fen(test_positions::STALEMATE).unwrap();
        assert!(!board.is_in_check(Color::Black));
        assert!(board.legal_moves(Color::Black).is_empty());
        assert_eq!(board.status(), GameStatus::Draw);
    }

    #[test]
    fn test_attack_matches_pseudo_legal() {
        let board = Board::from_fen(test_positions::MIDGAME).unwrap();
        for color in [Color::Red, Color::Black] {
            let covered: Vec<Position> = pseudo_legal_moves(board.grid(), color)
                .into_iter()
                .map(|m| m.to)
                .collect();
            // 炮的平移目标不算攻击，只比较有敌子的格子
            for target in Position::all() {
                let enemy = board.piece_at(target).is_some_and(|p| p.color != color);
                if !enemy {
                    continue;
                }
                assert_eq!(
                    is_attacked(board.grid(), target, color),
                    covered.contains(&target),
                    "{} attack mismatch at {}",
                    color,
                    target.to_iccs()
                );
            }
        }
    }
}
