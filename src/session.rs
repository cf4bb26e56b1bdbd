//! 对局会话
//!
//! `GameSession` 是一盘棋的唯一所有者：人走棋、AI 走棋、悔棋、导入识别结果
//! 都经过它。`spawn` 把会话放到独立线程上，调用方通过 `SessionHandle`
//! 发送命令，命令按到达顺序逐条执行，同一时刻最多只有一个搜索在进行。

use crate::ai::{AIStrategy, MinimaxAI};
use crate::board::Board;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::types::{Color, GameStatus, Move, Piece, PieceType, Position};
use crossbeam_channel::{self as channel, Receiver, Sender};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::thread::{self, JoinHandle};

/// 游戏模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// 人机对战
    AiVsPlayer,
    /// 双人对战
    PlayerVsPlayer,
    /// 摆棋模式
    BoardEdit,
    /// 相机识别
    CameraRecognition,
}

/// 识别模块交给引擎的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub pieces: Vec<(PieceType, Color, Position)>,
    pub confidence: f32,
}

/// 人走一步的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub accepted: bool,
    /// 人机模式下 AI 的应着
    pub ai_reply: Option<Move>,
    pub status: GameStatus,
}

/// 导入识别结果的结果
#[derive(Debug, Clone, PartialEq)]
pub enum ImportOutcome {
    Accepted { suggested: Option<Move> },
    Rejected { confidence: f32 },
}

/// 一盘棋的会话状态
pub struct GameSession {
    board: Board,
    ai: MinimaxAI,
    mode: GameMode,
    ai_color: Color,
    confidence_threshold: f32,
    suggested_move: Option<Move>,
}

impl GameSession {
    pub fn new(config: &EngineConfig) -> Self {
        GameSession {
            board: Board::new(),
            ai: MinimaxAI::new(&config.search),
            mode: GameMode::AiVsPlayer,
            ai_color: config.session.ai_color,
            confidence_threshold: config.session.recognition_confidence_threshold,
            suggested_move: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn suggested_move(&self) -> Option<Move> {
        self.suggested_move
    }

    /// 切换模式；除相机识别外都会重新开局
    pub fn set_mode(&mut self, mode: GameMode) {
        info!("Switching mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.suggested_move = None;
        if mode != GameMode::CameraRecognition {
            self.board.reset();
        }
    }

    /// 人机模式下轮到 AI 走
    fn is_ai_turn(&self) -> bool {
        self.mode == GameMode::AiVsPlayer
            && self.board.current_player() == self.ai_color
            && self.board.status() == GameStatus::Playing
    }

    /// 人走棋；人机模式下成功后 AI 立即应着
    pub fn human_move(&mut self, from: Position, to: Position) -> MoveOutcome {
        let playable = matches!(self.mode, GameMode::AiVsPlayer | GameMode::PlayerVsPlayer);
        let accepted = playable && !self.is_ai_turn() && self.board.make_move_at(from, to);

        let ai_reply = if accepted && self.is_ai_turn() {
            self.ai_move()
        } else {
            None
        };
        if accepted {
            self.suggested_move = ai_reply;
        }

        MoveOutcome {
            accepted,
            ai_reply,
            status: self.board.status(),
        }
    }

    /// 让 AI 为当前走子方走一步
    pub fn ai_move(&mut self) -> Option<Move> {
        let mv = self.ai.select_best_move(&self.board)?;
        if self.board.make_move(&mv) {
            debug!("AI played {}", mv);
            Some(mv)
        } else {
            warn!("AI proposed a move the board rejected: {}", mv);
            None
        }
    }

    /// 计算建议走法（不落子）
    pub fn suggest(&mut self) -> Option<Move> {
        self.suggested_move = if self.board.status().is_terminal() {
            None
        } else {
            self.ai.select_best_move(&self.board)
        };
        self.suggested_move
    }

    /// 悔棋；人机模式下连同 AI 的一步一起撤销
    pub fn undo(&mut self) -> bool {
        if !self.board.undo_move() {
            return false;
        }
        if self.mode == GameMode::AiVsPlayer && self.board.current_player() == self.ai_color {
            self.board.undo_move();
        }
        self.suggested_move = None;
        true
    }

    /// 重新开始
    pub fn restart(&mut self) {
        self.board.reset();
        self.suggested_move = None;
    }

    /// 导入识别结果；置信度不够时棋盘不变
    pub fn import_recognition(&mut self, result: RecognitionResult) -> ImportOutcome {
        if result.confidence <= self.confidence_threshold {
            warn!(
                "Recognition rejected: confidence {:.2} <= {:.2}",
                result.confidence, self.confidence_threshold
            );
            return ImportOutcome::Rejected {
                confidence: result.confidence,
            };
        }

        let pieces = result
            .pieces
            .into_iter()
            .map(|(piece_type, color, position)| Piece::new(piece_type, color, position));
        self.board.set_position(pieces);
        ImportOutcome::Accepted {
            suggested: self.suggest(),
        }
    }

    /// 摆棋：放一个棋子（覆盖原有棋子）
    pub fn add_piece(&mut self, piece: Piece) -> bool {
        if self.mode != GameMode::BoardEdit {
            return false;
        }
        let mut pieces: Vec<Piece> = self
            .board
            .pieces(None)
            .into_iter()
            .filter(|p| p.position != piece.position)
            .collect();
        pieces.push(piece);
        self.board.set_position(pieces);
        true
    }

    /// 摆棋：拿掉一个棋子
    pub fn remove_piece(&mut self, pos: Position) -> bool {
        if self.mode != GameMode::BoardEdit || self.board.piece_at(pos).is_none() {
            return false;
        }
        let pieces: Vec<Piece> = self
            .board
            .pieces(None)
            .into_iter()
            .filter(|p| p.position != pos)
            .collect();
        self.board.set_position(pieces);
        true
    }

    /// 摆棋：清空棋盘
    pub fn clear_board(&mut self) -> bool {
        if self.mode != GameMode::BoardEdit {
            return false;
        }
        self.board.set_position(Vec::new());
        true
    }
}

/// 发给会话线程的命令，每条命令自带回复通道
pub enum SessionCommand {
    HumanMove {
        from: Position,
        to: Position,
        reply: Sender<MoveOutcome>,
    },
    AiMove {
        reply: Sender<Option<Move>>,
    },
    Suggest {
        reply: Sender<Option<Move>>,
    },
    Undo {
        reply: Sender<bool>,
    },
    Restart {
        reply: Sender<()>,
    },
    SetMode {
        mode: GameMode,
        reply: Sender<()>,
    },
    Import {
        result: RecognitionResult,
        reply: Sender<ImportOutcome>,
    },
    Snapshot {
        reply: Sender<Board>,
    },
    Shutdown,
}

fn run(mut session: GameSession, commands: Receiver<SessionCommand>) {
    // 回复发送失败说明调用方已放弃等待，忽略即可
    for command in commands {
        match command {
            SessionCommand::HumanMove { from, to, reply } => {
                let _ = reply.send(session.human_move(from, to));
            }
            SessionCommand::AiMove { reply } => {
                let _ = reply.send(session.ai_move());
            }
            SessionCommand::Suggest { reply } => {
                let _ = reply.send(session.suggest());
            }
            SessionCommand::Undo { reply } => {
                let _ = reply.send(session.undo());
            }
            SessionCommand::Restart { reply } => {
                session.restart();
                let _ = reply.send(());
            }
            SessionCommand::SetMode { mode, reply } => {
                session.set_mode(mode);
                let _ = reply.send(());
            }
            SessionCommand::Import { result, reply } => {
                let _ = reply.send(session.import_recognition(result));
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(session.board().clone());
            }
            SessionCommand::Shutdown => break,
        }
    }
    info!("Game session stopped");
}

/// 启动会话线程
pub fn spawn(config: &EngineConfig) -> SessionHandle {
    let (sender, receiver) = channel::unbounded();
    let session = GameSession::new(config);
    let worker = thread::spawn(move || run(session, receiver));
    SessionHandle {
        sender,
        worker: Some(worker),
    }
}

/// 会话线程的调用端
pub struct SessionHandle {
    sender: Sender<SessionCommand>,
    worker: Option<JoinHandle<()>>,
}

impl SessionHandle {
    fn request<T>(&self, build: impl FnOnce(Sender<T>) -> SessionCommand) -> EngineResult<T> {
        let (reply, response) = channel::bounded(1);
        self.sender
            .send(build(reply))
            .map_err(|_| EngineError::SessionClosed)?;
        response.recv().map_err(|_| EngineError::SessionClosed)
    }

    pub fn human_move(&self, from: Position, to: Position) -> EngineResult<MoveOutcome> {
        self.request(|reply| SessionCommand::HumanMove { from, to, reply })
    }

    pub fn ai_move(&self) -> EngineResult<Option<Move>> {
        self.request(|reply| SessionCommand::AiMove { reply })
    }

    pub fn suggest(&self) -> EngineResult<Option<Move>> {
        self.request(|reply| SessionCommand::Suggest { reply })
    }

    pub fn undo(&self) -> EngineResult<bool> {
        self.request(|reply| SessionCommand::Undo { reply })
    }

    pub fn restart(&self) -> EngineResult<()> {
        self.request(|reply| SessionCommand::Restart { reply })
    }

    pub fn set_mode(&self, mode: GameMode) -> EngineResult<()> {
        self.request(|reply| SessionCommand::SetMode { mode, reply })
    }

    pub fn import(&self, result: RecognitionResult) -> EngineResult<ImportOutcome> {
        self.request(|reply| SessionCommand::Import { result, reply })
    }

    /// 当前棋盘的拷贝
    pub fn snapshot(&self) -> EngineResult<Board> {
        self.request(|reply| SessionCommand::Snapshot { reply })
    }

    /// 停止会话线程并等待其退出
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.sender.send(SessionCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Game session thread panicked");
            }
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AIConfig;

    fn pos(x: i32, y: i32) -> Position {
        Position::new(x, y).unwrap()
    }

    fn shallow_config() -> EngineConfig {
        EngineConfig {
            search: AIConfig {
                depth: 2,
                ..AIConfig::default()
            },
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_human_move_triggers_ai_reply() {
        let mut session = GameSession::new(&shallow_config());
        let outcome = session.human_move(pos(7, 7), pos(4, 7));

        assert!(outcome.accepted);
        let reply = outcome.ai_reply.unwrap();
        assert_eq!(reply.moving_piece.color, Color::Black);
        assert_eq!(session.board().move_count(), 2);
        assert_eq!(session.board().current_player(), Color::Red);
    }

    #[test]
    fn test_illegal_human_move_rejected() {
        let mut session = GameSession::new(&shallow_config());
        let outcome = session.human_move(pos(0, 9), pos(0, 4));
        assert!(!outcome.accepted);
        assert!(outcome.ai_reply.is_none());
        assert_eq!(session.board().move_count(), 0);
    }

    #[test]
    fn test_undo_takes_back_both_plies() {
        let mut session = GameSession::new(&shallow_config());
        assert!(session.human_move(pos(7, 7), pos(4, 7)).accepted);
        assert!(session.undo());
        assert_eq!(session.board().move_count(), 0);
        assert_eq!(session.board(), &Board::new());
        assert!(!session.undo());
    }

    #[test]
    fn test_player_vs_player_no_ai() {
        let mut session = GameSession::new(&shallow_config());
        session.set_mode(GameMode::PlayerVsPlayer);
        let outcome = session.human_move(pos(7, 7), pos(4, 7));
        assert!(outcome.accepted);
        assert!(outcome.ai_reply.is_none());
        assert!(session.undo());
        assert_eq!(session.board().move_count(), 0);
    }

    #[test]
    fn test_recognition_threshold() {
        let mut session = GameSession::new(&shallow_config());
        session.set_mode(GameMode::CameraRecognition);
        let pieces = vec![
            (PieceType::General, Color::Red, pos(4, 9)),
            (PieceType::General, Color::Black, pos(3, 0)),
            (PieceType::Chariot, Color::Red, pos(0, 5)),
        ];

        let low = RecognitionResult {
            pieces: pieces.clone(),
            confidence: 0.7,
        };
        assert_eq!(
            session.import_recognition(low),
            ImportOutcome::Rejected { confidence: 0.7 }
        );
        assert_eq!(session.board().pieces(None).len(), 32);

        let high = RecognitionResult {
            pieces,
            confidence: 0.95,
        };
        match session.import_recognition(high) {
            ImportOutcome::Accepted { suggested } => {
                let mv = suggested.unwrap();
                assert_eq!((mv.from, mv.to), (pos(0, 5), pos(3, 5)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(session.board().pieces(None).len(), 3);
        assert_eq!(session.suggested_move().map(|m| m.to), Some(pos(3, 5)));
    }

    #[test]
    fn test_board_edit() {
        let mut session = GameSession::new(&shallow_config());
        assert!(!session.clear_board());

        session.set_mode(GameMode::BoardEdit);
        assert!(session.clear_board());
        assert!(session.board().pieces(None).is_empty());

        assert!(session.add_piece(Piece::new(PieceType::General, Color::Red, pos(4, 9))));
        assert!(session.add_piece(Piece::new(PieceType::General, Color::Black, pos(4, 0))));
        assert!(session.add_piece(Piece::new(PieceType::Horse, Color::Red, pos(4, 5))));
        assert_eq!(session.board().pieces(None).len(), 3);
        assert_eq!(session.board().status(), GameStatus::Playing);

        assert!(session.remove_piece(pos(4, 5)));
        assert!(!session.remove_piece(pos(4, 5)));
        assert_eq!(session.board().pieces(None).len(), 2);
    }

    #[test]
    fn test_spawned_session_serializes_commands() {
        let handle = spawn(&shallow_config());
        let outcome = handle.human_move(pos(7, 7), pos(4, 7)).unwrap();
        assert!(outcome.accepted);

        let board = handle.snapshot().unwrap();
        assert_eq!(board.move_count(), 2);

        assert!(handle.undo().unwrap());
        assert_eq!(handle.snapshot().unwrap().move_count(), 0);

        handle.set_mode(GameMode::PlayerVsPlayer).unwrap();
        assert!(handle.suggest().unwrap().is_some());
        assert!(handle.ai_move().unwrap().is_some());
        assert_eq!(handle.snapshot().unwrap().move_count(), 1);

        handle.restart().unwrap();
        assert_eq!(handle.snapshot().unwrap(), Board::new());
        handle.shutdown();
    }
}
