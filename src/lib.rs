//! Xiangqi Engine
//!
//! 中国象棋规则引擎 + Alpha-Beta 搜索 AI - 支持 FEN 输入输出

pub mod ai;
pub mod board;
pub mod config;
pub mod error;
pub mod fen;
pub mod rules;
pub mod session;
pub mod test_positions;
pub mod types;

pub use ai::{
    find_best_move, get_node_count, reset_node_count, AIStrategy, MinimaxAI, ScoredMove,
    MATE_SCORE,
};
pub use board::{Board, Grid};
pub use config::{AIConfig, EngineConfig, EvalWeights, SessionConfig};
pub use error::{EngineError, EngineResult};
pub use fen::{apply_move_to_fen, board_to_fen, parse_fen, FenState};
pub use session::{GameMode, GameSession, RecognitionResult, SessionHandle};
pub use types::{Color, GameStatus, Move, Piece, PieceType, Position};
