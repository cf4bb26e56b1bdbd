//! 引擎错误类型
//!
//! 非法走子、空悔棋属于正常的控制流，用 `bool` / `Option` 报告；
//! 这里只收录构造期与解析期的错误。

/// 引擎错误
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 坐标越界
    #[error("Invalid coordinate ({x}, {y}): expected x in 0..=8, y in 0..=9")]
    InvalidCoordinate { x: i32, y: i32 },

    /// FEN 格式错误
    #[error("Invalid FEN: {message}")]
    InvalidFen { message: String },

    /// 走法字符串格式错误
    #[error("Invalid move notation: {notation}")]
    InvalidMoveNotation { notation: String },

    /// 配置文件读取或解析失败
    #[error("Failed to load config: {message}")]
    Config { message: String },

    /// 对局线程已退出
    #[error("Game session is closed")]
    SessionClosed,
}

impl EngineError {
    pub(crate) fn fen(message: impl Into<String>) -> Self {
        EngineError::InvalidFen {
            message: message.into(),
        }
    }
}

/// 引擎操作结果
pub type EngineResult<T> = Result<T, EngineError>;
