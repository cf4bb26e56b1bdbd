//! 引擎配置
//!
//! 所有字段都有默认值，JSON 配置文件里只需写要覆盖的部分：
//!
//! ```json
//! { "search": { "depth": 4 }, "session": { "ai_color": "red" } }
//! ```

use crate::error::{EngineError, EngineResult};
use crate::types::{Color, PieceType};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 引擎总配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub search: AIConfig,
    pub session: SessionConfig,
}

impl EngineConfig {
    /// 从 JSON 字符串读取
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::Config {
            message: e.to_string(),
        })
    }

    /// 从 JSON 文件读取
    pub fn from_json_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::Config {
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json_str(&text)
    }
}

/// AI 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AIConfig {
    /// 搜索深度（步数）
    pub depth: u32,
    pub weights: EvalWeights,
}

impl Default for AIConfig {
    fn default() -> Self {
        AIConfig {
            depth: 3,
            weights: EvalWeights::default(),
        }
    }
}

/// 评估权重
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalWeights {
    pub chariot: i32,
    pub cannon: i32,
    pub horse: i32,
    pub advisor: i32,
    pub elephant: i32,
    pub soldier: i32,
    /// 只用于走法排序；将帅被吃由终局判定处理
    pub general: i32,
    /// 过河兵额外价值
    pub crossed_soldier: i32,
    /// 过河兵每前进一行的奖励
    pub soldier_advance: i32,
    /// 车马炮靠近中路的奖励（每列）
    pub center: i32,
    /// 每个伪合法走法的奖励，0 表示不计算机动性
    pub mobility: i32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        EvalWeights {
            chariot: 900,
            cannon: 450,
            horse: 400,
            advisor: 200,
            elephant: 200,
            soldier: 100,
            general: 10_000,
            crossed_soldier: 100,
            soldier_advance: 10,
            center: 5,
            mobility: 0,
        }
    }
}

impl EvalWeights {
    /// 获取棋子的子力价值
    pub fn value(&self, piece_type: PieceType) -> i32 {
        match piece_type {
            PieceType::Chariot => self.chariot,
            PieceType::Cannon => self.cannon,
            PieceType::Horse => self.horse,
            PieceType::Advisor => self.advisor,
            PieceType::Elephant => self.elephant,
            PieceType::Soldier => self.soldier,
            PieceType::General => self.general,
        }
    }
}

/// 对局配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// 人机对战时 AI 执哪一方
    pub ai_color: Color,
    /// 识别结果的置信度需高于此值才会导入
    pub recognition_confidence_threshold: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            ai_color: Color::Black,
            recognition_confidence_threshold: 0.7,
        }
    }
}
