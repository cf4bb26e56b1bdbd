//! 象棋测试局面库
//!
//! 提供命名的 FEN 测试局面，方便测试和调试
//!
//! 命名规范:
//! - START: 初始局面
//! - MIDGAME: 中局
//! - MATE_*: 杀棋测试
//! - 其余按测试的规则命名

// =============================================================================
// 开局 / 中局
// =============================================================================

/// 初始局面
pub const START: &str = "rheakaehr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RHEAKAEHR r";

/// 中炮开局后的中局局面，黑方走
pub const MIDGAME: &str =
    "r2akaeh1/4r4/1ch1e2c1/p1p1p3p/6p2/2P6/P3P1P1P/1C2C1H2/9/RHEAKAE1R b";

// =============================================================================
// 杀棋 / 终局
// =============================================================================

/// 红方一步杀：车 a4 平 d4，黑将上下都被控制，平移则与帅照面
pub const MATE_IN_ONE: &str = "3k5/9/9/9/9/R8/9/9/9/4K4 r";

/// 黑方唯一应着是将 d9 进 d8，之后红车 a4 平 d4 杀
pub const FORCED_REPLY: &str = "3k5/9/9/9/9/R8/9/9/9/4K4 b";

/// 困毙：黑方无子可走且未被将军
pub const STALEMATE: &str = "3k5/8R/9/9/9/9/9/9/9/4K4 b";

// =============================================================================
// 规则测试
// =============================================================================

/// 马是将帅之间唯一的遮挡
pub const FACING_BLOCKER: &str = "4k4/9/9/9/9/4H4/9/9/9/4K4 r";

/// 红车可吃无保护的黑炮
pub const HANGING_CANNON: &str = "4k4/9/9/9/4c4/4R4/9/9/9/4K4 r";
