//! 游戏核心逻辑模块（棋盘状态、规则判定、比分与会话）。

pub mod rules;
pub mod score;
pub mod session;
pub mod state;

pub use rules::{apply_move, evaluate, InvalidMoveReason, MoveResolution, RuleError};
pub use score::{Score, ScoreKey};
pub use session::{GameMode, GameSession};
pub use state::{
    Board,
    Cell,
    GameEvent,
    GameOutcome,
    IntegrityError,
    Mark,
    ParseError,
    WinningLine,
    CELL_COUNT,
    WINNING_LINES,
};
