//! AI 算法模块（随机落子与极小化极大搜索）。

pub mod minimax;

pub use minimax::{
    minimax_move, select_automated_move, AiAgent, AiConfig, AiDecision, AiDifficulty, MovePolicy,
};
