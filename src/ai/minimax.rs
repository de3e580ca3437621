use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::{evaluate, Board, Cell, Mark, ParseError, CELL_COUNT};

/// 自动玩家连成一线的叶子分值。
pub const WIN_SCORE: i32 = 10;
/// 对手连成一线的叶子分值。
pub const LOSS_SCORE: i32 = -10;
pub const DRAW_SCORE: i32 = 0;

/// 页面在人类落子后模拟“思考”的延迟。
pub const DEFAULT_THINK_DELAY_MS: u32 = 400;

#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy)]
struct Stopwatch {
    timestamp: f64,
}

#[cfg(target_arch = "wasm32")]
impl Stopwatch {
    fn start() -> Self {
        Self {
            timestamp: web_sys::js_sys::Date::now(),
        }
    }

    fn elapsed(&self) -> Duration {
        let elapsed_ms = (web_sys::js_sys::Date::now() - self.timestamp).max(0.0);
        Duration::from_millis(elapsed_ms as u64)
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
struct Stopwatch {
    started: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl Stopwatch {
    fn start() -> Self {
        Self {
            started: std::time::Instant::now(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl AiDifficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            AiDifficulty::Easy => "easy",
            AiDifficulty::Medium => "medium",
            AiDifficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for AiDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiDifficulty {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(AiDifficulty::Easy),
            "medium" | "normal" => Ok(AiDifficulty::Medium),
            "hard" => Ok(AiDifficulty::Hard),
            other => Err(ParseError::UnknownDifficulty {
                value: other.to_string(),
            }),
        }
    }
}

/// 选点方式。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MovePolicy {
    Random,
    Minimax,
}

impl fmt::Display for MovePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MovePolicy::Random => f.write_str("random"),
            MovePolicy::Minimax => f.write_str("minimax"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiConfig {
    pub difficulty: AiDifficulty,
    /// 采用极小化极大最优解的概率，其余情况在空格中均匀随机。
    pub optimal_probability: f64,
    pub think_delay_ms: u32,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        let optimal_probability = match difficulty {
            AiDifficulty::Easy => 0.0,
            AiDifficulty::Medium => 0.7,
            AiDifficulty::Hard => 1.0,
        };
        Self {
            difficulty,
            optimal_probability,
            think_delay_ms: DEFAULT_THINK_DELAY_MS,
        }
    }

    pub fn with_think_delay(mut self, think_delay_ms: u32) -> Self {
        self.think_delay_ms = think_delay_ms;
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AiDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    /// 仅在走了极小化极大搜索时给出。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<MovePolicy>,
    pub difficulty: AiDifficulty,
    pub nodes: u64,
    pub duration_ms: u64,
}

impl AiDecision {
    /// 无需落子时的空决策。
    pub fn idle(difficulty: AiDifficulty) -> Self {
        Self {
            index: None,
            score: None,
            policy: None,
            difficulty,
            nodes: 0,
            duration_ms: 0,
        }
    }
}

struct SearchStats {
    nodes: u64,
}

impl SearchStats {
    fn new() -> Self {
        Self { nodes: 0 }
    }
}

pub struct AiAgent {
    config: AiConfig,
    rng: SmallRng,
}

impl AiAgent {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// 为 `ai_mark` 选出下一手。棋盘已结束、无空格或未轮到 `ai_mark` 时 `index` 为 `None`。
    pub fn decide(&mut self, board: &Board, ai_mark: Mark) -> AiDecision {
        let clock = Stopwatch::start();
        let difficulty = self.config.difficulty;
        let empty = board.empty_cells();

        if board.to_move() != ai_mark {
            crate::console_warn!(
                "AI asked to move as {} but {} is to move",
                ai_mark,
                board.to_move()
            );
            return AiDecision::idle(difficulty);
        }
        if empty.is_empty() || evaluate(board).is_terminal() {
            return AiDecision::idle(difficulty);
        }

        let decision = if self.plays_optimally() {
            let mut stats = SearchStats::new();
            let mut scratch = *board;
            let best = best_move(&mut scratch, ai_mark, ai_mark, &mut stats);
            AiDecision {
                index: best.map(|(index, _)| index),
                score: best.map(|(_, score)| score),
                policy: Some(MovePolicy::Minimax),
                difficulty,
                nodes: stats.nodes,
                duration_ms: clock.elapsed().as_millis() as u64,
            }
        } else {
            AiDecision {
                index: empty.choose(&mut self.rng).copied(),
                score: None,
                policy: Some(MovePolicy::Random),
                difficulty,
                nodes: 0,
                duration_ms: clock.elapsed().as_millis() as u64,
            }
        };

        if let (Some(index), Some(policy)) = (decision.index, decision.policy) {
            crate::console_log!(
                "AI {} ({}) plays {} via {} ({} nodes, {} ms)",
                ai_mark,
                difficulty,
                index,
                policy,
                decision.nodes,
                decision.duration_ms
            );
        }

        decision
    }

    fn plays_optimally(&mut self) -> bool {
        let probability = self.config.optimal_probability;
        if probability.is_nan() || probability <= 0.0 {
            false
        } else if probability >= 1.0 {
            true
        } else {
            self.rng.gen_bool(probability)
        }
    }
}

/// 一次性选点，随机源取自熵。
pub fn select_automated_move(board: &Board, ai_mark: Mark, difficulty: AiDifficulty) -> Option<usize> {
    AiAgent::new(AiConfig::from_difficulty(difficulty))
        .decide(board, ai_mark)
        .index
}

/// 完整极小化极大搜索的最优点与分值，由 `ai_mark` 先行。
pub fn minimax_move(board: &Board, ai_mark: Mark) -> Option<(usize, i32)> {
    if evaluate(board).is_terminal() {
        return None;
    }
    let mut scratch = *board;
    best_move(&mut scratch, ai_mark, ai_mark, &mut SearchStats::new())
}

fn minimax_rec(board: &mut Board, player: Mark, ai_mark: Mark, stats: &mut SearchStats) -> i32 {
    stats.nodes += 1;

    if board.has_line(ai_mark.opponent()) {
        return LOSS_SCORE;
    }
    if board.has_line(ai_mark) {
        return WIN_SCORE;
    }

    best_move(board, player, ai_mark, stats)
        .map(|(_, score)| score)
        .unwrap_or(DRAW_SCORE)
}

/// 按下标升序枚举空格；只有严格更优才替换，所以同分取最小下标。
fn best_move(
    board: &mut Board,
    player: Mark,
    ai_mark: Mark,
    stats: &mut SearchStats,
) -> Option<(usize, i32)> {
    let maximizing = player == ai_mark;
    let mut best: Option<(usize, i32)> = None;

    for index in 0..CELL_COUNT {
        if !board.cells[index].is_empty() {
            continue;
        }
        board.cells[index] = Cell::from(player);
        let score = minimax_rec(board, player.opponent(), ai_mark, stats);
        board.cells[index] = Cell::Empty;

        let improves = match best {
            None => true,
            Some((_, best_score)) if maximizing => score > best_score,
            Some((_, best_score)) => score < best_score,
        };
        if improves {
            best = Some((index, score));
        }
    }

    best
}
