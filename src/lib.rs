pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    minimax_move, select_automated_move, AiAgent, AiConfig, AiDecision, AiDifficulty, MovePolicy,
};
pub use game::{
    apply_move, evaluate, Board, Cell, GameEvent, GameMode, GameOutcome, GameSession,
    IntegrityError, InvalidMoveReason, Mark, MoveResolution, ParseError, RuleError, Score,
    ScoreKey, WinningLine, CELL_COUNT, WINNING_LINES,
};

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error<E: Serialize>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(serde_to_js_error)
}

fn parse_mark(mark: &str) -> Result<Mark, JsValue> {
    Mark::from_str(mark).map_err(serde_to_js_error)
}

/// 解码前端传入的棋盘，并拒绝不一致的局面。
fn decode_board(board: JsValue) -> Result<Board, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    board.validated().map_err(to_js_error)
}

fn parse_difficulty(difficulty: Option<&str>) -> AiDifficulty {
    difficulty
        .and_then(|value| AiDifficulty::from_str(value).ok())
        .unwrap_or_default()
}

#[derive(Serialize)]
struct AiMoveResponse {
    decision: AiDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<MoveResolution>,
}

/// 一个页面会话：棋盘、比分与设置都保存在这里，由前端持有。
#[wasm_bindgen]
pub struct GameEngine {
    session: GameSession,
}

#[wasm_bindgen]
impl GameEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(mode: Option<String>, difficulty: Option<String>) -> GameEngine {
        let mode = mode
            .as_deref()
            .and_then(|value| GameMode::from_str(value).ok())
            .unwrap_or_default();
        let difficulty = parse_difficulty(difficulty.as_deref());
        GameEngine {
            session: GameSession::new(mode, difficulty),
        }
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        to_json(&self.session)
    }

    pub fn score_json(&self) -> Result<String, JsValue> {
        to_json(&self.session.score)
    }

    pub fn status_text(&self) -> String {
        self.session.status_text()
    }

    pub fn ai_turn_pending(&self) -> bool {
        self.session.ai_turn_pending()
    }

    pub fn play(&mut self, index: usize) -> Result<String, JsValue> {
        let resolution = self.session.play(index).map_err(to_js_error)?;
        to_json(&resolution)
    }

    pub fn apply_ai_move(&mut self) -> Result<String, JsValue> {
        let mut agent = AiAgent::new(self.session.ai_config());
        let (decision, applied) = self.session.play_ai(&mut agent).map_err(to_js_error)?;
        to_json(&AiMoveResponse { decision, applied })
    }

    /// 等待 `delay_ms`（默认取难度配置）后给出决策，不修改会话。
    pub fn think_ai(&self, delay_ms: Option<u32>) -> Promise {
        let board = self.session.board;
        let ai_mark = self.session.ai_mark;
        let pending = self.session.ai_turn_pending();
        let config = self.session.ai_config();
        let delay = delay_ms.unwrap_or(config.think_delay_ms);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let decision = if pending {
                AiAgent::new(config).decide(&board, ai_mark)
            } else {
                AiDecision::idle(config.difficulty)
            };
            let json = to_json(&decision)?;
            Ok(JsValue::from_str(&json))
        })
    }

    pub fn apply_ai_index(&mut self, index: usize) -> Result<String, JsValue> {
        let resolution = self.session.apply_ai_index(index).map_err(to_js_error)?;
        to_json(&resolution)
    }

    pub fn restart(&mut self) {
        self.session.restart();
    }

    pub fn reset_score(&mut self) {
        self.session.reset_score();
    }

    pub fn set_mode(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode = GameMode::from_str(mode).map_err(serde_to_js_error)?;
        self.session.set_mode(mode);
        Ok(())
    }

    pub fn set_difficulty(&mut self, difficulty: &str) -> Result<(), JsValue> {
        let difficulty = AiDifficulty::from_str(difficulty).map_err(serde_to_js_error)?;
        self.session.set_difficulty(difficulty);
        Ok(())
    }
}

/// 返回一个空棋盘，X 先手。
#[wasm_bindgen(js_name = "createBoard")]
pub fn create_board() -> Result<JsValue, JsValue> {
    to_value(&Board::new()).map_err(JsValue::from)
}

/// 在传入的棋盘上落子，返回更新后的棋盘、结果与事件。
#[wasm_bindgen(js_name = "applyMove")]
pub fn apply_move_js(board: JsValue, index: usize, mark: &str) -> Result<JsValue, JsValue> {
    let mut board = decode_board(board)?;
    let mark = parse_mark(mark)?;
    match apply_move(&mut board, index, mark) {
        Ok(resolution) => to_value(&resolution).map_err(JsValue::from),
        Err(error) => Err(to_js_error(error)),
    }
}

#[wasm_bindgen(js_name = "selectAutomatedMove")]
pub fn select_automated_move_js(
    board: JsValue,
    mark: &str,
    difficulty: Option<String>,
) -> Result<Option<usize>, JsValue> {
    let board = decode_board(board)?;
    let mark = parse_mark(mark)?;
    let difficulty = parse_difficulty(difficulty.as_deref());
    Ok(select_automated_move(&board, mark, difficulty))
}

#[wasm_bindgen(js_name = "evaluateBoard")]
pub fn evaluate_board(board: JsValue) -> Result<JsValue, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    to_value(&evaluate(&board)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateBoard")]
pub fn validate_board(board: JsValue) -> Result<(), JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    board.integrity_check().map_err(to_js_error)
}

#[wasm_bindgen(js_name = "winningLines")]
pub fn winning_lines() -> Result<JsValue, JsValue> {
    to_value(&WINNING_LINES).map_err(JsValue::from)
}
