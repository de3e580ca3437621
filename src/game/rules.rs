use serde::{Deserialize, Serialize};
use std::fmt;

use super::state::{Board, GameEvent, GameOutcome, Mark, WinningLine, CELL_COUNT, WINNING_LINES};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InvalidMoveReason {
    OutOfBounds,
    CellOccupied,
    GameFinished,
    NotPlayerTurn,
}

impl fmt::Display for InvalidMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            InvalidMoveReason::OutOfBounds => "cell index is outside the board",
            InvalidMoveReason::CellOccupied => "cell is already occupied",
            InvalidMoveReason::GameFinished => "game is already over",
            InvalidMoveReason::NotPlayerTurn => "not this player's turn",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum RuleError {
    #[error("invalid move at cell {index}: {reason}")]
    InvalidMove {
        index: usize,
        reason: InvalidMoveReason,
    },
}

impl RuleError {
    fn invalid(index: usize, reason: InvalidMoveReason) -> Self {
        RuleError::InvalidMove { index, reason }
    }

    pub fn reason(&self) -> InvalidMoveReason {
        match self {
            RuleError::InvalidMove { reason, .. } => *reason,
        }
    }
}

/// 一次落子的结果：更新后的棋盘、对局结果与事件。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoveResolution {
    pub board: Board,
    pub outcome: GameOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_line: Option<WinningLine>,
    pub events: Vec<GameEvent>,
}

impl MoveResolution {
    pub fn new(board: Board, mut events: Vec<GameEvent>) -> Self {
        let outcome = evaluate(&board);
        match outcome {
            GameOutcome::Win { winner, line } => {
                events.push(GameEvent::GameWon { winner, line });
            }
            GameOutcome::Draw => events.push(GameEvent::GameDrawn),
            GameOutcome::InProgress => {}
        }

        Self {
            board,
            outcome,
            winning_line: outcome.winning_line(),
            events,
        }
    }
}

/// 判定棋盘：先按表顺序查三连线，再查满盘平局。
pub fn evaluate(board: &Board) -> GameOutcome {
    for line in WINNING_LINES.iter() {
        let first = board.cells[line[0]];
        if let Some(winner) = first.mark() {
            if line.iter().all(|&index| board.cells[index] == first) {
                return GameOutcome::Win {
                    winner,
                    line: *line,
                };
            }
        }
    }

    if board.is_full() {
        GameOutcome::Draw
    } else {
        GameOutcome::InProgress
    }
}

fn ensure_playable(board: &Board, index: usize, mark: Mark) -> Result<(), RuleError> {
    if index >= CELL_COUNT {
        return Err(RuleError::invalid(index, InvalidMoveReason::OutOfBounds));
    }
    if evaluate(board).is_terminal() {
        return Err(RuleError::invalid(index, InvalidMoveReason::GameFinished));
    }
    if !board.cells[index].is_empty() {
        return Err(RuleError::invalid(index, InvalidMoveReason::CellOccupied));
    }
    if board.to_move != mark {
        return Err(RuleError::invalid(index, InvalidMoveReason::NotPlayerTurn));
    }
    Ok(())
}

/// 在 `index` 落下 `mark`。校验失败时棋盘保持不变。
pub fn apply_move(board: &mut Board, index: usize, mark: Mark) -> Result<MoveResolution, RuleError> {
    ensure_playable(board, index, mark)?;
    board.place(index, mark);
    Ok(MoveResolution::new(
        *board,
        vec![GameEvent::MarkPlaced { index, mark }],
    ))
}
