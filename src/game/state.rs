use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 棋盘格子数量（3x3）。
pub const CELL_COUNT: usize = 9;

/// 三连线：棋盘上的三个格子下标。
pub type WinningLine = [usize; 3];

/// 全部 8 条三连线：3 行、3 列、2 条对角线。
pub const WINNING_LINES: [WinningLine; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// 玩家棋子。X 永远先手。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mark::X => "X",
            Mark::O => "O",
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mark {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Mark::X),
            "O" | "o" => Ok(Mark::O),
            other => Err(ParseError::UnknownMark {
                value: other.to_string(),
            }),
        }
    }
}

/// 单个格子。序列化为 `""`、`"X"`、`"O"`，与前端的数组保持一致。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl Cell {
    pub fn mark(self) -> Option<Mark> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Mark::X),
            Cell::O => Some(Mark::O),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    fn symbol(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }
}

impl From<Mark> for Cell {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Cell::X,
            Mark::O => Cell::O,
        }
    }
}

/// 对局结果。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameOutcome {
    InProgress,
    Win { winner: Mark, line: WinningLine },
    Draw,
}

impl GameOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameOutcome::InProgress)
    }

    pub fn winner(&self) -> Option<Mark> {
        match self {
            GameOutcome::Win { winner, .. } => Some(*winner),
            _ => None,
        }
    }

    pub fn winning_line(&self) -> Option<WinningLine> {
        match self {
            GameOutcome::Win { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// 对局中产生的事件，前端据此播放音效与高亮。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    MarkPlaced { index: usize, mark: Mark },
    GameWon { winner: Mark, line: WinningLine },
    GameDrawn,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[serde(tag = "type")]
pub enum IntegrityError {
    #[error("mark counts are inconsistent (X: {x}, O: {o})")]
    MarkCountMismatch { x: usize, o: usize },
    #[error("{actual} is recorded to move but {expected} should be")]
    TurnMismatch { expected: Mark, actual: Mark },
    #[error("both players have a completed line")]
    MultipleWinners,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown mark `{value}`")]
    UnknownMark { value: String },
    #[error("unexpected board character `{found}`")]
    InvalidCharacter { found: char },
    #[error("board needs 9 cells, found {found}")]
    WrongCellCount { found: usize },
    #[error("unknown difficulty `{value}`")]
    UnknownDifficulty { value: String },
    #[error("unknown game mode `{value}`")]
    UnknownMode { value: String },
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
}

/// 3x3 棋盘，按行优先存储，并记录轮到谁落子。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "BoardRepr")]
pub struct Board {
    pub cells: [Cell; CELL_COUNT],
    pub to_move: Mark,
}

/// 前端传来的棋盘可以只带 `cells`，此时由棋子数量推断下一手。
#[derive(Deserialize)]
struct BoardRepr {
    cells: [Cell; CELL_COUNT],
    #[serde(default)]
    to_move: Option<Mark>,
}

impl From<BoardRepr> for Board {
    fn from(repr: BoardRepr) -> Self {
        let mut board = Board::from_cells(repr.cells, first_mark());
        board.to_move = match repr.to_move {
            Some(mark) => mark,
            None => board.expected_to_move().unwrap_or(first_mark()),
        };
        board
    }
}

fn first_mark() -> Mark {
    Mark::X
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; CELL_COUNT],
            to_move: first_mark(),
        }
    }

    pub fn from_cells(cells: [Cell; CELL_COUNT], to_move: Mark) -> Self {
        Self { cells, to_move }
    }

    pub fn cell(&self, index: usize) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    pub fn to_move(&self) -> Mark {
        self.to_move
    }

    pub fn empty_cells(&self) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    pub fn count(&self, mark: Mark) -> usize {
        let target = Cell::from(mark);
        self.cells.iter().filter(|cell| **cell == target).count()
    }

    /// 找到 `mark` 完成的第一条三连线。
    pub fn line_for(&self, mark: Mark) -> Option<WinningLine> {
        let target = Cell::from(mark);
        WINNING_LINES
            .iter()
            .find(|line| line.iter().all(|&index| self.cells[index] == target))
            .copied()
    }

    pub fn has_line(&self, mark: Mark) -> bool {
        self.line_for(mark).is_some()
    }

    pub(crate) fn place(&mut self, index: usize, mark: Mark) {
        self.cells[index] = Cell::from(mark);
        self.to_move = mark.opponent();
    }

    /// 由棋子数量推断下一手；X 先手，因此 X 只能与 O 相等或多一枚。
    pub fn expected_to_move(&self) -> Result<Mark, IntegrityError> {
        let x = self.count(Mark::X);
        let o = self.count(Mark::O);
        if x == o {
            Ok(Mark::X)
        } else if x == o + 1 {
            Ok(Mark::O)
        } else {
            Err(IntegrityError::MarkCountMismatch { x, o })
        }
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let expected = self.expected_to_move()?;
        if expected != self.to_move {
            return Err(IntegrityError::TurnMismatch {
                expected,
                actual: self.to_move,
            });
        }
        if self.has_line(Mark::X) && self.has_line(Mark::O) {
            return Err(IntegrityError::MultipleWinners);
        }
        Ok(())
    }

    /// 校验通过才返回棋盘，供外部传入的棋盘使用。
    pub fn validated(self) -> Result<Self, IntegrityError> {
        self.integrity_check()?;
        Ok(self)
    }
}

impl FromStr for Board {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cells = [Cell::Empty; CELL_COUNT];
        let mut found = 0;
        for ch in s.chars() {
            let cell = match ch {
                'X' | 'x' => Cell::X,
                'O' | 'o' => Cell::O,
                '.' | '_' | '-' | ' ' => Cell::Empty,
                '\n' | '\r' | '/' => continue,
                other => return Err(ParseError::InvalidCharacter { found: other }),
            };
            if found < CELL_COUNT {
                cells[found] = cell;
            }
            found += 1;
        }
        if found != CELL_COUNT {
            return Err(ParseError::WrongCellCount { found });
        }

        let mut board = Board::from_cells(cells, Mark::X);
        board.to_move = board.expected_to_move()?;
        board.integrity_check()?;
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.cells.chunks(3).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            for cell in chunk {
                write!(f, "{}", cell.symbol())?;
            }
        }
        Ok(())
    }
}
