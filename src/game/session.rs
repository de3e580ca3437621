use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::rules::{apply_move, evaluate, InvalidMoveReason, MoveResolution, RuleError};
use super::score::Score;
use super::state::{Board, GameOutcome, Mark, ParseError};
use crate::ai::{AiAgent, AiConfig, AiDecision, AiDifficulty};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum GameMode {
    #[default]
    #[serde(rename = "ai")]
    PlayerVsAi,
    #[serde(rename = "pvp")]
    PlayerVsPlayer,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameMode::PlayerVsAi => f.write_str("ai"),
            GameMode::PlayerVsPlayer => f.write_str("pvp"),
        }
    }
}

impl FromStr for GameMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ai" | "cpu" | "computer" => Ok(GameMode::PlayerVsAi),
            "pvp" | "human" | "local" | "2p" => Ok(GameMode::PlayerVsPlayer),
            other => Err(ParseError::UnknownMode {
                value: other.to_string(),
            }),
        }
    }
}

/// 一次页面会话：当前棋盘、比分与对局设置。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameSession {
    pub board: Board,
    pub score: Score,
    pub mode: GameMode,
    pub difficulty: AiDifficulty,
    pub ai_mark: Mark,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new(GameMode::default(), AiDifficulty::default())
    }
}

impl GameSession {
    pub fn new(mode: GameMode, difficulty: AiDifficulty) -> Self {
        Self {
            board: Board::new(),
            score: Score::new(),
            mode,
            difficulty,
            ai_mark: Mark::O,
        }
    }

    pub fn ai_config(&self) -> AiConfig {
        AiConfig::from_difficulty(self.difficulty)
    }

    pub fn outcome(&self) -> GameOutcome {
        evaluate(&self.board)
    }

    pub fn ai_turn_pending(&self) -> bool {
        self.mode == GameMode::PlayerVsAi
            && self.board.to_move() == self.ai_mark
            && !self.outcome().is_terminal()
    }

    /// 人类点击格子。人机模式下轮到自动玩家时拒绝。
    pub fn play(&mut self, index: usize) -> Result<MoveResolution, RuleError> {
        if self.ai_turn_pending() {
            crate::console_warn!("cell {} clicked during the AI turn", index);
            return Err(RuleError::InvalidMove {
                index,
                reason: InvalidMoveReason::NotPlayerTurn,
            });
        }
        let mark = self.board.to_move();
        self.apply(index, mark)
    }

    /// 让自动玩家决定并落子；未轮到它时只返回空决策。
    pub fn play_ai(
        &mut self,
        agent: &mut AiAgent,
    ) -> Result<(AiDecision, Option<MoveResolution>), RuleError> {
        if !self.ai_turn_pending() {
            return Ok((AiDecision::idle(agent.config().difficulty), None));
        }
        let decision = agent.decide(&self.board, self.ai_mark);
        let applied = match decision.index {
            Some(index) => Some(self.apply(index, self.ai_mark)?),
            None => None,
        };
        Ok((decision, applied))
    }

    /// 应用先前（异步）得到的自动玩家落点。
    pub fn apply_ai_index(&mut self, index: usize) -> Result<MoveResolution, RuleError> {
        if !self.ai_turn_pending() {
            return Err(RuleError::InvalidMove {
                index,
                reason: InvalidMoveReason::NotPlayerTurn,
            });
        }
        self.apply(index, self.ai_mark)
    }

    fn apply(&mut self, index: usize, mark: Mark) -> Result<MoveResolution, RuleError> {
        let resolution = apply_move(&mut self.board, index, mark).map_err(|error| {
            crate::console_warn!("rejected move: {}", error);
            error
        })?;
        if self.score.record(&resolution.outcome).is_some() {
            crate::console_log!("game over: {}", self.status_text());
        }
        Ok(resolution)
    }

    pub fn restart(&mut self) {
        self.board = Board::new();
        crate::console_log!("new game ({} mode, {})", self.mode, self.difficulty);
    }

    pub fn reset_score(&mut self) {
        self.score.reset();
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        self.mode = mode;
        self.restart();
    }

    pub fn set_difficulty(&mut self, difficulty: AiDifficulty) {
        self.difficulty = difficulty;
        self.restart();
    }

    pub fn status_text(&self) -> String {
        match self.outcome() {
            GameOutcome::Win { winner, .. } => format!("Player {winner} Wins!"),
            GameOutcome::Draw => "It's a Draw!".to_string(),
            GameOutcome::InProgress if self.ai_turn_pending() => {
                format!("AI's Turn ({})", self.difficulty)
            }
            GameOutcome::InProgress => format!("Player {}'s Turn", self.board.to_move()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::CELL_COUNT;

    fn hard_agent() -> AiAgent {
        AiAgent::with_seed(AiConfig::from_difficulty(AiDifficulty::Hard), 11)
    }

    #[test]
    fn two_player_game_updates_score_once() {
        let mut session = GameSession::new(GameMode::PlayerVsPlayer, AiDifficulty::Easy);
        for index in [0, 3, 1, 4] {
            session.play(index).expect("move should succeed");
        }
        let resolution = session.play(2).expect("winning move should succeed");

        assert_eq!(resolution.winning_line, Some([0, 1, 2]));
        assert_eq!(session.score, Score { x: 1, o: 0, draw: 0 });
        assert_eq!(session.status_text(), "Player X Wins!");

        let error = session.play(8).expect_err("finished game must reject moves");
        assert_eq!(error.reason(), InvalidMoveReason::GameFinished);
        assert_eq!(session.score.games_played(), 1);
    }

    #[test]
    fn clicks_during_the_ai_turn_are_rejected() {
        let mut session = GameSession::new(GameMode::PlayerVsAi, AiDifficulty::Hard);
        session.play(4).expect("human move should succeed");
        assert!(session.ai_turn_pending());
        assert_eq!(session.status_text(), "AI's Turn (hard)");

        let before = session.board;
        let error = session.play(0).expect_err("AI turn must reject clicks");
        assert_eq!(error.reason(), InvalidMoveReason::NotPlayerTurn);
        assert_eq!(session.board, before);
    }

    #[test]
    fn ai_move_is_applied_for_the_ai_mark() {
        let mut session = GameSession::new(GameMode::PlayerVsAi, AiDifficulty::Hard);
        session.play(4).expect("human move should succeed");

        let (decision, applied) = session
            .play_ai(&mut hard_agent())
            .expect("AI move should succeed");

        assert_eq!(decision.index, Some(0));
        let applied = applied.expect("move should be applied");
        assert_eq!(applied.board.cell(0).and_then(|cell| cell.mark()), Some(Mark::O));
        assert!(!session.ai_turn_pending());
        assert_eq!(session.status_text(), "Player X's Turn");
    }

    #[test]
    fn ai_does_nothing_when_not_its_turn() {
        let mut session = GameSession::default();
        let (decision, applied) = session
            .play_ai(&mut hard_agent())
            .expect("idle call should succeed");
        assert_eq!(decision.index, None);
        assert!(applied.is_none());
        assert_eq!(session.board, Board::new());

        let error = session
            .apply_ai_index(0)
            .expect_err("AI index outside its turn must fail");
        assert_eq!(error.reason(), InvalidMoveReason::NotPlayerTurn);
    }

    #[test]
    fn hard_ai_session_never_loses_to_a_scripted_player() {
        let mut session = GameSession::new(GameMode::PlayerVsAi, AiDifficulty::Hard);
        let mut agent = hard_agent();
        for _ in 0..5 {
            while !session.outcome().is_terminal() {
                if session.ai_turn_pending() {
                    session.play_ai(&mut agent).expect("AI move should succeed");
                } else {
                    let index = session.board.empty_cells()[0];
                    session.play(index).expect("human move should succeed");
                }
            }
            assert_ne!(session.outcome().winner(), Some(Mark::X));
            session.restart();
        }
        assert_eq!(session.score.games_played(), 5);
        assert_eq!(session.score.x, 0);
    }

    #[test]
    fn restart_always_yields_a_fresh_board() {
        let mut session = GameSession::new(GameMode::PlayerVsPlayer, AiDifficulty::Medium);
        for index in [0, 3, 1, 4, 2] {
            session.play(index).expect("move should succeed");
        }
        session.restart();

        assert_eq!(session.board.empty_cells().len(), CELL_COUNT);
        assert_eq!(session.outcome(), GameOutcome::InProgress);
        assert_eq!(session.board.to_move(), Mark::X);
        assert_eq!(session.score.x, 1, "restart keeps the score");
    }

    #[test]
    fn changing_settings_restarts_and_reset_clears_score() {
        let mut session = GameSession::new(GameMode::PlayerVsPlayer, AiDifficulty::Medium);
        for index in [0, 1, 2, 4, 3, 5, 7, 6, 8] {
            session.play(index).expect("move should succeed");
        }
        assert_eq!(session.outcome(), GameOutcome::Draw);
        assert_eq!(session.status_text(), "It's a Draw!");
        assert_eq!(session.score.draw, 1);

        session.play(0).expect_err("drawn game must reject moves");
        session.set_difficulty(AiDifficulty::Hard);
        assert_eq!(session.board, Board::new());
        session.play(0).expect("fresh game accepts moves");
        session.set_mode(GameMode::PlayerVsAi);
        assert_eq!(session.board, Board::new());

        session.reset_score();
        assert_eq!(session.score, Score::default());
    }

    #[test]
    fn mode_parsing() {
        assert_eq!("AI".parse::<GameMode>(), Ok(GameMode::PlayerVsAi));
        assert_eq!("2p".parse::<GameMode>(), Ok(GameMode::PlayerVsPlayer));
        assert!("online".parse::<GameMode>().is_err());
        assert_eq!(
            serde_json::to_string(&GameMode::PlayerVsPlayer).expect("mode should serialize"),
            r#""pvp""#
        );
    }
}
