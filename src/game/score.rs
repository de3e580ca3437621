use serde::{Deserialize, Serialize};

use super::state::{GameOutcome, Mark};

/// 计分键：某一方获胜或平局。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScoreKey {
    Win(Mark),
    Draw,
}

/// 本次页面会话内的比分，只在对局结束时递增。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Score {
    #[serde(rename = "X")]
    pub x: u32,
    #[serde(rename = "O")]
    pub o: u32,
    pub draw: u32,
}

impl Score {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一局结果；进行中的对局不计分。
    pub fn record(&mut self, outcome: &GameOutcome) -> Option<ScoreKey> {
        let key = match outcome {
            GameOutcome::Win { winner, .. } => ScoreKey::Win(*winner),
            GameOutcome::Draw => ScoreKey::Draw,
            GameOutcome::InProgress => return None,
        };
        let counter = match key {
            ScoreKey::Win(Mark::X) => &mut self.x,
            ScoreKey::Win(Mark::O) => &mut self.o,
            ScoreKey::Draw => &mut self.draw,
        };
        *counter = counter.saturating_add(1);
        Some(key)
    }

    pub fn get(&self, key: ScoreKey) -> u32 {
        match key {
            ScoreKey::Win(Mark::X) => self.x,
            ScoreKey::Win(Mark::O) => self.o,
            ScoreKey::Draw => self.draw,
        }
    }

    pub fn games_played(&self) -> u32 {
        self.x.saturating_add(self.o).saturating_add(self.draw)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_each_outcome_once() {
        let mut score = Score::new();
        score.record(&GameOutcome::Win {
            winner: Mark::O,
            line: [0, 4, 8],
        });
        score.record(&GameOutcome::Draw);
        score.record(&GameOutcome::Draw);

        assert_eq!(score.get(ScoreKey::Win(Mark::X)), 0);
        assert_eq!(score.get(ScoreKey::Win(Mark::O)), 1);
        assert_eq!(score.get(ScoreKey::Draw), 2);
        assert_eq!(score.games_played(), 3);
    }

    #[test]
    fn in_progress_is_not_counted() {
        let mut score = Score::new();
        assert_eq!(score.record(&GameOutcome::InProgress), None);
        assert_eq!(score, Score::default());
    }

    #[test]
    fn reset_zeroes_every_counter() {
        let mut score = Score { x: 3, o: 1, draw: 4 };
        score.reset();
        assert_eq!(score.games_played(), 0);
    }

    #[test]
    fn games_played_saturates() {
        let score = Score {
            x: u32::MAX,
            o: 1,
            draw: 1,
        };
        assert_eq!(score.games_played(), u32::MAX);
    }

    #[test]
    fn serializes_with_page_keys() {
        let score = Score { x: 2, o: 1, draw: 0 };
        let json = serde_json::to_string(&score).expect("score should serialize");
        assert_eq!(json, r#"{"X":2,"O":1,"draw":0}"#);
    }
}
