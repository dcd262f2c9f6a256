use serde::{Deserialize, Serialize};

use crate::config::ScoringTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreEvent {
    Sack,
    Tackle,
    PassBreakup,
    Interception,
    Incompletion,
    StopOnTimeout,
    WaveCleared,
    TouchdownAllowed,
}

impl ScoringTable {
    pub fn delta(&self, event: ScoreEvent) -> i64 {
        match event {
            ScoreEvent::Sack => self.sack,
            ScoreEvent::Tackle => self.tackle,
            ScoreEvent::PassBreakup => self.pass_breakup,
            ScoreEvent::Interception => self.interception,
            ScoreEvent::Incompletion => self.incompletion,
            ScoreEvent::StopOnTimeout => self.stop_on_timeout,
            ScoreEvent::WaveCleared => self.wave_cleared,
            ScoreEvent::TouchdownAllowed => self.touchdown_allowed,
        }
    }
}

/// Per-session counters. `score` is the raw running sum and may dip below zero;
/// the zero floor applies only to `final_score`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub score: i64,
    pub wave: u32,
    pub plays: u32,
    pub tackles: u32,
    pub sacks: u32,
    pub interceptions: u32,
    pub pass_breakups: u32,
    pub touchdowns_allowed: u32,
    pub high_score: u64,
}

impl SessionStats {
    pub fn new(high_score: u64) -> Self {
        Self {
            wave: 1,
            high_score,
            ..Self::default()
        }
    }

    pub fn apply(&mut self, event: ScoreEvent, delta: i64) {
        self.score = self.score.saturating_add(delta);
        match event {
            ScoreEvent::Sack => self.sacks += 1,
            ScoreEvent::Tackle => self.tackles += 1,
            ScoreEvent::PassBreakup => self.pass_breakups += 1,
            ScoreEvent::Interception => self.interceptions += 1,
            ScoreEvent::TouchdownAllowed => self.touchdowns_allowed += 1,
            ScoreEvent::Incompletion | ScoreEvent::StopOnTimeout | ScoreEvent::WaveCleared => {}
        }
    }

    pub fn final_score(&self) -> u64 {
        u64::try_from(self.score.max(0)).unwrap_or(0)
    }

    pub fn beats_high_score(&self) -> bool {
        self.final_score() > self.high_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn sack_touchdown_tackle_floors_at_zero() {
        let table = GameConfig::default().scoring;
        let mut stats = SessionStats::new(0);
        for event in [ScoreEvent::Sack, ScoreEvent::TouchdownAllowed, ScoreEvent::Tackle] {
            stats.apply(event, table.delta(event));
        }
        assert_eq!(stats.score, -25);
        assert_eq!(stats.final_score(), 0);
        assert_eq!(stats.sacks, 1);
        assert_eq!(stats.tackles, 1);
        assert_eq!(stats.touchdowns_allowed, 1);
    }

    #[test]
    fn negative_deltas_can_recover() {
        let table = GameConfig::default().scoring;
        let mut stats = SessionStats::new(0);
        stats.apply(ScoreEvent::TouchdownAllowed, table.delta(ScoreEvent::TouchdownAllowed));
        stats.apply(ScoreEvent::Interception, table.delta(ScoreEvent::Interception));
        assert_eq!(stats.final_score(), 50);
    }

    #[test]
    fn high_score_comparison_uses_floored_score() {
        let mut stats = SessionStats::new(40);
        stats.apply(ScoreEvent::PassBreakup, 75);
        assert!(stats.beats_high_score());

        let mut stats = SessionStats::new(0);
        stats.apply(ScoreEvent::TouchdownAllowed, -150);
        assert!(!stats.beats_high_score());
    }
}
