use std::time::Duration;

use engine::timer::Countdown;
use serde::{Deserialize, Serialize};

use crate::config::{CoverageAction, DefenderArchetype, PlayCall, TimingBucket};
use crate::field::Vec2f;
use crate::phase::{Phase, PhaseTimer};
use crate::scoring::ScoreEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoverageResult {
    Interception,
    Breakup,
    Miss,
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageAttempt {
    pub action: CoverageAction,
    pub bucket: Option<TimingBucket>,
    pub result: CoverageResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallState {
    pub pos: Vec2f,
    pub from: Vec2f,
    pub target: Vec2f,
}

impl BallState {
    pub fn held_at(spot: Vec2f) -> Self {
        Self {
            pos: spot,
            from: spot,
            target: spot,
        }
    }
}

/// Everything that lives for exactly one snap. Rebuilt at the start of every play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayState {
    pub play_id: u64,
    pub phase: Phase,
    #[serde(with = "engine::serde_millis")]
    pub phase_elapsed: Duration,
    pub timer: Option<PhaseTimer>,
    pub call: Option<PlayCall>,
    pub ball: BallState,
    pub carrier: Option<Vec2f>,
    pub defender: DefenderArchetype,
    pub defender_pos: Vec2f,
    pub coverage_attempt: Option<CoverageAttempt>,
    pub dive: Option<Countdown>,
    pub outcome: Option<ScoreEvent>,
}

impl PlayState {
    pub fn new(play_id: u64, defender: DefenderArchetype, defender_pos: Vec2f, qb_spot: Vec2f) -> Self {
        Self {
            play_id,
            phase: Phase::PreSnap,
            phase_elapsed: Duration::ZERO,
            timer: None,
            call: None,
            ball: BallState::held_at(qb_spot),
            carrier: None,
            defender,
            defender_pos,
            coverage_attempt: None,
            dive: None,
            outcome: None,
        }
    }

    pub fn is_diving(&self) -> bool {
        self.dive.is_some_and(|d| !d.is_done())
    }

    /// Time until the ball arrives, only meaningful while it is in the air.
    pub fn time_before_arrival(&self) -> Option<Duration> {
        if self.phase != Phase::BallFlight {
            return None;
        }
        self.timer.map(|t| t.remaining())
    }

    pub fn flight_progress(&self) -> f32 {
        match (self.phase, self.timer) {
            (Phase::BallFlight, Some(t)) if !t.countdown.limit().is_zero() => {
                t.countdown.elapsed().as_secs_f32() / t.countdown.limit().as_secs_f32()
            }
            (Phase::BallFlight, _) => 1.0,
            _ => 0.0,
        }
    }
}
