use std::time::Duration;

use engine::timer::Countdown;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    PreSnap,
    Snap,
    Play,
    BallFlight,
    Yac,
    PostPlay,
    End,
}

impl Phase {
    pub const ORDER: [Phase; 6] = [
        Phase::PreSnap,
        Phase::Snap,
        Phase::Play,
        Phase::BallFlight,
        Phase::Yac,
        Phase::PostPlay,
    ];

    /// The transition table. A play may end early (sack, interception, incompletion)
    /// by jumping to `PostPlay`, but never skips into a later live-ball phase:
    /// `BallFlight` is only entered from `Play` and `Yac` only from `BallFlight`.
    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        match (self, next) {
            (End, _) => false,
            (_, End) => true,
            (PreSnap, Snap)
            | (Snap, Play)
            | (Play, BallFlight)
            | (Play, PostPlay)
            | (BallFlight, Yac)
            | (BallFlight, PostPlay)
            | (Yac, PostPlay)
            | (PostPlay, PreSnap) => true,
            _ => false,
        }
    }

    pub fn is_live_ball(self) -> bool {
        matches!(self, Phase::Play | Phase::BallFlight | Phase::Yac)
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::PreSnap => "PRE_SNAP",
            Phase::Snap => "SNAP",
            Phase::Play => "PLAY",
            Phase::BallFlight => "BALL_FLIGHT",
            Phase::Yac => "YAC",
            Phase::PostPlay => "POST_PLAY",
            Phase::End => "END",
        }
    }
}

/// Identifies the phase a timer was armed for. Firing a token that no longer
/// matches the live play is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerToken {
    pub play_id: u64,
    pub phase: Phase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTimer {
    pub token: TimerToken,
    pub countdown: Countdown,
}

impl PhaseTimer {
    pub fn arm(play_id: u64, phase: Phase, duration: Duration) -> Self {
        Self {
            token: TimerToken { play_id, phase },
            countdown: Countdown::new(duration),
        }
    }

    pub fn remaining(&self) -> Duration {
        self.countdown.remaining()
    }
}
