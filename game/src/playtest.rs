//! Headless sessions: the wave controller behind `engine::GameLogic`, plus a bot
//! that plays it.

use std::time::Duration;

use engine::GameLogic;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::controller::{GameEffect, SessionSetup, WaveController};
use crate::defense;
use crate::phase::Phase;

pub const DEFAULT_FRAME_MS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimInput {
    pub dt_ms: u32,
    pub activate: bool,
}

impl SimInput {
    pub fn idle(dt_ms: u32) -> Self {
        Self {
            dt_ms,
            activate: false,
        }
    }

    pub fn tap(dt_ms: u32) -> Self {
        Self {
            dt_ms,
            activate: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefenseState {
    pub controller: WaveController,
    /// Effects produced by the step that built this state.
    pub effects: Vec<GameEffect>,
}

#[derive(Debug, Clone)]
pub struct DefenseLogic {
    config: GameConfig,
    setup: SessionSetup,
}

impl DefenseLogic {
    pub fn new(config: GameConfig, setup: SessionSetup) -> Self {
        Self { config, setup }
    }

    pub fn setup(&self) -> SessionSetup {
        self.setup
    }
}

impl GameLogic for DefenseLogic {
    type State = DefenseState;
    type Input = SimInput;

    fn initial_state(&self) -> Self::State {
        DefenseState {
            controller: WaveController::new(self.config.clone(), self.setup),
            effects: Vec::new(),
        }
    }

    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State {
        let mut controller = state.controller.clone();
        let mut effects = Vec::new();
        if input.activate {
            effects.extend(controller.activate());
        }
        effects.extend(controller.tick(Duration::from_millis(u64::from(input.dt_ms))));
        DefenseState {
            controller,
            effects,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum AutopilotMode {
    /// Taps at the best moment each phase allows.
    Ideal,
    /// Taps on any frame with probability `tap_chance`.
    Random { tap_chance: f64 },
}

#[derive(Debug, Clone)]
pub struct Autopilot {
    mode: AutopilotMode,
    frame_ms: u32,
    rng: ChaCha8Rng,
}

impl Autopilot {
    pub fn new(mode: AutopilotMode, frame_ms: u32, seed: u64) -> Self {
        Self {
            mode,
            frame_ms: frame_ms.max(1),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn mode(&self) -> AutopilotMode {
        self.mode
    }

    pub fn next_input(&mut self, state: &DefenseState) -> SimInput {
        let activate = match self.mode {
            AutopilotMode::Ideal => should_tap(&state.controller),
            AutopilotMode::Random { tap_chance } => {
                self.rng.gen_bool(tap_chance.clamp(0.0, 1.0))
            }
        };
        SimInput {
            dt_ms: self.frame_ms,
            activate,
        }
    }
}

fn should_tap(c: &WaveController) -> bool {
    let play = c.play();
    let profile = c.config().roster.profile(c.archetype());
    match play.phase {
        Phase::Play => profile
            .rush_moves
            .iter()
            .enumerate()
            .find(|(i, _)| c.rush_move_ready(*i))
            .is_some_and(|(_, mv)| mv.in_window(play.phase_elapsed)),
        Phase::BallFlight => {
            if play.coverage_attempt.is_some() {
                return false;
            }
            let perfect = defense::scaled_window(
                c.config().timing.perfect.window,
                c.difficulty().throw_window,
            );
            c.time_before_arrival()
                .is_some_and(|left| left <= perfect)
        }
        Phase::Yac => {
            let Some(carrier) = play.carrier else {
                return false;
            };
            let reach = defense::tackle_radius(&c.config().tackle, c.difficulty(), true);
            c.dive_ready() && play.defender_pos.distance(carrier) <= reach
        }
        _ => false,
    }
}
