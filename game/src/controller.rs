//! The defensive play loop: phase timers, offense AI, defender actions and scoring.
//!
//! Everything advances through `tick`, `activate` and `fire_timer`; there are no
//! callbacks or wall-clock reads, so a controller can be cloned, serialized and
//! replayed frame by frame.

use std::time::Duration;

use engine::timer::Countdown;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{
    CoverageAction, DefenderArchetype, DefenderProfile, DifficultyProfile, GameConfig, PlayCall,
    RushMoveKind, TimingBucket,
};
use crate::defense;
use crate::field::Vec2f;
use crate::offense;
use crate::phase::{Phase, PhaseTimer, TimerToken};
use crate::play::{BallState, CoverageAttempt, CoverageResult, PlayState};
use crate::scoring::{ScoreEvent, SessionStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSetup {
    pub week: u32,
    pub archetype: DefenderArchetype,
    pub seed: u64,
    pub high_score: u64,
}

impl Default for SessionSetup {
    fn default() -> Self {
        Self {
            week: 1,
            archetype: DefenderArchetype::DefensiveBack,
            seed: 0,
            high_score: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEffect {
    PhaseChanged { from: Phase, to: Phase },
    CameraShake { millis: u64 },
    PlayCalled { call: PlayCall },
    RushMove { kind: RushMoveKind, landed: bool },
    Coverage {
        action: CoverageAction,
        bucket: Option<TimingBucket>,
        result: CoverageResult,
    },
    Dive,
    Scored { event: ScoreEvent, delta: i64, total: i64 },
    WaveAdvanced { wave: u32 },
    GameOver { final_score: u64, victory: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveController {
    config: GameConfig,
    week: u32,
    difficulty: DifficultyProfile,
    archetype: DefenderArchetype,
    play: PlayState,
    stats: SessionStats,
    rush_cooldowns: Vec<Countdown>,
    dive_cooldown: Countdown,
    plays_in_wave: u32,
    victory: Option<bool>,
    rng: ChaCha8Rng,
}

impl WaveController {
    pub fn new(config: GameConfig, setup: SessionSetup) -> Self {
        let difficulty = config.difficulty.for_week(setup.week);
        let profile = config.roster.profile(setup.archetype);
        let rush_cooldowns = vec![Countdown::new(Duration::ZERO); profile.rush_moves.len()];
        let mut play = PlayState::new(1, setup.archetype, profile.start, config.rules.qb_spot);
        play.timer = Some(PhaseTimer::arm(1, Phase::PreSnap, config.phases.pre_snap));

        log::info!(
            "session start: week {} ({:?}), defender {}",
            setup.week,
            difficulty.band,
            setup.archetype
        );

        Self {
            config,
            week: setup.week,
            difficulty,
            archetype: setup.archetype,
            play,
            stats: SessionStats::new(setup.high_score),
            rush_cooldowns,
            dive_cooldown: Countdown::new(Duration::ZERO),
            plays_in_wave: 0,
            victory: None,
            rng: ChaCha8Rng::seed_from_u64(setup.seed),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn difficulty(&self) -> &DifficultyProfile {
        &self.difficulty
    }

    pub fn archetype(&self) -> DefenderArchetype {
        self.archetype
    }

    pub fn phase(&self) -> Phase {
        self.play.phase
    }

    pub fn play(&self) -> &PlayState {
        &self.play
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn plays_in_wave(&self) -> u32 {
        self.plays_in_wave
    }

    pub fn is_over(&self) -> bool {
        self.play.phase == Phase::End
    }

    /// `Some(true)` after clearing the final wave, `Some(false)` after a loss or quit.
    pub fn victory(&self) -> Option<bool> {
        self.victory
    }

    pub fn pending_timer(&self) -> Option<TimerToken> {
        self.play.timer.map(|t| t.token)
    }

    pub fn time_before_arrival(&self) -> Option<Duration> {
        self.play.time_before_arrival()
    }

    pub fn rush_move_ready(&self, index: usize) -> bool {
        self.rush_cooldowns.get(index).is_some_and(Countdown::is_done)
    }

    pub fn dive_ready(&self) -> bool {
        self.dive_cooldown.is_done() && !self.play.is_diving()
    }

    fn profile(&self) -> &DefenderProfile {
        self.config.roster.profile(self.archetype)
    }

    fn defender_speed(&self) -> f32 {
        defense::defender_speed(self.profile(), &self.difficulty)
    }

    /// Moves the defender before the snap. Ignored in every other phase.
    pub fn reposition(&mut self, pos: Vec2f) -> bool {
        if self.play.phase != Phase::PreSnap {
            log::debug!("reposition ignored in {}", self.play.phase.label());
            return false;
        }
        self.play.defender_pos = self.config.rules.field.clamp(pos);
        true
    }

    pub fn tick(&mut self, dt: Duration) -> Vec<GameEffect> {
        let mut fx = Vec::new();
        if self.is_over() {
            return fx;
        }

        self.play.phase_elapsed = self.play.phase_elapsed.saturating_add(dt);
        for cooldown in &mut self.rush_cooldowns {
            cooldown.tick(dt);
        }
        self.dive_cooldown.tick(dt);
        if let Some(dive) = &mut self.play.dive {
            dive.tick(dt);
            if dive.is_done() {
                self.play.dive = None;
            }
        }

        if let Some(timer) = &mut self.play.timer {
            timer.countdown.tick(dt);
        }
        self.advance_positions(dt);

        if self.play.phase == Phase::Yac && self.check_yac_contact(&mut fx) {
            return fx;
        }

        let expired = self
            .play
            .timer
            .filter(|t| t.countdown.is_done())
            .map(|t| t.token);
        if let Some(token) = expired {
            self.handle_timer(token, &mut fx);
        }
        fx
    }

    /// The single "activate" input. What it does depends on the phase; signals
    /// that arrive when nothing can happen are dropped.
    pub fn activate(&mut self) -> Vec<GameEffect> {
        let mut fx = Vec::new();
        match self.play.phase {
            Phase::Play => self.try_rush_move(&mut fx),
            Phase::BallFlight => self.try_coverage(&mut fx),
            Phase::Yac => self.try_dive(&mut fx),
            phase => log::debug!("activate ignored in {}", phase.label()),
        }
        fx
    }

    /// Applies a phase timer. Tokens for a phase or play that has already been
    /// left are ignored.
    pub fn fire_timer(&mut self, token: TimerToken) -> Vec<GameEffect> {
        let mut fx = Vec::new();
        self.handle_timer(token, &mut fx);
        fx
    }

    pub fn quit(&mut self) -> Vec<GameEffect> {
        let mut fx = Vec::new();
        if !self.is_over() {
            self.game_over(false, &mut fx);
        }
        fx
    }

    fn handle_timer(&mut self, token: TimerToken, fx: &mut Vec<GameEffect>) {
        let live = TimerToken {
            play_id: self.play.play_id,
            phase: self.play.phase,
        };
        if token != live || self.is_over() {
            log::debug!(
                "stale timer for play {} {} ignored",
                token.play_id,
                token.phase.label()
            );
            return;
        }

        match token.phase {
            Phase::PreSnap => self.snap(fx),
            Phase::Snap => self.start_play(fx),
            Phase::Play => self.throw(fx),
            Phase::BallFlight => self.ball_arrives(fx),
            Phase::Yac => self.end_play(ScoreEvent::StopOnTimeout, fx),
            Phase::PostPlay => self.finish_play(fx),
            Phase::End => {}
        }
    }

    fn transition(&mut self, next: Phase, fx: &mut Vec<GameEffect>) -> bool {
        let from = self.play.phase;
        if !from.can_transition_to(next) {
            log::debug!("illegal transition {} -> {} ignored", from.label(), next.label());
            return false;
        }
        self.play.phase = next;
        self.play.phase_elapsed = Duration::ZERO;
        self.play.timer = None;
        log::debug!("play {}: {} -> {}", self.play.play_id, from.label(), next.label());
        fx.push(GameEffect::PhaseChanged { from, to: next });
        true
    }

    fn arm(&mut self, duration: Duration) {
        self.play.timer = Some(PhaseTimer::arm(self.play.play_id, self.play.phase, duration));
    }

    fn snap(&mut self, fx: &mut Vec<GameEffect>) {
        if self.transition(Phase::Snap, fx) {
            let snap = self.config.phases.snap;
            fx.push(GameEffect::CameraShake {
                millis: u64::try_from(snap.as_millis()).unwrap_or(u64::MAX),
            });
            self.arm(snap);
        }
    }

    fn start_play(&mut self, fx: &mut Vec<GameEffect>) {
        if !self.transition(Phase::Play, fx) {
            return;
        }
        let look = offense::defensive_look(self.profile());
        let table = *self.config.offense.table(look);
        let call = offense::select_play(&mut self.rng, &table);
        let release = self.config.offense.playbook.get(call).release;
        self.play.call = Some(call);
        fx.push(GameEffect::PlayCalled { call });
        self.arm(release);
    }

    fn throw(&mut self, fx: &mut Vec<GameEffect>) {
        let Some(call) = self.play.call else {
            return;
        };
        if !self.transition(Phase::BallFlight, fx) {
            return;
        }
        let from = self.config.rules.qb_spot;
        let target = self.config.offense.playbook.get(call).target;
        self.play.ball = BallState {
            pos: from,
            from,
            target,
        };
        let flight = self.config.phases.flight_time(from.distance(target));
        self.arm(flight);
    }

    fn ball_arrives(&mut self, fx: &mut Vec<GameEffect>) {
        self.play.ball.pos = self.play.ball.target;
        let catch_chance =
            (self.config.rules.base_catch_chance * self.difficulty.qb_accuracy).clamp(0.0, 1.0);
        if !self.rng.gen_bool(f64::from(catch_chance)) {
            self.end_play(ScoreEvent::Incompletion, fx);
            return;
        }
        if self.transition(Phase::Yac, fx) {
            self.play.carrier = Some(self.play.ball.target);
            let yac_max = self.config.tackle.yac_max;
            self.arm(yac_max);
            self.check_yac_contact(fx);
        }
    }

    fn end_play(&mut self, event: ScoreEvent, fx: &mut Vec<GameEffect>) {
        if !self.transition(Phase::PostPlay, fx) {
            return;
        }
        self.play.outcome = Some(event);
        self.score(event, fx);
        let post = self.config.phases.post_play;
        self.arm(post);
    }

    fn finish_play(&mut self, fx: &mut Vec<GameEffect>) {
        self.stats.plays += 1;
        self.plays_in_wave += 1;

        let rules = self.config.rules;
        if self.stats.touchdowns_allowed >= rules.max_touchdowns {
            self.game_over(false, fx);
            return;
        }

        if self.plays_in_wave >= rules.plays_per_wave {
            self.score(ScoreEvent::WaveCleared, fx);
            if self.stats.wave >= rules.max_waves {
                self.game_over(true, fx);
                return;
            }
            self.stats.wave += 1;
            self.plays_in_wave = 0;
            fx.push(GameEffect::WaveAdvanced {
                wave: self.stats.wave,
            });
            log::info!("wave {} begins", self.stats.wave);
        }
        self.next_play(fx);
    }

    fn next_play(&mut self, fx: &mut Vec<GameEffect>) {
        if !self.play.phase.can_transition_to(Phase::PreSnap) {
            return;
        }
        let from = self.play.phase;
        let play_id = self.play.play_id + 1;
        let start = self.profile().start;
        self.play = PlayState::new(play_id, self.archetype, start, self.config.rules.qb_spot);
        fx.push(GameEffect::PhaseChanged {
            from,
            to: Phase::PreSnap,
        });
        let pre_snap = self.config.phases.pre_snap;
        self.arm(pre_snap);
    }

    fn game_over(&mut self, victory: bool, fx: &mut Vec<GameEffect>) {
        if !self.transition(Phase::End, fx) {
            return;
        }
        self.victory = Some(victory);
        let final_score = self.stats.final_score();
        log::info!(
            "session over after {} plays: score {} (raw {}), victory {victory}",
            self.stats.plays,
            final_score,
            self.stats.score
        );
        fx.push(GameEffect::GameOver {
            final_score,
            victory,
        });
    }

    fn score(&mut self, event: ScoreEvent, fx: &mut Vec<GameEffect>) {
        let delta = self.config.scoring.delta(event);
        self.stats.apply(event, delta);
        fx.push(GameEffect::Scored {
            event,
            delta,
            total: self.stats.score,
        });
    }

    fn advance_positions(&mut self, dt: Duration) {
        let step = self.defender_speed() * dt.as_secs_f32();
        let rushing = !self.profile().rush_moves.is_empty();
        let qb = self.config.rules.qb_spot;

        match self.play.phase {
            Phase::Play => {
                let goal = match (rushing, self.play.call) {
                    (true, _) => qb,
                    (false, Some(call)) => self.config.offense.playbook.get(call).target,
                    (false, None) => self.play.defender_pos,
                };
                self.play.defender_pos = self.play.defender_pos.move_towards(goal, step);
            }
            Phase::BallFlight => {
                let progress = self.play.flight_progress();
                let ball = &mut self.play.ball;
                ball.pos = ball.from.lerp(ball.target, progress);
                self.play.defender_pos = self.play.defender_pos.move_towards(ball.target, step);
            }
            Phase::Yac => {
                let Some(carrier) = self.play.carrier else {
                    return;
                };
                let run = self.config.rules.receiver_speed
                    * self.difficulty.receiver_speed
                    * dt.as_secs_f32();
                let carrier = Vec2f::new(carrier.x, carrier.y + run);
                self.play.carrier = Some(carrier);
                self.play.ball.pos = carrier;
                self.play.defender_pos = self.play.defender_pos.move_towards(carrier, step);
            }
            _ => {}
        }
    }

    /// Tackle or touchdown check for the ball carrier. Returns true if the play ended.
    fn check_yac_contact(&mut self, fx: &mut Vec<GameEffect>) -> bool {
        let Some(carrier) = self.play.carrier else {
            return false;
        };
        let reach = defense::tackle_radius(
            &self.config.tackle,
            &self.difficulty,
            self.play.is_diving(),
        );
        if self.play.defender_pos.distance(carrier) <= reach {
            self.end_play(ScoreEvent::Tackle, fx);
            return true;
        }
        if carrier.y >= self.config.rules.yards_to_goal {
            self.end_play(ScoreEvent::TouchdownAllowed, fx);
            return true;
        }
        false
    }

    fn try_rush_move(&mut self, fx: &mut Vec<GameEffect>) {
        let hold = self.play.phase_elapsed;
        let ready = self
            .profile()
            .rush_moves
            .iter()
            .enumerate()
            .find(|(i, _)| self.rush_move_ready(*i))
            .map(|(i, mv)| (i, *mv));
        let Some((index, mv)) = ready else {
            log::debug!("no rush move ready");
            return;
        };

        self.rush_cooldowns[index] = Countdown::new(mv.cooldown);
        let chance = f64::from(mv.success_chance.clamp(0.0, 1.0));
        let landed = mv.in_window(hold) && self.rng.gen_bool(chance);
        fx.push(GameEffect::RushMove {
            kind: mv.kind,
            landed,
        });
        if landed {
            self.end_play(ScoreEvent::Sack, fx);
        }
    }

    fn try_coverage(&mut self, fx: &mut Vec<GameEffect>) {
        if self.play.coverage_attempt.is_some() {
            log::debug!("coverage already attempted this flight");
            return;
        }
        let Some(before_arrival) = self.play.time_before_arrival() else {
            return;
        };

        let profile = self.profile();
        let action = profile.coverage.action;
        let skill = profile.skill + profile.coverage.chance_bonus;
        let in_range =
            self.play.defender_pos.distance(self.play.ball.target) <= profile.coverage_radius;

        let (bucket, result) = if in_range {
            let bucket =
                defense::timing_bucket(before_arrival, &self.config.timing, self.difficulty.throw_window);
            let chances = defense::coverage_chances(self.config.timing.bucket(bucket), skill);
            (Some(bucket), defense::resolve_coverage(&mut self.rng, chances))
        } else {
            (None, CoverageResult::OutOfRange)
        };

        self.play.coverage_attempt = Some(CoverageAttempt {
            action,
            bucket,
            result,
        });
        fx.push(GameEffect::Coverage {
            action,
            bucket,
            result,
        });

        match result {
            CoverageResult::Interception => self.end_play(ScoreEvent::Interception, fx),
            CoverageResult::Breakup => self.end_play(ScoreEvent::PassBreakup, fx),
            CoverageResult::Miss | CoverageResult::OutOfRange => {}
        }
    }

    fn try_dive(&mut self, fx: &mut Vec<GameEffect>) {
        if !self.dive_ready() {
            log::debug!("dive on cooldown");
            return;
        }
        let dive = self.config.tackle.dive;
        self.play.dive = Some(Countdown::new(dive.duration));
        self.dive_cooldown = Countdown::new(dive.cooldown);
        fx.push(GameEffect::Dive);
        self.check_yac_contact(fx);
    }
}
