//! Static tuning tables for the defense mini-game.
//!
//! Everything here is plain data. The built-in table is `GameConfig::default()`; a JSON
//! file with the same shape can replace it via `DARKSIDE_CONFIG_PATH`.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::field::{FieldBounds, Vec2f};

pub const CONFIG_PATH_ENV: &str = "DARKSIDE_CONFIG_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DefenderArchetype {
    DLine,
    Linebacker,
    DefensiveBack,
}

impl DefenderArchetype {
    pub const ALL: [DefenderArchetype; 3] = [
        DefenderArchetype::DLine,
        DefenderArchetype::Linebacker,
        DefenderArchetype::DefensiveBack,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DefenderArchetype::DLine => "D-Line",
            DefenderArchetype::Linebacker => "Linebacker",
            DefenderArchetype::DefensiveBack => "Defensive Back",
        }
    }
}

impl fmt::Display for DefenderArchetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DefenderArchetype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dl" | "dline" | "d-line" | "lineman" => Ok(DefenderArchetype::DLine),
            "lb" | "linebacker" => Ok(DefenderArchetype::Linebacker),
            "db" | "back" | "defensive-back" | "defensiveback" => {
                Ok(DefenderArchetype::DefensiveBack)
            }
            other => Err(format!("unknown defender archetype: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RushMoveKind {
    Swim,
    Spin,
    BullRush,
    Blitz,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RushMoveDef {
    pub kind: RushMoveKind,
    #[serde(with = "engine::serde_millis")]
    pub cooldown: Duration,
    /// The move can only land while the QB's hold time is inside this window.
    #[serde(with = "engine::serde_millis")]
    pub window_start: Duration,
    #[serde(with = "engine::serde_millis")]
    pub window_end: Duration,
    pub success_chance: f32,
}

impl RushMoveDef {
    pub fn in_window(&self, hold: Duration) -> bool {
        hold >= self.window_start && hold <= self.window_end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoverageAction {
    Swat,
    Dive,
    Jump,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageActionDef {
    pub action: CoverageAction,
    pub chance_bonus: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefenderProfile {
    pub archetype: DefenderArchetype,
    /// Yards per second before difficulty scaling.
    pub base_speed: f32,
    pub coverage_radius: f32,
    /// Flat bonus added to interception chances.
    pub skill: f32,
    pub rush_moves: Vec<RushMoveDef>,
    pub coverage: CoverageActionDef,
    pub start: Vec2f,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    pub dline: DefenderProfile,
    pub linebacker: DefenderProfile,
    pub defensive_back: DefenderProfile,
}

impl Roster {
    pub fn profile(&self, archetype: DefenderArchetype) -> &DefenderProfile {
        match archetype {
            DefenderArchetype::DLine => &self.dline,
            DefenderArchetype::Linebacker => &self.linebacker,
            DefenderArchetype::DefensiveBack => &self.defensive_back,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiveDef {
    #[serde(with = "engine::serde_millis")]
    pub duration: Duration,
    #[serde(with = "engine::serde_millis")]
    pub cooldown: Duration,
    pub radius_bonus: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TackleDef {
    pub base_radius: f32,
    #[serde(with = "engine::serde_millis")]
    pub yac_max: Duration,
    pub dive: DiveDef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimingBucket {
    Perfect,
    Good,
    Late,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketDef {
    /// Upper bound on time-before-arrival for this bucket (unused for `late`).
    #[serde(with = "engine::serde_millis")]
    pub window: Duration,
    pub base_chance: f32,
    pub breakup_chance: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptionTiming {
    pub perfect: BucketDef,
    pub good: BucketDef,
    pub late: BucketDef,
}

impl InterceptionTiming {
    pub fn bucket(&self, bucket: TimingBucket) -> &BucketDef {
        match bucket {
            TimingBucket::Perfect => &self.perfect,
            TimingBucket::Good => &self.good,
            TimingBucket::Late => &self.late,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayCall {
    QuickPass,
    DeepPass,
    Screen,
}

impl PlayCall {
    pub const ALL: [PlayCall; 3] = [PlayCall::QuickPass, PlayCall::DeepPass, PlayCall::Screen];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayCallDef {
    /// How long the QB holds the ball before throwing.
    #[serde(with = "engine::serde_millis")]
    pub release: Duration,
    pub target: Vec2f,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayBook {
    pub quick_pass: PlayCallDef,
    pub deep_pass: PlayCallDef,
    pub screen: PlayCallDef,
}

impl PlayBook {
    pub fn get(&self, call: PlayCall) -> &PlayCallDef {
        match call {
            PlayCall::QuickPass => &self.quick_pass,
            PlayCall::DeepPass => &self.deep_pass,
            PlayCall::Screen => &self.screen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DefensiveLook {
    Base,
    Blitz,
}

/// Relative weights, not percentages; they only need a positive sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TendencyTable {
    pub quick_pass: u32,
    pub deep_pass: u32,
    pub screen: u32,
}

impl TendencyTable {
    pub fn weight(&self, call: PlayCall) -> u32 {
        match call {
            PlayCall::QuickPass => self.quick_pass,
            PlayCall::DeepPass => self.deep_pass,
            PlayCall::Screen => self.screen,
        }
    }

    /// Sum of all weights, or `None` if it overflows.
    pub fn total(&self) -> Option<u32> {
        self.quick_pass
            .checked_add(self.deep_pass)?
            .checked_add(self.screen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffenseTendencies {
    pub base: TendencyTable,
    pub blitz: TendencyTable,
    pub playbook: PlayBook,
}

impl OffenseTendencies {
    pub fn table(&self, look: DefensiveLook) -> &TendencyTable {
        match look {
            DefensiveLook::Base => &self.base,
            DefensiveLook::Blitz => &self.blitz,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseDurations {
    #[serde(with = "engine::serde_millis")]
    pub pre_snap: Duration,
    #[serde(with = "engine::serde_millis")]
    pub snap: Duration,
    #[serde(with = "engine::serde_millis")]
    pub post_play: Duration,
    /// Yards per second.
    pub ball_speed: f32,
    #[serde(with = "engine::serde_millis")]
    pub min_flight: Duration,
    #[serde(with = "engine::serde_millis")]
    pub max_flight: Duration,
}

impl PhaseDurations {
    pub fn flight_time(&self, distance: f32) -> Duration {
        let secs = if self.ball_speed > 0.0 {
            distance.max(0.0) / self.ball_speed
        } else {
            0.0
        };
        Duration::try_from_secs_f32(secs)
            .unwrap_or(self.max_flight)
            .clamp(self.min_flight, self.max_flight)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeekBand {
    Week1To3,
    Week4To6,
    Week7To10,
    Week11To14,
    Week15To17,
    Playoffs,
}

impl WeekBand {
    pub fn for_week(week: u32) -> WeekBand {
        match week {
            0..=3 => WeekBand::Week1To3,
            4..=6 => WeekBand::Week4To6,
            7..=10 => WeekBand::Week7To10,
            11..=14 => WeekBand::Week11To14,
            15..=17 => WeekBand::Week15To17,
            _ => WeekBand::Playoffs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyProfile {
    pub band: WeekBand,
    pub qb_accuracy: f32,
    pub receiver_speed: f32,
    pub throw_window: f32,
    pub tackle_radius: f32,
    pub defender_speed: f32,
}

impl DifficultyProfile {
    pub const fn baseline(band: WeekBand) -> Self {
        Self {
            band,
            qb_accuracy: 1.0,
            receiver_speed: 1.0,
            throw_window: 1.0,
            tackle_radius: 1.0,
            defender_speed: 1.0,
        }
    }

    fn multipliers(&self) -> [f32; 5] {
        [
            self.qb_accuracy,
            self.receiver_speed,
            self.throw_window,
            self.tackle_radius,
            self.defender_speed,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyTable {
    pub week1_to3: DifficultyProfile,
    pub week4_to6: DifficultyProfile,
    pub week7_to10: DifficultyProfile,
    pub week11_to14: DifficultyProfile,
    pub week15_to17: DifficultyProfile,
    pub playoffs: DifficultyProfile,
}

impl DifficultyTable {
    pub fn for_band(&self, band: WeekBand) -> DifficultyProfile {
        match band {
            WeekBand::Week1To3 => self.week1_to3,
            WeekBand::Week4To6 => self.week4_to6,
            WeekBand::Week7To10 => self.week7_to10,
            WeekBand::Week11To14 => self.week11_to14,
            WeekBand::Week15To17 => self.week15_to17,
            WeekBand::Playoffs => self.playoffs,
        }
    }

    pub fn for_week(&self, week: u32) -> DifficultyProfile {
        self.for_band(WeekBand::for_week(week))
    }

    fn all(&self) -> [&DifficultyProfile; 6] {
        [
            &self.week1_to3,
            &self.week4_to6,
            &self.week7_to10,
            &self.week11_to14,
            &self.week15_to17,
            &self.playoffs,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringTable {
    pub sack: i64,
    pub tackle: i64,
    pub pass_breakup: i64,
    pub interception: i64,
    pub incompletion: i64,
    pub stop_on_timeout: i64,
    pub wave_cleared: i64,
    pub touchdown_allowed: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesDef {
    pub plays_per_wave: u32,
    /// The session ends in a loss once this many touchdowns have been allowed.
    pub max_touchdowns: u32,
    /// Clearing this many waves ends the session as a win.
    pub max_waves: u32,
    pub yards_to_goal: f32,
    pub base_catch_chance: f32,
    pub receiver_speed: f32,
    pub qb_spot: Vec2f,
    pub field: FieldBounds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub roster: Roster,
    pub tackle: TackleDef,
    pub timing: InterceptionTiming,
    pub offense: OffenseTendencies,
    pub phases: PhaseDurations,
    pub difficulty: DifficultyTable,
    pub scoring: ScoringTable,
    pub rules: RulesDef,
}

/// Accepted range for difficulty multipliers.
const MULTIPLIER_RANGE: (f32, f32) = (0.05, 20.0);
/// Yards per second.
const SPEED_RANGE: (f32, f32) = (0.1, 200.0);
/// Yards.
const DISTANCE_RANGE: (f32, f32) = (0.01, 500.0);
const FIELD_LIMIT: f32 = 1_000.0;

const fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn rush(kind: RushMoveKind, cooldown: u64, start: u64, end: u64, chance: f32) -> RushMoveDef {
    RushMoveDef {
        kind,
        cooldown: ms(cooldown),
        window_start: ms(start),
        window_end: ms(end),
        success_chance: chance,
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            roster: Roster {
                dline: DefenderProfile {
                    archetype: DefenderArchetype::DLine,
                    base_speed: 6.0,
                    coverage_radius: 3.0,
                    skill: 0.0,
                    rush_moves: vec![
                        rush(RushMoveKind::Swim, 2_500, 300, 1_200, 0.35),
                        rush(RushMoveKind::Spin, 3_000, 500, 1_500, 0.30),
                        rush(RushMoveKind::BullRush, 4_000, 800, 2_000, 0.25),
                    ],
                    coverage: CoverageActionDef {
                        action: CoverageAction::Swat,
                        chance_bonus: 0.0,
                    },
                    start: Vec2f::new(0.0, 1.0),
                },
                linebacker: DefenderProfile {
                    archetype: DefenderArchetype::Linebacker,
                    base_speed: 7.0,
                    coverage_radius: 5.0,
                    skill: 0.05,
                    rush_moves: vec![rush(RushMoveKind::Blitz, 3_000, 0, 900, 0.40)],
                    coverage: CoverageActionDef {
                        action: CoverageAction::Dive,
                        chance_bonus: 0.02,
                    },
                    start: Vec2f::new(0.0, 5.0),
                },
                defensive_back: DefenderProfile {
                    archetype: DefenderArchetype::DefensiveBack,
                    base_speed: 8.0,
                    coverage_radius: 8.0,
                    skill: 0.10,
                    rush_moves: Vec::new(),
                    coverage: CoverageActionDef {
                        action: CoverageAction::Jump,
                        chance_bonus: 0.05,
                    },
                    start: Vec2f::new(4.0, 12.0),
                },
            },
            tackle: TackleDef {
                base_radius: 1.5,
                yac_max: ms(3_000),
                dive: DiveDef {
                    duration: ms(400),
                    cooldown: ms(1_500),
                    radius_bonus: 0.75,
                },
            },
            timing: InterceptionTiming {
                perfect: BucketDef {
                    window: ms(120),
                    base_chance: 0.45,
                    breakup_chance: 0.35,
                },
                good: BucketDef {
                    window: ms(300),
                    base_chance: 0.20,
                    breakup_chance: 0.40,
                },
                late: BucketDef {
                    window: ms(1_600),
                    base_chance: 0.05,
                    breakup_chance: 0.15,
                },
            },
            offense: OffenseTendencies {
                base: TendencyTable {
                    quick_pass: 40,
                    deep_pass: 35,
                    screen: 25,
                },
                blitz: TendencyTable {
                    quick_pass: 70,
                    deep_pass: 10,
                    screen: 20,
                },
                playbook: PlayBook {
                    quick_pass: PlayCallDef {
                        release: ms(900),
                        target: Vec2f::new(5.0, 6.0),
                    },
                    deep_pass: PlayCallDef {
                        release: ms(2_200),
                        target: Vec2f::new(-8.0, 28.0),
                    },
                    screen: PlayCallDef {
                        release: ms(700),
                        target: Vec2f::new(7.0, -2.0),
                    },
                },
            },
            phases: PhaseDurations {
                pre_snap: ms(1_200),
                snap: ms(300),
                post_play: ms(1_500),
                ball_speed: 25.0,
                min_flight: ms(400),
                max_flight: ms(1_600),
            },
            difficulty: DifficultyTable {
                week1_to3: DifficultyProfile {
                    band: WeekBand::Week1To3,
                    qb_accuracy: 0.80,
                    receiver_speed: 0.85,
                    throw_window: 1.30,
                    tackle_radius: 1.25,
                    defender_speed: 1.10,
                },
                week4_to6: DifficultyProfile {
                    band: WeekBand::Week4To6,
                    qb_accuracy: 0.90,
                    receiver_speed: 0.92,
                    throw_window: 1.15,
                    tackle_radius: 1.12,
                    defender_speed: 1.05,
                },
                week7_to10: DifficultyProfile::baseline(WeekBand::Week7To10),
                week11_to14: DifficultyProfile {
                    band: WeekBand::Week11To14,
                    qb_accuracy: 1.05,
                    receiver_speed: 1.08,
                    throw_window: 0.90,
                    tackle_radius: 0.92,
                    defender_speed: 0.97,
                },
                week15_to17: DifficultyProfile {
                    band: WeekBand::Week15To17,
                    qb_accuracy: 1.10,
                    receiver_speed: 1.15,
                    throw_window: 0.80,
                    tackle_radius: 0.85,
                    defender_speed: 0.95,
                },
                playoffs: DifficultyProfile {
                    band: WeekBand::Playoffs,
                    qb_accuracy: 1.15,
                    receiver_speed: 1.20,
                    throw_window: 0.70,
                    tackle_radius: 0.80,
                    defender_speed: 0.92,
                },
            },
            scoring: ScoringTable {
                sack: 100,
                tackle: 25,
                pass_breakup: 75,
                interception: 200,
                incompletion: 10,
                stop_on_timeout: 10,
                wave_cleared: 50,
                touchdown_allowed: -150,
            },
            rules: RulesDef {
                plays_per_wave: 4,
                max_touchdowns: 3,
                max_waves: 10,
                yards_to_goal: 35.0,
                base_catch_chance: 0.85,
                receiver_speed: 7.5,
                qb_spot: Vec2f::new(0.0, -5.0),
                field: FieldBounds {
                    half_width: 26.5,
                    min_y: -10.0,
                    max_y: 40.0,
                },
            },
        }
    }
}

impl GameConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GameConfig =
            serde_json::from_slice(&bytes).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Self {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Uses `DARKSIDE_CONFIG_PATH` when set and valid, otherwise the built-in table.
    pub fn from_env_with<F>(mut get_env: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let Some(path) = get_env(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty()) else {
            return Self::default();
        };
        match Self::load(Path::new(path.trim())) {
            Ok(config) => {
                log::info!("loaded game config from {}", path.trim());
                config
            }
            Err(err) => {
                log::warn!("{err}; falling back to built-in tuning");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = |name: &str, v: f32| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!("{name} must be in [0, 1], got {v}")))
            }
        };
        let within = |name: &str, v: f32, (lo, hi): (f32, f32)| {
            if (lo..=hi).contains(&v) {
                Ok(())
            } else {
                Err(ConfigError::Invalid(format!(
                    "{name} must be in [{lo}, {hi}], got {v}"
                )))
            }
        };

        for archetype in DefenderArchetype::ALL {
            let profile = self.roster.profile(archetype);
            if profile.archetype != archetype {
                return Err(ConfigError::Invalid(format!(
                    "roster slot {archetype} holds a {} profile",
                    profile.archetype
                )));
            }
            within("base_speed", profile.base_speed, SPEED_RANGE)?;
            within("coverage_radius", profile.coverage_radius, DISTANCE_RANGE)?;
            unit("skill", profile.skill)?;
            for mv in &profile.rush_moves {
                unit("success_chance", mv.success_chance)?;
                if mv.window_start > mv.window_end {
                    return Err(ConfigError::Invalid(format!(
                        "{:?} window starts after it ends",
                        mv.kind
                    )));
                }
            }
        }

        for (name, bucket) in [
            ("perfect", &self.timing.perfect),
            ("good", &self.timing.good),
            ("late", &self.timing.late),
        ] {
            unit(name, bucket.base_chance)?;
            unit(name, bucket.breakup_chance)?;
            if bucket.base_chance + bucket.breakup_chance > 1.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} bucket chances sum past 1"
                )));
            }
        }
        if self.timing.perfect.window > self.timing.good.window {
            return Err(ConfigError::Invalid(
                "perfect window must not exceed good window".to_string(),
            ));
        }

        for look in [DefensiveLook::Base, DefensiveLook::Blitz] {
            match self.offense.table(look).total() {
                Some(0) => {
                    return Err(ConfigError::Invalid(format!(
                        "{look:?} tendency weights sum to zero"
                    )));
                }
                None => {
                    return Err(ConfigError::Invalid(format!(
                        "{look:?} tendency weights overflow"
                    )));
                }
                Some(_) => {}
            }
        }

        for profile in self.difficulty.all() {
            for m in profile.multipliers() {
                within("difficulty multiplier", m, MULTIPLIER_RANGE)?;
            }
        }

        within("tackle.base_radius", self.tackle.base_radius, DISTANCE_RANGE)?;
        within("dive.radius_bonus", self.tackle.dive.radius_bonus, (0.0, DISTANCE_RANGE.1))?;
        within("ball_speed", self.phases.ball_speed, SPEED_RANGE)?;
        within("receiver_speed", self.rules.receiver_speed, SPEED_RANGE)?;
        within("yards_to_goal", self.rules.yards_to_goal, DISTANCE_RANGE)?;

        let field = &self.rules.field;
        within("field.half_width", field.half_width, DISTANCE_RANGE)?;
        within("field.min_y", field.min_y, (-FIELD_LIMIT, FIELD_LIMIT))?;
        within("field.max_y", field.max_y, (-FIELD_LIMIT, FIELD_LIMIT))?;
        if field.min_y >= field.max_y {
            return Err(ConfigError::Invalid(format!(
                "field.min_y {} must be below field.max_y {}",
                field.min_y, field.max_y
            )));
        }
        within("qb_spot.x", self.rules.qb_spot.x, (-FIELD_LIMIT, FIELD_LIMIT))?;
        within("qb_spot.y", self.rules.qb_spot.y, (-FIELD_LIMIT, FIELD_LIMIT))?;
        unit("base_catch_chance", self.rules.base_catch_chance)?;
        if self.rules.plays_per_wave == 0 || self.rules.max_touchdowns == 0 {
            return Err(ConfigError::Invalid(
                "plays_per_wave and max_touchdowns must be at least 1".to_string(),
            ));
        }
        if self.phases.min_flight > self.phases.max_flight {
            return Err(ConfigError::Invalid(
                "min_flight must not exceed max_flight".to_string(),
            ));
        }
        Ok(())
    }
}
