//! Pure rules for the defender's actions: timing buckets, coverage rolls, tackle
//! reach and speed scaling.

use std::time::Duration;

use rand::Rng;

use crate::config::{
    BucketDef, DefenderProfile, DifficultyProfile, InterceptionTiming, TackleDef, TimingBucket,
};
use crate::play::CoverageResult;

/// Scales a bucket window by the week's throw-window multiplier, rounded to the
/// nanosecond so a multiplier of exactly 1.0 leaves the window untouched.
pub fn scaled_window(window: Duration, throw_window: f32) -> Duration {
    let scale = f64::from(throw_window.max(0.0));
    let nanos = (window.as_nanos() as f64 * scale).round();
    if nanos >= u64::MAX as f64 {
        Duration::from_nanos(u64::MAX)
    } else {
        Duration::from_nanos(nanos as u64)
    }
}

pub fn timing_bucket(
    before_arrival: Duration,
    timing: &InterceptionTiming,
    throw_window: f32,
) -> TimingBucket {
    if before_arrival <= scaled_window(timing.perfect.window, throw_window) {
        TimingBucket::Perfect
    } else if before_arrival <= scaled_window(timing.good.window, throw_window) {
        TimingBucket::Good
    } else {
        TimingBucket::Late
    }
}

pub fn interception_chance(bucket: &BucketDef, skill: f32) -> f32 {
    (bucket.base_chance + skill).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageChances {
    pub interception: f32,
    pub breakup: f32,
}

pub fn coverage_chances(bucket: &BucketDef, skill: f32) -> CoverageChances {
    let interception = interception_chance(bucket, skill);
    CoverageChances {
        interception,
        breakup: bucket.breakup_chance.clamp(0.0, 1.0 - interception),
    }
}

pub fn resolve_coverage<R: Rng + ?Sized>(rng: &mut R, chances: CoverageChances) -> CoverageResult {
    let roll: f32 = rng.gen_range(0.0..1.0);
    if roll < chances.interception {
        CoverageResult::Interception
    } else if roll < chances.interception + chances.breakup {
        CoverageResult::Breakup
    } else {
        CoverageResult::Miss
    }
}

pub fn tackle_radius(tackle: &TackleDef, difficulty: &DifficultyProfile, diving: bool) -> f32 {
    let base = tackle.base_radius * difficulty.tackle_radius;
    if diving {
        base + tackle.dive.radius_bonus
    } else {
        base
    }
}

pub fn defender_speed(profile: &DefenderProfile, difficulty: &DifficultyProfile) -> f32 {
    profile.base_speed * difficulty.defender_speed
}
