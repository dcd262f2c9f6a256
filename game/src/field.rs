use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// Field coordinates in yards. `y` grows toward the defense's end zone; the line of
/// scrimmage sits at `y = 0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2f {
    pub x: f32,
    pub y: f32,
}

impl Vec2f {
    pub const ZERO: Vec2f = Vec2f { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2f) -> f32 {
        (other - self).length()
    }

    pub fn lerp(self, to: Vec2f, t: f32) -> Vec2f {
        let t = t.clamp(0.0, 1.0);
        self + (to - self) * t
    }

    /// Moves toward `target` by at most `max_step`, never overshooting.
    pub fn move_towards(self, target: Vec2f, max_step: f32) -> Vec2f {
        let delta = target - self;
        let dist = delta.length();
        if dist <= max_step || dist <= f32::EPSILON {
            return target;
        }
        self + delta * (max_step / dist)
    }
}

impl Add for Vec2f {
    type Output = Vec2f;

    fn add(self, rhs: Vec2f) -> Self::Output {
        Vec2f::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2f {
    type Output = Vec2f;

    fn sub(self, rhs: Vec2f) -> Self::Output {
        Vec2f::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2f {
    type Output = Vec2f;

    fn mul(self, rhs: f32) -> Self::Output {
        Vec2f::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldBounds {
    pub half_width: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl FieldBounds {
    pub fn clamp(&self, p: Vec2f) -> Vec2f {
        Vec2f::new(
            p.x.clamp(-self.half_width, self.half_width),
            p.y.clamp(self.min_y, self.max_y),
        )
    }
}
