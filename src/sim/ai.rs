//! Computer opponents
//!
//! Each frame the AI aims its paddle center at the ball plus a freshly
//! sampled jitter, then steps toward that target at its tier speed. The
//! jitter is re-rolled every frame, so weaker tiers visibly wobble.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::field::Field;
use super::state::Paddle;

/// AI skill tier, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    SuperEasy,
    Easy,
    Normal,
    Hard,
}

/// Constants fixed by a difficulty tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiTuning {
    /// Width of the uniform jitter band around the ball
    pub error_margin: f32,
    /// Maximum paddle displacement per frame
    pub speed: f32,
    /// No movement while the target is within this distance of the center
    pub deadzone: f32,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::SuperEasy,
        Difficulty::Easy,
        Difficulty::Normal,
        Difficulty::Hard,
    ];

    pub fn tuning(self) -> AiTuning {
        let (error_margin, speed, deadzone) = match self {
            Difficulty::SuperEasy => (80.0, 2.5, 30.0),
            Difficulty::Easy => (40.0, 4.0, 15.0),
            Difficulty::Normal => (20.0, 5.0, 10.0),
            Difficulty::Hard => (5.0, 6.5, 3.0),
        };
        AiTuning {
            error_margin,
            speed,
            deadzone,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::SuperEasy => "superEasy",
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

/// Displacement along the paddle's axis the AI wants this frame
///
/// The result already respects the field bounds: applying it never pushes
/// the paddle outside `[0, extent - length]`.
pub fn ai_displacement<R: Rng + ?Sized>(
    paddle: &Paddle,
    ball_pos: Vec2,
    difficulty: Difficulty,
    field: &Field,
    rng: &mut R,
) -> f32 {
    let tuning = difficulty.tuning();
    let orientation = paddle.orientation;

    let jitter = (rng.random::<f32>() - 0.5) * tuning.error_margin;
    let target = orientation.along(ball_pos) + jitter;

    let origin = paddle.axis_position();
    let center = origin + paddle.length() / 2.0;

    let mut next = origin;
    if center < target - tuning.deadzone {
        next += tuning.speed;
    } else if center > target + tuning.deadzone {
        next -= tuning.speed;
    }

    let max = field.extent(orientation) - paddle.length();
    next.clamp(0.0, max) - origin
}
