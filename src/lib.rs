//! Multipong - a 2 to 4 player elimination Pong engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, AI, match state)
//! - `settings`: Match construction input (mode, names, AI tiers, lives)
//! - `report`: Terminal game result record handed to the presentation layer

pub mod report;
pub mod settings;
pub mod sim;

pub use report::{GameResult, RankingEntry, Winner};
pub use settings::{MatchSettings, Mode};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed duration of one `update` call (60 frames per second)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Duration of one countdown tick
    pub const COUNTDOWN_TICK_MS: f64 = 1000.0;
    /// Countdown starts here and the match begins once it drops below zero
    pub const COUNTDOWN_START: i32 = 3;

    /// Two-player field (wide rectangle)
    pub const WIDE_FIELD_WIDTH: f32 = 800.0;
    pub const WIDE_FIELD_HEIGHT: f32 = 600.0;
    /// Three and four-player field (square)
    pub const SQUARE_FIELD_SIZE: f32 = 700.0;

    /// Paddle extent across its axis of motion
    pub const PADDLE_THICKNESS: f32 = 10.0;
    /// Paddle extent along its axis of motion
    pub const PADDLE_LENGTH: f32 = 100.0;
    /// Gap between the near field edge and the paddle's outer face
    pub const PADDLE_NEAR_INSET: f32 = 20.0;
    /// Gap between the far field edge and the paddle's origin
    pub const PADDLE_FAR_INSET: f32 = 30.0;
    /// Human paddle displacement per frame
    pub const HUMAN_PADDLE_SPEED: f32 = 7.0;

    pub const BALL_RADIUS: f32 = 8.0;
    /// Serve speed, restored on every serve
    pub const BALL_START_SPEED: f32 = 6.5;
    pub const BALL_MAX_SPEED: f32 = 20.0;
    /// Per-frame compounding speed-up (~1% per second at 60 fps)
    pub const BALL_FRAME_ACCEL: f32 = 1.00016;
    /// Speed boost when ball hits paddle (multiplicative)
    pub const PADDLE_BOOST: f32 = 1.05;
    /// Parallel velocity added per unit of normalized hit offset
    pub const PADDLE_DEFLECTION: f32 = 2.0;
    /// Serve aim jitter as a fraction of the target paddle's half-length
    pub const SERVE_JITTER: f32 = 0.4;

    /// Telemetry sampling cadence
    pub const TELEMETRY_INTERVAL_MS: f64 = 100.0;
    /// Hits with |offset| below this count as centered for accuracy metrics
    pub const ACCURATE_HIT_OFFSET: f32 = 0.5;
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Direction of a vector in radians, in (-π, π]
#[inline]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}
