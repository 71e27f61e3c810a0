//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by slot)
//! - No rendering or platform dependencies

pub mod ai;
pub mod collision;
pub mod field;
pub mod state;
pub mod telemetry;
pub mod tick;

pub use ai::{AiTuning, Difficulty, ai_displacement};
pub use collision::{HitResponse, ball_paddle_overlap, bounce_off_wall, deflect_off_paddle};
pub use field::{Field, Orientation, PaddleSlot, Rect, Side};
pub use state::{Ball, Elimination, LifeLostEvent, MatchPhase, MatchState, Paddle, PlayerId};
pub use telemetry::{
    Action, ActionEntry, BallMetrics, BallSample, HitDetail, Metrics, MissDetail, PaddleSample,
    PlayerMetrics, Rally, RallyMetrics, RallyRecord, Recorder, TelemetrySample, TimingMetrics,
};
pub use tick::{CountdownTick, FrameInput, PaddleIntent};
