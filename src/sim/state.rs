//! Match state and core simulation types
//!
//! Everything the frame driver and renderer read lives here. Mutation only
//! happens through `MatchState::update` and `MatchState::countdown_tick`.

use chrono::{DateTime, Utc};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ai::Difficulty;
use super::field::{Field, Orientation, PaddleSlot, Rect, Side};
use super::telemetry::{Rally, Recorder};
use crate::consts::*;
use crate::report::Winner;
use crate::settings::MatchSettings;
use crate::{angle_of, polar_to_cartesian};

/// Paddle slot identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerId {
    P1,
    P2,
    P3,
    P4,
}

impl PlayerId {
    pub const ALL: [PlayerId; 4] = [PlayerId::P1, PlayerId::P2, PlayerId::P3, PlayerId::P4];

    /// Edge this slot defends
    pub fn side(self) -> Side {
        match self {
            PlayerId::P1 => Side::Left,
            PlayerId::P2 => Side::Right,
            PlayerId::P3 => Side::Bottom,
            PlayerId::P4 => Side::Top,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PlayerId::P1 => "p1",
            PlayerId::P2 => "p2",
            PlayerId::P3 => "p3",
            PlayerId::P4 => "p4",
        }
    }

    pub fn default_name(self) -> String {
        match self {
            PlayerId::P1 => "Player 1",
            PlayerId::P2 => "Player 2",
            PlayerId::P3 => "Player 3",
            PlayerId::P4 => "Player 4",
        }
        .to_string()
    }
}

/// Match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Counting down; physics frozen
    Countdown,
    /// Ball in play
    Active,
    /// Fewer than two paddles remain; nothing changes any more
    Terminal,
}

/// The ball
///
/// `vel` is always derived from a heading and `speed`, so `|vel| == speed`
/// holds after every assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    pub speed: f32,
    pub radius: f32,
    /// Last paddle to touch the ball
    pub last_hit_by: Option<PlayerId>,
}

impl Ball {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            speed: BALL_START_SPEED,
            radius: BALL_RADIUS,
            last_hit_by: None,
        }
    }

    /// Heading in radians
    #[inline]
    pub fn heading(&self) -> f32 {
        angle_of(self.vel)
    }

    /// Set heading and speed together
    pub fn launch(&mut self, heading: f32, speed: f32) {
        self.speed = speed;
        self.vel = polar_to_cartesian(speed, heading);
    }

    /// Take the direction of `direction` and travel it at `speed`
    pub fn steer(&mut self, direction: Vec2, speed: f32) {
        self.launch(angle_of(direction), speed);
    }

    /// Compound the speed by `factor`, capped at `max`, keeping the heading
    pub fn accelerate(&mut self, factor: f32, max: f32) {
        let speed = (self.speed * factor).min(max);
        if self.vel == Vec2::ZERO {
            self.speed = speed;
        } else {
            self.steer(self.vel, speed);
        }
    }

    /// Euler step, one frame
    #[inline]
    pub fn advance(&mut self) {
        self.pos += self.vel;
    }

    /// Back to `pos` at serve speed, motionless until launched
    pub fn reset(&mut self, pos: Vec2) {
        self.pos = pos;
        self.vel = Vec2::ZERO;
        self.speed = BALL_START_SPEED;
    }
}

/// A contestant's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub id: PlayerId,
    pub name: String,
    pub rect: Rect,
    pub orientation: Orientation,
    pub side: Side,
    pub lives: u32,
    /// False once lives reach zero; never set back
    pub active: bool,
    pub hits: u32,
    /// `Some` for computer-controlled paddles
    pub difficulty: Option<Difficulty>,
    /// Position at the previous telemetry sample
    pub last_sample_pos: Vec2,
    /// Distance covered, summed over telemetry samples
    pub total_distance: f32,
}

impl Paddle {
    pub fn new(
        id: PlayerId,
        name: String,
        slot: PaddleSlot,
        lives: u32,
        difficulty: Option<Difficulty>,
    ) -> Self {
        Self {
            id,
            name,
            rect: slot.rect,
            orientation: slot.orientation,
            side: slot.side,
            lives,
            active: lives > 0,
            hits: 0,
            difficulty,
            last_sample_pos: slot.rect.pos,
            total_distance: 0.0,
        }
    }

    #[inline]
    pub fn is_ai(&self) -> bool {
        self.difficulty.is_some()
    }

    /// Extent along the axis of motion
    #[inline]
    pub fn length(&self) -> f32 {
        self.orientation.along(self.rect.size)
    }

    /// Origin coordinate along the axis of motion
    #[inline]
    pub fn axis_position(&self) -> f32 {
        self.orientation.along(self.rect.pos)
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }

    /// Center coordinate along the axis of motion
    #[inline]
    pub fn axis_center(&self) -> f32 {
        self.axis_position() + self.length() / 2.0
    }

    /// Slide along the axis of motion, staying inside the field
    pub fn shift(&mut self, delta: f32, field: &Field) {
        let max = field.extent(self.orientation) - self.length();
        let next = (self.axis_position() + delta).clamp(0.0, max);
        match self.orientation {
            Orientation::Vertical => self.rect.pos.y = next,
            Orientation::Horizontal => self.rect.pos.x = next,
        }
    }

    /// Where along the paddle `point` lies: -1 at the start, 0 at the center, 1 at the end
    pub fn hit_offset(&self, point: Vec2) -> f32 {
        let half = self.length() / 2.0;
        ((self.orientation.along(point) - self.axis_center()) / half).clamp(-1.0, 1.0)
    }

    /// Ball position resting against the paddle's field-facing face
    pub fn flush_position(&self, ball_pos: Vec2, radius: f32) -> Vec2 {
        let max = self.rect.max();
        match self.side {
            Side::Left => Vec2::new(max.x + radius, ball_pos.y),
            Side::Right => Vec2::new(self.rect.pos.x - radius, ball_pos.y),
            Side::Top => Vec2::new(ball_pos.x, max.y + radius),
            Side::Bottom => Vec2::new(ball_pos.x, self.rect.pos.y - radius),
        }
    }

    /// Take one life; returns true when this eliminates the paddle
    pub fn lose_life(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.active = false;
            return true;
        }
        false
    }
}

/// Emitted for the renderer each time a paddle loses a life
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifeLostEvent {
    pub player_id: PlayerId,
    pub player_name: String,
    pub side: Side,
    pub remaining_lives: u32,
    pub timestamp_ms: f64,
}

/// One entry of the elimination order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Elimination {
    pub id: PlayerId,
    pub name: String,
    pub time_ms: f64,
}

/// Complete match state (deterministic given settings and seed)
#[derive(Debug, Clone)]
pub struct MatchState {
    pub(crate) settings: MatchSettings,
    pub(crate) seed: u64,
    pub(crate) rng: Pcg32,
    pub(crate) game_id: String,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) field: Field,
    pub(crate) phase: MatchPhase,
    /// Displayed countdown value, `None` once play starts
    pub(crate) countdown: Option<i32>,
    /// Simulated milliseconds since construction
    pub(crate) clock_ms: f64,
    pub(crate) ball: Ball,
    /// One per slot in play, in slot order
    pub(crate) paddles: Vec<Paddle>,
    pub(crate) rally: Rally,
    pub(crate) recorder: Recorder,
    pub(crate) eliminations: Vec<Elimination>,
    pub(crate) winner: Option<Winner>,
    pub(crate) life_lost: Vec<LifeLostEvent>,
}

impl MatchState {
    /// Create a match starting now, in countdown
    pub fn new(settings: MatchSettings, seed: u64) -> Self {
        Self::with_start_time(settings, seed, Utc::now())
    }

    /// Create a match with an explicit wall-clock start
    pub fn with_start_time(settings: MatchSettings, seed: u64, started_at: DateTime<Utc>) -> Self {
        let settings = settings.sanitized();
        let field = Field::for_mode(settings.mode);
        let mut rng = Pcg32::seed_from_u64(seed);

        let paddles: Vec<Paddle> = settings
            .mode
            .players()
            .iter()
            .map(|&id| {
                Paddle::new(
                    id,
                    settings.name_for(id),
                    field.slot(id.side()),
                    settings.lives_for(id),
                    settings.difficulty_for(id),
                )
            })
            .collect();

        let game_id = format!(
            "G{}-{}",
            started_at.timestamp_millis(),
            rng.random_range(0..1000u32)
        );
        log::debug!(
            "Match {} created: {} with {} paddles, seed {}",
            game_id,
            settings.mode.as_str(),
            paddles.len(),
            seed
        );

        Self {
            settings,
            seed,
            rng,
            game_id,
            started_at,
            field,
            phase: MatchPhase::Countdown,
            countdown: Some(COUNTDOWN_START),
            clock_ms: 0.0,
            ball: Ball::new(field.center()),
            paddles,
            rally: Rally::new(None, BALL_START_SPEED),
            recorder: Recorder::new(TELEMETRY_INTERVAL_MS),
            eliminations: Vec::new(),
            winner: None,
            life_lost: Vec::new(),
        }
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// True until the countdown completes
    pub fn is_paused(&self) -> bool {
        self.phase == MatchPhase::Countdown
    }

    pub fn countdown(&self) -> Option<i32> {
        self.countdown
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn ball(&self) -> &Ball {
        &self.ball
    }

    pub fn paddles(&self) -> &[Paddle] {
        &self.paddles
    }

    pub fn paddle(&self, id: PlayerId) -> Option<&Paddle> {
        self.paddles.iter().find(|p| p.id == id)
    }

    pub fn active_count(&self) -> usize {
        self.paddles.iter().filter(|p| p.active).count()
    }

    pub fn eliminations(&self) -> &[Elimination] {
        &self.eliminations
    }

    pub fn winner(&self) -> Option<&Winner> {
        self.winner.as_ref()
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Hand pending life-lost events to the renderer; each is returned once
    pub fn drain_life_lost(&mut self) -> Vec<LifeLostEvent> {
        std::mem::take(&mut self.life_lost)
    }

    pub(crate) fn paddle_index_on(&self, side: Side) -> Option<usize> {
        self.paddles.iter().position(|p| p.side == side)
    }

    /// Fewer than two paddles left standing
    pub(crate) fn is_decided(&self) -> bool {
        self.active_count() < 2
    }
}
