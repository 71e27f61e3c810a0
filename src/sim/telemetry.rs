//! Rally and telemetry recording
//!
//! The recorder watches the match and keeps the logs that end up in the
//! game result. It only ever touches paddle movement bookkeeping, never the
//! ball or paddle positions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::ai::Difficulty;
use super::field::Side;
use super::state::{Ball, Elimination, Paddle, PlayerId};
use crate::consts::ACCURATE_HIT_OFFSET;

/// Ball kinematics at a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSample {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub speed: f32,
}

/// Paddle kinematics at a sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaddleSample {
    pub id: PlayerId,
    pub x: f32,
    pub y: f32,
    /// Center along the axis of motion
    pub center: f32,
    pub active: bool,
    pub lives: u32,
    pub hits: u32,
    pub distance_moved: f32,
    pub total_distance: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    pub timestamp_ms: f64,
    pub ball: BallSample,
    pub players: Vec<PaddleSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitDetail {
    pub timestamp_ms: f64,
    pub player_id: PlayerId,
    pub player_name: String,
    pub ball_x: f32,
    pub ball_y: f32,
    pub speed_before: f32,
    pub speed_after: f32,
    /// Normalized offset from the paddle center, in [-1, 1]
    pub hit_position: f32,
    pub paddle_center: f32,
    pub angle_before_deg: f32,
    pub angle_after_deg: f32,
    pub rally_hit_number: u32,
    /// Time since the previous hit by anyone
    pub reaction_time_ms: Option<f64>,
    pub is_ai: bool,
    pub difficulty: Option<Difficulty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissDetail {
    pub timestamp_ms: f64,
    pub player_id: PlayerId,
    pub player_name: String,
    pub ball_x: f32,
    pub ball_y: f32,
    pub ball_speed: f32,
    pub lives_before: u32,
    pub rally_hits: u32,
    pub is_ai: bool,
}

/// What happened, for the action log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Action {
    Served {
        target: PlayerId,
        target_name: String,
        angle_deg: f32,
    },
    Hit {
        ball_speed: f32,
        hit_position: f32,
        rally_hits: u32,
    },
    LifeLost {
        remaining: u32,
        location: Side,
        ball_speed: f32,
        rally_hits: u32,
    },
    Eliminated {
        survival_secs: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    pub timestamp_ms: f64,
    /// Paddle name, or "System" for serves
    pub player: String,
    pub action: Action,
}

/// The rally in progress
#[derive(Debug, Clone, PartialEq)]
pub struct Rally {
    pub hits: u32,
    pub start_ms: Option<f64>,
    pub last_hit_ms: Option<f64>,
    pub participants: BTreeSet<PlayerId>,
    pub start_ball_speed: f32,
}

impl Rally {
    pub fn new(start_ms: Option<f64>, start_ball_speed: f32) -> Self {
        Self {
            hits: 0,
            start_ms,
            last_hit_ms: None,
            participants: BTreeSet::new(),
            start_ball_speed,
        }
    }

    pub fn record_hit(&mut self, id: PlayerId, now_ms: f64) {
        // Rally time is measured from the first touch
        if self.hits == 0 {
            self.start_ms = Some(now_ms);
        }
        self.hits += 1;
        self.last_hit_ms = Some(now_ms);
        self.participants.insert(id);
    }

    /// Close the rally; one without hits leaves no record
    pub fn finish(self, end_ms: f64, ended_by: PlayerId) -> Option<RallyRecord> {
        if self.hits == 0 {
            return None;
        }
        let start_ms = self.start_ms.unwrap_or(end_ms);
        Some(RallyRecord {
            hits: self.hits,
            start_ms,
            last_hit_ms: self.last_hit_ms,
            end_ms,
            duration_ms: end_ms - start_ms,
            ended_by,
            participants: self.participants.into_iter().collect(),
            start_ball_speed: self.start_ball_speed,
        })
    }
}

/// A finished rally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RallyRecord {
    pub hits: u32,
    pub start_ms: f64,
    pub last_hit_ms: Option<f64>,
    pub end_ms: f64,
    pub duration_ms: f64,
    /// Paddle that missed
    pub ended_by: PlayerId,
    pub participants: Vec<PlayerId>,
    pub start_ball_speed: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BallMetrics {
    pub avg_speed: Option<f32>,
    pub min_speed: Option<f32>,
    pub max_speed: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RallyMetrics {
    pub total: usize,
    pub avg_length: Option<f32>,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
    pub avg_duration_secs: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMetrics {
    pub id: PlayerId,
    pub name: String,
    pub total_hits: u32,
    pub total_misses: usize,
    /// Fraction of hits landing in the center half of the paddle
    pub hit_accuracy: Option<f32>,
    pub avg_hit_offset: Option<f32>,
    pub max_ball_speed_on_hit: Option<f32>,
    pub avg_reaction_secs: Option<f64>,
    pub total_distance: f32,
    pub is_ai: bool,
    pub difficulty: Option<Difficulty>,
    /// Elimination time, or match end for the survivor
    pub survival_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimingMetrics {
    pub game_duration_secs: f64,
    pub avg_time_between_hits_secs: Option<f64>,
}

/// Summary derived once the match ends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub ball: BallMetrics,
    pub rallies: RallyMetrics,
    pub players: Vec<PlayerMetrics>,
    pub timing: TimingMetrics,
}

fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Logs collected over a match
#[derive(Debug, Clone)]
pub struct Recorder {
    interval_ms: f64,
    last_sample_ms: Option<f64>,
    pub samples: Vec<TelemetrySample>,
    pub hits: Vec<HitDetail>,
    pub misses: Vec<MissDetail>,
    pub rallies: Vec<RallyRecord>,
    pub actions: Vec<ActionEntry>,
}

impl Recorder {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms,
            last_sample_ms: None,
            samples: Vec::new(),
            hits: Vec::new(),
            misses: Vec::new(),
            rallies: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Take a sample unless one was taken less than an interval ago
    ///
    /// Updates each paddle's movement tracking. Returns whether a sample was taken.
    pub fn sample(&mut self, now_ms: f64, ball: &Ball, paddles: &mut [Paddle]) -> bool {
        if self
            .last_sample_ms
            .is_some_and(|last| now_ms - last < self.interval_ms)
        {
            return false;
        }

        let players = paddles
            .iter_mut()
            .map(|p| {
                let distance = p.rect.pos.distance(p.last_sample_pos);
                p.total_distance += distance;
                p.last_sample_pos = p.rect.pos;
                PaddleSample {
                    id: p.id,
                    x: p.rect.pos.x,
                    y: p.rect.pos.y,
                    center: p.axis_center(),
                    active: p.active,
                    lives: p.lives,
                    hits: p.hits,
                    distance_moved: distance,
                    total_distance: p.total_distance,
                }
            })
            .collect();

        self.samples.push(TelemetrySample {
            timestamp_ms: now_ms,
            ball: BallSample {
                x: ball.pos.x,
                y: ball.pos.y,
                vx: ball.vel.x,
                vy: ball.vel.y,
                speed: ball.speed,
            },
            players,
        });
        self.last_sample_ms = Some(now_ms);
        true
    }

    pub fn last_hit_ms(&self) -> Option<f64> {
        self.hits.last().map(|h| h.timestamp_ms)
    }

    pub fn record_hit(&mut self, detail: HitDetail) {
        self.hits.push(detail);
    }

    pub fn record_miss(&mut self, detail: MissDetail) {
        self.misses.push(detail);
    }

    pub fn archive_rally(&mut self, rally: RallyRecord) {
        self.rallies.push(rally);
    }

    pub fn log(&mut self, timestamp_ms: f64, player: impl Into<String>, action: Action) {
        self.actions.push(ActionEntry {
            timestamp_ms,
            player: player.into(),
            action,
        });
    }

    pub fn metrics(&self, paddles: &[Paddle], eliminations: &[Elimination], end_ms: f64) -> Metrics {
        let speeds: Vec<f32> = self.samples.iter().map(|s| s.ball.speed).collect();
        let ball = BallMetrics {
            avg_speed: mean(speeds.iter().map(|&s| s as f64)).map(|m| m as f32),
            min_speed: speeds.iter().copied().reduce(f32::min),
            max_speed: speeds.iter().copied().reduce(f32::max),
        };

        let rallies = RallyMetrics {
            total: self.rallies.len(),
            avg_length: mean(self.rallies.iter().map(|r| r.hits as f64)).map(|m| m as f32),
            min_length: self.rallies.iter().map(|r| r.hits).min(),
            max_length: self.rallies.iter().map(|r| r.hits).max(),
            avg_duration_secs: mean(self.rallies.iter().map(|r| r.duration_ms)).map(|ms| ms / 1000.0),
        };

        let players = paddles
            .iter()
            .map(|p| self.player_metrics(p, eliminations, end_ms))
            .collect();

        let avg_time_between_hits_secs = match (self.hits.first(), self.hits.last()) {
            (Some(first), Some(last)) if self.hits.len() > 1 => Some(
                (last.timestamp_ms - first.timestamp_ms) / (self.hits.len() - 1) as f64 / 1000.0,
            ),
            _ => None,
        };

        Metrics {
            ball,
            rallies,
            players,
            timing: TimingMetrics {
                game_duration_secs: end_ms / 1000.0,
                avg_time_between_hits_secs,
            },
        }
    }

    fn player_metrics(&self, paddle: &Paddle, eliminations: &[Elimination], end_ms: f64) -> PlayerMetrics {
        let hits: Vec<&HitDetail> = self.hits.iter().filter(|h| h.player_id == paddle.id).collect();
        let offsets = || hits.iter().map(|h| h.hit_position.abs());

        let hit_accuracy = (!hits.is_empty()).then(|| {
            offsets().filter(|&o| o < ACCURATE_HIT_OFFSET).count() as f32 / hits.len() as f32
        });

        let survival_ms = eliminations
            .iter()
            .find(|e| e.id == paddle.id)
            .map(|e| e.time_ms)
            .or(paddle.active.then_some(end_ms));

        PlayerMetrics {
            id: paddle.id,
            name: paddle.name.clone(),
            total_hits: paddle.hits,
            total_misses: self.misses.iter().filter(|m| m.player_id == paddle.id).count(),
            hit_accuracy,
            avg_hit_offset: mean(offsets().map(f64::from)).map(|m| m as f32),
            max_ball_speed_on_hit: hits.iter().map(|h| h.speed_before).reduce(f32::max),
            avg_reaction_secs: mean(hits.iter().filter_map(|h| h.reaction_time_ms)).map(|ms| ms / 1000.0),
            total_distance: paddle.total_distance,
            is_ai: paddle.is_ai(),
            difficulty: paddle.difficulty,
            survival_ms,
        }
    }
}
