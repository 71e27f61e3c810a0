//! Collision detection and response
//!
//! Ball against the field walls and against axis-aligned paddles.

use glam::Vec2;

use super::field::{Field, Side};
use super::state::{Ball, Paddle};
use crate::angle_of;
use crate::consts::*;

/// Outcome of a paddle hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitResponse {
    /// Ball center at the moment of contact (before repositioning)
    pub contact: Vec2,
    /// Normalized offset along the paddle, in [-1, 1]
    pub offset: f32,
    pub speed_before: f32,
    pub speed_after: f32,
    pub angle_before: f32,
    pub angle_after: f32,
}

/// Exact circle vs axis-aligned rectangle overlap
pub fn ball_paddle_overlap(ball_pos: Vec2, ball_radius: f32, paddle: &Paddle) -> bool {
    let closest = ball_pos.clamp(paddle.rect.pos, paddle.rect.max());
    ball_pos.distance_squared(closest) < ball_radius * ball_radius
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Treat `side` as a static wall: reflect and rest the ball against it
pub fn bounce_off_wall(ball: &mut Ball, side: Side, field: &Field) {
    let normal = side.inward_normal();
    // Only reflect while heading out, otherwise a clamped ball would flip back
    if ball.vel.dot(normal) < 0.0 {
        ball.vel = reflect_velocity(ball.vel, normal);
    }
    ball.pos = field.clamp_to(side, ball.pos, ball.radius);
}

/// Bounce the ball off a paddle
///
/// Speeds the ball up (capped), sends the perpendicular component back into
/// the field, adds english proportional to where the paddle was struck and
/// moves the ball flush against the paddle face so it cannot hit twice.
pub fn deflect_off_paddle(ball: &mut Ball, paddle: &Paddle) -> HitResponse {
    let contact = ball.pos;
    let speed_before = ball.speed;
    let angle_before = ball.heading();
    let speed_after = (ball.speed * PADDLE_BOOST).min(BALL_MAX_SPEED);
    let offset = paddle.hit_offset(contact);

    let orientation = paddle.orientation;
    let across = orientation.across(ball.vel).abs() * paddle.side.inward_sign();
    let along = orientation.along(ball.vel) + offset * PADDLE_DEFLECTION;
    ball.steer(orientation.compose(across, along), speed_after);
    ball.pos = paddle.flush_position(contact, ball.radius);

    HitResponse {
        contact,
        offset,
        speed_before,
        speed_after,
        angle_before,
        angle_after: angle_of(ball.vel),
    }
}
