//! Match state machine
//!
//! Countdown -> active play -> terminal. The frame driver calls `update`
//! once per rendered frame and a separate once-per-second timer calls
//! `countdown_tick` until it reports `Started`.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ai::ai_displacement;
use super::collision::{ball_paddle_overlap, bounce_off_wall, deflect_off_paddle};
use super::field::{Orientation, Side};
use super::state::{Elimination, LifeLostEvent, MatchPhase, MatchState, PlayerId};
use super::telemetry::{Action, HitDetail, MissDetail, Rally};
use crate::consts::*;
use crate::report::{GameResult, Winner};

/// Directional intent for one human paddle this frame
///
/// Vertical paddles read `up`/`down`, horizontal ones `left`/`right`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaddleIntent {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl PaddleIntent {
    pub fn up() -> Self {
        Self { up: true, ..Default::default() }
    }

    pub fn down() -> Self {
        Self { down: true, ..Default::default() }
    }

    pub fn left() -> Self {
        Self { left: true, ..Default::default() }
    }

    pub fn right() -> Self {
        Self { right: true, ..Default::default() }
    }

    /// (toward the axis origin, away from it) for a paddle of `orientation`
    fn directions(&self, orientation: Orientation) -> (bool, bool) {
        match orientation {
            Orientation::Vertical => (self.up, self.down),
            Orientation::Horizontal => (self.left, self.right),
        }
    }
}

/// Input for a single frame; AI paddles ignore it
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    pub intents: BTreeMap<PlayerId, PaddleIntent>,
}

impl FrameInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: PlayerId, intent: PaddleIntent) -> Self {
        self.intents.insert(id, intent);
        self
    }

    pub fn intent(&self, id: PlayerId) -> Option<&PaddleIntent> {
        self.intents.get(&id)
    }
}

/// What a countdown tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Still counting; the displayed value
    Counting(i32),
    /// Displaying "GO"
    Go,
    /// Play has begun; the driver should cancel its timer
    Started,
    /// Countdown already over, nothing done
    Idle,
}

impl MatchState {
    /// Advance the countdown by one second
    ///
    /// Safe to call after the countdown has ended: it returns `Idle` and
    /// touches nothing, so a timer that outlives the countdown is harmless.
    pub fn countdown_tick(&mut self) -> CountdownTick {
        if self.phase != MatchPhase::Countdown {
            return CountdownTick::Idle;
        }

        self.clock_ms += COUNTDOWN_TICK_MS;
        let next = self.countdown.unwrap_or(0) - 1;
        if next < 0 {
            self.countdown = None;
            self.phase = MatchPhase::Active;
            log::debug!("Match {} started at {}ms", self.game_id, self.clock_ms);
            self.serve();
            return CountdownTick::Started;
        }

        self.countdown = Some(next);
        if next == 0 {
            CountdownTick::Go
        } else {
            CountdownTick::Counting(next)
        }
    }

    /// Advance the simulation by exactly one frame
    ///
    /// Returns the game result on the frame the match ends, and never again.
    /// Does nothing while counting down or after the end.
    pub fn update(&mut self, input: &FrameInput) -> Option<GameResult> {
        if self.phase != MatchPhase::Active {
            return None;
        }

        self.clock_ms += FRAME_MS;
        self.ball.accelerate(BALL_FRAME_ACCEL, BALL_MAX_SPEED);
        self.move_paddles(input);
        self.ball.advance();
        self.resolve_collisions();
        self.recorder
            .sample(self.clock_ms, &self.ball, &mut self.paddles);
        self.check_win_condition()
    }

    fn move_paddles(&mut self, input: &FrameInput) {
        let ball_pos = self.ball.pos;
        for paddle in self.paddles.iter_mut().filter(|p| p.active) {
            if let Some(difficulty) = paddle.difficulty {
                let delta = ai_displacement(paddle, ball_pos, difficulty, &self.field, &mut self.rng);
                paddle.shift(delta, &self.field);
            } else if let Some(intent) = input.intent(paddle.id) {
                let (back, forward) = intent.directions(paddle.orientation);
                if back {
                    paddle.shift(-HUMAN_PADDLE_SPEED, &self.field);
                }
                if forward {
                    paddle.shift(HUMAN_PADDLE_SPEED, &self.field);
                }
            }
        }
    }

    fn resolve_collisions(&mut self) {
        for side in Side::COLLISION_ORDER {
            if !self.field.crossed(side, self.ball.pos, self.ball.radius) {
                continue;
            }
            match self.paddle_index_on(side) {
                Some(index) if self.paddles[index].active => {
                    // Overlap is handled by the hit pass below
                    if !ball_paddle_overlap(self.ball.pos, self.ball.radius, &self.paddles[index]) {
                        self.handle_miss(index);
                    }
                }
                // Unmanned and eliminated edges are walls
                _ => bounce_off_wall(&mut self.ball, side, &self.field),
            }
        }

        if self.is_decided() {
            return;
        }

        for index in 0..self.paddles.len() {
            let paddle = &self.paddles[index];
            if paddle.active && ball_paddle_overlap(self.ball.pos, self.ball.radius, paddle) {
                self.handle_paddle_hit(index);
            }
        }
    }

    fn handle_paddle_hit(&mut self, index: usize) {
        let now = self.clock_ms;
        let response = deflect_off_paddle(&mut self.ball, &self.paddles[index]);

        let paddle = &mut self.paddles[index];
        paddle.hits += 1;
        self.ball.last_hit_by = Some(paddle.id);
        self.rally.record_hit(paddle.id, now);

        let reaction_time_ms = self.recorder.last_hit_ms().map(|last| now - last);
        self.recorder.record_hit(HitDetail {
            timestamp_ms: now,
            player_id: paddle.id,
            player_name: paddle.name.clone(),
            ball_x: response.contact.x,
            ball_y: response.contact.y,
            speed_before: response.speed_before,
            speed_after: response.speed_after,
            hit_position: response.offset,
            paddle_center: paddle.axis_center(),
            angle_before_deg: response.angle_before.to_degrees(),
            angle_after_deg: response.angle_after.to_degrees(),
            rally_hit_number: self.rally.hits,
            reaction_time_ms,
            is_ai: paddle.is_ai(),
            difficulty: paddle.difficulty,
        });
        self.recorder.log(
            now,
            paddle.name.clone(),
            Action::Hit {
                ball_speed: response.speed_after,
                hit_position: response.offset,
                rally_hits: self.rally.hits,
            },
        );
        log::debug!(
            "{} hit at offset {:.2}, speed {:.2} -> {:.2}",
            paddle.name,
            response.offset,
            response.speed_before,
            response.speed_after
        );
    }

    fn handle_miss(&mut self, index: usize) {
        let now = self.clock_ms;
        let rally = std::mem::replace(&mut self.rally, Rally::new(None, self.ball.speed));
        let rally_hits = rally.hits;

        let paddle = &mut self.paddles[index];
        let id = paddle.id;
        if let Some(record) = rally.finish(now, id) {
            self.recorder.archive_rally(record);
        }

        self.recorder.record_miss(MissDetail {
            timestamp_ms: now,
            player_id: id,
            player_name: paddle.name.clone(),
            ball_x: self.ball.pos.x,
            ball_y: self.ball.pos.y,
            ball_speed: self.ball.speed,
            lives_before: paddle.lives,
            rally_hits,
            is_ai: paddle.is_ai(),
        });

        let eliminated = paddle.lose_life();
        self.recorder.log(
            now,
            paddle.name.clone(),
            Action::LifeLost {
                remaining: paddle.lives,
                location: paddle.side,
                ball_speed: self.ball.speed,
                rally_hits,
            },
        );
        self.life_lost.push(LifeLostEvent {
            player_id: id,
            player_name: paddle.name.clone(),
            side: paddle.side,
            remaining_lives: paddle.lives,
            timestamp_ms: now,
        });

        if eliminated {
            let name = paddle.name.clone();
            if !self.eliminations.iter().any(|e| e.id == id) {
                self.eliminations.push(Elimination {
                    id,
                    name: name.clone(),
                    time_ms: now,
                });
            }
            self.recorder.log(
                now,
                name.clone(),
                Action::Eliminated {
                    survival_secs: now / 1000.0,
                },
            );
            log::info!("{} eliminated at {:.2}s", name, now / 1000.0);
        }

        if !self.is_decided() {
            self.serve();
        }
    }

    /// Put the ball in the middle and aim it at a random live paddle
    pub(crate) fn serve(&mut self) {
        let now = self.clock_ms;
        self.ball.reset(self.field.center());

        let active: Vec<usize> = self
            .paddles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.active)
            .map(|(i, _)| i)
            .collect();
        if active.is_empty() {
            return;
        }

        let target = &self.paddles[active[self.rng.random_range(0..active.len())]];
        let half = target.length() / 2.0;
        let jitter = (self.rng.random::<f32>() - 0.5) * 2.0 * SERVE_JITTER * half;
        let aim = target.center() + target.orientation.compose(0.0, jitter);
        let heading = crate::angle_of(aim - self.ball.pos);
        self.ball.launch(heading, BALL_START_SPEED);

        log::debug!("Serve toward {} at {:.1} deg", target.name, heading.to_degrees());
        self.recorder.log(
            now,
            "System",
            Action::Served {
                target: target.id,
                target_name: target.name.clone(),
                angle_deg: heading.to_degrees(),
            },
        );
        self.rally = Rally::new(Some(now), self.ball.speed);
    }

    /// Conclude the match once fewer than two paddles are active
    fn check_win_condition(&mut self) -> Option<GameResult> {
        if self.phase == MatchPhase::Terminal || !self.is_decided() {
            return None;
        }

        let winner = match self.paddles.iter().find(|p| p.active) {
            Some(p) => Winner::Player {
                id: p.id,
                name: p.name.clone(),
            },
            None => Winner::NoOne,
        };
        log::info!(
            "Match {} over after {:.2}s, winner: {}",
            self.game_id,
            self.clock_ms / 1000.0,
            winner.name()
        );
        self.winner = Some(winner);
        self.phase = MatchPhase::Terminal;
        Some(GameResult::assemble(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{MatchSettings, Mode};
    use crate::sim::Difficulty;
    use glam::Vec2;

    fn started(settings: MatchSettings, seed: u64) -> MatchState {
        let mut state = MatchState::new(settings, seed);
        while state.countdown_tick() != CountdownTick::Started {}
        state
    }

    /// Park the ball just past `side`, heading out, clear of any paddle
    fn park_past(state: &mut MatchState, side: Side) {
        let field = *state.field();
        let pos = match side {
            Side::Left => Vec2::new(5.0, 40.0),
            Side::Right => Vec2::new(field.width - 5.0, 40.0),
            Side::Top => Vec2::new(40.0, 5.0),
            Side::Bottom => Vec2::new(40.0, field.height - 5.0),
        };
        let speed = state.ball.speed;
        state.ball.steer(-side.inward_normal(), speed);
        state.ball.pos = pos - state.ball.vel * BALL_FRAME_ACCEL;
    }

    #[test]
    fn test_countdown_sequence() {
        let mut state = MatchState::new(MatchSettings::new(Mode::TwoPlayer), 5);
        assert_eq!(state.countdown_tick(), CountdownTick::Counting(2));
        assert_eq!(state.countdown_tick(), CountdownTick::Counting(1));
        assert_eq!(state.countdown_tick(), CountdownTick::Go);
        assert_eq!(state.countdown(), Some(0));
        assert!(state.is_paused());
        assert_eq!(state.countdown_tick(), CountdownTick::Started);
        assert_eq!(state.countdown(), None);
        assert!(!state.is_paused());
        assert_eq!(state.phase(), MatchPhase::Active);
        assert!((state.ball().vel.length() - BALL_START_SPEED).abs() < 1e-4);
        assert_eq!(state.clock_ms(), 4000.0);
    }

    #[test]
    fn test_leaked_countdown_timer_is_idle() {
        let mut state = started(MatchSettings::new(Mode::TwoPlayer), 5);
        let ball = state.ball().clone();
        let clock = state.clock_ms();
        let serves = state.recorder().actions.len();
        for _ in 0..5 {
            assert_eq!(state.countdown_tick(), CountdownTick::Idle);
        }
        assert_eq!(state.ball().pos, ball.pos);
        assert_eq!(state.ball().vel, ball.vel);
        assert_eq!(state.clock_ms(), clock);
        assert_eq!(state.recorder().actions.len(), serves);
    }

    #[test]
    fn test_update_is_noop_while_paused() {
        let mut state = MatchState::new(MatchSettings::new(Mode::TwoPlayer), 5);
        let ball_pos = state.ball().pos;
        assert!(state.update(&FrameInput::new()).is_none());
        assert_eq!(state.ball().pos, ball_pos);
        assert_eq!(state.clock_ms(), 0.0);
        assert!(state.recorder().samples.is_empty());
    }

    #[test]
    fn test_speed_coupled_and_growing_during_play() {
        let mut state = started(MatchSettings::new(Mode::TwoPlayer), 11);
        let mut last_speed = state.ball().speed;
        for _ in 0..40 {
            state.update(&FrameInput::new());
            let ball = state.ball();
            assert!((ball.vel.length() - ball.speed).abs() < 1e-3);
            assert!(ball.speed >= last_speed);
            assert!(ball.speed <= BALL_MAX_SPEED);
            last_speed = ball.speed;
        }
        assert!(last_speed > BALL_START_SPEED);
    }

    #[test]
    fn test_human_intent_moves_paddle() {
        let mut state = started(MatchSettings::new(Mode::FourPlayer), 2);
        let p1_y = state.paddle(PlayerId::P1).map(|p| p.rect.pos.y);
        let p3_x = state.paddle(PlayerId::P3).map(|p| p.rect.pos.x);
        let input = FrameInput::new()
            .with(PlayerId::P1, PaddleIntent::up())
            .with(PlayerId::P3, PaddleIntent::right())
            // Wrong axis for a vertical paddle: ignored
            .with(PlayerId::P2, PaddleIntent::left());
        state.update(&input);

        assert_eq!(state.paddle(PlayerId::P1).map(|p| p.rect.pos.y), p1_y.map(|y| y - 7.0));
        assert_eq!(state.paddle(PlayerId::P3).map(|p| p.rect.pos.x), p3_x.map(|x| x + 7.0));
        assert_eq!(state.paddle(PlayerId::P2).map(|p| p.rect.pos.y), Some(300.0));
        // No entry at all is simply no movement
        assert_eq!(state.paddle(PlayerId::P4).map(|p| p.rect.pos.x), Some(300.0));
    }

    #[test]
    fn test_ai_ignores_input() {
        let settings = MatchSettings::new(Mode::TwoPlayer).with_ai(PlayerId::P2, Difficulty::Hard);
        let mut state = started(settings, 3);
        state.ball.pos = Vec2::new(400.0, 20.0);
        state.ball.steer(Vec2::new(1.0, 0.0), BALL_START_SPEED);
        let before = state.paddle(PlayerId::P2).map(|p| p.rect.pos.y).unwrap_or_default();
        state.update(&FrameInput::new().with(PlayerId::P2, PaddleIntent::down()));
        let after = state.paddle(PlayerId::P2).map(|p| p.rect.pos.y).unwrap_or_default();
        assert_eq!(after, before - 6.5);
    }

    #[test]
    fn test_single_miss_ends_two_player_match() {
        let settings = MatchSettings::new(Mode::TwoPlayer)
            .with_name(PlayerId::P1, "Ada")
            .with_name(PlayerId::P2, "Bo");
        let mut state = started(settings, 9);
        park_past(&mut state, Side::Left);

        let result = state.update(&FrameInput::new()).expect("match concluded");
        let p1 = state.paddle(PlayerId::P1).expect("p1");
        assert!(!p1.active);
        assert_eq!(p1.lives, 0);
        assert_eq!(
            state.winner(),
            Some(&Winner::Player { id: PlayerId::P2, name: "Bo".into() })
        );
        assert_eq!(result.ranking[0].place, 1);
        assert_eq!(result.ranking[0].name, "Bo");
        assert_eq!(result.ranking[1].name, "Ada");
        assert_eq!(result.players.len(), 2);
        assert_eq!(state.phase(), MatchPhase::Terminal);

        // Terminal: no second result, no more motion
        let pos = state.ball().pos;
        assert!(state.update(&FrameInput::new()).is_none());
        assert_eq!(state.ball().pos, pos);
    }

    #[test]
    fn test_miss_with_lives_left_reserves() {
        let settings = MatchSettings::new(Mode::TwoPlayer).with_lives(PlayerId::P1, 2);
        let mut state = started(settings, 9);
        state.update(&FrameInput::new());
        park_past(&mut state, Side::Left);

        assert!(state.update(&FrameInput::new()).is_none());
        assert_eq!(state.paddle(PlayerId::P1).map(|p| p.lives), Some(1));
        assert_eq!(state.ball().pos, state.field().center());
        assert_eq!(state.ball().speed, BALL_START_SPEED);
        assert!((state.ball().vel.length() - BALL_START_SPEED).abs() < 1e-4);

        let events = state.drain_life_lost();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].player_id, PlayerId::P1);
        assert_eq!(events[0].side, Side::Left);
        assert_eq!(events[0].remaining_lives, 1);
        assert!(state.drain_life_lost().is_empty());
        // Served straight past, no hits: nothing archived
        assert!(state.recorder().rallies.is_empty());
        assert_eq!(state.recorder().misses.len(), 1);
    }

    #[test]
    fn test_rally_archived_on_miss() {
        let settings = MatchSettings::new(Mode::TwoPlayer).with_lives(PlayerId::P2, 3);
        let mut state = started(settings, 21);
        state.rally.record_hit(PlayerId::P1, state.clock_ms);
        state.rally.record_hit(PlayerId::P2, state.clock_ms + 500.0);
        park_past(&mut state, Side::Right);
        state.update(&FrameInput::new());

        let rallies = &state.recorder().rallies;
        assert_eq!(rallies.len(), 1);
        assert_eq!(rallies[0].hits, 2);
        assert_eq!(rallies[0].ended_by, PlayerId::P2);
        assert_eq!(state.rally.hits, 0);
    }

    #[test]
    fn test_center_hit_is_straight_reflection() {
        let mut state = started(MatchSettings::new(Mode::TwoPlayer), 4);
        // Left paddle spans x 20..30, y 250..350
        state.ball.pos = Vec2::new(36.0 + BALL_START_SPEED, 300.0);
        state.ball.launch(std::f32::consts::PI, BALL_START_SPEED);
        state.update(&FrameInput::new());

        let hit = state.recorder().hits.last().expect("paddle hit recorded");
        assert_eq!(hit.player_id, PlayerId::P1);
        assert!(hit.hit_position.abs() < 1e-3);
        assert!(state.ball().vel.x > 0.0);
        assert!(state.ball().vel.y.abs() < 1e-3);
        assert_eq!(state.ball().pos.x, 30.0 + BALL_RADIUS);
        assert_eq!(state.paddle(PlayerId::P1).map(|p| p.hits), Some(1));
        assert_eq!(state.ball().last_hit_by, Some(PlayerId::P1));
        assert_eq!(state.rally.hits, 1);
        assert_eq!(hit.reaction_time_ms, None);
    }

    #[test]
    fn test_eliminated_side_becomes_wall() {
        let settings = MatchSettings::new(Mode::ThreePlayer)
            .with_lives(PlayerId::P2, 2)
            .with_lives(PlayerId::P3, 2);
        let mut state = started(settings, 8);
        park_past(&mut state, Side::Left);
        assert!(state.update(&FrameInput::new()).is_none());
        assert!(!state.paddle(PlayerId::P1).expect("p1").active);
        let misses = state.recorder().misses.len();

        park_past(&mut state, Side::Left);
        state.update(&FrameInput::new());
        assert_eq!(state.recorder().misses.len(), misses);
        assert_eq!(state.ball().pos.x, BALL_RADIUS);
        assert!(state.ball().vel.x > 0.0);
        assert_eq!(state.eliminations().len(), 1);
    }

    #[test]
    fn test_unmanned_edges_are_walls() {
        let mut state = started(MatchSettings::new(Mode::TwoPlayer), 8);
        park_past(&mut state, Side::Top);
        state.update(&FrameInput::new());
        assert_eq!(state.ball().pos.y, BALL_RADIUS);
        assert!(state.ball().vel.y > 0.0);
        assert!(state.recorder().misses.is_empty());
    }

    #[test]
    fn test_corner_double_miss_is_no_one() {
        let mut state = started(MatchSettings::new(Mode::FourPlayer), 13);
        // Only right and bottom are defended
        for id in [PlayerId::P1, PlayerId::P4] {
            if let Some(p) = state.paddles.iter_mut().find(|p| p.id == id) {
                p.lives = 0;
                p.active = false;
            }
        }
        // Leaving through the bottom-right corner, clear of both paddles
        state.ball.launch(std::f32::consts::FRAC_PI_4, 10.0);
        state.ball.pos = Vec2::new(695.0, 695.0) - state.ball.vel * BALL_FRAME_ACCEL;
        let result = state.update(&FrameInput::new()).expect("both eliminated");

        assert_eq!(result.winner, Winner::NoOne);
        assert_eq!(result.winner.name(), "No One");
        let order: Vec<_> = state.eliminations().iter().map(|e| e.id).collect();
        assert_eq!(order, vec![PlayerId::P2, PlayerId::P3]);
        assert_eq!(state.active_count(), 0);
        let ranked: Vec<_> = result.ranking.iter().map(|r| r.id).collect();
        assert_eq!(ranked, vec![PlayerId::P3, PlayerId::P2]);
        assert!(state.update(&FrameInput::new()).is_none());
    }

    #[test]
    fn test_serve_targets_every_active_paddle() {
        let mut state = started(MatchSettings::new(Mode::TwoPlayer), 99);
        let (mut left, mut right) = (0, 0);
        for _ in 0..200 {
            state.serve();
            if state.ball().vel.x < 0.0 {
                left += 1;
            } else {
                right += 1;
            }
            assert_eq!(state.ball().speed, BALL_START_SPEED);
        }
        assert!(left > 20 && right > 20, "left {left}, right {right}");
    }

    #[test]
    fn test_serve_skips_eliminated_paddles() {
        let mut state = started(MatchSettings::new(Mode::ThreePlayer), 17);
        if let Some(p) = state.paddles.iter_mut().find(|p| p.id == PlayerId::P1) {
            p.lives = 0;
            p.active = false;
        }
        for _ in 0..100 {
            state.serve();
            assert!(state.ball().vel.x >= 0.0 || state.ball().vel.y > 0.0);
            match state.recorder().actions.last().map(|a| &a.action) {
                Some(Action::Served { target, .. }) => assert_ne!(*target, PlayerId::P1),
                other => panic!("expected a serve, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_serve_with_no_active_paddles_leaves_ball_still() {
        let mut state = started(MatchSettings::new(Mode::TwoPlayer), 1);
        for p in state.paddles.iter_mut() {
            p.lives = 0;
            p.active = false;
        }
        state.serve();
        assert_eq!(state.ball().vel, Vec2::ZERO);
        assert_eq!(state.ball().pos, state.field().center());
    }

    #[test]
    fn test_telemetry_cadence() {
        let mut state = started(MatchSettings::new(Mode::TwoPlayer), 6);
        for _ in 0..60 {
            state.update(&FrameInput::new());
        }
        // 60 frames = 1s at 100ms cadence, frame-quantized
        let samples = state.recorder().samples.len();
        assert!((9..=11).contains(&samples), "got {samples} samples");
        for pair in state.recorder().samples.windows(2) {
            assert!(pair[1].timestamp_ms - pair[0].timestamp_ms >= TELEMETRY_INTERVAL_MS);
        }
    }
}
