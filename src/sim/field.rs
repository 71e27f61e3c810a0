//! Play-field geometry
//!
//! The field is an axis-aligned rectangle with the origin at the top-left
//! corner and y growing downward. Each of its four edges may be defended by
//! one paddle; which edges are defended is decided once, from the mode.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::Mode;

/// Axis a paddle slides along
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Orientation {
    /// Moves along y, bound to the left or right edge
    Vertical,
    /// Moves along x, bound to the top or bottom edge
    Horizontal,
}

impl Orientation {
    /// Pick the component of `v` along the axis of motion
    #[inline]
    pub fn along(self, v: Vec2) -> f32 {
        match self {
            Orientation::Vertical => v.y,
            Orientation::Horizontal => v.x,
        }
    }

    /// Pick the component of `v` across the axis of motion
    #[inline]
    pub fn across(self, v: Vec2) -> f32 {
        match self {
            Orientation::Vertical => v.x,
            Orientation::Horizontal => v.y,
        }
    }

    /// Build a vector from its across-axis and along-axis components
    #[inline]
    pub fn compose(self, across: f32, along: f32) -> Vec2 {
        match self {
            Orientation::Vertical => Vec2::new(across, along),
            Orientation::Horizontal => Vec2::new(along, across),
        }
    }
}

/// Field edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    /// Order in which edges are tested each frame
    pub const COLLISION_ORDER: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    pub fn orientation(self) -> Orientation {
        match self {
            Side::Left | Side::Right => Orientation::Vertical,
            Side::Top | Side::Bottom => Orientation::Horizontal,
        }
    }

    /// Sign of the velocity component that points back into the field
    pub fn inward_sign(self) -> f32 {
        match self {
            Side::Left | Side::Top => 1.0,
            Side::Right | Side::Bottom => -1.0,
        }
    }

    /// Unit normal pointing from the edge into the field
    pub fn inward_normal(self) -> Vec2 {
        self.orientation().compose(self.inward_sign(), 0.0)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Top => "top",
            Side::Bottom => "bottom",
        }
    }
}

/// Axis-aligned rectangle (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.pos + self.size
    }
}

/// Placement of one paddle, resolved from the mode at match construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaddleSlot {
    pub side: Side,
    pub orientation: Orientation,
    pub rect: Rect,
}

/// Field dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Field {
    /// Two players get the wide rectangle, three and four the square
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::TwoPlayer => Self {
                width: WIDE_FIELD_WIDTH,
                height: WIDE_FIELD_HEIGHT,
            },
            Mode::ThreePlayer | Mode::FourPlayer => Self {
                width: SQUARE_FIELD_SIZE,
                height: SQUARE_FIELD_SIZE,
            },
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Extent of the field along an orientation's axis of motion
    #[inline]
    pub fn extent(&self, orientation: Orientation) -> f32 {
        match orientation {
            Orientation::Vertical => self.height,
            Orientation::Horizontal => self.width,
        }
    }

    /// Default paddle placement for an edge, centered along it
    pub fn slot(&self, side: Side) -> PaddleSlot {
        let orientation = side.orientation();
        let (pos, size) = match side {
            Side::Left => (
                Vec2::new(PADDLE_NEAR_INSET, self.height / 2.0 - PADDLE_LENGTH / 2.0),
                Vec2::new(PADDLE_THICKNESS, PADDLE_LENGTH),
            ),
            Side::Right => (
                Vec2::new(self.width - PADDLE_FAR_INSET, self.height / 2.0 - PADDLE_LENGTH / 2.0),
                Vec2::new(PADDLE_THICKNESS, PADDLE_LENGTH),
            ),
            Side::Top => (
                Vec2::new(self.width / 2.0 - PADDLE_LENGTH / 2.0, PADDLE_NEAR_INSET),
                Vec2::new(PADDLE_LENGTH, PADDLE_THICKNESS),
            ),
            Side::Bottom => (
                Vec2::new(self.width / 2.0 - PADDLE_LENGTH / 2.0, self.height - PADDLE_FAR_INSET),
                Vec2::new(PADDLE_LENGTH, PADDLE_THICKNESS),
            ),
        };
        PaddleSlot {
            side,
            orientation,
            rect: Rect::new(pos, size),
        }
    }

    /// Whether a ball at `pos` has its leading edge past `side`
    pub fn crossed(&self, side: Side, pos: Vec2, radius: f32) -> bool {
        match side {
            Side::Left => pos.x - radius < 0.0,
            Side::Right => pos.x + radius > self.width,
            Side::Top => pos.y - radius < 0.0,
            Side::Bottom => pos.y + radius > self.height,
        }
    }

    /// Ball position pushed back so it rests against `side`
    pub fn clamp_to(&self, side: Side, pos: Vec2, radius: f32) -> Vec2 {
        match side {
            Side::Left => Vec2::new(radius, pos.y),
            Side::Right => Vec2::new(self.width - radius, pos.y),
            Side::Top => Vec2::new(pos.x, radius),
            Side::Bottom => Vec2::new(pos.x, self.height - radius),
        }
    }
}
