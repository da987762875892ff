use crate::{
    arena::BodyHandle,
    error::{Error, Result},
};
use ultraviolet::Vec2;

/// Shape tag of a body. Decides which named attach points the body offers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Immovable point. Offers "anchor" and "center".
    Anchor,
    /// Sphere represented by its center point.
    Ball { radius: f32 },
    /// Axis-aligned box centered on the body position.
    Box { width: f32, height: f32 },
}

impl Shape {
    const ANCHOR_POINTS: &'static [&'static str] = &["anchor", "center"];
    const BALL_POINTS: &'static [&'static str] = &["center"];
    const BOX_POINTS: &'static [&'static str] = &[
        "center",
        "top_left",
        "top_right",
        "bottom_left",
        "bottom_right",
    ];

    /// Name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Anchor => "Anchor",
            Shape::Ball { .. } => "Ball",
            Shape::Box { .. } => "Box",
        }
    }

    /// Names of every attach point this shape offers.
    pub fn attach_point_names(&self) -> &'static [&'static str] {
        match self {
            Shape::Anchor => Self::ANCHOR_POINTS,
            Shape::Ball { .. } => Self::BALL_POINTS,
            Shape::Box { .. } => Self::BOX_POINTS,
        }
    }

    /// Resolves the named attach point to world space for a body at `pos`.
    pub fn attach_point(&self, pos: Vec2, part: &str) -> Result<Vec2> {
        let point = match (self, part) {
            (Shape::Anchor, "anchor" | "center") => pos,
            (Shape::Ball { .. }, "center") => pos,
            (Shape::Box { width, height }, _) => {
                let hw = width / 2.0;
                let hh = height / 2.0;
                match part {
                    "center" => pos,
                    "top_left" => Vec2::new(pos.x - hw, pos.y - hh),
                    "top_right" => Vec2::new(pos.x + hw, pos.y - hh),
                    "bottom_left" => Vec2::new(pos.x - hw, pos.y + hh),
                    "bottom_right" => Vec2::new(pos.x + hw, pos.y + hh),
                    _ => return Err(self.unknown_point(part)),
                }
            }
            _ => return Err(self.unknown_point(part)),
        };
        Ok(point)
    }

    fn unknown_point(&self, part: &str) -> Error {
        Error::UnknownAttachPoint {
            kind: self.kind(),
            part: part.to_owned(),
        }
    }
}

/// Link from a body to the attach point it follows.
#[derive(Clone, Debug, PartialEq)]
pub struct Attachment {
    target: BodyHandle,
    part: String,
    offset: Vec2,
}

impl Attachment {
    /// The body being followed.
    pub fn target(&self) -> BodyHandle {
        self.target
    }

    /// Name of the attach point on the target. Empty names resolve as "center".
    pub fn part(&self) -> &str {
        if self.part.is_empty() {
            "center"
        } else {
            &self.part
        }
    }

    /// World-space lever arm from the target's attach point to the body,
    /// captured when the attachment was made.
    pub fn offset(&self) -> Vec2 {
        self.offset
    }
}

/// A point body that can be pushed by forces or attached to another body.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    /// Position vector.
    pub pos: Vec2,
    /// Velocity vector.
    pub vel: Vec2,
    /// Mass of the body. Values <= 0 ignore forces.
    pub mass: f32,
    /// When set, forces and integration leave the body in place.
    pub fixed: bool,
    /// Shape of the body.
    pub shape: Shape,
    attachment: Option<Attachment>,
    saved_fixed: Option<bool>,
}

impl Default for Body {
    fn default() -> Self {
        Self::ball(Vec2::zero(), Vec2::zero(), Self::DEFAULT_MASS, Self::DEFAULT_RADIUS)
    }
}

impl Body {
    pub const DEFAULT_MASS: f32 = 1.0;
    pub const DEFAULT_RADIUS: f32 = 0.1;
    pub const DEFAULT_BOX_SIZE: f32 = 1.0;

    /// Creates a free, non-fixed body.
    pub fn new(pos: Vec2, vel: Vec2, mass: f32, shape: Shape) -> Self {
        Self {
            pos,
            vel,
            mass,
            fixed: false,
            shape,
            attachment: None,
            saved_fixed: None,
        }
    }

    /// Creates an immovable anchor: infinite mass, zero velocity, fixed.
    pub fn anchor(pos: Vec2) -> Self {
        Self::new(pos, Vec2::zero(), f32::INFINITY, Shape::Anchor).with_fixed(true)
    }

    pub fn ball(pos: Vec2, vel: Vec2, mass: f32, radius: f32) -> Self {
        Self::new(pos, vel, mass, Shape::Ball { radius })
    }

    pub fn new_box(pos: Vec2, vel: Vec2, mass: f32, width: f32, height: f32) -> Self {
        Self::new(pos, vel, mass, Shape::Box { width, height })
    }

    /// Unit box at rest with the default mass.
    pub fn default_box(pos: Vec2) -> Self {
        Self::new_box(
            pos,
            Vec2::zero(),
            Self::DEFAULT_MASS,
            Self::DEFAULT_BOX_SIZE,
            Self::DEFAULT_BOX_SIZE,
        )
    }

    pub fn with_fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    /// Current attachment, if the body is following another body.
    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    /// The `fixed` value that a detach will restore.
    pub fn saved_fixed(&self) -> Option<bool> {
        self.saved_fixed
    }

    /// Resolves one of this body's named attach points to world space.
    pub fn attach_point(&self, part: &str) -> Result<Vec2> {
        self.shape.attach_point(self.pos, part)
    }

    /// Every attach point of this body with its current world position.
    pub fn attach_points(&self) -> impl Iterator<Item = (&'static str, Vec2)> + '_ {
        self.shape
            .attach_point_names()
            .iter()
            .filter_map(|&name| self.attach_point(name).ok().map(|p| (name, p)))
    }

    /// Accumulates `force` over `dt` into the velocity.
    /// Attached, fixed and massless bodies ignore forces.
    pub fn apply_force(&mut self, force: Vec2, dt: f32) {
        if self.is_attached() || self.fixed || self.mass <= 0.0 {
            return;
        }
        self.vel += force / self.mass * dt;
    }

    /// Explicit Euler step for a free body. Attached bodies move through
    /// [`Body::follow`] instead, so this leaves them untouched.
    pub fn integrate(&mut self, dt: f32) {
        if self.is_attached() || self.fixed {
            return;
        }
        self.pos += self.vel * dt;
    }

    /// Snaps an attached body onto `point + offset` and copies the target velocity.
    pub fn follow(&mut self, point: Vec2, target_vel: Vec2) {
        if let Some(attachment) = &self.attachment {
            self.pos = point + attachment.offset;
            self.vel = target_vel;
        }
    }

    /// Records the attachment to `target` whose attach point `part` currently sits at `point`.
    ///
    /// The current `fixed` value is saved even when the body is already attached,
    /// in which case the saved value is the forced `true` of the earlier attachment.
    pub(crate) fn begin_attachment(&mut self, target: BodyHandle, part: &str, point: Vec2) {
        self.saved_fixed = Some(self.fixed);
        self.attachment = Some(Attachment {
            target,
            part: part.to_owned(),
            offset: self.pos - point,
        });
        self.fixed = true;
    }

    /// Releases the attachment, inheriting `target_vel`. Returns the released
    /// attachment, or `None` when the body was free.
    pub(crate) fn end_attachment(&mut self, target_vel: Vec2) -> Option<Attachment> {
        let attachment = self.attachment.take()?;
        self.vel = target_vel;
        self.fixed = self.saved_fixed.take().unwrap_or(false);
        Some(attachment)
    }
}
