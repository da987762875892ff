use crate::{
    arena::{Bodies, BodyHandle},
    error::{Error, Result},
};
use tracing::{debug, warn};
use ultraviolet::Vec2;

/// Damped Hookean spring (or stiff rod) between two bodies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RodSpring {
    pub a: BodyHandle,
    pub b: BodyHandle,
    /// Separation at which the spring exerts no restoring force.
    pub rest_length: f32,
    /// Spring constant in N/m.
    pub stiffness: f32,
    /// Damping of the relative velocity along the spring axis.
    pub damping: f32,
}

impl RodSpring {
    pub const DEFAULT_STIFFNESS: f32 = 100.0;
    pub const DEFAULT_DAMPING: f32 = 0.0;

    /// Connects `a` and `b` with the default stiffness and no damping.
    /// The rest length is their current separation.
    pub fn new(bodies: &Bodies, a: BodyHandle, b: BodyHandle) -> Result<Self> {
        let a_pos = bodies.get(a).ok_or(Error::UnknownBody(a))?.pos;
        let b_pos = bodies.get(b).ok_or(Error::UnknownBody(b))?.pos;
        let rest_length = (b_pos - a_pos).mag();
        debug!(?a, ?b, rest_length, "created spring");
        Ok(Self::with_rest_length(a, b, rest_length))
    }

    pub fn with_rest_length(a: BodyHandle, b: BodyHandle, rest_length: f32) -> Self {
        Self {
            a,
            b,
            rest_length,
            stiffness: Self::DEFAULT_STIFFNESS,
            damping: Self::DEFAULT_DAMPING,
        }
    }

    pub fn stiffness(mut self, stiffness: f32) -> Self {
        self.stiffness = stiffness;
        self
    }

    pub fn damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    pub fn involves(&self, body: BodyHandle) -> bool {
        self.a == body || self.b == body
    }

    /// Force exerted on `b` (the force on `a` is its negation), or `None`
    /// when the bodies coincide and the spring has no direction.
    pub fn force(&self, a_pos: Vec2, a_vel: Vec2, b_pos: Vec2, b_vel: Vec2) -> Option<Vec2> {
        let delta = b_pos - a_pos;
        let dist = delta.mag();
        if dist == 0.0 {
            return None;
        }

        let dir = delta / dist;
        let stretch = dist - self.rest_length;
        let spring = -self.stiffness * stretch;
        let damping = -self.damping * (b_vel - a_vel).dot(dir);
        Some(dir * (spring + damping))
    }

    /// Applies equal and opposite forces to both bodies over `dt`.
    /// Fixed or attached bodies absorb their share without moving.
    pub fn apply(&self, bodies: &mut Bodies, dt: f32) {
        let (Some(a), Some(b)) = (bodies.get(self.a), bodies.get(self.b)) else {
            warn!(a = ?self.a, b = ?self.b, "spring references a removed body, skipping");
            return;
        };
        let Some(force) = self.force(a.pos, a.vel, b.pos, b.vel) else {
            return;
        };

        bodies.apply_force(self.a, -force, dt);
        bodies.apply_force(self.b, force, dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Body;

    fn pair(a: Vec2, b: Vec2) -> (Bodies, BodyHandle, BodyHandle) {
        let mut bodies = Bodies::new();
        let ha = bodies.insert(Body::ball(a, Vec2::zero(), 1.0, 0.1));
        let hb = bodies.insert(Body::ball(b, Vec2::zero(), 1.0, 0.1));
        (bodies, ha, hb)
    }

    #[test]
    fn rest_length_defaults_to_initial_distance() {
        let (bodies, a, b) = pair(Vec2::zero(), Vec2::new(3.0, 4.0));
        let spring = RodSpring::new(&bodies, a, b).unwrap();
        assert_eq!(spring.rest_length, 5.0);
        assert_eq!(spring.stiffness, RodSpring::DEFAULT_STIFFNESS);
        assert_eq!(spring.damping, RodSpring::DEFAULT_DAMPING);
    }

    #[test]
    fn spring_on_a_removed_body_is_refused() {
        let (mut bodies, a, b) = pair(Vec2::zero(), Vec2::new(1.0, 0.0));
        bodies.remove(b);
        assert_eq!(RodSpring::new(&bodies, a, b), Err(Error::UnknownBody(b)));
        assert_eq!(RodSpring::new(&bodies, b, a), Err(Error::UnknownBody(b)));
    }

    #[test]
    fn stretched_spring_pulls_together() {
        let spring = RodSpring::with_rest_length(BodyHandle::from_bits(0), BodyHandle::from_bits(1), 1.0)
            .stiffness(10.0);
        let force = spring
            .force(Vec2::zero(), Vec2::zero(), Vec2::new(2.0, 0.0), Vec2::zero())
            .unwrap();
        assert_eq!(force, Vec2::new(-10.0, 0.0));
    }

    #[test]
    fn compressed_spring_pushes_apart() {
        let (mut bodies, a, b) = pair(Vec2::zero(), Vec2::new(0.0, 0.5));
        let spring = RodSpring::with_rest_length(a, b, 1.0).stiffness(4.0);
        spring.apply(&mut bodies, 1.0);
        assert_eq!(bodies.get(a).unwrap().vel, Vec2::new(0.0, -2.0));
        assert_eq!(bodies.get(b).unwrap().vel, Vec2::new(0.0, 2.0));
    }

    #[test]
    fn damping_opposes_separation_speed() {
        let spring = RodSpring::with_rest_length(BodyHandle::from_bits(0), BodyHandle::from_bits(1), 1.0)
            .stiffness(0.0)
            .damping(2.0);
        let force = spring
            .force(Vec2::zero(), Vec2::zero(), Vec2::new(1.0, 0.0), Vec2::new(3.0, 5.0))
            .unwrap();
        assert_eq!(force, Vec2::new(-6.0, 0.0));
    }

    #[test]
    fn coincident_bodies_feel_no_force() {
        let (mut bodies, a, b) = pair(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0));
        let spring = RodSpring::with_rest_length(a, b, 1.0);
        assert!(spring.force(Vec2::new(1.0, 1.0), Vec2::zero(), Vec2::new(1.0, 1.0), Vec2::zero()).is_none());
        spring.apply(&mut bodies, 1.0);
        assert_eq!(bodies.get(a).unwrap().vel, Vec2::zero());
        assert_eq!(bodies.get(b).unwrap().vel, Vec2::zero());
    }

    #[test]
    fn fixed_end_absorbs_force() {
        let mut bodies = Bodies::new();
        let anchor = bodies.insert(Body::anchor(Vec2::zero()));
        let ball = bodies.insert(Body::ball(Vec2::new(2.0, 0.0), Vec2::zero(), 1.0, 0.1));
        let spring = RodSpring::with_rest_length(anchor, ball, 1.0).stiffness(1.0);
        spring.apply(&mut bodies, 1.0);
        assert_eq!(bodies.get(anchor).unwrap().vel, Vec2::zero());
        assert_eq!(bodies.get(ball).unwrap().vel, Vec2::new(-1.0, 0.0));
    }
}
