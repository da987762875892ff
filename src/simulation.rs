use crate::{
    arena::{Bodies, BodyHandle},
    body::Body,
    error::{Error, Result},
    spring::RodSpring,
};

use tracing::{debug, trace};

/// Advances `bodies` by `dt`.
///
/// All spring forces are applied before any body is integrated. Targets are
/// integrated before their followers, so an attached body always lands on the
/// attach point of the current step. Attached bodies take their velocity from
/// their target, so forces pushed into them by springs never take effect.
pub fn step(bodies: &mut Bodies, springs: &[RodSpring], dt: f32) {
    let order = bodies.integration_order();
    step_ordered(bodies, &order, springs, dt);
}

/// Like [`step`], but integrates the bodies listed in `order`, in that order.
/// Bodies missing from `order` keep their state apart from spring forces.
pub fn step_ordered(bodies: &mut Bodies, order: &[BodyHandle], springs: &[RodSpring], dt: f32) {
    for spring in springs {
        spring.apply(bodies, dt);
    }

    for &handle in order {
        bodies.integrate(handle, dt);
    }
}

/// Owns a set of bodies and springs and steps them with a fixed time step.
#[derive(Clone, Debug)]
pub struct Simulation {
    /// Time step per frame, in seconds.
    pub dt: f32,
    /// Current frame count.
    pub frame: usize,
    /// Collection of all bodies in the simulation.
    pub bodies: Bodies,
    /// Springs applied at the start of every step, in order.
    pub springs: Vec<RodSpring>,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulation {
    /// Default constants.
    pub const DEFAULT_DT: f32 = 1e-6;

    /// Initializes an empty simulation with the default time step.
    pub fn new() -> Self {
        Self::with_params(Self::DEFAULT_DT)
    }

    /// Initializes an empty simulation with a custom time step.
    pub fn with_params(dt: f32) -> Self {
        Self::with_bodies(Bodies::new(), Vec::new(), dt)
    }

    /// Initializes a simulation from prepared bodies and springs.
    pub fn with_bodies(bodies: Bodies, springs: Vec<RodSpring>, dt: f32) -> Self {
        Self {
            dt,
            frame: 0,
            bodies,
            springs,
        }
    }

    pub fn set_dt(&mut self, dt: f32) {
        self.dt = dt;
    }

    /// Drops every body and spring and rewinds the frame counter.
    pub fn reset(&mut self) {
        self.bodies = Bodies::new();
        self.springs.clear();
        self.frame = 0;
    }

    pub fn add_body(&mut self, body: Body) -> BodyHandle {
        self.bodies.insert(body)
    }

    /// Removes a body along with every spring that references it.
    /// Bodies attached to it are detached first.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<Body> {
        let body = self.bodies.remove(handle)?;
        let before = self.springs.len();
        self.springs.retain(|spring| !spring.involves(handle));
        debug!(?handle, dropped_springs = before - self.springs.len(), "removed body from simulation");
        Some(body)
    }

    /// Connects two bodies with a default spring resting at their current distance.
    /// Returns the index of the spring.
    pub fn add_spring(&mut self, a: BodyHandle, b: BodyHandle) -> Result<usize> {
        let spring = RodSpring::new(&self.bodies, a, b)?;
        self.add_spring_with(spring)
    }

    /// Adds a prepared spring. Both ends must be live bodies.
    pub fn add_spring_with(&mut self, spring: RodSpring) -> Result<usize> {
        for end in [spring.a, spring.b] {
            if !self.bodies.contains(end) {
                return Err(Error::UnknownBody(end));
            }
        }
        self.springs.push(spring);
        Ok(self.springs.len() - 1)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle)
    }

    pub fn attach(&mut self, body: BodyHandle, target: BodyHandle, part: &str) -> Result<()> {
        self.bodies.attach(body, target, part)
    }

    pub fn detach(&mut self, body: BodyHandle) -> Result<()> {
        self.bodies.detach(body)
    }

    /// Advances the simulation by one step of `dt`.
    pub fn step(&mut self) {
        trace!(frame = self.frame, dt = self.dt, bodies = self.bodies.len(), "step");
        step(&mut self.bodies, &self.springs, self.dt);
        self.frame += 1;
    }
}
