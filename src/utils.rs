use crate::{body::Body, error::Result, simulation::Simulation, spring::RodSpring};
use ultraviolet::Vec2;

/// Builds a chain of `n` balls hanging below an anchor at the origin.
/// - Ball `i` sits `spacing * (i + 1)` below the anchor.
/// - Consecutive links (anchor to first ball included) are joined by springs
///   resting at `spacing`.
pub fn hanging_chain(n: usize, spacing: f32, stiffness: f32, dt: f32) -> Result<Simulation> {
    let mut sim = Simulation::with_params(dt);
    let mut prev = sim.add_body(Body::anchor(Vec2::zero()));

    for i in 0..n {
        let pos = Vec2::new(0.0, spacing * (i + 1) as f32);
        let ball = sim.add_body(Body::ball(pos, Vec2::zero(), Body::DEFAULT_MASS, Body::DEFAULT_RADIUS));
        sim.add_spring_with(RodSpring::with_rest_length(prev, ball, spacing).stiffness(stiffness))?;
        prev = ball;
    }

    Ok(sim)
}

/// Scatters `n` free balls over a square of side `extent` with random
/// velocities, each joined by a spring to the ball created before it.
/// Every eighth ball is attached to its predecessor instead.
pub fn uniform_scatter(n: usize, extent: f32, dt: f32) -> Result<Simulation> {
    fastrand::seed(0);
    let mut sim = Simulation::with_params(dt);
    let mut prev = None;

    for i in 0..n {
        let pos = Vec2::new(fastrand::f32(), fastrand::f32()) * extent;
        let vel = Vec2::new(fastrand::f32() - 0.5, fastrand::f32() - 0.5);
        let mass = 0.5 + fastrand::f32();
        let ball = sim.add_body(Body::ball(pos, vel, mass, mass.cbrt() * Body::DEFAULT_RADIUS));

        if let Some(prev) = prev {
            if i % 8 == 0 {
                sim.attach(ball, prev, "center")?;
            } else {
                sim.add_spring(prev, ball)?;
            }
        }
        prev = Some(ball);
    }

    Ok(sim)
}
