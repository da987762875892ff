pub mod arena;
pub mod body;
pub mod c_api;
pub mod error;
pub mod simulation;
pub mod spring;
pub mod utils;

pub use arena::{Bodies, BodyHandle};
pub use body::{Attachment, Body, Shape};
pub use error::{Error, Result};
pub use simulation::{Simulation, step, step_ordered};
pub use spring::RodSpring;
pub use ultraviolet::Vec2;

/// Number of spatial dimensions. Units are seconds, meters and kilograms.
pub const DIMENSIONS: usize = 2;
