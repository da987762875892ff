use crate::{
    arena::BodyHandle,
    body::Body,
    error::{Error, Result},
    simulation::Simulation,
    spring::RodSpring,
};
use std::{
    borrow::Cow,
    ffi::{CStr, c_char},
};
use ultraviolet::Vec2;

/// Status codes returned by the attachment and spring calls.
pub const STATUS_OK: i32 = 0;
pub const STATUS_INVALID_TARGET: i32 = 1;
pub const STATUS_UNKNOWN_ATTACH_POINT: i32 = 2;
pub const STATUS_CYCLIC_ATTACHMENT: i32 = 3;
pub const STATUS_UNKNOWN_BODY: i32 = 4;
pub const STATUS_NULL_HANDLE: i32 = -1;

fn status(result: Result<()>) -> i32 {
    match result {
        Ok(()) => STATUS_OK,
        Err(Error::InvalidTarget(_)) => STATUS_INVALID_TARGET,
        Err(Error::UnknownAttachPoint { .. }) => STATUS_UNKNOWN_ATTACH_POINT,
        Err(Error::CyclicAttachment { .. }) => STATUS_CYCLIC_ATTACHMENT,
        Err(Error::UnknownBody(_)) => STATUS_UNKNOWN_BODY,
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Create(dt: f32) -> *mut Simulation {
    Box::into_raw(Box::new(Simulation::with_params(dt)))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Destroy(handle: *mut Simulation) {
    if !handle.is_null() {
        unsafe { drop(Box::from_raw(handle)) };
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Step(handle: *mut Simulation) {
    if let Some(sim) = unsafe { handle.as_mut() } {
        sim.step();
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Reset(handle: *mut Simulation) {
    if let Some(sim) = unsafe { handle.as_mut() } {
        sim.reset();
    }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_GetBodyCount(handle: *const Simulation) -> usize {
    unsafe { handle.as_ref() }.map_or(0, |sim| sim.bodies.len())
}

unsafe fn add_body(handle: *mut Simulation, body: Body) -> u64 {
    unsafe { handle.as_mut() }.map_or(u64::MAX, |sim| sim.add_body(body).to_bits())
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_AddAnchor(handle: *mut Simulation, x: f32, y: f32) -> u64 {
    unsafe { add_body(handle, Body::anchor(Vec2::new(x, y))) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_AddBall(
    handle: *mut Simulation,
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    mass: f32,
    radius: f32,
) -> u64 {
    let body = Body::ball(Vec2::new(x, y), Vec2::new(vx, vy), mass, radius);
    unsafe { add_body(handle, body) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_AddBox(
    handle: *mut Simulation,
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    mass: f32,
    width: f32,
    height: f32,
) -> u64 {
    let body = Body::new_box(Vec2::new(x, y), Vec2::new(vx, vy), mass, width, height);
    unsafe { add_body(handle, body) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_AddSpring(
    handle: *mut Simulation,
    a: u64,
    b: u64,
    stiffness: f32,
    damping: f32,
) -> i32 {
    let Some(sim) = (unsafe { handle.as_mut() }) else {
        return STATUS_NULL_HANDLE;
    };
    let (a, b) = (BodyHandle::from_bits(a), BodyHandle::from_bits(b));
    let added = RodSpring::new(&sim.bodies, a, b)
        .and_then(|spring| sim.add_spring_with(spring.stiffness(stiffness).damping(damping)));
    status(added.map(|_| ()))
}

/// `part` may be null, which selects the target's "center".
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Attach(
    handle: *mut Simulation,
    body: u64,
    target: u64,
    part: *const c_char,
) -> i32 {
    let Some(sim) = (unsafe { handle.as_mut() }) else {
        return STATUS_NULL_HANDLE;
    };
    let part = if part.is_null() {
        Cow::Borrowed("center")
    } else {
        unsafe { CStr::from_ptr(part) }.to_string_lossy()
    };
    status(sim.attach(BodyHandle::from_bits(body), BodyHandle::from_bits(target), &part))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_Detach(handle: *mut Simulation, body: u64) -> i32 {
    let Some(sim) = (unsafe { handle.as_mut() }) else {
        return STATUS_NULL_HANDLE;
    };
    status(sim.detach(BodyHandle::from_bits(body)))
}

/// Writes the body position into `out` (two floats). Returns false for unknown bodies.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_GetPosition(handle: *const Simulation, body: u64, out: *mut f32) -> bool {
    unsafe { write_vec(handle, body, out, |b| b.pos) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Simulation_GetVelocity(handle: *const Simulation, body: u64, out: *mut f32) -> bool {
    unsafe { write_vec(handle, body, out, |b| b.vel) }
}

unsafe fn write_vec(handle: *const Simulation, body: u64, out: *mut f32, f: impl Fn(&Body) -> Vec2) -> bool {
    if out.is_null() {
        return false;
    }
    let Some(body) = unsafe { handle.as_ref() }.and_then(|sim| sim.body(BodyHandle::from_bits(body))) else {
        return false;
    };
    let v = f(body);
    unsafe {
        out.write(v.x);
        out.add(1).write(v.y);
    }
    true
}
