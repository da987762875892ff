use crate::{
    body::Body,
    error::{Error, Result},
};
use tracing::{debug, warn};
use ultraviolet::Vec2;

/// Generational index of a body inside [`Bodies`].
///
/// A handle outlives the body it names: once the body is removed every lookup
/// through the handle yields `None`, even after the slot is reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

impl BodyHandle {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Packs the handle into a single integer (generation in the high half).
    pub fn to_bits(self) -> u64 {
        (self.generation as u64) << 32 | self.index as u64
    }

    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// Arena owning every body of a simulation.
///
/// Attachments and springs refer to bodies through [`BodyHandle`]s, so a
/// target is always validated before it is read.
#[derive(Clone, Debug, Default)]
pub struct Bodies {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl Bodies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, body: Body) -> BodyHandle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            return BodyHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            body: Some(body),
        });
        BodyHandle {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.body.as_ref())
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.body.as_mut())
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Live bodies in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let handle = BodyHandle {
                index: index as u32,
                generation: slot.generation,
            };
            slot.body.as_ref().map(|body| (handle, body))
        })
    }

    /// Handles of the live bodies in slot order.
    pub fn handles(&self) -> Vec<BodyHandle> {
        self.iter().map(|(handle, _)| handle).collect()
    }

    /// Live handles ordered so that every target precedes the bodies following
    /// it. Bodies at the same attachment depth keep slot order.
    pub fn integration_order(&self) -> Vec<BodyHandle> {
        let mut order: Vec<_> = self.iter().map(|(handle, _)| (self.depth(handle), handle)).collect();
        order.sort_by_key(|&(depth, _)| depth);
        order.into_iter().map(|(_, handle)| handle).collect()
    }

    /// Bodies currently attached to `target`.
    pub fn followers(&self, target: BodyHandle) -> Vec<BodyHandle> {
        self.iter()
            .filter(|(_, body)| body.attachment().is_some_and(|a| a.target() == target))
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Removes a body. Every body following it is detached first and inherits
    /// the removed body's velocity, so no attachment is left dangling.
    pub fn remove(&mut self, handle: BodyHandle) -> Option<Body> {
        let vel = self.get(handle)?.vel;
        for follower in self.followers(handle) {
            if let Some(body) = self.get_mut(follower) {
                body.end_attachment(vel);
                debug!(?follower, target = ?handle, "detached follower of removed body");
            }
        }

        let slot = &mut self.slots[handle.index()];
        slot.generation = slot.generation.wrapping_add(1);
        let body = slot.body.take();
        self.free.push(handle.index);
        self.len -= 1;
        debug!(?handle, "removed body");
        body
    }

    /// Attaches `body` to the attach point `part` of `target`.
    ///
    /// The offset between the body and the attach point is captured now and
    /// kept until [`Bodies::detach`]. Attaching an already attached body
    /// replaces its attachment without detaching.
    pub fn attach(&mut self, body: BodyHandle, target: BodyHandle, part: &str) -> Result<()> {
        if !self.contains(body) {
            return Err(Error::UnknownBody(body));
        }
        let point = self
            .get(target)
            .ok_or(Error::InvalidTarget(target))?
            .attach_point(part)?;
        if self.reaches(target, body) {
            return Err(Error::CyclicAttachment { body, target });
        }

        let follower = self.get_mut(body).ok_or(Error::UnknownBody(body))?;
        follower.begin_attachment(target, part, point);
        debug!(?body, ?target, part, "attached");
        Ok(())
    }

    /// Attaches `body` to the center of `target`.
    pub fn attach_to(&mut self, body: BodyHandle, target: BodyHandle) -> Result<()> {
        self.attach(body, target, "center")
    }

    /// Releases `body` from its target. The body keeps the target's velocity at
    /// this instant and gets back the `fixed` value it had when attached.
    /// Detaching a free body does nothing.
    pub fn detach(&mut self, body: BodyHandle) -> Result<()> {
        let follower = self.get(body).ok_or(Error::UnknownBody(body))?;
        let Some(target) = follower.attachment().map(|a| a.target()) else {
            return Ok(());
        };
        let vel = match self.get(target) {
            Some(target) => target.vel,
            None => {
                warn!(?body, ?target, "attachment target is gone, keeping own velocity");
                follower.vel
            }
        };

        if let Some(follower) = self.get_mut(body) {
            follower.end_attachment(vel);
        }
        debug!(?body, ?target, "detached");
        Ok(())
    }

    pub fn detach_from(&mut self, body: BodyHandle) -> Result<()> {
        self.detach(body)
    }

    /// Pushes `force` into the body over `dt`. Unknown handles are ignored.
    pub fn apply_force(&mut self, handle: BodyHandle, force: Vec2, dt: f32) {
        if let Some(body) = self.get_mut(handle) {
            body.apply_force(force, dt);
        }
    }

    /// Advances one body by `dt`: free bodies move by Euler integration,
    /// attached bodies snap onto their target's attach point.
    pub fn integrate(&mut self, handle: BodyHandle, dt: f32) {
        let follow = match self.get(handle).map(Body::attachment) {
            None => return,
            Some(None) => None,
            Some(Some(attachment)) => {
                let target = attachment.target();
                let Some(target_body) = self.get(target) else {
                    warn!(?handle, ?target, "attachment target is gone, body left in place");
                    return;
                };
                let point = target_body
                    .attach_point(attachment.part())
                    .unwrap_or_else(|err| {
                        warn!(%err, ?handle, "falling back to target center");
                        target_body.pos
                    });
                Some((point, target_body.vel))
            }
        };

        let Some(body) = self.get_mut(handle) else {
            return;
        };
        match follow {
            Some((point, vel)) => body.follow(point, vel),
            None => body.integrate(dt),
        }
    }

    /// Number of attachment hops from `handle` to a free body.
    fn depth(&self, handle: BodyHandle) -> usize {
        let mut depth = 0;
        let mut current = handle;
        while let Some(attachment) = self.get(current).and_then(Body::attachment) {
            if depth > self.len {
                break;
            }
            depth += 1;
            current = attachment.target();
        }
        depth
    }

    /// Whether walking the attachment chain from `from` arrives at `to`.
    fn reaches(&self, from: BodyHandle, to: BodyHandle) -> bool {
        let mut current = from;
        for _ in 0..=self.len {
            if current == to {
                return true;
            }
            match self.get(current).and_then(Body::attachment) {
                Some(attachment) => current = attachment.target(),
                None => return false,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(x: f32, y: f32) -> Body {
        Body::ball(Vec2::new(x, y), Vec2::zero(), 1.0, 0.1)
    }

    #[test]
    fn handle_bits_round_trip() {
        let handle = BodyHandle {
            index: 7,
            generation: 3,
        };
        assert_eq!(handle.to_bits(), (3 << 32) | 7);
        assert_eq!(BodyHandle::from_bits(handle.to_bits()), handle);
    }

    #[test]
    fn removed_handles_go_stale() {
        let mut bodies = Bodies::new();
        let a = bodies.insert(ball(0.0, 0.0));
        let b = bodies.insert(ball(1.0, 0.0));
        assert_eq!(bodies.len(), 2);

        assert!(bodies.remove(a).is_some());
        assert!(bodies.get(a).is_none());
        assert!(bodies.remove(a).is_none());
        assert_eq!(bodies.len(), 1);

        let c = bodies.insert(ball(2.0, 0.0));
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert!(bodies.get(a).is_none());
        assert_eq!(bodies.get(c).unwrap().pos, Vec2::new(2.0, 0.0));
        assert_eq!(bodies.handles(), vec![c, b]);
    }

    #[test]
    fn integration_order_puts_targets_first() {
        let mut bodies = Bodies::new();
        let outer = bodies.insert(ball(0.0, 2.0));
        let inner = bodies.insert(ball(0.0, 1.0));
        let free = bodies.insert(ball(5.0, 0.0));
        let root = bodies.insert(ball(0.0, 0.0));
        bodies.attach_to(outer, inner).unwrap();
        bodies.attach_to(inner, root).unwrap();

        assert_eq!(bodies.integration_order(), vec![free, root, inner, outer]);
    }

    #[test]
    fn attach_to_missing_target_is_invalid() {
        let mut bodies = Bodies::new();
        let a = bodies.insert(ball(0.0, 0.0));
        let gone = bodies.insert(ball(1.0, 0.0));
        bodies.remove(gone);

        assert_eq!(bodies.attach(a, gone, "center"), Err(Error::InvalidTarget(gone)));
        assert!(!bodies.get(a).unwrap().is_attached());
        assert_eq!(bodies.attach(gone, a, "center"), Err(Error::UnknownBody(gone)));
    }

    #[test]
    fn attach_to_unknown_point_leaves_body_free() {
        let mut bodies = Bodies::new();
        let a = bodies.insert(ball(0.0, 0.0));
        let b = bodies.insert(ball(1.0, 0.0));

        let err = bodies.attach(a, b, "anchor").unwrap_err();
        assert!(matches!(err, Error::UnknownAttachPoint { kind: "Ball", .. }));
        let body = bodies.get(a).unwrap();
        assert!(!body.is_attached());
        assert!(!body.fixed);
        assert_eq!(body.saved_fixed(), None);
    }

    #[test]
    fn cycles_are_rejected() {
        let mut bodies = Bodies::new();
        let a = bodies.insert(ball(0.0, 0.0));
        let b = bodies.insert(ball(1.0, 0.0));
        let c = bodies.insert(ball(2.0, 0.0));

        assert_eq!(
            bodies.attach(a, a, "center"),
            Err(Error::CyclicAttachment { body: a, target: a })
        );

        bodies.attach(a, b, "center").unwrap();
        bodies.attach(b, c, "center").unwrap();
        assert_eq!(
            bodies.attach(c, a, "center"),
            Err(Error::CyclicAttachment { body: c, target: a })
        );
        assert!(!bodies.get(c).unwrap().is_attached());
    }

    #[test]
    fn removing_a_target_detaches_its_followers() {
        let mut bodies = Bodies::new();
        let target = bodies.insert(ball(0.0, 0.0));
        let first = bodies.insert(ball(1.0, 0.0));
        let second = bodies.insert(ball(0.0, 1.0).with_fixed(true));
        bodies.attach_to(first, target).unwrap();
        bodies.attach_to(second, target).unwrap();
        assert_eq!(bodies.followers(target), vec![first, second]);

        bodies.get_mut(target).unwrap().vel = Vec2::new(0.0, -2.0);
        bodies.remove(target);

        let first = bodies.get(first).unwrap();
        assert!(!first.is_attached());
        assert!(!first.fixed);
        assert_eq!(first.vel, Vec2::new(0.0, -2.0));
        let second = bodies.get(second).unwrap();
        assert!(!second.is_attached());
        assert!(second.fixed);
    }

    #[test]
    fn detach_free_body_is_a_no_op() {
        let mut bodies = Bodies::new();
        let a = bodies.insert(Body::ball(Vec2::zero(), Vec2::new(1.0, 0.0), 1.0, 0.1));
        bodies.detach(a).unwrap();
        assert_eq!(bodies.get(a).unwrap().vel, Vec2::new(1.0, 0.0));
        assert!(!bodies.get(a).unwrap().fixed);
    }

    #[test]
    fn attached_body_tracks_moving_target() {
        let mut bodies = Bodies::new();
        let target = bodies.insert(Body::new_box(Vec2::zero(), Vec2::new(1.0, 0.0), 1.0, 2.0, 2.0));
        let follower = bodies.insert(ball(-1.0, -3.0));
        bodies.attach(follower, target, "top_left").unwrap();
        assert_eq!(
            bodies.get(follower).unwrap().attachment().unwrap().offset(),
            Vec2::new(0.0, -2.0)
        );

        for _ in 0..4 {
            bodies.integrate(target, 0.5);
            bodies.integrate(follower, 0.5);
        }
        let follower = bodies.get(follower).unwrap();
        assert_eq!(follower.pos, Vec2::new(1.0, -3.0));
        assert_eq!(follower.vel, Vec2::new(1.0, 0.0));
    }
}
