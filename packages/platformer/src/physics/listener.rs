//! Gameplay hooks into collision resolution.

use super::collision::Collision;
use crate::handle::{
    BodyHandle,
    StaticBodyHandle,
};
use std::rc::Rc;


/// Receives a body's contacts as they are resolved.
///
/// `C` is the world context, handed over mutably so reactions can change
/// velocities, destroy entities and so on. Anything may be destroyed from in
/// here, including the body being resolved.
pub trait HitListener<C> {
    /// The body `this` hit another dynamic body.
    ///
    /// Called once for each sub-step in which a sweep runs into another
    /// body, and again for each body `this` overlaps after moving.
    fn on_hit(
        &self,
        ctx: &mut C,
        this: BodyHandle,
        collision: &Collision<BodyHandle>,
    ) {
        let _ = (ctx, this, collision);
    }

    /// The body `this` ran into a static body. Velocity along the normal has
    /// already been zeroed when this is called.
    fn on_static_hit(
        &self,
        ctx: &mut C,
        this: BodyHandle,
        collision: &Collision<StaticBodyHandle>,
    ) {
        let _ = (ctx, this, collision);
    }

    /// Whether to scan for overlapping bodies after each sub-step. The scan
    /// only exists to feed `on_hit`.
    fn wants_overlaps(&self) -> bool {
        true
    }
}

type OnHit<C> = Box<dyn Fn(&mut C, BodyHandle, &Collision<BodyHandle>)>;
type OnStaticHit<C> = Box<dyn Fn(&mut C, BodyHandle, &Collision<StaticBodyHandle>)>;

/// `HitListener` made of optional closures.
pub struct Callbacks<C> {
    on_hit: Option<OnHit<C>>,
    on_static_hit: Option<OnStaticHit<C>>,
}

impl<C: 'static> Callbacks<C> {
    pub fn new() -> Self {
        Callbacks {
            on_hit: None,
            on_static_hit: None,
        }
    }

    pub fn on_hit<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut C, BodyHandle, &Collision<BodyHandle>) + 'static,
    {
        self.on_hit = Some(Box::new(f));
        self
    }

    pub fn on_static_hit<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut C, BodyHandle, &Collision<StaticBodyHandle>) + 'static,
    {
        self.on_static_hit = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Rc<dyn HitListener<C>> {
        Rc::new(self)
    }
}

impl<C: 'static> Default for Callbacks<C> {
    fn default() -> Self {
        Callbacks::new()
    }
}

impl<C> HitListener<C> for Callbacks<C> {
    fn on_hit(
        &self,
        ctx: &mut C,
        this: BodyHandle,
        collision: &Collision<BodyHandle>,
    ) {
        if let Some(ref f) = self.on_hit {
            f(ctx, this, collision);
        }
    }

    fn on_static_hit(
        &self,
        ctx: &mut C,
        this: BodyHandle,
        collision: &Collision<StaticBodyHandle>,
    ) {
        if let Some(ref f) = self.on_static_hit {
            f(ctx, this, collision);
        }
    }

    fn wants_overlaps(&self) -> bool {
        self.on_hit.is_some()
    }
}
