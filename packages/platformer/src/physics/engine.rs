//! Body and static body registries.

use super::{
    aa_box::AaBox,
    body::{
        Body,
        BodyData,
        StaticBody,
    },
    listener::HitListener,
};
use crate::{
    handle::{
        BodyHandle,
        StaticBodyHandle,
        EntityHandle,
    },
    settings::PhysicsSettings,
};
use slots::Registry;
use std::rc::Rc;
use vek::*;


/// World context which owns a `Physics` and is handed to hit listeners.
pub trait PhysicsCtx: Sized {
    fn physics(&self) -> &Physics<Self>;

    fn physics_mut(&mut self) -> &mut Physics<Self>;
}

/// Physics state: every dynamic and static body, the settings, and the delta
/// time the next step will advance by.
pub struct Physics<C> {
    pub(crate) bodies: Registry<Body<C>>,
    pub(crate) static_bodies: Registry<StaticBody>,
    pub(crate) settings: PhysicsSettings,
    pub(crate) delta: f32,
}

impl<C> Physics<C> {
    pub fn new(settings: PhysicsSettings) -> Self {
        Physics {
            bodies: Registry::new(),
            static_bodies: Registry::new(),
            settings,
            delta: 0.0,
        }
    }

    pub fn settings(&self) -> &PhysicsSettings {
        &self.settings
    }

    /// Set the time, in seconds, the next `step` will advance by.
    pub fn set_delta(&mut self, delta: f32) {
        self.delta = delta;
    }

    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Create a dynamic body, recycling the first destroyed slot if any.
    pub fn create_body(
        &mut self,
        data: &BodyData,
        listener: Option<Rc<dyn HitListener<C>>>,
    ) -> BodyHandle {
        let handle = BodyHandle(self.bodies.insert(Body::new(data, listener)));
        debug!(index = handle.index(), "created body");
        handle
    }

    /// Create a trigger: a kinematic body which never moves on its own and
    /// only exists to report bodies on `mask` overlapping it.
    pub fn create_trigger<P, S>(
        &mut self,
        pos: P,
        size: S,
        layer: u8,
        mask: u8,
        listener: Rc<dyn HitListener<C>>,
    ) -> BodyHandle
    where
        P: Into<Vec2<f32>>,
        S: Into<Extent2<f32>>,
    {
        let data = BodyData {
            pos: pos.into(),
            size: size.into(),
            layer,
            mask,
            kinematic: true,
            ..Default::default()
        };
        self.create_body(&data, Some(listener))
    }

    pub fn create_static_body(&mut self, data: &BodyData) -> StaticBodyHandle {
        let handle = StaticBodyHandle(self.static_bodies.insert(StaticBody::new(data)));
        debug!(index = handle.index(), "created static body");
        handle
    }

    /// Look up a body. Logs and returns `None` if the handle is dead.
    pub fn body(&self, handle: BodyHandle) -> Option<&Body<C>> {
        self.bodies
            .get(handle.0)
            .map_err(|e| warn!("body lookup failed: {}", e))
            .ok()
    }

    /// Look up a body mutably. Logs and returns `None` if the handle is dead.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body<C>> {
        self.bodies
            .get_mut(handle.0)
            .map_err(|e| warn!("body lookup failed: {}", e))
            .ok()
    }

    /// Look up a static body. Logs and returns `None` if the handle is dead.
    pub fn static_body(&self, handle: StaticBodyHandle) -> Option<&StaticBody> {
        self.static_bodies
            .get(handle.0)
            .map_err(|e| warn!("static body lookup failed: {}", e))
            .ok()
    }

    /// Whether `handle` still refers to a live body.
    pub fn is_alive(&self, handle: BodyHandle) -> bool {
        self.bodies.contains(handle.0)
    }

    /// Destroy a body. Its slot stays allocated until a later create reuses
    /// it. Returns whether the body was alive.
    pub fn destroy_body(&mut self, handle: BodyHandle) -> bool {
        match self.bodies.deactivate(handle.0) {
            Ok(()) => {
                debug!(index = handle.index(), "destroyed body");
                true
            }
            Err(e) => {
                warn!("cannot destroy body: {}", e);
                false
            }
        }
    }

    pub fn destroy_static_body(&mut self, handle: StaticBodyHandle) -> bool {
        match self.static_bodies.deactivate(handle.0) {
            Ok(()) => true,
            Err(e) => {
                warn!("cannot destroy static body: {}", e);
                false
            }
        }
    }

    pub(crate) fn set_body_entity(
        &mut self,
        handle: BodyHandle,
        entity: Option<EntityHandle>,
    ) {
        if let Some(body) = self.body_mut(handle) {
            body.entity = entity;
        }
    }

    /// Number of body slots, including destroyed ones.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Number of static body slots, including destroyed ones.
    pub fn static_body_count(&self) -> usize {
        self.static_bodies.len()
    }

    /// Live bodies in creation-slot order.
    pub fn bodies(&self) -> impl Iterator<Item=(BodyHandle, &Body<C>)> + '_ {
        self.bodies
            .iter()
            .map(|(key, body)| (BodyHandle(key), body))
    }

    /// Live static bodies in creation-slot order.
    pub fn static_bodies(&self) -> impl Iterator<Item=(StaticBodyHandle, &StaticBody)> + '_ {
        self.static_bodies
            .iter()
            .map(|(key, body)| (StaticBodyHandle(key), body))
    }

    /// Push the body out of every static body on its mask it overlaps.
    pub(crate) fn depenetrate(&mut self, handle: BodyHandle) {
        let body =
            match self.bodies.get_mut(handle.0) {
                Ok(body) => body,
                Err(_) => return,
            };
        for (_, static_body) in self.static_bodies.iter() {
            if !body.reacts_to(static_body.layer) {
                continue;
            }
            let diff = static_body.aa_box.minkowski_diff(body.aa_box);
            if diff.contains(Vec2::zero()) {
                let pen = diff.penetration_vector();
                trace!(index = handle.index(), ?pen, "depenetrating body");
                body.aa_box.pos += pen;
            }
        }
    }

    /// Box and mask of a live body, without logging on failure.
    pub(crate) fn sweep_params(&self, handle: BodyHandle) -> Option<(AaBox, u8)> {
        self.bodies
            .get(handle.0)
            .ok()
            .map(|body| (body.aa_box, body.mask))
    }

    pub(crate) fn listener(&self, handle: BodyHandle) -> Option<Rc<dyn HitListener<C>>> {
        self.bodies
            .get(handle.0)
            .ok()
            .and_then(|body| body.listener.clone())
    }
}
