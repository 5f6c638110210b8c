//! Physics body records.

use super::{
    aa_box::AaBox,
    listener::HitListener,
};
use crate::handle::EntityHandle;
use std::{
    fmt,
    rc::Rc,
};
use vek::*;


// Conventional collision layer bits. The engine itself treats layers and
// masks as opaque bitsets.
pub const LAYER_PLAYER: u8 = 1 << 0;
pub const LAYER_ENEMY: u8 = 1 << 1;
pub const LAYER_TERRAIN: u8 = 1 << 2;
pub const LAYER_ENEMY_PASSTHROUGH: u8 = 1 << 3;
pub const LAYER_PROJECTILE: u8 = 1 << 4;


/// Plain description of a body to create.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BodyData {
    /// Center position.
    pub pos: Vec2<f32>,
    /// Full width and height.
    pub size: Extent2<f32>,
    pub velocity: Vec2<f32>,
    pub acceleration: Vec2<f32>,
    /// Groups this body belongs to.
    pub layer: u8,
    /// Groups this body reacts to.
    pub mask: u8,
    /// Exempt from gravity.
    pub kinematic: bool,
}

impl BodyData {
    pub fn aa_box(&self) -> AaBox {
        AaBox::from_size(self.pos, self.size)
    }
}

impl Default for BodyData {
    fn default() -> Self {
        BodyData {
            pos: Vec2::zero(),
            size: Extent2::zero(),
            velocity: Vec2::zero(),
            acceleration: Vec2::zero(),
            layer: 0,
            mask: 0,
            kinematic: false,
        }
    }
}

/// Moving body.
pub struct Body<C> {
    pub aa_box: AaBox,
    pub velocity: Vec2<f32>,
    pub acceleration: Vec2<f32>,
    pub layer: u8,
    pub mask: u8,
    pub kinematic: bool,
    /// Entity this body belongs to, if any.
    pub entity: Option<EntityHandle>,
    pub(crate) listener: Option<Rc<dyn HitListener<C>>>,
}

impl<C> Body<C> {
    pub(crate) fn new(
        data: &BodyData,
        listener: Option<Rc<dyn HitListener<C>>>,
    ) -> Self {
        Body {
            aa_box: data.aa_box(),
            velocity: data.velocity,
            acceleration: data.acceleration,
            layer: data.layer,
            mask: data.mask,
            kinematic: data.kinematic,
            entity: None,
            listener,
        }
    }

    /// Would this body react to something on `layer`?
    pub fn reacts_to(&self, layer: u8) -> bool {
        self.mask & layer != 0
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }
}

impl<C> fmt::Debug for Body<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Body")
            .field("aa_box", &self.aa_box)
            .field("velocity", &self.velocity)
            .field("acceleration", &self.acceleration)
            .field("layer", &self.layer)
            .field("mask", &self.mask)
            .field("kinematic", &self.kinematic)
            .field("entity", &self.entity)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

/// Unmoving body.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StaticBody {
    pub aa_box: AaBox,
    pub layer: u8,
}

impl StaticBody {
    pub fn new(data: &BodyData) -> Self {
        StaticBody {
            aa_box: data.aa_box(),
            layer: data.layer,
        }
    }
}
