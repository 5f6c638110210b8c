//! Simulation core of a 2D platformer.
//!
//! An AABB physics engine with swept collision against static geometry and
//! other bodies, plus the entity, animation and timer registries that ride
//! on top of it. Everything is addressed by handle and owned by a `World`,
//! which is also the context gameplay callbacks receive when bodies collide.

#[macro_use]
extern crate tracing;

pub mod handle;
pub mod physics;
pub mod entity;
pub mod animation;
pub mod timer;
pub mod clock;
pub mod settings;
pub mod logging;
pub mod world;


pub mod prelude {
    pub use crate::{
        handle::{
            BodyHandle,
            StaticBodyHandle,
            EntityHandle,
            AnimationHandle,
            AnimationDefHandle,
            TimerHandle,
        },
        physics::prelude::*,
        entity::{
            Entity,
            EntityKind,
            Entities,
        },
        animation::{
            Animations,
            AnimationError,
            FrameRef,
            SpriteSheetId,
            MAX_FRAMES,
        },
        timer::Timers,
        clock::FrameClock,
        settings::{
            Settings,
            PhysicsSettings,
        },
        world::World,
    };
}
