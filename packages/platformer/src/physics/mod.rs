//! Physics simulation system.
//!
//! Everything is an axis-aligned box, which keeps the collision logic small.
//! The gist is:
//!
//! - "Static bodies" are unmoveable boxes with a collision layer.
//! - "Bodies" are moving boxes with velocity, acceleration, a collision
//!   layer saying what they are and a collision mask saying what they react
//!   to.
//! - The `step` function drives every body forward by the current delta in a
//!   fixed number of sub-steps. Each sub-step sweeps the body's path against
//!   the boxes it reacts to (each grown by the mover's half size, so the
//!   sweep reduces to a ray cast), snaps it to the first hit, then pushes it
//!   out of anything it still overlaps.
//! - Gameplay reacts to contacts through a `HitListener` attached to the body
//!   at creation. Listeners get mutable access to the whole world context.

pub mod aa_box;
pub mod collision;
pub mod body;
pub mod listener;
pub mod engine;
pub mod step;


/// Physics system common re-exports.
pub mod prelude {
    pub use super::{
        aa_box::AaBox,
        collision::{
            Collision,
            HitKind,
            sweep_ray,
        },
        body::{
            Body,
            BodyData,
            StaticBody,
            LAYER_PLAYER,
            LAYER_ENEMY,
            LAYER_TERRAIN,
            LAYER_ENEMY_PASSTHROUGH,
            LAYER_PROJECTILE,
        },
        listener::{
            HitListener,
            Callbacks,
        },
        engine::{
            Physics,
            PhysicsCtx,
        },
        step::step,
    };
}
