//! Index-addressed storage used by every registry in the engine.
//!
//! - `List` is a plain growable array with checked access.
//! - `Registry` layers soft deletion on top of a `List`: removing an entry
//!   just marks its slot inactive, so indexes other code is holding stay in
//!   bounds for the rest of the frame, and the next insert recycles the first
//!   inactive slot. Keys carry a generation so a key held across a recycle is
//!   detected as stale rather than silently aliasing the new entry.

mod error;
mod list;
mod registry;


pub use crate::{
    error::SlotError,
    list::List,
    registry::{
        Key,
        Registry,
    },
};
