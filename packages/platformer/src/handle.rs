//! Typed handles into the engine's registries.
//!
//! Handles are weak: they do not keep their target alive, and lookups
//! through a handle whose target was destroyed (or whose slot has since been
//! recycled) fail instead of returning the wrong record.

use slots::Key;


macro_rules! key_handle {
    ($(
        $(#[$attr:meta])*
        $name:ident,
    )*)=>{$(
        $(#[$attr])*
        #[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
        pub struct $name(pub(crate) Key);

        impl $name {
            /// Slot index. Stable for the lifetime of the target.
            pub fn index(self) -> usize {
                self.0.index()
            }
        }
    )*};
}

key_handle!(
    /// Dynamic physics body.
    BodyHandle,
    /// Static physics body.
    StaticBodyHandle,
    /// Entity.
    EntityHandle,
    /// Animation instance.
    AnimationHandle,
);

/// Animation definition. Definitions are never destroyed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct AnimationDefHandle(pub(crate) usize);

impl AnimationDefHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Timer. Keys are recycled without a generation check.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TimerHandle(pub(crate) usize);
