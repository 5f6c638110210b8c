//! Sprite sheet animations.
//!
//! A definition is an immutable sequence of sprite sheet cells, each shown
//! for some duration. Any number of instances can play the same definition
//! independently. The renderer asks for an instance's current `FrameRef` and
//! does the drawing itself.

use crate::handle::{
    AnimationDefHandle,
    AnimationHandle,
};
use slots::{
    List,
    Registry,
};
use std::fmt::{self, Formatter, Display};


/// Maximum number of frames in one animation definition.
pub const MAX_FRAMES: usize = 16;

/// Opaque reference to a sprite sheet owned by the renderer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct SpriteSheetId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct AnimationFrame {
    /// Seconds the frame stays up.
    pub duration: f32,
    pub row: u8,
    pub col: u8,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AnimationDef {
    pub sheet: SpriteSheetId,
    frames: [AnimationFrame; MAX_FRAMES],
    frame_count: usize,
}

impl AnimationDef {
    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames[..self.frame_count]
    }
}

/// Playing instance of a definition.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Animation {
    pub def: AnimationDefHandle,
    pub frame_index: usize,
    /// Seconds until the current frame advances.
    pub time_left: f32,
    pub looping: bool,
    /// Draw mirrored horizontally.
    pub flipped: bool,
}

/// What the renderer needs to draw an animation's current frame.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct FrameRef {
    pub sheet: SpriteSheetId,
    pub row: u8,
    pub col: u8,
    pub flipped: bool,
}

/// Rejected animation definition.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum AnimationError {
    TooManyFrames {
        count: usize,
    },
    LengthMismatch {
        durations: usize,
        rows: usize,
        cols: usize,
    },
    NoFrames,
}

impl Display for AnimationError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            AnimationError::TooManyFrames { count } => write!(
                f, "{} frames exceeds maximum of {}", count, MAX_FRAMES,
            ),
            AnimationError::LengthMismatch { durations, rows, cols } => write!(
                f, "frame data length mismatch ({} durations, {} rows, {} cols)",
                durations, rows, cols,
            ),
            AnimationError::NoFrames => f.write_str("animation has no frames"),
        }
    }
}

impl std::error::Error for AnimationError {}

/// Animation definitions and instances.
#[derive(Debug, Default)]
pub struct Animations {
    defs: List<AnimationDef>,
    instances: Registry<Animation>,
}

impl Animations {
    pub fn new() -> Self {
        Animations {
            defs: List::new(),
            instances: Registry::new(),
        }
    }

    /// Define an animation from per-frame durations, rows and columns.
    pub fn def_create(
        &mut self,
        sheet: SpriteSheetId,
        durations: &[f32],
        rows: &[u8],
        cols: &[u8],
    ) -> Result<AnimationDefHandle, AnimationError> {
        let count = durations.len();
        if rows.len() != count || cols.len() != count {
            return Err(AnimationError::LengthMismatch {
                durations: count,
                rows: rows.len(),
                cols: cols.len(),
            });
        }
        if count == 0 {
            return Err(AnimationError::NoFrames);
        }
        if count > MAX_FRAMES {
            return Err(AnimationError::TooManyFrames { count });
        }

        let mut frames = [AnimationFrame::default(); MAX_FRAMES];
        for (i, frame) in frames[..count].iter_mut().enumerate() {
            *frame = AnimationFrame {
                duration: durations[i],
                row: rows[i],
                col: cols[i],
            };
        }
        let handle = AnimationDefHandle(self.defs.append(AnimationDef {
            sheet,
            frames,
            frame_count: count,
        }));
        debug!(index = handle.index(), frames = count, "created animation definition");
        Ok(handle)
    }

    /// Define an animation walking along one sprite sheet row, with every
    /// frame shown for the same duration.
    pub fn def_create_uniform(
        &mut self,
        sheet: SpriteSheetId,
        duration: f32,
        row: u8,
        cols: &[u8],
    ) -> Result<AnimationDefHandle, AnimationError> {
        let durations = vec![duration; cols.len()];
        let rows = vec![row; cols.len()];
        self.def_create(sheet, &durations, &rows, cols)
    }

    pub fn def(&self, handle: AnimationDefHandle) -> Option<&AnimationDef> {
        self.defs
            .get(handle.0)
            .map_err(|e| warn!("animation definition lookup failed: {}", e))
            .ok()
    }

    /// Start a new instance of a definition on its first frame.
    pub fn create(
        &mut self,
        def: AnimationDefHandle,
        looping: bool,
    ) -> Option<AnimationHandle> {
        let first = self.def(def)?.frames()[0];
        let handle = AnimationHandle(self.instances.insert(Animation {
            def,
            frame_index: 0,
            time_left: first.duration,
            looping,
            flipped: false,
        }));
        trace!(index = handle.index(), def = def.index(), "created animation");
        Some(handle)
    }

    /// Returns whether the instance was alive.
    pub fn destroy(&mut self, handle: AnimationHandle) -> bool {
        self.instances
            .deactivate(handle.0)
            .map_err(|e| warn!("cannot destroy animation: {}", e))
            .is_ok()
    }

    pub fn get(&self, handle: AnimationHandle) -> Option<&Animation> {
        self.instances
            .get(handle.0)
            .map_err(|e| warn!("animation lookup failed: {}", e))
            .ok()
    }

    pub fn get_mut(&mut self, handle: AnimationHandle) -> Option<&mut Animation> {
        self.instances
            .get_mut(handle.0)
            .map_err(|e| warn!("animation lookup failed: {}", e))
            .ok()
    }

    pub fn set_flipped(&mut self, handle: AnimationHandle, flipped: bool) {
        if let Some(animation) = self.get_mut(handle) {
            animation.flipped = flipped;
        }
    }

    /// Number of instance slots, including destroyed ones.
    pub fn count(&self) -> usize {
        self.instances.len()
    }

    /// Advance every live instance by `dt` seconds.
    ///
    /// An instance moves on by at most one frame per call, no matter how far
    /// `dt` overshoots the current frame. Past the last frame, looping
    /// instances wrap to the first and others stay on the last.
    pub fn update(&mut self, dt: f32) {
        let defs = &self.defs;
        for (_, animation) in self.instances.iter_mut() {
            let frames =
                match defs.get(animation.def.0) {
                    Ok(def) => def.frames(),
                    Err(_) => continue,
                };
            animation.time_left -= dt;
            if animation.time_left <= 0.0 {
                animation.frame_index += 1;
                if animation.frame_index >= frames.len() {
                    animation.frame_index =
                        if animation.looping { 0 } else { frames.len() - 1 };
                }
                animation.time_left = frames[animation.frame_index].duration;
            }
        }
    }

    /// Current frame of an instance, for drawing.
    pub fn frame(&self, handle: AnimationHandle) -> Option<FrameRef> {
        let animation = self.get(handle)?;
        let def = self.def(animation.def)?;
        let frame = def.frames().get(animation.frame_index)?;
        Some(FrameRef {
            sheet: def.sheet,
            row: frame.row,
            col: frame.col,
            flipped: animation.flipped,
        })
    }
}


#[cfg(test)]
fn three_frames(animations: &mut Animations) -> AnimationDefHandle {
    animations
        .def_create(SpriteSheetId(1), &[0.1, 0.2, 0.1], &[0, 0, 1], &[0, 1, 2])
        .unwrap()
}

#[test]
fn test_looping_update_steps_one_frame() {
    let mut animations = Animations::new();
    let def = three_frames(&mut animations);
    let anim = animations.create(def, true).unwrap();

    assert_eq!(animations.get(anim).unwrap().time_left, 0.1);

    animations.update(0.1);
    let state = animations.get(anim).unwrap();
    assert_eq!(state.frame_index, 1);
    assert_eq!(state.time_left, 0.2);

    // overshoots frame 1 by a lot, but only moves one frame
    animations.update(0.25);
    let state = animations.get(anim).unwrap();
    assert_eq!(state.frame_index, 2);
    assert_eq!(state.time_left, 0.1);

    animations.update(0.1);
    assert_eq!(animations.get(anim).unwrap().frame_index, 0);

    animations.update(0.05);
    let state = animations.get(anim).unwrap();
    assert_eq!(state.frame_index, 0);
    assert!((state.time_left - 0.05).abs() < 1e-6);
}

#[test]
fn test_non_looping_stays_on_last_frame() {
    let mut animations = Animations::new();
    let def = three_frames(&mut animations);
    let anim = animations.create(def, false).unwrap();
    for _ in 0..10 {
        animations.update(1.0);
    }
    let state = animations.get(anim).unwrap();
    assert_eq!(state.frame_index, 2);
    assert_eq!(
        animations.frame(anim),
        Some(FrameRef { sheet: SpriteSheetId(1), row: 1, col: 2, flipped: false }),
    );
}

#[test]
fn test_frame_ref_follows_flip() {
    let mut animations = Animations::new();
    let def = animations
        .def_create_uniform(SpriteSheetId(7), 0.05, 3, &[4, 5, 6, 7])
        .unwrap();
    let anim = animations.create(def, true).unwrap();
    animations.update(0.05);
    animations.set_flipped(anim, true);
    assert_eq!(
        animations.frame(anim),
        Some(FrameRef { sheet: SpriteSheetId(7), row: 3, col: 5, flipped: true }),
    );
    assert_eq!(animations.def(def).unwrap().frames().len(), 4);
}

#[test]
fn test_def_create_rejects_bad_frames() {
    let mut animations = Animations::new();
    let cols = [0; MAX_FRAMES + 1];
    assert_eq!(
        animations.def_create_uniform(SpriteSheetId(0), 0.1, 0, &cols),
        Err(AnimationError::TooManyFrames { count: MAX_FRAMES + 1 }),
    );
    assert!(animations
        .def_create_uniform(SpriteSheetId(0), 0.1, 0, &cols[..MAX_FRAMES])
        .is_ok());
    assert_eq!(
        animations.def_create(SpriteSheetId(0), &[0.1, 0.1], &[0], &[0, 1]),
        Err(AnimationError::LengthMismatch { durations: 2, rows: 1, cols: 2 }),
    );
    assert_eq!(
        animations.def_create(SpriteSheetId(0), &[], &[], &[]),
        Err(AnimationError::NoFrames),
    );
    assert!(animations.create(AnimationDefHandle(5), true).is_none());
}

#[test]
fn test_instances_reuse_slots() {
    let mut animations = Animations::new();
    let def = three_frames(&mut animations);
    let a = animations.create(def, true).unwrap();
    let b = animations.create(def, false).unwrap();

    animations.update(0.1);
    assert!(animations.destroy(a));
    assert!(!animations.destroy(a));
    animations.update(0.2);
    // destroyed instances are not advanced, live ones are
    assert_eq!(animations.get(b).unwrap().frame_index, 2);

    let c = animations.create(def, true).unwrap();
    assert_eq!(c.index(), a.index());
    assert_eq!(animations.get(c).unwrap().frame_index, 0);
    assert!(animations.get(a).is_none());
    assert!(animations.frame(a).is_none());
    assert_eq!(animations.count(), 2);
}

#[test]
fn test_frame_index_out_of_range() {
    let mut animations = Animations::new();
    let def = three_frames(&mut animations);
    let anim = animations.create(def, true).unwrap();

    animations.get_mut(anim).unwrap().frame_index = 40;
    assert_eq!(animations.frame(anim), None);

    // running out the current frame wraps back to the start
    animations.update(1.0);
    let state = animations.get(anim).unwrap();
    assert_eq!(state.frame_index, 0);
    assert_eq!(state.time_left, 0.1);
    assert_eq!(animations.frame(anim).map(|frame| frame.col), Some(0));
}
