//! Swept collision tests.

use super::aa_box::AaBox;
use vek::*;


/// How a contact was found.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum HitKind {
    /// Sweeping the mover along its displacement ran into the other box.
    Sweep,
    /// The mover already overlapped (or touched) the other box after
    /// moving. Overlap contacts carry a time of 0 and a zero normal.
    Overlap,
}

/// Contact between a moving box and some other box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Collision<I> {
    /// Fraction of the swept displacement travelled before contact, in
    /// `[0, 1]`.
    pub time: f32,
    /// Mover center position at the moment of contact.
    pub pos: Vec2<f32>,
    /// Surface normal of the box that was hit. Exactly one component is
    /// non-zero for sweep contacts, and it is `1` or `-1`.
    pub normal: Vec2<f32>,
    /// Identifier of the box that was hit.
    pub other: I,
    pub kind: HitKind,
}

impl<I> Collision<I> {
    /// Replace the identifier of the box that was hit.
    pub fn with_other<J>(self, other: J) -> Collision<J> {
        Collision {
            time: self.time,
            pos: self.pos,
            normal: self.normal,
            other,
            kind: self.kind,
        }
    }
}

/// Cast a ray from `origin` along `displacement` against `target`, using the
/// slab method.
///
/// To sweep a box rather than a point, grow `target` by the box's half size
/// first (see `AaBox::expand_by`). A ray which starts on the boundary of
/// `target` and runs parallel to it does not hit. A zero displacement never
/// hits; resting contact is handled by overlap tests instead.
pub fn sweep_ray(
    origin: Vec2<f32>,
    displacement: Vec2<f32>,
    target: AaBox,
) -> Option<Collision<()>> {
    if displacement == Vec2::zero() {
        return None;
    }

    let (min, max) = target.min_max();

    let mut last_entry = f32::NEG_INFINITY;
    let mut first_exit = f32::INFINITY;

    for i in 0..2 {
        if displacement[i] != 0.0 {
            let t1 = (min[i] - origin[i]) / displacement[i];
            let t2 = (max[i] - origin[i]) / displacement[i];
            last_entry = last_entry.max(t1.min(t2));
            first_exit = first_exit.min(t1.max(t2));
        } else if origin[i] <= min[i] || origin[i] >= max[i] {
            // parallel to and outside of this slab
            return None;
        }
    }

    if !(first_exit > last_entry && first_exit > 0.0 && last_entry < 1.0) {
        return None;
    }

    // an origin already inside the target (up to rounding) enters at 0
    let time = last_entry.max(0.0);
    let pos = origin + displacement * time;

    // the normal is on whichever axis the hit point is least deep into
    let offset = pos - target.pos;
    let depth = Vec2::<f32>::from(target.half) - offset.map(f32::abs);
    let normal =
        if depth.x < depth.y {
            Vec2::new(sign(offset.x), 0.0)
        } else {
            Vec2::new(0.0, sign(offset.y))
        };

    Some(Collision {
        time,
        pos,
        normal,
        other: (),
        kind: HitKind::Sweep,
    })
}

fn sign(n: f32) -> f32 {
    if n > 0.0 {
        1.0
    } else if n < 0.0 {
        -1.0
    } else {
        0.0
    }
}


#[test]
fn test_sweep_hits_from_above() {
    let target = AaBox::new([0.0, 0.0], [10.0, 10.0]);
    let hit = sweep_ray(
        Vec2::new(0.0, 20.0),
        Vec2::new(0.0, -20.0),
        target,
    ).unwrap();
    assert_eq!(hit.time, 0.5);
    assert_eq!(hit.pos, Vec2::new(0.0, 10.0));
    assert_eq!(hit.normal, Vec2::new(0.0, 1.0));
    assert_eq!(hit.kind, HitKind::Sweep);
}

#[test]
fn test_sweep_hits_from_side() {
    let target = AaBox::new([0.0, 0.0], [10.0, 10.0]);
    let hit = sweep_ray(
        Vec2::new(-30.0, 2.0),
        Vec2::new(40.0, 0.0),
        target,
    ).unwrap();
    assert_eq!(hit.time, 0.5);
    assert_eq!(hit.pos, Vec2::new(-10.0, 2.0));
    assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
}

#[test]
fn test_sweep_entering_target_has_unit_normal() {
    let target = AaBox::new([5.0, -3.0], [4.0, 2.5]);
    let origins = [
        Vec2::new(-2.0, -3.0),
        Vec2::new(5.0, 4.0),
        Vec2::new(12.0, -4.0),
        Vec2::new(6.0, -9.0),
        Vec2::new(-1.0, 1.0),
    ];
    for origin in origins {
        let displacement = (target.pos - origin) * 0.9;
        let hit = sweep_ray(origin, displacement, target)
            .unwrap_or_else(|| panic!("no hit from {:?}", origin));
        assert!(hit.time > 0.0 && hit.time <= 1.0, "{:?}", hit);
        let nonzero = (0..2).filter(|&i| hit.normal[i] != 0.0).count();
        assert_eq!(nonzero, 1, "{:?}", hit);
        assert_eq!(hit.normal.map(f32::abs).sum(), 1.0);
    }
}

#[test]
fn test_sweep_misses() {
    let target = AaBox::new([0.0, 0.0], [10.0, 10.0]);

    // falls short
    assert!(sweep_ray(Vec2::new(0.0, 30.0), Vec2::new(0.0, -15.0), target).is_none());
    // moving away
    assert!(sweep_ray(Vec2::new(0.0, 30.0), Vec2::new(0.0, 15.0), target).is_none());
    // passes beside
    assert!(sweep_ray(Vec2::new(20.0, 30.0), Vec2::new(0.0, -60.0), target).is_none());
    // slides along the top face
    assert!(sweep_ray(Vec2::new(-20.0, 10.0), Vec2::new(40.0, 0.0), target).is_none());
    // diagonal which clips past the corner
    assert!(sweep_ray(Vec2::new(-20.0, 5.0), Vec2::new(10.0, 20.0), target).is_none());
    // not moving
    assert!(sweep_ray(Vec2::new(0.0, 0.0), Vec2::zero(), target).is_none());
}

#[test]
fn test_sweep_resting_contact_hits_at_zero() {
    let target = AaBox::new([0.0, 0.0], [10.0, 10.0]);
    let hit = sweep_ray(
        Vec2::new(3.0, 10.0),
        Vec2::new(1.0, -0.5),
        target,
    ).unwrap();
    assert_eq!(hit.time, 0.0);
    assert_eq!(hit.pos, Vec2::new(3.0, 10.0));
    assert_eq!(hit.normal, Vec2::new(0.0, 1.0));
}
