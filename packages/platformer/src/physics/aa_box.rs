//! Axis-aligned box.

use vek::*;


/// Axis-aligned box.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AaBox {
    /// Box center position.
    pub pos: Vec2<f32>,
    /// Distance from `pos` to the faces. Assumed to be non-negative.
    pub half: Extent2<f32>,
}

impl AaBox {
    pub fn new<P, H>(pos: P, half: H) -> Self
    where
        P: Into<Vec2<f32>>,
        H: Into<Extent2<f32>>,
    {
        AaBox {
            pos: pos.into(),
            half: half.into(),
        }
    }

    /// Box centered at `pos` with full width and height `size`.
    pub fn from_size<P, S>(pos: P, size: S) -> Self
    where
        P: Into<Vec2<f32>>,
        S: Into<Extent2<f32>>,
    {
        AaBox {
            pos: pos.into(),
            half: size.into() * 0.5,
        }
    }

    /// Minimum and maximum corner positions.
    pub fn min_max(self) -> (Vec2<f32>, Vec2<f32>) {
        let half = Vec2::<f32>::from(self.half);
        (self.pos - half, self.pos + half)
    }

    pub fn size(self) -> Extent2<f32> {
        self.half * 2.0
    }

    /// Translate self by `v`.
    pub fn translate<V: Into<Vec2<f32>>>(mut self, v: V) -> Self {
        self.pos += v.into();
        self
    }

    /// Grow self by `half` on every side.
    ///
    /// Sweeping a box with half size `half` against self is the same as
    /// sweeping its center point against the grown box.
    pub fn expand_by(mut self, half: Extent2<f32>) -> Self {
        self.half = self.half + half;
        self
    }

    /// Minkowski difference `self - rhs`.
    ///
    /// Contains the origin exactly when self and `rhs` intersect.
    pub fn minkowski_diff(self, rhs: AaBox) -> AaBox {
        AaBox {
            pos: self.pos - rhs.pos,
            half: self.half + rhs.half,
        }
    }

    /// Does self contain the point `pos`? Points on the boundary count.
    pub fn contains<V: Into<Vec2<f32>>>(self, pos: V) -> bool {
        let pos = pos.into();
        let (min, max) = self.min_max();
        pos.x >= min.x
            && pos.y >= min.y
            && pos.x <= max.x
            && pos.y <= max.y
    }

    /// Does self intersect with `rhs`? Touching boxes count.
    pub fn intersects(self, rhs: AaBox) -> bool {
        let (min1, max1) = self.min_max();
        let (min2, max2) = rhs.min_max();
        for i in 0..2 {
            if min1[i] > max2[i] {
                return false;
            }
            if max1[i] < min2[i] {
                return false;
            }
        }
        true
    }

    /// Treating self as a Minkowski difference `a - b` which contains the
    /// origin, the shortest axis-aligned translation which, added to `b`,
    /// separates the two boxes.
    pub fn penetration_vector(self) -> Vec2<f32> {
        let (min, max) = self.min_max();

        let mut min_dist = min.x.abs();
        let mut vector = Vec2::new(min.x, 0.0);

        if max.x.abs() < min_dist {
            min_dist = max.x.abs();
            vector = Vec2::new(max.x, 0.0);
        }
        if min.y.abs() < min_dist {
            min_dist = min.y.abs();
            vector = Vec2::new(0.0, min.y);
        }
        if max.y.abs() < min_dist {
            vector = Vec2::new(0.0, max.y);
        }

        vector
    }
}


#[test]
fn test_min_max() {
    let aa_box = AaBox::from_size([100.0, 50.0], [40.0, 20.0]);
    let (min, max) = aa_box.min_max();
    assert_eq!(min, Vec2::new(80.0, 40.0));
    assert_eq!(max, Vec2::new(120.0, 60.0));
    assert_eq!(aa_box.size(), Extent2::new(40.0, 20.0));
}

#[test]
fn test_overlap_matches_minkowski_origin() {
    let boxes = [
        AaBox::new([0.0, 0.0], [1.0, 1.0]),
        AaBox::new([1.5, 0.0], [0.5, 2.0]),
        AaBox::new([2.0, 0.0], [1.0, 1.0]),
        AaBox::new([3.0, 3.0], [0.25, 0.25]),
        AaBox::new([-1.0, 2.0], [0.0, 1.0]),
        AaBox::new([0.5, -0.5], [4.0, 0.1]),
    ];
    for a in boxes {
        for b in boxes {
            assert_eq!(
                a.intersects(b),
                a.minkowski_diff(b).contains(Vec2::zero()),
                "{:?} vs {:?}", a, b,
            );
        }
    }
}

#[test]
fn test_touching_counts_as_overlap() {
    let a = AaBox::new([0.0, 0.0], [1.0, 1.0]);
    let b = AaBox::new([2.0, 0.0], [1.0, 1.0]);
    assert!(a.intersects(b));
    assert!(!a.intersects(b.translate([0.001, 0.0])));
}

#[test]
fn test_penetration_vector_separates() {
    let floor = AaBox::from_size([0.0, 0.0], [100.0, 20.0]);
    let body = AaBox::from_size([10.0, 12.0], [10.0, 10.0]);
    assert!(floor.intersects(body));

    let diff = floor.minkowski_diff(body);
    let pen = diff.penetration_vector();
    // floor top at 10, body bottom at 7
    assert_eq!(pen, Vec2::new(0.0, 3.0));

    let (min, max) = diff.min_max();
    let min_face = [min.x, max.x, min.y, max.y]
        .into_iter()
        .map(f32::abs)
        .fold(f32::INFINITY, f32::min);
    assert_eq!(pen.magnitude(), min_face);

    let moved = body.translate(pen);
    let nudged = moved.translate(pen.normalized() * 0.001);
    assert!(!floor.intersects(nudged));
    assert!(!floor.minkowski_diff(nudged).contains(Vec2::zero()));
}

#[test]
fn test_penetration_vector_sideways() {
    let wall = AaBox::from_size([0.0, 0.0], [10.0, 100.0]);
    let body = AaBox::from_size([-7.0, 0.0], [6.0, 6.0]);
    let pen = wall.minkowski_diff(body).penetration_vector();
    assert_eq!(pen, Vec2::new(-1.0, 0.0));
}
