//! Battlefield geometry: points, axis-aligned rectangles, segment tests

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

/// Denominator below which two segments are treated as parallel
pub const PARALLEL_EPSILON: f64 = 1e-10;

/// Length below which a direction vector is treated as zero
pub const ZERO_LENGTH_EPSILON: f32 = 1e-6;

/// 2D point / vector
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians)
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance_to(&self, other: Vec2) -> f32 {
        (other - *self).length()
    }

    /// Unit vector, or `None` for (near) zero-length input
    pub fn normalized(&self) -> Option<Vec2> {
        let len = self.length();
        if len < ZERO_LENGTH_EPSILON || !len.is_finite() {
            None
        } else {
            Some(Vec2::new(self.x / len, self.y / len))
        }
    }

    /// Angle of this vector in radians
    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Rotated by +90 degrees
    pub fn perpendicular(&self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    /// Angle from `self` toward `other`
    pub fn angle_to(&self, other: Vec2) -> f32 {
        (other - *self).angle()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Square of side `size` centered on `center`
    pub fn centered(center: Vec2, size: f32) -> Self {
        Self::new(center.x - size / 2.0, center.y - size / 2.0, size, size)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// The four boundary segments (top, right, bottom, left)
    pub fn edges(&self) -> [(Vec2, Vec2); 4] {
        let tl = Vec2::new(self.x, self.y);
        let tr = Vec2::new(self.right(), self.y);
        let br = Vec2::new(self.right(), self.bottom());
        let bl = Vec2::new(self.x, self.bottom());
        [(tl, tr), (tr, br), (br, bl), (bl, tl)]
    }

    /// Mirror across the vertical center line of a field `field_width` wide
    pub fn mirrored_x(&self, field_width: f32) -> Rect {
        Rect::new(field_width - self.right(), self.y, self.width, self.height)
    }
}

/// Strict AABB overlap (touching edges do not overlap)
pub fn rectangles_overlap(a: &Rect, b: &Rect) -> bool {
    a.x < b.right() && a.right() > b.x && a.y < b.bottom() && a.bottom() > b.y
}

/// Inclusive point-in-rectangle test
pub fn point_in_rect(p: Vec2, r: &Rect) -> bool {
    p.x >= r.x && p.x <= r.right() && p.y >= r.y && p.y <= r.bottom()
}

/// Parametric segment intersection test.
///
/// Segments (p1,p2) and (p3,p4) intersect when both parameters land in
/// [0,1]. Parallel or near-parallel segments never intersect.
pub fn segments_intersect(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> bool {
    let (x1, y1) = (p1.x as f64, p1.y as f64);
    let (x2, y2) = (p2.x as f64, p2.y as f64);
    let (x3, y3) = (p3.x as f64, p3.y as f64);
    let (x4, y4) = (p4.x as f64, p4.y as f64);

    let denom = (y4 - y3) * (x2 - x1) - (x4 - x3) * (y2 - y1);
    if denom.abs() < PARALLEL_EPSILON {
        return false;
    }

    let ua = ((x4 - x3) * (y1 - y3) - (y4 - y3) * (x1 - x3)) / denom;
    let ub = ((x2 - x1) * (y1 - y3) - (y2 - y1) * (x1 - x3)) / denom;

    (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub)
}

/// True iff segment (a,b) crosses no obstacle boundary
pub fn has_line_of_sight(a: Vec2, b: Vec2, obstacles: &[Rect]) -> bool {
    !obstacles.iter().any(|rect| {
        rect.edges()
            .iter()
            .any(|&(e1, e2)| segments_intersect(a, b, e1, e2))
    })
}

/// Fraction along segment (a,b) at which it first touches `rect`.
///
/// Liang-Barsky clipping against the inclusive rectangle. Returns 0 when
/// `a` starts inside, `None` when the segment misses entirely.
pub fn segment_rect_entry(a: Vec2, b: Vec2, rect: &Rect) -> Option<f32> {
    let d = b - a;
    let mut t_enter = 0.0f32;
    let mut t_exit = 1.0f32;

    for (p, q) in [
        (-d.x, a.x - rect.x),
        (d.x, rect.right() - a.x),
        (-d.y, a.y - rect.y),
        (d.y, rect.bottom() - a.y),
    ] {
        if p.abs() < ZERO_LENGTH_EPSILON {
            // Parallel to this slab: outside it means a miss
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t_enter = t_enter.max(t);
        } else {
            t_exit = t_exit.min(t);
        }
        if t_enter > t_exit {
            return None;
        }
    }
    Some(t_enter)
}

/// True iff a square hitbox of `size` at `center` overlaps any obstacle
pub fn collides_with_obstacles(center: Vec2, size: f32, obstacles: &[Rect]) -> bool {
    let hitbox = Rect::centered(center, size);
    obstacles.iter().any(|o| rectangles_overlap(&hitbox, o))
}

/// Wrap an angle into (-PI, PI]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

/// Signed smallest difference `to - from`
pub fn angle_difference(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_rectangles_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(rectangles_overlap(&a, &Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!rectangles_overlap(&a, &Rect::new(20.0, 0.0, 5.0, 5.0)));
        // Shared edge only
        assert!(!rectangles_overlap(&a, &Rect::new(10.0, 0.0, 5.0, 5.0)));
    }

    #[test]
    fn test_point_in_rect() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(point_in_rect(Vec2::new(15.0, 15.0), &r));
        assert!(point_in_rect(Vec2::new(10.0, 30.0), &r));
        assert!(!point_in_rect(Vec2::new(5.0, 15.0), &r));
    }

    #[test]
    fn test_segments_intersect() {
        let crossing = segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(10.0, 0.0),
        );
        assert!(crossing);

        let apart = segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(6.0, -3.0),
        );
        assert!(!apart);
    }

    #[test]
    fn test_parallel_segments_never_intersect() {
        // Collinear overlap counts as parallel
        assert!(!segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(5.0, 0.0),
            Vec2::new(15.0, 0.0),
        ));
        assert!(!segments_intersect(
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(10.0, 1.0),
        ));
    }

    #[test]
    fn test_line_of_sight_blocked() {
        let wall = [Rect::new(40.0, -50.0, 20.0, 100.0)];
        assert!(!has_line_of_sight(Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0), &wall));
        assert!(has_line_of_sight(Vec2::new(0.0, 80.0), Vec2::new(100.0, 80.0), &wall));
        assert!(has_line_of_sight(Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0), &[]));
    }

    #[test]
    fn test_line_of_sight_symmetry() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..200 {
            let obstacles: Vec<Rect> = (0..rng.gen_range(0..5))
                .map(|_| {
                    Rect::new(
                        rng.gen_range(0.0..900.0),
                        rng.gen_range(0.0..600.0),
                        rng.gen_range(10.0..100.0),
                        rng.gen_range(10.0..100.0),
                    )
                })
                .collect();
            let a = Vec2::new(rng.gen_range(0.0..1000.0), rng.gen_range(0.0..700.0));
            let b = Vec2::new(rng.gen_range(0.0..1000.0), rng.gen_range(0.0..700.0));
            assert_eq!(
                has_line_of_sight(a, b, &obstacles),
                has_line_of_sight(b, a, &obstacles)
            );
        }
    }

    #[test]
    fn test_zero_length_normalize() {
        assert!(Vec2::ZERO.normalized().is_none());
        let n = Vec2::new(3.0, 4.0).normalized().unwrap();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_angle_difference_wraps() {
        use std::f32::consts::PI;
        let d = angle_difference(PI - 0.1, -PI + 0.1);
        assert!((d - 0.2).abs() < 1e-5);
        assert!((normalize_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-5);
    }

    #[test]
    fn test_collides_with_obstacles() {
        let obstacles = [Rect::new(100.0, 100.0, 50.0, 50.0)];
        assert!(collides_with_obstacles(Vec2::new(90.0, 120.0), 30.0, &obstacles));
        assert!(!collides_with_obstacles(Vec2::new(50.0, 120.0), 30.0, &obstacles));
    }

    #[test]
    fn test_segment_rect_entry() {
        let r = Rect::new(100.0, 100.0, 50.0, 50.0);
        let t = segment_rect_entry(Vec2::new(0.0, 125.0), Vec2::new(200.0, 125.0), &r).unwrap();
        assert!((t - 0.5).abs() < 1e-6);

        // Starts inside
        assert_eq!(segment_rect_entry(Vec2::new(120.0, 120.0), Vec2::new(300.0, 120.0), &r), Some(0.0));
        // Passes above
        assert!(segment_rect_entry(Vec2::new(0.0, 50.0), Vec2::new(200.0, 50.0), &r).is_none());
        // Stops short
        assert!(segment_rect_entry(Vec2::new(0.0, 125.0), Vec2::new(90.0, 125.0), &r).is_none());
        // Diagonal through a corner region
        let t = segment_rect_entry(Vec2::new(50.0, 50.0), Vec2::new(150.0, 150.0), &r).unwrap();
        assert!((t - 0.5).abs() < 1e-6);
    }
}
