//! Order- and rotation-tolerant comparison helpers shared by the core's
//! test modules, since neither a polygon's vertex ring nor a set of sites
//! comes back in any caller-predictable order.

use approx::relative_eq;

use crate::geometry::Point;

pub fn compare_points(a: &Point, b: &Point) -> bool {
    relative_eq!(a.x(), b.x(), epsilon = 1e-6) && relative_eq!(a.y(), b.y(), epsilon = 1e-6)
}

/// True iff `a` and `b` contain the same points, up to tolerance, in any
/// order.
pub fn compare_point_sets(a: &[Point], b: &[Point]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut remaining: Vec<Point> = b.to_vec();
    for p in a {
        let Some(pos) = remaining.iter().position(|q| compare_points(p, q)) else {
            return false;
        };
        remaining.remove(pos);
    }
    true
}

/// True iff `ring` is a rotation (forward or reversed) of `expected`, as
/// is the case for two traversals of the same polygon boundary that
/// started from different edges or wound in opposite directions.
pub fn compare_cyclic_rings(ring: &[Point], expected: &[Point]) -> bool {
    if ring.len() != expected.len() {
        return false;
    }
    let n = ring.len();
    let reversed: Vec<Point> = expected.iter().rev().copied().collect();
    for candidate in [expected.to_vec(), reversed] {
        for shift in 0..n {
            let rotated = candidate[shift..].iter().chain(candidate[..shift].iter());
            if ring.iter().zip(rotated).all(|(a, b)| compare_points(a, b)) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cyclic_ring_matches_a_rotated_reversal() {
        let square = [
            Point::from_xy(0.0, 0.0),
            Point::from_xy(1.0, 0.0),
            Point::from_xy(1.0, 1.0),
            Point::from_xy(0.0, 1.0),
        ];
        let rotated_reversed = [
            Point::from_xy(1.0, 1.0),
            Point::from_xy(1.0, 0.0),
            Point::from_xy(0.0, 0.0),
            Point::from_xy(0.0, 1.0),
        ];
        assert!(compare_cyclic_rings(&square, &rotated_reversed));
    }

    #[test]
    fn point_sets_ignore_order() {
        let a = [Point::from_xy(0.0, 0.0), Point::from_xy(1.0, 1.0)];
        let b = [Point::from_xy(1.0, 1.0), Point::from_xy(0.0, 0.0)];
        assert!(compare_point_sets(&a, &b));
    }
}
