//! Lloyd relaxation: move each site toward its clipped cell's centroid and
//! rebuild the diagram from the relocated sites.

use tracing::{debug, instrument};

use crate::error::{Result, VoronoiError};
use crate::fortune::compute_voronoi;
use crate::geometry::Point;
use crate::winged_edge::WingedEdge;

/// A convex clipping window, CCW-wound, used to bound unbounded cells
/// before centroid computation.
#[derive(Debug, Clone)]
pub struct ClipWindow {
    vertices: Vec<Point>,
}

impl ClipWindow {
    /// Builds a window from a CCW-wound convex polygon. The caller is
    /// responsible for convexity and winding; this does not validate
    /// either.
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    pub fn rectangle(upper_left: Point, lower_right: Point) -> Self {
        // CCW in a y-up mathematical frame: upper_left, lower_left,
        // lower_right, upper_right.
        let (x0, y0) = (upper_left.x(), upper_left.y());
        let (x1, y1) = (lower_right.x(), lower_right.y());
        Self::new(vec![
            Point::from_xy(x0, y0),
            Point::from_xy(x0, y1),
            Point::from_xy(x1, y1),
            Point::from_xy(x1, y0),
        ])
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }
}

/// Sutherland–Hodgman polygon clipping against a convex clip polygon.
/// Degenerate results (empty intersection, the subject polygon collapsing
/// to a point or line) come back as a short or empty vertex list rather
/// than an error.
pub fn sutherland_hodgman(subject: &[Point], clip: &[Point]) -> Vec<Point> {
    if subject.is_empty() || clip.len() < 3 {
        return Vec::new();
    }

    let mut output = subject.to_vec();
    let n = clip.len();
    for i in 0..n {
        if output.is_empty() {
            break;
        }
        let edge_start = clip[i];
        let edge_end = clip[(i + 1) % n];
        let input = output;
        output = Vec::with_capacity(input.len());

        for j in 0..input.len() {
            let current = input[j];
            let prev = input[(j + input.len() - 1) % input.len()];

            let current_inside = inside(edge_start, edge_end, current);
            let prev_inside = inside(edge_start, edge_end, prev);

            if current_inside {
                if !prev_inside {
                    if let Some(p) = segment_intersection(prev, current, edge_start, edge_end) {
                        output.push(p);
                    }
                }
                output.push(current);
            } else if prev_inside {
                if let Some(p) = segment_intersection(prev, current, edge_start, edge_end) {
                    output.push(p);
                }
            }
        }
    }
    output
}

/// True iff `p` is on the left of (or on) the directed clip edge
/// `a -> b`, i.e. "inside" for a CCW-wound convex clip polygon.
fn inside(a: Point, b: Point, p: Point) -> bool {
    crate::geometry::signed_area(&a, &b, &p) >= 0.0
}

fn segment_intersection(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<Point> {
    let d1 = p2 - p1;
    let d3 = p4 - p3;
    let denom = d1.x() * d3.y() - d1.y() * d3.x();
    if crate::geometry::f_near_zero(denom) {
        return None;
    }
    let dx = p3.x() - p1.x();
    let dy = p3.y() - p1.y();
    let t = (dx * d3.y() - dy * d3.x()) / denom;
    Some(Point::from_xy(p1.x() + t * d1.x(), p1.y() + t * d1.y()))
}

/// Area-weighted centroid via the shoelace formula. `None` for a polygon
/// with fewer than 3 vertices or (numerically) zero area.
pub fn centroid(poly: &[Point]) -> Option<Point> {
    if poly.len() < 3 {
        return None;
    }
    let n = poly.len();
    let mut area2 = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let p0 = poly[i];
        let p1 = poly[(i + 1) % n];
        let cross = p0.x() * p1.y() - p1.x() * p0.y();
        area2 += cross;
        cx += (p0.x() + p1.x()) * cross;
        cy += (p0.y() + p1.y()) * cross;
    }
    if crate::geometry::f_near_zero(area2) {
        return None;
    }
    let area = area2 / 2.0;
    Some(Point::from_xy(cx / (6.0 * area), cy / (6.0 * area)))
}

/// One Lloyd relaxation step: for each real cell, clip its boundary
/// (infinite vertices extended to `ray_length`) to `window`, take the
/// clipped polygon's centroid, move the site `alpha` of the way toward
/// it, and rebuild the whole diagram from the updated site set.
///
/// Cells whose clip is degenerate (empty or sub-triangular) keep their
/// original site unmoved rather than erroring out.
#[instrument(skip(we, window), fields(ray_length, alpha))]
pub fn lloyd_relax(we: &WingedEdge, ray_length: f64, window: &ClipWindow, alpha: f64) -> Result<WingedEdge> {
    if window.vertices().len() < 3 {
        return Err(VoronoiError::DegenerateWindow);
    }
    let mut new_sites = Vec::new();
    for (poly_id, poly) in we.polygons() {
        let Some(site) = poly.site else { continue };
        if poly.at_infinity {
            continue;
        }
        let raw = we.real_vertices(poly_id, ray_length);
        let clipped = sutherland_hodgman(&raw, window.vertices());
        let moved = match centroid(&clipped) {
            Some(g) => site + (g - site) * alpha,
            None => {
                debug!(?site, "degenerate clip, site held in place");
                site
            }
        };
        new_sites.push(moved);
    }
    compute_voronoi(&new_sites)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centroid_of_unit_square_is_its_center() {
        let square = vec![
            Point::from_xy(0.0, 0.0),
            Point::from_xy(1.0, 0.0),
            Point::from_xy(1.0, 1.0),
            Point::from_xy(0.0, 1.0),
        ];
        let c = centroid(&square).unwrap();
        assert!((c.x() - 0.5).abs() < 1e-9);
        assert!((c.y() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn centroid_of_degenerate_polygon_is_none() {
        let line = vec![Point::from_xy(0.0, 0.0), Point::from_xy(1.0, 0.0)];
        assert!(centroid(&line).is_none());
    }

    #[test]
    fn clipping_a_square_against_itself_is_a_no_op() {
        let square = vec![
            Point::from_xy(0.0, 0.0),
            Point::from_xy(1.0, 0.0),
            Point::from_xy(1.0, 1.0),
            Point::from_xy(0.0, 1.0),
        ];
        let clipped = sutherland_hodgman(&square, &square);
        let c = centroid(&clipped).unwrap();
        assert!((c.x() - 0.5).abs() < 1e-6);
        assert!((c.y() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn clipping_to_a_disjoint_window_is_empty() {
        let square = vec![
            Point::from_xy(0.0, 0.0),
            Point::from_xy(1.0, 0.0),
            Point::from_xy(1.0, 1.0),
            Point::from_xy(0.0, 1.0),
        ];
        let far_window = ClipWindow::rectangle(Point::from_xy(10.0, 10.0), Point::from_xy(11.0, 11.0));
        let clipped = sutherland_hodgman(&square, far_window.vertices());
        assert!(clipped.is_empty());
    }

    #[test]
    fn clipping_a_large_cell_to_a_window_keeps_it_inside() {
        let big = vec![
            Point::from_xy(-100.0, -100.0),
            Point::from_xy(100.0, -100.0),
            Point::from_xy(100.0, 100.0),
            Point::from_xy(-100.0, 100.0),
        ];
        let window = ClipWindow::rectangle(Point::from_xy(-1.0, -1.0), Point::from_xy(1.0, 1.0));
        let clipped = sutherland_hodgman(&big, window.vertices());
        for p in &clipped {
            assert!(p.x() >= -1.0 - 1e-9 && p.x() <= 1.0 + 1e-9);
            assert!(p.y() >= -1.0 - 1e-9 && p.y() <= 1.0 + 1e-9);
        }
        let c = centroid(&clipped).unwrap();
        assert!(c.x().abs() < 1e-6);
        assert!(c.y().abs() < 1e-6);
    }

    #[test]
    fn relaxing_a_symmetric_triangle_keeps_the_centroid_fixed() {
        let sites = vec![
            Point::from_xy(0.0, 0.0),
            Point::from_xy(2.0, 0.0),
            Point::from_xy(1.0, 2.0),
        ];
        let we = compute_voronoi(&sites).unwrap();
        let window = ClipWindow::rectangle(Point::from_xy(-10.0, -10.0), Point::from_xy(10.0, 10.0));
        let relaxed = lloyd_relax(&we, 50.0, &window, 0.5).unwrap();
        assert!(relaxed.validate());
        assert_eq!(relaxed.polygons().count(), 4);
    }

    #[test]
    fn relaxing_against_a_degenerate_window_is_an_error() {
        let sites = vec![Point::from_xy(0.0, 0.0), Point::from_xy(2.0, 0.0), Point::from_xy(1.0, 2.0)];
        let we = compute_voronoi(&sites).unwrap();
        let window = ClipWindow::new(vec![Point::from_xy(0.0, 0.0), Point::from_xy(1.0, 1.0)]);
        let err = lloyd_relax(&we, 50.0, &window, 0.5).unwrap_err();
        assert_eq!(err, VoronoiError::DegenerateWindow);
    }
}
