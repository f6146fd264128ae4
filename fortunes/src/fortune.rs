//! The sweep driver: seeds the event queue, dispatches site
//! and circle events against the beach line, finalizes unbounded rays,
//! and closes the diagram with a polygon at infinity.

use std::collections::HashMap;

use tracing::{debug, instrument, trace};

use crate::beachline::Beachline;
use crate::error::{Result, VoronoiError};
use crate::event::{DispatchedEvent, EventQueue};
use crate::geometry::{self, Point};
use crate::winged_edge::{EdgeId, PolyId, VertexId, WingedEdge, WingedEdgeBuilder};

/// Compute the Voronoi diagram of `sites` via Fortune's sweep-line
/// algorithm, returning a fully-linked [`WingedEdge`].
#[instrument(skip(sites), fields(n = sites.len()))]
pub fn compute_voronoi(sites: &[Point]) -> Result<WingedEdge> {
    reject_duplicates(sites)?;

    let mut builder = WingedEdgeBuilder::new();
    if sites.is_empty() {
        debug!("empty site set");
        return Ok(builder.finish());
    }

    let mut site_to_poly = HashMap::with_capacity(sites.len());
    for &site in sites {
        let poly = builder.add_polygon(site, None);
        site_to_poly.insert(site, poly);
    }

    if sites.len() == 1 {
        debug!("single-site diagram");
        close_single_site(&mut builder, site_to_poly[&sites[0]]);
        return Ok(builder.finish());
    }

    let mut eq = EventQueue::new();
    for &site in sites {
        eq.push_site(site);
    }

    let mut beachline = Beachline::new();

    while let Some(event) = eq.pop() {
        match event {
            DispatchedEvent::Site(site) => {
                let yl = site.y;
                let poly = site_to_poly[&site];
                trace!(?site, "site event");
                match beachline.arc_under_point(&site, yl)? {
                    Some((arc_idx, _, _)) => {
                        beachline.replace_arc(arc_idx, site, poly, &mut builder, &mut eq, yl)?;
                    }
                    None => beachline.add_first_parabola(site, poly),
                }
            }
            DispatchedEvent::Circle(data) => {
                trace!(arc = data.arc_idx, center = ?data.center, "circle event");
                beachline.replace_breakpoint(
                    data.arc_idx,
                    data.center,
                    &mut builder,
                    &mut eq,
                    data.bottom_y,
                )?;
            }
        }
    }

    let sites_with_poly: Vec<(Point, PolyId)> = sites.iter().map(|&s| (s, site_to_poly[&s])).collect();
    finalize_rays(&beachline, &mut builder);
    close_polygon_at_infinity(&mut builder, &sites_with_poly);

    let we = builder.finish();
    debug!(edges = we.edges().count(), polys = we.polygons().count(), "sweep complete");
    Ok(we)
}

fn reject_duplicates(sites: &[Point]) -> Result<()> {
    let mut seen: HashMap<Point, Point> = HashMap::with_capacity(sites.len());
    for &site in sites {
        if let Some(&first) = seen.get(&site) {
            return Err(VoronoiError::IdenticalDatapoints(first, site));
        }
        seen.insert(site, site);
    }
    Ok(())
}

/// After the queue drains, every edge still holding an infinite endpoint
/// is a ray (or, if both ends are open, a full line) to infinity. Its
/// direction is the outward perpendicular to the two generating sites,
/// computed directly from the break-point's own site pair rather than
/// from any transient sweep state.
fn finalize_rays(beachline: &Beachline, builder: &mut WingedEdgeBuilder) {
    for (left_site, right_site, edge) in beachline.live_breakpoints() {
        let direction = geometry::normal_vector(left_site - right_site);
        let open = builder.unresolved_placeholders(edge);
        match open.as_slice() {
            [] => {} // already resolved by an earlier, opposite-facing visit to this same edge
            [v] => builder.set_edge_direction(edge, *v, direction),
            [v0, v1] => {
                builder.set_edge_direction(edge, *v0, direction);
                builder.set_edge_direction(edge, *v1, -direction);
            }
            _ => unreachable!("an edge has exactly two endpoint slots"),
        }
    }
}

/// Build the synthetic polygon at infinity: a ring alternating between
/// the diagram's rays (reused as-is) and virtual "edges at infinity"
/// closing the angular gap between consecutive rays, each assigned to
/// whichever real cell occupies that gap. Which real cell owns a given
/// angular gap is found by probing a point far out along the gap's
/// bisecting direction and taking its nearest site, rather than by
/// tracing edge adjacency — this
/// stays correct even when a single full line (both directions the same
/// edge, the two-site case) contributes both spokes bounding a gap.
fn close_polygon_at_infinity(builder: &mut WingedEdgeBuilder, sites: &[(Point, PolyId)]) {
    let origin = Point::from_xy(0.0, 0.0);
    let mut spokes: Vec<(VertexId, Point, EdgeId)> = Vec::new();
    for edge in builder.polygons_needing_rays() {
        for (vertex, direction) in builder.ray_directions(edge) {
            spokes.push((vertex, direction, edge));
        }
    }
    if spokes.is_empty() {
        return;
    }

    spokes.sort_by(|a, b| geometry::i_compare_cw(&origin, &a.1, &b.1));

    let outer = builder.add_infinity_polygon();
    let n = spokes.len();
    for i in 0..n {
        let (vtx, _, edge) = spokes[i];
        builder.append_to_polygon_ring(outer, edge);

        let (d0, d1) = (spokes[i].1, spokes[(i + 1) % n].1);
        let next_vtx = spokes[(i + 1) % n].0;
        let wedge_site = nearest_site_in_gap(d0, d1, sites);
        builder.add_at_infinity_edge(vtx, next_vtx, outer, wedge_site);
    }
}

/// The real cell occupying the angular gap swept clockwise from
/// direction `d0` to `d1`, found by nearest-site probe at the gap's
/// bisecting direction (falling back to a perpendicular of `d0` when the
/// two directions are exactly opposite, as for a single bisector line).
fn nearest_site_in_gap(d0: Point, d1: Point, sites: &[(Point, PolyId)]) -> PolyId {
    let sum = Point::from_xy(d0.x() + d1.x(), d0.y() + d1.y());
    let mid = if sum.norm() > geometry::EPSILON {
        sum.normalized()
    } else {
        geometry::normal_vector(d0).normalized()
    };
    let probe = mid * 1.0e6;
    sites
        .iter()
        .min_by(|(a, _), (b, _)| {
            geometry::distance(&probe, a)
                .partial_cmp(&geometry::distance(&probe, b))
                .expect("distances are finite")
        })
        .map(|(_, poly)| *poly)
        .expect("at least one site in a diagram with rays")
}

/// Edge case: a single site produces one unbounded cell and no
/// bisectors at all. The polygon at infinity still needs a closed ring —
/// one self-loop edge at infinity shared with the sole real cell.
fn close_single_site(builder: &mut WingedEdgeBuilder, poly: PolyId) {
    let v = builder.add_infinite_vertex(Point::from_xy(1.0, 0.0));
    let outer = builder.add_infinity_polygon();
    builder.add_at_infinity_edge(v, v, outer, poly);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::relative_eq;

    use crate::test_utils::{compare_cyclic_rings, compare_point_sets};

    fn assert_point_in(pts: &[Point], x: f64, y: f64) {
        assert!(
            pts.iter()
                .any(|p| relative_eq!(p.x(), x, epsilon = 1e-6) && relative_eq!(p.y(), y, epsilon = 1e-6)),
            "expected ({x}, {y}) among {pts:?}"
        );
    }

    #[test]
    fn empty_site_set_is_a_trivially_valid_empty_diagram() {
        let we = compute_voronoi(&[]).unwrap();
        assert_eq!(we.polygons().count(), 0);
        assert_eq!(we.edges().count(), 0);
        assert!(we.validate());
    }

    #[test]
    fn single_site_has_one_real_polygon_and_no_finite_vertices() {
        let we = compute_voronoi(&[Point::from_xy(0.0, 0.0)]).unwrap();
        assert_eq!(we.polygons().count(), 2); // the site's cell + infinity
        assert_eq!(we.edges().count(), 1);
        assert!(we.vertices().all(|(_, v)| v.at_infinity));
        assert!(we.validate());
    }

    #[test]
    fn two_sites_produce_a_single_bisector_line() {
        let sites = [Point::from_xy(0.0, 0.0), Point::from_xy(2.0, 0.0)];
        let we = compute_voronoi(&sites).unwrap();

        let real: Vec<_> = we.edges().filter(|(_, e)| !e.at_infinity_edge).collect();
        assert_eq!(real.len(), 1);
        let (_, edge) = real[0];
        assert!(we.vertex(edge.start).at_infinity);
        assert!(we.vertex(edge.end).at_infinity);
        assert!(relative_eq!(we.vertex(edge.start).point.x().abs(), 0.0, epsilon = 1e-9));

        assert_eq!(we.polygons().count(), 3);
        assert!(we.validate());
    }

    #[test]
    fn equilateral_triangle_meets_at_the_centroid() {
        let sites = [
            Point::from_xy(0.0, 0.0),
            Point::from_xy(2.0, 0.0),
            Point::from_xy(1.0, 3f64.sqrt()),
        ];
        let we = compute_voronoi(&sites).unwrap();

        let finite_vertices: Vec<Point> = we
            .vertices()
            .filter(|(_, v)| !v.at_infinity)
            .map(|(_, v)| v.point)
            .collect();
        assert_eq!(finite_vertices.len(), 1);
        assert_point_in(&finite_vertices, 1.0, 3f64.sqrt() / 3.0);

        let real_edges = we.edges().filter(|(_, e)| !e.at_infinity_edge).count();
        assert_eq!(real_edges, 3);
        assert_eq!(we.polygons().count(), 4); // 3 cells + infinity
        assert!(we.validate());

        // the cell at the base-left corner is bounded by two rays out of
        // the centroid, one outward along each bisector away from the
        // opposite site; check the full CW ring, not just the centroid.
        let sqrt3 = 3f64.sqrt();
        let centroid = Point::from_xy(1.0, sqrt3 / 3.0);
        let a_poly = we
            .polygons()
            .find(|(_, p)| p.site == Some(Point::from_xy(0.0, 0.0)))
            .unwrap()
            .0;
        let verts = we.real_vertices(a_poly, 10.0);
        let ab_ray = centroid + Point::from_xy(0.0, -1.0) * 10.0; // outward, away from the apex
        let ac_ray = centroid + Point::from_xy(-sqrt3 / 2.0, 0.5) * 10.0; // outward, away from (2,0)
        assert!(compare_cyclic_rings(&verts, &[centroid, ab_ray, ac_ray]));
    }

    #[test]
    fn unit_square_meets_at_its_center() {
        let sites = [
            Point::from_xy(0.0, 0.0),
            Point::from_xy(1.0, 0.0),
            Point::from_xy(0.0, 1.0),
            Point::from_xy(1.0, 1.0),
        ];
        let we = compute_voronoi(&sites).unwrap();

        let finite_vertices: Vec<Point> = we
            .vertices()
            .filter(|(_, v)| !v.at_infinity)
            .map(|(_, v)| v.point)
            .collect();
        assert_eq!(finite_vertices.len(), 1);
        assert_point_in(&finite_vertices, 0.5, 0.5);

        let real_edges = we.edges().filter(|(_, e)| !e.at_infinity_edge).count();
        assert_eq!(real_edges, 4);
        assert_eq!(we.polygons().count(), 5);
        assert!(we.validate());

        // the bottom-left cell's boundary is the centroid plus one ray
        // toward each neighbour, each pointing away from the diagonal
        // site; same three points regardless of which edge the ring
        // traversal started from, so an unordered set comparison suffices.
        let bl_poly = we
            .polygons()
            .find(|(_, p)| p.site == Some(Point::from_xy(0.0, 0.0)))
            .unwrap()
            .0;
        let verts = we.real_vertices(bl_poly, 10.0);
        let centroid = Point::from_xy(0.5, 0.5);
        let toward_10 = centroid + Point::from_xy(0.0, -1.0) * 10.0; // away from (1,1), along x = 0.5
        let toward_01 = centroid + Point::from_xy(-1.0, 0.0) * 10.0; // away from (1,1), along y = 0.5
        assert!(compare_point_sets(&verts, &[centroid, toward_10, toward_01]));
    }

    #[test]
    fn five_collinear_sites_give_four_parallel_vertical_lines() {
        let sites: Vec<Point> = [-2.0, -1.0, 0.0, 1.0, 2.0]
            .into_iter()
            .map(|x| Point::from_xy(x, 0.0))
            .collect();
        let we = compute_voronoi(&sites).unwrap();

        let real_edges: Vec<_> = we.edges().filter(|(_, e)| !e.at_infinity_edge).collect();
        assert_eq!(real_edges.len(), 4);
        assert!(we.vertices().all(|(_, v)| v.at_infinity));
        for (_, e) in &real_edges {
            let a = we.vertex(e.start).point;
            let b = we.vertex(e.end).point;
            assert!(relative_eq!(a.x(), 0.0, epsilon = 1e-9));
            assert!(relative_eq!(b.x(), 0.0, epsilon = 1e-9));
        }
        assert!(we.validate());
    }

    #[test]
    fn rejects_identical_sites() {
        let sites = [Point::from_xy(1.0, 1.0), Point::from_xy(1.0, 1.0)];
        let err = compute_voronoi(&sites).unwrap_err();
        assert!(matches!(err, VoronoiError::IdenticalDatapoints(_, _)));
    }

    #[test]
    fn twelve_site_hexagon_validates_with_bounded_cell_degree() {
        let sites: Vec<Point> = [
            (50.0, 0.0),
            (-50.0, 0.0),
            (40.0, 30.0),
            (-40.0, 30.0),
            (40.0, -30.0),
            (-40.0, -30.0),
            (30.0, 40.0),
            (-30.0, 40.0),
            (30.0, -40.0),
            (-30.0, -40.0),
            (0.0, 50.0),
            (0.0, -50.0),
        ]
        .into_iter()
        .map(|(x, y)| Point::from_xy(x, y))
        .collect();

        let we = compute_voronoi(&sites).unwrap();
        assert_eq!(we.polygons().count(), 13);
        for (id, poly) in we.polygons() {
            if poly.at_infinity {
                continue;
            }
            assert!(we.edges_cw(id).len() <= 6, "interior cell exceeded degree 6");
        }
        assert!(we.validate());
    }
}
