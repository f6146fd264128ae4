//! The winged-edge boundary representation: an arena of polygons, edges
//! and vertices addressed by integer indices instead of reference
//! counting, plus the validation and enumeration surface `WingedEdge`
//! exposes to callers.

use crate::geometry::{self, Point, EPSILON};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolyId(pub usize);

#[derive(Debug, Clone)]
pub struct WeVertex {
    /// A location for finite vertices; a (near-)unit direction for
    /// infinite ones.
    pub point: Point,
    pub at_infinity: bool,
    pub(crate) edges: Vec<EdgeId>,
}

/// Baumgart winged-edge neighbour convention used here: `cw_succ`/`cw_pred`
/// are the ring-adjacent edges of `poly_left`; `ccw_succ`/`ccw_pred` are
/// the ring-adjacent edges of `poly_right`. Each polygon's own `edges_cw`
/// ring is the source of truth; these four pointers are a derived,
/// classic-winged-edge-shaped view over the same rings.
#[derive(Debug, Clone)]
pub struct WeEdge {
    pub start: VertexId,
    pub end: VertexId,
    pub poly_left: PolyId,
    pub poly_right: PolyId,
    pub site_left: Point,
    pub site_right: Point,
    pub cw_pred: Option<EdgeId>,
    pub cw_succ: Option<EdgeId>,
    pub ccw_pred: Option<EdgeId>,
    pub ccw_succ: Option<EdgeId>,
    /// A synthetic "edge at infinity", part of the outer ring closing
    /// the polygon at infinity — not a real Voronoi bisector.
    pub at_infinity_edge: bool,
    /// Opaque payload carried through from the generating site, if any.
    pub cookie: Option<i64>,
}

impl WeEdge {
    pub fn f_at_infinity(&self, we: &WingedEdge) -> bool {
        we.vertices[self.start.0].at_infinity && we.vertices[self.end.0].at_infinity
    }

    pub fn f_ray(&self, we: &WingedEdge) -> bool {
        we.vertices[self.start.0].at_infinity != we.vertices[self.end.0].at_infinity
    }
}

#[derive(Debug, Clone)]
pub struct WePolygon {
    /// The generating site; `None` only for the polygon at infinity.
    pub site: Option<Point>,
    pub cookie: Option<i64>,
    pub at_infinity: bool,
    pub(crate) edges: Vec<EdgeId>,
}

#[derive(Debug, Default, Clone)]
pub struct WingedEdge {
    pub(crate) vertices: Vec<WeVertex>,
    pub(crate) edges: Vec<WeEdge>,
    pub(crate) polygons: Vec<WePolygon>,
}

impl WingedEdge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn polygons(&self) -> impl Iterator<Item = (PolyId, &WePolygon)> {
        self.polygons.iter().enumerate().map(|(i, p)| (PolyId(i), p))
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &WeEdge)> {
        self.edges.iter().enumerate().map(|(i, e)| (EdgeId(i), e))
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &WeVertex)> {
        self.vertices.iter().enumerate().map(|(i, v)| (VertexId(i), v))
    }

    pub fn polygon(&self, id: PolyId) -> &WePolygon {
        &self.polygons[id.0]
    }

    pub fn edge(&self, id: EdgeId) -> &WeEdge {
        &self.edges[id.0]
    }

    pub fn vertex(&self, id: VertexId) -> &WeVertex {
        &self.vertices[id.0]
    }

    pub fn edges_cw(&self, poly: PolyId) -> &[EdgeId] {
        &self.polygons[poly.0].edges
    }

    pub fn incident_edges(&self, vtx: VertexId) -> &[EdgeId] {
        &self.vertices[vtx.0].edges
    }

    /// Vertex ring of a polygon, in CW order, derived from its CW edge
    /// ring (consecutive edges share exactly one vertex).
    pub fn polygon_vertices(&self, poly: PolyId) -> Vec<VertexId> {
        let ring = &self.polygons[poly.0].edges;
        let mut out = Vec::with_capacity(ring.len());
        for (i, &eid) in ring.iter().enumerate() {
            let e = &self.edges[eid.0];
            let next = &self.edges[ring[(i + 1) % ring.len()].0];
            let shared = if e.start == next.start || e.start == next.end {
                e.end
            } else {
                e.start
            };
            out.push(shared);
        }
        out
    }

    /// Materialize a polygon's boundary with each infinite vertex replaced
    /// by a point `ray_length` out along its stored direction *from the
    /// edge's other, finite endpoint* — not from the origin, since the
    /// stored direction is a unit vector with no location of its own.
    pub fn real_vertices(&self, poly: PolyId, ray_length: f64) -> Vec<Point> {
        let verts = self.polygon_vertices(poly);
        let ring = &self.polygons[poly.0].edges;
        let mut out = Vec::with_capacity(verts.len());
        for (i, vid) in verts.iter().enumerate() {
            let v = &self.vertices[vid.0];
            if !v.at_infinity {
                out.push(v.point);
                continue;
            }
            let eid = ring[i];
            let e = &self.edges[eid.0];
            let anchor_id = if e.start == *vid { e.end } else { e.start };
            let anchor = self.vertices[anchor_id.0].point;
            out.push(anchor + v.point * ray_length);
        }
        out
    }

    /// Like [`Self::real_vertices`], but each infinite vertex is
    /// extended only as far as the bounding box `[upper_left, lower_right]`
    /// (in screen-style y-down-increasing coordinates, as the name
    /// suggests) requires.
    pub fn box_vertices(&self, poly: PolyId, upper_left: Point, lower_right: Point) -> Vec<Point> {
        let verts = self.polygon_vertices(poly);
        let ring = &self.polygons[poly.0].edges;
        let mut out = Vec::with_capacity(verts.len());
        for (i, vid) in verts.iter().enumerate() {
            let v = &self.vertices[vid.0];
            if !v.at_infinity {
                out.push(v.point);
                continue;
            }
            let eid = ring[i];
            let e = &self.edges[eid.0];
            let anchor_id = if e.start == *vid { e.end } else { e.start };
            let anchor = self.vertices[anchor_id.0].point;
            out.push(clip_ray_to_box(anchor, v.point, upper_left, lower_right));
        }
        out
    }

    pub fn validate(&self) -> bool {
        // `resolve_endpoint` retires a placeholder infinite vertex in
        // place (leaving it with no incident edges) whenever an edge's
        // open end gets pinned to a real circle-event vertex; the arena
        // never compacts, so these stick around. A *finite* vertex with
        // no incident edges is never expected, though — only a retired
        // placeholder can legitimately be orphaned like this — so the
        // bound below only budgets for vertices actually reachable from
        // an edge, rather than the raw arena length.
        let mut live_vertices = 0usize;
        for v in &self.vertices {
            if v.edges.is_empty() {
                if !v.at_infinity {
                    return false;
                }
                continue;
            }
            live_vertices += 1;
        }
        if !self.edges.is_empty() && live_vertices > 2 * self.edges.len() {
            return false;
        }

        for (eid, e) in self.edges() {
            if !self.vertices[e.start.0].edges.contains(&eid) {
                return false;
            }
            if !self.vertices[e.end.0].edges.contains(&eid) {
                return false;
            }
            if !self.polygons[e.poly_left.0].edges.contains(&eid) {
                return false;
            }
            if !self.polygons[e.poly_right.0].edges.contains(&eid) {
                return false;
            }
            if self.vertices[e.start.0].at_infinity && !self.vertices[e.end.0].at_infinity {
                // invariant 5: infinite endpoints only ever occupy the
                // end slot.
                return false;
            }

            let check_neighbour = |maybe: Option<EdgeId>, poly: PolyId| -> bool {
                match maybe {
                    None => true,
                    Some(n) => self.polygons[poly.0].edges.contains(&n),
                }
            };
            if !check_neighbour(e.cw_pred, e.poly_left) {
                return false;
            }
            if !check_neighbour(e.cw_succ, e.poly_left) {
                return false;
            }
            if !check_neighbour(e.ccw_pred, e.poly_right) {
                return false;
            }
            if !check_neighbour(e.ccw_succ, e.poly_right) {
                return false;
            }
        }

        for (_, poly) in self.polygons() {
            if poly.edges.len() < 2 {
                continue;
            }
            let n = poly.edges.len();
            for i in 0..n {
                let cur = &self.edges[poly.edges[i].0];
                let next = &self.edges[poly.edges[(i + 1) % n].0];
                let shares = cur.start == next.start
                    || cur.start == next.end
                    || cur.end == next.start
                    || cur.end == next.end;
                if !shares {
                    return false;
                }
            }
        }

        true
    }
}

fn clip_ray_to_box(origin: Point, direction: Point, upper_left: Point, lower_right: Point) -> Point {
    let (x_min, x_max) = (upper_left.x(), lower_right.x());
    let (y_min, y_max) = (upper_left.y(), lower_right.y());

    let dx = direction.x();
    let dy = direction.y();

    let t_x = if dx.abs() <= EPSILON {
        f64::INFINITY
    } else if dx < 0.0 {
        (x_min - origin.x()) / dx
    } else {
        (x_max - origin.x()) / dx
    };

    let t_y = if dy.abs() <= EPSILON {
        f64::INFINITY
    } else if dy < 0.0 {
        (y_min - origin.y()) / dy
    } else {
        (y_max - origin.y()) / dy
    };

    let t = t_x.min(t_y).max(0.0);
    Point::from_xy(origin.x() + t * dx, origin.y() + t * dy)
}

/// Builder used by the sweep driver to grow the arena incrementally and
/// finish it off with CW ordering + neighbour pointer attachment.
pub(crate) struct WingedEdgeBuilder {
    we: WingedEdge,
}

impl WingedEdgeBuilder {
    pub fn new() -> Self {
        Self { we: WingedEdge::new() }
    }

    pub fn add_polygon(&mut self, site: Point, cookie: Option<i64>) -> PolyId {
        let id = PolyId(self.we.polygons.len());
        self.we.polygons.push(WePolygon {
            site: Some(site),
            cookie,
            at_infinity: false,
            edges: Vec::new(),
        });
        id
    }

    pub fn add_infinity_polygon(&mut self) -> PolyId {
        let id = PolyId(self.we.polygons.len());
        self.we.polygons.push(WePolygon {
            site: None,
            cookie: None,
            at_infinity: true,
            edges: Vec::new(),
        });
        id
    }

    /// Add an edge with both endpoints initially infinite; the caller
    /// fills in real vertex ids via [`Self::set_edge_endpoint`] as the
    /// sweep resolves them.
    pub fn add_open_edge(
        &mut self,
        poly_left: PolyId,
        poly_right: PolyId,
        site_left: Point,
        site_right: Point,
    ) -> EdgeId {
        let placeholder_start = self.add_infinite_vertex(Point::from_xy(0.0, 0.0));
        let placeholder_end = self.add_infinite_vertex(Point::from_xy(0.0, 0.0));
        let id = EdgeId(self.we.edges.len());
        self.we.edges.push(WeEdge {
            start: placeholder_start,
            end: placeholder_end,
            poly_left,
            poly_right,
            site_left,
            site_right,
            cw_pred: None,
            cw_succ: None,
            ccw_pred: None,
            ccw_succ: None,
            at_infinity_edge: false,
            cookie: None,
        });
        self.we.vertices[placeholder_start.0].edges.push(id);
        self.we.vertices[placeholder_end.0].edges.push(id);
        self.we.polygons[poly_left.0].edges.push(id);
        self.we.polygons[poly_right.0].edges.push(id);
        id
    }

    pub fn add_finite_vertex(&mut self, point: Point) -> VertexId {
        let id = VertexId(self.we.vertices.len());
        self.we.vertices.push(WeVertex {
            point,
            at_infinity: false,
            edges: Vec::new(),
        });
        id
    }

    pub fn add_infinite_vertex(&mut self, direction: Point) -> VertexId {
        let id = VertexId(self.we.vertices.len());
        self.we.vertices.push(WeVertex {
            point: direction,
            at_infinity: true,
            edges: Vec::new(),
        });
        id
    }

    /// Replace one endpoint of `edge` (whichever of its two slots is
    /// still open/infinite) with a newly finalized vertex, detaching the
    /// stale placeholder vertex's back-reference.
    pub fn resolve_endpoint(&mut self, edge: EdgeId, new_vertex: VertexId) {
        let e = &mut self.we.edges[edge.0];
        let stale = if self.we.vertices[e.start.0].at_infinity {
            let old = e.start;
            e.start = new_vertex;
            old
        } else {
            let old = e.end;
            e.end = new_vertex;
            old
        };
        self.we.vertices[stale.0].edges.retain(|&x| x != edge);
        self.we.vertices[new_vertex.0].edges.push(edge);
    }

    pub fn set_edge_direction(&mut self, edge: EdgeId, vertex: VertexId, direction: Point) {
        self.we.vertices[vertex.0].point = direction.normalized();
        debug_assert!(self.we.edges[edge.0].start == vertex || self.we.edges[edge.0].end == vertex);
    }

    /// Endpoints of `edge` still holding the `(0, 0)` infinite placeholder
    /// `add_open_edge` seeds both slots with — i.e. not yet given either a
    /// real vertex (`resolve_endpoint`) or a finalized ray direction
    /// (`set_edge_direction`). Used by ray finalization to tell a line
    /// still open at both ends (never touched by a circle event) apart
    /// from a ray with one end already pinned down.
    pub fn unresolved_placeholders(&self, edge: EdgeId) -> Vec<VertexId> {
        let e = &self.we.edges[edge.0];
        [e.start, e.end]
            .into_iter()
            .filter(|&v| {
                let vtx = &self.we.vertices[v.0];
                vtx.at_infinity && vtx.point.x() == 0.0 && vtx.point.y() == 0.0
            })
            .collect()
    }

    /// The infinite endpoints of `edge` and their (already finalized)
    /// direction vectors. Called after ray finalization, when building
    /// the polygon at infinity.
    pub fn ray_directions(&self, edge: EdgeId) -> Vec<(VertexId, Point)> {
        let e = &self.we.edges[edge.0];
        [e.start, e.end]
            .into_iter()
            .filter(|&v| self.we.vertices[v.0].at_infinity)
            .map(|v| (v, self.we.vertices[v.0].point))
            .collect()
    }

    pub fn polygons_needing_rays(&self) -> Vec<EdgeId> {
        self.we
            .edges
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                self.we.vertices[e.start.0].at_infinity || self.we.vertices[e.end.0].at_infinity
            })
            .map(|(i, _)| EdgeId(i))
            .collect()
    }

    pub fn add_at_infinity_edge(
        &mut self,
        start: VertexId,
        end: VertexId,
        outer: PolyId,
        left_cell: PolyId,
    ) -> EdgeId {
        let id = EdgeId(self.we.edges.len());
        self.we.edges.push(WeEdge {
            start,
            end,
            poly_left: left_cell,
            poly_right: outer,
            site_left: self.we.polygons[left_cell.0].site.unwrap_or(Point::from_xy(0.0, 0.0)),
            site_right: Point::from_xy(0.0, 0.0),
            cw_pred: None,
            cw_succ: None,
            ccw_pred: None,
            ccw_succ: None,
            at_infinity_edge: true,
            cookie: None,
        });
        self.we.vertices[start.0].edges.push(id);
        self.we.vertices[end.0].edges.push(id);
        self.we.polygons[outer.0].edges.push(id);
        self.we.polygons[left_cell.0].edges.push(id);
        id
    }

    /// Register an already-built edge as part of `poly`'s ring, without
    /// creating a new edge. Used to fold a ray back into the
    /// polygon-at-infinity's boundary once it exists.
    pub fn append_to_polygon_ring(&mut self, poly: PolyId, edge: EdgeId) {
        self.we.polygons[poly.0].edges.push(edge);
    }

    /// Sort every polygon's edge ring into CW order, sort every vertex's
    /// incident-edge list into CW order, then derive the four neighbour
    /// pointers from the (now-ordered) polygon rings.
    pub fn finish(mut self) -> WingedEdge {
        self.order_polygon_rings();
        self.order_vertex_rings();
        self.attach_neighbour_pointers();
        self.we
    }

    fn order_polygon_rings(&mut self) {
        for poly_idx in 0..self.we.polygons.len() {
            let center = match self.we.polygons[poly_idx].site {
                Some(s) => s,
                None => continue, // polygon at infinity: built already in angular order
            };
            let edges = self.we.polygons[poly_idx].edges.clone();
            let mut keyed: Vec<(EdgeId, Point)> = edges
                .into_iter()
                .map(|eid| {
                    let e = &self.we.edges[eid.0];
                    let other = if e.poly_left == PolyId(poly_idx) { e.end } else { e.start };
                    let p = self.direction_anchor(other, center);
                    (eid, p)
                })
                .collect();
            keyed.sort_by(|a, b| geometry::i_compare_cw(&center, &a.1, &b.1));
            self.we.polygons[poly_idx].edges = keyed.into_iter().map(|(e, _)| e).collect();
        }
    }

    fn order_vertex_rings(&mut self) {
        for vtx_idx in 0..self.we.vertices.len() {
            if self.we.vertices[vtx_idx].at_infinity {
                continue; // small fixed degree (<=3), insertion order is fine
            }
            let center = self.we.vertices[vtx_idx].point;
            let edges = self.we.vertices[vtx_idx].edges.clone();
            let mut keyed: Vec<(EdgeId, Point)> = edges
                .into_iter()
                .map(|eid| {
                    let e = &self.we.edges[eid.0];
                    let other = if e.start == VertexId(vtx_idx) { e.end } else { e.start };
                    let p = self.direction_anchor(other, center);
                    (eid, p)
                })
                .collect();
            keyed.sort_by(|a, b| geometry::i_compare_cw(&center, &a.1, &b.1));
            self.we.vertices[vtx_idx].edges = keyed.into_iter().map(|(e, _)| e).collect();
        }
    }

    /// A finite point usable as the "other end" argument to `i_compare_cw`
    /// when sorting edges around `center`: the vertex's own location if
    /// finite, or a point far out along its direction if infinite.
    fn direction_anchor(&self, vtx: VertexId, center: Point) -> Point {
        let v = &self.we.vertices[vtx.0];
        if v.at_infinity {
            center + v.point * 1.0e6
        } else {
            v.point
        }
    }

    fn attach_neighbour_pointers(&mut self) {
        for poly_idx in 0..self.we.polygons.len() {
            let ring = self.we.polygons[poly_idx].edges.clone();
            let n = ring.len();
            if n < 2 {
                continue;
            }
            for i in 0..n {
                let cur = ring[i];
                let next = ring[(i + 1) % n];
                let prev = ring[(i + n - 1) % n];
                let is_left = self.we.edges[cur.0].poly_left == PolyId(poly_idx);
                if is_left {
                    self.we.edges[cur.0].cw_succ = Some(next);
                    self.we.edges[cur.0].cw_pred = Some(prev);
                } else {
                    self.we.edges[cur.0].ccw_succ = Some(prev);
                    self.we.edges[cur.0].ccw_pred = Some(next);
                }
            }
        }
    }
}

impl Default for WingedEdgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_diagram_validates() {
        let we = WingedEdge::new();
        assert!(we.validate());
    }
}
