//! Planar Delaunay triangulation and piecewise-linear grid interpolation.
//!
//! The triangulation is built by incremental Bowyer-Watson insertion in
//! Z-order. The convex hull is closed with ghost triangles that share a
//! single vertex at infinity, so hull edges are exact and no super triangle
//! distorts the boundary. A ghost triangle `(u, w, ∞)` conflicts with a new
//! point strictly left of `u → w`, or lying on the open segment `u w`.
//!
//! Degenerate inputs never fail: exact duplicates are collapsed to their
//! first occurrence, collinear sets produce an empty triangulation, and a
//! point whose cavity comes out inconsistent under floating point is skipped.

use std::collections::HashMap;

use crate::constants::BARYCENTRIC_EPSILON;
use crate::spatial_layout::z_order;
use tracing::debug;

const GHOST: usize = usize::MAX;

/// Seeds flatter than this (relative to the squared base length) count as collinear.
const COLLINEAR_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
struct Triangle {
    /// Vertices in counter-clockwise order; `GHOST` marks the vertex at infinity.
    v: [usize; 3],
    /// `n[i]` is the neighbour across the edge opposite `v[i]`.
    n: [usize; 3],
    alive: bool,
}

impl Triangle {
    fn ghost_slot(&self) -> Option<usize> {
        self.v.iter().position(|&v| v == GHOST)
    }

    /// Vertices of the edge opposite slot `i`, in this triangle's winding.
    fn edge(&self, i: usize) -> (usize, usize) {
        (self.v[(i + 1) % 3], self.v[(i + 2) % 3])
    }
}

/// Delaunay triangulation of a planar point set, as CCW vertex triples
/// indexing the input slice.
#[derive(Debug, Clone, Default)]
pub struct Triangulation {
    triangles: Vec<[usize; 3]>,
}

impl Triangulation {
    pub fn new(points: &[[f64; 2]]) -> Self {
        let unique = unique_points(points);
        if unique.len() < 3 {
            return Self::default();
        }

        let normalised = normalise(points, &unique);
        let Some(mut builder) = Builder::seed(normalised) else {
            debug!(points = unique.len(), "collinear point set, no triangles");
            return Self::default();
        };

        let order = z_order(&builder.pts);
        let mut skipped = 0usize;
        for local in order {
            if builder.seeded.contains(&local) {
                continue;
            }
            if !builder.insert(local) {
                skipped += 1;
            }
        }
        if skipped > 0 {
            debug!(skipped, "points skipped during triangulation");
        }

        let triangles = builder
            .tris
            .iter()
            .filter(|t| t.alive && t.ghost_slot().is_none())
            .map(|t| [unique[t.v[0]], unique[t.v[1]], unique[t.v[2]]])
            .collect();

        Self { triangles }
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }
}

/// Input indices with exact duplicate positions removed, first occurrence kept.
fn unique_points(points: &[[f64; 2]]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..points.len()).collect();
    indices.sort_by(|&a, &b| {
        points[a][0]
            .total_cmp(&points[b][0])
            .then(points[a][1].total_cmp(&points[b][1]))
            .then(a.cmp(&b))
    });
    indices.dedup_by(|later, earlier| points[*later] == points[*earlier]);
    indices.sort_unstable();
    indices
}

/// Map the selected points into the unit box, preserving aspect ratio.
fn normalise(points: &[[f64; 2]], selected: &[usize]) -> Vec<[f64; 2]> {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &i in selected {
        min_x = min_x.min(points[i][0]);
        max_x = max_x.max(points[i][0]);
        min_y = min_y.min(points[i][1]);
        max_y = max_y.max(points[i][1]);
    }
    let scale = (max_x - min_x).max(max_y - min_y);
    let scale = if scale > 0.0 { scale } else { 1.0 };

    selected
        .iter()
        .map(|&i| [(points[i][0] - min_x) / scale, (points[i][1] - min_y) / scale])
        .collect()
}

fn orient(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Positive when `d` lies strictly inside the circumcircle of CCW `a b c`.
fn incircle(a: [f64; 2], b: [f64; 2], c: [f64; 2], d: [f64; 2]) -> f64 {
    let (adx, ady) = (a[0] - d[0], a[1] - d[1]);
    let (bdx, bdy) = (b[0] - d[0], b[1] - d[1]);
    let (cdx, cdy) = (c[0] - d[0], c[1] - d[1]);

    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    alift * (bdx * cdy - cdx * bdy) + blift * (cdx * ady - adx * cdy) + clift * (adx * bdy - bdx * ady)
}

struct BoundaryEdge {
    a: usize,
    b: usize,
    outer: usize,
    outer_slot: usize,
}

struct Builder {
    pts: Vec<[f64; 2]>,
    tris: Vec<Triangle>,
    free: Vec<usize>,
    seeded: [usize; 3],
    last: usize,
    /// Per-triangle cavity classification, valid while `stamp` matches.
    mark_stamp: Vec<u32>,
    mark_bad: Vec<bool>,
    stamp: u32,
    walk_turn: usize,
}

impl Builder {
    /// Start from the widest triangle through the first point, or `None`
    /// when every point is collinear.
    fn seed(pts: Vec<[f64; 2]>) -> Option<Self> {
        let a = 0;
        let dist2 = |p: [f64; 2], q: [f64; 2]| (p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2);
        let b = (1..pts.len()).max_by(|&i, &j| {
            dist2(pts[a], pts[i]).total_cmp(&dist2(pts[a], pts[j]))
        })?;
        let c = (1..pts.len())
            .filter(|&i| i != b)
            .max_by(|&i, &j| {
                orient(pts[a], pts[b], pts[i])
                    .abs()
                    .total_cmp(&orient(pts[a], pts[b], pts[j]).abs())
            })?;

        let area = orient(pts[a], pts[b], pts[c]);
        if area.abs() <= COLLINEAR_EPSILON * dist2(pts[a], pts[b]) {
            return None;
        }
        let (b, c) = if area > 0.0 { (b, c) } else { (c, b) };

        let mut builder = Self {
            pts,
            tris: Vec::new(),
            free: Vec::new(),
            seeded: [a, b, c],
            last: 0,
            mark_stamp: Vec::new(),
            mark_bad: Vec::new(),
            stamp: 0,
            walk_turn: 0,
        };

        let initial = [[a, b, c], [b, a, GHOST], [c, b, GHOST], [a, c, GHOST]];
        for v in initial {
            builder.tris.push(Triangle {
                v,
                n: [GHOST; 3],
                alive: true,
            });
        }
        builder.link_initial();
        builder.mark_stamp = vec![0; builder.tris.len()];
        builder.mark_bad = vec![false; builder.tris.len()];
        Some(builder)
    }

    fn link_initial(&mut self) {
        let mut edges = HashMap::new();
        for (t, tri) in self.tris.iter().enumerate() {
            for i in 0..3 {
                edges.insert(tri.edge(i), (t, i));
            }
        }
        for t in 0..self.tris.len() {
            for i in 0..3 {
                let (a, b) = self.tris[t].edge(i);
                if let Some(&(other, _)) = edges.get(&(b, a)) {
                    self.tris[t].n[i] = other;
                }
            }
        }
    }

    fn in_conflict(&self, t: usize, p: [f64; 2]) -> bool {
        let tri = &self.tris[t];
        match tri.ghost_slot() {
            Some(k) => {
                let (u, w) = tri.edge(k);
                let (pu, pw) = (self.pts[u], self.pts[w]);
                let side = orient(pu, pw, p);
                if side > 0.0 {
                    return true;
                }
                // On the hull line: conflict only strictly inside the segment.
                side == 0.0 && {
                    let along = (p[0] - pu[0]) * (pw[0] - pu[0]) + (p[1] - pu[1]) * (pw[1] - pu[1]);
                    let length2 = (pw[0] - pu[0]).powi(2) + (pw[1] - pu[1]).powi(2);
                    along > 0.0 && along < length2
                }
            }
            None => {
                let [a, b, c] = tri.v;
                incircle(self.pts[a], self.pts[b], self.pts[c], p) > 0.0
            }
        }
    }

    /// Visibility walk to a real triangle containing `p`, or to the ghost
    /// triangle whose hull edge `p` lies beyond.
    fn locate(&mut self, p: [f64; 2]) -> Option<usize> {
        let mut t = self.last;
        if let Some(k) = self.tris[t].ghost_slot() {
            t = self.tris[t].n[k];
        }

        let max_steps = 4 * self.tris.len() + 16;
        for _ in 0..max_steps {
            let tri = self.tris[t];
            if tri.ghost_slot().is_some() {
                return Some(t);
            }
            self.walk_turn = (self.walk_turn + 1) % 3;
            let mut next = None;
            for e in 0..3 {
                let i = (e + self.walk_turn) % 3;
                let (a, b) = tri.edge(i);
                if orient(self.pts[a], self.pts[b], p) < 0.0 {
                    next = Some(tri.n[i]);
                    break;
                }
            }
            match next {
                Some(n) => t = n,
                None => return Some(t),
            }
        }

        self.locate_exhaustive(p)
    }

    fn locate_exhaustive(&self, p: [f64; 2]) -> Option<usize> {
        let containing = self.tris.iter().position(|tri| {
            tri.alive
                && tri.ghost_slot().is_none()
                && (0..3).all(|i| {
                    let (a, b) = tri.edge(i);
                    orient(self.pts[a], self.pts[b], p) >= 0.0
                })
        });
        containing.or_else(|| {
            (0..self.tris.len()).find(|&t| {
                self.tris[t].alive && self.tris[t].ghost_slot().is_some() && self.in_conflict(t, p)
            })
        })
    }

    fn next_stamp(&mut self) -> u32 {
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.mark_stamp.iter_mut().for_each(|s| *s = 0);
            self.stamp = 1;
        }
        self.stamp
    }

    /// Insert local point `p`. Returns false when the point was skipped.
    fn insert(&mut self, p: usize) -> bool {
        let pos = self.pts[p];
        let Some(seed) = self.locate(pos) else {
            return false;
        };

        // Grow the cavity of triangles in conflict with the new point.
        let stamp = self.next_stamp();
        self.mark_stamp[seed] = stamp;
        self.mark_bad[seed] = true;
        let mut bad = vec![seed];
        let mut stack = vec![seed];
        let mut boundary = Vec::new();

        while let Some(t) = stack.pop() {
            for i in 0..3 {
                let nb = self.tris[t].n[i];
                if self.mark_stamp[nb] != stamp {
                    self.mark_stamp[nb] = stamp;
                    self.mark_bad[nb] = self.in_conflict(nb, pos);
                    if self.mark_bad[nb] {
                        bad.push(nb);
                        stack.push(nb);
                    }
                }
                if !self.mark_bad[nb] {
                    let (a, b) = self.tris[t].edge(i);
                    let Some(outer_slot) = (0..3).find(|&j| self.tris[nb].edge(j) == (b, a)) else {
                        return false;
                    };
                    boundary.push(BoundaryEdge {
                        a,
                        b,
                        outer: nb,
                        outer_slot,
                    });
                }
            }
        }

        // The cavity must be star shaped around `p` with a closed boundary.
        let mut by_first: HashMap<usize, usize> = HashMap::with_capacity(boundary.len());
        for (k, edge) in boundary.iter().enumerate() {
            if by_first.insert(edge.a, k).is_some() {
                return false;
            }
            if edge.a != GHOST
                && edge.b != GHOST
                && orient(self.pts[edge.a], self.pts[edge.b], pos) <= 0.0
            {
                return false;
            }
        }
        if boundary.iter().any(|edge| !by_first.contains_key(&edge.b)) {
            return false;
        }

        for &t in &bad {
            self.tris[t].alive = false;
            self.free.push(t);
        }

        let mut created = Vec::with_capacity(boundary.len());
        for edge in &boundary {
            let t = self.allocate(Triangle {
                v: [edge.a, edge.b, p],
                n: [GHOST, GHOST, edge.outer],
                alive: true,
            });
            self.tris[edge.outer].n[edge.outer_slot] = t;
            created.push(t);
        }
        for (k, edge) in boundary.iter().enumerate() {
            let here = created[k];
            let next = created[by_first[&edge.b]];
            self.tris[here].n[0] = next;
            self.tris[next].n[1] = here;
        }

        self.last = created
            .iter()
            .copied()
            .find(|&t| self.tris[t].ghost_slot().is_none())
            .unwrap_or(created[0]);
        true
    }

    fn allocate(&mut self, tri: Triangle) -> usize {
        match self.free.pop() {
            Some(t) => {
                self.tris[t] = tri;
                t
            }
            None => {
                self.tris.push(tri);
                self.mark_stamp.push(0);
                self.mark_bad.push(false);
                self.tris.len() - 1
            }
        }
    }
}

/// Barycentric stencil of one grid node.
#[derive(Debug, Clone, Copy, PartialEq)]
struct NodeWeights {
    vertices: [usize; 3],
    weights: [f64; 3],
}

/// Per-node interpolation weights of a regular grid over a triangulation.
/// Row `r` samples `rows[r]`, column `c` samples `cols[c]`; nodes outside
/// every triangle carry no stencil.
#[derive(Debug, Clone)]
pub struct GridStencil {
    cols: usize,
    rows: usize,
    nodes: Vec<Option<NodeWeights>>,
}

impl GridStencil {
    pub fn build(
        points: &[[f64; 2]],
        triangulation: &Triangulation,
        cols: &[f64],
        rows: &[f64],
    ) -> Self {
        let mut nodes = vec![None; cols.len() * rows.len()];

        for &[i0, i1, i2] in triangulation.triangles() {
            let ([x0, y0], [x1, y1], [x2, y2]) = (points[i0], points[i1], points[i2]);
            let det = (y1 - y2) * (x0 - x2) + (x2 - x1) * (y0 - y2);

            let (min_x, max_x) = (x0.min(x1).min(x2), x0.max(x1).max(x2));
            let (min_y, max_y) = (y0.min(y1).min(y2), y0.max(y1).max(y2));
            let extent = (max_x - min_x) + (max_y - min_y);
            if det.abs() <= f64::EPSILON * extent * extent {
                continue;
            }
            let pad = BARYCENTRIC_EPSILON * extent;

            let c_lo = cols.partition_point(|&u| u < min_x - pad);
            let c_hi = cols.partition_point(|&u| u <= max_x + pad);
            let r_lo = rows.partition_point(|&v| v < min_y - pad);
            let r_hi = rows.partition_point(|&v| v <= max_y + pad);

            for r in r_lo..r_hi {
                let py = rows[r];
                for c in c_lo..c_hi {
                    let node = &mut nodes[r * cols.len() + c];
                    if node.is_some() {
                        continue;
                    }
                    let px = cols[c];
                    let l0 = ((y1 - y2) * (px - x2) + (x2 - x1) * (py - y2)) / det;
                    let l1 = ((y2 - y0) * (px - x2) + (x0 - x2) * (py - y2)) / det;
                    let l2 = 1.0 - l0 - l1;
                    if l0 >= -BARYCENTRIC_EPSILON
                        && l1 >= -BARYCENTRIC_EPSILON
                        && l2 >= -BARYCENTRIC_EPSILON
                    {
                        *node = Some(NodeWeights {
                            vertices: [i0, i1, i2],
                            weights: [l0, l1, l2],
                        });
                    }
                }
            }
        }

        Self {
            cols: cols.len(),
            rows: rows.len(),
            nodes,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Nodes that received a stencil.
    pub fn covered_nodes(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Row-major interpolated grid of `values` (one per input point); NaN
    /// outside the triangulation.
    pub fn interpolate(&self, values: &[f64]) -> Vec<f64> {
        self.nodes
            .iter()
            .map(|node| match node {
                Some(w) => {
                    w.weights[0] * values[w.vertices[0]]
                        + w.weights[1] * values[w.vertices[1]]
                        + w.weights[2] * values[w.vertices[2]]
                }
                None => f64::NAN,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::linspace;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn signed_area(points: &[[f64; 2]], t: [usize; 3]) -> f64 {
        orient(points[t[0]], points[t[1]], points[t[2]]) / 2.0
    }

    fn random_points(n: usize, seed: u64) -> Vec<[f64; 2]> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| [rng.r#gen::<f64>(), rng.r#gen::<f64>()]).collect()
    }

    /// Area of the convex hull via the monotone chain.
    fn hull_area(points: &[[f64; 2]]) -> f64 {
        let mut pts = points.to_vec();
        pts.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
        let mut hull: Vec<[f64; 2]> = Vec::new();
        for pass in 0..2 {
            let start = hull.len();
            for &p in &pts {
                while hull.len() >= start + 2
                    && orient(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
                {
                    hull.pop();
                }
                hull.push(p);
            }
            hull.pop();
            if pass == 0 {
                pts.reverse();
            }
        }
        let mut area = 0.0;
        for i in 0..hull.len() {
            let (a, b) = (hull[i], hull[(i + 1) % hull.len()]);
            area += a[0] * b[1] - b[0] * a[1];
        }
        area / 2.0
    }

    #[test]
    fn unit_square_gives_two_ccw_triangles() {
        let points = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let tri = Triangulation::new(&points);
        assert_eq!(tri.triangles().len(), 2);
        for &t in tri.triangles() {
            assert!(signed_area(&points, t) > 0.0);
        }
    }

    #[test]
    fn random_triangulation_is_delaunay_and_covers_hull() {
        let points = random_points(500, 7);
        let tri = Triangulation::new(&points);

        // Euler: 2n - 2 - h triangles, so at least n and at most 2n - 5.
        assert!(tri.triangles().len() >= points.len());
        assert!(tri.triangles().len() <= 2 * points.len() - 5);

        let total: f64 = tri.triangles().iter().map(|&t| signed_area(&points, t)).sum();
        assert!((total - hull_area(&points)).abs() < 1e-9);

        for &[a, b, c] in tri.triangles() {
            for (i, &p) in points.iter().enumerate() {
                if i == a || i == b || i == c {
                    continue;
                }
                assert!(incircle(points[a], points[b], points[c], p) <= 1e-12);
            }
        }
    }

    #[test]
    fn collinear_points_have_no_triangles() {
        let points: Vec<[f64; 2]> = (0..20).map(|i| [i as f64, 2.0 * i as f64]).collect();
        assert!(Triangulation::new(&points).is_empty());
        assert!(Triangulation::new(&points[..2]).is_empty());
    }

    #[test]
    fn duplicates_collapse_to_first_occurrence() {
        let points = [
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.0],
        ];
        let tri = Triangulation::new(&points);
        assert_eq!(tri.triangles().len(), 2);
        for t in tri.triangles() {
            assert!(!t.contains(&3));
            assert!(!t.contains(&5));
        }
    }

    #[test]
    fn points_on_the_hull_line_are_kept() {
        // Midpoints on every edge of the square plus the corners.
        let points = [
            [0.0, 0.0],
            [2.0, 0.0],
            [2.0, 2.0],
            [0.0, 2.0],
            [1.0, 0.0],
            [2.0, 1.0],
            [1.0, 2.0],
            [0.0, 1.0],
            [1.0, 1.0],
        ];
        let tri = Triangulation::new(&points);
        let total: f64 = tri.triangles().iter().map(|&t| signed_area(&points, t)).sum();
        assert!((total - 4.0).abs() < 1e-12);
        for v in 0..points.len() {
            assert!(tri.triangles().iter().any(|t| t.contains(&v)));
        }
    }

    #[test]
    fn stencil_reproduces_linear_fields() {
        let points = random_points(200, 11);
        let values: Vec<f64> = points.iter().map(|p| 3.0 * p[0] - 2.0 * p[1] + 0.5).collect();
        let tri = Triangulation::new(&points);

        let cols = linspace(0.0, 1.0, 41);
        let rows = linspace(0.0, 1.0, 31);
        let stencil = GridStencil::build(&points, &tri, &cols, &rows);
        let grid = stencil.interpolate(&values);
        assert_eq!(stencil.shape(), (31, 41));
        assert!(stencil.covered_nodes() > 0);

        for r in 0..rows.len() {
            for c in 0..cols.len() {
                let v = grid[r * cols.len() + c];
                if v.is_nan() {
                    continue;
                }
                let expected = 3.0 * cols[c] - 2.0 * rows[r] + 0.5;
                assert!((v - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn nodes_outside_hull_are_nan_and_vertices_are_exact() {
        let points = [[0.25, 0.25], [0.75, 0.25], [0.75, 0.75], [0.25, 0.75], [0.5, 0.5]];
        let values = [1.0, 2.0, 3.0, 4.0, 10.0];
        let tri = Triangulation::new(&points);

        let axis = linspace(0.0, 1.0, 5);
        let stencil = GridStencil::build(&points, &tri, &axis, &axis);
        let grid = stencil.interpolate(&values);

        assert!(grid[0].is_nan());
        assert!(grid[4].is_nan());
        assert!(grid[2].is_nan());
        // (0.25, 0.25) is node (1, 1); (0.5, 0.5) is node (2, 2).
        assert!((grid[5 + 1] - 1.0).abs() < 1e-12);
        assert!((grid[2 * 5 + 2] - 10.0).abs() < 1e-12);
        assert!((grid[3 * 5 + 3] - 3.0).abs() < 1e-12);
        // Edge midpoint between (0.25, 0.25) and (0.75, 0.25).
        assert!((grid[5 + 2] - 1.5).abs() < 1e-12);
    }
}
