//! Incremental, bounded-memory multi-layer convex hull reducer.
//!
//! Grounded in `examples/original_source/modules/convex_hull.py`'s
//! `LazyMultilayerConvexHull`: points accumulate in a dirty buffer until it
//! exceeds `max_dirty_points`, at which point every layer is merged with
//! the dirty buffer and re-peeled into `layers` convex shells (`reconvex`).
//! The hull itself is gift-wrapping (Jarvis march) rather than the
//! original's `scipy.spatial.ConvexHull`.

use crate::record::Record;

/// A 2-D projection of one Record, carrying a value-copy of the record's
/// bytes so the pipeline's byte buffer can be freed once projected.
#[derive(Clone, Debug)]
pub struct HullPoint {
    pub x: f64,
    pub y: f64,
    pub record_bytes: Vec<u8>,
}

impl HullPoint {
    pub fn new(x: f64, y: f64, record_bytes: Vec<u8>) -> Self {
        Self { x, y, record_bytes }
    }
}

fn cross(o: &HullPoint, a: &HullPoint, b: &HullPoint) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn dist2(a: &HullPoint, b: &HullPoint) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx * dx + dy * dy
}

/// Gift-wrapping convex hull: returns the indices of `points` that lie on
/// the hull, in counter-clockwise order starting from the minimum-x point
/// (ties broken by minimum y). Collinear points strictly between two hull
/// vertices are dropped; only the extremes on a collinear edge survive.
fn convex_hull_indices(points: &[HullPoint]) -> Vec<usize> {
    let n = points.len();
    if n < 3 {
        return (0..n).collect();
    }

    let start = (0..n)
        .min_by(|&a, &b| {
            points[a]
                .x
                .partial_cmp(&points[b].x)
                .unwrap()
                .then(points[a].y.partial_cmp(&points[b].y).unwrap())
        })
        .unwrap();

    let mut hull = Vec::new();
    let mut point_on_hull = start;
    loop {
        hull.push(point_on_hull);
        let mut endpoint = if point_on_hull == 0 { 1 % n } else { 0 };
        for j in 0..n {
            if j == point_on_hull {
                continue;
            }
            if endpoint == point_on_hull {
                endpoint = j;
                continue;
            }
            let c = cross(&points[point_on_hull], &points[endpoint], &points[j]);
            if c > 0.0 {
                endpoint = j;
            } else if c == 0.0 && dist2(&points[point_on_hull], &points[j])
                > dist2(&points[point_on_hull], &points[endpoint])
            {
                endpoint = j;
            }
        }
        point_on_hull = endpoint;
        if point_on_hull == start {
            break;
        }
        if hull.len() > n {
            // Defensive: shouldn't happen for a well-formed point set, but
            // guarantees termination rather than an infinite loop.
            break;
        }
    }
    hull
}

/// Per-axis incremental reducer. Generic only in the record→(x,y)
/// projection, resolvable statically so each axis pair gets its own
/// monomorphized reducer instead of dynamic dispatch.
pub struct HullReducer<F>
where
    F: Fn(&Record) -> (f64, f64),
{
    max_dirty_points: usize,
    layers: usize,
    layer_points: Vec<Vec<HullPoint>>,
    dirty: Vec<HullPoint>,
    project: F,
}

impl<F> HullReducer<F>
where
    F: Fn(&Record) -> (f64, f64),
{
    pub fn new(max_dirty_points: usize, layers: usize, project: F) -> Self {
        Self {
            max_dirty_points,
            layers,
            layer_points: Vec::with_capacity(layers),
            dirty: Vec::new(),
            project,
        }
    }

    /// Appends one point, projecting it from `record` and copying its
    /// encoded bytes. Triggers `reconvex` once the dirty buffer overflows.
    pub fn insert(&mut self, record: &Record, record_bytes: &[u8]) {
        let (x, y) = (self.project)(record);
        self.dirty.push(HullPoint::new(x, y, record_bytes.to_vec()));
        if self.dirty.len() > self.max_dirty_points {
            self.reconvex();
        }
    }

    /// Merges every layer with the dirty buffer into one working set, then
    /// peels `layers` convex hulls out of it in turn.
    pub fn reconvex(&mut self) {
        let mut working: Vec<HullPoint> = self
            .layer_points
            .drain(..)
            .flatten()
            .chain(self.dirty.drain(..))
            .collect();

        self.layer_points.clear();
        for _ in 0..self.layers {
            if working.len() < 3 {
                self.layer_points.push(std::mem::take(&mut working));
                continue;
            }
            let mut hull_idx = convex_hull_indices(&working);
            hull_idx.sort_unstable_by(|a, b| b.cmp(a));
            let mut hull_points = Vec::with_capacity(hull_idx.len());
            for idx in hull_idx {
                hull_points.push(working.remove(idx));
            }
            hull_points.reverse();
            self.layer_points.push(hull_points);
        }
        // Remaining interior points are evicted for good — they are
        // strictly dominated by the hull vertices extracted above.
    }

    /// Forces a reconvex and returns the concatenation of all layer points.
    pub fn drain(mut self) -> Vec<HullPoint> {
        self.reconvex();
        self.layer_points.into_iter().flatten().collect()
    }

    #[cfg(test)]
    fn dirty_len(&self) -> usize {
        self.dirty.len()
    }

    #[cfg(test)]
    fn retained_len(&self) -> usize {
        self.dirty.len() + self.layer_points.iter().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::Allocation;
    use crate::record::Statistics;
    use rand::Rng;

    fn dummy_record() -> Record {
        Record {
            allocation: Allocation(vec![100]),
            statistics: Statistics {
                gain: 0.0,
                cagr_percent: 0.0,
                variance: 0.0,
                stddev: 0.0,
                sharpe: 0.0,
            },
        }
    }

    fn point_reducer(
        max_dirty_points: usize,
        layers: usize,
    ) -> HullReducer<impl Fn(&Record) -> (f64, f64)> {
        HullReducer::new(max_dirty_points, layers, |_r: &Record| (0.0, 0.0))
    }

    fn insert_xy(reducer: &mut HullReducer<impl Fn(&Record) -> (f64, f64)>, x: f64, y: f64) {
        let record = dummy_record();
        let bytes = vec![(x.to_bits() % 251) as u8, (y.to_bits() % 251) as u8];
        let _ = record; // projection below ignores the record, point carries (x, y) explicitly
        reducer.dirty.push(HullPoint::new(x, y, bytes));
    }

    #[test]
    fn s3_square_plus_center_splits_into_two_layers() {
        let mut reducer = point_reducer(3, 2);
        insert_xy(&mut reducer, -1.0, -1.0);
        insert_xy(&mut reducer, -1.0, 1.0);
        insert_xy(&mut reducer, 1.0, -1.0);
        insert_xy(&mut reducer, 1.0, 1.0);
        insert_xy(&mut reducer, 0.5, 0.5);

        let drained = reducer.drain();
        assert_eq!(drained.len(), 5);

        let corners: std::collections::HashSet<(i64, i64)> = drained
            .iter()
            .map(|p| ((p.x * 10.0).round() as i64, (p.y * 10.0).round() as i64))
            .collect();
        assert!(corners.contains(&(-10, -10)));
        assert!(corners.contains(&(-10, 10)));
        assert!(corners.contains(&(10, -10)));
        assert!(corners.contains(&(10, 10)));
        assert!(corners.contains(&(5, 5)));
    }

    #[test]
    fn drain_is_subset_of_all_inserted_points() {
        let mut reducer = point_reducer(4, 1);
        let mut rng = rand::thread_rng();
        let mut inserted = Vec::new();
        for _ in 0..50 {
            let x: f64 = rng.gen_range(-1.0..1.0);
            let y: f64 = rng.gen_range(-1.0..1.0);
            insert_xy(&mut reducer, x, y);
            inserted.push((x, y));
            if reducer.dirty_len() > 4 {
                reducer.reconvex();
            }
        }
        let drained = reducer.drain();
        for p in &drained {
            assert!(inserted
                .iter()
                .any(|&(x, y)| (x - p.x).abs() < 1e-9 && (y - p.y).abs() < 1e-9));
        }
    }

    #[test]
    fn bounded_memory_across_many_inserts() {
        let max_dirty = 256usize;
        let mut reducer = point_reducer(max_dirty, 1);
        let mut rng = rand::thread_rng();
        for _ in 0..20_000 {
            let x: f64 = rng.gen_range(0.0..1.0);
            let y: f64 = rng.gen_range(0.0..1.0);
            insert_xy(&mut reducer, x, y);
            if reducer.dirty_len() > max_dirty {
                reducer.reconvex();
            }
            assert!(reducer.retained_len() <= max_dirty + 64);
        }
    }

    #[test]
    fn hull_vertices_contain_all_extreme_points_of_a_triangle() {
        let points = vec![
            HullPoint::new(0.0, 0.0, vec![]),
            HullPoint::new(4.0, 0.0, vec![]),
            HullPoint::new(0.0, 4.0, vec![]),
            HullPoint::new(1.0, 1.0, vec![]), // interior
        ];
        let idx = convex_hull_indices(&points);
        assert_eq!(idx.len(), 3);
        assert!(!idx.contains(&3));
    }
}
