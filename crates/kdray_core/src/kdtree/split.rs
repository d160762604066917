//! Surface area heuristic split selection.

use std::cmp::Ordering;

use kdray_math::{Axis, Bound, AXES};

/// Nodes with more values than this are binned instead of sorted.
const PIGEON_THRESHOLD: usize = 128;
const NUM_BINS: usize = 1024;

const COST_RATIO: f64 = 0.35;
const EMPTY_BONUS: f64 = 0.33;

/// A candidate splitting plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Split {
    pub axis: Axis,
    pub pivot: f64,
    pub cost: f64,
}

/// Inputs shared by every candidate of one node.
pub(crate) struct SplitContext<'a> {
    pub bound: &'a Bound,
    /// Depth of the node; deeper nodes get a smaller empty-space bonus
    pub depth: u32,
    pub max_depth: u32,
}

impl SplitContext<'_> {
    fn empty_bonus(&self) -> f64 {
        if self.max_depth == 0 {
            return EMPTY_BONUS;
        }
        EMPTY_BONUS * (1.1 - f64::from(self.depth) / f64::from(self.max_depth))
    }

    fn inv_total_area(&self) -> f64 {
        let d = self.bound.size();
        let total = d.x * d.y + d.x * d.z + d.y * d.z;
        if total != 0.0 {
            1.0 / total
        } else {
            0.0
        }
    }

    /// SAH cost of splitting at `edge` with the given counts on either side.
    fn cost(&self, axis: Axis, inv_total_area: f64, n_below: usize, n_above: usize, edge: f64) -> f64 {
        let d = self.bound.size();
        let i = axis.index();
        let cap_area = d[axis.next().index()] * d[axis.prev().index()];
        let cap_perim = d[axis.next().index()] + d[axis.prev().index()];

        let l1 = edge - self.bound.min[i];
        let l2 = self.bound.max[i] - edge;
        let below_area = cap_area + l1 * cap_perim;
        let above_area = cap_area + l2 * cap_perim;
        let raw = below_area * n_below as f64 + above_area * n_above as f64;

        let eb = if n_above == 0 {
            (0.1 + l2 / d[i]) * self.empty_bonus() * raw
        } else if n_below == 0 {
            (0.1 + l1 / d[i]) * self.empty_bonus() * raw
        } else {
            0.0
        };

        COST_RATIO + inv_total_area * (raw - eb)
    }

    fn inside(&self, axis: Axis, edge: f64) -> bool {
        edge > self.bound.lo(axis) && edge < self.bound.hi(axis)
    }
}

/// Pick the cheapest split for values whose extents are given by `dims`.
///
/// Returns `None` when no plane lies strictly inside the node bound.
pub(crate) fn find_split<F>(ctx: &SplitContext<'_>, n: usize, dims: F) -> Option<Split>
where
    F: Fn(usize, Axis) -> (f64, f64),
{
    if n > PIGEON_THRESHOLD {
        pigeon_split(ctx, n, dims)
    } else {
        minimal_split(ctx, n, dims)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum EdgeEnd {
    Lower = 0,
    Both = 1,
    Upper = 2,
}

#[derive(Debug, Clone, Copy)]
struct BoundEdge {
    position: f64,
    end: EdgeEnd,
}

/// Exact SAH over every bound edge.
fn minimal_split<F>(ctx: &SplitContext<'_>, n: usize, dims: F) -> Option<Split>
where
    F: Fn(usize, Axis) -> (f64, f64),
{
    let inv_total_area = ctx.inv_total_area();
    let mut best: Option<Split> = None;
    let mut edges = Vec::with_capacity(n * 2);

    for axis in AXES {
        edges.clear();
        for k in 0..n {
            let (lo, hi) = dims(k, axis);
            if lo == hi {
                edges.push(BoundEdge {
                    position: lo,
                    end: EdgeEnd::Both,
                });
            } else {
                edges.push(BoundEdge {
                    position: lo,
                    end: EdgeEnd::Lower,
                });
                edges.push(BoundEdge {
                    position: hi,
                    end: EdgeEnd::Upper,
                });
            }
        }
        // Ties put closing edges first.
        edges.sort_by(|a, b| {
            a.position
                .partial_cmp(&b.position)
                .unwrap_or(Ordering::Equal)
                .then(b.end.cmp(&a.end))
        });

        let (mut n_below, mut n_above) = (0usize, n);
        for e in &edges {
            if e.end == EdgeEnd::Upper {
                n_above -= 1;
            }
            if ctx.inside(axis, e.position) {
                let cost = ctx.cost(axis, inv_total_area, n_below, n_above, e.position);
                if best.map_or(true, |b| cost < b.cost) {
                    best = Some(Split {
                        axis,
                        pivot: e.position,
                        cost,
                    });
                }
            }
            if e.end != EdgeEnd::Upper {
                n_below += 1;
                if e.end == EdgeEnd::Both {
                    n_above -= 1;
                }
            }
        }
        debug_assert!(n_below == n && n_above == 0, "edge counts out of balance");
    }

    best
}

#[derive(Debug, Clone, Copy, Default)]
struct PigeonBin {
    n: usize,
    left: usize,
    right: usize,
    bleft: usize,
    both: usize,
    t: f64,
}

impl PigeonBin {
    /// Move the edge of this bin up to `t`, settling the counts of the old edge.
    fn advance(&mut self, t: f64) {
        self.t = t;
        self.left += self.both + self.bleft;
        self.right += self.both;
        self.both = 0;
        self.bleft = 0;
    }
}

/// Approximate SAH by binning edges along each axis.
fn pigeon_split<F>(ctx: &SplitContext<'_>, n: usize, dims: F) -> Option<Split>
where
    F: Fn(usize, Axis) -> (f64, f64),
{
    let inv_total_area = ctx.inv_total_area();
    let d = ctx.bound.size();
    let mut best: Option<Split> = None;
    let mut bins = vec![PigeonBin::default(); NUM_BINS + 1];

    for axis in AXES {
        let extent = d[axis.index()];
        if extent <= 0.0 {
            continue;
        }
        let scale = NUM_BINS as f64 / extent;
        let min = ctx.bound.lo(axis);
        let bin_of = |t: f64| (((t - min) * scale).max(0.0) as usize).min(NUM_BINS);

        for k in 0..n {
            let (lo, hi) = dims(k, axis);
            let bl = bin_of(lo);
            let br = bin_of(hi);

            if lo == hi {
                let bin = &mut bins[bl];
                if bin.n == 0 || lo >= bin.t {
                    bin.t = lo;
                    bin.both += 1;
                } else {
                    bin.left += 1;
                    bin.right += 1;
                }
                bin.n += 2;
            } else {
                let bin = &mut bins[bl];
                if bin.n == 0 || lo > bin.t {
                    bin.advance(lo);
                    bin.bleft += 1;
                } else if lo == bin.t {
                    bin.bleft += 1;
                } else {
                    bin.left += 1;
                }
                bin.n += 1;

                let bin = &mut bins[br];
                bin.right += 1;
                if bin.n == 0 || hi > bin.t {
                    bin.advance(hi);
                }
                bin.n += 1;
            }
        }

        let (mut n_below, mut n_above) = (0usize, n);
        for bin in bins.iter().filter(|b| b.n != 0) {
            n_below += bin.left;
            n_above -= bin.right;
            if ctx.inside(axis, bin.t) {
                let cost = ctx.cost(axis, inv_total_area, n_below, n_above, bin.t);
                if best.map_or(true, |b| cost < b.cost) {
                    best = Some(Split {
                        axis,
                        pivot: bin.t,
                        cost,
                    });
                }
            }
            n_below += bin.both + bin.bleft;
            n_above -= bin.both;
        }
        debug_assert!(n_below == n && n_above == 0, "bin counts out of balance");

        bins.fill(PigeonBin::default());
    }

    best
}
