//! Generic SAH kd-tree.
//!
//! The tree stores indices into a [`KdData`] source. Values that can be
//! clipped (triangles) have their bounds tightened against each node while
//! the node is small, which gives much tighter splits for long thin
//! geometry.

mod split;

use std::fmt;
use std::time::Instant;

use kdray_math::{Axis, Bound, Vector, AXES};
use serde::{Deserialize, Serialize};

use crate::primitive::{ClipPlane, Clipped};

pub use split::Split;
use split::{find_split, SplitContext};

/// Tuning parameters for kd-tree construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Maximum number of interior levels
    pub max_depth: u32,
    /// Desired leaf size. Some leaves may be larger.
    pub leaf_size: usize,
    /// Number of bad splits before a branch is turned into a leaf
    pub fault_tolerance: u32,
    /// Largest node whose values are clipped
    pub clip_threshold: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: 64,
            leaf_size: 2,
            fault_tolerance: 2,
            clip_threshold: 32,
        }
    }
}

/// A collection of values the tree can partition.
pub trait KdData: Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extent of value `i` along `axis`.
    fn dimension(&self, i: usize, axis: Axis) -> (f64, f64);

    fn bound(&self, i: usize) -> Bound {
        let [x, y, z] = AXES.map(|axis| self.dimension(i, axis));
        Bound::new(Vector::new(x.0, y.0, z.0), Vector::new(x.1, y.1, z.1))
    }

    fn can_clip(&self) -> bool {
        false
    }

    /// Clip value `i` against `bound`. `None` drops the value from the node.
    fn clip(&self, i: usize, bound: &Bound, _plane: Option<ClipPlane>, _previous: Option<&[Vector]>) -> Option<Clipped> {
        let own = self.bound(i);
        if bound.min.cmpgt(own.max).any() || own.min.cmpgt(bound.max).any() {
            return None;
        }
        Some(Clipped {
            bound: own,
            polygon: None,
        })
    }
}

/// A kd-tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Interior {
        axis: Axis,
        pivot: f64,
        /// Values below the pivot
        left: Box<Node>,
        right: Box<Node>,
    },
    /// Indices into the source data
    Leaf(Vec<usize>),
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Number of interior levels below this node.
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf(_) => 0,
            Node::Interior { left, right, .. } => left.depth().max(right.depth()) + 1,
        }
    }

    fn counts(&self) -> (usize, usize) {
        match self {
            Node::Leaf(_) => (0, 1),
            Node::Interior { left, right, .. } => {
                let (li, ll) = left.counts();
                let (ri, rl) = right.counts();
                (li + ri + 1, ll + rl)
            }
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        match self {
            Node::Leaf(indices) => write!(f, "{indices:?}"),
            Node::Interior {
                axis,
                pivot,
                left,
                right,
            } => {
                let pad = "  ".repeat(indent);
                write!(f, "{{{axis} at {pivot:.2}\n{pad}  L: ")?;
                left.write_indented(f, indent + 1)?;
                write!(f, "\n{pad}  R: ")?;
                right.write_indented(f, indent + 1)?;
                write!(f, "\n{pad}}}")
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// An immutable kd-tree over the indices of a [`KdData`].
#[derive(Debug, Clone, PartialEq)]
pub struct KdTree {
    root: Node,
    bound: Bound,
}

/// A value in a node being built, with its bound clipped to the node so far.
#[derive(Clone)]
struct Item {
    index: usize,
    clip: Option<Clipped>,
}

impl Item {
    fn dimension<D: KdData + ?Sized>(&self, data: &D, axis: Axis) -> (f64, f64) {
        match &self.clip {
            Some(c) => (c.bound.lo(axis), c.bound.hi(axis)),
            None => data.dimension(self.index, axis),
        }
    }
}

/// Per-node build parameters. Each child receives its own copy.
#[derive(Debug, Clone, Copy)]
struct BuildState {
    options: Options,
    tree_bound: Bound,
    old_cost: f64,
    bad_refines: u32,
    depth: u32,
    /// Face of the node bound introduced by the parent split
    plane: Option<ClipPlane>,
}

impl KdTree {
    pub fn build<D: KdData + ?Sized>(data: &D, options: &Options) -> Self {
        let start = Instant::now();
        let n = data.len();
        let bound = (0..n)
            .map(|i| data.bound(i))
            .reduce(|a, b| Bound::union(&a, &b))
            .unwrap_or_default();
        let state = BuildState {
            options: *options,
            tree_bound: bound,
            old_cost: n as f64,
            bad_refines: 0,
            depth: 0,
            plane: None,
        };
        let items = (0..n).map(|index| Item { index, clip: None }).collect();
        let root = build_node(data, items, bound, state);

        let (interior, leaves) = root.counts();
        log::info!(
            "Built kd-tree over {n} values in {:?}: {interior} interior nodes, {leaves} leaves, depth {}",
            start.elapsed(),
            root.depth()
        );
        Self { root, bound }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Box enclosing every value in the tree.
    pub fn bound(&self) -> Bound {
        self.bound
    }

    /// Number of interior levels.
    pub fn depth(&self) -> usize {
        self.root.depth()
    }
}

impl fmt::Display for KdTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.fmt(f)
    }
}

fn build_node<D: KdData + ?Sized>(data: &D, mut items: Vec<Item>, mut bound: Bound, mut state: BuildState) -> Node {
    let opts = state.options;

    if items.len() <= opts.clip_threshold && data.can_clip() {
        if let Some(clipped) = clip_items(data, &mut items, &bound, &state) {
            let min = clipped.min.max(bound.min);
            let max = clipped.max.min(bound.max);
            if min.cmple(max).all() {
                bound = Bound::new(min, max);
            }
        }
    }

    if items.len() <= opts.leaf_size || state.depth >= opts.max_depth {
        return leaf(items);
    }

    let ctx = SplitContext {
        bound: &bound,
        depth: state.depth,
        max_depth: opts.max_depth,
    };
    let Some(split) = find_split(&ctx, items.len(), |k, axis| items[k].dimension(data, axis)) else {
        return leaf(items);
    };

    if split.cost > state.old_cost {
        state.bad_refines += 1;
    }
    if (split.cost > state.old_cost * 1.6 && items.len() < 16) || state.bad_refines >= opts.fault_tolerance {
        log::debug!("Faulted {} values at depth {}", items.len(), state.depth);
        return leaf(items);
    }

    let Split { axis, pivot, cost } = split;
    let mut left = Vec::with_capacity(items.len());
    let mut right = Vec::with_capacity(items.len());
    for item in items {
        let (lo, hi) = item.dimension(data, axis);
        let to_right = lo >= pivot || hi > pivot;
        if lo < pivot {
            if to_right {
                right.push(item.clone());
            }
            left.push(item);
        } else {
            right.push(item);
        }
    }

    let mut left_bound = bound;
    let mut right_bound = bound;
    left_bound.max[axis.index()] = pivot;
    right_bound.min[axis.index()] = pivot;

    state.old_cost = cost;
    state.depth += 1;
    let left_state = BuildState {
        plane: Some(ClipPlane { axis, lower: false }),
        ..state
    };
    let right_state = BuildState {
        plane: Some(ClipPlane { axis, lower: true }),
        ..state
    };

    let (left, right) = rayon::join(
        || build_node(data, left, left_bound, left_state),
        || build_node(data, right, right_bound, right_state),
    );
    Node::Interior {
        axis,
        pivot,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn leaf(items: Vec<Item>) -> Node {
    Node::Leaf(items.into_iter().map(|item| item.index).collect())
}

/// Clip every item against the node bound, dropping those that fall
/// outside. Returns the union of the surviving bounds.
fn clip_items<D: KdData + ?Sized>(data: &D, items: &mut Vec<Item>, node: &Bound, state: &BuildState) -> Option<Bound> {
    const TREE_SIZE_WEIGHT: f64 = 1e-5;
    const NODE_SIZE_WEIGHT: f64 = 0.021;

    let delta = state.tree_bound.size() * TREE_SIZE_WEIGHT + node.size() * NODE_SIZE_WEIGHT;
    let clip_box = Bound::new(node.min - delta, node.max + delta);

    let before = items.len();
    let mut union: Option<Bound> = None;
    items.retain_mut(|item| {
        let previous = item.clip.as_ref().and_then(|c| c.polygon.as_deref());
        let Some(clipped) = data.clip(item.index, &clip_box, state.plane, previous) else {
            return false;
        };
        union = Some(match union {
            Some(u) => Bound::union(&u, &clipped.bound),
            None => clipped.bound,
        });
        item.clip = Some(clipped);
        true
    });

    let dropped = before - items.len();
    if dropped > 0 {
        log::trace!("Clipped {dropped} values out of node");
    }
    union
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Points(Vec<Vector>);

    impl KdData for Points {
        fn len(&self) -> usize {
            self.0.len()
        }

        fn dimension(&self, i: usize, axis: Axis) -> (f64, f64) {
            let v = axis.of(self.0[i]);
            (v, v)
        }
    }

    struct Boxes(Vec<Bound>);

    impl KdData for Boxes {
        fn len(&self) -> usize {
            self.0.len()
        }

        fn dimension(&self, i: usize, axis: Axis) -> (f64, f64) {
            (self.0[i].lo(axis), self.0[i].hi(axis))
        }

        fn can_clip(&self) -> bool {
            true
        }
    }

    fn leaf_values(node: &Node, out: &mut Vec<usize>) {
        match node {
            Node::Leaf(indices) => out.extend(indices),
            Node::Interior { left, right, .. } => {
                leaf_values(left, out);
                leaf_values(right, out);
            }
        }
    }

    #[test]
    fn test_leaf_tree() {
        let pts = Points(vec![Vector::new(-1.0, 0.0, 0.0), Vector::new(1.0, 0.0, 0.0)]);
        let tree = KdTree::build(&pts, &Options::default());
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.root(), &Node::Leaf(vec![0, 1]));
    }

    #[test]
    fn test_bound() {
        let a = Vector::new(1.0, 2.0, 3.0);
        let b = Vector::new(4.0, 5.0, 6.0);
        let tree = KdTree::build(&Boxes(vec![Bound::new(a, b)]), &Options::default());
        assert_eq!(tree.bound(), Bound::new(a, b));
        let tree = KdTree::build(&Points(vec![a, b]), &Options::default());
        assert_eq!(tree.bound(), Bound::new(a, b));
    }

    #[test]
    fn test_tree() {
        let pts = Points(vec![
            Vector::new(-1.0, 0.0, 0.0),
            Vector::new(1.0, 0.0, 0.0),
            Vector::new(-2.0, 0.0, 0.0),
            Vector::new(2.0, 0.0, 0.0),
        ]);
        let tree = KdTree::build(&pts, &Options::default());
        let expected = Node::Interior {
            axis: Axis::X,
            pivot: -1.0,
            left: Box::new(Node::Leaf(vec![2])),
            right: Box::new(Node::Interior {
                axis: Axis::X,
                pivot: 1.0,
                left: Box::new(Node::Leaf(vec![0])),
                right: Box::new(Node::Leaf(vec![1, 3])),
            }),
        };
        assert_eq!(tree.root(), &expected, "\n{tree}");
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn test_empty() {
        let tree = KdTree::build(&Points(vec![]), &Options::default());
        assert_eq!(tree.root(), &Node::Leaf(vec![]));
        assert!(tree.bound().is_zero());
    }

    #[test]
    fn test_every_value_reaches_a_leaf() {
        let _ = env_logger::builder().is_test(true).try_init();
        let boxes: Vec<Bound> = (0..200)
            .map(|i| {
                let f = f64::from(i);
                let min = Vector::new((f * 0.37) % 10.0, (f * 0.73) % 10.0, (f * 0.11) % 10.0);
                Bound::new(min, min + Vector::splat(0.5))
            })
            .collect();
        let tree = KdTree::build(&Boxes(boxes), &Options::default());
        assert!(tree.depth() > 0);
        let mut seen = Vec::new();
        leaf_values(tree.root(), &mut seen);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn test_options_defaults() {
        let opts = Options {
            leaf_size: 1,
            ..Default::default()
        };
        assert_eq!(opts.max_depth, 64);
        assert_eq!(opts.clip_threshold, 32);
    }
}
