//! Shader node graphs.
//!
//! A material holds a handful of target nodes (diffuse colour, bump, ...).
//! The nodes they depend on form a DAG which is ordered once, when the
//! graph is built, and then evaluated front to back for every sample.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use kdray_math::{Rgb, Rgba};
use thiserror::Error;

use crate::state::RenderState;
use crate::surface::SurfacePoint;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderError {
    #[error("shader graph contains a cycle")]
    Cycle,
}

/// Output of a single node.
///
/// Colour nodes fill all four slots, scalar nodes only slot 0 and
/// derivative evaluation stores `(du, dv)` in slots 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShaderResult(pub [f64; 4]);

impl ShaderResult {
    pub fn from_scalar(s: f64) -> Self {
        Self([s, 0.0, 0.0, 0.0])
    }

    pub fn from_color(c: Rgba) -> Self {
        Self([c.r, c.g, c.b, c.a])
    }

    pub fn scalar(&self) -> f64 {
        self.0[0]
    }

    pub fn color(&self) -> Rgba {
        Rgba::new(self.0[0], self.0[1], self.0[2], self.0[3])
    }

    pub fn rgb(&self) -> Rgb {
        Rgb::new(self.0[0], self.0[1], self.0[2])
    }

    pub fn derivative(&self) -> (f64, f64) {
        (self.0[0], self.0[1])
    }
}

/// What a node can see while it is being evaluated.
#[derive(Clone, Copy)]
pub struct ShaderParams<'a, 'sp> {
    pub state: &'a RenderState,
    pub surface: &'a SurfacePoint<'sp>,
}

/// A node in a shader graph.
///
/// `inputs` holds the results of [`ShaderNode::dependencies`], in the
/// same order.
pub trait ShaderNode: Send + Sync {
    fn eval(&self, inputs: &[ShaderResult], params: &ShaderParams<'_, '_>) -> ShaderResult;

    fn eval_derivative(&self, _inputs: &[ShaderResult], _params: &ShaderParams<'_, '_>) -> ShaderResult {
        ShaderResult::default()
    }

    /// Whether the result depends on the viewing direction.
    fn view_dependent(&self) -> bool {
        false
    }

    fn dependencies(&self) -> Vec<Arc<dyn ShaderNode>> {
        Vec::new()
    }
}

/// Node that always returns the same colour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantNode(pub Rgba);

impl ShaderNode for ConstantNode {
    fn eval(&self, _inputs: &[ShaderResult], _params: &ShaderParams<'_, '_>) -> ShaderResult {
        ShaderResult::from_color(self.0)
    }
}

fn node_key(node: &Arc<dyn ShaderNode>) -> *const () {
    Arc::as_ptr(node) as *const ()
}

/// A set of target nodes together with everything they depend on, in
/// evaluation order.
pub struct ShaderGraph {
    /// Nodes in topological order
    nodes: Vec<Arc<dyn ShaderNode>>,
    /// For each node, the positions of its inputs in `nodes`
    inputs: Vec<Vec<usize>>,
    targets: Vec<usize>,
}

impl ShaderGraph {
    /// Collect the nodes reachable from `targets` and order them so every
    /// node comes after its dependencies. Nodes are identified by pointer,
    /// so a node shared by two branches is evaluated once.
    pub fn new(targets: &[Arc<dyn ShaderNode>]) -> Result<Self, ShaderError> {
        let mut index: HashMap<*const (), usize> = HashMap::new();
        let mut found: Vec<Arc<dyn ShaderNode>> = Vec::new();
        let mut deps: Vec<Vec<usize>> = Vec::new();

        let mut queue: VecDeque<Arc<dyn ShaderNode>> = VecDeque::new();
        for t in targets {
            if !index.contains_key(&node_key(t)) {
                index.insert(node_key(t), found.len());
                found.push(t.clone());
                queue.push_back(t.clone());
            }
        }
        // Discovery runs in insertion order, so `deps[i]` is pushed for
        // node `i` exactly when it is popped.
        while let Some(node) = queue.pop_front() {
            let mut node_deps = Vec::new();
            for d in node.dependencies() {
                let i = match index.get(&node_key(&d)) {
                    Some(&i) => i,
                    None => {
                        let i = found.len();
                        index.insert(node_key(&d), i);
                        found.push(d.clone());
                        queue.push_back(d);
                        i
                    }
                };
                node_deps.push(i);
            }
            deps.push(node_deps);
        }

        // Kahn's algorithm over the discovered nodes
        let n = found.len();
        let mut pending: Vec<usize> = deps.iter().map(Vec::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (i, ds) in deps.iter().enumerate() {
            for &d in ds {
                dependents[d].push(i);
            }
        }
        let mut ready: VecDeque<usize> = (0..n).filter(|&i| pending[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(i) = ready.pop_front() {
            order.push(i);
            for &j in &dependents[i] {
                pending[j] -= 1;
                if pending[j] == 0 {
                    ready.push_back(j);
                }
            }
        }
        if order.len() != n {
            return Err(ShaderError::Cycle);
        }

        let mut position = vec![0; n];
        for (pos, &i) in order.iter().enumerate() {
            position[i] = pos;
        }
        let nodes = order.iter().map(|&i| found[i].clone()).collect();
        let inputs = order
            .iter()
            .map(|&i| deps[i].iter().map(|&d| position[d]).collect())
            .collect();
        let targets = targets.iter().map(|t| position[index[&node_key(t)]]).collect();

        Ok(Self { nodes, inputs, targets })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True if any node in the graph depends on the viewing direction.
    pub fn view_dependent(&self) -> bool {
        self.nodes.iter().any(|n| n.view_dependent())
    }

    fn eval_all(&self, params: &ShaderParams<'_, '_>) -> Vec<ShaderResult> {
        let mut results: Vec<ShaderResult> = Vec::with_capacity(self.nodes.len());
        let mut args = Vec::new();
        for (node, inputs) in self.nodes.iter().zip(&self.inputs) {
            args.clear();
            args.extend(inputs.iter().map(|&i| results[i]));
            results.push(node.eval(&args, params));
        }
        results
    }

    /// Evaluate the graph and return one result per target.
    pub fn eval(&self, params: &ShaderParams<'_, '_>) -> Vec<ShaderResult> {
        let results = self.eval_all(params);
        self.targets.iter().map(|&t| results[t]).collect()
    }

    /// Evaluate the graph, then return the derivative of each target.
    pub fn eval_derivative(&self, params: &ShaderParams<'_, '_>) -> Vec<ShaderResult> {
        let results = self.eval_all(params);
        self.targets
            .iter()
            .map(|&t| {
                let args: Vec<ShaderResult> = self.inputs[t].iter().map(|&i| results[i]).collect();
                self.nodes[t].eval_derivative(&args, params)
            })
            .collect()
    }
}
