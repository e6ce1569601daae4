//! Shortest-path search over a weighted [`RoutingGraph`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;

use crate::geodesy::Coordinate;
use crate::graph::RoutingGraph;
use crate::weight::WeightFn;

/// Path found by a [`PathEngine`].
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    /// Vertices along the path, in graph (possibly shifted) coordinates.
    pub path: Vec<Coordinate>,
    /// Sum of edge weights in meters.
    pub weight: f64,
}

/// Search structure for one routing profile.
pub trait PathEngine: Send + Sync {
    /// Find the lowest-weight path between two graph vertices.
    ///
    /// Returns `None` if either point is not a vertex or no finite-weight path
    /// connects them.
    fn find_path(&self, a: Coordinate, b: Coordinate) -> Option<PathResult>;
}

/// Dijkstra search with edge weights evaluated once at construction.
pub struct DijkstraEngine {
    graph: Arc<RoutingGraph>,
    weights: Vec<f64>,
}

impl DijkstraEngine {
    pub fn new(graph: Arc<RoutingGraph>, weight_fn: &WeightFn) -> Self {
        let weights = graph.edge_weights(weight_fn);
        Self { graph, weights }
    }

    /// Number of edges a search may traverse.
    pub fn usable_edge_count(&self) -> usize {
        self.weights.iter().filter(|w| w.is_finite()).count()
    }

    fn search(&self, start: usize, goal: usize) -> Option<(Vec<usize>, f64)> {
        if start == goal {
            return Some((vec![start], 0.0));
        }

        let vertex_count = self.graph.vertex_count();
        let mut distances = vec![f64::INFINITY; vertex_count];
        let mut parents: Vec<Option<usize>> = vec![None; vertex_count];
        let mut queue = BinaryHeap::new();

        distances[start] = 0.0;
        queue.push(QueueEntry::new(start, 0.0));

        while let Some(entry) = queue.pop() {
            let current_distance = distances[entry.node];
            if entry.cost.0 > current_distance {
                continue;
            }

            if entry.node == goal {
                return Some((reconstruct_path(&parents, start, goal), current_distance));
            }

            for &(next, edge) in self.graph.neighbours(entry.node) {
                let weight = self.weights[edge];
                if !weight.is_finite() {
                    continue;
                }

                let next_cost = current_distance + weight;
                if next_cost < distances[next] {
                    distances[next] = next_cost;
                    parents[next] = Some(entry.node);
                    queue.push(QueueEntry::new(next, next_cost));
                }
            }
        }

        None
    }
}

impl PathEngine for DijkstraEngine {
    fn find_path(&self, a: Coordinate, b: Coordinate) -> Option<PathResult> {
        let start = self.graph.vertex_at(a)?;
        let goal = self.graph.vertex_at(b)?;
        let (vertices, weight) = self.search(start, goal)?;
        let path = vertices
            .into_iter()
            .filter_map(|vertex| self.graph.vertex(vertex))
            .collect();
        Some(PathResult { path, weight })
    }
}

impl std::fmt::Debug for DijkstraEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DijkstraEngine")
            .field("graph", &self.graph)
            .field("usable_edges", &self.usable_edge_count())
            .finish()
    }
}

fn reconstruct_path(parents: &[Option<usize>], start: usize, goal: usize) -> Vec<usize> {
    let mut path = Vec::new();
    let mut current = Some(goal);
    while let Some(node) = current {
        path.push(node);
        if node == start {
            break;
        }
        current = parents[node];
    }
    path.reverse();
    path
}

#[derive(Copy, Clone, Debug, Default)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct QueueEntry {
    node: usize,
    cost: FloatOrd,
}

impl QueueEntry {
    fn new(node: usize, cost: f64) -> Self {
        Self {
            node,
            cost: FloatOrd(cost),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering so BinaryHeap becomes a min-heap by cost.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
