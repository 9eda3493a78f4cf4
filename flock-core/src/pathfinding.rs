//! A* over an arena-owned graph of points.
//!
//! Nodes are plain graph structure. Everything a search writes (costs,
//! parents, open/closed state) lives in a [`SearchScratch`] owned by the
//! search, so any number of searches may share one `&Graph`.
//!
//! Costs are computed on the x/y plane only: positions are projected to 2D
//! grid coordinates and measured with the integer octile metric
//! `14 * min(dx, dy) + 10 * (max(dx, dy) - min(dx, dy))`.

use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::Reverse;

use crate::vector::Vector3D;

/// Handle to a node inside one [`Graph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathNode {
    pub point: Vector3D,
    pub walkable: bool,
    neighbors: Vec<NodeId>,
}

impl PathNode {
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }
}

#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<PathNode>,
    grid_width: Option<usize>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, point: Vector3D) -> NodeId {
        self.nodes.push(PathNode {
            point,
            walkable: true,
            neighbors: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Edge from `a` to `b` only. Duplicate edges and self loops are
    /// ignored. Returns `false` if either id is not a node of this graph.
    pub fn connect_directed(&mut self, a: NodeId, b: NodeId) -> bool {
        if b.0 >= self.nodes.len() {
            return false;
        }
        let Some(node) = self.nodes.get_mut(a.0) else {
            return false;
        };
        if a != b && !node.neighbors.contains(&b) {
            node.neighbors.push(b);
        }
        true
    }

    /// Edges both ways
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> bool {
        self.connect_directed(a, b) && self.connect_directed(b, a)
    }

    /// Returns `false` if `id` is not a node of this graph
    pub fn set_walkable(&mut self, id: NodeId, walkable: bool) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(node) => {
                node.walkable = walkable;
                true
            }
            None => false,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&PathNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Build a `width` x `height` lattice with one node per cell at integer
    /// coordinates `(x, y, 0)`. Cells are linked to their 4 orthogonal
    /// neighbours, plus the 4 diagonal ones when `diagonal` is set.
    pub fn grid<F>(width: usize, height: usize, diagonal: bool, walkable: F) -> Self
    where
        F: Fn(usize, usize) -> bool,
    {
        let mut graph = Graph {
            nodes: Vec::with_capacity(width * height),
            grid_width: Some(width),
        };

        for y in 0..height {
            for x in 0..width {
                let id = graph.add_node(Vector3D::planar(x as f32, y as f32));
                graph.set_walkable(id, walkable(x, y));
            }
        }

        for y in 0..height {
            for x in 0..width {
                let here = NodeId(y * width + x);
                for dy in -1isize..=1 {
                    for dx in -1isize..=1 {
                        if (dx == 0 && dy == 0) || (!diagonal && dx != 0 && dy != 0) {
                            continue;
                        }
                        let nx = x as isize + dx;
                        let ny = y as isize + dy;
                        if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                            continue;
                        }
                        graph.connect_directed(here, NodeId(ny as usize * width + nx as usize));
                    }
                }
            }
        }

        graph
    }

    /// Node at grid cell `(x, y)`; `None` for graphs not built by [`Graph::grid`]
    pub fn node_at(&self, x: usize, y: usize) -> Option<NodeId> {
        let width = self.grid_width?;
        if x >= width {
            return None;
        }
        let index = y.checked_mul(width)?.checked_add(x)?;
        (index < self.nodes.len()).then_some(NodeId(index))
    }
}

/// Octile distance between the 2D grid projections of two points. Axis
/// deltas are truncated to integers first.
pub fn grid_distance(a: Vector3D, b: Vector3D) -> u32 {
    let dx = (a.x as i32).abs_diff(b.x as i32);
    let dy = (a.y as i32).abs_diff(b.y as i32);
    let (short, long) = if dx > dy { (dy, dx) } else { (dx, dy) };
    14 * short + 10 * (long - short)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Unvisited,
    Open,
    Closed,
}

/// Per-node bookkeeping for a single search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeRecord {
    pub g_cost: u32,
    pub h_cost: u32,
    pub parent: Option<NodeId>,
    pub state: NodeState,
    /// When the node first entered the open set; breaks remaining ties
    open_order: u64,
}

impl NodeRecord {
    pub fn f_cost(&self) -> u32 {
        self.g_cost.saturating_add(self.h_cost)
    }
}

/// Search state keyed by node id, reinitialized for every search
#[derive(Debug, Clone, Default)]
pub struct SearchScratch {
    records: Vec<NodeRecord>,
}

impl SearchScratch {
    fn reset(&mut self, len: usize) {
        self.records.clear();
        self.records.resize(len, NodeRecord::default());
    }

    pub fn record(&self, id: NodeId) -> Option<&NodeRecord> {
        self.records.get(id.0)
    }
}

type OpenEntry = Reverse<(u32, u32, u64, usize)>;

/// Reusable A* searcher. Keeps its buffers between calls but never its
/// results: every search starts from a clean scratch.
#[derive(Debug, Default)]
pub struct AStar {
    scratch: SearchScratch,
    open: BinaryHeap<OpenEntry>,
}

impl AStar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scratch left behind by the last search
    pub fn scratch(&self) -> &SearchScratch {
        &self.scratch
    }

    /// Lowest-cost path from `start` to `goal`, start excluded and goal
    /// included. `None` when the goal cannot be reached.
    ///
    /// The open node expanded next is the one with the lowest f cost, then
    /// the lowest h cost, then whichever entered the open set first.
    pub fn find_path(&mut self, graph: &Graph, start: NodeId, goal: NodeId) -> Option<Vec<NodeId>> {
        let goal_point = graph.node(goal)?.point;
        graph.node(start)?;

        self.scratch.reset(graph.len());
        self.open.clear();
        let mut next_order = 0u64;

        {
            let record = &mut self.scratch.records[start.0];
            record.h_cost = grid_distance(graph.nodes[start.0].point, goal_point);
            record.state = NodeState::Open;
            record.open_order = next_order;
            self.open
                .push(Reverse((record.f_cost(), record.h_cost, record.open_order, start.0)));
            next_order += 1;
        }

        while let Some(Reverse((f, h, _, index))) = self.open.pop() {
            let record = self.scratch.records[index];
            // Stale heap entry left behind by a cost improvement or a closure
            if record.state != NodeState::Open || record.f_cost() != f || record.h_cost != h {
                continue;
            }

            let current = NodeId(index);
            self.scratch.records[index].state = NodeState::Closed;

            if current == goal {
                let path = self.retrace(start, goal);
                log::debug!("a* reached goal {:?} in {} steps", goal, path.len());
                return Some(path);
            }

            let current_point = graph.nodes[index].point;
            for &neighbor in graph.nodes[index].neighbors() {
                let node = &graph.nodes[neighbor.0];
                let entry = &mut self.scratch.records[neighbor.0];
                if !node.walkable || entry.state == NodeState::Closed {
                    continue;
                }

                let tentative = record
                    .g_cost
                    .saturating_add(grid_distance(current_point, node.point));
                let is_open = entry.state == NodeState::Open;
                if tentative < entry.g_cost || !is_open {
                    entry.g_cost = tentative;
                    entry.h_cost = grid_distance(node.point, goal_point);
                    entry.parent = Some(current);
                    if !is_open {
                        entry.state = NodeState::Open;
                        entry.open_order = next_order;
                        next_order += 1;
                    }
                    self.open
                        .push(Reverse((entry.f_cost(), entry.h_cost, entry.open_order, neighbor.0)));
                }
            }
        }

        log::debug!("a* found no path from {:?} to {:?}", start, goal);
        None
    }

    fn retrace(&self, start: NodeId, goal: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = goal;
        while current != start {
            path.push(current);
            match self.scratch.records[current.0].parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        path.reverse();
        path
    }
}

/// One-shot search with a fresh [`AStar`]
pub fn find_path(graph: &Graph, start: NodeId, goal: NodeId) -> Option<Vec<NodeId>> {
    AStar::new().find_path(graph, start, goal)
}
