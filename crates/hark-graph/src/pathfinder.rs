//! Bidirectional Dijkstra between two leaves.
//!
//! Two searches grow at once, one rooted at the source and one at the
//! target, each with its own min-heap. The side with the smaller frontier
//! key expands next. Whenever an edge relaxation reaches a leaf the other
//! side has already touched, the combined distance is a candidate for the
//! best path. The search stops once the two frontier keys sum to at least
//! the best candidate, or either heap runs dry.
//!
//! Heap entries are never updated in place; a stale entry (leaf already
//! settled, or a shorter distance recorded since) is skipped when it
//! surfaces. Per-leaf state lives in [`StampedSlots`], so starting a new
//! search costs O(1) regardless of how many leaves the last one touched.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use smallvec::SmallVec;

use hark_arena::StampedSlots;
use hark_core::{GraphIndex, GraphScalar, LeafId};

use crate::view::WeightedView;

/// Leaves along one half of a path, root first.
pub type PathChain = SmallVec<[LeafId; 16]>;

const NO_PARENT: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Frontier {
    dist: f64,
    leaf: u32,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    // Reversed so `BinaryHeap` pops the smallest distance first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.leaf.cmp(&self.leaf))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

struct SearchSide {
    dist: StampedSlots<f64>,
    parent: StampedSlots<u32>,
    settled: StampedSlots<bool>,
    heap: BinaryHeap<Frontier>,
}

impl SearchSide {
    fn new(num_leafs: usize) -> Self {
        Self {
            dist: StampedSlots::new(num_leafs, f64::INFINITY),
            parent: StampedSlots::new(num_leafs, NO_PARENT),
            settled: StampedSlots::new(num_leafs, false),
            heap: BinaryHeap::new(),
        }
    }

    fn start(&mut self, root: usize) {
        self.dist.reset();
        self.parent.reset();
        self.settled.reset();
        self.heap.clear();
        self.dist.set(root, 0.0);
        self.heap.push(Frontier {
            dist: 0.0,
            leaf: root as u32,
        });
    }

    /// Smallest live frontier key, discarding stale entries on the way.
    fn top(&mut self) -> Option<f64> {
        while let Some(&top) = self.heap.peek() {
            let leaf = top.leaf as usize;
            if self.settled.get(leaf) || top.dist > self.dist.get(leaf) {
                self.heap.pop();
            } else {
                return Some(top.dist);
            }
        }
        None
    }

    /// Parent chain from `root` to `leaf`, root first.
    fn chain(&self, root: usize, leaf: usize) -> PathChain {
        let mut chain = PathChain::new();
        let mut cur = leaf;
        chain.push(LeafId(cur as u32));
        while cur != root {
            let parent = self.parent.get(cur);
            if parent == NO_PARENT {
                break;
            }
            cur = parent as usize;
            chain.push(LeafId(cur as u32));
        }
        chain.reverse();
        chain
    }
}

/// A path found by [`PathFinder::search`].
#[derive(Clone, Debug, PartialEq)]
pub struct PathResult {
    distance: f64,
    meeting: LeafId,
    direct: PathChain,
    reverse: PathChain,
}

impl PathResult {
    /// Total weight of the path.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Leaf where the two searches met.
    pub fn meeting(&self) -> LeafId {
        self.meeting
    }

    /// Chain of the search rooted at the source: `[source .. meeting]`.
    pub fn direct_chain(&self) -> &[LeafId] {
        &self.direct
    }

    /// Chain of the search rooted at the target: `[target .. meeting]`.
    pub fn reverse_chain(&self) -> &[LeafId] {
        &self.reverse
    }

    /// Full path `[source .. meeting .. target]`.
    pub fn path(&self) -> Vec<LeafId> {
        let mut path = Vec::with_capacity(self.direct.len() + self.reverse.len() - 1);
        path.extend_from_slice(&self.direct);
        path.extend(self.reverse.iter().rev().skip(1));
        path
    }
}

/// Reusable bidirectional search state for one task.
pub struct PathFinder {
    forward: SearchSide,
    backward: SearchSide,
    num_leafs: usize,
    searches: u64,
}

impl PathFinder {
    /// Scratch sized for graphs of `num_leafs` leaves.
    pub fn new(num_leafs: usize) -> Self {
        Self {
            forward: SearchSide::new(num_leafs),
            backward: SearchSide::new(num_leafs),
            num_leafs,
            searches: 0,
        }
    }

    /// Searches run so far.
    pub fn searches(&self) -> u64 {
        self.searches
    }

    /// Scratch memory in bytes.
    pub fn memory_bytes(&self) -> usize {
        let side = |s: &SearchSide| {
            s.dist.memory_bytes() + s.parent.memory_bytes() + s.settled.memory_bytes()
        };
        side(&self.forward) + side(&self.backward)
    }

    /// Shortest path from `from` to `to` under the view's current weights.
    ///
    /// Returns `None` if either leaf is invalid for the graph or no path
    /// exists.
    pub fn search<D: GraphScalar, O: GraphIndex>(
        &mut self,
        view: &WeightedView<D, O>,
        from: LeafId,
        to: LeafId,
    ) -> Option<PathResult> {
        let graph = view.graph();
        let n = graph.num_leafs();
        if !from.is_valid_for(n) || !to.is_valid_for(n) {
            return None;
        }
        if n != self.num_leafs {
            *self = Self {
                searches: self.searches,
                ..Self::new(n)
            };
        }
        self.searches += 1;

        let (a, b) = (from.index(), to.index());
        if a == b {
            let chain: PathChain = smallvec::smallvec![from];
            return Some(PathResult {
                distance: 0.0,
                meeting: from,
                direct: chain.clone(),
                reverse: chain,
            });
        }

        self.forward.start(a);
        self.backward.start(b);
        let mut best = f64::INFINITY;
        let mut meeting = None;

        loop {
            let (Some(top_fwd), Some(top_bwd)) = (self.forward.top(), self.backward.top()) else {
                break;
            };
            if top_fwd + top_bwd >= best {
                break;
            }

            let (side, other) = if top_fwd <= top_bwd {
                (&mut self.forward, &self.backward)
            } else {
                (&mut self.backward, &self.forward)
            };
            let Some(Frontier { dist: du, leaf }) = side.heap.pop() else {
                break;
            };
            let u = leaf as usize;
            side.settled.set(u, true);

            for v in graph.neighbors(u).iter().map(|v| v.to_usize()) {
                if side.settled.get(v) {
                    continue;
                }
                let candidate = du + view.weight(u, v);
                if candidate < side.dist.get(v) {
                    side.dist.set(v, candidate);
                    side.parent.set(v, leaf);
                    side.heap.push(Frontier {
                        dist: candidate,
                        leaf: v as u32,
                    });
                }
                let combined = side.dist.get(v) + other.dist.get(v);
                if combined < best {
                    best = combined;
                    meeting = Some(v);
                }
            }
        }

        let meet = meeting?;
        Some(PathResult {
            distance: self.forward.dist.get(meet) + self.backward.dist.get(meet),
            meeting: LeafId(meet as u32),
            direct: self.forward.chain(a, meet),
            reverse: self.backward.chain(b, meet),
        })
    }
}
