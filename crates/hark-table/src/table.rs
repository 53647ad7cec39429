//! The dense per-pair propagation table.

use hark_arena::try_vec;
use hark_core::{GraphIndex, GraphScalar, LeafId, Vec3};
use hark_graph::LeafGraph;

use crate::error::TableError;
use crate::props::PropagationProps;

/// Accepted range for the length of a stored indirect direction.
pub const DIRECTION_LENGTH_RANGE: std::ops::RangeInclusive<f32> = 0.8..=1.2;

/// Distance and arrival direction of an indirect path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndirectPath {
    /// Unit direction sound arrives from, as seen from the listener leaf.
    pub direction: Vec3,
    /// Approximate travel distance.
    pub distance: f32,
}

/// `N × N` propagation properties, row-major by source leaf.
#[derive(Clone, Debug, PartialEq)]
pub struct PropagationTable {
    num_leafs: usize,
    props: Vec<PropagationProps>,
    dummy: bool,
}

impl PropagationTable {
    /// A table of `num_leafs` leaves with no paths.
    pub fn new(num_leafs: usize) -> Result<Self, TableError> {
        // An overflowing product is reported by the allocator as too large.
        let cells = num_leafs.saturating_mul(num_leafs);
        Ok(Self {
            num_leafs,
            props: try_vec(cells, PropagationProps::NONE)?,
            dummy: false,
        })
    }

    /// Placeholder table with the single reserved leaf.
    pub fn dummy() -> Self {
        Self {
            num_leafs: 1,
            props: vec![PropagationProps::NONE],
            dummy: true,
        }
    }

    /// Decode a table from packed entries, rejecting any malformed entry.
    pub fn from_packed(num_leafs: usize, packed: &[u32]) -> Result<Self, TableError> {
        let expected = num_leafs.saturating_mul(num_leafs);
        if packed.len() != expected {
            return Err(TableError::SizeMismatch {
                expected,
                actual: packed.len(),
            });
        }
        let props = packed
            .iter()
            .map(|&bits| PropagationProps::unpack(bits))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            num_leafs,
            props,
            dummy: false,
        })
    }

    /// Leaf count `N`.
    pub fn num_leafs(&self) -> usize {
        self.num_leafs
    }

    /// Whether this is the placeholder table.
    pub fn is_dummy(&self) -> bool {
        self.dummy
    }

    /// Entries in row-major order.
    pub fn props(&self) -> &[PropagationProps] {
        &self.props
    }

    /// Packed entries in row-major order.
    pub fn packed(&self) -> impl ExactSizeIterator<Item = u32> + '_ {
        self.props.iter().map(PropagationProps::pack)
    }

    /// Properties of the pair, or `None` for invalid leaves.
    pub fn get(&self, from: LeafId, to: LeafId) -> Option<PropagationProps> {
        if !from.is_valid_for(self.num_leafs) || !to.is_valid_for(self.num_leafs) {
            return None;
        }
        Some(self.props[from.index() * self.num_leafs + to.index()])
    }

    pub(crate) fn set(&mut self, from: usize, to: usize, props: PropagationProps) {
        self.props[from * self.num_leafs + to] = props;
    }

    /// Whether sound reaches `to` from `from` in a straight line. A leaf
    /// always reaches itself.
    pub fn has_direct_path(&self, from: LeafId, to: LeafId) -> bool {
        if from == to {
            return from.is_valid_for(self.num_leafs);
        }
        self.get(from, to).is_some_and(|p| p.has_direct_path())
    }

    /// Whether sound reaches `to` from `from` only around corners.
    pub fn has_indirect_path(&self, from: LeafId, to: LeafId) -> bool {
        from != to && self.get(from, to).is_some_and(|p| p.has_indirect_path())
    }

    /// Distance and direction of the indirect path, if there is one.
    pub fn indirect_path_props(&self, from: LeafId, to: LeafId) -> Option<IndirectPath> {
        if from == to {
            return None;
        }
        let props = self.get(from, to).filter(|p| p.has_indirect_path())?;
        Some(IndirectPath {
            direction: props.direction(),
            distance: props.distance(),
        })
    }

    /// Count of `(direct, indirect)` ordered pairs.
    pub fn path_counts(&self) -> (usize, usize) {
        self.props.iter().fold((0, 0), |(d, i), p| {
            (
                d + usize::from(p.has_direct_path()),
                i + usize::from(p.has_indirect_path()),
            )
        })
    }

    /// Memory used by the entries in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.props.len() * std::mem::size_of::<PropagationProps>()
    }

    /// Check symmetry, flag exclusivity and stored direction lengths.
    pub fn validate(&self) -> Result<(), TableError> {
        let n = self.num_leafs;
        let expected = n.saturating_mul(n);
        if self.props.len() != expected {
            return Err(TableError::SizeMismatch {
                expected,
                actual: self.props.len(),
            });
        }
        for i in 1..n {
            for j in 1..n {
                let p = self.props[i * n + j];
                let (from, to) = (i as u32, j as u32);
                if p.has_direct_path() && p.has_indirect_path() {
                    return Err(TableError::NotExclusive { from, to });
                }
                let q = self.props[j * n + i];
                if p.has_direct_path() != q.has_direct_path()
                    || p.has_indirect_path() != q.has_indirect_path()
                    || p.quantized_distance() != q.quantized_distance()
                {
                    return Err(TableError::Asymmetric { from, to });
                }
                if p.has_indirect_path() {
                    let length = p.raw_direction().length();
                    if !DIRECTION_LENGTH_RANGE.contains(&length) {
                        return Err(TableError::DirectionMagnitude { from, to, length });
                    }
                }
            }
        }
        Ok(())
    }

    /// Check the path flags against `graph`: every edge is direct, every
    /// other connected pair is indirect, and unconnected pairs have no path.
    pub fn validate_reachability<D: GraphScalar, O: GraphIndex>(
        &self,
        graph: &LeafGraph<D, O>,
    ) -> Result<(), TableError> {
        let n = self.num_leafs;
        if graph.num_leafs() != n {
            return Err(TableError::SizeMismatch {
                expected: graph.num_leafs().saturating_mul(graph.num_leafs()),
                actual: self.props.len(),
            });
        }
        let component = components(graph);
        for i in 1..n {
            for j in 1..n {
                if i == j {
                    continue;
                }
                let p = self.props[i * n + j];
                let (from, to) = (i as u32, j as u32);
                let connected = component[i] == component[j];
                if connected && !p.has_direct_path() && !p.has_indirect_path() {
                    return Err(TableError::MissingPath { from, to });
                }
                let edge = graph.has_edge(i, j);
                if p.has_direct_path() != edge || p.has_indirect_path() != (connected && !edge) {
                    return Err(TableError::UnexpectedPath { from, to });
                }
            }
        }
        Ok(())
    }
}

/// Connected component label of every leaf.
fn components<D: GraphScalar, O: GraphIndex>(graph: &LeafGraph<D, O>) -> Vec<usize> {
    let n = graph.num_leafs();
    let mut label = vec![usize::MAX; n];
    let mut stack = Vec::new();
    for root in 0..n {
        if label[root] != usize::MAX {
            continue;
        }
        label[root] = root;
        stack.push(root);
        while let Some(leaf) = stack.pop() {
            for next in graph.neighbors(leaf) {
                let next = next.to_usize();
                if label[next] == usize::MAX {
                    label[next] = root;
                    stack.push(next);
                }
            }
        }
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> PropagationTable {
        let mut t = PropagationTable::new(4).unwrap();
        t.set(1, 2, PropagationProps::DIRECT);
        t.set(2, 1, PropagationProps::DIRECT);
        t.set(1, 3, PropagationProps::indirect(Vec3::new(1.0, 0.0, 0.0), 64.0));
        t.set(3, 1, PropagationProps::indirect(Vec3::new(0.0, 1.0, 0.0), 64.0));
        t
    }

    #[test]
    fn queries() {
        let t = small();
        assert!(t.has_direct_path(LeafId(1), LeafId(2)));
        assert!(!t.has_indirect_path(LeafId(1), LeafId(2)));
        assert!(t.has_indirect_path(LeafId(3), LeafId(1)));
        let p = t.indirect_path_props(LeafId(1), LeafId(3)).unwrap();
        assert_eq!(p.distance, 64.0);
        assert_eq!(p.direction, Vec3::new(1.0, 0.0, 0.0));
        assert!(t.indirect_path_props(LeafId(1), LeafId(2)).is_none());
        assert!(!t.has_direct_path(LeafId(2), LeafId(3)));
        assert_eq!(t.path_counts(), (2, 2));
        assert!(t.validate().is_ok());
    }

    #[test]
    fn same_leaf_is_trivially_direct() {
        let t = small();
        assert!(t.has_direct_path(LeafId(3), LeafId(3)));
        assert!(!t.has_indirect_path(LeafId(3), LeafId(3)));
        assert!(t.indirect_path_props(LeafId(3), LeafId(3)).is_none());
    }

    #[test]
    fn invalid_leaves_answer_nothing() {
        let t = small();
        assert!(!t.has_direct_path(LeafId(0), LeafId(0)));
        assert!(!t.has_direct_path(LeafId(1), LeafId(9)));
        assert!(t.get(LeafId(0), LeafId(1)).is_none());
        assert!(t.indirect_path_props(LeafId(9), LeafId(1)).is_none());
    }

    #[test]
    fn dummy_answers_nothing() {
        let t = PropagationTable::dummy();
        assert!(t.is_dummy());
        assert!(!t.has_direct_path(LeafId(1), LeafId(2)));
        assert!(t.validate().is_ok());
    }

    #[test]
    fn asymmetry_is_detected() {
        let mut t = small();
        t.set(2, 1, PropagationProps::NONE);
        assert_eq!(t.validate(), Err(TableError::Asymmetric { from: 1, to: 2 }));
    }

    #[test]
    fn short_direction_is_detected() {
        let mut t = small();
        let weak = PropagationProps::indirect(Vec3::new(0.5, 0.0, 0.0), 64.0);
        t.set(1, 3, weak);
        assert!(matches!(
            t.validate(),
            Err(TableError::DirectionMagnitude { from: 1, to: 3, .. })
        ));
    }

    #[test]
    fn reachability_is_checked_against_the_graph() {
        // Chain 1-2-3: small() lacks the 2-3 edge.
        let g = hark_test_utils::fixtures::chain_graph(3, 10.0);
        let mut t = small();
        assert_eq!(
            t.validate_reachability(&g),
            Err(TableError::MissingPath { from: 2, to: 3 })
        );
        t.set(2, 3, PropagationProps::DIRECT);
        t.set(3, 2, PropagationProps::DIRECT);
        assert_eq!(t.validate_reachability(&g), Ok(()));

        // An indirect entry where the graph has an edge.
        let indirect = PropagationProps::indirect(Vec3::new(1.0, 0.0, 0.0), 16.0);
        t.set(2, 3, indirect);
        t.set(3, 2, indirect);
        assert_eq!(
            t.validate_reachability(&g),
            Err(TableError::UnexpectedPath { from: 2, to: 3 })
        );
    }

    #[test]
    fn reachability_rejects_paths_between_components() {
        let points = [Vec3::ZERO, Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Vec3::new(90.0, 0.0, 0.0)];
        let g = hark_test_utils::fixtures::graph_from_points(&points, &[(1, 2)]);
        assert_eq!(
            small().validate_reachability(&g),
            Err(TableError::UnexpectedPath { from: 1, to: 3 })
        );
        let wrong_size = hark_test_utils::fixtures::chain_graph(5, 10.0);
        assert!(matches!(
            small().validate_reachability(&wrong_size),
            Err(TableError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn packed_round_trip() {
        let t = small();
        let packed: Vec<u32> = t.packed().collect();
        let back = PropagationTable::from_packed(4, &packed).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn packed_with_wrong_length_is_rejected() {
        let err = PropagationTable::from_packed(4, &[0; 15]).unwrap_err();
        assert_eq!(err, TableError::SizeMismatch { expected: 16, actual: 15 });
    }

    #[test]
    fn packed_with_both_flags_is_rejected() {
        let mut packed = vec![0u32; 9];
        packed[4] = 0b11;
        assert!(matches!(
            PropagationTable::from_packed(3, &packed),
            Err(TableError::ConflictingFlags { .. })
        ));
    }
}
