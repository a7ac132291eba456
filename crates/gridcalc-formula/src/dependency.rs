//! Dependency tracking for formula calculation

use crate::error::CircularDependencyError;
use ahash::{AHashMap, AHashSet};
use gridcalc_core::CellAddress;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

/// Dependency graph for formula cells
///
/// Tracks which cells depend on which other cells, enabling ordered recalculation.
/// Every forward edge has a mirrored reverse edge; all mutation goes through
/// [`set_dependencies`](Self::set_dependencies) and [`remove_cell`](Self::remove_cell)
/// to keep the two maps in step. A cell with no entry has no edges.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    /// Cell → Cells it reads
    dependencies: AHashMap<CellAddress, AHashSet<CellAddress>>,
    /// Cell → Cells that read it
    dependents: AHashMap<CellAddress, AHashSet<CellAddress>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of cells `cell` reads
    ///
    /// Previous forward edges of `cell` and their reverse entries are dropped first, so
    /// edge sets never accumulate. Cells that read `cell` keep their edges.
    pub fn set_dependencies(
        &mut self,
        cell: CellAddress,
        deps: impl IntoIterator<Item = CellAddress>,
    ) {
        self.clear_dependencies(cell);

        let deps: AHashSet<CellAddress> = deps.into_iter().collect();
        for &dep in &deps {
            self.dependents.entry(dep).or_default().insert(cell);
        }
        if !deps.is_empty() {
            self.dependencies.insert(cell, deps);
        }
    }

    /// Delete every edge touching `cell`, in both directions
    pub fn remove_cell(&mut self, cell: CellAddress) {
        self.clear_dependencies(cell);

        // Remove as a dependency of others
        if let Some(readers) = self.dependents.remove(&cell) {
            for reader in readers {
                remove_edge(&mut self.dependencies, reader, cell);
            }
        }
    }

    fn clear_dependencies(&mut self, cell: CellAddress) {
        if let Some(old) = self.dependencies.remove(&cell) {
            for dep in old {
                remove_edge(&mut self.dependents, dep, cell);
            }
        }
    }

    /// Cells that directly read `cell`
    pub fn dependents_of(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.dependents
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Cells that `cell` directly reads
    pub fn dependencies(&self, cell: CellAddress) -> impl Iterator<Item = CellAddress> + '_ {
        self.dependencies
            .get(&cell)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Whether any edge touches `cell`
    pub fn contains(&self, cell: CellAddress) -> bool {
        self.dependencies.contains_key(&cell) || self.dependents.contains_key(&cell)
    }

    /// Whether the graph has no edges
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Number of recorded edges
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(|set| set.len()).sum()
    }

    /// The seeds plus every cell that transitively reads one of them
    pub fn affected(&self, seeds: impl IntoIterator<Item = CellAddress>) -> AHashSet<CellAddress> {
        let mut affected = AHashSet::new();
        let mut stack: Vec<CellAddress> = seeds.into_iter().collect();

        while let Some(cell) = stack.pop() {
            if affected.insert(cell) {
                stack.extend(self.dependents_of(cell));
            }
        }

        affected
    }

    fn nodes(&self) -> AHashSet<CellAddress> {
        self.dependencies
            .keys()
            .chain(self.dependents.keys())
            .copied()
            .collect()
    }

    /// Order cells so that each comes after every cell it reads
    ///
    /// Kahn's algorithm always runs over the whole graph, so a cycle anywhere fails the
    /// call. With a restriction the order is then filtered to the restriction set and its
    /// transitive dependents; the restriction cells are always included. Among cells that
    /// are ready at the same time, the smallest (row, column) goes first.
    ///
    /// On failure the error lists every cell that could not be ordered and the prefix
    /// that could, filtered the same way.
    pub fn topological_order(
        &self,
        restrict: Option<&HashSet<CellAddress>>,
    ) -> Result<Vec<CellAddress>, CircularDependencyError> {
        let mut nodes = self.nodes();
        let affected = restrict.map(|seeds| {
            nodes.extend(seeds.iter().copied());
            self.affected(seeds.iter().copied())
        });

        let mut in_degree: AHashMap<CellAddress, usize> = nodes
            .iter()
            .map(|&node| (node, self.dependencies(node).count()))
            .collect();

        let mut ready: BinaryHeap<Reverse<CellAddress>> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&node, _)| Reverse(node))
            .collect();

        let mut ordered = Vec::with_capacity(nodes.len());
        while let Some(Reverse(node)) = ready.pop() {
            ordered.push(node);
            for dependent in self.dependents_of(node) {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(dependent));
                    }
                }
            }
        }

        let complete = ordered.len() == nodes.len();
        let cells = if complete {
            Vec::new()
        } else {
            let emitted: AHashSet<CellAddress> = ordered.iter().copied().collect();
            let mut cells: Vec<CellAddress> = nodes
                .into_iter()
                .filter(|node| !emitted.contains(node))
                .collect();
            cells.sort_unstable();
            cells
        };

        if let Some(affected) = &affected {
            ordered.retain(|node| affected.contains(node));
        }

        if complete {
            Ok(ordered)
        } else {
            Err(CircularDependencyError { cells, ordered })
        }
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependencies.clear();
        self.dependents.clear();
    }
}

fn remove_edge(
    map: &mut AHashMap<CellAddress, AHashSet<CellAddress>>,
    from: CellAddress,
    to: CellAddress,
) {
    if let Some(set) = map.get_mut(&from) {
        set.remove(&to);
        if set.is_empty() {
            map.remove(&from);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(text: &str) -> CellAddress {
        gridcalc_core::parse_address(text).unwrap()
    }

    fn sorted(cells: impl Iterator<Item = CellAddress>) -> Vec<CellAddress> {
        let mut cells: Vec<_> = cells.collect();
        cells.sort();
        cells
    }

    fn seeds(cells: &[&str]) -> HashSet<CellAddress> {
        cells.iter().map(|c| addr(c)).collect()
    }

    #[test]
    fn test_set_dependencies_mirrors_edges() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(addr("C1"), [addr("A1"), addr("B1")]);

        assert_eq!(sorted(graph.dependencies(addr("C1"))), vec![addr("A1"), addr("B1")]);
        assert_eq!(sorted(graph.dependents_of(addr("A1"))), vec![addr("C1")]);
        assert_eq!(sorted(graph.dependents_of(addr("B1"))), vec![addr("C1")]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_set_dependencies_replaces() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(addr("C1"), [addr("A1")]);
        graph.set_dependencies(addr("C1"), [addr("B1")]);

        assert_eq!(sorted(graph.dependencies(addr("C1"))), vec![addr("B1")]);
        assert_eq!(graph.dependents_of(addr("A1")).count(), 0);
        assert!(!graph.contains(addr("A1")));
    }

    #[test]
    fn test_set_dependencies_keeps_readers() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(addr("B1"), [addr("A1")]);
        graph.set_dependencies(addr("A1"), [addr("Z1")]);
        graph.set_dependencies(addr("A1"), []);

        assert_eq!(sorted(graph.dependents_of(addr("A1"))), vec![addr("B1")]);
        assert_eq!(graph.dependents_of(addr("Z1")).count(), 0);
    }

    #[test]
    fn test_remove_cell() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(addr("B1"), [addr("A1")]);
        graph.set_dependencies(addr("C1"), [addr("B1")]);

        graph.remove_cell(addr("B1"));

        assert!(!graph.contains(addr("B1")));
        assert_eq!(graph.dependents_of(addr("A1")).count(), 0);
        assert_eq!(graph.dependencies(addr("C1")).count(), 0);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_order_respects_edges() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(addr("B1"), [addr("A1")]);
        graph.set_dependencies(addr("C1"), [addr("A1"), addr("B1")]);

        assert_eq!(
            graph.topological_order(None).unwrap(),
            vec![addr("A1"), addr("B1"), addr("C1")]
        );
    }

    #[test]
    fn test_diamond_recomputes_join_last() {
        // A1 → B1, A1 → A2, both → B2
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(addr("B1"), [addr("A1")]);
        graph.set_dependencies(addr("A2"), [addr("A1")]);
        graph.set_dependencies(addr("B2"), [addr("B1"), addr("A2")]);

        let order = graph.topological_order(Some(&seeds(&["A1"]))).unwrap();
        assert_eq!(order, vec![addr("A1"), addr("B1"), addr("A2"), addr("B2")]);
    }

    #[test]
    fn test_restriction_limits_to_affected_cells() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(addr("B1"), [addr("A1")]);
        graph.set_dependencies(addr("C1"), [addr("B1"), addr("Z9")]);
        graph.set_dependencies(addr("D1"), [addr("Z9")]);

        let order = graph.topological_order(Some(&seeds(&["B1"]))).unwrap();
        assert_eq!(order, vec![addr("B1"), addr("C1")]);

        // A seed with no edges is still ordered
        let order = graph.topological_order(Some(&seeds(&["Q7"]))).unwrap();
        assert_eq!(order, vec![addr("Q7")]);
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(addr("A1"), [addr("B1")]);
        graph.set_dependencies(addr("B1"), [addr("A1")]);

        let err = graph.topological_order(None).unwrap_err();
        assert_eq!(err.cells, vec![addr("A1"), addr("B1")]);
        assert!(err.ordered.is_empty());
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(addr("A1"), [addr("A1")]);

        let err = graph.topological_order(Some(&seeds(&["A1"]))).unwrap_err();
        assert_eq!(err.cells, vec![addr("A1")]);
    }

    #[test]
    fn test_cycle_reports_downstream_and_partial_order() {
        // Z1 feeds a cycle B1 ↔ C1, which feeds D1
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(addr("B1"), [addr("Z1"), addr("C1")]);
        graph.set_dependencies(addr("C1"), [addr("B1")]);
        graph.set_dependencies(addr("D1"), [addr("C1")]);
        graph.set_dependencies(addr("E1"), [addr("Z1")]);

        let err = graph.topological_order(Some(&seeds(&["Z1"]))).unwrap_err();
        assert_eq!(err.cells, vec![addr("B1"), addr("C1"), addr("D1")]);
        assert_eq!(err.ordered, vec![addr("Z1"), addr("E1")]);
    }

    #[test]
    fn test_unrelated_cycle_blocks_restricted_order() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(addr("A1"), [addr("B1")]);
        graph.set_dependencies(addr("B1"), [addr("A1")]);
        graph.set_dependencies(addr("D1"), [addr("C1")]);

        let err = graph.topological_order(Some(&seeds(&["C1"]))).unwrap_err();
        assert_eq!(err.cells, vec![addr("A1"), addr("B1")]);
        assert_eq!(err.ordered, vec![addr("C1"), addr("D1")]);

        // Breaking the cycle frees the order again
        graph.set_dependencies(addr("B1"), []);
        assert_eq!(
            graph.topological_order(Some(&seeds(&["C1"]))).unwrap(),
            vec![addr("C1"), addr("D1")]
        );
    }

    #[test]
    fn test_clear() {
        let mut graph = DependencyGraph::new();
        graph.set_dependencies(addr("B1"), [addr("A1")]);
        graph.clear();
        assert!(graph.is_empty());
        assert!(graph.topological_order(None).unwrap().is_empty());
    }
}
