//! Read-only directed view over a set of arcs.
//!
//! Buses become nodes keyed by [`BusNumber`]; each arc becomes one edge
//! weighted with its position in the input. When two arcs carry different
//! buses under the same number the first occurrence wins and the later arc
//! is listed in [`ArcGraph::number_conflicts`]: number uniqueness belongs to
//! whoever assembled the collection, not to this view.

use std::collections::HashMap;

use petgraph::algo::connected_components;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::topology::{Arc, Bus, BusNumber, Shared};

#[derive(Debug, Default)]
pub struct ArcGraph {
    graph: DiGraph<Shared<Bus>, usize>,
    nodes: HashMap<BusNumber, NodeIndex>,
    conflicts: Vec<(usize, BusNumber)>,
}

impl ArcGraph {
    pub fn from_arcs<'a>(arcs: impl IntoIterator<Item = &'a Arc>) -> Self {
        let mut view = ArcGraph::default();
        for (position, arc) in arcs.into_iter().enumerate() {
            let from = view.node_for(arc.from_to(), position);
            let to = view.node_for(arc.to_from(), position);
            view.graph.add_edge(from, to, position);
        }
        view
    }

    fn node_for(&mut self, bus: &Shared<Bus>, position: usize) -> NodeIndex {
        let number = bus.number();
        if let Some(&idx) = self.nodes.get(&number) {
            let known = &self.graph[idx];
            if !Shared::ptr_eq(known, bus) && **known != **bus {
                self.conflicts.push((position, number));
            }
            return idx;
        }
        let idx = self.graph.add_node(bus.clone());
        self.nodes.insert(number, idx);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The bus registered under `number`, if any arc touches it.
    pub fn bus(&self, number: BusNumber) -> Option<&Shared<Bus>> {
        self.nodes.get(&number).map(|idx| &self.graph[*idx])
    }

    /// Bus numbers reachable over one outgoing arc, sorted and deduplicated.
    pub fn successors(&self, number: BusNumber) -> Vec<BusNumber> {
        self.neighbors(number, Direction::Outgoing)
    }

    /// Bus numbers with an arc into `number`, sorted and deduplicated.
    pub fn predecessors(&self, number: BusNumber) -> Vec<BusNumber> {
        self.neighbors(number, Direction::Incoming)
    }

    fn neighbors(&self, number: BusNumber, direction: Direction) -> Vec<BusNumber> {
        let Some(&idx) = self.nodes.get(&number) else {
            return Vec::new();
        };
        let mut numbers: Vec<BusNumber> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].number())
            .collect();
        numbers.sort();
        numbers.dedup();
        numbers
    }

    /// Input positions of arcs whose endpoints share a bus number.
    pub fn self_loops(&self) -> Vec<usize> {
        let mut positions: Vec<usize> = self
            .graph
            .edge_references()
            .filter(|edge| edge.source() == edge.target())
            .map(|edge| *edge.weight())
            .collect();
        positions.sort_unstable();
        positions
    }

    /// `(arc position, bus number)` for every endpoint whose number was
    /// already taken by a different bus. Both endpoints of one arc may appear.
    pub fn number_conflicts(&self) -> &[(usize, BusNumber)] {
        &self.conflicts
    }

    /// Components ignoring arc direction.
    pub fn weakly_connected_components(&self) -> usize {
        connected_components(&self.graph)
    }

    pub fn graph(&self) -> &DiGraph<Shared<Bus>, usize> {
        &self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::DcBus;

    fn bus(number: i64) -> Shared<Bus> {
        Shared::new(Bus::from(DcBus::builder(number).build().unwrap()))
    }

    fn number(n: i64) -> BusNumber {
        BusNumber::new(n).unwrap()
    }

    #[test]
    fn test_empty_view() {
        let view = ArcGraph::from_arcs(&[]);
        assert_eq!(view.node_count(), 0);
        assert_eq!(view.edge_count(), 0);
        assert_eq!(view.weakly_connected_components(), 0);
    }

    #[test]
    fn test_direction_is_kept() {
        let arcs = vec![Arc::new(bus(1), bus(2)), Arc::new(bus(2), bus(3))];
        let view = ArcGraph::from_arcs(&arcs);
        assert_eq!(view.node_count(), 3);
        assert_eq!(view.edge_count(), 2);
        assert_eq!(view.successors(number(2)), vec![number(3)]);
        assert_eq!(view.predecessors(number(2)), vec![number(1)]);
        assert!(view.successors(number(3)).is_empty());
        assert!(view.successors(number(99)).is_empty());
    }

    #[test]
    fn test_parallel_arcs_and_components() {
        let arcs = vec![
            Arc::new(bus(1), bus(2)),
            Arc::new(bus(1), bus(2)),
            Arc::new(bus(10), bus(11)),
        ];
        let view = ArcGraph::from_arcs(&arcs);
        assert_eq!(view.edge_count(), 3);
        assert_eq!(view.successors(number(1)), vec![number(2)]);
        assert_eq!(view.weakly_connected_components(), 2);
    }

    #[test]
    fn test_self_loops_reported_by_position() {
        let loop_bus = bus(4);
        let arcs = vec![
            Arc::new(bus(1), bus(2)),
            Arc::new(loop_bus.clone(), loop_bus),
        ];
        let view = ArcGraph::from_arcs(&arcs);
        assert_eq!(view.self_loops(), vec![1]);
    }

    #[test]
    fn test_first_bus_for_number_wins() {
        let first = Shared::new(Bus::from(DcBus::builder(1).name("first").build().unwrap()));
        let second = Shared::new(Bus::from(DcBus::builder(1).name("second").build().unwrap()));
        let arcs = vec![Arc::new(first, bus(2)), Arc::new(bus(3), second)];
        let view = ArcGraph::from_arcs(&arcs);
        assert_eq!(view.node_count(), 3);
        assert_eq!(view.bus(number(1)).unwrap().fields().name(), "first");
        assert_eq!(view.number_conflicts(), &[(1, number(1))]);
    }

    #[test]
    fn test_equal_buses_under_one_number_do_not_conflict() {
        let arcs = vec![
            Arc::new(bus(1), bus(2)),
            Arc::new(bus(2), bus(3)),
            Arc::new(bus(3), bus(1)),
        ];
        let view = ArcGraph::from_arcs(&arcs);
        assert_eq!(view.node_count(), 3);
        assert!(view.number_conflicts().is_empty());
    }
}
