//! Dependency cycles among PCs that could not be scheduled.

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;

use form_core::{Puzzle, PuzzleId};

/// Groups of PCs that (transitively) wait on each other's outputs.
///
/// An edge `a -> b` means `b` reads a parameter `a` writes. Every strongly
/// connected component with more than one member, or with a self-loop, is a
/// cycle. Members and groups are sorted by id.
pub fn blocked_cycles(pcs: &[&Puzzle]) -> Vec<Vec<PuzzleId>> {
    let mut graph: DiGraphMap<PuzzleId, ()> = DiGraphMap::new();
    for pc in pcs {
        graph.add_node(pc.id);
    }
    for producer in pcs {
        let outputs = producer.output_param_ids();
        for consumer in pcs {
            if !outputs.is_disjoint(&consumer.input_param_ids()) {
                graph.add_edge(producer.id, consumer.id, ());
            }
        }
    }
    let mut cycles: Vec<Vec<PuzzleId>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|component| {
            component.len() > 1 || graph.contains_edge(component[0], component[0])
        })
        .map(|mut component| {
            component.sort();
            component
        })
        .collect();
    cycles.sort();
    cycles
}
