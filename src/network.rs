//! C3 — builds a callable feed-forward evaluator from a genome. See
//! spec.md §4.3.

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::activation::Activation;
use crate::error::{ActivationError, NetworkError};
use crate::genome::Genome;
use crate::innovation::NodeId;

/// A built, evaluable phenotype. Construction (`Network::create`) does the
/// expensive work once — classifying nodes, computing a topological order,
/// and caching each node's incoming-edge list — so `activate` is cheap to
/// call many times over.
pub struct Network {
    input_nodes: Vec<NodeId>,
    bias_node: Option<NodeId>,
    output_nodes: Vec<NodeId>,
    /// Topological order restricted to enabled, non-cycle-forming genes;
    /// input and bias nodes are included at the front but skipped during
    /// activation since their values are supplied, not computed.
    order: Vec<NodeId>,
    incoming: HashMap<NodeId, Vec<(NodeId, f64)>>,
    activation: Activation,
    /// Innovation numbers of enabled genes dropped to break a cycle.
    /// `Genome::add_connection_mutation` enforces acyclicity over *enabled*
    /// edges at mutation time, but `toggle_mutation` can later re-enable a
    /// gene it never considered, reintroducing a real cycle through normal
    /// evolution — this is not limited to adversarially hand-built genomes.
    dropped_cycle_edges: Vec<u64>,
}

impl Network {
    /// Builds a network, silently dropping the lowest-innovation edge of any
    /// cycle until the enabled subgraph is acyclic (spec.md §4.3 step 2,
    /// §9's cycle-handling redesign, option (a)).
    pub fn create(genome: &Genome) -> Result<Self, NetworkError> {
        Self::build(genome, Activation::default(), false)
    }

    pub fn create_with_activation(
        genome: &Genome,
        activation: Activation,
    ) -> Result<Self, NetworkError> {
        Self::build(genome, activation, false)
    }

    /// Builds a network but refuses (rather than silently repairing) a
    /// cyclic genome, returning `NetworkError::CycleDetected` with the
    /// innovations that would have been dropped (spec.md §4.3 step 2,
    /// option (b)).
    pub fn create_strict(genome: &Genome) -> Result<Self, NetworkError> {
        Self::build(genome, Activation::default(), true)
    }

    fn build(genome: &Genome, activation: Activation, strict: bool) -> Result<Self, NetworkError> {
        if genome.nodes().is_empty() {
            return Err(NetworkError::EmptyGenome);
        }

        let mut node_order: Vec<NodeId> = genome.nodes().iter().copied().collect();
        node_order.sort();

        let mut edges: Vec<(NodeId, NodeId, f64, u64)> = genome
            .genes_sorted()
            .into_iter()
            .filter(|g| g.enabled)
            .map(|g| (g.in_node, g.out_node, g.weight, g.innovation))
            .collect();

        let mut dropped = Vec::new();
        let order = loop {
            let mut graph: DiGraphMap<NodeId, ()> = DiGraphMap::new();
            for &n in &node_order {
                graph.add_node(n);
            }
            for &(from, to, _, _) in &edges {
                graph.add_edge(from, to, ());
            }

            match toposort(&graph, None) {
                Ok(order) => break order,
                Err(cycle) => {
                    if strict {
                        return Err(NetworkError::CycleDetected(
                            edges.iter().map(|e| e.3).collect(),
                        ));
                    }
                    // Scope the cut to the cycle `toposort` actually reported
                    // (spec.md §4.3: "lowest-innovation edge of each detected
                    // cycle") rather than the lowest innovation in the whole
                    // graph — an unrelated, perfectly acyclic part of the
                    // genome must not be touched.
                    let on_cycle = cycle_edge_indices(&edges, cycle.node_id());
                    let target = if on_cycle.is_empty() {
                        // toposort reported a cycle but the local search found
                        // none touching its start node; fall back to a global
                        // scan rather than loop forever.
                        (0..edges.len()).min_by_key(|&i| edges[i].3)
                    } else {
                        on_cycle.into_iter().min_by_key(|&i| edges[i].3)
                    };
                    let Some(index) = target else {
                        break Vec::new();
                    };
                    let removed = edges.remove(index);
                    dropped.push(removed.3);
                }
            }
        };

        let mut incoming: HashMap<NodeId, Vec<(NodeId, f64)>> = HashMap::new();
        for (from, to, weight, _) in &edges {
            incoming.entry(*to).or_default().push((*from, *weight));
        }

        Ok(Network {
            input_nodes: genome.input_nodes().to_vec(),
            bias_node: genome.bias_node(),
            output_nodes: genome.output_nodes().to_vec(),
            order,
            incoming,
            activation,
            dropped_cycle_edges: dropped,
        })
    }

    pub fn dropped_cycle_edges(&self) -> &[u64] {
        &self.dropped_cycle_edges
    }

    /// Activates the network on `inputs` (spec.md §4.3 step 1–4), returning
    /// one value per output node in canonical (creation) order.
    pub fn activate(&self, inputs: &[f64]) -> Result<Vec<f64>, ActivationError> {
        if inputs.len() != self.input_nodes.len() {
            return Err(ActivationError::InputArityMismatch {
                expected: self.input_nodes.len(),
                actual: inputs.len(),
            });
        }

        let mut values: HashMap<NodeId, f64> = HashMap::with_capacity(self.order.len());
        for (&id, &value) in self.input_nodes.iter().zip(inputs) {
            values.insert(id, value);
        }
        if let Some(bias) = self.bias_node {
            values.insert(bias, 1.0);
        }

        let input_set: std::collections::HashSet<NodeId> =
            self.input_nodes.iter().copied().collect();

        for &node in &self.order {
            if input_set.contains(&node) || Some(node) == self.bias_node {
                continue;
            }
            let raw: f64 = self
                .incoming
                .get(&node)
                .map(|edges| {
                    edges
                        .iter()
                        .map(|(src, weight)| values.get(src).copied().unwrap_or(0.0) * weight)
                        .sum()
                })
                .unwrap_or(0.0);
            values.insert(node, self.activation.apply(raw));
        }

        Ok(self
            .output_nodes
            .iter()
            .map(|id| values.get(id).copied().unwrap_or(0.0))
            .collect())
    }
}

/// Finds a cycle through `start` in `edges` via DFS, returning the indices
/// (into `edges`) of the edges that make it up, or an empty vec if `start`
/// isn't on one. `toposort` only reports one node implicated in a cycle, not
/// the cycle's edges, so this recovers them — scoping the caller's edge
/// removal to the actual cycle instead of the whole graph.
fn cycle_edge_indices(edges: &[(NodeId, NodeId, f64, u64)], start: NodeId) -> Vec<usize> {
    let mut adjacency: HashMap<NodeId, Vec<(usize, NodeId)>> = HashMap::new();
    for (index, &(from, to, _, _)) in edges.iter().enumerate() {
        adjacency.entry(from).or_default().push((index, to));
    }

    fn dfs(
        node: NodeId,
        start: NodeId,
        adjacency: &HashMap<NodeId, Vec<(usize, NodeId)>>,
        path: &mut Vec<usize>,
        on_stack: &mut std::collections::HashSet<NodeId>,
    ) -> bool {
        let Some(neighbors) = adjacency.get(&node) else {
            return false;
        };
        for &(edge_index, to) in neighbors {
            if to == start {
                path.push(edge_index);
                return true;
            }
            if on_stack.insert(to) {
                path.push(edge_index);
                if dfs(to, start, adjacency, path, on_stack) {
                    return true;
                }
                path.pop();
                on_stack.remove(&to);
            }
        }
        false
    }

    let mut path = Vec::new();
    let mut on_stack = std::collections::HashSet::new();
    on_stack.insert(start);
    dfs(start, start, &adjacency, &mut path, &mut on_stack);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::innovation::InnovationRegistry;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn activation_literal() {
        // S4 from spec.md §8: single gene (0 -> 1, w=1.0). activate([0.5]) ~= [0.9205].
        let mut innovation2 = InnovationRegistry::new(2);
        let mut nodes = std::collections::HashSet::new();
        nodes.insert(NodeId(0));
        nodes.insert(NodeId(1));
        let innov = innovation2.innovation_for(NodeId(0), NodeId(1));
        let mut connections = HashMap::new();
        connections.insert(
            innov,
            crate::genes::ConnectionGene::new(NodeId(0), NodeId(1), 1.0, innov),
        );
        let literal = test_genome(nodes, connections, vec![NodeId(0)], None, vec![NodeId(1)]);
        let net = Network::create(&literal).unwrap();
        let out = net.activate(&[0.5]).unwrap();
        let want = 1.0 / (1.0 + (-4.9f64 * 0.5).exp());
        assert!((out[0] - want).abs() < 1e-9);
    }

    #[test]
    fn input_arity_mismatch_errors() {
        let mut innovation = InnovationRegistry::new(5);
        let mut rng = StdRng::seed_from_u64(2);
        let genome = Genome::minimal(3, 1, true, &mut rng, &mut innovation);
        let network = Network::create(&genome).unwrap();
        let err = network.activate(&[0.0, 0.0]).unwrap_err();
        assert_eq!(
            err,
            ActivationError::InputArityMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn cycle_is_dropped_not_panicking() {
        // Hand-build a 3-cycle: 0 -> 1 -> 2 -> 0, all enabled.
        let mut nodes = std::collections::HashSet::new();
        nodes.insert(NodeId(0));
        nodes.insert(NodeId(1));
        nodes.insert(NodeId(2));
        let mut connections = HashMap::new();
        connections.insert(1, crate::genes::ConnectionGene::new(NodeId(0), NodeId(1), 1.0, 1));
        connections.insert(2, crate::genes::ConnectionGene::new(NodeId(1), NodeId(2), 1.0, 2));
        connections.insert(3, crate::genes::ConnectionGene::new(NodeId(2), NodeId(0), 1.0, 3));
        let genome = test_genome(nodes, connections, vec![NodeId(0)], None, vec![NodeId(2)]);

        let network = Network::create(&genome).unwrap();
        assert_eq!(network.dropped_cycle_edges(), &[1]);
        assert!(network.activate(&[1.0]).is_ok());

        let strict = Network::create_strict(&genome);
        assert!(strict.is_err());
    }

    #[test]
    fn cycle_repair_is_scoped_to_the_reported_cycle() {
        // A healthy feed-forward DAG (innovations 1-4: 0->1->2, 0->3->2) plus
        // a disjoint 2-cycle between unrelated hidden nodes 5 and 6
        // (innovations 5, 6). Only the cycle's lowest-innovation edge (5)
        // should be dropped; the DAG must survive untouched.
        let mut nodes = std::collections::HashSet::new();
        for id in [0, 1, 2, 3, 5, 6] {
            nodes.insert(NodeId(id));
        }
        let mut connections = HashMap::new();
        connections.insert(1, crate::genes::ConnectionGene::new(NodeId(0), NodeId(1), 1.0, 1));
        connections.insert(2, crate::genes::ConnectionGene::new(NodeId(1), NodeId(2), 1.0, 2));
        connections.insert(3, crate::genes::ConnectionGene::new(NodeId(0), NodeId(3), 1.0, 3));
        connections.insert(4, crate::genes::ConnectionGene::new(NodeId(3), NodeId(2), 1.0, 4));
        connections.insert(5, crate::genes::ConnectionGene::new(NodeId(5), NodeId(6), 1.0, 5));
        connections.insert(6, crate::genes::ConnectionGene::new(NodeId(6), NodeId(5), 1.0, 6));
        let genome = test_genome(nodes, connections, vec![NodeId(0)], None, vec![NodeId(2)]);

        let network = Network::create_with_activation(&genome, Activation::Identity).unwrap();
        assert_eq!(network.dropped_cycle_edges(), &[5]);

        // With Identity activation and unit weights, both surviving DAG paths
        // (0->1->2 and 0->3->2) each contribute the input value to the
        // output; a bug that instead stripped the DAG's own edges would
        // leave the output at 0 regardless of input.
        let out = network.activate(&[1.0]).unwrap();
        assert!((out[0] - 2.0).abs() < 1e-9);
    }

    fn test_genome(
        nodes: std::collections::HashSet<NodeId>,
        connections: HashMap<u64, crate::genes::ConnectionGene>,
        input_nodes: Vec<NodeId>,
        bias_node: Option<NodeId>,
        output_nodes: Vec<NodeId>,
    ) -> Genome {
        crate::genome::test_support::build(nodes, connections, input_nodes, bias_node, output_nodes)
    }
}
