//! C2 — the direct encoding of a network as connection genes plus a node set,
//! and the variation operators (compatibility distance, crossover, structural
//! and weight mutation) that act on it. See spec.md §4.2.

use std::collections::{HashMap, HashSet};

use rand::seq::IteratorRandom;
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::config::{CompatibilityCoefficients, MutationRates, NeatConfig};
use crate::genes::{ConnectionGene, NodeRole};
use crate::innovation::{InnovationRegistry, NodeId};
use crate::species::SpeciesId;

/// Samples `N(0, 1) * std` — the source's `rand_normal * 2.0` weight draw
/// (spec.md §4.2.1), generalized to a caller-supplied standard deviation.
fn gaussian(rng: &mut dyn RngCore, std: f64) -> f64 {
    let z: f64 = StandardNormal.sample(rng);
    z * std
}

/// A genome: a sparse directed graph of [`ConnectionGene`]s over a set of
/// node ids, plus the bookkeeping (fitness, species assignment) the rest of
/// the core needs. See spec.md §3 invariants 1–4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    /// Keyed by innovation number — lookup by innovation is the primary
    /// access pattern (compatibility distance, crossover). Iterate via
    /// [`Genome::genes_sorted`] when a deterministic order is required.
    connections: HashMap<u64, ConnectionGene>,
    nodes: HashSet<NodeId>,
    input_nodes: Vec<NodeId>,
    bias_node: Option<NodeId>,
    output_nodes: Vec<NodeId>,

    pub fitness: f64,
    pub adjusted_fitness: f64,
    pub species_id: Option<SpeciesId>,
}

impl Genome {
    /// `Genome::minimal` (spec.md §4.2.1): a fully-connected bipartite graph
    /// from every input (plus bias, if enabled) to every output. Node ids are
    /// deterministic: inputs `[0, inputs)`, bias `inputs` (if enabled),
    /// outputs immediately after. `innovation` must have been constructed
    /// with `first_hidden_id` equal to one past the last output id.
    pub fn minimal(
        inputs: usize,
        outputs: usize,
        bias: bool,
        rng: &mut dyn RngCore,
        innovation: &mut InnovationRegistry,
    ) -> Self {
        let input_nodes: Vec<NodeId> = (0..inputs as u64).map(NodeId).collect();
        let bias_node = if bias {
            Some(NodeId(inputs as u64))
        } else {
            None
        };
        let output_start = inputs as u64 + if bias { 1 } else { 0 };
        let output_nodes: Vec<NodeId> = (0..outputs as u64)
            .map(|i| NodeId(output_start + i))
            .collect();

        let mut nodes: HashSet<NodeId> = HashSet::new();
        nodes.extend(input_nodes.iter().copied());
        nodes.extend(bias_node);
        nodes.extend(output_nodes.iter().copied());

        let mut connections = HashMap::new();
        let sources = input_nodes.iter().copied().chain(bias_node);
        for source in sources {
            for &target in &output_nodes {
                let innov = innovation.innovation_for(source, target);
                let weight = gaussian(rng, 2.0);
                connections.insert(innov, ConnectionGene::new(source, target, weight, innov));
            }
        }

        Genome {
            connections,
            nodes,
            input_nodes,
            bias_node,
            output_nodes,
            fitness: 0.0,
            adjusted_fitness: 0.0,
            species_id: None,
        }
    }

    pub fn input_nodes(&self) -> &[NodeId] {
        &self.input_nodes
    }

    pub fn output_nodes(&self) -> &[NodeId] {
        &self.output_nodes
    }

    pub fn bias_node(&self) -> Option<NodeId> {
        self.bias_node
    }

    pub fn nodes(&self) -> &HashSet<NodeId> {
        &self.nodes
    }

    pub fn gene(&self, innovation: u64) -> Option<&ConnectionGene> {
        self.connections.get(&innovation)
    }

    /// All genes, sorted by innovation number. Order is not semantically
    /// significant per spec.md §3 except where it is used as a tie-break
    /// (crossover, compatibility distance), which is why callers needing a
    /// stable order should go through this rather than `HashMap` iteration.
    pub fn genes_sorted(&self) -> Vec<&ConnectionGene> {
        let mut genes: Vec<&ConnectionGene> = self.connections.values().collect();
        genes.sort_by_key(|g| g.innovation);
        genes
    }

    pub fn gene_count(&self) -> usize {
        self.connections.len()
    }

    /// Classifies a node by the ranges recorded at genome creation — never
    /// by degree. See spec.md §3's `NodeRole` note and §9's open-bug
    /// discussion of the source's degree heuristic.
    pub fn node_role(&self, id: NodeId) -> NodeRole {
        if self.bias_node == Some(id) {
            NodeRole::Bias
        } else if self.input_nodes.contains(&id) {
            NodeRole::Input
        } else if self.output_nodes.contains(&id) {
            NodeRole::Output
        } else {
            NodeRole::Hidden
        }
    }

    /// Number of non-input/output/bias nodes — used by optional parsimony
    /// pressure (SPEC_FULL §4.2 supplement).
    pub fn hidden_node_count(&self) -> usize {
        self.nodes.len() - self.input_nodes.len() - self.output_nodes.len()
            - if self.bias_node.is_some() { 1 } else { 0 }
    }

    /// `distance(A, B)` from spec.md §4.2.2. `c1*|E|/N + c2*|D|/N + c3*W`.
    pub fn compatibility_distance(&self, other: &Genome, coeffs: &CompatibilityCoefficients) -> f64 {
        let max_innov_self = self.connections.keys().copied().max().unwrap_or(0);
        let max_innov_other = other.connections.keys().copied().max().unwrap_or(0);

        let mut excess = 0u32;
        let mut disjoint = 0u32;
        let mut matching = 0u32;
        let mut weight_diff_sum = 0.0;

        let mut all_innovations: HashSet<u64> = HashSet::new();
        all_innovations.extend(self.connections.keys().copied());
        all_innovations.extend(other.connections.keys().copied());

        for innov in all_innovations {
            match (self.connections.get(&innov), other.connections.get(&innov)) {
                (Some(a), Some(b)) => {
                    matching += 1;
                    weight_diff_sum += (a.weight - b.weight).abs();
                }
                (Some(_), None) => {
                    if innov > max_innov_other {
                        excess += 1;
                    } else {
                        disjoint += 1;
                    }
                }
                (None, Some(_)) => {
                    if innov > max_innov_self {
                        excess += 1;
                    } else {
                        disjoint += 1;
                    }
                }
                (None, None) => unreachable!(),
            }
        }

        let w = if matching > 0 {
            weight_diff_sum / matching as f64
        } else {
            0.0
        };
        let n = (self.connections.len().max(other.connections.len())).max(1) as f64;

        coeffs.c1_excess * excess as f64 / n
            + coeffs.c2_disjoint * disjoint as f64 / n
            + coeffs.c3_weight * w
    }

    /// Crossover (spec.md §4.2.3). `self` and `other` must share the same
    /// input/bias/output topology (both descend from one run's `minimal`).
    ///
    /// Enable-inheritance policy (spec.md §4.2.3, §9): the source always
    /// copies the selected parent's enabled flag. This implementation
    /// instead follows canonical NEAT — for a matching gene where either
    /// parent has it disabled, the child's copy is disabled with probability
    /// 0.75 — recorded as an explicit choice in DESIGN.md.
    pub fn crossover(&self, other: &Genome, rng: &mut dyn RngCore) -> Genome {
        let (more_fit, less_fit) = if self.fitness > other.fitness {
            (self, other)
        } else if other.fitness > self.fitness {
            (other, self)
        } else if rng.random_bool(0.5) {
            (self, other)
        } else {
            (other, self)
        };

        let mut all_innovations: Vec<u64> = more_fit
            .connections
            .keys()
            .chain(less_fit.connections.keys())
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        all_innovations.sort_unstable();

        let mut connections = HashMap::with_capacity(all_innovations.len());
        for innov in all_innovations {
            match (
                more_fit.connections.get(&innov),
                less_fit.connections.get(&innov),
            ) {
                (Some(hi), Some(lo)) => {
                    let mut chosen = if rng.random_bool(0.5) { *hi } else { *lo };
                    if !hi.enabled || !lo.enabled {
                        chosen.enabled = !rng.random_bool(0.75);
                    }
                    connections.insert(innov, chosen);
                }
                (Some(hi), None) => {
                    connections.insert(innov, *hi);
                }
                (None, None) => unreachable!(),
                (None, Some(_)) => {
                    // Innovation present only in the less-fit parent: discarded.
                }
            }
        }

        let mut nodes: HashSet<NodeId> = HashSet::new();
        nodes.extend(more_fit.input_nodes.iter().copied());
        nodes.extend(more_fit.bias_node);
        nodes.extend(more_fit.output_nodes.iter().copied());
        for gene in connections.values() {
            nodes.insert(gene.in_node);
            nodes.insert(gene.out_node);
        }

        Genome {
            connections,
            nodes,
            input_nodes: more_fit.input_nodes.clone(),
            bias_node: more_fit.bias_node,
            output_nodes: more_fit.output_nodes.clone(),
            fitness: 0.0,
            adjusted_fitness: 0.0,
            species_id: None,
        }
    }

    /// Applies add-node, add-connection, weight-mutation, and toggle, in
    /// that fixed order, each independently gated by its configured
    /// probability (spec.md §4.2.4, §5 ordering guarantee).
    pub fn mutate(
        &self,
        config: &NeatConfig,
        rng: &mut dyn RngCore,
        innovation: &mut InnovationRegistry,
    ) -> Genome {
        let rates = &config.mutation_rates;
        let mut child = self.clone();
        if rng.random::<f64>() < rates.add_node_rate {
            child = child.add_node_mutation(rng, innovation);
        }
        if rng.random::<f64>() < rates.add_connection_rate {
            child = child.add_connection_mutation(rng, innovation);
        }
        if rng.random::<f64>() < rates.weight_mutation_rate {
            child = child.weight_mutation(rng, rates);
        }
        if rng.random::<f64>() < rates.toggle_connection_rate {
            child = child.toggle_mutation(rng);
        }
        child
    }

    /// Add-node (spec.md §4.2.4): disable a random enabled gene, splice in a
    /// fresh hidden node on a 1.0-weighted in-edge and an edge carrying the
    /// original weight out. No-op if there are no enabled genes.
    pub fn add_node_mutation(
        &self,
        rng: &mut dyn RngCore,
        innovation: &mut InnovationRegistry,
    ) -> Genome {
        let mut child = self.clone();
        let chosen = child
            .connections
            .values()
            .filter(|g| g.enabled)
            .choose(rng)
            .map(|g| g.innovation);

        let Some(innov) = chosen else {
            return child;
        };

        let (in_node, out_node, weight) = {
            let gene = child.connections.get_mut(&innov).unwrap();
            gene.enabled = false;
            (gene.in_node, gene.out_node, gene.weight)
        };

        let hidden = innovation.fresh_node();
        child.nodes.insert(hidden);

        let in_innov = innovation.innovation_for(in_node, hidden);
        let out_innov = innovation.innovation_for(hidden, out_node);
        child
            .connections
            .insert(in_innov, ConnectionGene::new(in_node, hidden, 1.0, in_innov));
        child.connections.insert(
            out_innov,
            ConnectionGene::new(hidden, out_node, weight, out_innov),
        );

        child
    }

    /// Add-connection (spec.md §4.2.4): sample a non-existing, non-cycle-
    /// forming `(s, t)` pair, biased toward hidden→output, input→hidden,
    /// input→output, hidden→hidden in that order. No-op if the genome is
    /// already fully connected.
    pub fn add_connection_mutation(
        &self,
        rng: &mut dyn RngCore,
        innovation: &mut InnovationRegistry,
    ) -> Genome {
        let mut child = self.clone();

        let by_role = |role: NodeRole, roles: &[NodeRole]| roles.contains(&role);
        let categories: [(&[NodeRole], &[NodeRole]); 4] = [
            (&[NodeRole::Hidden], &[NodeRole::Output]),
            (&[NodeRole::Input, NodeRole::Bias], &[NodeRole::Hidden]),
            (&[NodeRole::Input, NodeRole::Bias], &[NodeRole::Output]),
            (&[NodeRole::Hidden], &[NodeRole::Hidden]),
        ];

        let existing: HashSet<(NodeId, NodeId)> = child
            .connections
            .values()
            .map(|g| (g.in_node, g.out_node))
            .collect();

        for (from_roles, to_roles) in categories {
            let sources: Vec<NodeId> = child
                .nodes
                .iter()
                .copied()
                .filter(|&n| by_role(child.node_role(n), from_roles))
                .collect();
            let targets: Vec<NodeId> = child
                .nodes
                .iter()
                .copied()
                .filter(|&n| by_role(child.node_role(n), to_roles))
                .collect();

            let mut candidates = Vec::new();
            for &s in &sources {
                for &t in &targets {
                    if s == t || existing.contains(&(s, t)) {
                        continue;
                    }
                    if child.creates_cycle(t, s) {
                        continue;
                    }
                    candidates.push((s, t));
                }
            }

            if let Some(&(s, t)) = candidates.iter().choose(rng) {
                let innov = innovation.innovation_for(s, t);
                let weight = gaussian(rng, 2.0);
                child
                    .connections
                    .insert(innov, ConnectionGene::new(s, t, weight, innov));
                return child;
            }
        }

        child
    }

    /// True if a path already exists from `from` to `to` over enabled genes
    /// — i.e. adding an edge `to -> from` would close a cycle. Used to keep
    /// genomes acyclic by construction (spec.md §3 invariant 4).
    fn creates_cycle(&self, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return true;
        }
        let mut stack = vec![from];
        let mut visited = HashSet::new();
        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if !visited.insert(node) {
                continue;
            }
            for gene in self.connections.values() {
                if gene.enabled && gene.in_node == node {
                    stack.push(gene.out_node);
                }
            }
        }
        false
    }

    /// Weight mutation (spec.md §4.2.4): every gene independently perturbed
    /// or replaced.
    pub fn weight_mutation(&self, rng: &mut dyn RngCore, rates: &MutationRates) -> Genome {
        let mut child = self.clone();
        for gene in child.connections.values_mut() {
            if rng.random::<f64>() < rates.perturbation_rate {
                gene.weight += gaussian(rng, rates.perturbation_power);
            } else {
                gene.weight = gaussian(rng, 2.0);
            }
        }
        child
    }

    /// Toggle mutation (spec.md §4.2.4): flip one uniformly-chosen gene's
    /// enabled bit. No-op on an empty gene set.
    pub fn toggle_mutation(&self, rng: &mut dyn RngCore) -> Genome {
        let mut child = self.clone();
        if let Some(gene) = child.connections.values_mut().choose(rng) {
            gene.enabled = !gene.enabled;
        }
        child
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn minimal_topology_fitness_floor() {
        // S2: inputs=3, outputs=1, bias=true -> 4 genes, nodes {0,1,2,3,4}.
        let mut innovation = InnovationRegistry::new(5);
        let genome = Genome::minimal(3, 1, true, &mut rng(), &mut innovation);
        assert_eq!(genome.gene_count(), 4);
        let mut ids: Vec<u64> = genome.nodes.iter().map(|n| n.0).collect();
        ids.sort();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn genes_reference_only_known_nodes() {
        let mut innovation = InnovationRegistry::new(5);
        let mut r = rng();
        let mut genome = Genome::minimal(3, 1, true, &mut r, &mut innovation);
        for _ in 0..20 {
            genome = genome.add_node_mutation(&mut r, &mut innovation);
            genome = genome.add_connection_mutation(&mut r, &mut innovation);
            for gene in genome.genes_sorted() {
                assert!(genome.nodes.contains(&gene.in_node));
                assert!(genome.nodes.contains(&gene.out_node));
            }
        }
    }

    #[test]
    fn no_duplicate_edges() {
        let mut innovation = InnovationRegistry::new(5);
        let mut r = rng();
        let mut genome = Genome::minimal(3, 1, true, &mut r, &mut innovation);
        for _ in 0..50 {
            genome = genome.add_connection_mutation(&mut r, &mut innovation);
        }
        let mut seen = HashSet::new();
        for gene in genome.genes_sorted() {
            assert!(seen.insert((gene.in_node, gene.out_node)));
        }
    }

    #[test]
    fn distance_is_reflexive_and_symmetric() {
        let mut innovation = InnovationRegistry::new(5);
        let mut r = rng();
        let a = Genome::minimal(3, 1, true, &mut r, &mut innovation);
        let b = a.add_node_mutation(&mut r, &mut innovation);
        let coeffs = CompatibilityCoefficients::default();
        assert_eq!(a.compatibility_distance(&a, &coeffs), 0.0);
        assert_eq!(
            a.compatibility_distance(&b, &coeffs),
            b.compatibility_distance(&a, &coeffs)
        );
    }

    #[test]
    fn compatibility_distance_literal() {
        // S3 from spec.md §8.
        let mut a = Genome {
            connections: HashMap::new(),
            nodes: HashSet::new(),
            input_nodes: vec![],
            bias_node: None,
            output_nodes: vec![],
            fitness: 0.0,
            adjusted_fitness: 0.0,
            species_id: None,
        };
        a.connections
            .insert(1, ConnectionGene::new(NodeId(0), NodeId(1), 0.0, 1));
        a.connections
            .insert(2, ConnectionGene::new(NodeId(0), NodeId(2), 1.0, 2));

        let mut b = a.clone();
        b.connections.clear();
        b.connections
            .insert(1, ConnectionGene::new(NodeId(0), NodeId(1), 0.5, 1));
        b.connections
            .insert(3, ConnectionGene::new(NodeId(0), NodeId(3), 2.0, 3));

        let coeffs = CompatibilityCoefficients {
            c1_excess: 1.0,
            c2_disjoint: 1.0,
            c3_weight: 0.4,
        };
        let d = a.compatibility_distance(&b, &coeffs);
        assert!((d - 1.2).abs() < 1e-9);
    }

    #[test]
    fn add_node_on_genome_with_no_enabled_genes_is_noop() {
        let mut innovation = InnovationRegistry::new(5);
        let mut r = rng();
        let mut genome = Genome::minimal(3, 1, true, &mut r, &mut innovation);
        for innov in genome.connections.keys().copied().collect::<Vec<_>>() {
            genome.connections.get_mut(&innov).unwrap().enabled = false;
        }
        let before = genome.clone();
        let after = genome.add_node_mutation(&mut r, &mut innovation);
        assert_eq!(before.gene_count(), after.gene_count());
        assert_eq!(before.nodes.len(), after.nodes.len());
    }

    #[test]
    fn add_connection_on_fully_connected_genome_is_noop() {
        let mut innovation = InnovationRegistry::new(5);
        let mut r = rng();
        let genome = Genome::minimal(2, 1, false, &mut r, &mut innovation);
        // inputs 0,1 -> output 2 already fully connected, no hidden nodes.
        let after = genome.add_connection_mutation(&mut r, &mut innovation);
        assert_eq!(genome.gene_count(), after.gene_count());
    }

    #[test]
    fn add_node_disables_original_and_adds_two_enabled_genes() {
        let mut innovation = InnovationRegistry::new(5);
        let mut r = rng();
        let genome = Genome::minimal(3, 1, true, &mut r, &mut innovation);
        let before_count = genome.gene_count();
        let after = genome.add_node_mutation(&mut r, &mut innovation);
        assert_eq!(after.gene_count(), before_count + 2);
        let disabled_count = after.connections.values().filter(|g| !g.enabled).count();
        assert_eq!(disabled_count, 1);
    }
}
