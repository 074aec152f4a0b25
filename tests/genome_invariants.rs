use neat_core::{CompatibilityCoefficients, Genome, InnovationRegistry, NeatConfig};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

proptest! {
    /// Invariant 3 (spec.md §3): no two genes in a genome share an
    /// `(in_node, out_node)` pair, across arbitrarily long mutation chains.
    #[test]
    fn mutation_never_introduces_a_duplicate_edge(seed in any::<u64>(), steps in 1usize..40) {
        let mut registry = InnovationRegistry::new(5);
        let mut rng = StdRng::seed_from_u64(seed);
        let config = NeatConfig::default();
        let mut genome = Genome::minimal(3, 1, true, &mut rng, &mut registry);

        for _ in 0..steps {
            genome = genome.mutate(&config, &mut rng, &mut registry);
        }

        let mut seen = std::collections::HashSet::new();
        for gene in genome.genes_sorted() {
            prop_assert!(seen.insert((gene.in_node, gene.out_node)));
        }
    }

    /// Invariant 2 (spec.md §3): every gene's endpoints are in the genome's
    /// recorded node set.
    #[test]
    fn mutation_never_references_an_unknown_node(seed in any::<u64>(), steps in 1usize..40) {
        let mut registry = InnovationRegistry::new(5);
        let mut rng = StdRng::seed_from_u64(seed);
        let config = NeatConfig::default();
        let mut genome = Genome::minimal(3, 1, true, &mut rng, &mut registry);

        for _ in 0..steps {
            genome = genome.mutate(&config, &mut rng, &mut registry);
        }

        for gene in genome.genes_sorted() {
            prop_assert!(genome.nodes().contains(&gene.in_node));
            prop_assert!(genome.nodes().contains(&gene.out_node));
        }
    }

    /// Compatibility distance (spec.md §4.2.2) is never negative, and is
    /// symmetric regardless of mutation history on either side.
    #[test]
    fn compatibility_distance_is_nonnegative_and_symmetric(
        seed_a in any::<u64>(), seed_b in any::<u64>(), steps in 0usize..15
    ) {
        let mut registry = InnovationRegistry::new(5);
        let config = NeatConfig::default();
        let coeffs = CompatibilityCoefficients::default();

        let mut rng_a = StdRng::seed_from_u64(seed_a);
        let mut genome_a = Genome::minimal(3, 1, true, &mut rng_a, &mut registry);
        for _ in 0..steps {
            genome_a = genome_a.mutate(&config, &mut rng_a, &mut registry);
        }

        let mut rng_b = StdRng::seed_from_u64(seed_b);
        let mut genome_b = Genome::minimal(3, 1, true, &mut rng_b, &mut registry);
        for _ in 0..steps {
            genome_b = genome_b.mutate(&config, &mut rng_b, &mut registry);
        }

        let forward = genome_a.compatibility_distance(&genome_b, &coeffs);
        let backward = genome_b.compatibility_distance(&genome_a, &coeffs);
        prop_assert!(forward >= 0.0);
        prop_assert!((forward - backward).abs() < 1e-9);
    }
}
