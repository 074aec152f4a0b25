//! Recognized run options (spec.md §6), as a plain `serde`-derived struct —
//! grounded on `context.rs::NeatConfig` in the teacher, generalized to the
//! full option set spec.md names. Loading this from a file or environment is
//! an external-collaborator concern (spec.md §1) left to the caller; this
//! crate only defines the struct and its defaults.

use serde::{Deserialize, Serialize};

/// Independent per-operator mutation probabilities, applied in the fixed
/// order add-node, add-connection, weight-mutation, toggle (spec.md §4.2.4).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationRates {
    pub add_node_rate: f64,
    pub add_connection_rate: f64,
    pub weight_mutation_rate: f64,
    pub toggle_connection_rate: f64,
    /// Within a weight mutation, probability of perturbing rather than
    /// replacing a weight outright (spec.md §4.2.4).
    pub perturbation_rate: f64,
    /// Scale of the perturbation noise (`weight += N(0,1) * perturbation_power`).
    pub perturbation_power: f64,
}

impl Default for MutationRates {
    fn default() -> Self {
        MutationRates {
            add_node_rate: 0.03,
            add_connection_rate: 0.05,
            weight_mutation_rate: 0.8,
            toggle_connection_rate: 0.01,
            perturbation_rate: 0.9,
            perturbation_power: 0.5,
        }
    }
}

/// Compatibility-distance coefficients (spec.md §4.2.2).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityCoefficients {
    pub c1_excess: f64,
    pub c2_disjoint: f64,
    pub c3_weight: f64,
}

impl Default for CompatibilityCoefficients {
    fn default() -> Self {
        CompatibilityCoefficients {
            c1_excess: 1.0,
            c2_disjoint: 1.0,
            c3_weight: 0.4,
        }
    }
}

/// Optional parsimony pressure (spec.md SPEC_FULL §4.2 supplement). Disabled
/// by default; setting it changes nothing about the core algorithm except
/// the fitness value the driver records before speciation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParsimonyPressure {
    /// Hidden-node count below which no penalty applies.
    pub complexity_threshold: usize,
    pub complexity_penalty_coefficient: f64,
}

/// All options recognized by [`crate::evolution::run`] (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NeatConfig {
    pub population_size: usize,
    pub max_generations: usize,
    pub compatibility_threshold: f64,
    pub inputs: usize,
    pub outputs: usize,
    pub bias: bool,
    pub elitism: usize,
    pub crossover_rate: f64,
    pub mutation_rates: MutationRates,
    pub compatibility: CompatibilityCoefficients,
    pub seed: Option<u64>,
    /// Generations a species may go without improving its best fitness
    /// before being excluded from offspring allocation. `None` disables
    /// stagnation culling (spec.md §9 open question (b) — see DESIGN.md).
    pub stagnation_limit: Option<usize>,
    pub parsimony: Option<ParsimonyPressure>,
}

impl Default for NeatConfig {
    fn default() -> Self {
        NeatConfig {
            population_size: 150,
            max_generations: 500,
            compatibility_threshold: 3.0,
            inputs: 3,
            outputs: 1,
            bias: true,
            elitism: 1,
            crossover_rate: 0.7,
            mutation_rates: MutationRates::default(),
            compatibility: CompatibilityCoefficients::default(),
            seed: None,
            stagnation_limit: None,
            parsimony: None,
        }
    }
}
