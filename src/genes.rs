//! The atomic units of heredity (spec.md §3): connection genes and node roles.

use serde::{Deserialize, Serialize};

use crate::innovation::NodeId;

/// One directed, weighted edge in a genome.
///
/// Disabled genes stay present (so crossover can still match them by
/// innovation) but contribute nothing during activation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGene {
    pub innovation: u64,
    pub in_node: NodeId,
    pub out_node: NodeId,
    pub weight: f64,
    pub enabled: bool,
}

impl ConnectionGene {
    pub fn new(in_node: NodeId, out_node: NodeId, weight: f64, innovation: u64) -> Self {
        debug_assert_ne!(in_node, out_node, "a connection gene must not self-loop");
        ConnectionGene {
            innovation,
            in_node,
            out_node,
            weight,
            enabled: true,
        }
    }
}

/// The role a node plays, derived from the id ranges recorded at genome
/// creation rather than from in/out-degree.
///
/// spec.md §9 calls out the source's degree-based heuristic as an open bug:
/// a hidden node that happens to be a pure sink or source after mutation
/// would be misclassified as an output or input. Roles here are looked up
/// from `Genome`'s recorded `input_nodes` / `bias_node` / `output_nodes`,
/// never inferred from the gene list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    Input,
    Bias,
    Output,
    Hidden,
}
