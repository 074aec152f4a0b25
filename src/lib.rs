//! Core NEAT (NeuroEvolution of Augmenting Topologies): genome encoding and
//! variation, speciation, reproduction, and the feed-forward phenotype
//! network, plus the generation-loop driver that ties them together.
//!
//! Evaluation, checkpointing cadence, and everything UI- or
//! persistence-adjacent are the caller's concern; this crate owns the
//! algorithm.

mod activation;
mod checkpoint;
mod config;
mod error;
mod evolution;
mod genes;
mod genome;
mod innovation;
mod network;
mod reproduction;
mod rng;
mod species;
mod statistics;

pub use activation::Activation;
pub use checkpoint::{Checkpoint, CheckpointError};
pub use config::{CompatibilityCoefficients, MutationRates, NeatConfig, ParsimonyPressure};
pub use error::{ActivationError, EvolutionError, NetworkError};
pub use evolution::{run, Evaluator, Problem, SequentialEvaluator};
pub use genes::{ConnectionGene, NodeRole};
pub use genome::Genome;
pub use innovation::{InnovationRegistry, InnovationSnapshot, NodeId};
pub use network::Network;
pub use species::{Species, SpeciesId};
pub use statistics::Statistics;
