//! Crate-wide error types.
//!
//! Variation operators never error (see `genome.rs`): unmet preconditions make
//! them a no-op. These types cover the boundaries that spec explicitly
//! surfaces to callers — activation arity, network construction, and the
//! evolution driver.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while activating a built [`crate::network::Network`].
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum ActivationError {
    #[error("expected {expected} inputs, got {actual}")]
    InputArityMismatch { expected: usize, actual: usize },
}

/// Errors raised while building a [`crate::network::Network`] from a genome.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("genome has no nodes")]
    EmptyGenome,
    #[error("cycle detected through connections {0:?}")]
    CycleDetected(Vec<u64>),
}

/// Errors raised by the generation loop (`evolution.rs`).
#[derive(Error, Diagnostic, Debug, Clone, PartialEq)]
pub enum EvolutionError {
    #[error("evaluation produced zero survivors")]
    EmptyPopulation,
}
