//! Node activation functions used by phenotype networks (C3).

use serde::{Deserialize, Serialize};

/// An activation function applied to a node's summed weighted input.
///
/// `Sigmoid` is the NEAT-standard steepened logistic, spec.md §4.3's default.
/// The others are offered because `sgshea-neat`'s own `ActivationFunction`
/// enum carries them and a caller may want a different output non-linearity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Activation {
    /// `1 / (1 + exp(-4.9 * x))` — the canonical NEAT steepened sigmoid.
    Sigmoid,
    Tanh,
    Relu,
    Identity,
}

impl Activation {
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + (-4.9 * x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::Relu => x.max(0.0),
            Activation::Identity => x,
        }
    }
}

impl Default for Activation {
    fn default() -> Self {
        Activation::Sigmoid
    }
}
