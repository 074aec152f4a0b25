//! Per-generation statistics recorded by the evolution driver (C6). See
//! spec.md §4.6 step 3 and §7 (evaluator-failure counting).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub generation: usize,
    pub population_size: usize,
    pub species_count: usize,
    pub best_fitness: f64,
    pub average_fitness: f64,
    pub fitness_std_dev: f64,
    /// Optional, caller-supplied population diversity (spec.md §4.6 step 3:
    /// "optional diversity via a caller-supplied distance").
    pub diversity: Option<f64>,
    /// Genomes whose evaluation failed this generation (spec.md §7
    /// `EvaluatorFailure` policy: fitness set to `-inf`, counted here).
    pub evaluator_failures: usize,
}

impl Statistics {
    pub fn compute(
        fitnesses: &[f64],
        generation: usize,
        species_count: usize,
        diversity: Option<f64>,
        evaluator_failures: usize,
    ) -> Self {
        let population_size = fitnesses.len();
        let finite: Vec<f64> = fitnesses.iter().copied().filter(|f| f.is_finite()).collect();

        let best_fitness = fitnesses.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let average_fitness = if finite.is_empty() {
            f64::NEG_INFINITY
        } else {
            finite.iter().sum::<f64>() / finite.len() as f64
        };
        let fitness_std_dev = if finite.len() > 1 {
            let mean = average_fitness;
            let variance =
                finite.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / finite.len() as f64;
            variance.sqrt()
        } else {
            0.0
        };

        Statistics {
            generation,
            population_size,
            species_count,
            best_fitness,
            average_fitness,
            fitness_std_dev,
            diversity,
            evaluator_failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_best_and_average() {
        let stats = Statistics::compute(&[1.0, 2.0, 3.0], 0, 1, None, 0);
        assert_eq!(stats.best_fitness, 3.0);
        assert!((stats.average_fitness - 2.0).abs() < 1e-9);
    }

    #[test]
    fn ignores_failed_evaluations_in_average() {
        let stats = Statistics::compute(&[1.0, f64::NEG_INFINITY, 3.0], 0, 1, None, 1);
        assert!((stats.average_fitness - 2.0).abs() < 1e-9);
        assert_eq!(stats.evaluator_failures, 1);
    }
}
