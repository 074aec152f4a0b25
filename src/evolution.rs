//! C6 — the generation loop: evaluate, speciate, reproduce, terminate. See
//! spec.md §4.6 and §6's `run` entry point.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use log::{debug, info, warn};

use crate::config::NeatConfig;
use crate::error::EvolutionError;
use crate::genome::Genome;
use crate::innovation::InnovationRegistry;
use crate::network::Network;
use crate::reproduction::{allocate_offspring, reproduce, share_fitness};
use crate::rng::seeded;
use crate::species::{speciate, Species, SpeciesId};
use crate::statistics::Statistics;

/// A problem for the driver to solve (spec.md §6).
pub struct Problem {
    pub name: String,
    /// Computes one genome's fitness from the genome and its built phenotype.
    pub fitness_function: Box<dyn Fn(&Genome, &Network) -> f64>,
    /// `(sorted_population, generation) -> bool`; `true` stops the run.
    pub termination: Box<dyn Fn(&[Genome], usize) -> bool>,
}

/// Maps a fitness function over a population (spec.md §5's evaluator
/// contract): same list, same order, each genome's `fitness` populated.
/// Implementations may parallelize internally — the core stays
/// single-threaded and only calls through this boundary.
pub trait Evaluator {
    fn evaluate(&self, genomes: Vec<Genome>, problem: &Problem) -> Vec<Genome>;
}

/// The default, sequential evaluator: builds a [`Network`] per genome and
/// calls `problem.fitness_function`. A genome whose network fails to build
/// receives `fitness = -inf` per spec.md §7's `EvaluatorFailure` policy.
pub struct SequentialEvaluator;

impl Evaluator for SequentialEvaluator {
    fn evaluate(&self, mut genomes: Vec<Genome>, problem: &Problem) -> Vec<Genome> {
        for genome in &mut genomes {
            match Network::create(genome) {
                Ok(network) => genome.fitness = (problem.fitness_function)(genome, &network),
                Err(err) => {
                    warn!("evaluator failure building network: {err}");
                    genome.fitness = f64::NEG_INFINITY;
                }
            }
        }
        genomes
    }
}

/// Runs NEAT to completion (spec.md §6 `run`).
///
/// `stop` is checked once per generation for cooperative cancellation
/// (spec.md §5); on cancel, the best genome found so far and the current
/// statistics are returned, same as a natural termination.
pub fn run(
    problem: &Problem,
    config: &NeatConfig,
    evaluator: &dyn Evaluator,
    stop: Option<&AtomicBool>,
) -> Result<(Genome, Statistics), EvolutionError> {
    let mut rng = seeded(config.seed);

    let first_hidden_id =
        config.inputs as u64 + if config.bias { 1 } else { 0 } + config.outputs as u64;
    let mut innovation = InnovationRegistry::new(first_hidden_id);

    let mut population: Vec<Genome> = (0..config.population_size)
        .map(|_| Genome::minimal(config.inputs, config.outputs, config.bias, &mut rng, &mut innovation))
        .collect();

    let mut representatives: HashMap<SpeciesId, Genome> = HashMap::new();
    let mut prior_species: Vec<Species> = Vec::new();
    let mut best_overall: Option<Genome> = None;
    let mut generation = 0usize;

    loop {
        population = evaluator.evaluate(population, problem);
        if population.is_empty() {
            return Err(EvolutionError::EmptyPopulation);
        }

        if let Some(parsimony) = &config.parsimony {
            for genome in &mut population {
                if genome.fitness.is_finite() {
                    let hidden = genome.hidden_node_count();
                    if hidden > parsimony.complexity_threshold {
                        let excess = (hidden - parsimony.complexity_threshold) as f64;
                        genome.fitness -= parsimony.complexity_penalty_coefficient * excess;
                    }
                }
            }
        }

        let evaluator_failures = population
            .iter()
            .filter(|g| g.fitness == f64::NEG_INFINITY)
            .count();

        population.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap_or(Ordering::Equal));

        let current_best = population[0].clone();
        if best_overall
            .as_ref()
            .map_or(true, |best| current_best.fitness > best.fitness)
        {
            best_overall = Some(current_best);
        }

        let speciation = speciate(
            population.clone(),
            config.compatibility_threshold,
            &config.compatibility,
            &representatives,
            &mut rng,
        );
        representatives = speciation.representatives;

        let mut species: Vec<Species> = speciation
            .members_by_species
            .into_iter()
            .map(|(id, members)| {
                let prior = prior_species.iter().find(|s| s.id == id);
                Species {
                    id,
                    members,
                    best_fitness: prior.map(|s| s.best_fitness).unwrap_or(f64::NEG_INFINITY),
                    generations_without_improvement: prior
                        .map(|s| s.generations_without_improvement)
                        .unwrap_or(0),
                }
            })
            .collect();
        for s in &mut species {
            share_fitness(s);
        }
        debug!("generation {generation}: {} species", species.len());

        let fitnesses: Vec<f64> = population.iter().map(|g| g.fitness).collect();
        let stats = Statistics::compute(
            &fitnesses,
            generation,
            species.len(),
            None,
            evaluator_failures,
        );
        info!(
            "generation {generation}: best={:.4} avg={:.4} species={}",
            stats.best_fitness, stats.average_fitness, stats.species_count
        );

        let cancelled = stop
            .map(|flag| flag.load(AtomicOrdering::Relaxed))
            .unwrap_or(false);
        if cancelled || (problem.termination)(&population, generation) || generation >= config.max_generations {
            return Ok((best_overall.expect("population is non-empty"), stats));
        }

        let allocation = allocate_offspring(&species, config.population_size, config.stagnation_limit);
        population = reproduce(&species, &allocation, config, &mut rng, &mut innovation);
        prior_species = species;
        generation += 1;
    }
}
