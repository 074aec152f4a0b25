//! C5 — adjusted-fitness sharing, offspring allocation, elitism, and
//! intra-species breeding. See spec.md §4.5.

use std::cmp::Ordering;

use rand::seq::IteratorRandom;
use rand::RngCore;

use crate::config::NeatConfig;
use crate::genome::Genome;
use crate::innovation::InnovationRegistry;
use crate::species::Species;

/// Applies fitness sharing in place: `adjusted_fitness = fitness / n` for
/// every member of a species of size `n` (spec.md §4.5).
pub fn share_fitness(species: &mut Species) {
    let n = species.members.len() as f64;
    for genome in &mut species.members {
        genome.adjusted_fitness = genome.fitness / n;
    }
    let best = species
        .members
        .iter()
        .map(|g| g.fitness)
        .fold(f64::NEG_INFINITY, f64::max);
    if best > species.best_fitness {
        species.best_fitness = best;
        species.generations_without_improvement = 0;
    } else {
        species.generations_without_improvement += 1;
    }
}

/// Offspring allocation (spec.md §4.5). Species excluded by `S_s <= 0` or by
/// stagnation (SPEC_FULL §4.5 supplement) receive zero. Returned in the same
/// order as `species`.
///
/// `T`, per spec.md §4.5's literal "let `T` = `Σ_s S_s`", is summed over
/// *every* species, not just the ones eligible to receive offspring — a
/// species can be excluded from receiving a share (stagnant, or its own
/// `S_s <= 0`) while still counting toward `T` dragging it negative. This
/// is what makes the `T <= 0` "allocate equally" branch reachable with
/// eligible species still present: e.g. one strongly negative, excluded
/// species alongside several small-positive, eligible ones.
pub fn allocate_offspring(
    species: &[Species],
    population_size: usize,
    stagnation_limit: Option<usize>,
) -> Vec<usize> {
    let eligible: Vec<bool> = species
        .iter()
        .map(|s| {
            let stagnant = stagnation_limit
                .map(|limit| s.generations_without_improvement >= limit)
                .unwrap_or(false);
            !stagnant && s.adjusted_fitness_sum() > 0.0
        })
        .collect();

    let eligible_count = eligible.iter().filter(|&&e| e).count();
    if eligible_count == 0 {
        return vec![0; species.len()];
    }

    let total: f64 = species.iter().map(|s| s.adjusted_fitness_sum()).sum();

    let mut allocation: Vec<usize> = if total <= 0.0 {
        species
            .iter()
            .zip(&eligible)
            .map(|(_, &e)| if e { population_size / eligible_count } else { 0 })
            .collect()
    } else {
        let eligible_total: f64 = species
            .iter()
            .zip(&eligible)
            .filter(|(_, &e)| e)
            .map(|(s, _)| s.adjusted_fitness_sum())
            .sum();
        species
            .iter()
            .zip(&eligible)
            .map(|(s, &e)| {
                if e {
                    ((s.adjusted_fitness_sum() / eligible_total) * population_size as f64)
                        .floor()
                        .max(1.0) as usize
                } else {
                    0
                }
            })
            .collect()
    };

    reconcile(&mut allocation, population_size);
    allocation
}

/// Adjusts `allocation` in place so it sums to exactly `target`, re-deriving
/// the max/min each step (spec.md §9: the source's bug was reusing a stale
/// sorted list across decrement iterations, which could leave totals off).
fn reconcile(allocation: &mut [usize], target: usize) {
    loop {
        let sum: usize = allocation.iter().sum();
        if sum == target {
            return;
        }
        if sum < target {
            let Some(i) = allocation
                .iter()
                .enumerate()
                .max_by_key(|&(_, &v)| v)
                .map(|(i, _)| i)
            else {
                return;
            };
            allocation[i] += 1;
        } else {
            let Some(i) = allocation
                .iter()
                .enumerate()
                .filter(|&(_, &v)| v > 1)
                .min_by_key(|&(_, &v)| v)
                .map(|(i, _)| i)
            else {
                return;
            };
            allocation[i] -= 1;
        }
    }
}

/// Breeds one species' offspring allocation (spec.md §4.5 "Breeding per
/// species"): elites first, then tournament-selected, crossed-over and
/// mutated children.
pub fn breed_species(
    species: &Species,
    allocation: usize,
    config: &NeatConfig,
    rng: &mut dyn RngCore,
    innovation: &mut InnovationRegistry,
) -> Vec<Genome> {
    if allocation == 0 || species.members.is_empty() {
        return Vec::new();
    }

    let mut by_fitness = species.members.clone();
    by_fitness.sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap_or(Ordering::Equal));

    let elite_count = config.elitism.min(allocation);
    let mut offspring: Vec<Genome> = by_fitness.iter().take(elite_count).cloned().collect();

    for _ in elite_count..allocation {
        let parent_a = tournament_select(&species.members, rng);
        let child = if species.members.len() > 1 && rng.random::<f64>() < config.crossover_rate {
            let parent_b = tournament_select(&species.members, rng);
            parent_a.crossover(parent_b, rng)
        } else {
            parent_a.clone()
        };
        let mut child = child.mutate(config, rng, innovation);
        child.species_id = Some(species.id);
        offspring.push(child);
    }

    offspring
}

/// Tournament of size 3, drawn without replacement from `members`; the
/// fittest of the three wins (spec.md §4.5, §9: both parents come from the
/// same species, matching canonical NEAT).
fn tournament_select<'a>(members: &'a [Genome], rng: &mut dyn RngCore) -> &'a Genome {
    let size = members.len().min(3);
    members
        .iter()
        .choose_multiple(rng, size)
        .into_iter()
        .max_by(|a, b| a.fitness.partial_cmp(&b.fitness).unwrap_or(Ordering::Equal))
        .expect("members is non-empty")
}

/// Breeds every species, ascending by [`SpeciesId`] (spec.md §4.5 ordering
/// guarantee), and returns the combined next-generation population.
pub fn reproduce(
    species: &[Species],
    allocations: &[usize],
    config: &NeatConfig,
    rng: &mut dyn RngCore,
    innovation: &mut InnovationRegistry,
) -> Vec<Genome> {
    let mut ordered: Vec<(&Species, usize)> = species.iter().zip(allocations.iter().copied()).collect();
    ordered.sort_by_key(|(s, _)| s.id);

    let mut next_generation = Vec::new();
    for (s, allocation) in ordered {
        next_generation.extend(breed_species(s, allocation, config, rng, innovation));
    }
    next_generation
}
