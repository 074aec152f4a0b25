//! C4 — partitions a population by compatibility distance around persistent,
//! generation-to-generation representatives. See spec.md §4.4.

use std::collections::HashMap;

use rand::seq::IteratorRandom;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::config::CompatibilityCoefficients;
use crate::genome::Genome;

/// Stable species identifier. Ids are never reused within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub u64);

/// One species: a persistent id, its members for the current generation, and
/// the bookkeeping the reproduction pipeline (C5) needs for stagnation
/// culling (SPEC_FULL §4.5 supplement).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub members: Vec<Genome>,
    pub best_fitness: f64,
    pub generations_without_improvement: usize,
}

impl Species {
    pub fn adjusted_fitness_sum(&self) -> f64 {
        self.members.iter().map(|g| g.adjusted_fitness).sum()
    }
}

/// Output of one [`speciate`] call: members grouped by species, and the
/// representative each species carries into the next generation.
pub struct SpeciationResult {
    pub members_by_species: HashMap<SpeciesId, Vec<Genome>>,
    pub representatives: HashMap<SpeciesId, Genome>,
}

/// Assigns every genome in `population` to a species (spec.md §4.4).
///
/// Assignment is first-match, not nearest: genomes are tested against
/// representatives in ascending species-id order, and a genome joins the
/// first species whose representative is within `threshold`. This — plus
/// the caller threading one seeded RNG through every generation — is what
/// makes a run reproducible under a fixed seed (spec.md §5).
pub fn speciate(
    population: Vec<Genome>,
    threshold: f64,
    coeffs: &CompatibilityCoefficients,
    representatives: &HashMap<SpeciesId, Genome>,
    rng: &mut dyn RngCore,
) -> SpeciationResult {
    let mut ordered_ids: Vec<SpeciesId> = representatives.keys().copied().collect();
    ordered_ids.sort();

    let mut next_id = ordered_ids.last().map(|id| id.0 + 1).unwrap_or(1);
    let mut members_by_species: HashMap<SpeciesId, Vec<Genome>> = HashMap::new();
    // Representatives created fresh during this call, appended to the
    // stable-order list as they appear so later genomes in the same
    // population can match them too.
    let mut live_representatives: Vec<(SpeciesId, Genome)> = ordered_ids
        .iter()
        .map(|&id| (id, representatives[&id].clone()))
        .collect();

    for mut genome in population {
        let found = live_representatives
            .iter()
            .find(|(_, rep)| genome.compatibility_distance(rep, coeffs) < threshold)
            .map(|(id, _)| *id);

        let sid = match found {
            Some(id) => id,
            None => {
                let id = SpeciesId(next_id);
                next_id += 1;
                live_representatives.push((id, genome.clone()));
                id
            }
        };

        genome.species_id = Some(sid);
        members_by_species.entry(sid).or_default().push(genome);
    }

    let mut new_representatives = HashMap::new();
    for (sid, members) in &members_by_species {
        if let Some(representative) = members.iter().choose(rng) {
            new_representatives.insert(*sid, representative.clone());
        }
    }

    SpeciationResult {
        members_by_species,
        representatives: new_representatives,
    }
}
