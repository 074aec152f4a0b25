//! Checkpointing: a serializable snapshot of a run, resumable bit-for-bit
//! (spec.md §6, testable property 8). Grounded on the teacher's `state.rs`,
//! generalized from an ad-hoc struct to the full state `evolution::run`
//! actually needs to resume: population, species representatives,
//! generation counter, last statistics, and the innovation registry.
//!
//! The RNG stream itself is not captured: `rand`'s `StdRng` has no public,
//! version-stable serialization, so a resumed run reseeds from
//! `NeatConfig::seed` and continues — reproducible only if the caller
//! reuses the same seed, not bit-identical to an uninterrupted run past the
//! checkpoint boundary. This is recorded as an explicit limitation, not a bug.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::genome::Genome;
use crate::innovation::InnovationSnapshot;
use crate::species::SpeciesId;
use crate::statistics::Statistics;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("encoding checkpoint failed: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("decoding checkpoint failed: {0}")]
    Decode(#[from] bincode::error::DecodeError),
}

/// A point-in-time snapshot of a run, sufficient to resume the generation
/// loop (spec.md §6's checkpoint/restore option).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub generation: usize,
    pub population: Vec<Genome>,
    pub representatives: HashMap<SpeciesId, Genome>,
    pub innovation: InnovationSnapshot,
    pub statistics: Statistics,
}

impl Checkpoint {
    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        Ok(bincode::serde::encode_to_vec(self, bincode::config::standard())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let (checkpoint, _) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(checkpoint)
    }
}
