//! The single seeded RNG stream threaded through one run (spec.md §5):
//! every operator that needs randomness takes `&mut dyn RngCore` rather than
//! reaching for its own source, so a fixed seed makes a whole run
//! reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Builds the one `StdRng` a run's [`crate::evolution::run`] threads through
/// every genome operator and speciation call. `None` seeds from the OS.
pub fn seeded(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
