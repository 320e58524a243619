mod model_trainer;

use rand::{SeedableRng, rngs::StdRng};

pub use model_trainer::ModelTrainer;

/// Creates the generator used for training, reproducible when `seed` is given.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
