use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{atomic::AtomicBool, Arc};

/// Configuration for a `train_network` run.
///
/// # Fields
/// - `limit`: train on at most this many samples; `None` uses all
/// - `seed`: seeds `rng()`, which `train_from_scratch` uses for parameter
///   initialization; `None` draws from entropy
/// - `log_every`: emit a progress line every this many samples; `0`
///   disables progress logging
/// - `check_nan`: after each step, check the output layer for NaN and
///   log a warning the first time one appears
/// - `stop_flag`: optional atomic flag; when set to `true` from another
///   thread the loop stops before the next sample
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub limit: Option<usize>,
    pub seed: Option<u64>,
    pub log_every: usize,
    pub check_nan: bool,
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            limit: None,
            seed: None,
            log_every: 10_000,
            check_nan: false,
            stop_flag: None,
        }
    }
}

impl TrainConfig {
    /// Creates a `TrainConfig` with no limit, no seed and no stop flag.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_log_every(mut self, log_every: usize) -> Self {
        self.log_every = log_every;
        self
    }

    pub fn with_nan_check(mut self, check_nan: bool) -> Self {
        self.check_nan = check_nan;
        self
    }

    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    /// RNG for parameter initialization, seeded when `seed` is set.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        }
    }
}
