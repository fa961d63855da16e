use serde::{Deserialize, Serialize};

use crate::types::HumanDuration;

/// `[run]` section: how much to generate and how wide to fan out.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Number of archives to produce.
    pub num_files: usize,
    /// Upper bound on archives written concurrently.
    pub num_workers: usize,
    /// Approximate records per archive before jitter.
    pub messages_per_file: u64,
    /// Relative jitter `j`: each archive's count is scaled by a factor
    /// drawn from `[1 - j, 1 + j)`.
    pub jitter: f64,
    /// Width of the timestamp window ending at task start.
    pub lookback: HumanDuration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            num_files: 20,
            num_workers: 10,
            messages_per_file: 60_000,
            jitter: 0.1,
            lookback: HumanDuration::from_days(10),
        }
    }
}
