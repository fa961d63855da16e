use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// `[output]` section: where archives go and how they are compressed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory receiving the archives. Created if missing.
    pub dir: PathBuf,
    /// Archive name stem; files are `<file_prefix>_<NN>.gz`.
    pub file_prefix: String,
    /// gzip level, `0..=9`.
    pub compression_level: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("test_inputs"),
            file_prefix: "archives".to_string(),
            compression_level: 6,
        }
    }
}
