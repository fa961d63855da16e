use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use dd_config::GenConfig;

/// Command-line values that take precedence over the config file.
#[derive(Args, Debug, Default)]
pub(crate) struct Overrides {
    /// Directory the archives are written to
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Number of archives to generate
    #[arg(long)]
    pub num_files: Option<usize>,

    /// Number of archives written at the same time
    #[arg(long)]
    pub num_workers: Option<usize>,

    /// Approximate number of records per archive
    #[arg(long)]
    pub messages_per_file: Option<u64>,
}

impl Overrides {
    fn apply(self, config: &mut GenConfig) {
        if let Some(dir) = self.output_dir {
            config.output.dir = dir;
        }
        if let Some(n) = self.num_files {
            config.run.num_files = n;
        }
        if let Some(n) = self.num_workers {
            config.run.num_workers = n;
        }
        if let Some(n) = self.messages_per_file {
            config.run.messages_per_file = n;
        }
    }
}

/// Load the config file (or defaults), apply CLI overrides and validate.
///
/// Also returns the directory relative log paths resolve against: the config
/// file's parent, or the working directory without a config file.
pub(crate) fn load_config(
    path: Option<PathBuf>,
    overrides: Overrides,
) -> anyhow::Result<(GenConfig, PathBuf)> {
    let (mut config, base_dir) = match path {
        Some(path) => {
            let path = path
                .canonicalize()
                .with_context(|| format!("config path '{}'", path.display()))?;
            let config = GenConfig::load(&path)?;
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (config, base)
        }
        None => (GenConfig::default(), PathBuf::from(".")),
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok((config, base_dir))
}
