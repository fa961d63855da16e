use crate::generator::GenConfig;

/// Longest accepted `run.lookback`, in days.
pub const MAX_LOOKBACK_DAYS: u64 = 36_500;

/// Checks applied after parsing and again after CLI overrides.
pub fn validate(config: &GenConfig) -> anyhow::Result<()> {
    if config.run.num_workers == 0 {
        anyhow::bail!("run.num_workers must be > 0");
    }

    let jitter = config.run.jitter;
    if !(0.0..1.0).contains(&jitter) {
        anyhow::bail!("run.jitter must be in [0.0, 1.0), got {jitter}");
    }

    let lookback = config.run.lookback;
    if lookback.is_zero() {
        anyhow::bail!("run.lookback must be > 0");
    }
    if lookback.as_secs() > MAX_LOOKBACK_DAYS * 86_400 {
        anyhow::bail!("run.lookback must be at most {MAX_LOOKBACK_DAYS}d, got {lookback}");
    }

    if config.output.compression_level > 9 {
        anyhow::bail!(
            "output.compression_level must be in 0..=9, got {}",
            config.output.compression_level,
        );
    }

    let prefix = &config.output.file_prefix;
    if prefix.is_empty() {
        anyhow::bail!("output.file_prefix must not be empty");
    }
    if prefix.contains(|c: char| c == '/' || c == '\\') {
        anyhow::bail!("output.file_prefix must not contain path separators, got {prefix:?}");
    }

    Ok(())
}
