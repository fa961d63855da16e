use std::path::PathBuf;

use anyhow::Context;
use dd_datagen::inspect::inspect_archive;

pub(crate) fn run(path: PathBuf) -> anyhow::Result<()> {
    let summary = inspect_archive(&path).map_err(|e| anyhow::anyhow!("{e}"))?;
    let json = serde_json::to_string_pretty(&summary).context("encode summary")?;
    println!("{json}");
    Ok(())
}
