use std::path::PathBuf;
use std::sync::Arc;

use dd_datagen::model::CategoryModel;
use dd_datagen::runner;
use dd_datagen::tracing_init::init_tracing;

use crate::cmd_helpers::{Overrides, load_config};

pub(crate) async fn run(config: Option<PathBuf>, overrides: Overrides) -> anyhow::Result<()> {
    let (config, base_dir) = load_config(config, overrides)?;
    let _guard = init_tracing(&config.logging, &base_dir)?;

    let model = CategoryModel::builtin().map_err(|e| anyhow::anyhow!("{e}"))?;
    tracing::info!(
        domain = "conf",
        apps = model.apps.len(),
        event_types = model.event_type_count(),
        "category table loaded"
    );

    let report = runner::run(&config, Arc::new(model))
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    if !report.is_success() {
        let failed: Vec<String> = report
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.task.path.display(), f.error))
            .collect();
        anyhow::bail!(
            "{} of {} archive(s) failed:\n  {}",
            failed.len(),
            failed.len() + report.outcomes.len(),
            failed.join("\n  ")
        );
    }

    tracing::info!(domain = "sys", "generation complete");
    Ok(())
}
