use std::path::PathBuf;

use dd_datagen::model::CategoryModel;
use dd_datagen::partition::ArchiveLayout;

use crate::cmd_helpers::{Overrides, load_config};

pub(crate) fn run(config: Option<PathBuf>, overrides: Overrides) -> anyhow::Result<()> {
    let (config, _) = load_config(config, overrides)?;
    let model = CategoryModel::builtin().map_err(|e| anyhow::anyhow!("{e}"))?;

    println!("category table: OK");
    for app in &model.apps {
        let types: Vec<&str> = app.event_types.iter().map(|t| t.name.as_str()).collect();
        let oses: Vec<&str> = app.oses.iter().map(|o| o.name.as_str()).collect();
        println!(
            "  {} (weight {}): types [{}], oses [{}]",
            app.name,
            app.weight,
            types.join(", "),
            oses.join(", ")
        );
    }

    let layout = ArchiveLayout::new(&config.output.dir, &config.output.file_prefix);
    println!(
        "config: OK ({} files x ~{} messages, {} workers, lookback {})",
        config.run.num_files,
        config.run.messages_per_file,
        config.run.num_workers,
        config.run.lookback
    );
    match config.run.num_files {
        0 => println!("  no archives planned"),
        1 => println!("  {}", layout.path_for(0).display()),
        n => println!(
            "  {} .. {}",
            layout.path_for(0).display(),
            layout.path_for(n - 1).display()
        ),
    }
    Ok(())
}
