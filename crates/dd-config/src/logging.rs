use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

/// `[logging]` section. Every field has a default, so the section is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Base filter level (`"info"`, `"debug"`, ...).
    pub level: String,
    /// Per-target overrides, e.g. `{ "dd_datagen::runner" = "debug" }`.
    pub modules: HashMap<String, String>,
    /// Log file; relative paths resolve against the config file's directory.
    pub file: Option<PathBuf>,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            modules: HashMap::new(),
            file: None,
            format: LogFormat::Plain,
        }
    }
}

impl LoggingConfig {
    /// Render `level` plus module overrides as an `EnvFilter` directive string.
    pub fn filter_directives(&self) -> String {
        let mut modules: Vec<_> = self.modules.iter().collect();
        modules.sort();
        let mut directives = self.level.clone();
        for (target, level) in modules {
            directives.push(',');
            directives.push_str(target);
            directives.push('=');
            directives.push_str(level);
        }
        directives
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Plain,
    Json,
}
