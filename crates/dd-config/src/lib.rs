pub mod generator;
pub mod logging;
pub mod output;
pub mod run;
pub mod types;
pub mod validate;

pub use generator::GenConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use output::OutputConfig;
pub use run::RunConfig;
pub use types::HumanDuration;
pub use validate::validate;
