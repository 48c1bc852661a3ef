use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use uuid::Uuid;

/// Defaults read from `lend.toml` in the working directory and `LEND_*`
/// environment variables. Command-line flags take precedence over both.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    /// Portfolio snapshot path (JSON or YAML).
    pub data: Option<String>,
    /// User the portfolio commands act as.
    pub user: Option<Uuid>,
    /// Output format name, e.g. "table".
    pub output: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("lend").required(false))
            .add_source(Environment::with_prefix("LEND"))
            .build()?;

        config.try_deserialize()
    }
}
