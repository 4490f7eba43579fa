use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::model::{DbLayout, DbNum};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub tables: TablesConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Key separator overrides by database name, e.g. `CONFIG_DB = "|"`
    #[serde(default)]
    pub separators: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TablesConfig {
    /// Table relationship file (`{"tablelist": [...]}`)
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional `xlate.{toml,json,yaml}`
    /// in the working directory, and `XLATE_` environment variables.
    ///
    /// Nested keys use `__` in variable names, e.g.
    /// `XLATE_STORE__SEPARATORS__APPL_DB=|` or `XLATE_LOGGING__LEVEL=debug`.
    pub fn load() -> anyhow::Result<Self> {
        Self::build(config::File::with_name("xlate").required(false))
    }

    /// Like [`load`](Self::load) but with an explicit, required config file
    pub fn load_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Self::build(config::File::from(path.as_ref()).required(true))
    }

    fn build<S>(file: S) -> anyhow::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("XLATE")
                    .separator("__")
                    .prefix_separator("_"),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Key separators for every database, with configured overrides applied
    pub fn db_layout(&self) -> anyhow::Result<DbLayout> {
        let mut layout = DbLayout::new();
        for (name, separator) in &self.store.separators {
            let db = DbNum::from_name(&name.to_uppercase())
                .ok_or_else(|| anyhow::anyhow!("unknown database '{}' in store.separators", name))?;
            layout = layout.with_separator(db, separator.clone());
        }
        Ok(layout)
    }

    /// Configured log level; unparseable values fall back to info
    pub fn log_level(&self) -> LevelFilter {
        self.logging.level.parse().unwrap_or(LevelFilter::Info)
    }
}
