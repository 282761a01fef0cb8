use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Wardbook";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}

/// Explicit runtime configuration. Callers construct one and hand the
/// resulting database handle to the workflow components. No process-wide
/// settings object.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Data under ~/Wardbook/ by default.
    pub fn from_home() -> Option<Self> {
        let home = dirs::home_dir()?;
        Some(Self {
            data_dir: home.join(APP_NAME),
        })
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path of the records database inside the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("records.db")
    }
}
