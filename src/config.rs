use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::DatabaseError;

const CONFIG_FILE: &str = "relstore.toml";
const ENV_PREFIX: &str = "RELSTORE";

/// Storage settings shared by every table opened from one data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Pages kept in each table's buffer pool
    #[serde(default = "default_buffer_pool_pages")]
    pub buffer_pool_pages: usize,
    /// Size after which the record log rotates to a new file
    #[serde(default = "default_wal_max_size")]
    pub wal_max_size: u64,
    /// Defaults for vector indexes created without explicit parameters
    #[serde(default = "default_vector_lists")]
    pub vector_lists: usize,
    #[serde(default = "default_vector_probes")]
    pub vector_probes: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
const fn default_buffer_pool_pages() -> usize {
    128
}
const fn default_wal_max_size() -> u64 {
    1024 * 1024
}
const fn default_vector_lists() -> usize {
    16
}
const fn default_vector_probes() -> usize {
    4
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            buffer_pool_pages: default_buffer_pool_pages(),
            wal_max_size: default_wal_max_size(),
            vector_lists: default_vector_lists(),
            vector_probes: default_vector_probes(),
        }
    }
}

impl StorageConfig {
    /// Defaults rooted at `data_dir`
    pub fn with_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Loads settings with priority: ENV > config file > defaults.
    ///
    /// `file` overrides the default `./relstore.toml`; a missing file is not
    /// an error, a malformed one is.
    pub fn load(file: Option<&Path>) -> Result<Self, DatabaseError> {
        let path = file.map_or_else(|| PathBuf::from(CONFIG_FILE), Path::to_path_buf);

        let mut builder = Config::builder();
        if path.exists() {
            tracing::info!(path = %path.display(), "loading config file");
            builder = builder.add_source(File::from(path.as_path()));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config = builder.build()?.try_deserialize::<Self>()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), DatabaseError> {
        if self.buffer_pool_pages == 0 {
            return Err(DatabaseError::InvalidArgument(
                "buffer_pool_pages must be positive".to_string(),
            ));
        }
        if self.vector_lists == 0 || self.vector_probes == 0 {
            return Err(DatabaseError::InvalidArgument(
                "vector_lists and vector_probes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// JSON schema file of a table
    #[must_use]
    pub fn meta_path(&self, table_name: &str) -> PathBuf {
        self.data_dir.join(format!("{table_name}.table"))
    }

    /// Directory holding a table's page files
    #[must_use]
    pub fn data_path(&self, table_name: &str) -> PathBuf {
        self.data_dir.join(format!("{table_name}.data"))
    }

    #[must_use]
    pub fn text_path(&self, table_name: &str) -> PathBuf {
        self.data_dir.join(format!("{table_name}.text"))
    }

    #[must_use]
    pub fn vector_path(&self, table_name: &str) -> PathBuf {
        self.data_dir.join(format!("{table_name}.vector"))
    }
}
