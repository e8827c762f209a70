//! Repository configuration
//!
//! Two levels:
//! - Preset: `consistent` (default) or `low_latency`
//! - YAML v1 overrides, then the `NRT_INDEX_APPLY_ALL_DELETES` environment switch
//!
//! ```rust,ignore
//! use nrt_index::config::{Preset, RepositoryConfig};
//!
//! let config = RepositoryConfig::preset(Preset::LowLatency).writer_threads(2);
//! let config = RepositoryConfig::from_yaml("repository.yaml")?.with_env_overrides();
//! ```

pub mod error;
pub mod io;
pub mod preset;
pub mod repository_config;

// Re-exports
pub use error::{ConfigError, ConfigResult};
pub use io::{ConfigExportV1, ConfigOverrides};
pub use preset::Preset;
pub use repository_config::{RepositoryConfig, ENV_APPLY_ALL_DELETES};
