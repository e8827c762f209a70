//! Repository configuration
//!
//! Preset -> YAML overrides -> environment, in that order.

use super::error::{ConfigError, ConfigResult};
use super::io::{ConfigExportV1, ConfigOverrides};
use super::preset::Preset;
use serde::{Deserialize, Serialize};

/// Environment switch for delete visibility ("true", any case, enables it)
pub const ENV_APPLY_ALL_DELETES: &str = "NRT_INDEX_APPLY_ALL_DELETES";

/// Smallest writer arena the engine accepts per indexing thread
pub const MIN_HEAP_BYTES_PER_THREAD: usize = 15_000_000;

/// Largest writer arena the engine accepts per indexing thread
pub const MAX_HEAP_BYTES_PER_THREAD: usize = (u32::MAX - 1_000_000) as usize;

/// Upper bound the engine places on auto-selected indexing threads
pub const MAX_AUTO_WRITER_THREADS: usize = 8;

/// Configuration for one repository instance.
///
/// Built values are never read from the environment implicitly; call
/// [`with_env_overrides`](Self::with_env_overrides) to honor
/// [`ENV_APPLY_ALL_DELETES`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Republish on delete-only commits (see [`Preset`])
    pub apply_all_deletes: bool,

    /// Total writer arena in bytes, split across indexing threads
    pub writer_heap_bytes: usize,

    /// Indexing threads (0=auto, 1..=64)
    pub writer_threads: usize,

    /// Limit used by `query_default` (1..=10000)
    pub default_limit: usize,

    #[serde(skip)]
    preset: Preset,
}

impl RepositoryConfig {
    pub fn preset(preset: Preset) -> Self {
        Self {
            apply_all_deletes: preset.apply_all_deletes(),
            writer_heap_bytes: 50_000_000, // 50MB heap
            writer_threads: 0,
            default_limit: 100,
            preset,
        }
    }

    pub fn apply_all_deletes(mut self, apply: bool) -> Self {
        self.apply_all_deletes = apply;
        self
    }

    pub fn writer_heap_bytes(mut self, bytes: usize) -> Self {
        self.writer_heap_bytes = bytes;
        self
    }

    pub fn writer_threads(mut self, threads: usize) -> Self {
        self.writer_threads = threads;
        self
    }

    pub fn default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn base_preset(&self) -> Preset {
        self.preset
    }

    /// Threads the writer will actually run with.
    pub fn resolved_writer_threads(&self) -> usize {
        if self.writer_threads > 0 {
            return self.writer_threads;
        }
        let auto = num_cpus::get().clamp(1, MAX_AUTO_WRITER_THREADS);
        // The engine drops threads rather than starve an arena.
        auto.min((self.writer_heap_bytes / MIN_HEAP_BYTES_PER_THREAD).max(1))
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.writer_threads > 64 {
            return Err(ConfigError::range_with_hint(
                "writer_threads",
                self.writer_threads,
                0,
                64,
                "Use 0 to let the engine pick",
            ));
        }

        let threads = self.resolved_writer_threads();
        let per_thread = self.writer_heap_bytes / threads;
        if per_thread < MIN_HEAP_BYTES_PER_THREAD || per_thread > MAX_HEAP_BYTES_PER_THREAD {
            return Err(ConfigError::range_with_hint(
                "writer_heap_bytes",
                self.writer_heap_bytes,
                MIN_HEAP_BYTES_PER_THREAD * threads,
                MAX_HEAP_BYTES_PER_THREAD.saturating_mul(threads),
                format!("Each of the {} writer threads needs its own arena", threads),
            ));
        }

        if self.default_limit < 1 || self.default_limit > 10_000 {
            return Err(ConfigError::range_with_hint(
                "default_limit",
                self.default_limit,
                1,
                10_000,
                "Default limit must be reasonable",
            ));
        }

        Ok(())
    }

    /// Load from a YAML v1 file and validate.
    pub fn from_yaml(path: &str) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let export: ConfigExportV1 = serde_yaml::from_str(content)?;

        if export.version != 1 {
            return Err(ConfigError::UnsupportedVersion {
                found: export.version,
                supported: vec![1],
            });
        }

        let preset = Preset::from_str(&export.preset)
            .map_err(|_| ConfigError::UnknownPreset(export.preset.clone()))?;

        let config = Self::preset(preset).with_overrides(export.overrides.unwrap_or_default());
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let base = Self::preset(self.preset);
        let mut overrides = ConfigOverrides::default();
        if self.apply_all_deletes != base.apply_all_deletes {
            overrides.apply_all_deletes = Some(self.apply_all_deletes);
        }
        if self.writer_heap_bytes != base.writer_heap_bytes {
            overrides.writer_heap_bytes = Some(self.writer_heap_bytes);
        }
        if self.writer_threads != base.writer_threads {
            overrides.writer_threads = Some(self.writer_threads);
        }
        if self.default_limit != base.default_limit {
            overrides.default_limit = Some(self.default_limit);
        }

        let export = ConfigExportV1 {
            version: 1,
            preset: self.preset.as_str().to_string(),
            overrides: Some(overrides),
        };
        Ok(serde_yaml::to_string(&export)?)
    }

    fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(apply) = overrides.apply_all_deletes {
            self.apply_all_deletes = apply;
        }
        if let Some(bytes) = overrides.writer_heap_bytes {
            self.writer_heap_bytes = bytes;
        }
        if let Some(threads) = overrides.writer_threads {
            self.writer_threads = threads;
        }
        if let Some(limit) = overrides.default_limit {
            self.default_limit = limit;
        }
        self
    }

    /// Apply [`ENV_APPLY_ALL_DELETES`] when it is set. Opt-in: neither
    /// [`Default`] nor the repository constructors call this.
    pub fn with_env_overrides(self) -> Self {
        let value = std::env::var(ENV_APPLY_ALL_DELETES).ok();
        self.with_apply_all_deletes_env(value.as_deref())
    }

    fn with_apply_all_deletes_env(mut self, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.apply_all_deletes = value.trim().eq_ignore_ascii_case("true");
        }
        self
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}
