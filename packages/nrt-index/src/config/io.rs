//! Configuration I/O (YAML schema types)
//!
//! Loading and validation live in `repository_config.rs`.

use serde::{Deserialize, Serialize};

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    /// Base preset
    pub preset: String,

    /// Fine-grained overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<ConfigOverrides>,
}

/// Configuration overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_all_deletes: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub writer_heap_bytes: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub writer_threads: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_override_rejected() {
        let yaml = r#"
version: 1
preset: consistent
overrides:
  apply_all_deletes: false
  merge_factor: 10
"#;
        let parsed: Result<ConfigExportV1, _> = serde_yaml::from_str(yaml);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_overrides_optional() {
        let yaml = "version: 1\npreset: low_latency\n";
        let parsed: ConfigExportV1 = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.preset, "low_latency");
        assert!(parsed.overrides.is_none());
    }
}
