//! Engine configuration
//!
//! Read from a single JSON file. Every field has a default, so `{}` is a
//! valid configuration describing an in-memory REGULAR volume.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::membership::{InstanceId, MembershipError, MembershipResult, VolumeType};
use crate::observability::{Event, Logger};

/// Configuration of the membership engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Volume type of the segments handled here (default: REGULAR)
    #[serde(default)]
    pub volume_type: VolumeType,

    /// The local instance, when this engine runs on a storage node
    #[serde(default)]
    pub instance_id: Option<u64>,

    /// Append-only membership log; memberships stay in memory when absent
    #[serde(default)]
    pub store_path: Option<String>,

    /// fsync after every persisted snapshot (default: true)
    #[serde(default = "default_fsync_on_persist")]
    pub fsync_on_persist: bool,
}

fn default_fsync_on_persist() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            volume_type: VolumeType::default(),
            instance_id: None,
            store_path: None,
            fsync_on_persist: default_fsync_on_persist(),
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from file
    pub fn load(path: &Path) -> MembershipResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MembershipError::configuration_error(format!(
                "failed to read config {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_json(&content)?;

        Logger::info(
            Event::ConfigLoaded.as_str(),
            &[
                ("path", &path.display().to_string()),
                ("volume_type", config.volume_type.name()),
            ],
        );
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> MembershipResult<Self> {
        let config: EngineConfig = serde_json::from_str(content).map_err(|e| {
            MembershipError::configuration_error(format!("invalid config JSON: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MembershipResult<()> {
        if let Some(path) = &self.store_path {
            if path.trim().is_empty() {
                return Err(MembershipError::configuration_error(
                    "store_path must not be empty",
                ));
            }
        }
        Ok(())
    }

    pub fn instance(&self) -> Option<InstanceId> {
        self.instance_id.map(InstanceId::new)
    }

    pub fn store_path(&self) -> Option<&Path> {
        self.store_path.as_deref().map(Path::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.volume_type, VolumeType::Regular);
        assert!(config.fsync_on_persist);
        assert!(config.store_path().is_none());
    }

    #[test]
    fn test_full_config() {
        let config = EngineConfig::from_json(
            r#"{"volume_type":"LARGE","instance_id":7,"store_path":"/tmp/m.log","fsync_on_persist":false}"#,
        )
        .unwrap();
        assert_eq!(config.volume_type, VolumeType::Large);
        assert_eq!(config.instance(), Some(InstanceId::new(7)));
        assert_eq!(config.store_path(), Some(Path::new("/tmp/m.log")));
        assert!(!config.fsync_on_persist);
    }

    #[test]
    fn test_rejects_empty_store_path() {
        let err = EngineConfig::from_json(r#"{"store_path":"  "}"#).unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_zero_is_a_valid_instance() {
        let config = EngineConfig::from_json(r#"{"instance_id":0}"#).unwrap();
        assert_eq!(config.instance(), Some(InstanceId::new(0)));
    }

    #[test]
    fn test_rejects_unknown_volume_type() {
        assert!(EngineConfig::from_json(r#"{"volume_type":"HUGE"}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"volume_type":"SMALL"}}"#).unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.volume_type, VolumeType::Small);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(EngineConfig::load(&dir.path().join("absent.json")).is_err());
    }
}
