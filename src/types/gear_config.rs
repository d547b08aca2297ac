/// # Gear Configuration
///
/// The `config.json` handed to the gear by the platform: user-selected
/// options under `config`, staged inputs under `inputs`.
///
/// ```json
/// {
///   "config": { "basetime": "0", "MNI": true, "save_on_error": false },
///   "inputs": {
///     "functional": { "hierarchy": { "type": "acquisition", "id": "5a1b..." } },
///     "anatomical": { "location": { "path": "/flywheel/v0/input/anatomical/t1.nii.gz" } },
///     "api_key": { "key": "example.flywheel.io:abc123" }
///   }
/// }
/// ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{GearError, Result};

/// Default location of the gear config inside the container.
pub const DEFAULT_CONFIG_PATH: &str = "/flywheel/v0/config.json";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct GearConfig {
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default)]
    pub inputs: Inputs,
    pub destination: Option<Hierarchy>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Inputs {
    pub functional: Option<FileInput>,
    pub anatomical: Option<FileInput>,
    pub slice_timing: Option<FileInput>,
    pub api_key: Option<ApiKeyInput>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct FileInput {
    pub hierarchy: Option<Hierarchy>,
    pub location: Option<Location>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Hierarchy {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Location {
    pub path: PathBuf,
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ApiKeyInput {
    pub key: String,
}

impl GearConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GearError::InvalidConfig(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// The option mapping fed to the command assembler.
    pub fn options(&self) -> &Map<String, Value> {
        &self.config
    }

    /// `-b` value for meica.py; defaults to `0`.
    pub fn basetime(&self) -> String {
        match self.config.get("basetime") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "0".to_string(),
        }
    }

    /// Archive outputs even when meica.py fails.
    pub fn save_on_error(&self) -> bool {
        self.config
            .get("save_on_error")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn functional_acquisition_id(&self) -> Result<&str> {
        self.inputs
            .functional
            .as_ref()
            .and_then(|f| f.hierarchy.as_ref())
            .map(|h| h.id.as_str())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GearError::MissingInput("functional".to_string()))
    }

    pub fn api_key(&self) -> Result<&str> {
        self.inputs
            .api_key
            .as_ref()
            .map(|k| k.key.as_str())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| GearError::MissingInput("api_key".to_string()))
    }

    pub fn anatomical_path(&self) -> Option<&Path> {
        location_path(self.inputs.anatomical.as_ref())
    }

    pub fn slice_timing_path(&self) -> Option<&Path> {
        location_path(self.inputs.slice_timing.as_ref())
    }
}

fn location_path(input: Option<&FileInput>) -> Option<&Path> {
    input
        .and_then(|i| i.location.as_ref())
        .map(|l| l.path.as_path())
        .filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "config": { "basetime": "10", "MNI": true, "cpus": 2, "save_on_error": true },
        "inputs": {
            "functional": {
                "base": "file",
                "hierarchy": { "type": "acquisition", "id": "acq123" },
                "location": { "path": "/flywheel/v0/input/functional/e1.nii.gz", "name": "e1.nii.gz" }
            },
            "anatomical": {
                "hierarchy": { "type": "acquisition", "id": "acq999" },
                "location": { "path": "/flywheel/v0/input/anatomical/t1.nii.gz", "name": "t1.nii.gz" }
            },
            "api_key": { "base": "api-key", "key": "example.io:secret" }
        },
        "destination": { "type": "analysis", "id": "ana1" }
    }"#;

    #[test]
    fn test_parse_full_config() {
        let cfg = GearConfig::from_json(SAMPLE).unwrap();
        assert_eq!(cfg.basetime(), "10");
        assert!(cfg.save_on_error());
        assert_eq!(cfg.functional_acquisition_id().unwrap(), "acq123");
        assert_eq!(cfg.api_key().unwrap(), "example.io:secret");
        assert_eq!(
            cfg.anatomical_path(),
            Some(Path::new("/flywheel/v0/input/anatomical/t1.nii.gz"))
        );
        assert_eq!(cfg.slice_timing_path(), None);
        assert_eq!(cfg.destination.unwrap().id, "ana1");
    }

    #[test]
    fn test_defaults() {
        let cfg = GearConfig::from_json(r#"{ "config": {} }"#).unwrap();
        assert_eq!(cfg.basetime(), "0");
        assert!(!cfg.save_on_error());
        assert!(matches!(
            cfg.functional_acquisition_id(),
            Err(GearError::MissingInput(_))
        ));
        assert!(matches!(cfg.api_key(), Err(GearError::MissingInput(_))));
    }

    #[test]
    fn test_numeric_basetime() {
        let cfg = GearConfig::from_json(r#"{ "config": { "basetime": 5 } }"#).unwrap();
        assert_eq!(cfg.basetime(), "5");
    }

    #[test]
    fn test_load_missing_file() {
        let err = GearConfig::load_from_file("/definitely/not/here/config.json").unwrap_err();
        assert!(matches!(err, GearError::InvalidConfig(_)));
    }
}
