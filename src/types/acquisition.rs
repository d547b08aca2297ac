use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Acquisition metadata as returned by `GET /api/acquisitions/{id}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Acquisition {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub parents: Parents,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Parents {
    pub session: Option<String>,
    pub subject: Option<String>,
}

/// One file attached to an acquisition.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: Option<String>,
    #[serde(default)]
    pub classification: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub info: serde_json::Map<String, Value>,
}

impl FileEntry {
    pub fn is_nifti(&self) -> bool {
        self.file_type.as_deref() == Some("nifti")
    }

    pub fn is_functional(&self) -> bool {
        self.classification
            .get("Intent")
            .is_some_and(|intents| intents.iter().any(|i| i == "Functional"))
    }

    /// `EchoTime` from the file's info block, in seconds.
    pub fn echo_time(&self) -> Option<f64> {
        self.info.get("EchoTime").and_then(Value::as_f64)
    }
}

/// Session metadata; only the subject code is used.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Session {
    #[serde(default)]
    pub subject: Subject,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Subject {
    #[serde(default)]
    pub code: String,
}
