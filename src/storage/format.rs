use crate::core::{PersistError, Result};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use std::path::Path;

/// On-disk encoding for slot files and instance descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SlotFormat {
    #[default]
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "msgpack")]
    MessagePack,
}

impl SlotFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SlotFormat::Json => "json",
            SlotFormat::MessagePack => "msgpack",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(SlotFormat::Json),
            "msgpack" | "mpk" => Some(SlotFormat::MessagePack),
            _ => None,
        }
    }

    pub fn encode<T: Serialize>(&self, value: &T, path: &Path) -> Result<Vec<u8>> {
        let encoded = match self {
            SlotFormat::Json => serde_json::to_vec_pretty(value).map_err(|e| e.to_string()),
            // Named fields keep `#[serde(default)]` and camelCase renames working.
            SlotFormat::MessagePack => rmp_serde::to_vec_named(value).map_err(|e| e.to_string()),
        };
        encoded.map_err(|reason| PersistError::PartialWriteRisk {
            path: path.to_path_buf(),
            reason: format!("serialize: {}", reason),
        })
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8], path: &Path) -> Result<T> {
        let decoded = match self {
            SlotFormat::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            SlotFormat::MessagePack => rmp_serde::from_slice(bytes).map_err(|e| e.to_string()),
        };
        decoded.map_err(|reason| PersistError::Deserialization {
            path: path.to_path_buf(),
            reason,
        })
    }
}

impl fmt::Display for SlotFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
