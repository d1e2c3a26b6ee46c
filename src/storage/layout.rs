use super::SlotFormat;
use crate::core::SlotNumber;
use std::path::{Path, PathBuf};

const SLOTS_DIR: &str = "slots";
const BACKUPS_DIR: &str = "backups";
const INSTANCE_CONFIG_STEM: &str = "instance_config";
const SLOT_FILE_PREFIX: &str = "slot_";

/// Paths inside one profile root.
///
/// ```text
/// <root>/instance_config.<ext>
/// <root>/slots/slot_<n>.<ext>
/// <root>/backups/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLayout {
    root: PathBuf,
    format: SlotFormat,
}

impl ProfileLayout {
    pub fn new(root: impl Into<PathBuf>, format: SlotFormat) -> Self {
        Self {
            root: root.into(),
            format,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> SlotFormat {
        self.format
    }

    pub fn slots_dir(&self) -> PathBuf {
        self.root.join(SLOTS_DIR)
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join(BACKUPS_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.root
            .join(format!("{}.{}", INSTANCE_CONFIG_STEM, self.format.extension()))
    }

    pub fn slot_path(&self, slot: SlotNumber) -> PathBuf {
        self.slots_dir().join(format!(
            "{}{}.{}",
            SLOT_FILE_PREFIX,
            slot,
            self.format.extension()
        ))
    }

    /// Slot number encoded in a file name such as `slot_3.json`, if it uses this layout's format.
    pub fn parse_slot_file_name(&self, file_name: &str) -> Option<SlotNumber> {
        let stem = file_name.strip_suffix(&format!(".{}", self.format.extension()))?;
        stem.strip_prefix(SLOT_FILE_PREFIX)?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_paths() {
        let layout = ProfileLayout::new("/saves/instances/001_ada", SlotFormat::Json);
        assert_eq!(
            layout.slot_path(0),
            PathBuf::from("/saves/instances/001_ada/slots/slot_0.json")
        );
        assert_eq!(
            layout.config_path(),
            PathBuf::from("/saves/instances/001_ada/instance_config.json")
        );
    }

    #[test]
    fn test_parse_slot_file_name_respects_format() {
        let layout = ProfileLayout::new("/r", SlotFormat::MessagePack);
        assert_eq!(layout.parse_slot_file_name("slot_12.msgpack"), Some(12));
        assert_eq!(layout.parse_slot_file_name("slot_12.json"), None);
        assert_eq!(layout.parse_slot_file_name("slot_x.msgpack"), None);
        assert_eq!(layout.parse_slot_file_name("slot_3.msgpack.tmp"), None);
    }
}
