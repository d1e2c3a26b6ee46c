pub mod format;
pub mod layout;
pub mod persistence;
pub mod preferences;

pub use format::SlotFormat;
pub use layout::ProfileLayout;
pub use persistence::{SlotStore, atomic_write, read_if_exists, remove_dir_if_exists};
pub use preferences::{PreferenceStore, SharedPreferences};
