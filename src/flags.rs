//! Flag files read by the provisioning scripts after the GUI exits.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct FlagFiles {
    pub display_manager: PathBuf,
    pub desktop: PathBuf,
    pub username: PathBuf,
}

impl Default for FlagFiles {
    fn default() -> Self {
        Self {
            display_manager: PathBuf::from("/tmp/calamares-dm"),
            desktop: PathBuf::from("/tmp/calamares-de"),
            username: PathBuf::from("/tmp/calamares-user"),
        }
    }
}

impl FlagFiles {
    /// Best effort: a file that cannot be written is logged and skipped.
    pub fn write_selection(&self, desktop: &str, display_manager: &str, username: Option<&str>) {
        write_flag(&self.display_manager, display_manager, "display manager selection");
        write_flag(&self.desktop, desktop, "desktop selection");

        if let Some(username) = username.filter(|u| !u.is_empty()) {
            write_flag(&self.username, username, "username");
        }
    }
}

fn write_flag(path: &Path, contents: &str, what: &str) {
    if let Err(err) = fs::write(path, contents) {
        tracing::warn!(path = %path.display(), "could not write {what}: {err}");
    }
}
