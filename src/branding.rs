use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Installer branding: where screenshots and named images live.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Branding {
    pub component_directory: Option<PathBuf>,
    /// Named images, relative to the component directory unless absolute.
    pub images: HashMap<String, PathBuf>,
}

impl Branding {
    /// Finds the file behind a screenshot reference.
    ///
    /// Tried in order: a file under the component directory, a named
    /// branding image, the reference as a plain path.
    pub fn resolve_screenshot(&self, reference: &str) -> Option<PathBuf> {
        if reference.is_empty() {
            return None;
        }

        if let Some(dir) = &self.component_directory {
            let local = dir.join(reference);
            if local.is_file() {
                return Some(local);
            }
        }

        if let Some(image) = self.images.get(reference) {
            let themed = match &self.component_directory {
                Some(dir) if image.is_relative() => dir.join(image),
                _ => image.clone(),
            };
            if themed.is_file() {
                return Some(themed);
            }
        }

        let raw = Path::new(reference);
        raw.is_file().then(|| raw.to_path_buf())
    }
}
