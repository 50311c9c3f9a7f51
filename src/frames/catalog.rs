//! Frame type catalog
//!
//! Maps frame-type keys to file names under the frame root directory.
//! Built once at startup and never modified afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::error::FrameError;
use crate::config::FramesConfig;

/// Built-in frame types, each served from `all_<type>_frames.json`
pub const DEFAULT_FRAME_TYPES: &[&str] = &[
    "weapon",
    "armor",
    "zone",
    "weapon_category",
    "attribute",
    "battle_text_struct",
];

/// Immutable frame type -> file name table rooted at a directory
#[derive(Debug, Clone)]
pub struct FrameCatalog {
    root: PathBuf,
    files: BTreeMap<String, String>,
}

impl FrameCatalog {
    /// Build the catalog from the built-in table plus configured overrides
    pub fn from_config(config: &FramesConfig) -> Result<Self, FrameError> {
        let mut files: BTreeMap<String, String> = DEFAULT_FRAME_TYPES
            .iter()
            .map(|name| ((*name).to_string(), default_file_name(name)))
            .collect();

        for (name, file) in &config.files {
            files.insert(name.clone(), file.clone());
        }

        for (name, file) in &files {
            if !is_plain_file_name(file) {
                return Err(FrameError::InvalidFileName {
                    name: name.clone(),
                    file: file.clone(),
                });
            }
        }

        Ok(Self {
            root: PathBuf::from(&config.root_dir),
            files,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configured frame types in sorted order
    pub fn known_types(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    /// Resolve a frame type to the full path of its file
    pub fn resolve(&self, frame_type: &str) -> Result<PathBuf, FrameError> {
        self.files.get(frame_type).map_or_else(
            || {
                Err(FrameError::UnknownFrameType {
                    name: frame_type.to_string(),
                    known: self.known_types().join(", "),
                })
            },
            |file| Ok(self.root.join(file)),
        )
    }
}

fn default_file_name(frame_type: &str) -> String {
    format!("all_{frame_type}_frames.json")
}

/// A file name must stay inside the root: one normal path component
fn is_plain_file_name(file: &str) -> bool {
    let mut components = Path::new(file).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    ) && !file.contains(['/', '\\'])
}
