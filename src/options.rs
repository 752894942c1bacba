use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_EMAILS_FOLDER: &str = "Emails";

/// Options shared by the view location expander and the renderer.
///
/// They're populated once at startup, either through a setup callback or from
/// a YAML file, and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererOptions {
    /// The content root path. Only `Emails` folders whose absolute path
    /// contains this string are picked up.
    #[serde(default)]
    pub content_root: String,

    /// Name of the folders that hold email views.
    #[serde(default = "default_emails_folder")]
    #[serde(alias = "emails-folder")]
    pub emails_folder: String,
}

fn default_emails_folder() -> String {
    DEFAULT_EMAILS_FOLDER.to_string()
}

impl Default for RendererOptions {
    fn default() -> Self {
        RendererOptions {
            content_root: String::new(),
            emails_folder: default_emails_folder(),
        }
    }
}

impl RendererOptions {
    pub fn new(content_root: impl Into<String>) -> Self {
        RendererOptions {
            content_root: content_root.into(),
            ..Default::default()
        }
    }

    /// Loads options from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let path = path.as_ref();

        let raw = fs::read_to_string(path)
            .map_err(|e| OptionsError::ReadError(path.to_path_buf(), e))?;

        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, OptionsError> {
        Ok(serde_yaml::from_str(raw)?)
    }
}

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("error reading options file {0}")]
    ReadError(PathBuf, #[source] std::io::Error),

    #[error("error parsing options")]
    ParseError(#[from] serde_yaml::Error),
}
