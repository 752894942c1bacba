use std::env;
use std::io;
use std::path::{Path, PathBuf};

/// Describes where the hosting application lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostingEnvironment {
    content_root_path: PathBuf,
}

impl HostingEnvironment {
    pub fn new(content_root_path: impl Into<PathBuf>) -> Self {
        HostingEnvironment {
            content_root_path: content_root_path.into(),
        }
    }

    /// Uses the process working directory as the content root.
    pub fn from_current_dir() -> io::Result<Self> {
        Ok(Self::new(env::current_dir()?))
    }

    pub fn content_root_path(&self) -> &Path {
        &self.content_root_path
    }
}
