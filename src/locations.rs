//! Discovery of email view folders.
//!
//! At startup the working directory is walked for folders named after
//! [`RendererOptions::emails_folder`]. Every folder living under the content
//! root becomes a view location format, which is handed to the view engine
//! ahead of its own defaults.

use std::collections::HashSet;
use std::env;
use std::path::{Component, Path, PathBuf};

use log::{debug, info};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::options::RendererOptions;
use crate::templating::{ExpanderContext, LocationExpander, VIEW_EXTENSION, VIEW_NAME_PLACEHOLDER};

const FINGERPRINT_KEY: &str = "customviewlocation";
const FINGERPRINT: &str = "ViewLocationExpander";

#[derive(Debug, Clone)]
pub struct ViewLocationExpander {
    locations: Vec<String>,
}

impl ViewLocationExpander {
    /// Scans the process working directory.
    pub fn new(options: &RendererOptions) -> Result<Self, ScanError> {
        let root = env::current_dir().map_err(ScanError::CurrentDirError)?;

        Self::scan(&root, options)
    }

    /// Scans `root` for email folders and turns the ones under the content
    /// root into location formats relative to `root`.
    pub fn scan(root: impl AsRef<Path>, options: &RendererOptions) -> Result<Self, ScanError> {
        let root = root.as_ref();
        debug!("Scanning {:?} for {} folders", root, &options.emails_folder);

        let mut locations = Vec::new();

        for folder in EmailFolders::new(root, &options.emails_folder) {
            let folder = folder?;

            if !folder.to_string_lossy().contains(options.content_root.as_str()) {
                debug!("Skipping {:?}, it's outside of the content root", &folder);
                continue;
            }

            let location = location_format(root, &folder);
            debug!("Adding view location {}", &location);
            locations.push(location);
        }

        info!("Found {} email view location(s)", locations.len());

        Ok(ViewLocationExpander { locations })
    }

    pub fn from_locations(locations: Vec<String>) -> Self {
        ViewLocationExpander { locations }
    }

    pub fn locations(&self) -> &[String] {
        &self.locations
    }
}

impl LocationExpander for ViewLocationExpander {
    fn populate_values(&self, context: &mut ExpanderContext) {
        context
            .values
            .insert(FINGERPRINT_KEY.to_string(), FINGERPRINT.to_string());
    }

    fn expand_view_locations(&self, _context: &ExpanderContext, view_locations: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();

        self.locations
            .iter()
            .cloned()
            .chain(view_locations)
            .filter(|location| seen.insert(location.clone()))
            .collect()
    }
}

// Turns `<root>/src/App/Views/Emails` into `src/App/Views/Emails/{0}.mustache`.
fn location_format(root: &Path, folder: &Path) -> String {
    let relative = folder.strip_prefix(root).unwrap_or(folder);

    let mut location = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    location.push('/');
    location.push_str(VIEW_NAME_PLACEHOLDER);
    location.push_str(VIEW_EXTENSION);

    location
}

/// Walks a directory tree yielding every directory named `folder_name`.
pub struct EmailFolders<'n> {
    walkdir: walkdir::IntoIter,
    folder_name: &'n str,
}

impl<'n> EmailFolders<'n> {
    fn new(root: &Path, folder_name: &'n str) -> Self {
        EmailFolders {
            walkdir: WalkDir::new(root)
                .min_depth(1)
                .sort_by(|a, b| a.file_name().cmp(b.file_name()))
                .into_iter(),
            folder_name,
        }
    }

    fn is_match(&self, entry: &DirEntry) -> bool {
        entry.file_type().is_dir() && entry.file_name() == self.folder_name
    }
}

impl<'n> Iterator for EmailFolders<'n> {
    type Item = Result<PathBuf, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(next) = self.walkdir.next() {
            match next {
                Ok(entry) => {
                    if self.is_match(&entry) {
                        return Some(Ok(entry.into_path()));
                    }
                },
                Err(e) => return Some(Err(e.into())),
            }
        }

        None
    }
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("couldn't determine the working directory")]
    CurrentDirError(#[source] std::io::Error),

    #[error("error scanning {} for email view folders", path_of(.0))]
    WalkDirError(#[from] walkdir::Error),
}

fn path_of(e: &walkdir::Error) -> String {
    e.path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}
