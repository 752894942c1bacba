//! The `templating` module contains the seam between the renderer and the
//! template engine. The renderer only needs to find a view, fall back to an
//! explicit path, and execute the view into a sink; everything else is the
//! engine's business.

mod mustache;
pub use self::mustache::{MustacheView, MustacheViewEngine};

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::context::{ActionContext, ViewContext};

/// File extension of view templates.
pub const VIEW_EXTENSION: &str = ".mustache";

/// Placeholder for the view name in a location format.
pub const VIEW_NAME_PLACEHOLDER: &str = "{0}";

/// Placeholder for the controller name in a location format.
pub const CONTROLLER_PLACEHOLDER: &str = "{1}";

/// The trait for integrating view engines.
pub trait ViewEngine: Send + Sync {
    type View: View;

    /// Looks a view up by name using the engine's location formats, including
    /// anything contributed by location expanders.
    fn find_view(&self, context: &ActionContext, name: &str) -> ViewLookup<Self::View>;

    /// Looks a view up by explicit path. Relative paths are resolved against
    /// `executing_dir`.
    fn get_view(&self, executing_dir: Option<&Path>, view_path: &str) -> ViewLookup<Self::View>;
}

/// A located view that can be executed against a model.
pub trait View: Send + Sync {
    fn path(&self) -> &Path;

    fn render<M: Serialize, W: Write>(&self, context: &ViewContext<'_, M>, out: &mut W) -> Result<(), ViewError>;
}

#[derive(Debug)]
pub enum ViewLookup<V> {
    Found(V),
    NotFound { searched_locations: Vec<String> },
}

impl<V> ViewLookup<V> {
    pub fn is_found(&self) -> bool {
        match self {
            ViewLookup::Found(_) => true,
            ViewLookup::NotFound { .. } => false,
        }
    }

    pub fn searched_locations(&self) -> &[String] {
        match self {
            ViewLookup::Found(_) => &[],
            ViewLookup::NotFound { searched_locations } => searched_locations,
        }
    }
}

/// Contributes to the list of places a view engine searches.
pub trait LocationExpander: Send + Sync {
    /// Records the values that identify this expander's output. The same values
    /// mean the same expanded locations.
    fn populate_values(&self, context: &mut ExpanderContext);

    fn expand_view_locations(&self, context: &ExpanderContext, view_locations: Vec<String>) -> Vec<String>;
}

#[derive(Debug, Clone)]
pub struct ExpanderContext {
    pub view_name: String,
    pub controller_name: Option<String>,
    pub values: BTreeMap<String, String>,
}

impl ExpanderContext {
    pub fn new(view_name: &str, controller_name: Option<&str>) -> Self {
        ExpanderContext {
            view_name: view_name.to_string(),
            controller_name: controller_name.map(str::to_string),
            values: BTreeMap::new(),
        }
    }
}

pub struct ViewEngineOptions {
    pub view_location_formats: Vec<String>,
    pub location_expanders: Vec<Box<dyn LocationExpander>>,
}

impl Default for ViewEngineOptions {
    fn default() -> Self {
        ViewEngineOptions {
            view_location_formats: vec![
                format!("/Views/{}/{}{}", CONTROLLER_PLACEHOLDER, VIEW_NAME_PLACEHOLDER, VIEW_EXTENSION),
                format!("/Views/Shared/{}{}", VIEW_NAME_PLACEHOLDER, VIEW_EXTENSION),
            ],
            location_expanders: Vec::new(),
        }
    }
}

impl ViewEngineOptions {
    pub fn add_expander(&mut self, expander: impl LocationExpander + 'static) {
        self.location_expanders.push(Box::new(expander));
    }
}

/// Any error that could happen while executing a view.
#[derive(Error, Debug)]
pub enum ViewError {
    #[error("error rendering view {0}")]
    TemplateError(PathBuf, #[source] ::mustache::Error),
}
