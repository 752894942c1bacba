use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use mustache::Data;
use serde::Serialize;

use super::{
    ExpanderContext, View, ViewEngine, ViewEngineOptions, ViewError, ViewLookup,
    CONTROLLER_PLACEHOLDER, VIEW_EXTENSION, VIEW_NAME_PLACEHOLDER,
};
use crate::context::{ActionContext, ViewContext};

const VIEW_DATA_KEY: &str = "view_data";
const TEMP_DATA_KEY: &str = "temp_data";

/// A file-backed view engine on top of mustache templates.
///
/// Views are looked up below `root`. Templates are compiled on every render;
/// nothing is cached between calls.
pub struct MustacheViewEngine {
    root: PathBuf,
    options: ViewEngineOptions,
}

impl MustacheViewEngine {
    pub fn new(root: impl Into<PathBuf>, options: ViewEngineOptions) -> Self {
        MustacheViewEngine {
            root: root.into(),
            options,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The location formats searched for `name`, expanders applied.
    pub fn view_locations(&self, context: &ActionContext, name: &str) -> Vec<String> {
        let mut expander_context = ExpanderContext::new(name, context.route_data.controller());

        for expander in self.options.location_expanders.iter() {
            expander.populate_values(&mut expander_context);
        }
        trace!("View location values for {}: {:?}", name, &expander_context.values);

        self.options
            .location_expanders
            .iter()
            .fold(self.options.view_location_formats.clone(), |locations, expander| {
                expander.expand_view_locations(&expander_context, locations)
            })
    }

    fn resolve(&self, location: &str) -> PathBuf {
        let relative = location
            .trim_start_matches("~/")
            .trim_start_matches('/');

        self.root.join(relative)
    }

    fn lookup(&self, locations: Vec<String>) -> ViewLookup<MustacheView> {
        for location in locations.iter() {
            let path = self.resolve(location);

            if path.is_file() {
                debug!("Found view at {:?}", &path);
                return ViewLookup::Found(MustacheView::new(path));
            }
            trace!("No view at {:?}", &path);
        }

        ViewLookup::NotFound {
            searched_locations: locations,
        }
    }
}

fn is_app_relative(path: &str) -> bool {
    path.starts_with('/') || path.starts_with("~/")
}

fn is_view_path(name: &str) -> bool {
    name.ends_with(VIEW_EXTENSION) || is_app_relative(name)
}

impl ViewEngine for MustacheViewEngine {
    type View = MustacheView;

    fn find_view(&self, context: &ActionContext, name: &str) -> ViewLookup<MustacheView> {
        if is_view_path(name) {
            return self.get_view(None, name);
        }

        let controller = context.route_data.controller();

        let locations = self
            .view_locations(context, name)
            .into_iter()
            .filter_map(|format| match controller {
                Some(controller) => Some(format.replace(CONTROLLER_PLACEHOLDER, controller)),
                None if format.contains(CONTROLLER_PLACEHOLDER) => None,
                None => Some(format),
            })
            .map(|format| format.replace(VIEW_NAME_PLACEHOLDER, name))
            .collect();

        self.lookup(locations)
    }

    fn get_view(&self, executing_dir: Option<&Path>, view_path: &str) -> ViewLookup<MustacheView> {
        let dir = match executing_dir {
            Some(dir) if !is_app_relative(view_path) => dir,
            _ => return self.lookup(vec![view_path.to_string()]),
        };

        // `dir` may be absolute, in which case `root` is ignored by `join`.
        let path = self.root.join(dir).join(view_path);

        if path.is_file() {
            debug!("Found view at {:?}", &path);
            return ViewLookup::Found(MustacheView::new(path));
        }

        ViewLookup::NotFound {
            searched_locations: vec![dir.join(view_path).to_string_lossy().into_owned()],
        }
    }
}

pub struct MustacheView {
    path: PathBuf,
}

impl MustacheView {
    fn new(path: PathBuf) -> Self {
        MustacheView { path }
    }
}

fn string_map(values: &HashMap<String, String>) -> Data {
    Data::Map(
        values
            .iter()
            .map(|(k, v)| (k.clone(), Data::String(v.clone())))
            .collect(),
    )
}

/// Encodes what a template gets to see. The model is the root of the data.
/// Map-shaped models also get `view_data` and `temp_data` entries, unless the
/// model already has fields with those names.
fn scope<M: Serialize>(context: &ViewContext<'_, M>) -> Result<Data, mustache::Error> {
    let mut data = mustache::to_data(context.model())?;

    if let Data::Map(ref mut fields) = data {
        fields
            .entry(VIEW_DATA_KEY.to_string())
            .or_insert_with(|| string_map(context.view_data.entries()));
        fields
            .entry(TEMP_DATA_KEY.to_string())
            .or_insert_with(|| string_map(context.temp_data.values()));
    }

    Ok(data)
}

impl View for MustacheView {
    fn path(&self) -> &Path {
        &self.path
    }

    fn render<M: Serialize, W: Write>(&self, context: &ViewContext<'_, M>, out: &mut W) -> Result<(), ViewError> {
        debug!("Rendering view {:?}", &self.path);

        let template = mustache::compile_path(&self.path)
            .map_err(|e| ViewError::TemplateError(self.path.clone(), e))?;

        let data = scope(context)
            .map_err(|e| ViewError::TemplateError(self.path.clone(), e))?;

        template
            .render_data(out, &data)
            .map_err(|e| ViewError::TemplateError(self.path.clone(), e))
    }
}
