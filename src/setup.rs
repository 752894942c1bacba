//! Wiring everything together at startup.

use std::path::PathBuf;

use log::debug;
use thiserror::Error;

use crate::hosting::HostingEnvironment;
use crate::locations::{ScanError, ViewLocationExpander};
use crate::options::RendererOptions;
use crate::renderer::ViewToStringRenderer;
use crate::tempdata::{EmptyTempDataProvider, TempDataProvider};
use crate::templating::{MustacheViewEngine, ViewEngineOptions};

/// Configures the options with `configure`, registers the email folder
/// locations with a mustache view engine and returns a renderer using it.
pub fn add_view_to_string_renderer<F>(
    hosting: HostingEnvironment,
    configure: F,
) -> Result<ViewToStringRenderer<MustacheViewEngine>, SetupError>
where
    F: FnOnce(&mut RendererOptions),
{
    RendererSetup::new(hosting).configure(configure)
}

pub struct RendererSetup {
    hosting: HostingEnvironment,
    scan_root: Option<PathBuf>,
    engine_options: ViewEngineOptions,
    temp_data_provider: Box<dyn TempDataProvider>,
}

impl RendererSetup {
    pub fn new(hosting: HostingEnvironment) -> Self {
        RendererSetup {
            hosting,
            scan_root: None,
            engine_options: ViewEngineOptions::default(),
            temp_data_provider: Box::new(EmptyTempDataProvider),
        }
    }

    /// Scan `root` for email folders instead of the working directory.
    pub fn scan_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scan_root = Some(root.into());
        self
    }

    pub fn temp_data_provider(mut self, provider: impl TempDataProvider + 'static) -> Self {
        self.temp_data_provider = Box::new(provider);
        self
    }

    /// Adds a location format searched after the built-in ones.
    pub fn view_location_format(mut self, format: impl Into<String>) -> Self {
        self.engine_options.view_location_formats.push(format.into());
        self
    }

    pub fn configure<F>(self, configure: F) -> Result<ViewToStringRenderer<MustacheViewEngine>, SetupError>
    where
        F: FnOnce(&mut RendererOptions),
    {
        let mut options = RendererOptions::default();
        configure(&mut options);

        if options.content_root.is_empty() {
            return Err(SetupError::MissingContentRoot);
        }

        let expander = match &self.scan_root {
            Some(root) => ViewLocationExpander::scan(root, &options)?,
            None => ViewLocationExpander::new(&options)?,
        };
        debug!("Registering view locations {:?}", expander.locations());

        let mut engine_options = self.engine_options;
        engine_options.add_expander(expander);

        let engine = MustacheViewEngine::new(self.hosting.content_root_path(), engine_options);

        Ok(ViewToStringRenderer::new(
            self.hosting,
            engine,
            self.temp_data_provider,
            options,
        ))
    }
}

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("the content root must be configured")]
    MissingContentRoot,

    #[error("error discovering email view locations")]
    ScanError(#[from] ScanError),
}
