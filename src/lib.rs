//! Render email views to strings.
//!
//! Views live in `Emails` folders anywhere under the application's content
//! root. They're discovered once at startup and then rendered by name:
//!
//! ```no_run
//! use mailview::{add_view_to_string_renderer, HostingEnvironment};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Welcome { name: String }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let hosting = HostingEnvironment::from_current_dir()?;
//! let root = hosting.content_root_path().to_string_lossy().into_owned();
//! let renderer = add_view_to_string_renderer(hosting, |o| o.content_root = root)?;
//!
//! let body = renderer.render_view_to_string("welcome", &Welcome { name: "Ada".into() })?;
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod hosting;
pub mod locations;
pub mod options;
pub mod renderer;
pub mod setup;
pub mod tempdata;
pub mod templating;

pub use hosting::HostingEnvironment;
pub use locations::ViewLocationExpander;
pub use options::RendererOptions;
pub use renderer::{RenderError, RenderViewToString, ViewToStringRenderer};
pub use setup::{add_view_to_string_renderer, RendererSetup, SetupError};
