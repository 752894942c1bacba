use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::string::FromUtf8Error;

use log::debug;
use serde::Serialize;
use thiserror::Error;

use crate::context::{ActionContext, TempData, ViewContext, ViewData};
use crate::hosting::HostingEnvironment;
use crate::options::RendererOptions;
use crate::tempdata::TempDataProvider;
use crate::templating::{View, ViewEngine, ViewLookup, VIEW_EXTENSION};

/// Renders a named view with a model into a string.
///
/// Callers that send emails should depend on this rather than on a concrete
/// renderer, so they can be handed a fake in tests.
pub trait RenderViewToString {
    fn render_view_to_string<M: Serialize>(&self, name: &str, model: &M) -> Result<String, RenderError>;
}

/// Renders views to strings, mostly for email bodies.
///
/// Views are looked up through the engine's regular search first. When that
/// fails, `Views/<emails folder>/<name>.mustache` next to the running
/// executable is tried, which covers deployments where the views ship
/// alongside the binary rather than inside the application tree.
pub struct ViewToStringRenderer<E> {
    hosting: HostingEnvironment,
    engine: E,
    temp_data_provider: Box<dyn TempDataProvider>,
    options: RendererOptions,
    executing_dir: PathBuf,
}

impl<E: ViewEngine> ViewToStringRenderer<E> {
    pub fn new(
        hosting: HostingEnvironment,
        engine: E,
        temp_data_provider: Box<dyn TempDataProvider>,
        options: RendererOptions,
    ) -> Self {
        let executing_dir = executing_dir(env::current_exe(), hosting.content_root_path());

        ViewToStringRenderer {
            hosting,
            engine,
            temp_data_provider,
            options,
            executing_dir,
        }
    }

    /// Overrides the directory the fallback lookup starts from.
    pub fn with_executing_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.executing_dir = dir.into();
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    /// Renders the view called `name` with `model`.
    pub fn render_view_to_string<M: Serialize>(&self, name: &str, model: &M) -> Result<String, RenderError> {
        let action_context = ActionContext::empty();

        let view = self.find_view(&action_context, name)?;

        let temp_data = TempData::load(&action_context.request, self.temp_data_provider.as_ref());
        let context = ViewContext::new(&action_context, ViewData::new(model), temp_data);

        let mut output = Vec::new();
        view.render(&context, &mut output)?;

        Ok(String::from_utf8(output)?)
    }

    fn find_view(&self, action_context: &ActionContext, name: &str) -> Result<E::View, RenderError> {
        let mut searched_locations = match self.engine.find_view(action_context, name) {
            ViewLookup::Found(view) => return Ok(view),
            ViewLookup::NotFound { searched_locations } => searched_locations,
        };

        let executing_dir = self.relative_executing_dir();
        let fallback = format!("Views/{}/{}{}", &self.options.emails_folder, name, VIEW_EXTENSION);
        debug!("View {} not found, trying {} under {:?}", name, &fallback, &executing_dir);

        match self.engine.get_view(Some(&executing_dir), &fallback) {
            ViewLookup::Found(view) => Ok(view),
            ViewLookup::NotFound { searched_locations: fallback_locations } => {
                searched_locations.extend(fallback_locations);

                Err(RenderError::ViewNotFound {
                    name: name.to_string(),
                    searched_locations,
                })
            },
        }
    }

    /// The executable's directory relative to the content root.
    pub fn relative_executing_dir(&self) -> PathBuf {
        pathdiff::diff_paths(&self.executing_dir, self.hosting.content_root_path())
            .unwrap_or_else(|| self.executing_dir.clone())
    }
}

impl<E: ViewEngine> RenderViewToString for ViewToStringRenderer<E> {
    fn render_view_to_string<M: Serialize>(&self, name: &str, model: &M) -> Result<String, RenderError> {
        ViewToStringRenderer::render_view_to_string(self, name, model)
    }
}

// The running executable's directory, or the content root when it can't be
// determined.
fn executing_dir(current_exe: io::Result<PathBuf>, content_root: &Path) -> PathBuf {
    let dir = match current_exe {
        Ok(exe) => exe.parent().map(Path::to_path_buf),
        Err(e) => {
            debug!("Couldn't locate the running executable: {}", e);
            None
        },
    };

    dir.unwrap_or_else(|| {
        debug!("Fallback views will be looked up from the content root {:?}", content_root);
        content_root.to_path_buf()
    })
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("couldn't find view '{name}'")]
    ViewNotFound {
        name: String,
        searched_locations: Vec<String>,
    },

    #[error(transparent)]
    ViewError(#[from] crate::templating::ViewError),

    #[error("rendered output isn't valid utf-8")]
    Utf8Error(#[from] FromUtf8Error),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use serde::Serialize;
    use tempdir::TempDir;

    use super::*;
    use crate::tempdata::{EmptyTempDataProvider, StaticTempDataProvider};
    use crate::templating::{MustacheViewEngine, ViewEngineOptions, ViewError};

    #[derive(Serialize)]
    struct Counter {
        x: u32,
    }

    #[derive(Serialize)]
    struct Welcome<'a> {
        name: &'a str,
    }

    /// Knows a fixed set of views and renders `<p>{x}</p>` for each of them.
    struct FakeEngine {
        standard: Vec<&'static str>,
        fallback: Vec<PathBuf>,
        get_view_calls: AtomicUsize,
    }

    impl FakeEngine {
        fn new(standard: Vec<&'static str>, fallback: Vec<PathBuf>) -> Self {
            FakeEngine {
                standard,
                fallback,
                get_view_calls: AtomicUsize::new(0),
            }
        }
    }

    struct FakeView {
        path: PathBuf,
        fail: bool,
    }

    impl ViewEngine for FakeEngine {
        type View = FakeView;

        fn find_view(&self, _context: &ActionContext, name: &str) -> ViewLookup<FakeView> {
            if self.standard.iter().any(|s| *s == name) {
                return ViewLookup::Found(FakeView { path: PathBuf::from(name), fail: name == "broken" });
            }

            ViewLookup::NotFound {
                searched_locations: vec![format!("/Views/Shared/{}.mustache", name)],
            }
        }

        fn get_view(&self, executing_dir: Option<&Path>, view_path: &str) -> ViewLookup<FakeView> {
            self.get_view_calls.fetch_add(1, Ordering::SeqCst);

            let path = executing_dir.map(|d| d.join(view_path)).unwrap_or_else(|| PathBuf::from(view_path));

            if self.fallback.contains(&path) {
                return ViewLookup::Found(FakeView { path, fail: false });
            }

            ViewLookup::NotFound {
                searched_locations: vec![path.to_string_lossy().into_owned()],
            }
        }
    }

    impl View for FakeView {
        fn path(&self) -> &Path {
            &self.path
        }

        fn render<M: Serialize, W: Write>(&self, context: &ViewContext<'_, M>, out: &mut W) -> Result<(), ViewError> {
            write!(out, "<p>").unwrap();

            if self.fail {
                let e = mustache::compile_str("{{# unclosed }}").err().unwrap();
                return Err(ViewError::TemplateError(self.path.clone(), e));
            }

            let model = serde_yaml::to_value(context.model()).unwrap();
            let x = model.get("x").and_then(|x| x.as_u64()).unwrap();
            let suffix = context.temp_data.get("suffix").unwrap_or("");
            write!(out, "{}{}</p>", x, suffix).unwrap();

            Ok(())
        }
    }

    fn renderer(engine: FakeEngine) -> ViewToStringRenderer<FakeEngine> {
        ViewToStringRenderer::new(
            HostingEnvironment::new("/srv/app"),
            engine,
            Box::new(EmptyTempDataProvider),
            RendererOptions::new("/srv/app"),
        )
        .with_executing_dir("/srv/app/bin/Release")
    }

    #[test]
    fn render_through_the_standard_search() {
        let renderer = renderer(FakeEngine::new(vec!["counter"], Vec::new()));

        let output = renderer.render_view_to_string("counter", &Counter { x: 5 }).unwrap();

        assert_eq!(output, "<p>5</p>");
        assert_eq!(renderer.engine().get_view_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn render_through_the_fallback_path() {
        let fallback = PathBuf::from("bin/Release/Views/Emails/counter.mustache");
        let renderer = renderer(FakeEngine::new(Vec::new(), vec![fallback]));

        let output = renderer.render_view_to_string("counter", &Counter { x: 7 }).unwrap();

        assert_eq!(output, "<p>7</p>");
        assert_eq!(renderer.engine().get_view_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fallback_uses_the_configured_folder() {
        let fallback = PathBuf::from("bin/Release/Views/Mail/counter.mustache");
        let mut options = RendererOptions::new("/srv/app");
        options.emails_folder = "Mail".to_string();
        let renderer = ViewToStringRenderer::new(
            HostingEnvironment::new("/srv/app"),
            FakeEngine::new(Vec::new(), vec![fallback]),
            Box::new(EmptyTempDataProvider),
            options,
        )
        .with_executing_dir("/srv/app/bin/Release");

        let output = renderer.render_view_to_string("counter", &Counter { x: 1 }).unwrap();

        assert_eq!(output, "<p>1</p>");
    }

    #[test]
    fn missing_view_fails_with_its_name() {
        let renderer = renderer(FakeEngine::new(Vec::new(), Vec::new()));

        match renderer.render_view_to_string("nowhere", &Counter { x: 5 }) {
            Err(RenderError::ViewNotFound { name, searched_locations }) => {
                assert_eq!(name, "nowhere");
                assert_eq!(
                    searched_locations,
                    vec![
                        "/Views/Shared/nowhere.mustache".to_string(),
                        "bin/Release/Views/Emails/nowhere.mustache".to_string(),
                    ],
                );
            },
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn not_found_error_message_names_the_view() {
        let renderer = renderer(FakeEngine::new(Vec::new(), Vec::new()));

        let err = renderer.render_view_to_string("receipt", &Counter { x: 5 }).unwrap_err();

        assert_eq!(err.to_string(), "couldn't find view 'receipt'");
    }

    #[test]
    fn view_errors_propagate_without_partial_output() {
        let renderer = renderer(FakeEngine::new(vec!["broken"], Vec::new()));

        match renderer.render_view_to_string("broken", &Counter { x: 5 }) {
            Err(RenderError::ViewError(ViewError::TemplateError(path, _))) => assert_eq!(path, PathBuf::from("broken")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn repeated_renders_are_identical() {
        let renderer = renderer(FakeEngine::new(vec!["counter"], Vec::new()));

        let first = renderer.render_view_to_string("counter", &Counter { x: 3 }).unwrap();
        let second = renderer.render_view_to_string("counter", &Counter { x: 3 }).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn concurrent_renders_get_their_own_model() {
        let renderer = renderer(FakeEngine::new(vec!["counter"], Vec::new()));
        let renderer = &renderer;

        let outputs: Vec<String> = thread::scope(|s| {
            let handles: Vec<_> = (0..8u32)
                .map(|x| s.spawn(move || renderer.render_view_to_string("counter", &Counter { x }).unwrap()))
                .collect();

            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        for (x, output) in outputs.into_iter().enumerate() {
            assert_eq!(output, format!("<p>{}</p>", x));
        }
    }

    #[test]
    fn temp_data_comes_from_the_provider() {
        let values: HashMap<_, _> = vec![("suffix", "!")].into_iter().collect();
        let renderer = ViewToStringRenderer::new(
            HostingEnvironment::new("/srv/app"),
            FakeEngine::new(vec!["counter"], Vec::new()),
            Box::new(StaticTempDataProvider::from(values)),
            RendererOptions::new("/srv/app"),
        );

        let output = renderer.render_view_to_string("counter", &Counter { x: 2 }).unwrap();

        assert_eq!(output, "<p>2!</p>");
    }

    #[test]
    fn executing_dir_is_relative_to_the_content_root() {
        let renderer = renderer(FakeEngine::new(Vec::new(), Vec::new()));

        assert_eq!(renderer.relative_executing_dir(), PathBuf::from("bin/Release"));
    }

    #[test]
    fn render_with_the_mustache_engine() {
        let engine = MustacheViewEngine::new("test_assets/example_app", ViewEngineOptions::default());
        let renderer = ViewToStringRenderer::new(
            HostingEnvironment::new("test_assets/example_app"),
            engine,
            Box::new(EmptyTempDataProvider),
            RendererOptions::new("example_app"),
        );

        let output = renderer.render_view_to_string("footer", &Welcome { name: "Ada" }).unwrap();

        assert_eq!(output.trim(), "Sent to Ada by mailview");
    }

    #[test]
    fn render_from_a_fallback_dir_with_the_mustache_engine() {
        let root = TempDir::new("mailview-app").unwrap();
        let views = root.path().join("bin/Release/Views/Emails");
        fs::create_dir_all(&views).unwrap();
        fs::write(views.join("receipt.mustache"), "Thanks, {{ name }}.").unwrap();

        let engine = MustacheViewEngine::new(root.path(), ViewEngineOptions::default());
        let renderer = ViewToStringRenderer::new(
            HostingEnvironment::new(root.path()),
            engine,
            Box::new(EmptyTempDataProvider),
            RendererOptions::new(root.path().to_string_lossy()),
        )
        .with_executing_dir(root.path().join("bin/Release"));

        let output = renderer.render_view_to_string("receipt", &Welcome { name: "Grace" }).unwrap();

        assert_eq!(output, "Thanks, Grace.");
    }

    fn mustache_renderer(root: &TempDir, view: &str, template: &str) -> ViewToStringRenderer<MustacheViewEngine> {
        let views = root.path().join("Views/Shared");
        fs::create_dir_all(&views).unwrap();
        fs::write(views.join(format!("{}.mustache", view)), template).unwrap();

        ViewToStringRenderer::new(
            HostingEnvironment::new(root.path()),
            MustacheViewEngine::new(root.path(), ViewEngineOptions::default()),
            Box::new(EmptyTempDataProvider),
            RendererOptions::new(root.path().to_string_lossy()),
        )
    }

    #[test]
    fn render_a_sequence_model() {
        let root = TempDir::new("mailview-app").unwrap();
        let renderer = mustache_renderer(&root, "list", "{{# . }}[{{ . }}]{{/ . }}");

        let output = renderer.render_view_to_string("list", &vec!["a", "b"]).unwrap();

        assert_eq!(output, "[a][b]");
    }

    #[test]
    fn render_scalar_models() {
        let root = TempDir::new("mailview-app").unwrap();
        let renderer = mustache_renderer(&root, "value", "<p>{{ . }}</p>");

        assert_eq!(renderer.render_view_to_string("value", &5u32).unwrap(), "<p>5</p>");
        assert_eq!(renderer.render_view_to_string("value", &"hi").unwrap(), "<p>hi</p>");
    }

    #[test]
    fn model_fields_named_like_temp_data_are_kept() {
        #[derive(Serialize)]
        struct Note<'a> {
            temp_data: &'a str,
        }

        let root = TempDir::new("mailview-app").unwrap();
        let renderer = mustache_renderer(&root, "note", "[{{ temp_data }}]");

        let output = renderer.render_view_to_string("note", &Note { temp_data: "mine" }).unwrap();

        assert_eq!(output, "[mine]");
    }

    struct RecordingRenderer;

    impl RenderViewToString for RecordingRenderer {
        fn render_view_to_string<M: Serialize>(&self, name: &str, model: &M) -> Result<String, RenderError> {
            let model = serde_yaml::to_string(model).unwrap();
            Ok(format!("{}: {}", name, model.trim_start_matches("---").trim()))
        }
    }

    fn welcome_email<R: RenderViewToString>(renderer: &R) -> Result<String, RenderError> {
        renderer.render_view_to_string("welcome", &Counter { x: 9 })
    }

    #[test]
    fn callers_can_depend_on_the_trait() {
        assert_eq!(welcome_email(&RecordingRenderer).unwrap(), "welcome: x: 9");

        let renderer = renderer(FakeEngine::new(vec!["welcome"], Vec::new()));
        assert_eq!(welcome_email(&renderer).unwrap(), "<p>9</p>");
    }

    #[test]
    fn executing_dir_is_the_executables_parent() {
        let dir = executing_dir(Ok(PathBuf::from("/srv/app/bin/mailview")), Path::new("/srv/app"));

        assert_eq!(dir, PathBuf::from("/srv/app/bin"));
    }

    #[test]
    fn executing_dir_falls_back_to_the_content_root() {
        let missing = io::Error::new(io::ErrorKind::NotFound, "no executable");

        let dir = executing_dir(Err(missing), Path::new("/srv/app"));

        assert_eq!(dir, PathBuf::from("/srv/app"));
    }
}
