//! The context objects a view is executed with.
//!
//! Rendering to a string happens outside of any real request, so these are
//! minimal stand-ins: an empty request, empty route data, the model wrapped
//! in [`ViewData`] and whatever [`TempData`] the provider hands out.

use std::collections::HashMap;

use crate::tempdata::TempDataProvider;

/// Stand-in for an inbound request. It only carries an items bag.
#[derive(Debug, Default, Clone)]
pub struct RequestContext {
    pub items: HashMap<String, String>,
}

#[derive(Debug, Default, Clone)]
pub struct RouteData {
    values: HashMap<String, String>,
}

impl RouteData {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn controller(&self) -> Option<&str> {
        self.get("controller")
    }
}

#[derive(Debug, Default, Clone)]
pub struct ActionContext {
    pub request: RequestContext,
    pub route_data: RouteData,
}

impl ActionContext {
    /// An action context with an empty request and no route values.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// The model plus any extra view data entries.
#[derive(Debug)]
pub struct ViewData<'m, M> {
    model: &'m M,
    entries: HashMap<String, String>,
}

impl<'m, M> ViewData<'m, M> {
    pub fn new(model: &'m M) -> Self {
        ViewData {
            model,
            entries: HashMap::new(),
        }
    }

    pub fn model(&self) -> &'m M {
        self.model
    }

    pub fn entries(&self) -> &HashMap<String, String> {
        &self.entries
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }
}

#[derive(Debug, Default, Clone)]
pub struct TempData {
    values: HashMap<String, String>,
}

impl TempData {
    pub fn load(request: &RequestContext, provider: &dyn TempDataProvider) -> Self {
        TempData {
            values: provider.load_temp_data(request),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn values(&self) -> &HashMap<String, String> {
        &self.values
    }
}

/// Everything a view gets to see while it's executed.
#[derive(Debug)]
pub struct ViewContext<'a, M> {
    pub action_context: &'a ActionContext,
    pub view_data: ViewData<'a, M>,
    pub temp_data: TempData,
}

impl<'a, M> ViewContext<'a, M> {
    pub fn new(action_context: &'a ActionContext, view_data: ViewData<'a, M>, temp_data: TempData) -> Self {
        ViewContext {
            action_context,
            view_data,
            temp_data,
        }
    }

    pub fn model(&self) -> &'a M {
        self.view_data.model()
    }
}
