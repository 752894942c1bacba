//! Temporary data plumbing. Views get a `temp_data` map loaded from a
//! pluggable provider; the renderer itself never looks inside it.

use std::collections::HashMap;

use crate::context::RequestContext;

/// Supplies the temporary data made available to a view.
pub trait TempDataProvider: Send + Sync {
    fn load_temp_data(&self, context: &RequestContext) -> HashMap<String, String>;
}

/// A provider with nothing to offer. Rendering outside of a request has no
/// session or cookies to read temporary data from.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyTempDataProvider;

impl TempDataProvider for EmptyTempDataProvider {
    fn load_temp_data(&self, _context: &RequestContext) -> HashMap<String, String> {
        HashMap::new()
    }
}

/// Hands out the same values for every render.
#[derive(Debug, Default, Clone)]
pub struct StaticTempDataProvider {
    values: HashMap<String, String>,
}

impl StaticTempDataProvider {
    pub fn new(values: HashMap<String, String>) -> Self {
        StaticTempDataProvider { values }
    }
}

impl From<HashMap<&str, &str>> for StaticTempDataProvider {
    fn from(h: HashMap<&str, &str>) -> Self {
        Self::new(
            h.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl TempDataProvider for StaticTempDataProvider {
    fn load_temp_data(&self, _context: &RequestContext) -> HashMap<String, String> {
        self.values.clone()
    }
}
