//! The filter registry: a closed set of named `(string, Option<string>) ->
//! Result<string>` functions, consulted at parse time so an unknown filter
//! is rejected before any rendering happens.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{TemplateError, TemplateResult};

pub type FilterFn = Arc<dyn Fn(&str, Option<&str>) -> TemplateResult<String> + Send + Sync>;

/// Maps filter names to implementations. Pre-populated with the core
/// filters (`upper`, `lower`, `capitalize`, `length`, `trim`, `default`);
/// hosts may register additional ones at startup via [`Self::register`].
pub struct FilterRegistry {
    filters: HashMap<String, FilterFn>,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        let mut registry = Self { filters: HashMap::new() };
        registry.register("upper", |s, _| Ok(s.to_uppercase()));
        registry.register("lower", |s, _| Ok(s.to_lowercase()));
        registry.register("capitalize", |s, _| Ok(capitalize(s)));
        registry.register("length", |s, _| Ok(s.chars().count().to_string()));
        registry.register("trim", |s, _| Ok(s.trim().to_string()));
        registry.register("default", |s, arg| {
            if s.is_empty() {
                Ok(arg.unwrap_or("").to_string())
            } else {
                Ok(s.to_string())
            }
        });
        registry
    }
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&str, Option<&str>) -> TemplateResult<String> + Send + Sync + 'static,
    {
        self.filters.insert(name.into(), Arc::new(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    pub fn apply(&self, name: &str, input: &str, arg: Option<&str>) -> TemplateResult<String> {
        match self.filters.get(name) {
            Some(f) => f(input, arg),
            None => Err(TemplateError::UnknownFilter(name.to_string())),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
