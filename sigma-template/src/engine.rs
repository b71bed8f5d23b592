//! Parse-tree-caching template engine: lexes and parses each distinct
//! template body at most once, then evaluates the cached tree per render.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::instrument;

use crate::error::TemplateResult;
use crate::eval::eval;
use crate::filters::FilterRegistry;
use crate::lexer::lex;
use crate::parser::{parse, Node};
use crate::value::Context;

/// Renders templates against a [`Context`], caching parsed trees by the
/// exact bytes of the template source. A capacity of zero disables caching.
pub struct TemplateEngine {
    registry: FilterRegistry,
    cache: Option<Mutex<LruCache<Vec<u8>, Arc<Vec<Node>>>>>,
}

impl TemplateEngine {
    pub fn new(cache_capacity: usize) -> Self {
        let cache = NonZeroUsize::new(cache_capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Self { registry: FilterRegistry::new(), cache }
    }

    pub fn register_filter<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&str, Option<&str>) -> TemplateResult<String> + Send + Sync + 'static,
    {
        self.registry.register(name, f);
    }

    #[instrument(skip(self, template, ctx))]
    pub fn render(&self, template: &[u8], ctx: &Context) -> TemplateResult<String> {
        let nodes = self.parsed(template)?;
        eval(&nodes, ctx, &self.registry)
    }

    fn parsed(&self, template: &[u8]) -> TemplateResult<Arc<Vec<Node>>> {
        let Some(cache) = &self.cache else {
            return self.parse_fresh(template).map(Arc::new);
        };

        if let Some(hit) = cache.lock().get(template) {
            return Ok(Arc::clone(hit));
        }

        let nodes = Arc::new(self.parse_fresh(template)?);
        cache.lock().put(template.to_vec(), Arc::clone(&nodes));
        Ok(nodes)
    }

    fn parse_fresh(&self, template: &[u8]) -> TemplateResult<Vec<Node>> {
        let source = String::from_utf8_lossy(template);
        let tokens = lex(&source)?;
        parse(tokens, &self.registry)
    }
}
