//! Facade crate: composes the interner/triple store, the reasoner, the
//! shape validator, and the template engine into the flat operation set
//! collaborators bind to.

pub mod error;

pub use error::{SigmaError, SigmaResult};
pub use sigma_config::{ConfigError, StoreConfig};
pub use sigma_reasoner::{CharacteristicState, MaterializeReport};
pub use sigma_shapes::{PropertyConstraint, Shape, ShapeId, ShapeResult, Violation, ViolationKind};
pub use sigma_store::{Pattern, StoreError, TermId};
pub use sigma_template::{Context, TemplateError, Value};

use sigma_reasoner::Reasoner;
use sigma_shapes::ShapeValidator;
use sigma_store::{Interner, TripleStore};
use sigma_template::TemplateEngine;
use tracing::instrument;

/// The predicate used for class-membership triples (`(node, RDF_TYPE,
/// class)`). Interned once when a store is created so the reasoner always
/// has a stable id for it, mirroring how collaborators intern `rdf:type`
/// themselves in the wire-level scenarios.
const RDF_TYPE_BYTES: &[u8] = b"rdf:type";

/// A single in-memory knowledge store: interner, triple store, reasoner,
/// shape validator, and template engine bundled behind one handle.
pub struct SigmaStore {
    interner: Interner,
    triples: TripleStore,
    reasoner: Reasoner,
    shapes: ShapeValidator,
    templates: TemplateEngine,
    rdf_type: TermId,
}

impl SigmaStore {
    /// Allocates a store with the given capacities and default
    /// configuration for everything else (posting-list threshold, inference
    /// iteration cap, template cache size).
    pub fn create_store(
        max_subjects: usize,
        max_predicates: usize,
        max_objects: usize,
    ) -> SigmaResult<Self> {
        Self::create_store_with_config(StoreConfig::new(max_subjects, max_predicates, max_objects))
    }

    pub fn create_store_with_config(config: StoreConfig) -> SigmaResult<Self> {
        config
            .validate()
            .map_err(|_| StoreError::InvalidArgument("store configuration failed validation"))?;
        let mut interner = Interner::new(config.max_subjects.max(config.max_predicates).max(config.max_objects));
        let rdf_type = interner.intern(RDF_TYPE_BYTES)?;
        let triples = TripleStore::new(config)?;
        let reasoner = Reasoner::new(rdf_type);
        let shapes = ShapeValidator::new();
        let templates = TemplateEngine::new(config.template_cache_capacity);
        Ok(Self { interner, triples, reasoner, shapes, templates, rdf_type })
    }

    /// The predicate id standing for `rdf:type`, usable by callers who want
    /// to assert class membership directly via `add_triple`.
    pub fn rdf_type(&self) -> TermId {
        self.rdf_type
    }

    // --- interning -----------------------------------------------------

    pub fn intern(&mut self, bytes: &[u8]) -> SigmaResult<TermId> {
        Ok(self.interner.intern(bytes)?)
    }

    pub fn lookup(&self, id: TermId) -> Option<&[u8]> {
        self.interner.lookup(id)
    }

    // --- ingest / query --------------------------------------------------

    #[instrument(skip(self))]
    pub fn add_triple(&mut self, s: TermId, p: TermId, o: TermId) -> SigmaResult<bool> {
        let added = self.triples.add_triple(s, p, o)?;
        self.reasoner.notify_add_triple(s, p, o);
        Ok(added)
    }

    pub fn ask(&self, s: TermId, p: TermId, o: TermId) -> bool {
        self.triples.ask(s, p, o)
    }

    pub fn ask_batch(&self, patterns: &[Pattern]) -> Vec<bool> {
        self.triples.ask_batch(patterns)
    }

    pub fn objects_for(&self, p: TermId, s: TermId) -> Box<dyn Iterator<Item = TermId> + '_> {
        self.triples.objects_for(p, s)
    }

    pub fn subjects_for(&self, p: TermId, o: TermId) -> Box<dyn Iterator<Item = TermId> + '_> {
        self.triples.subjects_for(p, o)
    }

    // --- reasoning declarations -----------------------------------------

    pub fn declare_transitive(&mut self, pid: TermId) -> SigmaResult<()> {
        Ok(self.reasoner.declare_transitive(pid)?)
    }

    pub fn declare_symmetric(&mut self, pid: TermId) -> SigmaResult<()> {
        Ok(self.reasoner.declare_symmetric(pid)?)
    }

    pub fn declare_functional(&mut self, pid: TermId) -> SigmaResult<()> {
        Ok(self.reasoner.declare_functional(pid)?)
    }

    pub fn declare_subclass(&mut self, child: TermId, parent: TermId) -> SigmaResult<()> {
        Ok(self.reasoner.declare_subclass(child, parent)?)
    }

    pub fn declare_subproperty(&mut self, child: TermId, parent: TermId) -> SigmaResult<()> {
        Ok(self.reasoner.declare_subproperty(child, parent)?)
    }

    pub fn declare_property_chain(&mut self, output: TermId, inputs: Vec<TermId>) -> SigmaResult<()> {
        Ok(self.reasoner.declare_property_chain(output, inputs)?)
    }

    // --- reasoning execution ---------------------------------------------

    pub fn materialize(&mut self) -> SigmaResult<MaterializeReport> {
        Ok(self.reasoner.materialize(&mut self.triples)?)
    }

    pub fn ask_with_reasoning(&mut self, s: TermId, p: TermId, o: TermId) -> SigmaResult<bool> {
        Ok(self.reasoner.ask_with_reasoning(&mut self.triples, s, p, o)?)
    }

    pub fn check_class(&self, node: TermId, class: TermId) -> bool {
        self.reasoner.check_class(&self.triples, node, class)
    }

    pub fn functional_violations(&self) -> &[(TermId, TermId)] {
        self.reasoner.functional_violations()
    }

    // --- shapes ------------------------------------------------------------

    pub fn define_shape(
        &mut self,
        name: impl Into<String>,
        target_class: Option<TermId>,
        constraints: Vec<PropertyConstraint>,
    ) -> ShapeId {
        self.shapes.define_shape(name, target_class, constraints)
    }

    pub fn validate_shape(&self, node: TermId, shape_id: ShapeId) -> SigmaResult<ShapeResult> {
        Ok(self.shapes.validate_shape(&self.triples, &self.reasoner, node, shape_id)?)
    }

    pub fn validate_shape_fast(&self, node: TermId, shape_id: ShapeId) -> SigmaResult<ShapeResult> {
        Ok(self.shapes.validate_shape_fast(&self.triples, &self.reasoner, node, shape_id)?)
    }

    pub fn validate_batch(&self, nodes: &[TermId], shape_id: ShapeId) -> SigmaResult<Vec<ShapeResult>> {
        Ok(self.shapes.validate_batch(&self.triples, &self.reasoner, nodes, shape_id)?)
    }

    // --- templates -----------------------------------------------------

    pub fn render(&self, template: &[u8], context: &Context) -> SigmaResult<String> {
        Ok(self.templates.render(template, context)?)
    }

    pub fn register_filter<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&str, Option<&str>) -> Result<String, TemplateError> + Send + Sync + 'static,
    {
        self.templates.register_filter(name, f);
    }
}

/// `destroy_store` has no work to do beyond ordinary drop: the core keeps
/// no state outside `SigmaStore`'s owned fields and persists nothing.
pub fn destroy_store(store: SigmaStore) {
    drop(store);
}
