//! RDFS-like inference: transitive, symmetric, and functional property
//! characteristics, subclass/subproperty hierarchies, and property chains,
//! materialized as a fixpoint over a [`sigma_store::TripleStore`].

pub mod error;

use std::collections::HashSet;

use sigma_store::bitmatrix::{iter_set_bits, BitMatrix};
use sigma_store::{TermId, TripleStore};
use tracing::{debug, instrument, warn};

pub use error::{ReasonerError, ReasonerResult};

/// Where a declared characteristic sits relative to the store's current
/// triples. Any `add_triple` touching a declared relation drops
/// `Materialized` back to `Declared`; `materialize` is the only way forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicState {
    Undeclared,
    Declared,
    Materialized,
}

/// `output_pid <- [pid_1, .., pid_n]`, n >= 2.
#[derive(Debug, Clone)]
pub struct PropertyChain {
    pub output: TermId,
    pub inputs: Vec<TermId>,
}

/// Outcome of a `materialize` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializeReport {
    pub triples_added: usize,
    pub iterations: u32,
    pub state: CharacteristicState,
}

/// Declared property characteristics and hierarchy edges, plus the closure
/// matrices computed by the most recent `materialize`.
pub struct Reasoner {
    rdf_type: TermId,
    state: CharacteristicState,
    transitive: HashSet<u32>,
    symmetric: HashSet<u32>,
    functional: HashSet<u32>,
    subclass_edges: Vec<(TermId, TermId)>,
    subproperty_edges: Vec<(TermId, TermId)>,
    chains: Vec<PropertyChain>,
    subclass_closure: Option<BitMatrix>,
    subproperty_closure: Option<BitMatrix>,
    functional_violations: Vec<(TermId, TermId)>,
}

impl Reasoner {
    /// `rdf_type` is the predicate id used for class membership triples;
    /// subclass materialization reads and writes triples through it.
    pub fn new(rdf_type: TermId) -> Self {
        Self {
            rdf_type,
            state: CharacteristicState::Undeclared,
            transitive: HashSet::new(),
            symmetric: HashSet::new(),
            functional: HashSet::new(),
            subclass_edges: Vec::new(),
            subproperty_edges: Vec::new(),
            chains: Vec::new(),
            subclass_closure: None,
            subproperty_closure: None,
            functional_violations: Vec::new(),
        }
    }

    pub fn state(&self) -> CharacteristicState {
        self.state
    }

    pub fn declare_transitive(&mut self, pid: TermId) -> ReasonerResult<()> {
        if pid.is_none() {
            return Err(ReasonerError::InvalidArgument("predicate must not be none"));
        }
        self.transitive.insert(pid.as_u32());
        self.state = CharacteristicState::Declared;
        Ok(())
    }

    pub fn declare_symmetric(&mut self, pid: TermId) -> ReasonerResult<()> {
        if pid.is_none() {
            return Err(ReasonerError::InvalidArgument("predicate must not be none"));
        }
        self.symmetric.insert(pid.as_u32());
        self.state = CharacteristicState::Declared;
        Ok(())
    }

    pub fn declare_functional(&mut self, pid: TermId) -> ReasonerResult<()> {
        if pid.is_none() {
            return Err(ReasonerError::InvalidArgument("predicate must not be none"));
        }
        self.functional.insert(pid.as_u32());
        self.state = CharacteristicState::Declared;
        Ok(())
    }

    pub fn declare_subclass(&mut self, child: TermId, parent: TermId) -> ReasonerResult<()> {
        if child.is_none() || parent.is_none() {
            return Err(ReasonerError::InvalidArgument("class id must not be none"));
        }
        self.subclass_edges.push((child, parent));
        self.state = CharacteristicState::Declared;
        Ok(())
    }

    pub fn declare_subproperty(&mut self, child: TermId, parent: TermId) -> ReasonerResult<()> {
        if child.is_none() || parent.is_none() {
            return Err(ReasonerError::InvalidArgument("property id must not be none"));
        }
        self.subproperty_edges.push((child, parent));
        self.state = CharacteristicState::Declared;
        Ok(())
    }

    pub fn declare_property_chain(
        &mut self,
        output: TermId,
        inputs: Vec<TermId>,
    ) -> ReasonerResult<()> {
        if output.is_none() || inputs.iter().any(|p| p.is_none()) {
            return Err(ReasonerError::InvalidArgument("chain predicates must not be none"));
        }
        if inputs.len() < 2 {
            return Err(ReasonerError::InvalidArgument(
                "a property chain needs at least 2 input predicates",
            ));
        }
        self.chains.push(PropertyChain { output, inputs });
        self.state = CharacteristicState::Declared;
        Ok(())
    }

    /// Called by the facade after every `add_triple`. Drops a materialized
    /// closure back to `Declared` if the triple touches a declared relation.
    pub fn notify_add_triple(&mut self, s: TermId, p: TermId, o: TermId) {
        if self.state != CharacteristicState::Materialized {
            return;
        }
        let touches_characteristic = self.transitive.contains(&p.as_u32())
            || self.symmetric.contains(&p.as_u32())
            || self.functional.contains(&p.as_u32());
        let touches_subclass =
            p == self.rdf_type && self.subclass_edges.iter().any(|(c, _)| *c == o || *c == s);
        let touches_subproperty = self
            .subproperty_edges
            .iter()
            .any(|(c, parent)| *c == p || *parent == p);
        let touches_chain = self
            .chains
            .iter()
            .any(|c| c.output == p || c.inputs.contains(&p));

        if touches_characteristic || touches_subclass || touches_subproperty || touches_chain {
            self.state = CharacteristicState::Declared;
        }
    }

    /// Runs the materialization ordering to fixpoint: subproperty closure,
    /// subclass closure, symmetric closures, transitive closures, property
    /// chains, repeated until no stage adds a triple or the iteration cap is
    /// hit.
    #[instrument(skip(self, store))]
    pub fn materialize(&mut self, store: &mut TripleStore) -> ReasonerResult<MaterializeReport> {
        if self.state == CharacteristicState::Materialized {
            return Ok(MaterializeReport {
                triples_added: 0,
                iterations: 0,
                state: self.state,
            });
        }

        let cap = store.config().inference_iteration_cap;
        let mut total_added = 0usize;
        let mut iterations = 0u32;

        loop {
            iterations += 1;
            if iterations > cap {
                warn!(cap, "materialization did not converge");
                return Err(ReasonerError::DidNotConverge { iterations: iterations - 1 });
            }

            let mut added = 0usize;
            added += self.materialize_subproperty_stage(store)?;
            added += self.materialize_subclass_stage(store)?;
            added += self.materialize_symmetric_stage(store)?;
            added += self.materialize_transitive_stage(store)?;
            added += self.materialize_chains_stage(store)?;
            total_added += added;

            debug!(iterations, added, "materialization pass");
            if added == 0 {
                break;
            }
        }

        self.functional_violations.clear();
        self.materialize_functional_stage(store)?;

        self.state = CharacteristicState::Materialized;
        Ok(MaterializeReport {
            triples_added: total_added,
            iterations,
            state: self.state,
        })
    }

    /// Identical to `ask` once materialized; otherwise materializes first.
    pub fn ask_with_reasoning(
        &mut self,
        store: &mut TripleStore,
        s: TermId,
        p: TermId,
        o: TermId,
    ) -> ReasonerResult<bool> {
        if self.state != CharacteristicState::Materialized {
            self.materialize(store)?;
        }
        if store.ask(s, p, o) {
            return Ok(true);
        }
        if let Some(closure) = &self.subproperty_closure {
            let p_idx = p.as_u32() as usize;
            if p_idx < closure.rows() {
                // Column p_idx, not row p_idx: closure.get(child, parent) is
                // set by materialize_subproperty_stage, so the predicates
                // narrower than `p` are the rows with a bit set in column
                // p_idx, mirroring how check_class reads subclass_closure.
                for child_idx in 0..closure.rows() {
                    if closure.get(child_idx, p_idx)
                        && store.ask(s, TermId::new(child_idx as u32), o)
                    {
                        return Ok(true);
                    }
                }
            }
        }
        Ok(false)
    }

    /// `true` iff `(node, rdf:type, class)` holds directly or via the
    /// subclass closure computed by the most recent `materialize`.
    pub fn check_class(&self, store: &TripleStore, node: TermId, class: TermId) -> bool {
        if store.ask(node, self.rdf_type, class) {
            return true;
        }
        let Some(closure) = &self.subclass_closure else {
            return false;
        };
        let class_idx = class.as_u32() as usize;
        if class_idx >= closure.rows() {
            return false;
        }
        store.objects_for(self.rdf_type, node).any(|asserted| {
            let asserted_idx = asserted.as_u32() as usize;
            asserted_idx < closure.rows() && closure.get(asserted_idx, class_idx)
        })
    }

    /// `(subject, predicate)` pairs violating a declared functional
    /// characteristic, as of the most recent `materialize`.
    pub fn functional_violations(&self) -> &[(TermId, TermId)] {
        &self.functional_violations
    }

    fn materialize_subproperty_stage(&mut self, store: &TripleStore) -> ReasonerResult<usize> {
        if self.subproperty_edges.is_empty() {
            self.subproperty_closure = None;
            return Ok(0);
        }
        let n = store.max_predicates();
        let mut closure = BitMatrix::new(n, n)?;
        for (child, parent) in &self.subproperty_edges {
            let (c, p) = (child.as_u32() as usize, parent.as_u32() as usize);
            if c < n && p < n {
                closure.set(c, p);
            }
        }
        warshall_closure(&mut closure, n);
        self.subproperty_closure = Some(closure);
        // Auxiliary structure only; no triples are injected (query rewriting
        // happens in `ask_with_reasoning`).
        Ok(0)
    }

    fn materialize_subclass_stage(&mut self, store: &mut TripleStore) -> ReasonerResult<usize> {
        if self.subclass_edges.is_empty() {
            self.subclass_closure = None;
            return Ok(0);
        }
        let n = store.max_subjects().max(store.max_objects());
        let mut closure = BitMatrix::new(n, n)?;
        for (child, parent) in &self.subclass_edges {
            let (c, p) = (child.as_u32() as usize, parent.as_u32() as usize);
            if c < n && p < n {
                closure.set(c, p);
            }
        }
        warshall_closure(&mut closure, n);

        let mut added = 0;
        let instances: Vec<TermId> = store.subjects_with_predicate(self.rdf_type).collect();
        for instance in instances {
            let classes: Vec<TermId> = store.objects_for(self.rdf_type, instance).collect();
            for class in classes {
                let class_idx = class.as_u32() as usize;
                if class_idx >= n {
                    continue;
                }
                for ancestor_idx in iter_set_bits(closure.row(class_idx)) {
                    if ancestor_idx == class_idx {
                        continue;
                    }
                    if store.add_triple(instance, self.rdf_type, TermId::new(ancestor_idx as u32))? {
                        added += 1;
                    }
                }
            }
        }
        self.subclass_closure = Some(closure);
        Ok(added)
    }

    fn materialize_symmetric_stage(&mut self, store: &mut TripleStore) -> ReasonerResult<usize> {
        let mut added = 0;
        for &p_raw in &self.symmetric {
            let p = TermId::new(p_raw);
            let subjects: Vec<TermId> = store.subjects_with_predicate(p).collect();
            for s in subjects {
                let objects: Vec<TermId> = store.objects_for(p, s).collect();
                for o in objects {
                    if store.add_triple(o, p, s)? {
                        added += 1;
                    }
                }
            }
        }
        Ok(added)
    }

    fn materialize_transitive_stage(&mut self, store: &mut TripleStore) -> ReasonerResult<usize> {
        let mut total_added = 0;
        for &p_raw in &self.transitive {
            let p = TermId::new(p_raw);
            let closure = self.build_adjacency(store, p)?;
            total_added += self.write_back_adjacency(store, p, &closure)?;
        }
        Ok(total_added)
    }

    fn materialize_chains_stage(&mut self, store: &mut TripleStore) -> ReasonerResult<usize> {
        let mut total_added = 0;
        let chains = self.chains.clone();
        for chain in &chains {
            let n = store.max_subjects();
            let mut composed = self.build_adjacency(store, chain.inputs[0])?;
            for &pid in &chain.inputs[1..] {
                let next = self.build_adjacency(store, pid)?;
                composed = multiply(&composed, &next, n)?;
            }
            total_added += self.write_back_adjacency(store, chain.output, &composed)?;
        }
        Ok(total_added)
    }

    fn materialize_functional_stage(&mut self, store: &TripleStore) -> ReasonerResult<()> {
        for &p_raw in &self.functional {
            let p = TermId::new(p_raw);
            for s in store.subjects_with_predicate(p) {
                if store.object_count(p, s) > 1 {
                    self.functional_violations.push((s, p));
                }
            }
        }
        Ok(())
    }

    /// Builds the `S x S` direct-edge adjacency matrix for predicate `p` from
    /// the store's current posting lists, then closes it with Warshall's
    /// algorithm.
    fn build_adjacency(&self, store: &TripleStore, p: TermId) -> ReasonerResult<BitMatrix> {
        let n = store.max_subjects();
        let mut adjacency = BitMatrix::new(n, n)?;
        let subjects: Vec<TermId> = store.subjects_with_predicate(p).collect();
        for s in &subjects {
            let s_idx = s.as_u32() as usize;
            for o in store.objects_for(p, *s) {
                let o_idx = o.as_u32() as usize;
                if o_idx < n {
                    adjacency.set(s_idx, o_idx);
                }
            }
        }
        warshall_closure(&mut adjacency, n);
        Ok(adjacency)
    }

    fn write_back_adjacency(
        &self,
        store: &mut TripleStore,
        p: TermId,
        adjacency: &BitMatrix,
    ) -> ReasonerResult<usize> {
        let mut added = 0;
        let n = adjacency.rows();
        for s_idx in 0..n {
            if !adjacency.row_any(s_idx) {
                continue;
            }
            for o_idx in iter_set_bits(adjacency.row(s_idx)) {
                if store.add_triple(TermId::new(s_idx as u32), p, TermId::new(o_idx as u32))? {
                    added += 1;
                }
            }
        }
        Ok(added)
    }
}

/// Classic Warshall transitive closure: after this call, `matrix[i][j]` is
/// set iff `j` is reachable from `i` through one or more direct edges.
fn warshall_closure(matrix: &mut BitMatrix, n: usize) {
    for k in 0..n {
        for i in 0..n {
            if matrix.get(i, k) {
                matrix.or_row_from(i, k);
            }
        }
    }
}

/// Boolean matrix product `a * b`, restricted to the first `n` rows/columns
/// of both operands.
fn multiply(a: &BitMatrix, b: &BitMatrix, n: usize) -> ReasonerResult<BitMatrix> {
    let mut out = BitMatrix::new(n, n)?;
    for i in 0..n {
        for k in iter_set_bits(a.row(i)) {
            if k >= n {
                continue;
            }
            out.or_row_from_other(i, b, k);
        }
    }
    Ok(out)
}
