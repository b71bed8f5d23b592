//! SHACL-like shape constraints, evaluated directly against a
//! [`sigma_store::TripleStore`]'s bit-matrix primitives.

pub mod error;

use std::collections::HashMap;
use std::fmt;

use sigma_reasoner::Reasoner;
use sigma_store::{TermId, TripleStore};

pub use error::ShapeError;

/// Identifies a registered shape; stable across redefinition by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(u32);

/// A single property's cardinality, value-set, and datatype requirements.
#[derive(Debug, Clone)]
pub struct PropertyConstraint {
    pub property: TermId,
    pub min_count: usize,
    pub max_count: usize,
    pub allowed_values: Vec<TermId>,
    pub datatype: TermId,
}

impl PropertyConstraint {
    pub fn new(property: TermId) -> Self {
        Self {
            property,
            min_count: 0,
            max_count: usize::MAX,
            allowed_values: Vec::new(),
            datatype: TermId::NONE,
        }
    }

    pub fn with_min_count(mut self, k: usize) -> Self {
        self.min_count = k;
        self
    }

    pub fn with_max_count(mut self, k: usize) -> Self {
        self.max_count = k;
        self
    }

    pub fn with_allowed_values(mut self, values: Vec<TermId>) -> Self {
        self.allowed_values = values;
        self
    }

    pub fn with_datatype(mut self, dt: TermId) -> Self {
        self.datatype = dt;
        self
    }
}

/// A named, read-only-once-defined constraint bundle.
#[derive(Debug, Clone)]
pub struct Shape {
    pub name: String,
    pub target_class: Option<TermId>,
    pub constraints: Vec<PropertyConstraint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    Class,
    MinCount,
    MaxCount,
    HasProperty,
    AllowedValues,
    Datatype,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ViolationKind::Class => "class",
            ViolationKind::MinCount => "min_count",
            ViolationKind::MaxCount => "max_count",
            ViolationKind::HasProperty => "has_property",
            ViolationKind::AllowedValues => "allowed_values",
            ViolationKind::Datatype => "datatype",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub property: Option<TermId>,
    pub details: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.property {
            Some(p) => write!(f, "{} on {}: {}", self.kind, p, self.details),
            None => write!(f, "{}: {}", self.kind, self.details),
        }
    }
}

/// The outcome of validating one node against one shape, in declaration
/// order.
#[derive(Debug, Clone)]
pub struct ShapeResult {
    pub node: TermId,
    pub shape: ShapeId,
    pub violations: Vec<Violation>,
}

impl ShapeResult {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations_by_kind(&self, kind: ViolationKind) -> Vec<&Violation> {
        self.violations.iter().filter(|v| v.kind == kind).collect()
    }
}

impl fmt::Display for ShapeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return write!(f, "{} conforms to shape {:?}", self.node, self.shape);
        }
        writeln!(f, "{} violates shape {:?}:", self.node, self.shape)?;
        for v in &self.violations {
            writeln!(f, "  - {v}")?;
        }
        Ok(())
    }
}

/// A registry of named shapes, queried by [`ShapeId`].
#[derive(Default)]
pub struct ShapeValidator {
    shapes: Vec<Shape>,
    by_name: HashMap<String, ShapeId>,
}

impl ShapeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `shape` under `name`, replacing any prior shape of the same
    /// name (and keeping its [`ShapeId`]). Does not validate anything.
    pub fn define_shape(
        &mut self,
        name: impl Into<String>,
        target_class: Option<TermId>,
        constraints: Vec<PropertyConstraint>,
    ) -> ShapeId {
        let name = name.into();
        let shape = Shape {
            name: name.clone(),
            target_class,
            constraints,
        };
        if let Some(&id) = self.by_name.get(&name) {
            self.shapes[id.0 as usize] = shape;
            id
        } else {
            let id = ShapeId(self.shapes.len() as u32);
            self.shapes.push(shape);
            self.by_name.insert(name, id);
            id
        }
    }

    pub fn shape(&self, id: ShapeId) -> Result<&Shape, ShapeError> {
        self.shapes
            .get(id.0 as usize)
            .ok_or(ShapeError::UnknownShape(id))
    }

    /// Evaluates every constraint in declaration order, collecting all
    /// violations.
    pub fn validate_shape(
        &self,
        store: &TripleStore,
        reasoner: &Reasoner,
        node: TermId,
        shape_id: ShapeId,
    ) -> Result<ShapeResult, ShapeError> {
        self.validate(store, reasoner, node, shape_id, false)
    }

    /// Like [`Self::validate_shape`] but stops at the first violation.
    pub fn validate_shape_fast(
        &self,
        store: &TripleStore,
        reasoner: &Reasoner,
        node: TermId,
        shape_id: ShapeId,
    ) -> Result<ShapeResult, ShapeError> {
        self.validate(store, reasoner, node, shape_id, true)
    }

    /// Order-preserving batch of [`Self::validate_shape`].
    pub fn validate_batch(
        &self,
        store: &TripleStore,
        reasoner: &Reasoner,
        nodes: &[TermId],
        shape_id: ShapeId,
    ) -> Result<Vec<ShapeResult>, ShapeError> {
        nodes
            .iter()
            .map(|&node| self.validate_shape(store, reasoner, node, shape_id))
            .collect()
    }

    fn validate(
        &self,
        store: &TripleStore,
        reasoner: &Reasoner,
        node: TermId,
        shape_id: ShapeId,
        fast: bool,
    ) -> Result<ShapeResult, ShapeError> {
        let shape = self.shape(shape_id)?;
        let mut violations = Vec::new();

        if let Some(class) = shape.target_class {
            if !reasoner.check_class(store, node, class) {
                violations.push(Violation {
                    kind: ViolationKind::Class,
                    property: None,
                    details: format!("node is not a member of class {class}"),
                });
                if fast {
                    return Ok(ShapeResult { node, shape: shape_id, violations });
                }
            }
        }

        'constraints: for constraint in &shape.constraints {
            let count = store.object_count(constraint.property, node);

            if count < constraint.min_count {
                let kind = if constraint.min_count <= 1 {
                    ViolationKind::HasProperty
                } else {
                    ViolationKind::MinCount
                };
                violations.push(Violation {
                    kind,
                    property: Some(constraint.property),
                    details: format!(
                        "expected at least {}, found {count}",
                        constraint.min_count
                    ),
                });
                if fast {
                    break 'constraints;
                }
            }

            if count > constraint.max_count {
                violations.push(Violation {
                    kind: ViolationKind::MaxCount,
                    property: Some(constraint.property),
                    details: format!("expected at most {}, found {count}", constraint.max_count),
                });
                if fast {
                    break 'constraints;
                }
            }

            if !constraint.allowed_values.is_empty() {
                let offender = store
                    .objects_for(constraint.property, node)
                    .find(|o| !constraint.allowed_values.contains(o));
                if let Some(offender) = offender {
                    violations.push(Violation {
                        kind: ViolationKind::AllowedValues,
                        property: Some(constraint.property),
                        details: format!("{offender} is not an allowed value"),
                    });
                    if fast {
                        break 'constraints;
                    }
                }
            }

            if constraint.datatype.is_some() {
                let offender = store
                    .objects_for(constraint.property, node)
                    .find(|&o| !reasoner.check_class(store, o, constraint.datatype));
                if let Some(offender) = offender {
                    violations.push(Violation {
                        kind: ViolationKind::Datatype,
                        property: Some(constraint.property),
                        details: format!(
                            "{offender} does not have datatype {}",
                            constraint.datatype
                        ),
                    });
                    if fast {
                        break 'constraints;
                    }
                }
            }
        }

        Ok(ShapeResult { node, shape: shape_id, violations })
    }
}

/// `|objects_for(pid, node)| >= k`.
pub fn min_count(store: &TripleStore, node: TermId, pid: TermId, k: usize) -> bool {
    store.object_count(pid, node) >= k
}

/// `|objects_for(pid, node)| <= k`.
pub fn max_count(store: &TripleStore, node: TermId, pid: TermId, k: usize) -> bool {
    store.object_count(pid, node) <= k
}

/// Equivalent to `min_count(node, pid, 1)`.
pub fn has_property(store: &TripleStore, node: TermId, pid: TermId) -> bool {
    min_count(store, node, pid, 1)
}

/// Every object of `(node, pid, *)` is an element of `set`; vacuously true
/// when there are no objects.
pub fn allowed_values(store: &TripleStore, node: TermId, pid: TermId, set: &[TermId]) -> bool {
    store.objects_for(pid, node).all(|o| set.contains(&o))
}

/// Every object of `(node, pid, *)` is a member of class `dt`.
pub fn datatype(
    store: &TripleStore,
    reasoner: &Reasoner,
    node: TermId,
    pid: TermId,
    dt: TermId,
) -> bool {
    store
        .objects_for(pid, node)
        .all(|o| reasoner.check_class(store, o, dt))
}
