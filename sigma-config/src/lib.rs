//! Capacities and tunables for the Sigma engine.
//!
//! Hard capacities for the interner/store, the template parse-tree cache size,
//! the posting-list array-to-hash-set upgrade threshold, and the
//! materialization fixpoint iteration cap. Every field has a default and
//! can be overridden from the environment, following the override-hierarchy
//! pattern (defaults, then environment) used elsewhere in this family of
//! crates.

use std::env;
use std::num::ParseIntError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of subjects a store can address.
pub const DEFAULT_MAX_SUBJECTS: usize = 1 << 14;
/// Default number of distinct predicates a store can address.
pub const DEFAULT_MAX_PREDICATES: usize = 1 << 8;
/// Default number of objects a store can address.
pub const DEFAULT_MAX_OBJECTS: usize = 1 << 14;
/// Default LRU capacity for parsed templates.
pub const DEFAULT_TEMPLATE_CACHE_CAPACITY: usize = 256;
/// Default size at which a posting list upgrades from array to hash set.
pub const DEFAULT_POSTING_LIST_HASH_THRESHOLD: usize = 32;
/// Default hard cap on materialization fixpoint iterations.
pub const DEFAULT_INFERENCE_ITERATION_CAP: u32 = 32;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("capacity for {field} must be greater than zero")]
    ZeroCapacity { field: &'static str },
    #[error("environment variable {var} has an invalid value: {source}")]
    InvalidEnvValue {
        var: &'static str,
        #[source]
        source: ParseIntError,
    },
}

/// Capacities and tunables passed to `create_store`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub max_subjects: usize,
    pub max_predicates: usize,
    pub max_objects: usize,
    pub template_cache_capacity: usize,
    pub posting_list_hash_threshold: usize,
    pub inference_iteration_cap: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_subjects: DEFAULT_MAX_SUBJECTS,
            max_predicates: DEFAULT_MAX_PREDICATES,
            max_objects: DEFAULT_MAX_OBJECTS,
            template_cache_capacity: DEFAULT_TEMPLATE_CACHE_CAPACITY,
            posting_list_hash_threshold: DEFAULT_POSTING_LIST_HASH_THRESHOLD,
            inference_iteration_cap: DEFAULT_INFERENCE_ITERATION_CAP,
        }
    }
}

impl StoreConfig {
    /// Capacities expressed directly, bypassing environment/config-file
    /// lookup. This is the constructor `create_store(max_subjects,
    /// max_predicates, max_objects)` is built on.
    pub fn new(max_subjects: usize, max_predicates: usize, max_objects: usize) -> Self {
        Self {
            max_subjects,
            max_predicates,
            max_objects,
            ..Self::default()
        }
    }

    /// Start from defaults and apply any `SIGMA_*` environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        apply_env_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_subjects == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "max_subjects",
            });
        }
        if self.max_predicates == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "max_predicates",
            });
        }
        if self.max_objects == 0 {
            return Err(ConfigError::ZeroCapacity {
                field: "max_objects",
            });
        }
        Ok(())
    }

    /// Number of 64-bit words needed per bit-matrix row to address
    /// `max_subjects` columns.
    pub fn subject_stride(&self) -> usize {
        self.max_subjects.div_ceil(64)
    }
}

fn apply_env_overrides(config: &mut StoreConfig) -> Result<(), ConfigError> {
    if let Some(v) = parse_env("SIGMA_MAX_SUBJECTS")? {
        config.max_subjects = v;
    }
    if let Some(v) = parse_env("SIGMA_MAX_PREDICATES")? {
        config.max_predicates = v;
    }
    if let Some(v) = parse_env("SIGMA_MAX_OBJECTS")? {
        config.max_objects = v;
    }
    if let Some(v) = parse_env("SIGMA_TEMPLATE_CACHE_CAPACITY")? {
        config.template_cache_capacity = v;
    }
    if let Some(v) = parse_env("SIGMA_POSTING_LIST_HASH_THRESHOLD")? {
        config.posting_list_hash_threshold = v;
    }
    if let Some(v) = parse_env_u32("SIGMA_INFERENCE_ITERATION_CAP")? {
        config.inference_iteration_cap = v;
    }
    Ok(())
}

fn parse_env(var: &'static str) -> Result<Option<usize>, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse::<usize>()
            .map(Some)
            .map_err(|source| ConfigError::InvalidEnvValue { var, source }),
        Err(_) => Ok(None),
    }
}

fn parse_env_u32(var: &'static str) -> Result<Option<u32>, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|source| ConfigError::InvalidEnvValue { var, source }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn new_overrides_only_capacities() {
        let config = StoreConfig::new(10, 20, 30);
        assert_eq!(config.max_subjects, 10);
        assert_eq!(config.max_predicates, 20);
        assert_eq!(config.max_objects, 30);
        assert_eq!(
            config.template_cache_capacity,
            DEFAULT_TEMPLATE_CACHE_CAPACITY
        );
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let config = StoreConfig::new(0, 1, 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroCapacity { field: "max_subjects" })
        ));
    }

    #[test]
    fn subject_stride_rounds_up() {
        let config = StoreConfig::new(65, 1, 1);
        assert_eq!(config.subject_stride(), 2);
        let config = StoreConfig::new(64, 1, 1);
        assert_eq!(config.subject_stride(), 1);
    }
}
