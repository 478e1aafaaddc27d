//! Priority-ordered adapter chains

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use super::{IteratorKind, LowLevelAdapter, ObjectAdapter, ObjectEntry};
use crate::error::{ResolutionError, Result};

/// Collects adapters into priority buckets
pub struct AdapterChainBuilder<A: ?Sized> {
    buckets: BTreeMap<i32, Vec<Arc<A>>>,
}

impl<A: ?Sized> Default for AdapterChainBuilder<A> {
    fn default() -> Self {
        AdapterChainBuilder {
            buckets: BTreeMap::new(),
        }
    }
}

impl<A: ?Sized> AdapterChainBuilder<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `adapter`; higher priorities are tried first, equal
    /// priorities in registration order
    pub fn add(mut self, adapter: Arc<A>, priority: i32) -> Self {
        self.buckets.entry(priority).or_default().push(adapter);
        self
    }

    pub fn build(self) -> AdapterChain<A> {
        AdapterChain {
            adapters: self.buckets.into_values().rev().flatten().collect(),
            valid: OnceLock::new(),
        }
    }
}

/// A frozen, sorted set of adapters acting as one
pub struct AdapterChain<A: ?Sized> {
    adapters: Vec<Arc<A>>,
    /// Computed on first use
    valid: OnceLock<Vec<Arc<A>>>,
}

impl<A: ?Sized> AdapterChain<A> {
    pub fn builder() -> AdapterChainBuilder<A> {
        AdapterChainBuilder::new()
    }

    /// All registered adapters, highest priority first
    pub fn sorted(&self) -> &[Arc<A>] {
        &self.adapters
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl<A: LowLevelAdapter + ?Sized> AdapterChain<A> {
    /// Adapters reporting themselves valid
    pub fn valid_adapters(&self) -> &[Arc<A>] {
        self.valid
            .get_or_init(|| self.adapters.iter().filter(|a| a.valid()).cloned().collect())
    }
}

impl<A: ?Sized> fmt::Debug for AdapterChain<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterChain")
            .field("adapters", &self.adapters.len())
            .field("valid", &self.valid.get().map(Vec::len))
            .finish()
    }
}

impl<A: LowLevelAdapter + ?Sized> LowLevelAdapter for AdapterChain<A> {
    fn dereference(&self, id: &str) -> std::result::Result<String, ResolutionError> {
        let valid = self.valid_adapters();
        if valid.is_empty() {
            return Err(ResolutionError::NoAdapter);
        }
        for (position, adapter) in valid.iter().enumerate() {
            match adapter.dereference(id) {
                Ok(uri) => return Ok(uri),
                Err(err) => debug!(id, position, error = %err, "adapter refused, trying next"),
            }
        }
        Err(ResolutionError::DereferenceFailed { id: id.to_string() })
    }

    fn valid(&self) -> bool {
        !self.valid_adapters().is_empty()
    }
}

impl<A: ObjectAdapter + ?Sized> ObjectAdapter for AdapterChain<A> {
    /// Enumerate the highest-priority valid adapter only
    fn iter(&self) -> Result<Box<dyn Iterator<Item = Result<ObjectEntry>> + '_>> {
        match self.valid_adapters().first() {
            Some(adapter) => adapter.iter(),
            None => Err(ResolutionError::NoAdapter.into()),
        }
    }

    fn iterator_kind(&self) -> IteratorKind {
        self.valid_adapters()
            .first()
            .map_or(IteratorKind::Pid, |adapter| adapter.iterator_kind())
    }
}
