//! Explicit registration list of data model factories.

use std::cmp::Reverse;
use std::sync::Arc;

use kconsole_core::Namespace;
use tracing::info;

use crate::error::{Error, Result};
use crate::factory::DataModelFactory;

/// The set of factories known to the aggregator, in registration order.
#[derive(Debug, Default, Clone)]
pub struct FactoryRegistry {
    factories: Vec<Arc<dyn DataModelFactory>>,
}

impl FactoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateFactory`] if the id is taken.
    pub fn register(&mut self, factory: Arc<dyn DataModelFactory>) -> Result<()> {
        if self.get(factory.id()).is_some() {
            return Err(Error::DuplicateFactory(factory.id().to_string()));
        }

        info!(
            factory = %factory.id(),
            priority = factory.priority(),
            "Registered data model factory"
        );

        self.factories.push(factory);
        Ok(())
    }

    /// Looks up a factory by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Arc<dyn DataModelFactory>> {
        self.factories.iter().find(|f| f.id() == id)
    }

    /// Number of registered factories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Factories in merge precedence: priority descending, ties in
    /// registration order.
    #[must_use]
    pub fn ordered(&self) -> Vec<Arc<dyn DataModelFactory>> {
        let mut ordered = self.factories.clone();
        ordered.sort_by_key(|f| Reverse(f.priority()));
        ordered
    }

    /// Factories that apply to `namespace`, in merge precedence.
    #[must_use]
    pub fn applicable(&self, namespace: &Namespace) -> Vec<Arc<dyn DataModelFactory>> {
        self.ordered()
            .into_iter()
            .filter(|f| f.is_applicable(namespace))
            .collect()
    }
}
