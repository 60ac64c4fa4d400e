/*!
 * System Fallback
 *
 * Reserved-prefix routing to the platform's own loader. Names under a
 * reserved prefix never reach a delegate: they go straight to the system
 * fallback, which is assumed deadlock-free by construction, so the hazard
 * machinery is bypassed entirely.
 */

use crate::core::errors::{LoadError, Result};
use crate::core::types::{ResourceRef, UnitHandle};
use std::io::Read;
use std::sync::Arc;

/// The platform loader backing reserved names.
pub trait SystemLoader: Send + Sync {
    /// Resolve a reserved-prefix unit.
    fn find_system_unit(&self, name: &str) -> Result<UnitHandle>;

    /// Locate a reserved-prefix resource.
    fn get_system_resource(&self, name: &str) -> Option<ResourceRef>;

    /// Locate every matching reserved-prefix resource.
    fn get_system_resources(&self, name: &str) -> Vec<ResourceRef>;

    /// Open a reserved-prefix resource's content as a stream.
    fn get_system_resource_as_stream(&self, name: &str) -> Option<Box<dyn Read + Send>> {
        self.get_system_resource(name).map(|resource| resource.open())
    }
}

/// System loader that knows nothing; the default for loaders built without
/// an embedding platform.
pub struct NullSystemLoader;

impl SystemLoader for NullSystemLoader {
    fn find_system_unit(&self, name: &str) -> Result<UnitHandle> {
        Err(LoadError::not_found(name))
    }

    fn get_system_resource(&self, _name: &str) -> Option<ResourceRef> {
        None
    }

    fn get_system_resources(&self, _name: &str) -> Vec<ResourceRef> {
        Vec::new()
    }
}

/// Reserved-prefix tables plus the fallback loader they route to.
///
/// Prefix matching is "name starts with prefix", consulted in insertion
/// order before any hazard-aware logic runs. Typically one policy instance
/// is shared by every loader in a delegation tree.
pub struct SystemPolicy {
    unit_prefixes: Vec<String>,
    resource_prefixes: Vec<String>,
    fallback: Arc<dyn SystemLoader>,
}

impl SystemPolicy {
    /// Build a policy from the two ordered prefix tables and the fallback.
    pub fn new(
        unit_prefixes: impl IntoIterator<Item = impl Into<String>>,
        resource_prefixes: impl IntoIterator<Item = impl Into<String>>,
        fallback: Arc<dyn SystemLoader>,
    ) -> Self {
        Self {
            unit_prefixes: unit_prefixes.into_iter().map(Into::into).collect(),
            resource_prefixes: resource_prefixes.into_iter().map(Into::into).collect(),
            fallback,
        }
    }

    /// Policy with empty tables over a loader that resolves nothing.
    pub fn empty() -> Self {
        Self::new(
            Vec::<String>::new(),
            Vec::<String>::new(),
            Arc::new(NullSystemLoader),
        )
    }

    /// The reserved unit prefix matching `name`, if any.
    pub fn match_unit_prefix(&self, name: &str) -> Option<&str> {
        self.unit_prefixes
            .iter()
            .find(|prefix| name.starts_with(prefix.as_str()))
            .map(String::as_str)
    }

    /// The reserved resource prefix matching `name`, if any.
    pub fn match_resource_prefix(&self, name: &str) -> Option<&str> {
        self.resource_prefixes
            .iter()
            .find(|prefix| name.starts_with(prefix.as_str()))
            .map(String::as_str)
    }

    /// The fallback loader reserved names route to.
    pub fn fallback(&self) -> &Arc<dyn SystemLoader> {
        &self.fallback
    }
}
