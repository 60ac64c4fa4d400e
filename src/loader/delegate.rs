/*!
 * Resource Delegate
 *
 * The extension point that actually produces units and resources. A
 * delegate has no concurrency logic of its own: the owning loader decides
 * where and under which lock a lookup runs.
 */

use crate::core::errors::{LoadError, Result};
use crate::core::types::{ResourceRef, UnitHandle};
use std::io::Read;

/// Backing store for a loader's units and resources.
///
/// Implementations may delegate to other loaders, but must never hold their
/// own loader's lock across a call into another loader; the deadlock
/// protection upstream depends on lookups running lock-free on the calling
/// thread.
pub trait ResourceDelegate: Send + Sync {
    /// Produce the unit with the given binary name.
    ///
    /// `exports_only` restricts the search to exported units; `link` asks
    /// the store to eagerly link the unit after loading. The default
    /// implementation knows no units at all.
    fn lookup_unit(&self, name: &str, exports_only: bool, link: bool) -> Result<UnitHandle> {
        let _ = (exports_only, link);
        Err(LoadError::not_found(name))
    }

    /// Locate a single resource by `/`-separated path, or nothing.
    fn lookup_resource(&self, name: &str, exports_only: bool) -> Option<ResourceRef> {
        let _ = (name, exports_only);
        None
    }

    /// Locate every matching resource; the empty sequence means none.
    fn lookup_all_resources(&self, name: &str, exports_only: bool) -> Vec<ResourceRef> {
        let _ = (name, exports_only);
        Vec::new()
    }

    /// Open a single resource's content as a stream.
    ///
    /// Provided in terms of [`ResourceDelegate::lookup_resource`]; stores
    /// that can stream without materializing a reference may override.
    fn lookup_resource_stream(&self, name: &str, exports_only: bool) -> Option<Box<dyn Read + Send>> {
        self.lookup_resource(name, exports_only)
            .map(|resource| resource.open())
    }
}
