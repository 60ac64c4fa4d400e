/*!
 * Concurrent Loader Library
 * Deadlock-free coordination for hierarchically-delegating unit loaders
 */

pub mod core;
pub mod loader;

// Re-exports
pub use crate::core::errors::{LoadError, Result};
pub use crate::core::types::{ResourceRef, UnitHandle};
pub use crate::loader::{
    serializer_failures, ContextProvider, HazardStrategy, InvocationContext, Loader, LoaderBuilder,
    LoaderConfig, LoaderGuard, LocalStorage, NullSystemLoader, ResourceDelegate, SystemLoader,
    SystemPolicy,
};
