/*!
 * Core Infrastructure
 * Error taxonomy, shared handle types, and synchronization primitives
 */

pub mod errors;
pub mod sync;
pub mod types;

pub use errors::{LoadError, Result};
pub use types::{ResourceRef, UnitHandle};
