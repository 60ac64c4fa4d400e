/*!
 * Loader Subsystem
 *
 * The delegation-tree node and the machinery behind its deadlock-avoidance
 * protocol: hazard configuration, the hand-off request/queue pair, the
 * process-wide serializer worker, and the extension-point traits embedders
 * implement.
 */

mod config;
mod context;
mod delegate;
mod loader;
mod queue;
mod request;
mod serializer;
mod storage;
mod system;

pub use config::{HazardStrategy, LoaderConfig, LOCKLESS_ENV_VAR};
pub use context::{ContextProvider, InvocationContext};
pub use delegate::ResourceDelegate;
pub use loader::{Loader, LoaderBuilder, LoaderGuard};
pub use serializer::serializer_failures;
pub use storage::{LocalStorage, StoredValue};
pub use system::{NullSystemLoader, SystemLoader, SystemPolicy};
