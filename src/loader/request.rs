/*!
 * Load Request
 *
 * A single-use synchronous future: the immutable description of one pending
 * resolution plus a write-once result slot and a monotonic completion flag.
 * Created by a blocked caller, consumed and completed by the serializer,
 * then discarded.
 */

use crate::core::errors::{LoadError, Result};
use crate::core::types::UnitHandle;
use crate::loader::context::InvocationContext;
use crate::loader::loader::Loader;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub(crate) struct LoadRequest {
    name: String,
    exports_only: bool,
    link: bool,
    loader: Arc<Loader>,
    context: Option<Arc<dyn InvocationContext>>,
    result: Mutex<Option<Result<UnitHandle>>>,
    done: AtomicBool,
}

impl LoadRequest {
    pub(crate) fn new(
        name: impl Into<String>,
        exports_only: bool,
        link: bool,
        loader: Arc<Loader>,
        context: Option<Arc<dyn InvocationContext>>,
    ) -> Self {
        Self {
            name: name.into(),
            exports_only,
            link,
            loader,
            context,
            result: Mutex::new(None),
            done: AtomicBool::new(false),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn exports_only(&self) -> bool {
        self.exports_only
    }

    pub(crate) fn link(&self) -> bool {
        self.link
    }

    pub(crate) fn loader(&self) -> &Arc<Loader> {
        &self.loader
    }

    pub(crate) fn context(&self) -> Option<&Arc<dyn InvocationContext>> {
        self.context.as_ref()
    }

    /// Store the outcome and flip the completion flag, in that order.
    ///
    /// The Release store pairs with the Acquire load in [`LoadRequest::is_done`],
    /// making the result visible to the waiter before it observes completion.
    pub(crate) fn complete(&self, outcome: Result<UnitHandle>) {
        debug_assert!(!self.done.load(Ordering::Relaxed), "request completed twice");
        *self.result.lock() = Some(outcome);
        self.done.store(true, Ordering::Release);
    }

    pub(crate) fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Claim the stored outcome; callable once, after completion.
    pub(crate) fn take_result(&self) -> Result<UnitHandle> {
        self.result
            .lock()
            .take()
            .unwrap_or_else(|| Err(LoadError::worker("request completed without a result")))
    }
}
