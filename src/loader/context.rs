/*!
 * Invocation Context
 *
 * Opaque snapshot of ambient caller state (privileges, security scope) that
 * must travel with a resolution executed on a thread other than its
 * originator. The serializer applies the snapshot around the whole
 * resolution; the loader core never inspects it.
 */

use std::sync::Arc;

/// A captured ambient context, applied around cross-thread work.
pub trait InvocationContext: Send + Sync {
    /// Run `work` with this context applied for its full duration.
    ///
    /// Implementations must call `work` exactly once; a snapshot that fails
    /// to run the work turns the caller's resolution into a worker failure.
    fn run(&self, work: &mut dyn FnMut());
}

/// Hook supplying context snapshots at request-capture time.
///
/// A loader without a provider submits context-free requests, which the
/// serializer executes directly.
pub trait ContextProvider: Send + Sync {
    /// Snapshot the calling thread's ambient state.
    fn capture(&self) -> Arc<dyn InvocationContext>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingContext(Arc<AtomicUsize>);

    impl InvocationContext for CountingContext {
        fn run(&self, work: &mut dyn FnMut()) {
            self.0.fetch_add(1, Ordering::SeqCst);
            work();
        }
    }

    #[test]
    fn test_context_wraps_work() {
        let applications = Arc::new(AtomicUsize::new(0));
        let context = CountingContext(applications.clone());

        let mut ran = false;
        context.run(&mut || ran = true);

        assert!(ran);
        assert_eq!(applications.load(Ordering::SeqCst), 1);
    }
}
