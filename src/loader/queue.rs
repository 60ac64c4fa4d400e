/*!
 * Request Queue
 *
 * Unbounded FIFO between arbitrary producer threads and the single
 * serializer consumer. The queue carries its own mutual exclusion; it is
 * the only structure in the crate mutated by multiple threads without a
 * per-instance owner.
 */

use crate::loader::request::LoadRequest;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

pub(crate) struct RequestQueue {
    inner: Mutex<VecDeque<Arc<LoadRequest>>>,
    ready: Condvar,
}

impl RequestQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
            ready: Condvar::new(),
        }
    }

    /// Append a request and signal the consumer.
    pub(crate) fn push(&self, request: Arc<LoadRequest>) {
        let mut queue = self.inner.lock();
        queue.push_back(request);
        self.ready.notify_one();
    }

    /// Pop the oldest request, blocking while the queue is empty.
    pub(crate) fn take(&self) -> Arc<LoadRequest> {
        let mut queue = self.inner.lock();
        loop {
            if let Some(request) = queue.pop_front() {
                return request;
            }
            self.ready.wait(&mut queue);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().len()
    }
}
