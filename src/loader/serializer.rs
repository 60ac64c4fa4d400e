/*!
 * Serializer Worker
 *
 * The one process-wide thread allowed to execute a resolution while a
 * different loader's lock is already held one level up. Every hazardous
 * resolution funnels through its FIFO queue, so at most one thread in the
 * process ever holds more than one loader lock at a time, and that thread
 * is always this one. A lock-order cycle needs two such threads; with one,
 * cycles are impossible by construction.
 *
 * The worker is started lazily on the first hand-off and never terminates.
 * A failure inside one iteration is logged and counted, never allowed to
 * end the loop: a dead serializer would deadlock the whole process.
 */

use crate::core::errors::{LoadError, Result};
use crate::core::types::UnitHandle;
use crate::loader::queue::RequestQueue;
use crate::loader::request::LoadRequest;
use log::{error, info, warn};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};

static SERIALIZER: OnceLock<SerializerHandle> = OnceLock::new();
static FAILURES: AtomicU64 = AtomicU64::new(0);

pub(crate) struct SerializerHandle {
    queue: Arc<RequestQueue>,
    thread_id: ThreadId,
}

impl SerializerHandle {
    pub(crate) fn submit(&self, request: Arc<LoadRequest>) {
        self.queue.push(request);
    }
}

/// The process-wide serializer, started on first use.
pub(crate) fn handle() -> &'static SerializerHandle {
    SERIALIZER.get_or_init(|| {
        let queue = Arc::new(RequestQueue::new());
        let worker_queue = Arc::clone(&queue);
        let thread = thread::Builder::new()
            .name("loader-serializer".into())
            .spawn(move || run(worker_queue))
            .expect("failed to spawn the loader serializer thread");
        info!("loader serializer thread started");
        SerializerHandle {
            queue,
            thread_id: thread.thread().id(),
        }
    })
}

/// True when the calling thread is the serializer itself. False before the
/// worker has ever been started; asking must not start it.
pub(crate) fn is_serializer_thread() -> bool {
    SERIALIZER
        .get()
        .map(|serializer| serializer.thread_id == thread::current().id())
        .unwrap_or(false)
}

/// Number of unexpected failures absorbed by the serializer loop so far.
///
/// The loop never exits on failure; this counter is the observable trace
/// that something went wrong inside it.
pub fn serializer_failures() -> u64 {
    FAILURES.load(Ordering::Relaxed)
}

fn run(queue: Arc<RequestQueue>) {
    loop {
        let request = queue.take();
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| serve(&request))) {
            FAILURES.fetch_add(1, Ordering::Relaxed);
            error!(
                "serializer iteration failed for unit {}: {}",
                request.name(),
                panic_message(payload.as_ref())
            );
        }
    }
}

/// Execute one request under the target loader's lock. Whatever the
/// outcome, the requester is completed and every waiter on the loader is
/// woken; waiters re-check their own request's flag, since several requests
/// may target the same loader in sequence.
fn serve(request: &Arc<LoadRequest>) {
    let loader = request.loader();
    let _hold = loader.raw_lock().acquire();

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| execute(request))).unwrap_or_else(|payload| {
        FAILURES.fetch_add(1, Ordering::Relaxed);
        let message = panic_message(payload.as_ref());
        warn!("resolution of {} failed on the serializer thread: {}", request.name(), message);
        Err(LoadError::worker(message))
    });

    request.complete(outcome);
    loader.raw_lock().notify_all();
}

/// Re-run the checked resolution, now on the serializer thread, under the
/// request's captured invocation context when one was taken.
fn execute(request: &Arc<LoadRequest>) -> Result<UnitHandle> {
    let loader = request.loader();
    match request.context() {
        Some(context) => {
            let mut outcome = None;
            context.run(&mut || {
                outcome = Some(loader.resolve_checked(
                    request.name(),
                    request.exports_only(),
                    request.link(),
                ));
            });
            outcome.unwrap_or_else(|| {
                Err(LoadError::worker("invocation context did not run the resolution"))
            })
        }
        None => loader.resolve_checked(request.name(), request.exports_only(), request.link()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unidentified panic".to_string()
    }
}
