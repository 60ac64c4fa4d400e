/*!
 * Loader
 *
 * A node in the delegation hierarchy: public resolution API, reserved-prefix
 * filtering, and the re-entrancy hazard state machine.
 *
 * # The Hazard
 *
 * The embedding runtime acquires a loader's lock around its re-entrant
 * callback hooks, so a resolution can start while the calling thread already
 * holds the lock of the very loader being asked. Two loaders re-entered that
 * way from two threads can cross-acquire each other's locks and deadlock.
 * Per invocation the machine distinguishes three states:
 *
 * - unlocked: run the delegate inline on the calling thread
 * - locked, on the serializer thread: inline (the serializer is the only
 *   thread allowed to hold a second loader lock, and it cannot deadlock
 *   against itself)
 * - locked elsewhere: the hazard. Either hand the request to the serializer
 *   and park until it completes, or (lockless strategy) fully release the
 *   held lock around the nested call and restore it after.
 */

use crate::core::errors::{LoadError, Result};
use crate::core::sync::{Hold, ReentrantLock};
use crate::core::types::{ResourceRef, UnitHandle};
use crate::loader::config::{LoaderConfig, ResolvedStrategy};
use crate::loader::context::ContextProvider;
use crate::loader::delegate::ResourceDelegate;
use crate::loader::request::LoadRequest;
use crate::loader::serializer;
use crate::loader::storage::LocalStorage;
use crate::loader::system::SystemPolicy;
use log::trace;
use std::io::Read;
use std::sync::{Arc, Weak};

/// A concurrent, hierarchically-delegating unit loader.
///
/// Always handled as `Arc<Loader>`; construction goes through
/// [`LoaderBuilder`]. A loader should only be delegated to by other loaders
/// built on this machinery: holding an unrelated lock while calling into a
/// loader reintroduces the deadlock this design removes.
pub struct Loader {
    label: String,
    parent: Option<Arc<Loader>>,
    delegate: Arc<dyn ResourceDelegate>,
    system: Arc<SystemPolicy>,
    strategy: ResolvedStrategy,
    context_provider: Option<Arc<dyn ContextProvider>>,
    lock: ReentrantLock,
    storage: LocalStorage,
    self_ref: Weak<Loader>,
}

/// Builder for [`Loader`] instances.
pub struct LoaderBuilder {
    label: Option<String>,
    parent: Option<Arc<Loader>>,
    delegate: Arc<dyn ResourceDelegate>,
    system: Option<Arc<SystemPolicy>>,
    config: LoaderConfig,
    context_provider: Option<Arc<dyn ContextProvider>>,
}

impl LoaderBuilder {
    /// Start a builder around the delegate that backs the loader.
    pub fn new(delegate: Arc<dyn ResourceDelegate>) -> Self {
        Self {
            label: None,
            parent: None,
            delegate,
            system: None,
            config: LoaderConfig::default(),
            context_provider: None,
        }
    }

    /// Human-readable label used in log output.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Parent loader in the delegation tree. Structural only: the parent's
    /// lifecycle is shared, not owned, and delegation to it is the
    /// delegate's business.
    pub fn parent(mut self, parent: Arc<Loader>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Reserved-prefix tables and system fallback, usually shared by every
    /// loader in a tree. Defaults to empty tables over a fallback that
    /// resolves nothing.
    pub fn system(mut self, system: Arc<SystemPolicy>) -> Self {
        self.system = Some(system);
        self
    }

    /// Hazard-strategy configuration; defaults to the process-wide probe.
    pub fn config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Hook capturing ambient caller state into hand-off requests.
    pub fn context_provider(mut self, provider: Arc<dyn ContextProvider>) -> Self {
        self.context_provider = Some(provider);
        self
    }

    /// Build the loader.
    pub fn build(self) -> Arc<Loader> {
        let strategy = self.config.resolve();
        Arc::new_cyclic(|self_ref| Loader {
            label: self.label.unwrap_or_else(|| "loader".to_string()),
            parent: self.parent,
            delegate: self.delegate,
            system: self.system.unwrap_or_else(|| Arc::new(SystemPolicy::empty())),
            strategy,
            context_provider: self.context_provider,
            lock: ReentrantLock::new(),
            storage: LocalStorage::new(),
            self_ref: self_ref.clone(),
        })
    }
}

/// The loader's lock, held for the guard's lifetime.
///
/// This is the same lock the embedding runtime takes around its re-entrant
/// callback hooks; tests and embedders use it to reproduce that state.
#[must_use = "dropping the guard immediately releases the loader lock"]
pub struct LoaderGuard<'a> {
    _hold: Hold<'a>,
}

impl Loader {
    /// Resolve the unit with the given binary name.
    ///
    /// Reserved-prefix names route unconditionally to the system fallback,
    /// bypassing the hazard machinery; everything else runs the checked
    /// resolution. `exports_only` restricts the delegate's search to
    /// exported units, `link` asks it to eagerly link after loading.
    pub fn resolve(&self, name: &str, exports_only: bool, link: bool) -> Result<UnitHandle> {
        if name.is_empty() {
            return Err(LoadError::invalid_name("empty unit name"));
        }
        if let Some(prefix) = self.system.match_unit_prefix(name) {
            trace!(
                "{}: unit {} reserved by prefix {}, routed to system fallback",
                self.label,
                name,
                prefix
            );
            return self.system.fallback().find_system_unit(name);
        }
        self.resolve_checked(name, exports_only, link)
    }

    /// Resolve considering all units, without eager linking.
    pub fn resolve_unit(&self, name: &str) -> Result<UnitHandle> {
        self.resolve(name, false, false)
    }

    /// Resolve considering all units, linking eagerly.
    pub fn resolve_unit_linked(&self, name: &str) -> Result<UnitHandle> {
        self.resolve(name, false, true)
    }

    /// Resolve considering only exported units.
    pub fn resolve_exported(&self, name: &str) -> Result<UnitHandle> {
        self.resolve(name, true, false)
    }

    /// Resolve considering only exported units, linking eagerly.
    pub fn resolve_exported_linked(&self, name: &str) -> Result<UnitHandle> {
        self.resolve(name, true, true)
    }

    /// The checked resolution: hazard detection and strategy dispatch.
    /// Prefix filtering has already happened by the time this runs.
    pub(crate) fn resolve_checked(&self, name: &str, exports_only: bool, link: bool) -> Result<UnitHandle> {
        if self.lock.is_held_by_current_thread() {
            match self.strategy {
                ResolvedStrategy::Lockless => {
                    trace!(
                        "{}: re-entrant resolution of {}, releasing the lock around the nested call",
                        self.label,
                        name
                    );
                    return self
                        .lock
                        .with_fully_released(|| self.resolve_checked(name, exports_only, link));
                }
                ResolvedStrategy::Handoff => {
                    if !serializer::is_serializer_thread() {
                        return self.hand_off(name, exports_only, link);
                    }
                }
            }
        }
        // No deadlock risk: either the lock is free, or this is the
        // serializer thread.
        self.delegate.lookup_unit(name, exports_only, link)
    }

    /// Queue the resolution for the serializer and park on this loader's
    /// own condition until that specific request completes. The serializer
    /// broadcasts per loader, so the wait re-checks this request's flag
    /// across wakeups meant for other requests.
    fn hand_off(&self, name: &str, exports_only: bool, link: bool) -> Result<UnitHandle> {
        let context = self.context_provider.as_ref().map(|provider| provider.capture());
        let this = self
            .self_ref
            .upgrade()
            .expect("loader invoked after its last Arc was dropped");
        let request = Arc::new(LoadRequest::new(name, exports_only, link, this, context));

        trace!(
            "{}: re-entrant resolution of {} handed off to the serializer",
            self.label,
            name
        );
        serializer::handle().submit(Arc::clone(&request));
        self.lock.wait_until(|| request.is_done());
        request.take_result()
    }

    /// Locate a single resource, or the system fallback's answer for
    /// reserved paths. Absence is `None`, never a failure.
    ///
    /// Resource entry points are never re-entered through the runtime's
    /// callback machinery, so they run synchronously on the calling thread
    /// with no hazard handling.
    pub fn resource(&self, name: &str) -> Option<ResourceRef> {
        if let Some(prefix) = self.system.match_resource_prefix(name) {
            trace!(
                "{}: resource {} reserved by prefix {}, routed to system fallback",
                self.label,
                name,
                prefix
            );
            return self.system.fallback().get_system_resource(name);
        }
        self.delegate.lookup_resource(name, false)
    }

    /// Locate every matching resource; the empty vector means none.
    pub fn resources(&self, name: &str) -> Vec<ResourceRef> {
        if let Some(prefix) = self.system.match_resource_prefix(name) {
            trace!(
                "{}: resources {} reserved by prefix {}, routed to system fallback",
                self.label,
                name,
                prefix
            );
            return self.system.fallback().get_system_resources(name);
        }
        self.delegate.lookup_all_resources(name, false)
    }

    /// Open a single resource's content as a stream.
    pub fn resource_stream(&self, name: &str) -> Option<Box<dyn Read + Send>> {
        if let Some(prefix) = self.system.match_resource_prefix(name) {
            trace!(
                "{}: resource stream {} reserved by prefix {}, routed to system fallback",
                self.label,
                name,
                prefix
            );
            return self.system.fallback().get_system_resource_as_stream(name);
        }
        self.delegate.lookup_resource_stream(name, false)
    }

    /// Acquire this loader's lock, the way the embedding runtime does around
    /// its re-entrant callback hooks. Guards nest on the owning thread.
    pub fn enter(&self) -> LoaderGuard<'_> {
        LoaderGuard {
            _hold: self.lock.acquire(),
        }
    }

    /// True when the calling thread holds this loader's lock, at any depth.
    pub fn holds_lock(&self) -> bool {
        self.lock.is_held_by_current_thread()
    }

    /// Caller-defined metadata attached to this loader.
    pub fn metadata(&self) -> &LocalStorage {
        &self.storage
    }

    /// The parent loader, when this node has one.
    pub fn parent(&self) -> Option<&Arc<Loader>> {
        self.parent.as_ref()
    }

    /// The label used in log output.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn raw_lock(&self) -> &ReentrantLock {
        &self.lock
    }
}
