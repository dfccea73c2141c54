//! Bridge façade orchestrating identity tracking, caching, and lifecycle
//! gating.
//!
//! Hosts call [`Bridge::save`] from a target's save path and
//! [`Bridge::restore`] from a fresh instance's restore path, passing the same
//! carrier bag the host hands back across recreation. The bridge stamps the
//! target's identifier into the carrier under a key derived from the target's
//! type name, so a fresh instance with no in-memory identity can still recover
//! its state.
//!
//! All operations are synchronous. Registry, cache, and gate share one mutex;
//! provider callbacks run outside it, and a restored bag is fetched and
//! deleted inside the same critical section so two racing restores can never
//! both consume it.

use crate::cache::StateCache;
use crate::lifecycle::LifecycleGate;
use crate::registry::IdentityRegistry;
use crate::serialization::RecordCodec;
use rehydrate_core::{BagTransform, NoopTransform, SavedState, StateBag, StateCodec, TargetId};
use rehydrate_persistence::DurableStore;
use std::any::type_name;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Narrow listener for the two host lifecycle events the bridge reacts to.
///
/// The host delivers these for every top-level container it manages, in
/// creation/destruction order. The container itself is not part of the
/// contract; the gate only needs the event kind and its flag.
pub trait LifecycleObserver: Send + Sync {
    /// A top-level container was created. `has_prior_state` is true when the
    /// host is restoring the container from saved instance state.
    fn on_container_created(&self, has_prior_state: bool);

    /// A top-level container was destroyed. `is_finishing` is true when the
    /// container is being genuinely dismissed rather than torn down for an
    /// imminent recreation.
    fn on_container_destroyed(&self, is_finishing: bool);
}

/// Façade over the identity registry, state cache, and lifecycle gate.
///
/// Cheaply cloneable; clones share all state.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<Mutex<Inner>>,
    store: Arc<dyn DurableStore>,
    transform: Arc<dyn BagTransform>,
}

struct Inner {
    registry: IdentityRegistry,
    cache: StateCache,
    gate: LifecycleGate,
}

/// Carrier key under which a target type's identifier is stamped.
fn carrier_key<T>() -> String {
    format!("uuid_{}", type_name::<T>())
}

impl Bridge {
    /// Create a bridge over `store` using the default
    /// [`RecordCodec`](crate::serialization::RecordCodec).
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self::with_codec(store, Arc::new(RecordCodec))
    }

    /// Create a bridge over `store` with an explicit codec.
    pub fn with_codec(store: Arc<dyn DurableStore>, codec: Arc<dyn StateCodec>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                registry: IdentityRegistry::new(),
                cache: StateCache::new(store.clone(), codec),
                gate: LifecycleGate::new(),
            })),
            store,
            transform: Arc::new(NoopTransform),
        }
    }

    /// Replace the wrap/unwrap transform applied around provider calls.
    pub fn with_transform(mut self, transform: Arc<dyn BagTransform>) -> Self {
        self.transform = transform;
        self
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Preserve `target`'s state, stamping its identifier into `carrier`.
    ///
    /// Allocates a fresh identifier on the first save for this instance. If
    /// the target produces an empty bag, neither the cache nor the durable
    /// store is touched; previously saved state for the identifier, if any,
    /// remains until cleared or consumed.
    pub fn save<T>(&self, target: &Arc<T>, carrier: &mut StateBag)
    where
        T: SavedState + 'static,
    {
        let target_dyn: Arc<dyn SavedState> = target.clone();
        let id = self.inner().registry.resolve_or_allocate(&target_dyn);
        carrier.put_text(carrier_key::<T>(), id.as_str());

        let mut bag = StateBag::new();
        target.save_state(&mut bag);
        if bag.is_empty() {
            tracing::debug!(id = %id, "target produced no state; skipping save");
            return;
        }
        self.transform.wrap(&mut bag);

        self.inner().cache.put(&id, bag);
        tracing::debug!(id = %id, "saved state bag");
    }

    /// Restore `target`'s state from `carrier`, consuming the saved bag.
    ///
    /// A missing carrier, missing identifier, or missing bag is an ordinary
    /// no-op. After a successful restore the identifier's cache entry and
    /// durable record are gone; a second restore delivers nothing.
    pub fn restore<T>(&self, target: &Arc<T>, carrier: Option<&StateBag>)
    where
        T: SavedState + 'static,
    {
        let Some(carrier) = carrier else {
            return;
        };
        let target_dyn: Arc<dyn SavedState> = target.clone();

        let (id, bag) = {
            let mut inner = self.inner();
            let id = match inner.registry.resolve(&target_dyn) {
                Some(id) => id,
                None => match carrier.get_text(&carrier_key::<T>()) {
                    Some(raw) => TargetId::from(raw),
                    None => return,
                },
            };
            inner.registry.track(&target_dyn, id.clone());
            let Some(bag) = inner.cache.get(&id) else {
                return;
            };
            // Consumed under the same lock as the fetch.
            inner.cache.remove(&id);
            (id, bag)
        };

        let mut bag = bag;
        self.transform.unwrap(&mut bag);
        target.restore_state(&bag);
        tracing::debug!(id = %id, "restored state bag");
    }

    /// Forget `target` and delete its saved state, if the lifecycle gate
    /// currently permits clearing.
    pub fn clear<T>(&self, target: &Arc<T>)
    where
        T: SavedState + 'static,
    {
        let target_dyn: Arc<dyn SavedState> = target.clone();
        let mut inner = self.inner();
        if !inner.gate.clearing_allowed() {
            return;
        }
        let Some(id) = inner.registry.untrack(&target_dyn) else {
            return;
        };
        inner.cache.remove(&id);
        tracing::debug!(id = %id, "cleared state");
    }

    /// Unconditionally drop every tracked identifier, cached bag, and durable
    /// record.
    pub fn clear_all(&self) {
        let mut inner = self.inner();
        inner.registry.clear();
        inner.cache.clear_memory();
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear durable store");
        }
    }
}

impl LifecycleObserver for Bridge {
    fn on_container_created(&self, has_prior_state: bool) {
        let wipe = self.inner().gate.on_container_created(has_prior_state);
        if wipe {
            tracing::debug!("first container of a fresh process run; wiping durable store");
            if let Err(e) = self.store.clear() {
                tracing::warn!(error = %e, "failed to wipe durable store");
            }
        }
    }

    fn on_container_destroyed(&self, is_finishing: bool) {
        self.inner().gate.on_container_destroyed(is_finishing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rehydrate_core::{StateValue, WrappedValue};
    use rehydrate_persistence::InMemoryStore;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Screen {
        name: Mutex<String>,
        count: Mutex<i64>,
        restores: Mutex<usize>,
    }

    impl Screen {
        fn with_state(name: &str, count: i64) -> Arc<Self> {
            let screen = Screen::default();
            *screen.name.lock().unwrap() = name.to_string();
            *screen.count.lock().unwrap() = count;
            Arc::new(screen)
        }

        fn restores(&self) -> usize {
            *self.restores.lock().unwrap()
        }
    }

    impl SavedState for Screen {
        fn save_state(&self, out: &mut StateBag) {
            let name = self.name.lock().unwrap();
            if !name.is_empty() {
                out.put_text("name", name.clone());
            }
            let count = *self.count.lock().unwrap();
            if count != 0 {
                out.put_int("count", count);
            }
        }

        fn restore_state(&self, state: &StateBag) {
            *self.restores.lock().unwrap() += 1;
            if let Some(name) = state.get_text("name") {
                *self.name.lock().unwrap() = name.to_string();
            }
            if let Some(count) = state.get_int("count") {
                *self.count.lock().unwrap() = count;
            }
        }
    }

    fn test_bridge() -> (Bridge, InMemoryStore) {
        let store = InMemoryStore::new();
        (Bridge::new(Arc::new(store.clone())), store)
    }

    fn stamped_id(carrier: &StateBag) -> &str {
        carrier.get_text(&carrier_key::<Screen>()).unwrap()
    }

    #[test]
    fn test_round_trip() {
        let (bridge, _store) = test_bridge();
        let mut carrier = StateBag::new();

        let old = Screen::with_state("home", 3);
        bridge.save(&old, &mut carrier);
        drop(old);

        let fresh = Arc::new(Screen::default());
        bridge.restore(&fresh, Some(&carrier));
        assert_eq!(*fresh.name.lock().unwrap(), "home");
        assert_eq!(*fresh.count.lock().unwrap(), 3);
        assert_eq!(fresh.restores(), 1);
    }

    #[test]
    fn test_restore_consumes_state() {
        let (bridge, store) = test_bridge();
        let mut carrier = StateBag::new();

        bridge.save(&Screen::with_state("home", 3), &mut carrier);
        let first = Arc::new(Screen::default());
        bridge.restore(&first, Some(&carrier));
        assert_eq!(first.restores(), 1);
        assert!(store.is_empty());

        let second = Arc::new(Screen::default());
        bridge.restore(&second, Some(&carrier));
        assert_eq!(second.restores(), 0);
        assert_eq!(*second.name.lock().unwrap(), "");
    }

    #[test]
    fn test_restore_without_carrier_is_noop() {
        let (bridge, _store) = test_bridge();
        let screen = Arc::new(Screen::default());
        bridge.restore(&screen, None);
        assert_eq!(screen.restores(), 0);
    }

    #[test]
    fn test_restore_with_unstamped_carrier_is_noop() {
        let (bridge, _store) = test_bridge();
        let screen = Arc::new(Screen::default());
        bridge.restore(&screen, Some(&StateBag::new()));
        assert_eq!(screen.restores(), 0);
    }

    #[test]
    fn test_empty_bag_is_not_persisted() {
        let (bridge, store) = test_bridge();
        let mut carrier = StateBag::new();

        bridge.save(&Arc::new(Screen::default()), &mut carrier);

        // The identifier is still stamped, but nothing was stored.
        let id = stamped_id(&carrier);
        assert!(store.get(&format!("bundle_{}", id)).unwrap().is_none());

        let fresh = Arc::new(Screen::default());
        bridge.restore(&fresh, Some(&carrier));
        assert_eq!(fresh.restores(), 0);
    }

    #[test]
    fn test_empty_save_keeps_prior_state() {
        let (bridge, _store) = test_bridge();
        let mut carrier = StateBag::new();

        let screen = Screen::with_state("home", 3);
        bridge.save(&screen, &mut carrier);

        // A later save that produces nothing leaves the earlier state alone;
        // stale data is only removed by clear/clear_all or consumption.
        *screen.name.lock().unwrap() = String::new();
        *screen.count.lock().unwrap() = 0;
        bridge.save(&screen, &mut carrier);
        drop(screen);

        let fresh = Arc::new(Screen::default());
        bridge.restore(&fresh, Some(&carrier));
        assert_eq!(*fresh.name.lock().unwrap(), "home");
        assert_eq!(fresh.restores(), 1);
    }

    #[test]
    fn test_save_overwrites_previous_state() {
        let (bridge, _store) = test_bridge();
        let mut carrier = StateBag::new();

        let screen = Screen::with_state("home", 1);
        bridge.save(&screen, &mut carrier);
        *screen.count.lock().unwrap() = 2;
        bridge.save(&screen, &mut carrier);

        let fresh = Arc::new(Screen::default());
        bridge.restore(&fresh, Some(&carrier));
        assert_eq!(*fresh.count.lock().unwrap(), 2);
        assert_eq!(fresh.restores(), 1);
    }

    #[test]
    fn test_identifier_is_stable_across_saves() {
        let (bridge, _store) = test_bridge();
        let screen = Screen::with_state("home", 1);

        let mut first = StateBag::new();
        bridge.save(&screen, &mut first);
        let mut second = StateBag::new();
        bridge.save(&screen, &mut second);

        assert_eq!(stamped_id(&first), stamped_id(&second));
    }

    #[test]
    fn test_state_outlives_instance() {
        let (bridge, store) = test_bridge();
        let mut carrier = StateBag::new();

        let screen = Screen::with_state("home", 3);
        bridge.save(&screen, &mut carrier);
        let id = stamped_id(&carrier).to_string();
        drop(screen);

        // Persistence is keyed by identifier, not instance liveness.
        assert!(store.get(&format!("bundle_{}", id)).unwrap().is_some());

        let fresh = Arc::new(Screen::default());
        bridge.restore(&fresh, Some(&carrier));
        assert_eq!(*fresh.name.lock().unwrap(), "home");
    }

    #[test]
    fn test_clear_before_any_lifecycle_event_is_noop() {
        let (bridge, _store) = test_bridge();
        let mut carrier = StateBag::new();

        let screen = Screen::with_state("home", 3);
        bridge.save(&screen, &mut carrier);
        bridge.clear(&screen);

        let fresh = Arc::new(Screen::default());
        bridge.restore(&fresh, Some(&carrier));
        assert_eq!(fresh.restores(), 1);
    }

    #[test]
    fn test_configuration_change_suppresses_clear() {
        let (bridge, _store) = test_bridge();
        let mut carrier = StateBag::new();

        bridge.on_container_created(false);
        let screen = Screen::with_state("home", 3);
        bridge.save(&screen, &mut carrier);

        // Teardown for recreation, not a genuine finish. The clear the host
        // issues during teardown must not discard the saved state.
        bridge.on_container_destroyed(false);
        bridge.clear(&screen);
        drop(screen);
        bridge.on_container_created(true);

        let fresh = Arc::new(Screen::default());
        bridge.restore(&fresh, Some(&carrier));
        assert_eq!(*fresh.name.lock().unwrap(), "home");
        assert_eq!(fresh.restores(), 1);
    }

    #[test]
    fn test_finishing_destruction_allows_clear() {
        let (bridge, store) = test_bridge();
        let mut carrier = StateBag::new();

        bridge.on_container_created(false);
        let screen = Screen::with_state("home", 3);
        bridge.save(&screen, &mut carrier);

        bridge.on_container_destroyed(true);
        bridge.clear(&screen);
        assert!(store.is_empty());

        let fresh = Arc::new(Screen::default());
        bridge.restore(&fresh, Some(&carrier));
        assert_eq!(fresh.restores(), 0);
    }

    #[test]
    fn test_first_run_wipes_stale_records() {
        let store = InMemoryStore::new();
        let mut carrier = StateBag::new();

        // Earlier process generation leaves a record behind.
        {
            let bridge = Bridge::new(Arc::new(store.clone()));
            bridge.save(&Screen::with_state("home", 3), &mut carrier);
        }
        assert_eq!(store.len(), 1);

        // Fresh process run: first container has no prior saved state.
        let bridge = Bridge::new(Arc::new(store.clone()));
        bridge.on_container_created(false);
        assert!(store.is_empty());

        let fresh = Arc::new(Screen::default());
        bridge.restore(&fresh, Some(&carrier));
        assert_eq!(fresh.restores(), 0);
    }

    #[test]
    fn test_process_death_restoration_keeps_records() {
        let store = InMemoryStore::new();
        let mut carrier = StateBag::new();

        {
            let bridge = Bridge::new(Arc::new(store.clone()));
            bridge.save(&Screen::with_state("home", 3), &mut carrier);
        }

        // Fresh process run restoring saved instance state: records survive
        // and the carrier-recovered identifier finds them.
        let bridge = Bridge::new(Arc::new(store.clone()));
        bridge.on_container_created(true);

        let fresh = Arc::new(Screen::default());
        bridge.restore(&fresh, Some(&carrier));
        assert_eq!(*fresh.name.lock().unwrap(), "home");
        assert_eq!(*fresh.count.lock().unwrap(), 3);
    }

    #[test]
    fn test_clear_all() {
        let (bridge, store) = test_bridge();
        let mut carrier = StateBag::new();

        let screen = Screen::with_state("home", 3);
        bridge.save(&screen, &mut carrier);
        bridge.clear_all();

        assert!(store.is_empty());
        let fresh = Arc::new(Screen::default());
        bridge.restore(&fresh, Some(&carrier));
        assert_eq!(fresh.restores(), 0);

        // The cleared instance gets a fresh identifier on its next save.
        let mut second = StateBag::new();
        bridge.save(&screen, &mut second);
        assert_ne!(stamped_id(&carrier), stamped_id(&second));
    }

    #[test]
    fn test_file_store_round_trip_across_process_death() {
        use rehydrate_persistence::FileStore;
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let mut carrier = StateBag::new();

        // First process run: save, then the whole bridge goes away.
        {
            let store = Arc::new(FileStore::open(temp_dir.path()).unwrap());
            let bridge = Bridge::new(store);
            bridge.on_container_created(false);
            bridge.save(&Screen::with_state("home", 3), &mut carrier);
        }

        // Next run reopens the same directory and restores from it.
        let store = Arc::new(FileStore::open(temp_dir.path()).unwrap());
        let bridge = Bridge::new(store.clone());
        bridge.on_container_created(true);

        let fresh = Arc::new(Screen::default());
        bridge.restore(&fresh, Some(&carrier));
        assert_eq!(*fresh.name.lock().unwrap(), "home");
        assert_eq!(*fresh.count.lock().unwrap(), 3);
        assert_eq!(fresh.restores(), 1);

        // Consumed: the durable record is gone from disk too.
        let id = stamped_id(&carrier);
        assert!(store.get(&format!("bundle_{}", id)).unwrap().is_none());
    }

    struct TextWrapper;

    impl BagTransform for TextWrapper {
        fn wrap(&self, bag: &mut StateBag) {
            for value in bag.values_mut() {
                if let StateValue::Text(text) = value {
                    *value = StateValue::Wrapped(WrappedValue {
                        kind: "text".to_string(),
                        payload: text.clone().into_bytes(),
                    });
                }
            }
        }

        fn unwrap(&self, bag: &mut StateBag) {
            for value in bag.values_mut() {
                if let StateValue::Wrapped(wrapped) = value {
                    if wrapped.kind == "text" {
                        let text = String::from_utf8(wrapped.payload.clone()).unwrap();
                        *value = StateValue::Text(text);
                    }
                }
            }
        }
    }

    #[test]
    fn test_transform_wraps_and_unwraps_around_providers() {
        let store = InMemoryStore::new();
        let bridge = Bridge::new(Arc::new(store.clone())).with_transform(Arc::new(TextWrapper));
        let mut carrier = StateBag::new();

        bridge.save(&Screen::with_state("home", 3), &mut carrier);

        let fresh = Arc::new(Screen::default());
        bridge.restore(&fresh, Some(&carrier));
        assert_eq!(*fresh.name.lock().unwrap(), "home");
        assert_eq!(*fresh.count.lock().unwrap(), 3);
    }
}
