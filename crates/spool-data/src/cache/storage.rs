// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A thread-safe cache of loaded handles.

use super::{
    entry::{AssetStatus, CacheEntry},
    flight::{Claim, FlightGuard, FlightTable, FlightWaiter, Lookup},
};
use spool_core::{AssetId, HandleFactory, LoadError};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

struct CacheState<H> {
    entries: HashMap<AssetId, CacheEntry<H>>,
    failures: HashMap<AssetId, LoadError>,
    next_sequence: u64,
}

impl<H> Default for CacheState<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            failures: HashMap::new(),
            next_sequence: 0,
        }
    }
}

/// The mapping from asset id to loaded handle.
///
/// At most one handle is cached per id. Every handle the cache lets go of
/// (overwritten, released, or dropped with the cache) is passed to the
/// factory's [`release_handle`](HandleFactory::release_handle) exactly once.
/// Handles returned by [`get`](Self::get) are clones that stay valid until
/// the cache releases the original.
pub struct AssetCache<F: HandleFactory> {
    factory: Arc<F>,
    state: RwLock<CacheState<F::Handle>>,
    in_flight: FlightTable,
}

impl<F: HandleFactory> AssetCache<F> {
    /// Creates an empty cache that releases handles through `factory`.
    pub fn new(factory: Arc<F>) -> Self {
        Self {
            factory,
            state: RwLock::new(CacheState::default()),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The factory that creates and releases this cache's handles.
    pub fn factory(&self) -> &Arc<F> {
        &self.factory
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState<F::Handle>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState<F::Handle>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the handle cached for `id`, if any.
    pub fn get(&self, id: &str) -> Option<F::Handle> {
        self.read().entries.get(id).map(|entry| entry.handle.clone())
    }

    /// Returns the full entry cached for `id`, if any.
    pub fn entry(&self, id: &str) -> Option<CacheEntry<F::Handle>> {
        self.read().entries.get(id).cloned()
    }

    /// Returns `true` if a handle is cached for `id`.
    pub fn has(&self, id: &str) -> bool {
        self.read().entries.contains_key(id)
    }

    /// Caches `handle` under `id`.
    ///
    /// If a different handle was already cached for `id`, it is released
    /// first. A failure recorded for `id` is cleared.
    pub fn insert(&self, id: AssetId, handle: F::Handle) {
        let previous = {
            let mut state = self.write();
            state.failures.remove(&id);
            let loaded_at = state.next_sequence;
            state.next_sequence += 1;
            state.entries.insert(
                id.clone(),
                CacheEntry {
                    id,
                    handle,
                    loaded_at,
                },
            )
        };

        if let Some(previous) = previous {
            log::debug!("Replacing cached handle for '{}'", previous.id);
            self.factory.release_handle(previous.handle);
        }
    }

    /// Records that the last load of `id` failed.
    ///
    /// A handle already cached for `id` is kept.
    pub fn mark_failed(&self, id: AssetId, error: LoadError) {
        let mut state = self.write();
        if !state.entries.contains_key(&id) {
            state.failures.insert(id, error);
        }
    }

    /// Reports what the cache knows about `id`.
    pub fn status(&self, id: &str) -> AssetStatus<F::Handle> {
        let state = self.read();
        if let Some(entry) = state.entries.get(id) {
            return AssetStatus::Ready(entry.handle.clone());
        }
        if self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
        {
            return AssetStatus::Loading;
        }
        match state.failures.get(id) {
            Some(error) => AssetStatus::Failed(error.clone()),
            None => AssetStatus::Absent,
        }
    }

    /// Looks at `id` without taking ownership of its load.
    pub fn lookup(&self, id: &AssetId) -> Lookup<F::Handle> {
        let state = self.read();
        if let Some(entry) = state.entries.get(id) {
            return Lookup::Cached(entry.handle.clone());
        }
        let in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        match in_flight.get(id) {
            Some(receiver) => Lookup::InFlight(FlightWaiter::new(id.clone(), receiver.clone())),
            None => Lookup::Missing,
        }
    }

    /// Takes ownership of the load of `id`, unless it is cached or already owned.
    ///
    /// The cache lookup and the in-flight registration happen atomically, so
    /// two concurrent claims of the same missing id yield exactly one
    /// [`Claim::Owner`]. A previously failed id is claimable again.
    pub fn claim(&self, id: &AssetId) -> Claim<F::Handle> {
        // Held for the whole claim so that an insert cannot slip between the lookup and the registration.
        let state = self.write();
        if let Some(entry) = state.entries.get(id) {
            return Claim::Cached(entry.handle.clone());
        }

        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(receiver) = in_flight.get(id) {
            return Claim::Waiter(FlightWaiter::new(id.clone(), receiver.clone()));
        }

        let (guard, receiver) = FlightGuard::new(id.clone(), self.in_flight.clone());
        in_flight.insert(id.clone(), receiver);
        Claim::Owner(guard)
    }

    /// Releases and forgets the handle cached for `id`.
    ///
    /// Returns `true` if a handle was released.
    pub fn release(&self, id: &str) -> bool {
        let removed = {
            let mut state = self.write();
            state.failures.remove(id);
            state.entries.remove(id)
        };
        match removed {
            Some(entry) => {
                self.factory.release_handle(entry.handle);
                true
            }
            None => false,
        }
    }

    /// Releases every cached handle and forgets every failure.
    ///
    /// Returns the number of handles released.
    pub fn release_all(&self) -> usize {
        let drained: Vec<_> = {
            let mut state = self.write();
            state.failures.clear();
            state.entries.drain().map(|(_, entry)| entry).collect()
        };
        let count = drained.len();
        for entry in drained {
            self.factory.release_handle(entry.handle);
        }
        if count > 0 {
            log::info!("Released {count} cached asset handles");
        }
        count
    }

    /// The number of cached handles.
    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.read().entries.is_empty()
    }

    /// The ids currently cached, in no particular order.
    pub fn ids(&self) -> Vec<AssetId> {
        self.read().entries.keys().cloned().collect()
    }

    /// The number of loads currently owned by some batch.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<F: HandleFactory> Drop for AssetCache<F> {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        state.failures.clear();
        for (_, entry) in state.entries.drain() {
            self.factory.release_handle(entry.handle);
        }
    }
}

impl<F: HandleFactory> std::fmt::Debug for AssetCache<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache")
            .field("len", &self.len())
            .field("in_flight", &self.in_flight_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FlightOutcome;
    use spool_core::{DecodeError, FetchedAsset};

    #[derive(Default)]
    struct RecordingFactory {
        released: Mutex<Vec<String>>,
    }

    impl HandleFactory for RecordingFactory {
        type Handle = String;

        fn create_handle(&self, id: &AssetId, _asset: FetchedAsset) -> Result<String, DecodeError> {
            Ok(format!("handle:{id}"))
        }

        fn release_handle(&self, handle: String) {
            self.released.lock().unwrap().push(handle);
        }
    }

    fn cache() -> (Arc<RecordingFactory>, AssetCache<RecordingFactory>) {
        let factory = Arc::new(RecordingFactory::default());
        (factory.clone(), AssetCache::new(factory))
    }

    #[test]
    fn insert_then_get() {
        let (_, cache) = cache();
        cache.insert("f0".into(), "h0".into());

        assert!(cache.has("f0"));
        assert_eq!(cache.get("f0").as_deref(), Some("h0"));
        assert_eq!(cache.get("f1"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn overwriting_releases_the_previous_handle() {
        let (factory, cache) = cache();
        cache.insert("f0".into(), "old".into());
        cache.insert("f0".into(), "new".into());

        assert_eq!(cache.get("f0").as_deref(), Some("new"));
        assert_eq!(*factory.released.lock().unwrap(), vec!["old".to_string()]);
    }

    #[test]
    fn entries_record_insertion_order() {
        let (_, cache) = cache();
        cache.insert("a".into(), "ha".into());
        cache.insert("b".into(), "hb".into());
        assert!(cache.entry("a").unwrap().loaded_at < cache.entry("b").unwrap().loaded_at);
    }

    #[test]
    fn release_all_releases_each_handle_once() {
        let (factory, cache) = cache();
        cache.insert("a".into(), "ha".into());
        cache.insert("b".into(), "hb".into());

        assert_eq!(cache.release_all(), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.release_all(), 0);

        let mut released = factory.released.lock().unwrap().clone();
        released.sort();
        assert_eq!(released, vec!["ha".to_string(), "hb".to_string()]);
    }

    #[test]
    fn dropping_the_cache_releases_handles() {
        let (factory, cache) = cache();
        cache.insert("a".into(), "ha".into());
        drop(cache);
        assert_eq!(*factory.released.lock().unwrap(), vec!["ha".to_string()]);
    }

    #[test]
    fn release_forgets_one_id() {
        let (factory, cache) = cache();
        cache.insert("a".into(), "ha".into());
        assert!(cache.release("a"));
        assert!(!cache.release("a"));
        assert!(matches!(cache.status("a"), AssetStatus::Absent));
        assert_eq!(factory.released.lock().unwrap().len(), 1);
    }

    #[test]
    fn failed_ids_are_reported_and_cleared_by_a_later_insert() {
        let (_, cache) = cache();
        cache.mark_failed("a".into(), DecodeError::Empty.into());

        assert!(cache.status("a").is_failed());
        assert_eq!(cache.get("a"), None);

        cache.insert("a".into(), "ha".into());
        assert!(cache.status("a").is_ready());
    }

    #[test]
    fn second_claim_waits_on_the_first() {
        let (_, cache) = cache();
        let id = AssetId::from("a");

        let owner = match cache.claim(&id) {
            Claim::Owner(guard) => guard,
            other => panic!("expected ownership, got {other:?}"),
        };
        assert!(matches!(cache.claim(&id), Claim::Waiter(_)));
        assert!(matches!(cache.lookup(&id), Lookup::InFlight(_)));
        assert!(matches!(cache.status("a"), AssetStatus::Loading));

        cache.insert(id.clone(), "ha".into());
        owner.finish(FlightOutcome::Loaded);

        assert_eq!(cache.in_flight_count(), 0);
        assert!(matches!(cache.claim(&id), Claim::Cached(h) if h == "ha"));
    }

    #[test]
    fn failed_ids_can_be_claimed_again() {
        let (_, cache) = cache();
        let id = AssetId::from("a");
        cache.mark_failed(id.clone(), DecodeError::Empty.into());
        assert!(matches!(cache.claim(&id), Claim::Owner(_)));
    }

    #[tokio::test]
    async fn waiters_observe_the_outcome() {
        let (_, cache) = cache();
        let id = AssetId::from("a");

        let Claim::Owner(owner) = cache.claim(&id) else {
            panic!("expected ownership");
        };
        let Claim::Waiter(waiter) = cache.claim(&id) else {
            panic!("expected a waiter");
        };

        let waiting = tokio::spawn(waiter.wait());
        owner.finish(FlightOutcome::Failed(DecodeError::Empty.into()));

        assert!(matches!(waiting.await.unwrap(), FlightOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn dropped_owner_abandons_the_load() {
        let (_, cache) = cache();
        let id = AssetId::from("a");

        let Claim::Owner(owner) = cache.claim(&id) else {
            panic!("expected ownership");
        };
        let Lookup::InFlight(waiter) = cache.lookup(&id) else {
            panic!("expected an in-flight load");
        };

        drop(owner);
        assert!(matches!(waiter.wait().await, FlightOutcome::Abandoned));
        assert!(matches!(cache.claim(&id), Claim::Owner(_)));
    }
}
