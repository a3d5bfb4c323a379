//! Read-through cache of ideal ranges, keyed by client and parameter.
//!
//! Entries live for a fixed TTL. Absent ranges are not cached, so a client
//! provisioned later is picked up on its next message. Updates go through
//! the store first and then replace the cached entry.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use mycohub_domain::client::ClientId;
use mycohub_domain::error::MycoError;
use mycohub_domain::ideal_range::{IdealRange, ParameterKind};
use tokio::time::Instant;

use crate::gateway::PersistenceGateway;
use crate::ports::IdealRangeRepository;

type Key = (ClientId, ParameterKind);

pub struct ConfigCache<S> {
    gateway: Rc<PersistenceGateway<S>>,
    ttl: Duration,
    entries: RefCell<HashMap<Key, (IdealRange, Instant)>>,
}

impl<S: IdealRangeRepository> ConfigCache<S> {
    pub fn new(gateway: Rc<PersistenceGateway<S>>, ttl: Duration) -> Self {
        Self {
            gateway,
            ttl,
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Current range for `client_id`, served from cache while fresh.
    ///
    /// # Errors
    ///
    /// Propagates the store error once the gateway gives up.
    pub async fn ideal_range(
        &self,
        client_id: &ClientId,
        kind: ParameterKind,
    ) -> Result<Option<IdealRange>, MycoError> {
        let key = (client_id.clone(), kind);
        if let Some(range) = self.fresh(&key) {
            return Ok(Some(range));
        }

        let loaded = self
            .gateway
            .read("latest_ideal_range", async |store| {
                store.latest_ideal_range(client_id, kind).await
            })
            .await?;

        if let Some(range) = &loaded {
            self.entries
                .borrow_mut()
                .insert(key, (range.clone(), Instant::now()));
        }
        Ok(loaded)
    }

    /// Persist `range` as the current one and refresh the cache.
    ///
    /// # Errors
    ///
    /// Propagates the store error; the cache is left untouched in that case.
    pub async fn update_ideal_range(&self, range: IdealRange) -> Result<IdealRange, MycoError> {
        let saved = self
            .gateway
            .write("save_ideal_range", async |store| {
                store.save_ideal_range(range.clone()).await
            })
            .await?;

        self.entries.borrow_mut().insert(
            (saved.client_id.clone(), saved.kind),
            (saved.clone(), Instant::now()),
        );
        tracing::debug!(client_id = %saved.client_id, kind = %saved.kind, "ideal range updated");
        Ok(saved)
    }

    fn fresh(&self, key: &Key) -> Option<IdealRange> {
        let entries = self.entries.borrow();
        let (range, loaded_at) = entries.get(key)?;
        (loaded_at.elapsed() < self.ttl).then(|| range.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::RetryPolicy;
    use crate::test_support::{InMemoryStore, client};

    fn cache(store: &InMemoryStore) -> ConfigCache<InMemoryStore> {
        let gateway = PersistenceGateway::new(store.clone(), RetryPolicy::default());
        ConfigCache::new(Rc::new(gateway), Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn should_serve_repeated_lookups_from_cache() {
        let store = InMemoryStore::with_client("mushroom1");
        let cache = cache(&store);
        let id = client("mushroom1");

        let first = cache.ideal_range(&id, ParameterKind::Temperature).await;
        let second = cache.ideal_range(&id, ParameterKind::Temperature).await;

        assert_eq!(first.unwrap().unwrap().min, 15.0);
        assert_eq!(second.unwrap().unwrap().max, 30.0);
        assert_eq!(store.range_reads(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_reload_after_ttl() {
        let store = InMemoryStore::with_client("mushroom1");
        let cache = cache(&store);
        let id = client("mushroom1");

        cache.ideal_range(&id, ParameterKind::Humidity).await.unwrap();
        store.set_range(&id, ParameterKind::Humidity, 40.0, 90.0);
        tokio::time::advance(Duration::from_secs(61)).await;
        let reloaded = cache.ideal_range(&id, ParameterKind::Humidity).await;

        assert_eq!(reloaded.unwrap().unwrap().min, 40.0);
        assert_eq!(store.range_reads(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_cache_absent_ranges() {
        let store = InMemoryStore::default();
        let cache = cache(&store);
        let id = client("ghost");

        assert!(
            cache
                .ideal_range(&id, ParameterKind::Temperature)
                .await
                .unwrap()
                .is_none()
        );
        store.set_range(&id, ParameterKind::Temperature, 10.0, 20.0);

        let found = cache.ideal_range(&id, ParameterKind::Temperature).await;
        assert_eq!(found.unwrap().unwrap().min, 10.0);
        assert_eq!(store.range_reads(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn should_write_through_on_update() {
        let store = InMemoryStore::with_client("mushroom1");
        let cache = cache(&store);
        let id = client("mushroom1");
        cache.ideal_range(&id, ParameterKind::Temperature).await.unwrap();

        cache
            .update_ideal_range(IdealRange::new(
                id.clone(),
                ParameterKind::Temperature,
                18.0,
                24.0,
            ))
            .await
            .unwrap();
        let current = cache.ideal_range(&id, ParameterKind::Temperature).await;

        assert_eq!(current.unwrap().unwrap().min, 18.0);
        assert_eq!(store.range_reads(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_old_entry_when_update_fails() {
        let store = InMemoryStore::with_client("mushroom1");
        let gateway = PersistenceGateway::new(
            store.clone(),
            RetryPolicy {
                max_attempts: 1,
                delay: Duration::from_secs(1),
            },
        );
        let cache = ConfigCache::new(Rc::new(gateway), Duration::from_secs(60));
        let id = client("mushroom1");
        cache.ideal_range(&id, ParameterKind::Temperature).await.unwrap();

        store.fail_busy(1);
        let result = cache
            .update_ideal_range(IdealRange::new(
                id.clone(),
                ParameterKind::Temperature,
                18.0,
                24.0,
            ))
            .await;

        assert!(matches!(result, Err(MycoError::Busy(_))));
        let current = cache.ideal_range(&id, ParameterKind::Temperature).await;
        assert_eq!(current.unwrap().unwrap().min, 15.0);
    }
}
