//! Entity cache keyed by entity type and id.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::entity::Entity;
use crate::optimistic::OptimisticUpdate;

/// Type-erased cached value.
pub(crate) type ErasedValue = Arc<dyn Any + Send + Sync>;

/// All entries of one entity type, keyed by id.
type Bucket = HashMap<String, ErasedValue>;

/// Inner state protected by RwLock.
#[derive(Default)]
struct CacheInner {
    /// Buckets are shared with snapshots and rebuilt on write while shared.
    buckets: HashMap<String, Arc<Bucket>>,
}

/// Normalized cache of domain entities.
///
/// Entries are grouped by an arbitrary entity type name (`"client"`,
/// `"user"`, ...) and keyed by id within the type. Values are stored
/// opaquely; callers name the concrete type they expect at each read, and a
/// read with a mismatched type behaves like a miss.
///
/// The cache is a cheap handle: clones share the same state, so one instance
/// can be constructed at startup and passed to every consumer. There is no
/// TTL and no eviction; entries live until invalidated.
///
/// Writes never mutate a bucket that a [`BucketSnapshot`] still references,
/// so snapshots keep observing the state they were taken from.
#[derive(Clone, Default)]
pub struct EntityCache {
    inner: Arc<RwLock<CacheInner>>,
}

impl EntityCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value at `(entity_type, id)`, replacing any previous value.
    pub fn set<T>(&self, entity_type: &str, id: impl Into<String>, value: T)
    where
        T: Any + Send + Sync,
    {
        self.set_erased(entity_type, id.into(), Arc::new(value));
    }

    /// Store a batch of entities under one type, keyed by their own ids.
    ///
    /// This is a merge: entries of the type that are not in the batch are
    /// kept. Returns the number of entities stored.
    pub fn set_many<T, I>(&self, entity_type: &str, values: I) -> usize
    where
        T: Entity,
        I: IntoIterator<Item = T>,
    {
        self.set_many_by(entity_type, values, |value| value.entity_id())
    }

    /// Store a batch of values under one type, keyed by `key_fn`.
    ///
    /// Values for which `key_fn` returns `None` are skipped.
    pub fn set_many_by<T, I, F>(&self, entity_type: &str, values: I, key_fn: F) -> usize
    where
        T: Any + Send + Sync,
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> Option<String>,
    {
        let mut keyed = Vec::new();
        let mut skipped = 0usize;
        for value in values {
            match key_fn(&value) {
                Some(id) => keyed.push((id, Arc::new(value) as ErasedValue)),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(
                entity_type = %entity_type,
                skipped = skipped,
                "Skipped entities without an id"
            );
        }

        if keyed.is_empty() {
            return 0;
        }

        let stored = keyed.len();
        let mut inner = self.inner.write();
        let bucket = Arc::make_mut(inner.buckets.entry(entity_type.to_string()).or_default());
        bucket.extend(keyed);

        debug!(
            entity_type = %entity_type,
            stored = stored,
            bucket_size = bucket.len(),
            "Entities merged into cache"
        );

        stored
    }

    /// Get the value at `(entity_type, id)`.
    ///
    /// Returns `None` when nothing is cached there or the cached value is not
    /// a `T`.
    pub fn get<T>(&self, entity_type: &str, id: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let value = {
            let inner = self.inner.read();
            inner.buckets.get(entity_type)?.get(id)?.clone()
        };
        downcast(entity_type, id, value)
    }

    /// Check whether anything is cached at `(entity_type, id)`.
    pub fn contains(&self, entity_type: &str, id: &str) -> bool {
        self.inner
            .read()
            .buckets
            .get(entity_type)
            .is_some_and(|bucket| bucket.contains_key(id))
    }

    /// Remove one entry, or the whole type when `id` is `None`.
    ///
    /// Returns the number of entries removed. Unknown types and ids are a
    /// no-op.
    pub fn invalidate(&self, entity_type: &str, id: Option<&str>) -> usize {
        let mut inner = self.inner.write();

        let removed = match id {
            Some(id) => {
                let Some(bucket) = inner.buckets.get_mut(entity_type) else {
                    return 0;
                };
                if !bucket.contains_key(id) {
                    return 0;
                }
                let bucket = Arc::make_mut(bucket);
                bucket.remove(id);
                if bucket.is_empty() {
                    inner.buckets.remove(entity_type);
                }
                1
            }
            None => inner
                .buckets
                .remove(entity_type)
                .map(|bucket| bucket.len())
                .unwrap_or(0),
        };

        debug!(
            entity_type = %entity_type,
            id = ?id,
            removed = removed,
            "Invalidated cache entries"
        );

        removed
    }

    /// Clear the whole cache.
    pub fn invalidate_all(&self) {
        let mut inner = self.inner.write();
        let types = inner.buckets.len();
        inner.buckets.clear();
        debug!(types = types, "Entity cache cleared");
    }

    /// Write a value now, remembering the previous one for rollback.
    pub fn optimistic_set<T>(
        &self,
        entity_type: &str,
        id: impl Into<String>,
        value: T,
    ) -> OptimisticUpdate
    where
        T: Any + Send + Sync,
    {
        let id = id.into();
        let previous = self.set_erased(entity_type, id.clone(), Arc::new(value));
        OptimisticUpdate::new(self.clone(), entity_type.to_string(), id, previous)
    }

    /// Freeze the current contents of one type.
    pub fn snapshot(&self, entity_type: &str) -> Option<BucketSnapshot> {
        let inner = self.inner.read();
        inner.buckets.get(entity_type).map(|bucket| BucketSnapshot {
            entity_type: entity_type.to_string(),
            entries: Arc::clone(bucket),
        })
    }

    /// Ids cached under a type, sorted.
    pub fn ids(&self, entity_type: &str) -> Vec<String> {
        let inner = self.inner.read();
        let mut ids: Vec<String> = inner
            .buckets
            .get(entity_type)
            .map(|bucket| bucket.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Total number of cached entries across all types.
    pub fn len(&self) -> usize {
        self.inner.read().buckets.values().map(|b| b.len()).sum()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        CacheStats {
            types: inner.buckets.len(),
            entries: inner.buckets.values().map(|b| b.len()).sum(),
        }
    }

    /// Insert an already-erased value, returning the one it replaced.
    pub(crate) fn set_erased(
        &self,
        entity_type: &str,
        id: String,
        value: ErasedValue,
    ) -> Option<ErasedValue> {
        let mut inner = self.inner.write();
        let bucket = Arc::make_mut(inner.buckets.entry(entity_type.to_string()).or_default());
        trace!(entity_type = %entity_type, id = %id, "Entity stored in cache");
        bucket.insert(id, value)
    }
}

impl fmt::Debug for EntityCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("EntityCache")
            .field("types", &stats.types)
            .field("entries", &stats.entries)
            .finish()
    }
}

/// Frozen view of one entity type.
///
/// Unaffected by writes made to the cache after it was taken.
#[derive(Clone)]
pub struct BucketSnapshot {
    entity_type: String,
    entries: Arc<Bucket>,
}

impl BucketSnapshot {
    /// The entity type this snapshot was taken from.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// Get the value for `id` as a `T`.
    pub fn get<T>(&self, id: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let value = self.entries.get(id)?.clone();
        downcast(&self.entity_type, id, value)
    }

    /// Check whether `id` was cached when the snapshot was taken.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of entries in the snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether two snapshots share the same underlying bucket.
    pub fn ptr_eq(&self, other: &BucketSnapshot) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl fmt::Debug for BucketSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketSnapshot")
            .field("entity_type", &self.entity_type)
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entity types with at least one entry.
    pub types: usize,

    /// Total number of cached entries.
    pub entries: usize,
}

fn downcast<T>(entity_type: &str, id: &str, value: ErasedValue) -> Option<Arc<T>>
where
    T: Any + Send + Sync,
{
    match value.downcast::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!(
                entity_type = %entity_type,
                id = %id,
                expected = std::any::type_name::<T>(),
                "Cached entity has a different type"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    struct Client {
        id: String,
        name: String,
    }

    impl Client {
        fn new(id: &str, name: &str) -> Self {
            Self {
                id: id.to_string(),
                name: name.to_string(),
            }
        }
    }

    impl Entity for Client {
        fn entity_id(&self) -> Option<String> {
            Some(self.id.clone())
        }
    }

    #[test]
    fn test_set_and_get() {
        let cache = EntityCache::new();
        cache.set("client", "c-1", Client::new("c-1", "Acme"));

        let client = cache.get::<Client>("client", "c-1").unwrap();
        assert_eq!(client.name, "Acme");
        assert!(cache.contains("client", "c-1"));
    }

    #[test]
    fn test_missing_is_absent() {
        let cache = EntityCache::new();
        assert!(cache.get::<Client>("client", "c-1").is_none());

        cache.set("client", "c-1", Client::new("c-1", "Acme"));
        assert!(cache.get::<Client>("client", "nope").is_none());
        assert!(cache.get::<Client>("user", "c-1").is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let cache = EntityCache::new();
        cache.set("client", "c-1", Client::new("c-1", "First"));
        cache.set_many("client", vec![Client::new("c-1", "Second")]);
        cache.set("client", "c-1", Client::new("c-1", "Third"));

        let client = cache.get::<Client>("client", "c-1").unwrap();
        assert_eq!(client.name, "Third");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_with_wrong_type_is_absent() {
        let cache = EntityCache::new();
        cache.set("client", "c-1", Client::new("c-1", "Acme"));

        assert!(cache.get::<String>("client", "c-1").is_none());
        // The entry itself is untouched
        assert!(cache.get::<Client>("client", "c-1").is_some());
    }

    #[test]
    fn test_set_many_merges() {
        let cache = EntityCache::new();
        cache.set_many(
            "client",
            vec![Client::new("a", "a-old"), Client::new("c", "c-old")],
        );
        cache.set_many(
            "client",
            vec![Client::new("a", "a-new"), Client::new("b", "b-new")],
        );

        assert_eq!(cache.get::<Client>("client", "a").unwrap().name, "a-new");
        assert_eq!(cache.get::<Client>("client", "b").unwrap().name, "b-new");
        assert_eq!(cache.get::<Client>("client", "c").unwrap().name, "c-old");
        assert_eq!(cache.ids("client"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_set_many_json_values() {
        let cache = EntityCache::new();
        let stored = cache.set_many(
            "user",
            vec![
                json!({ "id": "u-1", "email": "a@example.com" }),
                json!({ "id": 7, "email": "b@example.com" }),
                json!({ "email": "no-id@example.com" }),
            ],
        );

        assert_eq!(stored, 2);
        let user = cache.get::<serde_json::Value>("user", "7").unwrap();
        assert_eq!(user["email"], "b@example.com");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_set_many_by_key_fn() {
        let cache = EntityCache::new();
        let stored = cache.set_many_by("industry", vec!["health", "retail"], |name| {
            Some(name.to_uppercase())
        });

        assert_eq!(stored, 2);
        assert_eq!(*cache.get::<&str>("industry", "HEALTH").unwrap(), "health");
    }

    #[test]
    fn test_set_many_empty_batch_creates_nothing() {
        let cache = EntityCache::new();
        let stored = cache.set_many("client", Vec::<Client>::new());

        assert_eq!(stored, 0);
        assert_eq!(cache.stats().types, 0);
        assert!(cache.snapshot("client").is_none());
    }

    #[test]
    fn test_invalidate_single_entry() {
        let cache = EntityCache::new();
        cache.set_many("client", vec![Client::new("a", "A"), Client::new("b", "B")]);
        cache.set("user", "a", Client::new("a", "User A"));

        assert_eq!(cache.invalidate("client", Some("a")), 1);

        assert!(cache.get::<Client>("client", "a").is_none());
        assert!(cache.get::<Client>("client", "b").is_some());
        assert!(cache.get::<Client>("user", "a").is_some());
    }

    #[test]
    fn test_invalidate_type() {
        let cache = EntityCache::new();
        cache.set_many("client", vec![Client::new("a", "A"), Client::new("b", "B")]);
        cache.set("user", "a", Client::new("a", "User A"));

        assert_eq!(cache.invalidate("client", None), 2);

        assert!(cache.get::<Client>("client", "a").is_none());
        assert!(cache.get::<Client>("client", "b").is_none());
        assert!(cache.get::<Client>("user", "a").is_some());
    }

    #[test]
    fn test_invalidate_unknown_is_noop() {
        let cache = EntityCache::new();
        cache.set("client", "a", Client::new("a", "A"));

        assert_eq!(cache.invalidate("client", Some("zzz")), 0);
        assert_eq!(cache.invalidate("contract", Some("a")), 0);
        assert_eq!(cache.invalidate("contract", None), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_last_entry_drops_type() {
        let cache = EntityCache::new();
        cache.set("client", "a", Client::new("a", "A"));
        cache.invalidate("client", Some("a"));

        assert_eq!(cache.stats(), CacheStats { types: 0, entries: 0 });
    }

    #[test]
    fn test_invalidate_all() {
        let cache = EntityCache::new();
        cache.set("client", "a", Client::new("a", "A"));
        cache.set("user", "u", Client::new("u", "U"));
        cache.set("session", "s", 3u32);

        cache.invalidate_all();

        assert!(cache.is_empty());
        assert!(cache.get::<Client>("client", "a").is_none());
        assert!(cache.get::<Client>("user", "u").is_none());
        assert!(cache.get::<u32>("session", "s").is_none());
    }

    #[test]
    fn test_snapshot_is_copy_on_write() {
        let cache = EntityCache::new();
        cache.set("client", "a", Client::new("a", "before"));

        let snapshot = cache.snapshot("client").unwrap();
        cache.set("client", "a", Client::new("a", "after"));
        cache.set("client", "b", Client::new("b", "new"));
        cache.invalidate_all();

        assert_eq!(snapshot.get::<Client>("a").unwrap().name, "before");
        assert!(!snapshot.contains("b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.entity_type(), "client");
    }

    #[test]
    fn test_snapshot_identity_changes_on_write() {
        let cache = EntityCache::new();
        cache.set("client", "a", Client::new("a", "A"));

        let first = cache.snapshot("client").unwrap();
        let unchanged = cache.snapshot("client").unwrap();
        assert!(first.ptr_eq(&unchanged));

        cache.set("client", "b", Client::new("b", "B"));
        let second = cache.snapshot("client").unwrap();
        assert!(!first.ptr_eq(&second));
    }

    #[test]
    fn test_clones_share_state() {
        let cache = EntityCache::new();
        let handle = cache.clone();

        handle.set("client", "a", Client::new("a", "A"));

        assert!(cache.contains("client", "a"));
    }

    #[test]
    fn test_stats() {
        let cache = EntityCache::new();
        cache.set_many("client", vec![Client::new("a", "A"), Client::new("b", "B")]);
        cache.set("tenant", "t-1", "Tenant One".to_string());

        let stats = cache.stats();
        assert_eq!(stats.types, 2);
        assert_eq!(stats.entries, 3);
        assert!(format!("{:?}", cache).contains("entries: 3"));
    }
}
