//! Client-side state store for the Evexia admin front end.
//!
//! This crate provides:
//! - An entity cache keyed by entity type and id, with copy-on-write
//!   buckets and optimistic updates
//! - A `LocalStorage` abstraction for small persisted key/value state
//!   (preferences, auth artifacts)
//!
//! # Example
//!
//! ```rust,ignore
//! use evexia_store::EntityCache;
//!
//! let cache = EntityCache::new();
//! cache.set("client", "c-1", client);
//! let client: Option<Arc<Client>> = cache.get("client", "c-1");
//! ```

mod cache;
mod entity;
mod error;
mod local;
mod optimistic;

pub use cache::{BucketSnapshot, CacheStats, EntityCache};
pub use entity::Entity;
pub use error::{Result, StoreError};
pub use local::{FileStorage, LocalStorage, MemoryStorage};
pub use optimistic::OptimisticUpdate;
