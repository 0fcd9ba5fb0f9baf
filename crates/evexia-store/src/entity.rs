//! Identity of cached entities.

use std::any::Any;

/// A domain object that knows its own id.
///
/// Used by [`EntityCache::set_many`](crate::EntityCache::set_many) to key a
/// batch without an explicit key function.
pub trait Entity: Any + Send + Sync {
    /// The entity's id, or `None` if it has none.
    fn entity_id(&self) -> Option<String>;
}

/// Raw API payloads carry their id in an `"id"` field.
impl Entity for serde_json::Value {
    fn entity_id(&self) -> Option<String> {
        match self.get("id")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
