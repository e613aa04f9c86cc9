//! Property helpers for keyed state events.
//!
//! A change event is a JSON object whose properties are entity keys. These
//! helpers test for a key, project the value under it, and wrap a value back
//! under it; [`field`] and [`association`] are inverses on objects.

use serde_json::{Map, Value};

/// Predicate: does the event carry property `id`?
pub fn has(id: impl Into<String>) -> impl Fn(&Value) -> bool + Send + Sync + 'static {
    let id = id.into();
    move |value| value.as_object().is_some_and(|object| object.contains_key(&id))
}

/// Projection: the value stored at property `id`, or `null` when absent.
pub fn field(id: impl Into<String>) -> impl Fn(Value) -> Value + Send + Sync + 'static {
    let id = id.into();
    move |value| match value {
        Value::Object(mut object) => object.remove(&id).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Injection: wrap a value as `{ id: value }`.
pub fn association(id: impl Into<String>) -> impl Fn(Value) -> Value + Send + Sync + 'static {
    let id = id.into();
    move |value| {
        let mut object = Map::with_capacity(1);
        object.insert(id.clone(), value);
        Value::Object(object)
    }
}
