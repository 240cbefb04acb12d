//! Opaque per-request environment map.
//!
//! Handlers and middleware use [`Env`] to pass values alongside a [`Request`](crate::request::Request)
//! that don't belong in the wire-format data model: the router stashes the matched `Allow` list
//! and the active [`Error`](crate::error::Error) here before invoking an error handler; user
//! middleware can stash authentication context, request IDs, and so on.
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hasher};

#[derive(Default)]
struct NoopHasher(u64);

impl Hasher for NoopHasher {
    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    fn write(&mut self, _: &[u8]) {
        unreachable!("TypeId calls write_u64");
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

type AnyMap = HashMap<TypeId, Box<dyn Any + Send + Sync>, BuildHasherDefault<NoopHasher>>;

/// A type-keyed map, one slot per distinct `T`.
#[derive(Default)]
pub struct Env {
    map: Option<Box<AnyMap>>,
}

impl Env {
    #[inline]
    pub fn new() -> Self {
        Self { map: None }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.as_deref().map(HashMap::len).unwrap_or_default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map
            .as_ref()
            .and_then(|map| map.get(&TypeId::of::<T>()))
            .and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<T: Send + Sync + 'static>(&mut self) -> Option<&mut T> {
        self.map
            .as_mut()
            .and_then(|map| map.get_mut(&TypeId::of::<T>()))
            .and_then(|v| v.downcast_mut())
    }

    /// Inserts a value, returning the previous one of the same type, if any.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.map
            .get_or_insert_default()
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast().ok().map(|b| *b))
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.map
            .as_mut()
            .and_then(|map| map.remove(&TypeId::of::<T>()))
            .and_then(|old| old.downcast().ok().map(|b| *b))
    }

    /// Clears the map between requests, retaining the allocated table.
    #[inline]
    pub fn clear(&mut self) {
        if let Some(map) = self.map.as_mut() {
            map.clear();
        }
    }
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Env").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove_round_trip() {
        let mut env = Env::new();
        assert_eq!(env.insert(42i32), None);
        assert_eq!(env.get::<i32>(), Some(&42));
        assert_eq!(env.remove::<i32>(), Some(42));
        assert_eq!(env.get::<i32>(), None);
    }

    #[test]
    fn distinct_types_do_not_collide() {
        let mut env = Env::new();
        env.insert(1u32);
        env.insert("hello".to_string());
        assert_eq!(env.get::<u32>(), Some(&1));
        assert_eq!(env.get::<String>().map(String::as_str), Some("hello"));
    }
}
