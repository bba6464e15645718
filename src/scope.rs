use once_cell::sync::OnceCell;
use std::{collections::BTreeMap, sync::Arc};

use crate::any::{Instance, ServiceKey, TypeInfo};

/// One-time cell holding the instance of a scoped service for one scope.
///
/// Slots are handed out of the store as `Arc`s, so the factory runs outside
/// the container lock and concurrent first resolutions of the same slot share
/// the first result.
pub(crate) type Slot = Arc<OnceCell<Instance>>;

#[derive(Default)]
pub(crate) struct ScopeCache {
    types: BTreeMap<TypeInfo, Slot>,
    tokens: BTreeMap<Box<str>, Slot>,
}

impl ScopeCache {
    #[inline]
    #[must_use]
    fn get(&self, key: &ServiceKey) -> Option<Slot> {
        match key {
            ServiceKey::Type(type_info) => self.types.get(type_info),
            ServiceKey::Token(token) => self.tokens.get(token),
        }
        .cloned()
    }

    #[inline]
    fn get_or_insert(&mut self, key: &ServiceKey) -> Slot {
        match key {
            ServiceKey::Type(type_info) => self.types.entry(*type_info).or_default(),
            ServiceKey::Token(token) => self.tokens.entry(token.clone()).or_default(),
        }
        .clone()
    }

    #[inline]
    #[must_use]
    fn len(&self) -> usize {
        self.types.len() + self.tokens.len()
    }
}

/// Scoped instances grouped by scope key.
#[derive(Default)]
pub(crate) struct ScopeStore {
    scopes: BTreeMap<Box<str>, ScopeCache>,
}

impl ScopeStore {
    #[inline]
    #[must_use]
    pub(crate) fn slot(&self, scope_key: &str, key: &ServiceKey) -> Option<Slot> {
        self.scopes.get(scope_key).and_then(|cache| cache.get(key))
    }

    #[inline]
    pub(crate) fn slot_or_insert(&mut self, scope_key: &str, key: &ServiceKey) -> Slot {
        if let Some(cache) = self.scopes.get_mut(scope_key) {
            return cache.get_or_insert(key);
        }
        self.scopes.entry(scope_key.into()).or_default().get_or_insert(key)
    }

    /// Drops every slot of the scope and returns how many there were.
    #[inline]
    pub(crate) fn clear(&mut self, scope_key: &str) -> usize {
        self.scopes.remove(scope_key).map_or(0, |cache| cache.len())
    }

    #[inline]
    #[must_use]
    pub(crate) fn contains(&self, scope_key: &str) -> bool {
        self.scopes.contains_key(scope_key)
    }
}
