//! Keyed entity collections

use crate::recruitment::Entity;
use std::collections::HashMap;

/// Entities keyed by id, iterated in insertion order.
///
/// Lookups are O(1); removal is linear in the collection size.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: HashMap<String, T>,
    order: Vec<String>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge entities by key. Existing keys are replaced in place.
    pub fn set(&mut self, entities: impl IntoIterator<Item = T>) {
        for entity in entities {
            self.insert(entity);
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.items.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Iterate entities in insertion order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.order.iter().filter_map(|k| self.items.get(k))
    }

    /// Clone all entities in insertion order
    pub fn get_all(&self) -> Vec<T> {
        self.values().cloned().collect()
    }

    /// Clone the entities matching a predicate
    pub fn filter(&self, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
        self.values().filter(|e| pred(e)).cloned().collect()
    }

    /// Add or replace an entity. Returns the replaced value, if any.
    pub fn insert(&mut self, entity: T) -> Option<T> {
        let key = entity.key().to_string();
        let previous = self.items.insert(key.clone(), entity);
        if previous.is_none() {
            self.order.push(key);
        }
        previous
    }

    /// Modify an entity in place. Returns the updated value, or `None` if
    /// the key is absent.
    pub fn update(&mut self, key: &str, f: impl FnOnce(&mut T)) -> Option<T> {
        let entity = self.items.get_mut(key)?;
        f(entity);
        Some(entity.clone())
    }

    pub fn remove(&mut self, key: &str) -> Option<T> {
        let removed = self.items.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Per-owner lists (messages by application, documents by candidate,
/// notifications by user)
#[derive(Debug, Clone)]
pub struct KeyedLists<T> {
    lists: HashMap<String, Vec<T>>,
}

impl<T> Default for KeyedLists<T> {
    fn default() -> Self {
        Self {
            lists: HashMap::new(),
        }
    }
}

impl<T: Entity> KeyedLists<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items owned by `owner`, empty if the owner has none
    pub fn list(&self, owner: &str) -> &[T] {
        self.lists.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, owner: &str, key: &str) -> Option<&T> {
        self.list(owner).iter().find(|item| item.key() == key)
    }

    /// Append to the owner's list, creating it if absent
    pub fn push(&mut self, owner: &str, item: T) {
        self.lists.entry(owner.to_string()).or_default().push(item);
    }

    /// Modify one item in place. Returns the updated value, or `None` if
    /// the owner or the item is absent.
    pub fn update(&mut self, owner: &str, key: &str, f: impl FnOnce(&mut T)) -> Option<T> {
        let item = self
            .lists
            .get_mut(owner)?
            .iter_mut()
            .find(|item| item.key() == key)?;
        f(item);
        Some(item.clone())
    }

    /// Apply `f` to every item of the owner's list; returns how many
    /// items `f` reported as changed
    pub fn update_all(&mut self, owner: &str, mut f: impl FnMut(&mut T) -> bool) -> usize {
        self.lists
            .get_mut(owner)
            .map(|items| items.iter_mut().map(&mut f).filter(|changed| *changed).count())
            .unwrap_or(0)
    }

    /// Merge items by key into the owner's list
    pub fn set(&mut self, owner: &str, items: impl IntoIterator<Item = T>) {
        let list = self.lists.entry(owner.to_string()).or_default();
        for item in items {
            match list.iter_mut().find(|existing| existing.key() == item.key()) {
                Some(existing) => *existing = item,
                None => list.push(item),
            }
        }
    }

    /// Total number of items across all owners
    pub fn total(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }
}
