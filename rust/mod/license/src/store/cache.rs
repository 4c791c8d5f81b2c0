use std::sync::{PoisonError, RwLock};

use crate::model::{Customer, License, LicenseRequest};

/// A record with a service-assigned id.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
}

impl Record for LicenseRequest {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Customer {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for License {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Ordered, id-keyed list of records. Order is the service's order, with
/// newly created records appended.
pub struct Cache<T: Record> {
    items: RwLock<Vec<T>>,
}

impl<T: Record> Cache<T> {
    pub fn new() -> Self {
        Self { items: RwLock::new(Vec::new()) }
    }

    pub fn replace_all(&self, items: Vec<T>) {
        *self.items.write().unwrap_or_else(PoisonError::into_inner) = items;
    }

    /// Replace the record with the same id in place, or append it.
    pub fn upsert(&self, item: T) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        match items.iter_mut().find(|x| x.id() == item.id()) {
            Some(slot) => *slot = item,
            None => items.push(item),
        }
    }

    /// Upsert every record of a partial fetch.
    pub fn merge(&self, incoming: Vec<T>) {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        for item in incoming {
            match items.iter_mut().find(|x| x.id() == item.id()) {
                Some(slot) => *slot = item,
                None => items.push(item),
            }
        }
    }

    pub fn remove(&self, id: &str) -> Option<T> {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let pos = items.iter().position(|x| x.id() == id)?;
        Some(items.remove(pos))
    }

    pub fn get(&self, id: &str) -> Option<T> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|x| x.id() == id)
            .cloned()
    }

    /// Apply `f` to the cached record with `id`, if present.
    pub fn update<F: FnOnce(&mut T)>(&self, id: &str, f: F) -> bool {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        match items.iter_mut().find(|x| x.id() == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.items.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Record> Default for Cache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(&'static str, u32);

    impl Record for Item {
        fn id(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn upsert_keeps_position() {
        let cache = Cache::new();
        cache.replace_all(vec![Item("a", 1), Item("b", 1), Item("c", 1)]);
        cache.upsert(Item("b", 2));
        cache.upsert(Item("d", 1));
        assert_eq!(
            cache.snapshot(),
            vec![Item("a", 1), Item("b", 2), Item("c", 1), Item("d", 1)]
        );
    }

    #[test]
    fn merge_and_remove() {
        let cache = Cache::new();
        cache.replace_all(vec![Item("a", 1)]);
        cache.merge(vec![Item("a", 5), Item("z", 1)]);
        assert_eq!(cache.get("a"), Some(Item("a", 5)));
        assert_eq!(cache.remove("z"), Some(Item("z", 1)));
        assert_eq!(cache.remove("z"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn update_in_place() {
        let cache = Cache::new();
        cache.replace_all(vec![Item("a", 1)]);
        assert!(cache.update("a", |i| i.1 = 9));
        assert!(!cache.update("x", |i| i.1 = 9));
        assert_eq!(cache.get("a"), Some(Item("a", 9)));
    }
}
