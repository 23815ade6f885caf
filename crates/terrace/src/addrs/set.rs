use super::{UniqueKey, UniqueKeyer};
use indexmap::IndexMap;

/// Set of addresses, compared by [UniqueKey]
#[derive(Debug, Clone)]
pub struct Set<T> {
    items: IndexMap<UniqueKey, T>,
}

impl<T> Default for Set<T> {
    fn default() -> Self {
        Self {
            items: IndexMap::new(),
        }
    }
}

impl<T: UniqueKeyer> Set<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `item`, returns `false` if an equal item was already present
    pub fn add(&mut self, item: T) -> bool {
        let key = item.unique_key();
        if self.items.contains_key(&key) {
            return false;
        }
        self.items.insert(key, item);
        true
    }

    pub fn remove(&mut self, item: &T) -> Option<T> {
        self.items.shift_remove(&item.unique_key())
    }

    pub fn has(&self, item: &T) -> bool {
        self.items.contains_key(&item.unique_key())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }
}

impl<T: UniqueKeyer + Clone> Set<T> {
    pub fn union(&self, other: &Set<T>) -> Set<T> {
        self.iter().chain(other.iter()).cloned().collect()
    }

    pub fn intersection(&self, other: &Set<T>) -> Set<T> {
        self.iter().filter(|item| other.has(item)).cloned().collect()
    }
}

impl<T: UniqueKeyer> FromIterator<T> for Set<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Set::new();
        for item in iter {
            set.add(item);
        }
        set
    }
}

impl<T> IntoIterator for Set<T> {
    type Item = T;
    type IntoIter = indexmap::map::IntoValues<UniqueKey, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_values()
    }
}
