//! Registry of tracked ID lists.

use crate::id_list::IdList;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Name → current list generation, behind its own lock.
///
/// The lock guards only the map. Members and sizes of a generation are
/// mutated through the shared `Arc<IdList>` without holding it.
#[derive(Debug, Default)]
pub struct IdListRegistry {
    lists: RwLock<HashMap<String, Arc<IdList>>>,
}

impl IdListRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the current generation of a list.
    pub fn get(&self, name: &str) -> Option<Arc<IdList>> {
        self.lists.read().get(name).cloned()
    }

    /// Inserts or replaces a list under its own name.
    pub fn put(&self, list: Arc<IdList>) {
        self.lists.write().insert(list.name().to_string(), list);
    }

    /// Returns the list for `name`, inserting a placeholder if unknown.
    pub fn get_or_insert_placeholder(&self, name: &str) -> Arc<IdList> {
        if let Some(list) = self.get(name) {
            return list;
        }
        self.lists
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(IdList::placeholder(name)))
            .clone()
    }

    /// Removes a list.
    pub fn remove(&self, name: &str) -> Option<Arc<IdList>> {
        self.lists.write().remove(name)
    }

    /// Removes `list` only if it is still the registered generation.
    ///
    /// Returns true if it was removed.
    pub fn remove_if_current(&self, list: &Arc<IdList>) -> bool {
        let mut lists = self.lists.write();
        match lists.get(list.name()) {
            Some(current) if Arc::ptr_eq(current, list) => {
                lists.remove(list.name());
                true
            }
            _ => false,
        }
    }

    /// Drops every list whose name fails `keep`; returns the dropped names.
    pub fn prune(&self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let mut lists = self.lists.write();
        let dropped: Vec<String> = lists.keys().filter(|n| !keep(n)).cloned().collect();
        for name in &dropped {
            lists.remove(name);
        }
        dropped
    }

    /// Names of all tracked lists.
    pub fn names(&self) -> Vec<String> {
        self.lists.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lists.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.read().is_empty()
    }
}
