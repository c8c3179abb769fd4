// Ordered shopping list with write-through persistence

use crate::codec;
use crate::filter::{ClearScope, Filter};
use crate::item::{IdGenerator, Item};
use crate::storage::KeyValueStorage;
use eyre::Result;
use tracing::{debug, info};

/// Validation failures a presentation layer should show to the user
///
/// Returned inside an `eyre::Report`; match with `downcast_ref::<StoreError>()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The name was empty or whitespace-only
    EmptyName,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::EmptyName => write!(f, "Item name cannot be empty or whitespace-only"),
        }
    }
}

impl std::error::Error for StoreError {}

/// The shopping list
///
/// Order is display order. Every command that changes the list writes the
/// whole list back to storage before returning; commands on unknown ids
/// change nothing and write nothing. The list is read once on `open`, so two
/// stores sharing one storage overwrite each other: the last save wins.
pub struct ListStore<S, G> {
    storage: S,
    ids: G,
    key: String,
    items: Vec<Item>,
}

impl<S: KeyValueStorage, G: IdGenerator> ListStore<S, G> {
    /// Open the list stored under `key`, starting empty if there is none
    pub fn open(storage: S, key: impl Into<String>, ids: G) -> Self {
        let key = key.into();
        let items = codec::load_items(&storage, &key);
        info!(key = %key, count = items.len(), "Opened shopping list");

        Self {
            storage,
            ids,
            key,
            items,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Read the stored list without touching the in-memory one
    pub fn load(&self) -> Vec<Item> {
        codec::load_items(&self.storage, &self.key)
    }

    /// Overwrite the stored list with the in-memory one
    pub fn save(&mut self) -> Result<()> {
        codec::save_items(&mut self.storage, &self.key, &self.items)
    }

    /// Replace the in-memory list with the stored one
    pub fn reload(&mut self) {
        self.items = self.load();
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id == id)
    }

    /// Items matching `filter`, in list order
    pub fn filter(&self, filter: Filter) -> Vec<Item> {
        self.items.iter().filter(|item| filter.matches(item)).cloned().collect()
    }

    /// Only incomplete items may be edited
    pub fn is_editable(&self, id: &str) -> bool {
        self.get(id).is_some_and(|item| !item.completed)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Prepend a new incomplete item
    pub fn add(&mut self, name: &str) -> Result<Item> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::EmptyName.into());
        }

        let item = Item::new(self.ids.fresh_id(), name);
        debug!(id = %item.id, name, "add: prepending item");

        self.items.insert(0, item.clone());
        self.save()?;
        Ok(item)
    }

    /// Returns false if no item has `id`
    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.position(id) else {
            debug!(id, "remove: unknown id");
            return Ok(false);
        };

        self.items.remove(index);
        self.save()?;
        Ok(true)
    }

    pub fn set_completed(&mut self, id: &str, completed: bool) -> Result<bool> {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            debug!(id, "set_completed: unknown id");
            return Ok(false);
        };

        item.completed = completed;
        self.save()?;
        Ok(true)
    }

    /// Flip the completion flag, returning the new state
    pub fn toggle(&mut self, id: &str) -> Result<Option<bool>> {
        let Some(completed) = self.get(id).map(|item| !item.completed) else {
            debug!(id, "toggle: unknown id");
            return Ok(None);
        };

        self.set_completed(id, completed)?;
        Ok(Some(completed))
    }

    /// Rename in place; unlike `add`, any name is accepted
    pub fn rename(&mut self, id: &str, name: &str) -> Result<bool> {
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            debug!(id, "rename: unknown id");
            return Ok(false);
        };

        item.name = name.to_string();
        self.save()?;
        Ok(true)
    }

    /// Move `id` immediately before `before_id`, or to the end when `None`
    ///
    /// Returns false without changing anything if either id is unknown or
    /// both are the same item.
    pub fn reorder(&mut self, id: &str, before_id: Option<&str>) -> Result<bool> {
        if before_id == Some(id) {
            return Ok(false);
        }

        let Some(from) = self.position(id) else {
            debug!(id, "reorder: unknown id");
            return Ok(false);
        };

        if let Some(before_id) = before_id {
            if self.position(before_id).is_none() {
                debug!(id, before_id, "reorder: unknown target id");
                return Ok(false);
            }
        }

        let item = self.items.remove(from);
        let to = match before_id {
            Some(before_id) => self.position(before_id).unwrap_or(self.items.len()),
            None => self.items.len(),
        };

        if to == from {
            // Already in place
            self.items.insert(to, item);
            return Ok(false);
        }

        debug!(id, from, to, "reorder: moving item");
        self.items.insert(to, item);
        self.save()?;
        Ok(true)
    }

    /// Returns the number of items removed
    pub fn clear(&mut self, scope: ClearScope) -> Result<usize> {
        let before = self.items.len();
        self.items.retain(|item| !scope.matches(item));
        let removed = before - self.items.len();

        if removed > 0 {
            self.save()?;
        }

        info!(%scope, removed, "Cleared items");
        Ok(removed)
    }
}
