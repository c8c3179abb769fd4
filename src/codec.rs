// JSON array persistence of the item list

use crate::item::Item;
use crate::storage::KeyValueStorage;
use eyre::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Storage key the browser version used; kept so both share data
pub const DEFAULT_KEY: &str = "shoppingItems";

/// Load the item list stored under `key`
///
/// Never fails. A missing key, unreadable storage, `null`, or a value that
/// is not a JSON array all load as an empty list. Array elements that are
/// not valid items, and repeated ids, are skipped.
pub fn load_items<S: KeyValueStorage + ?Sized>(storage: &S, key: &str) -> Vec<Item> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(key, "No stored items, starting empty");
            return Vec::new();
        }
        Err(e) => {
            warn!(key, error = ?e, "Failed to read stored items, starting empty");
            return Vec::new();
        }
    };

    decode_items(&raw).unwrap_or_else(|| {
        warn!(key, "Stored items are not a JSON array, starting empty");
        Vec::new()
    })
}

/// Serialize `items` and overwrite the value under `key`
pub fn save_items<S: KeyValueStorage + ?Sized>(storage: &mut S, key: &str, items: &[Item]) -> Result<()> {
    let json = serde_json::to_string(items).context("Failed to serialize items")?;
    storage.set(key, &json).context("Failed to save items")?;
    debug!(key, count = items.len(), "Saved items");
    Ok(())
}

/// Decode a stored value, `None` when it is not a JSON array
fn decode_items(raw: &str) -> Option<Vec<Item>> {
    let elements = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(elements)) => elements,
        Ok(Value::Null) => return Some(Vec::new()),
        Ok(_) => return None,
        Err(e) => {
            warn!(error = ?e, "Failed to parse stored items");
            return None;
        }
    };

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(elements.len());

    for (index, element) in elements.into_iter().enumerate() {
        let item: Item = match serde_json::from_value(element) {
            Ok(item) => item,
            Err(e) => {
                warn!(index, error = ?e, "Skipping malformed item");
                continue;
            }
        };

        if !seen.insert(item.id.clone()) {
            warn!(index, id = %item.id, "Skipping item with duplicate id");
            continue;
        }

        items.push(item);
    }

    Some(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn stored(raw: &str) -> MemoryStorage {
        let mut storage = MemoryStorage::new();
        storage.set(DEFAULT_KEY, raw).unwrap();
        storage
    }

    #[test]
    fn test_round_trip_preserves_order_and_fields() {
        let items = vec![
            Item {
                id: "b".to_string(),
                name: "Milk".to_string(),
                completed: true,
            },
            Item::new("a", "Eggs"),
            Item::new("c", ""),
        ];

        let mut storage = MemoryStorage::new();
        save_items(&mut storage, DEFAULT_KEY, &items).unwrap();

        assert_eq!(load_items(&storage, DEFAULT_KEY), items);
    }

    #[test]
    fn test_saved_format() {
        let mut storage = MemoryStorage::new();
        save_items(&mut storage, DEFAULT_KEY, &[Item::new("a", "Eggs")]).unwrap();

        assert_eq!(
            storage.get(DEFAULT_KEY).unwrap().as_deref(),
            Some(r#"[{"id":"a","name":"Eggs","completed":false}]"#)
        );
    }

    #[test]
    fn test_load_missing_key() {
        assert!(load_items(&MemoryStorage::new(), DEFAULT_KEY).is_empty());
    }

    #[test]
    fn test_load_unreadable_storage() {
        // An invalid key makes every backend's get fail
        assert!(load_items(&MemoryStorage::new(), "not a key").is_empty());
    }

    #[test]
    fn test_load_malformed_json() {
        assert!(load_items(&stored("{malformed json}"), DEFAULT_KEY).is_empty());
    }

    #[test]
    fn test_load_null_and_non_array() {
        assert!(load_items(&stored("null"), DEFAULT_KEY).is_empty());
        assert!(load_items(&stored(r#"{"id":"a"}"#), DEFAULT_KEY).is_empty());
        assert!(load_items(&stored("42"), DEFAULT_KEY).is_empty());
    }

    #[test]
    fn test_load_skips_malformed_elements() {
        let storage = stored(
            r#"[{"id":"a","name":"Eggs","completed":false},{"name":"no id"},7,{"id":"b","name":"Milk"}]"#,
        );

        let items = load_items(&storage, DEFAULT_KEY);
        assert_eq!(items, vec![Item::new("a", "Eggs"), Item::new("b", "Milk")]);
    }

    #[test]
    fn test_load_keeps_items_with_null_flag_or_numeric_id() {
        let mut storage = stored(
            r#"[{"id":"a","name":"Eggs","completed":null},{"id":5,"name":"Milk","completed":false}]"#,
        );

        let items = load_items(&storage, DEFAULT_KEY);
        assert_eq!(items, vec![Item::new("a", "Eggs"), Item::new("5", "Milk")]);

        // A save after loading keeps both items
        save_items(&mut storage, DEFAULT_KEY, &items).unwrap();
        assert_eq!(load_items(&storage, DEFAULT_KEY), items);
    }

    #[test]
    fn test_load_skips_duplicate_ids() {
        let storage = stored(
            r#"[{"id":"a","name":"Eggs","completed":false},{"id":"a","name":"Again","completed":true}]"#,
        );

        let items = load_items(&storage, DEFAULT_KEY);
        assert_eq!(items, vec![Item::new("a", "Eggs")]);
    }
}
