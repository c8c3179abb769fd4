// Shopping list item and id generation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A single shopping list entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique, opaque identifier (time-ordered for items created here)
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Older clients omit the flag, or store `null`, for items never checked
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
}

/// Ids written by other clients may be bare JSON numbers
fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            completed: false,
        }
    }

    /// Creation time encoded in the id
    ///
    /// Only UUID v7 ids carry a timestamp. Ids written by other clients
    /// (e.g. base-36 millisecond strings) return `None`.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let uuid = Uuid::parse_str(&self.id).ok()?;
        let (secs, nanos) = uuid.get_timestamp()?.to_unix();
        DateTime::from_timestamp(secs as i64, nanos)
    }
}

/// Source of fresh item ids
pub trait IdGenerator {
    /// Return an id that has never been returned before by this generator
    fn fresh_id(&mut self) -> String;
}

/// UUID v7 ids: millisecond timestamp prefix plus random bits
///
/// The uuid crate keeps a process-wide counter for v7, so two ids generated
/// in the same millisecond still compare in generation order.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV7Ids;

impl IdGenerator for UuidV7Ids {
    fn fresh_id(&mut self) -> String {
        Uuid::now_v7().to_string()
    }
}

/// Deterministic ids for tests and fixtures: `{prefix}{n}`
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn fresh_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}
