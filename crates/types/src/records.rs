use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A single record as exchanged with the record service.
pub type Row = Map<String, Value>;

/// Identifier returned by the record service after an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Created {
    pub id: Uuid,
}

/// Conjunction of field equality clauses used by `list_where` / `delete_where`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    clauses: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality clause. Later clauses on the same field are all required to hold.
    pub fn eq<K: Into<String>, V: Into<Value>>(mut self, field: K, value: V) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Missing fields compare equal to `null`.
    pub fn matches(&self, row: &Row) -> bool {
        self.clauses
            .iter()
            .all(|(field, expected)| row.get(field).unwrap_or(&Value::Null) == expected)
    }
}

/// Read the `id` column of a row as a UUID.
pub fn row_id(row: &Row) -> Option<Uuid> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}
