use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A bank record from the upstream `/api/aspsps/` listing.
///
/// Only `id` and `name` are interpreted; every other upstream field is kept in
/// `extra` so re-serializing the record loses nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    pub id: String,
    pub name: String,
    /// Resolved from the local logo table, never sent by the upstream API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_link: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Bank {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            logo_link: None,
            extra: Map::new(),
        }
    }
}
