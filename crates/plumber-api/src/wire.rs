//! Shapes shared by several domains.

use serde::{Deserialize, Deserializer};

/// Plain acknowledgement returned by mutating methods.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Ack {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Decode a list that the server may send as `null` when empty.
pub(crate) fn nullable_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
