//! Engine table names.

use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use super::BlockId;

/// Prefix of every table or view materialized on behalf of a block.
pub const DERIVED_TABLE_PREFIX: &str = "temp_";

/// Name of a table or view in the engine's namespace.
///
/// Either a source table registered from ingested data, or a derived table
/// named `temp_<block id>` produced by executing a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Display, From, Into)]
#[serde(transparent)]
pub struct TableName(String);

impl TableName {
    /// Creates a table name from any string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the deterministic output table name of a block.
    pub fn derived(block_id: BlockId) -> Self {
        Self(format!("{DERIVED_TABLE_PREFIX}{}", block_id.simple()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether this name follows the derived naming scheme.
    pub fn is_derived(&self) -> bool {
        self.0.starts_with(DERIVED_TABLE_PREFIX)
    }

    /// Returns whether the name is a plain SQL identifier: an ASCII letter or
    /// underscore followed by letters, digits or underscores.
    pub fn is_plain_identifier(&self) -> bool {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TableName {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn derived_name_is_plain_identifier() {
        let id = BlockId::from_uuid(Uuid::from_u128(0xabc));
        let name = TableName::derived(id);

        assert_eq!(name.as_str(), "temp_00000000000000000000000000000abc");
        assert!(name.is_derived());
        assert!(name.is_plain_identifier());
    }

    #[test]
    fn plain_identifier_rules() {
        assert!(TableName::from("sales_2024").is_plain_identifier());
        assert!(TableName::from("_raw").is_plain_identifier());
        assert!(!TableName::from("2024_sales").is_plain_identifier());
        assert!(!TableName::from("sales data").is_plain_identifier());
        assert!(!TableName::from("t; DROP TABLE x").is_plain_identifier());
        assert!(!TableName::from("").is_plain_identifier());
    }
}
