//! Type-safe identifier wrappers.
//!
//! Tables are small positive integers assigned by the restaurant. Table `0`
//! is reserved by the kitchen backend for events it cannot attribute to a
//! real table, so [`TableId`] keeps the raw signed value and lets callers
//! decide how to bucket non-positive numbers.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Identifier of a physical restaurant table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct TableId(#[ts(type = "number")] pub i64);

impl TableId {
    /// The reserved "global / unknown table" bucket.
    pub const UNKNOWN: Self = Self(0);

    /// Create a table identifier from its number.
    pub const fn new(number: i64) -> Self {
        Self(number)
    }

    /// Return the raw table number.
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Whether this identifier names a real table (strictly positive).
    pub const fn is_attributable(self) -> bool {
        self.0 > 0
    }
}

impl core::fmt::Display for TableId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for TableId {
    fn from(number: i64) -> Self {
        Self(number)
    }
}

impl From<u32> for TableId {
    fn from(number: u32) -> Self {
        Self(i64::from(number))
    }
}

impl From<TableId> for i64 {
    fn from(id: TableId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_positive_tables_are_attributable() {
        assert!(TableId::new(1).is_attributable());
        assert!(TableId::new(12).is_attributable());
        assert!(!TableId::UNKNOWN.is_attributable());
        assert!(!TableId::new(-3).is_attributable());
    }

    #[test]
    fn serializes_as_bare_number() {
        let json = serde_json::to_string(&TableId::new(3)).unwrap_or_default();
        assert_eq!(json, "3");
    }

    #[test]
    fn display_is_the_number() {
        assert_eq!(TableId::from(4_u32).to_string(), "4");
    }
}
