//! Listed securities as they appear in exchange symbol directories.

use serde::{Deserialize, Serialize};

/// A row from an exchange listing: ticker plus optional security name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedSecurity {
    pub symbol: String,
    pub name: Option<String>,
}

impl ListedSecurity {
    pub fn new(symbol: impl Into<String>, name: Option<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name,
        }
    }

    /// Name if present, empty string otherwise.
    pub fn name_or_empty(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}
