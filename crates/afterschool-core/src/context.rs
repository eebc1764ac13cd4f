//! Bounded contexts of the Afterschool platform.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An independently-owned business module with its own data and rules.
///
/// Contexts never call each other directly; they learn about each other's
/// state changes only through integration events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Context {
    /// User accounts and credentials.
    Accounts,
    /// Parent profiles and their children.
    Family,
    /// Attendance records and behavioral notes.
    Participation,
    /// Conversations between parents and providers.
    Messaging,
    /// Programs, sessions and their policies.
    Catalog,
}

impl Context {
    /// Every context, in a stable order.
    pub const ALL: [Self; 5] = [
        Self::Accounts,
        Self::Family,
        Self::Participation,
        Self::Messaging,
        Self::Catalog,
    ];

    /// Returns the symbolic name used in topics and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accounts => "accounts",
            Self::Family => "family",
            Self::Participation => "participation",
            Self::Messaging => "messaging",
            Self::Catalog => "catalog",
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
