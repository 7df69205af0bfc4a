//! Window identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle for a tracked window.
///
/// Issued by the (out-of-scope) window tracker and stable for the window's
/// lifetime. Never reused across the agent's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

impl WindowId {
    /// Creates a window identity from a raw handle value.
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit handle value.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

impl From<u64> for WindowId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_id_round_trips_through_raw() {
        let id = WindowId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(WindowId::from(42u64), id);
    }
}
