//! Shortcut discovery payloads.

use serde::{Deserialize, Serialize};

/// Host asks for the discovered shortcut list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListShortcuts {
    /// Correlates the eventual [`ShortcutList`] response.
    pub message_id: u64,
}

/// A single discovered shortcut (Start Menu entry, desktop `.lnk`, etc.).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutDescriptor {
    /// Display name shown to the host-side user.
    pub display_name: String,
    /// Path to the target executable.
    pub target_path: String,
    /// Command-line arguments baked into the shortcut, if any.
    pub arguments: Vec<String>,
    /// Path to the `.ico`/`.lnk` file the shortcut was discovered from.
    pub source_path: String,
}

/// Guest reports a newly discovered shortcut, outside of a request/response.
pub type ShortcutDetected = ShortcutDescriptor;

/// Guest returns the discovered shortcut list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutList {
    /// Echoes the originating [`ListShortcuts::message_id`].
    pub message_id: u64,
    /// Every shortcut discovered so far.
    pub shortcuts: Vec<ShortcutDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcut_list_round_trips_through_json() {
        let list = ShortcutList {
            message_id: 5,
            shortcuts: vec![ShortcutDescriptor {
                display_name: "Notepad".into(),
                target_path: "C:\\Windows\\notepad.exe".into(),
                arguments: vec![],
                source_path: "C:\\ProgramData\\Microsoft\\Windows\\Start Menu\\Notepad.lnk".into(),
            }],
        };
        let json = serde_json::to_string(&list).expect("serialize");
        let back: ShortcutList = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(list, back);
    }
}
