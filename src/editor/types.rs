//! Editor states, operations and errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::blocks::BlockStoreError;
use crate::display::BlockComponent;

/// Lifecycle of one editing session.
///
/// `Draft -> Previewed -> Saved | Cancelled | Expired`. The last three are
/// terminal: the session is discarded when it reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Draft,
    Previewed,
    Saved,
    Cancelled,
    Expired,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Draft => "draft",
            SessionState::Previewed => "previewed",
            SessionState::Saved => "saved",
            SessionState::Cancelled => "cancelled",
            SessionState::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Saved | SessionState::Cancelled | SessionState::Expired
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operator action, as submitted from a modal or button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOperation {
    SetName {
        name: String,
    },
    /// `None` or blank clears the title
    SetTitle {
        #[serde(default)]
        title: Option<String>,
    },
    /// `#RRGGBB`, `0xRRGGBB`, `RRGGBB` or a decimal value; `None` or blank clears it
    SetColor {
        #[serde(default)]
        color: Option<String>,
    },
    SetCoverImage {
        #[serde(default)]
        url: Option<String>,
    },
    /// Appends unless `index` is given
    AddComponent {
        component: BlockComponent,
        #[serde(default)]
        index: Option<usize>,
    },
    UpdateComponent {
        index: usize,
        component: BlockComponent,
    },
    RemoveComponent {
        index: usize,
    },
    MoveComponent {
        from: usize,
        to: usize,
    },
    /// Raw block JSON typed into a modal
    ReplaceJson {
        json: String,
    },
}

impl EditOperation {
    pub fn name(&self) -> &'static str {
        match self {
            EditOperation::SetName { .. } => "set_name",
            EditOperation::SetTitle { .. } => "set_title",
            EditOperation::SetColor { .. } => "set_color",
            EditOperation::SetCoverImage { .. } => "set_cover_image",
            EditOperation::AddComponent { .. } => "add_component",
            EditOperation::UpdateComponent { .. } => "update_component",
            EditOperation::RemoveComponent { .. } => "remove_component",
            EditOperation::MoveComponent { .. } => "move_component",
            EditOperation::ReplaceJson { .. } => "replace_json",
        }
    }
}

/// What an operator sees in place of a session that timed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiryNotice {
    pub session_id: Uuid,
    pub operator_id: String,
    pub guild_id: String,
    pub name: Option<String>,
    pub expired_at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum EditorError {
    /// Operator input was rejected; the session is unchanged
    #[error("{0}")]
    Validation(String),

    #[error("Editor session {0} not found")]
    NotFound(Uuid),

    #[error("Block '{0}' not found")]
    BlockNotFound(String),

    #[error("Editor session {0} belongs to another operator")]
    Forbidden(Uuid),

    #[error("{}", .0.message)]
    Expired(Box<ExpiryNotice>),

    #[error("Cannot {action} a session in state '{state}'")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },

    #[error("Editor session {0} was modified concurrently, retry the edit")]
    Conflict(Uuid),

    #[error("Editor session {0} is being saved, retry once the save completes")]
    SaveInProgress(Uuid),

    /// Storage failed while saving; the session stays open for a retry
    #[error("Failed to save block: {0}")]
    Persistence(#[from] BlockStoreError),
}

/// Parse an operator-typed colour into `0xRRGGBB`.
pub fn parse_color(raw: &str) -> Result<u32, EditorError> {
    let value = raw.trim();
    let invalid = || {
        EditorError::Validation(format!(
            "Invalid colour '{}': use #RRGGBB, 0xRRGGBB or a number up to 16777215",
            raw
        ))
    };

    let hex = value
        .strip_prefix('#')
        .or_else(|| value.strip_prefix("0x"))
        .or_else(|| value.strip_prefix("0X"));

    let parsed = match hex {
        Some(digits) if digits.len() == 6 => u32::from_str_radix(digits, 16).ok(),
        Some(_) => None,
        None if value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit()) => {
            u32::from_str_radix(value, 16).ok()
        }
        None => value.parse::<u32>().ok(),
    };

    parsed.filter(|c| *c <= 0xFF_FFFF).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff0000").unwrap(), 0xff0000);
        assert_eq!(parse_color("0x00FF00").unwrap(), 0x00ff00);
        assert_eq!(parse_color(" 0000ff ").unwrap(), 0x0000ff);
        assert_eq!(parse_color("255").unwrap(), 255);
        assert!(parse_color("#fff").is_err());
        assert!(parse_color("red").is_err());
        assert!(parse_color("16777216").is_err());
    }

    #[test]
    fn test_operation_tagged_by_op() {
        let op: EditOperation = serde_json::from_value(json!({
            "op": "add_component",
            "component": { "type": "text", "content": "hi" }
        }))
        .unwrap();

        assert_eq!(op.name(), "add_component");
        assert!(matches!(op, EditOperation::AddComponent { index: None, .. }));

        let op: EditOperation =
            serde_json::from_value(json!({ "op": "move_component", "from": 2, "to": 0 })).unwrap();
        assert_eq!(op, EditOperation::MoveComponent { from: 2, to: 0 });
    }

    #[test]
    fn test_terminal_states() {
        assert!(!SessionState::Draft.is_terminal());
        assert!(!SessionState::Previewed.is_terminal());
        assert!(SessionState::Saved.is_terminal());
        assert!(SessionState::Expired.is_terminal());
    }
}
