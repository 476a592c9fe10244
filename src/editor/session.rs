//! A single editing session and the pure block edits it accepts.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::display::{DisplayBlock, RenderedDisplay};

use super::types::{parse_color, EditOperation, EditorError, SessionState};

/// Upper bound for a block name, in characters
pub const MAX_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Serialize)]
pub struct EditorSession {
    pub id: Uuid,
    pub operator_id: String,
    pub guild_id: String,
    pub name: Option<String>,
    pub block: DisplayBlock,
    pub state: SessionState,
    /// Bumped on every applied edit
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<RenderedDisplay>,
    #[serde(skip)]
    last_activity: Instant,
    /// Set while a save is writing this session's block
    #[serde(skip)]
    pub(super) saving: bool,
}

impl EditorSession {
    pub fn new(
        operator_id: impl Into<String>,
        guild_id: impl Into<String>,
        name: Option<String>,
        block: DisplayBlock,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            operator_id: operator_id.into(),
            guild_id: guild_id.into(),
            name,
            block,
            state: SessionState::Draft,
            revision: 0,
            created_at: now,
            updated_at: now,
            preview: None,
            last_activity: Instant::now(),
            saving: false,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    pub fn is_idle(&self, timeout: Duration) -> bool {
        self.idle_for() >= timeout
    }

    /// Name with surrounding whitespace removed, if any remains.
    pub fn populated_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Normalise an operator-supplied name; blank means "no name yet".
pub fn normalize_name(raw: Option<&str>) -> Result<Option<String>, EditorError> {
    let Some(name) = raw.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    let len = name.chars().count();
    if len > MAX_NAME_LEN {
        return Err(EditorError::Validation(format!(
            "Name is too long: {} characters (max {})",
            len, MAX_NAME_LEN
        )));
    }

    Ok(Some(name.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn check_index(index: usize, len: usize) -> Result<(), EditorError> {
    if index < len {
        Ok(())
    } else if len == 0 {
        Err(EditorError::Validation(format!(
            "Component index {} is out of range: the block has no components",
            index
        )))
    } else {
        Err(EditorError::Validation(format!(
            "Component index {} is out of range (0..={})",
            index,
            len - 1
        )))
    }
}

/// Apply `op` to copies of the name and block.
///
/// Only structural checks happen here (indices, JSON, colour); URL and length
/// validation of the resulting block is left to the caller.
pub fn apply_operation(
    name: &Option<String>,
    block: &DisplayBlock,
    op: EditOperation,
) -> Result<(Option<String>, DisplayBlock), EditorError> {
    let mut name = name.clone();
    let mut block = block.clone();

    match op {
        EditOperation::SetName { name: raw } => {
            name = match normalize_name(Some(&raw))? {
                Some(n) => Some(n),
                None => return Err(EditorError::Validation("Name must not be empty".to_string())),
            };
        }
        EditOperation::SetTitle { title } => {
            block.title = non_blank(title);
        }
        EditOperation::SetColor { color } => {
            block.color = match non_blank(color) {
                Some(raw) => Some(parse_color(&raw)?),
                None => None,
            };
        }
        EditOperation::SetCoverImage { url } => {
            block.cover_image = non_blank(url).map(|u| u.trim().to_string());
        }
        EditOperation::AddComponent { component, index } => {
            let len = block.components.len();
            match index {
                Some(i) if i > len => {
                    return Err(EditorError::Validation(format!(
                        "Cannot insert at index {}: the block has {} components",
                        i, len
                    )));
                }
                Some(i) => block.components.insert(i, component),
                None => block.components.push(component),
            }
        }
        EditOperation::UpdateComponent { index, component } => {
            check_index(index, block.components.len())?;
            block.components[index] = component;
        }
        EditOperation::RemoveComponent { index } => {
            check_index(index, block.components.len())?;
            block.components.remove(index);
        }
        EditOperation::MoveComponent { from, to } => {
            check_index(from, block.components.len())?;
            check_index(to, block.components.len())?;
            let component = block.components.remove(from);
            block.components.insert(to, component);
        }
        EditOperation::ReplaceJson { json } => {
            block = serde_json::from_str(&json)
                .map_err(|e| EditorError::Validation(format!("Invalid block JSON: {}", e)))?;
        }
    }

    Ok((name, block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::BlockComponent;

    fn text(content: &str) -> BlockComponent {
        BlockComponent::Text {
            content: content.to_string(),
        }
    }

    fn block_of(items: &[&str]) -> DisplayBlock {
        DisplayBlock {
            components: items.iter().map(|c| text(c)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_move_component() {
        let (_, block) = apply_operation(
            &None,
            &block_of(&["a", "b", "c"]),
            EditOperation::MoveComponent { from: 0, to: 2 },
        )
        .unwrap();

        assert_eq!(block, block_of(&["b", "c", "a"]));
    }

    #[test]
    fn test_add_at_index_and_bounds() {
        let (_, block) = apply_operation(
            &None,
            &block_of(&["a", "c"]),
            EditOperation::AddComponent {
                component: text("b"),
                index: Some(1),
            },
        )
        .unwrap();
        assert_eq!(block, block_of(&["a", "b", "c"]));

        let err = apply_operation(
            &None,
            &block_of(&["a"]),
            EditOperation::AddComponent {
                component: text("x"),
                index: Some(5),
            },
        )
        .unwrap_err();
        assert!(matches!(err, EditorError::Validation(_)));
    }

    #[test]
    fn test_out_of_range_leaves_input_untouched() {
        let original = block_of(&["a"]);
        let err = apply_operation(&None, &original, EditOperation::RemoveComponent { index: 3 })
            .unwrap_err();

        assert!(err.to_string().contains("out of range"));
        assert_eq!(original, block_of(&["a"]));
    }

    #[test]
    fn test_replace_json_reports_parse_error() {
        let err = apply_operation(
            &None,
            &DisplayBlock::default(),
            EditOperation::ReplaceJson {
                json: "{ not json".to_string(),
            },
        )
        .unwrap_err();

        assert!(err.to_string().starts_with("Invalid block JSON"));
    }

    #[test]
    fn test_set_name_and_clear_fields() {
        let start = DisplayBlock {
            title: Some("t".to_string()),
            color: Some(1),
            ..Default::default()
        };

        let (name, _) = apply_operation(
            &None,
            &start,
            EditOperation::SetName {
                name: "  welcome  ".to_string(),
            },
        )
        .unwrap();
        assert_eq!(name.as_deref(), Some("welcome"));

        let (_, cleared) =
            apply_operation(&None, &start, EditOperation::SetTitle { title: Some(" ".into()) })
                .unwrap();
        assert_eq!(cleared.title, None);

        let (_, cleared) =
            apply_operation(&None, &start, EditOperation::SetColor { color: None }).unwrap();
        assert_eq!(cleared.color, None);

        assert!(apply_operation(&None, &start, EditOperation::SetName { name: "  ".into() }).is_err());
    }

    #[test]
    fn test_name_length_limit() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(normalize_name(Some(&long)).is_err());
        assert_eq!(normalize_name(Some("  ")).unwrap(), None);
    }
}
