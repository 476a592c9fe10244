/// Discord Components v2 payload builders.
///
/// Components v2 messages are plain JSON: the v2 flag (`1 << 15` in message
/// flags) tells Discord to interpret the `components` array as layout blocks
/// rather than legacy action rows.
use serde_json::{json, Value};
use tracing::warn;

/// Components v2 message flag (IS_COMPONENTS_V2 = 1 << 15).
pub const V2_FLAG: u64 = 1 << 15;

/// Maximum components per v2 message.
pub const MAX_V2_COMPONENTS: usize = 40;

/// Maximum characters in a single TextDisplay content.
pub const TEXT_DISPLAY_LIMIT: usize = 4000;

/// Maximum characters in a button label.
pub const BUTTON_LABEL_LIMIT: usize = 80;

/// Cut `content` to at most `limit` characters on a char boundary.
pub fn truncate_chars(content: &str, limit: usize) -> String {
    match content.char_indices().nth(limit) {
        Some((byte_index, _)) => content[..byte_index].to_string(),
        None => content.to_string(),
    }
}

/// Build an `ActionRow` component (type 1).
pub fn action_row(components: Vec<Value>) -> Value {
    json!({
        "type": 1,
        "components": components,
    })
}

/// Build a link `Button` component (type 2, style 5).
pub fn link_button(label: &str, url: &str, emoji: Option<&str>) -> Value {
    let mut obj = json!({
        "type": 2,
        "style": 5,
        "label": truncate_chars(label, BUTTON_LABEL_LIMIT),
        "url": url,
    });
    if let Some(emoji) = emoji.filter(|e| !e.is_empty()) {
        obj["emoji"] = json!({ "name": emoji });
    }
    obj
}

/// Build a `Section` component (type 9): text with a side accessory.
pub fn section(content: &str, accessory: Value) -> Value {
    json!({
        "type": 9,
        "components": [text_display(content)],
        "accessory": accessory,
    })
}

/// Build a `TextDisplay` component (type 10).
pub fn text_display(content: &str) -> Value {
    json!({
        "type": 10,
        "content": truncate_chars(content, TEXT_DISPLAY_LIMIT),
    })
}

/// Build a `Thumbnail` component (type 11).
pub fn thumbnail(url: &str) -> Value {
    json!({
        "type": 11,
        "media": { "url": url },
    })
}

/// Build a `MediaGallery` component (type 12).
pub fn media_gallery(urls: &[String]) -> Value {
    let items: Vec<Value> = urls
        .iter()
        .map(|url| json!({ "media": { "url": url } }))
        .collect();
    json!({
        "type": 12,
        "items": items,
    })
}

/// Build a `Separator` component (type 14).
pub fn separator(divider: bool, spacing: u8) -> Value {
    json!({
        "type": 14,
        "divider": divider,
        "spacing": spacing.clamp(1, 2),
    })
}

/// Build a `Container` component (type 17) wrapping inner components.
pub fn container(components: Vec<Value>, accent_color: Option<u32>) -> Value {
    let mut obj = json!({
        "type": 17,
        "components": components,
    });
    if let Some(color) = accent_color {
        obj["accent_color"] = json!(color);
    }
    obj
}

/// Number of components `value` contributes to the message limit.
///
/// Discord counts every nested component: a container's children, a
/// section's text displays and its accessory, the buttons in an action row.
/// Media gallery items are not components.
pub fn component_count(value: &Value) -> usize {
    let children: usize = value
        .get("components")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(component_count).sum())
        .unwrap_or(0);
    let accessory = value.get("accessory").map(component_count).unwrap_or(0);

    1 + children + accessory
}

/// Wrap top-level components into a v2 message body.
///
/// Top-level components are kept in order while the nested total stays within
/// `MAX_V2_COMPONENTS` (Discord limit); the rest are dropped.
pub fn message_payload(components: Vec<Value>) -> Value {
    let mut total = 0;
    let mut kept = Vec::with_capacity(components.len());
    for component in components {
        let count = component_count(&component);
        if total + count > MAX_V2_COMPONENTS {
            warn!(
                "v2 message exceeds {} components, dropping the remaining top-level components",
                MAX_V2_COMPONENTS
            );
            break;
        }
        total += count;
        kept.push(component);
    }

    json!({
        "flags": V2_FLAG,
        "components": kept,
    })
}
