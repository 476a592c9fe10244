//! Authored display block tree and its validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::variables::VariableRegistry;

use super::components_v2::{MAX_V2_COMPONENTS, TEXT_DISPLAY_LIMIT};
use super::url::is_valid_url_or_token;

/// Reasons an authored block is rejected by the editor.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockValidationError {
    #[error("{field} must be a valid http(s) URL or a single variable, got '{value}'")]
    InvalidUrl { field: String, value: String },

    #[error("Too many components: the rendered message would hold {count} (max {max}, counting the container, title, cover and nested parts)")]
    TooManyComponents { count: usize, max: usize },

    #[error("{field} is too long: {len} characters (max {max})")]
    TextTooLong { field: String, len: usize, max: usize },

    #[error("{field} must not be empty")]
    Empty { field: String },
}

/// A block as authored in the editor, before substitution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Container accent colour, `0xRRGGBB`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,

    /// Image shown above everything else
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,

    #[serde(default)]
    pub components: Vec<BlockComponent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockComponent {
    Text {
        content: String,
    },
    Section {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        accessory: Option<SectionAccessory>,
    },
    Separator {
        #[serde(default = "default_divider")]
        divider: bool,
        /// 1 = small, 2 = large
        #[serde(default = "default_spacing")]
        spacing: u8,
    },
    Image {
        url: String,
    },
    Gallery {
        urls: Vec<String>,
    },
    LinkButton {
        label: String,
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        emoji: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionAccessory {
    Thumbnail { url: String },
    LinkButton { label: String, url: String },
}

fn default_divider() -> bool {
    true
}

fn default_spacing() -> u8 {
    1
}

impl BlockComponent {
    /// Short name used in error messages and omission reports
    pub fn kind(&self) -> &'static str {
        match self {
            BlockComponent::Text { .. } => "text",
            BlockComponent::Section { .. } => "section",
            BlockComponent::Separator { .. } => "separator",
            BlockComponent::Image { .. } => "image",
            BlockComponent::Gallery { .. } => "gallery",
            BlockComponent::LinkButton { .. } => "link_button",
        }
    }

    /// Components this renders to when every element is kept.
    pub fn rendered_count(&self) -> usize {
        match self {
            // section + text display + accessory
            BlockComponent::Section {
                accessory: Some(_), ..
            } => 3,
            // action row + button
            BlockComponent::LinkButton { .. } => 2,
            _ => 1,
        }
    }

    fn url_fields(&self) -> Vec<&str> {
        match self {
            BlockComponent::Section {
                accessory: Some(SectionAccessory::Thumbnail { url }),
                ..
            }
            | BlockComponent::Section {
                accessory: Some(SectionAccessory::LinkButton { url, .. }),
                ..
            }
            | BlockComponent::Image { url }
            | BlockComponent::LinkButton { url, .. } => vec![url.as_str()],
            BlockComponent::Gallery { urls } => urls.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    fn text_fields(&self) -> Vec<&str> {
        match self {
            BlockComponent::Text { content } | BlockComponent::Section { content, .. } => {
                vec![content.as_str()]
            }
            _ => Vec::new(),
        }
    }
}

impl DisplayBlock {
    /// Upper bound of components in the rendered message: the container,
    /// the title and cover when set, and every authored component with its
    /// nested parts.
    pub fn rendered_count(&self) -> usize {
        1 + usize::from(self.title.is_some())
            + usize::from(self.cover_image.is_some())
            + self
                .components
                .iter()
                .map(BlockComponent::rendered_count)
                .sum::<usize>()
    }

    /// Check URL fields, text lengths and the component count.
    ///
    /// Variables are only checked for URL fields; text fields may contain any
    /// mix of literal text and tokens.
    pub fn validate(
        &self,
        registry: &VariableRegistry,
        max_components: usize,
    ) -> Result<(), BlockValidationError> {
        let max = max_components.min(MAX_V2_COMPONENTS);
        let count = self.rendered_count();
        if count > max {
            return Err(BlockValidationError::TooManyComponents { count, max });
        }

        if let Some(url) = &self.cover_image {
            check_url("cover_image", url, registry)?;
        }

        if let Some(title) = &self.title {
            check_length("title", title)?;
        }

        for (index, component) in self.components.iter().enumerate() {
            let name = format!("components[{}] ({})", index, component.kind());

            for url in component.url_fields() {
                check_url(&name, url, registry)?;
            }
            for text in component.text_fields() {
                if text.trim().is_empty() {
                    return Err(BlockValidationError::Empty { field: name });
                }
                check_length(&name, text)?;
            }
        }

        Ok(())
    }
}

fn check_url(field: &str, value: &str, registry: &VariableRegistry) -> Result<(), BlockValidationError> {
    if is_valid_url_or_token(value, registry) {
        Ok(())
    } else {
        Err(BlockValidationError::InvalidUrl {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

fn check_length(field: &str, value: &str) -> Result<(), BlockValidationError> {
    let len = value.chars().count();
    if len > TEXT_DISPLAY_LIMIT {
        return Err(BlockValidationError::TextTooLong {
            field: field.to_string(),
            len,
            max: TEXT_DISPLAY_LIMIT,
        });
    }
    Ok(())
}
