//! Renders an authored block into a Components v2 payload.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;

use crate::metrics::RenderMetrics;
use crate::variables::{VariableContext, VariableRegistry};

use super::components_v2::{
    action_row, component_count, container, link_button, media_gallery, message_payload,
    section, separator, text_display, thumbnail, MAX_V2_COMPONENTS,
};
use super::types::{BlockComponent, DisplayBlock, SectionAccessory};
use super::url::{is_http_url, is_valid_url_or_token};

/// Why an optional element was left out of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OmitReason {
    /// Authored value is neither a URL nor a single variable
    InvalidUrl,
    /// Substitution did not produce an http(s) URL
    UnresolvedUrl,
    /// Text rendered to nothing
    EmptyText,
    /// No room left under the message component limit
    ComponentLimit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OmittedElement {
    pub path: String,
    pub reason: OmitReason,
}

/// Output of a render: the message body plus what was dropped from it.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedDisplay {
    pub payload: Value,
    pub omitted: Vec<OmittedElement>,
}

#[derive(Default)]
struct Rendered {
    value: Option<Value>,
    omitted: Vec<OmittedElement>,
}

impl Rendered {
    fn value(value: Value) -> Self {
        Self {
            value: Some(value),
            omitted: Vec::new(),
        }
    }

    fn omit(path: String, reason: OmitReason) -> Self {
        Self {
            value: None,
            omitted: vec![OmittedElement { path, reason }],
        }
    }
}

/// Walks a [`DisplayBlock`], substituting every string field.
///
/// URL fields must pass the URL gate before substitution and yield an http(s)
/// URL after it; otherwise the element is dropped instead of being sent
/// malformed.
pub struct DisplayRenderer {
    registry: Arc<VariableRegistry>,
}

impl DisplayRenderer {
    pub fn new(registry: Arc<VariableRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<VariableRegistry> {
        &self.registry
    }

    #[tracing::instrument(
        name = "display.render",
        skip_all,
        fields(components = block.components.len())
    )]
    pub async fn render(&self, block: &DisplayBlock, ctx: &VariableContext) -> RenderedDisplay {
        let start = Instant::now();

        let cover = async {
            match &block.cover_image {
                Some(url) => match self.resolve_url(url, ctx).await {
                    Ok(url) => Rendered::value(media_gallery(&[url])),
                    Err(reason) => Rendered::omit("cover_image".to_string(), reason),
                },
                None => Rendered::default(),
            }
        };

        let title = async {
            match &block.title {
                Some(title) => {
                    let text = self.registry.replace(title, ctx).await;
                    if text.trim().is_empty() {
                        Rendered::omit("title".to_string(), OmitReason::EmptyText)
                    } else {
                        Rendered::value(text_display(&format!("## {}", text)))
                    }
                }
                None => Rendered::default(),
            }
        };

        let components = join_all(
            block
                .components
                .iter()
                .enumerate()
                .map(|(index, component)| self.render_component(index, component, ctx)),
        );

        let (cover, title, components) = futures::join!(cover, title, components);

        let parts = [("cover_image".to_string(), cover), ("title".to_string(), title)]
            .into_iter()
            .chain(
                components
                    .into_iter()
                    .enumerate()
                    .map(|(index, rendered)| (format!("components[{}]", index), rendered)),
            );

        // The container itself takes one slot
        let budget = MAX_V2_COMPONENTS - 1;
        let mut used = 0;
        let mut cut = false;
        let mut inner = Vec::new();
        let mut omitted = Vec::new();
        for (path, rendered) in parts {
            omitted.extend(rendered.omitted);
            let Some(value) = rendered.value else {
                continue;
            };

            // Once something is cut, everything after it is too, keeping authored order
            let count = component_count(&value);
            if cut || used + count > budget {
                cut = true;
                omitted.push(OmittedElement {
                    path,
                    reason: OmitReason::ComponentLimit,
                });
                continue;
            }

            used += count;
            inner.push(value);
        }

        if cut {
            tracing::warn!(
                max = MAX_V2_COMPONENTS,
                "Rendered block exceeds component limit, trailing elements dropped"
            );
        }

        RenderMetrics::record_render(start.elapsed().as_secs_f64(), inner.len(), omitted.len());

        if !omitted.is_empty() {
            tracing::debug!(omitted = ?omitted, "Dropped elements from rendered block");
        }

        RenderedDisplay {
            payload: message_payload(vec![container(inner, block.color)]),
            omitted,
        }
    }

    async fn render_component(
        &self,
        index: usize,
        component: &BlockComponent,
        ctx: &VariableContext,
    ) -> Rendered {
        let path = format!("components[{}]", index);

        match component {
            BlockComponent::Text { content } => {
                let text = self.registry.replace(content, ctx).await;
                if text.trim().is_empty() {
                    Rendered::omit(path, OmitReason::EmptyText)
                } else {
                    Rendered::value(text_display(&text))
                }
            }
            BlockComponent::Section { content, accessory } => {
                let (text, accessory) = futures::join!(
                    self.registry.replace(content, ctx),
                    self.render_accessory(accessory.as_ref(), ctx)
                );

                if text.trim().is_empty() {
                    return Rendered::omit(path, OmitReason::EmptyText);
                }

                match accessory {
                    Some(Ok(accessory)) => Rendered::value(section(&text, accessory)),
                    // A section cannot exist without its accessory; keep the text
                    Some(Err(reason)) => Rendered {
                        value: Some(text_display(&text)),
                        omitted: vec![OmittedElement {
                            path: format!("{}.accessory", path),
                            reason,
                        }],
                    },
                    None => Rendered::value(text_display(&text)),
                }
            }
            BlockComponent::Separator { divider, spacing } => {
                Rendered::value(separator(*divider, *spacing))
            }
            BlockComponent::Image { url } => match self.resolve_url(url, ctx).await {
                Ok(url) => Rendered::value(media_gallery(&[url])),
                Err(reason) => Rendered::omit(path, reason),
            },
            BlockComponent::Gallery { urls } => {
                let resolved = join_all(urls.iter().map(|u| self.resolve_url(u, ctx))).await;

                let mut kept = Vec::new();
                let mut omitted = Vec::new();
                for (item, result) in resolved.into_iter().enumerate() {
                    match result {
                        Ok(url) => kept.push(url),
                        Err(reason) => omitted.push(OmittedElement {
                            path: format!("{}.urls[{}]", path, item),
                            reason,
                        }),
                    }
                }

                Rendered {
                    value: (!kept.is_empty()).then(|| media_gallery(&kept)),
                    omitted,
                }
            }
            BlockComponent::LinkButton { label, url, emoji } => {
                let (label, url) =
                    futures::join!(self.registry.replace(label, ctx), self.resolve_url(url, ctx));

                match url {
                    Ok(url) => {
                        let label = if label.trim().is_empty() { url.clone() } else { label };
                        Rendered::value(action_row(vec![link_button(
                            &label,
                            &url,
                            emoji.as_deref(),
                        )]))
                    }
                    Err(reason) => Rendered::omit(path, reason),
                }
            }
        }
    }

    async fn render_accessory(
        &self,
        accessory: Option<&SectionAccessory>,
        ctx: &VariableContext,
    ) -> Option<Result<Value, OmitReason>> {
        match accessory? {
            SectionAccessory::Thumbnail { url } => {
                Some(self.resolve_url(url, ctx).await.map(|url| thumbnail(&url)))
            }
            SectionAccessory::LinkButton { label, url } => {
                let (label, url) =
                    futures::join!(self.registry.replace(label, ctx), self.resolve_url(url, ctx));
                Some(url.map(|url| {
                    let label = if label.trim().is_empty() { url.clone() } else { label };
                    link_button(&label, &url, None)
                }))
            }
        }
    }

    async fn resolve_url(&self, raw: &str, ctx: &VariableContext) -> Result<String, OmitReason> {
        if !is_valid_url_or_token(raw, &self.registry) {
            return Err(OmitReason::InvalidUrl);
        }

        let resolved = self.registry.replace(raw.trim(), ctx).await;
        let resolved = resolved.trim();
        if is_http_url(resolved) {
            Ok(resolved.to_string())
        } else {
            Err(OmitReason::UnresolvedUrl)
        }
    }
}
