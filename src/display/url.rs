//! URL gate for image, thumbnail and link fields.

use url::Url;

use crate::variables::VariableRegistry;

/// Whether `value` parses as an absolute http(s) URL with a host.
pub fn is_http_url(value: &str) -> bool {
    match Url::parse(value.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

/// Accept a literal http(s) URL, or exactly one registered token (such as
/// `user.avatar`) expected to resolve to one.
pub fn is_valid_url_or_token(value: &str, registry: &VariableRegistry) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && (is_http_url(trimmed) || registry.contains(trimmed))
}
