//! Display blocks: the authored tree, its validation, and rendering to a
//! Components v2 message payload.

mod components_v2;
mod renderer;
mod types;
mod url;

pub use components_v2::{
    message_payload, truncate_chars, MAX_V2_COMPONENTS, TEXT_DISPLAY_LIMIT, V2_FLAG,
};
pub use renderer::{DisplayRenderer, OmitReason, OmittedElement, RenderedDisplay};
pub use types::{BlockComponent, BlockValidationError, DisplayBlock, SectionAccessory};
pub use self::url::{is_http_url, is_valid_url_or_token};
