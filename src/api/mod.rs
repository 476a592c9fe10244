//! API layer - HTTP endpoint handlers organized by domain.

mod blocks;
mod display;
mod editor;
mod health;
mod metrics;
mod routes;
mod variables;

pub use blocks::{delete_block, get_block, list_blocks, render_block};
pub use display::render_display;
pub use editor::{apply_edit, cancel_session, get_session, open_session, save_session};
pub use health::health;
pub use metrics::prometheus_metrics;
pub use routes::{api_routes, public_routes};
pub use variables::{list_variables, replace_variables};
