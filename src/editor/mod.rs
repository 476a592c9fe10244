//! Interactive block editor sessions.
//!
//! A session walks `Draft -> Previewed -> Saved | Cancelled | Expired`:
//! every accepted edit regenerates the preview, saving persists the block
//! through a [`BlockRepository`](crate::blocks::BlockRepository), and idle
//! sessions are expired by the reaper (or on their next access) leaving an
//! expiry notice behind.

mod manager;
mod session;
mod types;

pub use manager::{EditorManager, SweepResult};
pub use session::{EditorSession, MAX_NAME_LEN};
pub use types::{parse_color, EditOperation, EditorError, ExpiryNotice, SessionState};
