mod app;
mod middleware;
mod state;

pub use app::create_app;
pub use middleware::{api_key_auth, extract_bearer_token, Operator};
pub use state::AppState;
