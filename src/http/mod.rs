//! HTTP API: router, shared state and request handlers.

mod handlers;
mod router;

pub use handlers::{handle, root, search, AppState, ROOT_MESSAGE};
pub use router::router;
