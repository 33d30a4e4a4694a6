mod error;
mod handlers;
mod params;
mod router;
mod types;

pub use error::{err, HandlerErr};
pub use handlers::core::select_workspace;
pub use router::handle_request;
pub use types::{AppState, Request};
