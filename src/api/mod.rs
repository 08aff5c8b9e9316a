//! HTTP API for the rota allocation engine.
//!
//! A single endpoint, `POST /allocate`, runs one allocation against the
//! configuration held in [`AppState`].

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{AllocationRequest, SolveOptions};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
