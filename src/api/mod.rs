// HTTP API module
//
// Numan Thabit 2025 Nov

pub mod error;
pub mod payloads;
pub mod router;

pub use error::{ApiError, ErrorResponse};
pub use router::create_api_router;
