pub mod client;
pub mod error;
pub mod types;

pub use client::{ApiClient, DEFAULT_API_URL, DEFAULT_TIMEOUT};
pub use error::ApiError;
pub use types::{LoginRequest, LoginResponse, RegisterRequest};
