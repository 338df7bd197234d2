//! Ports implemented by infrastructure crates

mod api_client;

pub use api_client::{ApiClient, ApiResult, MessageQuery};
