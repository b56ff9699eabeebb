// pse-grid-api: Async client for the PSE transmission-map endpoint

pub mod client;
pub mod error;
pub mod transport;

pub use client::{BASE_API_URL, PseClient};
pub use error::Error;
pub use transport::TransportConfig;
