//! HTTP access to the asset backend.
//!
//! `ApiClient` is the transport (headers, retry, error mapping); `ApiStore`
//! binds it to a validated base URL and implements the asset endpoints.

mod client;
mod http;
mod store;
mod types;

pub use client::ApiClient;
pub(crate) use http::{add_jitter, backoff_delay};
pub use store::ApiStore;
