//! LLM 客户端模块
//!
//! Nodes talk to language models only through [`LlmClient`]. The HTTP
//! implementation lives behind the `http-clients` feature.

mod client;
pub mod http;
mod types;

pub use client::{DynLlmClient, LlmClient};
pub use types::{ApiFormat, LlmRequest, LlmResponse};

#[cfg(feature = "http-clients")]
pub use http::GenericHttpClient;
