//! HTTP 客户端实现模块
//!
//! `GenericHttpClient` speaks the OpenAI chat-completions format and the
//! Anthropic messages format over one `reqwest` client.

#[cfg(feature = "http-clients")]
pub mod generic;

#[cfg(feature = "http-clients")]
pub use generic::GenericHttpClient;
