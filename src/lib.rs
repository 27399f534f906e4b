//! Subflux - subtitle translation service
//!
//! Translates SRT subtitle files through LLM backends, bills users in
//! credits, and serves streaming (server-sent events) and batch translation
//! over HTTP.

pub mod batch;
pub mod billing;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod model;
pub mod server;
pub mod storage;
pub mod store;
pub mod stream;
pub mod subtitle;
pub mod translate;

#[cfg(test)]
mod test_support;
