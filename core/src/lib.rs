//! Blocking client for the Traceix file-analysis service.
//!
//! # Overview
//! Traceix accepts file uploads for AI-based verdicts, capability
//! extraction, and EXIF extraction, and exposes job-status polling, hash
//! search over analyzed samples, and public IPFS dataset lookups. Every
//! remote operation is an authenticated POST; this crate wraps each one in a
//! method on [`TraceixClient`] and returns the raw JSON body without
//! interpreting it, HTTP status included. Parsing is the caller's business.
//!
//! # Design
//! - [`ClientConfig`] is immutable after construction; environment lookup
//!   happens only in `ClientConfig::from_env` / `ClientConfig::resolve`.
//! - Response bodies are accumulated through the [`ResponseSink`] trait, so
//!   the accumulation path is testable without a network.
//! - Input validation (empty key, empty uuid, unknown search kind) fails
//!   before any I/O; transport and local failures are the only errors.
//!
//! # Example
//! ```no_run
//! use traceix_core::{ClientConfig, TraceixClient};
//!
//! # fn main() -> Result<(), traceix_core::ApiError> {
//! let client = TraceixClient::new(ClientConfig::new("my-key")?)?;
//! let verdict = client.ai_prediction("sample.bin")?;
//! println!("{verdict}");
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use client::TraceixClient;
pub use config::{ClientConfig, DEFAULT_BASE_URL, SDK_VERSION};
pub use error::ApiError;
pub use http::{HttpRequest, RequestBody, ResponseBuffer, ResponseSink};
pub use types::{FullUpload, SearchKind};
