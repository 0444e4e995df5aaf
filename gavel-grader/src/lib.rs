//! # gavel-grader
//!
//! The sole channel through which non-determinism and transient failure
//! enter a gavel run:
//!
//! - [`GraderClient`]: `complete(messages) -> text`, safe for concurrent use
//! - [`ChatGrader`]: OpenAI-compatible `/chat/completions` implementation
//!   with automatic retry and exponential backoff
//! - [`GraderError`]: the transient / exhausted / auth / invalid-input
//!   taxonomy the orchestrator isolates per pair
//! - [`MockGrader`] / [`FnGrader`]: scripted graders for tests

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod chat;
pub mod client;
pub mod error;
pub mod mock;
pub mod retry;

pub use chat::{ChatGrader, GraderConfig};
pub use client::{GraderClient, SharedGrader};
pub use error::{GraderError, GraderResult};
pub use mock::{FnGrader, MockGrader};
pub use retry::{with_retry, RetryConfig};
