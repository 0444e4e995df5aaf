//! Scripted graders for testing.
//!
//! [`MockGrader`] replays a queue of canned replies or failures;
//! [`FnGrader`] delegates to a closure when the reply must depend on the
//! prompt. Both record the messages they receive.

use crate::client::GraderClient;
use crate::error::{GraderError, GraderResult};
use async_trait::async_trait;
use gavel_core::ChatMessage;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A grader with a pre-configured response script.
///
/// Replies are consumed in order; when the script runs dry the default
/// reply (if set) is repeated, otherwise the call fails.
#[derive(Debug, Default)]
pub struct MockGrader {
    script: Mutex<VecDeque<GraderResult<String>>>,
    default_reply: Option<String>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockGrader {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    #[must_use]
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    /// Queue a failure.
    #[must_use]
    pub fn with_failure(self, error: GraderError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Reply with `text` whenever the script is exhausted.
    #[must_use]
    pub fn with_default_reply(mut self, text: impl Into<String>) -> Self {
        self.default_reply = Some(text.into());
        self
    }

    /// Messages received so far, one entry per call.
    pub fn recorded_requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of calls made.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl GraderClient for MockGrader {
    async fn complete(&self, messages: &[ChatMessage]) -> GraderResult<String> {
        self.requests.lock().unwrap().push(messages.to_vec());

        if let Some(scripted) = self.script.lock().unwrap().pop_front() {
            return scripted;
        }
        match &self.default_reply {
            Some(text) => Ok(text.clone()),
            None => Err(GraderError::invalid_input("mock script exhausted")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A grader driven by a closure, for prompt-dependent test behavior.
pub struct FnGrader<F> {
    func: F,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl<F> FnGrader<F>
where
    F: Fn(&[ChatMessage]) -> GraderResult<String> + Send + Sync,
{
    /// Wrap a closure as a grader.
    pub fn new(func: F) -> Self {
        Self {
            func,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of calls made.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl<F> GraderClient for FnGrader<F>
where
    F: Fn(&[ChatMessage]) -> GraderResult<String> + Send + Sync,
{
    async fn complete(&self, messages: &[ChatMessage]) -> GraderResult<String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        (self.func)(messages)
    }

    fn name(&self) -> &str {
        "fn-grader"
    }
}
