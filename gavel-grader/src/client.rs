//! The grader client trait.

use crate::error::GraderResult;
use async_trait::async_trait;
use gavel_core::ChatMessage;
use std::sync::Arc;

/// A text-completion service used to produce numeric judgments.
///
/// Implementations are stateless across calls apart from credential and
/// model configuration, and must be safe to invoke concurrently from many
/// evaluation tasks.
#[async_trait]
pub trait GraderClient: Send + Sync {
    /// Send an ordered sequence of role-tagged turns, returning the
    /// completion text.
    async fn complete(&self, messages: &[ChatMessage]) -> GraderResult<String>;

    /// Identifier used in logs (model name or mock label).
    fn name(&self) -> &str {
        "grader"
    }
}

/// Shared handle used by concurrent evaluation tasks.
pub type SharedGrader = Arc<dyn GraderClient>;

#[async_trait]
impl<T: GraderClient + ?Sized> GraderClient for Arc<T> {
    async fn complete(&self, messages: &[ChatMessage]) -> GraderResult<String> {
        (**self).complete(messages).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
