//! Contract for the remote text-completion endpoint.

use async_trait::async_trait;

use crate::error::CompletionError;

/// Sends one prompt, returns the full completion text.
///
/// Implementations must not touch session history; appending is the caller's job
/// after a successful return.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}
