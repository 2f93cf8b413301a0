//! AI generation of delimited sheet text.

use async_trait::async_trait;

use crate::llm_client::{LlmClient, LlmError};

/// Produces `[BOX]`-delimited sheet text from a prompt pair.
///
/// `LlmClient` is the production implementation. Tests substitute a canned one.
#[async_trait]
pub trait SheetGenerator: Send + Sync {
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

#[async_trait]
impl SheetGenerator for LlmClient {
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
        self.call_text(user, system).await
    }
}
