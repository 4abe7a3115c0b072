//! Structured-output language model client interface.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{GenerationError, RemoteError};

/// One request for a JSON object matching `schema`.
#[derive(Debug, Clone)]
pub struct StructuredJsonRequest {
    pub credential: String,
    pub model: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub schema: Value,
    pub schema_name: String,
}

/// Language model returning parsed JSON.
///
/// Implementations fail with a descriptive [`RemoteError`] on a non-success
/// status or a body that is not JSON.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn request_structured_json(
        &self,
        request: StructuredJsonRequest,
    ) -> Result<Value, RemoteError>;
}

/// Request JSON and decode it into `T`. A shape mismatch is a schema error,
/// never retried.
pub async fn request_typed<T: DeserializeOwned>(
    client: &dyn LlmClient,
    request: StructuredJsonRequest,
) -> Result<T, GenerationError> {
    let value = client.request_structured_json(request).await?;
    serde_json::from_value(value).map_err(|e| GenerationError::Schema(e.to_string()))
}
