//! Structured-output client for the OpenAI Responses API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use sentences_core::{LlmClient, RemoteError, StructuredJsonRequest};

use super::{check_status, malformed, network, trim_base};

const SERVICE: &str = "OpenAI";

pub struct OpenAiClient {
    client: Client,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }
}

fn request_body(request: &StructuredJsonRequest) -> Value {
    json!({
        "model": request.model,
        "input": [
            { "role": "system", "content": request.system_prompt },
            { "role": "user", "content": request.user_prompt },
        ],
        "text": {
            "format": {
                "type": "json_schema",
                "name": request.schema_name,
                "strict": true,
                "schema": request.schema,
            }
        }
    })
}

/// First text found in a Responses API result: the `output_text`
/// shortcut, else the first textual content item of `output`.
fn extract_text(response: &Value) -> Option<&str> {
    if let Some(text) = response.get("output_text").and_then(Value::as_str) {
        return Some(text);
    }
    response
        .get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("content")?.as_array())
        .flatten()
        .find_map(|content| {
            content
                .get("text")
                .and_then(Value::as_str)
                .or_else(|| content.get("content").and_then(Value::as_str))
        })
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn request_structured_json(
        &self,
        request: StructuredJsonRequest,
    ) -> Result<Value, RemoteError> {
        let url = format!("{}/responses", self.base_url);
        tracing::debug!(
            model = %request.model,
            schema = %request.schema_name,
            "requesting structured output"
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&request.credential)
            .json(&request_body(&request))
            .send()
            .await
            .map_err(|e| network(SERVICE, e))?;
        let resp = check_status(SERVICE, resp).await?;

        let data: Value = resp
            .json()
            .await
            .map_err(|e| malformed(SERVICE, e.to_string()))?;
        let text = extract_text(&data).ok_or_else(|| {
            malformed(SERVICE, "Could not extract text from Responses API result.")
        })?;
        serde_json::from_str(text).map_err(|_| {
            malformed(SERVICE, "Model returned non-JSON text (unexpected). Try again.")
        })
    }
}
