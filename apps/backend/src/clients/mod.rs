//! HTTP clients for the external services the core depends on.

pub mod anki_connect;
pub mod jpdb;
pub mod openai;

use reqwest::Response;
use sentences_core::RemoteError;

pub use anki_connect::AnkiConnectClient;
pub use jpdb::JpdbClient;
pub use openai::OpenAiClient;

fn network(service: &'static str, e: reqwest::Error) -> RemoteError {
    RemoteError::Network {
        service,
        message: e.to_string(),
    }
}

fn malformed(service: &'static str, message: impl Into<String>) -> RemoteError {
    RemoteError::Malformed {
        service,
        message: message.into(),
    }
}

/// Pass successful responses through; turn anything else into a status
/// error carrying an excerpt of the body.
async fn check_status(service: &'static str, resp: Response) -> Result<Response, RemoteError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(RemoteError::status(service, status, &body))
}

fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
