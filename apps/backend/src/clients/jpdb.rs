//! JPDB dictionary lookup through its `parse` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use sentences_core::{DictionaryClient, DictionaryEntry, RemoteError};

use super::{malformed, network, trim_base};

const SERVICE: &str = "JPDB";
const VOCABULARY_FIELDS: [&str; 5] = ["vid", "sid", "spelling", "reading", "meanings"];

#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(default)]
    vocabulary: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error_message: Option<String>,
    message: Option<String>,
}

pub struct JpdbClient {
    client: Client,
    base_url: String,
}

impl JpdbClient {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }
}

/// Convert one vocabulary row, whose columns follow `VOCABULARY_FIELDS`.
fn row_to_entry(row: &[Value]) -> Option<(String, DictionaryEntry)> {
    let column = |name: &str| {
        VOCABULARY_FIELDS
            .iter()
            .position(|f| *f == name)
            .and_then(|i| row.get(i))
    };
    let spelling = column("spelling")?.as_str()?.to_string();
    let meanings = column("meanings")?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    let reading = column("reading").and_then(Value::as_str).map(str::to_string);
    let external_id = column("vid")
        .and_then(Value::as_i64)
        .zip(column("sid").and_then(Value::as_i64));

    Some((
        spelling,
        DictionaryEntry {
            reading,
            meanings,
            external_id,
        },
    ))
}

/// Prefer the vocabulary item spelled exactly like the word.
fn pick_entry(word: &str, vocabulary: &[Vec<Value>]) -> Option<DictionaryEntry> {
    let rows: Vec<(String, DictionaryEntry)> =
        vocabulary.iter().filter_map(|row| row_to_entry(row)).collect();
    let exact = rows.iter().position(|(spelling, _)| spelling == word);
    rows.into_iter().nth(exact.unwrap_or(0)).map(|(_, entry)| entry)
}

#[async_trait]
impl DictionaryClient for JpdbClient {
    async fn lookup(
        &self,
        credential: &str,
        word: &str,
    ) -> Result<Option<DictionaryEntry>, RemoteError> {
        let url = format!("{}/parse", self.base_url);
        let body = json!({
            "text": word,
            "token_fields": [],
            "vocabulary_fields": VOCABULARY_FIELDS,
            "position_length_encoding": "utf16",
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| network(SERVICE, e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .ok()
                .and_then(|b| b.error_message.or(b.message))
                .unwrap_or(text);
            return Err(RemoteError::status(SERVICE, status, &message));
        }

        let parsed: ParseResponse = resp
            .json()
            .await
            .map_err(|e| malformed(SERVICE, e.to_string()))?;
        Ok(pick_entry(word, &parsed.vocabulary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_exact_spelling() {
        let vocabulary = vec![
            vec![json!(1), json!(10), json!("走"), json!("そう"), json!(["run"])],
            vec![json!(2), json!(20), json!("走る"), json!("はしる"), json!(["to run", "to flee"])],
        ];
        let entry = pick_entry("走る", &vocabulary).unwrap();
        assert_eq!(entry.reading.as_deref(), Some("はしる"));
        assert_eq!(entry.meanings, vec!["to run", "to flee"]);
        assert_eq!(entry.external_id, Some((2, 20)));
    }

    #[test]
    fn falls_back_to_first_row() {
        let vocabulary = vec![vec![json!(1), json!(10), json!("猫"), json!("ねこ"), json!(["cat"])]];
        let entry = pick_entry("ねこ", &vocabulary).unwrap();
        assert_eq!(entry.meanings, vec!["cat"]);
        assert!(pick_entry("x", &[]).is_none());
    }
}
