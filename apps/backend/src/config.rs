//! Service configuration from the environment.

use std::path::PathBuf;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: &str = "3000";
const DEFAULT_ANKI_CONNECT_URL: &str = "http://127.0.0.1:8765";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_JPDB_BASE_URL: &str = "https://jpdb.io/api/v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: String,
    pub db_path: PathBuf,
    pub anki_connect_url: String,
    pub openai_base_url: String,
    pub jpdb_base_url: String,
    pub annotation_lexicon: Option<PathBuf>,
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("srs-sentences")
        .join("state.db")
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        Self {
            host: var("HOST", DEFAULT_HOST),
            port: var("PORT", DEFAULT_PORT),
            db_path: lookup("SRS_SENTENCES_DB")
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            anki_connect_url: var("ANKI_CONNECT_URL", DEFAULT_ANKI_CONNECT_URL),
            openai_base_url: var("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            jpdb_base_url: var("JPDB_BASE_URL", DEFAULT_JPDB_BASE_URL),
            annotation_lexicon: lookup("ANNOTATION_LEXICON")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
