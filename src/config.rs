use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("lexcorpus.db")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    #[serde(default = "default_include")]
    pub include: Vec<String>,
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_error_log_dir")]
    pub error_log_dir: PathBuf,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            include: default_include(),
            min_words: default_min_words(),
            concurrency: default_concurrency(),
            error_log_dir: default_error_log_dir(),
        }
    }
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("data/judgments")
}
fn default_include() -> Vec<String> {
    vec!["**/*.pdf".to_string()]
}
fn default_min_words() -> usize {
    200
}
fn default_concurrency() -> usize {
    4
}
fn default_error_log_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            dims: default_dims(),
            batch_size: default_batch_size(),
            api_key_env: default_api_key_env(),
            base_url: None,
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "local".to_string()
}
fn default_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}
fn default_dims() -> usize {
    384
}
fn default_batch_size() -> usize {
    32
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub court: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            court: None,
        }
    }
}

fn default_top_k() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    8000
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate extraction
    if config.extraction.include.is_empty() {
        anyhow::bail!("extraction.include must not be empty");
    }
    if config.extraction.concurrency < 1 {
        anyhow::bail!("extraction.concurrency must be >= 1");
    }

    // Validate embedding
    if config.embedding.batch_size < 1 {
        anyhow::bail!("embedding.batch_size must be >= 1");
    }
    if config.embedding.is_enabled() {
        if config.embedding.dims == 0 {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_empty() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" | "ollama" | "local" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be local, openai, ollama, or disabled.",
            other
        ),
    }

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    Ok(config)
}

const STARTER_CONFIG: &str = r#"# lexcorpus configuration

[store]
# SQLite database holding extracted cases and their embeddings.
db_path = "lexcorpus.db"

[extraction]
# Directory scanned for judgment PDFs.
source_dir = "data/judgments"
include = ["**/*.pdf"]
# Extractions below this word count are rejected as scanned or empty documents.
min_words = 200
concurrency = 4
# extraction_errors.json is written here after a run with failures.
error_log_dir = "."

[embedding]
# One of: local, openai, ollama, disabled
provider = "local"
model = "all-MiniLM-L6-v2"
dims = 384
batch_size = 32
# api_key_env = "OPENAI_API_KEY"
# base_url = "https://api.openai.com"
max_retries = 3

[retrieval]
top_k = 10
# court = "Supreme Court of India"

[server]
host = "127.0.0.1"
port = 8000
"#;

/// Write a commented starter config, without clobbering an existing file.
///
/// Returns `true` if the file was created, `false` if one was already there.
pub fn write_starter_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    std::fs::write(path, STARTER_CONFIG)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_str(content: &str) -> Result<Config> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexcorpus.toml");
        std::fs::write(&path, content).unwrap();
        load_config(&path)
    }

    #[test]
    fn empty_config_gets_defaults() {
        let config = load_str("").unwrap();
        assert_eq!(config.store.db_path, PathBuf::from("lexcorpus.db"));
        assert_eq!(config.extraction.min_words, 200);
        assert_eq!(config.extraction.include, vec!["**/*.pdf".to_string()]);
        assert_eq!(config.embedding.provider, "local");
        assert_eq!(config.embedding.model, "all-MiniLM-L6-v2");
        assert_eq!(config.embedding.dims, 384);
        assert_eq!(config.retrieval.top_k, 10);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn sections_override_defaults() {
        let config = load_str(
            r#"
[extraction]
source_dir = "corpus"
min_words = 50

[embedding]
provider = "disabled"

[retrieval]
top_k = 3
court = "Delhi High Court"
"#,
        )
        .unwrap();
        assert_eq!(config.extraction.source_dir, PathBuf::from("corpus"));
        assert_eq!(config.extraction.min_words, 50);
        assert!(!config.embedding.is_enabled());
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.court.as_deref(), Some("Delhi High Court"));
    }

    #[test]
    fn unknown_provider_rejected() {
        let err = load_str("[embedding]\nprovider = \"quantum\"\n").unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn zero_concurrency_rejected() {
        let err = load_str("[extraction]\nconcurrency = 0\n").unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn zero_dims_rejected_when_enabled() {
        let err = load_str("[embedding]\nprovider = \"openai\"\ndims = 0\n").unwrap_err();
        assert!(err.to_string().contains("embedding.dims"));
    }

    #[test]
    fn starter_config_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexcorpus.toml");
        assert!(write_starter_config(&path).unwrap());
        let config = load_config(&path).unwrap();
        assert_eq!(config.extraction.min_words, 200);
        assert_eq!(config.embedding.batch_size, 32);
        // A second call leaves the existing file alone.
        assert!(!write_starter_config(&path).unwrap());
    }
}
