//! Configuration for the extraction service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming an optional TOML configuration file
pub const CONFIG_PATH_ENV: &str = "PDF_EXTRACTOR_CONFIG";

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// LLM API configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Text extraction and chunking configuration
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Upload queue configuration
    #[serde(default)]
    pub queue: QueueConfig,
    /// Record store configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Shared-secret session configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration: optional TOML file, then environment overrides.
    ///
    /// The file is taken from `PDF_EXTRACTOR_CONFIG` when set.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML configuration file. Missing sections fall back to defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.llm.api_key = key;
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            self.llm.model = model;
        }
        if let Ok(host) = std::env::var("PDF_EXTRACTOR_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PDF_EXTRACTOR_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PDF_EXTRACTOR_PORT: {}", port),
            }
        }
        if let Ok(path) = std::env::var("PDF_EXTRACTOR_DB") {
            self.database.path = PathBuf::from(path);
        }
        if let Ok(password) = std::env::var("PDF_EXTRACTOR_PASSWORD") {
            self.auth.password = password;
        }
    }

    /// Check the invariants the pipeline relies on
    pub fn validate(&self) -> Result<()> {
        let ex = &self.extraction;
        if ex.chunk_size == 0 {
            return Err(Error::Config("extraction.chunk_size must be greater than 0".into()));
        }
        if ex.chunk_size > ex.single_shot_limit {
            return Err(Error::Config(format!(
                "extraction.chunk_size ({}) must not exceed extraction.single_shot_limit ({})",
                ex.chunk_size, ex.single_shot_limit
            )));
        }
        if self.queue.max_batch_files == 0 {
            return Err(Error::Config("queue.max_batch_files must be greater than 0".into()));
        }
        if self.auth.enabled && self.auth.password.is_empty() {
            return Err(Error::Config("auth.password must be set when auth is enabled".into()));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 100MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            enable_cors: true,
            max_upload_size: 100 * 1024 * 1024, // 100MB
        }
    }
}

/// LLM (OpenAI-compatible chat completions) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API base URL, without the `/chat/completions` suffix
    pub base_url: String,
    /// API key sent as a bearer token
    pub api_key: String,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

/// Text extraction and chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Texts up to this many characters go to the LLM in one call
    pub single_shot_limit: usize,
    /// Slice size in characters for longer texts
    pub chunk_size: usize,
    /// Minimum trimmed text length; shorter texts are treated as scanned
    pub min_text_chars: usize,
    /// Time budget for the PDF text library before falling back
    pub pdf_parse_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            single_shot_limit: 100_000,
            chunk_size: 80_000,
            min_text_chars: 100,
            pdf_parse_timeout_secs: 60,
        }
    }
}

/// Upload queue configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Seconds a finished job stays visible before it is swept (default: 300)
    pub job_retention_secs: u64,
    /// Maximum number of files in one batch upload
    pub max_batch_files: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            job_retention_secs: 5 * 60,
            max_batch_files: 10,
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        // Use absolute path so the server can be started from any directory
        let path = dirs::data_local_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/")))
            .join("pdf-extractor")
            .join("extracted_data.db");

        Self { path }
    }
}

/// Shared-secret session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Guard the PDF routes behind the session cookie
    pub enabled: bool,
    /// The shared password; must be configured when `enabled` is set
    pub password: String,
    /// Session cookie name
    pub cookie_name: String,
    /// Cookie lifetime in seconds (default: 7 days)
    pub session_max_age_secs: u64,
    /// Add the `Secure` attribute to the cookie
    pub secure_cookie: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            password: String::new(),
            cookie_name: "pdf_extractor_session".to_string(),
            session_max_age_secs: 7 * 24 * 60 * 60,
            secure_cookie: false,
        }
    }
}
