//! Runtime settings: a TOML file overlaid with environment variables.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid settings: {0}")]
    Invalid(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAi,
    Ollama,
}

impl LlmProvider {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "https://api.openai.com",
            LlmProvider::Ollama => "http://localhost:11434",
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::OpenAi => write!(f, "openai"),
            LlmProvider::Ollama => write!(f, "ollama"),
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    /// Falls back to the provider's default endpoint when unset.
    pub base_url: Option<String>,
    pub api_key: Option<SecretString>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl LlmSettings {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            base_url: None,
            api_key: None,
            model: "gpt-4".to_string(),
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

impl Clone for LlmSettings {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider,
            base_url: self.base_url.clone(),
            api_key: self
                .api_key
                .as_ref()
                .map(|key| SecretString::new(key.expose_secret().clone())),
            model: self.model.clone(),
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_some() {
            "<redacted>"
        } else {
            "<none>"
        };
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url())
            .field("api_key", &api_key)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub embedding_dimension: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Plain-text corpus indexed at start-up.
    pub corpus_dir: Option<PathBuf>,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 8,
            embedding_dimension: 256,
            chunk_size: 1000,
            chunk_overlap: 200,
            corpus_dir: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub max_steps: usize,
    pub max_node_attempts: usize,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            max_steps: 25,
            max_node_attempts: 2,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Turns kept per session; older turns are dropped first.
    pub max_history: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self { max_history: 50 }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub max_workers: usize,
    pub timeout_per_query_secs: u64,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_workers: 3,
            timeout_per_query_secs: 60,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub retrieval: RetrievalSettings,
    pub graph: GraphSettings,
    pub session: SessionSettings,
    pub batch: BatchSettings,
}

impl Settings {
    pub fn from_toml_str(raw: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// File (if any) first, then process environment. Not validated.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut settings = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Applies environment-style overrides. `lookup` returns the value for a
    /// variable name; blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get("GRANTSPIDER_LLM_PROVIDER") {
            self.llm.provider = value.parse().map_err(|_| SettingsError::InvalidValue {
                key: "GRANTSPIDER_LLM_PROVIDER",
                value,
            })?;
        }
        if let Some(value) = get("OPENAI_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(SecretString::new(value));
        }
        if let Some(value) = get("LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = get("LLM_TEMPERATURE") {
            self.llm.temperature = parse("LLM_TEMPERATURE", value)?;
        }
        if let Some(value) = get("GRANTSPIDER_TOP_K") {
            self.retrieval.top_k = parse("GRANTSPIDER_TOP_K", value)?;
        }
        if let Some(value) = get("CHUNK_SIZE") {
            self.retrieval.chunk_size = parse("CHUNK_SIZE", value)?;
        }
        if let Some(value) = get("CHUNK_OVERLAP") {
            self.retrieval.chunk_overlap = parse("CHUNK_OVERLAP", value)?;
        }
        if let Some(value) = get("GRANTSPIDER_CORPUS_DIR") {
            self.retrieval.corpus_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = get("GRANTSPIDER_MAX_NODE_ATTEMPTS") {
            self.graph.max_node_attempts = parse("GRANTSPIDER_MAX_NODE_ATTEMPTS", value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.retrieval.top_k == 0 {
            return Err(SettingsError::Invalid("retrieval.top_k must be at least 1".into()));
        }
        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err(SettingsError::Invalid(format!(
                "retrieval.chunk_overlap ({}) must be smaller than retrieval.chunk_size ({})",
                self.retrieval.chunk_overlap, self.retrieval.chunk_size
            )));
        }
        if self.graph.max_node_attempts == 0 {
            return Err(SettingsError::Invalid(
                "graph.max_node_attempts must be at least 1".into(),
            ));
        }
        if self.batch.max_workers == 0 {
            return Err(SettingsError::Invalid("batch.max_workers must be at least 1".into()));
        }
        if self.llm.provider == LlmProvider::OpenAi
            && self
                .llm
                .api_key
                .as_ref()
                .map_or(true, |key| key.expose_secret().trim().is_empty())
        {
            return Err(SettingsError::Invalid(
                "OPENAI_API_KEY is required for the openai provider".into(),
            ));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, SettingsError> {
    value
        .trim()
        .parse()
        .map_err(|_| SettingsError::InvalidValue { key, value })
}
