use crate::AppError;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variables the service has always read directly, and the
/// config path each one lands on.
const BARE_ENV: &[(&str, &str)] = &[
    ("AZURE_STORAGE_CONN", "storage.connection_string"),
    ("GEMINI_API_KEY", "extraction.api_key"),
    ("GITHUB_TOKEN", "agent.token"),
    ("PORT", "server.port"),
];

/// `PAPERCHEF_*` variables read by the binaries' flags rather than config.
const CLI_ENV_KEYS: &[&str] = &["config", "endpoint"];

pub const DEFAULT_EXTRACTION_PROMPT: &str = "Extract the Title, Author, and a 3-sentence summary of this document. Return the result strictly as a JSON object with keys: 'title', 'author', and 'summary'.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub extraction: ExtractionConfig,
    pub agent: AgentConfig,
    pub limits: LimitsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Azure when a connection string is present, local disk otherwise.
    Auto,
    Azure,
    Local,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub connection_string: Option<String>,
    pub local_dir: String,
    pub container: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExtractionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub prompt: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub token: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tool_rounds: u32,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    pub max_upload_mb: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: 8000,
            },
            storage: StorageConfig {
                backend: StorageBackend::Auto,
                connection_string: None,
                local_dir: "data/blobs".to_string(),
                container: "pdf-uploads".to_string(),
                timeout_ms: 30000,
            },
            extraction: ExtractionConfig {
                api_key: None,
                base_url: "https://generativelanguage.googleapis.com".to_string(),
                model: "gemini-2.5-flash".to_string(),
                prompt: DEFAULT_EXTRACTION_PROMPT.to_string(),
                timeout_ms: 120000,
            },
            agent: AgentConfig {
                token: None,
                base_url: "https://models.github.ai/inference".to_string(),
                model: "openai/gpt-4o".to_string(),
                max_tool_rounds: 5,
                timeout_ms: 60000,
            },
            limits: LimitsConfig { max_upload_mb: 25 },
            logging: LoggingConfig {
                format: LogFormat::Pretty,
                filter: "info,tower_http=info".to_string(),
            },
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl StorageConfig {
    pub fn connection_string(&self) -> Option<&str> {
        non_blank(&self.connection_string)
    }

    /// Backend after resolving `auto`.
    pub fn resolved_backend(&self) -> StorageBackend {
        match self.backend {
            StorageBackend::Auto if self.connection_string().is_some() => StorageBackend::Azure,
            StorageBackend::Auto => StorageBackend::Local,
            other => other,
        }
    }
}

impl ExtractionConfig {
    pub fn api_key(&self) -> Option<&str> {
        non_blank(&self.api_key)
    }
}

impl AgentConfig {
    pub fn token(&self) -> Option<&str> {
        non_blank(&self.token)
    }
}

impl LimitsConfig {
    pub fn max_upload_bytes(&self) -> usize {
        (self.max_upload_mb * 1024 * 1024) as usize
    }
}

impl Config {
    /// Layering, lowest to highest: defaults, TOML file, `PAPERCHEF_*`
    /// variables (`__` separates sections), then the bare variables in
    /// `BARE_ENV`.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(
                Env::prefixed("PAPERCHEF_")
                    .ignore(CLI_ENV_KEYS)
                    .split("__"),
            )
            .merge(bare_env())
    }

    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        Self::figment(path).extract().map_err(|e| AppError::Config {
            reason: e.to_string(),
        })
    }

    pub fn to_toml(&self) -> Result<String, AppError> {
        toml::to_string_pretty(self).map_err(|e| AppError::Config {
            reason: e.to_string(),
        })
    }

    /// Copy with credentials blanked, safe to log or print.
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        let mask = |value: &mut Option<String>| {
            if value.is_some() {
                *value = Some("***".to_string());
            }
        };
        mask(&mut config.storage.connection_string);
        mask(&mut config.extraction.api_key);
        mask(&mut config.agent.token);
        config
    }
}

fn bare_env() -> Env {
    let vars: Vec<&str> = BARE_ENV.iter().map(|(var, _)| *var).collect();
    Env::raw().only(&vars).map(|key| {
        BARE_ENV
            .iter()
            .find(|(var, _)| key.as_str().eq_ignore_ascii_case(var))
            .map(|(_, path)| (*path).into())
            .unwrap_or_else(|| key.as_str().to_string().into())
    })
}
