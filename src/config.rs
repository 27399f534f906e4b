use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, SubfluxError};

// Default values for fields added after the first config format
fn default_keep_alive_secs() -> u64 {
    15
}

fn default_signup_bonus() -> f64 {
    0.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Runtime environment; development skips all billing
    pub environment: Environment,
    pub server: ServerConfig,
    pub billing: BillingConfig,
    pub translate: TranslateConfig,
    pub stream: StreamConfig,
    pub batch: BatchConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Number of subtitle entries covered by one credit charge
    pub batch_size: usize,
    /// Credits per batch for the standard tier
    pub standard_rate: f64,
    /// Credits per batch for the premium tier
    pub premium_rate: f64,
    /// Credits granted the first time a user is seen
    #[serde(default = "default_signup_bonus")]
    pub signup_bonus: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Backend used when a request does not name one
    pub service: AiService,
    pub openai: ChatBackendConfig,
    pub gemini: ChatBackendConfig,
    pub ollama: OllamaConfig,
    /// Maximum retries for a failed translation batch
    pub max_retries: u32,
    /// Per HTTP request timeout
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiService {
    /// OpenAI chat completions
    OpenAi,
    /// Gemini through its OpenAI compatible endpoint
    Gemini,
    /// Local Ollama server
    Ollama,
}

impl AiService {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiService::OpenAi => "openai",
            AiService::Gemini => "gemini",
            AiService::Ollama => "ollama",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "openai" | "gpt" => Ok(AiService::OpenAi),
            "gemini" | "google" => Ok(AiService::Gemini),
            "ollama" | "local" => Ok(AiService::Ollama),
            other => Err(SubfluxError::Validation(format!(
                "Invalid AI service '{}'. Valid services: openai, gemini, ollama",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatBackendConfig {
    /// Base URL of an OpenAI compatible API (without /chat/completions)
    pub endpoint: String,
    pub api_key: String,
    pub standard_model: String,
    pub premium_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub endpoint: String,
    pub standard_model: String,
    pub premium_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Stall timeout outside the translating stage
    pub base_timeout_secs: u64,
    /// Extra stall budget per subtitle entry during translation
    pub per_entry_timeout_ms: u64,
    /// Hard ceiling, tied to the host's maximum request duration
    pub max_timeout_secs: u64,
    /// Attempts to push the final result to the client
    pub result_attempts: u32,
    /// Linear backoff step between result attempts
    pub result_backoff_ms: u64,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub max_files: usize,
    pub max_file_bytes: usize,
    /// Maximum subtitle entries per translation chunk
    pub chunk_entries: usize,
    /// Maximum characters per translation chunk
    pub chunk_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded and translated artifacts
    pub root: PathBuf,
    /// Prefix used to build download URLs
    pub public_base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            billing: BillingConfig {
                batch_size: 20,
                standard_rate: 0.5,
                premium_rate: 1.5,
                signup_bonus: 0.0,
            },
            translate: TranslateConfig {
                service: AiService::OpenAi,
                openai: ChatBackendConfig {
                    endpoint: "https://api.openai.com/v1".to_string(),
                    api_key: String::new(),
                    standard_model: "gpt-4o-mini".to_string(),
                    premium_model: "gpt-4o".to_string(),
                },
                gemini: ChatBackendConfig {
                    endpoint: "https://generativelanguage.googleapis.com/v1beta/openai".to_string(),
                    api_key: String::new(),
                    standard_model: "gemini-1.5-flash".to_string(),
                    premium_model: "gemini-1.5-pro".to_string(),
                },
                ollama: OllamaConfig {
                    endpoint: "http://localhost:11434".to_string(),
                    standard_model: "llama3.2:3b".to_string(),
                    premium_model: "llama3.1:8b".to_string(),
                },
                max_retries: 3,
                request_timeout_secs: 120,
            },
            stream: StreamConfig {
                base_timeout_secs: 60,
                per_entry_timeout_ms: 200,
                max_timeout_secs: 300,
                result_attempts: 3,
                result_backoff_ms: 100,
                keep_alive_secs: 15,
            },
            batch: BatchConfig {
                max_files: 20,
                max_file_bytes: 2 * 1024 * 1024,
                chunk_entries: 20,
                chunk_chars: 4000,
            },
            storage: StorageConfig {
                root: PathBuf::from(".subflux/storage"),
                public_base_url: "/files".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SubfluxError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| SubfluxError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SubfluxError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| SubfluxError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Overlay secrets and deployment knobs from the process environment
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.translate.openai.api_key = key;
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            self.translate.gemini.api_key = key;
        }
        if let Ok(env) = std::env::var("SUBFLUX_ENV") {
            match env.to_lowercase().as_str() {
                "development" | "dev" => self.environment = Environment::Development,
                "production" | "prod" => self.environment = Environment::Production,
                _ => {}
            }
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.billing.batch_size, 20);
        assert_eq!(parsed.translate.service, AiService::OpenAi);
        assert_eq!(parsed.environment, Environment::Production);
    }

    #[test]
    fn save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.environment = Environment::Development;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert!(loaded.environment.is_development());
    }

    #[test]
    fn parses_ai_service_aliases() {
        assert_eq!(AiService::parse("OpenAI").unwrap(), AiService::OpenAi);
        assert_eq!(AiService::parse("google").unwrap(), AiService::Gemini);
        assert!(AiService::parse("deepl").is_err());
    }
}
