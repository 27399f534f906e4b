// Translation backend adapters
//
// Backends share one batching engine (`LlmBackend`) and differ only in how a
// prompt reaches the model:
// - openai: OpenAI compatible chat completions (OpenAI, Gemini)
// - ollama: local Ollama generate API
//
// `chunk` holds the helpers the batch orchestrator uses to split and merge
// large files.

pub mod chunk;
pub mod ollama;
pub mod openai;
pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{AiService, TranslateConfig};
use crate::error::{Result, SubfluxError};
use crate::subtitle::SubtitleEntry;

/// Translation quality tier, selects the model and the credit rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Standard,
    Premium,
}

impl QualityTier {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "" | "standard" | "basic" => Ok(QualityTier::Standard),
            "premium" | "pro" => Ok(QualityTier::Premium),
            other => Err(SubfluxError::Validation(format!(
                "Invalid translation model '{}'. Valid models: standard, premium",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Standard => "standard",
            QualityTier::Premium => "premium",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStage {
    Parsing,
    Translating,
    Finalizing,
}

/// Progress report emitted by a backend while it works
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationProgress {
    pub stage: TranslationStage,
    pub current: usize,
    pub total: usize,
    pub percent: u8,
    pub message: String,
}

impl TranslationProgress {
    pub fn new(stage: TranslationStage, current: usize, total: usize, message: impl Into<String>) -> Self {
        let percent = if total == 0 {
            0
        } else {
            ((current.min(total) * 100) / total) as u8
        };
        Self {
            stage,
            current,
            total,
            percent,
            message: message.into(),
        }
    }
}

pub type ProgressCallback = Arc<dyn Fn(TranslationProgress) + Send + Sync>;

/// Progress callback that discards every update
pub fn no_progress() -> ProgressCallback {
    Arc::new(|_| {})
}

/// Main trait for translation operations
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate entries, returning them with identical index and timing
    async fn translate(
        &self,
        entries: &[SubtitleEntry],
        target_language: &str,
        source_language: Option<&str>,
        progress: ProgressCallback,
    ) -> Result<Vec<SubtitleEntry>>;

    /// Check that the backend is reachable and configured
    async fn check_availability(&self) -> Result<()>;

    fn service(&self) -> AiService;
}

/// Transport that turns one prompt into a raw model answer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    async fn check_availability(&self) -> Result<()>;
}

/// Batching translation engine shared by every LLM backend
pub struct LlmBackend<C: CompletionClient> {
    client: C,
    service: AiService,
    batch_size: usize,
    max_retries: u32,
    retry_delay: Duration,
}

impl<C: CompletionClient> LlmBackend<C> {
    pub fn new(client: C, service: AiService, batch_size: usize, max_retries: u32) -> Self {
        Self {
            client,
            service,
            batch_size: batch_size.max(1),
            max_retries,
            retry_delay: Duration::from_millis(500),
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    async fn translate_batch(
        &self,
        batch: &[SubtitleEntry],
        target_language: &str,
        source_language: Option<&str>,
    ) -> Result<Vec<String>> {
        let texts: Vec<&str> = batch.iter().map(|e| e.text.as_str()).collect();
        let user_prompt = prompt::build_batch_prompt(&texts, target_language, source_language);

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tokio::time::sleep(self.retry_delay * attempt).await;
                debug!("Retrying batch starting at entry {} (attempt {})", batch[0].index, attempt + 1);
            }

            let outcome = match self.client.complete(prompt::system_prompt(), &user_prompt).await {
                Ok(raw) => prompt::parse_batch_response(&raw, batch.len()),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(translations) => return Ok(translations),
                Err(e) => {
                    warn!("Translation batch failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| SubfluxError::Translation("Translation batch failed".to_string())))
    }
}

#[async_trait]
impl<C: CompletionClient> TranslationBackend for LlmBackend<C> {
    async fn translate(
        &self,
        entries: &[SubtitleEntry],
        target_language: &str,
        source_language: Option<&str>,
        progress: ProgressCallback,
    ) -> Result<Vec<SubtitleEntry>> {
        let total = entries.len();
        info!(
            "Translating {} entries to {} via {}",
            total,
            target_language,
            self.service.as_str()
        );
        progress(TranslationProgress::new(
            TranslationStage::Parsing,
            0,
            total,
            format!("Preparing {} subtitles", total),
        ));
        progress(TranslationProgress::new(
            TranslationStage::Translating,
            0,
            total,
            format!("Translating {} subtitles", total),
        ));

        let mut translated = Vec::with_capacity(total);
        for batch in entries.chunks(self.batch_size) {
            let texts = self
                .translate_batch(batch, target_language, source_language)
                .await?;
            translated.extend(batch.iter().zip(texts).map(|(entry, text)| entry.with_text(text)));

            progress(TranslationProgress::new(
                TranslationStage::Translating,
                translated.len(),
                total,
                format!("Translated {}/{} subtitles", translated.len(), total),
            ));
        }

        progress(TranslationProgress::new(
            TranslationStage::Finalizing,
            total,
            total,
            "Finalizing translation",
        ));
        Ok(translated)
    }

    async fn check_availability(&self) -> Result<()> {
        self.client.check_availability().await
    }

    fn service(&self) -> AiService {
        self.service
    }
}

/// Resolves a backend for a service and tier
pub trait BackendProvider: Send + Sync {
    fn backend(&self, service: AiService, tier: QualityTier) -> Result<Arc<dyn TranslationBackend>>;

    fn default_service(&self) -> AiService;
}

/// Factory for creating backend instances from configuration
pub struct BackendFactory {
    config: TranslateConfig,
    batch_size: usize,
}

impl BackendFactory {
    pub fn new(config: TranslateConfig, batch_size: usize) -> Self {
        Self { config, batch_size }
    }

    pub fn create_backend(
        config: &TranslateConfig,
        service: AiService,
        tier: QualityTier,
        batch_size: usize,
    ) -> Result<Arc<dyn TranslationBackend>> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let backend: Arc<dyn TranslationBackend> = match service {
            AiService::OpenAi | AiService::Gemini => {
                let chat = if service == AiService::OpenAi {
                    &config.openai
                } else {
                    &config.gemini
                };
                let model = match tier {
                    QualityTier::Standard => chat.standard_model.clone(),
                    QualityTier::Premium => chat.premium_model.clone(),
                };
                let client = openai::ChatCompletionsClient::new(
                    chat.endpoint.clone(),
                    chat.api_key.clone(),
                    model,
                    timeout,
                )?;
                Arc::new(LlmBackend::new(client, service, batch_size, config.max_retries))
            }
            AiService::Ollama => {
                let model = match tier {
                    QualityTier::Standard => config.ollama.standard_model.clone(),
                    QualityTier::Premium => config.ollama.premium_model.clone(),
                };
                let client = ollama::OllamaClient::new(config.ollama.endpoint.clone(), model, timeout)?;
                Arc::new(LlmBackend::new(client, service, batch_size, config.max_retries))
            }
        };
        Ok(backend)
    }
}

impl BackendProvider for BackendFactory {
    fn backend(&self, service: AiService, tier: QualityTier) -> Result<Arc<dyn TranslationBackend>> {
        Self::create_backend(&self.config, service, tier, self.batch_size)
    }

    fn default_service(&self) -> AiService {
        self.config.service
    }
}
