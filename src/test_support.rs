use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::billing::MemoryLedger;
use crate::config::{AiService, Config, Environment};
use crate::context::AppContext;
use crate::error::{Result, SubfluxError};
use crate::storage::MemoryArtifactStore;
use crate::store::MemoryStore;
use crate::subtitle::SubtitleEntry;
use crate::translate::{
    BackendProvider, ProgressCallback, QualityTier, TranslationBackend, TranslationProgress,
    TranslationStage,
};

/// Marker text that makes `ScriptedBackend::Echo` fail
pub const POISON: &str = "BOOM";

pub enum ScriptedBackend {
    /// Appends ` [target]` to every caption; fails on captions containing `POISON`
    Echo,
    /// Always fails
    Fail(String),
    /// Reports one progress update, then never finishes
    Stall,
    /// Slow but alive: reports progress every `step` for `steps` updates, then echoes
    Paced { step: Duration, steps: usize },
}

#[async_trait]
impl TranslationBackend for ScriptedBackend {
    async fn translate(
        &self,
        entries: &[SubtitleEntry],
        target_language: &str,
        _source_language: Option<&str>,
        progress: ProgressCallback,
    ) -> Result<Vec<SubtitleEntry>> {
        let total = entries.len();
        progress(TranslationProgress::new(TranslationStage::Translating, 0, total, "start"));
        match self {
            ScriptedBackend::Echo => {
                if entries.iter().any(|e| e.text.contains(POISON)) {
                    return Err(SubfluxError::Translation("backend rejected input".to_string()));
                }
                progress(TranslationProgress::new(TranslationStage::Finalizing, total, total, "done"));
                Ok(entries
                    .iter()
                    .map(|e| e.with_text(format!("{} [{}]", e.text, target_language)))
                    .collect())
            }
            ScriptedBackend::Fail(message) => Err(SubfluxError::Translation(message.clone())),
            ScriptedBackend::Stall => std::future::pending().await,
            ScriptedBackend::Paced { step, steps } => {
                for i in 1..=*steps {
                    tokio::time::sleep(*step).await;
                    let current = (total * i / *steps).min(total);
                    progress(TranslationProgress::new(TranslationStage::Translating, current, total, "working"));
                }
                Ok(entries
                    .iter()
                    .map(|e| e.with_text(format!("{} [{}]", e.text, target_language)))
                    .collect())
            }
        }
    }

    async fn check_availability(&self) -> Result<()> {
        Ok(())
    }

    fn service(&self) -> AiService {
        AiService::OpenAi
    }
}

pub struct StaticProvider(pub Arc<dyn TranslationBackend>);

impl BackendProvider for StaticProvider {
    fn backend(&self, _service: AiService, _tier: QualityTier) -> Result<Arc<dyn TranslationBackend>> {
        Ok(Arc::clone(&self.0))
    }

    fn default_service(&self) -> AiService {
        AiService::OpenAi
    }
}

pub struct Harness {
    pub context: AppContext,
    pub ledger: Arc<MemoryLedger>,
    pub store: Arc<MemoryStore>,
    pub artifacts: Arc<MemoryArtifactStore>,
}

pub fn harness(environment: Environment, backend: ScriptedBackend) -> Harness {
    let mut config = Config::default();
    config.environment = environment;

    let ledger = Arc::new(MemoryLedger::new(0.0));
    let store = Arc::new(MemoryStore::new());
    let artifacts = Arc::new(MemoryArtifactStore::new());
    let context = AppContext {
        config: Arc::new(config),
        backends: Arc::new(StaticProvider(Arc::new(backend))),
        ledger: ledger.clone(),
        jobs: store.clone(),
        usage: store.clone(),
        artifacts: artifacts.clone(),
    };

    Harness {
        context,
        ledger,
        store,
        artifacts,
    }
}

/// SRT text with `n` numbered captions
pub fn sample_srt(n: u32) -> String {
    (1..=n)
        .map(|i| {
            let start = i as u64 * 2000;
            format!(
                "{}\n{} --> {}\nCaption {}\n\n",
                i,
                crate::subtitle::format_srt_time(start),
                crate::subtitle::format_srt_time(start + 1500),
                i
            )
        })
        .collect()
}
