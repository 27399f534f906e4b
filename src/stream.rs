//! Streaming translation orchestrator.
//!
//! Drives one translation request end to end: parse, charge, translate with a
//! stall watchdog, persist, deliver, and refund on failure. Events flow to the
//! client through an [`EventSink`], which guarantees exactly one terminal
//! event per stream.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::billing::CreditPolicy;
use crate::config::{AiService, StreamConfig};
use crate::context::AppContext;
use crate::error::{Result, SubfluxError};
use crate::model::{JobStatus, TranslationJob, UsageDelta};
use crate::storage::sanitize_file_name;
use crate::subtitle::{self, SubtitleEntry};
use crate::translate::{ProgressCallback, QualityTier, TranslationProgress, TranslationStage};

/// Payload of the final `result` event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationOutput {
    pub job_id: Uuid,
    pub file_name: String,
    pub translated_content: String,
    pub subtitle_count: usize,
    pub character_count: usize,
    pub credits_used: f64,
    pub processing_time_ms: u64,
}

/// Server-sent event sent to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Connected { message: String },
    Progress(TranslationProgress),
    Result(TranslationOutput),
    Error { error: String, code: String },
}

impl StreamEvent {
    pub fn connected() -> Self {
        StreamEvent::Connected {
            message: "Translation stream connected".to_string(),
        }
    }

    pub fn from_error(err: &SubfluxError) -> Self {
        StreamEvent::Error {
            error: err.to_string(),
            code: error_code(err).to_string(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Result(_) | StreamEvent::Error { .. })
    }
}

/// Stable machine-readable code for an error event
pub fn error_code(err: &SubfluxError) -> &'static str {
    match err {
        SubfluxError::InsufficientCredits { .. } => "insufficient_credits",
        SubfluxError::Timeout(_) => "timeout",
        SubfluxError::Parse(_) | SubfluxError::Validation(_) => "invalid_input",
        SubfluxError::Unauthorized(_) => "unauthorized",
        _ => "translation_failed",
    }
}

/// Write side of a translation stream.
///
/// Terminal events can only be sent through [`EventSink::finish`], which
/// consumes the sink, so a stream closes exactly once.
pub struct EventSink {
    tx: mpsc::Sender<StreamEvent>,
    send_timeout: Duration,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self {
            tx,
            send_timeout: Duration::from_secs(5),
        }
    }

    /// Channel pair sized for a single stream
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<StreamEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Send a non-terminal event; a gone client is not an error here
    pub async fn emit(&self, event: StreamEvent) {
        debug_assert!(!event.is_terminal());
        if self.tx.send(event).await.is_err() {
            debug!("Stream receiver dropped; event discarded");
        }
    }

    /// Send the terminal event with bounded retries, then close the stream
    pub async fn finish(self, event: StreamEvent, attempts: u32, backoff: Duration) -> bool {
        let attempts = attempts.max(1);
        for attempt in 1..=attempts {
            match self.tx.send_timeout(event.clone(), self.send_timeout).await {
                Ok(()) => return true,
                Err(SendTimeoutError::Closed(_)) => {
                    warn!("Stream closed by client before terminal event");
                    return false;
                }
                Err(SendTimeoutError::Timeout(_)) => {
                    warn!("Terminal event delivery attempt {}/{} timed out", attempt, attempts);
                    if attempt < attempts {
                        tokio::time::sleep(backoff * attempt).await;
                    }
                }
            }
        }
        false
    }
}

/// Input of one streaming translation
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub user_id: String,
    pub file_name: String,
    pub content: String,
    pub source_language: Option<String>,
    pub target_language: String,
    pub tier: QualityTier,
    pub service: AiService,
}

#[derive(Debug)]
pub enum StreamOutcome {
    Completed {
        job_id: Uuid,
        delivered: bool,
    },
    Failed {
        error: String,
        refund: Option<JoinHandle<()>>,
    },
}

/// Stall budget for the current stage, capped by the configured ceiling
pub fn stall_timeout(config: &StreamConfig, entry_count: usize, stage: TranslationStage) -> Duration {
    let base = Duration::from_secs(config.base_timeout_secs);
    let budget = match stage {
        TranslationStage::Translating => {
            base + Duration::from_millis(config.per_entry_timeout_ms.saturating_mul(entry_count as u64))
        }
        _ => base,
    };
    budget.min(Duration::from_secs(config.max_timeout_secs))
}

/// Output file name: `<stem>_<target>.srt`
pub fn translated_file_name(original: &str, target_language: &str) -> String {
    let safe = sanitize_file_name(original);
    let stem = Path::new(&safe)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "subtitles".to_string());
    format!("{}_{}.srt", stem, target_language)
}

struct Translated {
    entries: Vec<SubtitleEntry>,
    charged: f64,
}

pub struct StreamingTranslator {
    context: AppContext,
    policy: CreditPolicy,
}

impl StreamingTranslator {
    pub fn new(context: AppContext) -> Self {
        let policy = CreditPolicy::new(&context.config.billing);
        Self { context, policy }
    }

    fn billing_enabled(&self) -> bool {
        !self.context.config.environment.is_development()
    }

    /// Run one request to completion, writing events to `sink`
    pub async fn run(&self, request: StreamRequest, sink: EventSink) -> StreamOutcome {
        let started = Instant::now();
        info!(
            "Stream translation for {} ({} -> {}, {})",
            request.user_id,
            request.source_language.as_deref().unwrap_or("auto"),
            request.target_language,
            request.tier.as_str()
        );
        sink.emit(StreamEvent::connected()).await;

        let mut charged = None;
        match self.translate(&request, &sink, &mut charged).await {
            Ok(translated) => self.complete(request, sink, translated, started).await,
            Err(e) => {
                error!("Stream translation failed for {}: {}", request.user_id, e);
                let refund = charged.map(|amount| self.spawn_refund(&request.user_id, amount, &e));
                let stream_config = &self.context.config.stream;
                sink.finish(
                    StreamEvent::from_error(&e),
                    stream_config.result_attempts,
                    Duration::from_millis(stream_config.result_backoff_ms),
                )
                .await;
                StreamOutcome::Failed {
                    error: e.to_string(),
                    refund,
                }
            }
        }
    }

    async fn translate(
        &self,
        request: &StreamRequest,
        sink: &EventSink,
        charged: &mut Option<f64>,
    ) -> Result<Translated> {
        let entries = subtitle::parse_srt(&request.content)?;
        if entries.is_empty() {
            return Err(SubfluxError::Validation(format!(
                "No subtitles found in {}",
                request.file_name
            )));
        }
        let required = self.policy.required(entries.len(), request.tier);
        debug!("{} entries require {} credits", entries.len(), required);

        if self.billing_enabled() && required > 0.0 {
            let ledger = &self.context.ledger;
            let available = ledger.balance(&request.user_id).await?;
            if available < required {
                return Err(SubfluxError::InsufficientCredits { required, available });
            }
            ledger
                .deduct(
                    &request.user_id,
                    required,
                    &format!("Translation of {} ({} subtitles)", request.file_name, entries.len()),
                )
                .await?;
            *charged = Some(required);
        }

        let backend = self.context.backends.backend(request.service, request.tier)?;
        let translated = self.translate_with_watchdog(request, &entries, sink, backend).await?;

        Ok(Translated {
            entries: translated,
            charged: charged.unwrap_or(0.0),
        })
    }

    /// Run the backend, re-arming the stall timeout on every progress update
    async fn translate_with_watchdog(
        &self,
        request: &StreamRequest,
        entries: &[SubtitleEntry],
        sink: &EventSink,
        backend: Arc<dyn crate::translate::TranslationBackend>,
    ) -> Result<Vec<SubtitleEntry>> {
        let stream_config = &self.context.config.stream;
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
        let callback: ProgressCallback = Arc::new(move |p: TranslationProgress| {
            let _ = progress_tx.send(p);
        });

        let work = backend.translate(
            entries,
            &request.target_language,
            request.source_language.as_deref(),
            callback,
        );
        tokio::pin!(work);

        let mut budget = stall_timeout(stream_config, entries.len(), TranslationStage::Parsing);
        let deadline = tokio::time::sleep(budget);
        tokio::pin!(deadline);

        let result = loop {
            tokio::select! {
                biased;
                Some(update) = progress_rx.recv() => {
                    budget = stall_timeout(stream_config, entries.len(), update.stage);
                    deadline.as_mut().reset(tokio::time::Instant::now() + budget);
                    sink.emit(StreamEvent::Progress(update)).await;
                }
                result = &mut work => break result,
                _ = &mut deadline => {
                    warn!("No translation progress for {:?}; aborting", budget);
                    return Err(SubfluxError::Timeout(budget.as_secs()));
                }
            }
        };

        while let Ok(update) = progress_rx.try_recv() {
            sink.emit(StreamEvent::Progress(update)).await;
        }
        result
    }

    async fn complete(
        &self,
        request: StreamRequest,
        sink: EventSink,
        translated: Translated,
        started: Instant,
    ) -> StreamOutcome {
        let content = subtitle::generate_srt(&translated.entries);
        let character_count = subtitle::character_count(&translated.entries);
        let processing_time_ms = started.elapsed().as_millis() as u64;
        let now = Utc::now();

        let job = TranslationJob {
            id: Uuid::new_v4(),
            user_id: request.user_id.clone(),
            status: JobStatus::Completed,
            original_file_name: request.file_name.clone(),
            source_language: request.source_language.clone(),
            target_language: request.target_language.clone(),
            ai_service: request.service,
            translated_content: content.clone(),
            subtitle_count: translated.entries.len(),
            character_count,
            processing_time_ms,
            created_at: now,
            completed_at: Some(now),
        };

        if let Err(e) = self.context.jobs.save_translation(&job).await {
            warn!("Failed to persist translation job {}: {}", job.id, e);
        }

        let output = TranslationOutput {
            job_id: job.id,
            file_name: translated_file_name(&request.file_name, &request.target_language),
            translated_content: content,
            subtitle_count: job.subtitle_count,
            character_count,
            credits_used: translated.charged,
            processing_time_ms,
        };

        let stream_config = &self.context.config.stream;
        let delivered = sink
            .finish(
                StreamEvent::Result(output.clone()),
                stream_config.result_attempts,
                Duration::from_millis(stream_config.result_backoff_ms),
            )
            .await;
        if !delivered {
            error!("Result for job {} was not delivered to the client", job.id);
        }

        self.record_side_effects(&request, &job, &output).await;

        info!(
            "Stream translation {} completed: {} subtitles in {} ms",
            job.id, job.subtitle_count, processing_time_ms
        );
        StreamOutcome::Completed {
            job_id: job.id,
            delivered,
        }
    }

    /// Artifact upload and usage counters; failures are logged only
    async fn record_side_effects(&self, request: &StreamRequest, job: &TranslationJob, output: &TranslationOutput) {
        let key = format!(
            "translations/{}/{}/{}",
            sanitize_file_name(&request.user_id),
            job.id,
            output.file_name
        );
        if let Err(e) = self
            .context
            .artifacts
            .put(&key, output.translated_content.as_bytes().to_vec())
            .await
        {
            warn!("Failed to upload translated artifact for job {}: {}", job.id, e);
        }

        let delta = UsageDelta {
            translations: 1,
            subtitles: job.subtitle_count as u64,
            characters: job.character_count as u64,
            batch_files: 0,
            credits: output.credits_used,
        };
        if let Err(e) = self
            .context
            .usage
            .record_usage(&request.user_id, Utc::now().date_naive(), &delta)
            .await
        {
            warn!("Failed to record usage for {}: {}", request.user_id, e);
        }
    }

    fn spawn_refund(&self, user_id: &str, amount: f64, cause: &SubfluxError) -> JoinHandle<()> {
        let ledger = Arc::clone(&self.context.ledger);
        let user_id = user_id.to_string();
        let reason = format!("Refund for failed translation: {}", cause);
        tokio::spawn(async move {
            match ledger.refund(&user_id, amount, &reason).await {
                Ok(tx) => info!("Refunded {} credits to {} (balance {})", tx.amount, user_id, tx.balance_after),
                Err(e) => error!("Failed to refund {} credits to {}: {}", amount, user_id, e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::ledger::MockCreditLedger;
    use crate::billing::CreditLedger;
    use crate::config::Environment;
    use crate::model::TransactionType;
    use crate::storage::MockArtifactStore;
    use crate::store::JobRepository;
    use crate::test_support::{harness, sample_srt, ScriptedBackend};

    fn request(content: String) -> StreamRequest {
        StreamRequest {
            user_id: "u1".to_string(),
            file_name: "movie.en.srt".to_string(),
            content,
            source_language: Some("en".to_string()),
            target_language: "cs".to_string(),
            tier: QualityTier::Standard,
            service: AiService::OpenAi,
        }
    }

    async fn collect(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn assert_single_terminal(events: &[StreamEvent]) {
        let terminals: Vec<usize> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_terminal())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(terminals, vec![events.len() - 1], "events: {:?}", events);
        assert!(matches!(events[0], StreamEvent::Connected { .. }));
    }

    async fn kinds(ledger: &dyn CreditLedger) -> Vec<TransactionType> {
        let mut kinds: Vec<TransactionType> =
            ledger.transactions("u1").await.unwrap().into_iter().map(|t| t.kind).collect();
        kinds.reverse();
        kinds
    }

    #[tokio::test]
    async fn success_charges_once_and_delivers_result() {
        let h = harness(Environment::Production, ScriptedBackend::Echo);
        h.ledger.top_up("u1", 10.0, "purchase").await.unwrap();
        let translator = StreamingTranslator::new(h.context.clone());
        let (sink, rx) = EventSink::channel(64);

        let outcome = translator.run(request(sample_srt(25)), sink).await;
        let events = collect(rx).await;

        assert_single_terminal(&events);
        let job_id = match outcome {
            StreamOutcome::Completed { job_id, delivered } => {
                assert!(delivered);
                job_id
            }
            other => panic!("unexpected outcome {:?}", other),
        };
        match events.last().unwrap() {
            StreamEvent::Result(output) => {
                assert_eq!(output.subtitle_count, 25);
                assert_eq!(output.credits_used, 1.0);
                assert_eq!(output.file_name, "movie.en_cs.srt");
                assert!(output.translated_content.contains("Caption 25 [cs]"));
            }
            other => panic!("unexpected terminal {:?}", other),
        }
        assert!(events.iter().any(|e| matches!(e, StreamEvent::Progress(_))));

        assert_eq!(kinds(h.ledger.as_ref()).await, vec![TransactionType::Topup, TransactionType::Deduction]);
        assert_eq!(h.ledger.balance("u1").await.unwrap(), 9.0);

        let job = h.store.get_translation(job_id).await.unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(h.artifacts.keys().await.len(), 1);
    }

    #[tokio::test]
    async fn insufficient_balance_never_deducts() {
        let h = harness(Environment::Production, ScriptedBackend::Echo);
        h.ledger.top_up("u1", 0.5, "purchase").await.unwrap();
        let translator = StreamingTranslator::new(h.context.clone());
        let (sink, rx) = EventSink::channel(64);

        let mut req = request(sample_srt(21));
        req.tier = QualityTier::Premium;
        let outcome = translator.run(req, sink).await;
        let events = collect(rx).await;

        assert_single_terminal(&events);
        assert!(matches!(
            events.last().unwrap(),
            StreamEvent::Error { code, .. } if code == "insufficient_credits"
        ));
        assert!(matches!(outcome, StreamOutcome::Failed { refund: None, .. }));
        assert_eq!(kinds(h.ledger.as_ref()).await, vec![TransactionType::Topup]);
    }

    #[tokio::test]
    async fn backend_failure_refunds_the_deducted_amount() {
        let h = harness(Environment::Production, ScriptedBackend::Fail("model down".to_string()));
        h.ledger.top_up("u1", 5.0, "purchase").await.unwrap();
        let translator = StreamingTranslator::new(h.context.clone());
        let (sink, rx) = EventSink::channel(64);

        let mut req = request(sample_srt(30));
        req.tier = QualityTier::Premium;
        let outcome = translator.run(req, sink).await;
        let events = collect(rx).await;
        assert_single_terminal(&events);

        match outcome {
            StreamOutcome::Failed { refund: Some(handle), .. } => handle.await.unwrap(),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(
            kinds(h.ledger.as_ref()).await,
            vec![TransactionType::Topup, TransactionType::Deduction, TransactionType::Refund]
        );
        let history = h.ledger.transactions("u1").await.unwrap();
        assert_eq!(history[0].amount, 3.0);
        assert_eq!(h.ledger.balance("u1").await.unwrap(), 5.0);
    }

    #[tokio::test]
    async fn development_mode_skips_billing() {
        let h = harness(Environment::Development, ScriptedBackend::Fail("nope".to_string()));
        let translator = StreamingTranslator::new(h.context.clone());
        let (sink, rx) = EventSink::channel(64);

        let outcome = translator.run(request(sample_srt(3)), sink).await;
        collect(rx).await;

        assert!(matches!(outcome, StreamOutcome::Failed { refund: None, .. }));
        assert!(h.ledger.transactions("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_or_invalid_files_fail_without_charge() {
        let h = harness(Environment::Production, ScriptedBackend::Echo);
        h.ledger.top_up("u1", 5.0, "purchase").await.unwrap();
        let translator = StreamingTranslator::new(h.context.clone());

        for content in ["", "not a subtitle file"] {
            let (sink, rx) = EventSink::channel(64);
            translator.run(request(content.to_string()), sink).await;
            let events = collect(rx).await;
            assert_single_terminal(&events);
            assert!(matches!(
                events.last().unwrap(),
                StreamEvent::Error { code, .. } if code == "invalid_input"
            ));
        }
        assert_eq!(h.ledger.balance("u1").await.unwrap(), 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_backend_times_out_and_refunds() {
        let h = harness(Environment::Production, ScriptedBackend::Stall);
        h.ledger.top_up("u1", 5.0, "purchase").await.unwrap();
        let translator = StreamingTranslator::new(h.context.clone());
        let (sink, rx) = EventSink::channel(64);

        let outcome = translator.run(request(sample_srt(10)), sink).await;
        let events = collect(rx).await;

        assert_single_terminal(&events);
        assert!(matches!(
            events.last().unwrap(),
            StreamEvent::Error { code, .. } if code == "timeout"
        ));
        if let StreamOutcome::Failed { refund: Some(handle), .. } = outcome {
            handle.await.unwrap();
        } else {
            panic!("expected a refund");
        }
        assert_eq!(h.ledger.balance("u1").await.unwrap(), 5.0);
    }

    #[tokio::test(start_paused = true)]
    async fn steady_progress_keeps_a_slow_translation_alive() {
        // 10 captions allow 62s of silence; the backend runs 400s in 50s steps
        let backend = ScriptedBackend::Paced {
            step: Duration::from_secs(50),
            steps: 8,
        };
        let h = harness(Environment::Production, backend);
        h.ledger.top_up("u1", 5.0, "purchase").await.unwrap();
        let translator = StreamingTranslator::new(h.context.clone());
        let (sink, rx) = EventSink::channel(64);

        let started = tokio::time::Instant::now();
        let outcome = translator.run(request(sample_srt(10)), sink).await;
        let events = collect(rx).await;

        assert!(started.elapsed() >= Duration::from_secs(400));
        assert!(matches!(outcome, StreamOutcome::Completed { delivered: true, .. }));
        assert_single_terminal(&events);
        assert!(matches!(events.last().unwrap(), StreamEvent::Result(_)));
        let progress = events.iter().filter(|e| matches!(e, StreamEvent::Progress(_))).count();
        assert!(progress >= 9);
        assert_eq!(h.ledger.balance("u1").await.unwrap(), 4.0);
    }

    #[tokio::test]
    async fn deduction_failure_aborts_before_translation() {
        let mut h = harness(Environment::Production, ScriptedBackend::Echo);
        let mut ledger = MockCreditLedger::new();
        ledger.expect_balance().returning(|_| Ok(100.0));
        ledger
            .expect_deduct()
            .times(1)
            .returning(|_, _, _| Err(SubfluxError::Repository("ledger offline".to_string())));
        ledger.expect_refund().never();
        h.context.ledger = Arc::new(ledger);

        let translator = StreamingTranslator::new(h.context.clone());
        let (sink, rx) = EventSink::channel(64);
        let outcome = translator.run(request(sample_srt(5)), sink).await;
        let events = collect(rx).await;

        assert!(matches!(outcome, StreamOutcome::Failed { refund: None, .. }));
        assert!(!events.iter().any(|e| matches!(e, StreamEvent::Progress(_))));
    }

    #[tokio::test]
    async fn artifact_upload_failure_does_not_affect_result() {
        let mut h = harness(Environment::Development, ScriptedBackend::Echo);
        let mut artifacts = MockArtifactStore::new();
        artifacts
            .expect_put()
            .times(1)
            .returning(|_, _| Err(SubfluxError::Storage("bucket unavailable".to_string())));
        h.context.artifacts = Arc::new(artifacts);

        let translator = StreamingTranslator::new(h.context.clone());
        let (sink, rx) = EventSink::channel(64);
        let outcome = translator.run(request(sample_srt(2)), sink).await;
        let events = collect(rx).await;

        assert!(matches!(outcome, StreamOutcome::Completed { delivered: true, .. }));
        assert!(matches!(events.last().unwrap(), StreamEvent::Result(_)));
    }

    #[tokio::test]
    async fn dropped_client_is_reported_as_undelivered() {
        let h = harness(Environment::Development, ScriptedBackend::Echo);
        let translator = StreamingTranslator::new(h.context.clone());
        let (sink, rx) = EventSink::channel(64);
        drop(rx);

        let outcome = translator.run(request(sample_srt(2)), sink).await;
        assert!(matches!(outcome, StreamOutcome::Completed { delivered: false, .. }));
    }

    #[test]
    fn stall_timeout_adapts_and_caps() {
        let config = crate::config::Config::default().stream;
        assert_eq!(stall_timeout(&config, 100, TranslationStage::Parsing), Duration::from_secs(60));
        assert_eq!(stall_timeout(&config, 100, TranslationStage::Translating), Duration::from_secs(80));
        assert_eq!(stall_timeout(&config, 10_000, TranslationStage::Translating), Duration::from_secs(300));
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let value = serde_json::to_value(StreamEvent::connected()).unwrap();
        assert_eq!(value["type"], "connected");

        let progress = StreamEvent::Progress(TranslationProgress::new(TranslationStage::Translating, 1, 2, "x"));
        let value = serde_json::to_value(progress).unwrap();
        assert_eq!(value["type"], "progress");
        assert_eq!(value["percent"], 50);

        let err = StreamEvent::from_error(&SubfluxError::Timeout(60));
        assert_eq!(serde_json::to_value(err).unwrap()["code"], "timeout");
    }

    #[test]
    fn names_translated_files() {
        assert_eq!(translated_file_name("Movie.srt", "cs"), "Movie_cs.srt");
        assert_eq!(translated_file_name("../x/show", "de"), "show_de.srt");
    }
}
