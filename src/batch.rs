//! Batch translation orchestrator.
//!
//! A submission is recorded and acknowledged immediately; files are then
//! translated one after another in a spawned task. Cancellation is observed
//! between files only.

use std::io::{Cursor, Write};
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::config::AiService;
use crate::context::AppContext;
use crate::error::{Result, SubfluxError};
use crate::model::{BatchJob, BatchStatus, FileStatus, UsageDelta};
use crate::storage::sanitize_file_name;
use crate::stream::translated_file_name;
use crate::subtitle::{self, SubtitleEntry};
use crate::translate::chunk::{chunk_entries, merge_chunks, translation_confidence};
use crate::translate::{no_progress, QualityTier, TranslationBackend};

/// One uploaded file of a batch
#[derive(Debug, Clone)]
pub struct BatchFile {
    pub name: String,
    pub data: Vec<u8>,
}

impl BatchFile {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub user_id: String,
    pub name: String,
    pub files: Vec<BatchFile>,
    pub source_language: Option<String>,
    pub target_language: String,
    pub service: AiService,
}

struct FileResult {
    archive_name: String,
    content: String,
    translated_url: String,
    original_url: String,
    subtitle_count: usize,
    character_count: usize,
    confidence: f64,
}

#[derive(Clone)]
pub struct BatchProcessor {
    context: AppContext,
}

impl BatchProcessor {
    pub fn new(context: AppContext) -> Self {
        Self { context }
    }

    fn validate(&self, request: &BatchRequest) -> Result<()> {
        let limits = &self.context.config.batch;
        if request.user_id.trim().is_empty() {
            return Err(SubfluxError::Unauthorized("user id is required".to_string()));
        }
        if request.files.is_empty() {
            return Err(SubfluxError::Validation("No files uploaded".to_string()));
        }
        if request.files.len() > limits.max_files {
            return Err(SubfluxError::Validation(format!(
                "Too many files: {} (maximum {})",
                request.files.len(),
                limits.max_files
            )));
        }
        if let Some(file) = request.files.iter().find(|f| f.data.len() > limits.max_file_bytes) {
            return Err(SubfluxError::Validation(format!(
                "File {} exceeds {} bytes",
                file.name, limits.max_file_bytes
            )));
        }
        if request.target_language.trim().is_empty() {
            return Err(SubfluxError::Validation("Target language is required".to_string()));
        }
        Ok(())
    }

    /// Record the job and start processing it in the background
    pub async fn submit(&self, request: BatchRequest) -> Result<(Uuid, JoinHandle<()>)> {
        self.validate(&request)?;

        let job = BatchJob::new(
            request.user_id.clone(),
            request.name.clone(),
            request.files.iter().map(|f| f.name.clone()).collect(),
            request.target_language.clone(),
            request.source_language.clone(),
            request.service,
        );
        let job_id = job.id;
        self.context.jobs.create_batch(&job).await?;
        info!(
            "Batch job {} '{}' accepted with {} files for {}",
            job_id,
            job.name,
            job.total_files,
            job.user_id
        );

        let processor = self.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = processor.process(job_id, request.files).await {
                error!("Batch job {} aborted: {}", job_id, e);
                processor.mark_failed(job_id, &e).await;
            }
        });
        Ok((job_id, handle))
    }

    /// Job owned by `user_id`; other users' jobs are reported as missing
    pub async fn status(&self, job_id: Uuid, user_id: &str) -> Result<BatchJob> {
        match self.context.jobs.get_batch(job_id).await? {
            Some(job) if job.user_id == user_id => Ok(job),
            _ => Err(SubfluxError::NotFound(format!("Batch job {}", job_id))),
        }
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<BatchJob>> {
        self.context.jobs.list_batches(user_id).await
    }

    pub async fn cancel(&self, job_id: Uuid, user_id: &str) -> Result<BatchJob> {
        self.status(job_id, user_id).await?;
        let job = self.context.jobs.cancel_batch(job_id).await?;
        info!("Batch job {} cancelled by {}", job_id, user_id);
        Ok(job)
    }

    /// Translate every file of a recorded job, in order
    pub async fn process(&self, job_id: Uuid, files: Vec<BatchFile>) -> Result<()> {
        let jobs = &self.context.jobs;
        let mut job = jobs
            .get_batch(job_id)
            .await?
            .ok_or_else(|| SubfluxError::NotFound(format!("Batch job {}", job_id)))?;
        if job.status == BatchStatus::Cancelled {
            info!("Batch job {} was cancelled before it started", job_id);
            return Ok(());
        }
        job.transition(BatchStatus::Processing)?;
        jobs.update_batch(&job).await?;

        let backend = self.context.backends.backend(job.ai_service, QualityTier::Standard)?;
        let mut outputs: Vec<FileResult> = Vec::new();
        let mut usage = UsageDelta::default();

        for (position, file) in files.into_iter().enumerate() {
            let current = jobs.get_batch(job_id).await?;
            if current.map_or(true, |j| j.status == BatchStatus::Cancelled) {
                info!("Batch job {} cancelled; stopping before {}", job_id, file.name);
                self.record_usage(&job.user_id, &usage).await;
                return Ok(());
            }

            job.files[position].status = FileStatus::Processing;
            jobs.update_batch(&job).await?;

            let started = Instant::now();
            let result = self.process_file(&job, &file, backend.as_ref()).await;
            let elapsed = started.elapsed().as_millis() as u64;

            let status = &mut job.files[position];
            status.processing_time_ms = elapsed;
            match result {
                Ok(output) => {
                    status.status = FileStatus::Completed;
                    status.original_url = Some(output.original_url.clone());
                    status.translated_url = Some(output.translated_url.clone());
                    status.subtitle_count = output.subtitle_count;
                    status.character_count = output.character_count;
                    status.confidence = Some(output.confidence);
                    job.processed_files += 1;
                    usage.batch_files += 1;
                    usage.subtitles += output.subtitle_count as u64;
                    usage.characters += output.character_count as u64;
                    debug!("Batch job {}: {} done in {} ms", job_id, file.name, elapsed);
                    outputs.push(output);
                }
                Err(e) => {
                    warn!("Batch job {}: {} failed: {}", job_id, file.name, e);
                    status.status = FileStatus::Failed;
                    status.error = Some(e.to_string());
                    job.failed_files += 1;
                }
            }
            job.refresh_progress();
            jobs.update_batch(&job).await?;
        }

        // Translations already ran; usage stands whatever happens to the archive
        self.record_usage(&job.user_id, &usage).await;

        if outputs.is_empty() {
            job.transition(BatchStatus::Failed)?;
            jobs.update_batch(&job).await?;
            warn!("Batch job {} failed: no file could be translated", job_id);
            return Ok(());
        }

        match self.publish_archive(&job, &outputs).await {
            Ok(url) => {
                job.download_url = Some(url);
                job.transition(BatchStatus::Completed)?;
                jobs.update_batch(&job).await?;
                info!(
                    "Batch job {} completed: {} ok, {} failed",
                    job_id, job.processed_files, job.failed_files
                );
            }
            Err(e) => {
                error!("Batch job {} failed to publish its archive: {}", job_id, e);
                job.transition(BatchStatus::Failed)?;
                jobs.update_batch(&job).await?;
            }
        }
        Ok(())
    }

    async fn publish_archive(&self, job: &BatchJob, outputs: &[FileResult]) -> Result<String> {
        let archive = build_archive(outputs)?;
        self.context.artifacts.put(&archive_key(job), archive).await
    }

    async fn process_file(
        &self,
        job: &BatchJob,
        file: &BatchFile,
        backend: &dyn TranslationBackend,
    ) -> Result<FileResult> {
        let safe_name = sanitize_file_name(&file.name);
        let original_url = self
            .context
            .artifacts
            .put(
                &format!("batches/{}/{}/original/{}", sanitize_file_name(&job.user_id), job.id, safe_name),
                file.data.clone(),
            )
            .await?;

        let content = std::str::from_utf8(&file.data)
            .map_err(|_| SubfluxError::Validation(format!("{} is not valid UTF-8 text", file.name)))?;
        let entries = subtitle::parse_srt(content)?;
        if entries.is_empty() {
            return Err(SubfluxError::Validation(format!("No subtitles found in {}", file.name)));
        }

        let limits = &self.context.config.batch;
        let mut translated: Vec<Vec<SubtitleEntry>> = Vec::new();
        for chunk in chunk_entries(&entries, limits.chunk_entries, limits.chunk_chars) {
            let part = backend
                .translate(
                    chunk,
                    &job.target_language,
                    job.source_language.as_deref(),
                    no_progress(),
                )
                .await?;
            translated.push(part);
        }
        let merged = merge_chunks(&entries, translated)?;
        let confidence = translation_confidence(&entries, &merged);
        let srt = subtitle::generate_srt(&merged);

        let archive_name = translated_file_name(&file.name, &job.target_language);
        let translated_url = self
            .context
            .artifacts
            .put(
                &format!("batches/{}/{}/translated/{}", sanitize_file_name(&job.user_id), job.id, archive_name),
                srt.clone().into_bytes(),
            )
            .await?;

        Ok(FileResult {
            archive_name,
            character_count: subtitle::character_count(&merged),
            subtitle_count: merged.len(),
            content: srt,
            translated_url,
            original_url,
            confidence,
        })
    }

    async fn record_usage(&self, user_id: &str, usage: &UsageDelta) {
        if usage.batch_files == 0 {
            return;
        }
        if let Err(e) = self
            .context
            .usage
            .record_usage(user_id, Utc::now().date_naive(), usage)
            .await
        {
            warn!("Failed to record batch usage for {}: {}", user_id, e);
        }
    }

    async fn mark_failed(&self, job_id: Uuid, cause: &SubfluxError) {
        let jobs = &self.context.jobs;
        match jobs.get_batch(job_id).await {
            Ok(Some(mut job)) if !job.status.is_terminal() => {
                if job.transition(BatchStatus::Failed).is_ok() {
                    if let Err(e) = jobs.update_batch(&job).await {
                        error!("Failed to mark batch job {} failed ({}): {}", job_id, cause, e);
                    }
                }
            }
            Ok(_) => {}
            Err(e) => error!("Failed to load batch job {}: {}", job_id, e),
        }
    }
}

/// Storage key of a finished job's zip archive
pub fn archive_key(job: &BatchJob) -> String {
    format!(
        "batches/{}/{}/{}.zip",
        sanitize_file_name(&job.user_id),
        job.id,
        sanitize_file_name(&job.name)
    )
}

/// Zip the translated files, deduplicating archive names
fn build_archive(outputs: &[FileResult]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut used: Vec<String> = Vec::new();

    for output in outputs {
        let name = unique_name(&output.archive_name, &used);
        zip.start_file(name.as_str(), options)?;
        zip.write_all(output.content.as_bytes())?;
        used.push(name);
    }

    Ok(zip.finish()?.into_inner())
}

fn unique_name(name: &str, used: &[String]) -> String {
    if !used.iter().any(|u| u == name) {
        return name.to_string();
    }
    let path = Path::new(name);
    let stem = path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().to_string()).unwrap_or_default();
    (2..)
        .map(|n| format!("{}_{}.{}", stem, n, ext))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::sync::Arc;

    use crate::config::Environment;
    use crate::store::{JobRepository, UsageRepository};
    use crate::storage::{ArtifactStore, MockArtifactStore};
    use crate::test_support::{harness, sample_srt, ScriptedBackend, POISON};

    fn request(files: Vec<BatchFile>) -> BatchRequest {
        BatchRequest {
            user_id: "u1".to_string(),
            name: "season one".to_string(),
            files,
            source_language: Some("en".to_string()),
            target_language: "de".to_string(),
            service: AiService::OpenAi,
        }
    }

    fn srt_file(name: &str, n: u32) -> BatchFile {
        BatchFile::new(name, sample_srt(n).into_bytes())
    }

    #[tokio::test]
    async fn one_failing_file_does_not_stop_the_batch() {
        let h = harness(Environment::Production, ScriptedBackend::Echo);
        let processor = BatchProcessor::new(h.context.clone());
        let poisoned = BatchFile::new("bad.srt", format!("1\n00:00:01,000 --> 00:00:02,000\n{}\n", POISON).into_bytes());

        let (job_id, handle) = processor
            .submit(request(vec![srt_file("e01.srt", 45), poisoned, srt_file("e03.srt", 3)]))
            .await
            .unwrap();
        handle.await.unwrap();

        let job = processor.status(job_id, "u1").await.unwrap();
        assert_eq!(job.status, BatchStatus::Completed);
        assert_eq!(job.processed_files, 2);
        assert_eq!(job.failed_files, 1);
        assert_eq!(job.progress, 100);
        assert_eq!(job.files[1].status, FileStatus::Failed);
        assert!(job.files[1].error.is_some());
        assert_eq!(job.files[0].subtitle_count, 45);
        assert_eq!(job.files[0].confidence, Some(1.0));

        assert!(job.download_url.is_some());
        let archive = h.artifacts.get(&archive_key(&job)).await.unwrap();
        let mut zip = zip::ZipArchive::new(Cursor::new(archive)).unwrap();
        assert_eq!(zip.len(), 2);
        let mut text = String::new();
        zip.by_name("e01_de.srt").unwrap().read_to_string(&mut text).unwrap();
        assert!(text.contains("Caption 45 [de]"));

        let usage = h.store.user_usage("u1").await.unwrap();
        assert_eq!(usage.total_subtitles, 48);
        let daily = h.store.daily_analytics(Utc::now().date_naive()).await.unwrap().unwrap();
        assert_eq!(daily.batch_files, 2);
    }

    #[tokio::test]
    async fn all_files_failing_marks_job_failed() {
        let h = harness(Environment::Production, ScriptedBackend::Fail("offline".to_string()));
        let processor = BatchProcessor::new(h.context.clone());

        let (job_id, handle) = processor
            .submit(request(vec![srt_file("a.srt", 2), srt_file("b.srt", 2)]))
            .await
            .unwrap();
        handle.await.unwrap();

        let job = processor.status(job_id, "u1").await.unwrap();
        assert_eq!(job.status, BatchStatus::Failed);
        assert_eq!(job.failed_files, 2);
        assert!(job.download_url.is_none());
        assert!(job.completed_at.is_some());
    }

    #[tokio::test]
    async fn archive_upload_failure_still_records_usage() {
        let mut h = harness(Environment::Production, ScriptedBackend::Echo);
        let mut artifacts = MockArtifactStore::new();
        artifacts.expect_put().returning(|key, _| {
            if key.ends_with(".zip") {
                Err(SubfluxError::Storage("bucket unavailable".to_string()))
            } else {
                Ok(format!("/files/{}", key))
            }
        });
        h.context.artifacts = Arc::new(artifacts);
        let processor = BatchProcessor::new(h.context.clone());

        let (job_id, handle) = processor
            .submit(request(vec![srt_file("a.srt", 4), srt_file("b.srt", 6)]))
            .await
            .unwrap();
        handle.await.unwrap();

        let job = processor.status(job_id, "u1").await.unwrap();
        assert_eq!(job.status, BatchStatus::Failed);
        assert_eq!(job.processed_files, 2);
        assert!(job.download_url.is_none());

        let usage = h.store.user_usage("u1").await.unwrap();
        assert_eq!(usage.total_subtitles, 10);
        let daily = h.store.daily_analytics(Utc::now().date_naive()).await.unwrap().unwrap();
        assert_eq!(daily.batch_files, 2);
    }

    #[tokio::test]
    async fn non_utf8_file_fails_on_its_own() {
        let h = harness(Environment::Production, ScriptedBackend::Echo);
        let processor = BatchProcessor::new(h.context.clone());
        let mut latin1 = b"1\n00:00:01,000 --> 00:00:02,000\nCaf".to_vec();
        latin1.extend_from_slice(&[0xe9, b'\n']);

        let (job_id, handle) = processor
            .submit(request(vec![BatchFile::new("latin1.srt", latin1), srt_file("ok.srt", 3)]))
            .await
            .unwrap();
        handle.await.unwrap();

        let job = processor.status(job_id, "u1").await.unwrap();
        assert_eq!(job.status, BatchStatus::Completed);
        assert_eq!(job.failed_files, 1);
        assert_eq!(job.processed_files, 1);
        assert_eq!(job.files[0].status, FileStatus::Failed);
        assert!(job.files[0].error.as_deref().unwrap().contains("UTF-8"));
    }

    #[tokio::test]
    async fn cancelled_job_is_never_processed() {
        let h = harness(Environment::Production, ScriptedBackend::Echo);
        let processor = BatchProcessor::new(h.context.clone());
        let job = BatchJob::new("u1", "later", vec!["a.srt".to_string()], "de", None, AiService::OpenAi);
        h.store.create_batch(&job).await.unwrap();

        processor.cancel(job.id, "u1").await.unwrap();
        processor.process(job.id, vec![srt_file("a.srt", 2)]).await.unwrap();

        let stored = h.store.get_batch(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BatchStatus::Cancelled);
        assert_eq!(stored.files[0].status, FileStatus::Pending);
        assert!(h.artifacts.keys().await.is_empty());
    }

    #[tokio::test]
    async fn other_users_cannot_see_or_cancel_a_job() {
        let h = harness(Environment::Production, ScriptedBackend::Echo);
        let processor = BatchProcessor::new(h.context.clone());
        let job = BatchJob::new("u1", "mine", vec!["a.srt".to_string()], "de", None, AiService::OpenAi);
        h.store.create_batch(&job).await.unwrap();

        assert!(matches!(processor.status(job.id, "u2").await, Err(SubfluxError::NotFound(_))));
        assert!(matches!(processor.cancel(job.id, "u2").await, Err(SubfluxError::NotFound(_))));
        assert_eq!(processor.list("u2").await.unwrap().len(), 0);
        assert_eq!(processor.list("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn submission_limits_are_enforced() {
        let h = harness(Environment::Production, ScriptedBackend::Echo);
        let processor = BatchProcessor::new(h.context.clone());
        let max_files = h.context.config.batch.max_files;
        let max_bytes = h.context.config.batch.max_file_bytes;

        let too_many: Vec<BatchFile> = (0..=max_files).map(|i| srt_file(&format!("{}.srt", i), 1)).collect();
        assert!(matches!(processor.submit(request(too_many)).await, Err(SubfluxError::Validation(_))));

        let too_big = vec![BatchFile::new("big.srt", vec![b'a'; max_bytes + 1])];
        assert!(matches!(processor.submit(request(too_big)).await, Err(SubfluxError::Validation(_))));

        assert!(matches!(processor.submit(request(Vec::new())).await, Err(SubfluxError::Validation(_))));
        assert!(processor.list("u1").await.unwrap().is_empty());
    }

    #[test]
    fn archive_names_are_unique() {
        let used = vec!["a_de.srt".to_string(), "a_de_2.srt".to_string()];
        assert_eq!(unique_name("a_de.srt", &used), "a_de_3.srt");
        assert_eq!(unique_name("b_de.srt", &used), "b_de.srt");
    }
}
