use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{Result, SubfluxError};
use crate::model::{
    BatchJob, BatchStatus, DailyAnalytics, TranslationJob, UsageDelta, UserUsage,
};
use super::{JobRepository, UsageRepository};

#[derive(Default)]
pub struct MemoryStore {
    translations: RwLock<HashMap<Uuid, TranslationJob>>,
    batches: RwLock<HashMap<Uuid, BatchJob>>,
    usage: RwLock<HashMap<String, UserUsage>>,
    daily: RwLock<HashMap<NaiveDate, DailyAnalytics>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobRepository for MemoryStore {
    async fn save_translation(&self, job: &TranslationJob) -> Result<()> {
        debug!("Saving translation job {}", job.id);
        self.translations.write().await.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_translation(&self, id: Uuid) -> Result<Option<TranslationJob>> {
        Ok(self.translations.read().await.get(&id).cloned())
    }

    async fn list_translations(&self, user_id: &str) -> Result<Vec<TranslationJob>> {
        let mut jobs: Vec<TranslationJob> = self
            .translations
            .read()
            .await
            .values()
            .filter(|j| j.user_id == user_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }

    async fn create_batch(&self, job: &BatchJob) -> Result<()> {
        let mut batches = self.batches.write().await;
        if batches.contains_key(&job.id) {
            return Err(SubfluxError::Repository(format!("Batch job {} already exists", job.id)));
        }
        batches.insert(job.id, job.clone());
        Ok(())
    }

    async fn get_batch(&self, id: Uuid) -> Result<Option<BatchJob>> {
        Ok(self.batches.read().await.get(&id).cloned())
    }

    async fn update_batch(&self, job: &BatchJob) -> Result<()> {
        let mut batches = self.batches.write().await;
        let stored = batches
            .get_mut(&job.id)
            .ok_or_else(|| SubfluxError::NotFound(format!("Batch job {}", job.id)))?;

        let cancelled = stored.status == BatchStatus::Cancelled;
        let completed_at = stored.completed_at;
        *stored = job.clone();
        if cancelled {
            stored.status = BatchStatus::Cancelled;
            stored.completed_at = completed_at;
        }
        Ok(())
    }

    async fn cancel_batch(&self, id: Uuid) -> Result<BatchJob> {
        let mut batches = self.batches.write().await;
        let stored = batches
            .get_mut(&id)
            .ok_or_else(|| SubfluxError::NotFound(format!("Batch job {}", id)))?;
        stored.transition(BatchStatus::Cancelled)?;
        Ok(stored.clone())
    }

    async fn list_batches(&self, user_id: &str) -> Result<Vec<BatchJob>> {
        let mut jobs: Vec<BatchJob> = self
            .batches
            .read()
            .await
            .values()
            .filter(|j| j.user_id == user_id)
            .cloned()
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(jobs)
    }
}

#[async_trait]
impl UsageRepository for MemoryStore {
    async fn record_usage(&self, user_id: &str, date: NaiveDate, delta: &UsageDelta) -> Result<()> {
        {
            let mut usage = self.usage.write().await;
            let entry = usage.entry(user_id.to_string()).or_insert_with(|| UserUsage {
                user_id: user_id.to_string(),
                ..UserUsage::default()
            });
            entry.total_translations += delta.translations;
            entry.total_subtitles += delta.subtitles;
            entry.total_characters += delta.characters;
            entry.credits_used += delta.credits;
        }

        let mut daily = self.daily.write().await;
        let row = daily.entry(date).or_insert_with(|| DailyAnalytics {
            date,
            translations: 0,
            subtitles: 0,
            characters: 0,
            batch_files: 0,
        });
        row.translations += delta.translations;
        row.subtitles += delta.subtitles;
        row.characters += delta.characters;
        row.batch_files += delta.batch_files;
        Ok(())
    }

    async fn user_usage(&self, user_id: &str) -> Result<UserUsage> {
        Ok(self
            .usage
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| UserUsage {
                user_id: user_id.to_string(),
                ..UserUsage::default()
            }))
    }

    async fn daily_analytics(&self, date: NaiveDate) -> Result<Option<DailyAnalytics>> {
        Ok(self.daily.read().await.get(&date).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiService;

    fn batch(user: &str) -> BatchJob {
        BatchJob::new(user, "job", vec!["a.srt".into()], "cs", None, AiService::OpenAi)
    }

    #[tokio::test]
    async fn update_never_resurrects_cancelled_batch() {
        let store = MemoryStore::new();
        let mut job = batch("u1");
        store.create_batch(&job).await.unwrap();

        job.transition(BatchStatus::Processing).unwrap();
        store.update_batch(&job).await.unwrap();
        store.cancel_batch(job.id).await.unwrap();

        job.processed_files = 1;
        store.update_batch(&job).await.unwrap();

        let stored = store.get_batch(job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BatchStatus::Cancelled);
        assert_eq!(stored.processed_files, 1);
    }

    #[tokio::test]
    async fn cancel_rejects_finished_and_unknown_batches() {
        let store = MemoryStore::new();
        let mut job = batch("u1");
        job.transition(BatchStatus::Failed).unwrap();
        store.create_batch(&job).await.unwrap();

        assert!(store.cancel_batch(job.id).await.is_err());
        assert!(matches!(store.cancel_batch(Uuid::new_v4()).await, Err(SubfluxError::NotFound(_))));
        assert!(store.create_batch(&job).await.is_err());
    }

    #[tokio::test]
    async fn lists_only_the_users_batches() {
        let store = MemoryStore::new();
        store.create_batch(&batch("u1")).await.unwrap();
        store.create_batch(&batch("u2")).await.unwrap();
        assert_eq!(store.list_batches("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn usage_accumulates_per_user_and_day() {
        let store = MemoryStore::new();
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let delta = UsageDelta {
            translations: 1,
            subtitles: 40,
            characters: 900,
            batch_files: 0,
            credits: 1.0,
        };
        store.record_usage("u1", day, &delta).await.unwrap();
        store.record_usage("u1", day, &delta).await.unwrap();

        let usage = store.user_usage("u1").await.unwrap();
        assert_eq!(usage.total_subtitles, 80);
        assert_eq!(usage.credits_used, 2.0);
        assert_eq!(store.daily_analytics(day).await.unwrap().unwrap().translations, 2);
        assert_eq!(store.user_usage("nobody").await.unwrap().total_translations, 0);
    }
}
