// Persistence ports
//
// Repositories for job records and usage counters. `MemoryStore` is the
// in-process implementation used by the server and the tests.

pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::model::{BatchJob, DailyAnalytics, TranslationJob, UsageDelta, UserUsage};

#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn save_translation(&self, job: &TranslationJob) -> Result<()>;

    async fn get_translation(&self, id: Uuid) -> Result<Option<TranslationJob>>;

    /// Newest first
    async fn list_translations(&self, user_id: &str) -> Result<Vec<TranslationJob>>;

    async fn create_batch(&self, job: &BatchJob) -> Result<()>;

    async fn get_batch(&self, id: Uuid) -> Result<Option<BatchJob>>;

    /// Replace a stored batch record. A record already marked cancelled keeps
    /// its cancelled status; the other fields are still written.
    async fn update_batch(&self, job: &BatchJob) -> Result<()>;

    /// Mark a batch cancelled, returning the updated record
    async fn cancel_batch(&self, id: Uuid) -> Result<BatchJob>;

    /// Newest first
    async fn list_batches(&self, user_id: &str) -> Result<Vec<BatchJob>>;
}

#[async_trait]
pub trait UsageRepository: Send + Sync {
    /// Add `delta` to the user's counters and to the analytics row for `date`
    async fn record_usage(&self, user_id: &str, date: NaiveDate, delta: &UsageDelta) -> Result<()>;

    async fn user_usage(&self, user_id: &str) -> Result<UserUsage>;

    async fn daily_analytics(&self, date: NaiveDate) -> Result<Option<DailyAnalytics>>;
}
