//! Persisted record types.
//!
//! These are the shapes stored by the repositories and returned over HTTP.
//! Field names serialize in camelCase for the web client.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AiService;
use crate::error::{Result, SubfluxError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// A single finished (or failed) translation of one file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationJob {
    pub id: Uuid,
    pub user_id: String,
    pub status: JobStatus,
    pub original_file_name: String,
    pub source_language: Option<String>,
    pub target_language: String,
    pub ai_service: AiService,
    pub translated_content: String,
    pub subtitle_count: usize,
    pub character_count: usize,
    pub processing_time_ms: u64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl BatchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Failed | BatchStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed => "failed",
            BatchStatus::Cancelled => "cancelled",
        }
    }

    fn can_transition_to(&self, next: BatchStatus) -> bool {
        match self {
            BatchStatus::Pending => next != BatchStatus::Pending,
            BatchStatus::Processing => next.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFileStatus {
    pub file_name: String,
    pub status: FileStatus,
    pub original_url: Option<String>,
    pub translated_url: Option<String>,
    pub subtitle_count: usize,
    pub character_count: usize,
    pub processing_time_ms: u64,
    pub confidence: Option<f64>,
    pub error: Option<String>,
}

impl BatchFileStatus {
    pub fn pending(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            status: FileStatus::Pending,
            original_url: None,
            translated_url: None,
            subtitle_count: 0,
            character_count: 0,
            processing_time_ms: 0,
            confidence: None,
            error: None,
        }
    }
}

/// A multi-file translation processed out of band
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchJob {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub status: BatchStatus,
    pub files: Vec<BatchFileStatus>,
    pub total_files: usize,
    pub processed_files: usize,
    pub failed_files: usize,
    pub progress: u8,
    pub download_url: Option<String>,
    pub target_language: String,
    pub source_language: Option<String>,
    pub ai_service: AiService,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl BatchJob {
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        file_names: Vec<String>,
        target_language: impl Into<String>,
        source_language: Option<String>,
        ai_service: AiService,
    ) -> Self {
        let now = Utc::now();
        let files: Vec<BatchFileStatus> = file_names.into_iter().map(BatchFileStatus::pending).collect();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            name: name.into(),
            status: BatchStatus::Pending,
            total_files: files.len(),
            files,
            processed_files: 0,
            failed_files: 0,
            progress: 0,
            download_url: None,
            target_language: target_language.into(),
            source_language,
            ai_service,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Move to `next`, rejecting transitions out of terminal states
    pub fn transition(&mut self, next: BatchStatus) -> Result<()> {
        if self.status == next {
            return Ok(());
        }
        if !self.status.can_transition_to(next) {
            return Err(SubfluxError::Validation(format!(
                "Batch job {} cannot move from {} to {}",
                self.id,
                self.status.as_str(),
                next.as_str()
            )));
        }
        self.status = next;
        self.updated_at = Utc::now();
        if next.is_terminal() {
            self.completed_at = Some(self.updated_at);
        }
        Ok(())
    }

    /// Recompute `progress` from finished files
    pub fn refresh_progress(&mut self) {
        let done = self.processed_files + self.failed_files;
        self.progress = if self.total_files == 0 {
            100
        } else {
            ((done.min(self.total_files) * 100) / self.total_files) as u8
        };
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deduction,
    Refund,
    Topup,
    Bonus,
}

impl TransactionType {
    /// Sign applied to the amount when updating the balance
    pub fn sign(&self) -> i64 {
        match self {
            TransactionType::Deduction => -1,
            _ => 1,
        }
    }
}

/// Append-only credit ledger entry. Amounts are non-negative; the type
/// carries the direction. Values are in credits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditTransaction {
    pub id: Uuid,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    pub balance_before: f64,
    pub balance_after: f64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub code: String,
    pub credit_amount: f64,
    pub campaign_name: String,
    pub usage_limit: u32,
    pub used_count: u32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Voucher {
    /// Check the voucher can be redeemed at `now`
    pub fn validate(&self, now: DateTime<Utc>) -> Result<()> {
        if !self.is_active {
            return Err(SubfluxError::Voucher(format!("Voucher {} is not active", self.code)));
        }
        if matches!(self.expires_at, Some(expiry) if expiry <= now) {
            return Err(SubfluxError::Voucher(format!("Voucher {} has expired", self.code)));
        }
        if self.used_count >= self.usage_limit {
            return Err(SubfluxError::Voucher(format!(
                "Voucher {} has reached its usage limit",
                self.code
            )));
        }
        Ok(())
    }
}

/// Aggregate usage counters per user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUsage {
    pub user_id: String,
    pub total_translations: u64,
    pub total_subtitles: u64,
    pub total_characters: u64,
    pub credits_used: f64,
}

/// One usage increment, applied to both user and daily counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageDelta {
    pub translations: u64,
    pub subtitles: u64,
    pub characters: u64,
    pub batch_files: u64,
    pub credits: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAnalytics {
    pub date: NaiveDate,
    pub translations: u64,
    pub subtitles: u64,
    pub characters: u64,
    pub batch_files: u64,
}
