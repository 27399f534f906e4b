use crate::config::BillingConfig;
use crate::translate::QualityTier;

/// Credits are kept as integer hundredths so ledger arithmetic stays exact
pub const CENTS_PER_CREDIT: i64 = 100;

pub fn to_cents(credits: f64) -> i64 {
    (credits * CENTS_PER_CREDIT as f64).round() as i64
}

pub fn from_cents(cents: i64) -> f64 {
    cents as f64 / CENTS_PER_CREDIT as f64
}

/// Credits required to translate `entry_count` entries:
/// `ceil(entry_count / batch_size) * rate`
pub fn required_credits(entry_count: usize, batch_size: usize, rate: f64) -> f64 {
    let batch_size = batch_size.max(1);
    let batches = entry_count.div_ceil(batch_size);
    from_cents(batches as i64 * to_cents(rate))
}

/// Pricing derived from billing configuration
#[derive(Debug, Clone)]
pub struct CreditPolicy {
    batch_size: usize,
    standard_rate: f64,
    premium_rate: f64,
}

impl CreditPolicy {
    pub fn new(config: &BillingConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            standard_rate: config.standard_rate,
            premium_rate: config.premium_rate,
        }
    }

    pub fn rate(&self, tier: QualityTier) -> f64 {
        match tier {
            QualityTier::Standard => self.standard_rate,
            QualityTier::Premium => self.premium_rate,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn required(&self, entry_count: usize, tier: QualityTier) -> f64 {
        required_credits(entry_count, self.batch_size, self.rate(tier))
    }
}
