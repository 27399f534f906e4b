use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, SubfluxError};
use crate::model::{CreditTransaction, TransactionType, Voucher};
use super::credits::{from_cents, to_cents};

/// User credit balances with an append-only transaction history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CreditLedger: Send + Sync {
    async fn balance(&self, user_id: &str) -> Result<f64>;

    /// Fails with `InsufficientCredits`, recording nothing, when the balance is short
    async fn deduct(&self, user_id: &str, amount: f64, reason: &str) -> Result<CreditTransaction>;

    async fn refund(&self, user_id: &str, amount: f64, reason: &str) -> Result<CreditTransaction>;

    async fn top_up(&self, user_id: &str, amount: f64, reason: &str) -> Result<CreditTransaction>;

    async fn redeem_voucher(&self, user_id: &str, code: &str) -> Result<CreditTransaction>;

    /// Newest first
    async fn transactions(&self, user_id: &str) -> Result<Vec<CreditTransaction>>;
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<String, i64>,
    transactions: Vec<CreditTransaction>,
    vouchers: HashMap<String, Voucher>,
    redemptions: HashSet<(String, String)>,
}

impl LedgerState {
    fn open_account(&mut self, user_id: &str, signup_bonus: i64) {
        if self.balances.contains_key(user_id) {
            return;
        }
        self.balances.insert(user_id.to_string(), 0);
        if signup_bonus > 0 {
            self.apply(user_id, TransactionType::Bonus, signup_bonus, "Signup bonus");
        }
    }

    fn apply(&mut self, user_id: &str, kind: TransactionType, cents: i64, reason: &str) -> CreditTransaction {
        let before = self.balances.get(user_id).copied().unwrap_or(0);
        let after = before + kind.sign() * cents;
        self.balances.insert(user_id.to_string(), after);

        let tx = CreditTransaction {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            kind,
            amount: from_cents(cents),
            balance_before: from_cents(before),
            balance_after: from_cents(after),
            reason: reason.to_string(),
            created_at: Utc::now(),
        };
        self.transactions.push(tx.clone());
        tx
    }
}

/// In-process ledger; every operation is atomic under one lock
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
    signup_bonus: i64,
}

impl MemoryLedger {
    pub fn new(signup_bonus: f64) -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            signup_bonus: to_cents(signup_bonus).max(0),
        }
    }

    /// Register or replace a voucher
    pub async fn add_voucher(&self, voucher: Voucher) {
        let mut state = self.state.lock().await;
        info!("Registered voucher {} ({})", voucher.code, voucher.campaign_name);
        state.vouchers.insert(voucher.code.to_uppercase(), voucher);
    }

    pub async fn voucher(&self, code: &str) -> Option<Voucher> {
        self.state.lock().await.vouchers.get(&code.to_uppercase()).cloned()
    }

    async fn credit(&self, user_id: &str, kind: TransactionType, amount: f64, reason: &str) -> Result<CreditTransaction> {
        let cents = validate_amount(amount)?;
        let mut state = self.state.lock().await;
        state.open_account(user_id, self.signup_bonus);
        let tx = state.apply(user_id, kind, cents, reason);
        debug!("Credited {} to {} ({:?}): {}", tx.amount, user_id, kind, reason);
        Ok(tx)
    }
}

fn validate_amount(amount: f64) -> Result<i64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(SubfluxError::Validation(format!("Invalid credit amount: {}", amount)));
    }
    Ok(to_cents(amount))
}

#[async_trait]
impl CreditLedger for MemoryLedger {
    async fn balance(&self, user_id: &str) -> Result<f64> {
        let mut state = self.state.lock().await;
        state.open_account(user_id, self.signup_bonus);
        Ok(from_cents(state.balances.get(user_id).copied().unwrap_or(0)))
    }

    async fn deduct(&self, user_id: &str, amount: f64, reason: &str) -> Result<CreditTransaction> {
        let cents = validate_amount(amount)?;
        let mut state = self.state.lock().await;
        state.open_account(user_id, self.signup_bonus);

        let available = state.balances.get(user_id).copied().unwrap_or(0);
        if available < cents {
            return Err(SubfluxError::InsufficientCredits {
                required: from_cents(cents),
                available: from_cents(available),
            });
        }

        let tx = state.apply(user_id, TransactionType::Deduction, cents, reason);
        info!("Deducted {} credits from {} (balance {})", tx.amount, user_id, tx.balance_after);
        Ok(tx)
    }

    async fn refund(&self, user_id: &str, amount: f64, reason: &str) -> Result<CreditTransaction> {
        self.credit(user_id, TransactionType::Refund, amount, reason).await
    }

    async fn top_up(&self, user_id: &str, amount: f64, reason: &str) -> Result<CreditTransaction> {
        self.credit(user_id, TransactionType::Topup, amount, reason).await
    }

    async fn redeem_voucher(&self, user_id: &str, code: &str) -> Result<CreditTransaction> {
        let key = code.trim().to_uppercase();
        let mut state = self.state.lock().await;

        let voucher = state
            .vouchers
            .get(&key)
            .cloned()
            .ok_or_else(|| SubfluxError::NotFound(format!("Voucher {}", code)))?;
        voucher.validate(Utc::now())?;
        if state.redemptions.contains(&(user_id.to_string(), key.clone())) {
            return Err(SubfluxError::Voucher(format!("Voucher {} already redeemed", voucher.code)));
        }
        let cents = validate_amount(voucher.credit_amount)?;

        state.open_account(user_id, self.signup_bonus);
        let tx = state.apply(
            user_id,
            TransactionType::Bonus,
            cents,
            &format!("Voucher {} ({})", voucher.code, voucher.campaign_name),
        );
        state.redemptions.insert((user_id.to_string(), key.clone()));
        if let Some(stored) = state.vouchers.get_mut(&key) {
            stored.used_count += 1;
        }

        info!("User {} redeemed voucher {} for {} credits", user_id, voucher.code, tx.amount);
        Ok(tx)
    }

    async fn transactions(&self, user_id: &str) -> Result<Vec<CreditTransaction>> {
        let state = self.state.lock().await;
        let mut history: Vec<CreditTransaction> = state
            .transactions
            .iter()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect();
        history.reverse();
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn voucher(code: &str, limit: u32) -> Voucher {
        Voucher {
            code: code.to_string(),
            credit_amount: 5.0,
            campaign_name: "spring".to_string(),
            usage_limit: limit,
            used_count: 0,
            expires_at: Some(Utc::now() + Duration::days(7)),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn deduct_and_refund_keep_balance_invariant() {
        let ledger = MemoryLedger::new(0.0);
        ledger.top_up("u1", 10.0, "purchase").await.unwrap();
        let deduction = ledger.deduct("u1", 1.5, "translation").await.unwrap();
        let refund = ledger.refund("u1", 1.5, "failed translation").await.unwrap();

        assert_eq!(deduction.balance_before, 10.0);
        assert_eq!(deduction.balance_after, 8.5);
        assert_eq!(refund.balance_after, 10.0);
        for tx in ledger.transactions("u1").await.unwrap() {
            assert_eq!(tx.balance_after, tx.balance_before + tx.kind.sign() as f64 * tx.amount);
        }
    }

    #[tokio::test]
    async fn insufficient_balance_records_nothing() {
        let ledger = MemoryLedger::new(0.0);
        ledger.top_up("u1", 1.0, "purchase").await.unwrap();

        let err = ledger.deduct("u1", 1.5, "translation").await.unwrap_err();
        assert!(matches!(err, SubfluxError::InsufficientCredits { .. }));
        assert_eq!(ledger.balance("u1").await.unwrap(), 1.0);
        assert_eq!(ledger.transactions("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejects_non_positive_amounts() {
        let ledger = MemoryLedger::new(0.0);
        assert!(ledger.top_up("u1", 0.0, "x").await.is_err());
        assert!(ledger.deduct("u1", -1.0, "x").await.is_err());
        assert!(ledger.refund("u1", f64::NAN, "x").await.is_err());
    }

    #[tokio::test]
    async fn signup_bonus_granted_once() {
        let ledger = MemoryLedger::new(2.0);
        assert_eq!(ledger.balance("new").await.unwrap(), 2.0);
        assert_eq!(ledger.balance("new").await.unwrap(), 2.0);
        let history = ledger.transactions("new").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, TransactionType::Bonus);
    }

    #[tokio::test]
    async fn voucher_redeemed_once_per_user_and_within_limit() {
        let ledger = MemoryLedger::new(0.0);
        ledger.add_voucher(voucher("SPRING", 2)).await;

        let tx = ledger.redeem_voucher("u1", "spring").await.unwrap();
        assert_eq!(tx.amount, 5.0);
        assert!(matches!(ledger.redeem_voucher("u1", "SPRING").await, Err(SubfluxError::Voucher(_))));

        ledger.redeem_voucher("u2", "SPRING").await.unwrap();
        assert!(ledger.redeem_voucher("u3", "SPRING").await.is_err());
        assert_eq!(ledger.voucher("spring").await.unwrap().used_count, 2);
        assert!(matches!(ledger.redeem_voucher("u1", "NOPE").await, Err(SubfluxError::NotFound(_))));
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let ledger = MemoryLedger::new(0.0);
        ledger.top_up("u1", 3.0, "first").await.unwrap();
        ledger.deduct("u1", 1.0, "second").await.unwrap();
        let history = ledger.transactions("u1").await.unwrap();
        assert_eq!(history[0].reason, "second");
        tokio_test::assert_ok!(ledger.transactions("nobody").await);
    }
}
