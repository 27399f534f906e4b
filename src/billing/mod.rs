// Credit billing
//
// - credits: pricing formula and fixed-point helpers
// - ledger: balance and transaction history behind the `CreditLedger` trait

pub mod credits;
pub mod ledger;

pub use credits::{required_credits, CreditPolicy};
pub use ledger::{CreditLedger, MemoryLedger};
