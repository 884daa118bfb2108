//! Ledger & settlement engine.
//!
//! Tracks a principal's financial transactions and derives aggregate views
//! (summaries, category breakdowns, monthly rollups) on top of them. A
//! transaction can be a *split*: a shared expense divided among named
//! participants, each independently marked paid or unpaid.
//!
//! The engine is stateless between calls; all state lives in the database.
//! Every operation is scoped to an `owner_id` supplied by an external
//! identity provider, which the engine trusts unconditionally.

pub use error::{EngineError, FieldViolation, ValidationErrors};
pub use ops::{Engine, EngineBuilder, PageRequest, SortDirection, SortField, TransactionListFilter};
pub use participants::SplitParticipant;
pub use transactions::{
    RecurringInterval, SettlementStatus, SplitDetails, Transaction, TransactionKind,
};
pub use validate::{ParticipantDraft, SplitDraft, TransactionDraft};

mod error;
mod ops;
mod participants;
mod transactions;
mod validate;

type ResultEngine<T> = Result<T, EngineError>;

/// One page of results plus the pagination envelope.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u64,
}

/// Income/expense totals over a set of transactions.
///
/// `total_expense_minor` is the absolute value of all negative amounts, so
/// `balance_minor == total_income_minor - total_expense_minor` always holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Summary {
    pub total_income_minor: i64,
    pub total_expense_minor: i64,
    pub transaction_count: u64,
    pub balance_minor: i64,
}

/// Signed per-category total.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total_minor: i64,
    pub count: u64,
}

/// Income/expense totals for one calendar month (1-12).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct MonthRollup {
    pub month: u32,
    pub income_minor: i64,
    pub expense_minor: i64,
}
