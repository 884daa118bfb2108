//! Transaction primitives.
//!
//! A `Transaction` is a single income or expense line owned by one
//! principal. Amounts are stored as signed integer **minor units** (e.g.
//! cents): positive = income, negative = expense. The kind is always
//! derived from the sign of the amount, never trusted from the caller.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, participants::SplitParticipant};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Derives the kind from the sign of a non-zero amount.
    pub fn from_amount(amount_minor: i64) -> Self {
        if amount_minor > 0 {
            Self::Income
        } else {
            Self::Expense
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(EngineError::Conflict(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// Descriptive recurrence metadata. The engine never generates future
/// transactions from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurringInterval {
    Weekly,
    Monthly,
    Yearly,
}

impl RecurringInterval {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl TryFrom<&str> for RecurringInterval {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::Conflict(format!(
                "invalid recurring interval: {other}"
            ))),
        }
    }
}

/// Shared-bill details of a split transaction.
///
/// `total_minor` is the amount being divided among the participants. It is
/// not required to equal the parent transaction's `amount_minor`: a split
/// can describe a shared bill larger than the owner's own expense line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitDetails {
    pub total_minor: i64,
    pub participants: Vec<SplitParticipant>,
}

/// How far along a split is: `paid` of `total` participants have settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementStatus {
    pub paid: u32,
    pub total: u32,
}

impl SettlementStatus {
    pub fn is_fully_settled(self) -> bool {
        self.paid == self.total
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub owner_id: String,
    pub title: String,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub category: String,
    pub description: Option<String>,
    /// Effective date of the transaction, distinct from the audit
    /// timestamps below.
    pub occurred_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub is_recurring: bool,
    pub recurring_interval: Option<RecurringInterval>,
    pub split: Option<SplitDetails>,
    pub location: Option<String>,
    pub payment_method: Option<String>,
    pub receipt: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns `(paid, total)` participant counts for a split, or `None`
    /// for a plain transaction.
    pub fn settlement_status(&self) -> Option<SettlementStatus> {
        self.split.as_ref().map(|split| SettlementStatus {
            paid: split.participants.iter().filter(|p| p.paid).count() as u32,
            total: split.participants.len() as u32,
        })
    }

    /// Derived display status: `"<paid>/<total> paid"` for a split,
    /// `"completed"` otherwise.
    pub fn status(&self) -> String {
        match self.settlement_status() {
            Some(status) => format!("{}/{} paid", status.paid, status.total),
            None => "completed".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub amount_minor: i64,
    pub kind: String,
    pub category: String,
    pub description: Option<String>,
    pub occurred_at: DateTimeUtc,
    /// JSON array of tag strings.
    pub tags: String,
    pub is_recurring: bool,
    pub recurring_interval: Option<String>,
    pub is_split: bool,
    pub split_total_minor: Option<i64>,
    pub location: Option<String>,
    pub payment_method: Option<String>,
    pub receipt: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::participants::Entity")]
    Participants,
}

impl Related<super::participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            owner_id: ActiveValue::Set(tx.owner_id.clone()),
            title: ActiveValue::Set(tx.title.clone()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            category: ActiveValue::Set(tx.category.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            tags: ActiveValue::Set(
                serde_json::to_string(&tx.tags).unwrap_or_else(|_| "[]".to_string()),
            ),
            is_recurring: ActiveValue::Set(tx.is_recurring),
            recurring_interval: ActiveValue::Set(
                tx.recurring_interval.map(|i| i.as_str().to_string()),
            ),
            is_split: ActiveValue::Set(tx.split.is_some()),
            split_total_minor: ActiveValue::Set(tx.split.as_ref().map(|s| s.total_minor)),
            location: ActiveValue::Set(tx.location.clone()),
            payment_method: ActiveValue::Set(tx.payment_method.clone()),
            receipt: ActiveValue::Set(tx.receipt.clone()),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    /// Builds the domain transaction from a row. For a split, the
    /// participant list starts empty and is stitched in by the read ops.
    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("transaction".to_string()))?,
            owner_id: model.owner_id,
            title: model.title,
            amount_minor: model.amount_minor,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            category: model.category,
            description: model.description,
            occurred_at: model.occurred_at,
            tags: serde_json::from_str(&model.tags).unwrap_or_default(),
            is_recurring: model.is_recurring,
            recurring_interval: model
                .recurring_interval
                .as_deref()
                .and_then(|i| RecurringInterval::try_from(i).ok()),
            split: model.is_split.then(|| SplitDetails {
                total_minor: model.split_total_minor.unwrap_or_default(),
                participants: Vec::new(),
            }),
            location: model.location,
            payment_method: model.payment_method,
            receipt: model.receipt,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_transaction() -> Transaction {
        let now = Utc::now();
        Transaction {
            id: Uuid::new_v4(),
            owner_id: "alice".to_string(),
            title: "Groceries".to_string(),
            amount_minor: -2_500,
            kind: TransactionKind::Expense,
            category: "Food".to_string(),
            description: None,
            occurred_at: now,
            tags: Vec::new(),
            is_recurring: false,
            recurring_interval: None,
            split: None,
            location: None,
            payment_method: None,
            receipt: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn kind_follows_amount_sign() {
        assert_eq!(TransactionKind::from_amount(1), TransactionKind::Income);
        assert_eq!(TransactionKind::from_amount(-1), TransactionKind::Expense);
    }

    #[test]
    fn status_of_plain_transaction_is_completed() {
        let tx = plain_transaction();
        assert_eq!(tx.settlement_status(), None);
        assert_eq!(tx.status(), "completed");
    }

    #[test]
    fn status_counts_paid_participants() {
        let mut tx = plain_transaction();
        tx.split = Some(SplitDetails {
            total_minor: 6_000,
            participants: ["A", "B", "C"]
                .iter()
                .enumerate()
                .map(|(i, name)| SplitParticipant {
                    id: Uuid::new_v4(),
                    name: ToString::to_string(name),
                    amount_minor: 2_000,
                    paid: i == 0,
                })
                .collect(),
        });

        let status = tx.settlement_status().expect("split status");
        assert_eq!((status.paid, status.total), (1, 3));
        assert!(!status.is_fully_settled());
        assert_eq!(tx.status(), "1/3 paid");
    }
}
