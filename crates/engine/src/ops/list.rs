use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::LikeExpr,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Page, ResultEngine, SplitParticipant, Transaction, TransactionKind, participants, transactions,
};

use super::{Engine, require_owner_id, with_tx};

/// Field a transaction listing is ordered by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// The transaction's effective date (the default).
    #[default]
    Date,
    Amount,
    Title,
    Category,
    CreatedAt,
}

impl SortField {
    fn column(self) -> transactions::Column {
        match self {
            Self::Date => transactions::Column::OccurredAt,
            Self::Amount => transactions::Column::AmountMinor,
            Self::Title => transactions::Column::Title,
            Self::Category => transactions::Column::Category,
            Self::CreatedAt => transactions::Column::CreatedAt,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Filters for listing transactions. All supplied criteria are ANDed.
///
/// `from` and `to` are inclusive, both in UTC. `query` matches
/// case-insensitively against title, description, category, or any tag.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub query: Option<String>,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
}

/// Page-number pagination request. Values below 1 are normalized to 1,
/// never rejected.
#[derive(Clone, Copy, Debug)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
        }
    }
}

impl PageRequest {
    fn normalized(self) -> (u64, u64) {
        (self.page.max(1), self.page_size.max(1))
    }
}

/// Escapes `%`, `_`, and the escape character itself so a free-text query
/// matches literally inside a LIKE pattern.
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, filter: &TransactionListFilter) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, filter: &TransactionListFilter) -> Self {
        if let Some(kind) = filter.kind {
            self = self.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(category) = &filter.category {
            self = self.filter(transactions::Column::Category.eq(category.clone()));
        }
        if let Some(from) = filter.from {
            self = self.filter(transactions::Column::OccurredAt.gte(from));
        }
        if let Some(to) = filter.to {
            self = self.filter(transactions::Column::OccurredAt.lte(to));
        }
        if let Some(query) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            // SQLite LIKE is case-insensitive for ASCII, matching the
            // case-insensitive contract of the free-text search. LIKE
            // metacharacters in the query are escaped so they match
            // literally. The tags arm runs over the JSON-encoded column
            // text, so a match can straddle the punctuation between two
            // adjacent tags.
            let pattern = format!("%{}%", escape_like(query));
            let matches = |column: transactions::Column| {
                column.like(LikeExpr::new(pattern.clone()).escape('\\'))
            };
            self = self.filter(
                Condition::any()
                    .add(matches(transactions::Column::Title))
                    .add(matches(transactions::Column::Description))
                    .add(matches(transactions::Column::Category))
                    .add(matches(transactions::Column::Tags)),
            );
        }
        self
    }
}

impl Engine {
    /// Point lookup by id, with split participants attached.
    pub async fn transaction(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let owner_id = require_owner_id(owner_id)?;

        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction_owned(&db_tx, transaction_id, owner_id)
                .await?;
            let mut txs = vec![Transaction::try_from(model)?];
            self.attach_participants(&db_tx, &mut txs).await?;
            Ok(txs.remove(0))
        })
    }

    /// Lists the caller's transactions as one page of a filtered, sorted
    /// result set.
    ///
    /// Ordering ties are always broken by id ascending, so repeated calls
    /// over an unchanged data set paginate reproducibly. A page past the
    /// end returns an empty list with the correct totals.
    pub async fn list_transactions(
        &self,
        owner_id: &str,
        filter: &TransactionListFilter,
        page: PageRequest,
    ) -> ResultEngine<Page<Transaction>> {
        let owner_id = require_owner_id(owner_id)?;
        let (page_number, page_size) = page.normalized();

        with_tx!(self, |db_tx| {
            let query = transactions::Entity::find()
                .filter(transactions::Column::OwnerId.eq(owner_id))
                .apply_tx_filters(filter);

            let total_items = query.clone().count(&db_tx).await?;
            let total_pages = total_items.div_ceil(page_size);

            let mut query = match filter.sort_direction {
                SortDirection::Ascending => query.order_by_asc(filter.sort_field.column()),
                SortDirection::Descending => query.order_by_desc(filter.sort_field.column()),
            };
            query = query.order_by_asc(transactions::Column::Id);

            let rows = query
                .offset((page_number - 1) * page_size)
                .limit(page_size)
                .all(&db_tx)
                .await?;

            let mut items = Vec::with_capacity(rows.len());
            for model in rows {
                items.push(Transaction::try_from(model)?);
            }
            self.attach_participants(&db_tx, &mut items).await?;

            Ok(Page {
                items,
                current_page: page_number,
                total_pages,
                total_items,
                items_per_page: page_size,
            })
        })
    }

    /// Distinct categories used by the caller, ascending.
    pub async fn list_categories(&self, owner_id: &str) -> ResultEngine<Vec<String>> {
        let owner_id = require_owner_id(owner_id)?;

        with_tx!(self, |db_tx| {
            let categories: Vec<String> = transactions::Entity::find()
                .select_only()
                .column(transactions::Column::Category)
                .distinct()
                .filter(transactions::Column::OwnerId.eq(owner_id))
                .order_by_asc(transactions::Column::Category)
                .into_tuple()
                .all(&db_tx)
                .await?;
            Ok(categories)
        })
    }

    /// Fills in the participant lists of the split transactions in `txs`,
    /// in stored order.
    pub(super) async fn attach_participants(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        txs: &mut [Transaction],
    ) -> ResultEngine<()> {
        let split_ids: Vec<String> = txs
            .iter()
            .filter(|tx| tx.split.is_some())
            .map(|tx| tx.id.to_string())
            .collect();
        if split_ids.is_empty() {
            return Ok(());
        }

        let rows = participants::Entity::find()
            .filter(participants::Column::TransactionId.is_in(split_ids))
            .order_by_asc(participants::Column::TransactionId)
            .order_by_asc(participants::Column::Position)
            .all(db_tx)
            .await?;

        let mut by_tx: HashMap<String, Vec<SplitParticipant>> = HashMap::new();
        for row in rows {
            let tx_id = row.transaction_id.clone();
            by_tx
                .entry(tx_id)
                .or_default()
                .push(SplitParticipant::try_from(row)?);
        }

        for tx in txs.iter_mut() {
            if let Some(split) = tx.split.as_mut() {
                split.participants = by_tx.remove(&tx.id.to_string()).unwrap_or_default();
            }
        }
        Ok(())
    }
}
