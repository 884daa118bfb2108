use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    ResultEngine, Transaction, TransactionDraft, participants, transactions, validate,
};

use super::{Engine, require_owner_id, with_tx};

impl Engine {
    /// Validates, normalizes, and persists a new transaction.
    ///
    /// The stored kind always follows the sign of `amount_minor`; split
    /// participant rows are inserted in the same DB transaction, so the
    /// create is all-or-nothing.
    pub async fn create_transaction(
        &self,
        owner_id: &str,
        draft: &TransactionDraft,
    ) -> ResultEngine<Transaction> {
        let owner_id = require_owner_id(owner_id)?;
        let tx = validate::normalize(owner_id, draft, Utc::now())?;

        with_tx!(self, |db_tx| {
            self.insert_transaction(&db_tx, &tx).await?;
            tracing::debug!(
                transaction_id = %tx.id,
                kind = tx.kind.as_str(),
                amount_minor = tx.amount_minor,
                "transaction created"
            );
            Ok(tx)
        })
    }

    /// Replaces an existing transaction wholesale.
    ///
    /// The draft is re-validated and re-normalized exactly like a create;
    /// `id`, `owner_id`, and `created_at` are kept, `updated_at` is
    /// bumped. Split participants are replaced as a set — this is also
    /// the only way to add or remove participants.
    pub async fn update_transaction(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
        draft: &TransactionDraft,
    ) -> ResultEngine<Transaction> {
        let owner_id = require_owner_id(owner_id)?;
        let mut tx = validate::normalize(owner_id, draft, Utc::now())?;

        with_tx!(self, |db_tx| {
            let existing = self
                .require_transaction_owned(&db_tx, transaction_id, owner_id)
                .await?;
            tx.id = transaction_id;
            tx.created_at = existing.created_at;

            participants::Entity::delete_many()
                .filter(participants::Column::TransactionId.eq(transaction_id.to_string()))
                .exec(&db_tx)
                .await?;
            transactions::Entity::delete_by_id(transaction_id.to_string())
                .exec(&db_tx)
                .await?;
            self.insert_transaction(&db_tx, &tx).await?;

            tracing::debug!(transaction_id = %tx.id, "transaction updated");
            Ok(tx)
        })
    }

    /// Deletes one transaction and its participant rows.
    pub async fn delete_transaction(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        let owner_id = require_owner_id(owner_id)?;

        with_tx!(self, |db_tx| {
            self.require_transaction_owned(&db_tx, transaction_id, owner_id)
                .await?;
            self.delete_owned(&db_tx, &[transaction_id.to_string()])
                .await?;
            tracing::debug!(%transaction_id, "transaction deleted");
            Ok(())
        })
    }

    /// Bulk delete by id set.
    ///
    /// Only rows owned by the caller are removed; unknown or foreign ids
    /// are skipped silently. Returns the count actually deleted.
    pub async fn delete_transactions(
        &self,
        owner_id: &str,
        transaction_ids: &[Uuid],
    ) -> ResultEngine<u64> {
        let owner_id = require_owner_id(owner_id)?;
        if transaction_ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<String> = transaction_ids.iter().map(Uuid::to_string).collect();

        with_tx!(self, |db_tx| {
            let owned: Vec<String> = transactions::Entity::find()
                .filter(transactions::Column::Id.is_in(ids))
                .filter(transactions::Column::OwnerId.eq(owner_id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|model| model.id)
                .collect();

            let deleted = self.delete_owned(&db_tx, &owned).await?;
            tracing::debug!(requested = transaction_ids.len(), deleted, "bulk delete");
            Ok(deleted)
        })
    }

    async fn insert_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        tx: &Transaction,
    ) -> ResultEngine<()> {
        transactions::ActiveModel::from(tx).insert(db_tx).await?;
        if let Some(split) = &tx.split {
            for (position, participant) in split.participants.iter().enumerate() {
                participant
                    .to_active_model(tx.id, position as i32)
                    .insert(db_tx)
                    .await?;
            }
        }
        Ok(())
    }

    /// Removes the given (already owner-checked) transactions and their
    /// participant rows. Returns the number of transactions removed.
    async fn delete_owned(
        &self,
        db_tx: &DatabaseTransaction,
        transaction_ids: &[String],
    ) -> ResultEngine<u64> {
        if transaction_ids.is_empty() {
            return Ok(0);
        }
        participants::Entity::delete_many()
            .filter(participants::Column::TransactionId.is_in(transaction_ids.to_vec()))
            .exec(db_tx)
            .await?;
        let result = transactions::Entity::delete_many()
            .filter(transactions::Column::Id.is_in(transaction_ids.to_vec()))
            .exec(db_tx)
            .await?;
        Ok(result.rows_affected)
    }
}
