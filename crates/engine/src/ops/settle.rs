use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, SettlementStatus, participants, transactions};

use super::{Engine, require_owner_id, with_tx};

impl Engine {
    /// Marks one named participant of a split transaction as paid.
    ///
    /// Idempotent: settling an already-paid participant is a no-op. The
    /// write touches exactly that participant's row, so concurrent
    /// settlements of *different* participants of the same split cannot
    /// lose each other. Amounts and the other participants are never
    /// modified.
    pub async fn mark_participant_paid(
        &self,
        owner_id: &str,
        transaction_id: Uuid,
        participant_name: &str,
    ) -> ResultEngine<SettlementStatus> {
        let owner_id = require_owner_id(owner_id)?;
        let participant_name = participant_name.trim();

        with_tx!(self, |db_tx| {
            let tx_model = self
                .require_transaction_owned(&db_tx, transaction_id, owner_id)
                .await?;
            if !tx_model.is_split {
                return Err(EngineError::Conflict(
                    "transaction is not a split".to_string(),
                ));
            }

            let participant = participants::Entity::find()
                .filter(participants::Column::TransactionId.eq(transaction_id.to_string()))
                .filter(participants::Column::Name.eq(participant_name))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("participant".to_string()))?;

            if !participant.paid {
                let update = participants::ActiveModel {
                    id: ActiveValue::Set(participant.id.clone()),
                    paid: ActiveValue::Set(true),
                    ..Default::default()
                };
                update.update(&db_tx).await?;

                let touch = transactions::ActiveModel {
                    id: ActiveValue::Set(transaction_id.to_string()),
                    updated_at: ActiveValue::Set(Utc::now()),
                    ..Default::default()
                };
                touch.update(&db_tx).await?;
            }

            let rows = participants::Entity::find()
                .filter(participants::Column::TransactionId.eq(transaction_id.to_string()))
                .all(&db_tx)
                .await?;
            let status = SettlementStatus {
                paid: rows.iter().filter(|row| row.paid).count() as u32,
                total: rows.len() as u32,
            };

            tracing::debug!(
                %transaction_id,
                participant = participant_name,
                paid = status.paid,
                total = status.total,
                "participant settled"
            );
            Ok(status)
        })
    }
}
