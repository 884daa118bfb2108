use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, transactions};

use super::Engine;

impl Engine {
    /// Point lookup scoped to the caller.
    ///
    /// A missing row is `NotFound`; a row owned by another principal is
    /// `Forbidden`. Bulk operations that must skip foreign ids silently do
    /// their own owner filtering instead.
    pub(super) async fn require_transaction_owned(
        &self,
        db_tx: &DatabaseTransaction,
        transaction_id: Uuid,
        owner_id: &str,
    ) -> ResultEngine<transactions::Model> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::NotFound("transaction".to_string()))?;
        if model.owner_id != owner_id {
            return Err(EngineError::Forbidden(
                "transaction belongs to another owner".to_string(),
            ));
        }
        Ok(model)
    }
}
