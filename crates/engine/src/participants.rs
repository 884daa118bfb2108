//! Split participants.
//!
//! A [`SplitParticipant`] is one named share of a split transaction's bill.
//! Shares are non-negative minor-unit amounts; `paid` tracks settlement and
//! is the only field settlement operations may touch.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitParticipant {
    pub id: Uuid,
    pub name: String,
    pub amount_minor: i64,
    pub paid: bool,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "split_participants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    /// Preserves the caller-supplied participant order.
    pub position: i32,
    pub name: String,
    pub amount_minor: i64,
    pub paid: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id"
    )]
    Transactions,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl SplitParticipant {
    pub(crate) fn to_active_model(&self, transaction_id: Uuid, position: i32) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            transaction_id: ActiveValue::Set(transaction_id.to_string()),
            position: ActiveValue::Set(position),
            name: ActiveValue::Set(self.name.clone()),
            amount_minor: ActiveValue::Set(self.amount_minor),
            paid: ActiveValue::Set(self.paid),
        }
    }
}

impl TryFrom<Model> for SplitParticipant {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("participant".to_string()))?,
            name: model.name,
            amount_minor: model.amount_minor,
            paid: model.paid,
        })
    }
}
