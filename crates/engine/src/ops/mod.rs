use sea_orm::DatabaseConnection;

use crate::{EngineError, FieldViolation, ResultEngine, ValidationErrors};

mod access;
mod list;
mod reports;
mod settle;
mod write;

pub use list::{PageRequest, SortDirection, SortField, TransactionListFilter};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The identity provider hands the engine an opaque owner id; an empty one
/// is a caller precondition failure, not an internal error.
fn require_owner_id(value: &str) -> ResultEngine<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(ValidationErrors(vec![
            FieldViolation::new("owner_id", "must not be empty"),
        ])));
    }
    Ok(trimmed)
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
