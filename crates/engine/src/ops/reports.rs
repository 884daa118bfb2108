use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, Statement, Value};

use crate::{CategoryTotal, MonthRollup, ResultEngine, Summary};

use super::{Engine, require_owner_id};

/// Builds the optional inclusive `[from, to]` window tail of a WHERE
/// clause plus its bind values.
fn window_condition(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> (String, Vec<Value>) {
    let mut sql = String::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(from) = from {
        sql.push_str(" AND occurred_at >= ?");
        values.push(from.into());
    }
    if let Some(to) = to {
        sql.push_str(" AND occurred_at <= ?");
        values.push(to.into());
    }
    (sql, values)
}

impl Engine {
    /// Income/expense totals over the caller's transactions, optionally
    /// restricted to an inclusive date window.
    ///
    /// An empty matching set yields the all-zero summary, never an error.
    /// Sums are exact integer arithmetic over minor units.
    pub async fn summary(
        &self,
        owner_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ResultEngine<Summary> {
        let owner_id = require_owner_id(owner_id)?;
        let backend = self.database.get_database_backend();
        let (window_sql, window_values) = window_condition(from, to);

        let stmt = Statement::from_sql_and_values(
            backend,
            format!(
                "SELECT COALESCE(SUM(CASE WHEN amount_minor > 0 THEN amount_minor ELSE 0 END), 0) AS income_minor, \
                 COALESCE(SUM(CASE WHEN amount_minor < 0 THEN -amount_minor ELSE 0 END), 0) AS expense_minor, \
                 COUNT(*) AS transaction_count \
                 FROM transactions \
                 WHERE owner_id = ?{window_sql}"
            ),
            {
                let mut v: Vec<Value> = vec![owner_id.into()];
                v.extend(window_values);
                v
            },
        );

        let Some(row) = self.database.query_one(stmt).await? else {
            return Ok(Summary::default());
        };
        let total_income_minor: i64 = row.try_get("", "income_minor")?;
        let total_expense_minor: i64 = row.try_get("", "expense_minor")?;
        let transaction_count: i64 = row.try_get("", "transaction_count")?;

        Ok(Summary {
            total_income_minor,
            total_expense_minor,
            transaction_count: transaction_count as u64,
            balance_minor: total_income_minor - total_expense_minor,
        })
    }

    /// Signed per-category totals, ordered by total descending with ties
    /// broken by category name ascending for determinism.
    ///
    /// Income and expense both contribute with their natural sign, so the
    /// grand total across groups equals the signed sum of all matching
    /// transactions.
    pub async fn category_breakdown(
        &self,
        owner_id: &str,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        let owner_id = require_owner_id(owner_id)?;
        let backend = self.database.get_database_backend();
        let (window_sql, window_values) = window_condition(from, to);

        let stmt = Statement::from_sql_and_values(
            backend,
            format!(
                "SELECT category, \
                 COALESCE(SUM(amount_minor), 0) AS total_minor, \
                 COUNT(*) AS count \
                 FROM transactions \
                 WHERE owner_id = ?{window_sql} \
                 GROUP BY category \
                 ORDER BY total_minor DESC, category ASC"
            ),
            {
                let mut v: Vec<Value> = vec![owner_id.into()];
                v.extend(window_values);
                v
            },
        );

        let rows = self.database.query_all(stmt).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let count: i64 = row.try_get("", "count")?;
            out.push(CategoryTotal {
                category: row.try_get("", "category")?,
                total_minor: row.try_get("", "total_minor")?,
                count: count as u64,
            });
        }
        Ok(out)
    }

    /// Per-month income/expense totals for one calendar year, months
    /// ascending.
    ///
    /// Months with no transactions are not synthesized; callers that need
    /// a zero-filled 12-bucket series must pad the result themselves.
    pub async fn monthly_rollup(
        &self,
        owner_id: &str,
        year: i32,
    ) -> ResultEngine<Vec<MonthRollup>> {
        let owner_id = require_owner_id(owner_id)?;
        let backend = self.database.get_database_backend();

        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT CAST(strftime('%m', occurred_at) AS INTEGER) AS month, \
             COALESCE(SUM(CASE WHEN amount_minor > 0 THEN amount_minor ELSE 0 END), 0) AS income_minor, \
             COALESCE(SUM(CASE WHEN amount_minor < 0 THEN -amount_minor ELSE 0 END), 0) AS expense_minor \
             FROM transactions \
             WHERE owner_id = ? AND CAST(strftime('%Y', occurred_at) AS INTEGER) = ? \
             GROUP BY month \
             ORDER BY month ASC",
            vec![owner_id.into(), year.into()],
        );

        let rows = self.database.query_all(stmt).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let month: i64 = row.try_get("", "month")?;
            out.push(MonthRollup {
                month: month as u32,
                income_minor: row.try_get("", "income_minor")?,
                expense_minor: row.try_get("", "expense_minor")?,
            });
        }
        Ok(out)
    }
}
