//! Transfer ledger. A row starts `pending` and moves once, to `confirmed` or
//! `failed`; every transition is guarded on the current status.

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use tracing::{info, warn};

use super::query::Query;
use crate::{
    error::{LedgerError, LedgerResult},
    models::{NewTransaction, Transaction},
    utils::TxStatus,
};

pub const DEFAULT_TRANSACTION_LIMIT: i64 = 50;

/// Inserts a transfer attempt. The status is always `pending`.
pub async fn create_transaction<'c, E>(
    executor: E,
    new_tx: &NewTransaction,
) -> LedgerResult<Transaction>
where
    E: Executor<'c, Database = Postgres>,
{
    if new_tx.amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidInput("amount must be positive".to_string()));
    }
    let gas_fee = new_tx.gas_fee.unwrap_or(Decimal::ZERO);
    if gas_fee < Decimal::ZERO {
        return Err(LedgerError::InvalidInput("gas fee must not be negative".to_string()));
    }
    if new_tx.to_address.trim().is_empty() {
        return Err(LedgerError::InvalidInput("destination address must not be empty".to_string()));
    }

    Query::new(
        "INSERT INTO transactions
         (user_id, tx_type, chain, to_address, amount, token_symbol, gas_fee, tx_hash, status)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING *",
    )
    .bind(new_tx.user_id)
    .bind(new_tx.tx_type.to_string())
    .bind(new_tx.chain.to_string())
    .bind(new_tx.to_address.trim())
    .bind(new_tx.amount)
    .bind(&new_tx.token_symbol)
    .bind(gas_fee)
    .bind(new_tx.tx_hash.clone())
    .bind(TxStatus::Pending.to_string())
    .fetch_one(executor)
    .await
}

/// Marks a pending transaction confirmed, recording its hash and confirmation time.
///
/// Confirming a row that is no longer pending is rejected with
/// [`LedgerError::InvalidTransition`] and leaves the row unchanged.
pub async fn confirm_transaction(pool: &PgPool, id: i32, tx_hash: &str) -> LedgerResult<Transaction> {
    let tx_hash = tx_hash.trim();
    if tx_hash.is_empty() {
        return Err(LedgerError::InvalidInput("transaction hash must not be empty".to_string()));
    }

    let confirmed: Option<Transaction> = Query::new(
        "UPDATE transactions
         SET status = 'confirmed', tx_hash = $1, confirmed_at = NOW()
         WHERE id = $2 AND status = 'pending'
         RETURNING *",
    )
    .bind(tx_hash)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match confirmed {
        Some(row) => {
            info!(id, tx_hash, "Transaction confirmed");
            Ok(row)
        }
        None => Err(rejected_transition(pool, id, TxStatus::Confirmed).await),
    }
}

/// Marks a pending transaction failed. Same guard as [`confirm_transaction`].
pub async fn fail_transaction(pool: &PgPool, id: i32) -> LedgerResult<Transaction> {
    let failed: Option<Transaction> = Query::new(
        "UPDATE transactions
         SET status = 'failed'
         WHERE id = $1 AND status = 'pending'
         RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match failed {
        Some(row) => {
            info!(id, "Transaction failed");
            Ok(row)
        }
        None => Err(rejected_transition(pool, id, TxStatus::Failed).await),
    }
}

async fn rejected_transition(pool: &PgPool, id: i32, target: TxStatus) -> LedgerError {
    let current: LedgerResult<Option<(String,)>> =
        Query::new("SELECT status FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await;

    match current {
        Ok(Some((status,))) => {
            warn!(id, %status, target = %target, "Rejected transaction transition");
            LedgerError::InvalidTransition { id, status }
        }
        Ok(None) => LedgerError::NotFound(format!("transaction {}", id)),
        Err(e) => e,
    }
}

pub async fn get_user_transactions<'c, E>(
    executor: E,
    user_id: i32,
    limit: i64,
) -> LedgerResult<Vec<Transaction>>
where
    E: Executor<'c, Database = Postgres>,
{
    if limit <= 0 {
        return Err(LedgerError::InvalidInput("limit must be positive".to_string()));
    }

    let output = Query::new(
        "SELECT * FROM transactions
         WHERE user_id = $1
         ORDER BY created_at DESC, id DESC
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(executor)
    .await?;
    Ok(output.rows)
}
