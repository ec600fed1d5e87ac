use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};

use super::query::Query;
use crate::{
    error::{LedgerError, LedgerResult},
    models::UserWallet,
    utils::Chain,
};

fn validate_balance(balance: Decimal) -> LedgerResult<()> {
    if balance < Decimal::ZERO {
        return Err(LedgerError::InvalidInput("balance must not be negative".to_string()));
    }
    Ok(())
}

/// Connects a wallet. Reconnecting the same (user, chain, address) reuses the
/// existing row, marking it connected and overwriting its balance.
pub async fn add_or_update_wallet<'c, E>(
    executor: E,
    user_id: i32,
    chain: Chain,
    wallet_address: &str,
    balance: Decimal,
) -> LedgerResult<UserWallet>
where
    E: Executor<'c, Database = Postgres>,
{
    let wallet_address = wallet_address.trim();
    if wallet_address.is_empty() {
        return Err(LedgerError::InvalidInput("wallet address must not be empty".to_string()));
    }
    validate_balance(balance)?;

    Query::new(
        "INSERT INTO user_wallets (user_id, chain, wallet_address, balance)
         VALUES ($1, $2, $3, $4)
         ON CONFLICT (user_id, chain, wallet_address) DO UPDATE
         SET is_connected = TRUE, balance = EXCLUDED.balance
         RETURNING *",
    )
    .bind(user_id)
    .bind(chain.to_string())
    .bind(wallet_address)
    .bind(balance)
    .fetch_one(executor)
    .await
}

pub async fn get_user_wallets<'c, E>(executor: E, user_id: i32) -> LedgerResult<Vec<UserWallet>>
where
    E: Executor<'c, Database = Postgres>,
{
    let output = Query::new(
        "SELECT * FROM user_wallets WHERE user_id = $1 AND is_connected = TRUE ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;
    Ok(output.rows)
}

pub async fn update_wallet_balance<'c, E>(
    executor: E,
    wallet_id: i32,
    balance: Decimal,
) -> LedgerResult<UserWallet>
where
    E: Executor<'c, Database = Postgres>,
{
    validate_balance(balance)?;

    Query::new(
        "UPDATE user_wallets
         SET balance = $1, last_synced = NOW()
         WHERE id = $2
         RETURNING *",
    )
    .bind(balance)
    .bind(wallet_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| LedgerError::NotFound(format!("wallet {}", wallet_id)))
}

pub async fn disconnect_wallet<'c, E>(executor: E, wallet_id: i32) -> LedgerResult<UserWallet>
where
    E: Executor<'c, Database = Postgres>,
{
    Query::new("UPDATE user_wallets SET is_connected = FALSE WHERE id = $1 RETURNING *")
        .bind(wallet_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("wallet {}", wallet_id)))
}
