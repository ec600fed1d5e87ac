mod support;

use common::{
    db::{transactions, wallets},
    models::NewTransaction,
    utils::{Chain, TxStatus, TxType},
    LedgerError,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgPool;
use support::create_user;

const SOL_ADDRESS: &str = "7EcDhSYGxXyscszYEp35KHN8vvw3svAuLKTzXwCFLtV";
const EVM_ADDRESS: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

fn withdrawal(user_id: i32, amount: Decimal) -> NewTransaction {
    NewTransaction {
        user_id,
        tx_type: TxType::Withdrawal,
        chain: Chain::Solana,
        to_address: SOL_ADDRESS.to_string(),
        amount,
        token_symbol: "SOL".to_string(),
        gas_fee: None,
        tx_hash: None,
    }
}

async fn wallet_rows(pool: &PgPool, user_id: i32) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_wallets WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap();
    count
}

#[sqlx::test(migrator = "common::db::MIGRATOR")]
#[ignore = "requires database"]
async fn reconnecting_a_wallet_reuses_the_row(pool: PgPool) {
    let user = create_user(&pool, "navigatore").await;

    let first = wallets::add_or_update_wallet(&pool, user.id, Chain::Solana, SOL_ADDRESS, dec!(1.5))
        .await
        .unwrap();
    let second = wallets::add_or_update_wallet(&pool, user.id, Chain::Solana, SOL_ADDRESS, dec!(2.25))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.balance, dec!(2.25));
    assert!(second.is_connected);
    assert_eq!(wallet_rows(&pool, user.id).await, 1);

    let other_chain = wallets::add_or_update_wallet(&pool, user.id, Chain::Ethereum, EVM_ADDRESS, Decimal::ZERO)
        .await
        .unwrap();
    assert_ne!(other_chain.id, first.id);
    assert_eq!(other_chain.chain().unwrap(), Chain::Ethereum);
    assert_eq!(wallet_rows(&pool, user.id).await, 2);
}

#[sqlx::test(migrator = "common::db::MIGRATOR")]
#[ignore = "requires database"]
async fn disconnected_wallets_can_be_reconnected(pool: PgPool) {
    let user = create_user(&pool, "mozzo").await;
    let wallet = wallets::add_or_update_wallet(&pool, user.id, Chain::Cronos, EVM_ADDRESS, dec!(10))
        .await
        .unwrap();

    let disconnected = wallets::disconnect_wallet(&pool, wallet.id).await.unwrap();
    assert!(!disconnected.is_connected);
    assert!(wallets::get_user_wallets(&pool, user.id).await.unwrap().is_empty());

    let reconnected = wallets::add_or_update_wallet(&pool, user.id, Chain::Cronos, EVM_ADDRESS, dec!(3))
        .await
        .unwrap();
    assert_eq!(reconnected.id, wallet.id);
    assert!(reconnected.is_connected);

    let listed = wallets::get_user_wallets(&pool, user.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].balance, dec!(3));
}

#[sqlx::test(migrator = "common::db::MIGRATOR")]
#[ignore = "requires database"]
async fn balance_updates_record_sync_time(pool: PgPool) {
    let user = create_user(&pool, "cambusiere").await;
    let wallet = wallets::add_or_update_wallet(&pool, user.id, Chain::Solana, SOL_ADDRESS, Decimal::ZERO)
        .await
        .unwrap();
    assert!(wallet.last_synced.is_none());

    let synced = wallets::update_wallet_balance(&pool, wallet.id, dec!(4.2)).await.unwrap();
    assert_eq!(synced.balance, dec!(4.2));
    assert!(synced.last_synced.is_some());

    assert!(matches!(
        wallets::update_wallet_balance(&pool, wallet.id, dec!(-1)).await,
        Err(LedgerError::InvalidInput(_))
    ));
    assert!(matches!(
        wallets::update_wallet_balance(&pool, wallet.id + 1000, dec!(1)).await,
        Err(LedgerError::NotFound(_))
    ));
}

#[sqlx::test(migrator = "common::db::MIGRATOR")]
#[ignore = "requires database"]
async fn transactions_confirm_exactly_once(pool: PgPool) {
    let user = create_user(&pool, "tesoriere").await;

    let tx = transactions::create_transaction(&pool, &withdrawal(user.id, dec!(0.5)))
        .await
        .unwrap();
    assert_eq!(tx.status().unwrap(), TxStatus::Pending);
    assert_eq!(tx.tx_type().unwrap(), TxType::Withdrawal);
    assert_eq!(tx.gas_fee, Decimal::ZERO);
    assert!(tx.confirmed_at.is_none());

    let confirmed = transactions::confirm_transaction(&pool, tx.id, "5hash").await.unwrap();
    assert_eq!(confirmed.status().unwrap(), TxStatus::Confirmed);
    assert_eq!(confirmed.tx_hash.as_deref(), Some("5hash"));
    let confirmed_at = confirmed.confirmed_at.unwrap();
    assert!(confirmed_at >= confirmed.created_at);

    let err = transactions::confirm_transaction(&pool, tx.id, "other")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition { id, .. } if id == tx.id));

    let rows = transactions::get_user_transactions(&pool, user.id, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].tx_hash.as_deref(), Some("5hash"));
    assert_eq!(rows[0].confirmed_at, Some(confirmed_at));

    assert!(matches!(
        transactions::fail_transaction(&pool, tx.id).await,
        Err(LedgerError::InvalidTransition { .. })
    ));
}

#[sqlx::test(migrator = "common::db::MIGRATOR")]
#[ignore = "requires database"]
async fn failed_transactions_stay_failed(pool: PgPool) {
    let user = create_user(&pool, "mozzo_di_stiva").await;
    let tx = transactions::create_transaction(&pool, &withdrawal(user.id, dec!(1)))
        .await
        .unwrap();

    let failed = transactions::fail_transaction(&pool, tx.id).await.unwrap();
    assert_eq!(failed.status().unwrap(), TxStatus::Failed);
    assert!(failed.confirmed_at.is_none());

    let err = transactions::confirm_transaction(&pool, tx.id, "late").await.unwrap_err();
    match err {
        LedgerError::InvalidTransition { status, .. } => assert_eq!(status, "failed"),
        other => panic!("unexpected error: {:?}", other),
    }

    assert!(matches!(
        transactions::confirm_transaction(&pool, tx.id + 1000, "ghost").await,
        Err(LedgerError::NotFound(_))
    ));
}

#[sqlx::test(migrator = "common::db::MIGRATOR")]
#[ignore = "requires database"]
async fn transactions_are_listed_newest_first(pool: PgPool) {
    let user = create_user(&pool, "scrivano").await;
    let mut ids = Vec::new();
    for amount in [dec!(1), dec!(2), dec!(3)] {
        let tx = transactions::create_transaction(&pool, &withdrawal(user.id, amount))
            .await
            .unwrap();
        ids.push(tx.id);
    }

    let listed = transactions::get_user_transactions(&pool, user.id, transactions::DEFAULT_TRANSACTION_LIMIT)
        .await
        .unwrap();
    let listed_ids: Vec<i32> = listed.iter().map(|tx| tx.id).collect();
    ids.reverse();
    assert_eq!(listed_ids, ids);

    let limited = transactions::get_user_transactions(&pool, user.id, 2).await.unwrap();
    assert_eq!(limited.len(), 2);

    assert!(matches!(
        transactions::create_transaction(&pool, &withdrawal(user.id, Decimal::ZERO)).await,
        Err(LedgerError::InvalidInput(_))
    ));
}
