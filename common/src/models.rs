use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    error::LedgerResult,
    utils::{Chain, Difficulty, TxStatus, TxType},
};

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub total_earnings: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
}

/// Profile fields a user may change. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct TriviaCategory {
    pub id: i32,
    pub name: String,
    pub icon: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct TriviaQuestion {
    pub id: i32,
    pub category_id: i32,
    pub question: String,
    pub answer_a: String,
    pub answer_b: String,
    pub answer_c: String,
    pub answer_d: String,
    pub correct_answer: String,
    pub difficulty: String,
    pub reward_amount: Decimal,
}

impl TriviaQuestion {
    pub fn answers(&self) -> [&str; 4] {
        [
            self.answer_a.as_str(),
            self.answer_b.as_str(),
            self.answer_c.as_str(),
            self.answer_d.as_str(),
        ]
    }

    pub fn difficulty(&self) -> LedgerResult<Difficulty> {
        Difficulty::from_str(&self.difficulty)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTriviaQuestion {
    pub category_id: i32,
    pub question: String,
    pub answer_a: String,
    pub answer_b: String,
    pub answer_c: String,
    pub answer_d: String,
    pub correct_answer: String,
    pub difficulty: Difficulty,
    /// Defaults to the difficulty's base reward.
    pub reward_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct TriviaUserAnswer {
    pub id: i32,
    pub user_id: i32,
    pub question_id: i32,
    pub category_id: i32,
    pub user_answer: String,
    pub is_correct: bool,
    pub reward_earned: Decimal,
    pub time_taken_seconds: i32,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerSubmission {
    pub user_id: i32,
    pub question_id: i32,
    pub category_id: i32,
    pub user_answer: String,
    pub is_correct: bool,
    pub reward_earned: Decimal,
    pub time_taken_seconds: i32,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct UserWallet {
    pub id: i32,
    pub user_id: i32,
    pub chain: String,
    pub wallet_address: String,
    pub balance: Decimal,
    pub is_connected: bool,
    pub last_synced: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl UserWallet {
    pub fn chain(&self) -> LedgerResult<Chain> {
        Chain::from_str(&self.chain)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: i32,
    pub user_id: i32,
    pub tx_type: String,
    pub chain: String,
    pub to_address: String,
    pub amount: Decimal,
    pub token_symbol: String,
    pub gas_fee: Decimal,
    pub tx_hash: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn status(&self) -> LedgerResult<TxStatus> {
        TxStatus::from_str(&self.status)
    }

    pub fn tx_type(&self) -> LedgerResult<TxType> {
        TxType::from_str(&self.tx_type)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub user_id: i32,
    pub tx_type: TxType,
    pub chain: Chain,
    pub to_address: String,
    pub amount: Decimal,
    pub token_symbol: String,
    pub gas_fee: Option<Decimal>,
    pub tx_hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub id: i32,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub total_earned: Option<Decimal>,
    pub correct_answers: i64,
    pub total_answers: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct UserStats {
    pub correct_answers: i64,
    pub total_answers: i64,
    pub total_earned: Option<Decimal>,
    pub avg_time: Option<f64>,
}

/// Credited earnings next to the rewards recorded on correct answers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, sqlx::FromRow)]
pub struct Reconciliation {
    pub user_id: i32,
    pub credited: Decimal,
    pub earned: Decimal,
}

impl Reconciliation {
    pub fn is_balanced(&self) -> bool {
        self.credited == self.earned
    }
}
