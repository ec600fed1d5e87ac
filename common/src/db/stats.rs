use sqlx::{Executor, Postgres};

use super::query::Query;
use crate::{
    error::{LedgerError, LedgerResult},
    models::{LeaderboardEntry, Reconciliation, UserStats},
    utils::Timeframe,
};

pub const DEFAULT_LEADERBOARD_LIMIT: i64 = 100;

/// Accounts that never appear on a leaderboard.
pub const EXCLUDED_ACCOUNTS: [&str; 2] = ["admin", "moderator"];

macro_rules! leaderboard_sql {
    ($answer_window:literal) => {
        concat!(
            "SELECT ROW_NUMBER() OVER (
                    ORDER BY SUM(tua.reward_earned) DESC NULLS LAST, u.username ASC
                ) AS rank,
                u.id, u.username, u.display_name, u.avatar_url,
                SUM(tua.reward_earned) AS total_earned,
                COUNT(tua.id) FILTER (WHERE tua.is_correct) AS correct_answers,
                COUNT(tua.id) AS total_answers
             FROM users u
             LEFT JOIN trivia_user_answers tua ON u.id = tua.user_id",
            $answer_window,
            "
             WHERE LOWER(u.username) NOT IN ('admin', 'moderator')
             GROUP BY u.id, u.username, u.display_name, u.avatar_url
             ORDER BY total_earned DESC NULLS LAST, u.username ASC
             LIMIT $1"
        )
    };
}

const LEADERBOARD_ALL_TIME: &str = leaderboard_sql!("");
const LEADERBOARD_LAST_24H: &str =
    leaderboard_sql!(" AND tua.answered_at >= NOW() - INTERVAL '24 hours'");

/// All-time leaderboard. Ties on total reward are ordered by username.
pub async fn get_leaderboard<'c, E>(executor: E, limit: i64) -> LedgerResult<Vec<LeaderboardEntry>>
where
    E: Executor<'c, Database = Postgres>,
{
    get_leaderboard_for(executor, limit, Timeframe::AllTime).await
}

pub async fn get_leaderboard_for<'c, E>(
    executor: E,
    limit: i64,
    timeframe: Timeframe,
) -> LedgerResult<Vec<LeaderboardEntry>>
where
    E: Executor<'c, Database = Postgres>,
{
    if limit <= 0 {
        return Err(LedgerError::InvalidInput("limit must be positive".to_string()));
    }

    let sql = match timeframe {
        Timeframe::AllTime => LEADERBOARD_ALL_TIME,
        Timeframe::Last24h => LEADERBOARD_LAST_24H,
    };

    let output = Query::new(sql).bind(limit).fetch_all(executor).await?;
    Ok(output.rows)
}

pub async fn get_user_stats<'c, E>(executor: E, user_id: i32) -> LedgerResult<UserStats>
where
    E: Executor<'c, Database = Postgres>,
{
    Query::new(
        "SELECT COUNT(*) FILTER (WHERE is_correct) AS correct_answers,
                COUNT(*) AS total_answers,
                SUM(reward_earned) AS total_earned,
                AVG(time_taken_seconds)::FLOAT8 AS avg_time
         FROM trivia_user_answers
         WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}

/// Compares a user's credited earnings with the rewards on their correct answers.
pub async fn reconcile_user<'c, E>(executor: E, user_id: i32) -> LedgerResult<Reconciliation>
where
    E: Executor<'c, Database = Postgres>,
{
    Query::new(
        "SELECT u.id AS user_id,
                u.total_earnings AS credited,
                COALESCE(SUM(tua.reward_earned) FILTER (WHERE tua.is_correct), 0) AS earned
         FROM users u
         LEFT JOIN trivia_user_answers tua ON u.id = tua.user_id
         WHERE u.id = $1
         GROUP BY u.id, u.total_earnings",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| LedgerError::NotFound(format!("user {}", user_id)))
}

/// Every user whose credited earnings drifted from their answer history.
pub async fn find_unreconciled<'c, E>(executor: E) -> LedgerResult<Vec<Reconciliation>>
where
    E: Executor<'c, Database = Postgres>,
{
    let output = Query::new(
        "SELECT u.id AS user_id,
                u.total_earnings AS credited,
                COALESCE(SUM(tua.reward_earned) FILTER (WHERE tua.is_correct), 0) AS earned
         FROM users u
         LEFT JOIN trivia_user_answers tua ON u.id = tua.user_id
         GROUP BY u.id, u.total_earnings
         HAVING u.total_earnings <> COALESCE(SUM(tua.reward_earned) FILTER (WHERE tua.is_correct), 0)
         ORDER BY u.id",
    )
    .fetch_all(executor)
    .await?;
    Ok(output.rows)
}
