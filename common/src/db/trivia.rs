use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use tracing::info;

use super::query::Query;
use crate::{
    error::{LedgerError, LedgerResult},
    models::{AnswerSubmission, NewTriviaQuestion, TriviaCategory, TriviaQuestion, TriviaUserAnswer},
    scoring::normalize_answer_letter,
};

pub const DEFAULT_QUESTION_LIMIT: i64 = 10;

pub async fn get_trivia_categories<'c, E>(executor: E) -> LedgerResult<Vec<TriviaCategory>>
where
    E: Executor<'c, Database = Postgres>,
{
    let output = Query::new("SELECT * FROM trivia_categories WHERE is_active = TRUE ORDER BY name")
        .fetch_all(executor)
        .await?;
    Ok(output.rows)
}

pub async fn get_trivia_category<'c, E>(executor: E, id: i32) -> LedgerResult<Option<TriviaCategory>>
where
    E: Executor<'c, Database = Postgres>,
{
    Query::new("SELECT * FROM trivia_categories WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn create_trivia_category<'c, E>(
    executor: E,
    name: &str,
    icon: &str,
) -> LedgerResult<TriviaCategory>
where
    E: Executor<'c, Database = Postgres>,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::InvalidInput("category name must not be empty".to_string()));
    }

    Query::new("INSERT INTO trivia_categories (name, icon) VALUES ($1, $2) RETURNING *")
        .bind(name)
        .bind(icon)
        .fetch_one(executor)
        .await
}

pub async fn set_category_active<'c, E>(
    executor: E,
    id: i32,
    is_active: bool,
) -> LedgerResult<TriviaCategory>
where
    E: Executor<'c, Database = Postgres>,
{
    Query::new("UPDATE trivia_categories SET is_active = $1 WHERE id = $2 RETURNING *")
        .bind(is_active)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("category {}", id)))
}

/// Random sample of active questions from one category.
pub async fn get_trivia_questions<'c, E>(
    executor: E,
    category_id: i32,
    limit: i64,
) -> LedgerResult<Vec<TriviaQuestion>>
where
    E: Executor<'c, Database = Postgres>,
{
    if limit <= 0 {
        return Err(LedgerError::InvalidInput("limit must be positive".to_string()));
    }

    let output = Query::new(
        "SELECT id, category_id, question, answer_a, answer_b, answer_c, answer_d,
                correct_answer, difficulty, reward_amount
         FROM trivia_questions
         WHERE category_id = $1 AND is_active = TRUE
         ORDER BY RANDOM()
         LIMIT $2",
    )
    .bind(category_id)
    .bind(limit)
    .fetch_all(executor)
    .await?;
    Ok(output.rows)
}

pub async fn get_trivia_question<'c, E>(executor: E, id: i32) -> LedgerResult<Option<TriviaQuestion>>
where
    E: Executor<'c, Database = Postgres>,
{
    Query::new(
        "SELECT id, category_id, question, answer_a, answer_b, answer_c, answer_d,
                correct_answer, difficulty, reward_amount
         FROM trivia_questions
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Like [`get_trivia_question`], but only while both the question and its
/// category are active.
pub async fn get_active_trivia_question<'c, E>(
    executor: E,
    id: i32,
) -> LedgerResult<Option<TriviaQuestion>>
where
    E: Executor<'c, Database = Postgres>,
{
    Query::new(
        "SELECT q.id, q.category_id, q.question, q.answer_a, q.answer_b, q.answer_c, q.answer_d,
                q.correct_answer, q.difficulty, q.reward_amount
         FROM trivia_questions q
         JOIN trivia_categories c ON c.id = q.category_id
         WHERE q.id = $1 AND q.is_active = TRUE AND c.is_active = TRUE",
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn create_trivia_question<'c, E>(
    executor: E,
    new_question: &NewTriviaQuestion,
) -> LedgerResult<TriviaQuestion>
where
    E: Executor<'c, Database = Postgres>,
{
    let correct_answer = normalize_answer_letter(&new_question.correct_answer).ok_or_else(|| {
        LedgerError::InvalidInput(format!(
            "correct answer must be one of A, B, C, D, got {:?}",
            new_question.correct_answer
        ))
    })?;
    let reward_amount = new_question
        .reward_amount
        .unwrap_or_else(|| new_question.difficulty.base_reward());
    if reward_amount < Decimal::ZERO {
        return Err(LedgerError::InvalidInput("reward amount must not be negative".to_string()));
    }

    Query::new(
        "INSERT INTO trivia_questions
         (category_id, question, answer_a, answer_b, answer_c, answer_d,
          correct_answer, difficulty, reward_amount)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING id, category_id, question, answer_a, answer_b, answer_c, answer_d,
                   correct_answer, difficulty, reward_amount",
    )
    .bind(new_question.category_id)
    .bind(&new_question.question)
    .bind(&new_question.answer_a)
    .bind(&new_question.answer_b)
    .bind(&new_question.answer_c)
    .bind(&new_question.answer_d)
    .bind(correct_answer.to_string())
    .bind(new_question.difficulty.to_string())
    .bind(reward_amount)
    .fetch_one(executor)
    .await
}

fn validate_submission(submission: &AnswerSubmission) -> LedgerResult<()> {
    if submission.reward_earned < Decimal::ZERO {
        return Err(LedgerError::InvalidInput("reward must not be negative".to_string()));
    }
    if !submission.is_correct && submission.reward_earned != Decimal::ZERO {
        return Err(LedgerError::InvalidInput(
            "an incorrect answer cannot earn a reward".to_string(),
        ));
    }
    if submission.time_taken_seconds < 0 {
        return Err(LedgerError::InvalidInput("time taken must not be negative".to_string()));
    }
    Ok(())
}

/// Records one answer attempt and, when it is correct, credits the reward to
/// the user's earnings. Both writes commit together or not at all.
pub async fn submit_trivia_answer(
    pool: &PgPool,
    submission: &AnswerSubmission,
) -> LedgerResult<TriviaUserAnswer> {
    validate_submission(submission)?;

    let mut tx = pool.begin().await?;

    let answer: TriviaUserAnswer = Query::new(
        "INSERT INTO trivia_user_answers
         (user_id, question_id, category_id, user_answer, is_correct, reward_earned, time_taken_seconds)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING *",
    )
    .bind(submission.user_id)
    .bind(submission.question_id)
    .bind(submission.category_id)
    .bind(&submission.user_answer)
    .bind(submission.is_correct)
    .bind(submission.reward_earned)
    .bind(submission.time_taken_seconds)
    .fetch_one(&mut *tx)
    .await?;

    if submission.is_correct {
        let credited = Query::new(
            "UPDATE users
             SET total_earnings = total_earnings + $1, updated_at = NOW()
             WHERE id = $2",
        )
        .bind(submission.reward_earned)
        .bind(submission.user_id)
        .execute(&mut *tx)
        .await?;

        if credited == 0 {
            tx.rollback().await?;
            return Err(LedgerError::NotFound(format!("user {}", submission.user_id)));
        }
    }

    tx.commit().await?;

    info!(
        user_id = submission.user_id,
        question_id = submission.question_id,
        is_correct = submission.is_correct,
        reward = %credited_amount(submission),
        "Recorded trivia answer"
    );

    Ok(answer)
}

fn credited_amount(submission: &AnswerSubmission) -> Decimal {
    if submission.is_correct {
        submission.reward_earned
    } else {
        Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(reward: Decimal, time_taken_seconds: i32) -> AnswerSubmission {
        AnswerSubmission {
            user_id: 1,
            question_id: 1,
            category_id: 1,
            user_answer: "A".to_string(),
            is_correct: true,
            reward_earned: reward,
            time_taken_seconds,
        }
    }

    #[test]
    fn submissions_with_negative_values_are_rejected() {
        assert!(validate_submission(&submission(Decimal::new(-1, 2), 5)).is_err());
        assert!(validate_submission(&submission(Decimal::new(2, 2), -1)).is_err());
        assert!(validate_submission(&submission(Decimal::ZERO, 0)).is_ok());
    }

    #[test]
    fn incorrect_answers_cannot_carry_a_reward() {
        let mut wrong = submission(Decimal::new(5, 2), 3);
        wrong.is_correct = false;
        assert!(matches!(
            validate_submission(&wrong),
            Err(LedgerError::InvalidInput(_))
        ));

        wrong.reward_earned = Decimal::ZERO;
        assert!(validate_submission(&wrong).is_ok());
    }

    #[test]
    fn incorrect_answers_credit_nothing() {
        let mut wrong = submission(Decimal::ZERO, 3);
        wrong.is_correct = false;
        assert_eq!(credited_amount(&wrong), Decimal::ZERO);
        assert_eq!(credited_amount(&submission(Decimal::new(5, 2), 3)), Decimal::new(5, 2));
    }
}
