#![allow(dead_code)]

use common::{
    db::{trivia, users},
    models::{AnswerSubmission, NewTriviaQuestion, NewUser, TriviaQuestion, User},
    utils::Difficulty,
};
use rust_decimal::Decimal;
use sqlx::PgPool;

pub async fn create_user(pool: &PgPool, username: &str) -> User {
    users::create_user(
        pool,
        &NewUser {
            username: username.to_string(),
            email: format!("{}@neuroisland.test", username),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            display_name: None,
        },
    )
    .await
    .expect("failed to create user")
}

pub async fn seed_question(pool: &PgPool, difficulty: Difficulty) -> TriviaQuestion {
    let category = trivia::create_trivia_category(pool, "Web3", "link")
        .await
        .expect("failed to create category");

    trivia::create_trivia_question(
        pool,
        &NewTriviaQuestion {
            category_id: category.id,
            question: "What does NFT stand for?".to_string(),
            answer_a: "New Financial Token".to_string(),
            answer_b: "Non-Fungible Token".to_string(),
            answer_c: "Network Fee Transfer".to_string(),
            answer_d: "Native Fork Trigger".to_string(),
            correct_answer: "b".to_string(),
            difficulty,
            reward_amount: None,
        },
    )
    .await
    .expect("failed to create question")
}

pub fn submission(
    user: &User,
    question: &TriviaQuestion,
    is_correct: bool,
    reward_earned: Decimal,
) -> AnswerSubmission {
    AnswerSubmission {
        user_id: user.id,
        question_id: question.id,
        category_id: question.category_id,
        user_answer: if is_correct { "B" } else { "A" }.to_string(),
        is_correct,
        reward_earned,
        time_taken_seconds: 12,
    }
}

pub async fn count_answers(pool: &PgPool, user_id: i32) -> i64 {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM trivia_user_answers WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(pool)
            .await
            .expect("failed to count answers");
    count
}
