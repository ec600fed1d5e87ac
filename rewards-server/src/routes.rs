use actix_web::{web, HttpResponse, Responder};
use common::{
    db::{stats, transactions, trivia, users, wallets},
    models::{AnswerSubmission, NewTransaction, NewTriviaQuestion, NewUser, TriviaQuestion, UserUpdate},
    scoring::{calculate_score, grade_answer},
    utils::{format_address, Chain, Timeframe},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::info;

use crate::{
    auth::hash_password,
    config::Config,
    error::{ApiError, ApiResult},
};

pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(list_chains)
        .service(create_user)
        .service(get_user_by_username)
        .service(get_user)
        .service(update_user)
        .service(get_user_stats)
        .service(get_reconciliation)
        .service(get_categories)
        .service(create_category)
        .service(get_category)
        .service(set_category_active)
        .service(get_category_questions)
        .service(create_question)
        .service(submit_answer)
        .service(get_user_wallets)
        .service(connect_wallet)
        .service(update_wallet_balance)
        .service(disconnect_wallet)
        .service(create_transaction)
        .service(get_user_transactions)
        .service(confirm_transaction)
        .service(fail_transaction)
        .service(get_leaderboard);
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[actix_web::get("/health")]
async fn health_check() -> impl Responder {
    info!("Health check request arrived");
    HttpResponse::Ok().content_type("text/plain").body("OK")
}

#[actix_web::get("/chains")]
async fn list_chains(app_state: web::Data<AppState>) -> impl Responder {
    let chains: Vec<_> = Chain::ALL
        .iter()
        .map(|chain| {
            json!({
                "chain": chain,
                "symbol": chain.native_symbol(),
                "rpc": app_state.config.rpc_endpoint(*chain),
            })
        })
        .collect();

    HttpResponse::Ok().json(chains)
}

// Users

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[actix_web::post("/users")]
async fn create_user(
    req: web::Json<CreateUserRequest>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let req = req.into_inner();
    let password_hash = hash_password(&req.password)?;

    let user = users::create_user(
        &app_state.pool,
        &NewUser {
            username: req.username,
            email: req.email,
            password_hash,
            display_name: req.display_name,
        },
    )
    .await?;

    info!(user_id = user.id, username = %user.username, "Created user");
    Ok(HttpResponse::Created().json(user))
}

#[actix_web::get("/users/{id}")]
async fn get_user(path: web::Path<i32>, app_state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let user = users::get_user(&app_state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("user {}", id)))?;
    Ok(HttpResponse::Ok().json(user))
}

#[actix_web::get("/users/by-name/{username}")]
async fn get_user_by_username(
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let username = path.into_inner();
    let user = users::get_user_by_username(&app_state.pool, &username)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("user {}", username)))?;
    Ok(HttpResponse::Ok().json(user))
}

#[actix_web::patch("/users/{id}")]
async fn update_user(
    path: web::Path<i32>,
    req: web::Json<UserUpdate>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let user = users::update_user(&app_state.pool, path.into_inner(), &req).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[actix_web::get("/users/{id}/stats")]
async fn get_user_stats(
    path: web::Path<i32>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let user_stats = stats::get_user_stats(&app_state.pool, path.into_inner()).await?;
    let score = calculate_score(
        clamp_count(user_stats.total_answers),
        clamp_count(user_stats.correct_answers),
    );

    Ok(HttpResponse::Ok().json(json!({
        "correct_answers": user_stats.correct_answers,
        "total_answers": user_stats.total_answers,
        "total_earned": user_stats.total_earned,
        "avg_time": user_stats.avg_time,
        "score": score,
        "feedback": score.grade.feedback(),
    })))
}

fn clamp_count(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}

#[actix_web::get("/users/{id}/reconciliation")]
async fn get_reconciliation(
    path: web::Path<i32>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let reconciliation = stats::reconcile_user(&app_state.pool, path.into_inner()).await?;
    let balanced = reconciliation.is_balanced();
    Ok(HttpResponse::Ok().json(json!({
        "user_id": reconciliation.user_id,
        "credited": reconciliation.credited,
        "earned": reconciliation.earned,
        "balanced": balanced,
    })))
}

// Trivia

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// A question as shown to players, without its answer key.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: i32,
    pub category_id: i32,
    pub question: String,
    pub answers: [String; 4],
    pub difficulty: String,
    pub reward_amount: Decimal,
}

impl From<TriviaQuestion> for QuestionView {
    fn from(q: TriviaQuestion) -> Self {
        QuestionView {
            id: q.id,
            category_id: q.category_id,
            answers: q.answers().map(str::to_string),
            question: q.question,
            difficulty: q.difficulty,
            reward_amount: q.reward_amount,
        }
    }
}

#[actix_web::get("/categories")]
async fn get_categories(app_state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let categories = trivia::get_trivia_categories(&app_state.pool).await?;
    Ok(HttpResponse::Ok().json(categories))
}

#[actix_web::post("/categories")]
async fn create_category(
    req: web::Json<CreateCategoryRequest>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let category = trivia::create_trivia_category(&app_state.pool, &req.name, &req.icon).await?;
    Ok(HttpResponse::Created().json(category))
}

#[actix_web::get("/categories/{id}")]
async fn get_category(
    path: web::Path<i32>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let category = trivia::get_trivia_category(&app_state.pool, id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("category {}", id)))?;
    Ok(HttpResponse::Ok().json(category))
}

#[actix_web::post("/categories/{id}/active")]
async fn set_category_active(
    path: web::Path<i32>,
    req: web::Json<SetActiveRequest>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let category =
        trivia::set_category_active(&app_state.pool, path.into_inner(), req.is_active).await?;
    Ok(HttpResponse::Ok().json(category))
}

#[actix_web::get("/categories/{id}/questions")]
async fn get_category_questions(
    path: web::Path<i32>,
    query: web::Query<LimitQuery>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let limit = query.limit.unwrap_or(trivia::DEFAULT_QUESTION_LIMIT);
    let questions: Vec<QuestionView> =
        trivia::get_trivia_questions(&app_state.pool, path.into_inner(), limit)
            .await?
            .into_iter()
            .map(QuestionView::from)
            .collect();
    Ok(HttpResponse::Ok().json(questions))
}

#[actix_web::post("/questions")]
async fn create_question(
    req: web::Json<NewTriviaQuestion>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let question = trivia::create_trivia_question(&app_state.pool, &req).await?;
    Ok(HttpResponse::Created().json(question))
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub user_id: i32,
    pub question_id: i32,
    pub answer: String,
    pub time_taken_seconds: i32,
}

#[actix_web::post("/answers")]
async fn submit_answer(
    req: web::Json<SubmitAnswerRequest>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let req = req.into_inner();
    let AppState { pool, .. } = &**app_state;

    if users::get_user(pool, req.user_id).await?.is_none() {
        return Err(ApiError::not_found(format!("user {}", req.user_id)));
    }
    let question = trivia::get_active_trivia_question(pool, req.question_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("question {}", req.question_id)))?;

    let grade = grade_answer(&question, &req.answer);
    let answer = trivia::submit_trivia_answer(
        pool,
        &AnswerSubmission {
            user_id: req.user_id,
            question_id: question.id,
            category_id: question.category_id,
            user_answer: req.answer.trim().to_uppercase(),
            is_correct: grade.is_correct,
            reward_earned: grade.reward,
            time_taken_seconds: req.time_taken_seconds,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(json!({
        "answer": answer,
        "is_correct": grade.is_correct,
        "reward": grade.reward,
    })))
}

// Wallets

#[derive(Debug, Deserialize)]
pub struct ConnectWalletRequest {
    pub user_id: i32,
    pub chain: Chain,
    pub wallet_address: String,
    #[serde(default)]
    pub balance: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct BalanceRequest {
    pub balance: Decimal,
}

#[actix_web::get("/users/{id}/wallets")]
async fn get_user_wallets(
    path: web::Path<i32>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let wallets = wallets::get_user_wallets(&app_state.pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(wallets))
}

#[actix_web::post("/wallets")]
async fn connect_wallet(
    req: web::Json<ConnectWalletRequest>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let address = req.wallet_address.trim();
    if !req.chain.is_valid_address(address) {
        return Err(ApiError::bad_request(format!(
            "{} is not a valid {} address",
            address, req.chain
        )));
    }

    let wallet =
        wallets::add_or_update_wallet(&app_state.pool, req.user_id, req.chain, address, req.balance)
            .await?;

    info!(
        user_id = req.user_id,
        chain = %req.chain,
        address = %format_address(address, 4),
        "Wallet connected"
    );
    Ok(HttpResponse::Ok().json(wallet))
}

#[actix_web::post("/wallets/{id}/balance")]
async fn update_wallet_balance(
    path: web::Path<i32>,
    req: web::Json<BalanceRequest>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let wallet =
        wallets::update_wallet_balance(&app_state.pool, path.into_inner(), req.balance).await?;
    Ok(HttpResponse::Ok().json(wallet))
}

#[actix_web::post("/wallets/{id}/disconnect")]
async fn disconnect_wallet(
    path: web::Path<i32>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let wallet = wallets::disconnect_wallet(&app_state.pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(wallet))
}

// Transactions

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub tx_hash: String,
}

#[actix_web::post("/transactions")]
async fn create_transaction(
    req: web::Json<NewTransaction>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    if !req.chain.is_valid_address(req.to_address.trim()) {
        return Err(ApiError::bad_request(format!(
            "{} is not a valid {} address",
            req.to_address, req.chain
        )));
    }

    let tx = transactions::create_transaction(&app_state.pool, &req).await?;
    info!(
        id = tx.id,
        user_id = tx.user_id,
        tx_type = %tx.tx_type,
        amount = %tx.amount,
        "Transaction recorded"
    );
    Ok(HttpResponse::Created().json(tx))
}

#[actix_web::get("/users/{id}/transactions")]
async fn get_user_transactions(
    path: web::Path<i32>,
    query: web::Query<LimitQuery>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let limit = query.limit.unwrap_or(transactions::DEFAULT_TRANSACTION_LIMIT);
    let rows = transactions::get_user_transactions(&app_state.pool, path.into_inner(), limit).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[actix_web::post("/transactions/{id}/confirm")]
async fn confirm_transaction(
    path: web::Path<i32>,
    req: web::Json<ConfirmRequest>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let tx = transactions::confirm_transaction(&app_state.pool, path.into_inner(), &req.tx_hash)
        .await?;
    Ok(HttpResponse::Ok().json(tx))
}

#[actix_web::post("/transactions/{id}/fail")]
async fn fail_transaction(
    path: web::Path<i32>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let tx = transactions::fail_transaction(&app_state.pool, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tx))
}

// Leaderboard

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<i64>,
    pub timeframe: Option<String>,
}

#[actix_web::get("/leaderboard")]
async fn get_leaderboard(
    query: web::Query<LeaderboardQuery>,
    app_state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    let timeframe = match query.timeframe.as_deref() {
        Some(raw) => raw.parse::<Timeframe>()?,
        None => Timeframe::default(),
    };
    let limit = query.limit.unwrap_or(stats::DEFAULT_LEADERBOARD_LIMIT);

    let leaders = stats::get_leaderboard_for(&app_state.pool, limit, timeframe).await?;
    Ok(HttpResponse::Ok().json(leaders))
}
