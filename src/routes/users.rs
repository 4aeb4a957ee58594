use crate::{
    error::AppError,
    server::Server,
    users::{UserCreate, UserRecord},
};
use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn create_user_routes() -> Router<Server> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/token", post(login_handler))
        .route("/me", get(me_handler))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn register_handler(
    State(server): State<Server>,
    Json(request): Json<UserCreate>,
) -> Result<Json<UserRecord>, AppError> {
    let record = server.users.register(request).await?;
    Ok(Json(record))
}

async fn login_handler(
    State(server): State<Server>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let user = server
        .users
        .authenticate(&request.username, &request.password)
        .await
        .ok_or_else(|| {
            AppError::AuthenticationRequired("incorrect username or password".to_string())
        })?;

    let token = server
        .jwt
        .create_token(&user.username, server.config.jwt.token_ttl_secs)?;
    Ok(Json(json!({
        "access_token": token,
        "token_type": "bearer",
    })))
}

async fn me_handler(
    State(server): State<Server>,
    headers: HeaderMap,
) -> Result<Json<UserRecord>, AppError> {
    let token = bearer_token(&headers)?;
    let claims = server.jwt.verify(token)?;

    let user = server.users.get(&claims.sub).await.ok_or_else(|| {
        AppError::AuthenticationRequired("user no longer exists".to_string())
    })?;
    Ok(Json(user))
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            AppError::AuthenticationRequired("Missing Authorization header".to_string())
        })?;

    value.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::AuthenticationRequired("Invalid Authorization format".to_string())
    })
}
