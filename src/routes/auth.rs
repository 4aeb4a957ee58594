use crate::{error::AppError, server::Server};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;

pub fn create_auth_routes() -> Router<Server> {
    Router::new()
        .route("/atlassian/login", get(login_handler))
        .route("/atlassian/callback", get(callback_handler))
        .route("/atlassian/status", get(status_handler))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub format: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Starts the authorization-code flow with a 302 to Atlassian.
async fn login_handler(State(server): State<Server>) -> Result<Response, AppError> {
    let (url, _state) = server.oauth.authorization_url().await?;
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

/// Completes the flow: consumes the one-time state, exchanges the code, and
/// answers with an HTML confirmation or a JSON summary. Token values never
/// appear in either.
async fn callback_handler(
    State(server): State<Server>,
    Query(params): Query<CallbackQuery>,
) -> Result<Response, AppError> {
    if let Some(error) = params.error {
        let description = params
            .error_description
            .unwrap_or_else(|| "authorization was denied".to_string());
        return Err(AppError::BadRequest(format!(
            "Atlassian authorization failed: {}: {}",
            error, description
        )));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;
    let state = params
        .state
        .ok_or_else(|| AppError::BadRequest("Missing state parameter".to_string()))?;

    if !server.oauth.states.validate_and_consume(&state).await {
        return Err(AppError::InvalidState(
            "Invalid or expired state parameter".to_string(),
        ));
    }

    let record = server.oauth.exchange_code(&code).await?;

    let summary = json!({
        "authenticated": true,
        "token_type": record.token_type,
        "scope": record.scope,
        "expires_at": record.expires_at,
        "access_token_present": true,
        "refresh_token_present": record.refresh_token.is_some(),
    });

    if params.format.as_deref() == Some("json") {
        return Ok(Json(summary).into_response());
    }

    let page = format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Atlassian connected</title></head>\n<body>\n\
         <h1>Atlassian account connected</h1>\n\
         <p>The gateway can now reach JIRA and Confluence on your behalf.</p>\n\
         <p>Token type: {} &middot; refresh token: {}</p>\n\
         <p>You can close this window.</p>\n</body>\n</html>\n",
        record.token_type,
        if record.refresh_token.is_some() {
            "yes"
        } else {
            "no"
        },
    );
    Ok(Html(page).into_response())
}

/// Reports whether a usable Atlassian credential set is cached, without
/// exposing any token material.
async fn status_handler(State(server): State<Server>) -> Json<serde_json::Value> {
    let record = server.oauth.tokens.get().await;
    match record {
        Some(record) => Json(json!({
            "authenticated": !record.is_expired(),
            "expires_at": record.expires_at,
            "scope": record.scope,
            "refresh_token_present": record.refresh_token.is_some(),
        })),
        None => Json(json!({
            "authenticated": false,
            "expires_at": null,
            "scope": null,
            "refresh_token_present": false,
        })),
    }
}
