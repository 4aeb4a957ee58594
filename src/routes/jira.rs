use crate::{
    atlassian::jira::{Issue, IssueCreate, IssueSearchRequest, IssueUpdate},
    error::AppError,
    server::Server,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

pub fn create_jira_routes() -> Router<Server> {
    Router::new()
        .route("/issues", post(create_issue))
        .route("/issues/search", post(search_issues))
        .route(
            "/issues/{key}",
            get(get_issue).put(update_issue).delete(delete_issue),
        )
}

async fn create_issue(
    State(server): State<Server>,
    Json(request): Json<IssueCreate>,
) -> Result<Json<Issue>, AppError> {
    let issue = server.jira.create_issue(request).await?;
    Ok(Json(issue))
}

async fn get_issue(
    State(server): State<Server>,
    Path(key): Path<String>,
) -> Result<Json<Issue>, AppError> {
    let issue = server.jira.get_issue(&key).await?;
    Ok(Json(issue))
}

async fn update_issue(
    State(server): State<Server>,
    Path(key): Path<String>,
    Json(update): Json<IssueUpdate>,
) -> Result<Json<Issue>, AppError> {
    let issue = server.jira.update_issue(&key, update).await?;
    Ok(Json(issue))
}

async fn delete_issue(
    State(server): State<Server>,
    Path(key): Path<String>,
) -> Result<Json<Value>, AppError> {
    server.jira.delete_issue(&key).await?;
    Ok(Json(json!({
        "message": format!("Issue {} deleted successfully", key)
    })))
}

async fn search_issues(
    State(server): State<Server>,
    Json(request): Json<IssueSearchRequest>,
) -> Result<Json<Vec<Issue>>, AppError> {
    let issues = server.jira.search_issues(request).await?;
    Ok(Json(issues))
}
