use crate::{
    atlassian::confluence::{Page, PageCreate, PageUpdate},
    error::AppError,
    server::Server,
};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn create_confluence_routes() -> Router<Server> {
    Router::new()
        .route("/pages", post(create_page))
        .route("/pages/search", get(search_pages))
        .route(
            "/pages/{id}",
            get(get_page).put(update_page).delete(delete_page),
        )
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    cql: String,
    limit: Option<u32>,
}

async fn create_page(
    State(server): State<Server>,
    Json(request): Json<PageCreate>,
) -> Result<Json<Page>, AppError> {
    let page = server.confluence.create_page(request).await?;
    Ok(Json(page))
}

async fn get_page(
    State(server): State<Server>,
    Path(id): Path<String>,
) -> Result<Json<Page>, AppError> {
    let page = server.confluence.get_page(&id).await?;
    Ok(Json(page))
}

async fn update_page(
    State(server): State<Server>,
    Path(id): Path<String>,
    Json(update): Json<PageUpdate>,
) -> Result<Json<Page>, AppError> {
    let page = server.confluence.update_page(&id, update).await?;
    Ok(Json(page))
}

async fn delete_page(
    State(server): State<Server>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    server.confluence.delete_page(&id).await?;
    Ok(Json(json!({
        "message": format!("Page {} deleted successfully", id)
    })))
}

async fn search_pages(
    State(server): State<Server>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Page>>, AppError> {
    let pages = server
        .confluence
        .search_pages(&query.cql, query.limit)
        .await?;
    Ok(Json(pages))
}
