pub mod confluence;
pub mod jira;
pub mod sites;

pub use confluence::ConfluenceService;
pub use jira::JiraService;
pub use sites::{SiteResolver, SiteUrls};

use crate::error::AppError;
use serde::de::DeserializeOwned;

/// Checks an upstream response status, wrapping a non-success status and its
/// body under the given descriptive tag.
pub(crate) async fn expect_success(
    response: reqwest::Response,
    tag: &str,
) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::upstream(tag, status.as_u16(), body))
}

/// Deserializes an upstream body into its typed document, failing fast when
/// required fields are missing.
pub(crate) async fn parse_json<T: DeserializeOwned>(
    response: reqwest::Response,
    tag: &str,
) -> Result<T, AppError> {
    response
        .json::<T>()
        .await
        .map_err(|e| AppError::Internal(format!("{}: invalid upstream response: {}", tag, e)))
}
