use crate::{
    atlassian::{expect_success, parse_json, SiteResolver},
    auth::OAuthService,
    error::AppError,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

const DEFAULT_SEARCH_LIMIT: u32 = 50;

fn default_issue_type() -> String {
    "Task".to_string()
}

/// Internal request model for creating an issue. `title` maps to the
/// upstream `summary` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueCreate {
    pub project_key: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_issue_type")]
    pub issue_type: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub assignee: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSearchRequest {
    pub jql: String,
    #[serde(default)]
    pub max_results: Option<u32>,
}

/// Normalized view of an upstream issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub key: String,
    pub title: String,
    pub description: Option<String>,
    pub issue_type: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub labels: Vec<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
}

// Upstream document shapes, validated at the translation boundary.

#[derive(Debug, Deserialize)]
struct IssueDoc {
    id: String,
    key: String,
    fields: IssueFields,
}

#[derive(Debug, Deserialize)]
struct IssueFields {
    summary: String,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    issuetype: Option<NamedDoc>,
    #[serde(default)]
    priority: Option<NamedDoc>,
    #[serde(default)]
    status: Option<NamedDoc>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    assignee: Option<UserDoc>,
    #[serde(default)]
    reporter: Option<UserDoc>,
}

#[derive(Debug, Deserialize)]
struct NamedDoc {
    name: String,
}

#[derive(Debug, Deserialize)]
struct UserDoc {
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(rename = "accountId", default)]
    account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedIssueDoc {
    #[allow(dead_code)]
    id: String,
    key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResultsDoc {
    issues: Vec<IssueDoc>,
}

impl From<IssueDoc> for Issue {
    fn from(doc: IssueDoc) -> Self {
        Issue {
            id: doc.id,
            key: doc.key,
            title: doc.fields.summary,
            description: doc.fields.description.as_ref().and_then(adf_to_text),
            issue_type: doc.fields.issuetype.map(|t| t.name),
            priority: doc.fields.priority.map(|p| p.name),
            status: doc.fields.status.map(|s| s.name),
            labels: doc.fields.labels,
            assignee: doc.fields.assignee.and_then(user_label),
            reporter: doc.fields.reporter.and_then(user_label),
        }
    }
}

fn user_label(user: UserDoc) -> Option<String> {
    user.display_name.or(user.account_id)
}

/// Wraps plain text in the minimal Atlassian Document Format body the v3
/// issue API expects.
fn text_to_adf(text: &str) -> Value {
    json!({
        "type": "doc",
        "version": 1,
        "content": [{
            "type": "paragraph",
            "content": [{"type": "text", "text": text}]
        }]
    })
}

/// Flattens an ADF document back to plain text, joining text nodes. Returns
/// None for empty documents.
fn adf_to_text(value: &Value) -> Option<String> {
    fn collect(value: &Value, out: &mut Vec<String>) {
        if let Some(text) = value.get("text").and_then(Value::as_str) {
            out.push(text.to_string());
        }
        if let Some(content) = value.get("content").and_then(Value::as_array) {
            for child in content {
                collect(child, out);
            }
        }
    }

    // Some upstream payloads still carry plain-string descriptions.
    if let Some(text) = value.as_str() {
        return Some(text.to_string());
    }

    let mut parts = Vec::new();
    collect(value, &mut parts);
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// Proxy translating internal issue operations into JIRA Cloud v3 REST
/// calls. Every operation obtains a valid token and the tenant base URL
/// before going upstream.
pub struct JiraService {
    http: Client,
    oauth: Arc<OAuthService>,
    sites: Arc<SiteResolver>,
}

impl JiraService {
    pub fn new(http: Client, oauth: Arc<OAuthService>, sites: Arc<SiteResolver>) -> Self {
        Self { http, oauth, sites }
    }

    async fn authed_base(&self) -> Result<(String, String), AppError> {
        let token = self.oauth.ensure_valid().await?;
        let urls = self.sites.resolve(&token).await?;
        Ok((token, urls.jira_base))
    }

    pub async fn create_issue(&self, request: IssueCreate) -> Result<Issue, AppError> {
        let (token, base) = self.authed_base().await?;

        let mut fields = json!({
            "project": {"key": request.project_key},
            "summary": request.title,
            "issuetype": {"name": request.issue_type},
            "labels": request.labels,
        });
        if let Some(description) = &request.description {
            fields["description"] = text_to_adf(description);
        }
        if let Some(priority) = &request.priority {
            fields["priority"] = json!({"name": priority});
        }
        if let Some(assignee) = &request.assignee {
            fields["assignee"] = json!({"id": assignee});
        }

        let response = self
            .http
            .post(format!("{}/issue", base))
            .bearer_auth(&token)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        let response = expect_success(response, "JIRA create issue failed").await?;
        let created: CreatedIssueDoc = parse_json(response, "JIRA create issue failed").await?;

        // Re-fetch for the full normalized view; creation responses only
        // carry id and key.
        self.get_issue(&created.key).await
    }

    pub async fn get_issue(&self, key: &str) -> Result<Issue, AppError> {
        let (token, base) = self.authed_base().await?;

        let response = self
            .http
            .get(format!("{}/issue/{}", base, key))
            .bearer_auth(&token)
            .send()
            .await?;

        let response = expect_success(response, "JIRA get issue failed").await?;
        let doc: IssueDoc = parse_json(response, "JIRA get issue failed").await?;
        Ok(doc.into())
    }

    pub async fn update_issue(&self, key: &str, update: IssueUpdate) -> Result<Issue, AppError> {
        let (token, base) = self.authed_base().await?;

        let mut fields = json!({});
        if let Some(title) = &update.title {
            fields["summary"] = json!(title);
        }
        if let Some(description) = &update.description {
            fields["description"] = text_to_adf(description);
        }
        if let Some(priority) = &update.priority {
            fields["priority"] = json!({"name": priority});
        }
        if let Some(assignee) = &update.assignee {
            fields["assignee"] = json!({"id": assignee});
        }
        if let Some(labels) = &update.labels {
            fields["labels"] = json!(labels);
        }

        let response = self
            .http
            .put(format!("{}/issue/{}", base, key))
            .bearer_auth(&token)
            .json(&json!({ "fields": fields }))
            .send()
            .await?;

        expect_success(response, "JIRA update issue failed").await?;
        self.get_issue(key).await
    }

    pub async fn delete_issue(&self, key: &str) -> Result<(), AppError> {
        let (token, base) = self.authed_base().await?;

        let response = self
            .http
            .delete(format!("{}/issue/{}", base, key))
            .bearer_auth(&token)
            .send()
            .await?;

        expect_success(response, "JIRA delete issue failed").await?;
        Ok(())
    }

    pub async fn search_issues(
        &self,
        request: IssueSearchRequest,
    ) -> Result<Vec<Issue>, AppError> {
        let (token, base) = self.authed_base().await?;

        let payload = json!({
            "jql": request.jql,
            "maxResults": request.max_results.unwrap_or(DEFAULT_SEARCH_LIMIT),
            "fields": ["*all"],
        });

        let response = self
            .http
            .post(format!("{}/search", base))
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await?;

        let response = expect_success(response, "JIRA search failed").await?;
        let results: SearchResultsDoc = parse_json(response, "JIRA search failed").await?;
        Ok(results.issues.into_iter().map(Issue::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_adf_roundtrip() {
        let adf = text_to_adf("Fix the login page");
        assert_eq!(adf["type"], "doc");
        assert_eq!(adf_to_text(&adf), Some("Fix the login page".to_string()));
    }

    #[test]
    fn test_adf_to_text_handles_plain_strings_and_empty_docs() {
        assert_eq!(
            adf_to_text(&json!("plain description")),
            Some("plain description".to_string())
        );
        assert_eq!(adf_to_text(&json!({"type": "doc", "content": []})), None);
    }

    #[test]
    fn test_issue_doc_normalization() {
        let doc: IssueDoc = serde_json::from_value(json!({
            "id": "10001",
            "key": "PROJ-1",
            "fields": {
                "summary": "Broken login",
                "description": {"type": "doc", "version": 1, "content": [
                    {"type": "paragraph", "content": [{"type": "text", "text": "details"}]}
                ]},
                "issuetype": {"name": "Bug"},
                "priority": {"name": "High"},
                "status": {"name": "To Do"},
                "labels": ["auth"],
                "assignee": {"displayName": "Ada", "accountId": "acc-1"},
                "reporter": {"accountId": "acc-2"}
            }
        }))
        .unwrap();

        let issue: Issue = doc.into();
        assert_eq!(issue.key, "PROJ-1");
        assert_eq!(issue.title, "Broken login");
        assert_eq!(issue.description.as_deref(), Some("details"));
        assert_eq!(issue.issue_type.as_deref(), Some("Bug"));
        assert_eq!(issue.assignee.as_deref(), Some("Ada"));
        // Falls back to account id when no display name is present.
        assert_eq!(issue.reporter.as_deref(), Some("acc-2"));
    }

    #[test]
    fn test_issue_doc_requires_summary() {
        let result: Result<IssueDoc, _> = serde_json::from_value(json!({
            "id": "10001",
            "key": "PROJ-1",
            "fields": {}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_issue_create_defaults() {
        let request: IssueCreate = serde_json::from_value(json!({
            "project_key": "PROJ",
            "title": "A task"
        }))
        .unwrap();

        assert_eq!(request.issue_type, "Task");
        assert!(request.labels.is_empty());
        assert!(request.description.is_none());
    }
}
