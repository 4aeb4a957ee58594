use crate::{
    atlassian::{expect_success, parse_json, SiteResolver},
    auth::OAuthService,
    error::AppError,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const DEFAULT_SEARCH_LIMIT: u32 = 50;
const PAGE_EXPAND: &str = "body.storage,version,space,metadata.labels";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCreate {
    pub title: String,
    pub space_key: String,
    pub body: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub version_comment: Option<String>,
}

/// Normalized view of an upstream page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub title: String,
    pub space_key: Option<String>,
    pub body: String,
    pub version: i64,
    pub status: Option<String>,
    pub labels: Vec<String>,
}

// Upstream document shapes, validated at the translation boundary. `id`,
// `title` and `version.number` are hard requirements; everything else
// degrades gracefully.

#[derive(Debug, Deserialize)]
struct PageDoc {
    id: String,
    title: String,
    version: VersionDoc,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    space: Option<SpaceDoc>,
    #[serde(default)]
    body: Option<BodyDoc>,
    #[serde(default)]
    metadata: Option<MetadataDoc>,
}

#[derive(Debug, Deserialize)]
struct VersionDoc {
    number: i64,
}

#[derive(Debug, Deserialize)]
struct SpaceDoc {
    key: String,
}

#[derive(Debug, Deserialize)]
struct BodyDoc {
    #[serde(default)]
    storage: Option<StorageDoc>,
}

#[derive(Debug, Deserialize)]
struct StorageDoc {
    value: String,
}

#[derive(Debug, Deserialize)]
struct MetadataDoc {
    #[serde(default)]
    labels: Option<LabelsDoc>,
}

#[derive(Debug, Deserialize)]
struct LabelsDoc {
    #[serde(default)]
    results: Vec<LabelDoc>,
}

#[derive(Debug, Deserialize)]
struct LabelDoc {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPageDoc {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResultsDoc {
    results: Vec<PageDoc>,
}

impl From<PageDoc> for Page {
    fn from(doc: PageDoc) -> Self {
        Page {
            id: doc.id,
            title: doc.title,
            space_key: doc.space.map(|s| s.key),
            body: doc
                .body
                .and_then(|b| b.storage)
                .map(|s| s.value)
                .unwrap_or_default(),
            version: doc.version.number,
            status: doc.status,
            labels: doc
                .metadata
                .and_then(|m| m.labels)
                .map(|l| l.results.into_iter().map(|label| label.name).collect())
                .unwrap_or_default(),
        }
    }
}

/// Proxy translating internal page operations into Confluence Cloud REST
/// calls. Updates are read-modify-write: the current version is fetched when
/// the caller did not supply enough context, and the submitted version is
/// always `current + 1`.
pub struct ConfluenceService {
    http: Client,
    oauth: Arc<OAuthService>,
    sites: Arc<SiteResolver>,
}

impl ConfluenceService {
    pub fn new(http: Client, oauth: Arc<OAuthService>, sites: Arc<SiteResolver>) -> Self {
        Self { http, oauth, sites }
    }

    async fn authed_base(&self) -> Result<(String, String), AppError> {
        let token = self.oauth.ensure_valid().await?;
        let urls = self.sites.resolve(&token).await?;
        Ok((token, urls.confluence_base))
    }

    pub async fn create_page(&self, request: PageCreate) -> Result<Page, AppError> {
        let (token, base) = self.authed_base().await?;

        let mut payload = json!({
            "type": "page",
            "title": request.title,
            "space": {"key": request.space_key},
            "body": {
                "storage": {
                    "value": request.body,
                    "representation": "storage",
                }
            },
            "metadata": {
                "labels": request.labels.iter()
                    .map(|name| json!({"name": name}))
                    .collect::<Vec<_>>(),
            }
        });
        if let Some(parent_id) = &request.parent_id {
            payload["ancestors"] = json!([{"id": parent_id}]);
        }

        let response = self
            .http
            .post(format!("{}/content", base))
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await?;

        let response = expect_success(response, "Confluence create page failed").await?;
        let created: CreatedPageDoc =
            parse_json(response, "Confluence create page failed").await?;

        self.get_page(&created.id).await
    }

    pub async fn get_page(&self, id: &str) -> Result<Page, AppError> {
        let (token, base) = self.authed_base().await?;

        let response = self
            .http
            .get(format!("{}/content/{}", base, id))
            .query(&[("expand", PAGE_EXPAND)])
            .bearer_auth(&token)
            .send()
            .await?;

        let response = expect_success(response, "Confluence get page failed").await?;
        let doc: PageDoc = parse_json(response, "Confluence get page failed").await?;
        Ok(doc.into())
    }

    pub async fn update_page(&self, id: &str, update: PageUpdate) -> Result<Page, AppError> {
        let current = self.get_page(id).await?;
        let (token, base) = self.authed_base().await?;

        // The version submitted upstream is always the fetched current
        // version plus one; Confluence rejects anything else.
        let mut version = json!({"number": current.version + 1});
        if let Some(comment) = &update.version_comment {
            version["message"] = json!(comment);
        }

        let mut payload = json!({
            "type": "page",
            "title": update.title.as_deref().unwrap_or(&current.title),
            "version": version,
        });
        if let Some(body) = &update.body {
            payload["body"] = json!({
                "storage": {"value": body, "representation": "storage"}
            });
        }

        let response = self
            .http
            .put(format!("{}/content/{}", base, id))
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await?;

        expect_success(response, "Confluence update page failed").await?;

        if let Some(labels) = &update.labels {
            let label_payload: Vec<_> =
                labels.iter().map(|name| json!({"name": name})).collect();
            let response = self
                .http
                .put(format!("{}/content/{}/label", base, id))
                .bearer_auth(&token)
                .json(&label_payload)
                .send()
                .await?;
            expect_success(response, "Confluence update page failed").await?;
        }

        self.get_page(id).await
    }

    pub async fn delete_page(&self, id: &str) -> Result<(), AppError> {
        let (token, base) = self.authed_base().await?;

        let response = self
            .http
            .delete(format!("{}/content/{}", base, id))
            .bearer_auth(&token)
            .send()
            .await?;

        expect_success(response, "Confluence delete page failed").await?;
        Ok(())
    }

    pub async fn search_pages(
        &self,
        cql: &str,
        limit: Option<u32>,
    ) -> Result<Vec<Page>, AppError> {
        let (token, base) = self.authed_base().await?;

        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).to_string();
        let response = self
            .http
            .get(format!("{}/content/search", base))
            .query(&[("cql", cql), ("limit", &limit), ("expand", PAGE_EXPAND)])
            .bearer_auth(&token)
            .send()
            .await?;

        let response = expect_success(response, "Confluence search failed").await?;
        let results: SearchResultsDoc = parse_json(response, "Confluence search failed").await?;
        Ok(results.results.into_iter().map(Page::from).collect())
    }
}
