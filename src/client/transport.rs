use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::client::error::ClientError;
use crate::domain::article::ArticleCounters;
use crate::domain::interaction::{Interaction, InteractionType};

/// Server-confirmed result of a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerToggle {
    pub active: bool,
    pub counters: Option<ArticleCounters>,
}

#[async_trait]
pub trait InteractionTransport: Send + Sync {
    async fn toggle(
        &self,
        article_id: Uuid,
        kind: InteractionType,
    ) -> Result<ServerToggle, ClientError>;

    /// The caller's interactions, limited to `article_ids`.
    async fn fetch(&self, article_ids: &[Uuid]) -> Result<Vec<Interaction>, ClientError>;

    async fn counters(&self, article_id: Uuid) -> Result<ArticleCounters, ClientError>;
}

#[derive(Debug, Clone)]
pub enum Credentials {
    Bearer(String),
    UserId(Uuid),
}

#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

#[derive(Deserialize)]
struct ListBody {
    interactions: Vec<Interaction>,
}

#[derive(Deserialize)]
struct CountersBody {
    counters: ArticleCounters,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, credentials)
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            credentials,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::Bearer(token) => request.bearer_auth(token),
            Credentials::UserId(user_id) => request.header("user-id", user_id.to_string()),
        }
    }
}

async fn read_json(response: Response) -> Result<Value, ClientError> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if !status.is_success() {
        let message = body["error"]
            .as_str()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
            .to_string();
        return Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        });
    }
    Ok(body)
}

#[async_trait]
impl InteractionTransport for HttpTransport {
    async fn toggle(
        &self,
        article_id: Uuid,
        kind: InteractionType,
    ) -> Result<ServerToggle, ClientError> {
        let request = self
            .http
            .post(format!("{}/api/interactions", self.base_url))
            .json(&json!({
                "article_id": article_id,
                "type": kind.as_db(),
                "action": "toggle",
            }));
        let body = read_json(self.authorize(request).send().await?).await?;

        let active = body[kind.as_db()]
            .as_bool()
            .ok_or_else(|| ClientError::Decode(format!("missing `{}` flag", kind)))?;
        let counters = serde_json::from_value(body["counters"].clone()).ok();

        Ok(ServerToggle { active, counters })
    }

    async fn fetch(&self, article_ids: &[Uuid]) -> Result<Vec<Interaction>, ClientError> {
        let ids = article_ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let request = self
            .http
            .get(format!("{}/api/interactions", self.base_url))
            .query(&[("articleIds", ids)]);
        let body = read_json(self.authorize(request).send().await?).await?;

        let list: ListBody =
            serde_json::from_value(body).map_err(|err| ClientError::Decode(err.to_string()))?;
        Ok(list.interactions)
    }

    async fn counters(&self, article_id: Uuid) -> Result<ArticleCounters, ClientError> {
        let request = self
            .http
            .get(format!("{}/api/articles/{}/counters", self.base_url, article_id));
        let body = read_json(request.send().await?).await?;

        let body: CountersBody =
            serde_json::from_value(body).map_err(|err| ClientError::Decode(err.to_string()))?;
        Ok(body.counters)
    }
}
