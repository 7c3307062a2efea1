use axum::{
    body::Bytes,
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::article::ArticleCounters;
use crate::domain::interaction::{Interaction, InteractionType, ToggleAction, ToggleIntent};
use crate::http::{AppError, AuthUser};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let (store, cache) = state.interactions.health().await;
    let status = if store && cache { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    #[serde(default, alias = "articleId")]
    pub article_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
}

/// Validated form of [`ToggleRequest`].
#[derive(Debug, PartialEq, Eq)]
pub struct ToggleCommand {
    pub article_id: Uuid,
    pub kind: InteractionType,
    pub intent: ToggleIntent,
}

impl ToggleRequest {
    pub fn validate(self) -> Result<ToggleCommand, AppError> {
        let article_id = self
            .article_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::bad_request("article_id is required"))?;
        let article_id = parse_uuid(article_id, "article_id")?;

        let kind = self
            .kind
            .as_deref()
            .ok_or_else(|| AppError::bad_request("type is required"))?;
        let kind = InteractionType::from_db(kind).ok_or_else(|| {
            AppError::bad_request(format!("invalid interaction type: {}", kind))
                .with_details("type must be one of: like, save, share")
        })?;

        let intent = match self.action.as_deref() {
            None => ToggleIntent::Toggle,
            Some(action) => ToggleIntent::parse(action).ok_or_else(|| {
                AppError::bad_request(format!("invalid action: {}", action))
                    .with_details("action must be one of: toggle, add, remove")
            })?,
        };

        Ok(ToggleCommand {
            article_id,
            kind,
            intent,
        })
    }
}

pub async fn toggle_interaction(
    State(state): State<AppState>,
    auth: AuthUser,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::bad_request("request body is required"));
    }
    let request: ToggleRequest = serde_json::from_slice(&body).map_err(|err| {
        AppError::bad_request("invalid request body").with_details(err.to_string())
    })?;
    let command = request.validate()?;

    let outcome = state
        .interactions
        .toggle(auth.user_id, command.article_id, command.kind, command.intent)
        .await
        .map_err(|err| {
            tracing::error!(
                error = ?err,
                user_id = %auth.user_id,
                article_id = %command.article_id,
                kind = %command.kind,
                "failed to toggle interaction"
            );
            AppError::internal("failed to update interaction")
        })?
        .ok_or_else(|| AppError::not_found("article not found"))?;

    let message = match outcome.action {
        ToggleAction::Added => format!("{} added", command.kind),
        ToggleAction::Removed => format!("{} removed", command.kind),
        ToggleAction::Unchanged => format!("{} unchanged", command.kind),
    };

    let mut body = json!({
        "success": true,
        "action": outcome.action.as_str(),
        "message": message,
        "counters": outcome.counters,
    });
    body[command.kind.as_db()] = Value::Bool(outcome.active);

    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
pub struct ListInteractionsQuery {
    #[serde(default, rename = "articleIds", alias = "article_ids")]
    pub article_ids: Option<String>,
}

#[derive(Serialize)]
pub struct ListInteractionsResponse {
    pub success: bool,
    pub interactions: Vec<Interaction>,
    pub count: usize,
}

pub async fn list_interactions(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Result<Query<ListInteractionsQuery>, QueryRejection>,
) -> Result<Json<ListInteractionsResponse>, AppError> {
    let Query(query) = query.map_err(query_error)?;
    let article_ids = query
        .article_ids
        .as_deref()
        .map(parse_id_list)
        .transpose()?;

    let interactions = state
        .interactions
        .list(auth.user_id, article_ids.as_deref())
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, "failed to list interactions");
            AppError::internal("failed to list interactions")
        })?;

    Ok(Json(ListInteractionsResponse {
        success: true,
        count: interactions.len(),
        interactions,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteInteractionsQuery {
    #[serde(default, rename = "articleId", alias = "article_id")]
    pub article_id: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteInteractionsResponse {
    pub success: bool,
    pub deleted: u64,
    pub message: String,
}

pub async fn delete_interactions(
    State(state): State<AppState>,
    auth: AuthUser,
    query: Result<Query<DeleteInteractionsQuery>, QueryRejection>,
) -> Result<Json<DeleteInteractionsResponse>, AppError> {
    let Query(query) = query.map_err(query_error)?;
    let article_id = query
        .article_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| parse_uuid(value, "articleId"))
        .transpose()?;

    let deleted = state
        .interactions
        .delete(auth.user_id, article_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, user_id = %auth.user_id, "failed to delete interactions");
            AppError::internal("failed to delete interactions")
        })?;

    Ok(Json(DeleteInteractionsResponse {
        success: true,
        deleted,
        message: format!("deleted {} interactions", deleted),
    }))
}

#[derive(Serialize)]
pub struct CountersResponse {
    pub success: bool,
    pub counters: ArticleCounters,
}

pub async fn article_counters(
    path: Result<Path<String>, PathRejection>,
    State(state): State<AppState>,
) -> Result<Json<CountersResponse>, AppError> {
    let Path(id) = path.map_err(|rejection| {
        AppError::bad_request("invalid article id").with_details(rejection.body_text())
    })?;
    let article_id = parse_uuid(&id, "article id")?;

    let counters = state
        .interactions
        .counters(article_id)
        .await
        .map_err(|err| {
            tracing::error!(error = ?err, article_id = %article_id, "failed to load counters");
            AppError::internal("failed to load counters")
        })?
        .ok_or_else(|| AppError::not_found("article not found"))?;

    Ok(Json(CountersResponse {
        success: true,
        counters,
    }))
}

fn query_error(rejection: QueryRejection) -> AppError {
    AppError::bad_request("invalid query string").with_details(rejection.body_text())
}

fn parse_uuid(value: &str, field: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value).map_err(|_| AppError::bad_request(format!("invalid {}", field)))
}

/// Comma-separated ids; blank segments are skipped.
fn parse_id_list(raw: &str) -> Result<Vec<Uuid>, AppError> {
    raw.split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| parse_uuid(segment, "articleIds"))
        .collect()
}
