use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use merch_protocol::product::Product;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::info;

use crate::{ConfigurationError, Rule, RuleManager, RuleManagerResult, RuleParams};

/// Body of `POST /apply`: request parameters plus the candidate set from the search index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplyRequest {
    #[serde(default)]
    pub params: RuleParams,
    #[serde(default)]
    pub candidates: Vec<Product>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResponse {
    pub ids: Vec<String>,
    #[serde(flatten)]
    pub result: RuleManagerResult,
}

impl From<RuleManagerResult> for ApplyResponse {
    fn from(result: RuleManagerResult) -> Self {
        Self {
            ids: result
                .outcome
                .ids()
                .into_iter()
                .map(str::to_string)
                .collect(),
            result,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

#[derive(Clone)]
struct RuleServiceState {
    manager: RuleManager,
}

/// Configuration for the rule API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleServiceConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    "0.0.0.0:8085".to_string()
}

impl Default for RuleServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Helper used by services to compose the REST API router.
#[derive(Clone)]
pub struct RuleApiBuilder {
    state: RuleServiceState,
}

impl RuleApiBuilder {
    pub fn new(manager: RuleManager) -> Self {
        Self {
            state: RuleServiceState { manager },
        }
    }

    pub fn into_router(self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/rules", get(list_rules))
            .route("/rules/:rule_id", get(get_rule))
            .route("/apply", post(apply_rules))
            .with_state(self.state)
    }

    /// Spawns an HTTP server binding to the configured address.
    pub async fn serve(self, config: RuleServiceConfig) -> anyhow::Result<oneshot::Sender<()>> {
        let (tx, rx) = oneshot::channel();
        let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
        let state = self.state.clone();

        tokio::spawn(async move {
            info!(address = %config.bind_address, "starting rule manager service");
            let app = RuleApiBuilder { state }.into_router();
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await
                .ok();
        });

        Ok(tx)
    }
}

async fn health(State(state): State<RuleServiceState>) -> impl IntoResponse {
    let snapshot = state.manager.store().snapshot();
    Json(serde_json::json!({
        "status": "ok",
        "snapshotVersion": snapshot.version,
        "rules": snapshot.len(),
    }))
}

async fn list_rules(State(state): State<RuleServiceState>) -> Json<Vec<Rule>> {
    Json(state.manager.store().snapshot().rules.clone())
}

async fn get_rule(
    State(state): State<RuleServiceState>,
    Path(rule_id): Path<String>,
) -> Result<Json<Rule>, (StatusCode, Json<ErrorResponse>)> {
    state
        .manager
        .store()
        .snapshot()
        .rule(&rule_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| rule_not_found(&rule_id))
}

async fn apply_rules(
    State(state): State<RuleServiceState>,
    Json(payload): Json<ApplyRequest>,
) -> Result<Json<ApplyResponse>, (StatusCode, Json<ErrorResponse>)> {
    state
        .manager
        .process(&payload.params, &payload.candidates)
        .map(ApplyResponse::from)
        .map(Json)
        .map_err(invalid_parameters)
}

fn rule_not_found(id: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            code: "not_found".into(),
            message: format!("rule {} not found", id),
        }),
    )
}

fn invalid_parameters(err: ConfigurationError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            code: "invalid_parameters".into(),
            message: err.to_string(),
        }),
    )
}
