use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::header::{HeaderMap, REFERER, USER_AGENT},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::analytics::ip_extractor::extract_client_ip;
use crate::analytics::tracker::{ClickRequest, ClickTracker};
use crate::redirect::policy::{self, AccessDecision};
use crate::storage::Storage;

// Terminal pages served by the (out-of-scope) web frontend
const NOT_FOUND_PATH: &str = "/404";
const INACTIVE_PATH: &str = "/link-inactive";
const EXPIRED_PATH: &str = "/link-expired";
const PASSWORD_PROMPT_PREFIX: &str = "/p";
const ERROR_PATH: &str = "/error";

pub struct RedirectState {
    pub storage: Arc<dyn Storage>,
    pub tracker: Arc<ClickTracker>,
}

#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    /// Plaintext credential for password-gated links; the prompt page
    /// re-submits the slug with this parameter filled in.
    pub p: Option<String>,
}

/// Resolve a slug and redirect.
///
/// Click accounting runs as a detached task: the response never waits on
/// fingerprinting, geolocation, or analytics writes, and their failures are
/// invisible to the client.
pub async fn redirect_slug(
    State(state): State<Arc<RedirectState>>,
    Path(slug): Path<String>,
    Query(query): Query<RedirectQuery>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Response {
    let link = match state.storage.get_by_slug(&slug).await {
        Ok(Some(link)) => link,
        Ok(None) => return Redirect::temporary(NOT_FOUND_PATH).into_response(),
        Err(err) => {
            tracing::error!(slug = %slug, error = %err, "link lookup failed");
            return Redirect::temporary(ERROR_PATH).into_response();
        }
    };

    match policy::evaluate(&link, query.p.as_deref(), Utc::now().timestamp()) {
        AccessDecision::Inactive => Redirect::temporary(INACTIVE_PATH).into_response(),
        AccessDecision::Expired => Redirect::temporary(EXPIRED_PATH).into_response(),
        AccessDecision::CredentialRequired => {
            Redirect::temporary(&format!("{PASSWORD_PROMPT_PREFIX}/{slug}")).into_response()
        }
        AccessDecision::Allow => {
            let hit = ClickRequest {
                link_id: link.id,
                addr: extract_client_ip(&headers, addr.ip()),
                user_agent: headers
                    .get(USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string(),
                referrer: headers
                    .get(REFERER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
            };

            // Fire and forget; the task owns everything it needs
            let tracker = Arc::clone(&state.tracker);
            tokio::spawn(async move {
                tracker.track(hit).await;
            });

            Redirect::temporary(&link.original_url).into_response()
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}
