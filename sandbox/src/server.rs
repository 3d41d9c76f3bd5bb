//! Axum router and server for the sandbox provider.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use ekyc_types::{SessionCreated, StatusResponse, VerifiedIdentity};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::{SandboxConfig, SandboxError, SessionTable};

/// Shared state for the sandbox handlers.
pub struct SandboxState {
    pub config: SandboxConfig,
    pub sessions: SessionTable,
}

impl SandboxState {
    pub fn new(config: SandboxConfig) -> Self {
        let sessions = SessionTable::new(
            config.auto_verify_after,
            config.identity.clone(),
            config.session_ttl(),
        );
        Self { config, sessions }
    }
}

#[derive(Debug, Deserialize)]
struct FailRequest {
    #[serde(default = "default_fail_reason")]
    reason: String,
}

fn default_fail_reason() -> String {
    "verification rejected".to_string()
}

/// Build the sandbox router.
pub fn router(state: Arc<SandboxState>) -> Router {
    Router::new()
        .route("/ekyc/session", post(create_session))
        .route("/ekyc/session/:id/status", get(session_status))
        .route("/ekyc/session/:id/verify", post(verify_session))
        .route("/ekyc/session/:id/fail", post(fail_session))
        .route("/verify/:id", get(provider_page))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn create_session(
    State(state): State<Arc<SandboxState>>,
) -> Result<Json<SessionCreated>, SandboxError> {
    let session_id = state.sessions.create()?;
    let redirect_url = format!("{}/verify/{}", state.config.public_url(), session_id);
    info!(%session_id, "sandbox session created");
    Ok(Json(SessionCreated {
        session_id,
        redirect_url,
    }))
}

async fn session_status(
    State(state): State<Arc<SandboxState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, SandboxError> {
    let status = state.sessions.poll(&id)?;
    debug!(session_id = %id, status = ?status.status, "sandbox status polled");
    Ok(Json(status))
}

async fn verify_session(
    State(state): State<Arc<SandboxState>>,
    Path(id): Path<String>,
    Json(identity): Json<VerifiedIdentity>,
) -> Result<StatusCode, SandboxError> {
    state.sessions.verify(&id, identity)?;
    info!(session_id = %id, "sandbox session verified");
    Ok(StatusCode::NO_CONTENT)
}

async fn fail_session(
    State(state): State<Arc<SandboxState>>,
    Path(id): Path<String>,
    Json(req): Json<FailRequest>,
) -> Result<StatusCode, SandboxError> {
    state.sessions.fail(&id, req.reason)?;
    info!(session_id = %id, "sandbox session failed");
    Ok(StatusCode::NO_CONTENT)
}

async fn provider_page(Path(id): Path<String>) -> impl IntoResponse {
    // ids are interpolated into a script literal
    let id: String = id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    Html(PROVIDER_PAGE.replace("{{SESSION_ID}}", &id))
}

/// Minimal provider page: completes the session with a fixed identity and
/// notifies the opener.
const PROVIDER_PAGE: &str = r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Sandbox eKYC</title></head>
<body>
<h1>Sandbox identity verification</h1>
<button id="ok">Approve</button>
<button id="no">Reject</button>
<script>
const sessionId = "{{SESSION_ID}}";
const notify = (type) => window.opener && window.opener.postMessage({ type, sessionId }, "*");
document.getElementById("ok").onclick = async () => {
  await fetch(`/ekyc/session/${sessionId}/verify`, {
    method: "POST",
    headers: { "content-type": "application/json" },
    body: JSON.stringify({ fullName: "Nguyen Van A", idNumber: "001234567890", address: "12 Le Loi, Phu Hoi, Hue" }),
  });
  notify("ekyc-verified");
};
document.getElementById("no").onclick = async () => {
  await fetch(`/ekyc/session/${sessionId}/fail`, {
    method: "POST",
    headers: { "content-type": "application/json" },
    body: JSON.stringify({ reason: "rejected in sandbox" }),
  });
  notify("ekyc-close-popup");
};
</script>
</body>
</html>
"#;

/// The sandbox server, configured with shared state.
pub struct SandboxServer {
    state: Arc<SandboxState>,
}

impl SandboxServer {
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            state: Arc::new(SandboxState::new(config)),
        }
    }

    pub fn state(&self) -> Arc<SandboxState> {
        self.state.clone()
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn start(
        &self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), SandboxError> {
        let addr = format!("{}:{}", self.state.config.bind, self.state.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| SandboxError::Server(format!("failed to bind {addr}: {e}")))?;
        self.serve(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves.
    pub async fn serve(
        &self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), SandboxError> {
        if let Ok(addr) = listener.local_addr() {
            info!("sandbox eKYC provider listening on {}", addr);
        }
        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| SandboxError::Server(e.to_string()))
    }
}
