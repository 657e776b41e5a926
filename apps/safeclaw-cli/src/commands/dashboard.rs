// dashboard.rs: Localhost JSON dashboard over the runner, ledger, and planner.
//
// Every route requires `Authorization: Bearer <token>`, where the token is
// generated once per project and stored in `.safeclaw/dashboard_token`.
// Authorized requests are recorded in the audit ledger. Ledger reads,
// capability runs, and planner calls are blocking and go through
// `spawn_blocking`.

use std::fs;
use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use sc_audit::{AuditEvent, AuditLedger, AuditStatus, AUDIT_DIR};
use sc_planner::{validate, PlanStep, Planner};
use sc_plugins::CapabilityRegistry;
use sc_policy::Policy;
use sc_runner::{RunFailure, RunResult, Runner};

pub const TOKEN_FILE: &str = "dashboard_token";

/// Random bytes in a dashboard token before encoding.
const TOKEN_BYTES: usize = 32;

const DEFAULT_PER_PAGE: usize = 20;
const MAX_PER_PAGE: usize = 200;

struct DashboardState {
    policy: Policy,
    registry: CapabilityRegistry,
    token: String,
}

/// Error response: a status code and a JSON `{"error": ...}` body.
#[derive(Debug)]
struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct AuditQuery {
    page: Option<usize>,
    per_page: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RunRequest {
    plugin: String,
    #[serde(default = "default_target")]
    target: String,
}

fn default_target() -> String {
    ".".to_string()
}

#[derive(Debug, Deserialize)]
struct PlanRequest {
    task: String,
}

#[derive(Debug, Serialize)]
struct PlanResponse {
    steps: Vec<PlanStep>,
    validated: bool,
    rejected_steps: Vec<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
struct PluginView {
    name: String,
    description: String,
    allowed: bool,
}

/// Read the project's dashboard token, creating it on first use.
pub fn load_or_create_token(project_root: &Path) -> anyhow::Result<String> {
    let dir = project_root.join(AUDIT_DIR);
    let path = dir.join(TOKEN_FILE);
    if path.exists() {
        let token = fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        return Ok(token.trim().to_string());
    }

    fs::create_dir_all(&dir).with_context(|| format!("cannot create {}", dir.display()))?;
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = URL_SAFE_NO_PAD.encode(bytes);
    write_private(&path, &token).with_context(|| format!("cannot write {}", path.display()))?;
    tracing::info!("created dashboard token at {}", path.display());
    Ok(token)
}

fn write_private(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)?.write_all(contents.as_bytes())
}

/// Exact match against `Bearer <token>`.
fn is_authorized(headers: &HeaderMap, token: &str) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value == format!("Bearer {token}"))
}

fn ledger(state: &DashboardState) -> AuditLedger {
    AuditLedger::for_project(state.policy.resolved_root())
}

async fn require_token(
    State(state): State<Arc<DashboardState>>,
    request: Request,
    next: Next,
) -> Response {
    if !is_authorized(request.headers(), &state.token) {
        tracing::warn!("rejected unauthenticated {} {}", request.method(), request.uri().path());
        return AppError(StatusCode::UNAUTHORIZED, "Invalid or missing token".into()).into_response();
    }

    let detail = format!("{} {}", request.method(), request.uri().path());
    let audit_state = state.clone();
    let recorded = tokio::task::spawn_blocking(move || {
        ledger(&audit_state).append(AuditEvent::new("dashboard", AuditStatus::Ok).with_detail(detail))
    })
    .await;
    match recorded {
        Ok(Ok(())) => next.run(request).await,
        Ok(Err(e)) => {
            tracing::error!("dashboard request not audited: {}", e);
            AppError(StatusCode::SERVICE_UNAVAILABLE, "audit ledger unavailable".into()).into_response()
        }
        Err(e) => AppError::from(e).into_response(),
    }
}

async fn get_policy(State(state): State<Arc<DashboardState>>) -> Json<Policy> {
    Json(state.policy.clone())
}

async fn get_audit(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<AuditQuery>,
) -> Result<Response, AppError> {
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE).min(MAX_PER_PAGE);
    let result = tokio::task::spawn_blocking(move || ledger(&state).read_page(page, per_page)).await?;
    match result {
        Ok(page) => Ok(Json(page).into_response()),
        Err(e) => Err(AppError(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

fn plugin_listing(state: &DashboardState) -> Vec<PluginView> {
    state
        .registry
        .describe()
        .into_iter()
        .map(|info| PluginView {
            allowed: state.policy.is_capability_allowed(&info.name),
            name: info.name,
            description: info.description,
        })
        .collect()
}

async fn get_plugins(State(state): State<Arc<DashboardState>>) -> Json<Vec<PluginView>> {
    Json(plugin_listing(&state))
}

/// Run a capability for a dashboard request. Targets are relative to the
/// project root. The runner records the attempt, including denials, which
/// surface as 403.
fn run_request(state: &DashboardState, request: &RunRequest) -> Result<RunResult, AppError> {
    let target: PathBuf = state.policy.resolved_root().join(&request.target);
    let result = Runner::new(&state.policy, &state.registry).run(&request.plugin, target);
    if matches!(result.failure, Some(RunFailure::Denied { .. })) {
        return Err(AppError(StatusCode::FORBIDDEN, result.message));
    }
    Ok(result)
}

async fn post_run(
    State(state): State<Arc<DashboardState>>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResult>, AppError> {
    let result = tokio::task::spawn_blocking(move || run_request(&state, &request)).await??;
    Ok(Json(result))
}

/// Record the task, then plan and validate it.
fn plan_request(state: &DashboardState, request: &PlanRequest) -> Result<PlanResponse, AppError> {
    ledger(state)
        .append(
            AuditEvent::new("dashboard", AuditStatus::Request)
                .with_detail(format!("POST /api/plan task={}", request.task)),
        )
        .map_err(|e| AppError(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    let plan = Planner::new(&state.policy)
        .plan(&request.task)
        .map_err(|e| AppError(StatusCode::BAD_REQUEST, e.to_string()))?;
    let validation = validate(&plan, &state.policy);
    Ok(PlanResponse {
        steps: plan.steps,
        validated: validation.validated,
        rejected_steps: validation.rejected_steps,
    })
}

async fn post_plan(
    State(state): State<Arc<DashboardState>>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<PlanResponse>, AppError> {
    let response = tokio::task::spawn_blocking(move || plan_request(&state, &request)).await??;
    Ok(Json(response))
}

fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/api/policy", get(get_policy))
        .route("/api/audit", get(get_audit))
        .route("/api/plugins", get(get_plugins))
        .route("/api/run", post(post_run))
        .route("/api/plan", post(post_plan))
        .layer(middleware::from_fn_with_state(state.clone(), require_token))
        .with_state(state)
}

fn is_loopback_host(host: &str) -> bool {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    host.eq_ignore_ascii_case("localhost")
        || host
            .parse::<std::net::IpAddr>()
            .map(|ip| ip.is_loopback())
            .unwrap_or(false)
}

pub fn execute(policy: Policy, registry: CapabilityRegistry, port: Option<u16>) -> anyhow::Result<()> {
    if !policy.dashboard.enabled {
        anyhow::bail!(
            "Dashboard is disabled in policy.yaml. Set dashboard.enabled: true to use this feature."
        );
    }
    let host = policy.dashboard.host.clone();
    if !is_loopback_host(&host) {
        anyhow::bail!("Dashboard host '{}' is not a loopback address", host);
    }
    let port = port.unwrap_or(policy.dashboard.port);
    let token = load_or_create_token(&policy.resolved_root())?;

    let bind_host = if host.eq_ignore_ascii_case("localhost") {
        "127.0.0.1".to_string()
    } else {
        host.trim_start_matches('[').trim_end_matches(']').to_string()
    };
    let ip: std::net::IpAddr = bind_host.parse()?;
    let addr = SocketAddr::new(ip, port);

    println!("SafeClaw Dashboard");
    println!("  URL:   http://{}", addr);
    println!("  Token: {}", token);

    let state = Arc::new(DashboardState {
        policy,
        registry,
        token,
    });

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("dashboard listening on http://{}", addr);
        axum::serve(listener, router(state)).await?;
        Ok::<(), anyhow::Error>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use tempfile::tempdir;

    fn state(root: &Path) -> DashboardState {
        DashboardState {
            policy: Policy::new(root).with_allowed_capabilities(["repo_stats"]),
            registry: CapabilityRegistry::builtin(),
            token: "secret-token".into(),
        }
    }

    #[test]
    fn token_is_created_once_and_reused() {
        let dir = tempdir().unwrap();
        let first = load_or_create_token(dir.path()).unwrap();
        let second = load_or_create_token(dir.path()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 43);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert!(dir.path().join(".safeclaw/dashboard_token").is_file());
    }

    #[test]
    fn authorization_requires_exact_bearer_match() {
        let mut headers = HeaderMap::new();
        assert!(!is_authorized(&headers, "abc"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert!(is_authorized(&headers, "abc"));

        for wrong in ["bearer abc", "Bearer abcd", "Bearer  abc", "abc", "Basic abc"] {
            headers.insert(header::AUTHORIZATION, HeaderValue::from_static(wrong));
            assert!(!is_authorized(&headers, "abc"), "{wrong} should be rejected");
        }
    }

    #[test]
    fn plugin_listing_marks_allowed_entries() {
        let dir = tempdir().unwrap();
        let listing = plugin_listing(&state(dir.path()));
        assert_eq!(listing.len(), 5);
        let allowed: Vec<&str> = listing
            .iter()
            .filter(|p| p.allowed)
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(allowed, ["repo_stats"]);
    }

    #[test]
    fn run_request_rejects_disallowed_plugin() {
        let dir = tempdir().unwrap();
        let request = RunRequest {
            plugin: "todo_scan".into(),
            target: ".".into(),
        };
        let err = run_request(&state(dir.path()), &request).unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
        assert!(err.1.contains("todo_scan"));

        let events = AuditLedger::for_project(dir.path()).read_all().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, "todo_scan");
        assert_eq!(events[0].status, AuditStatus::Denied);
    }

    #[test]
    fn plan_request_records_task_even_when_planner_is_disabled() {
        let dir = tempdir().unwrap();
        let request = PlanRequest {
            task: "find leftover TODOs".into(),
        };
        let err = plan_request(&state(dir.path()), &request).unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let events = AuditLedger::for_project(dir.path()).read_all().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, "dashboard");
        assert!(events[0].detail.contains("task=find leftover TODOs"));
    }

    #[test]
    fn run_request_resolves_target_under_root() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        let request = RunRequest {
            plugin: "repo_stats".into(),
            target: default_target(),
        };
        let result = run_request(&state(dir.path()), &request).unwrap();
        assert!(result.ok, "{}", result.message);
        assert!(result.message.contains("Total files: 1"));
    }

    #[test]
    fn only_loopback_hosts_are_accepted() {
        assert!(is_loopback_host("127.0.0.1"));
        assert!(is_loopback_host("localhost"));
        assert!(is_loopback_host("::1"));
        assert!(!is_loopback_host("0.0.0.0"));
        assert!(!is_loopback_host("192.168.1.10"));
    }
}
