// Open Pockets - Web Server
// REST API with Axum over the same store and components as the CLI

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use open_pockets::remote::{CandidateRegistry, EntityLookup, TextGenerator};
use open_pockets::{
    open_store, summarize, CandidateResolver, ChatCompletionClient, Config, ContributionAggregator,
    DisambiguationPolicy, FecClient, FinanceError, LittleSisClient, Report, ReportAssembler, Resolution, Summary,
    SummaryInput,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Shared application state. The blocking HTTP clients are built before the
/// runtime starts and only used from `spawn_blocking`.
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    fec: Option<Arc<FecClient>>,
    entity_graph: Arc<LittleSisClient>,
    llm: Option<Arc<ChatCompletionClient>>,
    per_page: u32,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Deserialize, Default)]
struct ReportParams {
    /// Look up PAC sponsors in the entity graph
    #[serde(default)]
    enrich: bool,
}

#[derive(Serialize)]
struct PoliticianSummary {
    candidate_id: String,
    summary: Summary,
}

type ApiResult<T> = Result<T, (StatusCode, String)>;

fn status_for(e: &FinanceError) -> StatusCode {
    match e {
        FinanceError::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: ApiResult<T>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
        Err((status, message)) => {
            if status.is_server_error() {
                error!(%status, %message, "request failed");
            }
            (status, Json(ApiResponse::<T>::err(message))).into_response()
        }
    }
}

/// Run a store-bound closure on the blocking pool
async fn with_store<T, F>(state: AppState, work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Connection, &AppState) -> open_pockets::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || -> ApiResult<T> {
        let conn = state
            .db
            .lock()
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "store lock poisoned".to_string()))?;
        work(&conn, &state).map_err(|e| (status_for(&e), e.to_string()))
    })
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("worker failed: {}", e)))?
}

fn resolve(conn: &Connection, state: &AppState, name: &str) -> open_pockets::Result<Resolution> {
    let mut resolver = CandidateResolver::new(conn);
    if let Some(fec) = &state.fec {
        resolver = resolver.with_registry(
            fec.as_ref() as &dyn CandidateRegistry,
            DisambiguationPolicy::AutoSelect,
            state.per_page,
        );
    }
    resolver
        .resolve_detailed(name)?
        .ok_or_else(|| FinanceError::NotFound(format!("no candidate matches '{}'", name)))
}

fn build_report(conn: &Connection, state: &AppState, candidate_id: &str, enrich: bool) -> Report {
    let assembler = ReportAssembler::new(conn);
    if enrich {
        assembler
            .with_entity_lookup(state.entity_graph.as_ref() as &dyn EntityLookup)
            .build_report(candidate_id)
    } else {
        assembler.build_report(candidate_id)
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/resolve/:name - Candidate id for a free-text name
async fn resolve_name(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    respond(with_store(state, move |conn, state| resolve(conn, state, &name)).await)
}

/// GET /api/report/:candidate_id - Money report for a known id
async fn report_by_id(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
    Query(params): Query<ReportParams>,
) -> Response {
    respond(
        with_store(state, move |conn, state| {
            if open_pockets::db::get_candidate(conn, &candidate_id)?.is_none() {
                return Err(FinanceError::NotFound(format!("unknown candidate id '{}'", candidate_id)));
            }
            Ok(build_report(conn, state, &candidate_id, params.enrich))
        })
        .await,
    )
}

/// GET /api/politicians/:name/report - Resolve, then report
async fn politician_report(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<ReportParams>,
) -> Response {
    respond(
        with_store(state, move |conn, state| {
            let resolution = resolve(conn, state, &name)?;
            Ok(build_report(conn, state, &resolution.candidate_id, params.enrich))
        })
        .await,
    )
}

/// GET /api/politicians/:name/summary - Resolve, then narrative summary
async fn politician_summary(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    respond(
        with_store(state, move |conn, state| {
            let resolution = resolve(conn, state, &name)?;
            let input = SummaryInput::for_candidate(&ContributionAggregator::new(conn), &resolution.candidate_id)?;
            let generator = state.llm.as_deref().map(|g| g as &dyn TextGenerator);
            Ok(PoliticianSummary {
                candidate_id: resolution.candidate_id,
                summary: summarize(&input, generator),
            })
        })
        .await,
    )
}

// ============================================================================
// Main Server
// ============================================================================

fn build_state(conn: Connection, config: &Config) -> anyhow::Result<AppState> {
    let fec = if config.offline {
        None
    } else {
        Some(Arc::new(FecClient::new(&config.fec, config.http_timeout_secs)?))
    };
    let llm = match &config.llm {
        Some(llm) => Some(Arc::new(ChatCompletionClient::new(llm, config.http_timeout_secs)?)),
        None => None,
    };

    Ok(AppState {
        db: Arc::new(Mutex::new(conn)),
        fec,
        entity_graph: Arc::new(LittleSisClient::new(&config.entity_graph_base_url, config.http_timeout_secs)?),
        llm,
        per_page: config.fec.per_page,
    })
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/resolve/:name", get(resolve_name))
        .route("/report/:candidate_id", get(report_by_id))
        .route("/politicians/:name/report", get(politician_report))
        .route("/politicians/:name/summary", get(politician_summary))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}

async fn serve(state: AppState, addr: String) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/politicians/Tom%20Cotton/report", addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🌐 Open Pockets - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = Config::from_env()?;
    let addr = std::env::var("OPEN_POCKETS_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    let conn = open_store(&config.db_path)?;
    info!(db = %config.db_path.display(), "store opened");

    // Blocking clients must be created and dropped outside the async runtime
    let state = build_state(conn, &config)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let served = runtime.block_on(serve(state.clone(), addr));
    drop(runtime);
    drop(state);

    served
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use open_pockets::db::{insert_link, open_in_memory_store, upsert_candidate, upsert_committee};
    use open_pockets::{Candidate, CandidateCommitteeLink, CandidateSource, Committee, ConfigBuilder};
    use serde_json::Value;
    use tower::ServiceExt;

    fn seeded_state() -> AppState {
        let conn = open_in_memory_store().unwrap();
        upsert_candidate(
            &conn,
            CandidateSource::Master,
            &Candidate::new("H2AR04083", "COTTON, THOMAS").with_office("H").with_years(&[2012]),
        )
        .unwrap();
        upsert_committee(&conn, &Committee::new("C00550000", "REPUBLIC PAC", "Q", 2024).with_designation("D")).unwrap();
        insert_link(
            &conn,
            &CandidateCommitteeLink {
                linkage_id: "100".to_string(),
                candidate_id: "H2AR04083".to_string(),
                candidate_election_year: 2024,
                fec_election_year: 2024,
                committee_id: "C00550000".to_string(),
                committee_type: "Q".to_string(),
                committee_designation: "D".to_string(),
                year: 2024,
            },
        )
        .unwrap();

        let config = ConfigBuilder::new("unused.db").offline(true).build().unwrap();
        build_state(conn, &config).unwrap()
    }

    /// Runs one request on a fresh runtime; the state is dropped after it
    fn get(state: &AppState, uri: &str) -> (StatusCode, Value) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime.block_on(async {
            let response = router(state.clone())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, serde_json::from_slice(&bytes).unwrap())
        });
        drop(runtime);
        result
    }

    #[test]
    fn test_health_envelope() {
        let state = seeded_state();
        let (status, body) = get(&state, "/api/health");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], "OK");
        assert!(body.get("error").is_none());
    }

    #[test]
    fn test_report_by_id() {
        let state = seeded_state();
        let (status, body) = get(&state, "/api/report/H2AR04083");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["candidate_id"], "H2AR04083");
        assert_eq!(body["data"]["summary_stats"]["total_pacs_connected"], 1);
        assert_eq!(body["data"]["pacs_by_category"]["traditional_pacs"][0]["committee_id"], "C00550000");
    }

    #[test]
    fn test_missing_candidate_is_not_found() {
        let state = seeded_state();

        let (status, body) = get(&state, "/api/report/P99999999");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert!(body.get("data").is_none());
        assert!(body["error"].as_str().unwrap().contains("P99999999"));

        // Offline, an unknown name has no registry fallback
        let (status, body) = get(&state, "/api/politicians/Nobody%20Atall/report");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[test]
    fn test_resolve_by_name() {
        let state = seeded_state();
        let (status, body) = get(&state, "/api/resolve/Thomas%20Cotton");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["candidate_id"], "H2AR04083");
        assert_eq!(body["data"]["confidence"], "high");
    }
}
