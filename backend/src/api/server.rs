//! HTTP server for quote generation.
//!
//! # API Endpoints
//!
//! | Method | Path               | Description                                  |
//! |--------|--------------------|----------------------------------------------|
//! | GET    | `/health`          | Health check                                 |
//! | POST   | `/api/quote`       | Upload workbook(s), download the `.docx`     |
//! | POST   | `/api/quote/sheet` | Build a quote from a public Google Sheet     |
//! | GET    | `/api/logs`        | SSE stream for real-time logs                |

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderMap, HeaderName, Method},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use super::logs::{log_error, log_info, log_warning, LOG_BROADCASTER};
use super::types::{QuoteSummary, SheetRequest, JOB_ID_HEADER, SECRET_HEADER, WARNINGS_HEADER};
use crate::config::QuoteConfig;
use crate::error::{ServerError, ServerResult};
use crate::sheets::{parse_spreadsheet_id, SheetFetcher};
use crate::transform::pipeline::{QuoteOutput, QuotePipeline};

/// Largest accepted request body.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Env var holding the optional shared secret for `/api/quote/sheet`.
pub const SHEET_SECRET_ENV: &str = "SHEET_SECRET";

/// Shared, immutable server state.
#[derive(Clone)]
pub struct AppState {
    pipeline: Arc<QuotePipeline>,
    fetcher: SheetFetcher,
    sheet_secret: Option<String>,
}

impl AppState {
    pub fn new(config: QuoteConfig, sheet_secret: Option<String>) -> Self {
        Self {
            pipeline: Arc::new(QuotePipeline::new(config)),
            fetcher: SheetFetcher::new(),
            sheet_secret: sheet_secret.filter(|s| !s.is_empty()),
        }
    }

    fn check_secret(&self, headers: &HeaderMap) -> ServerResult<()> {
        let Some(expected) = &self.sheet_secret else {
            return Ok(());
        };
        let supplied = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if supplied == Some(expected.as_str()) {
            Ok(())
        } else {
            Err(ServerError::Unauthorized)
        }
    }
}

/// Build the router with CORS and body limits applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(SECRET_HEADER),
        ])
        .expose_headers([
            header::CONTENT_TYPE,
            header::CONTENT_DISPOSITION,
            HeaderName::from_static(JOB_ID_HEADER),
            HeaderName::from_static(WARNINGS_HEADER),
        ]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/quote", post(quote_upload))
        .route("/api/quote/sheet", post(quote_sheet))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(port: u16, config: QuoteConfig) -> Result<(), Box<dyn std::error::Error>> {
    let secret = std::env::var(SHEET_SECRET_ENV).ok();
    let protected = secret.as_deref().is_some_and(|s| !s.is_empty());
    let app = router(AppState::new(config, secret));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Quote server running on http://localhost:{}", port);
    println!("   POST /api/quote       - Upload workbook (file, or client_file + premium_file)");
    println!(
        "   POST /api/quote/sheet - Quote from Google Sheet{}",
        if protected { " (secret required)" } else { "" }
    );
    println!("   GET  /api/logs        - SSE log stream");
    println!("   GET  /health          - Health check");
    println!();

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "termquote",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "quote": "POST /api/quote",
            "sheet": "POST /api/quote/sheet",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers skip the entries they missed.
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// A file received in a multipart field.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: Option<String>,
    pub bytes: Bytes,
}

/// The multipart fields this server understands.
#[derive(Debug, Default)]
pub struct Uploads {
    pub file: Option<UploadedFile>,
    pub client_file: Option<UploadedFile>,
    pub premium_file: Option<UploadedFile>,
}

/// What to run once the upload is in.
#[derive(Debug)]
pub enum UploadJob {
    Combined(UploadedFile),
    Parts { client: UploadedFile, premiums: UploadedFile },
}

impl Uploads {
    /// A combined workbook wins; otherwise both parts are required.
    pub fn into_job(self) -> ServerResult<UploadJob> {
        match self {
            Uploads { file: Some(file), .. } => Ok(UploadJob::Combined(file)),
            Uploads {
                client_file: Some(client),
                premium_file: Some(premiums),
                ..
            } => Ok(UploadJob::Parts { client, premiums }),
            Uploads { client_file: Some(_), .. } => {
                Err(ServerError::BadRequest("premium_file is missing".to_string()))
            }
            Uploads { premium_file: Some(_), .. } => {
                Err(ServerError::BadRequest("client_file is missing".to_string()))
            }
            _ => Err(ServerError::BadRequest("No file provided".to_string())),
        }
    }
}

async fn read_uploads(mut multipart: Multipart) -> ServerResult<Uploads> {
    let mut uploads = Uploads::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        let name = field.file_name().map(|s| s.to_string());
        let slot = match field_name.as_str() {
            "file" => &mut uploads.file,
            "client_file" => &mut uploads.client_file,
            "premium_file" => &mut uploads.premium_file,
            _ => continue,
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
        if !bytes.is_empty() {
            *slot = Some(UploadedFile { name, bytes });
        }
    }

    Ok(uploads)
}

/// Upload endpoint: one combined workbook, or a client file plus a premium file.
async fn quote_upload(State(state): State<AppState>, multipart: Multipart) -> Result<Response, ServerError> {
    let job_id = Uuid::new_v4().to_string();
    let job = read_uploads(multipart).await?.into_job()?;

    println!("\n{}", "=".repeat(70));
    let output = match job {
        UploadJob::Combined(file) => {
            println!(
                "📄 NEW QUOTE: {} ({} bytes)",
                file.name.as_deref().unwrap_or("unknown"),
                file.bytes.len()
            );
            println!("{}\n", "=".repeat(70));

            let UploadedFile { name, bytes } = file;
            let output = run_pipeline(&state, move |p| p.generate(&bytes)).await?;
            match name.as_deref() {
                Some(name) => output.with_source_name(name),
                None => output,
            }
        }
        UploadJob::Parts { client, premiums } => {
            println!(
                "📄 NEW QUOTE: {} + {}",
                client.name.as_deref().unwrap_or("client"),
                premiums.name.as_deref().unwrap_or("premiums")
            );
            println!("{}\n", "=".repeat(70));

            let now = chrono::Local::now().naive_local();
            run_pipeline(&state, move |p| p.generate_from_parts(&client.bytes, &premiums.bytes, now)).await?
        }
    };

    Ok(docx_response(&job_id, output))
}

/// Sheet endpoint: download a public spreadsheet and quote it.
async fn quote_sheet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SheetRequest>,
) -> Result<Response, ServerError> {
    state.check_secret(&headers)?;

    let source = request
        .source()
        .ok_or_else(|| ServerError::BadRequest("spreadsheet_id or url is required".to_string()))?;
    let id = parse_spreadsheet_id(source)?;
    let job_id = Uuid::new_v4().to_string();

    println!("\n{}", "=".repeat(70));
    println!("📄 NEW SHEET QUOTE: {}", id);
    println!("{}\n", "=".repeat(70));

    let bytes = state.fetcher.fetch_xlsx(&id).await.inspect_err(|e| log_error(e.to_string()))?;
    let output = run_pipeline(&state, move |p| p.generate(&bytes)).await?;

    Ok(docx_response(&job_id, output))
}

/// Run the synchronous pipeline off the async executor.
async fn run_pipeline<F>(state: &AppState, job: F) -> ServerResult<QuoteOutput>
where
    F: FnOnce(&QuotePipeline) -> crate::error::PipelineResult<QuoteOutput> + Send + 'static,
{
    let pipeline = Arc::clone(&state.pipeline);
    let result = tokio::task::spawn_blocking(move || job(pipeline.as_ref()))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    result.map_err(|e| {
        log_error(format!("Quote failed: {}", e));
        ServerError::from(e)
    })
}

fn docx_response(job_id: &str, output: QuoteOutput) -> Response {
    let summary = QuoteSummary::new(job_id, &output);

    println!("\n{}", "=".repeat(70));
    println!("📊 SUMMARY");
    println!("{}", "=".repeat(70));
    println!("   Job:       {}", summary.job_id);
    println!("   File:      {}", summary.file_name);
    println!("   Sections:  {}", summary.sections);
    println!("   Warnings:  {}", summary.warnings.len());
    println!("{}\n", "=".repeat(70));

    if summary.warnings.is_empty() {
        log_info(format!("Quote ready: {}", summary.file_name));
    } else {
        log_warning(format!(
            "Quote ready with {} warning(s): {}",
            summary.warnings.len(),
            summary.file_name
        ));
    }

    (summary.headers(), output.rendered.bytes).into_response()
}
