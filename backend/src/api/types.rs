//! REST API types.
//!
//! Successful quote requests answer with the `.docx` itself; the summary
//! travels in response headers. Failures answer with a JSON error body.

use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{PipelineError, ServerError};
use crate::transform::pipeline::QuoteOutput;

/// MIME type of generated quotes.
pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub const JOB_ID_HEADER: &str = "x-job-id";
pub const WARNINGS_HEADER: &str = "x-quote-warnings";
pub const SECRET_HEADER: &str = "x-sheet-secret";

/// Body of `POST /api/quote/sheet`.
///
/// Callers have used several field names for the same thing over time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SheetRequest {
    #[serde(default, alias = "sheet_id", alias = "sheetId", alias = "spreadsheetId")]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl SheetRequest {
    /// Id or URL to resolve, whichever was sent.
    pub fn source(&self) -> Option<&str> {
        self.spreadsheet_id
            .as_deref()
            .or(self.url.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// What the server reports about one generated quote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    pub job_id: String,
    pub file_name: String,
    pub sections: usize,
    pub warnings: Vec<String>,
}

impl QuoteSummary {
    pub fn new(job_id: &str, output: &QuoteOutput) -> Self {
        Self {
            job_id: job_id.to_string(),
            file_name: output.file_name.clone(),
            sections: output.document.sections.len(),
            warnings: output.warnings.iter().map(ToString::to_string).collect(),
        }
    }

    /// Download headers for the `.docx` response.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static(DOCX_CONTENT_TYPE),
        );

        let disposition = format!("attachment; filename=\"{}\"", self.file_name);
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            headers.insert(axum::http::header::CONTENT_DISPOSITION, value);
        }
        if let Ok(value) = HeaderValue::from_str(&self.job_id) {
            headers.insert(HeaderName::from_static(JOB_ID_HEADER), value);
        }
        headers.insert(
            HeaderName::from_static(WARNINGS_HEADER),
            HeaderValue::from(self.warnings.len()),
        );

        headers
    }
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::Fetch(_) => StatusCode::BAD_GATEWAY,
            ServerError::Pipeline(PipelineError::Workbook(_)) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(e) if e.is_user_error() => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::Pipeline(e) => e.kind(),
            ServerError::Fetch(_) => "fetch",
            ServerError::BadRequest(_) => "request",
            ServerError::Unauthorized => "unauthorized",
            ServerError::Internal(_) => "internal",
        }
    }

    /// Message shown to the advisor; the category prefix is carried in `kind`.
    fn detail(&self) -> String {
        match self {
            ServerError::Pipeline(PipelineError::Workbook(e)) => e.to_string(),
            ServerError::Pipeline(PipelineError::Schema(e)) => e.to_string(),
            ServerError::Pipeline(PipelineError::Extraction(e)) => e.to_string(),
            ServerError::Pipeline(PipelineError::Render(e)) => e.to_string(),
            ServerError::Fetch(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = error_response(self.kind(), &self.detail());
        (self.status(), Json(body)).into_response()
    }
}

/// Create an error response
pub fn error_response(kind: &str, error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "kind": kind,
        "error": error,
    })
}
