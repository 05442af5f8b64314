//! Axum route handlers for the Resume Analyzer API.

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::documents::upload::UploadForm;
use crate::documents::{is_pdf, pdf};
use crate::errors::AppError;
use crate::resume::analysis::AnalysisResult;
use crate::resume::report::KeywordReport;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    #[serde(flatten)]
    pub report: KeywordReport,
    /// The report as displayed and copied by the analyzer page.
    pub rendered: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/resume-analysis
///
/// Multipart form: `resume` (PDF file), optional `jobDescription` (text).
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<AnalysisResult>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let resume = form
        .take_file("resume")
        .ok_or_else(|| AppError::Validation("No resume file provided".to_string()))?;

    if !is_pdf(&resume.file_name, None) {
        return Err(AppError::Validation(
            "Please upload a valid PDF file".to_string(),
        ));
    }
    if resume.bytes.is_empty() {
        return Err(AppError::Validation(
            "The uploaded file is empty".to_string(),
        ));
    }

    let (text, _) = pdf::extract(resume.bytes).await.map_err(|e| {
        warn!(file = %resume.file_name, "Resume PDF could not be parsed: {e}");
        AppError::BadUpload {
            message: "Unable to read the PDF file".to_string(),
            details:
                "Please ensure the file is not corrupted, password protected, or inaccessible"
                    .to_string(),
        }
    })?;

    if text.trim().is_empty() {
        return Err(AppError::Validation(
            "The PDF file appears to be empty or unreadable".to_string(),
        ));
    }

    let job_description = form.field("jobDescription").unwrap_or_default();
    let analysis = state
        .resume_analyzer
        .analyze(&text, job_description)
        .await?;

    info!(
        file = %resume.file_name,
        backend = %state.resume_analyzer.backend(),
        score = analysis.score,
        "Resume analysis complete"
    );

    Ok(Json(analysis))
}

/// POST /api/resume-analysis/report
///
/// Keyword report for pasted or extracted resume text.
pub async fn handle_report(
    Json(request): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation(
            "Please upload or paste your resume first".to_string(),
        ));
    }

    let report = KeywordReport::analyze(&request.text);
    let rendered = report.render();
    Ok(Json(ReportResponse { report, rendered }))
}
