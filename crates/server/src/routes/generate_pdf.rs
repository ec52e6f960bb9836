use crate::error::ApiError;
use crate::store::MarksheetStore;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfQuery {
    marksheet_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    marksheet_id: Option<String>,
    #[serde(default)]
    return_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Base64Pdf {
    success: bool,
    pdf_base64: String,
    filename: String,
}

#[derive(Debug, Serialize)]
pub struct ExportMessage {
    success: bool,
    message: String,
}

fn required_id(id: Option<String>) -> Result<String, ApiError> {
    id.map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("marksheetId is required".to_string()))
}

/// Header-safe form of a download file name
fn attachment(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

/// `GET /api/generate-pdf?marksheetId=...` streams the PDF as a download
pub async fn download<S: MarksheetStore>(
    State(state): State<AppState<S>>,
    Query(query): Query<PdfQuery>,
) -> Result<Response, ApiError> {
    let id = required_id(query.marksheet_id)?;
    let pdf = state.service.generate(&id).await?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, attachment(&pdf.filename)),
        (header::CONTENT_LENGTH, pdf.bytes.len().to_string()),
    ];
    Ok((
        StatusCode::OK,
        headers,
        [("x-cache", pdf.cache.as_str())],
        pdf.bytes,
    )
        .into_response())
}

/// `POST /api/generate-pdf` returns the PDF inline as base64
pub async fn export<S: MarksheetStore>(
    State(state): State<AppState<S>>,
    body: Result<Json<ExportRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let id = required_id(request.marksheet_id)?;
    let pdf = state.service.generate(&id).await?;

    let return_type = request.return_type.as_deref().unwrap_or("base64");
    if return_type == "base64" {
        Ok(Json(Base64Pdf {
            success: true,
            pdf_base64: STANDARD.encode(&pdf.bytes),
            filename: pdf.filename,
        })
        .into_response())
    } else {
        Ok(Json(ExportMessage {
            success: true,
            message: "Use GET method to download PDF directly".to_string(),
        })
        .into_response())
    }
}
