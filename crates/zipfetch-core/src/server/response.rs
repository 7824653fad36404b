//! Mapping of service outcomes onto HTTP responses.

use crate::archive::{BuildReport, Disposition, ErrorEntry};
use crate::lifecycle::{AppendReply, ArchiveName, ArchiveStream, ServiceError, ZipReply};
use axum::body::Body;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Set to `true` when some, but not all, items of a batch failed.
pub const X_ERRORS: HeaderName = HeaderName::from_static("x-errors");

const ZIP_CONTENT_TYPE: &str = "application/zip";

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        } else {
            tracing::debug!(status = status.as_u16(), "request rejected: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}

#[derive(Serialize)]
struct Created<'a> {
    filename: &'a str,
}

#[derive(Serialize)]
struct Appended<'a> {
    filename: &'a str,
    added: usize,
    failed: usize,
}

/// Quoted, so `;` in a name cannot start another parameter. Names never
/// contain `"` or `\`.
fn attachment(name: &ArchiveName) -> String {
    format!("attachment; filename=\"{}\"", name)
}

fn all_failed(errors: Vec<ErrorEntry>) -> Response {
    (StatusCode::PARTIAL_CONTENT, Json(errors)).into_response()
}

fn with_error_flag(mut response: Response, report: &BuildReport) -> Response {
    if !report.errors.is_empty() {
        response
            .headers_mut()
            .insert(X_ERRORS, axum::http::HeaderValue::from_static("true"));
    }
    response
}

pub(super) fn zip_reply(reply: ZipReply) -> Response {
    let ZipReply {
        name,
        bytes,
        report,
    } = reply;
    if report.disposition() == Disposition::NothingAdded {
        return all_failed(report.errors);
    }
    let response = (
        [
            (CONTENT_TYPE, ZIP_CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, attachment(&name)),
            (CONTENT_LENGTH, bytes.len().to_string()),
        ],
        bytes,
    )
        .into_response();
    // The error list is withheld here; only the flag says something failed.
    with_error_flag(response, &report)
}

pub(super) fn created(name: &ArchiveName) -> Response {
    Json(Created {
        filename: name.as_str(),
    })
    .into_response()
}

pub(super) fn appended(reply: AppendReply) -> Response {
    let AppendReply { name, report } = reply;
    if report.disposition() == Disposition::NothingAdded {
        return all_failed(report.errors);
    }
    let response = Json(Appended {
        filename: name.as_str(),
        added: report.added,
        failed: report.errors.len(),
    })
    .into_response();
    with_error_flag(response, &report)
}

pub(super) fn streamed(stream: ArchiveStream) -> Response {
    let ArchiveStream { name, len, body } = stream;
    (
        [
            (CONTENT_TYPE, ZIP_CONTENT_TYPE.to_string()),
            (CONTENT_DISPOSITION, attachment(&name)),
            (CONTENT_LENGTH, len.to_string()),
        ],
        Body::from_stream(body),
    )
        .into_response()
}
