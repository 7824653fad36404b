//! HTTP surface: five POST endpoints over an [`ArchiveService`].
//!
//! Bodies are taken as raw bytes and decoded after admission, so a
//! saturated server answers 503 without looking at the request and a
//! malformed body is a 400 rather than the framework's own rejection.

mod response;

pub use response::X_ERRORS;

use crate::lifecycle::{ArchiveService, ServiceError};
use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::response::Response;
use axum::routing::post;
use axum::Router;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use tokio::net::TcpListener;

#[derive(Debug, Deserialize)]
struct DownloadRequest {
    #[serde(default)]
    urls: Vec<String>,
    #[serde(default)]
    filename: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NameRequest {
    #[serde(default)]
    filename: String,
}

#[derive(Debug, Deserialize)]
struct AppendRequest {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    urls: Vec<String>,
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ServiceError> {
    serde_json::from_slice(body)
        .map_err(|e| ServiceError::InvalidInput(format!("invalid request body: {}", e)))
}

async fn download(
    State(svc): State<ArchiveService>,
    body: Bytes,
) -> Result<Response, ServiceError> {
    let slot = svc.admit()?;
    let req: DownloadRequest = decode(&body)?;
    let reply = svc
        .fetch_and_zip(slot, req.urls, req.filename.as_deref())
        .await?;
    Ok(response::zip_reply(reply))
}

async fn create(State(svc): State<ArchiveService>, body: Bytes) -> Result<Response, ServiceError> {
    let slot = svc.admit()?;
    let req: NameRequest = decode(&body)?;
    let name = svc.create(slot, &req.filename).await?;
    Ok(response::created(&name))
}

async fn append(State(svc): State<ArchiveService>, body: Bytes) -> Result<Response, ServiceError> {
    let slot = svc.admit()?;
    let req: AppendRequest = decode(&body)?;
    let reply = svc.append(slot, &req.filename, req.urls).await?;
    Ok(response::appended(reply))
}

async fn stream(State(svc): State<ArchiveService>, body: Bytes) -> Result<Response, ServiceError> {
    let slot = svc.admit()?;
    let req: NameRequest = decode(&body)?;
    let stream = svc.stream(slot, &req.filename).await?;
    Ok(response::streamed(stream))
}

async fn stream_and_delete(
    State(svc): State<ArchiveService>,
    body: Bytes,
) -> Result<Response, ServiceError> {
    let slot = svc.admit()?;
    let req: NameRequest = decode(&body)?;
    let stream = svc.stream_and_delete(slot, &req.filename).await?;
    Ok(response::streamed(stream))
}

/// All routes. Other methods on these paths get 405 from the router.
pub fn router(svc: ArchiveService) -> Router {
    Router::new()
        .route("/download", post(download))
        .route("/archive/create", post(create))
        .route("/archive/add", post(append))
        .route("/archive/download", post(stream))
        .route("/archive/download-and-delete", post(stream_and_delete))
        .with_state(svc)
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(listener: TcpListener, svc: ArchiveService, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("listener has no local address")?;
    tracing::info!(%addr, storage = %svc.storage_dir().display(), "zipfetch listening");
    axum::serve(listener, router(svc))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;
    tracing::info!("zipfetch server stopped");
    Ok(())
}
