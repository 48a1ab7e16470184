//! Inbound HTTP surface for the upload relay (feature `server`).

use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{error::PipelineError, journal::CallJournal, upload::BlobClient};

pub struct RelayState {
    pub blob: BlobClient,
    pub journal: CallJournal,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    filename: Option<String>,
}

/// POST `/api/upload?filename=...` forwards the raw request body to the
/// blob store and replies with the store's JSON. Missing filename is a 400;
/// an upstream failure keeps its status code.
pub async fn upload_relay(
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
    state: web::Data<RelayState>,
) -> HttpResponse {
    let filename = match query.filename.as_deref().filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => {
            return HttpResponse::BadRequest().json(json!({ "error": "Filename is required" }))
        }
    };

    let content_type = req
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    match state
        .blob
        .upload(&filename, &content_type, body.to_vec(), &state.journal)
        .await
    {
        Ok(blob) => HttpResponse::Ok().json(blob),
        Err(PipelineError::UpstreamHttp { status, body }) => {
            let status =
                StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            HttpResponse::build(status).json(json!({ "error": "Upload failed", "details": body }))
        }
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({ "error": "Internal server error", "details": e.to_string() })),
    }
}

/// Mounts the relay at `/api/upload`; other methods get 405 from the
/// resource's default handler.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/upload").route(web::post().to(upload_relay)));
}
