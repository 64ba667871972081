//! Attachment upload and blob serving.

use actix_multipart::Multipart;
use actix_web::http::header::{
    self, CacheControl, CacheDirective, ContentDisposition, DispositionParam, DispositionType,
};
use actix_web::{HttpRequest, HttpResponse, web};
use futures::TryStreamExt;
use url::form_urlencoded;

use daylog_core::ports::BlobStore;
use daylog_shared::dto::UploadResponse;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views::{download_url, upload_url};

const UPLOAD_FIELD: &str = "file";

/// POST /upload
///
/// Ingests the first `file` field. Other fields are skipped.
pub async fn upload(state: web::Data<AppState>, mut payload: Multipart) -> AppResult<HttpResponse> {
    while let Some(field) = payload
        .try_next()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        let ingested = state
            .ingestor
            .ingest_stream(filename.as_deref(), field)
            .await?;
        let attachment = ingested.attachment;

        return Ok(HttpResponse::Ok().json(UploadResponse {
            url: upload_url(&ingested.thumbnail_path),
            href: download_url(&attachment.file_path),
            attachment_id: attachment.id.to_string(),
            file_hash: attachment.file_hash,
        }));
    }

    Err(AppError::BadRequest(format!(
        "Missing multipart field `{}`",
        UPLOAD_FIELD
    )))
}

/// GET /uploads/{path}
///
/// `?content-disposition=attachment` turns the response into a download.
pub async fn serve(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let path = path.into_inner();
    let blob = state.blobs.open(&path).await?;

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    let mut response = HttpResponse::Ok();
    response
        .content_type(mime.to_string())
        .insert_header(CacheControl(vec![
            CacheDirective::Private,
            CacheDirective::MaxAge(31_536_000),
        ]));

    if wants_download(req.query_string()) {
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        response.insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(name)],
        });
    }

    tracing::debug!(path = %path, size = blob.size, "Serving upload");
    Ok(response.no_chunking(blob.size).streaming(blob.stream))
}

fn wants_download(query: &str) -> bool {
    form_urlencoded::parse(query.as_bytes())
        .any(|(key, value)| key == header::CONTENT_DISPOSITION.as_str() && value == "attachment")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_flag() {
        assert!(wants_download("content-disposition=attachment"));
        assert!(wants_download("x=1&content-disposition=attachment"));
        assert!(!wants_download("content-disposition=inline"));
        assert!(!wants_download(""));
    }
}
