use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;

use crate::domain::guest::{CreateGuest, GuestError, UpdateGuest};
use crate::importer::{self, run_import, ImportError, ImportFormat};
use super::caller::CallerCredential;
use super::AppState;

const UPLOAD_FIELD: &str = "file";

/// Largest accepted guest sheet (32 MiB)
const MAX_UPLOAD_BYTES: usize = 32 << 20;

pub async fn list(state: web::Data<AppState>) -> Result<HttpResponse, GuestError> {
    let result = state.directory.list().await;
    state.observe_guest("list", &result);
    Ok(HttpResponse::Ok().json(result?))
}

pub async fn get(state: web::Data<AppState>, id: web::Path<i64>) -> Result<HttpResponse, GuestError> {
    let result = state.directory.get_by_id(id.into_inner()).await;
    state.observe_guest("get", &result);
    Ok(HttpResponse::Ok().json(result?))
}

pub async fn create(
    state: web::Data<AppState>,
    caller: CallerCredential,
    body: web::Json<CreateGuest>,
) -> Result<HttpResponse, GuestError> {
    let result = state.directory.create(body.into_inner(), &caller.0).await;
    state.observe_guest("create", &result);
    Ok(HttpResponse::Created().json(result?))
}

pub async fn update(
    state: web::Data<AppState>,
    caller: CallerCredential,
    id: web::Path<i64>,
    body: web::Json<UpdateGuest>,
) -> Result<HttpResponse, GuestError> {
    let result = state
        .directory
        .update(id.into_inner(), body.into_inner(), &caller.0)
        .await;
    state.observe_guest("update", &result);
    Ok(HttpResponse::Ok().json(result?))
}

/// Header format is still enforced even though delete does not authorize.
pub async fn delete(
    state: web::Data<AppState>,
    _caller: CallerCredential,
    id: web::Path<i64>,
) -> Result<HttpResponse, GuestError> {
    let result = state.directory.delete(id.into_inner()).await;
    state.observe_guest("delete", &result);
    result?;
    Ok(HttpResponse::NoContent().finish())
}

/// Multipart upload (`file` field) of a .csv or .xlsx guest sheet.
///
/// 200 when every row was created, 400 otherwise; the body is the report
/// either way.
pub async fn import(
    state: web::Data<AppState>,
    caller: CallerCredential,
    payload: Multipart,
) -> Result<HttpResponse, ImportError> {
    let (filename, bytes) = read_upload(payload).await?;
    let format = ImportFormat::from_filename(&filename)?;
    let rows = importer::parse(format, &bytes, state.require_family_group)?;

    let report = run_import(&state.directory, rows, &caller.0).await;

    for _ in 0..report.imported {
        state.metrics.record_import_row(None);
    }
    for failure in &report.errors {
        state.metrics.record_import_row(Some(failure.kind));
    }

    if report.is_complete() {
        Ok(HttpResponse::Ok().json(report))
    } else {
        Ok(HttpResponse::BadRequest().json(report))
    }
}

/// File name and bytes of the first `file` field
async fn read_upload(mut payload: Multipart) -> Result<(String, Vec<u8>), ImportError> {
    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| ImportError::Upload(e.to_string()))?
    {
        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().map(str::to_string),
                cd.get_filename().map(str::to_string),
            ),
            None => (None, None),
        };
        if name.as_deref() != Some(UPLOAD_FIELD) {
            continue;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| ImportError::Upload(e.to_string()))?
        {
            append_capped(&mut bytes, &chunk, MAX_UPLOAD_BYTES)?;
        }

        return Ok((filename.unwrap_or_default(), bytes));
    }

    Err(ImportError::MissingFile)
}

fn append_capped(buf: &mut Vec<u8>, chunk: &[u8], limit: usize) -> Result<(), ImportError> {
    if buf.len() + chunk.len() > limit {
        tracing::warn!(limit_bytes = limit, "Import rejected: upload too large");
        return Err(ImportError::Upload(format!("file exceeds {} bytes", limit)));
    }
    buf.extend_from_slice(chunk);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_is_capped() {
        let mut buf = Vec::new();
        append_capped(&mut buf, b"first_name,", 16).unwrap();
        append_capped(&mut buf, b"last", 16).unwrap();
        assert_eq!(buf.len(), 15);

        let err = append_capped(&mut buf, b"_name", 16).unwrap_err();
        assert!(matches!(err, ImportError::Upload(_)));
        assert_eq!(err.to_string(), "failed to read upload: file exceeds 16 bytes");
        assert_eq!(buf.len(), 15);
    }
}
