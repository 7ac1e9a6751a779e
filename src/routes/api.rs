use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, Uri},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::query::{DataQuery, DataResponse, SessionList, UploadResponse},
    routes::extract::UploadForm,
    services::{
        export::{self, XLSX_CONTENT_TYPE},
        parser,
        query::{self, QueryParams},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/data/:session_id", get(session_data))
        .route("/download/:session_id", get(download))
        .route("/sessions", get(list_sessions))
        .route("/sessions/:session_id", delete(delete_session))
}

async fn upload(
    State(state): State<AppState>,
    UploadForm(mut multipart): UploadForm,
) -> Result<Json<UploadResponse>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some((filename, bytes));
        break;
    }

    let Some((filename, bytes)) = upload else {
        return Err(AppError::Validation("Geen bestand gevonden".into()));
    };
    if filename.trim().is_empty() {
        return Err(AppError::Validation("Geen bestand geselecteerd".into()));
    }
    parser::ensure_trip_log_filename(&filename)?;

    let records = tokio::task::spawn_blocking(move || parser::parse_trip_log(&bytes))
        .await
        .map_err(|err| AppError::Other(err.into()))?
        .inspect_err(|err| warn!(%filename, "upload rejected: {err}"))?;

    let session = state.sessions.create(filename, records).await;
    Ok(Json(UploadResponse {
        session_id: session.id(),
        filename: session.source_filename().to_string(),
        uploaded_at: session.uploaded_at(),
        total_records: session.total_records(),
        message: "Bestand succesvol geüpload en verwerkt".into(),
    }))
}

async fn session_data(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    uri: Uri,
) -> Result<Json<DataResponse>, AppError> {
    // Unknown sessions win over a bad query string.
    let session = state.sessions.get(parse_session_id(&session_id)?).await?;
    let Query(raw) = Query::<DataQuery>::try_from_uri(&uri)?;
    let params = QueryParams::try_from(raw)?;
    let result = query::query(&session, &params);
    Ok(Json(DataResponse::new(result, session.info())))
}

async fn download(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, AppError> {
    let session = state.sessions.get(parse_session_id(&session_id)?).await?;
    let file = tokio::task::spawn_blocking(move || export::export_session(&session))
        .await
        .map_err(|err| AppError::Other(err.into()))??;
    info!(filename = %file.filename, bytes = file.bytes.len(), "serving export");

    let disposition = HeaderValue::from_str(&content_disposition(&file.filename))
        .map_err(|err| AppError::Export(err.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}

async fn list_sessions(State(state): State<AppState>) -> Json<SessionList> {
    Json(SessionList {
        sessions: state.sessions.list().await,
    })
}

async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.sessions.evict(parse_session_id(&session_id)?).await?;
    Ok(Json(json!({ "message": "Sessie verwijderd" })))
}

/// Malformed ids cannot name a session, so they are reported as missing.
fn parse_session_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Ongeldige upload: {}", err.body_text()))
}

/// RFC 5987 `attr-char`: everything else in `filename*` is percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if fallback == filename {
        return format!("attachment; filename=\"{filename}\"");
    }

    let encoded = utf8_percent_encode(filename, ATTR_CHAR);
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_disposition_quotes_plain_names() {
        assert_eq!(
            content_disposition("trips_output.xlsx"),
            "attachment; filename=\"trips_output.xlsx\""
        );
    }

    #[test]
    fn content_disposition_encodes_non_ascii_names() {
        assert_eq!(
            content_disposition("ritjé_output.xlsx"),
            "attachment; filename=\"ritj__output.xlsx\"; filename*=UTF-8''ritj%C3%A9_output.xlsx"
        );
    }

    #[test]
    fn content_disposition_encodes_spaces_only_in_extended_name() {
        assert_eq!(
            content_disposition("rit é.xlsx"),
            "attachment; filename=\"rit _.xlsx\"; filename*=UTF-8''rit%20%C3%A9.xlsx"
        );
    }
}
