//! `/res` endpoint: direct byte-range file serving and the live-transcoded
//! DLNA time-seek stream.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::extract::Query;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use http_range_header::parse_range_header;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::dlna::{self, ContentFeatures, NptRange};
use crate::media::{mime, transcode};

#[derive(Debug, Deserialize)]
pub struct ResQuery {
    path: String,
    transcode: Option<String>,
}

pub async fn serve_resource(Query(query): Query<ResQuery>, headers: HeaderMap) -> Response {
    let path = PathBuf::from(&query.path);
    match query.transcode.as_deref() {
        None | Some("") => serve_file(path, &headers).await,
        Some(_) => serve_transcoded(path, &headers).await,
    }
}

// ── Direct streaming ──────────────────────────────────────────────────────────

fn direct_headers(path: &Path, size: u64) -> HeaderMap {
    let features = ContentFeatures {
        support_range: true,
        ..Default::default()
    };
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(mime::by_extension(path)),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(size));
    headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    headers.insert(
        HeaderName::from_static(dlna::CONTENT_FEATURES_HEADER),
        HeaderValue::from_str(&features.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    headers
}

async fn serve_file(path: PathBuf, req_headers: &HeaderMap) -> Response {
    let meta = match tokio::fs::metadata(&path).await {
        Ok(m) if m.is_file() => m,
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    let size = meta.len();
    let headers = direct_headers(&path, size);

    if let Some(range) = req_headers.get(header::RANGE) {
        let Ok(range) = range.to_str() else {
            return range_not_satisfiable(size);
        };
        tracing::debug!("serving file (Range: {range}): {}", path.display());
        return range_response(&path, range, size, headers).await;
    }

    tracing::debug!("serving file: {}", path.display());
    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("cannot open {}: {e}", path.display());
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    (
        StatusCode::OK,
        headers,
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response()
}

fn range_not_satisfiable(size: u64) -> Response {
    (
        StatusCode::RANGE_NOT_SATISFIABLE,
        [(header::CONTENT_RANGE, format!("bytes */{size}"))],
    )
        .into_response()
}

/// Serve a `Range:` request as 206 Partial Content. Multi-part ranges are
/// answered with the first range only.
async fn range_response(path: &Path, range: &str, size: u64, mut headers: HeaderMap) -> Response {
    let Ok(parsed) = parse_range_header(range) else {
        return range_not_satisfiable(size);
    };
    let Ok(ranges) = parsed.validate(size) else {
        return range_not_satisfiable(size);
    };
    let Some(first) = ranges.into_iter().next() else {
        return range_not_satisfiable(size);
    };

    let start = *first.start();
    let end = *first.end();
    let length = end - start + 1;

    let mut file = match tokio::fs::File::open(path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("cannot open {}: {e}", path.display());
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    if let Err(e) = file.seek(SeekFrom::Start(start)).await {
        tracing::error!("cannot seek in {}: {e}", path.display());
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    headers.insert(
        header::CONTENT_RANGE,
        HeaderValue::from_str(&format!("bytes {start}-{end}/{size}"))
            .unwrap_or_else(|_| HeaderValue::from_static("bytes 0-0/0")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));

    let stream = ReaderStream::new(file.take(length));
    (
        StatusCode::PARTIAL_CONTENT,
        headers,
        Body::from_stream(stream),
    )
        .into_response()
}

// ── Transcoded streaming ──────────────────────────────────────────────────────

/// Stream an on-the-fly MPEG transcode, honoring `TimeSeekRange.dlna.org`.
/// A malformed time-seek header is tolerated: the response carries the DLNA
/// headers and no body. The subprocess is reclaimed on every exit path,
/// including the client hanging up mid-stream.
async fn serve_transcoded(path: PathBuf, req_headers: &HeaderMap) -> Response {
    let features = ContentFeatures {
        support_time_seek: true,
        transcoded: true,
        ..Default::default()
    };
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(dlna::TRANSFER_MODE_HEADER),
        HeaderValue::from_static("Streaming"),
    );
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mpeg"));
    headers.insert(
        HeaderName::from_static(dlna::CONTENT_FEATURES_HEADER),
        HeaderValue::from_str(&features.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("")),
    );

    let mut range = None;
    if let Some(raw) = req_headers
        .get(dlna::TIME_SEEK_RANGE_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        let Some(parsed) = raw.strip_prefix("npt=").and_then(NptRange::parse) else {
            tracing::debug!("bad time-seek range: {raw}");
            return (StatusCode::OK, headers).into_response();
        };
        // The stream's total duration is unknown, hence the "/*".
        if let Ok(echo) = HeaderValue::from_str(&format!("{raw}/*")) {
            headers.insert(HeaderName::from_static(dlna::TIME_SEEK_RANGE_HEADER), echo);
        }
        range = Some(parsed);
    }

    let start = range.map(|r| r.start).unwrap_or(0.0);
    let length = range.and_then(|r| r.end.map(|end| end - r.start));
    let stream = match transcode::spawn(&path, start, length) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("cannot start transcoder for {}: {e}", path.display());
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    tracing::debug!(
        "transcoding {} from {start}s{}",
        path.display(),
        length.map(|l| format!(" for {l}s")).unwrap_or_default()
    );
    (
        StatusCode::PARTIAL_CONTENT,
        headers,
        Body::from_stream(ReaderStream::new(stream)),
    )
        .into_response()
}
