//! Path-constrained static asset serving.
//!
//! Conventional file serving with `Last-Modified` / `If-Modified-Since`
//! handling and a long-cache mode for fingerprinted URLs (any `v` query
//! parameter). The broker core has no dependency on this module and
//! exposes no interface to it.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use chrono::{DateTime, Utc};

use crate::error::ServerError;
use crate::routes::AppState;

/// Cache lifetime for fingerprinted asset URLs: ten years.
const LONG_CACHE_SECS: u64 = 86_400 * 365 * 10;

// ---------------------------------------------------------------------------
// AssetDir
// ---------------------------------------------------------------------------

/// A static asset root directory.
#[derive(Debug, Clone)]
pub struct AssetDir {
    root: PathBuf,
    index_file: String,
}

impl AssetDir {
    /// Creates an asset root serving files under `root`, with `index_file`
    /// served for directory requests.
    #[must_use]
    pub fn new(root: PathBuf, index_file: String) -> Self {
        Self { root, index_file }
    }

    /// Resolves a request path to a filesystem path under the root.
    ///
    /// Both the root and the joined path are canonicalized, so `..`
    /// segments and symlinks cannot reach outside the root.
    async fn resolve(&self, rel: &str) -> Result<PathBuf, ServerError> {
        let root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|_| ServerError::NotFound)?;
        let resolved = tokio::fs::canonicalize(root.join(rel))
            .await
            .map_err(|_| ServerError::NotFound)?;
        if !resolved.starts_with(&root) {
            return Err(ServerError::Forbidden(rel.to_owned()));
        }
        Ok(resolved)
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// `GET /static/{*path}` — serve one file from the asset root.
pub(crate) async fn serve(
    State(state): State<AppState>,
    Path(path): Path<String>,
    uri: Uri,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let mut resolved = state.assets.resolve(&path).await?;

    let meta = tokio::fs::metadata(&resolved).await?;
    if meta.is_dir() {
        // Re-request with a trailing slash so relative links inside the
        // index resolve against the directory.
        if !uri.path().ends_with('/') {
            return Ok(Redirect::permanent(&format!("{}/", uri.path())).into_response());
        }
        resolved = resolved.join(&state.assets.index_file);
    }

    let meta = tokio::fs::metadata(&resolved)
        .await
        .map_err(|_| ServerError::NotFound)?;
    if !meta.is_file() {
        return Err(ServerError::Forbidden(path));
    }

    let modified = meta.modified()?;

    let mut builder = Response::builder()
        .header(header::LAST_MODIFIED, http_date(modified))
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*");

    let versioned = params.iter().any(|(name, _)| name == "v");
    builder = if versioned {
        builder
            .header(header::CACHE_CONTROL, format!("max-age={LONG_CACHE_SECS}"))
            .header(
                header::EXPIRES,
                http_date(SystemTime::now() + Duration::from_secs(LONG_CACHE_SECS)),
            )
    } else {
        builder.header(header::CACHE_CONTROL, "public")
    };

    let mime = mime_guess::from_path(&resolved).first_or_octet_stream();
    builder = builder.header(header::CONTENT_TYPE, mime.as_ref());

    // Client cache is current: headers only, no body.
    if let Some(since) = headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(parse_http_date)
    {
        if unix_secs(modified) <= since {
            return builder
                .status(StatusCode::NOT_MODIFIED)
                .body(Body::empty())
                .map_err(|e| ServerError::Internal(e.to_string()));
        }
    }

    let contents = tokio::fs::read(&resolved).await?;
    builder
        .body(Body::from(contents))
        .map_err(|e| ServerError::Internal(e.to_string()))
}

// ---------------------------------------------------------------------------
// HTTP date helpers
// ---------------------------------------------------------------------------

/// Formats a timestamp as an RFC 7231 HTTP date.
fn http_date(t: SystemTime) -> String {
    DateTime::<Utc>::from(t)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Parses an `If-Modified-Since` value to Unix seconds.
fn parse_http_date(value: &HeaderValue) -> Option<i64> {
    let s = value.to_str().ok()?;
    DateTime::parse_from_rfc2822(s).ok().map(|d| d.timestamp())
}

/// Truncates a timestamp to Unix seconds, matching header granularity.
fn unix_secs(t: SystemTime) -> i64 {
    DateTime::<Utc>::from(t).timestamp()
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_date_roundtrip() {
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let formatted = http_date(t);
        assert!(formatted.ends_with(" GMT"));

        let value = HeaderValue::from_str(&formatted).unwrap();
        assert_eq!(parse_http_date(&value), Some(1_700_000_000));
    }

    #[test]
    fn test_parse_http_date_rejects_garbage() {
        let value = HeaderValue::from_static("not a date");
        assert_eq!(parse_http_date(&value), None);
    }

    #[tokio::test]
    async fn test_resolve_rejects_escape() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("static");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"s").unwrap();
        std::fs::write(root.join("ok.txt"), b"ok").unwrap();

        let assets = AssetDir::new(root, "index.html".to_owned());

        assert!(assets.resolve("ok.txt").await.is_ok());
        let err = assets.resolve("../secret.txt").await.unwrap_err();
        assert!(matches!(err, ServerError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_resolve_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let assets = AssetDir::new(dir.path().to_path_buf(), "index.html".to_owned());
        let err = assets.resolve("nope.txt").await.unwrap_err();
        assert!(matches!(err, ServerError::NotFound));
    }
}
