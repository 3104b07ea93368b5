//! Host-configurable knobs (§6): the `TusOptions` built up by the `Tus`
//! builder in `lib.rs`, plus the URL/host resolution helpers the POST
//! handler needs to build a `Location` header.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use futures_core::future::BoxFuture;
use regex::Regex;
use salvo_core::http::HeaderMap;
use salvo_core::Request;

use crate::error::TusError;
use crate::locker::{Locker, MemoryLocker};
use crate::record::UploadMetadata;

/// Invoked before every handler; an `Err` short-circuits the request with
/// that error's status.
pub type AuthGuard = Arc<dyn Fn(&Request) -> BoxFuture<'static, Result<(), TusError>> + Send + Sync>;

/// Invoked exactly once per upload, with the finished payload's path and
/// its metadata, once `offset == size`.
pub type OnUploadComplete = Arc<dyn Fn(PathBuf, UploadMetadata) -> BoxFuture<'static, ()> + Send + Sync>;

static RE_TRAILING_SEGMENT: OnceLock<Regex> = OnceLock::new();

fn trailing_segment_regex() -> &'static Regex {
    RE_TRAILING_SEGMENT.get_or_init(|| Regex::new(r"([^/]+)/?$").expect("valid regex"))
}

/// The resolved configuration a mounted `Tus` router carries in its
/// `Depot` state.
#[derive(Clone)]
pub struct TusOptions {
    pub prefix: String,
    pub files_dir: PathBuf,
    pub max_size: u64,
    pub days_to_keep: i64,
    pub auth: Option<AuthGuard>,
    pub on_upload_complete: Option<OnUploadComplete>,
    pub tags: Vec<String>,
    pub locker: Arc<dyn Locker>,
}

impl Default for TusOptions {
    fn default() -> Self {
        Self {
            prefix: "files".to_string(),
            files_dir: PathBuf::from("./uploads"),
            max_size: 2 * 1024 * 1024 * 1024,
            days_to_keep: 7,
            auth: None,
            on_upload_complete: None,
            tags: Vec::new(),
            locker: Arc::new(MemoryLocker::new()),
        }
    }
}

impl TusOptions {
    /// Extract the final path segment (the upload id) from the request URI.
    pub fn upload_id_from_request(&self, req: &Request) -> Result<String, TusError> {
        trailing_segment_regex()
            .captures(req.uri().path())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or(TusError::FileIdError)
    }

    /// An ISO-8601 timestamp `days_to_keep` days from now, for a fresh
    /// `expires` field.
    pub fn expires_at(&self) -> String {
        (chrono::Utc::now() + chrono::Duration::days(self.days_to_keep)).to_rfc3339()
    }

    /// Compose the absolute `Location` header for a freshly created upload.
    pub fn generate_location(&self, headers: &HeaderMap, id: &str) -> String {
        let prefix = self.prefix.trim_matches('/');
        let (proto, host) = extract_host_and_proto(headers);
        format!("{proto}://{host}/{prefix}/{id}")
    }
}

/// Resolve the externally-visible `(proto, host)` pair, honoring
/// `X-Forwarded-Proto`/`X-Forwarded-Host` ahead of a plain `Host` header.
pub fn extract_host_and_proto(headers: &HeaderMap) -> (String, String) {
    let proto = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .unwrap_or("http")
        .to_string();

    let host = headers
        .get("x-forwarded-host")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .or_else(|| headers.get(salvo_core::http::header::HOST).and_then(|v| v.to_str().ok()))
        .unwrap_or("localhost")
        .to_string();

    (proto, host)
}
