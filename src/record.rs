//! The tus data model (§3 of the design): upload ids, client-supplied
//! metadata, and the authoritative per-upload record persisted by the store.

use std::collections::{HashMap, HashSet};

use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProtocolError;

/// A 32-character lowercase hex upload id (a UUIDv4 with its dashes stripped).
pub fn generate_upload_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Client-supplied `Upload-Metadata`: short ASCII keys to UTF-8 values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata(pub HashMap<String, String>);

impl UploadMetadata {
    /// Parse the `Upload-Metadata` header value: comma-separated
    /// `key b64(value)` pairs, whitespace around commas and between
    /// key/value tolerated, keys unique.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::default());
        }

        let mut map = HashMap::new();
        let mut seen = HashSet::new();

        for item in raw.split(',') {
            let item = item.trim();
            if item.is_empty() {
                return Err(ProtocolError::InvalidMetadata);
            }

            let (key, b64) = match item.split_once(' ') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (item, ""),
            };

            if key.is_empty() || key.contains(' ') || key.contains(',') {
                return Err(ProtocolError::InvalidMetadata);
            }
            if !seen.insert(key.to_string()) {
                return Err(ProtocolError::InvalidMetadata);
            }

            let decoded = base64::engine::general_purpose::STANDARD
                .decode(b64)
                .map_err(|_| ProtocolError::InvalidMetadata)?;
            let value = String::from_utf8(decoded).map_err(|_| ProtocolError::InvalidMetadata)?;

            map.insert(key.to_string(), value);
        }

        Ok(Self(map))
    }

    /// Render back to the `key b64(value)` comma-joined wire form.
    pub fn stringify(&self) -> String {
        let mut pairs: Vec<(String, String)> = self
            .0
            .iter()
            .map(|(k, v)| {
                (
                    k.clone(),
                    base64::engine::general_purpose::STANDARD.encode(v),
                )
            })
            .collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
            .into_iter()
            .map(|(k, v)| format!("{k} {v}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.0.get(key)
    }

    /// Resolve `filename`/`name` with fallback, as required by HEAD (§4.4.3).
    pub fn filename(&self) -> Option<&String> {
        self.get("filename").or_else(|| self.get("name"))
    }

    /// Resolve `filetype`/`type` with fallback, as required by HEAD (§4.4.3).
    pub fn filetype(&self) -> Option<&String> {
        self.get("filetype").or_else(|| self.get("type"))
    }
}

/// The authoritative per-upload state (§3). Serialized verbatim (minus
/// `id`, which is the sidecar's filename stem) as the `.info` sidecar.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: String,
    pub metadata: UploadMetadata,
    /// `None` iff the upload's length is still deferred.
    pub size: Option<u64>,
    pub offset: u64,
    pub upload_part: u64,
    pub upload_chunk_size: u64,
    /// RFC3339 timestamp.
    pub created_at: String,
    pub defer_length: bool,
    /// RFC3339 timestamp; set at creation or on the first PATCH that needs it.
    pub expires: String,
}

impl UploadRecord {
    pub fn new(id: String, metadata: UploadMetadata, size: Option<u64>, expires: String) -> Self {
        let defer_length = size.is_none();
        Self {
            id,
            metadata,
            size,
            offset: 0,
            upload_part: 0,
            upload_chunk_size: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
            defer_length,
            expires,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.size.is_some_and(|size| size == self.offset)
    }

    pub fn is_deferred(&self) -> bool {
        self.size.is_none()
    }
}
