use salvo_core::http::StatusCode;

pub type TusResult<T> = Result<T, TusError>;

/// Failures in decoding or validating the tus wire protocol itself
/// (as opposed to failures operating on a specific upload record).
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("missing tus-resumable")]
    MissingTusResumable,
    #[error("unsupported tus version: {0}")]
    UnsupportedTusVersion(String),
    #[error("missing header: {0}")]
    MissingHeader(&'static str),
    #[error("invalid integer header: {0}")]
    InvalidInt(&'static str),
    #[error("Upload-Defer-Length must be 1 if present")]
    InvalidDeferLength,
    #[error("Upload-Length or Upload-Defer-Length header required, and not both")]
    InvalidLength,
    #[error(
        "Upload-Metadata must consist of one or more comma-separated key-value pairs; \
         the key and value MUST be separated by a space, the key MUST NOT contain spaces \
         or commas and MUST NOT be empty, the value MUST be Base64 encoded, and all keys \
         MUST be unique"
    )]
    InvalidMetadata,
    #[error("metadata missing required field: {0}")]
    MissingMetadataField(&'static str),
}

/// All failure modes the protocol handler can surface to a client, plus
/// the internal ones raised by the store and locker.
#[derive(Debug, thiserror::Error)]
pub enum TusError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("upload not found")]
    NotFound,

    #[error("offset mismatch: expected {expected}, got {got}")]
    OffsetMismatch { expected: u64, got: u64 },

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("unauthorized")]
    Unauthorized,

    #[error("failed to get upload id from request path")]
    FileIdError,

    #[error("failed to generate upload url")]
    GenerateUploadUrlError,

    #[error("internal: {0}")]
    Internal(String),
}

impl TusError {
    pub fn status(&self) -> StatusCode {
        match self {
            TusError::Protocol(_) => StatusCode::BAD_REQUEST,
            TusError::FileIdError => StatusCode::BAD_REQUEST,
            TusError::NotFound => StatusCode::NOT_FOUND,
            TusError::OffsetMismatch { .. } => StatusCode::CONFLICT,
            TusError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            TusError::Unauthorized => StatusCode::UNAUTHORIZED,
            TusError::GenerateUploadUrlError => StatusCode::INTERNAL_SERVER_ERROR,
            TusError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
