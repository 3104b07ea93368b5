//! The Upload Store (§4.1): all filesystem interaction, behind an async
//! trait so a host can substitute another backend.

mod disk;

pub use disk::DiskStore;

use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;
use salvo_core::async_trait;

use crate::error::TusResult;
use crate::record::UploadRecord;

/// A stream of payload chunks, as consumed by [`UploadStore::append`] and
/// produced by [`UploadStore::read`].
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Filesystem interaction for upload payloads and their sidecars. `DiskStore`
/// is the only implementation this crate requires; the trait exists so a
/// host can plug in another backend (S3, a database) without touching the
/// protocol handler.
#[async_trait]
pub trait UploadStore: Send + Sync + 'static {
    /// Create the payload (zero-length) and sidecar files for a new upload.
    async fn create(&self, record: &UploadRecord) -> TusResult<()>;

    /// True iff the payload file exists.
    async fn exists(&self, id: &str) -> bool;

    /// Parse the sidecar. `NotFound` if either file is missing or it fails
    /// to parse.
    async fn load(&self, id: &str) -> TusResult<UploadRecord>;

    /// Atomically replace the sidecar (write-to-temp-and-rename).
    async fn save(&self, record: &UploadRecord) -> TusResult<()>;

    /// Stream bytes into the payload in append mode. `record` is mutated
    /// in place (`offset`, `upload_part`, `upload_chunk_size`) and the
    /// sidecar is persisted after each chunk, so an interrupted stream
    /// still leaves a consistent, resumable record. Stops (leaving
    /// already-written bytes and their persisted sidecar state in place)
    /// with `PayloadTooLarge` if a chunk would push the payload past
    /// `max_size`.
    async fn append(
        &self,
        record: &mut UploadRecord,
        max_size: u64,
        stream: ByteStream,
    ) -> TusResult<()>;

    /// Open the payload for reading.
    async fn read(&self, id: &str) -> TusResult<ByteStream>;

    /// Absolute path to the payload file, for handlers that hand off to a
    /// file-serving helper instead of reading the stream themselves.
    fn payload_path(&self, id: &str) -> std::path::PathBuf;

    /// Remove both files. Idempotent; missing files are not an error.
    async fn delete(&self, id: &str) -> TusResult<()>;

    /// List upload ids currently present, by scanning directory entries
    /// whose name is 32 characters (the "looks like an id" heuristic).
    async fn enumerate(&self) -> TusResult<Vec<String>>;
}
