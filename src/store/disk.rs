//! Filesystem-backed [`UploadStore`] (§4.1). Two entries per upload under
//! `root`: the raw payload at `<id>` and its JSON sidecar at `<id>.info`.
//! Sidecar writes go through a temp-file-and-rename so a crash mid-write
//! never leaves a torn record, mirroring the teacher's `write_meta_atomic`.

use std::path::PathBuf;

use futures_util::StreamExt;
use salvo_core::async_trait;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use crate::error::{TusError, TusResult};
use crate::record::UploadRecord;

use super::{ByteStream, UploadStore};

const SIDECAR_SUFFIX: &str = ".info";

/// A single `files_dir` directory holding every upload's payload and sidecar.
#[derive(Clone, Debug)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn data_path(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    fn meta_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}{SIDECAR_SUFFIX}"))
    }

    fn meta_tmp_path(&self, id: &str) -> PathBuf {
        self.root.join(format!("{id}{SIDECAR_SUFFIX}.tmp"))
    }

    async fn ensure_root(&self) -> TusResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| TusError::Internal(format!("create files_dir: {e}")))
    }

    async fn write_meta_atomic(&self, record: &UploadRecord) -> TusResult<()> {
        let tmp = self.meta_tmp_path(&record.id);
        let body = serde_json::to_vec(record)
            .map_err(|e| TusError::Internal(format!("serialize sidecar: {e}")))?;
        fs::write(&tmp, &body)
            .await
            .map_err(|e| TusError::Internal(format!("write sidecar tmp: {e}")))?;
        fs::rename(&tmp, self.meta_path(&record.id))
            .await
            .map_err(|e| TusError::Internal(format!("rename sidecar into place: {e}")))
    }

    async fn read_meta(&self, id: &str) -> TusResult<UploadRecord> {
        let body = fs::read(self.meta_path(id)).await.map_err(|_| TusError::NotFound)?;
        serde_json::from_slice(&body).map_err(|_| TusError::NotFound)
    }
}

#[async_trait]
impl UploadStore for DiskStore {
    async fn create(&self, record: &UploadRecord) -> TusResult<()> {
        self.ensure_root().await?;
        File::create(self.data_path(&record.id))
            .await
            .map_err(|e| TusError::Internal(format!("create payload file: {e}")))?;
        self.write_meta_atomic(record).await
    }

    async fn exists(&self, id: &str) -> bool {
        fs::metadata(self.data_path(id)).await.is_ok()
    }

    async fn load(&self, id: &str) -> TusResult<UploadRecord> {
        if !self.exists(id).await {
            return Err(TusError::NotFound);
        }
        self.read_meta(id).await
    }

    async fn save(&self, record: &UploadRecord) -> TusResult<()> {
        self.write_meta_atomic(record).await
    }

    async fn append(
        &self,
        record: &mut UploadRecord,
        max_size: u64,
        mut stream: ByteStream,
    ) -> TusResult<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(self.data_path(&record.id))
            .await
            .map_err(|e| TusError::Internal(format!("open payload for append: {e}")))?;

        while let Some(item) = stream.next().await {
            let chunk = item.map_err(|e| TusError::Internal(format!("read request body: {e}")))?;
            if chunk.is_empty() {
                continue;
            }
            let len = chunk.len() as u64;
            if record.offset + len > max_size {
                return Err(TusError::PayloadTooLarge);
            }

            file.write_all(&chunk)
                .await
                .map_err(|e| TusError::Internal(format!("write payload chunk: {e}")))?;
            file.flush()
                .await
                .map_err(|e| TusError::Internal(format!("flush payload chunk: {e}")))?;

            record.offset += len;
            record.upload_chunk_size = len;
            record.upload_part += 1;
            self.write_meta_atomic(record).await?;
        }

        Ok(())
    }

    async fn read(&self, id: &str) -> TusResult<ByteStream> {
        let file = File::open(self.data_path(id)).await.map_err(|_| TusError::NotFound)?;
        Ok(Box::pin(ReaderStream::new(file)))
    }

    fn payload_path(&self, id: &str) -> PathBuf {
        self.data_path(id)
    }

    async fn delete(&self, id: &str) -> TusResult<()> {
        for path in [self.data_path(id), self.meta_path(id)] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(TusError::Internal(format!("delete {}: {e}", path.display()))),
            }
        }
        Ok(())
    }

    async fn enumerate(&self) -> TusResult<Vec<String>> {
        self.ensure_root().await?;
        let mut ids = Vec::new();
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| TusError::Internal(format!("read files_dir: {e}")))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| TusError::Internal(format!("read dir entry: {e}")))?
        {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.len() == 32 {
                ids.push(name.into_owned());
            }
        }
        Ok(ids)
    }
}
