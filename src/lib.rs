//! A [tus 1.0.0](https://tus.io/) resumable upload protocol implementation
//! mountable as a [Salvo](https://salvo.rs) router.
//!
//! Supports the `creation`, `creation-defer-length`, `creation-with-upload`,
//! `expiration`, and `termination` extensions against a filesystem-backed
//! store, plus a non-standard `GET /{id}` for retrieving a finished upload.
//!
//! # Example
//!
//! ```ignore
//! use salvo_core::prelude::*;
//! use tus_upload::Tus;
//!
//! let tus = Tus::new("./uploads")
//!     .prefix("files")
//!     .max_size(100 * 1024 * 1024);
//!
//! let router = Router::new().push(tus.into_router());
//!
//! let acceptor = TcpListener::new("0.0.0.0:8080").bind().await;
//! Server::new(acceptor).serve(router).await;
//! ```
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | OPTIONS | `/{prefix}` | Capability discovery |
//! | POST | `/{prefix}` | Create an upload |
//! | HEAD | `/{prefix}/{id}` | Status probe |
//! | PATCH | `/{prefix}/{id}` | Append a chunk |
//! | DELETE | `/{prefix}/{id}` | Terminate an upload |
//! | GET | `/{prefix}/{id}` | Retrieve a finished upload |
//! | OPTIONS | `/{prefix}/{id}` | Per-upload capability discovery |

pub mod error;
mod handlers;
pub mod locker;
pub mod options;
pub mod record;
pub mod store;
pub mod sweeper;
mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use salvo_core::{handler, Depot, Router};

pub use error::{ProtocolError, TusError, TusResult};
pub use locker::{LockGuard, Locker, MemoryLocker};
pub use options::{AuthGuard, OnUploadComplete, TusOptions};
pub use record::{generate_upload_id, UploadMetadata, UploadRecord};
pub use store::{ByteStream, DiskStore, UploadStore};
pub use sweeper::sweep_expired;

pub const TUS_VERSION: &str = "1.0.0";
pub const TUS_EXTENSIONS: &str =
    "creation,creation-defer-length,creation-with-upload,expiration,termination";

pub const H_TUS_RESUMABLE: &str = "tus-resumable";
pub const H_TUS_VERSION: &str = "tus-version";
pub const H_TUS_EXTENSION: &str = "tus-extension";
pub const H_TUS_MAX_SIZE: &str = "tus-max-size";

pub const H_UPLOAD_LENGTH: &str = "upload-length";
pub const H_UPLOAD_OFFSET: &str = "upload-offset";
pub const H_UPLOAD_METADATA: &str = "upload-metadata";
pub const H_UPLOAD_DEFER_LENGTH: &str = "upload-defer-length";
pub const H_UPLOAD_EXPIRES: &str = "upload-expires";

pub const H_CONTENT_LENGTH: &str = "content-length";

#[derive(Clone)]
struct TusStateHoop {
    state: Arc<Tus>,
}

#[handler]
impl TusStateHoop {
    async fn handle(&self, depot: &mut Depot) {
        depot.inject(self.state.clone());
    }
}

/// Builder for a mountable tus router. Configure it, then call
/// [`Tus::into_router`] to get a `Router` ready to `push` into your app.
#[derive(Clone)]
pub struct Tus {
    pub(crate) options: TusOptions,
    pub(crate) store: Arc<dyn UploadStore>,
}

impl Tus {
    /// A new instance storing uploads under `files_dir` (created on demand).
    pub fn new(files_dir: impl Into<PathBuf>) -> Self {
        let files_dir = files_dir.into();
        Self {
            store: Arc::new(DiskStore::new(files_dir.clone())),
            options: TusOptions {
                files_dir,
                ..TusOptions::default()
            },
        }
    }

    /// URL path segment under which routes mount (default `files`).
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.options.prefix = prefix.into();
        self
    }

    /// Hard cap on any single upload's final size, in bytes.
    pub fn max_size(mut self, max_size: u64) -> Self {
        self.options.max_size = max_size;
        self
    }

    /// Retention window: `expires` is set to this many days from creation
    /// (or from the PATCH that first needs it).
    pub fn days_to_keep(mut self, days: i64) -> Self {
        self.options.days_to_keep = days;
        self
    }

    /// Presentation tags, carried through for hosts that expose OpenAPI
    /// docs over this router.
    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.options.tags = tags;
        self
    }

    /// A guard invoked before every handler; an `Err` short-circuits the
    /// request with that error's status.
    pub fn auth(mut self, guard: AuthGuard) -> Self {
        self.options.auth = Some(guard);
        self
    }

    /// A hook invoked exactly once per upload, once `offset == size`.
    pub fn on_upload_complete(mut self, hook: OnUploadComplete) -> Self {
        self.options.on_upload_complete = Some(hook);
        self
    }

    /// Replace the default `DiskStore` with another [`UploadStore`].
    pub fn with_store(mut self, store: Arc<dyn UploadStore>) -> Self {
        self.store = store;
        self
    }

    /// Replace the default [`MemoryLocker`] with another [`Locker`].
    pub fn with_locker(mut self, locker: Arc<dyn Locker>) -> Self {
        self.options.locker = locker;
        self
    }

    /// The configured store, for a host that wants to drive
    /// [`sweep_expired`] itself (e.g. from a periodic background task).
    pub fn store_handle(&self) -> Arc<dyn UploadStore> {
        self.store.clone()
    }

    /// The configured locker, paired with [`Tus::store_handle`] for driving
    /// [`sweep_expired`] outside of request handling.
    pub fn locker_handle(&self) -> Arc<dyn Locker> {
        self.options.locker.clone()
    }

    /// Assemble the configured router. Mount it with `Router::push`.
    pub fn into_router(self) -> Router {
        let prefix = utils::normalize_prefix(&self.options.prefix);
        let state = Arc::new(self);

        Router::with_path(prefix)
            .hoop(TusStateHoop { state: state.clone() })
            .push(handlers::options_handler())
            .push(handlers::post_handler())
            .push(handlers::head_handler())
            .push(handlers::patch_handler())
            .push(handlers::delete_handler())
            .push(handlers::get_handler())
    }
}
