//! The Protocol Handler (§4.4): one Salvo route per tus verb, all sharing
//! the `Arc<Tus>` state a [`crate::TusStateHoop`] injects into the `Depot`.

mod delete;
mod get;
mod head;
mod options;
mod patch;
mod post;

pub use delete::delete_handler;
pub use get::get_handler;
pub use head::head_handler;
pub use options::options_handler;
pub use patch::patch_handler;
pub use post::post_handler;

use salvo_core::http::{HeaderMap, HeaderValue};

use crate::{H_TUS_RESUMABLE, TUS_VERSION};

/// Every tus response, success or error, carries this.
pub(crate) fn apply_tus_resumable(headers: &mut HeaderMap) {
    headers.insert(H_TUS_RESUMABLE, HeaderValue::from_static(TUS_VERSION));
}
