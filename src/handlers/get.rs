//! §4.4.6 (`GET /{id}`): retrieval. Not part of tus 1.0.0 proper, but a
//! convenience extension the source also provides.

use std::sync::Arc;

use salvo_core::fs::NamedFile;
use salvo_core::{handler, Depot, Request, Response, Router};

use crate::handlers::apply_tus_resumable;
use crate::utils::check_tus_version;
use crate::{TusError, Tus, H_TUS_RESUMABLE};

#[handler]
async fn get(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let state = depot.obtain::<Arc<Tus>>().expect("missing tus state");
    let opts = &state.options;
    let store = &state.store;
    apply_tus_resumable(res.headers_mut());

    if let Err(e) = check_tus_version(req.headers().get(H_TUS_RESUMABLE).and_then(|v| v.to_str().ok())) {
        res.status_code(TusError::Protocol(e).status());
        return;
    }

    if let Some(guard) = &opts.auth {
        if let Err(e) = guard(req).await {
            res.status_code(e.status());
            return;
        }
    }

    let id = match opts.upload_id_from_request(req) {
        Ok(id) => id,
        Err(e) => {
            res.status_code(e.status());
            return;
        }
    };

    let _read_guard = opts.locker.read_lock(&id).await;

    let record = match store.load(&id).await {
        Ok(record) => record,
        Err(e) => {
            res.status_code(e.status());
            return;
        }
    };

    let attached_name = record
        .metadata
        .get("name")
        .or_else(|| record.metadata.get("filename"))
        .cloned()
        .unwrap_or_else(|| id.clone());

    let builder = NamedFile::builder(store.payload_path(&id))
        .content_type(mime::APPLICATION_OCTET_STREAM)
        .attached_name(attached_name);

    match builder.build().await {
        Ok(file) => file.send(req.headers(), res).await,
        Err(_) => {
            res.status_code(TusError::NotFound.status());
        }
    };
}

pub fn get_handler() -> Router {
    Router::with_path("{id}").get(get)
}
