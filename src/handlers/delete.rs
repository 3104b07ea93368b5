//! §4.4.5 (`DELETE /{id}`): termination.

use std::sync::Arc;

use salvo_core::http::StatusCode;
use salvo_core::{handler, Depot, Request, Response, Router};

use crate::handlers::apply_tus_resumable;
use crate::utils::check_tus_version;
use crate::{TusError, Tus, H_TUS_RESUMABLE};

#[handler]
async fn delete(req: &mut Request, depot: &mut Depot, res: &mut Response) {
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

    if !store.exists(&id).await {
        res.status_code(TusError::NotFound.status());
        return;
    }

    if let Err(e) = store.delete(&id).await {
        res.status_code(e.status());
        return;
    }

    res.status_code(StatusCode::NO_CONTENT);
}

pub fn delete_handler() -> Router {
    Router::with_path("{id}").delete(delete)
}
