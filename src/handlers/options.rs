//! §4.4.1 (`OPTIONS /`) and §4.4.7 (`OPTIONS /{id}`): capability discovery.

use std::sync::Arc;

use salvo_core::http::{HeaderValue, StatusCode};
use salvo_core::{handler, Depot, Request, Response, Router};

use crate::handlers::apply_tus_resumable;
use crate::{TusError, H_TUS_EXTENSION, H_TUS_MAX_SIZE, H_TUS_VERSION, TUS_EXTENSIONS, TUS_VERSION, Tus};

#[handler]
async fn options(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let state = depot.obtain::<Arc<Tus>>().expect("missing tus state");
    let opts = &state.options;

    apply_tus_resumable(res.headers_mut());

    if let Some(guard) = &opts.auth {
        if let Err(e) = guard(req).await {
            res.status_code(e.status());
            return;
        }
    }

    res.status_code(StatusCode::NO_CONTENT);
    res.headers_mut()
        .insert(H_TUS_VERSION, HeaderValue::from_static(TUS_VERSION));
    res.headers_mut()
        .insert(H_TUS_EXTENSION, HeaderValue::from_static(TUS_EXTENSIONS));
    res.headers_mut().insert(
        H_TUS_MAX_SIZE,
        HeaderValue::from_str(&opts.max_size.to_string()).expect("ascii digits"),
    );
}

#[handler]
async fn options_by_id(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let state = depot.obtain::<Arc<Tus>>().expect("missing tus state");
    let opts = &state.options;

    apply_tus_resumable(res.headers_mut());

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
    if !state.store.exists(&id).await {
        res.status_code(TusError::NotFound.status());
        return;
    }
    res.status_code(StatusCode::NO_CONTENT);
    res.headers_mut()
        .insert(H_TUS_VERSION, HeaderValue::from_static(TUS_VERSION));
    res.headers_mut()
        .insert(H_TUS_EXTENSION, HeaderValue::from_static(TUS_EXTENSIONS));
}

pub fn options_handler() -> Router {
    Router::new()
        .options(options)
        .push(Router::with_path("{id}").options(options_by_id))
}
