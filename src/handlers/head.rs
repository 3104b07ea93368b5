//! §4.4.3 (`HEAD /{id}`): status probe.

use std::sync::Arc;

use salvo_core::http::{HeaderValue, StatusCode};
use salvo_core::{handler, Depot, Request, Response, Router};

use crate::handlers::apply_tus_resumable;
use crate::utils::check_tus_version;
use crate::{
    ProtocolError, TusError, Tus, H_CONTENT_LENGTH, H_TUS_RESUMABLE, H_UPLOAD_DEFER_LENGTH,
    H_UPLOAD_LENGTH, H_UPLOAD_METADATA, H_UPLOAD_OFFSET,
};
use base64::Engine;

#[handler]
async fn head(req: &mut Request, depot: &mut Depot, res: &mut Response) {
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

    let record = match store.load(&id).await {
        Ok(record) => record,
        Err(e) => {
            res.status_code(e.status());
            return;
        }
    };

    let (Some(filename), Some(filetype)) = (record.metadata.filename(), record.metadata.filetype()) else {
        res.status_code(TusError::Protocol(ProtocolError::MissingMetadataField("filename/filetype")).status());
        return;
    };
    let metadata_header = format!(
        "filename {},filetype {}",
        base64::engine::general_purpose::STANDARD.encode(filename),
        base64::engine::general_purpose::STANDARD.encode(filetype),
    );

    res.status_code(StatusCode::OK);
    res.headers_mut().insert(
        H_UPLOAD_OFFSET,
        HeaderValue::from_str(&record.offset.to_string()).expect("ascii digits"),
    );
    match record.size {
        Some(size) => {
            res.headers_mut().insert(
                H_CONTENT_LENGTH,
                HeaderValue::from_str(&size.to_string()).expect("ascii digits"),
            );
            res.headers_mut().insert(
                H_UPLOAD_LENGTH,
                HeaderValue::from_str(&size.to_string()).expect("ascii digits"),
            );
        }
        None => {
            res.headers_mut()
                .insert(H_UPLOAD_DEFER_LENGTH, HeaderValue::from_static("1"));
        }
    }
    res.headers_mut()
        .insert("cache-control", HeaderValue::from_static("no-store"));
    res.headers_mut().insert(
        H_UPLOAD_METADATA,
        HeaderValue::from_str(&metadata_header).expect("base64 is ascii"),
    );
}

pub fn head_handler() -> Router {
    Router::with_path("{id}").head(head)
}
