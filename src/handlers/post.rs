//! §4.4.2 (`POST /`): create an upload, optionally with an initial chunk
//! (creation-with-upload).

use std::sync::Arc;

use futures_util::StreamExt;
use salvo_core::http::{HeaderValue, StatusCode};
use salvo_core::{handler, Depot, Request, Response, Router};

use crate::handlers::apply_tus_resumable;
use crate::record::{generate_upload_id, UploadMetadata, UploadRecord};
use crate::utils::{check_tus_version, parse_u64};
use crate::{
    ByteStream, TusError, Tus, H_CONTENT_LENGTH, H_TUS_RESUMABLE, H_UPLOAD_DEFER_LENGTH,
    H_UPLOAD_LENGTH, H_UPLOAD_METADATA, H_UPLOAD_OFFSET,
};

#[handler]
async fn create(req: &mut Request, depot: &mut Depot, res: &mut Response) {
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

    let upload_length = req.headers().get(H_UPLOAD_LENGTH).cloned();
    let upload_defer_length = req.headers().get(H_UPLOAD_DEFER_LENGTH).cloned();

    if let Some(value) = &upload_defer_length {
        if value.to_str().ok() != Some("1") {
            res.status_code(TusError::Protocol(crate::ProtocolError::InvalidDeferLength).status());
            return;
        }
    }

    // Exactly one of Upload-Length / Upload-Defer-Length is required.
    if upload_length.is_none() == upload_defer_length.is_none() {
        res.status_code(TusError::Protocol(crate::ProtocolError::InvalidLength).status());
        return;
    }

    let metadata = match req.headers().get(H_UPLOAD_METADATA).and_then(|v| v.to_str().ok()) {
        Some(raw) => match UploadMetadata::parse(raw) {
            Ok(m) => m,
            Err(e) => {
                res.status_code(TusError::Protocol(e).status());
                return;
            }
        },
        None => UploadMetadata::default(),
    };

    let size = match &upload_length {
        Some(value) => match parse_u64(value.to_str().ok(), H_UPLOAD_LENGTH) {
            Ok(size) => Some(size),
            Err(e) => {
                res.status_code(TusError::Protocol(e).status());
                return;
            }
        },
        None => None,
    };

    if let Some(size) = size {
        if size > opts.max_size {
            res.status_code(TusError::PayloadTooLarge.status());
            return;
        }
    }

    let id = generate_upload_id();
    let mut record = UploadRecord::new(id.clone(), metadata, size, opts.expires_at());

    if let Err(e) = store.create(&record).await {
        res.status_code(e.status());
        return;
    }

    // creation-with-upload (§4.3.2 step 6): stream whatever body accompanied
    // the request. An empty body is a no-op append, so this runs
    // unconditionally rather than keying off Content-Type.
    let cap = size.map(|s| s.min(opts.max_size)).unwrap_or(opts.max_size);
    if let Some(content_length) = req.headers().get(H_CONTENT_LENGTH) {
        match parse_u64(content_length.to_str().ok(), H_CONTENT_LENGTH) {
            Ok(v) if v > cap => {
                res.status_code(TusError::PayloadTooLarge.status());
                return;
            }
            Ok(_) => {}
            Err(e) => {
                res.status_code(TusError::Protocol(e).status());
                return;
            }
        }
    }

    let stream: ByteStream = Box::pin(
        req.take_body()
            .map(|chunk| chunk.map_err(|e| std::io::Error::other(e.to_string()))),
    );
    if let Err(e) = store.append(&mut record, opts.max_size, stream).await {
        res.status_code(e.status());
        return;
    }

    let location = opts.generate_location(req.headers(), &id);

    res.status_code(StatusCode::CREATED);
    res.headers_mut()
        .insert("location", HeaderValue::from_str(&location).expect("valid url"));
    res.headers_mut().insert(
        H_UPLOAD_OFFSET,
        HeaderValue::from_str(&record.offset.to_string()).expect("ascii digits"),
    );

    if record.is_complete() {
        if let Some(hook) = &opts.on_upload_complete {
            hook(store.payload_path(&id), record.metadata.clone()).await;
        }
    }
}

pub fn post_handler() -> Router {
    Router::new().post(create)
}
