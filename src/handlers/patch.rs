//! §4.4.4 (`PATCH /{id}`): append a chunk, completing the upload in place
//! when the stored offset reaches the declared size.

use std::sync::Arc;

use futures_util::StreamExt;
use salvo_core::http::{HeaderValue, StatusCode};
use salvo_core::{handler, Depot, Request, Response, Router};

use crate::handlers::apply_tus_resumable;
use crate::utils::{check_tus_version, parse_u64};
use crate::{ByteStream, TusError, Tus, H_TUS_RESUMABLE, H_UPLOAD_EXPIRES, H_UPLOAD_OFFSET};

#[handler]
async fn patch(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let state = depot.obtain::<Arc<Tus>>().expect("missing tus state");
    let opts = &state.options;
    let store = &state.store;
    apply_tus_resumable(res.headers_mut());

    let id = match opts.upload_id_from_request(req) {
        Ok(id) => id,
        Err(e) => {
            res.status_code(e.status());
            return;
        }
    };

    if let Err(e) = check_tus_version(req.headers().get(H_TUS_RESUMABLE).and_then(|v| v.to_str().ok())) {
        res.status_code(TusError::Protocol(e).status());
        return;
    }

    let asserted_offset = match parse_u64(
        req.headers().get(H_UPLOAD_OFFSET).and_then(|v| v.to_str().ok()),
        H_UPLOAD_OFFSET,
    ) {
        Ok(v) => v,
        Err(e) => {
            res.status_code(TusError::Protocol(e).status());
            return;
        }
    };

    if let Some(guard) = &opts.auth {
        if let Err(e) = guard(req).await {
            res.status_code(e.status());
            return;
        }
    }

    // §5: serialize concurrent PATCHes for the same id across the
    // load/append/save sequence.
    let _guard = opts.locker.write_lock(&id).await;

    let mut record = match store.load(&id).await {
        Ok(record) => record,
        Err(e) => {
            res.status_code(e.status());
            return;
        }
    };

    if record.offset != asserted_offset {
        tracing::info!(id, asserted_offset, stored_offset = record.offset, "offset mismatch");
        res.status_code(
            TusError::OffsetMismatch {
                expected: record.offset,
                got: asserted_offset,
            }
            .status(),
        );
        return;
    }

    // §9 (resolved): while the upload is deferred-length, every accepted
    // PATCH fixes `size` to the offset asserted *before* this chunk, not
    // `offset + Content-Length`. A deferred upload therefore only reaches
    // `is_complete` on a chunk whose body is empty (the client's way of
    // declaring "that was the last byte"). Preserved verbatim from the
    // source rather than silently corrected to standard creation-defer-
    // length semantics.
    if record.defer_length {
        record.size = Some(asserted_offset);
    }

    let stream: ByteStream = Box::pin(
        req.take_body()
            .map(|chunk| chunk.map_err(|e| std::io::Error::other(e.to_string()))),
    );
    if let Err(e) = store.append(&mut record, opts.max_size, stream).await {
        res.status_code(e.status());
        return;
    }

    if record.expires.is_empty() {
        record.expires = opts.expires_at();
    }
    if let Err(e) = store.save(&record).await {
        res.status_code(e.status());
        return;
    }

    res.status_code(StatusCode::NO_CONTENT);
    res.headers_mut().insert(
        H_UPLOAD_OFFSET,
        HeaderValue::from_str(&record.offset.to_string()).expect("ascii digits"),
    );
    res.headers_mut().insert(
        H_UPLOAD_EXPIRES,
        HeaderValue::from_str(&record.expires).expect("rfc3339 is ascii"),
    );

    if record.is_complete() {
        if let Some(hook) = &opts.on_upload_complete {
            hook(store.payload_path(&id), record.metadata.clone()).await;
        }
    }
}

pub fn patch_handler() -> Router {
    Router::with_path("{id}").patch(patch)
}
