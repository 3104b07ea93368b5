//! A small host application wiring `tus-upload` into a standalone Salvo
//! server: builder configuration, a completion hook, and a background
//! sweeper loop driving expiration.

use std::time::Duration;

use salvo::prelude::*;
use tracing::info;
use tus_upload::{sweep_expired, Tus};

#[handler]
async fn hello_world() -> &'static str {
    "Hello, world!"
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    let tus = Tus::new("./uploads")
        .prefix("files")
        .max_size(2 * 1024 * 1024 * 1024)
        .days_to_keep(7)
        .on_upload_complete(|path, metadata| {
            Box::pin(async move {
                info!(?path, name = ?metadata.get("name"), "upload complete");
            })
        });

    let store = tus.store_handle();
    let locker = tus.locker_handle();
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(3600));
        loop {
            tick.tick().await;
            let deleted = sweep_expired(store.as_ref(), locker.as_ref()).await;
            if deleted > 0 {
                info!(deleted, "expiration sweep removed uploads");
            }
        }
    });

    let router = Router::new()
        .get(hello_world)
        .push(tus.into_router());

    let acceptor = TcpListener::new("0.0.0.0:5800").bind().await;
    Server::new(acceptor).serve(router).await;
}
