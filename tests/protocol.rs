//! End-to-end protocol coverage: a full create/patch/head/get/delete cycle
//! plus the edge cases the handlers are individually unit-tested against.

use base64::Engine;
use salvo_core::http::StatusCode;
use salvo_core::test::{ResponseExt, TestClient};
use salvo_core::Service;
use tus_upload::Tus;

const TUS_RESUMABLE: &str = "1.0.0";
const OFFSET_OCTET_STREAM: &str = "application/offset+octet-stream";

fn b64(s: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(s)
}

fn service(max_size: u64) -> (tempfile::TempDir, Service) {
    let dir = tempfile::tempdir().unwrap();
    let tus = Tus::new(dir.path()).prefix("files").max_size(max_size);
    (dir, Service::new(tus.into_router()))
}

fn location_id(location: &str) -> String {
    location.rsplit('/').next().unwrap().to_string()
}

#[tokio::test]
async fn options_advertises_extensions_and_max_size() {
    let (_dir, service) = service(100);

    let res = TestClient::options("http://127.0.0.1:5900/files").send(&service).await;

    assert_eq!(res.status_code.unwrap(), StatusCode::NO_CONTENT);
    let headers = res.headers();
    assert_eq!(headers.get("tus-resumable").unwrap(), TUS_RESUMABLE);
    assert_eq!(headers.get("tus-version").unwrap(), TUS_RESUMABLE);
    assert_eq!(
        headers.get("tus-extension").unwrap(),
        "creation,creation-defer-length,creation-with-upload,expiration,termination"
    );
    assert_eq!(headers.get("tus-max-size").unwrap(), "100");
}

#[tokio::test]
async fn create_then_patch_then_head_reports_completion() {
    let (_dir, service) = service(1024);

    let mut create_res = TestClient::post("http://127.0.0.1:5900/files")
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .add_header("upload-length", "5", true)
        .add_header(
            "upload-metadata",
            format!("filename {},filetype {}", b64("a.txt"), b64("text/plain")),
            true,
        )
        .send(&service)
        .await;
    assert_eq!(create_res.status_code.unwrap(), StatusCode::CREATED);
    let location = create_res.headers().get("location").unwrap().to_str().unwrap().to_string();
    let id = location_id(&location);
    assert_eq!(create_res.headers().get("upload-offset").unwrap(), "0");

    let patch_res = TestClient::patch(format!("http://127.0.0.1:5900/files/{id}"))
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .add_header("upload-offset", "0", true)
        .add_header("content-type", OFFSET_OCTET_STREAM, true)
        .bytes(b"hello".to_vec())
        .send(&service)
        .await;
    assert_eq!(patch_res.status_code.unwrap(), StatusCode::NO_CONTENT);
    assert_eq!(patch_res.headers().get("upload-offset").unwrap(), "5");

    let mut head_res = TestClient::head(format!("http://127.0.0.1:5900/files/{id}"))
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .send(&service)
        .await;
    assert_eq!(head_res.status_code.unwrap(), StatusCode::OK);
    assert_eq!(head_res.headers().get("upload-offset").unwrap(), "5");
    assert_eq!(head_res.headers().get("upload-length").unwrap(), "5");
    assert_eq!(head_res.headers().get("cache-control").unwrap(), "no-store");
    let metadata_header = head_res.headers().get("upload-metadata").unwrap().to_str().unwrap();
    assert_eq!(
        metadata_header,
        format!("filename {},filetype {}", b64("a.txt"), b64("text/plain"))
    );
    let _ = head_res.take_string().await;

    let mut get_res = TestClient::get(format!("http://127.0.0.1:5900/files/{id}"))
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .send(&service)
        .await;
    assert_eq!(get_res.status_code.unwrap(), StatusCode::OK);
    let body = get_res.take_bytes().await.unwrap();
    assert_eq!(&body[..], b"hello");
}

#[tokio::test]
async fn creation_with_upload_stores_initial_chunk() {
    let (_dir, service) = service(1024);

    let create_res = TestClient::post("http://127.0.0.1:5900/files")
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .add_header("upload-length", "5", true)
        .add_header("content-type", OFFSET_OCTET_STREAM, true)
        .bytes(b"hello".to_vec())
        .send(&service)
        .await;

    assert_eq!(create_res.status_code.unwrap(), StatusCode::CREATED);
    assert_eq!(create_res.headers().get("upload-offset").unwrap(), "5");
}

#[tokio::test]
async fn deferred_length_completes_on_empty_final_patch() {
    let (_dir, service) = service(1024);

    let create_res = TestClient::post("http://127.0.0.1:5900/files")
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .add_header("upload-defer-length", "1", true)
        .send(&service)
        .await;
    assert_eq!(create_res.status_code.unwrap(), StatusCode::CREATED);
    let location = create_res.headers().get("location").unwrap().to_str().unwrap().to_string();
    let id = location_id(&location);

    let mut head_res = TestClient::head(format!("http://127.0.0.1:5900/files/{id}"))
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .send(&service)
        .await;
    assert_eq!(head_res.headers().get("upload-defer-length").unwrap(), "1");
    let _ = head_res.take_string().await;

    let patch1 = TestClient::patch(format!("http://127.0.0.1:5900/files/{id}"))
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .add_header("upload-offset", "0", true)
        .add_header("content-type", OFFSET_OCTET_STREAM, true)
        .bytes(b"abc".to_vec())
        .send(&service)
        .await;
    assert_eq!(patch1.status_code.unwrap(), StatusCode::NO_CONTENT);
    assert_eq!(patch1.headers().get("upload-offset").unwrap(), "3");

    // Deferred-length semantics: size tracks the pre-chunk offset on every
    // accepted PATCH, so completion only happens on an empty-bodied PATCH.
    let patch2 = TestClient::patch(format!("http://127.0.0.1:5900/files/{id}"))
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .add_header("upload-offset", "3", true)
        .add_header("content-type", OFFSET_OCTET_STREAM, true)
        .bytes(Vec::new())
        .send(&service)
        .await;
    assert_eq!(patch2.status_code.unwrap(), StatusCode::NO_CONTENT);
    assert_eq!(patch2.headers().get("upload-offset").unwrap(), "3");

    let mut final_head = TestClient::head(format!("http://127.0.0.1:5900/files/{id}"))
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .send(&service)
        .await;
    assert_eq!(final_head.headers().get("upload-length").unwrap(), "3");
    let _ = final_head.take_string().await;
}

#[tokio::test]
async fn patch_with_wrong_offset_returns_conflict() {
    let (_dir, service) = service(1024);

    let create_res = TestClient::post("http://127.0.0.1:5900/files")
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .add_header("upload-length", "5", true)
        .send(&service)
        .await;
    let location = create_res.headers().get("location").unwrap().to_str().unwrap().to_string();
    let id = location_id(&location);

    let res = TestClient::patch(format!("http://127.0.0.1:5900/files/{id}"))
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .add_header("upload-offset", "2", true)
        .add_header("content-type", OFFSET_OCTET_STREAM, true)
        .bytes(b"hi".to_vec())
        .send(&service)
        .await;

    assert_eq!(res.status_code.unwrap(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn patch_exceeding_max_size_is_rejected() {
    let (_dir, service) = service(3);

    let create_res = TestClient::post("http://127.0.0.1:5900/files")
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .add_header("upload-defer-length", "1", true)
        .send(&service)
        .await;
    let location = create_res.headers().get("location").unwrap().to_str().unwrap().to_string();
    let id = location_id(&location);

    let res = TestClient::patch(format!("http://127.0.0.1:5900/files/{id}"))
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .add_header("upload-offset", "0", true)
        .add_header("content-type", OFFSET_OCTET_STREAM, true)
        .bytes(b"hello".to_vec())
        .send(&service)
        .await;

    assert_eq!(res.status_code.unwrap(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn delete_then_head_get_patch_delete_all_404() {
    let (_dir, service) = service(1024);

    let create_res = TestClient::post("http://127.0.0.1:5900/files")
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .add_header("upload-length", "5", true)
        .send(&service)
        .await;
    let location = create_res.headers().get("location").unwrap().to_str().unwrap().to_string();
    let id = location_id(&location);

    let delete_res = TestClient::delete(format!("http://127.0.0.1:5900/files/{id}"))
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .send(&service)
        .await;
    assert_eq!(delete_res.status_code.unwrap(), StatusCode::NO_CONTENT);

    let mut head_res = TestClient::head(format!("http://127.0.0.1:5900/files/{id}"))
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .send(&service)
        .await;
    assert_eq!(head_res.status_code.unwrap(), StatusCode::NOT_FOUND);
    let _ = head_res.take_string().await;

    let mut get_res = TestClient::get(format!("http://127.0.0.1:5900/files/{id}"))
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .send(&service)
        .await;
    assert_eq!(get_res.status_code.unwrap(), StatusCode::NOT_FOUND);
    let _ = get_res.take_string().await;

    let patch_res = TestClient::patch(format!("http://127.0.0.1:5900/files/{id}"))
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .add_header("upload-offset", "0", true)
        .add_header("content-type", OFFSET_OCTET_STREAM, true)
        .bytes(b"hi".to_vec())
        .send(&service)
        .await;
    assert_eq!(patch_res.status_code.unwrap(), StatusCode::NOT_FOUND);

    let second_delete = TestClient::delete(format!("http://127.0.0.1:5900/files/{id}"))
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .send(&service)
        .await;
    assert_eq!(second_delete.status_code.unwrap(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_tus_resumable_header_is_bad_request() {
    let (_dir, service) = service(1024);

    let res = TestClient::post("http://127.0.0.1:5900/files")
        .add_header("upload-length", "5", true)
        .send(&service)
        .await;

    assert_eq!(res.status_code.unwrap(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_requires_exactly_one_of_length_or_defer_length() {
    let (_dir, service) = service(1024);

    let both = TestClient::post("http://127.0.0.1:5900/files")
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .add_header("upload-length", "5", true)
        .add_header("upload-defer-length", "1", true)
        .send(&service)
        .await;
    assert_eq!(both.status_code.unwrap(), StatusCode::BAD_REQUEST);

    let neither = TestClient::post("http://127.0.0.1:5900/files")
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .send(&service)
        .await;
    assert_eq!(neither.status_code.unwrap(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_over_max_size_is_rejected() {
    let (_dir, service) = service(10);

    let res = TestClient::post("http://127.0.0.1:5900/files")
        .add_header("tus-resumable", TUS_RESUMABLE, true)
        .add_header("upload-length", "11", true)
        .send(&service)
        .await;

    assert_eq!(res.status_code.unwrap(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn options_by_id_404s_for_unknown_upload() {
    let (_dir, service) = service(1024);

    let res = TestClient::options("http://127.0.0.1:5900/files/00000000000000000000000000000000")
        .send(&service)
        .await;

    assert_eq!(res.status_code.unwrap(), StatusCode::NOT_FOUND);
}
