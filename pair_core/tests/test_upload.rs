use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use pair_core::http_share::create_router;
use pair_core::{DownloadMode, ServerConfig};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "----pairTestBoundary7MA4YWxkTrZu0gW";

/// (field name, file name, content)
type Part<'a> = (&'a str, Option<&'a str>, &'a [u8]);

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, file_name, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match file_name {
            Some(name) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n",
                    field, name
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", field).as_bytes(),
            ),
        }
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn upload(dir: &Path, parts: &[Part<'_>]) -> Response {
    let router = create_router(Arc::new(ServerConfig::new(dir, DownloadMode::None)));
    router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(multipart_body(parts)))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[tokio::test]
async fn test_upload_two_files() {
    let dir = tempfile::tempdir().unwrap();
    let photo: Vec<u8> = (0..=255u8).cycle().take(5000).collect();

    let response = upload(
        dir.path(),
        &[
            ("files", Some("notes.txt"), b"hello from the phone"),
            ("files", Some("photo.jpg"), &photo),
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        "Successfully uploaded 2 files: notes.txt, photo.jpg"
    );
    assert_eq!(
        std::fs::read(dir.path().join("notes.txt")).unwrap(),
        b"hello from the phone"
    );
    assert_eq!(std::fs::read(dir.path().join("photo.jpg")).unwrap(), photo);
}

#[cfg(unix)]
#[tokio::test]
async fn test_uploaded_file_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let response = upload(dir.path(), &[("files", Some("m.txt"), b"x")]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let mode = std::fs::metadata(dir.path().join("m.txt"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o644);
}

#[tokio::test]
async fn test_name_conflict_keeps_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("taken.txt"), b"original").unwrap();

    let response = upload(
        dir.path(),
        &[
            ("files", Some("first.txt"), b"saved before the conflict"),
            ("files", Some("taken.txt"), b"intruder"),
            ("files", Some("never.txt"), b"not reached"),
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(body_text(response).await.contains("taken.txt already exists"));
    assert_eq!(std::fs::read(dir.path().join("taken.txt")).unwrap(), b"original");
    // No rollback of parts saved earlier in the batch
    assert!(dir.path().join("first.txt").exists());
    assert!(!dir.path().join("never.txt").exists());
}

#[tokio::test]
async fn test_upload_without_files_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();

    let response = upload(dir.path(), &[("comment", None, b"just text")]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("No files were uploaded"));

    let response = upload(dir.path(), &[("other", Some("x.txt"), b"wrong field")]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(!dir.path().join("x.txt").exists());
}

#[tokio::test]
async fn test_upload_not_multipart_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let router = create_router(Arc::new(ServerConfig::new(dir.path(), DownloadMode::None)));

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("nope"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_strips_client_directories() {
    let dir = tempfile::tempdir().unwrap();
    let share = dir.path().join("share");
    std::fs::create_dir(&share).unwrap();

    let response = upload(&share, &[("files", Some("../escape.txt"), b"contained")]).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(share.join("escape.txt").exists());
    assert!(!dir.path().join("escape.txt").exists());
}

#[tokio::test]
async fn test_upload_rejects_unusable_name() {
    let dir = tempfile::tempdir().unwrap();
    let response = upload(dir.path(), &[("files", Some(".."), b"x")]).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_larger_than_default_body_limit() {
    let dir = tempfile::tempdir().unwrap();
    let big: Vec<u8> = (0..5 * 1024 * 1024).map(|i| (i % 7) as u8).collect();

    let response = upload(dir.path(), &[("files", Some("big.bin"), &big)]).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(std::fs::read(dir.path().join("big.bin")).unwrap(), big);
}

#[tokio::test]
async fn test_uploaded_file_is_downloadable_when_allow_listed() {
    let dir = tempfile::tempdir().unwrap();
    let response = upload(dir.path(), &[("files", Some("shared.txt"), b"round trip")]).await;
    assert_eq!(response.status(), StatusCode::OK);

    let router = create_router(Arc::new(ServerConfig::new(
        dir.path(),
        DownloadMode::Single("shared.txt".into()),
    )));
    let response = router
        .oneshot(
            Request::builder()
                .uri("/download/shared.txt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "round trip");
}

#[tokio::test]
async fn test_empty_filename_part_is_skipped() {
    let dir = tempfile::tempdir().unwrap();

    let response = upload(
        dir.path(),
        &[
            ("files", Some("ok.txt"), b"kept"),
            ("files", Some(""), b""),
        ],
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "Successfully uploaded 1 files: ok.txt");
    assert_eq!(std::fs::read(dir.path().join("ok.txt")).unwrap(), b"kept");
}

#[tokio::test]
async fn test_only_empty_filename_is_bad_request() {
    let dir = tempfile::tempdir().unwrap();
    let response = upload(dir.path(), &[("files", Some(""), b"")]).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("No files were uploaded"));
}
