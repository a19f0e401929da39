use std::fs;
use std::sync::Arc;

use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use dirstore_http::{router, serve, Error, HttpFileStore, RemoteFile, ServerConfig};
use dirstore_mutation::{MutationEngine, MutationStatus, Root};

#[tokio::test]
async fn test_read_returns_content_and_etag() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/docs/readme.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("ETag", "W/\"5-1a\"")
                .set_body_string("hello"),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        let store = HttpFileStore::new(&uri).unwrap();
        store.read("docs/readme.txt").unwrap()
    })
    .await
    .unwrap();

    assert_eq!(
        result,
        Some(RemoteFile {
            content: "hello".to_string(),
            etag: Some("W/\"5-1a\"".to_string()),
        })
    );
}

#[tokio::test]
async fn test_read_returns_none_on_404() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let uri = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        let store = HttpFileStore::new(&uri).unwrap();
        store.read("missing.txt").unwrap()
    })
    .await
    .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_read_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken.txt"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        let store = HttpFileStore::new(&uri).unwrap();
        store.read("broken.txt")
    })
    .await
    .unwrap();

    match result {
        Err(Error::UnexpectedStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("Expected UnexpectedStatus, got {:?}", other),
    }
}

#[tokio::test]
async fn test_write_sends_json_and_if_match() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/notes.txt"))
        .and(header("If-Match", "W/\"5-1a\""))
        .and(body_json(serde_json::json!({ "newText": "edited" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let status = tokio::task::spawn_blocking(move || {
        let store = HttpFileStore::new(&uri).unwrap();
        store.write("notes.txt", "edited", Some("W/\"5-1a\"")).unwrap()
    })
    .await
    .unwrap();

    assert_eq!(status, MutationStatus::NoContent);
}

#[tokio::test]
async fn test_write_maps_refusals() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/stale.txt"))
        .respond_with(ResponseTemplate::new(412).set_body_string("Precondition Failed"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/locked.txt"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let uri = server.uri();
    let (stale, locked) = tokio::task::spawn_blocking(move || {
        let store = HttpFileStore::new(&uri).unwrap();
        (
            store.write("stale.txt", "x", Some("W/\"0-0\"")).unwrap(),
            store.write("locked.txt", "x", None).unwrap(),
        )
    })
    .await
    .unwrap();

    assert_eq!(stale, MutationStatus::PreconditionFailed);
    assert_eq!(locked, MutationStatus::Forbidden);
}

#[tokio::test]
async fn test_delete_without_precondition() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/old.txt"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let status = tokio::task::spawn_blocking(move || {
        let store = HttpFileStore::new(&uri).unwrap();
        store.delete("old.txt", None).unwrap()
    })
    .await
    .unwrap();

    assert_eq!(status, MutationStatus::NoContent);

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("If-Match").is_none());
}

#[tokio::test]
async fn test_unexpected_mutation_status() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/odd.txt"))
        .respond_with(ResponseTemplate::new(418).set_body_string("teapot"))
        .mount(&server)
        .await;

    let uri = server.uri();
    let result = tokio::task::spawn_blocking(move || {
        let store = HttpFileStore::new(&uri).unwrap();
        store.delete("odd.txt", None)
    })
    .await
    .unwrap();

    assert!(matches!(
        result,
        Err(Error::UnexpectedStatus { status: 418, .. })
    ));
}

#[tokio::test]
async fn test_invalid_if_match_rejected_locally() {
    let result = tokio::task::spawn_blocking(|| {
        let store = HttpFileStore::new("http://127.0.0.1:9").unwrap();
        store.write("a.txt", "x", Some("bad\ntag"))
    })
    .await
    .unwrap();

    assert!(matches!(result, Err(Error::InvalidHeaderValue(_))));
}

#[tokio::test]
async fn test_client_against_server() {
    let dir = tempfile::TempDir::new().unwrap();
    let engine = Arc::new(MutationEngine::new(Root::new(dir.path()).unwrap()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(serve(
        listener,
        router(engine, ServerConfig::default()),
        std::future::pending(),
    ));

    let statuses = tokio::task::spawn_blocking(move || {
        let store = HttpFileStore::new(&base).unwrap();
        let mut statuses = Vec::new();

        statuses.push(store.write("docs/readme.txt", "first", None).unwrap());
        let t1 = store.read("docs/readme.txt").unwrap().unwrap();
        assert_eq!(t1.content, "first");

        statuses.push(
            store
                .write("docs/readme.txt", "second draft", t1.etag.as_deref())
                .unwrap(),
        );
        statuses.push(
            store
                .write("docs/readme.txt", "stale", t1.etag.as_deref())
                .unwrap(),
        );

        let t2 = store.read("docs/readme.txt").unwrap().unwrap();
        assert_eq!(t2.content, "second draft");
        statuses.push(store.delete("docs/readme.txt", t2.etag.as_deref()).unwrap());
        statuses.push(store.delete("docs/readme.txt", t2.etag.as_deref()).unwrap());
        assert!(store.read("docs/readme.txt").unwrap().is_none());

        statuses
    })
    .await
    .unwrap();

    assert_eq!(
        statuses,
        vec![
            MutationStatus::Created,
            MutationStatus::NoContent,
            MutationStatus::PreconditionFailed,
            MutationStatus::NoContent,
            MutationStatus::NotFound,
        ]
    );
    assert!(fs::read_dir(dir.path().join("docs")).unwrap().next().is_none());
}
