//! End-to-end scenarios driven over an in-memory duplex stream, one per `Connection`.

use std::sync::Arc;

use corehttp::config::Config;
use corehttp::connection::Connection;
use corehttp::response::Response;
use corehttp::router::RouterBuilder;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

async fn roundtrip(router: corehttp::Router, input: &[u8]) -> String {
    let (mut client, server_sock) = tokio::io::duplex(64 * 1024);
    let conn = Connection::new(server_sock, Arc::new(Config::default()), router, None);
    let handle = tokio::spawn(conn.run());

    client.write_all(input).await.unwrap();
    client.shutdown().await.unwrap();

    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    handle.await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn minimal_200_response() {
    let mut builder = RouterBuilder::new();
    builder.get("/", |_req| async { Response::new() });
    let router = builder.build();

    let resp = roundtrip(router, b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n").await;
    assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(resp.contains("Content-Length: 0\r\n"));
    assert!(resp.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn chunked_echo() {
    let mut builder = RouterBuilder::new();
    builder.post("/echo", |mut req| async move {
        let reader = req.take_body();
        let mut body = Vec::new();
        if let Some(mut reader) = reader {
            loop {
                let (chunk, status) = reader.read();
                body.extend_from_slice(&chunk);
                if status == corehttp::body::ReadStatus::End {
                    break;
                }
            }
        }
        Response::new().bytes(body)
    });
    let router = builder.build();

    let input = b"POST /echo HTTP/1.1\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n7\r\nMozilla\r\n1\r\n \r\n11\r\nDeveloper Network\r\n0\r\n\r\n";
    let resp = roundtrip(router, input).await;
    assert!(resp.contains("Content-Length: 25\r\n"));
    assert!(resp.ends_with("Mozilla Developer Network"));
}

#[tokio::test]
async fn percent_decoded_query() {
    let mut builder = RouterBuilder::new();
    builder.get("/q", |mut req| async move {
        let q = req.query();
        let pairs: Vec<String> = q.iter().map(|(k, v)| format!("{k}={v}")).collect();
        Response::new().string(pairs.join("&"))
    });
    let router = builder.build();

    let input = b"GET /q?hello=world&%20foo=+bar HTTP/1.1\r\nConnection: close\r\n\r\n";
    let resp = roundtrip(router, input).await;
    assert!(resp.ends_with("hello=world& foo= bar"));
}

#[tokio::test]
async fn http10_keep_alive_truth_table() {
    let mut builder = RouterBuilder::new();
    builder.get("/x", |_req| async { Response::new().string("ok") });
    let router = builder.build();

    let one_request = b"GET /x HTTP/1.0\r\nConnection: keep-alive\r\n\r\n";
    let input: Vec<u8> = one_request.repeat(10);
    let resp = roundtrip(router, &input).await;
    assert_eq!(resp.matches("ok").count(), 10, "expected 10 responses, got: {resp}");
}

#[tokio::test]
async fn http10_without_keep_alive_closes_after_first() {
    let mut builder = RouterBuilder::new();
    builder.get("/x", |_req| async { Response::new().string("ok") });
    let router = builder.build();

    let input: Vec<u8> = b"GET /x HTTP/1.0\r\n\r\n".repeat(10);
    let resp = roundtrip(router, &input).await;
    assert_eq!(resp.matches("ok").count(), 1);
}

#[tokio::test]
async fn method_not_allowed_reports_allow_header() {
    let mut builder = RouterBuilder::new();
    builder.resource("/r").get(|_req| async { Response::new() }).post(|_req| async { Response::new() });
    let router = builder.build();

    let resp = roundtrip(router, b"DELETE /r HTTP/1.1\r\nConnection: close\r\n\r\n").await;
    assert!(resp.starts_with("HTTP/1.1 405"));
    assert!(resp.contains("Allow: "));
    assert!(resp.contains("GET"));
    assert!(resp.contains("POST"));
}

#[tokio::test]
async fn trace_is_echoed_without_handler() {
    let mut builder = RouterBuilder::new();
    builder.get("/", |_req| async { Response::new() });
    let router = builder.build();

    let input = b"TRACE / HTTP/1.1\r\nHello: World!\r\nHost: h\r\nConnection: close\r\n\r\n";
    let resp = roundtrip(router, input).await;
    assert!(resp.contains("Content-Type: message/http\r\n"));
    assert!(resp.contains("TRACE / HTTP/1.1\r\n"));
    assert!(resp.contains("Hello: World!\r\n"));
    assert!(resp.contains("Host: h\r\n"));
}

#[tokio::test]
async fn both_content_length_and_chunked_honors_chunked() {
    let mut builder = RouterBuilder::new();
    builder.post("/b", |mut req| async move {
        let reader = req.take_body();
        let mut body = Vec::new();
        if let Some(mut reader) = reader {
            loop {
                let (chunk, status) = reader.read();
                body.extend_from_slice(&chunk);
                if status == corehttp::body::ReadStatus::End {
                    break;
                }
            }
        }
        Response::new().bytes(body)
    });
    let router = builder.build();

    let input = b"POST /b HTTP/1.1\r\nContent-Length: 5\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n3\r\nabc\r\n0\r\n\r\n";
    let resp = roundtrip(router, input).await;
    assert!(resp.ends_with("abc"));
}

#[tokio::test]
async fn header_value_too_long_closes_with_431() {
    let mut builder = RouterBuilder::new();
    builder.get("/", |_req| async { Response::new() });
    let router = builder.build();

    let huge = "x".repeat(9000);
    let input = format!("GET / HTTP/1.1\r\nX-Big: {huge}\r\n\r\n");
    let resp = roundtrip(router, input.as_bytes()).await;
    assert!(resp.starts_with("HTTP/1.1 431"));
}

#[tokio::test]
async fn static_dir_serves_nested_file() {
    let dir = std::env::temp_dir().join(format!("corehttp-e2e-static-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("hello.txt"), b"hello from disk").unwrap();

    let mut builder = RouterBuilder::new();
    builder.static_dir("/assets", &dir);
    let router = builder.build();

    let resp = roundtrip(router, b"GET /assets/hello.txt HTTP/1.1\r\nConnection: close\r\n\r\n").await;
    assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(resp.ends_with("hello from disk"));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn hijack_skips_rendering_entirely() {
    let mut builder = RouterBuilder::new();
    builder.get("/upgrade", |_req| async {
        Response::new().hijack(|mut conn| {
            tokio::spawn(async move {
                use tokio::io::AsyncWriteExt as _;
                let _ = conn.write_all(b"raw bytes, no status line").await;
                let _ = conn.shutdown().await;
            });
        })
    });
    let router = builder.build();

    let resp = roundtrip(router, b"GET /upgrade HTTP/1.1\r\n\r\n").await;
    assert_eq!(resp, "raw bytes, no status line");
}

#[tokio::test]
async fn request_side_cookies_are_readable() {
    let mut builder = RouterBuilder::new();
    builder.get("/", |mut req| async move {
        let v = req.cookies().get("id").unwrap_or("").to_string();
        Response::new().string(v)
    });
    let router = builder.build();

    let input = b"GET / HTTP/1.1\r\nCookie: id=42; theme=dark\r\nConnection: close\r\n\r\n";
    let resp = roundtrip(router, input).await;
    assert!(resp.ends_with("42"));
}
