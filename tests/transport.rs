//! Requests sent through the real reqwest transport to a local socket, with
//! the raw HTTP/1.1 request captured on the server side.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use vulnmap::errors::ErrorKind;
use vulnmap::http::{Attachment, ExecutionResult, HttpMethod, ReqwestTransport, Transport};
use vulnmap::{RequestExecutor, RequestSpec};

struct Captured {
    head: String,
    body: Vec<u8>,
}

impl Captured {
    fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or("")
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
        })
    }

    fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn dechunk(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut rest = raw;
    while let Some(line_end) = find(rest, b"\r\n") {
        let size_line = std::str::from_utf8(&rest[..line_end]).unwrap();
        let size = usize::from_str_radix(size_line.split(';').next().unwrap().trim(), 16).unwrap();
        rest = &rest[line_end + 2..];
        if size == 0 {
            break;
        }
        out.extend_from_slice(&rest[..size]);
        rest = &rest[size + 2..];
    }
    out
}

async fn read_more(socket: &mut TcpStream, buf: &mut Vec<u8>) {
    let mut chunk = [0u8; 8192];
    let n = socket.read(&mut chunk).await.unwrap();
    assert!(n > 0, "client closed the connection mid-request");
    buf.extend_from_slice(&chunk[..n]);
}

async fn read_request(socket: &mut TcpStream) -> Captured {
    let mut buf = Vec::new();
    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        read_more(socket, &mut buf).await;
    };
    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut body = buf[head_end..].to_vec();

    let captured = Captured { head, body: Vec::new() };
    if let Some(length) = captured.header("content-length").and_then(|v| v.parse::<usize>().ok()) {
        while body.len() < length {
            read_more(socket, &mut body).await;
        }
        body.truncate(length);
    } else if captured.header("transfer-encoding") == Some("chunked") {
        while !body.ends_with(b"0\r\n\r\n") {
            read_more(socket, &mut body).await;
        }
        body = dechunk(&body);
    }
    Captured { body, ..captured }
}

/// Accept one connection, capture its request and answer with `status` and
/// a JSON body.
async fn serve_once(status: &'static str, response_body: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let captured = read_request(&mut socket).await;
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            response_body.len(),
            response_body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        captured
    });
    (format!("http://{}", addr), handle)
}

fn executor() -> RequestExecutor {
    RequestExecutor::with_reqwest(None).unwrap()
}

fn attachment() -> Attachment {
    Attachment {
        field: "file".into(),
        file_name: "report.txt".into(),
        content: b"file-contents-on-the-wire".to_vec(),
        mime: Some("text/plain".into()),
    }
}

#[tokio::test]
async fn test_query_header_and_basic_auth_reach_the_server() {
    let (base, server) = serve_once("200 OK", r#"{"ok":true}"#).await;
    let spec = RequestSpec::get(format!("{}/cves/2.0", base))
        .query("cveId", "CVE-2021-44228")
        .header("apiKey", "nvd-key")
        .basic_auth("analyst", Some("s3cret".into()));
    let result = executor().execute(spec).await;
    assert_eq!(result.json().unwrap()["ok"], true);

    let captured = server.await.unwrap();
    assert_eq!(captured.request_line(), "GET /cves/2.0?cveId=CVE-2021-44228 HTTP/1.1");
    assert_eq!(captured.header("apiKey"), Some("nvd-key"));
    assert_eq!(captured.header("authorization"), Some("Basic YW5hbHlzdDpzM2NyZXQ="));
}

#[tokio::test]
async fn test_json_body_on_the_wire() {
    let (base, server) = serve_once("200 OK", "{}").await;
    let body = json!({"token": "abc", "scopes": ["read"]});
    executor().execute(RequestSpec::post(format!("{}/auth", base)).json(body.clone())).await;

    let captured = server.await.unwrap();
    assert!(captured.request_line().starts_with("POST /auth "));
    assert_eq!(captured.header("content-type"), Some("application/json"));
    assert_eq!(serde_json::from_slice::<Value>(&captured.body).unwrap(), body);
}

#[tokio::test]
async fn test_raw_body_wins_over_json() {
    let (base, server) = serve_once("200 OK", "{}").await;
    let spec = RequestSpec::post(format!("{}/auth", base))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("token=SECRET_BODY_FIELD")
        .json(json!({"ignored": true}));
    executor().execute(spec).await;

    let captured = server.await.unwrap();
    assert_eq!(captured.body_text(), "token=SECRET_BODY_FIELD");
}

#[tokio::test]
async fn test_form_body_travels_with_attachment() {
    let (base, server) = serve_once("200 OK", "{}").await;
    let spec = RequestSpec::post(format!("{}/upload", base))
        .body("token=SECRET_BODY_FIELD")
        .attachment(attachment());
    let result = executor().execute(spec).await;
    assert!(result.is_success());

    let captured = server.await.unwrap();
    assert!(captured.header("content-type").unwrap().starts_with("multipart/form-data"));
    let body = captured.body_text();
    assert!(body.contains("name=\"token\""));
    assert!(body.contains("SECRET_BODY_FIELD"));
    assert!(body.contains("name=\"file\"; filename=\"report.txt\""));
    assert!(body.contains("file-contents-on-the-wire"));
}

#[tokio::test]
async fn test_json_object_fields_travel_with_attachment() {
    let (base, server) = serve_once("200 OK", "{}").await;
    let spec = RequestSpec::post(format!("{}/upload", base))
        .json(json!({"model": "gpt-4o", "n": 2}))
        .attachment(attachment());
    executor().execute(spec).await;

    let body = server.await.unwrap().body_text();
    assert!(body.contains("name=\"model\"\r\n\r\ngpt-4o\r\n"));
    assert!(body.contains("name=\"n\"\r\n\r\n2\r\n"));
    assert!(body.contains("file-contents-on-the-wire"));
}

#[tokio::test]
async fn test_unrepresentable_body_with_attachment_is_rejected_before_sending() {
    // Nothing listens here; reaching the network would be a transport error.
    let url = "http://127.0.0.1:9/upload";
    for spec in [
        RequestSpec::post(url).json(json!(["not", "an", "object"])).attachment(attachment()),
        RequestSpec::post(url).body(vec![0xffu8, 0x00]).attachment(attachment()),
    ] {
        match executor().execute(spec).await {
            ExecutionResult::Error { kind, .. } => assert_eq!(kind, ErrorKind::InvalidArgument),
            other => panic!("expected error, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_requests_go_through_configured_proxy() {
    let (proxy, server) = serve_once("200 OK", "{}").await;
    let executor = RequestExecutor::with_reqwest(Some(proxy.as_str())).unwrap();
    let result = executor.execute(RequestSpec::get("http://nvd.example.invalid/cves/2.0")).await;
    assert!(result.is_success());

    let captured = server.await.unwrap();
    assert_eq!(captured.request_line(), "GET http://nvd.example.invalid/cves/2.0 HTTP/1.1");
}

#[tokio::test]
async fn test_insecure_flag_still_sends_plain_http() {
    let (base, server) = serve_once("200 OK", r#"{"ok":true}"#).await;
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new().unwrap());
    let spec = RequestSpec::get(format!("{}/models", base)).insecure();
    let raw = transport.send(HttpMethod::Get, &spec, Duration::from_secs(5)).await.unwrap();
    assert_eq!(raw.status, 200);
    assert!(server.await.unwrap().request_line().starts_with("GET /models "));
}

#[tokio::test]
async fn test_error_status_body_reaches_the_result() {
    let (base, server) = serve_once("401 Unauthorized", r#"{"error":{"message":"Incorrect API key provided"}}"#).await;
    let result = executor()
        .execute(RequestSpec::get(format!("{}/models", base)).header("Authorization", "Bearer sk-bad"))
        .await;
    match result {
        ExecutionResult::Error { kind, status, message, .. } => {
            assert_eq!(kind, ErrorKind::UpstreamClient);
            assert_eq!(status, Some(401));
            assert_eq!(message, "HTTP 401: Incorrect API key provided");
        }
        other => panic!("expected error, got {:?}", other),
    }
    assert_eq!(server.await.unwrap().header("authorization"), Some("Bearer sk-bad"));
}

#[tokio::test]
async fn test_silent_server_times_out_as_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(socket);
    });

    let result = executor()
        .execute(RequestSpec::get(format!("http://{}/slow", addr)).timeout_secs(1))
        .await;
    match result {
        ExecutionResult::Error { kind, message, .. } => {
            assert_eq!(kind, ErrorKind::Transport);
            assert!(message.contains("timed out"), "{message}");
        }
        other => panic!("expected error, got {:?}", other),
    }
    server.abort();
}
