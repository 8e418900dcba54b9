//! # エンドポイントテスト用共通ヘルパー
//!
//! publish, asset, routerテストで共有するモックアップストリームと
//! Gateway起動処理。

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::Response;
use place_types::BINARY_MAGIC;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::config::{GatewayConfig, GatewayState};
use crate::router::create_router;

/// モックアップストリームが受信したリクエスト
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// モックアップストリームが返すレスポンス
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: Vec<u8>,
}

impl MockReply {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn json(status: StatusCode, value: serde_json::Value) -> Self {
        Self::new(status, value.to_string()).with_header("content-type", "application/json")
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }
}

/// 起動済みモックアップストリーム
pub struct MockUpstream {
    pub port: u16,
    calls: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn calls(&self) -> Vec<CapturedRequest> {
        self.calls.lock().unwrap().clone()
    }
}

/// 全パスで受信内容を記録し、指定レスポンスを返すモックサーバーを起動する。
pub async fn start_mock_upstream(reply: MockReply) -> MockUpstream {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = calls.clone();
    let reply = Arc::new(reply);

    let app = axum::Router::new().fallback(move |request: Request| {
        let recorded = recorded.clone();
        let reply = reply.clone();
        async move {
            let (parts, body) = request.into_parts();
            let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
            recorded.lock().unwrap().push(CapturedRequest {
                method: parts.method,
                uri: parts.uri,
                headers: parts.headers,
                body,
            });

            let mut response = Response::new(Body::from(reply.body.clone()));
            *response.status_mut() = reply.status;
            for &(name, value) in &reply.headers {
                response
                    .headers_mut()
                    .insert(name, HeaderValue::from_static(value));
            }
            response
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    MockUpstream { port, calls }
}

/// 200応答の本文を `chunk` 単位で `interval` ごとに小出しにするサーバーを起動し、
/// ポートを返す。本文全体の長さは `content-length` で先に通知する。
pub async fn start_trickling_upstream(chunk: Vec<u8>, chunks: usize, interval: Duration) -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let chunk = Arc::new(chunk);

    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            let chunk = chunk.clone();
            tokio::spawn(async move {
                // リクエストヘッダの終端まで読み捨てる
                let mut head = Vec::new();
                let mut buf = [0u8; 4096];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        return;
                    }
                    head.extend_from_slice(&buf[..n]);
                }

                let response_head = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/octet-stream\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    chunk.len() * chunks
                );
                if socket.write_all(response_head.as_bytes()).await.is_err() {
                    return;
                }
                for i in 0..chunks {
                    if i > 0 {
                        tokio::time::sleep(interval).await;
                    }
                    if socket.write_all(&chunk).await.is_err() {
                        return;
                    }
                }
                let _ = socket.shutdown().await;
            });
        }
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    port
}

/// どのサーバーもリッスンしていないポートを返す。
pub async fn unused_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// アップストリームを `base_url` に向けたテスト用設定
pub fn test_config(base_url: &str) -> GatewayConfig {
    GatewayConfig {
        publish_api_base: base_url.to_string(),
        asset_url_prefix: format!("{base_url}/assets/"),
        upstream_timeout: std::time::Duration::from_secs(5),
        ..GatewayConfig::default()
    }
}

/// Gatewayを起動し、ベースURLを返す。
pub async fn start_gateway(config: GatewayConfig) -> String {
    let state = Arc::new(GatewayState::new(config).unwrap());
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{port}")
}

/// 正しいマジックシグネチャを持つバイナリプレイス
pub fn binary_place() -> Vec<u8> {
    let mut data = BINARY_MAGIC.to_vec();
    data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0xFF, 0xFE, b'I', b'N', b'S', b'T']);
    data
}

/// 正しいルート要素を持つXMLプレイス
pub fn xml_place() -> Vec<u8> {
    b"<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<roblox version=\"4\">\n</roblox>".to_vec()
}

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEST_UNIVERSE_ID: &str = "123";
pub const TEST_PLACE_ID: &str = "456";
pub const TEST_VERSION_TYPE: &str = "Published";

/// 公開フォームを構築する。`omit` に指定したフィールドは含めない。
pub fn publish_form(
    file_name: &str,
    payload: Vec<u8>,
    omit: Option<&str>,
) -> reqwest::multipart::Form {
    let mut form = reqwest::multipart::Form::new();
    if omit != Some("placeFile") {
        let part = reqwest::multipart::Part::bytes(payload).file_name(file_name.to_string());
        form = form.part("placeFile", part);
    }
    for (name, value) in [
        ("apiKey", TEST_API_KEY),
        ("universeId", TEST_UNIVERSE_ID),
        ("placeId", TEST_PLACE_ID),
        ("versionType", TEST_VERSION_TYPE),
    ] {
        if omit != Some(name) {
            form = form.text(name, value);
        }
    }
    form
}

/// 全レスポンス共通のクロスオリジンヘッダを確認する。
pub fn assert_cors_headers(headers: &reqwest::header::HeaderMap) {
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");
    assert_eq!(headers["access-control-allow-methods"], "POST, GET, OPTIONS");
}
