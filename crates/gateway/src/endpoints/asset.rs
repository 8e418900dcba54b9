//! # /asset
//!
//! アセット配信元からのダウンロードを中継し、ブラウザのCORS制限を回避する。
//! 本文はバッファせずにストリームのまま返す。

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use serde::Deserialize;

use crate::config::GatewayState;
use crate::error::GatewayError;

/// `/asset` のクエリ
#[derive(Debug, Deserialize)]
pub struct AssetQuery {
    /// 取得対象のURL
    pub url: Option<String>,
}

/// 中継しないホップバイホップヘッダ
const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// 任意メソッド /asset?url=... — アセットの中継。
///
/// `url` が信頼するプレフィックスで始まらない場合は400。
/// アップストリームのステータスとヘッダ（ホップバイホップを除く）をそのまま返す。
pub async fn handle_asset(
    State(state): State<Arc<GatewayState>>,
    query: Result<Query<AssetQuery>, QueryRejection>,
) -> Result<Response, GatewayError> {
    let Query(query) = query.map_err(|e| GatewayError::InvalidQuery(e.body_text()))?;
    let url = query
        .url
        .filter(|url| !url.is_empty())
        .ok_or(GatewayError::MissingAssetUrl)?;

    if !state.config.is_trusted_asset_url(&url) {
        tracing::warn!(url = %url, "信頼されていないアセットURLを拒否しました");
        return Err(GatewayError::UntrustedAssetUrl(url));
    }

    let upstream = state.http_client.get(&url).send().await.map_err(|e| {
        if e.is_builder() {
            GatewayError::InvalidQuery(format!("不正なURL: {e}"))
        } else {
            tracing::error!(url = %url, error = %e, "アセット取得に失敗");
            GatewayError::UpstreamUnreachable(format!("アセット取得に失敗: {e}"))
        }
    })?;

    let status = upstream.status();
    tracing::info!(url = %url, status = %status, "アセットを中継します");

    let headers = forwarded_headers(upstream.headers());
    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

/// アップストリームのヘッダからホップバイホップヘッダを除いて複製する。
fn forwarded_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if !HOP_BY_HOP_HEADERS.contains(&name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}
