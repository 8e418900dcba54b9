//! # アップストリーム中継
//!
//! 検証済みの公開リクエストをプレイスのバージョン公開APIへ転送し、
//! 返ってきたレスポンスを呼び出し元向けのJSONに変換する。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use place_types::MessageBody;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::normalize::PublishRequest;

/// APIキーを載せるヘッダ名
pub const API_KEY_HEADER: &str = "x-api-key";

/// アップストリームのレスポンス本文。
/// JSONとして解釈できればそのまま、できなければ `{message}` で包む。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UpstreamBody {
    /// JSONとして解釈できた本文
    Json(serde_json::Value),
    /// JSON以外の本文
    Message(MessageBody),
}

/// 呼び出し元に返す変換済みレスポンス。
#[derive(Debug)]
pub struct UpstreamResult {
    /// アップストリームのステータスコード（そのまま返す）
    pub status: StatusCode,
    /// 変換済み本文
    pub body: UpstreamBody,
}

impl IntoResponse for UpstreamResult {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// 公開リクエストをアップストリームへ1回だけPOSTする。リトライはしない。
///
/// 通信自体が完了しなかった場合（接続失敗、DNS解決失敗、タイムアウト）は
/// `UpstreamUnreachable` を返す。非2xxのステータスはエラーとして扱わない。
/// `upstream_timeout` はレスポンス本文の読み取りまでを含む全体に掛かる。
pub async fn publish_place(
    state: &GatewayState,
    request: &PublishRequest,
) -> Result<reqwest::Response, GatewayError> {
    let url = state.config.publish_url(
        &request.universe_id,
        &request.place_id,
        &request.version_type,
    );

    state
        .http_client
        .post(&url)
        .header(API_KEY_HEADER, &request.api_key)
        .header(CONTENT_TYPE, request.format.content_type())
        .header(ACCEPT, "application/json")
        .body(request.payload.clone())
        .timeout(state.config.upstream_timeout)
        .send()
        .await
        .map_err(|e| {
            if e.is_builder() {
                GatewayError::Internal(format!("公開リクエストの構築に失敗: {e}"))
            } else {
                GatewayError::UpstreamUnreachable(format!("HTTP送信失敗: {e}"))
            }
        })
}

/// アップストリームのレスポンスを読み切り、ステータスを保ったままJSONに変換する。
pub async fn translate_response(response: reqwest::Response) -> Result<UpstreamResult, GatewayError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| GatewayError::UpstreamUnreachable(format!("レスポンス読み取り失敗: {e}")))?;

    Ok(UpstreamResult {
        status,
        body: translate_body(text),
    })
}

/// 本文テキストをJSONとして解釈し、失敗した場合は `{message}` で包む。
pub fn translate_body(text: String) -> UpstreamBody {
    match serde_json::from_str(&text) {
        Ok(value) => UpstreamBody::Json(value),
        Err(_) => UpstreamBody::Message(MessageBody { message: text }),
    }
}
