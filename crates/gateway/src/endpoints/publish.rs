//! # POST /publish
//!
//! プレイスファイルの受け取り、形式検証、バージョン公開APIへの中継。

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use place_core::validate_signature;

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::normalize::read_publish_form;
use crate::upstream::{publish_place, translate_response, UpstreamResult};

/// POST /publish — プレイスファイルの公開中継。
///
/// フォームの正規化、シグネチャ検証のいずれかで失敗した場合は
/// アップストリームを呼び出さずに400を返す。
/// アップストリームの非2xxレスポンスはステータスを保ったままそのまま返す。
pub async fn handle_publish(
    State(state): State<Arc<GatewayState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UpstreamResult, GatewayError> {
    let result = run_publish(&state, multipart).await;

    match &result {
        Ok(upstream) => {
            tracing::info!(status = %upstream.status, "アップストリームが応答しました");
        }
        Err(e @ (GatewayError::UpstreamUnreachable(_) | GatewayError::Internal(_))) => {
            tracing::error!(error = %e, "プレイスの公開中継に失敗");
        }
        Err(e) => {
            tracing::warn!(error = %e, "公開リクエストを拒否しました");
        }
    }

    result
}

async fn run_publish(
    state: &GatewayState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UpstreamResult, GatewayError> {
    let multipart = multipart.map_err(|e| GatewayError::InvalidMultipart(e.body_text()))?;
    let request = read_publish_form(multipart).await?;

    validate_signature(request.format, &request.payload)?;

    tracing::info!(
        universe_id = %request.universe_id,
        place_id = %request.place_id,
        version_type = %request.version_type,
        format = ?request.format,
        bytes = request.payload.len(),
        "プレイスファイルを中継します"
    );

    let response = publish_place(state, &request).await?;
    translate_response(response).await
}
