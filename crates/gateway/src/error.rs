//! # Gateway エラー型
//!
//! 全エンドポイントで共通のエラー型。
//! レスポンスは常に `{"error": "..."}` 形式のJSONになる。

use axum::http::StatusCode;
use axum::Json;
use place_core::SignatureError;
use place_types::ErrorBody;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 必須フィールドの欠落
    #[error("必須フィールドが不足しています: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    /// アップロードされたファイルが空
    #[error("アップロードされたファイルが空です")]
    EmptyFile,
    /// 対応外の拡張子
    #[error("対応していないファイル形式です (.rbxl または .rbxlx のみ): {0}")]
    UnsupportedExtension(String),
    /// シグネチャ検証失敗
    #[error(transparent)]
    Signature(#[from] SignatureError),
    /// multipartフォームとして読み取れない
    #[error("multipartフォームの読み取りに失敗: {0}")]
    InvalidMultipart(String),
    /// クエリ文字列が不正
    #[error("不正なクエリ: {0}")]
    InvalidQuery(String),
    /// アップロードサイズ超過
    #[error("アップロードサイズが上限を超えています: {0}")]
    PayloadTooLarge(String),
    /// `url` クエリパラメータの欠落
    #[error("urlクエリパラメータが指定されていません")]
    MissingAssetUrl,
    /// 信頼するプレフィックスで始まらないURL
    #[error("許可されていないアセットURLです: {0}")]
    UntrustedAssetUrl(String),
    /// アップストリームへの通信自体に失敗
    #[error("アップストリームへの接続に失敗: {0}")]
    UpstreamUnreachable(String),
    /// 静的ファイルが存在しない
    #[error("見つかりません")]
    NotFound,
    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl GatewayError {
    /// エラーに対応するHTTPステータス
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MissingFields(_)
            | GatewayError::EmptyFile
            | GatewayError::UnsupportedExtension(_)
            | GatewayError::Signature(_)
            | GatewayError::InvalidMultipart(_)
            | GatewayError::InvalidQuery(_)
            | GatewayError::MissingAssetUrl
            | GatewayError::UntrustedAssetUrl(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
