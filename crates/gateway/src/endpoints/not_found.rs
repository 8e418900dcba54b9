//! # 静的ファイル未検出
//!
//! 静的ファイルが存在しない場合のJSONレスポンス。

use crate::error::GatewayError;

/// 静的ファイルルートに該当ファイルがない場合のフォールバック。
pub async fn handle_not_found() -> GatewayError {
    GatewayError::NotFound
}
