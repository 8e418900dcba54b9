//! # ルーティング
//!
//! メソッド+パスを各エンドポイントに振り分け、全レスポンスに
//! クロスオリジンヘッダを付与する。該当ルートがなければ静的ファイルを返す。

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Request};
use axum::handler::HandlerWithoutStateExt;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::GatewayState;
use crate::endpoints::{handle_asset, handle_not_found, handle_publish};
use crate::error::GatewayError;

/// Gatewayのルーターを構築する。
///
/// - `OPTIONS *` → 204（ルーティング前にミドルウェアで応答）
/// - `POST /publish` → 公開中継
/// - `* /asset` → アセット中継
/// - それ以外 → 静的ファイル
pub fn create_router(state: Arc<GatewayState>) -> Router {
    // GET/HEAD以外のメソッドも405ではなくJSONの404にする
    let static_files: Router = Router::new()
        .fallback_service(
            ServeDir::new(&state.config.static_root)
                .call_fallback_on_method_not_allowed(true)
                .not_found_service(handle_not_found.into_service()),
        )
        .layer(middleware::map_response(render_static_error));

    Router::new()
        .route(
            "/publish",
            post(handle_publish)
                .fallback_service(static_files.clone())
                .layer(DefaultBodyLimit::max(state.config.max_upload_bytes)),
        )
        .route("/asset", any(handle_asset))
        .fallback_service(static_files)
        .layer(middleware::from_fn(cors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 静的ファイル配信の5xx（読み込み時のI/Oエラー）を `{error}` JSONにする。
async fn render_static_error(response: Response) -> Response {
    if !response.status().is_server_error() {
        return response;
    }
    tracing::error!(status = %response.status(), "静的ファイルの読み込みに失敗");
    GatewayError::Internal("静的ファイルを読み込めませんでした".to_string()).into_response()
}

/// 全レスポンスにクロスオリジンヘッダを付与する。
/// `OPTIONS` はパスに関わらず本文なしの204で応答する。
async fn cors(request: Request, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, GET, OPTIONS"),
    );
    response
}
