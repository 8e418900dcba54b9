//! # Place Relay Gateway
//!
//! ブラウザクライアントとプレイス公開API・アセット配信元の間に立つHTTPゲートウェイ。
//!
//! ## 役割
//! - アップロードされたプレイスファイルの形式検証と公開APIへの中継
//! - アセットダウンロードの中継（CORS制限の回避）
//! - 静的ファイル配信
//!
//! ## API エンドポイント
//! - `OPTIONS *` — 204 + クロスオリジンヘッダ
//! - `POST /publish` — プレイスファイルの公開中継
//! - `* /asset?url=...` — アセット中継
//! - その他 — 静的ファイル

mod config;
mod endpoints;
mod error;
mod normalize;
mod router;
mod upstream;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;

use config::{GatewayConfig, GatewayState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::from_env()?;
    tracing::info!(
        static_root = %config.static_root.display(),
        publish_api_base = %config.publish_api_base,
        asset_url_prefix = %config.asset_url_prefix,
        upstream_timeout_secs = config.upstream_timeout.as_secs(),
        max_upload_bytes = config.max_upload_bytes,
        "設定を読み込みました"
    );

    let addr = config.listen_addr;
    let state = Arc::new(GatewayState::new(config)?);
    let app = router::create_router(state);

    tracing::info!("Gatewayを {} で起動します", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gatewayを停止しました");
    Ok(())
}

/// Ctrl+C または SIGTERM を待つ。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Ctrl+Cハンドラの登録に失敗: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("SIGTERMハンドラの登録に失敗: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("シャットダウンシグナルを受信しました");
}
