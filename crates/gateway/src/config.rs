//! # Gateway設定・共有状態
//!
//! 固定値を既定とする設定構造体と、Gatewayの共有状態の定義。
//! 環境変数で変えられるのはリッスンアドレスのみ。

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// 既定のリッスンポート
pub const DEFAULT_LISTEN_PORT: u16 = 3000;

/// 既定の静的ファイルルート
pub const DEFAULT_STATIC_ROOT: &str = "public";

/// プレイス公開APIのベースURL
pub const DEFAULT_PUBLISH_API_BASE: &str = "https://apis.roblox.com";

/// `/asset` で取得を許可するURLプレフィックス
pub const DEFAULT_ASSET_URL_PREFIX: &str = "https://assetdelivery.roblox.com/";

/// アップストリーム通信のタイムアウト（秒）
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 120;

/// アップロード最大サイズ（100 MiB）
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// アップストリームへ送る固定User-Agent
pub const USER_AGENT: &str = concat!("place-relay/", env!("CARGO_PKG_VERSION"));

/// Gateway設定。
///
/// `Default` は固定値のみで構成され、`from_env` はリッスンアドレスだけを
/// 環境変数で上書きする。テストではアップストリームのURLをモックサーバーに
/// 差し替えた構造体を直接渡す。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// リッスンアドレス
    pub listen_addr: SocketAddr,
    /// 静的ファイルのルートディレクトリ
    pub static_root: PathBuf,
    /// プレイス公開APIのベースURL（末尾スラッシュなし）
    pub publish_api_base: String,
    /// 信頼するアセット配信URLのプレフィックス
    pub asset_url_prefix: String,
    /// アップストリーム通信のタイムアウト
    pub upstream_timeout: Duration,
    /// `/publish` のリクエストボディ上限（バイト）
    pub max_upload_bytes: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_LISTEN_PORT)),
            static_root: PathBuf::from(DEFAULT_STATIC_ROOT),
            publish_api_base: DEFAULT_PUBLISH_API_BASE.to_string(),
            asset_url_prefix: DEFAULT_ASSET_URL_PREFIX.to_string(),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl GatewayConfig {
    /// 環境変数から設定を読み込む。`LISTEN_ADDR` 以外は既定値のまま。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// 任意の変数ソースから設定を構築する。
    pub fn from_vars<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("LISTEN_ADDR") {
            config.listen_addr = addr
                .parse()
                .map_err(|e| anyhow::anyhow!("LISTEN_ADDRが不正です ({addr}): {e}"))?;
        }

        Ok(config)
    }

    /// プレイスのバージョン公開エンドポイントURLを組み立てる。
    /// 各値はエスケープせずそのまま埋め込む。
    pub fn publish_url(&self, universe_id: &str, place_id: &str, version_type: &str) -> String {
        format!(
            "{}/universes/v1/{universe_id}/places/{place_id}/versions?versionType={version_type}",
            self.publish_api_base
        )
    }

    /// URLが信頼するアセット配信元のものか判定する。
    pub fn is_trusted_asset_url(&self, url: &str) -> bool {
        url.starts_with(&self.asset_url_prefix)
    }
}

/// Gatewayの共有状態。
///
/// リクエスト間で共有するのは不変の設定とHTTPクライアントのみ。
pub struct GatewayState {
    /// 設定
    pub config: GatewayConfig,
    /// HTTPクライアント（固定User-Agent・接続/読み取りタイムアウト設定済み）
    ///
    /// 全体のタイムアウトは持たない。アセットの長いストリームを途中で
    /// 切らないため、公開リクエストはリクエスト単位で `upstream_timeout` を掛ける。
    pub http_client: reqwest::Client,
}

impl GatewayState {
    /// 設定からHTTPクライアントを構築し、共有状態を作る。
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(config.upstream_timeout)
            .read_timeout(config.upstream_timeout)
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }
}
