//! # 公開リクエストの正規化
//!
//! multipartフォームから必須5フィールドを取り出し、
//! 型付きの `PublishRequest` に変換する。

use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use place_types::PlaceFormat;

use crate::error::GatewayError;

/// プレイスファイル本体のフィールド名
pub const FIELD_PLACE_FILE: &str = "placeFile";
/// APIキーのフィールド名
pub const FIELD_API_KEY: &str = "apiKey";
/// ユニバースIDのフィールド名
pub const FIELD_UNIVERSE_ID: &str = "universeId";
/// プレイスIDのフィールド名
pub const FIELD_PLACE_ID: &str = "placeId";
/// バージョン種別のフィールド名
pub const FIELD_VERSION_TYPE: &str = "versionType";

/// 検証済みの公開リクエスト。リクエストごとに構築され、処理完了後に破棄される。
pub struct PublishRequest {
    /// アップロードされたファイル本体
    pub payload: Bytes,
    /// 拡張子から判定した宣言形式
    pub format: PlaceFormat,
    /// 呼び出し元が指定したAPIキー
    pub api_key: String,
    /// ユニバースID
    pub universe_id: String,
    /// プレイスID
    pub place_id: String,
    /// バージョン種別（`Saved` / `Published` 等）
    pub version_type: String,
}

// APIキーをログに出さないためDebugは手動実装
impl std::fmt::Debug for PublishRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishRequest")
            .field("payload_len", &self.payload.len())
            .field("format", &self.format)
            .field("api_key", &"<redacted>")
            .field("universe_id", &self.universe_id)
            .field("place_id", &self.place_id)
            .field("version_type", &self.version_type)
            .finish()
    }
}

/// アップロードされたファイルフィールド
struct UploadedFile {
    file_name: Option<String>,
    data: Bytes,
}

/// multipartフォームを読み取り、`PublishRequest` に正規化する。
///
/// 検査順序:
/// 1. 5フィールドすべての存在（空文字列は欠落扱い）
/// 2. ファイルが空でないこと
/// 3. ファイル名の拡張子が対応形式であること
pub async fn read_publish_form(mut multipart: Multipart) -> Result<PublishRequest, GatewayError> {
    let mut file: Option<UploadedFile> = None;
    let mut api_key = None;
    let mut universe_id = None;
    let mut place_id = None;
    let mut version_type = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            FIELD_PLACE_FILE => {
                let file_name = field.file_name().map(str::to_owned);
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some(UploadedFile { file_name, data });
            }
            FIELD_API_KEY => api_key = non_empty(field.text().await.map_err(multipart_error)?),
            FIELD_UNIVERSE_ID => {
                universe_id = non_empty(field.text().await.map_err(multipart_error)?)
            }
            FIELD_PLACE_ID => place_id = non_empty(field.text().await.map_err(multipart_error)?),
            FIELD_VERSION_TYPE => {
                version_type = non_empty(field.text().await.map_err(multipart_error)?)
            }
            _ => {}
        }
    }

    let (file, api_key, universe_id, place_id, version_type) =
        match (file, api_key, universe_id, place_id, version_type) {
            (Some(f), Some(k), Some(u), Some(p), Some(v)) => (f, k, u, p, v),
            (f, k, u, p, v) => {
                let missing = [
                    (FIELD_PLACE_FILE, f.is_none()),
                    (FIELD_API_KEY, k.is_none()),
                    (FIELD_UNIVERSE_ID, u.is_none()),
                    (FIELD_PLACE_ID, p.is_none()),
                    (FIELD_VERSION_TYPE, v.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                return Err(GatewayError::MissingFields(missing));
            }
        };

    if file.data.is_empty() {
        return Err(GatewayError::EmptyFile);
    }

    let file_name = file.file_name.unwrap_or_default();
    let format = PlaceFormat::from_file_name(&file_name)
        .ok_or(GatewayError::UnsupportedExtension(file_name))?;

    Ok(PublishRequest {
        payload: file.data,
        format,
        api_key,
        universe_id,
        place_id,
        version_type,
    })
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// multipart読み取りエラーをGatewayErrorに変換する。
/// ボディ上限超過のみ413として区別する。
fn multipart_error(e: MultipartError) -> GatewayError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GatewayError::PayloadTooLarge(e.body_text())
    } else {
        GatewayError::InvalidMultipart(e.body_text())
    }
}
