//! # Place Relay 共有型定義
//!
//! Gateway・Core間で共有するプレイスファイル形式の定義と、
//! クライアントに返却するJSONエンベロープ型を提供する。
//!
//! ## 対応形式
//! - `.rbxl`: バイナリ形式（`application/octet-stream`）
//! - `.rbxlx`: XML形式（`application/xml`）

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 形式定数
// ---------------------------------------------------------------------------

/// バイナリ形式プレイスファイルの拡張子
pub const PLACE_BINARY_EXT: &str = "rbxl";

/// XML形式プレイスファイルの拡張子
pub const PLACE_XML_EXT: &str = "rbxlx";

/// バイナリ形式の先頭14バイトに置かれるマジックシグネチャ。
/// ASCII `<roblox!` に続けて `89 FF 0D 0A 1A 0A`。
pub const BINARY_MAGIC: [u8; 14] = [
    b'<', b'r', b'o', b'b', b'l', b'o', b'x', b'!', 0x89, 0xFF, 0x0D, 0x0A, 0x1A, 0x0A,
];

/// XML形式のルート要素開始タグ（属性・`>`の直前まで）
pub const XML_ROOT_TAG: &str = "<roblox";

/// XMLヘッダ判定で読み取る先頭バイト数。
/// XML宣言とルート要素はこの範囲内に現れる必要がある。
pub const XML_SNIFF_BYTES: usize = 2048;

// ---------------------------------------------------------------------------
// プレイスファイル形式
// ---------------------------------------------------------------------------

/// アップロードされたプレイスファイルの宣言形式。
///
/// 拡張子とアップストリームへ送るContent-Typeは常に1対1で対応する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceFormat {
    /// `.rbxl` バイナリ形式
    Binary,
    /// `.rbxlx` XML形式
    Xml,
}

impl PlaceFormat {
    /// ファイル名の拡張子から形式を判定する。
    ///
    /// 最後の `.` 以降を拡張子とみなし、ASCII大文字小文字を区別しない。
    /// 拡張子がない、または対応外の場合は `None`。
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        if ext.eq_ignore_ascii_case(PLACE_BINARY_EXT) {
            Some(PlaceFormat::Binary)
        } else if ext.eq_ignore_ascii_case(PLACE_XML_EXT) {
            Some(PlaceFormat::Xml)
        } else {
            None
        }
    }

    /// 形式に対応する拡張子
    pub fn extension(self) -> &'static str {
        match self {
            PlaceFormat::Binary => PLACE_BINARY_EXT,
            PlaceFormat::Xml => PLACE_XML_EXT,
        }
    }

    /// アップストリームに送るContent-Type
    pub fn content_type(self) -> &'static str {
        match self {
            PlaceFormat::Binary => "application/octet-stream",
            PlaceFormat::Xml => "application/xml",
        }
    }
}

// ---------------------------------------------------------------------------
// JSONエンベロープ
// ---------------------------------------------------------------------------

/// クライアントに返すエラーレスポンス。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// エラー内容
    pub error: String,
}

/// アップストリームがJSON以外を返した場合に本文を包む型。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    /// アップストリームのレスポンス本文（空の場合は空文字列）
    pub message: String,
}
