//! # Place Relay Core
//!
//! アップロードされたプレイスファイルの先頭バイトを検査し、
//! 宣言された形式と矛盾しないかを判定する。
//!
//! ## 処理フロー
//! 1. バイナリ形式: 先頭14バイトがマジックシグネチャと一致するか
//! 2. XML形式: 先頭2KBをテキストとして読み、XML宣言を読み飛ばした後に
//!    ルート要素の開始タグが現れるか
//!
//! ファイル構造全体の妥当性は保証しない。明らかな形式の取り違えや
//! ヘッダ部分での切り詰めを、アップストリーム呼び出し前に弾くための検査である。

use place_types::{PlaceFormat, BINARY_MAGIC, XML_ROOT_TAG, XML_SNIFF_BYTES};

/// シグネチャ検証のエラー型
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// XML形式のヘッダが不正
    #[error("XMLプレイスファイルのヘッダが不正です: ルート要素 <roblox> が見つかりません")]
    InvalidXmlHeader,
    /// バイナリ形式のマジックシグネチャ不一致
    #[error("バイナリプレイスファイルのシグネチャが一致しません")]
    SignatureMismatch,
}

/// シグネチャ検証の結果。`Ok(())` は形式と矛盾しないことを表す。
pub type ValidationOutcome = Result<(), SignatureError>;

/// 宣言形式に応じてペイロード先頭のシグネチャを検証する。
pub fn validate_signature(format: PlaceFormat, data: &[u8]) -> ValidationOutcome {
    match format {
        PlaceFormat::Binary => check_binary_magic(data),
        PlaceFormat::Xml => check_xml_header(data),
    }
}

/// 先頭14バイトがマジックシグネチャと完全一致するか検査する。
/// 14バイト未満のペイロードも不一致として扱う。
pub fn check_binary_magic(data: &[u8]) -> ValidationOutcome {
    match data.get(..BINARY_MAGIC.len()) {
        Some(head) if head == BINARY_MAGIC => Ok(()),
        _ => Err(SignatureError::SignatureMismatch),
    }
}

/// 先頭 `XML_SNIFF_BYTES` バイトからXMLルート要素を探す。
///
/// BOMと先頭の空白を除去し、`<?xml ... ?>` 宣言があれば終端まで読み飛ばす。
/// 残りが `<roblox` で始まり、直後が空白・`>`・`/` のいずれかであれば妥当とする。
pub fn check_xml_header(data: &[u8]) -> ValidationOutcome {
    let prefix = &data[..data.len().min(XML_SNIFF_BYTES)];
    let text = String::from_utf8_lossy(prefix);

    let mut rest = text.trim_start_matches('\u{feff}').trim_start();
    if let Some(after_decl) = rest.strip_prefix("<?xml") {
        // 宣言の終端が読み取り範囲内にない場合は不正
        let end = after_decl
            .find("?>")
            .ok_or(SignatureError::InvalidXmlHeader)?;
        rest = after_decl[end + 2..].trim_start();
    }

    let after_tag = rest
        .strip_prefix(XML_ROOT_TAG)
        .ok_or(SignatureError::InvalidXmlHeader)?;
    match after_tag.chars().next() {
        Some(c) if c == '>' || c == '/' || c.is_whitespace() => Ok(()),
        _ => Err(SignatureError::InvalidXmlHeader),
    }
}
