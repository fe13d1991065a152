//! 將文件中的 Firestore timestamp 轉為 ISO-8601 字串。
//!
//! 只遞迴進入 map，以及 array 中的 map 元素；array 中的其他元素原樣保留。

use crate::domain::model::{format_iso8601, DocumentValue, Fields};

/// 非 map 的輸入原樣回傳
pub fn normalize_timestamps(value: DocumentValue) -> DocumentValue {
    match value {
        DocumentValue::Map(fields) => DocumentValue::Map(normalize_fields(fields)),
        other => other,
    }
}

pub fn normalize_fields(fields: Fields) -> Fields {
    fields
        .into_iter()
        .map(|(key, value)| (key, normalize_entry(value)))
        .collect()
}

fn normalize_entry(value: DocumentValue) -> DocumentValue {
    match value {
        DocumentValue::Timestamp(ts) => DocumentValue::string(format_iso8601(&ts)),
        DocumentValue::Map(fields) => DocumentValue::Map(normalize_fields(fields)),
        DocumentValue::Array(items) => {
            DocumentValue::Array(items.into_iter().map(normalize_array_item).collect())
        }
        scalar @ DocumentValue::Scalar(_) => scalar,
    }
}

fn normalize_array_item(item: DocumentValue) -> DocumentValue {
    match item {
        DocumentValue::Map(fields) => DocumentValue::Map(normalize_fields(fields)),
        other => other,
    }
}
