use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// 文件欄位 (依欄位名稱排序)
pub type Fields = BTreeMap<String, DocumentValue>;

/// Firestore 文件中的值，封閉為四種型別
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentValue {
    Timestamp(DateTime<Utc>),
    Map(Fields),
    Array(Vec<DocumentValue>),
    Scalar(Scalar),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

impl DocumentValue {
    pub fn string(value: impl Into<String>) -> Self {
        DocumentValue::Scalar(Scalar::String(value.into()))
    }

    pub fn null() -> Self {
        DocumentValue::Scalar(Scalar::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DocumentValue::Scalar(Scalar::Null))
    }

    pub fn as_map(&self) -> Option<&Fields> {
        match self {
            DocumentValue::Map(fields) => Some(fields),
            _ => None,
        }
    }

    /// 轉成 CSV 儲存格文字
    pub fn to_cell(&self) -> String {
        match self {
            DocumentValue::Scalar(scalar) => scalar.to_cell(),
            DocumentValue::Timestamp(ts) => format_iso8601(ts),
            DocumentValue::Map(_) | DocumentValue::Array(_) => self.to_json().to_string(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            DocumentValue::Timestamp(ts) => serde_json::Value::String(format_iso8601(ts)),
            DocumentValue::Map(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            DocumentValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(DocumentValue::to_json).collect())
            }
            DocumentValue::Scalar(Scalar::Null) => serde_json::Value::Null,
            DocumentValue::Scalar(Scalar::Boolean(b)) => serde_json::Value::Bool(*b),
            DocumentValue::Scalar(Scalar::Integer(i)) => serde_json::Value::from(*i),
            DocumentValue::Scalar(Scalar::Double(d)) => serde_json::Number::from_f64(*d)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            DocumentValue::Scalar(Scalar::String(s)) => serde_json::Value::String(s.clone()),
        }
    }
}

impl Scalar {
    fn to_cell(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Boolean(true) => "True".to_string(),
            Scalar::Boolean(false) => "False".to_string(),
            Scalar::Integer(i) => i.to_string(),
            Scalar::Double(d) if d.is_nan() => String::new(),
            Scalar::Double(d) if d.is_infinite() && *d > 0.0 => "inf".to_string(),
            Scalar::Double(d) if d.is_infinite() => "-inf".to_string(),
            Scalar::Double(d) => format_double(*d),
            Scalar::String(s) => s.clone(),
        }
    }
}

/// 最短可還原的十進位表示；指數小於 -4 或不小於 16 時改用科學記號 (`1e-07`, `1.5e+16`)
fn format_double(d: f64) -> String {
    let scientific = format!("{:e}", d);
    let exponent = scientific
        .split_once('e')
        .and_then(|(mantissa, exp)| exp.parse::<i32>().ok().map(|exp| (mantissa, exp)));

    match exponent {
        Some((mantissa, exp)) if !(-4..16).contains(&exp) => {
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        _ => {
            let fixed = d.to_string();
            if fixed.contains('.') {
                fixed
            } else {
                format!("{}.0", fixed)
            }
        }
    }
}

/// 以微秒精度與 `+00:00` 位移輸出 ISO-8601；微秒為零時省略小數
pub fn format_iso8601(ts: &DateTime<Utc>) -> String {
    if ts.timestamp_subsec_micros() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
    }
}

/// 一筆參與者文件
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantDocument {
    pub id: String,
    pub fields: Fields,
}

/// 輸出表格的欄位名稱，順序固定
pub const COLUMNS: [&str; 9] = [
    "prolific_id",
    "start_time",
    "original_statement",
    "original_label",
    "pass_verification",
    "label_alignment",
    "redundant_content",
    "natural_flow",
    "response_timestamp",
];

/// 每個 (參與者, 回應) 一列；缺少的欄位為 `None`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseRow {
    pub prolific_id: Option<DocumentValue>,
    pub start_time: Option<DocumentValue>,
    pub original_statement: Option<DocumentValue>,
    pub original_label: Option<DocumentValue>,
    pub pass_verification: Option<DocumentValue>,
    pub label_alignment: Option<DocumentValue>,
    pub redundant_content: Option<DocumentValue>,
    pub natural_flow: Option<DocumentValue>,
    pub response_timestamp: Option<DocumentValue>,
}

impl ResponseRow {
    /// 依 [`COLUMNS`] 順序的欄位值
    pub fn values(&self) -> [Option<&DocumentValue>; 9] {
        [
            self.prolific_id.as_ref(),
            self.start_time.as_ref(),
            self.original_statement.as_ref(),
            self.original_label.as_ref(),
            self.pass_verification.as_ref(),
            self.label_alignment.as_ref(),
            self.redundant_content.as_ref(),
            self.natural_flow.as_ref(),
            self.response_timestamp.as_ref(),
        ]
    }

    pub fn cells(&self) -> Vec<String> {
        self.values()
            .iter()
            .map(|value| value.map(DocumentValue::to_cell).unwrap_or_default())
            .collect()
    }

    /// 用於計算不重複參與者；null 與缺值視為同一組
    fn participant_key(&self) -> Option<String> {
        self.prolific_id
            .as_ref()
            .filter(|value| !value.is_null())
            .map(DocumentValue::to_cell)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportTable {
    pub rows: Vec<ResponseRow>,
}

impl ExportTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn unique_participants(&self) -> usize {
        self.rows
            .iter()
            .map(ResponseRow::participant_key)
            .collect::<HashSet<_>>()
            .len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportSummary {
    pub output_path: String,
    pub total_responses: usize,
    pub unique_participants: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row_for(id: Option<DocumentValue>) -> ResponseRow {
        ResponseRow {
            prolific_id: id,
            ..Default::default()
        }
    }

    #[test]
    fn test_iso8601_matches_microsecond_format() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        assert_eq!(format_iso8601(&ts), "2024-01-15T10:30:00.123456+00:00");

        let whole = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_iso8601(&whole), "2024-01-15T10:30:00+00:00");
    }

    #[test]
    fn test_cell_rendering() {
        assert_eq!(DocumentValue::null().to_cell(), "");
        assert_eq!(DocumentValue::Scalar(Scalar::Boolean(true)).to_cell(), "True");
        assert_eq!(DocumentValue::Scalar(Scalar::Integer(4)).to_cell(), "4");
        assert_eq!(DocumentValue::Scalar(Scalar::Double(3.0)).to_cell(), "3.0");
        assert_eq!(DocumentValue::Scalar(Scalar::Double(2.5)).to_cell(), "2.5");
        assert_eq!(DocumentValue::Scalar(Scalar::Double(-0.0)).to_cell(), "-0.0");

        let mut fields = Fields::new();
        fields.insert("b".to_string(), DocumentValue::Scalar(Scalar::Integer(1)));
        fields.insert(
            "a".to_string(),
            DocumentValue::Array(vec![DocumentValue::string("x"), DocumentValue::null()]),
        );
        assert_eq!(
            DocumentValue::Map(fields).to_cell(),
            r#"{"a":["x",null],"b":1}"#
        );
    }

    #[test]
    fn test_special_and_extreme_doubles() {
        let cell = |d: f64| DocumentValue::Scalar(Scalar::Double(d)).to_cell();

        assert_eq!(cell(f64::NAN), "");
        assert_eq!(cell(f64::INFINITY), "inf");
        assert_eq!(cell(f64::NEG_INFINITY), "-inf");
        assert_eq!(cell(1e-7), "1e-07");
        assert_eq!(cell(1.5e-7), "1.5e-07");
        assert_eq!(cell(0.0001), "0.0001");
        assert_eq!(cell(1e15), "1000000000000000.0");
        assert_eq!(cell(1e16), "1e+16");
        assert_eq!(cell(-2.5e20), "-2.5e+20");
    }

    #[test]
    fn test_cells_follow_column_order() {
        let row = ResponseRow {
            prolific_id: Some(DocumentValue::string("P1")),
            response_timestamp: Some(DocumentValue::string("2024-01-15T10:30:00+00:00")),
            ..Default::default()
        };
        let cells = row.cells();
        assert_eq!(cells.len(), COLUMNS.len());
        assert_eq!(cells[0], "P1");
        assert_eq!(cells[8], "2024-01-15T10:30:00+00:00");
        assert!(cells[1..8].iter().all(String::is_empty));
    }

    #[test]
    fn test_unique_participants_counts_distinct_ids() {
        let table = ExportTable {
            rows: vec![
                row_for(Some(DocumentValue::string("P1"))),
                row_for(Some(DocumentValue::string("P1"))),
                row_for(Some(DocumentValue::string("P2"))),
            ],
        };
        assert_eq!(table.len(), 3);
        assert_eq!(table.unique_participants(), 2);
    }

    #[test]
    fn test_unique_participants_groups_nulls_together() {
        let table = ExportTable {
            rows: vec![
                row_for(None),
                row_for(Some(DocumentValue::null())),
                row_for(Some(DocumentValue::string("P1"))),
            ],
        };
        assert_eq!(table.unique_participants(), 2);
    }
}
