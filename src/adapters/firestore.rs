//! Firestore REST 客戶端：分頁列出集合內所有文件，並把型別化的值解碼為 [`DocumentValue`]。

use crate::adapters::credentials::{AccessToken, Credentials};
use crate::domain::model::{DocumentValue, Fields, ParticipantDocument, Scalar};
use crate::domain::ports::DocumentSource;
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com";
pub const DEFAULT_DATABASE: &str = "(default)";

/// 模擬器接受的固定權杖
const EMULATOR_TOKEN: &str = "owner";

#[derive(Debug, Clone)]
pub struct FirestoreSettings {
    pub endpoint: String,
    pub project_id: String,
    pub database: String,
    pub page_size: usize,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug)]
pub enum AuthMode {
    Emulator,
    Credentials(Credentials),
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types (Firestore REST JSON)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireListResponse {
    #[serde(default)]
    documents: Vec<WireDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, WireValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum WireValue {
    NullValue(serde_json::Value),
    BooleanValue(bool),
    IntegerValue(serde_json::Value),
    DoubleValue(serde_json::Value),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(WireLatLng),
    ArrayValue(WireArrayValue),
    MapValue(WireMapValue),
}

#[derive(Debug, Default, Deserialize)]
struct WireLatLng {
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct WireArrayValue {
    #[serde(default)]
    values: Vec<WireValue>,
}

#[derive(Debug, Deserialize)]
struct WireMapValue {
    #[serde(default)]
    fields: BTreeMap<String, WireValue>,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    error: WireError,
}

#[derive(Debug, Deserialize)]
struct WireError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Decoding
// ─────────────────────────────────────────────────────────────────────────────

fn decode_fields(path: &str, fields: BTreeMap<String, WireValue>) -> Result<Fields> {
    fields
        .into_iter()
        .map(|(key, value)| {
            let child = if path.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", path, key)
            };
            decode_value(&child, value).map(|decoded| (key, decoded))
        })
        .collect()
}

fn decode_value(path: &str, value: WireValue) -> Result<DocumentValue> {
    let decoded = match value {
        WireValue::NullValue(_) => DocumentValue::null(),
        WireValue::BooleanValue(b) => DocumentValue::Scalar(Scalar::Boolean(b)),
        WireValue::IntegerValue(raw) => {
            DocumentValue::Scalar(Scalar::Integer(decode_integer(path, &raw)?))
        }
        WireValue::DoubleValue(raw) => decode_double(path, raw)?,
        WireValue::TimestampValue(raw) => {
            let ts = DateTime::parse_from_rfc3339(&raw).map_err(|e| EtlError::DecodeError {
                field: path.to_string(),
                reason: format!("invalid timestamp '{}': {}", raw, e),
            })?;
            DocumentValue::Timestamp(ts.with_timezone(&Utc))
        }
        WireValue::StringValue(s) | WireValue::BytesValue(s) | WireValue::ReferenceValue(s) => {
            DocumentValue::string(s)
        }
        WireValue::GeoPointValue(point) => {
            let mut fields = Fields::new();
            fields.insert(
                "latitude".to_string(),
                DocumentValue::Scalar(Scalar::Double(point.latitude)),
            );
            fields.insert(
                "longitude".to_string(),
                DocumentValue::Scalar(Scalar::Double(point.longitude)),
            );
            DocumentValue::Map(fields)
        }
        WireValue::ArrayValue(array) => DocumentValue::Array(
            array
                .values
                .into_iter()
                .enumerate()
                .map(|(index, item)| decode_value(&format!("{}[{}]", path, index), item))
                .collect::<Result<Vec<_>>>()?,
        ),
        WireValue::MapValue(map) => DocumentValue::Map(decode_fields(path, map.fields)?),
    };
    Ok(decoded)
}

/// integerValue 以十進位字串傳輸 (int64)
fn decode_integer(path: &str, raw: &serde_json::Value) -> Result<i64> {
    let parsed = match raw {
        serde_json::Value::String(s) => s.parse::<i64>().ok(),
        serde_json::Value::Number(n) => n.as_i64(),
        _ => None,
    };
    parsed.ok_or_else(|| EtlError::DecodeError {
        field: path.to_string(),
        reason: format!("invalid integer {}", raw),
    })
}

/// NaN / Infinity / -Infinity 以字串傳輸
fn decode_double(path: &str, raw: serde_json::Value) -> Result<DocumentValue> {
    let parsed = match &raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .map(|d| DocumentValue::Scalar(Scalar::Double(d)))
        .ok_or_else(|| EtlError::DecodeError {
            field: path.to_string(),
            reason: format!("invalid double {}", raw),
        })
}

fn decode_document(document: WireDocument) -> Result<ParticipantDocument> {
    let id = document
        .name
        .rsplit('/')
        .next()
        .unwrap_or(document.name.as_str())
        .to_string();
    let fields = decode_fields("", document.fields).map_err(|e| match e {
        EtlError::DecodeError { field, reason } => EtlError::DecodeError {
            field: format!("{}:{}", id, field),
            reason,
        },
        other => other,
    })?;
    Ok(ParticipantDocument { id, fields })
}

// ─────────────────────────────────────────────────────────────────────────────
// FirestoreClient
// ─────────────────────────────────────────────────────────────────────────────

pub struct FirestoreClient {
    client: Client,
    settings: FirestoreSettings,
    token: AccessToken,
}

impl FirestoreClient {
    pub fn new(settings: FirestoreSettings, token: AccessToken) -> Result<Self> {
        let client = build_http_client(settings.timeout_seconds)?;
        Ok(Self {
            client,
            settings,
            token,
        })
    }

    /// 依認證模式取得權杖並建立客戶端
    pub async fn connect(settings: FirestoreSettings, auth: &AuthMode) -> Result<Self> {
        let client = build_http_client(settings.timeout_seconds)?;
        let token = match auth {
            AuthMode::Emulator => {
                tracing::info!("🧪 Using Firestore emulator at {}", settings.endpoint);
                AccessToken::new(EMULATOR_TOKEN)
            }
            AuthMode::Credentials(credentials) => {
                tracing::info!("🔐 Authenticating for project {}", settings.project_id);
                credentials.fetch_access_token(&client).await?
            }
        };

        Ok(Self {
            client,
            settings,
            token,
        })
    }

    fn documents_url(&self, collection: &str) -> Result<Url> {
        let raw = format!(
            "{}/v1/projects/{}/databases/{}/documents/{}",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.project_id,
            self.settings.database,
            collection.trim_matches('/'),
        );
        Url::parse(&raw).map_err(|e| EtlError::InvalidConfigValueError {
            field: "source.endpoint".to_string(),
            value: raw,
            reason: e.to_string(),
        })
    }

    async fn fetch_page(&self, url: &Url, page_token: Option<&str>) -> Result<WireListResponse> {
        let mut request = self
            .client
            .get(url.clone())
            .header(AUTHORIZATION, self.token.bearer_header())
            .query(&[("pageSize", self.settings.page_size.to_string())]);

        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Firestore response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<WireErrorBody>(&body) {
                Ok(wire) => EtlError::FirestoreError {
                    status: if wire.error.status.is_empty() {
                        status.to_string()
                    } else {
                        wire.error.status
                    },
                    message: wire.error.message,
                },
                Err(_) => EtlError::FirestoreError {
                    status: status.to_string(),
                    message: body,
                },
            });
        }

        Ok(response.json().await?)
    }
}

fn build_http_client(timeout_seconds: Option<u64>) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout_seconds {
        builder = builder.timeout(Duration::from_secs(timeout));
    }
    Ok(builder.build()?)
}

impl DocumentSource for FirestoreClient {
    async fn list_documents(&self, collection: &str) -> Result<Vec<ParticipantDocument>> {
        let url = self.documents_url(collection)?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;
        let mut page = 0usize;

        loop {
            page += 1;
            tracing::debug!("Fetching page {} of '{}'", page, collection);
            let response = self.fetch_page(&url, page_token.as_deref()).await?;

            for wire in response.documents {
                documents.push(decode_document(wire)?);
            }

            match response.next_page_token {
                Some(token) if !token.is_empty() => {
                    if page_token.as_deref() == Some(token.as_str()) {
                        return Err(EtlError::FirestoreError {
                            status: "PAGE_TOKEN_REPEATED".to_string(),
                            message: format!(
                                "page {} of '{}' returned the same page token again",
                                page, collection
                            ),
                        });
                    }
                    page_token = Some(token);
                }
                _ => break,
            }
        }

        tracing::debug!(
            "Fetched {} documents from '{}' in {} pages",
            documents.len(),
            collection,
            page
        );
        Ok(documents)
    }
}
