//! Google 服務帳戶 / 使用者憑證載入與 OAuth2 存取權杖交換。
//!
//! - `service_account`: 以 RS256 簽署 JWT，使用 jwt-bearer grant 換取權杖
//! - `authorized_user`: 使用 refresh_token grant
//!
//! 權杖只存放於 `SecretString`，不會寫入日誌。

use crate::utils::error::{EtlError, Result};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

pub const CREDENTIALS_ENV_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

fn deserialize_secret<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    ServiceAccount(ServiceAccountKey),
    AuthorizedUser(AuthorizedUser),
}

#[derive(Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: Option<String>,
    pub private_key_id: Option<String>,
    #[serde(deserialize_with = "deserialize_secret")]
    private_key: SecretString,
    pub client_email: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
pub struct AuthorizedUser {
    pub client_id: String,
    #[serde(deserialize_with = "deserialize_secret")]
    client_secret: SecretString,
    #[serde(deserialize_with = "deserialize_secret")]
    refresh_token: SecretString,
    pub quota_project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl std::fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("client_id", &self.client_id)
            .field("quota_project_id", &self.quota_project_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
struct JwtClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct WireTokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct WireTokenError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth2 存取權杖
pub struct AccessToken {
    token: SecretString,
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
        }
    }

    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"***")
            .finish()
    }
}

impl Credentials {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| EtlError::AuthError {
            message: format!("Cannot read credentials file {}: {}", path.display(), e),
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| EtlError::AuthError {
            message: format!("Unsupported or malformed credentials file: {}", e),
        })
    }

    pub fn project_id(&self) -> Option<&str> {
        match self {
            Credentials::ServiceAccount(key) => key.project_id.as_deref(),
            Credentials::AuthorizedUser(user) => user.quota_project_id.as_deref(),
        }
    }

    pub fn token_uri(&self) -> &str {
        match self {
            Credentials::ServiceAccount(key) => &key.token_uri,
            Credentials::AuthorizedUser(user) => &user.token_uri,
        }
    }

    /// 向 token 端點交換存取權杖
    pub async fn fetch_access_token(&self, client: &Client) -> Result<AccessToken> {
        let form: Vec<(&str, String)> = match self {
            Credentials::ServiceAccount(key) => vec![
                ("grant_type", JWT_BEARER_GRANT.to_string()),
                ("assertion", key.signed_assertion()?),
            ],
            Credentials::AuthorizedUser(user) => vec![
                ("grant_type", "refresh_token".to_string()),
                ("client_id", user.client_id.clone()),
                (
                    "client_secret",
                    user.client_secret.expose_secret().to_string(),
                ),
                (
                    "refresh_token",
                    user.refresh_token.expose_secret().to_string(),
                ),
            ],
        };

        tracing::debug!("Requesting access token from: {}", self.token_uri());
        let response = client.post(self.token_uri()).form(&form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<WireTokenError>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => format!("token endpoint returned HTTP {}", status),
            };
            return Err(EtlError::AuthError { message });
        }

        let token: WireTokenResponse = response.json().await?;
        tracing::debug!("Access token acquired (expires in {:?}s)", token.expires_in);

        Ok(AccessToken::new(token.access_token))
    }
}

impl ServiceAccountKey {
    fn signed_assertion(&self) -> Result<String> {
        let iat = chrono::Utc::now().timestamp();
        let claims = JwtClaims {
            iss: &self.client_email,
            scope: DATASTORE_SCOPE,
            aud: &self.token_uri,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.expose_secret().as_bytes())?;
        Ok(encode(&header, &claims, &key)?)
    }
}
