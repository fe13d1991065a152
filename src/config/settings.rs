use crate::adapters::credentials::{Credentials, CREDENTIALS_ENV_VAR};
use crate::adapters::firestore::{AuthMode, FirestoreSettings, DEFAULT_DATABASE, DEFAULT_ENDPOINT};
use crate::config::toml_config::TomlConfig;
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};

pub const DEFAULT_OUTPUT_FILE: &str = "study_results.csv";
pub const DEFAULT_COLLECTION: &str = "participants";
pub const DEFAULT_PAGE_SIZE: usize = 300;
pub const MAX_PAGE_SIZE: usize = 1000;

/// 命令列 (或環境變數) 提供的覆寫值
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub output_path: Option<String>,
    pub credentials: Option<String>,
    pub project_id: Option<String>,
    pub database: Option<String>,
    pub collection: Option<String>,
    pub page_size: Option<usize>,
    pub endpoint: Option<String>,
    pub emulator_host: Option<String>,
}

/// 解析後的完整匯出設定；優先順序為 命令列 > 設定檔 > 預設值
#[derive(Debug)]
pub struct ExportSettings {
    pub firestore: FirestoreSettings,
    pub collection: String,
    pub output_path: String,
    pub auth: AuthMode,
}

impl ExportSettings {
    pub fn resolve(overrides: SettingsOverrides, file: Option<TomlConfig>) -> Result<Self> {
        let file = file.unwrap_or_default();
        file.validate()?;
        let source = file.source;

        let (auth, endpoint) = match overrides.emulator_host {
            Some(host) if !host.trim().is_empty() => {
                (AuthMode::Emulator, format!("http://{}", host.trim()))
            }
            _ => {
                let credentials_path = overrides.credentials.or(source.credentials);
                let credentials_path = validation::validate_required_field(
                    CREDENTIALS_ENV_VAR,
                    &credentials_path,
                )?;
                validation::validate_path("credentials", credentials_path)?;
                tracing::debug!("Loading credentials from: {}", credentials_path);
                let credentials = Credentials::from_file(credentials_path)?;

                let endpoint = overrides
                    .endpoint
                    .or(source.endpoint)
                    .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
                (AuthMode::Credentials(credentials), endpoint)
            }
        };

        let project_id = overrides.project_id.or(source.project_id).or_else(|| match &auth {
            AuthMode::Credentials(credentials) => credentials.project_id().map(str::to_string),
            AuthMode::Emulator => None,
        });
        let project_id = validation::validate_required_field("project_id", &project_id)?.clone();

        let settings = Self {
            firestore: FirestoreSettings {
                endpoint,
                project_id,
                database: overrides
                    .database
                    .or(source.database)
                    .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
                page_size: overrides
                    .page_size
                    .or(source.page_size)
                    .unwrap_or(DEFAULT_PAGE_SIZE),
                timeout_seconds: source.timeout_seconds,
            },
            collection: overrides
                .collection
                .or(source.collection)
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            output_path: overrides
                .output_path
                .or(file.load.output_path)
                .unwrap_or_else(|| DEFAULT_OUTPUT_FILE.to_string()),
            auth,
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn is_emulator(&self) -> bool {
        matches!(self.auth, AuthMode::Emulator)
    }
}

impl ConfigProvider for ExportSettings {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }
}

impl Validate for ExportSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("endpoint", &self.firestore.endpoint)?;
        validation::validate_non_empty_string("project_id", &self.firestore.project_id)?;
        validation::validate_non_empty_string("database", &self.firestore.database)?;
        validation::validate_non_empty_string("collection", &self.collection)?;
        validation::validate_range("page_size", self.firestore.page_size, 1, MAX_PAGE_SIZE)?;
        validation::validate_path("output_path", &self.output_path)?;

        if self.collection.contains("//") {
            return Err(EtlError::InvalidConfigValueError {
                field: "collection".to_string(),
                value: self.collection.clone(),
                reason: "Collection path cannot contain empty segments".to_string(),
            });
        }
        Ok(())
    }
}
