pub mod cli;
pub mod settings;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::config::settings::SettingsOverrides;
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "study-export")]
#[command(about = "Export participant responses from Firestore into a flat CSV file")]
pub struct CliConfig {
    #[arg(
        value_name = "OUTPUT",
        help = "Output CSV path [default: study_results.csv]"
    )]
    pub output_path: Option<String>,

    #[arg(long, help = "TOML config file")]
    pub config: Option<String>,

    #[arg(
        long,
        env = "GOOGLE_APPLICATION_CREDENTIALS",
        help = "Service account or authorized user JSON key"
    )]
    pub credentials: Option<String>,

    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    pub project_id: Option<String>,

    #[arg(long, help = "Firestore database id [default: (default)]")]
    pub database: Option<String>,

    #[arg(long, help = "Collection to export [default: participants]")]
    pub collection: Option<String>,

    #[arg(long, help = "Documents per page, 1-1000 [default: 300]")]
    pub page_size: Option<usize>,

    #[arg(long, help = "Firestore REST endpoint [default: https://firestore.googleapis.com]")]
    pub endpoint: Option<String>,

    #[arg(long, env = "FIRESTORE_EMULATOR_HOST", hide_env_values = true)]
    pub emulator_host: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            output_path: self.output_path.clone(),
            credentials: self.credentials.clone(),
            project_id: self.project_id.clone(),
            database: self.database.clone(),
            collection: self.collection.clone(),
            page_size: self.page_size,
            endpoint: self.endpoint.clone(),
            emulator_host: self.emulator_host.clone(),
        }
    }
}
