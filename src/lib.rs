pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::firestore::{AuthMode, FirestoreClient, FirestoreSettings};
pub use config::cli::LocalStorage;
pub use config::settings::{ExportSettings, SettingsOverrides};
pub use config::toml_config::TomlConfig;
pub use core::{etl::EtlEngine, pipeline::ExportPipeline};
pub use utils::error::{EtlError, Result};
