//! Stateup command line driver
//!
//! Upgrades stored resource action state files to the current schema
//! version. Each file holds `{"schema_version": N, "attributes": {...}}`.

#![warn(unreachable_pub)]

pub mod batch;
pub mod config;
pub mod document;

pub use batch::{
    output_path, upgrade_file, upgrade_files, write_document, write_documents, FileReport,
};
pub use config::{LogFormat, LoggingSettings, Settings};
pub use document::StateDocument;

/// Install the stderr subscriber
///
/// `RUST_LOG` wins over the configured level.
pub fn init_logging(settings: &LoggingSettings) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match settings.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
