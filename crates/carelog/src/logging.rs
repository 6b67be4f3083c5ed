use color_eyre::Result;
use lazy_static::lazy_static;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    self, Layer, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::config;

lazy_static! {
    pub static ref LOG_ENV: String = format!("{}_LOG_LEVEL", *config::PROJECT_NAME);
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

/// File-only logging: stdout belongs to the TUI, so everything goes to a log
/// file in the data directory. Level via `CARELOG_LOG_LEVEL` or `RUST_LOG`.
pub fn init() -> Result<()> {
    let directory = config::get_data_dir();
    std::fs::create_dir_all(&directory)?;
    let log_path = directory.join(LOG_FILE.clone());
    let log_file = std::fs::File::create(log_path)?;

    let env_filter = tracing_subscriber::filter::EnvFilter::try_from_env(LOG_ENV.clone())
        .or_else(|_| tracing_subscriber::filter::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info"));

    let file_subscriber = tracing_subscriber::fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .init();
    Ok(())
}
