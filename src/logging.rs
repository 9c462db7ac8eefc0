use log::LevelFilter;
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::json::JsonEncoder,
};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use once_cell::sync::OnceCell;

use crate::config::LoggingConfig;

pub struct Logger;

pub static LOGGER_ENABLED: OnceCell<bool> = OnceCell::new();

#[macro_export]
macro_rules! logger {
    ($level:ident, $($arg:tt)+) => {
        if let Some(true) = $crate::logging::LOGGER_ENABLED.get() {
            ::log::$level!($($arg)+);
        }
    };
}

impl Logger {
    /// Writes JSON log lines to `LOG_PATH` (or the configured path) at the
    /// `RUST_LOG` level (or the configured level).
    pub fn init(config: &LoggingConfig) -> Result<(), anyhow::Error> {
        let level = env::var("RUST_LOG")
            .ok()
            .or_else(|| config.level.clone())
            .unwrap_or_else(|| "info".to_string());

        let level_filter = LevelFilter::from_str(&level)?;

        let log_path = env::var_os("LOG_PATH")
            .map(PathBuf::from)
            .or_else(|| config.path.clone())
            .unwrap_or_else(|| PathBuf::from("ingress-synth.log"));

        let logfile = FileAppender::builder()
            .append(false)
            .encoder(Box::new(JsonEncoder::new()))
            .build(log_path)?;

        let config = Config::builder()
            .appender(Appender::builder().build("logfile", Box::new(logfile)))
            .build(Root::builder().appender("logfile").build(level_filter))?;

        log4rs::init_config(config)?;

        LOGGER_ENABLED
            .set(true)
            .map_err(|_| anyhow::anyhow!("logger is already initialized"))?;

        Ok(())
    }
}
