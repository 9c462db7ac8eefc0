use clap::Parser;
use std::path::PathBuf;

use crate::config::ConfigLoadOption;

use super::args::OutputFormat;

/// Resolve an Ingress snapshot into the proxy configuration model
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Command {
    /// Snapshot file with the Ingress and the resources it references (`-` reads stdin)
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,

    /// Output format
    #[arg(
        short,
        long,
        value_name = "yaml|json",
        default_value = "yaml",
        display_order = 1000
    )]
    pub output: OutputFormat,

    /// Logging
    #[arg(short = 'l', long, display_order = 1000)]
    pub logging: bool,

    /// Config file path
    #[arg(long, display_order = 1000)]
    pub config_file: Option<PathBuf>,
}

impl Command {
    pub fn init() -> Self {
        Self::parse()
    }

    pub fn config_load_option(&self) -> ConfigLoadOption {
        if let Some(path) = &self.config_file {
            match path.try_exists() {
                Ok(true) => ConfigLoadOption::Path(path.clone()),
                Ok(false) => {
                    eprintln!("Config file not found: {:?}", path);

                    ConfigLoadOption::Default
                }
                Err(err) => {
                    eprintln!("Failed to check config file exists: {}", err);

                    ConfigLoadOption::Default
                }
            }
        } else {
            let Some(path) = xdg_config_home().map(|dir| dir.join("config.yaml")) else {
                return ConfigLoadOption::Default;
            };

            match path.try_exists() {
                Ok(true) => ConfigLoadOption::Path(path),
                Ok(false) => ConfigLoadOption::Default,
                Err(err) => {
                    eprintln!("Failed to check config file exists: {}", err);

                    ConfigLoadOption::Default
                }
            }
        }
    }
}

fn xdg_config_home() -> Option<PathBuf> {
    match std::env::var_os("XDG_CONFIG_HOME") {
        Some(dir) => Some(PathBuf::from(dir).join("ingress-synth")),
        None => dirs::home_dir().map(|home| home.join(".config").join("ingress-synth")),
    }
}
