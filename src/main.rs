use std::io::{self, Write};

use anyhow::{Context, Result};

use ingress_synth::{
    cmd::{Command, OutputFormat},
    config::Config,
    logger,
    logging::Logger,
    snapshot::Snapshot,
    ParameterSet, Warnings,
};

fn main() -> Result<()> {
    let cmd = Command::init();

    let config = Config::load(cmd.config_load_option())?;

    if cmd.logging {
        Logger::init(&config.logging)?;
    }

    logger!(info, "config: {:?}", config);

    let capabilities = config.capabilities();

    let mut warnings = Warnings::new();

    let base = ParameterSet::from_global(&config.global, capabilities, &mut warnings);

    let snapshot = Snapshot::load(&cmd.snapshot)
        .with_context(|| format!("failed to load snapshot {}", cmd.snapshot.display()))?;

    let ingress_config = snapshot.generate(&base, capabilities, &mut warnings);

    let rendered = match cmd.output {
        OutputFormat::Yaml => serde_yaml::to_string(&ingress_config)?,
        OutputFormat::Json => serde_json::to_string_pretty(&ingress_config)? + "\n",
    };

    io::stdout().write_all(rendered.as_bytes())?;

    for warning in warnings.iter() {
        eprintln!("warning: {}: {}", warning.resource, warning.message);
    }

    Ok(())
}
