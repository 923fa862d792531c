//! `aegis` command-line binary.
//!
//! # Environment Variables
//!
//! - `AEGIS_CONFIG`: path to a YAML config file (optional)
//! - `AEGIS_DATA_DIR`: directory for identity, queue and experiences
//! - `AEGIS_DECAY_RATE`: decay per revisit for newly deferred thoughts
//! - `RUST_LOG`: log filter (default: "warn")
//!
//! # Usage
//!
//! ```bash
//! aegis contemplate financial "I should refund the customer" --urgent
//! aegis revisit
//! aegis process communication "send report" "Error: permission denied"
//! aegis recent 10
//! ```

use anyhow::Context;

use aegis::cli::{parse_command, run, usage, CliCommand};
use aegis::{Aegis, AegisConfig};

const CONFIG_ENV: &str = "AEGIS_CONFIG";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args = std::env::args().skip(1);
    let Some(raw) = args.next() else {
        println!("{}", usage());
        return Ok(());
    };
    let Some(command) = parse_command(&raw) else {
        eprintln!("Unknown command: {}\n\n{}", raw, usage());
        std::process::exit(2);
    };
    if command == CliCommand::Version {
        println!("aegis {}", aegis::VERSION);
        return Ok(());
    }

    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => AegisConfig::from_yaml_file(&path)
            .with_context(|| format!("failed to load config from {}", path))?,
        Err(_) => AegisConfig::from_env().context("invalid environment configuration")?,
    };
    log::debug!("Using data directory {}", config.data_dir.display());

    let aegis = Aegis::open(config);
    let rest: Vec<String> = args.collect();
    let output = run(&aegis, command, &rest)?;
    println!("{}", output);
    Ok(())
}
