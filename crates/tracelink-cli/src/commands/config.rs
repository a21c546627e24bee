//! Config command implementation.

use crate::cli::ConfigArgs;
use crate::config::Config;
use crate::error::Result;
use std::path::Path;

/// Print the effective configuration as TOML.
pub fn execute_config(args: ConfigArgs, config: &Config, source: Option<&Path>) -> Result<()> {
    let config = if args.defaults {
        Config::default()
    } else {
        config.clone()
    };

    if let Some(path) = &args.write {
        config.save(path)?;
        eprintln!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    match (args.defaults, source) {
        (false, Some(path)) => println!("# Loaded from {}", path.display()),
        _ => println!("# Built-in defaults"),
    }
    print!("{}", config.to_toml()?);
    Ok(())
}
