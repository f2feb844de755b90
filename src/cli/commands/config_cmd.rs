//! Configuration commands.

use console::style;

use flashscrape::config::default_config_path;
use flashscrape::Settings;

/// Print the effective configuration as TOML.
pub fn cmd_config_show(settings: &Settings) -> anyhow::Result<()> {
    match &settings.source_path {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => println!("# Built-in defaults (no config file found)"),
    }
    print!("{}", settings.to_toml()?);
    Ok(())
}

/// Print where the config file is read from.
pub fn cmd_config_path(settings: &Settings) -> anyhow::Result<()> {
    if let Some(path) = &settings.source_path {
        println!("{}", path.display());
        return Ok(());
    }

    match default_config_path() {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("  {} File does not exist yet", style("→").dim());
            }
        }
        None => anyhow::bail!("No config directory on this platform; pass --config"),
    }
    Ok(())
}
