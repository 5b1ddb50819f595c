use anyhow::{Context, Result};

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::core::config::{AppConfig, ENV_API_TOKEN, ENV_API_URL};

pub fn init(_opts: &OutputOptions) -> Result<()> {
    let path = AppConfig::config_path();
    if path.exists() {
        eprintln!("Config file already exists at {}", path.display());
        eprintln!("Remove it first if you want to regenerate.");
        return Ok(());
    }

    let path = AppConfig::default()
        .save()
        .context("Failed to generate config")?;
    println!("Generated config at {}", path.display());
    println!(
        "  Set api.base_url and api.token, or export {} and {}.",
        ENV_API_URL, ENV_API_TOKEN
    );
    Ok(())
}

pub fn check(opts: &OutputOptions) -> Result<()> {
    let path = AppConfig::config_path();
    if !path.exists() {
        eprintln!("No config file found at {}", path.display());
        eprintln!("Run `zu config init` to create one.");
        return Ok(());
    }

    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let issues = config.validate();
    if opts.format == OutputFormat::Json {
        println!(
            "{}",
            opts.to_json(&serde_json::json!({
                "path": path.display().to_string(),
                "valid": issues.is_empty(),
                "issues": issues,
            }))?
        );
        if !issues.is_empty() {
            std::process::exit(1);
        }
        return Ok(());
    }

    if issues.is_empty() {
        println!("Config is valid: {}", path.display());
        println!("  API: {}", config.api.base_url);
        println!(
            "  Token: {}",
            if config.api.token.is_some() { "set" } else { "not set" }
        );
    } else {
        eprintln!("Config issues found in {}:", path.display());
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
        std::process::exit(1);
    }
    Ok(())
}

pub fn path(_opts: &OutputOptions) -> Result<()> {
    println!("{}", AppConfig::config_path().display());
    Ok(())
}
