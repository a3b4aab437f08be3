use anyhow::Result;
use std::path::Path;
use crpm_check::config::load_config;

pub fn handle_config(show: bool, validate: bool, path: Option<&Path>, quiet: bool) -> Result<()> {
    if !show && !validate {
        if !quiet {
            eprintln!("Use --show or --validate");
        }
        std::process::exit(1);
    }

    let config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            if !quiet {
                let action = if validate { "Configuration validation failed" } else { "Error loading configuration" };
                eprintln!("❌ {}: {:#}", action, e);
            }
            std::process::exit(1);
        }
    };

    if show && !quiet {
        println!("{}", serde_json::to_string_pretty(&config)?);
    }

    if validate && !quiet {
        println!("✅ Configuration is valid");
    }

    Ok(())
}
