//! The `quizvault init` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use quizvault_core::config::{load_config_from, QuizvaultConfig, LOCAL_CONFIG};

pub fn execute(config_path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<()> {
    let target = config_path.unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG));

    let mut config = if target.exists() {
        println!("{} already exists, skipping.", target.display());
        load_config_from(Some(&target)).context("failed to load configuration")?
    } else {
        let mut config = QuizvaultConfig::default();
        if let Some(dir) = &data_dir {
            config.data_dir = dir.clone();
        }
        write_config(&target, &config)?;
        println!("Created {}", target.display());
        config
    };
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }

    let store = config.store();
    let created = store.init().context("failed to create data files")?;
    for path in [store.bank_path(), store.degrees_path()] {
        if created.iter().any(|p| p == path) {
            println!("Created {}", path.display());
        } else {
            println!("{} already exists, skipping.", path.display());
        }
    }

    println!("\nNext steps:");
    println!("  1. Set `secret` in {} (or QUIZVAULT_SECRET) before adding tests", target.display());
    println!("  2. Run: quizvault import --from <bank.json>");
    println!("  3. Run: quizvault take --test <name> --name <full name> --grade <grade>");

    Ok(())
}

fn write_config(path: &Path, config: &QuizvaultConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let body = format!("# quizvault configuration\n\n{}", config.to_toml()?);
    std::fs::write(path, body)
        .with_context(|| format!("failed to write config to {}", path.display()))?;
    Ok(())
}
