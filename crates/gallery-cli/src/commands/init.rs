//! Init command - write the default configuration file

use anyhow::{Context, Result};
use gallery_config::{constants::DEFAULT_CONFIG_FILENAME, create_config};
use std::path::{Path, PathBuf};

pub fn run(path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME));
    match write_config(&config_path, force)? {
        InitOutcome::Exists => {
            println!("Configuration file already exists at:");
            println!("  {}", config_path.display());
            println!();
            println!("Use --force to overwrite with the default configuration.");
        }
        InitOutcome::Created(created) => {
            println!("Created configuration file:");
            println!(
                "  {}",
                created.canonicalize().unwrap_or_else(|_| created.clone()).display()
            );
            println!();
            println!("Start the tool with:");
            println!("  gallery serve --config {}", created.display());
        }
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum InitOutcome {
    Exists,
    Created(PathBuf),
}

fn write_config(path: &Path, force: bool) -> Result<InitOutcome> {
    if path.exists() {
        if !force {
            return Ok(InitOutcome::Exists);
        }
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove existing config at {}", path.display()))?;
    }

    let created = create_config(path)
        .with_context(|| format!("Failed to create config at {}", path.display()))?;
    Ok(InitOutcome::Created(created))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_config::{load_config, Config};

    #[test]
    fn test_writes_loadable_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("gallery.toml");

        let outcome = write_config(&path, false).unwrap();
        assert_eq!(outcome, InitOutcome::Created(path.clone()));
        assert_eq!(load_config(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_existing_file_kept_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gallery.toml");
        std::fs::write(&path, "[listener]\nport = 4000\n").unwrap();

        assert_eq!(write_config(&path, false).unwrap(), InitOutcome::Exists);
        assert_eq!(load_config(&path).unwrap().listener.port, 4000);

        write_config(&path, true).unwrap();
        assert_eq!(load_config(&path).unwrap().listener.port, 0);
    }
}
