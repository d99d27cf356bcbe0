//! `gallery` - host the tool side of the preview gallery

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "gallery", version, about = "Preview gallery tooling host")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Listen for app connections and log app events until Ctrl-C
    Serve {
        /// Config file (defaults to $GALLERY_CONFIG, then ./gallery.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Listen port (0 = ephemeral)
        #[arg(short, long)]
        port: Option<u16>,
        /// Debug-level logging
        #[arg(short, long)]
        debug: bool,
        /// Also write logs to a daily-rolling file
        #[arg(long)]
        log_file: Option<PathBuf>,
    },
    /// Write the default configuration file
    Init {
        /// Target file (defaults to ./gallery.toml)
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            port,
            debug,
            log_file,
        } => {
            commands::serve::run(commands::serve::ServeOptions {
                config,
                port,
                debug,
                log_file,
            })
            .await
        }
        Commands::Init { path, force } => commands::init::run(path, force),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["gallery", "serve", "--port", "5123", "--debug"]).unwrap();
        match cli.command {
            Commands::Serve {
                config, port, debug, ..
            } => {
                assert!(config.is_none());
                assert_eq!(port, Some(5123));
                assert!(debug);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_init_with_path() {
        let cli = Cli::try_parse_from(["gallery", "init", "conf/gallery.toml", "--force"]).unwrap();
        match cli.command {
            Commands::Init { path, force } => {
                assert_eq!(path, Some(PathBuf::from("conf/gallery.toml")));
                assert!(force);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_rejects_invalid_port() {
        assert!(Cli::try_parse_from(["gallery", "serve", "--port", "70000"]).is_err());
    }
}
