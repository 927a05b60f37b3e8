//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

const AFTER_HELP: &str = "\
Quick Start:
  $ plex-notifier init                 # Write a starter settings file
  $ plex-notifier sections --insecure  # Check the server and the watch table
  $ plex-notifier watch --pidfile /run/plex-notifier.pid";

/// Trigger Plex library rescans when media files change
#[derive(Parser, Debug)]
#[command(
    name = "plex-notifier",
    version = env!("CARGO_PKG_VERSION"),
    about = "Trigger Plex library rescans when media files change",
    long_about = "Watches media directories and asks the Plex Media Server to rescan \
                  the owning library section once changes have settled.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Append log output to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default settings file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Display effective settings (token redacted)
    Config,

    /// List the server's library sections and the resolved watch table
    Sections {
        /// Talk to the server over plain HTTP
        #[arg(long)]
        insecure: bool,

        /// Print the section list as JSON
        #[arg(long)]
        json: bool,
    },

    /// Watch library roots and trigger rescans until signalled
    Watch {
        /// Talk to the server over plain HTTP
        #[arg(long)]
        insecure: bool,

        /// Write the process ID to this file while running
        #[arg(long, value_name = "FILE")]
        pidfile: Option<PathBuf>,
    },
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
    fn test_parse_watch_with_globals() {
        let cli = Cli::try_parse_from([
            "plex-notifier",
            "watch",
            "--insecure",
            "--pidfile",
            "/tmp/notifier.pid",
            "--log",
            "/tmp/notifier.log",
            "-c",
            "/etc/plex-notifier.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/etc/plex-notifier.toml")));
        assert_eq!(cli.log, Some(PathBuf::from("/tmp/notifier.log")));
        match cli.command {
            Commands::Watch { insecure, pidfile } => {
                assert!(insecure);
                assert_eq!(pidfile, Some(PathBuf::from("/tmp/notifier.pid")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_command_is_required() {
        assert!(Cli::try_parse_from(["plex-notifier"]).is_err());
    }
}
