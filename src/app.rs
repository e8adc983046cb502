//! Application orchestration and command routing.
//!
//! Parses command-line arguments and hands off to the command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

/// A hold-to-record voice button for the terminal
#[derive(Parser)]
#[command(name = "voxhold")]
#[command(version)]
#[command(about = "Hold-to-record voice button with a live scrolling waveform")]
#[command(long_about = "Hold-to-record voice button with a live scrolling waveform.\n\nClick [Start] (or press s) to begin recording. The waveform scrolls while\naudio is captured. Click [Stop] (or press x) to keep the recording.\n\nTo cancel, press inside the round button, drag outside it until it turns\nred, and release. Dragging back inside disarms the cancel.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n\nEXAMPLES:\n    # Open the record screen\n    $ voxhold\n\n    # Stop an active recording from another terminal\n    $ pkill -USR1 voxhold\n\n    # Edit configuration file\n    $ voxhold config")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/voxhold/voxhold.toml\n    Logs:               ~/.local/state/voxhold/voxhold.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the record screen (default)
    ///
    /// s starts, x stops, q or Esc quits. Drag off the button and release to cancel.
    #[command(visible_alias = "r")]
    Record,

    /// Open configuration file in your preferred editor
    ///
    /// Edit audio settings and waveform timing.
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in voxhold.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   voxhold completions bash > voxhold.bash
    ///   voxhold completions zsh > _voxhold
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Commands that print to the terminal and need no logging
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "voxhold", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    logging::init_logging()?;

    match cli.command {
        None | Some(Commands::Record) => commands::handle_record().await?,
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_record_is_default() {
        let cli = Cli::try_parse_from(["voxhold"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["voxhold", "r"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Record)));
    }

    #[test]
    fn test_list_devices_name() {
        let cli = Cli::try_parse_from(["voxhold", "list-devices"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::ListDevices)));
        assert!(Cli::try_parse_from(["voxhold", "bogus"]).is_err());
    }
}
