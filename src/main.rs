//! apem - a small terminal audio player.
//!
//! The player keeps a catalog of two bundled samples plus any files you add,
//! and plays one of them at a time with play/pause, skip and seek controls.
//! Files can be passed on the command line or added from the in-terminal
//! file picker.
//!
//! Besides the player, the binary manages its configuration file and can
//! report the duration of an audio file without opening the UI.

use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use std::error::Error;
use std::io;
use std::path::PathBuf;

mod cli;

#[cfg(feature = "player")]
mod player;

#[derive(Parser)]
#[command(name = "apem")]
#[command(about = "Terminal audio player with bundled samples and a file picker")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the player
    Play {
        /// Audio files to add to the catalog on startup
        files: Vec<PathBuf>,
    },
    /// Print the duration of an audio file
    Info {
        /// Audio file to inspect
        file: PathBuf,
    },
    /// Write the default configuration file
    Init,
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new([
            "skip_seconds",
            "poll_interval_ms",
            "picker_start_dir",
            "log_level",
            "log_file",
        ]))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play { files } => {
            cli::play::handle_play(&files)?;
        }
        Commands::Info { file } => {
            cli::info::handle_info(&file)?;
        }
        Commands::Init => {
            cli::init::handle_init()?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
    }

    Ok(())
}
