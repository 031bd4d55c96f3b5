//! CLI argument definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// rubolint - RuboCop for editors and the terminal
#[derive(Parser)]
#[command(name = "rubolint")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Settings that take precedence over the configuration file.
#[derive(Args, Debug, Default)]
pub struct ConfigOverrides {
    /// RuboCop command, e.g. "bin/rubocop"
    #[arg(long = "command", global = true, value_name = "COMMAND")]
    pub rubocop_command: Option<String>,

    /// Always run through `bundle exec`
    #[arg(long, global = true)]
    pub use_bundler: bool,

    /// Do nothing unless a .rubocop.yml is found
    #[arg(long, global = true)]
    pub disable_when_no_config_file: bool,

    /// Process timeout in milliseconds
    #[arg(long, global = true, value_name = "MS")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lint a file
    Lint {
        /// File to lint
        file: PathBuf,

        /// Read the file contents from standard input
        #[arg(long)]
        stdin: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Fetch style guide documentation for each offense
        #[arg(long)]
        describe: bool,
    },

    /// Auto-correct a file in place
    Fix {
        /// File to fix
        file: PathBuf,
    },

    /// Start the LSP server
    Lsp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
