//! CLI argument parsing using clap 4.x derive macros

use clap::Parser;
use std::path::PathBuf;

/// A personal terminal chat client for Google Gemini
///
/// Renders the conversation turn by turn in a full-screen TUI. The API key
/// is taken from the GOOGLE_API_KEY environment variable, the config file,
/// or an interactive masked prompt.
#[derive(Parser, Debug)]
#[command(name = "gemchat")]
#[command(author, version, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// Model to chat with (overrides config)
    #[arg(short, long)]
    pub model: Option<String>,

    /// API key (overrides GOOGLE_API_KEY and the config file)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Path to the config file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Open the conversation at startup (overrides config)
    #[arg(long, conflicts_with = "lazy")]
    pub eager: bool,

    /// Open the conversation on the first message (overrides config)
    #[arg(long)]
    pub lazy: bool,

    /// Print version information
    #[arg(long)]
    pub version: bool,
}
