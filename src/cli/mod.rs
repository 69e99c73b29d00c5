//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod say;
pub mod upload;

use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::cli::say::run_say;
use crate::cli::upload::run_upload;
use crate::core::config::Config;
use crate::core::constants::BASE_URL_ENV;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::{init_logging, LogTarget};


#[derive(Parser, Debug)]
#[command(name = "charla", version)]
#[command(about = "A terminal chat client for a document-summarising chatbot")]
#[command(
    long_about = "Charla is a full-screen terminal chat interface for a chatbot backend that \
answers messages and summarises uploaded documents. Replies are revealed a character at a \
time, and a running request can be stopped.\n\n\
Environment Variables:\n\
  CHARLA_BASE_URL   Backend base URL (overrides the config file)\n\
  RUST_LOG          Log filter for --log output (default: charla=info)\n\n\
Controls:\n\
  Enter             Send the message\n\
  Alt+Enter         Insert a new line\n\
  Ctrl+S            Send, or stop the running reply\n\
  Ctrl+O            Attach a file to summarise\n\
  Esc               Close the attach prompt\n\
  PageUp/PageDown   Scroll through the conversation\n\
  Ctrl+C            Quit the application"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Write diagnostic logs to the specified file
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Directory where document summaries are saved
    #[arg(long, global = true, value_name = "DIR")]
    pub download_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat interface (default)
    Chat,
    /// Send one message and print the reply
    Say {
        /// Print the reply at once instead of revealing it
        #[arg(long)]
        no_animate: bool,
        /// Message to send (multiple words are joined with spaces)
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Upload a document and save its summary
    Upload {
        /// File to upload
        path: PathBuf,
    },
    /// Show the effective configuration
    Config,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let command = args.command.unwrap_or(Commands::Chat);
    let config_path = args.config.unwrap_or_else(Config::config_path);
    let mut config = Config::load_from_path(&config_path)?;
    config.apply_overrides(
        args.base_url,
        std::env::var(BASE_URL_ENV).ok(),
        args.download_dir,
    );

    init_logging(LogTarget::resolve(args.log, command == Commands::Chat))?;

    match command {
        Commands::Chat => run_chat(&config).await,
        Commands::Say { no_animate, prompt } => run_say(prompt, no_animate, &config).await,
        Commands::Upload { path } => run_upload(path, &config).await,
        Commands::Config => {
            config.print_all(&config_path);
            Ok(())
        }
    }
}
