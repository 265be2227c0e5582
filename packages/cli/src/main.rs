mod commands;
mod config;
mod uploader;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{init, show, upload, InitArgs, ShowArgs, UploadArgs};

/// Folio CLI - documents with asynchronous image uploads
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a config file and an empty document
    Init(InitArgs),

    /// Upload images into a document
    Upload(UploadArgs),

    /// Print a document outline
    Show(ShowArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result = match std::env::current_dir() {
        Ok(cwd) => match cli.command {
            Command::Init(args) => init(args, &cwd),
            Command::Upload(args) => upload(args, &cwd).await,
            Command::Show(args) => show(args, &cwd),
        },
        Err(err) => Err(anyhow::anyhow!("Cannot get current directory: {}", err)),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
