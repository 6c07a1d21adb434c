//! cloudtruth-importer entry point
//!
//! Parses the command line, runs the import and turns any failure into a
//! single coloured error line (plus details) on stderr and exit status 1.

use anyhow::Result;
use clap::Parser;
use cloudtruth_importer::cli;
use cloudtruth_importer::core::error::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!("{:?}", e);
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
