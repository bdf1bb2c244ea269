//! Oshirase notification daemon CLI
//!
//! Runs the `org.freedesktop.Notifications` service or talks to a running one.

use clap::Parser;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Daemon => {
            commands::notify::daemon(cli.config.as_deref(), cli.verbose).await?;
        }
        Commands::Send {
            summary,
            body,
            app_name,
            icon,
            image,
            replaces,
            actions,
            urgency,
            timeout,
        } => {
            commands::notify::send(
                &app_name,
                replaces,
                &icon,
                &summary,
                body.as_deref().unwrap_or(""),
                &actions,
                urgency,
                image.as_ref(),
                timeout,
            )
            .await?;
        }
        Commands::Close { id } => {
            commands::notify::close(id).await?;
        }
        Commands::Info => {
            commands::notify::info().await?;
        }
        Commands::Capabilities => {
            commands::notify::capabilities().await?;
        }
    }

    Ok(())
}
