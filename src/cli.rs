// CLI definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use oshirase::notify::timeout::DEFAULT_EXPIRE_TIMEOUT;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "oshirase")]
#[command(author, version, about = "Desktop notification daemon (org.freedesktop.Notifications)")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (default: ~/.config/oshirase/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose logging (per-notification details)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the notification daemon on the session bus
    #[command(visible_alias = "d")]
    Daemon,

    /// Send a notification to the running daemon
    #[command(visible_alias = "s")]
    Send {
        /// Notification title
        summary: String,
        /// Notification body
        body: Option<String>,
        /// Sending application name
        #[arg(long, default_value = "oshirase")]
        app_name: String,
        /// Icon name or absolute path
        #[arg(long, default_value = "")]
        icon: String,
        /// Image file shown instead of the icon (image-path hint)
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
        /// Replace the notification with this id
        #[arg(long, default_value = "0")]
        replaces: u32,
        /// Action as KEY=LABEL (repeatable)
        #[arg(long = "action", short = 'A')]
        actions: Vec<String>,
        /// Urgency level
        #[arg(long, short, value_enum)]
        urgency: Option<UrgencyArg>,
        /// Expiry in milliseconds (-1 = server default, 0 = never)
        #[arg(
            long,
            short = 't',
            default_value_t = DEFAULT_EXPIRE_TIMEOUT,
            allow_hyphen_values = true
        )]
        timeout: i32,
    },

    /// Close a notification by id
    #[command(visible_alias = "c")]
    Close {
        /// Notification id
        id: u32,
    },

    /// Show server name, vendor and versions
    Info,

    /// List advertised capabilities
    #[command(visible_alias = "caps")]
    Capabilities,
}

/// Urgency levels accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UrgencyArg {
    Low,
    Normal,
    Critical,
}

impl UrgencyArg {
    /// Wire value of the `urgency` hint
    pub fn as_byte(self) -> u8 {
        match self {
            UrgencyArg::Low => 0,
            UrgencyArg::Normal => 1,
            UrgencyArg::Critical => 2,
        }
    }
}
