//! Error types for the notification daemon.

use thiserror::Error;

/// Failures while turning hint data into an image.
///
/// These never fail a `Notify` call: the resolver logs them and the
/// notification is shown without imagery.
#[derive(Error, Debug)]
pub enum ImageError {
    /// Pixel tuple did not have the `(iiibiiay)` shape
    #[error("Malformed pixel data: {0}")]
    Malformed(String),

    /// Pixel layout we cannot convert (bit depth, channel count)
    #[error("Unsupported pixel format: {0}")]
    Unsupported(String),

    /// `file://` URI that does not decode to a UTF-8 path
    #[error("Invalid file URI: {0}")]
    InvalidUri(String),

    /// Image file could not be read or decoded
    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),
}

/// Errors reported by a popup renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to create popup for notification {id}: {reason}")]
    Create { id: u32, reason: String },

    #[error("Failed to update popup for notification {id}: {reason}")]
    Update { id: u32, reason: String },
}

/// Errors from the notification engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The event loop went away before answering
    #[error("Notification engine is not running")]
    Stopped,
}

/// Errors loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Errors that stop the daemon.
#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),

    /// Another process already provides the notification service
    #[error("another notification daemon already owns {0}")]
    NameTaken(&'static str),

    #[error("failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}
