//! CLI errors

use std::{io, path::PathBuf};

use cartsync::{config::ConfigError, executor::ActionError, transport::HttpTransportError};
use thiserror::Error;

/// Errors that end a CLI run.
#[derive(Debug, Error)]
pub enum CliError {
    /// The client configuration file could not be read.
    #[error("could not read {}: {source}", path.display())]
    ReadConfig {
        /// Path given on the command line.
        path: PathBuf,

        /// Underlying error.
        source: io::Error,
    },

    /// The client configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The HTTP session could not be set up.
    #[error(transparent)]
    Transport(#[from] HttpTransportError),

    /// The action ran and failed.
    #[error("{0}")]
    Action(#[from] ActionError),

    /// The command's trigger has no usable action.
    #[error("nothing to activate")]
    Unbound,

    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}
