//! Errors a command can end with.

use bakery_client::{ApiError, ConfigError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    /// Admin page opened by a client or anonymously.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Arguments that parse but make no sense together.
    #[error("{0}")]
    Input(String),

    #[error("Could not write output: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Whether the error came from the network rather than the user.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Api(e) if e.kind() == bakery_client::ErrorKind::Transport)
    }
}
