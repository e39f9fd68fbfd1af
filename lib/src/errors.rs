use std::fmt::Display;
use std::path::PathBuf;

use thiserror::Error;

/// Result type returned from functions that can have our `Error`s.
pub type Result<T, E = AlsError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AlsError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    InvalidRegex(#[from] regex::Error),

    #[error("{0}")]
    DBus(#[from] zbus::Error),

    #[error("{0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("{0}")]
    ParseFloat(#[from] std::num::ParseFloatError),

    #[error("No {class} device matches {regex:?}")]
    NoDevice { class: &'static str, regex: String },

    #[error("A {0} must be supplied to build the controller")]
    MissingCollaborator(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "Permission denied writing {}. Brightness control needs root, run it with `sudo alsctl_cli run`",
        path.display()
    )]
    PermissionDenied { path: PathBuf },

    #[error("{0}")]
    Other(String),
}

impl AlsError {
    /// Only a denied brightness write stops the controller, everything else is
    /// handled where it happens.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AlsError::PermissionDenied { .. })
    }
}

pub(crate) trait ResultExt<T> {
    /// Wrap any error into [`AlsError::Other`], prefixed with `msg`.
    fn error(self, msg: &str) -> Result<T>;
}

impl<T, E: Display> ResultExt<T> for std::result::Result<T, E> {
    fn error(self, msg: &str) -> Result<T> {
        self.map_err(|e| AlsError::Other(format!("{msg}: {e}")))
    }
}
