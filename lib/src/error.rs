//! Custom Error and Result types for this library

use std::io;
use thiserror::Error;

use crate::config::ConfigBuilderError;

/// Custom Error type for this library
#[derive(Error, Debug)]
pub enum MaltError {
    /// Error resulting from failure to build or validate a [`crate::config::Config`]
    #[error("invalid configuration: {_0}")]
    ConfigBuild(#[from] ConfigBuilderError),

    /// The host refused to open a raw socket for lack of privileges
    #[error(
        "permission to receive multicast on all UDP ports denied by host: {_0}"
    )]
    Capability(String),

    /// A failing system call along with the context it was issued in
    #[error("{context}: {source}")]
    SysCall {
        /// What was being attempted when the call failed
        context: String,
        /// The underlying OS error
        source: io::Error,
    },

    /// A failure reported asynchronously by the socket itself
    #[error("socket error: {_0}")]
    Socket(String),
}

impl MaltError {
    /// Wraps an [`io::Error`] with a description of the failing operation
    pub fn sys_call(context: impl Into<String>, source: io::Error) -> Self {
        Self::SysCall {
            context: context.into(),
            source,
        }
    }

    /// Converter for nix errno values
    pub fn from_errno(context: impl Into<String>, errno: nix::Error) -> Self {
        Self::sys_call(context, io::Error::from(errno))
    }
}

/// Custom Result type for this library. All Errors exposed by this library
/// will be returned as [`MaltError`]
pub type Result<T> = std::result::Result<T, MaltError>;

#[cfg(test)]
#[path = "./error_tests.rs"]
mod tests;
