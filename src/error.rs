//! Error types for the api-driver crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while declaring a contract or constructing a client.
///
/// These are fatal: no callable contract is produced.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("contract {contract} declares neither a url nor a url provider that yields one")]
    MissingUrl { contract: String },

    #[error("contract {contract} names url provider {provider:?}, which is not registered")]
    UnknownUrlProvider { contract: String, provider: String },

    #[error("unsupported HTTP method: {method}")]
    UnsupportedMethod { method: String },

    #[error("contract {contract} declares operation {operation:?} more than once")]
    DuplicateOperation { contract: String, operation: String },

    #[error("invalid contract table")]
    InvalidContract(#[source] serde_json::Error),

    #[error("failed to read contract from file: {}", path.display())]
    ContractFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("operation {operation}: cannot expose option --{option}: {reason}")]
    CliOption {
        operation: String,
        option: String,
        reason: String,
    },

    #[error("operations {first:?} and {second:?} both map to subcommand {command:?}")]
    CliCommand {
        command: String,
        first: String,
        second: String,
    },
}

/// Errors raised while dispatching a single operation call.
///
/// Transport failures are not errors: they travel inside the returned
/// [`Response`](crate::transport::Response).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DispatchError {
    #[error("contract {contract} has no operation {operation:?}")]
    UnknownOperation { contract: String, operation: String },

    #[error("operation {operation} takes {expected} arguments, got {actual}")]
    ArgumentCount {
        operation: String,
        expected: usize,
        actual: usize,
    },

    #[error("operation {operation}: file parameter {name} expects a path string")]
    InvalidFileArgument { operation: String, name: String },

    #[error("operation {operation} has body parameters but no content-type header")]
    MissingContentType { operation: String },

    #[error("operation {operation} does not return a response")]
    NoResponse { operation: String },
}
