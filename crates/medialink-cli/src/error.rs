// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 The medialink Authors

use std::fmt;
use std::process::ExitCode;

/// CLI-specific error type with exit code mapping
#[derive(Debug)]
pub enum CliError {
    /// Invalid command-line arguments
    InvalidArgs(String),
    /// No device matched the requested criteria
    NoDevice(String),
    /// Device directory inaccessible
    Inaccessible(String),
    /// General error from the medialink library
    General(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::InvalidArgs(msg) => write!(f, "Invalid arguments: {}", msg),
            CliError::NoDevice(msg) => write!(f, "No device found: {}", msg),
            CliError::Inaccessible(msg) => write!(f, "Device directory inaccessible: {}", msg),
            CliError::General(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::InvalidArgs(_) => ExitCode::from(2),
            CliError::NoDevice(_) => ExitCode::from(3),
            CliError::Inaccessible(_) => ExitCode::from(4),
            CliError::General(_) => ExitCode::from(1),
        }
    }
}

/// Map medialink::Error to CliError with appropriate exit codes
impl From<medialink::Error> for CliError {
    fn from(err: medialink::Error) -> Self {
        use medialink::Error;

        match err {
            Error::NoMatchingDevice => CliError::NoDevice(format!("{}", err)),
            Error::DirectoryUnavailable { .. } => CliError::Inaccessible(format!("{}", err)),
            Error::NodeIdentity(_) | Error::TopologyQuery(_) | Error::AllocationFailed(_) => {
                CliError::General(format!("{}", err))
            }
        }
    }
}

/// Helper function to convert result to exit code
pub fn result_to_exit_code<T>(result: Result<T, CliError>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    }
}
