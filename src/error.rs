//! Error types
//!
//! Only startup work (loading the inventory, generating the contract) can
//! fail. Runtime operations absorb their problems and log them instead.

use crate::contract::ContractError;

/// Crate-level error
#[derive(Debug)]
pub enum Error {
    /// The inventory produced an inconsistent contract
    Contract(ContractError),
    /// The inventory document could not be parsed (or serialized)
    Inventory(serde_json::Error),
    /// The inventory document could not be read
    Io(std::io::Error),
}

/// Result alias for fallible startup operations
pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Contract(e) => write!(f, "Contract error: {}", e),
            Error::Inventory(e) => write!(f, "Inventory error: {}", e),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Contract(e) => Some(e),
            Error::Inventory(e) => Some(e),
            Error::Io(e) => Some(e),
        }
    }
}

impl From<ContractError> for Error {
    fn from(e: ContractError) -> Self {
        Error::Contract(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Inventory(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
