use thiserror::Error;

use crate::models::pickup::PickupStatus;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store value is not valid json: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Why a ledger operation was refused. A refused operation never mutates
/// the ledger and never touches the store.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("pickup request {0} not found")]
    NotFound(String),

    #[error("pickup request {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: PickupStatus,
        to: PickupStatus,
    },

    #[error("pickup code does not match")]
    CodeMismatch,

    #[error("pickup request {0} has no pickup code")]
    MissingPickupCode(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("at least one item is required")]
    NoItems,

    #[error("invalid item: {0}")]
    InvalidItem(String),
}

impl LedgerError {
    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            LedgerError::NotFound(_) => "not_found",
            LedgerError::InvalidTransition { .. } => "invalid_transition",
            LedgerError::CodeMismatch => "code_mismatch",
            LedgerError::MissingPickupCode(_) => "missing_code",
            LedgerError::MissingField(_) => "missing_field",
            LedgerError::NoItems => "no_items",
            LedgerError::InvalidItem(_) => "invalid_item",
        }
    }
}
