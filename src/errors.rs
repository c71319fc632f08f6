//! Unified error types and result handling.
//!
//! Every failure the ledger core can produce is an [`Error`] variant. Each
//! variant belongs to exactly one [`ErrorKind`], which is what the outer
//! surface (see [`crate::service`]) reports to callers.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// Coarse failure classes reported to callers of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed input: unsupported order type, non-positive amount, missing field.
    InvalidArgument,
    /// A referenced user, order, transfer or investment does not exist.
    NotFound,
    /// Input is well formed but a ledger rule forbids the operation.
    PreconditionFailed,
    /// Persistence or unexpected failure.
    Internal,
}

/// All errors raised by the ledger core.
#[derive(Debug, Error)]
pub enum Error {
    /// Generic malformed input
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the input
        message: String,
    },

    /// Amounts must be strictly positive
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Order type outside PURCHASE / RELEASE
    #[error("Unsupported order type: {value}")]
    UnsupportedOrderType {
        /// The raw order type supplied by the caller
        value: String,
    },

    /// No user with this username
    #[error("User not found: {username}")]
    UserNotFound {
        /// Username that failed to resolve
        username: String,
    },

    /// No user with this id
    #[error("User not found: id {user_id}")]
    UserIdNotFound {
        /// Id that failed to resolve
        user_id: i64,
    },

    /// No order with this id
    #[error("Order not found: {order_id}")]
    OrderNotFound {
        /// Missing order id
        order_id: i64,
    },

    /// No transfer with this id
    #[error("Transfer not found: {transfer_id}")]
    TransferNotFound {
        /// Missing transfer id
        transfer_id: i64,
    },

    /// Balance tracker was asked to update a user without an investment row
    #[error("Investment not found for user {user_id}")]
    InvestmentNotFound {
        /// Owner of the missing investment
        user_id: i64,
    },

    /// A workflow needs an investment row the user does not have
    #[error("User {username} has no investment record")]
    MissingInvestment {
        /// Username of the user lacking an investment
        username: String,
    },

    /// A party named on a transfer no longer resolves to a user
    #[error("The {role} {username} of this transfer does not exist")]
    MissingParty {
        /// `"sender"` or `"receiver"`
        role: &'static str,
        /// Username recorded on the transfer
        username: String,
    },

    /// The user exists but has not verified their email
    #[error("User {username} has not verified their email")]
    UserNotVerified {
        /// Unverified username
        username: String,
    },

    /// A verified user with this email is already registered
    #[error("A user with email {email} already exists")]
    DuplicateUser {
        /// The conflicting email
        email: String,
    },

    /// A user with this email is registered but has not confirmed it yet
    #[error("A user with email {email} already exists but has not confirmed their email")]
    DuplicateUnverifiedUser {
        /// The conflicting email
        email: String,
    },

    /// Balance arithmetic left the representable decimal range
    #[error("Amount overflow for user {user_id}")]
    AmountOverflow {
        /// Owner of the investment being updated
        user_id: i64,
    },

    /// Not enough locked balance for a release or transfer
    #[error("Insufficient locked balance: available {available}, required {required}")]
    InsufficientLocked {
        /// Current locked total
        available: Decimal,
        /// Amount requested
        required: Decimal,
    },

    /// A status transition the lifecycle does not allow
    #[error("{entity} {id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Entity name ("Order", "Transfer")
        entity: &'static str,
        /// Entity id
        id: i64,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// A stored decimal string failed to parse
    #[error("Corrupt amount in storage: {value}")]
    CorruptAmount {
        /// The raw stored value
        value: String,
    },

    /// Configuration loading or parsing failed
    #[error("Configuration error: {message}")]
    Config {
        /// Details of the failure
        message: String,
    },

    /// Outbound mail could not be delivered
    #[error("Mail delivery failed: {message}")]
    Mail {
        /// Details of the failure
        message: String,
    },

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classifies this error for callers of the ledger.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument { .. }
            | Self::InvalidAmount { .. }
            | Self::UnsupportedOrderType { .. } => ErrorKind::InvalidArgument,
            Self::UserNotFound { .. }
            | Self::UserIdNotFound { .. }
            | Self::OrderNotFound { .. }
            | Self::TransferNotFound { .. }
            | Self::InvestmentNotFound { .. } => ErrorKind::NotFound,
            Self::MissingInvestment { .. }
            | Self::MissingParty { .. }
            | Self::UserNotVerified { .. }
            | Self::DuplicateUser { .. }
            | Self::DuplicateUnverifiedUser { .. }
            | Self::AmountOverflow { .. }
            | Self::InsufficientLocked { .. }
            | Self::InvalidTransition { .. } => ErrorKind::PreconditionFailed,
            Self::CorruptAmount { .. }
            | Self::Config { .. }
            | Self::Mail { .. }
            | Self::Database(_)
            | Self::Io(_) => ErrorKind::Internal,
        }
    }

    /// Whether the failure is advisory: the caller's request was already
    /// satisfied in part and only needs a follow-up from the user.
    #[must_use]
    pub const fn is_warning(&self) -> bool {
        matches!(self, Self::DuplicateUnverifiedUser { .. })
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
