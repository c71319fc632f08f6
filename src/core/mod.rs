//! Core ledger logic - framework-agnostic balance, order and transfer operations.
//!
//! Every workflow entry point runs its ledger writes inside one database
//! transaction and sends mail only after the commit.

/// Decimal amount parsing and formatting
pub mod amount;
/// Sequential record numbers
pub mod counter;
/// Transaction history recording and voiding
pub mod history;
/// Investment balance tracking
pub mod investment;
/// Status transition rules for orders and transfers
pub mod lifecycle;
/// Purchase and release orders
pub mod order;
/// Peer-to-peer and admin transfers
pub mod transfer;
/// User directory
pub mod user;
