//! Entity module - Contains all SeaORM entity definitions for the ledger.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod counter;
pub mod investment;
pub mod order;
pub mod transaction_history;
pub mod transfer;
pub mod user;

// Re-export specific types to avoid conflicts
pub use counter::{Column as CounterColumn, Entity as Counter, Model as CounterModel};
pub use investment::{Column as InvestmentColumn, Entity as Investment, Model as InvestmentModel};
pub use order::{
    Column as OrderColumn, Entity as Order, Model as OrderModel, OrderStatus, OrderType,
};
pub use transaction_history::{
    Activity, Column as TransactionHistoryColumn, Entity as TransactionHistory, HistoryStatus,
    Model as TransactionHistoryModel,
};
pub use transfer::{
    Column as TransferColumn, Entity as Transfer, Model as TransferModel, TransferStatus,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
