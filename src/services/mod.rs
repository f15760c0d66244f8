pub mod accounts;
pub mod processor;

pub use accounts::{AccountDefaults, AccountService, OpenAccount};
pub use processor::{TransactionProcessor, TransactionRequest};
