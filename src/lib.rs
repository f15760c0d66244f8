pub mod config;
pub mod db;
pub mod domain;
pub mod routes;
pub mod services;

pub use config::Config;
pub use domain::{Account, LedgerError, Report, Transaction, TransactionKind, TransactionState};
pub use services::{AccountService, TransactionProcessor, TransactionRequest};
