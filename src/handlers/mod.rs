pub mod balance;
pub mod catalog;
pub mod config;
pub mod invoice;
pub mod ledger;
pub mod transaction;
