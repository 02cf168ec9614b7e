//! A shared ledger: who lent what to whom, and where everyone stands.

pub mod balance;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod forms;
pub mod routes;
pub mod schemas;
pub mod store;

pub use engine::LedgerEngine;
pub use error::LedgerError;
