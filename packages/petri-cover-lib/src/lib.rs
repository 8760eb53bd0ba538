pub mod config;
pub mod coverability;
pub mod error;
pub mod firing;
pub mod logger;
pub mod net;
