pub mod api;
pub mod appointments;
pub mod audit;
pub mod authorization;
pub mod config;
pub mod database;
pub mod error;
pub mod governance;
pub mod services;

pub use error::GovernanceError;
