//! dotgate domain layer
pub mod config;
pub mod errors;

pub use config::{CliOverrides, Config};
pub use errors::RelayError;
