//! dotgate application layer
pub mod ports;
pub mod use_cases;

pub use ports::UpstreamForwarder;
pub use use_cases::RelayQueryUseCase;
