pub mod config;
pub mod detection;
pub mod error;

pub use config::RelayConfig;
pub use detection::*;
pub use error::*;
