pub mod config;
pub mod connect;
pub mod error;
pub mod runner;
pub mod schema;

pub mod kafka;

pub use config::Config;
pub use connect::{ConnectorProvisioner, ConnectorSpec};
pub use error::{Error, Result};
pub use runner::Runner;
